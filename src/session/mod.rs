//! Persistent conversation sessions.
//!
//! Each session is one JSON file (`<session_id>.json`) holding metadata
//! plus the full ordered message sequence. The store enforces a maximum
//! retained session count, evicting the least-recently-updated first.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{AssistantError, Result};
use crate::memory::ConversationMemory;

const TITLE_MAX_CHARS: usize = 50;

/// Metadata for a persisted conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    pub title: Option<String>,
}

/// On-disk shape of one session file.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    metadata: SessionMetadata,
    conversation: ConversationMemory,
}

/// File-backed store of conversation sessions.
///
/// The store only ever receives a read-only snapshot of a memory to
/// persist and hands back a fresh instance on load; it never holds a
/// live reference into a running agent.
pub struct SessionStore {
    dir: PathBuf,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>, max_sessions: usize) -> Self {
        Self {
            dir: dir.into(),
            max_sessions,
        }
    }

    /// Create a store rooted at the configured history directory.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.history_dir(), settings.sessions.max_sessions)
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    fn generate_session_id() -> String {
        Utc::now().format("%Y%m%d_%H%M%S").to_string()
    }

    /// Derive a session title from the first user message.
    fn derive_title(memory: &ConversationMemory) -> Option<String> {
        memory.first_user_content().map(|content| {
            let truncated: String = content.chars().take(TITLE_MAX_CHARS).collect();
            if truncated.len() < content.len() {
                format!("{truncated}...")
            } else {
                truncated
            }
        })
    }

    /// Save a memory snapshot under a new generated session id.
    pub async fn create(&self, memory: &ConversationMemory) -> Result<String> {
        let session_id = Self::generate_session_id();
        self.save(&session_id, memory).await?;
        Ok(session_id)
    }

    /// Save a memory snapshot under the given session id, then prune
    /// sessions beyond the retention limit.
    pub async fn save(&self, session_id: &str, memory: &ConversationMemory) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.session_path(session_id);
        let now = Utc::now();

        // Re-saving an existing session keeps its creation time.
        let created_at = match self.read_file(&path).await {
            Ok(existing) => existing.metadata.created_at,
            Err(_) => now,
        };

        let file = SessionFile {
            metadata: SessionMetadata {
                session_id: session_id.to_string(),
                created_at,
                updated_at: now,
                message_count: memory.len(),
                title: Self::derive_title(memory),
            },
            conversation: memory.clone(),
        };

        let content = serde_json::to_string_pretty(&file)?;
        tokio::fs::write(&path, content).await?;
        debug!("Saved session: {}", session_id);

        self.prune().await?;
        Ok(())
    }

    /// Load a session's conversation memory.
    pub async fn load(&self, session_id: &str) -> Result<ConversationMemory> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Err(AssistantError::SessionNotFound(session_id.to_string()));
        }

        let file = self.read_file(&path).await.map_err(|e| {
            AssistantError::SessionStore(format!("failed to load session {session_id}: {e}"))
        })?;
        Ok(file.conversation)
    }

    /// List all saved sessions, newest first by update time. Unreadable
    /// files are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<SessionMetadata>> {
        let mut sessions = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(sessions),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_file(&path).await {
                Ok(file) => sessions.push(file.metadata),
                Err(e) => warn!("Skipping unreadable session file {:?}: {}", path, e),
            }
        }

        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    /// Delete a session. Returns whether it existed.
    pub async fn delete(&self, session_id: &str) -> Result<bool> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(false);
        }
        tokio::fs::remove_file(&path).await?;
        debug!("Deleted session: {}", session_id);
        Ok(true)
    }

    /// Remove least-recently-updated sessions beyond the retention
    /// limit. Returns the number deleted.
    pub async fn prune(&self) -> Result<usize> {
        let sessions = self.list().await?;
        if sessions.len() <= self.max_sessions {
            return Ok(0);
        }

        let mut deleted = 0;
        for session in &sessions[self.max_sessions..] {
            if self.delete(&session.session_id).await? {
                deleted += 1;
            }
        }
        if deleted > 0 {
            debug!("Pruned {} old sessions", deleted);
        }
        Ok(deleted)
    }

    async fn read_file(&self, path: &Path) -> Result<SessionFile> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}
