//! Configuration module for Prata.
//!
//! Handles loading and saving application settings.

mod settings;

pub use settings::{
    AgentSettings, GeneralSettings, SessionSettings, Settings, ToolSettings,
};
