//! Presentation-level configuration
//!
//! Configuration for REPL behavior.

use std::path::PathBuf;

/// REPL configuration for the presentation layer
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Print streaming status lines (investigating, running commands)
    pub show_status: bool,
    /// Path to history file
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_status: true,
            history_file: None,
        }
    }
}

impl ReplConfig {
    /// Configured history file, else `$XDG_DATA_HOME/kubechat/history.txt`.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("kubechat").join("history.txt")))
    }
}
