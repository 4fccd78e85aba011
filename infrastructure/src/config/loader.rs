//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "KUBECHAT_";

const PROJECT_FILES: [&str; 2] = ["kubechat.toml", ".kubechat.toml"];

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub user_id: Option<String>,
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Command line overrides
    /// 2. `KUBECHAT_*` environment variables
    /// 3. Explicit config path (if provided)
    /// 4. Project root: `./kubechat.toml` or `./.kubechat.toml`
    /// 5. XDG config: `$XDG_CONFIG_HOME/kubechat/config.toml`
    /// 6. Default values
    pub fn load(
        config_path: Option<&PathBuf>,
        overrides: &ConfigOverrides,
    ) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::with_overrides(figment, overrides)
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration plus command line overrides (for
    /// `--no-config`)
    pub fn load_defaults(overrides: &ConfigOverrides) -> FileConfig {
        let figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        Self::with_overrides(figment, overrides)
            .extract()
            .unwrap_or_default()
    }

    fn with_overrides(mut figment: Figment, overrides: &ConfigOverrides) -> Figment {
        if let Some(base_url) = &overrides.base_url {
            figment = figment.merge(Serialized::default("backend.base_url", base_url));
        }
        if let Some(user_id) = &overrides.user_id {
            figment = figment.merge(Serialized::default("backend.user_id", user_id));
        }
        figment
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/kubechat/config.toml if set,
    /// otherwise falls back to ~/.config/kubechat/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("kubechat").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for `--show-config`)
    pub fn print_config_sources(config_path: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        println!("  [     ] Flags:   --base-url, --user-id");

        let env_vars: Vec<String> = std::env::vars()
            .map(|(key, _)| key)
            .filter(|key| key.starts_with(ENV_PREFIX))
            .collect();
        if env_vars.is_empty() {
            println!("  [     ] Env:     {}*", ENV_PREFIX);
        } else {
            println!("  [FOUND] Env:     {}", env_vars.join(", "));
        }

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:5}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./kubechat.toml or ./.kubechat.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}
