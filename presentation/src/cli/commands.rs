//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for kubechat
#[derive(Parser, Debug)]
#[command(name = "kubechat")]
#[command(author, version, about = "Terminal console for the Kubernetes ops assistant")]
#[command(long_about = r#"
kubechat is a terminal client for the Kubernetes ops assistant backend.

Every message opens a streaming exchange: the assistant's reply is printed as
it arrives, together with the kubectl commands it runs while investigating.
Chats are kept as sessions on the backend; a new chat is saved when its first
message is sent.

Configuration is loaded from (in priority order):
1. --base-url / --user-id                 Command line flags
2. KUBECHAT_BACKEND__USER_ID=...          Environment variables
3. --config <path>                        Explicit config file
4. ./kubechat.toml                        Project-level config
5. ~/.config/kubechat/config.toml         Global config

Example:
  kubechat --user-id 42
  KUBECHAT_BACKEND__SESSION_COOKIE=... kubechat --base-url https://ops.example.com
"#)]
pub struct Cli {
    /// Backend root URL (overrides backend.base_url)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// User whose sessions are shown (overrides backend.user_id)
    #[arg(short, long, value_name = "ID")]
    pub user_id: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Do not print streaming status lines
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
