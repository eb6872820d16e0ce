use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "config-admin")]
#[command(version)]
#[command(about = "Terminal admin for a remote key/value config store", long_about = None)]
pub struct Cli {
    /// File holding the persisted API URL and session token
    #[arg(long, env = "CONFIG_ADMIN_SESSION", default_value = "session.json")]
    pub session_file: PathBuf,

    /// API URL to prefill when none is persisted yet
    #[arg(long, env = "CONFIG_ADMIN_API_URL")]
    pub api_url: Option<String>,

    /// Directory for daily log files
    #[arg(long, env = "CONFIG_ADMIN_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,
}
