pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod session;
pub mod tui;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::api::{ApiClient, HttpTransport};
use crate::cli::Cli;
use crate::core::ConfigEditor;
use crate::session::FileSessionStore;

/// 日志写到文件，避免破坏 TUI 画面；guard 需存活到进程结束
fn init_logging(cli: &Cli) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "config_admin=info".into());

    if let Err(e) = std::fs::create_dir_all(&cli.log_dir) {
        eprintln!("Warning: failed to create log directory: {}", e);
        return None;
    }
    let file_appender = tracing_appender::rolling::daily(&cli.log_dir, "config-admin.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();
    Some(guard)
}

fn run(cli: Cli) -> error::Result<()> {
    let store = FileSessionStore::load(&cli.session_file)?;
    let client = ApiClient::new(store, HttpTransport::new());
    let editor = ConfigEditor::new(client);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    tracing::info!(session_file = %cli.session_file.display(), "starting");
    let mut app = tui::App::new(editor, cli.api_url);
    app.run(&runtime)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
