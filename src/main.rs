mod api;
mod app;
mod config;
mod events;
mod session;
mod ui;

use anyhow::{Context, Result};
use api::HttpChatClient;
use clap::Parser;
use config::Config;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ui::conversation::ChatBot;

#[derive(Parser)]
#[command(name = "chatbot")]
#[command(version = "0.1.0")]
#[command(about = "Chat with a remote assistant from the terminal", long_about = None)]
struct Cli {
    /// Base URL of the chat server (requests go to <endpoint>/api/chat)
    #[arg(long, env = config::ENDPOINT_ENV)]
    endpoint: Option<String>,

    /// Config file to use instead of ~/.chatbot/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs here instead of ~/.chatbot/chatbot.log
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Show bot replies as plain text instead of rendering markdown
    #[arg(long)]
    plain: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = Some(log_file);
        }
        if self.plain {
            config.ui.render_markdown = false;
        }
    }
}

/// Send logs to a file; the terminal belongs to the UI
fn init_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    init_logging(&config.log_path()?)?;

    let client = HttpChatClient::new(&config)?;
    log::info!("Chat endpoint: {}", client.url());

    let bot = ChatBot::new(Arc::new(client), &config);
    app::run(bot).await
}
