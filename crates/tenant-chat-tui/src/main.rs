use std::path::Path;
use std::sync::Arc;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tenant_chat_core::{ChatBackend, Config, HttpBackend, Session};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "tenant-chat", version)]
#[command(about = "Chat with the California tenant rights assistant")]
struct Cli {
    /// Base URL of the chat backend (overrides TENANT_CHAT_BACKEND_URL and the config file)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
    /// Check that the backend is reachable
    Status,
    /// Show the config file location and the backend in use
    Config {
        /// Write the backend URL in use to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging first, so config problems are recorded somewhere visible
    let _guard = match cli.command {
        None => Some(logging::init_file()?),
        Some(_) => {
            logging::init_stderr()?;
            None
        }
    };

    let config = match Config::config_path() {
        Ok(path) => load_config(&path),
        Err(err) => {
            tracing::warn!(error = %err, "no config directory, using defaults");
            Config::new()
        }
    };
    let backend_url = config.resolve_backend_url(cli.backend_url.as_deref());

    match cli.command {
        None => run_tui(backend_url).await,
        Some(Commands::Ask { question }) => ask(&backend_url, question).await,
        Some(Commands::Status) => status(&backend_url).await,
        Some(Commands::Config { save }) => show_config(config, backend_url, save),
    }
}

/// Load the config file, falling back to defaults if it can't be read.
fn load_config(path: &Path) -> Config {
    Config::load_from(path).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable config");
        Config::new()
    })
}

async fn run_tui(backend_url: String) -> Result<()> {
    tracing::info!(%backend_url, "starting chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let backend: Arc<dyn ChatBackend> = Arc::new(HttpBackend::new(&backend_url));
    let mut app = App::new(backend, backend_url, events.sender());

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    tracing::info!(messages = app.session.messages().len(), "chat closed");
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}

async fn ask(backend_url: &str, question: String) -> Result<()> {
    let backend = HttpBackend::new(backend_url);
    let mut session = Session::new();
    session.update_draft(question);

    if !session.submit(&backend).await {
        bail!("Question is empty");
    }

    if let Some(answer) = session.messages().last() {
        println!("{}", answer.content);
    }
    Ok(())
}

async fn status(backend_url: &str) -> Result<()> {
    let backend = HttpBackend::new(backend_url);

    let health = backend
        .health()
        .await
        .with_context(|| format!("Backend at {} is not reachable", backend.base_url()))?;

    println!("{}: {}", backend.base_url(), health.status);
    if let Some(message) = health.message {
        println!("{}", message);
    }
    Ok(())
}

fn show_config(mut config: Config, backend_url: String, save: bool) -> Result<()> {
    let path = Config::config_path()?;
    println!("Config file: {}", path.display());
    println!("Backend:     {}", backend_url);

    if save {
        config.backend_url = Some(backend_url);
        config.save()?;
        println!("Saved.");
    }
    Ok(())
}
