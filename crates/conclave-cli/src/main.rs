use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use conclave_core::{
    AgentRegistry, HistorySource, InMemoryHistory, Message, PanelDefinition, ResponseConstructor,
    ThreadMessage, TurnSink,
};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::ConclaveConfig;

const LOCAL_USER: &str = "local";

#[derive(Parser)]
#[command(name = "conclave")]
#[command(version)]
#[command(about = "Conclave: ask a panel of LLM agents, get one answer")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with default config and agent panel
    Init,

    /// Show current configuration
    Config,

    /// List the agents in the panel
    Agents,

    /// Send a one-shot message to the panel
    Ask {
        /// The message to send
        message: String,

        /// JSON file with prior messages ([{"role": "user", "content": "..."}])
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Interactive conversation on stdin
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => cmd_init().await,
        Commands::Config => cmd_config(&cli.config).await,
        Commands::Agents => cmd_agents(&cli.config).await,
        Commands::Ask { message, history } => cmd_ask(&cli.config, &message, history.as_deref()).await,
        Commands::Chat => cmd_chat(&cli.config).await,
    }
}

/// Prints each turn the way a chat thread would show it
struct ConsoleSink;

impl TurnSink for ConsoleSink {
    fn on_turn(&mut self, role: &str, content: &str) -> Result<(ThreadMessage, DateTime<Utc>)> {
        let timestamp = Utc::now();
        println!("[{}] *{}:*\n{}\n", timestamp.format("%H:%M:%S"), role, content);
        Ok((ThreadMessage::new(role, content), timestamp))
    }
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        let default_config = include_str!("../../../config/default.toml");
        tokio::fs::write(&config_path, default_config).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&config_path, std::fs::Permissions::from_mode(0o600)).await?;
        }
        info!("Created default config at {}", config_path.display());
    }

    let panel_path = config_dir.join("agents.json");
    if panel_path.exists() {
        warn!("Agent panel already exists at {}", panel_path.display());
    } else {
        tokio::fs::write(&panel_path, include_str!("../../../panel/agents.json")).await?;
        info!("Created agent panel at {}", panel_path.display());
    }

    println!("Conclave initialized at {}", config_dir.display());
    println!(
        "Set OPENAI_API_KEY, ANTHROPIC_API_KEY and GEMINI_API_KEY, or edit {}.",
        config_path.display()
    );
    Ok(())
}

async fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = ConclaveConfig::load(config_path)?;
    println!("{:#?}", cfg);
    Ok(())
}

async fn cmd_agents(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = ConclaveConfig::load(config_path)?;
    let panel = PanelDefinition::load(&cfg.panel_path())?;
    let mut specs = panel.into_specs();
    specs.sort_by(|a, b| a.name.cmp(&b.name));

    for spec in specs {
        let note = if spec.provider.is_supported() { "" } else { "  (unsupported)" };
        println!(
            "{:<24} {:<10} {:<32} {}{}",
            spec.name, spec.provider, spec.model_id, spec.response_format, note
        );
    }
    Ok(())
}

fn build_constructor(cfg: &ConclaveConfig) -> Result<ResponseConstructor> {
    let panel_path = cfg.panel_path();
    let panel = PanelDefinition::load(&panel_path)
        .with_context(|| format!("Failed to load agent panel from {}", panel_path.display()))?;
    let registry = AgentRegistry::load(panel, &cfg.providers)?;
    Ok(ResponseConstructor::new(&registry, cfg.constructor.clone())?)
}

fn load_history_file(path: &Path) -> Result<Vec<Message>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse history file {}", path.display()))
}

async fn cmd_ask(config_path: &Option<PathBuf>, message: &str, history: Option<&Path>) -> Result<()> {
    let cfg = ConclaveConfig::load(config_path)?;
    let constructor = build_constructor(&cfg)?;

    let mut messages = match history {
        Some(path) => load_history_file(path)?,
        None => Vec::new(),
    };
    messages.push(Message::user(message));

    let response = constructor.respond(&messages, &mut ConsoleSink).await?;
    info!(
        "Answered via {} path with {} trace turns",
        response.route,
        response.trace.len()
    );
    println!("{}", response.answer);
    Ok(())
}

async fn cmd_chat(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = ConclaveConfig::load(config_path)?;
    let constructor = build_constructor(&cfg)?;
    let store = InMemoryHistory::new();

    println!("Conclave chat. Type /reset to forget the conversation, /quit to exit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                store.clear(LOCAL_USER).await;
                println!("Conversation cleared.");
                continue;
            }
            _ => {}
        }

        let mut messages = store.conversation_history(LOCAL_USER).await?;
        messages.push(Message::user(line));

        // A failed run keeps the conversation as it was
        match constructor.respond(&messages, &mut ConsoleSink).await {
            Ok(response) => {
                println!("{}\n", response.answer);
                store.append(LOCAL_USER, Message::user(line)).await;
                store.append(LOCAL_USER, Message::assistant(response.answer)).await;
            }
            Err(e) => {
                warn!("Run failed: {}", e);
                eprintln!("Error: {}", e);
            }
        }
    }
    Ok(())
}
