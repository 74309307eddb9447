use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use weather_chat_agent::WeatherAgent;
use weather_chat_agent::assemble::{AssembledResponse, assemble_body};
use weather_chat_agent::client::AgentClient;
use weather_chat_core::config::{Config, LoggingConfig};

mod surface;

use surface::{ChatSurface, QUICK_QUESTIONS, render_entry};

#[derive(Parser)]
#[command(
    name = "weather-chat",
    about = "Chat with a weather agent from the terminal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,

    /// Ask a single question and print the reply
    Ask {
        /// Message to send
        message: String,
    },

    /// Decode a saved agent response body ("-" reads stdin)
    Decode {
        /// Path to the raw response body
        path: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Check that the agent endpoint and thread id resolve
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config
    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(Config::config_path);

    let config = Config::load(&config_path)?;

    init_logging(&config.logging(), cli.verbose);
    tracing::debug!(path = %config_path.display(), "Loaded config");

    match cli.command {
        Commands::Chat => {
            let client = AgentClient::from_config(&config)?;
            run_chat(client).await?;
        }
        Commands::Ask { message } => {
            let client = AgentClient::from_config(&config)?;
            let reply = client.send_message(&message).await?;
            println!("{reply}");
        }
        Commands::Decode { path } => {
            let body = if path == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&path)?
            };
            match assemble_body(&body) {
                AssembledResponse::Text(text) => println!("{text}"),
                AssembledResponse::Failure(f) => {
                    anyhow::bail!(weather_chat_core::error::ChatError::from(f));
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(&config)?;
                println!("{json}");
            }
            ConfigAction::Check => {
                println!("Config: {}", config_path.display());
                let (warnings, errors) = config.validate();
                for w in &warnings {
                    println!("warning: {w}");
                }
                for e in &errors {
                    println!("error: {e}");
                }
                if !errors.is_empty() {
                    anyhow::bail!("{} configuration error(s)", errors.len());
                }
                if let Ok(settings) = config.agent_settings() {
                    println!("Endpoint: {}", settings.endpoint);
                    println!("Thread: {}", settings.thread_id);
                }
                println!("OK");
            }
        },
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        logging.level.clone().unwrap_or_else(|| "warn".into())
    };
    let directives = std::iter::once(level)
        .chain(logging.filters.iter().cloned())
        .collect::<Vec<_>>()
        .join(",");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let writer = if logging.output == "stdout" {
        BoxMakeWriter::new(std::io::stdout)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_chat<A: WeatherAgent>(agent: A) -> anyhow::Result<()> {
    let mut surface = ChatSurface::new(agent);

    println!("Weather Chat. Ask about weather conditions anywhere in the world.");
    println!("Type /history to review the conversation, /quit to leave.\n");

    loop {
        let initial = if surface.show_suggestions() {
            pick_quick_question()?
        } else {
            None
        };

        let mut prompt = Input::<String>::new().with_prompt("You").allow_empty(true);
        if let Some(question) = initial {
            prompt = prompt.with_initial_text(question);
        }
        let input = prompt.interact_text()?;

        match input.trim() {
            "/quit" | "/exit" => break,
            "/history" => {
                for entry in surface.entries() {
                    println!("{}", render_entry(entry));
                }
                println!();
                continue;
            }
            "" => continue,
            _ => {}
        }

        println!("Getting weather...");
        if let Some(entry) = surface.submit(&input).await {
            println!("{}\n", render_entry(entry));
        }
    }

    Ok(())
}

/// Offer the quick questions; `None` means the user wants to type their own.
fn pick_quick_question() -> anyhow::Result<Option<String>> {
    let mut items: Vec<&str> = QUICK_QUESTIONS.to_vec();
    items.push("Ask my own question");

    let choice = Select::new()
        .with_prompt("Try one of these common questions")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(QUICK_QUESTIONS.get(choice).map(|q| q.to_string()))
}
