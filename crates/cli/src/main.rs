use {
    clap::{Parser, Subcommand},
    decoy_common::IntelligenceRecord,
    decoy_config::DecoyConfig,
    decoy_sessions::SessionStore,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "decoy", about = "Decoy, a scam-engagement honeypot", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway.
    Gateway {
        /// Overrides `[server].bind`.
        #[arg(long)]
        bind: Option<String>,
        /// Overrides `[server].port`.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Score a message for scam indicators.
    Score { text: String },
    /// Extract bank accounts, UPI ids, phone numbers, links and keywords.
    Extract { text: String },
    /// Session management.
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List stored sessions.
    List,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration with secrets masked.
    Show,
    /// Print the path of the config file in use.
    Path,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn score_report(text: &str) -> String {
    let verdict = decoy_detect::score(text);
    let keywords: Vec<&str> = verdict.matched_keywords.iter().map(String::as_str).collect();
    format!(
        "scam:       {}\nconfidence: {:.2}\nkeywords:   {}\nnotes:      {}",
        verdict.is_scam,
        verdict.confidence,
        if keywords.is_empty() {
            "-".to_string()
        } else {
            keywords.join(", ")
        },
        verdict.notes,
    )
}

fn extract_report(text: &str) -> anyhow::Result<String> {
    let record = decoy_detect::extract(text, &IntelligenceRecord::default());
    Ok(serde_json::to_string_pretty(&record)?)
}

fn apply_overrides(config: &mut DecoyConfig, bind: Option<String>, port: Option<u16>) {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
}

async fn list_sessions(config: &DecoyConfig) -> anyhow::Result<()> {
    let store = decoy_gateway::open_store(&config.sessions).await?;
    let sessions = store.list().await;
    if sessions.is_empty() {
        println!("no sessions");
        return Ok(());
    }
    for s in sessions {
        println!(
            "{}\tmessages={}\tscam={}\tcallback_sent={}\tintel={}",
            s.id,
            s.message_count,
            s.scam_detected,
            s.callback_sent,
            s.intelligence.len()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    match cli.command {
        Commands::Gateway { bind, port } => {
            info!(version = env!("CARGO_PKG_VERSION"), "decoy starting");
            let mut config = decoy_config::discover_and_load();
            apply_overrides(&mut config, bind, port);
            decoy_gateway::start_gateway(&config).await
        },
        Commands::Score { text } => {
            println!("{}", score_report(&text));
            Ok(())
        },
        Commands::Extract { text } => {
            println!("{}", extract_report(&text)?);
            Ok(())
        },
        Commands::Sessions {
            action: SessionAction::List,
        } => list_sessions(&decoy_config::discover_and_load()).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = decoy_config::discover_and_load();
                print!("{}", decoy_config::to_redacted_toml(&config)?);
                Ok(())
            },
            ConfigAction::Path => {
                match decoy_config::config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("no config file found, using defaults"),
                }
                Ok(())
            },
        },
    }
}
