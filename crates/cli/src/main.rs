mod commands;
mod config;
mod interactive;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use qz_core::domain::tone::Tone;

#[derive(Parser)]
#[command(name = "quizontal")]
#[command(about = "Rewrite text in a chosen tone with a hosted language model")]
#[command(version)]
struct Cli {
    /// Provider to use: gemini or openrouter (overrides stored settings)
    #[arg(long, global = true, env = "QZ_PROVIDER")]
    provider: Option<String>,

    /// Comma-separated model candidates, tried in order on rate limits
    #[arg(long, global = true, env = "QZ_MODELS", value_delimiter = ',')]
    models: Option<Vec<String>>,

    /// SQLite file holding history and settings (default: QZ_DB_PATH or the user data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Paraphrase TEXT (reads stdin when omitted)
    Paraphrase {
        text: Option<String>,

        /// Tone of the rewrite
        #[arg(short, long, default_value_t = Tone::Standard)]
        tone: Tone,

        /// Also copy the result to the clipboard
        #[arg(short, long)]
        copy: bool,
    },

    /// List recent paraphrases, newest first
    History {
        /// Print the raw JSON list
        #[arg(long)]
        json: bool,
    },

    /// Show a history entry by id or by its position in `history`
    Restore {
        target: String,

        /// Copy the restored output to the clipboard
        #[arg(short, long)]
        copy: bool,
    },

    /// List the available tones
    Tones,

    /// Delete all stored history
    ClearHistory,

    /// Show or change stored settings
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Line-mode session: each line is paraphrased, /help lists commands
    Interactive {
        /// Starting tone
        #[arg(short, long, default_value_t = Tone::Standard)]
        tone: Tone,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print the effective settings as JSON
    Show,

    /// Store a setting (provider, models, temperature, top_p, base_url, request_timeout_secs)
    Set { key: String, value: String },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let overrides = config::Overrides::from_flags(cli.provider.as_deref(), cli.models)?;
    let ctx = commands::Context::open(cli.db.as_deref(), &overrides)?;

    match cli.command {
        Commands::Paraphrase { text, tone, copy } => {
            commands::run_paraphrase(&ctx, text, tone, copy).await
        }
        Commands::History { json } => commands::run_history(&ctx, json),
        Commands::Restore { target, copy } => commands::run_restore(&ctx, &target, copy),
        Commands::Tones => {
            commands::run_tones();
            Ok(())
        }
        Commands::ClearHistory => commands::run_clear_history(&ctx),
        Commands::Settings(SettingsCommands::Show) => commands::run_settings_show(&ctx),
        Commands::Settings(SettingsCommands::Set { key, value }) => {
            commands::run_settings_set(&ctx, &key, &value)
        }
        Commands::Interactive { tone } => {
            let mut controller = ctx.controller()?;
            interactive::run(&mut controller, tone, cli.verbose > 0).await
        }
    }
}
