pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use haulaway_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "haulaway",
    about = "Haulaway operator CLI",
    long_about = "Operate Haulaway migrations, config inspection, readiness checks, and offline quoting.",
    after_help = "Examples:\n  haulaway doctor --json\n  haulaway quote --items '[{\"name\":\"Sofa\",\"est_cubic_yards\":3.0}]'\n  haulaway slots"
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Config file path, skipping discovery")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "URL", help = "Override the configured database URL")]
    database_url: Option<String>,
    #[arg(long, global = true, value_name = "LEVEL", help = "Override the configured log level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database, migration, and messaging readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Price an item list offline and print the stage-by-stage breakdown")]
    Quote {
        #[arg(
            long,
            value_name = "JSON",
            help = "Items as a JSON array of {name, category, quantity, est_cubic_yards}"
        )]
        items: String,
        #[arg(
            long,
            value_name = "JSON",
            help = "Modifiers as a JSON object, e.g. '{\"stairs_flights\": 2}'"
        )]
        modifiers: Option<String>,
    },
    #[command(about = "List bookable service windows with their slot ids")]
    Slots,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        config_path: cli.config,
        require_file: false,
        overrides: ConfigOverrides {
            database_url: cli.database_url,
            log_level: cli.log_level,
            ..ConfigOverrides::default()
        },
    };

    init_logging(&options);

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(&options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&options) }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(&options, json) }
        }
        Command::Quote { items, modifiers } => commands::quote::run(&items, modifiers.as_deref()),
        Command::Slots => commands::slots::run(&options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so command output on stdout stays machine-readable.
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(options: &LoadOptions) {
    let logging = AppConfig::load(options.clone())
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
