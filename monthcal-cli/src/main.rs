mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Datelike;
use clap::{Parser, Subcommand};
use monthcal_core::config::MonthcalConfig;
use monthcal_core::month::CalendarMonth;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "monthcal")]
#[command(about = "Browse a site's event calendar month by month")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a month grid with its events
    Show {
        /// Year to show (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month to show, 1-12 (defaults to the current month)
        #[arg(short, long)]
        month: Option<u32>,

        /// Months to move from the chosen month (e.g. -1 for the previous one)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,

        /// Read events from a JSON file instead of the server
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Step through months interactively
    Browse {
        /// Read events from a JSON file instead of the server
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Account commands
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Show config paths and settings, optionally updating them
    Config {
        #[arg(long)]
        base_url: Option<String>,

        /// 0 = Sunday .. 6 = Saturday
        #[arg(long)]
        first_day_of_week: Option<u8>,

        /// IANA timezone name, e.g. "Africa/Nairobi"
        #[arg(long)]
        timezone: Option<String>,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Ask the server who we are
    Status,
    /// Check credentials by logging in (and out again)
    Login {
        username: String,

        #[arg(long)]
        remember_me: bool,
    },
    /// Create an account
    Register {
        /// Form field as key=value (repeatable)
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Log in and update profile fields
    Profile {
        username: String,

        /// Form field as key=value (repeatable)
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = MonthcalConfig::load()?;

    match cli.command {
        Commands::Show {
            year,
            month,
            offset,
            file,
        } => {
            let tz = commands::display_timezone(&config)?;
            let month = resolve_month(year, month, offset, commands::today(tz))?;
            commands::show::run(&config, month, file).await
        }
        Commands::Browse { file } => commands::browse::run(&config, file).await,
        Commands::Auth { command } => match command {
            AuthCommands::Status => commands::auth::status(&config).await,
            AuthCommands::Login {
                username,
                remember_me,
            } => commands::auth::login(&config, &username, remember_me).await,
            AuthCommands::Register { fields } => commands::auth::register(&config, fields).await,
            AuthCommands::Profile { username, fields } => {
                commands::auth::profile(&config, &username, fields).await
            }
        },
        Commands::Config {
            base_url,
            first_day_of_week,
            timezone,
        } => commands::config::run(config, base_url, first_day_of_week, timezone),
    }
}

/// Log to stderr so rendered calendars stay clean; `MONTHCAL_LOG` sets the filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("MONTHCAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_month(
    year: Option<i32>,
    month: Option<u32>,
    offset: i32,
    today: chrono::NaiveDate,
) -> Result<CalendarMonth> {
    let base = CalendarMonth::from_number(
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
    )?;

    Ok(base.offset(offset)?)
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Invalid field '{}'. Expected key=value", raw))?;

    if key.trim().is_empty() {
        return Err(format!("Invalid field '{}'. Key is empty", raw));
    }

    Ok((key.trim().to_string(), value.to_string()))
}
