//! `scribe` — account and session administration over the flat-file store.
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scribe_backend_lib::{
    auth::Registration,
    config::{LogFormat, Settings},
    AppState,
};
use scribe_common::SessionCookie;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scribe", version, about = "Manage scribe accounts and login sessions")]
struct Cli {
    /// Config file (toml, yaml or json); defaults to ./config.*
    #[arg(short, long, env = "SCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SCRIBE_ACCOUNT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        website: Option<String>,
    },
    /// Check credentials and print a session cookie
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "SCRIBE_ACCOUNT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Renew a session cookie
    Resume {
        /// Cookie JSON as printed by `login`
        cookie: String,
    },
    /// End the session named by a cookie
    Logout {
        cookie: String,
    },
    /// Change an account password
    Passwd {
        #[arg(long)]
        username: String,
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match settings.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn parse_cookie(raw: &str) -> anyhow::Result<SessionCookie> {
    SessionCookie::from_json(raw).context("cookie must be a JSON object with username, token and series")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    init_tracing(&settings);

    let data_dir = settings.data_dir.clone();
    let state = AppState::open(settings)?;
    info!(data_dir = %data_dir.display(), "store opened");

    match cli.command {
        Command::Register {
            username,
            email,
            password,
            website,
        } => {
            let account = state
                .auth
                .register(Registration {
                    username,
                    email,
                    password,
                    personal_website: website,
                })
                .await?;
            info!(username = %account.username, "registered");
            println!("{}", account.id.map(|id| id.to_hex()).unwrap_or_default());
        },
        Command::Login { username, password } => {
            let cookie = state.auth.login(&username, &password).await?;
            info!(username = %username, "session opened");
            println!("{}", cookie.to_json()?);
        },
        Command::Resume { cookie } => {
            let renewed = state.auth.resume(&parse_cookie(&cookie)?).await?;
            info!(username = %renewed.username, "session renewed");
            println!("{}", renewed.to_json()?);
        },
        Command::Logout { cookie } => {
            let cookie = parse_cookie(&cookie)?;
            state.auth.logout(&cookie).await?;
            info!(username = %cookie.username, "session closed");
        },
        Command::Passwd {
            username,
            current,
            new,
        } => {
            state.auth.change_password(&username, &current, &new).await?;
            info!(username = %username, "password changed");
        },
    }

    Ok(())
}
