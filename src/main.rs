use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use share_paste::config::{format_config, Config, CONFIG_KEYS};
use share_paste::logging::{init_logging, LogConfig, Verbosity};
use share_paste::server::{run_server, ServerConfig, StorageBackend};

#[derive(Parser)]
#[command(name = "share-paste")]
#[command(version)]
#[command(about = "Paste text, get a short link")]
#[command(
    long_about = "A small pastebin server. Submitted text gets a short slug-based URL, can be protected with a password, and is listed per browser session."
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Port to start the server on (default: 3000, or default_port from config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// SQLite database file (default: database_path from config, then
        /// ~/.local/share/share-paste/app.db)
        #[arg(long, conflicts_with = "ephemeral")]
        db: Option<PathBuf>,

        /// Keep shares in memory only; everything is lost on shutdown
        #[arg(long)]
        ephemeral: bool,

        /// Public base URL used when building share links
        #[arg(long)]
        public_url: Option<String>,

        /// Mark the session cookie Secure (use when served over HTTPS)
        #[arg(long)]
        secure_cookies: bool,

        /// Open the home page in a browser once listening
        #[arg(long)]
        open: bool,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Print the config file location
    Path,
    /// Set a configuration key
    Set {
        /// One of: default_port, database_path, public_url, secure_cookies, log_file
        key: String,
        value: String,
    },
    /// Clear a configuration key
    Unset { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        Verbosity::from_occurrences(cli.verbose)
    };
    let _log_guard = init_logging(&LogConfig {
        verbosity,
        log_file: cli.log_file.or_else(|| config.log_file.clone()),
    });

    match cli.command {
        Commands::Serve {
            port,
            host,
            db,
            ephemeral,
            public_url,
            secure_cookies,
            open,
        } => {
            let storage = if ephemeral {
                StorageBackend::Memory
            } else {
                StorageBackend::Sqlite(config.effective_database_path(db))
            };

            let server_config = ServerConfig {
                host,
                base_port: config.effective_port(port),
                open_browser: open,
                storage,
                public_url: public_url.or_else(|| config.public_url.clone()),
                secure_cookies: config.effective_secure_cookies(secure_cookies),
            };

            run_server(server_config).await?;
        }
        Commands::Config { action } => run_config(config, action)?,
    }

    Ok(())
}

fn run_config(mut config: Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => println!("{}", format_config(&config)),
        ConfigAction::Path => println!("{}", Config::config_path()?.display()),
        ConfigAction::Set { key, value } => {
            config
                .set(&key, &value)
                .with_context(|| format!("Valid keys: {}", CONFIG_KEYS.join(", ")))?;
            config.save()?;
            println!("Set {} = {}", key, value);
        }
        ConfigAction::Unset { key } => {
            config
                .unset(&key)
                .with_context(|| format!("Valid keys: {}", CONFIG_KEYS.join(", ")))?;
            config.save()?;
            println!("Unset {}", key);
        }
    }
    Ok(())
}
