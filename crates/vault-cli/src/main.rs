//! Config Vault CLI
//!
//! Encrypts and decrypts single configuration values, toggles `ENC(...)`
//! placeholders in `.properties` / `.yml` files, and manages a local store of
//! named secrets.
//!
//! The passphrase comes from `--password` / `CONFIG_VAULT_PASSWORD` and is
//! prompted for when neither is set.

mod commands;
mod prompt;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use vault_core::{default_data_dir, SettingsManager};

use commands::CommandContext;

/// Config Vault - encrypted configuration values and secret storage
#[derive(Parser, Debug)]
#[command(name = "config-vault")]
#[command(version)]
#[command(about = "Config Vault - encrypt configuration values and manage secrets")]
struct Args {
    /// Data directory holding settings.json and the secret store
    #[arg(long, global = true, env = "CONFIG_VAULT_DIR")]
    dir: Option<PathBuf>,

    /// Passphrase (prompted for when not given)
    #[arg(long, global = true, env = "CONFIG_VAULT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a single value and print it as ENC(...)
    Encrypt {
        /// Plaintext value
        text: String,
    },
    /// Decrypt a single value, with or without the ENC(...) wrapper
    Decrypt {
        /// Encrypted value
        text: String,
    },
    /// Toggle ENC(...) placeholders in config files or directories
    Process {
        /// Files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Store a secret
    Put {
        /// Secret name
        name: String,
        /// Secret value
        value: String,
        /// Store the value without encryption
        #[arg(long)]
        plain: bool,
    },
    /// Print a stored secret
    Get {
        /// Secret name
        name: String,
    },
    /// List stored secret names
    List,
    /// Remove a stored secret
    Remove {
        /// Secret name
        name: String,
    },
    /// Re-encrypt all stored secrets under a new passphrase
    Rotate {
        /// New passphrase (prompted for when not given)
        #[arg(long, env = "CONFIG_VAULT_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr, command output to stdout
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let dir = match args.dir {
        Some(dir) => dir,
        None => default_data_dir().context("Failed to determine data directory")?,
    };
    debug!("Using data directory {:?}", dir);

    let settings = SettingsManager::new(&dir)
        .with_context(|| format!("Failed to load settings from {}", dir.display()))?;
    let ctx = CommandContext::new(&settings);

    let password = || prompt::passphrase(args.password.as_deref(), "Passphrase: ");
    let mut out = std::io::stdout().lock();

    match args.command {
        Command::Encrypt { text } => ctx.encrypt(&text, &password()?, &mut out)?,
        Command::Decrypt { text } => ctx.decrypt(&text, &password()?, &mut out)?,
        Command::Process { paths } => ctx.process(&paths, &mut out).await?,
        Command::Put { name, value, plain } => {
            let passphrase = if plain { None } else { Some(password()?) };
            ctx.put(&name, &value, passphrase.as_deref().map(String::as_str))
                .await?;
        }
        Command::Get { name } => {
            let passphrase = ctx.needs_passphrase(&name).await?.then(password).transpose()?;
            ctx.get(&name, passphrase.as_deref().map(String::as_str), &mut out)
                .await?;
        }
        Command::List => ctx.list(&mut out).await?,
        Command::Remove { name } => ctx.remove(&name).await?,
        Command::Rotate { new_password } => {
            let old = password()?;
            let new = prompt::new_passphrase(new_password.as_deref())?;
            ctx.rotate(&old, &new, &mut out).await?;
        }
    }

    Ok(())
}
