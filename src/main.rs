use anyhow::Result;
use clap::{Parser, Subcommand};
use s3bucket::cli::{self, Session};
use s3bucket::config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "s3bucket")]
#[command(version, about = "Blocking client for objects in an S3 bucket", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(long, global = true, env = "S3BUCKET_CONFIG")]
    config: Option<String>,

    /// Profile to use from config
    #[arg(long, global = true, env = "S3BUCKET_PROFILE")]
    profile: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List keys (s3://bucket[/start-after])
    Ls {
        /// S3 path; a key part lists only keys after it
        path: String,

        /// Maximum number of keys to show (0 = unlimited)
        #[arg(long, default_value = "0")]
        max_keys: usize,
    },

    /// Write an object to stdout
    Cat {
        /// S3 path (s3://bucket/key)
        path: String,
    },

    /// Download an object into a file
    Get {
        /// S3 path (s3://bucket/key)
        path: String,

        /// Local destination file
        file: PathBuf,
    },

    /// Upload a file
    Put {
        /// Local source file
        file: PathBuf,

        /// S3 path (s3://bucket/key)
        path: String,
    },

    /// Remove an object
    Rm {
        /// S3 path to remove
        path: String,

        /// Force deletion without confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Show object info
    Stat {
        /// S3 path
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::load_config(cli.config.as_deref(), cli.profile.as_deref())?;
    let session = Session::new(&config, cli.profile.as_deref())?;

    match cli.command {
        Commands::Ls { path, max_keys } => cli::commands::cmd_ls(&session, &path, max_keys)?,
        Commands::Cat { path } => cli::commands::cmd_cat(&session, &path)?,
        Commands::Get { path, file } => cli::commands::cmd_get(&session, &path, &file)?,
        Commands::Put { file, path } => cli::commands::cmd_put(&session, &file, &path)?,
        Commands::Rm { path, force } => cli::commands::cmd_rm(&session, &path, force)?,
        Commands::Stat { path } => cli::commands::cmd_stat(&session, &path)?,
    }

    Ok(())
}
