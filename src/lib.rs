pub mod config;
pub mod crypto;
pub mod error;
pub mod gate;
pub mod ops;
pub mod resolver;
pub mod store;

use std::process::ExitCode;

use config::Command;

pub async fn run(cfg: config::Config) -> anyhow::Result<ExitCode> {
    use tracing_subscriber::EnvFilter;
    let level = match cfg.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // stderr only: stdout is the protocol channel in resolve mode and the
    // plaintext channel in get mode.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(store = ?cfg.store, "Starting keywarden");

    match &cfg.command {
        Command::Set {
            id,
            label,
            value,
            yes,
        } => {
            ops::set(&cfg, id, label.as_deref(), value.as_deref(), *yes).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Get { id } => {
            ops::get(&cfg, id).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::List => {
            ops::list(&cfg)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Delete { id, yes } => {
            ops::delete(&cfg, id, *yes)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Clear { yes } => {
            ops::clear(&cfg, *yes)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Resolve => resolver::run(&cfg).await,
    }
}
