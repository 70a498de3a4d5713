use crate::{
    commands::{Commands, WatermarkCommand},
    conn::ConnectionKind,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_config::settings;
use engine_core::metrics::Metrics;
use engine_runtime::{executor, factory::open_watermark_store};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "transfer",
    version,
    about = "Incremental table replication with persisted watermarks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match execute(cli.command, &shutdown).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn execute(command: Commands, shutdown: &ShutdownCoordinator) -> Result<ExitCode, CliError> {
    match command {
        Commands::Run {
            config,
            env_file,
            tables,
            test_mode,
            json,
        } => {
            let mut validated =
                settings::load(&config, env_file.as_deref())?.select_tables(&tables)?;
            if test_mode {
                validated = validated.force_test_mode();
            }
            info!(
                config = %config.display(),
                tables = validated.requests.len(),
                test_mode,
                "Loaded configuration"
            );

            let metrics = Metrics::new();
            let summaries =
                executor::run(&validated, metrics.clone(), shutdown.cancel_token()).await?;
            output::print_summaries(&summaries, &metrics.snapshot(), json)?;

            let all_succeeded = summaries.iter().all(|s| s.success);
            Ok(ExitCode::for_run(all_succeeded, shutdown.is_shutdown_requested()))
        }
        Commands::Watermark { command } => match command {
            WatermarkCommand::Show {
                config,
                env_file,
                json,
            } => {
                let validated = settings::load(&config, env_file.as_deref())?;
                let store =
                    open_watermark_store(&validated.state, &validated.destination.url).await?;
                let records = store.list().await?;
                output::print_watermarks(&records, json)?;
                Ok(ExitCode::Success)
            }
        },
        Commands::TestConn { kind, url } => {
            let kind: ConnectionKind = kind.parse()?;
            conn::ping(kind, &url).await?;
            println!("Connection OK");
            Ok(ExitCode::Success)
        }
        Commands::Validate { config, env_file } => {
            let validated = settings::load(&config, env_file.as_deref())?;
            output::print_validated(&validated);
            Ok(ExitCode::Success)
        }
    }
}
