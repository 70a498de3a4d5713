use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Replicate every configured table, or the ones named with --table
    Run {
        #[arg(long, help = "Config file path")]
        config: PathBuf,

        #[arg(long, help = "Optional .env file used to expand ${VAR} references")]
        env_file: Option<PathBuf>,

        #[arg(
            long = "table",
            value_name = "SCHEMA.TABLE",
            help = "Only run this table; may be repeated"
        )]
        tables: Vec<String>,

        #[arg(long, help = "Read and count rows without writing or committing watermarks")]
        test_mode: bool,

        #[arg(long, help = "Print summaries as JSON instead of a table")]
        json: bool,
    },
    Watermark {
        #[command(subcommand)]
        command: WatermarkCommand,
    },
    /// Open a connection and run `SELECT 1`
    TestConn {
        /// Connection kind: "postgres" or "mysql"
        #[arg(long)]
        kind: String,

        /// Connection URL
        #[arg(long)]
        url: String,
    },
    /// Parse and validate a config file, then print the resolved tables
    Validate {
        #[arg(long, help = "Config file path")]
        config: PathBuf,

        #[arg(long, help = "Optional .env file used to expand ${VAR} references")]
        env_file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum WatermarkCommand {
    /// List stored watermarks
    Show {
        #[arg(long, help = "Config file path")]
        config: PathBuf,

        #[arg(long, help = "Optional .env file used to expand ${VAR} references")]
        env_file: Option<PathBuf>,

        #[arg(long, help = "Print records as JSON instead of a table")]
        json: bool,
    },
}
