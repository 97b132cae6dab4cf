mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use waymark::Revision;

#[derive(Parser)]
#[command(name = "waymark")]
#[command(about = "Revision-tracked database migrations", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new migration definition file
    Generate {
        /// Migration name, e.g. create_users
        name: String,

        /// Directory for definition files (default: db/migrations)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Scaffold a CREATE TABLE for this table
        #[arg(long)]
        table: Option<String>,
    },

    /// Apply pending migrations up to the target revision
    Up {
        /// Target revision (defaults to the highest known)
        revision: Option<i64>,

        /// Directory for definition files (default: db/migrations)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Revert the target revision
    Down {
        /// Revision to revert (defaults to the most recently applied)
        revision: Option<i64>,

        /// Directory for definition files (default: db/migrations)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Show applied/pending state for every known migration
    Status {
        /// Directory for definition files (default: db/migrations)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate { name, dir, table } => {
            commands::generate::run(&name, dir.as_deref(), table.as_deref())
        }
        Commands::Up { revision, dir } => {
            commands::up::run(revision.map(Revision::from), dir.as_deref()).await
        }
        Commands::Down { revision, dir } => {
            commands::down::run(revision.map(Revision::from), dir.as_deref()).await
        }
        Commands::Status { dir, json } => commands::status::run(dir.as_deref(), json).await,
    }
}
