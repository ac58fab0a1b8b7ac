use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hrp_config::ConfigMode;

mod commands;

use commands::evaluate::EvaluateArgs;

#[derive(Parser)]
#[command(name = "hrp")]
#[command(about = "Heart-risk model registry and promotion gate", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Production model location commands
    Registry {
        #[command(subcommand)]
        cmd: RegistryCmd,
    },

    /// Dataset upload / download
    Table {
        #[command(subcommand)]
        cmd: TableCmd,
    },

    /// Gate a freshly trained candidate against the production model.
    Evaluate {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Held-out CSV including the target column
        #[arg(long)]
        test_csv: PathBuf,

        /// Candidate F1 on the same held-out data, computed at training time
        #[arg(long)]
        candidate_score: f64,

        /// Serialized candidate model file
        #[arg(long)]
        trained_model: PathBuf,

        /// Upload the candidate when accepted
        #[arg(long, default_value_t = false)]
        promote: bool,

        /// Remove the local model file after a successful upload
        #[arg(long, default_value_t = false)]
        delete_local: bool,

        /// Override /evaluation/report_dir
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// Overwrite the production model unconditionally.
    Promote {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        model_file: PathBuf,

        #[arg(long, default_value_t = false)]
        delete_local: bool,
    },

    /// Score a local CSV with the production model.
    Predict {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        csv: PathBuf,
    },
}

#[derive(Subcommand)]
enum RegistryCmd {
    /// Print backend, model location and presence
    Status {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },

    /// Create the `<folder>/` marker object if it does not exist
    EnsureFolder {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Folder key, without trailing '/'
        #[arg(long)]
        folder: String,
    },
}

#[derive(Subcommand)]
enum TableCmd {
    /// Upload a local CSV to `<bucket>/<key>`
    Push {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        key: String,

        #[arg(long)]
        file: PathBuf,
    },

    /// Download `<bucket>/<key>` into a local CSV
    Pull {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        key: String,

        #[arg(long)]
        file: PathBuf,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // dev-time convenience; absent file is fine
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = hrp_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Registry { cmd } => match cmd {
            RegistryCmd::Status { config_paths } => {
                let ctx = commands::open_registry(&config_paths, ConfigMode::Serve)?;
                commands::registry::status(&ctx).await?;
            }
            RegistryCmd::EnsureFolder {
                config_paths,
                folder,
            } => {
                let ctx = commands::open_registry(&config_paths, ConfigMode::Serve)?;
                commands::registry::ensure_folder(&ctx, &folder).await?;
            }
        },

        Commands::Table { cmd } => match cmd {
            TableCmd::Push {
                config_paths,
                key,
                file,
            } => {
                let ctx = commands::open_registry(&config_paths, ConfigMode::Train)?;
                commands::table::push(&ctx, &key, &file).await?;
            }
            TableCmd::Pull {
                config_paths,
                key,
                file,
            } => {
                let ctx = commands::open_registry(&config_paths, ConfigMode::Train)?;
                commands::table::pull(&ctx, &key, &file).await?;
            }
        },

        Commands::Evaluate {
            config_paths,
            test_csv,
            candidate_score,
            trained_model,
            promote,
            delete_local,
            report_dir,
        } => {
            let ctx = commands::open_registry(&config_paths, ConfigMode::Train)?;
            commands::evaluate::run(
                &ctx,
                EvaluateArgs {
                    test_csv: &test_csv,
                    candidate_score,
                    trained_model: &trained_model,
                    promote,
                    delete_local,
                    report_dir,
                },
            )
            .await?;
        }

        Commands::Promote {
            config_paths,
            model_file,
            delete_local,
        } => {
            let ctx = commands::open_registry(&config_paths, ConfigMode::Train)?;
            commands::registry::promote(&ctx, &model_file, delete_local).await?;
        }

        Commands::Predict { config_paths, csv } => {
            let ctx = commands::open_registry(&config_paths, ConfigMode::Serve)?;
            commands::registry::predict(&ctx, &csv).await?;
        }
    }

    Ok(())
}
