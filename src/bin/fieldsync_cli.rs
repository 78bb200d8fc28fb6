use clap::{Parser, Subcommand};
use fieldsync::config::FieldSyncConfig;
use fieldsync::logging::init_logging;
use fieldsync::mapping::{JsonMappingStore, MappingSetManager};
use fieldsync::notify::LogNotifier;
use fieldsync::schema::{FieldPath, FieldPathResolver, JsonSchemaDirectory, SchemaDirectory};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the JSON schema catalog
    #[arg(long, default_value = "schemas.json")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the objects in the catalog
    Objects {},
    /// List the fields of an object
    Fields {
        /// Object api name
        #[arg(required = true)]
        object: String,
    },
    /// Check that a dotted path walks the schema graph to a terminal field
    Resolve {
        /// Object the path starts from
        #[arg(long, short, required = true)]
        root: String,
        /// Dotted path, e.g. Owner.Email
        #[arg(required = true)]
        path: String,
    },
    /// Show the mappings stored for a remote entity and what blocks saving them
    Mappings {
        /// Path to the JSON mapping file
        #[arg(long, short, required = true)]
        store: PathBuf,
        /// Remote entity name
        #[arg(long, short, required = true)]
        remote: String,
        /// Local object, when the stored mappings do not name one
        #[arg(long, short)]
        local: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => FieldSyncConfig::load(path)?,
        None => FieldSyncConfig::default(),
    };
    init_logging(&config.logging)?;

    let directory = Arc::new(JsonSchemaDirectory::open(&cli.catalog)?);

    match cli.command {
        Commands::Objects {} => {
            for name in directory.object_names() {
                let label = directory.object_label(name).await?.unwrap_or_default();
                println!("{:<30} {}", name, label);
            }
        }
        Commands::Fields { object } => {
            for field in directory.field_definitions(&object).await? {
                println!("{:<30} {:<30} {}", field.api_name, field.label, field.kind);
            }
        }
        Commands::Resolve { root, path } => {
            let path: FieldPath = path.parse()?;
            let mut resolver =
                FieldPathResolver::new(directory, config.resolver.reference_target_policy);
            let resolved = resolver.resolve_path(&root, &path).await?;
            println!("{} resolves on {} ({} levels)", resolved, root, resolved.depth());
        }
        Commands::Mappings {
            store,
            remote,
            local,
        } => {
            let mut manager = MappingSetManager::new(
                &config,
                Arc::new(JsonMappingStore::new(store)),
                directory,
                Arc::new(LogNotifier),
            );
            manager.initialize(local.as_deref(), &remote).await?;

            println!("{}", manager.mapping_title());
            for record in manager.records() {
                println!(
                    "{:<6} {:<30} {:<30} {}{}",
                    record.ident.to_string(),
                    record
                        .local_path
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "-".to_string()),
                    record.remote_field.as_deref().unwrap_or("-"),
                    if record.local_to_remote { ">" } else { " " },
                    if record.remote_to_local { "<" } else { " " },
                );
            }
            for problem in manager.validate() {
                println!("! {}", problem);
            }
        }
    }
    Ok(())
}
