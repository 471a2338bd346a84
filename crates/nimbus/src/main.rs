mod commands;
mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use nimbus_config::NimbusConfig;
use nimbus_driver::{Collection, UniformError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(about = "One front end, many clouds.", long_about = None)]
struct Cli {
    /// Config file (overrides discovery)
    #[arg(long, global = true, env = "NIMBUS_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Backend user
    #[arg(long, global = true, env = "NIMBUS_USER", hide_env_values = true)]
    user: Option<String>,

    /// Backend password
    #[arg(long, global = true, env = "NIMBUS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available drivers
    Drivers,
    /// List hardware profiles
    Profiles {
        /// Only profiles matching KEY=VALUE (repeatable)
        #[arg(short, long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },
    /// List optional features per collection
    Features,
    /// Show the lifecycle of a collection
    States {
        /// Collection (instances, storage_volumes, ...)
        collection: Collection,
    },
    /// List resources of a collection
    List {
        /// Collection (instances, images, realms, storage_volumes, storage_snapshots)
        collection: Collection,
        /// Only resources matching KEY=VALUE (repeatable)
        #[arg(short, long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,
    },
    /// Show a single resource
    Show {
        collection: Collection,
        id: String,
    },
    /// Launch an instance
    CreateInstance {
        /// Image to launch from
        #[arg(long)]
        image: String,
        /// Hardware profile name
        #[arg(long)]
        profile: Option<String>,
        /// Override a profile property, as KEY=VALUE (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
        /// Instance name
        #[arg(long)]
        name: Option<String>,
        /// Realm to launch in
        #[arg(long)]
        realm: Option<String>,
        /// User data passed to the instance
        #[arg(long)]
        user_data: Option<String>,
    },
    /// Run a lifecycle action on a resource
    Act {
        collection: Collection,
        id: String,
        action: String,
    },
    /// Destroy a resource
    Destroy {
        collection: Collection,
        id: String,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Version needs no config
    if matches!(cli.command, Commands::Version) {
        println!("nimbus {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => NimbusConfig::load(path)?.with_env_overrides(),
        None => NimbusConfig::discover()?,
    };

    // Logs go to stderr so JSON output stays clean
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli, &config).await {
        match err.downcast_ref::<UniformError>() {
            Some(uniform) => eprintln!(
                "{} {} ({}): {}",
                "Error:".red().bold(),
                uniform.kind,
                uniform.status,
                uniform.message
            ),
            None => eprintln!("{} {:#}", "Error:".red().bold(), err),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli, config: &NimbusConfig) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Drivers) {
        commands::catalog::drivers(cli.json)?;
        return Ok(());
    }

    let ctx = commands::Context::new(config, cli.user, cli.password, cli.json)?;

    match cli.command {
        Commands::Profiles { filters } => commands::catalog::profiles(&ctx, &filters)?,
        Commands::Features => commands::catalog::features(&ctx)?,
        Commands::States { collection } => commands::catalog::states(&ctx, collection)?,
        Commands::List {
            collection,
            filters,
        } => commands::resources::list(&ctx, collection, &filters).await?,
        Commands::Show { collection, id } => {
            commands::resources::show(&ctx, collection, &id).await?
        }
        Commands::CreateInstance {
            image,
            profile,
            overrides,
            name,
            realm,
            user_data,
        } => {
            let request = commands::resources::InstanceRequest {
                image,
                profile,
                overrides,
                name,
                realm,
                user_data,
            };
            commands::resources::create_instance(&ctx, request).await?
        }
        Commands::Act {
            collection,
            id,
            action,
        } => commands::resources::act(&ctx, collection, &id, &action).await?,
        Commands::Destroy { collection, id } => {
            commands::resources::destroy(&ctx, collection, &id).await?
        }
        Commands::Drivers => unreachable!("Drivers is handled before driver loading"),
        Commands::Version => unreachable!("Version is handled before config loading"),
    }

    Ok(())
}
