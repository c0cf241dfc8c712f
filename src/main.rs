mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use contentbox::config::Config;
use contentbox::serializer::{self, DecodeLimits};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

fn load_config(path: Option<PathBuf>) -> Result<Config, AnyError> {
    let config = match path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            let config = load_config(args.config)?;
            contentbox::api::run(config, args.address).await?;
        }
        Commands::Store(args) => {
            let config = load_config(args.config)?;
            let registry = config.build_registry()?;
            let instance = registry
                .get(&args.instance)
                .ok_or_else(|| format!("Unknown instance: {}", args.instance))?;

            let data = tokio::fs::read(&args.file).await?;
            let uid = instance.store(data).await?;
            let mut url = instance.fetch(&uid).url();
            if let Some(name) = args.file.file_name().and_then(|n| n.to_str()) {
                url = format!("{url}/{name}");
            }

            println!("{uid}\t{url}");
        }
        Commands::Decode(args) => {
            let steps = serializer::decode(&args.token, &DecodeLimits::default())?;
            println!("{}", serde_json::to_string_pretty(&steps)?);
        }
    }

    Ok(())
}
