mod cli;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, read_json};
use ncloud_provider::output::{schema_tree, state_json, types_table};
use ncloud_provider::{Provider, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = Registry::new(cli.provider.platform);

    match cli.command {
        Command::Resources => {
            println!("{}", types_table(&registry));
        }
        Command::Schema { type_name } => {
            let schema = match registry.resource(&type_name) {
                Ok(resource) => resource.schema(),
                Err(_) => registry.data_source(&type_name)?.schema(),
            };
            println!("{}", schema_tree(&type_name, &schema));
        }
        Command::Validate(args) => {
            let config = read_json(&args.file)?;
            if registry.resource(&args.type_name).is_ok() {
                registry.validate(&args.type_name, &config)?;
            } else {
                registry.validate_data_source(&args.type_name, &config)?;
            }
            tracing::info!(resource = %args.type_name, "configuration is valid");
        }
        Command::Create(args) => {
            let provider = Provider::new(cli.provider.to_config()?)?;
            let config = read_json(&args.file)?;
            let data = provider.create(&args.type_name, config).await?;
            println!("{}", state_json(&data)?);
        }
        Command::Read(args) => {
            let provider = Provider::new(cli.provider.to_config()?)?;
            match provider.read(&args.type_name, args.load()?).await? {
                Some(data) => println!("{}", state_json(&data)?),
                None => {
                    tracing::warn!(resource = %args.type_name, "remote object no longer exists");
                    println!("null");
                }
            }
        }
        Command::Update { state, file } => {
            let provider = Provider::new(cli.provider.to_config()?)?;
            let config = read_json(&file)?;
            let prior = provider
                .read(&state.type_name, state.load()?)
                .await?
                .ok_or_else(|| eyre!("{} no longer exists", state.type_name))?;
            let data = provider
                .update(&state.type_name, prior.to_state(), config)
                .await?;
            println!("{}", state_json(&data)?);
        }
        Command::Delete(args) => {
            let provider = Provider::new(cli.provider.to_config()?)?;
            provider.delete(&args.type_name, args.load()?).await?;
            tracing::info!(resource = %args.type_name, "deleted");
        }
        Command::Data(args) => {
            let provider = Provider::new(cli.provider.to_config()?)?;
            let config = match &args.file {
                Some(path) => read_json(path)?,
                None => Value::Object(Default::default()),
            };
            let data = provider.read_data_source(&args.type_name, config).await?;
            println!("{}", state_json(&data)?);
        }
    }

    Ok(())
}
