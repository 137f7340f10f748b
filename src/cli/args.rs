use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use ncloud_provider::config::{
    DEFAULT_PROFILE, ProviderConfig, Site, default_profile_path, load_profile, resolve_credentials,
};
use ncloud_provider::error::ProviderError;
use ncloud_provider::network::Platform;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args)]
pub struct ProviderArgs {
    #[arg(long, global = true, env = "NCLOUD_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    #[arg(long, global = true, env = "NCLOUD_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    #[arg(long, global = true, env = "NCLOUD_REGION")]
    pub region: Option<String>,

    #[arg(long, global = true, env = "NCLOUD_SITE", value_enum, default_value = "public")]
    pub site: Site,

    #[arg(long, global = true, env = "NCLOUD_PLATFORM", value_enum, default_value = "vpc")]
    pub platform: Platform,

    #[arg(long, global = true, env = "NCLOUD_PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Profile file, defaults to ~/.ncloud/configure
    #[arg(long, global = true)]
    pub profile_file: Option<PathBuf>,

    #[arg(long, global = true, env = "NCLOUD_API_GW")]
    pub api_gw: Option<String>,

    /// Seconds between status checks while waiting for changes to apply
    #[arg(long, global = true, default_value_t = 3)]
    pub poll_interval: u64,
}

impl std::fmt::Debug for ProviderArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderArgs")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("region", &self.region)
            .field("site", &self.site)
            .field("platform", &self.platform)
            .field("profile", &self.profile)
            .field("profile_file", &self.profile_file)
            .field("api_gw", &self.api_gw)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl ProviderArgs {
    /// Flags and environment first, then the profile file.
    pub fn to_config(&self) -> Result<ProviderConfig, ProviderError> {
        let profile_path = self.profile_file.clone().or_else(default_profile_path);
        let profile = match &profile_path {
            Some(path) => load_profile(path, &self.profile)?,
            None => None,
        };

        let (access_key, secret_key) = resolve_credentials(
            self.access_key.clone(),
            self.secret_key.clone(),
            profile.as_ref(),
        )?;

        let mut config = ProviderConfig::new(access_key, secret_key)
            .with_site(self.site)
            .with_platform(self.platform)
            .with_poll_interval(Duration::from_secs(self.poll_interval));
        if let Some(region) = self
            .region
            .clone()
            .or_else(|| profile.as_ref().and_then(|p| p.region.clone()))
        {
            config = config.with_region(region);
        }
        if let Some(url) = self
            .api_gw
            .clone()
            .or_else(|| profile.as_ref().and_then(|p| p.api_url.clone()))
        {
            config = config.with_api_gateway(url);
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List resource and data source types
    Resources,
    /// Show the schema of a type
    Schema { type_name: String },
    /// Check a configuration without calling the API
    Validate(ConfigArgs),
    Create(ConfigArgs),
    Read(StateArgs),
    Update {
        #[command(flatten)]
        state: StateArgs,

        /// Desired configuration (JSON)
        #[arg(long)]
        file: PathBuf,
    },
    Delete(StateArgs),
    /// Read a data source
    Data(DataArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    pub type_name: String,

    /// Resource configuration (JSON)
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct StateArgs {
    pub type_name: String,

    #[arg(long)]
    pub id: Option<String>,

    /// Stored state (JSON), as printed by create or read
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DataArgs {
    pub type_name: String,

    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub fn read_json(path: &Path) -> Result<Value, ProviderError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

impl StateArgs {
    /// State from `--state`, with `--id` taking precedence over its `id`.
    pub fn load(&self) -> Result<Value, ProviderError> {
        let mut state = match &self.state {
            Some(path) => read_json(path)?,
            None => Value::Object(Default::default()),
        };
        let Some(object) = state.as_object_mut() else {
            return Err(ProviderError::Config(
                "state file must contain a JSON object".to_string(),
            ));
        };
        if let Some(id) = &self.id {
            object.insert("id".to_string(), Value::String(id.clone()));
        }
        if !object.contains_key("id") {
            return Err(ProviderError::MissingAttribute("id".to_string()));
        }
        Ok(state)
    }
}
