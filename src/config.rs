use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ProviderError;
use crate::network::Platform;

pub const DEFAULT_REGION: &str = "KR";
pub const DEFAULT_PROFILE: &str = "DEFAULT";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Platform site; each one has its own API gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Site {
    #[default]
    Public,
    Gov,
    Fin,
}

impl Site {
    pub fn api_gateway(self) -> &'static str {
        match self {
            Site::Public => "https://ncloud.apigw.ntruss.com",
            Site::Gov => "https://ncloud.apigw.gov-ntruss.com",
            Site::Fin => "https://fin-ncloud.apigw.fin-ntruss.com",
        }
    }
}

/// Provider-wide configuration. Immutable once built; shared by reference
/// with every resource operation.
#[derive(Clone)]
pub struct ProviderConfig {
    pub access_key: String,
    secret_key: String,
    pub region: String,
    pub site: Site,
    pub platform: Platform,
    pub api_gateway: Option<String>,
    pub poll_interval: Duration,
}

impl ProviderConfig {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: DEFAULT_REGION.to_string(),
            site: Site::default(),
            platform: Platform::Vpc,
            api_gateway: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_site(mut self, site: Site) -> Self {
        self.site = site;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_api_gateway(mut self, url: impl Into<String>) -> Self {
        self.api_gateway = Some(url.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn api_gateway_url(&self) -> String {
        self.api_gateway
            .clone()
            .unwrap_or_else(|| self.site.api_gateway().to_string())
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("site", &self.site)
            .field("platform", &self.platform)
            .field("api_gateway", &self.api_gateway)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Credentials stored in the CLI profile file.
#[derive(Clone, Default, PartialEq)]
pub struct Profile {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub api_url: Option<String>,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("region", &self.region)
            .field("api_url", &self.api_url)
            .finish()
    }
}

pub fn default_profile_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ncloud").join("configure"))
}

/// Reads one section of the profile file. A missing file or section is not
/// an error. Section names match case-insensitively.
pub fn load_profile(path: &Path, name: &str) -> Result<Option<Profile>, ProviderError> {
    if !path.exists() {
        return Ok(None);
    }
    let source = ::config::File::from(path).format(::config::FileFormat::Ini);
    select_profile(source, name).map_err(|e| {
        ProviderError::Config(format!("invalid profile file {}: {}", path.display(), e))
    })
}

fn select_profile<S>(source: S, name: &str) -> Result<Option<Profile>, ::config::ConfigError>
where
    S: ::config::Source + Send + Sync + 'static,
{
    let sections: HashMap<String, ::config::Value> = ::config::Config::builder()
        .add_source(source)
        .build()?
        .try_deserialize()?;
    let Some((_, section)) = sections
        .into_iter()
        .find(|(section, _)| section.eq_ignore_ascii_case(name))
    else {
        return Ok(None);
    };

    let table = section.into_table()?;
    let field = |key: &str| {
        table
            .get(key)
            .and_then(|v| v.clone().into_string().ok())
            .filter(|v| !v.is_empty())
    };
    Ok(Some(Profile {
        access_key: field("ncloud_access_key_id"),
        secret_key: field("ncloud_secret_access_key"),
        region: field("ncloud_region"),
        api_url: field("ncloud_api_url"),
    }))
}

/// Explicit values win over the profile; both keys must end up present.
pub fn resolve_credentials(
    access_key: Option<String>,
    secret_key: Option<String>,
    profile: Option<&Profile>,
) -> Result<(String, String), ProviderError> {
    let access_key = access_key
        .filter(|k| !k.is_empty())
        .or_else(|| profile.and_then(|p| p.access_key.clone()))
        .ok_or_else(|| {
            ProviderError::Config(
                "No access key provided. Set NCLOUD_ACCESS_KEY or use --access-key".to_string(),
            )
        })?;
    let secret_key = secret_key
        .filter(|k| !k.is_empty())
        .or_else(|| profile.and_then(|p| p.secret_key.clone()))
        .ok_or_else(|| {
            ProviderError::Config(
                "No secret key provided. Set NCLOUD_SECRET_KEY or use --secret-key".to_string(),
            )
        })?;
    Ok((access_key, secret_key))
}
