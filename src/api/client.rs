use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use super::ApiError;
use super::signer::{self, Signer};
use super::types::{CdssResponse, RpcEnvelope, SUCCESS_RETURN_CODE};
use crate::config::ProviderConfig;

/// Query parameters of an RPC-style call, kept in insertion order so the
/// signed URI matches the one sent on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.push((key.to_string(), value.into()));
        self
    }

    pub fn with_opt(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    /// Adds a list parameter using the platform's `key.N` convention (1-based).
    pub fn with_list<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (i, value) in values.into_iter().enumerate() {
            self.0.push((format!("{}.{}", key, i + 1), value.into()));
        }
        self
    }

    fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    fn to_query(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    signer: Signer,
    base_url: String,
    region: String,
}

impl ApiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        Self::with_base_url(
            config.access_key.clone(),
            config.secret_key().to_string(),
            config.region.clone(),
            config.api_gateway_url(),
        )
    }

    /// NOTE: Primarily used for testing with mock servers.
    pub fn with_base_url(
        access_key: String,
        secret_key: String,
        region: String,
        base_url: String,
    ) -> Result<Self, ApiError> {
        if access_key.is_empty() || secret_key.is_empty() {
            return Err(ApiError::Auth {
                message: "access key and secret key are required".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            signer: Signer::new(access_key, secret_key),
            base_url: base_url.trim_end_matches('/').to_string(),
            region,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.base_url
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Calls an RPC-style action and returns the inner `<action>Response`
    /// object once its return code has been checked.
    pub async fn call(
        &self,
        method: Method,
        service: &str,
        action: &str,
        params: Params,
    ) -> Result<serde_json::Value, ApiError> {
        let mut params = params;
        if !params.contains("regionCode") {
            params = params.with("regionCode", self.region.clone());
        }
        let params = params.with("responseFormatType", "json");
        let uri = format!("{}/{}?{}", service, action, params.to_query());

        tracing::debug!(%method, service, action, "api call");

        let (status, text) = self.send(method, &uri, None).await?;

        let mut body: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode {
                action: action.to_string(),
                message: format!("Failed to parse response: {}", e),
            })?;

        let key = format!("{}Response", action);
        let inner = match body.get_mut(&key) {
            Some(inner) => inner.take(),
            None => {
                return Err(ApiError::Api {
                    status,
                    body: text,
                });
            }
        };

        let envelope: RpcEnvelope =
            serde_json::from_value(inner.clone()).map_err(|e| ApiError::Decode {
                action: action.to_string(),
                message: e.to_string(),
            })?;

        if envelope.return_code != SUCCESS_RETURN_CODE {
            return Err(ApiError::Api {
                status,
                body: inner.to_string(),
            });
        }

        Ok(inner)
    }

    /// Calls an RPC-style list action and decodes the `list_key` array.
    /// A missing array decodes as empty.
    pub async fn call_list<T: DeserializeOwned>(
        &self,
        method: Method,
        service: &str,
        action: &str,
        params: Params,
        list_key: &str,
    ) -> Result<Vec<T>, ApiError> {
        let inner = self.call(method, service, action, params).await?;
        take_list(inner, list_key, action)
    }

    /// Calls a JSON REST endpoint of the data streaming service.
    /// `Ok(None)` means the service answered without a result.
    pub async fn cdss<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Option<T>, ApiError> {
        tracing::debug!(%method, path, "cdss call");

        let (status, text) = self.send(method, path, body).await?;

        let response: CdssResponse<T> =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode {
                action: path.to_string(),
                message: e.to_string(),
            })?;

        if response.code != 0 {
            return Err(ApiError::Api { status, body: text });
        }

        Ok(response.result)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(u16, String), ApiError> {
        let timestamp = signer::timestamp_millis();
        let signature = self.signer.sign(method.as_str(), uri, &timestamp)?;

        let url = format!("{}{}", self.base_url, uri);
        let mut request = self
            .client
            .request(method, &url)
            .header(signer::TIMESTAMP_HEADER, &timestamp)
            .header(signer::ACCESS_KEY_HEADER, self.signer.access_key())
            .header(signer::SIGNATURE_HEADER, signature);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.as_u16() == 401 || status.as_u16() == 403 {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|b| {
                    b.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .map(|m| m.to_string())
                })
                .unwrap_or_else(|| "Unknown authentication error".to_string());
            return Err(ApiError::Auth { message });
        }

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok((status.as_u16(), text))
    }
}

pub fn take_list<T: DeserializeOwned>(
    mut inner: serde_json::Value,
    list_key: &str,
    action: &str,
) -> Result<Vec<T>, ApiError> {
    match inner.get_mut(list_key).map(serde_json::Value::take) {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(list) => serde_json::from_value(list).map_err(|e| ApiError::Decode {
            action: action.to_string(),
            message: format!("Failed to parse {}: {}", list_key, e),
        }),
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("region", &self.region)
            .field("signer", &self.signer)
            .finish()
    }
}
