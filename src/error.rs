use thiserror::Error;

use crate::api::{ApiError, common_error_body};
use crate::terraform::schema::ValidationErrors;
use crate::wait::WaitError;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error("{resource} is not supported on the classic platform")]
    NotSupportClassic { resource: String },

    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    #[error("invalid configuration: {0}")]
    Validation(ValidationErrors),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("{resource} cannot be updated in place, changed: {}", fields.join(", "))]
    RequiresReplacement {
        resource: String,
        fields: Vec<String>,
    },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("{resource} lookup matched {count} results, expected exactly one")]
    Ambiguous { resource: String, count: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Return code of the platform error body behind this error, if any.
    pub fn return_code(&self) -> Option<String> {
        match self {
            ProviderError::Api(err) => err.return_code(),
            other => common_error_body(&other.to_string()).map(|body| body.return_code),
        }
    }

    pub fn not_supported_classic(resource: &str) -> Self {
        ProviderError::NotSupportClassic {
            resource: resource.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_not_support_classic_display() {
        let err = ProviderError::not_supported_classic("ncloud_vpc");
        assert_eq!(
            err.to_string(),
            "ncloud_vpc is not supported on the classic platform"
        );
    }

    #[test]
    fn test_requires_replacement_display() {
        let err = ProviderError::RequiresReplacement {
            resource: "ncloud_subnet".to_string(),
            fields: vec!["subnet".to_string(), "zone".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "ncloud_subnet cannot be updated in place, changed: subnet, zone"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ProviderError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "configuration error: missing field");
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ProviderError = io_err.into();
        assert!(matches!(err, ProviderError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_api_error_from_conversion_is_transparent() {
        let api_err = ApiError::Api {
            status: 400,
            body: r#"{"responseError":{"returnCode":"1007009","returnMessage":"dup"}}"#
                .to_string(),
        };
        let err: ProviderError = api_err.into();
        assert!(err.to_string().starts_with("API error (400)"));
        assert_eq!(err.return_code().as_deref(), Some("1007009"));
    }

    #[test]
    fn test_return_code_absent() {
        let err = ProviderError::UnknownResource("ncloud_nope".to_string());
        assert!(err.return_code().is_none());
    }
}
