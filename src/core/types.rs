use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    ConfigurationError,
    UpstreamError,
    TransportError,
    SerializationError,
    IoError,
    InternalError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
}

/// JSON body returned by `POST /launch`.
///
/// Failures serialize only `success` and `message`; successful launches always
/// carry `data` and `runUrl`, the latter being `null` when no viewer URL could
/// be assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchEnvelope {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(
        rename = "runUrl",
        default,
        skip_serializing_if = "RunUrlField::is_omitted"
    )]
    pub run_url: RunUrlField,
}

/// Tri-state wrapper so a successful launch can emit `"runUrl": null`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunUrlField(Option<Option<String>>);

impl RunUrlField {
    pub fn omitted() -> Self {
        RunUrlField(None)
    }

    pub fn resolved(url: Option<String>) -> Self {
        RunUrlField(Some(url))
    }

    pub fn is_omitted(&self) -> bool {
        self.0.is_none()
    }

    pub fn url(&self) -> Option<&str> {
        self.0.as_ref().and_then(|inner| inner.as_deref())
    }
}

impl LaunchEnvelope {
    pub fn launched(data: Value, run_url: Option<String>) -> Self {
        LaunchEnvelope {
            success: true,
            message: "Pipeline launched successfully via Seqera Action".to_string(),
            data: Some(data),
            run_url: RunUrlField::resolved(run_url),
        }
    }

    pub fn failed<T: Into<String>>(message: T) -> Self {
        LaunchEnvelope {
            success: false,
            message: message.into(),
            data: None,
            run_url: RunUrlField::omitted(),
        }
    }
}
