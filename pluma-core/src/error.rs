use thiserror::Error;

/// Unified error type for Pluma.
#[derive(Error, Debug)]
pub enum PlumaError {
    #[error("Plugin not found: {0}")]
    PluginNotFound(i64),

    #[error("Malformed plugin record {id:?}: {reason}")]
    MalformedRecord { id: Option<i64>, reason: String },

    #[error("Invalid parse mode config: {0}")]
    InvalidConfig(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Domain authority error: {0}")]
    Authority(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl PlumaError {
    /// Map to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            PlumaError::PluginNotFound(_) => 404,
            PlumaError::InvalidConfig(_) => 400,
            PlumaError::Authority(_) => 502,
            PlumaError::Store(StoreError::Unavailable(_)) => 503,
            _ => 500,
        }
    }

    /// JSON error body.
    pub fn to_json_body(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.to_string(),
            "status": self.status_code(),
        })
    }
}

/// Failures raised by a record store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T, E = PlumaError> = std::result::Result<T, E>;
