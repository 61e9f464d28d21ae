use crate::foundation::ids::{CelId, LayerId};

pub type LayerfoldResult<T> = Result<T, LayerfoldError>;

#[derive(thiserror::Error, Debug)]
pub enum LayerfoldError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unknown layer {0}")]
    UnknownLayer(LayerId),

    #[error("unknown cel {0}")]
    UnknownCel(CelId),

    #[error("history error: {0}")]
    History(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LayerfoldError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for LayerfoldError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
