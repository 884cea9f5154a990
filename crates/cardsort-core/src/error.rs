//! Error types for Cardsort

use crate::types::Phase;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config render error: {0}")]
    ConfigRender(#[from] toml::ser::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("phase incomplete: {phase} at {consecutive}/{criterion} consecutive correct")]
    PhaseIncomplete {
        phase: Phase,
        consecutive: u32,
        criterion: u32,
    },

    #[error("{phase} phase stopped after {limit} trials without meeting criterion")]
    TrialLimit { phase: Phase, limit: u32 },

    #[error("session cancelled")]
    Cancelled,

    #[error("participant input closed")]
    InputClosed,

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}
