//! Error taxonomy for route resolution and optimization.

use thiserror::Error;

use crate::model::{PoiId, RouteId};

/// Caller-facing category of a [`RoutingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ClientFault,
    NotFound,
    Forbidden,
    ServerFault,
}

impl ErrorClass {
    pub const fn status_code(self) -> u16 {
        match self {
            Self::ClientFault => 400,
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::ServerFault => 500,
        }
    }
}

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("{0}")]
    Validation(String),

    #[error("point of interest {0} not found")]
    PoiNotFound(PoiId),

    #[error("route {0} not found")]
    RouteNotFound(RouteId),

    #[error("forbidden")]
    Forbidden,

    // Status and body are kept for diagnostics only; see `public_message`.
    #[error("routing provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("routing provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("routing configuration error: {0}")]
    Configuration(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("collaborator failure: {0}")]
    Collaborator(String),
}

impl RoutingError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::ClientFault,
            Self::PoiNotFound(_) | Self::RouteNotFound(_) => ErrorClass::NotFound,
            Self::Forbidden => ErrorClass::Forbidden,
            Self::Upstream { .. }
            | Self::Transport(_)
            | Self::Configuration(_)
            | Self::Cancelled
            | Self::Collaborator(_) => ErrorClass::ServerFault,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.class().status_code()
    }

    /// Message safe to hand back to the caller.
    ///
    /// Server faults collapse to a generic text so upstream bodies and
    /// transport details stay internal.
    pub fn public_message(&self) -> String {
        match self.class() {
            ErrorClass::ClientFault | ErrorClass::NotFound => self.to_string(),
            ErrorClass::Forbidden => "forbidden".to_string(),
            ErrorClass::ServerFault => "internal error while computing route".to_string(),
        }
    }
}
