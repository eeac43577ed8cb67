// Physics errors

use super::body::BodyKind;

/// Errors from world operations that address entities by handle, and from
/// configuration loading. The per-frame simulation path never fails.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("Handle refers to a body that no longer exists")]
    StaleHandle,

    #[error("Wrong body kind: expected {expected:?}, got {actual:?}")]
    WrongBodyKind { expected: BodyKind, actual: BodyKind },

    #[error("Unknown collider")]
    UnknownCollider,

    #[error("Unknown group")]
    UnknownGroup,

    #[error("Unknown tile layer")]
    UnknownTileLayer,

    #[error("Unsupported collision pair: {0}")]
    UnsupportedPair(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
