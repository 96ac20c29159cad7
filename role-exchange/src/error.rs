//! Error types for role-exchange operations.

use thiserror::Error;

use crate::Rank;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("role {0} disconnected")]
    Disconnected(Rank),

    #[error("role {0} is not part of this exchange")]
    UnknownRole(Rank),

    #[error("no route from role {from} to role {to}")]
    NoRoute { from: Rank, to: Rank },

    #[error("role {0} connected twice")]
    DuplicateRole(Rank),

    #[error("group size mismatch: expected {expected}, peer announced {found}")]
    SizeMismatch { expected: usize, found: usize },

    #[error("unexpected frame kind {0}")]
    UnexpectedFrame(u8),

    #[error("frame of {0} bytes exceeds the frame limit")]
    FrameTooLarge(usize),

    #[error("malformed hello frame")]
    MalformedHello,

    #[error("an exchange needs at least one role")]
    EmptyGroup,

    #[error("could not reach {addr} after {retries} attempts")]
    Unreachable { addr: String, retries: usize },
}
