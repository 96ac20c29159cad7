//! Error types for determinant operations.

use role_exchange::Rank;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("exchange error: {0}")]
    Exchange(#[from] role_exchange::Error),

    #[error("cannot read batch source: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated header: expected {expected} bytes, found {found}")]
    TruncatedHeader { expected: usize, found: usize },

    #[error("negative matrix count {0}")]
    NegativeCount(i32),

    #[error("matrix order must be at least 1")]
    ZeroOrder,

    #[error("batch of {count} matrices of order {order} does not fit in memory")]
    TooLarge { count: usize, order: usize },

    #[error("cannot allocate storage for {0} coefficients")]
    Allocation(usize),

    #[error("short coefficient data: expected {expected} values, found {found}")]
    ShortRead { expected: usize, found: usize },

    #[error("{0} unexpected bytes after the coefficient data")]
    TrailingData(usize),

    #[error("matrix of order {order} needs {expected} coefficients, got {found}")]
    DimensionMismatch {
        order: usize,
        expected: usize,
        found: usize,
    },

    #[error("matrix of order {found} in a batch of order {expected}")]
    MixedOrder { expected: usize, found: usize },

    #[error("malformed {0} message")]
    Malformed(&'static str),

    #[error("unknown engine tag {0}")]
    UnknownEngine(u8),

    #[error("role {role} returned {found} results for {expected} matrices")]
    ResultCountMismatch {
        role: Rank,
        expected: usize,
        found: usize,
    },

    #[error("role {role} answered for matrix {found}, its block starts at {expected}")]
    ResultIndexMismatch {
        role: Rank,
        expected: usize,
        found: usize,
    },

    #[error("no result for matrix {0}")]
    MissingResult(usize),

    #[error("matrix {0} reported more than once")]
    DuplicateResult(usize),

    #[error("result for matrix {index} outside a batch of {len}")]
    ResultOutOfRange { index: usize, len: usize },

    #[error("at least one role is required")]
    NoRoles,

    #[error("engine task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
