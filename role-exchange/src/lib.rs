//! Hub-and-spoke message exchange between a coordinator and its workers.
//!
//! `role-exchange` gives every participant of a batch computation a *role*:
//! rank 0 is the coordinator, ranks `1..size` are workers. Workers only ever
//! talk to the coordinator. Payloads are opaque byte vectors; callers own
//! their encoding.
//!
//! # Transports
//!
//! - [`LocalExchange`]: every role lives in the same process, linked by tokio
//!   channels. Used for single-process runs and tests.
//! - [`TcpHub`] / [`TcpExchange`]: one process per role, linked by TCP
//!   connections to the coordinator.
//!
//! # Example
//!
//! ```no_run
//! use role_exchange::{Exchange, LocalExchange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut roles = LocalExchange::mesh(2)?;
//!     let worker = roles.pop().unwrap();
//!     let coordinator = roles.pop().unwrap();
//!
//!     coordinator.send(1, b"work".to_vec()).await?;
//!     assert_eq!(worker.receive(0).await?, b"work".to_vec());
//!
//!     Ok(())
//! }
//! ```

mod error;
mod local;
mod mailbox;
mod tcp;

use async_trait::async_trait;

pub use error::Error;
pub use local::LocalExchange;
pub use tcp::{TcpExchange, TcpHub};

/// Position of a participant in the exchange.
pub type Rank = usize;

/// Rank of the coordinator role.
pub const COORDINATOR: Rank = 0;

/// Point-to-point and collective operations shared by every transport.
///
/// Payloads from one sender are delivered in the order they were sent.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Rank of this endpoint.
    fn rank(&self) -> Rank;

    /// Number of roles, the coordinator included.
    fn size(&self) -> usize;

    /// Sends `payload` to role `to`.
    async fn send(&self, to: Rank, payload: Vec<u8>) -> Result<(), Error>;

    /// Waits for the next payload sent by role `from`.
    async fn receive(&self, from: Rank) -> Result<Vec<u8>, Error>;

    /// Returns once every role has entered the barrier.
    async fn barrier(&self) -> Result<(), Error>;
}

/// Rejects peer-to-peer traffic between workers and out-of-range ranks.
pub(crate) fn check_route(from: Rank, to: Rank, size: usize) -> Result<(), Error> {
    if to >= size {
        return Err(Error::UnknownRole(to));
    }
    if from >= size {
        return Err(Error::UnknownRole(from));
    }
    if from == to || (from != COORDINATOR && to != COORDINATOR) {
        return Err(Error::NoRoute { from, to });
    }
    Ok(())
}
