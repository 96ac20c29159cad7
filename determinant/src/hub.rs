//! Multi-process runs: rank 0 listens for its workers over TCP.

use role_exchange::TcpHub;
use tracing::info;

use crate::coordinator::Coordinator;
use crate::report::Report;
use crate::source::MatrixSource;
use crate::{Engine, Error};

/// Runs role 0 of a `roles`-sized group on `hub`.
///
/// The batch is read before any worker is awaited, so an unreadable source
/// fails at once instead of after the whole group has connected.
pub async fn run_hub<S>(
    hub: TcpHub,
    source: &S,
    roles: usize,
    engine: Engine,
) -> Result<Report, Error>
where
    S: MatrixSource + ?Sized,
{
    let batch = source.load().await?;
    info!(roles, matrices = batch.len(), "waiting for workers");

    let exchange = hub.accept(roles).await?;
    Coordinator::new(exchange, engine).run(&batch).await
}
