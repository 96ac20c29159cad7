//! Single-process runs: every role is a concurrent task over a local exchange.

use futures_util::future::try_join_all;
use role_exchange::LocalExchange;

use crate::coordinator::Coordinator;
use crate::report::Report;
use crate::source::MatrixSource;
use crate::worker::Worker;
use crate::{Engine, Error};

/// Runs a coordinator and `roles - 1` workers in this process.
///
/// The first role to fail ends the run; the remaining roles are dropped,
/// which closes their channels.
pub async fn run_local<S>(source: &S, roles: usize, engine: Engine) -> Result<Report, Error>
where
    S: MatrixSource + ?Sized,
{
    if roles == 0 {
        return Err(Error::NoRoles);
    }

    let mut endpoints = LocalExchange::mesh(roles)?.into_iter();
    let coordinator = Coordinator::new(endpoints.next().ok_or(Error::NoRoles)?, engine);
    let workers: Vec<Worker<LocalExchange>> = endpoints.map(Worker::new).collect();

    let workers_done = try_join_all(workers.iter().map(|worker| worker.run()));
    let (report, _) = tokio::try_join!(coordinator.run(source), workers_done)?;
    Ok(report)
}
