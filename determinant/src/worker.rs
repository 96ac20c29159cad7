//! Worker role: computes the determinants of one assignment.

use role_exchange::{COORDINATOR, Exchange, Rank};
use tracing::{debug, info};

use crate::wire::{decode_assignment, encode_results};
use crate::{Engine, Error, Matrix};

/// A worker role bound to one exchange endpoint.
///
/// Workers only talk to the coordinator: one assignment in, one results
/// message out, with the batch-wide barrier in between.
pub struct Worker<E: Exchange> {
    exchange: E,
}

impl<E: Exchange> Worker<E> {
    pub fn new(exchange: E) -> Self {
        Self { exchange }
    }

    pub fn rank(&self) -> Rank {
        self.exchange.rank()
    }

    /// Runs the worker to completion and returns how many matrices it processed.
    pub async fn run(&self) -> Result<usize, Error> {
        let rank = self.rank();
        debug!(rank, "waiting for assignment");

        let payload = self.exchange.receive(COORDINATOR).await?;
        let assignment = decode_assignment(&payload)?;
        let first_index = assignment.first_index;
        info!(
            rank,
            first_index,
            count = assignment.matrices.len(),
            engine = %assignment.engine,
            "received assignment"
        );

        let values = compute(assignment.engine, assignment.matrices).await?;

        self.exchange.barrier().await?;
        self.exchange
            .send(COORDINATOR, encode_results(first_index, &values))
            .await?;
        debug!(rank, count = values.len(), "results sent");

        Ok(values.len())
    }
}

/// Runs the engine over `matrices` in order on the blocking pool.
pub(crate) async fn compute(engine: Engine, matrices: Vec<Matrix>) -> Result<Vec<f64>, Error> {
    let values = tokio::task::spawn_blocking(move || {
        matrices
            .iter()
            .map(|matrix| engine.determinant(matrix))
            .collect::<Vec<f64>>()
    })
    .await?;
    Ok(values)
}
