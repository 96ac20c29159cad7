//! Coordinator role: loads the batch, hands out assignments, gathers results.

use std::time::Instant;

use role_exchange::{COORDINATOR, Exchange};
use tracing::{debug, info};

use crate::partition::partition;
use crate::report::{Report, ResultSet};
use crate::source::MatrixSource;
use crate::wire::{decode_results, encode_assignment};
use crate::worker::compute;
use crate::{Engine, Error};

/// The coordinator role, rank 0 of its exchange.
///
/// The coordinator also works its own block of the batch. Nothing is
/// reported until every role has answered.
pub struct Coordinator<E: Exchange> {
    exchange: E,
    engine: Engine,
}

impl<E: Exchange> Coordinator<E> {
    pub fn new(exchange: E, engine: Engine) -> Self {
        Self { exchange, engine }
    }

    pub fn roles(&self) -> usize {
        self.exchange.size()
    }

    /// Computes every determinant of the batch supplied by `source`.
    ///
    /// Elapsed time covers loading, distribution, computation and collection.
    pub async fn run<S>(&self, source: &S) -> Result<Report, Error>
    where
        S: MatrixSource + ?Sized,
    {
        let started = Instant::now();
        let batch = source.load().await?;
        let assignments = partition(batch.len(), self.roles())?;
        info!(
            matrices = batch.len(),
            order = batch.order(),
            roles = self.roles(),
            engine = %self.engine,
            "distributing batch"
        );

        let (own, remote) = assignments.split_first().ok_or(Error::NoRoles)?;
        for assignment in remote {
            debug!(role = assignment.role, range = ?assignment.range, "sending assignment");
            let matrices = batch
                .slice(assignment.range.clone())
                .ok_or(Error::Malformed("assignment"))?;
            let payload =
                encode_assignment(assignment.range.start, batch.order(), self.engine, matrices);
            self.exchange.send(assignment.role, payload).await?;
        }

        debug!(role = COORDINATOR, range = ?own.range, "computing own assignment");
        let own_block = batch
            .slice(own.range.clone())
            .ok_or(Error::Malformed("assignment"))?;
        let local = compute(self.engine, own_block.to_vec()).await?;

        self.exchange.barrier().await?;

        let mut results = ResultSet::new(batch.len());
        results.insert_block(own.range.start, &local)?;
        for assignment in remote {
            let reply = decode_results(&self.exchange.receive(assignment.role).await?)?;
            if reply.first_index != assignment.range.start {
                return Err(Error::ResultIndexMismatch {
                    role: assignment.role,
                    expected: assignment.range.start,
                    found: reply.first_index,
                });
            }
            if reply.values.len() != assignment.len() {
                return Err(Error::ResultCountMismatch {
                    role: assignment.role,
                    expected: assignment.len(),
                    found: reply.values.len(),
                });
            }
            results.insert_block(reply.first_index, &reply.values)?;
            debug!(role = assignment.role, count = reply.values.len(), "results received");
        }

        let report = results.finish(started.elapsed())?;
        info!(
            matrices = report.results.len(),
            elapsed = ?report.elapsed,
            "batch complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{decode_assignment, encode_results};
    use crate::{Batch, Matrix};
    use role_exchange::LocalExchange;

    fn batch(values: &[f64]) -> Batch {
        let matrices = values
            .iter()
            .map(|&v| Matrix::new(1, vec![v]).unwrap())
            .collect();
        Batch::new(1, matrices).unwrap()
    }

    #[tokio::test]
    async fn single_role_does_everything() {
        let roles = LocalExchange::mesh(1).unwrap().pop().unwrap();
        let coordinator = Coordinator::new(roles, Engine::Cofactor);

        let report = coordinator.run(&batch(&[5.0, -1.0, 2.5])).await.unwrap();
        assert_eq!(report.values(), vec![5.0, -1.0, 2.5]);
    }

    #[tokio::test]
    async fn rejects_a_short_reply() {
        let mut roles = LocalExchange::mesh(2).unwrap();
        let worker = roles.pop().unwrap();
        let coordinator = Coordinator::new(roles.pop().unwrap(), Engine::Cofactor);

        let fake_worker = async {
            let assignment = decode_assignment(&worker.receive(0).await.unwrap()).unwrap();
            assert_eq!(assignment.matrices.len(), 2);
            worker.barrier().await.unwrap();
            worker
                .send(0, encode_results(assignment.first_index, &[1.0]))
                .await
                .unwrap();
        };

        let batch = batch(&[1.0, 2.0, 3.0, 4.0]);
        let (report, _) = tokio::join!(coordinator.run(&batch), fake_worker);
        assert!(matches!(
            report,
            Err(Error::ResultCountMismatch {
                role: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[tokio::test]
    async fn rejects_a_reply_for_another_block() {
        let mut roles = LocalExchange::mesh(2).unwrap();
        let worker = roles.pop().unwrap();
        let coordinator = Coordinator::new(roles.pop().unwrap(), Engine::Cofactor);

        let fake_worker = async {
            let assignment = decode_assignment(&worker.receive(0).await.unwrap()).unwrap();
            assert_eq!(assignment.first_index, 2);
            worker.barrier().await.unwrap();
            worker
                .send(0, encode_results(0, &[3.0, 4.0]))
                .await
                .unwrap();
        };

        let batch = batch(&[1.0, 2.0, 3.0, 4.0]);
        let (report, _) = tokio::join!(coordinator.run(&batch), fake_worker);
        assert!(matches!(
            report,
            Err(Error::ResultIndexMismatch {
                role: 1,
                expected: 2,
                found: 0
            })
        ));
    }
}
