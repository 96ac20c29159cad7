//! In-process transport: one endpoint per role, linked by tokio channels.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Barrier;
use tokio::sync::mpsc::UnboundedSender;

use crate::mailbox::Mailbox;
use crate::{COORDINATOR, Error, Exchange, Rank, check_route};

/// An exchange endpoint whose peers live in the same process.
///
/// Endpoints are created together by [`LocalExchange::mesh`] and are meant
/// to be moved into one task per role. Dropping an endpoint closes its
/// channels, so peers blocked in `receive` from it fail with
/// [`Error::Disconnected`].
pub struct LocalExchange {
    rank: Rank,
    size: usize,
    outboxes: HashMap<Rank, UnboundedSender<Vec<u8>>>,
    mailbox: Mailbox,
    barrier: Arc<Barrier>,
}

impl LocalExchange {
    /// Builds `size` connected endpoints, indexed by rank.
    ///
    /// Only coordinator-worker links are created.
    pub fn mesh(size: usize) -> Result<Vec<Self>, Error> {
        if size == 0 {
            return Err(Error::EmptyGroup);
        }

        let barrier = Arc::new(Barrier::new(size));
        let mut endpoints: Vec<Self> = (0..size)
            .map(|rank| Self {
                rank,
                size,
                outboxes: HashMap::new(),
                mailbox: Mailbox::new(),
                barrier: Arc::clone(&barrier),
            })
            .collect();

        for worker in 1..size {
            let to_worker = endpoints[worker].mailbox.register(COORDINATOR);
            endpoints[COORDINATOR].outboxes.insert(worker, to_worker);

            let to_coordinator = endpoints[COORDINATOR].mailbox.register(worker);
            endpoints[worker].outboxes.insert(COORDINATOR, to_coordinator);
        }

        Ok(endpoints)
    }
}

#[async_trait]
impl Exchange for LocalExchange {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    async fn send(&self, to: Rank, payload: Vec<u8>) -> Result<(), Error> {
        check_route(self.rank, to, self.size)?;
        let outbox = self.outboxes.get(&to).ok_or(Error::UnknownRole(to))?;
        outbox.send(payload).map_err(|_| Error::Disconnected(to))
    }

    async fn receive(&self, from: Rank) -> Result<Vec<u8>, Error> {
        check_route(from, self.rank, self.size)?;
        self.mailbox.take(from).await
    }

    async fn barrier(&self) -> Result<(), Error> {
        self.barrier.wait().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_group() {
        assert!(matches!(LocalExchange::mesh(0), Err(Error::EmptyGroup)));
    }

    #[tokio::test]
    async fn single_role_barrier_returns() {
        let roles = LocalExchange::mesh(1).unwrap();
        roles[0].barrier().await.unwrap();
        assert_eq!(roles[0].size(), 1);
    }

    #[tokio::test]
    async fn workers_cannot_talk_to_each_other() {
        let roles = LocalExchange::mesh(3).unwrap();
        let err = roles[1].send(2, vec![1]).await.unwrap_err();
        assert!(matches!(err, Error::NoRoute { from: 1, to: 2 }));
    }

    #[tokio::test]
    async fn dropped_peer_disconnects() {
        let mut roles = LocalExchange::mesh(2).unwrap();
        let worker = roles.pop().unwrap();
        drop(roles);

        assert!(matches!(
            worker.receive(COORDINATOR).await,
            Err(Error::Disconnected(0))
        ));
    }
}
