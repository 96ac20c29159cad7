//! Per-sender inboxes shared by the local and TCP transports.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{Error, Rank};

pub struct Mailbox {
    inboxes: HashMap<Rank, Mutex<UnboundedReceiver<Vec<u8>>>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            inboxes: HashMap::new(),
        }
    }

    /// Opens an inbox for messages from `from` and returns its sending side.
    pub fn register(&mut self, from: Rank) -> UnboundedSender<Vec<u8>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inboxes.insert(from, Mutex::new(rx));
        tx
    }

    /// Waits for the next message from `from`.
    ///
    /// Fails with `Disconnected` once every sender for that inbox is gone.
    pub async fn take(&self, from: Rank) -> Result<Vec<u8>, Error> {
        let inbox = self.inboxes.get(&from).ok_or(Error::UnknownRole(from))?;
        inbox
            .lock()
            .await
            .recv()
            .await
            .ok_or(Error::Disconnected(from))
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
