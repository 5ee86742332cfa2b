//! Bounded FIFO channels connecting pipeline stages.
//!
//! Every stage boundary is a single-producer, single-consumer channel whose
//! items are either data or a terminal [`Message::Sentinel`]. The sentinel
//! travels through the same channel as ordinary data, so a consumer learns
//! that the stream ended by reading a value, never by polling queue sizes.

use thiserror::Error;
use tokio::sync::mpsc;

/// Default bound for stage channels. A full channel suspends the producer,
/// which keeps a fast ingest stage from buffering a whole dataset in memory.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// One message on a stage channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    /// Ordinary payload.
    Item(T),
    /// End of stream. Arrives strictly after every item the producer
    /// enqueued; consumers stop dequeuing once they see it.
    Sentinel,
}

impl<T> Message<T> {
    /// True for the end-of-stream marker.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Message::Sentinel)
    }
}

/// The consumer half of the channel is gone.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("queue receiver dropped before the stream finished")]
pub struct QueueClosed;

/// Create a connected producer/consumer pair with the given capacity.
pub fn channel<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueSender { tx }, QueueReceiver { rx })
}

/// Producer handle of a stage channel.
///
/// Not `Clone`: each channel has exactly one producer role, and that role
/// emits exactly one sentinel via [`QueueSender::finish`].
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: mpsc::Sender<Message<T>>,
}

impl<T> QueueSender<T> {
    /// Enqueue one item, suspending while the channel is full.
    pub async fn enqueue(&self, item: T) -> Result<(), QueueClosed> {
        self.tx.send(Message::Item(item)).await.map_err(|_| QueueClosed)
    }

    /// Send the sentinel. Consumes the handle so no item can follow it.
    pub async fn finish(self) -> Result<(), QueueClosed> {
        self.tx.send(Message::Sentinel).await.map_err(|_| QueueClosed)
    }
}

/// Consumer handle of a stage channel.
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: mpsc::Receiver<Message<T>>,
}

impl<T> QueueReceiver<T> {
    /// Dequeue the next message, suspending while the channel is empty.
    ///
    /// A producer that was dropped without finishing reads as
    /// [`Message::Sentinel`]; the stream cannot end any other way.
    pub async fn dequeue(&mut self) -> Message<T> {
        self.rx.recv().await.unwrap_or(Message::Sentinel)
    }
}
