//! In-band queue protocol between pipeline stages.

/// A value flowing through a pipeline queue.
///
/// [`Message::Sentinel`] is a distinguished non-record value used purely for
/// shutdown signaling. It carries no payload and is never persisted: the reader
/// emits one sentinel per transform worker after the source is exhausted, each
/// worker forwards exactly one downstream, and the writer terminates once it
/// has counted one per worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Message<T> {
    /// A real payload to be processed by the receiving stage.
    Record(T),
    /// End-of-input marker.
    Sentinel,
}

impl<T> Message<T> {
    /// Returns `true` if this message is the shutdown sentinel.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Message::Sentinel)
    }
}
