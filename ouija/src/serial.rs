use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

/// The consuming end of the serial port. Bytes arrive in the order the program wrote them.
///
/// Iterating blocks until the next byte arrives and ends once the debugger is dropped or another
/// consumer is attached in this one's place.
#[derive(Debug)]
pub struct SerialOutput(Receiver<u8>);

impl SerialOutput {
    /// Creates a channel holding at most `capacity` unread bytes. With a capacity of zero, every
    /// send waits for the consumer to take the byte.
    pub(crate) fn channel(capacity: usize) -> (SyncSender<u8>, Self) {
        let (send, recv) = mpsc::sync_channel(capacity);
        (send, Self(recv))
    }

    /// Takes the next byte if one is waiting.
    pub fn try_recv(&self) -> Option<u8> {
        match self.0.try_recv() {
            Ok(byte) => Some(byte),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl Iterator for SerialOutput {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.recv().ok()
    }
}
