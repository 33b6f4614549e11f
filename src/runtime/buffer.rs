//! Per-connection receive buffer.
//!
//! A fixed-capacity byte region with a sliding `[head, tail)` window of bytes
//! that have been received but not yet parsed into complete commands.
//!
//! ## Repositioning
//!
//! After every tokenizer pass the caller reports how many trailing bytes are
//! still part of an unterminated command:
//!
//! - none left: the window collapses to `head = tail = 0`
//! - otherwise `head = tail - remaining`; once `head` reaches half the
//!   capacity the partial command is moved to offset 0, so a copy never
//!   exceeds half the buffer
//! - a full buffer whose partial command starts in the lower half can never
//!   complete and is reported as [`BufferFull`]

use super::channel::{Channel, Recv};
use std::io;

/// The receive buffer filled up without a command terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferFull;

/// Fixed-capacity receive buffer with a sliding unconsumed window.
///
/// Invariant: `head <= tail <= CAP`, and `tail < CAP` between reads.
pub struct RecvBuffer<const CAP: usize> {
    buf: Box<[u8]>,
    head: usize,
    tail: usize,
}

impl<const CAP: usize> RecvBuffer<CAP> {
    /// Allocate the buffer. This is the only allocation it ever makes.
    pub fn new() -> Self {
        assert!(CAP >= 2, "receive buffer capacity must be at least 2");
        Self {
            buf: vec![0u8; CAP].into_boxed_slice(),
            head: 0,
            tail: 0,
        }
    }

    /// Drop any retained bytes.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    /// Receive once from `channel` into the free region `[tail, CAP)`.
    pub fn fill<C: Channel>(&mut self, channel: &mut C) -> io::Result<Recv> {
        let outcome = channel.recv(&mut self.buf[self.tail..])?;
        if let Recv::Data(n) = outcome {
            debug_assert!(n <= CAP - self.tail);
            self.tail += n.min(CAP - self.tail);
        }
        Ok(outcome)
    }

    /// Bytes received but not yet consumed.
    pub fn window(&self) -> &[u8] {
        &self.buf[self.head..self.tail]
    }

    /// Reposition after a tokenizer pass that left `remaining` trailing bytes.
    pub fn consume(&mut self, remaining: usize) -> Result<(), BufferFull> {
        debug_assert!(remaining <= self.tail - self.head);

        if remaining == 0 {
            self.head = 0;
            self.tail = 0;
            return Ok(());
        }

        self.head = self.tail - remaining;
        if self.head >= CAP / 2 {
            self.buf.copy_within(self.head..self.tail, 0);
            self.head = 0;
            self.tail = remaining;
        } else if self.tail == CAP {
            return Err(BufferFull);
        }
        Ok(())
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn capacity(&self) -> usize {
        CAP
    }
}

impl<const CAP: usize> Default for RecvBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}
