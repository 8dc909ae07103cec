//! Per-connection receive buffer.
//!
//! The accumulator has a fixed logical capacity. Bytes handed to the parser
//! can be split off the front (`consume`), but the space they occupied is not
//! reused: free space only ever shrinks until the buffer is replaced by
//! `grow_to`. This is what lets the request assembler treat "free space
//! reached zero" as "the body is complete".
//!
//! Growth is bounded by a ceiling fixed at construction. The requested size
//! comes from the peer's `Content-Length`, so it is checked before anything
//! is allocated.

use bytes::{Bytes, BytesMut};
use thiserror::Error;

/// Growth ceiling used by `Accumulator::new`.
pub const DEFAULT_MAX_CAPACITY: usize = 16 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("buffer capacity exceeded: {requested} bytes requested, {free} free")]
pub struct CapacityExceeded {
    pub requested: usize,
    pub free: usize,
}

#[derive(Debug)]
pub struct Accumulator {
    buf: BytesMut,
    capacity: usize,
    max_capacity: usize,
    consumed: usize,
}

impl Accumulator {
    /// Creates an accumulator that can hold at most `capacity` bytes until
    /// grown, and never grows past `DEFAULT_MAX_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        Self::with_max_capacity(capacity, DEFAULT_MAX_CAPACITY)
    }

    pub fn with_max_capacity(capacity: usize, max_capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
            max_capacity,
            consumed: 0,
        }
    }

    /// Copies `data` at the write cursor.
    pub fn append(&mut self, data: &[u8]) -> Result<(), CapacityExceeded> {
        let free = self.remaining_free();
        if data.len() > free {
            return Err(CapacityExceeded {
                requested: data.len(),
                free,
            });
        }

        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Moves the unconsumed bytes into a fresh buffer of exactly
    /// `new_capacity` bytes. Fails without allocating if `new_capacity` is
    /// past the ceiling.
    pub fn grow_to(&mut self, new_capacity: usize) -> Result<(), CapacityExceeded> {
        if new_capacity > self.max_capacity {
            return Err(CapacityExceeded {
                requested: new_capacity,
                free: self.max_capacity,
            });
        }

        if new_capacity < self.buf.len() {
            return Err(CapacityExceeded {
                requested: self.buf.len(),
                free: new_capacity,
            });
        }

        let mut fresh = BytesMut::with_capacity(new_capacity);
        fresh.extend_from_slice(&self.buf);

        self.buf = fresh;
        self.capacity = new_capacity;
        self.consumed = 0;
        Ok(())
    }

    /// Lowers the capacity so that free space runs out once `limit`
    /// unconsumed bytes are held. Never raises it.
    pub fn cap_at(&mut self, limit: usize) {
        let capped = self.consumed + limit.max(self.buf.len());
        self.capacity = self.capacity.min(capped);
    }

    /// Splits `n` bytes off the front, advancing the read cursor.
    pub fn consume(&mut self, n: usize) -> Bytes {
        let n = n.min(self.buf.len());
        self.consumed += n;
        self.buf.split_to(n).freeze()
    }

    /// Drops unconsumed bytes past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Takes every unconsumed byte.
    pub fn take(&mut self) -> Bytes {
        let n = self.buf.len();
        self.consume(n)
    }

    pub fn remaining_free(&self) -> usize {
        self.capacity - self.consumed - self.buf.len()
    }

    pub fn used(&self) -> usize {
        self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}
