//! Recyclable fixed-capacity receive buffers (spec §3.2, §4.3).

use std::sync::Mutex;

use bytes::BytesMut;

/// Maximum accepted HEP3 datagram size. Larger datagrams are dropped by the
/// receiver and counted as errors (spec §4.4, §6.1).
pub const MAX_DGRAM: usize = 8192;

/// Thread-safe pool of `MAX_DGRAM`-capacity buffers.
///
/// `acquire` hands out a full-capacity buffer (contents undefined);
/// `release` returns one, restoring it to full length first so a caller that
/// received a sliced view can't leak a half-filled buffer back into the pool.
pub struct BufferPool {
    free: Mutex<Vec<BytesMut>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self { free: Mutex::new(Vec::new()) }
    }

    pub fn with_capacity(preallocate: usize) -> Self {
        let mut free = Vec::with_capacity(preallocate);
        for _ in 0..preallocate {
            free.push(Self::fresh_buffer());
        }
        Self { free: Mutex::new(free) }
    }

    fn fresh_buffer() -> BytesMut {
        let mut buf = BytesMut::zeroed(MAX_DGRAM);
        buf.resize(MAX_DGRAM, 0);
        buf
    }

    pub fn acquire(&self) -> BytesMut {
        let mut free = self.free.lock().expect("buffer pool mutex poisoned");
        free.pop().unwrap_or_else(Self::fresh_buffer)
    }

    pub fn release(&self, mut buf: BytesMut) {
        buf.resize(MAX_DGRAM, 0);
        let mut free = self.free.lock().expect("buffer pool mutex poisoned");
        free.push(buf);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_returns_full_capacity_buffer() {
        let pool = BufferPool::new();
        let buf = pool.acquire();
        assert_eq!(buf.len(), MAX_DGRAM);
    }

    #[test]
    fn release_restores_full_length() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        buf.truncate(128);
        pool.release(buf);
        let reacquired = pool.acquire();
        assert_eq!(reacquired.len(), MAX_DGRAM);
    }

    #[test]
    fn with_capacity_preallocates() {
        let pool = BufferPool::with_capacity(4);
        assert_eq!(pool.free.lock().unwrap().len(), 4);
    }
}
