//! Fan-in channel merging client data into one outbound byte queue
//!
//! Any number of [`FanInSender`]s append bytes from network event contexts;
//! the single [`FanInReceiver`] owned by the bridge takes everything that was
//! appended so far in one critical section. An append racing the drain lands
//! either entirely before or entirely after it, so no byte is lost or
//! duplicated.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

struct Shared<M: RawMutex> {
    pending: Mutex<M, RefCell<Vec<u8>>>,
}

/// Create a connected sender/receiver pair
pub fn channel<M: RawMutex>() -> (FanInSender<M>, FanInReceiver<M>) {
    let shared = Arc::new(Shared {
        pending: Mutex::new(RefCell::new(Vec::new())),
    });
    (
        FanInSender {
            shared: shared.clone(),
        },
        FanInReceiver { shared },
    )
}

/// Producer side, cloned into every client
pub struct FanInSender<M: RawMutex> {
    shared: Arc<Shared<M>>,
}

impl<M: RawMutex> Clone for FanInSender<M> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<M: RawMutex> FanInSender<M> {
    /// Append `data` verbatim; empty slices are ignored
    pub fn send(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.shared
            .pending
            .lock(|pending| pending.borrow_mut().extend_from_slice(data));
    }
}

/// Consumer side, owned by the bridge
pub struct FanInReceiver<M: RawMutex> {
    shared: Arc<Shared<M>>,
}

impl<M: RawMutex> FanInReceiver<M> {
    /// Move every pending byte to the end of `out`, returning how many moved
    pub fn drain_into(&self, out: &mut Vec<u8>) -> usize {
        self.shared.pending.lock(|pending| {
            let mut pending = pending.borrow_mut();
            let moved = pending.len();
            out.append(&mut pending);
            moved
        })
    }

    /// Number of bytes waiting to be drained
    pub fn pending_len(&self) -> usize {
        self.shared.pending.lock(|pending| pending.borrow().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::thread;

    #[test]
    fn test_send_then_drain() {
        let (tx, rx) = channel::<CriticalSectionRawMutex>();
        tx.send(b"hello ");
        tx.clone().send(b"world");
        tx.send(b"");
        assert_eq!(rx.pending_len(), 11);

        let mut out = Vec::new();
        assert_eq!(rx.drain_into(&mut out), 11);
        assert_eq!(out, b"hello world");
        assert_eq!(rx.pending_len(), 0);
        assert_eq!(rx.drain_into(&mut out), 0);
    }

    #[test]
    fn test_drain_appends_to_existing_backlog() {
        let (tx, rx) = channel::<CriticalSectionRawMutex>();
        let mut out = b"old".to_vec();
        tx.send(b"new");
        rx.drain_into(&mut out);
        assert_eq!(out, b"oldnew");
    }

    #[test]
    fn test_concurrent_senders_lose_nothing() {
        const PRODUCERS: u8 = 8;
        const MESSAGES: usize = 500;

        let (tx, rx) = channel::<CriticalSectionRawMutex>();
        let handles: Vec<_> = (0..PRODUCERS)
            .map(|id| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for _ in 0..MESSAGES {
                        tx.send(&[id, id, id]);
                    }
                })
            })
            .collect();

        // Drain while the producers are still running
        let mut out = Vec::new();
        while handles.iter().any(|h| !h.is_finished()) {
            rx.drain_into(&mut out);
        }
        for handle in handles {
            handle.join().unwrap();
        }
        rx.drain_into(&mut out);

        assert_eq!(out.len(), PRODUCERS as usize * MESSAGES * 3);
        for id in 0..PRODUCERS {
            let count = out.iter().filter(|&&b| b == id).count();
            assert_eq!(count, MESSAGES * 3);
        }
        // Each send stays contiguous
        for chunk in out.chunks(3) {
            assert!(chunk.iter().all(|&b| b == chunk[0]));
        }
    }
}
