//! Background cost recomputation.
//!
//! Propagating a full tree is CPU-bound and runs off the caller's thread:
//! the caller encodes a tree and quantity into a request message, sends it
//! to a dedicated worker thread, and blocks on the single response. This
//! is request/response, not a stream; `update` takes `&mut self`, so at
//! most one request is ever outstanding per worker.
//!
//! The worker holds no shared state: it decodes into its own arena,
//! reconstructs parent links, runs the same recalc, and ships a value copy
//! back. Cancellation is by discard: [`CostWorker::cancel`] drops the
//! channel handles, the thread exits on disconnect, and the next call
//! spawns a fresh worker lazily. A channel failure surfaces as
//! [`WorkerError::ChannelClosed`] and likewise discards the handle; there
//! is no automatic retry.

use crate::cost::{CostTree, RootTotals};
use crate::serialize::{
    CostRequest, CostResponse, WireError, WireHeader, decode_request, decode_response,
    encode_request, encode_response, tree_from_wire, tree_to_wire,
};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::JoinHandle;

/// Errors surfaced to the caller of [`CostWorker::update`].
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The worker thread died or its channel disconnected. The handle has
    /// been discarded; the next call starts a fresh worker.
    #[error("background worker channel closed")]
    ChannelClosed,
    #[error(transparent)]
    Wire(#[from] WireError),
}

struct WorkerHandle {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    thread: JoinHandle<()>,
}

/// A lazily spawned background thread that recomputes cost trees.
#[derive(Default)]
pub struct CostWorker {
    handle: Option<WorkerHandle>,
}

impl CostWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| !h.thread.is_finished())
    }

    /// Recompute `tree` for `quantity` on the worker thread. Returns the
    /// recomputed tree (a fresh value replacing the caller's working copy)
    /// and its root totals.
    pub fn update(
        &mut self,
        tree: &CostTree,
        quantity: u64,
    ) -> Result<(CostTree, RootTotals), WorkerError> {
        let request = CostRequest {
            header: WireHeader::new(),
            tree: tree_to_wire(tree),
            quantity,
        };
        let bytes = encode_request(&request)?;

        let sent = self
            .handle
            .get_or_insert_with(spawn_worker)
            .tx
            .send(bytes)
            .is_ok();
        if !sent {
            self.discard("request channel closed");
            return Err(WorkerError::ChannelClosed);
        }

        let received = match &self.handle {
            Some(handle) => handle.rx.recv(),
            None => return Err(WorkerError::ChannelClosed),
        };
        let response_bytes = match received {
            Ok(bytes) => bytes,
            Err(_) => {
                self.discard("response channel closed");
                return Err(WorkerError::ChannelClosed);
            }
        };

        let response = decode_response(&response_bytes)?;
        let updated = tree_from_wire(&response.tree)?;
        Ok((updated, response.totals))
    }

    /// Abandon any in-flight computation. The thread exits when it next
    /// touches its disconnected channels; the next `update` spawns fresh.
    pub fn cancel(&mut self) {
        if self.handle.take().is_some() {
            tracing::debug!("background cost worker cancelled");
        }
    }

    fn discard(&mut self, reason: &str) {
        tracing::warn!(reason, "discarding background cost worker");
        self.handle = None;
    }
}

fn spawn_worker() -> WorkerHandle {
    let (req_tx, req_rx) = channel::<Vec<u8>>();
    let (resp_tx, resp_rx) = channel::<Vec<u8>>();
    let thread = std::thread::spawn(move || worker_loop(req_rx, resp_tx));
    tracing::debug!("background cost worker started");
    WorkerHandle {
        tx: req_tx,
        rx: resp_rx,
        thread,
    }
}

fn worker_loop(rx: Receiver<Vec<u8>>, tx: Sender<Vec<u8>>) {
    while let Ok(bytes) = rx.recv() {
        match handle_request(&bytes) {
            Ok(encoded) => {
                if tx.send(encoded).is_err() {
                    // Caller cancelled while we were computing.
                    return;
                }
            }
            Err(err) => {
                // Exit without replying; the caller observes the
                // disconnect and discards this worker.
                tracing::warn!(error = %err, "background worker failed to process request");
                return;
            }
        }
    }
}

fn handle_request(bytes: &[u8]) -> Result<Vec<u8>, WireError> {
    let request = decode_request(bytes)?;
    let mut tree = tree_from_wire(&request.tree)?;
    tree.recalc(request.quantity);
    let response = CostResponse {
        header: WireHeader::new(),
        tree: tree_to_wire(&tree),
        totals: tree.totals(),
    };
    encode_response(&response)
}

// ===========================================================================
// Tests
// ===========================================================================
