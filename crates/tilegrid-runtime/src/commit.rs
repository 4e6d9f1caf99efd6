#![forbid(unsafe_code)]

//! Fire-and-forget commit worker.
//!
//! The drag gesture completes, and the grid already shows the final order,
//! before the store round-trip resolves. [`OrderCommitter`] hands each
//! final order to a single worker thread so the interaction thread never
//! blocks on persistence.
//!
//! # Ordering
//!
//! Requests are processed in submission order, which is gesture-completion
//! order. When several requests for the same user are queued, only the most
//! recent one is written; the older ones report
//! [`CommitStatus::Superseded`]. Since every request is a full replace, the
//! stored order always ends up as the order active at the latest drag end.
//!
//! # Shutdown
//!
//! [`OrderCommitter::shutdown`] (and `Drop`) closes the queue, lets the
//! worker drain what is already queued, and joins it.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;

use thiserror::Error;
use tilegrid_core::ItemId;
use web_time::{Duration, Instant};

use crate::retry::{RetryPolicy, replace_with_retry};
use crate::store::{OrderStore, UserId};

/// One queued full replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Submission sequence number, strictly increasing.
    pub seq: u64,
    pub user: UserId,
    pub order: Vec<ItemId>,
}

/// How a commit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    /// The store accepted the order.
    Committed {
        /// Attempts used, including the first.
        attempts: u32,
    },
    /// A newer order for the same user replaced this one before it was written.
    Superseded,
    /// Every attempt failed. The local order is kept.
    Failed {
        /// Message of the last store error.
        error: String,
        /// Attempts used, including the first.
        attempts: u32,
    },
}

impl CommitStatus {
    /// Short name for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Committed { .. } => "committed",
            Self::Superseded => "superseded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Result reported back for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub seq: u64,
    pub user: UserId,
    pub status: CommitStatus,
}

/// The worker is no longer accepting requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("commit worker has stopped")]
pub struct WorkerStopped;

/// Count of requests the worker has finished with.
#[derive(Debug, Default)]
struct Progress {
    done: Mutex<u64>,
    changed: Condvar,
}

impl Progress {
    fn complete_one(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        *done += 1;
        self.changed.notify_all();
    }
}

/// Handle to the background commit worker.
#[derive(Debug)]
pub struct OrderCommitter {
    requests: Option<Sender<CommitRequest>>,
    outcomes: Receiver<CommitOutcome>,
    progress: Arc<Progress>,
    worker: Option<JoinHandle<()>>,
    next_seq: u64,
}

impl OrderCommitter {
    /// Start the worker thread.
    pub fn spawn(store: Arc<dyn OrderStore>, policy: RetryPolicy) -> Self {
        let (request_tx, request_rx) = mpsc::channel();
        let (outcome_tx, outcome_rx) = mpsc::channel();
        let progress = Arc::new(Progress::default());
        let worker_progress = Arc::clone(&progress);

        let worker = std::thread::Builder::new()
            .name("tilegrid-commit".into())
            .spawn(move || run_worker(&request_rx, &outcome_tx, &*store, &policy, &worker_progress));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(target: "tilegrid.commit", error = %e, "failed to spawn commit worker");
                None
            }
        };

        Self {
            requests: worker.as_ref().map(|_| request_tx),
            outcomes: outcome_rx,
            progress,
            worker,
            next_seq: 0,
        }
    }

    /// Queue a full replace of `user`'s order. Returns its sequence number.
    pub fn submit(&mut self, user: UserId, order: Vec<ItemId>) -> Result<u64, WorkerStopped> {
        let requests = self.requests.as_ref().ok_or(WorkerStopped)?;
        let seq = self.next_seq + 1;
        tracing::debug!(
            target: "tilegrid.commit",
            seq,
            user = %user,
            len = order.len(),
            "commit queued"
        );
        requests
            .send(CommitRequest { seq, user, order })
            .map_err(|_| WorkerStopped)?;
        self.next_seq = seq;
        Ok(seq)
    }

    /// Number of requests submitted so far.
    #[must_use]
    pub fn submitted(&self) -> u64 {
        self.next_seq
    }

    /// Drain outcomes reported since the last poll. Never blocks.
    pub fn poll_outcomes(&self) -> Vec<CommitOutcome> {
        self.outcomes.try_iter().collect()
    }

    /// Block until every submitted request is finished or `timeout` elapses.
    ///
    /// Returns `true` when the worker is idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let target = self.next_seq;
        let deadline = Instant::now() + timeout;
        let mut done = self
            .progress
            .done
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *done < target {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            done = match self.progress.changed.wait_timeout(done, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    /// Close the queue, drain it, and join the worker.
    pub fn shutdown(mut self) -> Vec<CommitOutcome> {
        self.stop();
        self.poll_outcomes()
    }

    fn stop(&mut self) {
        self.requests = None;
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.join().is_err() {
            tracing::error!(target: "tilegrid.commit", "commit worker panicked");
        }
    }
}

impl Drop for OrderCommitter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn drain(requests: &Receiver<CommitRequest>, pending: &mut VecDeque<CommitRequest>) {
    pending.extend(requests.try_iter());
}

fn run_worker(
    requests: &Receiver<CommitRequest>,
    outcomes: &Sender<CommitOutcome>,
    store: &dyn OrderStore,
    policy: &RetryPolicy,
    progress: &Progress,
) {
    let mut pending: VecDeque<CommitRequest> = VecDeque::new();
    loop {
        if pending.is_empty() {
            match requests.recv() {
                Ok(request) => pending.push_back(request),
                Err(_) => break,
            }
        }
        drain(requests, &mut pending);
        let Some(request) = pending.pop_front() else {
            continue;
        };

        let status = if pending.iter().any(|p| p.user == request.user) {
            CommitStatus::Superseded
        } else {
            replace_with_retry(store, &request.user, &request.order, policy, || {
                drain(requests, &mut pending);
                pending.iter().any(|p| p.user == request.user)
            })
        };

        tracing::debug!(
            target: "tilegrid.commit",
            seq = request.seq,
            user = %request.user,
            status = status.as_str(),
            "commit finished"
        );

        // The handle may already be gone; outcomes are advisory.
        let _ = outcomes.send(CommitOutcome {
            seq: request.seq,
            user: request.user,
            status,
        });
        progress.complete_one();
    }
}
