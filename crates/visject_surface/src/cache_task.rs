// SPDX-License-Identifier: MIT OR Apache-2.0
//! Background computation of custom archetype groups.
//!
//! Reflection-driven surfaces build their node menus off the editor thread.
//! The result is published into the factory overlay only when the editor
//! thread explicitly syncs with the task; it never mutates shared state on
//! its own.

use crate::archetype::GroupArchetype;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Cancellation flag handed to the background job
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Whether the job should stop early
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

struct TaskState {
    result: Mutex<Option<Vec<GroupArchetype>>>,
    ready: Condvar,
    complete: AtomicBool,
}

/// Marks the task complete when the worker exits, including by unwinding
struct CompletionGuard(Arc<TaskState>);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let _result = self.0.result.lock();
        self.0.complete.store(true, Ordering::Release);
        self.0.ready.notify_all();
    }
}

/// Handle to a background archetype computation
pub struct ArchetypeCacheTask {
    state: Arc<TaskState>,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ArchetypeCacheTask {
    /// Run `job` on a worker thread
    pub fn spawn<F>(job: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Vec<GroupArchetype> + Send + 'static,
    {
        let state = Arc::new(TaskState {
            result: Mutex::new(None),
            ready: Condvar::new(),
            complete: AtomicBool::new(false),
        });
        let cancelled = Arc::new(AtomicBool::new(false));
        let token = CancelToken {
            cancelled: Arc::clone(&cancelled),
        };

        let worker_state = Arc::clone(&state);
        let handle = std::thread::spawn(move || {
            let guard = CompletionGuard(worker_state);
            let groups = job(&token);
            if token.is_cancelled() {
                tracing::debug!("Archetype cache task cancelled, dropping {} groups", groups.len());
            } else {
                *guard.0.result.lock() = Some(groups);
            }
        });

        Self {
            state,
            cancelled,
            handle: Some(handle),
        }
    }

    /// Task whose result is already known
    pub fn ready(groups: Vec<GroupArchetype>) -> Self {
        Self {
            state: Arc::new(TaskState {
                result: Mutex::new(Some(groups)),
                ready: Condvar::new(),
                complete: AtomicBool::new(true),
            }),
            cancelled: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Whether the job has finished
    pub fn is_ready(&self) -> bool {
        self.state.complete.load(Ordering::Acquire)
    }

    /// Whether the task was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Block until the job finishes or `timeout` elapses; returns whether it finished
    pub fn wait(&self, timeout: Duration) -> bool {
        let mut result = self.state.result.lock();
        if self.is_ready() {
            return true;
        }
        let timed_out = self.state.ready.wait_while_for(
            &mut result,
            |_| !self.state.complete.load(Ordering::Acquire),
            timeout,
        );
        !timed_out.timed_out()
    }

    /// Ask the job to stop; a late result is discarded
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Take the computed groups once the job finished
    pub fn take(&mut self) -> Option<Vec<GroupArchetype>> {
        if !self.is_ready() || self.is_cancelled() {
            return None;
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Archetype cache task panicked");
            }
        }
        self.state.result.lock().take()
    }
}

impl Drop for ArchetypeCacheTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for ArchetypeCacheTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchetypeCacheTask")
            .field("ready", &self.is_ready())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
