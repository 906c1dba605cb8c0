//! Load stage handles
//!
//! A [`LoadStageHandle`] is the read side of one asynchronous load; the
//! matching [`StageCompleter`] is the write side held by the loader. A handle
//! settles exactly once, to Ready or Failed, and then never changes. Readers
//! that want to know when that happens register a callback with
//! [`LoadStageHandle::on_settled`]; nobody polls.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::AssetError;

type SettleCallback = Box<dyn FnOnce() + Send + 'static>;

/// Observable state of a stage, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Still loading
    Pending,
    /// Loaded successfully
    Ready,
    /// Load failed; permanent
    Failed,
}

enum StageState<T> {
    Pending,
    Ready(T),
    Failed(AssetError),
}

struct StageSlot<T> {
    state: StageState<T>,
    callbacks: Vec<SettleCallback>,
}

struct StageShared<T> {
    label: String,
    slot: Mutex<StageSlot<T>>,
}

impl<T> StageShared<T> {
    fn lock(&self) -> MutexGuard<'_, StageSlot<T>> {
        // A panicking callback never runs under the lock, the slot stays consistent
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read side of an asynchronous load
pub struct LoadStageHandle<T> {
    shared: Arc<StageShared<T>>,
}

/// Write side of an asynchronous load
///
/// Dropping a completer without calling [`StageCompleter::complete`] fails
/// the stage with [`AssetError::Abandoned`].
pub struct StageCompleter<T> {
    shared: Option<Arc<StageShared<T>>>,
}

impl<T> LoadStageHandle<T> {
    /// Create a pending stage and the completer that settles it
    pub fn pending(label: impl Into<String>) -> (Self, StageCompleter<T>) {
        let shared = Arc::new(StageShared {
            label: label.into(),
            slot: Mutex::new(StageSlot {
                state: StageState::Pending,
                callbacks: Vec::new(),
            }),
        });
        (
            Self { shared: Arc::clone(&shared) },
            StageCompleter { shared: Some(shared) },
        )
    }

    /// Stage that is already Ready
    pub fn ready(label: impl Into<String>, value: T) -> Self {
        let (handle, completer) = Self::pending(label);
        completer.complete(Ok(value));
        handle
    }

    /// Stage that has already Failed
    pub fn failed(label: impl Into<String>, error: AssetError) -> Self {
        let (handle, completer) = Self::pending(label);
        completer.complete(Err(error));
        handle
    }

    /// What this stage loads, for log messages
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Current status
    pub fn status(&self) -> StageStatus {
        match self.shared.lock().state {
            StageState::Pending => StageStatus::Pending,
            StageState::Ready(_) => StageStatus::Ready,
            StageState::Failed(_) => StageStatus::Failed,
        }
    }

    /// Failure reason once Failed
    pub fn error(&self) -> Option<AssetError> {
        match &self.shared.lock().state {
            StageState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Run `callback` once the stage settles
    ///
    /// Runs immediately on the calling thread if the stage already settled,
    /// otherwise on whichever thread completes it.
    pub fn on_settled(&self, callback: impl FnOnce() + Send + 'static) {
        let mut slot = self.shared.lock();
        if matches!(slot.state, StageState::Pending) {
            slot.callbacks.push(Box::new(callback));
            return;
        }
        drop(slot);
        callback();
    }
}

impl<T: Clone> LoadStageHandle<T> {
    /// Loaded value once Ready
    pub fn value(&self) -> Option<T> {
        match &self.shared.lock().state {
            StageState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Terminal outcome, `None` while Pending
    pub fn outcome(&self) -> Option<Result<T, AssetError>> {
        match &self.shared.lock().state {
            StageState::Pending => None,
            StageState::Ready(value) => Some(Ok(value.clone())),
            StageState::Failed(error) => Some(Err(error.clone())),
        }
    }
}

impl<T> Clone for LoadStageHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for LoadStageHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadStageHandle")
            .field("label", &self.shared.label)
            .field("status", &self.status())
            .finish()
    }
}

impl<T> StageCompleter<T> {
    /// Settle the stage and run its callbacks
    pub fn complete(mut self, result: Result<T, AssetError>) {
        if let Some(shared) = self.shared.take() {
            settle(&shared, result);
        }
    }
}

impl<T> Drop for StageCompleter<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            let label = shared.label.clone();
            log::debug!("Stage '{}' abandoned by its loader", label);
            settle(&shared, Err(AssetError::Abandoned(label)));
        }
    }
}

fn settle<T>(shared: &StageShared<T>, result: Result<T, AssetError>) {
    let callbacks = {
        let mut slot = shared.lock();
        if !matches!(slot.state, StageState::Pending) {
            return;
        }
        slot.state = match result {
            Ok(value) => StageState::Ready(value),
            Err(error) => StageState::Failed(error),
        };
        std::mem::take(&mut slot.callbacks)
    };

    for callback in callbacks {
        callback();
    }
}
