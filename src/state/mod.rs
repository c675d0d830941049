// Operation log module
//
// This module provides the OperationLog, the single-slot register of the last
// mutating action performed on the host, with change events for observers.

use crate::error::RelayError;
use crate::models::Operation;
use crate::services::injector::InjectorError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Events emitted when the operation slot changes
#[derive(Clone, Debug, PartialEq)]
pub enum RelayEvent {
    /// A mutating action was performed and now occupies the slot
    OperationRecorded { operation: Operation },

    /// The slot was consumed by an undo
    OperationUndone {
        operation: Operation,
        /// Whether the reversal injection went through
        reverted: bool,
    },
}

/// Thread-safe single-slot operation register
///
/// The slot lock is held across inject-then-record in [`commit`](Self::commit)
/// and across take-then-reverse in [`undo`](Self::undo), so concurrent callers
/// cannot interleave and leave the slot describing something other than the
/// last action that actually reached the host.
pub struct OperationLog {
    slot: Arc<Mutex<Operation>>,

    /// Broadcast channel for slot change events
    event_tx: broadcast::Sender<RelayEvent>,
}

impl OperationLog {
    /// Create an empty log with a broadcast buffer of 100 events
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            slot: Arc::new(Mutex::new(Operation::None)),
            event_tx,
        }
    }

    /// Clone of the live operation
    pub fn current(&self) -> Operation {
        self.lock().clone()
    }

    /// Overwrite the slot unconditionally
    pub fn record(&self, operation: Operation) {
        let mut slot = self.lock();
        *slot = operation.clone();
        drop(slot);
        self.emit(RelayEvent::OperationRecorded { operation });
    }

    /// Run `inject` and record `operation` only if it succeeded
    ///
    /// A failed injection leaves the previous operation in place.
    pub fn commit<F>(&self, operation: Operation, inject: F) -> Result<(), InjectorError>
    where
        F: FnOnce() -> Result<(), InjectorError>,
    {
        let mut slot = self.lock();
        inject()?;
        tracing::debug!("Recorded {} operation", operation.kind());
        *slot = operation.clone();
        drop(slot);

        self.emit(RelayEvent::OperationRecorded { operation });
        Ok(())
    }

    /// Consume the live operation and reverse it with `reverse`
    ///
    /// The slot is reset to `None` whether or not the reversal succeeds, so a
    /// second undo always fails with [`RelayError::NoHistory`].
    ///
    /// # Returns
    /// The restorable content of the undone operation (original text for
    /// `Text`, empty otherwise)
    pub fn undo<F>(&self, reverse: F) -> Result<String, RelayError>
    where
        F: FnOnce(&Operation) -> Result<(), InjectorError>,
    {
        let mut slot = self.lock();
        if slot.is_none() {
            return Err(RelayError::NoHistory);
        }

        let operation = std::mem::take(&mut *slot);
        let result = reverse(&operation);
        drop(slot);

        tracing::info!(
            "Undo {} operation ({})",
            operation.kind(),
            if result.is_ok() { "reverted" } else { "reversal failed" }
        );
        let content = operation.restorable_content().to_string();
        self.emit(RelayEvent::OperationUndone {
            operation,
            reverted: result.is_ok(),
        });

        result?;
        Ok(content)
    }

    /// Subscribe to slot change events
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: RelayEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, Operation> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the slot and the event channel
impl Clone for OperationLog {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            event_tx: self.event_tx.clone(),
        }
    }
}
