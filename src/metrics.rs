// Relay metrics module
//
// Lightweight counters for what the relay did during this process lifetime

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Relay activity counters
///
/// Uses atomic operations so request handlers can record without locks.
/// Summarised in the log on shutdown.
#[derive(Debug)]
pub struct RelayMetrics {
    /// Text payloads injected
    pub texts_relayed: AtomicU64,

    /// Characters injected after rewrite rules
    pub chars_relayed: AtomicU64,

    /// Single keys, chords, cursor moves and deletes injected
    pub keys_relayed: AtomicU64,

    /// Mouse moves and clicks injected
    pub pointer_events: AtomicU64,

    /// Successful undos
    pub undos: AtomicU64,

    /// Undo requests with no history
    pub empty_undos: AtomicU64,

    /// Injector calls that returned an error
    pub injector_failures: AtomicU64,

    /// Wrong password attempts
    pub auth_failures: AtomicU64,

    /// Attempts answered with a lockout
    pub lockouts: AtomicU64,

    /// Quick option saves that reached disk
    pub options_saved: AtomicU64,

    start_time: Instant,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self {
            texts_relayed: AtomicU64::new(0),
            chars_relayed: AtomicU64::new(0),
            keys_relayed: AtomicU64::new(0),
            pointer_events: AtomicU64::new(0),
            undos: AtomicU64::new(0),
            empty_undos: AtomicU64::new(0),
            injector_failures: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            lockouts: AtomicU64::new(0),
            options_saved: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_text(&self, injected_chars: usize) {
        self.texts_relayed.fetch_add(1, Ordering::Relaxed);
        self.chars_relayed
            .fetch_add(injected_chars as u64, Ordering::Relaxed);
    }

    pub fn record_key(&self) {
        self.keys_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pointer(&self) {
        self.pointer_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_undo(&self) {
        self.undos.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_undo(&self) {
        self.empty_undos.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_injector_failure(&self) {
        self.injector_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lockout(&self) {
        self.lockouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_options_saved(&self) {
        self.options_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Relay Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Relayed: {} texts ({} chars), {} keys, {} pointer events",
            self.texts_relayed.load(Ordering::Relaxed),
            self.chars_relayed.load(Ordering::Relaxed),
            self.keys_relayed.load(Ordering::Relaxed),
            self.pointer_events.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Undo: {} performed, {} with no history",
            self.undos.load(Ordering::Relaxed),
            self.empty_undos.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Auth: {} failures, {} lockouts; injector failures: {}; option saves: {}",
            self.auth_failures.load(Ordering::Relaxed),
            self.lockouts.load(Ordering::Relaxed),
            self.injector_failures.load(Ordering::Relaxed),
            self.options_saved.load(Ordering::Relaxed)
        );
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}
