use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Runtime switch for the detailed file log.
///
/// Sending a message turns it on when `sending_messages_log_enabled` is set;
/// releasing the application context turns it off again. The binary gates a
/// `tracing` layer on [`LogSwitch::is_enabled`].
#[derive(Debug, Clone, Default)]
pub struct LogSwitch(Arc<AtomicBool>);

impl LogSwitch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self) {
        if !self.0.swap(true, Ordering::Relaxed) {
            tracing::info!("Detailed file log enabled");
        }
    }

    /// Turn the detailed log off.
    pub fn forget(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
