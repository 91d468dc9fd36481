use std::sync::atomic::{AtomicBool, Ordering};

/// The enabled state of the query input and send controls.
///
/// Only one [`InputGuard`] can exist at a time.  While it lives the controls
/// are disabled; dropping it re-enables them on every exit path.
#[derive(Debug)]
pub struct InputGate {
    enabled: AtomicBool,
}

impl InputGate {
    /// Creates a gate with the controls enabled.
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }

    /// Disables the controls, or returns `None` if they already are.
    pub fn try_disable(&self) -> Option<InputGuard<'_>> {
        self.enabled
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InputGuard { gate: self })
    }

    /// Returns true if the user can currently submit.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Default for InputGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the input controls disabled until dropped.
#[derive(Debug)]
pub struct InputGuard<'a> {
    gate: &'a InputGate,
}

impl Drop for InputGuard<'_> {
    fn drop(&mut self) {
        self.gate.enabled.store(true, Ordering::Release);
    }
}
