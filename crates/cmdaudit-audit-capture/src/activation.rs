//! The activation gate.

use std::sync::atomic::{AtomicU8, Ordering};

/// Whether observed calls are recorded, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Activation {
    Inactive = 0,
    /// No activation pattern was configured.
    ActiveByDefault = 1,
    /// The activation pattern matched, or a caller asked.
    ActiveByRequest = 2,
}

impl Activation {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::ActiveByDefault,
            2 => Self::ActiveByRequest,
            _ => Self::Inactive,
        }
    }
}

/// Lock-free tri-state gate consulted by every recording operation.
#[derive(Debug)]
pub struct ActivationController {
    state: AtomicU8,
}

impl Default for ActivationController {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivationController {
    /// Start inactive.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(Activation::Inactive as u8),
        }
    }

    pub fn state(&self) -> Activation {
        Activation::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set(&self, state: Activation) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.state() != Activation::Inactive
    }

    pub fn is_active_by_default(&self) -> bool {
        self.state() == Activation::ActiveByDefault
    }

    pub fn is_active_by_request(&self) -> bool {
        self.state() == Activation::ActiveByRequest
    }

    /// Force recording on.
    pub fn set_active(&self) {
        self.set(Activation::ActiveByRequest);
    }

    /// Force recording off.
    pub fn set_inactive(&self) {
        self.set(Activation::Inactive);
    }

    pub(crate) fn set_active_by_default(&self) {
        self.set(Activation::ActiveByDefault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_inactive() {
        let a = ActivationController::new();
        assert!(!a.is_active());
        assert_eq!(a.state(), Activation::Inactive);
    }

    #[test]
    fn test_transitions() {
        let a = ActivationController::new();
        a.set_active_by_default();
        assert!(a.is_active() && a.is_active_by_default() && !a.is_active_by_request());
        a.set_active();
        assert!(a.is_active_by_request());
        a.set_inactive();
        assert!(!a.is_active());
    }
}
