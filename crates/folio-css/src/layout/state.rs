//! Per-box layout lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// How far layout has progressed for one box in the current pass.
///
/// `Nothing → Flux → ChildrenFlux → Done`; a reset returns to `Nothing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LayoutState {
    /// Not laid out (or reset).
    Nothing = 0,
    /// Own geometry being computed.
    Flux = 1,
    /// Children being laid out.
    ChildrenFlux = 2,
    /// Geometry final for this pass.
    Done = 3,
}

impl LayoutState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Flux,
            2 => Self::ChildrenFlux,
            3 => Self::Done,
            _ => Self::Nothing,
        }
    }
}

impl fmt::Display for LayoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nothing => "NOTHING",
            Self::Flux => "FLUX",
            Self::ChildrenFlux => "CHILDREN_FLUX",
            Self::Done => "DONE",
        })
    }
}

/// A [`LayoutState`] that a status thread may read while layout runs.
#[derive(Default)]
pub struct AtomicLayoutState(AtomicU8);

impl AtomicLayoutState {
    /// Current state.
    #[must_use]
    pub fn load(&self) -> LayoutState {
        LayoutState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `state`.
    pub fn store(&self, state: LayoutState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

impl fmt::Debug for AtomicLayoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_load() {
        let state = AtomicLayoutState::default();
        assert_eq!(state.load(), LayoutState::Nothing);
        state.store(LayoutState::ChildrenFlux);
        assert_eq!(state.load(), LayoutState::ChildrenFlux);
        assert_eq!(state.load().to_string(), "CHILDREN_FLUX");
    }
}
