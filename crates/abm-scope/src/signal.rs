//! Control-flow signals threaded through a scope chain.

use std::fmt;

/// The single active control signal of a scope chain.
///
/// Behaviors raise signals instead of unwinding; every executor checks
/// [`Signal::interrupts`] after each sub-step and stops early when set.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Signal {
    #[default]
    None,
    /// Leave the innermost loop.
    Break,
    /// Skip to the next loop iteration.
    Continue,
    /// Leave the current action / behavior body.
    Return,
    /// Suspend until an external controller releases the hold.
    Pause,
    /// The current agent dies at the end of its step.
    Die,
    /// Stop the whole cycle.  Sticky: nothing but an explicit reset clears it.
    Abort,
}

impl Signal {
    /// `true` if the signal should stop the remaining statements of a block.
    #[inline]
    pub fn interrupts(self) -> bool {
        matches!(self, Signal::Break | Signal::Continue | Signal::Return | Signal::Die | Signal::Abort)
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == Signal::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::None     => "none",
            Signal::Break    => "break",
            Signal::Continue => "continue",
            Signal::Return   => "return",
            Signal::Pause    => "pause",
            Signal::Die      => "die",
            Signal::Abort    => "abort",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
