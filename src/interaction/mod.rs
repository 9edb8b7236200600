use serde::{Deserialize, Serialize};

/// User-facing navigation input, independent of how it was triggered
/// (buttons, keys, wheel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum NavigationCommand {
    ZoomIn,
    ZoomOut,
    PanForward { steps: u32 },
    PanBackward { steps: u32 },
    JumpToToday,
}

impl NavigationCommand {
    #[must_use]
    pub const fn pan_forward() -> Self {
        Self::PanForward { steps: 1 }
    }

    #[must_use]
    pub const fn pan_backward() -> Self {
        Self::PanBackward { steps: 1 }
    }
}

/// What a navigation transition did to the view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationOutcome {
    /// Boundary or zero-step input; state untouched.
    Unchanged,
    /// Transition applied as requested.
    Moved,
    /// Pan left the navigable year range; center reset to now.
    ResetToNow,
}

impl NavigationOutcome {
    #[must_use]
    pub fn changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}
