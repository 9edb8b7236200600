use serde::{Deserialize, Serialize};

/// Identity of one reusable row render slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub usize);

/// One row placed by the virtual list for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VirtualRow {
    pub slot: SlotId,
    pub index: usize,
    pub top_px: f64,
    pub height_px: f64,
    /// `true` when the slot held a different item (or nothing) last frame,
    /// so its content must be redrawn rather than just repositioned.
    pub rebound: bool,
}
