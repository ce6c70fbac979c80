use serde::{Deserialize, Serialize};

/// Handle to a note slot. The generation changes every time the slot is
/// reused, so a stale handle never refers to a newer note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId {
    pub index: u32,
    pub generation: u32,
}

/// Read-only snapshot of an in-flight note for judgment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingNote {
    pub id: NoteId,
    pub track: usize,
    /// Y of the top edge
    pub top: f32,
    pub height: f32,
    pub active: bool,
    /// Monotonic spawn order
    pub spawn_seq: u64,
}

impl FallingNote {
    pub fn center(&self) -> f32 {
        self.top + self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}
