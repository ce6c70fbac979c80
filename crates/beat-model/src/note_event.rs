use serde::{Deserialize, Serialize};

/// Accent of a compiled note. The host maps it to sound velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Strong,
    Weak,
}

impl Intensity {
    pub const STRONG_SYMBOL: char = 'X';
    pub const WEAK_SYMBOL: char = 'x';

    /// `X` is strong, `x` is weak, anything else is not a note.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            Self::STRONG_SYMBOL => Some(Self::Strong),
            Self::WEAK_SYMBOL => Some(Self::Weak),
            _ => None,
        }
    }

    pub fn velocity(self) -> f32 {
        match self {
            Self::Strong => 1.0,
            Self::Weak => 0.7,
        }
    }
}

/// A note at a fixed offset from the start of one pattern loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    /// Track index (0..3)
    pub track: usize,
    /// Character index in the track notation
    pub slot: usize,
    /// Offset from loop start in milliseconds (slot * unit duration)
    pub timing_ms: f64,
    pub intensity: Intensity,
}

impl NoteEvent {
    /// Ordering key: timing ascending, then track ascending.
    pub fn order_key(&self) -> (usize, usize) {
        (self.slot, self.track)
    }
}

/// Sort events into compiled order.
pub(crate) fn sort_events(events: &mut [NoteEvent]) {
    events.sort_by_key(NoteEvent::order_key);
}
