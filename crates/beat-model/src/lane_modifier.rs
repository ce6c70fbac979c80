// Lane modifiers: remap the four tracks of a compiled pattern
//
// Each modifier produces a mapping where `mapping[old_track] = new_track`.
// Every mapping is a permutation of 0..TRACK_COUNT.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::TRACK_COUNT;
use crate::note_event::{NoteEvent, sort_events};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LaneModifier {
    #[default]
    Off,
    /// Reverse the track order.
    Mirror,
    /// Shift every track right by `offset`, wrapping around.
    Rotate { offset: usize },
    /// Seeded shuffle. The same seed always yields the same mapping.
    Random { seed: u64 },
}

impl LaneModifier {
    pub fn mapping(&self) -> [usize; TRACK_COUNT] {
        let mut mapping = [0usize; TRACK_COUNT];
        for (i, m) in mapping.iter_mut().enumerate() {
            *m = i;
        }
        match *self {
            Self::Off => {}
            Self::Mirror => mapping.reverse(),
            Self::Rotate { offset } => {
                let offset = offset % TRACK_COUNT;
                for (i, m) in mapping.iter_mut().enumerate() {
                    *m = (i + offset) % TRACK_COUNT;
                }
            }
            Self::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                mapping.shuffle(&mut rng);
            }
        }
        mapping
    }

    /// Same mapping with any rotate offset reduced below `TRACK_COUNT`.
    pub fn normalized(self) -> Self {
        match self {
            Self::Rotate { offset } => Self::Rotate {
                offset: offset % TRACK_COUNT,
            },
            other => other,
        }
    }

    pub fn is_identity(&self) -> bool {
        let mapping = self.mapping();
        mapping.iter().enumerate().all(|(i, &m)| i == m)
    }

    /// Rewrite event tracks and restore compiled order.
    pub fn apply(&self, events: &mut [NoteEvent]) {
        if matches!(self, Self::Off) {
            return;
        }
        let mapping = self.mapping();
        for event in events.iter_mut() {
            if event.track < TRACK_COUNT {
                event.track = mapping[event.track];
            }
        }
        sort_events(events);
    }
}
