use beat_model::Intensity;
use beat_rule::{FallingNote, JudgeZone, NoteId};

/// A note living in the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaNote {
    pub track: usize,
    pub intensity: Intensity,
    /// When the note's center reaches the judgment line
    pub hit_at_ms: i64,
    pub spawn_seq: u64,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    note: Option<ArenaNote>,
}

/// Fixed-capacity storage for in-flight notes.
///
/// Freed slots are reused through a free list; each reuse bumps the slot
/// generation so old handles stop resolving.
#[derive(Debug, Clone)]
pub struct NoteArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    capacity: usize,
    live: usize,
    next_seq: u64,
    /// Time for a note to travel from the top to the judgment line
    fall_time_ms: i64,
}

impl NoteArena {
    pub fn new(capacity: usize, fall_time_ms: i64) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity,
            live: 0,
            next_seq: 0,
            fall_time_ms: fall_time_ms.max(1),
        }
    }

    /// Store a new note due at `hit_at_ms`. `None` when the arena is full.
    pub fn allocate(
        &mut self,
        track: usize,
        intensity: Intensity,
        hit_at_ms: i64,
    ) -> Option<NoteId> {
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.slots.len() < self.capacity => {
                self.slots.push(Slot::default());
                u32::try_from(self.slots.len() - 1).ok()?
            }
            None => return None,
        };
        let slot = self.slots.get_mut(index as usize)?;
        slot.note = Some(ArenaNote {
            track,
            intensity,
            hit_at_ms,
            spawn_seq: self.next_seq,
        });
        self.next_seq += 1;
        self.live += 1;
        Some(NoteId {
            index,
            generation: slot.generation,
        })
    }

    /// Remove a note. Stale or unknown ids return `None`.
    pub fn release(&mut self, id: NoteId) -> Option<ArenaNote> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let note = slot.note.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(note)
    }

    pub fn get(&self, id: NoteId) -> Option<&ArenaNote> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.note.as_ref()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn is_full(&self) -> bool {
        self.live >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Release every note.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.note.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            if let Ok(index) = u32::try_from(index) {
                self.free.push(index);
            }
        }
        self.live = 0;
    }

    /// Y of a note's top edge `elapsed_ms` into its fall.
    ///
    /// Starts just above the screen and reaches the judgment line after the
    /// fall time, then keeps moving at the same speed.
    pub fn top_at(&self, elapsed_ms: i64, zone: &JudgeZone, note_height: f32) -> f32 {
        let start = -note_height;
        let target = zone.perfect_center - note_height / 2.0;
        let progress = elapsed_ms as f32 / self.fall_time_ms as f32;
        start + (target - start) * progress
    }

    /// Project every live note to its position at `now_ms`.
    pub fn falling_notes(
        &self,
        now_ms: i64,
        zone: &JudgeZone,
        note_height: f32,
    ) -> Vec<FallingNote> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let note = slot.note.as_ref()?;
                Some(FallingNote {
                    id: NoteId {
                        index: u32::try_from(index).ok()?,
                        generation: slot.generation,
                    },
                    track: note.track,
                    top: self.top_at(
                        now_ms - note.hit_at_ms + self.fall_time_ms,
                        zone,
                        note_height,
                    ),
                    height: note_height,
                    active: true,
                    spawn_seq: note.spawn_seq,
                })
            })
            .collect()
    }
}
