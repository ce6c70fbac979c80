// Game session: beat scheduling, note arena, play config and logging

mod arena;
pub mod config;
pub mod logging;
mod scheduler;
mod session;
pub mod time;

pub use arena::{ArenaNote, NoteArena};
pub use config::{BPM_MAX, BPM_MIN, PlayConfig};
pub use scheduler::{BeatScheduler, DEFAULT_LEAD_TIME_MS, ScheduledNote};
pub use session::{GameSession, SessionEvent, SessionState};
pub use time::{MockTimeProvider, SystemTimeProvider, TimeProvider};
