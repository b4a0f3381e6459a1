//! Persistent State
//!
//! The resumable batch state lives in a single JSON file written atomically
//! after every mutation.

pub mod progress;

pub use progress::{
    Clock, FixedClock, ProgressRecord, ProgressStore, SharedClock, SystemClock,
    rollover_if_new_day, write_atomic,
};
