//! The assignment engine.
//!
//! Every function here is a pure computation over a snapshot of a game: it
//! takes participants/assignments (or a whole [`Game`](super::game::Game)) by
//! reference plus an injectable random source, and returns a new value. The
//! input is never mutated, so a failed call leaves the caller's state as it was.

pub mod generator;
pub mod membership;
pub mod reassign_all;
pub mod swap;

pub use generator::{MIN_PARTICIPANTS, generate};
pub use membership::{add_participant, ensure_unique, remove_participant, update_participant};
pub use reassign_all::reassign_all;
pub use swap::{SwapOutcome, reassign_one};
