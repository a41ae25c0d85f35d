//! The Flick state-sequence algorithm, which lets a TAS editor scrub an input timeline of
//! any length against a deterministic emulator.
//!
//! There are three components:
//! - A [NesEmulator](flick_nes::NesEmulator) which implements frame advance and save states
//! - [StateSequence], which owns the emulator, the [InputTimeline], and a sparse
//!   [CheckpointStore], and moves the emulator to any requested frame one frame of work at a
//!   time
//! - [InputLog], the undoable edit history that is the single writer of record for the
//!   controller inputs
//!
//! # Note on frame numbers
//!
//! Frame `i` is the state after `i` frames have been executed since power-on. The input
//! stored at index `i` is consumed while advancing from frame `i` to frame `i + 1`, so
//! editing the input at `i` invalidates every state after frame `i` but not frame `i` itself.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use checkpoints::*;
pub use config::*;
pub use inputs::*;
pub use invalidation::*;
pub use sequence::*;
pub use undo::*;

mod checkpoints;
mod config;
mod inputs;
mod invalidation;
mod sequence;
mod undo;
