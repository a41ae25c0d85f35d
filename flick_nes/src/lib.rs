//! NES-side types shared by the Flick crates.
//!
//! Flick never emulates the console itself. Instead it drives an external emulator core
//! through the [NesEmulator] trait, which exposes exactly the operations the state
//! sequence needs:
//! - loading a program image, which establishes frame 0
//! - advancing exactly one frame with a given [ControllerState]
//! - serializing and deserializing the full machine state as a [StateBlob]
//!
//! The correctness of the whole cache depends on the emulator being deterministic: loading a
//! blob and replaying the same inputs must reproduce bit-identical states.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use emulator::*;
pub use error::*;
pub use input::*;

pub mod consts;
mod emulator;
mod error;
mod input;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
