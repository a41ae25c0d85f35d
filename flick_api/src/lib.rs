//! The Flick API used by the TAS editor UI.
//!
//! [SequenceWorker] runs a [StateSequence](flick_timeline::StateSequence) on a background
//! thread so that scrubbing and editing never block the UI's redraw. The UI thread only
//! queues edits, sets a target frame, and polls for the newest computed state.
//!
//! Edits normally flow through an [InputLog](flick_timeline::InputLog) whose sink is the
//! worker, so undo and redo reach the simulation the same way direct edits do:
//!
//! ```no_run
//! use flick_api::{SequenceWorker, WorkerConfig};
//! use flick_nes::ControllerState;
//! use flick_timeline::{InputLog, InputTimeline};
//! # fn emulator() -> Box<dyn flick_nes::NesEmulator + Send> { unimplemented!() }
//!
//! let worker = SequenceWorker::spawn(WorkerConfig::default(), emulator(), InputTimeline::new())
//!     .unwrap();
//! let mut log = InputLog::new(InputTimeline::new(), worker);
//!
//! log.change_input_to(20, ControllerState::START);
//! log.sink().target_change(40);
//!
//! loop {
//!     if let Some((frame, state)) = log.sink_mut().has_new_state() {
//!         // render `state`
//!         if frame == 40 {
//!             break;
//!         }
//!     }
//! }
//! ```
//!
//! Movie files use the FM2 text format, see [read_fm2] and [write_fm2].

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use config::*;
pub use error::*;
pub use fm2::*;
pub use worker::*;

mod config;
mod error;
mod fm2;
pub mod logging;
mod worker;
