use std::{fmt, ops::Deref, sync::Arc};

use crate::{ControllerState, EmulatorError};

/// An opaque serialized emulator state.
///
/// Blobs are only meaningful to emulators of the same type as the one that produced them.
/// Cloning is cheap, so the same blob can be held by the checkpoint store and published to
/// the UI at the same time.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StateBlob(Arc<[u8]>);

impl StateBlob {
    /// The serialized bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The size of the blob in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the blob contains no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for StateBlob {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for StateBlob {
    fn from(v: Vec<u8>) -> Self {
        Self(v.into())
    }
}

impl From<&[u8]> for StateBlob {
    fn from(v: &[u8]) -> Self {
        Self(v.into())
    }
}

impl fmt::Debug for StateBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateBlob({} bytes)", self.0.len())
    }
}

/// A deterministic NES emulator core.
///
/// Given the same starting state and the same input, [advance_frame](Self::advance_frame)
/// must always produce the same resulting state, and a state that is saved and then loaded
/// (possibly into a different instance) must continue bit-identically.
///
/// Implementations are not required to be reentrant. Callers must serialize all access to
/// a single instance.
pub trait NesEmulator {
    /// Load an iNES program image and reset to power-on.
    ///
    /// The state immediately after this call is frame 0.
    fn load_program_image(&mut self, image: &[u8]) -> Result<(), EmulatorError>;

    /// Execute exactly one frame with the given controller input.
    fn advance_frame(&mut self, input: ControllerState) -> Result<(), EmulatorError>;

    /// Serialize the entire machine state.
    fn save_state(&self) -> Result<StateBlob, EmulatorError>;

    /// Replace the machine state with one produced by [save_state](Self::save_state).
    fn load_state(&mut self, state: &[u8]) -> Result<(), EmulatorError>;
}

impl<E: NesEmulator + ?Sized> NesEmulator for Box<E> {
    fn load_program_image(&mut self, image: &[u8]) -> Result<(), EmulatorError> {
        (**self).load_program_image(image)
    }

    fn advance_frame(&mut self, input: ControllerState) -> Result<(), EmulatorError> {
        (**self).advance_frame(input)
    }

    fn save_state(&self) -> Result<StateBlob, EmulatorError> {
        (**self).save_state()
    }

    fn load_state(&mut self, state: &[u8]) -> Result<(), EmulatorError> {
        (**self).load_state(state)
    }
}
