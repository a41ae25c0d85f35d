//! A deterministic stand-in for a real emulator core.
//!
//! [HashConsole] has no CPU or PPU. Its "RAM" is a small buffer that is scrambled every frame
//! using the program image, the frame number, and the controller input, so any divergence in
//! input history shows up in the serialized state.

use crate::{ControllerState, EmulatorError, NesEmulator, StateBlob};

const MAGIC: &[u8; 4] = b"HCS1";
const RAM_LEN: usize = 64;
const STATE_LEN: usize = MAGIC.len() + 8 + RAM_LEN;

/// A deterministic fake console for tests.
#[derive(Debug, Clone)]
pub struct HashConsole {
    program: Vec<u8>,
    frame: u64,
    ram: [u8; RAM_LEN],
    fail_at_frame: Option<u64>,
}

impl HashConsole {
    /// Create a console and load `program` into it.
    ///
    /// # Panics
    ///
    /// Panics if `program` is empty.
    pub fn with_program(program: &[u8]) -> Self {
        let mut console = Self::default();
        if let Err(error) = console.load_program_image(program) {
            panic!("Error:\n  {}\n", error);
        }
        console
    }

    /// Make [advance_frame](NesEmulator::advance_frame) fail when it would execute `frame`.
    pub fn fail_at_frame(mut self, frame: u64) -> Self {
        self.fail_at_frame = Some(frame);
        self
    }

    /// The number of frames executed since power-on.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The console's scratch RAM.
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }
}

impl Default for HashConsole {
    fn default() -> Self {
        Self {
            program: Vec::new(),
            frame: 0,
            ram: [0; RAM_LEN],
            fail_at_frame: None,
        }
    }
}

impl NesEmulator for HashConsole {
    fn load_program_image(&mut self, image: &[u8]) -> Result<(), EmulatorError> {
        if image.is_empty() {
            return Err(EmulatorError::InvalidProgramImage {
                reason: "empty image".to_string(),
            });
        }
        self.program = image.to_vec();
        self.frame = 0;
        for (i, byte) in self.ram.iter_mut().enumerate() {
            *byte = self.program[i % self.program.len()];
        }
        Ok(())
    }

    fn advance_frame(&mut self, input: ControllerState) -> Result<(), EmulatorError> {
        if self.fail_at_frame == Some(self.frame) {
            return Err(EmulatorError::Execution {
                frame: self.frame,
                reason: "injected failure".to_string(),
            });
        }

        let mut carry = input.bits() ^ (self.frame as u8);
        for i in 0..RAM_LEN {
            let program_byte = match self.program.len() {
                0 => 0,
                len => self.program[(i + self.frame as usize) % len],
            };
            let mixed = self.ram[i]
                .rotate_left(3)
                .wrapping_add(carry)
                .wrapping_mul(31)
                ^ program_byte;
            self.ram[i] = mixed;
            carry = mixed;
        }
        self.frame += 1;
        Ok(())
    }

    fn save_state(&self) -> Result<StateBlob, EmulatorError> {
        let mut bytes = Vec::with_capacity(STATE_LEN);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&self.frame.to_le_bytes());
        bytes.extend_from_slice(&self.ram);
        Ok(bytes.into())
    }

    fn load_state(&mut self, state: &[u8]) -> Result<(), EmulatorError> {
        if state.len() != STATE_LEN || &state[..MAGIC.len()] != MAGIC {
            return Err(EmulatorError::InvalidState {
                reason: format!("expected {} byte HashConsole state", STATE_LEN),
            });
        }
        let mut frame = [0; 8];
        frame.copy_from_slice(&state[MAGIC.len()..MAGIC.len() + 8]);
        self.frame = u64::from_le_bytes(frame);
        self.ram.copy_from_slice(&state[MAGIC.len() + 8..]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(console: &mut HashConsole, inputs: &[ControllerState]) {
        for &input in inputs {
            console.advance_frame(input).unwrap();
        }
    }

    fn inputs(n: usize) -> Vec<ControllerState> {
        (0..n)
            .map(|i| ControllerState::from_byte((i * 37 % 256) as u8))
            .collect()
    }

    #[test]
    fn save_load_round_trip_is_bit_identical() {
        let inputs = inputs(100);
        for k in [0, 1, 17, 64, 99] {
            let mut straight = HashConsole::with_program(b"rom image");
            run(&mut straight, &inputs);

            let mut first = HashConsole::with_program(b"rom image");
            run(&mut first, &inputs[..k]);
            let blob = first.save_state().unwrap();

            let mut second = HashConsole::with_program(b"rom image");
            second.load_state(&blob).unwrap();
            run(&mut second, &inputs[k..]);

            assert_eq!(
                straight.save_state().unwrap(),
                second.save_state().unwrap(),
                "diverged after split at {}",
                k
            );
        }
    }

    #[test]
    fn input_changes_state() {
        let mut a = HashConsole::with_program(b"rom");
        let mut b = HashConsole::with_program(b"rom");
        a.advance_frame(ControllerState::empty()).unwrap();
        b.advance_frame(ControllerState::A).unwrap();
        assert_ne!(a.save_state().unwrap(), b.save_state().unwrap());
    }

    #[test]
    fn rejects_foreign_state() {
        let mut console = HashConsole::with_program(b"rom");
        assert!(matches!(
            console.load_state(b"garbage"),
            Err(EmulatorError::InvalidState { .. })
        ));
    }

    #[test]
    fn injected_failure() {
        let mut console = HashConsole::with_program(b"rom").fail_at_frame(2);
        console.advance_frame(ControllerState::empty()).unwrap();
        console.advance_frame(ControllerState::empty()).unwrap();
        assert!(matches!(
            console.advance_frame(ControllerState::empty()),
            Err(EmulatorError::Execution { frame: 2, .. })
        ));
    }
}
