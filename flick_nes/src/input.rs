use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// The buttons held on the standard controller during a single frame.
    #[derive(Default)]
    pub struct ControllerState: u8 {
        /// The A button.
        const A      = 0x01;
        /// The B button.
        const B      = 0x02;
        /// The Select button.
        const SELECT = 0x04;
        /// The Start button.
        const START  = 0x08;
        /// D-pad up.
        const UP     = 0x10;
        /// D-pad down.
        const DOWN   = 0x20;
        /// D-pad left.
        const LEFT   = 0x40;
        /// D-pad right.
        const RIGHT  = 0x80;
    }
}

impl ControllerState {
    /// Every button, ordered by bit index.
    pub const BUTTONS: [ControllerState; 8] = [
        Self::A,
        Self::B,
        Self::SELECT,
        Self::START,
        Self::UP,
        Self::DOWN,
        Self::LEFT,
        Self::RIGHT,
    ];

    /// Button letters in movie-file column order, from RIGHT (bit 7) down to A (bit 0).
    pub const LETTERS: [char; 8] = ['R', 'L', 'D', 'U', 'T', 'S', 'B', 'A'];

    /// Build a state from a raw bitmask. Every bit pattern is valid.
    pub fn from_byte(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }

    /// Return `self` with `button` pressed or released.
    pub fn with(self, button: ControllerState, pressed: bool) -> Self {
        let mut state = self;
        state.set(button, pressed);
        state
    }
}

impl From<u8> for ControllerState {
    fn from(v: u8) -> Self {
        Self::from_byte(v)
    }
}

impl From<ControllerState> for u8 {
    fn from(v: ControllerState) -> Self {
        v.bits()
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (column, &letter) in Self::LETTERS.iter().enumerate() {
            let button = Self::BUTTONS[7 - column];
            let c = if self.contains(button) { letter } else { '.' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_is_a_state() {
        for byte in 0..=u8::MAX {
            assert_eq!(ControllerState::from_byte(byte).bits(), byte);
        }
    }

    #[test]
    fn with_toggles_single_button() {
        let state = ControllerState::A.with(ControllerState::START, true);
        assert_eq!(state, ControllerState::A | ControllerState::START);
        assert_eq!(state.with(ControllerState::A, false), ControllerState::START);
    }

    #[test]
    fn display_uses_movie_letters() {
        assert_eq!(ControllerState::empty().to_string(), "........");
        assert_eq!(ControllerState::all().to_string(), "RLDUTSBA");
        assert_eq!(
            (ControllerState::A | ControllerState::RIGHT | ControllerState::START).to_string(),
            "R....T.A"
        );
    }

    #[test]
    fn buttons_cover_all_bits() {
        let all = ControllerState::BUTTONS
            .iter()
            .fold(ControllerState::empty(), |acc, &b| acc | b);
        assert_eq!(all, ControllerState::all());
    }
}
