use std::slice;

use flick_nes::ControllerState;

/// Controller inputs indexed by frame.
///
/// Every frame has an input: indices past the end read as no buttons held, and writing past
/// the end grows the timeline with idle frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InputTimeline {
    inputs: Vec<ControllerState>,
}

impl InputTimeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a timeline of `len` idle frames.
    pub fn idle(len: usize) -> Self {
        Self {
            inputs: vec![ControllerState::empty(); len],
        }
    }

    /// The input for the given frame.
    pub fn get(&self, frame: u32) -> ControllerState {
        self.inputs
            .get(frame as usize)
            .copied()
            .unwrap_or_else(ControllerState::empty)
    }

    /// Set the input for the given frame, growing the timeline if needed.
    ///
    /// Returns true if the stored value changed.
    pub fn set(&mut self, frame: u32, state: ControllerState) -> bool {
        let index = frame as usize;
        if index >= self.inputs.len() {
            self.inputs.resize(index + 1, ControllerState::empty());
        }
        let changed = self.inputs[index] != state;
        self.inputs[index] = state;
        changed
    }

    /// Grow or shrink the timeline to exactly `len` frames.
    pub fn resize(&mut self, len: usize) {
        self.inputs.resize(len, ControllerState::empty());
    }

    /// Remove idle frames from the end of the timeline.
    pub fn trim_trailing_idle(&mut self) {
        let len = self
            .inputs
            .iter()
            .rposition(|input| !input.is_empty())
            .map_or(0, |index| index + 1);
        self.inputs.truncate(len);
    }

    /// The number of frames stored.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Return true if no frames are stored.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// The stored inputs.
    pub fn as_slice(&self) -> &[ControllerState] {
        &self.inputs
    }

    /// Iterate over the stored inputs.
    pub fn iter(&self) -> impl Iterator<Item = ControllerState> + '_ {
        self.inputs.iter().copied()
    }

    /// Consume the timeline, returning the stored inputs.
    pub fn into_vec(self) -> Vec<ControllerState> {
        self.inputs
    }
}

impl From<Vec<ControllerState>> for InputTimeline {
    fn from(inputs: Vec<ControllerState>) -> Self {
        Self { inputs }
    }
}

impl From<&[ControllerState]> for InputTimeline {
    fn from(inputs: &[ControllerState]) -> Self {
        Self {
            inputs: inputs.to_vec(),
        }
    }
}

impl FromIterator<ControllerState> for InputTimeline {
    fn from_iter<I: IntoIterator<Item = ControllerState>>(iter: I) -> Self {
        Self {
            inputs: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a InputTimeline {
    type Item = &'a ControllerState;
    type IntoIter = slice::Iter<'a, ControllerState>;

    fn into_iter(self) -> Self::IntoIter {
        self.inputs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_past_end_are_idle() {
        let timeline = InputTimeline::idle(3);
        assert_eq!(timeline.get(2), ControllerState::empty());
        assert_eq!(timeline.get(1000), ControllerState::empty());
    }

    #[test]
    fn set_extends_with_idle_frames() {
        let mut timeline = InputTimeline::new();
        assert!(timeline.set(5, ControllerState::A));
        assert_eq!(timeline.len(), 6);
        assert!(timeline.as_slice()[..5].iter().all(|input| input.is_empty()));
        assert!(!timeline.set(5, ControllerState::A));
    }

    #[test]
    fn setting_idle_past_end_still_extends() {
        let mut timeline = InputTimeline::new();
        assert!(!timeline.set(9, ControllerState::empty()));
        assert_eq!(timeline.len(), 10);
    }

    #[test]
    fn trim_trailing_idle() {
        let mut timeline = InputTimeline::idle(10);
        timeline.set(3, ControllerState::B);
        timeline.trim_trailing_idle();
        assert_eq!(timeline.len(), 4);

        let mut timeline = InputTimeline::idle(10);
        timeline.trim_trailing_idle();
        assert!(timeline.is_empty());
    }
}
