/// A set of frames whose states are stale after an input edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum InvalidatedFrames {
    /// States at and after the given frame are stale.
    StartingAt(u32),
    /// No states are stale.
    None,
}

impl InvalidatedFrames {
    /// The frames invalidated by changing the input consumed on `input_frame`.
    pub fn by_input_at(input_frame: u32) -> Self {
        Self::StartingAt(input_frame.saturating_add(1))
    }

    /// Set `self` to None.
    pub fn clear(&mut self) {
        *self = InvalidatedFrames::None;
    }

    /// Include `frame` in the set.
    pub fn include(&mut self, frame: u32) {
        match self {
            Self::StartingAt(prev_frame) => *prev_frame = frame.min(*prev_frame),
            Self::None => *self = Self::StartingAt(frame),
        }
    }

    /// The union of two sets of frames.
    pub fn union(mut self, other: Self) -> Self {
        if let Self::StartingAt(frame) = other {
            self.include(frame);
        }
        self
    }

    /// Return true if `frame` is in the set.
    pub fn contains(self, frame: u32) -> bool {
        match self {
            Self::StartingAt(start) => frame >= start,
            Self::None => false,
        }
    }
}
