use std::iter;

use flick_nes::StateBlob;

/// A saved emulator state and the frame it was taken on.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    /// The number of frames executed since power-on when the state was saved.
    pub frame: u32,
    /// The serialized emulator state.
    pub blob: StateBlob,
}

/// Sparse index of saved states, ordered by strictly increasing frame.
///
/// The power-on checkpoint is kept separately so that there is always a checkpoint to fall
/// back to. It is only ever replaced by [reset_to_initial](Self::reset_to_initial) removing
/// everything after it.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    initial: Checkpoint,
    later: Vec<Checkpoint>,
}

impl CheckpointStore {
    /// Create a store holding only the power-on state.
    pub fn new(initial: StateBlob) -> Self {
        Self {
            initial: Checkpoint {
                frame: 0,
                blob: initial,
            },
            later: Vec::new(),
        }
    }

    /// The power-on checkpoint.
    pub fn initial(&self) -> &Checkpoint {
        &self.initial
    }

    /// The checkpoint with the highest frame.
    pub fn last(&self) -> &Checkpoint {
        self.later.last().unwrap_or(&self.initial)
    }

    /// Iterate over all checkpoints in frame order.
    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        iter::once(&self.initial).chain(self.later.iter())
    }

    /// The frames that currently have a checkpoint.
    pub fn frames(&self) -> Vec<u32> {
        self.iter().map(|checkpoint| checkpoint.frame).collect()
    }

    /// The number of checkpoints, including the power-on checkpoint.
    pub fn len(&self) -> usize {
        self.later.len() + 1
    }

    /// Always false, since the power-on checkpoint cannot be removed.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The combined size of all stored blobs.
    pub fn total_bytes(&self) -> usize {
        self.iter().map(|checkpoint| checkpoint.blob.len()).sum()
    }

    /// Append a checkpoint.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is not greater than the last checkpoint's frame.
    pub fn push(&mut self, frame: u32, blob: StateBlob) {
        assert!(
            frame > self.last().frame,
            "checkpoint at frame {} pushed after frame {}",
            frame,
            self.last().frame
        );
        self.later.push(Checkpoint { frame, blob });
    }

    /// Remove every checkpoint with a frame greater than `frame`.
    ///
    /// Returns the number of checkpoints removed.
    pub fn truncate_after(&mut self, frame: u32) -> usize {
        let keep = self.later.partition_point(|checkpoint| checkpoint.frame <= frame);
        let removed = self.later.len() - keep;
        self.later.truncate(keep);
        removed
    }

    /// Discard checkpoints so that the last one is the best place to resume from in order
    /// to reach `target`, and return it.
    ///
    /// The chosen checkpoint is the last one at or before `target`, except that a checkpoint
    /// exactly at `target` is skipped in favour of the one before it (unless it is the
    /// power-on checkpoint).
    pub fn rewind_to(&mut self, target: u32) -> &Checkpoint {
        // Index into iter() of the last checkpoint with frame <= target
        let mut chosen = self.later.partition_point(|checkpoint| checkpoint.frame <= target);
        if chosen > 0 && self.later[chosen - 1].frame == target {
            chosen -= 1;
        }
        self.later.truncate(chosen);
        self.last()
    }

    /// Discard everything except the power-on checkpoint.
    pub fn reset_to_initial(&mut self) -> &Checkpoint {
        self.later.clear();
        &self.initial
    }

    /// If the store holds more than `max` checkpoints, drop every other checkpoint between
    /// the power-on checkpoint and the newest one.
    ///
    /// Returns the number of checkpoints removed.
    pub fn thin(&mut self, max: usize) -> usize {
        if self.len() <= max || self.later.len() < 2 {
            return 0;
        }
        let newest = self.later.len() - 1;
        let before = self.later.len();
        let mut index = 0;
        self.later.retain(|_| {
            let keep = index % 2 == 1 || index == newest;
            index += 1;
            keep
        });
        before - self.later.len()
    }
}
