use serde::{Deserialize, Serialize};

/// Tuning for a [StateSequence](crate::StateSequence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// A checkpoint is saved whenever the current frame is a multiple of this.
    ///
    /// Smaller values trade memory for shorter replays after a seek or edit.
    pub save_interval: u32,
    /// When set, the checkpoint store is thinned whenever it grows past this many entries.
    ///
    /// `None` leaves the store unbounded. Must be at least 2 if set.
    pub max_checkpoints: Option<usize>,
}

impl SequenceConfig {
    /// Check that the values are usable, returning a description of the first bad field.
    pub fn validate(&self) -> Result<(), String> {
        if self.save_interval == 0 {
            return Err("save_interval must be at least 1".to_string());
        }
        if let Some(max) = self.max_checkpoints {
            if max < 2 {
                return Err(format!("max_checkpoints must be at least 2, got {}", max));
            }
        }
        Ok(())
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            save_interval: 16,
            max_checkpoints: None,
        }
    }
}
