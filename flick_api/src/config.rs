use std::{fs, sync::Arc, time::Duration};

use flick_timeline::SequenceConfig;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Tuning for a [SequenceWorker](crate::SequenceWorker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Sleep after each frame of work.
    pub on_work_delay_millis: u64,
    /// Sleep when already on the target frame.
    pub no_work_delay_millis: u64,
    /// Sleep between attempts to lock the latest state in
    /// [has_new_state](crate::SequenceWorker::has_new_state).
    pub try_lock_delay_micros: u64,
    /// Number of attempts to lock the latest state before giving up for this UI frame.
    pub try_lock_tries: u32,
    /// Configuration for the worker's state sequence.
    pub sequence: SequenceConfig,
}

impl WorkerConfig {
    /// Parse a config from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config as pretty-printed JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("failed to serialize config")
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<(), Error> {
        if self.try_lock_tries == 0 {
            return Err(Error::InvalidConfig(
                "try_lock_tries must be at least 1".to_string(),
            ));
        }
        self.sequence.validate().map_err(Error::InvalidConfig)
    }

    pub(crate) fn on_work_delay(&self) -> Duration {
        Duration::from_millis(self.on_work_delay_millis)
    }

    pub(crate) fn no_work_delay(&self) -> Duration {
        Duration::from_millis(self.no_work_delay_millis)
    }

    pub(crate) fn try_lock_delay(&self) -> Duration {
        Duration::from_micros(self.try_lock_delay_micros)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            on_work_delay_millis: 0,
            no_work_delay_millis: 2,
            try_lock_delay_micros: 5,
            try_lock_tries: 3,
            sequence: SequenceConfig::default(),
        }
    }
}

/// Load a worker config from a JSON file.
///
/// # Panics
///
/// Panics if the file can't be read or is not a valid config.
#[track_caller]
pub fn load_config(filename: &str) -> WorkerConfig {
    match try_load_config(filename) {
        Ok(config) => config,
        Err(error) => panic!("Error:\n  {}\n", error),
    }
}

/// Load a worker config from a JSON file.
///
/// Returns an error if the file can't be read or is not a valid config.
pub fn try_load_config(filename: &str) -> Result<WorkerConfig, Error> {
    let json = fs::read_to_string(filename).map_err(|error| Error::ConfigReadError {
        filename: filename.to_string(),
        error: Arc::new(error),
    })?;
    WorkerConfig::from_json(&json)
}
