use std::{
    fmt, mem,
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
        Arc, Mutex, TryLockError,
    },
    thread::{self, JoinHandle},
};

use flick_nes::{ControllerState, EmulatorError, NesEmulator, StateBlob};
use flick_timeline::{InputSink, InputTimeline, InvalidatedFrames, StateSequence};

use crate::{Error, WorkerConfig};

#[derive(Debug)]
enum PendingEdit {
    Input(u32, ControllerState),
    ReplaceAll(InputTimeline),
}

/// State shared between the UI thread and the worker thread.
///
/// The emulator is not in here: only the worker thread ever touches it.
#[derive(Debug, Default)]
struct Shared {
    target: AtomicU32,
    pending: Mutex<Vec<PendingEdit>>,
    /// Guarded separately from `pending` so that polling never waits on edit submission.
    latest: Mutex<Option<(u32, StateBlob)>>,
    latest_frame: AtomicU32,
    /// Incremented on every publish, while `latest` is locked.
    generation: AtomicU64,
    stop: AtomicBool,
    failure: Mutex<Option<Error>>,
}

impl Shared {
    fn publish(&self, frame: u32, state: StateBlob) {
        let mut latest = self.latest.lock().unwrap();
        *latest = Some((frame, state));
        self.latest_frame.store(frame, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// Runs a [StateSequence] on a dedicated thread.
///
/// The UI thread communicates with the worker only through this handle: it queues input
/// edits, sets the target frame, and polls for the most recently computed state. None of
/// these calls wait on emulation.
///
/// Dropping the handle stops the worker after its current frame and joins the thread.
pub struct SequenceWorker<E: NesEmulator + Send + 'static> {
    config: WorkerConfig,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<StateSequence<E>>>,
    /// The generation last returned by has_new_state.
    seen_generation: u64,
}

impl<E: NesEmulator + Send + 'static> SequenceWorker<E> {
    /// Start a worker for `emulator`, which should be at power-on with its program image
    /// loaded.
    ///
    /// The power-on state is published immediately as frame 0.
    pub fn spawn(
        config: WorkerConfig,
        emulator: E,
        inputs: impl Into<InputTimeline>,
    ) -> Result<Self, Error> {
        config.validate()?;
        let sequence = StateSequence::new(emulator, config.sequence.clone(), inputs)?;

        let shared = Arc::new(Shared::default());
        shared.publish(0, sequence.current_state()?);

        let handle = thread::Builder::new()
            .name("flick-sequence".to_string())
            .spawn({
                let config = config.clone();
                let shared = Arc::clone(&shared);
                move || run_sequence(&config, sequence, &shared)
            })
            .map_err(|error| Error::WorkerSpawnError(Arc::new(error)))?;

        Ok(Self {
            config,
            shared,
            handle: Some(handle),
            seen_generation: 0,
        })
    }

    /// Queue an input edit. It is applied at the start of the worker's next iteration.
    ///
    /// Edits are dropped once the worker has stopped on a [failure](Self::failure).
    pub fn input_change(&self, frame: u32, state: ControllerState) {
        self.queue_edit(PendingEdit::Input(frame, state));
    }

    /// Queue a replacement of the whole input timeline, which restarts simulation from
    /// power-on.
    pub fn replace_inputs(&self, inputs: InputTimeline) {
        self.queue_edit(PendingEdit::ReplaceAll(inputs));
    }

    fn queue_edit(&self, edit: PendingEdit) {
        if self.shared.failure.lock().unwrap().is_some() {
            match edit {
                PendingEdit::Input(frame, _) => tracing::warn!(
                    "sequence worker has failed, dropping edit on frame {}",
                    frame
                ),
                PendingEdit::ReplaceAll(_) => {
                    tracing::warn!("sequence worker has failed, dropping input replacement")
                }
            }
            return;
        }
        self.shared.pending.lock().unwrap().push(edit);
    }

    /// Request that the worker move to `frame`.
    pub fn target_change(&self, frame: u32) {
        self.shared.target.store(frame, Ordering::Release);
    }

    /// Move the requested frame by `delta`, clamping at frame 0. Returns the new target.
    pub fn offset_target(&self, delta: i64) -> u32 {
        let target = i64::from(self.target()) + delta;
        let target = target.clamp(0, i64::from(u32::MAX)) as u32;
        self.target_change(target);
        target
    }

    /// The most recently requested frame.
    pub fn target(&self) -> u32 {
        self.shared.target.load(Ordering::Acquire)
    }

    /// Return the latest published state if it hasn't been returned by this method before.
    ///
    /// This makes a bounded number of attempts to lock the published state, sleeping
    /// briefly between them. If the worker holds the lock the whole time, None is returned
    /// and the state will be picked up on a later call instead.
    pub fn has_new_state(&mut self) -> Option<(u32, StateBlob)> {
        if self.shared.generation.load(Ordering::Acquire) == self.seen_generation {
            return None;
        }

        let tries = self.config.try_lock_tries.max(1);
        for attempt in 0..tries {
            match self.shared.latest.try_lock() {
                Ok(latest) => {
                    self.seen_generation = self.shared.generation.load(Ordering::Acquire);
                    return latest.clone();
                }
                Err(TryLockError::WouldBlock) => {
                    if attempt + 1 < tries {
                        thread::sleep(self.config.try_lock_delay());
                    }
                }
                Err(TryLockError::Poisoned(_)) => return None,
            }
        }
        None
    }

    /// The frame of the latest published state.
    pub fn latest_frame(&self) -> u32 {
        self.shared.latest_frame.load(Ordering::Acquire)
    }

    /// The latest published state. This waits for the lock if the worker is publishing.
    pub fn latest_state(&self) -> Option<(u32, StateBlob)> {
        self.shared.latest.lock().unwrap().clone()
    }

    /// The error that stopped the worker, if any.
    ///
    /// Emulator failures are not retried. Once this returns an error the worker thread has
    /// exited and no further states will be published.
    pub fn failure(&self) -> Option<Error> {
        self.shared.failure.lock().unwrap().clone()
    }

    /// Return true while the worker thread is running.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// The worker's configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Stop the worker after its current frame and return its state sequence.
    ///
    /// Returns an error only if the worker thread panicked. A worker that stopped because of
    /// an emulator failure still returns its sequence; see [failure](Self::failure).
    pub fn shutdown(mut self) -> Result<StateSequence<E>, Error> {
        self.shared.stop.store(true, Ordering::Release);
        let handle = self.handle.take().expect("worker already shut down");
        handle.join().map_err(|_| Error::WorkerPanicked)
    }
}

impl<E: NesEmulator + Send + 'static> Drop for SequenceWorker<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shared.stop.store(true, Ordering::Release);
            if handle.join().is_err() {
                tracing::error!("sequence worker panicked");
            }
        }
    }
}

impl<E: NesEmulator + Send + 'static> fmt::Debug for SequenceWorker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceWorker")
            .field("target", &self.target())
            .field("latest_frame", &self.latest_frame())
            .finish_non_exhaustive()
    }
}

impl<E: NesEmulator + Send + 'static> InputSink for SequenceWorker<E> {
    fn input_changed(&mut self, frame: u32, state: ControllerState) {
        self.input_change(frame, state);
    }

    fn inputs_replaced(&mut self, inputs: &InputTimeline) {
        self.replace_inputs(inputs.clone());
    }
}

fn run_sequence<E: NesEmulator>(
    config: &WorkerConfig,
    mut sequence: StateSequence<E>,
    shared: &Shared,
) -> StateSequence<E> {
    tracing::info!("sequence worker started");
    while !shared.stop.load(Ordering::Acquire) {
        if let Err(error) = run_iteration(config, &mut sequence, shared) {
            tracing::error!(
                "sequence worker stopped on frame {}:\n  {}",
                sequence.current(),
                error
            );
            *shared.failure.lock().unwrap() = Some(error.into());
            return sequence;
        }
    }
    tracing::info!("sequence worker stopped on frame {}", sequence.current());
    sequence
}

fn run_iteration<E: NesEmulator>(
    config: &WorkerConfig,
    sequence: &mut StateSequence<E>,
    shared: &Shared,
) -> Result<(), EmulatorError> {
    let target = shared.target.load(Ordering::Acquire);
    if sequence.target() != target {
        sequence.set_target(target)?;
        if !sequence.has_work() {
            shared.publish(sequence.current(), sequence.current_state()?);
        }
    }

    let edits = mem::take(&mut *shared.pending.lock().unwrap());
    if !edits.is_empty() {
        let num_edits = edits.len();
        let mut invalidated = InvalidatedFrames::None;
        for edit in edits {
            invalidated = invalidated.union(match edit {
                PendingEdit::Input(frame, state) => sequence.set_input(frame, state)?,
                PendingEdit::ReplaceAll(inputs) => {
                    sequence.set_inputs(inputs)?;
                    InvalidatedFrames::by_input_at(0)
                }
            });
        }
        tracing::debug!("applied {} edits, invalidated {:?}", num_edits, invalidated);
    }

    if sequence.has_work() {
        sequence.do_work()?;
        shared.publish(sequence.current(), sequence.current_state()?);
        thread::sleep(config.on_work_delay());
    } else {
        thread::sleep(config.no_work_delay());
    }
    Ok(())
}
