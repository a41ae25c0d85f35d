use flick_nes::{ControllerState, EmulatorError, NesEmulator, StateBlob};

use crate::{CheckpointStore, InputTimeline, InvalidatedFrames, SequenceConfig};

/// An emulator together with its input timeline and a sparse set of checkpoints, which can
/// be moved to any frame without replaying from power-on.
///
/// The sequence never does more than one frame of emulation per call. A caller sets the
/// desired frame with [set_target](Self::set_target) and then calls
/// [do_work](Self::do_work) while [has_work](Self::has_work) is true, which leaves room to
/// apply edits or stop between frames.
#[derive(Debug)]
pub struct StateSequence<E: NesEmulator> {
    emulator: E,
    config: SequenceConfig,
    checkpoints: CheckpointStore,
    inputs: InputTimeline,
    /// The frame the emulator is currently on.
    current: u32,
    target: u32,
    /// Debug stat counting number of frame advances.
    num_advances: usize,
    /// Debug stat counting number of checkpoint loads.
    num_loads: usize,
}

impl<E: NesEmulator> StateSequence<E> {
    /// Construct a new StateSequence.
    ///
    /// `emulator` should be at power-on with its program image already loaded. Its current
    /// state becomes the frame 0 checkpoint.
    pub fn new(
        emulator: E,
        config: SequenceConfig,
        inputs: impl Into<InputTimeline>,
    ) -> Result<Self, EmulatorError> {
        let initial = emulator
            .save_state()
            .map_err(|error| error.context("failed to save power-on state"))?;
        Ok(Self {
            emulator,
            config,
            checkpoints: CheckpointStore::new(initial),
            inputs: inputs.into(),
            current: 0,
            target: 0,
            num_advances: 0,
            num_loads: 0,
        })
    }

    /// Destruct into the emulator and the input timeline.
    ///
    /// The emulator is left on the current frame.
    pub fn into_parts(self) -> (E, InputTimeline) {
        (self.emulator, self.inputs)
    }

    /// Set the frame that [do_work](Self::do_work) should move towards.
    ///
    /// Moving forward reuses the emulator as-is. Moving backward reloads the closest usable
    /// checkpoint and discards all checkpoints after it.
    pub fn set_target(&mut self, target: u32) -> Result<(), EmulatorError> {
        self.target = target;
        if target < self.current {
            if target == 0 {
                self.checkpoints.reset_to_initial();
            } else {
                self.checkpoints.rewind_to(target);
            }
            tracing::debug!(
                "seek {} -> {} via checkpoint {}",
                self.current,
                target,
                self.checkpoints.last().frame
            );
            self.restore_last_checkpoint()?;
        }
        Ok(())
    }

    /// The frame requested by the last [set_target](Self::set_target) call.
    pub fn target(&self) -> u32 {
        self.target
    }

    /// The frame the emulator is currently on.
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Return true if the emulator is not yet on the target frame.
    pub fn has_work(&self) -> bool {
        self.current != self.target
    }

    /// Advance the emulator by at most one frame towards the target.
    ///
    /// A checkpoint is saved whenever the new frame is a multiple of the save interval.
    pub fn do_work(&mut self) -> Result<(), EmulatorError> {
        if self.current < self.target {
            let input = self.inputs.get(self.current);
            let frame = self.current;
            self.emulator
                .advance_frame(input)
                .map_err(|error| error.context(format!("failed to advance frame {}", frame)))?;
            self.current += 1;
            self.num_advances = self.num_advances.saturating_add(1);

            if self.current % self.save_interval() == 0 {
                self.save_checkpoint()?;
            }
        }
        Ok(())
    }

    /// The whole input timeline.
    pub fn inputs(&self) -> &InputTimeline {
        &self.inputs
    }

    /// The input consumed when advancing from `frame` to `frame + 1`.
    pub fn input(&self, frame: u32) -> ControllerState {
        self.inputs.get(frame)
    }

    /// Change the input on a single frame.
    ///
    /// If the value actually changes, every checkpoint after `frame` is discarded, and if
    /// the emulator has already executed `frame` it is reloaded from the newest remaining
    /// checkpoint.
    pub fn set_input(
        &mut self,
        frame: u32,
        state: ControllerState,
    ) -> Result<InvalidatedFrames, EmulatorError> {
        if !self.inputs.set(frame, state) {
            return Ok(InvalidatedFrames::None);
        }

        let removed = self.checkpoints.truncate_after(frame);
        if frame <= self.current {
            self.restore_last_checkpoint()?;
        }
        tracing::debug!(
            "input edit on frame {} dropped {} checkpoints, current = {}",
            frame,
            removed,
            self.current
        );

        Ok(InvalidatedFrames::by_input_at(frame))
    }

    /// Replace the entire input timeline and return to power-on.
    pub fn set_inputs(&mut self, inputs: impl Into<InputTimeline>) -> Result<(), EmulatorError> {
        self.inputs = inputs.into();
        self.checkpoints.reset_to_initial();
        self.restore_last_checkpoint()
    }

    /// Serialize the emulator's state on the current frame.
    ///
    /// This does not require the current frame to equal the target.
    pub fn current_state(&self) -> Result<StateBlob, EmulatorError> {
        self.emulator.save_state()
    }

    /// The frames that currently have a checkpoint.
    pub fn checkpoint_frames(&self) -> Vec<u32> {
        self.checkpoints.frames()
    }

    /// The checkpoint store.
    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// The configuration.
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// The owned emulator.
    pub fn emulator(&self) -> &E {
        &self.emulator
    }

    /// The number of frames executed so far.
    pub fn num_advances(&self) -> usize {
        self.num_advances
    }

    /// The number of checkpoints loaded so far.
    pub fn num_loads(&self) -> usize {
        self.num_loads
    }

    fn save_interval(&self) -> u32 {
        self.config.save_interval.max(1)
    }

    fn save_checkpoint(&mut self) -> Result<(), EmulatorError> {
        let blob = self.emulator.save_state().map_err(|error| {
            error.context(format!("failed to save checkpoint at frame {}", self.current))
        })?;
        self.checkpoints.push(self.current, blob);

        if let Some(max) = self.config.max_checkpoints {
            let removed = self.checkpoints.thin(max);
            if removed > 0 {
                tracing::debug!("thinned {} checkpoints", removed);
            }
        }
        Ok(())
    }

    fn restore_last_checkpoint(&mut self) -> Result<(), EmulatorError> {
        let checkpoint = self.checkpoints.last();
        self.emulator.load_state(&checkpoint.blob).map_err(|error| {
            error.context(format!(
                "failed to load checkpoint at frame {}",
                checkpoint.frame
            ))
        })?;
        self.current = checkpoint.frame;
        self.num_loads = self.num_loads.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use flick_nes::mock::HashConsole;
    use rand::prelude::*;

    use super::*;

    const ROM: &[u8] = b"flick test rom";

    fn console() -> HashConsole {
        HashConsole::with_program(ROM)
    }

    fn sequence(inputs: InputTimeline) -> StateSequence<HashConsole> {
        StateSequence::new(console(), SequenceConfig::default(), inputs).unwrap()
    }

    /// Run a fresh console from power-on for `frames` frames.
    fn replay(inputs: &InputTimeline, frames: u32) -> StateBlob {
        let mut console = console();
        for frame in 0..frames {
            console.advance_frame(inputs.get(frame)).unwrap();
        }
        console.save_state().unwrap()
    }

    fn run_to(sequence: &mut StateSequence<HashConsole>, target: u32) {
        sequence.set_target(target).unwrap();
        while sequence.has_work() {
            sequence.do_work().unwrap();
        }
        assert_eq!(sequence.current(), target);
    }

    fn random_inputs(rng: &mut StdRng, len: usize) -> InputTimeline {
        (0..len)
            .map(|_| ControllerState::from_byte(rng.gen()))
            .collect()
    }

    #[test]
    fn do_work_advances_one_frame() {
        let mut seq = sequence(InputTimeline::new());
        seq.set_target(3).unwrap();
        assert!(seq.has_work());
        seq.do_work().unwrap();
        assert_eq!(seq.current(), 1);
        seq.do_work().unwrap();
        seq.do_work().unwrap();
        assert!(!seq.has_work());
        seq.do_work().unwrap();
        assert_eq!(seq.current(), 3);
        assert_eq!(seq.num_advances(), 3);
    }

    #[test]
    fn checkpoints_every_save_interval() {
        let mut seq = sequence(InputTimeline::new());
        run_to(&mut seq, 50);
        assert_eq!(seq.checkpoint_frames(), vec![0, 16, 32, 48]);
    }

    #[test]
    fn state_matches_replay_from_power_on() {
        let mut rng = StdRng::seed_from_u64(1);
        let inputs = random_inputs(&mut rng, 200);
        let mut seq = sequence(inputs.clone());
        for target in [0, 1, 15, 16, 17, 100, 64, 3, 199, 32, 0, 150] {
            run_to(&mut seq, target);
            assert_eq!(
                seq.current_state().unwrap(),
                replay(&inputs, target),
                "mismatch on frame {}",
                target
            );
        }
    }

    #[test]
    fn backward_seek_reuses_closest_checkpoint() {
        let mut seq = sequence(InputTimeline::new());
        run_to(&mut seq, 100);
        let advances = seq.num_advances();

        run_to(&mut seq, 70);
        assert_eq!(seq.num_advances() - advances, 70 - 64);
        assert_eq!(seq.checkpoint_frames(), vec![0, 16, 32, 48, 64]);
    }

    #[test]
    fn backward_seek_onto_checkpoint_replays_from_previous() {
        let mut seq = sequence(InputTimeline::new());
        run_to(&mut seq, 100);

        seq.set_target(64).unwrap();
        assert_eq!(seq.current(), 48);
        assert_eq!(seq.checkpoint_frames(), vec![0, 16, 32, 48]);
        run_to(&mut seq, 64);
        assert_eq!(seq.checkpoint_frames(), vec![0, 16, 32, 48, 64]);
    }

    #[test]
    fn seek_to_zero_resets() {
        let mut seq = sequence(InputTimeline::new());
        run_to(&mut seq, 40);
        seq.set_target(0).unwrap();
        assert_eq!(seq.current(), 0);
        assert!(!seq.has_work());
        assert_eq!(seq.checkpoint_frames(), vec![0]);
        assert_eq!(seq.current_state().unwrap(), replay(&InputTimeline::new(), 0));
    }

    #[test]
    fn forward_seek_does_not_reload() {
        let mut seq = sequence(InputTimeline::new());
        run_to(&mut seq, 20);
        let loads = seq.num_loads();
        seq.set_target(30).unwrap();
        assert_eq!(seq.current(), 20);
        assert_eq!(seq.num_loads(), loads);
    }

    #[test]
    fn edit_in_past_invalidates_later_checkpoints() {
        let mut seq = sequence(InputTimeline::new());
        run_to(&mut seq, 60);

        let invalidated = seq.set_input(33, ControllerState::B).unwrap();
        assert_eq!(invalidated, InvalidatedFrames::StartingAt(34));
        assert_eq!(seq.checkpoint_frames(), vec![0, 16, 32]);
        assert_eq!(seq.current(), 32);
        assert_eq!(seq.target(), 60);

        run_to(&mut seq, 60);
        assert_eq!(seq.current_state().unwrap(), replay(seq.inputs(), 60));
    }

    #[test]
    fn edit_on_checkpoint_frame_keeps_that_checkpoint() {
        let mut seq = sequence(InputTimeline::new());
        run_to(&mut seq, 40);

        let invalidated = seq.set_input(32, ControllerState::A).unwrap();
        assert_eq!(invalidated, InvalidatedFrames::StartingAt(33));
        assert_eq!(seq.checkpoint_frames(), vec![0, 16, 32]);
        assert_eq!(seq.current(), 32);
    }

    #[test]
    fn edit_in_future_does_not_reload() {
        let mut seq = sequence(InputTimeline::new());
        run_to(&mut seq, 20);
        let loads = seq.num_loads();

        let invalidated = seq.set_input(25, ControllerState::UP).unwrap();
        assert_eq!(invalidated, InvalidatedFrames::StartingAt(26));
        assert_eq!(seq.current(), 20);
        assert_eq!(seq.num_loads(), loads);
        assert_eq!(seq.inputs().len(), 26);

        run_to(&mut seq, 30);
        assert_eq!(seq.current_state().unwrap(), replay(seq.inputs(), 30));
    }

    #[test]
    fn unchanged_edit_is_ignored() {
        let mut seq = sequence(InputTimeline::new());
        run_to(&mut seq, 40);
        let invalidated = seq.set_input(10, ControllerState::empty()).unwrap();
        assert_eq!(invalidated, InvalidatedFrames::None);
        assert_eq!(seq.current(), 40);
        assert_eq!(seq.checkpoint_frames(), vec![0, 16, 32]);
    }

    #[test]
    fn set_inputs_returns_to_power_on() {
        let mut seq = sequence(InputTimeline::new());
        run_to(&mut seq, 40);

        let mut inputs = InputTimeline::idle(50);
        inputs.set(7, ControllerState::START);
        seq.set_inputs(inputs.clone()).unwrap();
        assert_eq!(seq.current(), 0);
        assert_eq!(seq.checkpoint_frames(), vec![0]);

        run_to(&mut seq, 40);
        assert_eq!(seq.current_state().unwrap(), replay(&inputs, 40));
    }

    #[test]
    fn scenario_edit_between_checkpoints() {
        let mut inputs = InputTimeline::new();
        inputs.set(5, ControllerState::A);
        let mut seq = sequence(inputs);

        run_to(&mut seq, 40);
        assert_eq!(seq.checkpoint_frames(), vec![0, 16, 32]);

        let invalidated = seq.set_input(20, ControllerState::START).unwrap();
        assert_eq!(invalidated, InvalidatedFrames::StartingAt(21));
        assert_eq!(seq.checkpoint_frames(), vec![0, 16]);
        assert_eq!(seq.current(), 16);

        run_to(&mut seq, 40);
        let mut expected = InputTimeline::new();
        expected.set(5, ControllerState::A);
        expected.set(20, ControllerState::START);
        assert_eq!(seq.current_state().unwrap(), replay(&expected, 40));
    }

    #[test]
    fn random_edits_and_seeks_match_replay() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seq = sequence(random_inputs(&mut rng, 120));

        for _ in 0..200 {
            if rng.gen_bool(0.5) {
                let frame = rng.gen_range(0..150);
                let _invalidated = seq
                    .set_input(frame, ControllerState::from_byte(rng.gen()))
                    .unwrap();
            } else {
                let target = rng.gen_range(0..150);
                run_to(&mut seq, target);
                assert_eq!(seq.current_state().unwrap(), replay(seq.inputs(), target));
            }

            let frames = seq.checkpoint_frames();
            assert_eq!(frames[0], 0);
            assert!(frames.windows(2).all(|w| w[0] < w[1]));
            assert!(*frames.last().unwrap() <= seq.current());
        }
    }

    #[test]
    fn thinning_bounds_checkpoints() {
        let config = SequenceConfig {
            save_interval: 4,
            max_checkpoints: Some(8),
        };
        let mut seq = StateSequence::new(console(), config, InputTimeline::new()).unwrap();
        run_to(&mut seq, 200);
        assert!(seq.checkpoints().len() <= 8);
        assert_eq!(seq.checkpoint_frames()[0], 0);
        assert_eq!(*seq.checkpoint_frames().last().unwrap(), 200);

        run_to(&mut seq, 90);
        assert_eq!(seq.current_state().unwrap(), replay(seq.inputs(), 90));
    }

    #[test]
    fn advance_failure_propagates() {
        let emulator = console().fail_at_frame(5);
        let mut seq =
            StateSequence::new(emulator, SequenceConfig::default(), InputTimeline::new()).unwrap();
        seq.set_target(10).unwrap();
        let mut result = Ok(());
        while seq.has_work() && result.is_ok() {
            result = seq.do_work();
        }
        assert!(matches!(result, Err(EmulatorError::Context { .. })));
        assert_eq!(seq.current(), 5);
    }
}
