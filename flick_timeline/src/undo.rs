use flick_nes::ControllerState;

use crate::InputTimeline;

/// Receives every input write made by an [InputLog].
///
/// This is how edits reach whatever is simulating the timeline, e.g. a background worker's
/// edit queue.
pub trait InputSink {
    /// The input on `frame` was set to `state`.
    fn input_changed(&mut self, frame: u32, state: ControllerState);

    /// The whole timeline was replaced.
    ///
    /// The default implementation reports every frame of `inputs` individually. Frames past
    /// the end of `inputs` are not reported.
    fn inputs_replaced(&mut self, inputs: &InputTimeline) {
        for (frame, &state) in inputs.into_iter().enumerate() {
            self.input_changed(frame as u32, state);
        }
    }
}

impl InputSink for Vec<(u32, ControllerState)> {
    fn input_changed(&mut self, frame: u32, state: ControllerState) {
        self.push((frame, state));
    }
}

impl<T: InputSink + ?Sized> InputSink for &mut T {
    fn input_changed(&mut self, frame: u32, state: ControllerState) {
        (**self).input_changed(frame, state)
    }

    fn inputs_replaced(&mut self, inputs: &InputTimeline) {
        (**self).inputs_replaced(inputs)
    }
}

/// A single recorded input edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Change {
    /// The edited frame.
    pub frame: u32,
    /// The input before the edit.
    pub old: ControllerState,
    /// The input after the edit.
    pub new: ControllerState,
    /// Set on every record of a group except its oldest, so that the group is undone and
    /// redone as one step.
    pub consolidated: bool,
}

/// The controller input timeline together with its linear undo history.
///
/// Changes before the cursor are applied and changes at or after it have been undone.
/// Making a new edit discards the undone changes.
#[derive(Debug)]
pub struct InputLog<S: InputSink> {
    inputs: InputTimeline,
    sink: S,
    changes: Vec<Change>,
    change_index: usize,
}

impl<S: InputSink> InputLog<S> {
    /// Create a log over `inputs` with an empty history.
    ///
    /// The sink is assumed to already know about `inputs`.
    pub fn new(inputs: InputTimeline, sink: S) -> Self {
        Self {
            inputs,
            sink,
            changes: Vec::new(),
            change_index: 0,
        }
    }

    /// Destruct into the input timeline and the sink.
    pub fn into_parts(self) -> (InputTimeline, S) {
        (self.inputs, self.sink)
    }

    /// The current inputs.
    pub fn inputs(&self) -> &InputTimeline {
        &self.inputs
    }

    /// The sink receiving input writes.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The sink receiving input writes.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The recorded history, both applied and undone.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// The number of applied changes.
    pub fn change_index(&self) -> usize {
        self.change_index
    }

    /// Return true if there is a change to undo.
    pub fn can_undo(&self) -> bool {
        self.change_index > 0
    }

    /// Return true if there is a change to redo.
    pub fn can_redo(&self) -> bool {
        self.change_index < self.changes.len()
    }

    /// Set the input on `frame`, recording the edit.
    pub fn change_input_to(&mut self, frame: u32, state: ControllerState) {
        self.changes.truncate(self.change_index);
        self.changes.push(Change {
            frame,
            old: self.inputs.get(frame),
            new: state,
            consolidated: false,
        });
        self.apply(frame, state);
        self.change_index += 1;
    }

    /// Revert the most recent applied change, or group of changes.
    ///
    /// Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.change_index == 0 {
            return false;
        }
        loop {
            self.change_index -= 1;
            let change = self.changes[self.change_index];
            self.apply(change.frame, change.old);
            if !change.consolidated || self.change_index == 0 {
                break;
            }
        }
        true
    }

    /// Reapply the most recently undone change, or group of changes.
    ///
    /// Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        if self.change_index >= self.changes.len() {
            return false;
        }
        loop {
            let change = self.changes[self.change_index];
            self.apply(change.frame, change.new);
            self.change_index += 1;
            match self.changes.get(self.change_index) {
                Some(next) if next.consolidated => {}
                _ => break,
            }
        }
        true
    }

    /// Merge the last `count` applied changes into a single undo step.
    ///
    /// Changes that didn't alter the input are dropped from the history first. The
    /// remaining changes keep their order, and undone changes are left alone.
    pub fn consolidate_last(&mut self, count: usize) {
        let mut count = count.min(self.change_index);

        let start = self.change_index - count;
        for index in (start..self.change_index).rev() {
            let change = self.changes[index];
            if change.old == change.new {
                self.changes.remove(index);
                self.change_index -= 1;
                count -= 1;
            }
        }

        if count > 1 {
            let start = self.change_index - count;
            for change in &mut self.changes[start + 1..self.change_index] {
                change.consolidated = true;
            }
        }
    }

    /// Replace the whole timeline, clearing the history.
    pub fn load_inputs(&mut self, inputs: InputTimeline) {
        self.inputs = inputs;
        self.changes.clear();
        self.change_index = 0;
        self.sink.inputs_replaced(&self.inputs);
    }

    fn apply(&mut self, frame: u32, state: ControllerState) {
        self.inputs.set(frame, state);
        self.sink.input_changed(frame, state);
    }
}
