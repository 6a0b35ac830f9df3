//! Append-only checkpoint history with a movable current pointer.
//!
//! Records are stored in creation order and are never removed except by
//! [`CheckpointHistory::clear`]. `parent_id` links point at whatever was
//! current when a record was created, so after an undo followed by a new
//! checkpoint the links form a tree that does not follow array order.
//!
//! The undo stack holds ids departed from by undo, most recent last. Any
//! append invalidates it.

use super::errors::{CheckpointError, CheckpointResult};
use super::models::{Checkpoint, CheckpointId};

#[derive(Debug, Default)]
pub struct CheckpointHistory {
    records: Vec<Checkpoint>,
    current: Option<CheckpointId>,
    undo_stack: Vec<CheckpointId>,
}

impl CheckpointHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Checkpoint] {
        &self.records
    }

    pub fn current_id(&self) -> Option<CheckpointId> {
        self.current
    }

    pub fn undo_stack(&self) -> &[CheckpointId] {
        &self.undo_stack
    }

    /// Id the next appended checkpoint will receive
    pub fn next_id(&self) -> CheckpointResult<CheckpointId> {
        id_at(self.records.len())
    }

    pub fn get(&self, id: CheckpointId) -> Option<&Checkpoint> {
        self.records.get(id.index()).filter(|c| c.id == id)
    }

    pub fn latest(&self) -> Option<&Checkpoint> {
        self.records.last()
    }

    pub fn current(&self) -> Option<&Checkpoint> {
        self.current.and_then(|id| self.get(id))
    }

    /// Look up a checkpoint, distinguishing an empty history from a bad id
    pub fn require(&self, id: CheckpointId) -> CheckpointResult<&Checkpoint> {
        if self.records.is_empty() {
            return Err(CheckpointError::NoCheckpoints);
        }
        self.get(id)
            .ok_or(CheckpointError::CheckpointNotFound { id })
    }

    /// Append a checkpoint built from the next id and the current parent.
    ///
    /// The new record becomes current and the undo stack is cleared.
    pub fn append<F>(&mut self, build: F) -> CheckpointResult<&Checkpoint>
    where
        F: FnOnce(CheckpointId, Option<CheckpointId>) -> Checkpoint,
    {
        let id = self.next_id()?;
        let checkpoint = build(id, self.current);
        debug_assert_eq!(checkpoint.id, id);
        self.records.push(checkpoint);
        self.current = Some(id);
        self.undo_stack.clear();
        Ok(&self.records[id.index()])
    }

    /// Move the current pointer after a successful restore
    pub fn set_current(&mut self, id: CheckpointId, reset_undo_stack: bool) {
        debug_assert!(self.get(id).is_some());
        self.current = Some(id);
        if reset_undo_stack {
            self.undo_stack.clear();
        }
    }

    /// Current checkpoint and its parent, the pair an undo moves between
    pub fn undo_target(&self) -> CheckpointResult<(CheckpointId, CheckpointId)> {
        let current = self.current().ok_or(CheckpointError::NoCheckpoints)?;
        match current.parent_id {
            Some(parent) => Ok((current.id, parent)),
            None => Err(CheckpointError::AlreadyAtEarliest),
        }
    }

    /// Record that `departed` was left by an undo
    pub fn push_undone(&mut self, departed: CheckpointId) {
        self.undo_stack.push(departed);
    }

    /// Take the most recently undone id for a redo
    pub fn pop_redo(&mut self) -> CheckpointResult<CheckpointId> {
        self.undo_stack.pop().ok_or(CheckpointError::NothingToRedo)
    }

    pub fn can_redo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Drop every record and reset the pointers
    pub fn clear(&mut self) {
        self.records.clear();
        self.current = None;
        self.undo_stack.clear();
    }
}

/// Id of the record at zero-based `position`. Ids are `u32`, which caps a
/// history at `u32::MAX` records.
fn id_at(position: usize) -> CheckpointResult<CheckpointId> {
    u32::try_from(position)
        .ok()
        .and_then(|position| position.checked_add(1))
        .map(CheckpointId::new)
        .ok_or(CheckpointError::HistoryFull)
}
