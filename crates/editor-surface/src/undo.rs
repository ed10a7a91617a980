//! Grouped undo/redo history for [`crate::TextBuffer`].

use crate::buffer::SelectionRange;

#[derive(Debug, Clone)]
pub(crate) struct TextEdit {
    pub(crate) pos: usize,
    pub(crate) deleted: String,
    pub(crate) inserted: String,
}

#[derive(Debug, Clone)]
pub(crate) struct UndoStep {
    group_id: usize,
    pub(crate) edit: TextEdit,
    pub(crate) before_selection: Vec<SelectionRange>,
    pub(crate) after_selection: Vec<SelectionRange>,
}

impl UndoStep {
    pub(crate) fn new(
        edit: TextEdit,
        before_selection: Vec<SelectionRange>,
        after_selection: Vec<SelectionRange>,
    ) -> Self {
        Self {
            group_id: 0,
            edit,
            before_selection,
            after_selection,
        }
    }
}

/// Linear undo history.
///
/// Steps recorded while a group is open share its id and are undone together. Groups nest: only
/// the outermost `end_group` closes the group.
#[derive(Debug)]
pub(crate) struct UndoRedoManager {
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    max_undo: usize,
    next_group_id: usize,
    open_group_id: Option<usize>,
    depth: usize,
}

impl UndoRedoManager {
    pub(crate) fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo,
            next_group_id: 0,
            open_group_id: None,
            depth: 0,
        }
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub(crate) fn begin_group(&mut self) {
        self.depth += 1;
        if self.depth == 1 {
            self.open_group_id = Some(self.allocate_group_id());
        }
    }

    pub(crate) fn end_group(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.open_group_id = None;
        }
    }

    fn allocate_group_id(&mut self) -> usize {
        let id = self.next_group_id;
        self.next_group_id = self.next_group_id.wrapping_add(1);
        id
    }

    pub(crate) fn push_step(&mut self, mut step: UndoStep) {
        self.redo_stack.clear();

        step.group_id = match self.open_group_id {
            Some(id) => id,
            None => self.allocate_group_id(),
        };

        // Evict whole groups; the open group stays.
        while self.undo_stack.len() >= self.max_undo {
            let Some(oldest) = self.undo_stack.first().map(|s| s.group_id) else {
                break;
            };
            if oldest == step.group_id {
                break;
            }
            let count = self
                .undo_stack
                .iter()
                .take_while(|s| s.group_id == oldest)
                .count();
            self.undo_stack.drain(..count);
        }
        self.undo_stack.push(step);
    }

    /// Steps of the newest group, newest first.
    pub(crate) fn pop_undo_group(&mut self) -> Option<Vec<UndoStep>> {
        let last_group_id = self.undo_stack.last().map(|s| s.group_id)?;
        let mut steps: Vec<UndoStep> = Vec::new();

        while self
            .undo_stack
            .last()
            .is_some_and(|step| step.group_id == last_group_id)
        {
            steps.extend(self.undo_stack.pop());
        }

        Some(steps)
    }

    /// Steps of the newest undone group, oldest first.
    pub(crate) fn pop_redo_group(&mut self) -> Option<Vec<UndoStep>> {
        let last_group_id = self.redo_stack.last().map(|s| s.group_id)?;
        let mut steps: Vec<UndoStep> = Vec::new();

        while self
            .redo_stack
            .last()
            .is_some_and(|step| step.group_id == last_group_id)
        {
            steps.extend(self.redo_stack.pop());
        }

        Some(steps)
    }

    /// Record steps that were just undone (newest first, as returned by `pop_undo_group`).
    pub(crate) fn push_undone(&mut self, steps: Vec<UndoStep>) {
        self.redo_stack.extend(steps);
    }

    /// Record steps that were just redone (oldest first, as returned by `pop_redo_group`).
    pub(crate) fn push_redone(&mut self, steps: Vec<UndoStep>) {
        self.undo_stack.extend(steps);
    }
}
