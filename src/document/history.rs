use crate::{
    cmd::{Cmd, CmdSequence},
    foundation::error::{LayerfoldError, LayerfoldResult},
    model::sprite::Sprite,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HistoryOpts {
    /// Oldest entries are dropped once the recorded commands exceed this many bytes.
    pub size_limit_bytes: Option<usize>,
}

#[derive(Debug)]
struct Entry {
    label: String,
    cmds: CmdSequence,
    mem: usize,
}

/// Undo and redo stacks of labelled command sequences.
#[derive(Debug, Default)]
pub struct UndoHistory {
    opts: HistoryOpts,
    undo: Vec<Entry>,
    redo: Vec<Entry>,
    mem: usize,
}

impl UndoHistory {
    pub fn new(opts: HistoryOpts) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_labels(&self) -> impl Iterator<Item = &str> {
        self.undo.iter().rev().map(|e| e.label.as_str())
    }

    pub fn mem_size(&self) -> usize {
        self.mem
    }

    /// Records an already executed sequence as one step. Clears the redo stack.
    pub(crate) fn push(&mut self, label: impl Into<String>, cmds: CmdSequence) {
        for e in self.redo.drain(..) {
            self.mem -= e.mem;
        }
        let mem = cmds.mem_size();
        self.mem += mem;
        self.undo.push(Entry {
            label: label.into(),
            cmds,
            mem,
        });
        self.trim();
    }

    fn trim(&mut self) {
        let Some(limit) = self.opts.size_limit_bytes else {
            return;
        };
        while self.mem > limit && self.undo.len() > 1 {
            let dropped = self.undo.remove(0);
            self.mem -= dropped.mem;
            tracing::debug!(label = %dropped.label, bytes = dropped.mem, "dropped oldest undo entry");
        }
    }

    pub(crate) fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<String> {
        let mut entry = self
            .undo
            .pop()
            .ok_or_else(|| LayerfoldError::history("nothing to undo"))?;
        if let Err(err) = entry.cmds.undo(sprite) {
            tracing::error!(label = %entry.label, error = %err, "undo failed");
            let msg = format!("undo of '{}' failed: {err}", entry.label);
            self.undo.push(entry);
            return Err(LayerfoldError::history(msg));
        }
        let label = entry.label.clone();
        self.redo.push(entry);
        Ok(label)
    }

    pub(crate) fn redo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<String> {
        let mut entry = self
            .redo
            .pop()
            .ok_or_else(|| LayerfoldError::history("nothing to redo"))?;
        if let Err(err) = entry.cmds.redo(sprite) {
            tracing::error!(label = %entry.label, error = %err, "redo failed");
            let msg = format!("redo of '{}' failed: {err}", entry.label);
            self.redo.push(entry);
            return Err(LayerfoldError::history(msg));
        }
        let label = entry.label.clone();
        self.undo.push(entry);
        Ok(label)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/history.rs"]
mod tests;
