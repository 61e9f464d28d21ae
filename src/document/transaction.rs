use crate::{
    cmd::{Cmd, CmdSequence},
    document::doc::Document,
    foundation::error::LayerfoldResult,
    model::sprite::Sprite,
};

/// All-or-nothing group of commands recorded as one undo step.
///
/// Commands run as they are added. [`Transaction::commit`] hands them to the undo
/// history; dropping an uncommitted transaction reverts them in reverse order.
pub struct Transaction<'a> {
    doc: &'a mut Document,
    label: String,
    cmds: CmdSequence,
    committed: bool,
}

impl<'a> Transaction<'a> {
    pub fn new(doc: &'a mut Document, label: impl Into<String>) -> Self {
        Self {
            doc,
            label: label.into(),
            cmds: CmdSequence::new(),
            committed: false,
        }
    }

    pub fn execute(&mut self, cmd: impl Cmd + 'static) -> LayerfoldResult<()> {
        self.cmds.execute_and_add(Box::new(cmd), &mut self.doc.sprite)
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn sprite(&self) -> &Sprite {
        &self.doc.sprite
    }

    /// Unrecorded access. Only for state that is restored before commit or that is owned
    /// by a recorded command.
    pub(crate) fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.doc.sprite
    }

    pub fn document(&self) -> &Document {
        self.doc
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        self.doc
    }

    /// Records the executed commands as one history entry. An empty transaction leaves
    /// the history untouched.
    pub fn commit(mut self) {
        self.committed = true;
        let cmds = std::mem::take(&mut self.cmds);
        if cmds.is_empty() {
            tracing::debug!(label = %self.label, "empty transaction");
            return;
        }
        tracing::debug!(label = %self.label, cmds = cmds.len(), "commit");
        let label = std::mem::take(&mut self.label);
        self.doc.history.push(label, cmds);
    }

    pub fn rollback(mut self) -> LayerfoldResult<()> {
        self.committed = true;
        let mut cmds = std::mem::take(&mut self.cmds);
        cmds.undo(&mut self.doc.sprite)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.committed || self.cmds.is_empty() {
            return;
        }
        tracing::warn!(label = %self.label, cmds = self.cmds.len(), "rolling back transaction");
        if let Err(err) = self.cmds.undo(&mut self.doc.sprite) {
            tracing::error!(label = %self.label, error = %err, "rollback failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/transaction.rs"]
mod tests;
