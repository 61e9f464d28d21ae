//! Reversible micro-operations on a [`Sprite`].
//!
//! Every mutation made while editing goes through a [`Cmd`]. Commands resolve their
//! targets by id when they run, so a command recorded before a layer was removed and
//! re-inserted still finds it.

pub(crate) mod cel;
pub(crate) mod image;
pub(crate) mod layer;

use crate::{foundation::error::LayerfoldResult, model::sprite::Sprite};

pub trait Cmd: std::fmt::Debug {
    fn label(&self) -> &'static str;

    fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()>;

    fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()>;

    fn redo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        self.execute(sprite)
    }

    /// Approximate bytes retained by the command for undo, including owned pixels.
    fn mem_size(&self) -> usize;
}

/// Commands applied in order and reverted in reverse order.
#[derive(Debug, Default)]
pub struct CmdSequence {
    cmds: Vec<Box<dyn Cmd>>,
}

impl CmdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `cmd` and records it. A command that fails is not recorded.
    pub fn execute_and_add(
        &mut self,
        mut cmd: Box<dyn Cmd>,
        sprite: &mut Sprite,
    ) -> LayerfoldResult<()> {
        cmd.execute(sprite)?;
        tracing::trace!(cmd = cmd.label(), "executed");
        self.cmds.push(cmd);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cmds.iter().map(|c| c.label())
    }
}

impl Cmd for CmdSequence {
    fn label(&self) -> &'static str {
        "sequence"
    }

    fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        self.redo(sprite)
    }

    /// On failure the commands already reverted are re-applied, so the sprite is left
    /// as it was before the call.
    fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        for i in (0..self.cmds.len()).rev() {
            if let Err(err) = self.cmds[i].undo(sprite) {
                for cmd in &mut self.cmds[i + 1..] {
                    if let Err(again) = cmd.redo(sprite) {
                        tracing::error!(cmd = cmd.label(), error = %again, "re-apply after failed undo");
                        break;
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// On failure the commands already applied are reverted again.
    fn redo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        for i in 0..self.cmds.len() {
            if let Err(err) = self.cmds[i].redo(sprite) {
                for cmd in self.cmds[..i].iter_mut().rev() {
                    if let Err(again) = cmd.undo(sprite) {
                        tracing::error!(cmd = cmd.label(), error = %again, "revert after failed redo");
                        break;
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.cmds.iter().map(|c| c.mem_size()).sum::<usize>()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cmd/sequence.rs"]
mod tests;
