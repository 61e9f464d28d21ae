use crate::{
    cmd::Cmd,
    foundation::{
        error::{LayerfoldError, LayerfoldResult},
        ids::{CelId, ImageId},
    },
    model::{image::ImageRef, sprite::Sprite},
};

/// Points every cel that holds image `old` at `new` instead.
#[derive(Debug)]
pub struct ReplaceImage {
    old: ImageId,
    new: ImageRef,
    replaced: Vec<(CelId, ImageRef)>,
}

impl ReplaceImage {
    pub fn new(old: ImageId, new: ImageRef) -> Self {
        Self {
            old,
            new,
            replaced: vec![],
        }
    }
}

impl Cmd for ReplaceImage {
    fn label(&self) -> &'static str {
        "replace image"
    }

    fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        let cels = sprite.cels_using_image(self.old);
        if cels.is_empty() {
            return Err(LayerfoldError::validation(format!(
                "no cel uses image {}",
                self.old
            )));
        }
        self.replaced.clear();
        for id in cels {
            let prev = sprite.set_cel_image(id, self.new.clone())?;
            self.replaced.push((id, prev));
        }
        Ok(())
    }

    fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        for (id, prev) in self.replaced.drain(..).rev() {
            sprite.set_cel_image(id, prev)?;
        }
        Ok(())
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.new.byte_len()
            + self.replaced.len() * std::mem::size_of::<(CelId, ImageRef)>()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cmd/image.rs"]
mod tests;
