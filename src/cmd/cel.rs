use std::sync::Arc;

use crate::{
    cmd::Cmd,
    foundation::{
        core::Point,
        error::{LayerfoldError, LayerfoldResult},
        ids::CelId,
    },
    model::{cel::Cel, image::ImageRef, sprite::Sprite},
};

#[derive(Debug)]
pub struct AddCel {
    id: CelId,
    pending: Option<Cel>,
}

impl AddCel {
    pub fn new(cel: Cel) -> Self {
        Self {
            id: cel.id,
            pending: Some(cel),
        }
    }
}

impl Cmd for AddCel {
    fn label(&self) -> &'static str {
        "add cel"
    }

    fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        let cel = self.pending.take().ok_or_else(|| {
            LayerfoldError::history(format!("cel {} is already in the sprite", self.id))
        })?;
        if let Err(err) = sprite.insert_cel(cel.clone()) {
            self.pending = Some(cel);
            return Err(err);
        }
        Ok(())
    }

    fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        self.pending = Some(sprite.take_cel(self.id)?);
        Ok(())
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.pending.as_ref().map_or(0, |c| c.image().byte_len())
    }
}

#[derive(Debug)]
pub struct RemoveCel {
    id: CelId,
    removed: Option<Cel>,
}

impl RemoveCel {
    pub fn new(id: CelId) -> Self {
        Self { id, removed: None }
    }
}

impl Cmd for RemoveCel {
    fn label(&self) -> &'static str {
        "remove cel"
    }

    fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        self.removed = Some(sprite.take_cel(self.id)?);
        Ok(())
    }

    fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        let cel = self
            .removed
            .take()
            .ok_or_else(|| LayerfoldError::history(format!("cel {} was not removed", self.id)))?;
        sprite.insert_cel(cel)
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.removed.as_ref().map_or(0, |c| c.image().byte_len())
    }
}

/// Generates a command that swaps one scalar cel property and remembers the old value.
macro_rules! cel_property_cmd {
    ($name:ident, $field:ident, $ty:ty, $label:literal) => {
        #[derive(Debug)]
        pub struct $name {
            id: CelId,
            old: $ty,
            new: $ty,
        }

        impl $name {
            pub fn new(id: CelId, $field: $ty) -> Self {
                Self {
                    id,
                    old: $field,
                    new: $field,
                }
            }
        }

        impl Cmd for $name {
            fn label(&self) -> &'static str {
                $label
            }

            fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
                let cel = sprite.try_cel_mut(self.id)?;
                self.old = cel.$field;
                cel.$field = self.new;
                Ok(())
            }

            fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
                sprite.try_cel_mut(self.id)?.$field = self.old;
                Ok(())
            }

            fn mem_size(&self) -> usize {
                std::mem::size_of::<Self>()
            }
        }
    };
}

cel_property_cmd!(SetCelPosition, position, Point, "set cel position");
cel_property_cmd!(SetCelOpacity, opacity, u8, "set cel opacity");
cel_property_cmd!(SetCelZIndex, z_index, i32, "set cel z-index");

/// Gives a linked cel a private copy of its image under a fresh image id.
///
/// The copy is made once; redo reinstalls the same copy so later commands that refer to
/// its id keep working.
#[derive(Debug)]
pub struct UnlinkCel {
    id: CelId,
    shared: Option<ImageRef>,
    private: Option<ImageRef>,
}

impl UnlinkCel {
    pub fn new(id: CelId) -> Self {
        Self {
            id,
            shared: None,
            private: None,
        }
    }
}

impl Cmd for UnlinkCel {
    fn label(&self) -> &'static str {
        "unlink cel"
    }

    fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        let shared = sprite.try_cel(self.id)?.image_ref();
        let private = match &self.private {
            Some(img) => img.clone(),
            None => {
                let img = Arc::new(shared.duplicate(sprite.alloc_image_id()));
                self.private = Some(img.clone());
                img
            }
        };
        sprite.set_cel_image(self.id, private)?;
        self.shared = Some(shared);
        Ok(())
    }

    fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        let shared = self
            .shared
            .take()
            .ok_or_else(|| LayerfoldError::history(format!("cel {} was not unlinked", self.id)))?;
        sprite.set_cel_image(self.id, shared)?;
        Ok(())
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.private.as_ref().map_or(0, |i| i.byte_len())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cmd/cel.rs"]
mod tests;
