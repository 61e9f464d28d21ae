use crate::{
    foundation::{
        core::{FrameIndex, IRect, Point},
        ids::{CelId, ImageId, LayerId},
    },
    model::image::{Image, ImageRef, placed_bounds},
};

/// Placement of one image at one (layer, frame) coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct Cel {
    pub(crate) id: CelId,
    pub(crate) layer: LayerId,
    pub(crate) frame: FrameIndex,
    pub(crate) image: ImageRef,
    pub(crate) position: Point,
    pub(crate) opacity: u8,
    /// Draw-order offset relative to the layer's stack position.
    pub(crate) z_index: i32,
}

impl Cel {
    pub fn new(id: CelId, layer: LayerId, frame: FrameIndex, image: ImageRef) -> Self {
        Self {
            id,
            layer,
            frame,
            image,
            position: Point::ZERO,
            opacity: 255,
            z_index: 0,
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn id(&self) -> CelId {
        self.id
    }

    pub fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn frame(&self) -> FrameIndex {
        self.frame
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn image_ref(&self) -> ImageRef {
        self.image.clone()
    }

    /// Cels sharing this id share pixels.
    pub fn link_group(&self) -> ImageId {
        self.image.id()
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn set_opacity(&mut self, opacity: u8) {
        self.opacity = opacity;
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    /// Sprite-space rectangle covered by the cel image.
    pub fn bounds(&self) -> IRect {
        placed_bounds(&self.image, self.position)
    }
}
