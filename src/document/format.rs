use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
    sync::Arc,
};

use crate::{
    foundation::{
        core::{Canvas, FrameIndex, Point, Rgba8, TRANSPARENT, hex_color},
        error::{LayerfoldError, LayerfoldResult},
        ids::{CelId, IdAllocator, ImageId, LayerId},
    },
    model::{
        cel::Cel,
        image::{Image, ImageRef},
        layer::{Layer, LayerKind},
        sprite::Sprite,
    },
    render::blend::BlendMode,
};

pub const FORMAT_VERSION: u32 = 1;

/// JSON form of a sprite. Images are stored once and referenced by id, so linked cels
/// stay linked across a save and load.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpriteFile {
    pub version: u32,
    pub canvas: Canvas,
    pub frames: u32,
    #[serde(with = "hex_color", default = "transparent")]
    pub transparent_color: Rgba8,
    pub root: LayerId,
    /// Root children, bottom to top.
    pub layers: Vec<LayerFile>,
    pub images: BTreeMap<ImageId, ImageFile>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageFile {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LayerFile {
    pub id: LayerId,
    pub name: String,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub background: bool,
    #[serde(default = "opaque")]
    pub opacity: u8,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(flatten)]
    pub kind: LayerFileKind,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerFileKind {
    Image { cels: Vec<CelFile> },
    Group { children: Vec<LayerFile> },
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CelFile {
    pub id: CelId,
    pub frame: FrameIndex,
    pub image: ImageId,
    #[serde(default)]
    pub position: Point,
    #[serde(default = "opaque")]
    pub opacity: u8,
    #[serde(default)]
    pub z_index: i32,
}

fn transparent() -> Rgba8 {
    TRANSPARENT
}

fn yes() -> bool {
    true
}

fn opaque() -> u8 {
    255
}

impl SpriteFile {
    pub fn from_sprite(sprite: &Sprite) -> Self {
        let mut images = BTreeMap::new();
        for cel in sprite.cels() {
            let img = cel.image();
            images.entry(img.id()).or_insert_with(|| ImageFile {
                width: img.width(),
                height: img.height(),
                rgba: img.data().to_vec(),
            });
        }
        let layers = sprite
            .layer(sprite.root())
            .map(|root| {
                root.children()
                    .iter()
                    .filter_map(|&id| layer_to_file(sprite, id))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            version: FORMAT_VERSION,
            canvas: sprite.canvas(),
            frames: sprite.total_frames(),
            transparent_color: sprite.transparent_color(),
            root: sprite.root(),
            layers,
            images,
        }
    }

    /// Builds and validates the sprite. The id allocator continues after the largest id
    /// found in the file.
    pub fn into_sprite(self) -> LayerfoldResult<Sprite> {
        if self.version != FORMAT_VERSION {
            return Err(LayerfoldError::validation(format!(
                "unsupported sprite format version {}",
                self.version
            )));
        }
        let canvas = Canvas::new(self.canvas.width, self.canvas.height)?;
        if self.frames == 0 {
            return Err(LayerfoldError::validation("sprite must have at least one frame"));
        }

        let mut max_id = self.root.0;
        let mut images: BTreeMap<ImageId, ImageRef> = BTreeMap::new();
        for (id, f) in self.images {
            max_id = max_id.max(id.0);
            images.insert(id, Arc::new(Image::from_rgba8(id, f.width, f.height, f.rgba)?));
        }

        let mut loader = Loader {
            images: &images,
            layers: BTreeMap::new(),
            cels: BTreeMap::new(),
            cel_ids: BTreeSet::new(),
            max_id,
        };
        let mut root = Layer::new_group(self.root, "root");
        let mut children = Vec::with_capacity(self.layers.len());
        for lf in self.layers {
            children.push(loader.load(lf, self.root)?);
        }
        root.kind = LayerKind::Group { children };
        if loader.layers.insert(self.root, root).is_some() {
            return Err(LayerfoldError::validation(format!(
                "layer id {} is used twice",
                self.root
            )));
        }

        let Loader {
            layers,
            cels,
            max_id,
            ..
        } = loader;
        let sprite = Sprite::from_parts(
            canvas,
            self.frames,
            self.transparent_color,
            self.root,
            layers,
            cels,
            IdAllocator::starting_after(max_id),
        );
        sprite.validate()?;
        Ok(sprite)
    }

    pub fn from_json_str(s: &str) -> LayerfoldResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self) -> LayerfoldResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> LayerfoldResult<Sprite> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LayerfoldError::from(
                anyhow::Error::new(e).context(format!("read sprite '{}'", path.display())),
            )
        })?;
        Self::from_json_str(&text)?.into_sprite()
    }

    pub fn save(sprite: &Sprite, path: &Path) -> LayerfoldResult<()> {
        let text = Self::from_sprite(sprite).to_json_string()?;
        std::fs::write(path, text).map_err(|e| {
            LayerfoldError::from(
                anyhow::Error::new(e).context(format!("write sprite '{}'", path.display())),
            )
        })
    }
}

fn layer_to_file(sprite: &Sprite, id: LayerId) -> Option<LayerFile> {
    let layer = sprite.layer(id)?;
    let kind = match layer.kind() {
        LayerKind::Image { cels } => LayerFileKind::Image {
            cels: cels
                .values()
                .filter_map(|&cid| sprite.cel(cid))
                .map(|c| CelFile {
                    id: c.id(),
                    frame: c.frame(),
                    image: c.link_group(),
                    position: c.position(),
                    opacity: c.opacity(),
                    z_index: c.z_index(),
                })
                .collect(),
        },
        LayerKind::Group { children } => LayerFileKind::Group {
            children: children
                .iter()
                .filter_map(|&c| layer_to_file(sprite, c))
                .collect(),
        },
    };
    Some(LayerFile {
        id,
        name: layer.name().to_string(),
        visible: layer.is_visible(),
        background: layer.is_background(),
        opacity: layer.opacity(),
        blend_mode: layer.blend_mode(),
        kind,
    })
}

struct Loader<'a> {
    images: &'a BTreeMap<ImageId, ImageRef>,
    layers: BTreeMap<LayerId, Layer>,
    cels: BTreeMap<CelId, Cel>,
    cel_ids: BTreeSet<CelId>,
    max_id: u64,
}

impl Loader<'_> {
    fn load(&mut self, lf: LayerFile, parent: LayerId) -> LayerfoldResult<LayerId> {
        let id = lf.id;
        if self.layers.contains_key(&id) {
            return Err(LayerfoldError::validation(format!("layer id {id} is used twice")));
        }
        self.max_id = self.max_id.max(id.0);

        let mut layer = match lf.kind {
            LayerFileKind::Image { cels } => {
                let mut index = BTreeMap::new();
                for cf in cels {
                    let cel = self.load_cel(cf, id)?;
                    if index.insert(cel.frame(), cel.id()).is_some() {
                        return Err(LayerfoldError::validation(format!(
                            "layer {id} has two cels at frame {}",
                            cel.frame()
                        )));
                    }
                    self.cels.insert(cel.id(), cel);
                }
                let mut l = Layer::new_image(id, lf.name);
                l.kind = LayerKind::Image { cels: index };
                l
            }
            LayerFileKind::Group { children } => {
                let mut ids = Vec::with_capacity(children.len());
                for child in children {
                    ids.push(self.load(child, id)?);
                }
                let mut l = Layer::new_group(id, lf.name);
                l.kind = LayerKind::Group { children: ids };
                l
            }
        };
        layer.parent = Some(parent);
        layer.visible = lf.visible;
        layer.background = lf.background;
        layer.opacity = lf.opacity;
        layer.blend_mode = lf.blend_mode;
        self.layers.insert(id, layer);
        Ok(id)
    }

    fn load_cel(&mut self, cf: CelFile, layer: LayerId) -> LayerfoldResult<Cel> {
        if !self.cel_ids.insert(cf.id) {
            return Err(LayerfoldError::validation(format!(
                "cel id {} is used twice",
                cf.id
            )));
        }
        self.max_id = self.max_id.max(cf.id.0);
        let image = self.images.get(&cf.image).cloned().ok_or_else(|| {
            LayerfoldError::validation(format!("cel {} refers to missing image {}", cf.id, cf.image))
        })?;
        Ok(Cel::new(cf.id, layer, cf.frame, image)
            .with_position(cf.position)
            .with_opacity(cf.opacity)
            .with_z_index(cf.z_index))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/format.rs"]
mod tests;
