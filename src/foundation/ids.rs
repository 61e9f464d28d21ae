use std::fmt;

/// Stable identity of a layer. Survives reordering, removal and re-insertion.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub u64);

/// Stable identity of a cel.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct CelId(pub u64);

/// Identity of an image buffer. Cels holding images with the same id are linked.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for CelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I{}", self.0)
    }
}

/// Monotonic allocator shared by every object kind of one sprite.
///
/// Ids are never reused, so an id captured by an undo record keeps pointing at the same
/// object after it has been removed and restored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn starting_after(max_used: u64) -> Self {
        Self {
            next: max_used.saturating_add(1),
        }
    }

    fn bump(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn layer(&mut self) -> LayerId {
        LayerId(self.bump())
    }

    pub fn cel(&mut self) -> CelId {
        CelId(self.bump())
    }

    pub fn image(&mut self) -> ImageId {
        ImageId(self.bump())
    }
}
