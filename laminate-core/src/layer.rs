use std::sync::Arc;

use cushy::figures::units::UPx;
use cushy::figures::Size;
use parking_lot::RwLock;
use tracing::trace;

use crate::raster::RasterBuffer;
use crate::transform::LayerBox;

/// A canvas-sized mask surface, shared between a layer and every history
/// entry that captured it.
pub type SharedMask = Arc<RwLock<RasterBuffer>>;

pub const BASE_LAYER_NAME: &str = "Base image";

#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LayerId(u64);

impl LayerId {
    pub const fn first() -> Self {
        Self(0)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub image: Arc<RasterBuffer>,
    pub mask: Option<SharedMask>,
    pub visible: bool,
    pub opacity: f32,
    pub bounds: LayerBox,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>, image: Arc<RasterBuffer>) -> Self {
        Self {
            id,
            name: name.into(),
            bounds: LayerBox::new(image.size()),
            image,
            mask: None,
            visible: true,
            opacity: 1.,
        }
    }

    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    pub fn mask_or_insert(&mut self, canvas: Size<UPx>) -> SharedMask {
        self.mask
            .get_or_insert_with(|| Arc::new(RwLock::new(RasterBuffer::new(canvas))))
            .clone()
    }
}

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && Arc::ptr_eq(&self.image, &other.image)
            && match (&self.mask, &other.mask) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
            && self.visible == other.visible
            && self.opacity == other.opacity
            && self.bounds == other.bounds
    }
}

#[derive(Debug, Default, Clone)]
pub struct LayerStore {
    layers: Vec<Layer>,
    selected: Option<usize>,
    next_id: LayerId,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected.and_then(|index| self.layers.get(index))
    }

    pub fn selected_layer_mut(&mut self) -> Option<&mut Layer> {
        self.selected.and_then(|index| self.layers.get_mut(index))
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    pub fn add_base(&mut self, image: Arc<RasterBuffer>) -> LayerId {
        let id = self.allocate_id();
        self.layers.clear();
        self.layers.push(Layer::new(id, BASE_LAYER_NAME, image));
        self.selected = Some(0);
        id
    }

    pub fn add_layer(&mut self, image: Arc<RasterBuffer>) -> LayerId {
        let id = self.allocate_id();
        let name = format!("Layer {}", self.layers.len());
        self.layers.push(Layer::new(id, name, image));
        self.selected = Some(self.layers.len() - 1);
        id
    }

    pub fn remove(&mut self, index: usize) -> Option<Layer> {
        if index >= self.layers.len() {
            trace!(index, "ignoring removal of missing layer");
            return None;
        }

        let removed = self.layers.remove(index);
        self.selected = (!self.layers.is_empty()).then_some(0);
        Some(removed)
    }

    /// Moves a layer within the paint order. The selection follows the moved
    /// layer when it was the selected one.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.layers.len() || to >= self.layers.len() {
            trace!(from, to, "ignoring reorder outside the layer list");
            return false;
        }
        if from == to {
            return false;
        }

        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        if self.selected == Some(from) {
            self.selected = Some(to);
        }
        true
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.layers.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) -> bool {
        self.with_layer(index, |layer| layer.visible = visible)
    }

    pub fn set_opacity(&mut self, index: usize, opacity: f32) -> bool {
        let opacity = if opacity.is_nan() {
            1.
        } else {
            opacity.clamp(0., 1.)
        };
        self.with_layer(index, |layer| layer.opacity = opacity)
    }

    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> bool {
        let name = name.into();
        self.with_layer(index, |layer| layer.name = name)
    }

    fn with_layer(&mut self, index: usize, edit: impl FnOnce(&mut Layer)) -> bool {
        if let Some(layer) = self.layers.get_mut(index) {
            edit(layer);
            true
        } else {
            trace!(index, "ignoring edit of missing layer");
            false
        }
    }

    /// Installs layers captured by a history entry. A selection that no
    /// longer exists is clamped to the top layer.
    pub fn restore(&mut self, layers: &[Layer]) {
        self.layers = layers.to_vec();
        self.selected = match self.selected {
            _ if self.layers.is_empty() => None,
            Some(index) => Some(index.min(self.layers.len() - 1)),
            None => Some(0),
        };
    }
}
