use std::sync::Arc;

use cushy::figures::units::UPx;
use cushy::figures::{Point, Size};
use tracing::{debug, trace, warn};

use crate::brush::{Brush, Stroke};
use crate::history::{EditOp, History, HistoryEntry};
use crate::layer::{Layer, LayerId, LayerStore};
use crate::raster::{DecodeError, RasterBuffer};
use crate::render::{self, Preview};
use crate::settings::{Tool, ToolSettings};
use crate::transform::{Corner, Handle, LayerBox};

/// The pointer interaction in progress. Transform and paint gestures share
/// one state so they can never overlap.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Moving {
        offset: Point<f32>,
    },
    Resizing {
        corner: Corner,
        origin: Point<f32>,
        start: LayerBox,
    },
    Rotating,
    Painting(Stroke),
}

impl Gesture {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    const fn op(&self) -> Option<EditOp> {
        match self {
            Self::Idle => None,
            Self::Moving { .. } => Some(EditOp::Move),
            Self::Resizing { .. } => Some(EditOp::Resize),
            Self::Rotating => Some(EditOp::Rotate),
            Self::Painting(stroke) => Some(stroke.op()),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub enum Redraw {
    Nothing,
    /// Only mask pixels changed; the layer composite is still current.
    Overlay,
    Full,
}

impl Redraw {
    pub const fn is_needed(self) -> bool {
        !matches!(self, Self::Nothing)
    }
}

impl From<bool> for Redraw {
    fn from(changed: bool) -> Self {
        if changed {
            Self::Full
        } else {
            Self::Nothing
        }
    }
}

/// A layer stack, its undo timeline, and the pointer gesture acting on it.
///
/// Pointer handlers take screen-space positions and the current
/// [`ToolSettings`]; they convert to canvas space once using the settings'
/// zoom. Handlers returning `bool` report whether a full redraw is needed.
#[derive(Debug, Default)]
pub struct Editor {
    store: LayerStore,
    history: History,
    canvas: Option<Size<UPx>>,
    gesture: Gesture,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &[Layer] {
        self.store.layers()
    }

    pub const fn selected(&self) -> Option<usize> {
        self.store.selected()
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.store.selected_layer()
    }

    pub const fn history(&self) -> &History {
        &self.history
    }

    pub const fn canvas_size(&self) -> Option<Size<UPx>> {
        self.canvas
    }

    pub const fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn load_base(&mut self, bytes: &[u8]) -> Result<LayerId, DecodeError> {
        let image = RasterBuffer::decode(bytes).map_err(|err| {
            warn!("base image not loaded: {err}");
            err
        })?;
        Ok(self.load_base_image(image))
    }

    pub fn load_base_image(&mut self, image: RasterBuffer) -> LayerId {
        self.gesture = Gesture::Idle;
        let size = image.size();
        let id = self.store.add_base(Arc::new(image));
        self.canvas = Some(size);
        self.history
            .reset(HistoryEntry::new(EditOp::LoadBase, self.store.layers()));
        debug!(
            width = size.width.get(),
            height = size.height.get(),
            "loaded base image"
        );
        id
    }

    pub fn add_layer(&mut self, bytes: &[u8]) -> Result<LayerId, DecodeError> {
        let image = RasterBuffer::decode(bytes).map_err(|err| {
            warn!("layer not added: {err}");
            err
        })?;
        Ok(self.add_layer_image(image))
    }

    /// Adds `image` as the new top layer, or as the base when there are no
    /// layers yet.
    pub fn add_layer_image(&mut self, image: RasterBuffer) -> LayerId {
        if self.store.is_empty() {
            return self.load_base_image(image);
        }

        self.finish_gesture();
        let id = self.store.add_layer(Arc::new(image));
        debug!(id = id.get(), "added layer");
        self.commit(EditOp::AddLayer);
        id
    }

    pub fn remove_layer(&mut self, index: usize) -> bool {
        self.finish_gesture();
        if self.store.remove(index).is_none() {
            return false;
        }
        self.commit(EditOp::RemoveLayer);
        true
    }

    /// Moves a layer while a reorder drag is in progress. Nothing is
    /// committed until [`Editor::finish_reorder`].
    pub fn reorder_layer(&mut self, from: usize, to: usize) -> bool {
        self.store.reorder(from, to)
    }

    pub fn finish_reorder(&mut self) {
        self.commit(EditOp::Reorder);
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) -> bool {
        self.store.set_visible(index, visible)
    }

    pub fn set_opacity(&mut self, index: usize, opacity: f32) -> bool {
        self.store.set_opacity(index, opacity)
    }

    pub fn rename_layer(&mut self, index: usize, name: impl Into<String>) -> bool {
        self.store.rename(index, name)
    }

    pub fn select_layer(&mut self, index: usize) -> bool {
        if !self.gesture.is_idle() {
            trace!(index, "selection change ignored mid-gesture");
            return false;
        }
        self.store.select(index)
    }

    pub fn commit(&mut self, op: EditOp) {
        self.history
            .commit(HistoryEntry::new(op, self.store.layers()));
    }

    /// Starts a gesture on the selected layer. A gesture that was still
    /// active is finished and committed first.
    pub fn pointer_down(&mut self, screen: Point<f32>, settings: &ToolSettings) -> bool {
        let finished = self.finish_gesture();
        let point = settings.zoom.to_canvas(screen);
        let Some(canvas) = self.canvas else {
            return finished;
        };
        let Some(layer) = self.store.selected_layer_mut() else {
            return finished;
        };

        self.gesture = match settings.tool {
            Tool::Select => match layer.bounds.hit_test(point) {
                Handle::Rotate => Gesture::Rotating,
                Handle::Corner(corner) => Gesture::Resizing {
                    corner,
                    origin: point,
                    start: layer.bounds,
                },
                Handle::Body => Gesture::Moving {
                    offset: Point::new(point.x - layer.bounds.x, point.y - layer.bounds.y),
                },
            },
            Tool::Brush | Tool::Eraser => {
                let Some(brush) = Brush::from_settings(settings) else {
                    return finished;
                };
                let mask = layer.mask_or_insert(canvas);
                let mut surface = mask.write();
                Gesture::Painting(Stroke::begin(&brush, point, &mut surface))
            }
        };
        trace!(gesture = ?self.gesture, "pointer down");
        true
    }

    /// Continues the current gesture. Stroke moves only invalidate the mask
    /// overlay.
    pub fn pointer_move(&mut self, screen: Point<f32>, settings: &ToolSettings) -> Redraw {
        let point = settings.zoom.to_canvas(screen);
        let Some(layer) = self.store.selected_layer_mut() else {
            return Redraw::Nothing;
        };

        match &mut self.gesture {
            Gesture::Idle => Redraw::Nothing,
            Gesture::Moving { offset } => {
                layer.bounds.x = point.x - offset.x;
                layer.bounds.y = point.y - offset.y;
                Redraw::Full
            }
            Gesture::Resizing {
                corner,
                origin,
                start,
            } => {
                layer
                    .bounds
                    .resize_from(start, *corner, point.x - origin.x, point.y - origin.y);
                Redraw::Full
            }
            Gesture::Rotating => {
                layer.bounds.rotate_toward(point);
                Redraw::Full
            }
            Gesture::Painting(stroke) => {
                let (Some(brush), Some(mask)) = (Brush::from_settings(settings), &layer.mask)
                else {
                    return Redraw::Nothing;
                };
                stroke.extend_to(&brush, point, &mut mask.write());
                Redraw::Overlay
            }
        }
    }

    pub fn pointer_up(&mut self) -> bool {
        self.finish_gesture()
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.finish_gesture()
    }

    fn finish_gesture(&mut self) -> bool {
        let Some(op) = std::mem::take(&mut self.gesture).op() else {
            return false;
        };
        self.commit(op);
        true
    }

    pub fn clear_mask(&mut self) -> bool {
        self.finish_gesture();
        let Some(layer) = self.store.selected_layer() else {
            return false;
        };
        if let Some(mask) = &layer.mask {
            mask.write().clear();
        }
        self.commit(EditOp::ClearMask);
        true
    }

    /// Steps back one history entry. An unfinished gesture is abandoned.
    pub fn undo(&mut self) -> bool {
        self.gesture = Gesture::Idle;
        let Some(entry) = self.history.undo() else {
            return false;
        };
        self.store.restore(entry.layers());
        true
    }

    pub fn redo(&mut self) -> bool {
        self.gesture = Gesture::Idle;
        let Some(entry) = self.history.redo() else {
            return false;
        };
        self.store.restore(entry.layers());
        true
    }

    pub fn render(&self, settings: &ToolSettings, frame: &mut RasterBuffer) -> bool {
        let Some(canvas) = self.canvas else {
            return false;
        };
        render::render(
            self.store.layers(),
            self.store.selected(),
            settings.tool,
            canvas,
            frame,
        );
        true
    }

    pub fn update_preview(
        &self,
        settings: &ToolSettings,
        preview: &mut Preview,
        redraw: Redraw,
    ) -> bool {
        let Some(canvas) = self.canvas else {
            return false;
        };
        match redraw {
            Redraw::Nothing => {}
            Redraw::Overlay if preview.composites() > 0 => {
                preview.refresh_overlay(self.store.layers(), self.store.selected());
            }
            Redraw::Overlay | Redraw::Full => preview.redraw(
                self.store.layers(),
                self.store.selected(),
                settings.tool,
                canvas,
            ),
        }
        true
    }
}
