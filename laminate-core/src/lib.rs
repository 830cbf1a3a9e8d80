pub mod brush;
pub mod editor;
pub mod history;
pub mod layer;
pub mod raster;
pub mod render;
pub mod settings;
pub mod transform;

pub use editor::{Editor, Gesture, Redraw};
pub use history::{EditOp, History, HistoryEntry};
pub use layer::{Layer, LayerId, LayerStore, SharedMask};
pub use raster::{DecodeError, ImageCoordinate, RasterBuffer, Rgba};
pub use render::Preview;
pub use settings::{BrushShape, MaskColor, Tool, ToolSettings, Zoom};
pub use transform::{Corner, Handle, LayerBox};
