use cushy::figures::units::UPx;
use cushy::figures::{Point, Size, Zero};
use cushy::styles::Color;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;
use tracing::warn;

use crate::layer::Layer;
use crate::raster::{rgba, source_over, RasterBuffer, Rgba};
use crate::settings::Tool;
use crate::transform::{LayerBox, ROTATION_HANDLE_OFFSET};

pub const BACKGROUND: Color = Color(0x1a1a_2eff);
pub const ACCENT: Color = Color(0x3b82_f6ff);
pub const MASK_OVERLAY_OPACITY: f32 = 0.7;

const OUTLINE_WIDTH: f32 = 2.;
const CORNER_HANDLE_SIZE: f32 = 8.;
const ROTATION_KNOB_RADIUS: f32 = 6.;
const CONNECTOR_LENGTH: f32 = 14.;

/// Renders `layers` into `frame` in a single pass: the layer composite
/// followed by the selected layer's mask.
pub fn render(
    layers: &[Layer],
    selected: Option<usize>,
    tool: Tool,
    canvas: Size<UPx>,
    frame: &mut RasterBuffer,
) {
    composite(layers, selected, tool, canvas, frame);
    overlay_mask(layers, selected, frame);
}

/// Draws visible layers bottom to top into `frame`, resized to `canvas`. With
/// [`Tool::Select`] the selected layer's chrome goes directly above it.
pub fn composite(
    layers: &[Layer],
    selected: Option<usize>,
    tool: Tool,
    canvas: Size<UPx>,
    frame: &mut RasterBuffer,
) {
    frame.reset(canvas, BACKGROUND);
    if frame.width() == 0 || frame.height() == 0 {
        return;
    }

    for (index, layer) in layers.iter().enumerate().filter(|(_, layer)| layer.visible) {
        draw_layer(layer, frame);
        if tool == Tool::Select && selected == Some(index) {
            draw_chrome(&layer.bounds, frame);
        }
    }
}

pub fn overlay_mask(layers: &[Layer], selected: Option<usize>, frame: &mut RasterBuffer) {
    let Some(mask) = selected
        .and_then(|index| layers.get(index))
        .and_then(|layer| layer.mask.as_ref())
    else {
        return;
    };

    let mask = mask.read();
    if mask.size() == frame.size() {
        frame
            .pixels_mut()
            .par_iter_mut()
            .zip(mask.pixels())
            .for_each(|(dest, src)| source_over(dest, *src, MASK_OVERLAY_OPACITY));
    } else {
        warn!(
            mask = ?mask.size(),
            frame = ?frame.size(),
            "skipping mask overlay with mismatched size"
        );
    }
}

/// The on-screen frame plus the layer composite beneath its mask overlay.
///
/// Mask strokes only touch the overlay, so [`Preview::refresh_overlay`]
/// rebuilds the frame from the cached composite instead of redrawing every
/// layer.
#[derive(Debug)]
pub struct Preview {
    composite: RasterBuffer,
    frame: RasterBuffer,
    composites: u64,
}

impl Default for Preview {
    fn default() -> Self {
        Self::new()
    }
}

impl Preview {
    pub fn new() -> Self {
        Self {
            composite: RasterBuffer::new(Size::ZERO),
            frame: RasterBuffer::new(Size::ZERO),
            composites: 0,
        }
    }

    pub const fn frame(&self) -> &RasterBuffer {
        &self.frame
    }

    /// How many times the layer stack has been composited.
    pub const fn composites(&self) -> u64 {
        self.composites
    }

    pub fn redraw(&mut self, layers: &[Layer], selected: Option<usize>, tool: Tool, canvas: Size<UPx>) {
        composite(layers, selected, tool, canvas, &mut self.composite);
        self.composites += 1;
        self.refresh_overlay(layers, selected);
    }

    pub fn refresh_overlay(&mut self, layers: &[Layer], selected: Option<usize>) {
        self.frame.copy_from(&self.composite);
        overlay_mask(layers, selected, &mut self.frame);
    }
}

/// Runs `paint` on every frame pixel whose row and column fall within
/// `min..=max`, handing it the pixel's center in box-local space.
fn for_each_local(
    bounds: &LayerBox,
    min: Point<f32>,
    max: Point<f32>,
    frame: &mut RasterBuffer,
    paint: impl Fn(Point<f32>, &mut Rgba) + Sync,
) {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let x0 = clamp_index(min.x.floor(), width);
    let x1 = clamp_index(max.x.ceil() + 1., width);
    let y0 = clamp_index(min.y.floor(), height);
    let y1 = clamp_index(max.y.ceil() + 1., height);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let center = bounds.center();
    let (sin, cos) = bounds.rotation.to_radians().sin_cos();
    frame
        .pixels_mut()
        .par_chunks_mut(width)
        .enumerate()
        .skip(y0)
        .take(y1 - y0)
        .for_each(|(y, row)| {
            let dy = y as f32 + 0.5 - center.y;
            for (x, dest) in row.iter_mut().enumerate().take(x1).skip(x0) {
                let dx = x as f32 + 0.5 - center.x;
                let local = Point::new(dx * cos + dy * sin, dy * cos - dx * sin);
                paint(local, dest);
            }
        });
}

fn clamp_index(value: f32, len: usize) -> usize {
    if value <= 0. {
        0
    } else {
        (value as usize).min(len)
    }
}

fn draw_layer(layer: &Layer, frame: &mut RasterBuffer) {
    let bounds = layer.bounds;
    let image = &*layer.image;
    if bounds.width <= 0. || bounds.height <= 0. || image.width() == 0 || image.height() == 0 {
        return;
    }

    let (min, max) = bounds.extents();
    let half_width = bounds.width / 2.;
    let half_height = bounds.height / 2.;
    let scale_x = image.width() as f32 / bounds.width;
    let scale_y = image.height() as f32 / bounds.height;
    let last_x = image.width() - 1;
    let last_y = image.height() - 1;
    let opacity = layer.opacity;

    for_each_local(&bounds, min, max, frame, |local, dest| {
        let u = local.x + half_width;
        let v = local.y + half_height;
        if u < 0. || v < 0. || u >= bounds.width || v >= bounds.height {
            return;
        }

        let sample = Point::new(
            ((u * scale_x) as u32).min(last_x),
            ((v * scale_y) as u32).min(last_y),
        );
        if let Some(src) = image.pixel(sample) {
            source_over(dest, src, opacity);
        }
    });
}

fn draw_chrome(bounds: &LayerBox, frame: &mut RasterBuffer) {
    let half_width = bounds.width / 2.;
    let half_height = bounds.height / 2.;
    let knob = Point::new(0., -half_height - ROTATION_HANDLE_OFFSET);
    let accent = rgba(ACCENT);

    let reach = ROTATION_HANDLE_OFFSET + ROTATION_KNOB_RADIUS + CORNER_HANDLE_SIZE;
    let (min, max) = bounds.extents();
    let min = Point::new(min.x - reach, min.y - reach);
    let max = Point::new(max.x + reach, max.y + reach);

    for_each_local(bounds, min, max, frame, |local, dest| {
        if chrome_covers(local, half_width, half_height, knob) {
            *dest = accent;
        }
    });
}

fn chrome_covers(local: Point<f32>, half_width: f32, half_height: f32, knob: Point<f32>) -> bool {
    let band = OUTLINE_WIDTH / 2.;
    let (x, y) = (local.x.abs(), local.y.abs());

    let outline = x <= half_width + band
        && y <= half_height + band
        && (x >= half_width - band || y >= half_height - band);

    let handle = CORNER_HANDLE_SIZE / 2.;
    let corner = (x - half_width).abs() <= handle && (y - half_height).abs() <= handle;

    let knob_hit = (local.x - knob.x).hypot(local.y - knob.y) <= ROTATION_KNOB_RADIUS;

    let connector = local.x.abs() <= band
        && local.y <= -half_height
        && local.y >= -half_height - CONNECTOR_LENGTH;

    outline || corner || knob_hit || connector
}
