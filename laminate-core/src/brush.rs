use cushy::figures::Point;
use cushy::styles::Color;

use crate::history::EditOp;
use crate::raster::{destination_out, rgba, source_over, RasterBuffer};
use crate::settings::{BrushShape, Tool, ToolSettings, MAX_FEATHER};
use crate::transform::distance;

pub const STROKE_STEP: f32 = 2.;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StampMode {
    Paint,
    Erase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub size: f32,
    pub shape: BrushShape,
    pub feather: f32,
    pub color: Color,
    pub mode: StampMode,
}

impl Brush {
    pub fn from_settings(settings: &ToolSettings) -> Option<Self> {
        let mode = match settings.tool {
            Tool::Select => return None,
            Tool::Brush => StampMode::Paint,
            Tool::Eraser => StampMode::Erase,
        };
        Some(Self {
            size: settings.brush_size(),
            shape: settings.shape,
            feather: settings.feather(),
            color: settings.color.color(),
            mode,
        })
    }

    fn half(&self) -> f32 {
        self.size / 2.
    }

    fn softness(&self) -> f32 {
        match self.mode {
            StampMode::Paint => (self.feather / MAX_FEATHER).clamp(0., 1.),
            StampMode::Erase => 0.,
        }
    }

    /// Coverage in `[0, 1]` of a pixel offset `(dx, dy)` from the stamp
    /// center.
    pub fn coverage(&self, dx: f32, dy: f32) -> f32 {
        let half = self.half();
        let softness = self.softness();
        match self.shape {
            BrushShape::Circle => {
                let dist = dx.hypot(dy);
                if softness <= 0. {
                    return if dist <= half { 1. } else { 0. };
                }
                let solid = (1. - softness) * half;
                if dist <= solid {
                    1.
                } else if dist >= half {
                    0.
                } else {
                    (half - dist) / (half - solid)
                }
            }
            BrushShape::Square => {
                if softness <= 0. {
                    let inside = |d: f32| (-half..half).contains(&d);
                    return if inside(dx) && inside(dy) { 1. } else { 0. };
                }
                let edge = half - dx.abs().max(dy.abs());
                let fade = softness * half;
                if edge >= fade {
                    1.
                } else {
                    (edge / fade).max(0.)
                }
            }
        }
    }

    /// Stamps once centered on `at`. Returns true if any pixel of `surface`
    /// received coverage.
    pub fn stamp(&self, surface: &mut RasterBuffer, at: Point<f32>) -> bool {
        let half = self.half();
        let max_x = surface.width() as f32 - 1.;
        let max_y = surface.height() as f32 - 1.;
        if max_x < 0. || max_y < 0. {
            return false;
        }
        let left = (at.x - half).floor().max(0.);
        let right = (at.x + half).ceil().min(max_x);
        let top = (at.y - half).floor().max(0.);
        let bottom = (at.y + half).ceil().min(max_y);
        if left > right || top > bottom {
            return false;
        }

        let [red, green, blue, _] = rgba(self.color);
        let paint = [red, green, blue, 255];
        let mut touched = false;
        for y in top as u32..=bottom as u32 {
            for x in left as u32..=right as u32 {
                let coverage = self.coverage(x as f32 - at.x, y as f32 - at.y);
                if coverage <= 0. {
                    continue;
                }
                let Some(pixel) = surface.pixel_mut(Point::new(x, y)) else {
                    continue;
                };
                match self.mode {
                    StampMode::Paint => source_over(pixel, paint, coverage),
                    StampMode::Erase => destination_out(pixel, coverage),
                }
                touched = true;
            }
        }
        touched
    }
}

/// Stamp positions covering the segment `from..=to`.
///
/// The segment is split into `max(1, floor(len / STROKE_STEP))` steps and a
/// position is produced at both ends of every step.
pub fn subdivide(from: Point<f32>, to: Point<f32>) -> impl Iterator<Item = Point<f32>> {
    let steps = ((distance(from, to) / STROKE_STEP).floor() as u32).max(1);
    (0..=steps).map(move |i| {
        let t = i as f32 / steps as f32;
        Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    last: Point<f32>,
    mode: StampMode,
}

impl Stroke {
    pub fn begin(brush: &Brush, at: Point<f32>, surface: &mut RasterBuffer) -> Self {
        brush.stamp(surface, at);
        Self {
            last: at,
            mode: brush.mode,
        }
    }

    pub const fn last(&self) -> Point<f32> {
        self.last
    }

    pub fn extend_to(&mut self, brush: &Brush, at: Point<f32>, surface: &mut RasterBuffer) {
        for point in subdivide(self.last, at) {
            brush.stamp(surface, point);
        }
        self.last = at;
    }

    pub const fn op(&self) -> EditOp {
        match self.mode {
            StampMode::Paint => EditOp::Paint,
            StampMode::Erase => EditOp::Erase,
        }
    }
}
