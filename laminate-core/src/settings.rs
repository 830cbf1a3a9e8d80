use cushy::figures::Point;
use cushy::styles::Color;

pub const MIN_BRUSH_SIZE: f32 = 5.;
pub const MAX_BRUSH_SIZE: f32 = 100.;
pub const DEFAULT_BRUSH_SIZE: f32 = 20.;
pub const MAX_FEATHER: f32 = 10.;
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 3.;
pub const ZOOM_STEP: f32 = 0.1;

#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Tool {
    #[default]
    Select,
    Brush,
    Eraser,
}

impl Tool {
    pub const fn paints_mask(self) -> bool {
        matches!(self, Self::Brush | Self::Eraser)
    }
}

#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum BrushShape {
    #[default]
    Circle,
    Square,
}

#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MaskColor {
    Black,
    Green,
    White,
    #[default]
    Red,
    Blue,
    Yellow,
}

impl MaskColor {
    pub const ALL: [Self; 6] = [
        Self::Black,
        Self::Green,
        Self::White,
        Self::Red,
        Self::Blue,
        Self::Yellow,
    ];

    pub const fn color(self) -> Color {
        match self {
            Self::Black => Color(0x0000_00FF),
            Self::Green => Color(0x00FF_00FF),
            Self::White => Color(0xFFFF_FFFF),
            Self::Red => Color(0xFF00_00FF),
            Self::Blue => Color(0x0000_FFFF),
            Self::Yellow => Color(0xFFFF_00FF),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Green => "green",
            Self::White => "white",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom(f32);

impl Zoom {
    pub const ACTUAL_SIZE: Self = Self(1.);

    /// Clamps to the supported range and snaps to one decimal place.
    pub fn new(scale: f32) -> Self {
        if !scale.is_finite() {
            return Self::ACTUAL_SIZE;
        }
        let snapped = (scale * 10.).round() / 10.;
        Self(snapped.clamp(MIN_ZOOM, MAX_ZOOM))
    }

    pub const fn get(self) -> f32 {
        self.0
    }

    #[must_use]
    pub fn zoomed_in(self) -> Self {
        Self::new(self.0 + ZOOM_STEP)
    }

    #[must_use]
    pub fn zoomed_out(self) -> Self {
        Self::new(self.0 - ZOOM_STEP)
    }

    pub fn to_canvas(self, screen: Point<f32>) -> Point<f32> {
        screen.map(|c| c / self.0)
    }

    pub fn to_screen(self, canvas: Point<f32>) -> Point<f32> {
        canvas.map(|c| c * self.0)
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self::ACTUAL_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    pub tool: Tool,
    pub shape: BrushShape,
    pub color: MaskColor,
    pub zoom: Zoom,
    brush_size: f32,
    feather: f32,
}

impl ToolSettings {
    pub const fn brush_size(&self) -> f32 {
        self.brush_size
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = if size.is_nan() {
            DEFAULT_BRUSH_SIZE
        } else {
            size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
        };
    }

    pub const fn feather(&self) -> f32 {
        self.feather
    }

    pub fn set_feather(&mut self, feather: f32) {
        self.feather = if feather.is_nan() {
            0.
        } else {
            feather.clamp(0., MAX_FEATHER)
        };
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            shape: BrushShape::default(),
            color: MaskColor::default(),
            zoom: Zoom::default(),
            brush_size: DEFAULT_BRUSH_SIZE,
            feather: 0.,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_steps_stay_in_range() {
        let mut zoom = Zoom::default();
        for _ in 0..40 {
            zoom = zoom.zoomed_in();
        }
        assert_eq!(zoom.get(), MAX_ZOOM);
        for _ in 0..40 {
            zoom = zoom.zoomed_out();
        }
        assert_eq!(zoom.get(), MIN_ZOOM);
    }

    #[test]
    fn zoom_snaps_to_tenths() {
        assert_eq!(Zoom::new(1.04).get(), 1.);
        assert_eq!(Zoom::new(1.06).get(), 1.1);
        assert_eq!(Zoom::new(f32::NAN), Zoom::ACTUAL_SIZE);
    }

    #[test]
    fn screen_to_canvas() {
        let zoom = Zoom::new(2.);
        assert_eq!(zoom.to_canvas(Point::new(40., 10.)), Point::new(20., 5.));
        assert_eq!(zoom.to_screen(Point::new(20., 5.)), Point::new(40., 10.));
    }

    #[test]
    fn brush_settings_clamp() {
        let mut settings = ToolSettings::default();
        assert_eq!(settings.brush_size(), DEFAULT_BRUSH_SIZE);
        settings.set_brush_size(1.);
        assert_eq!(settings.brush_size(), MIN_BRUSH_SIZE);
        settings.set_brush_size(500.);
        assert_eq!(settings.brush_size(), MAX_BRUSH_SIZE);
        settings.set_feather(-3.);
        assert_eq!(settings.feather(), 0.);
        settings.set_feather(11.);
        assert_eq!(settings.feather(), MAX_FEATHER);
    }

    #[test]
    fn defaults() {
        let settings = ToolSettings::default();
        assert_eq!(settings.tool, Tool::Select);
        assert_eq!(settings.shape, BrushShape::Circle);
        assert_eq!(settings.color, MaskColor::Red);
        assert_eq!(settings.feather(), 0.);
    }
}
