use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use laminate_core::settings::DEFAULT_BRUSH_SIZE;
use laminate_core::{BrushShape, MaskColor, Tool, ToolSettings, Zoom};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(version, about = "Stack, transform, and mask images as layers")]
pub struct Args {
    /// Image that becomes the base layer and sets the canvas size
    pub base: PathBuf,

    /// Images stacked above the base, bottom first
    pub layers: Vec<PathBuf>,

    /// Tool active at startup
    #[arg(long, value_enum, default_value_t = ToolArg::Select)]
    pub tool: ToolArg,

    /// Brush tip shape
    #[arg(long, value_enum, default_value_t = ShapeArg::Circle)]
    pub shape: ShapeArg,

    /// Brush diameter in canvas pixels (5-100)
    #[arg(long, default_value_t = DEFAULT_BRUSH_SIZE)]
    pub brush_size: f32,

    /// Brush edge softness (0-10)
    #[arg(long, default_value_t = 0.)]
    pub feather: f32,

    /// Mask paint color
    #[arg(long, value_enum, default_value_t = ColorArg::Red)]
    pub mask_color: ColorArg,

    /// View scale (0.1-3.0)
    #[arg(long, default_value_t = 1.)]
    pub zoom: f32,

    /// Most verbose log level printed
    #[arg(long, default_value_t = Level::INFO)]
    pub log_level: Level,
}

impl Args {
    pub fn settings(&self) -> ToolSettings {
        let mut settings = ToolSettings::default();
        settings.tool = self.tool.into();
        settings.shape = self.shape.into();
        settings.color = self.mask_color.into();
        settings.zoom = Zoom::new(self.zoom);
        settings.set_brush_size(self.brush_size);
        settings.set_feather(self.feather);
        settings
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ToolArg {
    Select,
    Brush,
    Eraser,
}

impl From<ToolArg> for Tool {
    fn from(value: ToolArg) -> Self {
        match value {
            ToolArg::Select => Tool::Select,
            ToolArg::Brush => Tool::Brush,
            ToolArg::Eraser => Tool::Eraser,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShapeArg {
    Circle,
    Square,
}

impl From<ShapeArg> for BrushShape {
    fn from(value: ShapeArg) -> Self {
        match value {
            ShapeArg::Circle => BrushShape::Circle,
            ShapeArg::Square => BrushShape::Square,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ColorArg {
    Black,
    Green,
    White,
    Red,
    Blue,
    Yellow,
}

impl From<ColorArg> for MaskColor {
    fn from(value: ColorArg) -> Self {
        match value {
            ColorArg::Black => MaskColor::Black,
            ColorArg::Green => MaskColor::Green,
            ColorArg::White => MaskColor::White,
            ColorArg::Red => MaskColor::Red,
            ColorArg::Blue => MaskColor::Blue,
            ColorArg::Yellow => MaskColor::Yellow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_editor() {
        let args = Args::try_parse_from(["laminate", "base.png"]).unwrap();
        assert!(args.layers.is_empty());
        assert_eq!(args.log_level, Level::INFO);
        assert_eq!(args.settings(), ToolSettings::default());
    }

    #[test]
    fn settings_are_clamped() {
        let args = Args::try_parse_from([
            "laminate",
            "base.png",
            "top.png",
            "sticker.png",
            "--tool",
            "eraser",
            "--shape",
            "square",
            "--brush-size",
            "500",
            "--feather",
            "4",
            "--mask-color",
            "yellow",
            "--zoom",
            "9",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.layers.len(), 2);
        assert_eq!(args.log_level, Level::DEBUG);
        let settings = args.settings();
        assert_eq!(settings.tool, Tool::Eraser);
        assert_eq!(settings.shape, BrushShape::Square);
        assert_eq!(settings.color, MaskColor::Yellow);
        assert_eq!(settings.brush_size(), 100.);
        assert_eq!(settings.feather(), 4.);
        assert_eq!(settings.zoom.get(), 3.);
    }

    #[test]
    fn base_image_is_required() {
        assert!(Args::try_parse_from(["laminate"]).is_err());
    }
}
