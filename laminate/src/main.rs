use anyhow::Context;
use clap::Parser;
use cushy::context::{EventContext, GraphicsContext, LayoutContext, Trackable};
use cushy::figures::units::{Lp, Px};
use cushy::figures::{FloatConversion, IntoSigned, Point, Rect, ScreenScale, Size, Zero};
use cushy::kludgine::app::winit::event::{MouseButton, MouseScrollDelta, TouchPhase};
use cushy::kludgine::app::winit::keyboard::Key;
use cushy::kludgine::app::winit::window::CursorIcon;
use cushy::kludgine::shapes::{Shape, StrokeOptions};
use cushy::kludgine::text::{Text, TextOrigin};
use cushy::kludgine::{wgpu, DrawableExt, Texture};
use cushy::styles::{Color, ColorExt};
use cushy::value::Dynamic;
use cushy::widget::{EventHandling, MakeWidget, Widget, WidgetRef, WrapperWidget, HANDLED, IGNORED};
use cushy::window::{DeviceId, KeyEvent};
use cushy::{ConstraintLimit, ModifiersExt, Run};
use laminate_core::settings::{BrushShape, MaskColor, Tool, ToolSettings};
use laminate_core::{EditOp, Editor, Preview, RasterBuffer, Redraw};
use tracing::info;

mod cli;

const BRUSH_SIZE_STEP: f32 = 5.;
const FEATHER_STEP: f32 = 1.;
const OPACITY_STEP: f32 = 0.1;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(args.log_level)
        .init();

    let mut editor = Editor::new();
    let base = RasterBuffer::open(&args.base)
        .with_context(|| format!("opening {}", args.base.display()))?;
    editor.load_base_image(base);
    for path in &args.layers {
        let layer =
            RasterBuffer::open(path).with_context(|| format!("opening {}", path.display()))?;
        editor.add_layer_image(layer);
    }
    info!(layers = editor.layers().len(), "opened images");

    let data = Dynamic::new(EditState {
        editor,
        settings: args.settings(),
        generation: 0,
        overlay_generation: 0,
    });
    let area = EditArea {
        state: data.clone(),
        preview: Preview::new(),
        texture: None,
        rendered: None,
    }
    .make_widget();
    let sidebar = Sidebar::new(data.clone());
    let root = Root {
        data,
        child: WidgetRef::new(
            area.expand()
                .and(sidebar.width(Lp::points(180)))
                .into_columns(),
        ),
    };

    let mut window = root.into_window();
    window.vsync = false;
    window
        .run()
        .map_err(|err| anyhow::anyhow!("window closed with an error: {err:?}"))?;
    Ok(())
}

/// Everything the widgets share: the editing session and the tool settings
/// applied to it.
#[derive(Debug)]
struct EditState {
    editor: Editor,
    settings: ToolSettings,
    generation: u64,
    overlay_generation: u64,
}

impl EditState {
    fn touch(&mut self) {
        self.invalidate(Redraw::Full);
    }

    fn invalidate(&mut self, redraw: Redraw) {
        match redraw {
            Redraw::Nothing => {}
            Redraw::Overlay => self.overlay_generation = self.overlay_generation.wrapping_add(1),
            Redraw::Full => self.generation = self.generation.wrapping_add(1),
        }
    }

    fn pending(&self, rendered: Option<(u64, u64)>) -> Redraw {
        match rendered {
            Some((generation, _)) if generation != self.generation => Redraw::Full,
            Some((_, overlay)) if overlay != self.overlay_generation => Redraw::Overlay,
            Some(_) => Redraw::Nothing,
            None => Redraw::Full,
        }
    }

    fn apply(&mut self, action: Action) -> bool {
        let settings = &mut self.settings;
        let changed = match action {
            Action::Tool(tool) => {
                settings.tool = tool;
                true
            }
            Action::ToggleShape => {
                settings.shape = match settings.shape {
                    BrushShape::Circle => BrushShape::Square,
                    BrushShape::Square => BrushShape::Circle,
                };
                true
            }
            Action::BrushSize(delta) => {
                settings.set_brush_size(settings.brush_size() + delta);
                true
            }
            Action::Feather(delta) => {
                settings.set_feather(settings.feather() + delta);
                true
            }
            Action::Color(color) => {
                settings.color = color;
                true
            }
            Action::ZoomIn => {
                settings.zoom = settings.zoom.zoomed_in();
                true
            }
            Action::ZoomOut => {
                settings.zoom = settings.zoom.zoomed_out();
                true
            }
            Action::ActualSize => {
                settings.zoom = laminate_core::Zoom::ACTUAL_SIZE;
                true
            }
            Action::Undo => self.editor.undo(),
            Action::Redo => self.editor.redo(),
            Action::ClearMask => self.editor.clear_mask(),
            Action::DeleteLayer => self
                .editor
                .selected()
                .map_or(false, |index| self.editor.remove_layer(index)),
            Action::NextLayer => {
                let count = self.editor.layers().len();
                self.editor
                    .selected()
                    .map_or(false, |index| self.editor.select_layer((index + 1) % count))
            }
            Action::ToggleVisible => self.edit_selected(|editor, index, layer_visible, _| {
                editor.set_visible(index, !layer_visible)
            }),
            Action::Opacity(delta) => self.edit_selected(|editor, index, _, opacity| {
                editor.set_opacity(index, opacity + delta)
            }),
        };

        if changed {
            self.touch();
        }
        changed
    }

    /// Applies a property edit to the selected layer and commits it.
    fn edit_selected(&mut self, edit: impl FnOnce(&mut Editor, usize, bool, f32) -> bool) -> bool {
        let Some(index) = self.editor.selected() else {
            return false;
        };
        let Some(layer) = self.editor.selected_layer() else {
            return false;
        };
        let (visible, opacity) = (layer.visible, layer.opacity);
        if !edit(&mut self.editor, index, visible, opacity) {
            return false;
        }
        self.editor.commit(EditOp::Properties);
        true
    }
}

/// A keyboard command.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Tool(Tool),
    ToggleShape,
    BrushSize(f32),
    Feather(f32),
    Color(MaskColor),
    ZoomIn,
    ZoomOut,
    ActualSize,
    Undo,
    Redo,
    ClearMask,
    DeleteLayer,
    NextLayer,
    ToggleVisible,
    Opacity(f32),
}

impl Action {
    fn from_key(key: &str, primary: bool) -> Option<Self> {
        if primary {
            return match key {
                "z" => Some(Self::Undo),
                "Z" | "y" => Some(Self::Redo),
                _ => None,
            };
        }

        let action = match key {
            "v" => Self::Tool(Tool::Select),
            "b" => Self::Tool(Tool::Brush),
            "e" => Self::Tool(Tool::Eraser),
            "s" => Self::ToggleShape,
            "[" => Self::BrushSize(-BRUSH_SIZE_STEP),
            "]" => Self::BrushSize(BRUSH_SIZE_STEP),
            "f" => Self::Feather(FEATHER_STEP),
            "F" => Self::Feather(-FEATHER_STEP),
            "=" | "+" => Self::ZoomIn,
            "-" => Self::ZoomOut,
            "0" => Self::ActualSize,
            "x" => Self::ClearMask,
            "d" => Self::DeleteLayer,
            "n" => Self::NextLayer,
            "h" => Self::ToggleVisible,
            "o" => Self::Opacity(-OPACITY_STEP),
            "O" => Self::Opacity(OPACITY_STEP),
            _ => {
                let digit = key.parse::<usize>().ok()?;
                let color = MaskColor::ALL.get(digit.checked_sub(1)?)?;
                Self::Color(*color)
            }
        };
        Some(action)
    }
}

#[derive(Debug)]
struct Root {
    data: Dynamic<EditState>,
    child: WidgetRef,
}

impl WrapperWidget for Root {
    fn child_mut(&mut self) -> &mut WidgetRef {
        &mut self.child
    }

    fn adjust_child_constraints(
        &mut self,
        available_space: Size<ConstraintLimit>,
        _context: &mut LayoutContext<'_, '_, '_, '_>,
    ) -> Size<ConstraintLimit> {
        available_space.map(|limit| ConstraintLimit::Fill(limit.max()))
    }

    fn mouse_wheel(
        &mut self,
        _device_id: DeviceId,
        delta: MouseScrollDelta,
        _phase: TouchPhase,
        context: &mut EventContext<'_>,
    ) -> EventHandling {
        if !context.modifiers().state().primary() {
            return IGNORED;
        }

        let delta_y = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(px) => px.y as f32,
        };
        let action = if delta_y > 0. {
            Action::ZoomIn
        } else if delta_y < 0. {
            Action::ZoomOut
        } else {
            return HANDLED;
        };

        if self.data.lock().apply(action) {
            context.set_needs_redraw();
        }
        HANDLED
    }

    fn accept_focus(&mut self, _context: &mut EventContext<'_>) -> bool {
        true
    }

    fn keyboard_input(
        &mut self,
        _device_id: DeviceId,
        input: KeyEvent,
        _is_synthetic: bool,
        context: &mut EventContext<'_>,
    ) -> EventHandling {
        let Key::Character(c) = &input.logical_key else {
            return IGNORED;
        };
        let modifiers = context.modifiers();
        let primary = modifiers.state().primary();
        if !primary && modifiers.possible_shortcut() {
            return IGNORED;
        }
        let Some(action) = Action::from_key(c.as_ref(), primary) else {
            return IGNORED;
        };

        if input.state.is_pressed() && self.data.lock().apply(action) {
            context.set_needs_redraw();
        }
        HANDLED
    }
}

/// The canvas: shows the rendered frame and forwards pointer input.
#[derive(Debug)]
struct EditArea {
    state: Dynamic<EditState>,
    preview: Preview,
    texture: Option<Texture>,
    rendered: Option<(u64, u64)>,
}

impl EditArea {
    fn pointer_event(
        &mut self,
        context: &mut EventContext<'_>,
        event: impl FnOnce(&mut Editor, &ToolSettings) -> Redraw,
    ) {
        let mut state = self.state.lock();
        let state = &mut *state;
        let redraw = event(&mut state.editor, &state.settings);
        if redraw.is_needed() {
            state.invalidate(redraw);
            context.set_needs_redraw();
        }
    }
}

fn canvas_point(location: Point<Px>) -> Point<f32> {
    location.map(|c| c.into_float())
}

impl Widget for EditArea {
    fn redraw(&mut self, context: &mut GraphicsContext<'_, '_, '_, '_>) {
        let state = self.state.lock();
        let pending = if self.texture.is_none() {
            Redraw::Full
        } else {
            state.pending(self.rendered)
        };
        if pending.is_needed() {
            if !state
                .editor
                .update_preview(&state.settings, &mut self.preview, pending)
            {
                return;
            }
            let frame = self.preview.frame();
            self.texture = Some(Texture::new_with_data(
                context.gfx.inner_graphics(),
                frame.size(),
                wgpu::TextureFormat::Rgba8UnormSrgb,
                wgpu::TextureUsages::TEXTURE_BINDING,
                wgpu::FilterMode::Nearest,
                frame.as_bytes(),
            ));
            self.rendered = Some((state.generation, state.overlay_generation));
        }

        if let Some(texture) = &self.texture {
            let scaled_size = self.preview.frame().size().into_signed() * state.settings.zoom.get();
            context
                .gfx
                .draw_texture(texture, Rect::new(Point::ZERO, scaled_size));
        }
    }

    fn mouse_down(
        &mut self,
        location: Point<Px>,
        _device_id: DeviceId,
        button: MouseButton,
        context: &mut EventContext<'_>,
    ) -> EventHandling {
        if button != MouseButton::Left {
            return IGNORED;
        }
        self.pointer_event(context, |editor, settings| {
            Redraw::from(editor.pointer_down(canvas_point(location), settings))
        });
        HANDLED
    }

    fn mouse_drag(
        &mut self,
        location: Point<Px>,
        _device_id: DeviceId,
        _button: MouseButton,
        context: &mut EventContext<'_>,
    ) {
        self.pointer_event(context, |editor, settings| {
            editor.pointer_move(canvas_point(location), settings)
        });
    }

    fn mouse_up(
        &mut self,
        _location: Option<Point<Px>>,
        _device_id: DeviceId,
        _button: MouseButton,
        context: &mut EventContext<'_>,
    ) {
        self.pointer_event(context, |editor, _| Redraw::from(editor.pointer_up()));
    }

    fn hit_test(&mut self, _location: Point<Px>, _context: &mut EventContext<'_>) -> bool {
        true
    }

    fn hover(
        &mut self,
        _location: Point<Px>,
        _context: &mut EventContext<'_>,
    ) -> Option<CursorIcon> {
        let state = self.state.lock();
        state
            .settings
            .tool
            .paints_mask()
            .then_some(CursorIcon::Crosshair)
    }

    fn unhover(&mut self, context: &mut EventContext<'_>) {
        self.pointer_event(context, |editor, _| Redraw::from(editor.pointer_leave()));
    }
}

/// Mask color swatches above a read-out of the tool settings and layers.
#[derive(Debug)]
struct Sidebar {
    data: Dynamic<EditState>,
    swatch_size: Lp,
}

impl Sidebar {
    fn new(data: Dynamic<EditState>) -> Self {
        Self {
            data,
            swatch_size: Lp::ZERO,
        }
    }

    fn status_lines(state: &EditState) -> Vec<String> {
        let settings = &state.settings;
        let history = state.editor.history();
        let mut lines = vec![
            format!("Tool: {:?}", settings.tool),
            format!("Shape: {:?}", settings.shape),
            format!("Size: {}", settings.brush_size()),
            format!("Feather: {}", settings.feather()),
            format!("Color: {}", settings.color.name()),
            format!("Zoom: {:.0}%", settings.zoom.get() * 100.),
            format!(
                "History: {}/{}{}{}",
                history.current_index() + 1,
                history.len(),
                if history.can_undo() { " undo" } else { "" },
                if history.can_redo() { " redo" } else { "" },
            ),
            String::new(),
        ];
        let selected = state.editor.selected();
        for (index, layer) in state.editor.layers().iter().enumerate().rev() {
            lines.push(format!(
                "{}{} {}{:.0}%",
                if selected == Some(index) { "> " } else { "  " },
                layer.name,
                if layer.visible { "" } else { "(hidden) " },
                layer.opacity * 100.,
            ));
        }
        lines
    }
}

impl Widget for Sidebar {
    fn redraw(&mut self, context: &mut GraphicsContext<'_, '_, '_, '_>) {
        self.data.redraw_when_changed(context);

        let state = self.data.lock();
        let lp_wide = context.gfx.size().width.into_lp(context.gfx.scale());
        self.swatch_size = lp_wide / MaskColor::ALL.len() as i32;

        let outline = context.theme().surface.outline;
        let mut x = Lp::ZERO;
        for (index, mask_color) in MaskColor::ALL.into_iter().enumerate() {
            let swatch_rect = Rect::new(Point::new(x, Lp::ZERO), Size::squared(self.swatch_size));
            let midpoint = swatch_rect.origin + swatch_rect.size / 2;
            x += self.swatch_size;

            let color = mask_color.color();
            context
                .gfx
                .draw_shape(&Shape::filled_rect(swatch_rect, color));
            let text_color = color.most_contrasting(&[Color::WHITE, Color::BLACK]);
            context.gfx.draw_text(
                Text::new(&format!("{}", index + 1), text_color)
                    .origin(TextOrigin::Center)
                    .translate_by(midpoint),
            );

            if mask_color == state.settings.color {
                let outline_width = Lp::mm(1);
                context.gfx.draw_shape(&Shape::stroked_rect(
                    swatch_rect.inset(outline_width / 2),
                    StrokeOptions::lp_wide(outline_width).colored(outline),
                ));
            }
        }

        let text_color = context.theme().surface.on_color;
        let line_height = Lp::points(18);
        let mut y = self.swatch_size + Lp::points(8);
        for line in Self::status_lines(&state) {
            context.gfx.draw_text(
                Text::new(&line, text_color)
                    .origin(TextOrigin::TopLeft)
                    .translate_by(Point::new(Lp::points(6), y)),
            );
            y += line_height;
        }
    }

    fn mouse_down(
        &mut self,
        location: Point<Px>,
        _device_id: DeviceId,
        _button: MouseButton,
        context: &mut EventContext<'_>,
    ) -> EventHandling {
        if self.swatch_size <= Lp::ZERO {
            return IGNORED;
        }
        let location = location.into_lp(context.kludgine.scale()) / self.swatch_size;
        let (Ok(row), Ok(column)) = (
            usize::try_from(location.y.get()),
            usize::try_from(location.x.get()),
        ) else {
            return IGNORED;
        };
        let Some(color) = MaskColor::ALL.get(column).filter(|_| row == 0) else {
            return IGNORED;
        };

        if self.data.lock().apply(Action::Color(*color)) {
            context.set_needs_redraw();
        }
        HANDLED
    }

    fn hit_test(&mut self, _location: Point<Px>, _context: &mut EventContext<'_>) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use cushy::figures::units::UPx;
    use laminate_core::settings::MAX_FEATHER;

    use super::*;

    fn state() -> EditState {
        let mut editor = Editor::new();
        editor.load_base_image(RasterBuffer::new(Size::new(UPx::new(10), UPx::new(10))));
        editor.add_layer_image(RasterBuffer::new(Size::new(UPx::new(4), UPx::new(4))));
        EditState {
            editor,
            settings: ToolSettings::default(),
            generation: 0,
            overlay_generation: 0,
        }
    }

    #[test]
    fn key_bindings() {
        assert_eq!(Action::from_key("b", false), Some(Action::Tool(Tool::Brush)));
        assert_eq!(Action::from_key("z", true), Some(Action::Undo));
        assert_eq!(Action::from_key("Z", true), Some(Action::Redo));
        assert_eq!(Action::from_key("z", false), None);
        assert_eq!(Action::from_key("b", true), None);
        assert_eq!(
            Action::from_key("6", false),
            Some(Action::Color(MaskColor::Yellow))
        );
        assert_eq!(Action::from_key("7", false), None);
        assert_eq!(Action::from_key("0", false), Some(Action::ActualSize));
    }

    #[test]
    fn settings_actions_clamp() {
        let mut state = state();
        for _ in 0..20 {
            state.apply(Action::Feather(FEATHER_STEP));
        }
        assert_eq!(state.settings.feather(), MAX_FEATHER);
        assert!(state.apply(Action::ZoomIn));
        assert_eq!(state.settings.zoom.get(), 1.1);
        assert_eq!(state.generation, 21);
    }

    #[test]
    fn layer_actions_commit() {
        let mut state = state();
        assert!(state.apply(Action::ToggleVisible));
        assert!(!state.editor.layers()[1].visible);
        assert!(state.apply(Action::Opacity(-0.5)));
        assert_eq!(state.editor.history().len(), 4);

        assert!(state.apply(Action::NextLayer));
        assert_eq!(state.editor.selected(), Some(0));
        assert!(state.apply(Action::Undo));
        assert!(state.apply(Action::DeleteLayer));
        assert_eq!(state.editor.layers().len(), 1);
    }

    #[test]
    fn status_lists_layers_top_first() {
        let state = state();
        let lines = Sidebar::status_lines(&state);
        let layers = &lines[lines.len() - 2..];
        assert_eq!(layers[0], "> Layer 1 100%");
        assert_eq!(layers[1], "  Base image 100%");
    }

    #[test]
    fn stroke_moves_stay_on_the_overlay() {
        let mut state = state();
        state.settings.tool = Tool::Brush;
        let rendered = Some((state.generation, state.overlay_generation));
        assert_eq!(state.pending(rendered), Redraw::Nothing);

        state.invalidate(Redraw::Overlay);
        assert_eq!(state.pending(rendered), Redraw::Overlay);
        state.invalidate(Redraw::Full);
        assert_eq!(state.pending(rendered), Redraw::Full);
        assert_eq!(state.pending(None), Redraw::Full);
    }
}
