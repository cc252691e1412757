use horizon_core::{ColorStop, Extent, Glow, RadialGradient, Rgba, Surface, Vec2};
use serde::{Deserialize, Serialize};

/// One recorded call against a [`Surface`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawCommand {
    FillRect { x: f32, y: f32, width: f32, height: f32, color: Rgba },
    FillCircle { x: f32, y: f32, radius: f32, color: Rgba },
    StrokeCircle { x: f32, y: f32, radius: f32, color: Rgba, line_width: f32 },
    RadialGradient { x: f32, y: f32, radius: f32, stops: Vec<ColorStop> },
    SetGlow { glow: Option<Glow> },
}

impl DrawCommand {
    /// Replay this command onto another surface.
    pub fn apply(&self, surface: &mut dyn Surface) {
        match self {
            DrawCommand::FillRect { x, y, width, height, color } => {
                surface.fill_rect(Vec2::new(*x, *y), Extent::new(*width, *height), *color)
            }
            DrawCommand::FillCircle { x, y, radius, color } => {
                surface.fill_circle(Vec2::new(*x, *y), *radius, *color)
            }
            DrawCommand::StrokeCircle { x, y, radius, color, line_width } => {
                surface.stroke_circle(Vec2::new(*x, *y), *radius, *color, *line_width)
            }
            DrawCommand::RadialGradient { x, y, radius, stops } => {
                let gradient = stops
                    .iter()
                    .fold(RadialGradient::new(), |g, stop| g.with_stop(stop.offset, stop.color));
                surface.fill_radial_gradient(Vec2::new(*x, *y), *radius, &gradient)
            }
            DrawCommand::SetGlow { glow } => surface.set_glow(*glow),
        }
    }
}

/// A [`Surface`] that records draw calls instead of painting them.
///
/// The recorded list is what gets shipped to a front end each frame.
#[derive(Debug, Clone)]
pub struct DrawList {
    extent: Extent,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(extent: Extent) -> Self {
        DrawList { extent, commands: Vec::new() }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Hand over the recorded commands, leaving the list empty for the next frame.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn resize(&mut self, extent: Extent) {
        self.extent = extent;
    }

    pub fn replay(&self, surface: &mut dyn Surface) {
        for command in &self.commands {
            command.apply(surface);
        }
    }
}

impl Surface for DrawList {
    fn size(&self) -> Extent {
        self.extent
    }

    fn fill_rect(&mut self, origin: Vec2, extent: Extent, color: Rgba) {
        self.commands.push(DrawCommand::FillRect {
            x: origin.x,
            y: origin.y,
            width: extent.width,
            height: extent.height,
            color,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle { x: center.x, y: center.y, radius, color });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, line_width: f32) {
        self.commands.push(DrawCommand::StrokeCircle {
            x: center.x,
            y: center.y,
            radius,
            color,
            line_width,
        });
    }

    fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, gradient: &RadialGradient) {
        self.commands.push(DrawCommand::RadialGradient {
            x: center.x,
            y: center.y,
            radius,
            stops: gradient.stops().to_vec(),
        });
    }

    fn set_glow(&mut self, glow: Option<Glow>) {
        self.commands.push(DrawCommand::SetGlow { glow });
    }
}
