//! Drawing surface used by the tree renderer and the decorators.

use glam::DVec2;

use crate::geometry::Path;

#[cfg(test)]
pub mod recording;
pub mod svg;

pub use self::svg::SvgCanvas;

/// Paint attributes of a primitive. Absent fill or stroke renders as `none`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub fill: Option<String>,
    pub fill_opacity: Option<f64>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub id: Option<String>,
}

impl Style {
    pub fn stroke(color: impl Into<String>, width: f64) -> Self {
        Self {
            stroke: Some(color.into()),
            stroke_width: width,
            ..Self::default()
        }
    }

    pub fn fill(color: impl Into<String>) -> Self {
        Self {
            fill: Some(color.into()),
            ..Self::default()
        }
    }

    pub fn with_stroke(mut self, color: impl Into<String>, width: f64) -> Self {
        self.stroke = Some(color.into());
        self.stroke_width = width;
        self
    }

    pub fn with_fill(mut self, color: impl Into<String>) -> Self {
        self.fill = Some(color.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.fill_opacity = Some(opacity);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    pub pos: DVec2,
    pub text: String,
    pub font_size: f64,
    pub color: String,
    pub anchor: TextAnchor,
    /// Degrees, clockwise, about `rotation_center`.
    pub rotation: f64,
    pub rotation_center: DVec2,
    pub id: Option<String>,
}

impl TextSpec {
    pub fn new(pos: DVec2, text: impl Into<String>, font_size: f64, color: impl Into<String>) -> Self {
        Self {
            pos,
            text: text.into(),
            font_size,
            color: color.into(),
            anchor: TextAnchor::Start,
            rotation: 0.0,
            rotation_center: pos,
            id: None,
        }
    }

    pub fn anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line { from: DVec2, to: DVec2, style: Style },
    Path { path: Path, style: Style },
    Polygon { points: Vec<DVec2>, style: Style },
    Circle { center: DVec2, radius: f64, style: Style },
    Rect { origin: DVec2, size: DVec2, style: Style },
    Text(TextSpec),
}

/// Sink for drawing primitives. Primitives are kept in emission order and
/// grouped by the innermost open group.
pub trait Canvas {
    fn begin_group(&mut self, id: &str);

    fn end_group(&mut self);

    fn draw(&mut self, primitive: Primitive);

    fn line(&mut self, from: DVec2, to: DVec2, style: Style) {
        self.draw(Primitive::Line { from, to, style });
    }

    fn path(&mut self, path: Path, style: Style) {
        self.draw(Primitive::Path { path, style });
    }

    fn polygon(&mut self, points: Vec<DVec2>, style: Style) {
        self.draw(Primitive::Polygon { points, style });
    }

    fn circle(&mut self, center: DVec2, radius: f64, style: Style) {
        self.draw(Primitive::Circle {
            center,
            radius,
            style,
        });
    }

    fn rect(&mut self, origin: DVec2, size: DVec2, style: Style) {
        self.draw(Primitive::Rect {
            origin,
            size,
            style,
        });
    }

    fn text(&mut self, spec: TextSpec) {
        self.draw(Primitive::Text(spec));
    }
}
