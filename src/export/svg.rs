use std::path::Path;

use svg::node::element::{Circle, Group, Line, Path as SvgPath, Polygon, Rectangle, Text};
use svg::Document;

use super::{Canvas, Primitive, Style, TextSpec};
use crate::error::DrawError;
use crate::geometry::{fmt_num, fmt_points};

/// Canvas backed by an in-memory `svg::Document`.
pub struct SvgCanvas {
    document: Document,
    open: Vec<Group>,
}

impl SvgCanvas {
    /// Create a `width` x `height` document with a white background.
    pub fn new(width: f64, height: f64) -> Self {
        let background = Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", "white");

        let document = Document::new()
            .set("width", fmt_num(width))
            .set("height", fmt_num(height))
            .set("viewBox", (0, 0, width.round() as i32, height.round() as i32))
            .add(background);

        Self {
            document,
            open: Vec::new(),
        }
    }

    /// Close any group left open and return the finished document.
    pub fn finish(mut self) -> Document {
        while !self.open.is_empty() {
            self.end_group();
        }
        self.document
    }

    pub fn save(self, path: &Path) -> Result<(), DrawError> {
        let document = self.finish();
        svg::save(path, &document)
            .map_err(|e| DrawError::Save(format!("{}: {}", path.display(), e)))
    }

    pub fn into_string(self) -> String {
        self.finish().to_string()
    }

    fn push<T>(&mut self, node: T)
    where
        T: Into<Box<dyn svg::Node>>,
    {
        match self.open.pop() {
            Some(group) => self.open.push(group.add(node)),
            None => {
                let document = std::mem::replace(&mut self.document, Document::new());
                self.document = document.add(node);
            }
        }
    }
}

/// SVG attributes for a style. Fill and stroke default to `none`.
fn style_attributes(style: &Style) -> Vec<(&'static str, String)> {
    let mut attrs = vec![(
        "fill",
        style.fill.clone().unwrap_or_else(|| "none".to_string()),
    )];
    if let Some(opacity) = style.fill_opacity {
        attrs.push(("fill-opacity", fmt_num(opacity)));
    }
    match &style.stroke {
        Some(color) => {
            attrs.push(("stroke", color.clone()));
            attrs.push(("stroke-width", fmt_num(style.stroke_width)));
        }
        None => attrs.push(("stroke", "none".to_string())),
    }
    if let Some(id) = &style.id {
        attrs.push(("id", id.clone()));
    }
    attrs
}

macro_rules! apply_style {
    ($element:expr, $style:expr) => {{
        let mut element = $element;
        for (name, value) in style_attributes($style) {
            element = element.set(name, value);
        }
        element
    }};
}

fn text_element(spec: &TextSpec) -> Text {
    let text_content = svg::node::Text::new(spec.text.clone());
    let mut text = Text::new("")
        .set("x", fmt_num(spec.pos.x))
        .set("y", fmt_num(spec.pos.y))
        .set("font-size", fmt_num(spec.font_size))
        .set("fill", spec.color.clone())
        .set("text-anchor", spec.anchor.as_str());

    if spec.rotation != 0.0 {
        text = text.set(
            "transform",
            format!(
                "rotate({} {} {})",
                fmt_num(spec.rotation),
                fmt_num(spec.rotation_center.x),
                fmt_num(spec.rotation_center.y)
            ),
        );
    }
    if let Some(id) = &spec.id {
        text = text.set("id", id.clone());
    }
    text.add(text_content)
}

impl Canvas for SvgCanvas {
    fn begin_group(&mut self, id: &str) {
        self.open.push(Group::new().set("id", id));
    }

    fn end_group(&mut self) {
        let Some(group) = self.open.pop() else {
            return;
        };
        self.push(group);
    }

    fn draw(&mut self, primitive: Primitive) {
        match primitive {
            Primitive::Line { from, to, style } => {
                let line = Line::new()
                    .set("x1", fmt_num(from.x))
                    .set("y1", fmt_num(from.y))
                    .set("x2", fmt_num(to.x))
                    .set("y2", fmt_num(to.y));
                self.push(apply_style!(line, &style));
            }
            Primitive::Path { path, style } => {
                let mut element = SvgPath::new().set("d", path.to_svg_data());
                if path.fill_rule != Default::default() {
                    element = element.set("fill-rule", path.fill_rule.as_str());
                }
                self.push(apply_style!(element, &style));
            }
            Primitive::Polygon { points, style } => {
                let polygon = Polygon::new().set("points", fmt_points(&points));
                self.push(apply_style!(polygon, &style));
            }
            Primitive::Circle {
                center,
                radius,
                style,
            } => {
                let circle = Circle::new()
                    .set("cx", fmt_num(center.x))
                    .set("cy", fmt_num(center.y))
                    .set("r", fmt_num(radius));
                self.push(apply_style!(circle, &style));
            }
            Primitive::Rect {
                origin,
                size,
                style,
            } => {
                let rect = Rectangle::new()
                    .set("x", fmt_num(origin.x))
                    .set("y", fmt_num(origin.y))
                    .set("width", fmt_num(size.x))
                    .set("height", fmt_num(size.y));
                self.push(apply_style!(rect, &style));
            }
            Primitive::Text(spec) => {
                let text = text_element(&spec);
                self.push(text);
            }
        }
    }
}
