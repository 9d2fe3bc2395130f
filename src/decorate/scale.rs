//! Scale bar in the lower-left corner and optional scale lines across the tree.

use glam::DVec2;
use log::info;

use super::RenderContext;
use crate::export::{Canvas, Style, TextAnchor, TextSpec};
use crate::geometry::project_onto_line;
use crate::tree::{LayoutType, Tree};

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleStyle {
    pub show_scale_bar: bool,
    pub bar_width: f64,
    pub font_size: f64,
    pub show_scale_lines: bool,
    pub line_width: f64,
}

impl Default for ScaleStyle {
    fn default() -> Self {
        Self {
            show_scale_bar: false,
            bar_width: 1.0,
            font_size: 8.0,
            show_scale_lines: false,
            line_width: 0.5,
        }
    }
}

const SCALE_LINE_COLORS: [&str; 2] = ["rgb(64,64,64)", "blue"];

/// A tenth of the deepest leaf distance, rounded to one significant figure.
pub fn scale_width_bl(deepest: f64) -> f64 {
    let target = deepest / 10.0;
    if target <= 0.0 || !target.is_finite() {
        return 0.0;
    }
    let exponent = target.log10().floor() as i32;
    if exponent < 0 {
        let factor = 10f64.powi(-exponent);
        (target * factor).round() / factor
    } else {
        let factor = 10f64.powi(exponent);
        (target / factor).round() * factor
    }
}

fn scale_label(width_bl: f64) -> String {
    if width_bl > 1.0 {
        format!("{}", width_bl.trunc() as i64)
    } else {
        let decimals = (-width_bl.log10().floor()).max(0.0) as usize;
        format!("{width_bl:.decimals$}")
    }
}

/// Scale bar width in branch-length units and pixels, or `None` for a tree
/// without depth.
fn bar_size(tree: &Tree) -> Option<(f64, f64)> {
    let width_bl = scale_width_bl(tree.deepest_node);
    if width_bl <= 0.0 {
        return None;
    }
    Some((width_bl, tree.scale_depth(width_bl)))
}

pub fn draw_scale_bar(tree: &Tree, style: &ScaleStyle, ctx: &RenderContext, canvas: &mut dyn Canvas) {
    if !style.show_scale_bar {
        return;
    }
    let Some((width_bl, width)) = bar_size(tree) else {
        return;
    };
    info!("Rendering scale bar.");

    let start = DVec2::new(0.1 * ctx.inch, ctx.canvas_size.y - 0.1 * ctx.inch);
    let end = start + DVec2::new(width, 0.0);
    let tick = DVec2::new(0.0, 0.05 * width);

    canvas.begin_group("scale");
    canvas.line(
        start,
        end,
        Style::stroke("black", style.bar_width).with_id("scale-bar"),
    );
    canvas.line(
        start - tick,
        start + tick,
        Style::stroke("black", style.bar_width).with_id("scale-left-tick"),
    );
    canvas.line(
        end - tick,
        end + tick,
        Style::stroke("black", style.bar_width).with_id("scale-right-tick"),
    );
    canvas.text(
        TextSpec::new(
            start + DVec2::new(0.5 * width, 0.0) - tick,
            scale_label(width_bl),
            style.font_size,
            "black",
        )
        .anchor(TextAnchor::Middle)
        .id("scale-label"),
    );
    canvas.end_group();
}

/// Lines at every multiple of the scale bar width, alternating in color.
pub fn draw_scale_lines(tree: &Tree, style: &ScaleStyle, canvas: &mut dyn Canvas) {
    if !style.show_scale_lines {
        return;
    }
    let Some((_, step)) = bar_size(tree) else {
        return;
    };

    canvas.begin_group("scale_lines");
    let mut index = 0;
    let mut radius = step;
    while radius < tree.width {
        let line_style = Style::stroke(SCALE_LINE_COLORS[index % 2], style.line_width)
            .with_id(format!("scale_line_{index}"));
        match tree.layout_type {
            LayoutType::Circular => canvas.circle(tree.origin, radius, line_style),
            LayoutType::Rectangular => {
                // drop the tree's top and bottom corners onto the vertical at this depth
                let x = tree.origin.x + radius;
                let (p, q) = (DVec2::new(x, 0.0), DVec2::new(x, 1.0));
                let top = project_onto_line(p, q, tree.origin);
                let bottom = project_onto_line(p, q, tree.origin + DVec2::new(tree.width, tree.height));
                canvas.line(top, bottom, line_style);
            }
        }
        index += 1;
        radius = step * (index + 1) as f64;
    }
    canvas.end_group();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::testing;
    use crate::export::recording::RecordingCanvas;
    use crate::export::Primitive;
    use crate::tree::fixtures::*;

    #[test]
    fn bar_width_keeps_one_significant_figure() {
        assert_eq!(scale_width_bl(3.0), 0.3);
        assert_eq!(scale_width_bl(0.47), 0.05);
        assert_eq!(scale_width_bl(123.0), 10.0);
        assert_eq!(scale_width_bl(0.0), 0.0);
    }

    #[test]
    fn labels_follow_magnitude() {
        assert_eq!(scale_label(20.0), "20");
        assert_eq!(scale_label(0.3), "0.3");
        assert_eq!(scale_label(0.05), "0.05");
        assert_eq!(scale_label(1.0), "1");
    }

    #[test]
    fn scale_bar_sits_in_lower_left_corner() {
        // deepest leaf at distance 2, bar is 0.2 long
        let tree = testing::rectangular(balanced_four());
        let style = ScaleStyle {
            show_scale_bar: true,
            ..ScaleStyle::default()
        };
        let mut canvas = RecordingCanvas::new();
        draw_scale_bar(&tree, &style, &testing::context(), &mut canvas);

        let shapes = canvas.primitives_in("scale");
        assert_eq!(shapes.len(), 4);
        let Primitive::Line { from, to, style } = shapes[0] else {
            panic!("expected bar");
        };
        assert_eq!(*from, DVec2::new(9.0, 351.0));
        assert!((to.x - from.x - 20.0).abs() < 1e-9);
        assert_eq!(style.id.as_deref(), Some("scale-bar"));
        assert_eq!(canvas.texts_in("scale")[0].text, "0.2");
    }

    #[test]
    fn circular_scale_lines_alternate_colors() {
        let tree = testing::circular(balanced_four());
        let style = ScaleStyle {
            show_scale_lines: true,
            ..ScaleStyle::default()
        };
        let mut canvas = RecordingCanvas::new();
        draw_scale_lines(&tree, &style, &mut canvas);

        let strokes: Vec<&str> = canvas
            .primitives_in("scale_lines")
            .into_iter()
            .filter_map(|p| match p {
                Primitive::Circle { style, .. } => style.stroke.as_deref(),
                _ => None,
            })
            .collect();
        // radii 10, 20, ... 90 stay inside the 100 px tree
        assert_eq!(strokes.len(), 9);
        assert_eq!(strokes[0], "rgb(64,64,64)");
        assert_eq!(strokes[1], "blue");
    }

    #[test]
    fn rectangular_scale_lines_span_tree_height() {
        let tree = testing::rectangular(balanced_four());
        let style = ScaleStyle {
            show_scale_lines: true,
            ..ScaleStyle::default()
        };
        let mut canvas = RecordingCanvas::new();
        draw_scale_lines(&tree, &style, &mut canvas);

        let shapes = canvas.primitives_in("scale_lines");
        let Primitive::Line { from, to, .. } = shapes[0] else {
            panic!("expected line");
        };
        assert_eq!(from.x, to.x);
        assert_eq!(from.y, tree.origin.y);
        assert_eq!(to.y, tree.origin.y + tree.height);
    }

    #[test]
    fn hidden_by_default() {
        let tree = testing::rectangular(balanced_four());
        let mut canvas = RecordingCanvas::new();
        draw_scale_bar(&tree, &ScaleStyle::default(), &testing::context(), &mut canvas);
        draw_scale_lines(&tree, &ScaleStyle::default(), &mut canvas);
        assert!(canvas.calls.is_empty());
    }
}
