use glam::DVec2;

use super::color::ColorMap;
use super::{Decorator, RenderContext, Stage};
use crate::diagnostics::Diagnostics;
use crate::export::{Canvas, Style, TextSpec};
use crate::geometry::fmt_num;
use crate::tree::Tree;

/// Marks internal nodes according to their support value.
pub struct BootstrapDecorator {
    map: ColorMap,
    /// Default marker radius in pixels.
    node_radius: f64,
    show_labels: bool,
    ctx: RenderContext,
}

impl BootstrapDecorator {
    pub fn new(map: ColorMap, node_radius: f64, show_labels: bool, ctx: RenderContext) -> Self {
        Self {
            map,
            node_radius,
            show_labels,
            ctx,
        }
    }

    fn render_legend(&self, canvas: &mut dyn Canvas) {
        let stops = self.map.discrete_stops();
        if stops.is_empty() {
            return;
        }

        let legend_radius = 2.0 * self.node_radius;
        let legend_step = 4.0 * legend_radius;
        let x = 0.1 * self.ctx.inch;
        let mut y = self.ctx.canvas_size.y - self.ctx.inch - legend_step * stops.len() as f64;

        canvas.begin_group("bootstrap_legend");
        for (index, stop) in stops.iter().enumerate() {
            canvas.circle(
                DVec2::new(x, y),
                legend_radius,
                Style::fill(stop.color.clone())
                    .with_stroke("black", 1.0)
                    .with_id(format!("bootstrap_legend_symbol_{index}")),
            );
            canvas.text(
                TextSpec::new(
                    DVec2::new(x + 1.5 * legend_radius, y + 0.35 * self.ctx.font_size),
                    format!(">{}%", fmt_num(stop.value)),
                    self.ctx.font_size,
                    "black",
                )
                .id(format!("bootstrap_legend_label_{index}")),
            );
            y += legend_step;
        }
        canvas.end_group();
    }
}

impl Decorator for BootstrapDecorator {
    fn name(&self) -> &'static str {
        "bootstrap support"
    }

    fn stage(&self) -> Stage {
        Stage::Bootstrap
    }

    fn render(&self, tree: &Tree, canvas: &mut dyn Canvas, _diag: &mut Diagnostics) {
        canvas.begin_group("bootstrap_node");
        for id in tree.postorder() {
            let node = tree.node(id);
            if node.is_collapsed {
                continue;
            }
            let Some(support) = node.support else {
                continue;
            };
            let Some(mark) = self.map.lookup(support) else {
                continue;
            };

            let radius = mark.radius.unwrap_or(self.node_radius);
            canvas.circle(
                node.pos,
                radius,
                Style::fill(mark.color)
                    .with_stroke("black", 1.0)
                    .with_id(format!("support_{}", fmt_num(support))),
            );

            if self.show_labels {
                let font_size = 0.5 * self.ctx.font_size;
                canvas.text(TextSpec::new(
                    node.pos + DVec2::new(1.5 * radius, 0.35 * font_size),
                    fmt_num(support),
                    font_size,
                    "black",
                ));
            }
        }
        canvas.end_group();

        self.render_legend(canvas);
    }
}
