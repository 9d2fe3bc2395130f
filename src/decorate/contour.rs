use std::str::FromStr;

use glam::DVec2;

use super::{Decorator, RenderContext, Stage};
use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;
use crate::export::{Canvas, Style, TextSpec};
use crate::geometry::{donut, fmt_num, interpolate_crossing, polar, Path};
use crate::tree::{LayoutType, NodeId, Tree};

const COMPONENT: &str = "ContourProps";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContourMethod {
    #[default]
    ByFile,
    MeanTipBranchLength,
    Concentric,
}

impl FromStr for ContourMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BY_FILE" => Ok(ContourMethod::ByFile),
            "MEAN_TIP_BRANCH_LENGTH" => Ok(ContourMethod::MeanTipBranchLength),
            "CONCENTRIC" => Ok(ContourMethod::Concentric),
            _ => Err(ConfigError::invalid_value(COMPONENT, "contour_method", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContourBand {
    pub outer: f64,
    pub inner: f64,
    pub color: String,
    pub opacity: f64,
    pub label: String,
}

/// A point where a lineage first crosses a threshold, and the node whose
/// branch it lies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub point: DVec2,
    pub node: NodeId,
}

/// Draws bands bounded by where a per-node value crosses two thresholds.
pub struct ContourDecorator {
    method: ContourMethod,
    bands: Vec<ContourBand>,
    stroke_width: f64,
    /// Identifier and value pairs for [`ContourMethod::ByFile`].
    values: Vec<(String, f64)>,
    ctx: RenderContext,
}

impl ContourDecorator {
    pub fn new(
        method: ContourMethod,
        bands: Vec<ContourBand>,
        stroke_width: f64,
        values: Vec<(String, f64)>,
        ctx: RenderContext,
    ) -> Self {
        Self {
            method,
            bands,
            stroke_width,
            values,
            ctx,
        }
    }

    fn render_value_contours(&self, tree: &Tree, canvas: &mut dyn Canvas, diag: &mut Diagnostics) {
        let Some(descending) = contour_direction(tree) else {
            diag.warn(COMPONENT, "no node carries a contour value; contours skipped");
            return;
        };

        for (index, band) in self.bands.iter().enumerate() {
            let outer = crossings(tree, band.outer, band.outer, descending);
            let inner = crossings(tree, band.inner, band.inner, descending);
            let (Some(first_outer), Some(first_inner)) = (outer.first(), inner.first()) else {
                diag.warn(
                    COMPONENT,
                    format!("band '{}' does not cross the tree; skipped", band.label),
                );
                continue;
            };

            let mut path = Path::new().even_odd();
            path.move_to(first_outer.point);
            for crossing in &outer[1..] {
                path.line_to(crossing.point);
            }
            for crossing in inner.iter().rev() {
                path.line_to(crossing.point);
            }
            path.line_to(closing_point(tree, first_outer, first_inner));
            path.line_to(first_outer.point);
            path.close();

            canvas.path(
                path,
                Style::fill(band.color.clone())
                    .with_opacity(band.opacity)
                    .with_stroke(band.color.clone(), self.stroke_width)
                    .with_id(format!("contour_{index}")),
            );
        }
    }

    fn render_concentric(&self, tree: &Tree, canvas: &mut dyn Canvas) {
        let extent = tree.depth_extent();
        for (index, band) in self.bands.iter().enumerate() {
            let style = Style::fill(band.color.clone())
                .with_opacity(band.opacity)
                .with_id(format!("contour_{index}"));
            match tree.layout_type {
                LayoutType::Circular => {
                    canvas.path(
                        donut(tree.origin, band.inner * extent, band.outer * extent),
                        style,
                    );
                }
                LayoutType::Rectangular => {
                    let x0 = tree.origin.x + band.inner.min(band.outer) * extent;
                    let x1 = tree.origin.x + band.inner.max(band.outer) * extent;
                    canvas.rect(
                        DVec2::new(x0, tree.origin.y),
                        DVec2::new(x1 - x0, tree.height),
                        style,
                    );
                }
            }
        }
    }

    fn render_legend(&self, tree: &Tree, canvas: &mut dyn Canvas) {
        let legend_radius = 2.0 * 0.005 * tree.depth_extent();
        let legend_step = 4.0 * legend_radius;
        let x = 0.1 * self.ctx.inch;
        let mut y = 0.1 * self.ctx.inch;

        canvas.begin_group("contour_legend");
        for (index, band) in self.bands.iter().enumerate() {
            canvas.circle(
                DVec2::new(x, y),
                legend_radius,
                Style::fill(band.color.clone())
                    .with_opacity(band.opacity)
                    .with_stroke("black", 1.0)
                    .with_id(format!("contour_legend_symbol_{index}")),
            );
            canvas.text(
                TextSpec::new(
                    DVec2::new(x + 1.5 * legend_radius, y + 0.35 * self.ctx.font_size),
                    format!(
                        "{}: {} to {}",
                        band.label,
                        fmt_num(band.inner),
                        fmt_num(band.outer)
                    ),
                    self.ctx.font_size,
                    "black",
                )
                .id(format!("contour_legend_label_{index}")),
            );
            y += legend_step;
        }
        canvas.end_group();
    }
}

/// `true` when values decrease from the root towards the leaves. Compares the
/// root with the first leaf that carries a value.
fn contour_direction(tree: &Tree) -> Option<bool> {
    let root_value = tree.root().contour?;
    let leaf_value = tree.leaves().find_map(|leaf| tree.node(leaf).contour)?;
    Some(root_value > leaf_value)
}

/// Walk down from the root and stop on each lineage at the first node past
/// `threshold`; the crossing for `draw_threshold` is interpolated on that
/// node's branch. Nodes without a value end the walk along their lineage.
pub fn crossings(tree: &Tree, threshold: f64, draw_threshold: f64, descending: bool) -> Vec<Crossing> {
    let mut found = Vec::new();
    let mut stack = vec![tree.root];
    while let Some(id) = stack.pop() {
        let node = tree.node(id);
        let Some(value) = node.contour else {
            continue;
        };

        let before_threshold = if descending {
            value > threshold
        } else {
            value < threshold
        };
        if node.is_root() || before_threshold {
            stack.extend(node.children.iter().rev().copied());
            continue;
        }

        let parent_value = node
            .parent
            .and_then(|p| tree.node(p).contour)
            .unwrap_or(value);
        let t = interpolate_crossing(value, parent_value, draw_threshold);
        found.push(Crossing {
            point: node.pos + t * (node.corner - node.pos),
            node: id,
        });
    }
    found
}

/// Extra vertex joining the inner ring back to the outer ring: the inner
/// ring's depth at the outer ring's starting angle (or row).
fn closing_point(tree: &Tree, outer: &Crossing, inner: &Crossing) -> DVec2 {
    let outer_node = tree.node(outer.node);
    let inner_node = tree.node(inner.node);
    match tree.layout_type {
        LayoutType::Circular => polar(tree.origin, inner_node.rel_depth, outer_node.angle),
        LayoutType::Rectangular => DVec2::new(inner_node.pos.x, outer_node.pos.y),
    }
}

impl Decorator for ContourDecorator {
    fn name(&self) -> &'static str {
        "contours"
    }

    fn stage(&self) -> Stage {
        Stage::Contour
    }

    fn decorate(&mut self, tree: &mut Tree, diag: &mut Diagnostics) {
        match self.method {
            ContourMethod::ByFile => {
                for node in &mut tree.nodes {
                    node.contour = None;
                }
                for (identifier, value) in &self.values {
                    match tree.find_by_label(tree.root, identifier) {
                        Some(id) => tree.node_mut(id).contour = Some(*value),
                        None => diag.unresolved(COMPONENT, identifier),
                    }
                }
            }
            ContourMethod::MeanTipBranchLength => {
                for id in 0..tree.len() {
                    let mean = tree.mean_tip_distance(id);
                    tree.node_mut(id).contour = Some(mean);
                }
            }
            ContourMethod::Concentric => {}
        }
    }

    fn render(&self, tree: &Tree, canvas: &mut dyn Canvas, diag: &mut Diagnostics) {
        canvas.begin_group("contour");
        match self.method {
            ContourMethod::ByFile | ContourMethod::MeanTipBranchLength => {
                self.render_value_contours(tree, canvas, diag)
            }
            ContourMethod::Concentric => self.render_concentric(tree, canvas),
        }
        canvas.end_group();

        self.render_legend(tree, canvas);
    }
}
