use std::str::FromStr;

use glam::DVec2;

use super::{Decorator, RenderContext, Stage};
use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;
use crate::export::{Canvas, Style};
use crate::geometry::{percentile, polar, polygon_centroid, wedge, Path};
use crate::rotated_text::{LabelPlacement, RotatedText};
use crate::tree::{LayoutType, NodeId, Tree};

const COMPONENT: &str = "CollapseProps";

/// Glyph drawn in place of a collapsed subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapseShape {
    #[default]
    Wedge,
    Triangle,
}

impl FromStr for CollapseShape {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WEDGE" => Ok(CollapseShape::Wedge),
            "TRIANGLE" => Ok(CollapseShape::Triangle),
            _ => Err(ConfigError::invalid_value(COMPONENT, "display_method", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPosition {
    #[default]
    Internal,
    External,
}

impl FromStr for LabelPosition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INTERNAL" => Ok(LabelPosition::Internal),
            "EXTERNAL" => Ok(LabelPosition::External),
            _ => Err(ConfigError::invalid_value(COMPONENT, "label_position", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedLineage {
    pub identifier: String,
    pub color: String,
    pub opacity: f64,
    pub stroke_width: f64,
    pub stroke_color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollapseStyle {
    pub shape: CollapseShape,
    /// Percentile of leaf distances giving the first side.
    pub branch1_percentile: f64,
    pub branch2_percentile: f64,
    pub show_labels: bool,
    pub label_position: LabelPosition,
    pub show_leaf_count: bool,
    pub font_size: f64,
    pub font_color: String,
}

impl Default for CollapseStyle {
    fn default() -> Self {
        Self {
            shape: CollapseShape::Wedge,
            branch1_percentile: 0.0,
            branch2_percentile: 100.0,
            show_labels: false,
            label_position: LabelPosition::Internal,
            show_leaf_count: false,
            font_size: 8.0,
            font_color: "black".to_string(),
        }
    }
}

/// Look up the collapse root of every requested lineage. Unknown identifiers
/// are recorded and skipped.
pub fn resolve_roots(
    tree: &Tree,
    lineages: &[CollapsedLineage],
    diag: &mut Diagnostics,
) -> Vec<NodeId> {
    lineages
        .iter()
        .filter_map(|lineage| {
            let found = tree.find_by_label(tree.root, &lineage.identifier);
            if found.is_none() {
                diag.unresolved(COMPONENT, &lineage.identifier);
            }
            found
        })
        .collect()
}

/// Outline of one collapsed lineage, before styling.
enum Outline {
    Polygon(Vec<DVec2>),
    Wedge(Path),
}

pub struct CollapsedLineageDecorator {
    style: CollapseStyle,
    lineages: Vec<CollapsedLineage>,
    ctx: RenderContext,
    resolved: Vec<(usize, NodeId)>,
}

impl CollapsedLineageDecorator {
    pub fn new(style: CollapseStyle, lineages: Vec<CollapsedLineage>, ctx: RenderContext) -> Self {
        Self {
            style,
            lineages,
            ctx,
            resolved: Vec::new(),
        }
    }

    /// Far side lengths in pixels.
    fn sides(&self, tree: &Tree, node: NodeId) -> (f64, f64) {
        let distances = tree.leaf_distances(node);
        let b1 = tree.scale_depth(percentile(&distances, self.style.branch1_percentile));
        let b2 = match self.style.shape {
            CollapseShape::Wedge => {
                tree.scale_depth(percentile(&distances, self.style.branch2_percentile))
            }
            CollapseShape::Triangle => 0.0,
        };
        (b1, b2)
    }

    fn outline(&self, tree: &Tree, node_id: NodeId) -> Option<Outline> {
        let node = tree.node(node_id);
        let (lo, hi) = node.collapse_span?;
        let (b1, b2) = self.sides(tree, node_id);

        Some(match tree.layout_type {
            LayoutType::Rectangular => {
                let DVec2 { x, y } = node.pos;
                let half = 0.5 * (hi - lo);
                Outline::Polygon(vec![
                    DVec2::new(x, y + half),
                    DVec2::new(x, y - half),
                    DVec2::new(x + b1, y - half),
                    DVec2::new(x + b2, y + half),
                ])
            }
            LayoutType::Circular => {
                Outline::Wedge(wedge(tree.origin, lo, hi, node.rel_depth, (b1, b2)))
            }
        })
    }

    fn label_text(&self, tree: &Tree, lineage: &CollapsedLineage, node_id: NodeId) -> String {
        let node = tree.node(node_id);
        let name = node
            .taxon
            .clone()
            .unwrap_or_else(|| lineage.identifier.clone());
        if self.style.show_leaf_count {
            format!("{name} [{}]", node.num_leaves)
        } else {
            name
        }
    }

    fn render_labels(&self, tree: &Tree, canvas: &mut dyn Canvas) {
        let pad = 0.01 * self.ctx.inch;

        // External labels line up past the longest glyph.
        let external_x = self
            .resolved
            .iter()
            .map(|&(_, node)| {
                let (b1, b2) = self.sides(tree, node);
                tree.node(node).pos.x + b1.max(b2)
            })
            .fold(f64::MIN, f64::max);

        for &(index, node_id) in &self.resolved {
            let node = tree.node(node_id);
            let Some((lo, hi)) = node.collapse_span else {
                continue;
            };
            let text = self.label_text(tree, &self.lineages[index], node_id);

            let (pos, angle, placement) = match (tree.layout_type, self.style.label_position) {
                (LayoutType::Rectangular, LabelPosition::Internal) => (
                    DVec2::new(node.pos.x + pad, node.pos.y),
                    0.0,
                    LabelPlacement {
                        middle_y: true,
                        ..LabelPlacement::default()
                    },
                ),
                (LayoutType::Rectangular, LabelPosition::External) => (
                    DVec2::new(external_x + pad, node.pos.y),
                    0.0,
                    LabelPlacement {
                        middle_y: true,
                        ..LabelPlacement::default()
                    },
                ),
                (LayoutType::Circular, LabelPosition::Internal) => {
                    let Some(Outline::Wedge(path)) = self.outline(tree, node_id) else {
                        continue;
                    };
                    (
                        polygon_centroid(&path.points()),
                        node.angle,
                        LabelPlacement {
                            middle_x: true,
                            middle_y: true,
                        },
                    )
                }
                (LayoutType::Circular, LabelPosition::External) => {
                    let (b1, b2) = self.sides(tree, node_id);
                    let mid = (lo + 0.5 * (hi - lo).rem_euclid(360.0)).rem_euclid(360.0);
                    (
                        polar(tree.origin, node.rel_depth + b1.max(b2) + pad, mid),
                        mid,
                        LabelPlacement {
                            middle_y: true,
                            ..LabelPlacement::default()
                        },
                    )
                }
            };

            canvas.rotated_text(
                pos,
                angle,
                text,
                self.style.font_size,
                &self.style.font_color,
                placement,
            );
        }
    }
}

impl Decorator for CollapsedLineageDecorator {
    fn name(&self) -> &'static str {
        "collapsed lineages"
    }

    fn stage(&self) -> Stage {
        Stage::Collapsed
    }

    fn decorate(&mut self, tree: &mut Tree, diag: &mut Diagnostics) {
        self.resolved.clear();
        for (index, lineage) in self.lineages.iter().enumerate() {
            match tree.find_by_label(tree.root, &lineage.identifier) {
                Some(node) if tree.node(node).is_collapsed_root => {
                    self.resolved.push((index, node));
                }
                Some(_) => diag.warn(
                    COMPONENT,
                    format!("{} lies inside another collapsed lineage", lineage.identifier),
                ),
                None => diag.unresolved(COMPONENT, &lineage.identifier),
            }
        }
    }

    fn render(&self, tree: &Tree, canvas: &mut dyn Canvas, _diag: &mut Diagnostics) {
        canvas.begin_group("collapsed_lineages");
        for &(index, node) in &self.resolved {
            let lineage = &self.lineages[index];
            let style = Style::fill(lineage.color.clone())
                .with_opacity(lineage.opacity)
                .with_stroke(lineage.stroke_color.clone(), lineage.stroke_width)
                .with_id(format!("collapsed_{}", lineage.identifier.replace(' ', "_")));
            match self.outline(tree, node) {
                Some(Outline::Polygon(points)) => canvas.polygon(points, style),
                Some(Outline::Wedge(path)) => canvas.path(path, style),
                None => {}
            }
        }
        if self.style.show_labels {
            self.render_labels(tree, canvas);
        }
        canvas.end_group();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::testing;
    use crate::export::recording::RecordingCanvas;
    use crate::export::{Primitive, TextAnchor};
    use crate::tree::fixtures::*;
    use crate::tree::layout::{CollapseMethod, CollapseSizing, LayoutEngine, LayoutParams};

    fn big() -> CollapsedLineage {
        CollapsedLineage {
            identifier: "p__Big".to_string(),
            color: "orange".to_string(),
            opacity: 0.5,
            stroke_width: 1.0,
            stroke_color: "black".to_string(),
        }
    }

    fn collapsed_tree(layout_type: LayoutType, diag: &mut Diagnostics) -> Tree {
        let mut tree = uneven_seven();
        let roots = resolve_roots(&tree, &[big()], diag);
        let params = LayoutParams {
            layout_type,
            width: 200.0,
            height: 120.0,
            origin: DVec2::new(40.0, 40.0),
            ..LayoutParams::default()
        };
        LayoutEngine::new(params)
            .with_collapse(
                CollapseSizing {
                    method: CollapseMethod::FixedWidth,
                    scaling: 3.0,
                },
                roots,
            )
            .run(&mut tree)
            .unwrap();
        tree
    }

    fn render(tree: &mut Tree, style: CollapseStyle) -> RecordingCanvas {
        let mut decorator = CollapsedLineageDecorator::new(style, vec![big()], testing::context());
        let mut diag = Diagnostics::new();
        let mut canvas = RecordingCanvas::new();
        decorator.decorate(tree, &mut diag);
        decorator.render(tree, &mut canvas, &mut diag);
        assert!(diag.is_clean());
        canvas
    }

    #[test]
    fn rectangular_quadrilateral_uses_leaf_percentiles() {
        let mut diag = Diagnostics::new();
        let mut tree = collapsed_tree(LayoutType::Rectangular, &mut diag);
        let style = CollapseStyle {
            branch1_percentile: 100.0,
            branch2_percentile: 0.0,
            ..CollapseStyle::default()
        };
        let canvas = render(&mut tree, style);

        let node = tree.find_by_label(tree.root, "p__Big").unwrap();
        let (lo, hi) = tree.node(node).collapse_span.unwrap();
        let pos = tree.node(node).pos;
        let Primitive::Polygon { points, style } = canvas.primitives_in("collapsed_lineages")[0]
        else {
            panic!("expected polygon");
        };
        // leaf distances below p__Big are 1..4, deepest leaf is 5 from the root
        let expected = [
            DVec2::new(pos.x, pos.y + 0.5 * (hi - lo)),
            DVec2::new(pos.x, pos.y - 0.5 * (hi - lo)),
            DVec2::new(pos.x + 160.0, pos.y - 0.5 * (hi - lo)),
            DVec2::new(pos.x + 40.0, pos.y + 0.5 * (hi - lo)),
        ];
        for (got, want) in points.iter().zip(expected) {
            assert!(got.distance(want) < 1e-9, "{got} != {want}");
        }
        assert_eq!(style.fill_opacity, Some(0.5));
        assert_eq!(style.id.as_deref(), Some("collapsed_p__Big"));
    }

    #[test]
    fn triangle_closes_second_side() {
        let mut diag = Diagnostics::new();
        let mut tree = collapsed_tree(LayoutType::Rectangular, &mut diag);
        let style = CollapseStyle {
            shape: CollapseShape::Triangle,
            ..CollapseStyle::default()
        };
        let canvas = render(&mut tree, style);
        let Primitive::Polygon { points, .. } = canvas.primitives_in("collapsed_lineages")[0] else {
            panic!("expected polygon");
        };
        assert_eq!(points[3].x, points[0].x);
    }

    #[test]
    fn circular_wedge_with_external_count_label() {
        let mut diag = Diagnostics::new();
        let mut tree = collapsed_tree(LayoutType::Circular, &mut diag);
        let style = CollapseStyle {
            show_labels: true,
            label_position: LabelPosition::External,
            show_leaf_count: true,
            ..CollapseStyle::default()
        };
        let canvas = render(&mut tree, style);

        let shapes = canvas.primitives_in("collapsed_lineages");
        assert!(matches!(shapes[0], Primitive::Path { .. }));
        let labels = canvas.texts_in("collapsed_lineages");
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text, "p__Big [4]");
    }

    #[test]
    fn internal_label_is_centered_in_rectangular_glyph() {
        let mut diag = Diagnostics::new();
        let mut tree = collapsed_tree(LayoutType::Rectangular, &mut diag);
        let style = CollapseStyle {
            show_labels: true,
            ..CollapseStyle::default()
        };
        let canvas = render(&mut tree, style);
        let label = canvas.texts_in("collapsed_lineages")[0];
        assert_eq!(label.anchor, TextAnchor::Start);
        assert_eq!(label.rotation, 0.0);
    }

    #[test]
    fn unknown_lineage_is_unresolved() {
        let tree = uneven_seven();
        let mut diag = Diagnostics::new();
        let mut ghost = big();
        ghost.identifier = "p__Ghost".to_string();
        assert!(resolve_roots(&tree, &[ghost, big()], &mut diag).len() == 1);
        assert_eq!(diag.unresolved_identifiers().count(), 1);
    }
}
