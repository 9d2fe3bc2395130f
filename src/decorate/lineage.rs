use std::str::FromStr;

use glam::DVec2;
use log::debug;

use super::{Decorator, Stage};
use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;
use crate::export::{Canvas, Style};
use crate::geometry::{arc_direction, polar, ArcDirection, Path};
use crate::rotated_text::{LabelPlacement, RotatedText};
use crate::tree::{LayoutType, NodeId, Tree};

const COMPONENT: &str = "LineageProps";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineageMethod {
    #[default]
    Outline,
    ArcLabel,
}

impl FromStr for LineageMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OUTLINE" | "OUTLINES" => Ok(LineageMethod::Outline),
            "ARC_LABEL" | "ARC_LABELS" => Ok(LineageMethod::ArcLabel),
            _ => Err(ConfigError::invalid_value(COMPONENT, "display_method", s)),
        }
    }
}

/// Depth at which arc labels are stacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineageDepth {
    /// Just past the deepest leaf of the lineage.
    #[default]
    Tight,
    /// Just past the deepest leaf of the whole tree.
    Max,
}

impl FromStr for LineageDepth {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TIGHT" => Ok(LineageDepth::Tight),
            "MAX" => Ok(LineageDepth::Max),
            _ => Err(ConfigError::invalid_value(COMPONENT, "label_depth", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lineage {
    pub identifier: String,
    pub label: Option<String>,
    pub color: String,
    pub opacity: f64,
    pub stroke_width: f64,
}

pub struct LineageDecorator {
    method: LineageMethod,
    depth: LineageDepth,
    lineages: Vec<Lineage>,
    font_size: f64,
    font_color: String,
    /// Lineage index and node, filled by `decorate`.
    resolved: Vec<(usize, NodeId)>,
}

impl LineageDecorator {
    pub fn new(
        method: LineageMethod,
        depth: LineageDepth,
        lineages: Vec<Lineage>,
        font_size: f64,
        font_color: String,
    ) -> Self {
        Self {
            method,
            depth,
            lineages,
            font_size,
            font_color,
            resolved: Vec::new(),
        }
    }

    fn label_for(&self, tree: &Tree, lineage: &Lineage, node: NodeId) -> String {
        lineage
            .label
            .clone()
            .or_else(|| tree.node(node).taxon.clone())
            .unwrap_or_else(|| lineage.identifier.clone())
    }

    fn render_outline(&self, tree: &Tree, lineage: &Lineage, node_id: NodeId, canvas: &mut dyn Canvas) {
        let circular = tree.layout_type == LayoutType::Circular;
        let node = tree.node(node_id);
        let mut path = Path::new();
        path.move_to(node.pos);

        // Descend along the first child of each node.
        let mut current = node_id;
        while let Some(&child) = tree.node(current).children.first() {
            let (parent, child_node) = (tree.node(current), tree.node(child));
            if circular {
                path.arc_to(
                    child_node.corner,
                    parent.rel_depth,
                    false,
                    arc_direction(parent.angle, child_node.angle),
                );
            } else {
                path.line_to(child_node.corner);
            }
            if child_node.is_leaf() {
                break;
            }
            path.line_to(child_node.pos);
            current = child;
        }

        let mut last_leaf = node_id;
        for leaf in tree.leaves_from(node_id) {
            path.line_to(tree.node(leaf).pos);
            last_leaf = leaf;
        }

        // Ascend from the last leaf back to the lineage root.
        let mut current = last_leaf;
        while current != node_id {
            let child_node = tree.node(current);
            let Some(parent_id) = child_node.parent else {
                break;
            };
            let parent = tree.node(parent_id);
            path.line_to(child_node.corner);
            if circular {
                path.arc_to(
                    parent.pos,
                    parent.rel_depth,
                    false,
                    arc_direction(child_node.angle, parent.angle),
                );
            } else {
                path.line_to(parent.pos);
            }
            current = parent_id;
        }
        path.close();

        canvas.path(
            path,
            Style::fill(lineage.color.clone())
                .with_opacity(lineage.opacity)
                .with_stroke(lineage.color.clone(), lineage.stroke_width),
        );
    }

    fn render_arc_label(&self, tree: &Tree, lineage: &Lineage, node_id: NodeId, canvas: &mut dyn Canvas) {
        let leaves: Vec<NodeId> = tree.leaves_from(node_id).collect();
        let (Some(&first), Some(&last)) = (leaves.first(), leaves.last()) else {
            return;
        };
        let (first, last) = (tree.node(first), tree.node(last));

        let base = match self.depth {
            LineageDepth::Tight => tree.deepest_leaf_depth(node_id),
            LineageDepth::Max => tree.depth_extent(),
        };
        let depth = base * (1.0 + 0.05 * tree.node(node_id).label_depth as f64);
        let label = self.label_for(tree, lineage, node_id);
        let style = Style::stroke(lineage.color.clone(), lineage.stroke_width);

        match tree.layout_type {
            LayoutType::Circular => {
                let span = (last.angle - first.angle).rem_euclid(360.0);
                let mut arc = Path::new();
                arc.move_to(polar(tree.origin, depth, first.angle)).arc_to(
                    polar(tree.origin, depth, last.angle),
                    depth,
                    span > 180.0,
                    ArcDirection::Clockwise,
                );
                canvas.path(arc, style);

                let label_angle = (first.angle + 0.5 * span).rem_euclid(360.0);
                let pos = polar(tree.origin, depth, label_angle) + DVec2::splat(lineage.stroke_width);
                canvas.rotated_text(
                    pos,
                    label_angle,
                    label,
                    self.font_size,
                    &self.font_color,
                    LabelPlacement::default(),
                );
            }
            LayoutType::Rectangular => {
                let x = tree.origin.x + depth;
                canvas.line(DVec2::new(x, first.pos.y), DVec2::new(x, last.pos.y), style);
                canvas.rotated_text(
                    DVec2::new(x + lineage.stroke_width, 0.5 * (first.pos.y + last.pos.y)),
                    0.0,
                    label,
                    self.font_size,
                    &self.font_color,
                    LabelPlacement {
                        middle_y: true,
                        ..LabelPlacement::default()
                    },
                );
            }
        }
    }
}

/// Number of nested lineages at or below each node.
fn assign_label_depths(tree: &mut Tree, lineage_roots: &[NodeId]) {
    let order: Vec<NodeId> = tree.postorder().collect();
    for id in order {
        let below = tree
            .node(id)
            .children
            .iter()
            .map(|&c| tree.node(c).label_depth)
            .max()
            .unwrap_or(0);
        let own = usize::from(lineage_roots.contains(&id));
        tree.node_mut(id).label_depth = below + own;
    }
}

impl Decorator for LineageDecorator {
    fn name(&self) -> &'static str {
        "lineages"
    }

    fn stage(&self) -> Stage {
        Stage::Lineage
    }

    fn decorate(&mut self, tree: &mut Tree, diag: &mut Diagnostics) {
        self.resolved.clear();
        for (index, lineage) in self.lineages.iter().enumerate() {
            match tree.find_by_label(tree.root, &lineage.identifier) {
                Some(node) if tree.node(node).is_collapsed => {
                    debug!("Lineage {} lies in a collapsed region.", lineage.identifier);
                }
                Some(node) => self.resolved.push((index, node)),
                None => diag.unresolved(COMPONENT, &lineage.identifier),
            }
        }

        let roots: Vec<NodeId> = self.resolved.iter().map(|&(_, node)| node).collect();
        assign_label_depths(tree, &roots);
    }

    fn render(&self, tree: &Tree, canvas: &mut dyn Canvas, _diag: &mut Diagnostics) {
        canvas.begin_group("lineage");
        for &(index, node) in &self.resolved {
            let lineage = &self.lineages[index];
            match self.method {
                LineageMethod::Outline => self.render_outline(tree, lineage, node, canvas),
                LineageMethod::ArcLabel => self.render_arc_label(tree, lineage, node, canvas),
            }
        }
        canvas.end_group();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::testing;
    use crate::export::recording::RecordingCanvas;
    use crate::export::Primitive;
    use crate::geometry::Segment;
    use crate::tree::fixtures::*;

    fn lineage(identifier: &str) -> Lineage {
        Lineage {
            identifier: identifier.to_string(),
            label: None,
            color: "green".to_string(),
            opacity: 0.3,
            stroke_width: 2.0,
        }
    }

    fn run(tree: &mut Tree, method: LineageMethod, lineages: Vec<Lineage>) -> (RecordingCanvas, Diagnostics) {
        let mut decorator =
            LineageDecorator::new(method, LineageDepth::Tight, lineages, 8.0, "black".to_string());
        let mut canvas = RecordingCanvas::new();
        let mut diag = Diagnostics::new();
        decorator.decorate(tree, &mut diag);
        decorator.render(tree, &mut canvas, &mut diag);
        (canvas, diag)
    }

    #[test]
    fn label_depth_counts_nested_lineages() {
        let mut tree = testing::circular(uneven_seven());
        run(
            &mut tree,
            LineageMethod::ArcLabel,
            vec![lineage("p__Big"), lineage("E|G"), lineage("F|G")],
        );
        let big = tree.find_by_label(tree.root, "p__Big").unwrap();
        let fg = tree.find_by_label(tree.root, "F|G").unwrap();
        assert_eq!(tree.node(fg).label_depth, 1);
        assert_eq!(tree.node(big).label_depth, 3);
        assert_eq!(tree.root().label_depth, 3);
    }

    #[test]
    fn outline_visits_every_leaf() {
        let mut tree = testing::circular(uneven_seven());
        let (canvas, diag) = run(&mut tree, LineageMethod::Outline, vec![lineage("p__Big")]);
        assert!(diag.is_clean());

        let shapes = canvas.primitives_in("lineage");
        assert_eq!(shapes.len(), 1);
        let Primitive::Path { path, .. } = shapes[0] else {
            panic!("expected path");
        };
        let big = tree.find_by_label(tree.root, "p__Big").unwrap();
        let points = path.points();
        assert_eq!(points[0], tree.node(big).pos);
        for leaf in tree.leaves_from(big) {
            assert!(points.contains(&tree.node(leaf).pos));
        }
        assert_eq!(*points.last().unwrap(), tree.node(big).pos);
        assert!(path.segments.iter().any(|s| matches!(s, Segment::Arc { .. })));
    }

    #[test]
    fn rectangular_outline_uses_straight_segments() {
        let mut tree = testing::rectangular(uneven_seven());
        let (canvas, _) = run(&mut tree, LineageMethod::Outline, vec![lineage("E|G")]);
        let Primitive::Path { path, .. } = canvas.primitives_in("lineage")[0] else {
            panic!("expected path");
        };
        assert!(!path.segments.iter().any(|s| matches!(s, Segment::Arc { .. })));
    }

    #[test]
    fn arc_label_sits_beyond_deepest_leaf() {
        let mut tree = testing::circular(uneven_seven());
        let mut named = lineage("p__Big");
        named.label = Some("Big clade".to_string());
        let (canvas, _) = run(&mut tree, LineageMethod::ArcLabel, vec![named]);

        let texts = canvas.texts_in("lineage");
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].text, "Big clade");

        let Primitive::Path { path, .. } = canvas.primitives_in("lineage")[0] else {
            panic!("expected arc");
        };
        let Some(Segment::Arc { radius, .. }) = path.segments.get(1) else {
            panic!("expected arc segment");
        };
        // deepest leaf of p__Big is G at the full radius, one nested lineage
        assert!((radius - 105.0).abs() < 1e-9);
    }

    #[test]
    fn unresolved_lineage_is_reported() {
        let mut tree = testing::rectangular(balanced_four());
        let (canvas, diag) = run(&mut tree, LineageMethod::Outline, vec![lineage("p__Ghost")]);
        assert!(canvas.primitives_in("lineage").is_empty());
        assert_eq!(diag.unresolved_identifiers().count(), 1);
    }

    #[test]
    fn parses_original_method_spellings() {
        assert_eq!("outlines".parse::<LineageMethod>().unwrap(), LineageMethod::Outline);
        assert_eq!("ARC_LABEL".parse::<LineageMethod>().unwrap(), LineageMethod::ArcLabel);
        assert_eq!("max".parse::<LineageDepth>().unwrap(), LineageDepth::Max);
    }
}
