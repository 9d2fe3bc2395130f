use log::info;

use super::{Decorator, Stage};
use crate::diagnostics::Diagnostics;
use crate::export::Canvas;
use crate::rotated_text::{LabelPlacement, RotatedText};
use crate::tree::{NodeId, Tree};

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub show_leaf_labels: bool,
    pub leaf_font_size: f64,
    pub leaf_font_color: String,
    pub show_internal_labels: bool,
    pub internal_font_size: f64,
    pub internal_font_color: String,
    /// When non-empty, only these internal taxa are labelled.
    pub internal_labels: Vec<String>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            show_leaf_labels: true,
            leaf_font_size: 6.0,
            leaf_font_color: "black".to_string(),
            show_internal_labels: false,
            internal_font_size: 8.0,
            internal_font_color: "black".to_string(),
            internal_labels: Vec::new(),
        }
    }
}

/// Leaf names and internal taxon names, written along the branch direction.
pub struct LabelDecorator {
    style: LabelStyle,
}

impl LabelDecorator {
    pub fn new(style: LabelStyle) -> Self {
        Self { style }
    }

    fn wants_internal(&self, taxon: &str) -> bool {
        self.style.internal_labels.is_empty()
            || self.style.internal_labels.iter().any(|t| t == taxon)
    }
}

fn branch_angle(tree: &Tree, id: NodeId) -> f64 {
    let dir = tree.node(id).dir;
    dir.y.atan2(dir.x).to_degrees()
}

impl Decorator for LabelDecorator {
    fn name(&self) -> &'static str {
        "labels"
    }

    fn stage(&self) -> Stage {
        Stage::Labels
    }

    fn render(&self, tree: &Tree, canvas: &mut dyn Canvas, _diag: &mut Diagnostics) {
        canvas.begin_group("labels");

        if self.style.show_leaf_labels {
            info!("Rendering leaf labels.");
            for leaf in tree.leaves() {
                let node = tree.node(leaf);
                let Some(taxon) = node.taxon.as_deref() else {
                    continue;
                };
                if node.is_collapsed {
                    continue;
                }
                canvas.rotated_text(
                    node.pos,
                    branch_angle(tree, leaf),
                    taxon,
                    self.style.leaf_font_size,
                    &self.style.leaf_font_color,
                    LabelPlacement::default(),
                );
            }
        }

        if self.style.show_internal_labels {
            info!("Rendering internal labels.");
            for id in tree.preorder() {
                let node = tree.node(id);
                if node.is_leaf() || node.is_collapsed {
                    continue;
                }
                let Some(taxon) = node.taxon.as_deref() else {
                    continue;
                };
                if !self.wants_internal(taxon) {
                    continue;
                }
                canvas.rotated_text(
                    node.pos,
                    branch_angle(tree, id),
                    taxon,
                    self.style.internal_font_size,
                    &self.style.internal_font_color,
                    LabelPlacement::default(),
                );
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
    use crate::export::TextAnchor;
    use crate::tree::fixtures::*;

    fn texts(tree: &Tree, style: LabelStyle) -> Vec<(String, f64, TextAnchor)> {
        let mut canvas = RecordingCanvas::new();
        LabelDecorator::new(style).render(tree, &mut canvas, &mut Diagnostics::new());
        canvas
            .texts_in("labels")
            .into_iter()
            .map(|t| (t.text.clone(), t.rotation, t.anchor))
            .collect()
    }

    #[test]
    fn rectangular_leaf_labels_are_horizontal() {
        let tree = testing::rectangular(balanced_four());
        let labels = texts(&tree, LabelStyle::default());
        let names: Vec<&str> = labels.iter().map(|(t, _, _)| t.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        assert!(labels.iter().all(|(_, r, a)| *r == 0.0 && *a == TextAnchor::Start));
    }

    #[test]
    fn circular_labels_on_left_half_are_flipped() {
        let tree = testing::circular(balanced_four());
        let labels = texts(&tree, LabelStyle::default());
        // leaves at 0, 90, 180 and 270 degrees
        assert_eq!(labels[0].2, TextAnchor::Start);
        assert_eq!(labels[2].2, TextAnchor::End);
        assert!(labels[2].1.abs() < 1e-9);
    }

    #[test]
    fn internal_labels_can_be_restricted() {
        let tree = testing::rectangular(uneven_seven());
        let style = LabelStyle {
            show_leaf_labels: false,
            show_internal_labels: true,
            ..LabelStyle::default()
        };
        let all = texts(&tree, style.clone());
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, "p__Big");

        let restricted = texts(
            &tree,
            LabelStyle {
                internal_labels: vec!["p__Other".to_string()],
                ..style
            },
        );
        assert!(restricted.is_empty());
    }
}
