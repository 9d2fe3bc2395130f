use crate::export::{Canvas, Style};
use crate::geometry::{arc_direction, Path};
use crate::tree::{LayoutType, Tree};

#[derive(Debug, Clone, PartialEq)]
pub struct BranchStyle {
    pub width: f64,
    pub color: String,
}

impl Default for BranchStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: "black".to_string(),
        }
    }
}

/// Draw every visible branch as node -> corner -> parent. Circular trees bend
/// along an arc at the parent's radius.
pub fn draw_branches(tree: &Tree, style: &BranchStyle, canvas: &mut dyn Canvas) {
    canvas.begin_group("branches");
    for id in tree.postorder() {
        let node = tree.node(id);
        let Some(parent_id) = node.parent else {
            continue;
        };
        if node.is_collapsed {
            continue;
        }
        let parent = tree.node(parent_id);

        let mut branch = Path::new();
        branch.move_to(node.pos).line_to(node.corner);
        match tree.layout_type {
            LayoutType::Circular => {
                branch.arc_to(
                    parent.pos,
                    parent.rel_depth,
                    false,
                    arc_direction(node.angle, parent.angle),
                );
            }
            LayoutType::Rectangular => {
                branch.line_to(parent.pos);
            }
        }
        canvas.path(branch, Style::stroke(style.color.clone(), style.width));
    }
    canvas.end_group();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::testing;
    use crate::export::recording::RecordingCanvas;
    use crate::export::Primitive;
    use crate::geometry::Segment;
    use crate::tree::fixtures::*;
    use crate::tree::layout::{CollapseMethod, CollapseSizing, LayoutEngine, LayoutParams};

    #[test]
    fn one_branch_per_non_root_node() {
        let tree = testing::rectangular(uneven_seven());
        let mut canvas = RecordingCanvas::new();
        draw_branches(&tree, &BranchStyle::default(), &mut canvas);
        assert_eq!(canvas.primitives_in("branches").len(), tree.len() - 1);
    }

    #[test]
    fn circular_branches_end_in_arc_to_parent() {
        let tree = testing::circular(balanced_four());
        let mut canvas = RecordingCanvas::new();
        draw_branches(&tree, &BranchStyle::default(), &mut canvas);

        for primitive in canvas.primitives_in("branches") {
            let Primitive::Path { path, .. } = primitive else {
                panic!("expected path");
            };
            assert!(matches!(path.segments.last(), Some(Segment::Arc { .. })));
        }
    }

    #[test]
    fn collapsed_nodes_have_no_branches() {
        let mut tree = uneven_seven();
        let big = tree.find_by_label(tree.root, "p__Big").unwrap();
        let params = LayoutParams {
            width: 100.0,
            height: 100.0,
            ..LayoutParams::default()
        };
        LayoutEngine::new(params)
            .with_collapse(
                CollapseSizing {
                    method: CollapseMethod::FixedWidth,
                    scaling: 2.0,
                },
                vec![big],
            )
            .run(&mut tree)
            .unwrap();

        let mut canvas = RecordingCanvas::new();
        draw_branches(&tree, &BranchStyle::default(), &mut canvas);
        // root, plus the 6 nodes below p__Big, have no branch
        assert_eq!(canvas.primitives_in("branches").len(), tree.len() - 7);
    }
}
