use glam::DVec2;

use super::collapse::CollapseSizing;
use super::{NodeId, Tree};
use crate::geometry::{mid_angle, polar};

/// Place leaves at equal angles starting from `tree.rotation`, internal nodes
/// between their children and every node at a radius proportional to its
/// distance from the root.
pub(super) fn build(tree: &mut Tree, slots: f64, sizing: &CollapseSizing) {
    let step = if slots > 0.0 { tree.arc / slots } else { 0.0 };
    let mut cursor = tree.rotation;

    let order: Vec<NodeId> = tree.postorder().collect();
    for &id in &order {
        let node = &tree.nodes[id];
        if node.is_collapsed {
            continue;
        }

        let angle = if node.is_collapsed_root {
            let width = sizing.slots(node.num_leaves);
            let start = cursor;
            let end = cursor + (width - 1.0) * step;
            cursor += width * step;
            tree.nodes[id].collapse_span = Some((start.rem_euclid(360.0), end.rem_euclid(360.0)));
            (0.5 * (start + end)).rem_euclid(360.0)
        } else if node.is_leaf() {
            let angle = cursor.rem_euclid(360.0);
            cursor += step;
            angle
        } else {
            let angles: Vec<f64> = node.children.iter().map(|&c| tree.nodes[c].angle).collect();
            mid_angle(&angles)
        };

        place(tree, id, angle);
    }

    // Collapsed nodes share the angle of their lineage root.
    for id in tree.preorder().collect::<Vec<_>>() {
        if !tree.nodes[id].is_collapsed {
            continue;
        }
        if let Some(parent) = tree.nodes[id].parent {
            let angle = tree.nodes[parent].angle;
            place(tree, id, angle);
        }
    }
}

fn place(tree: &mut Tree, id: NodeId, angle: f64) {
    let rel_depth = tree.scale_depth(tree.distance_to_root(id));
    let origin = tree.origin;

    let node = &mut tree.nodes[id];
    node.angle = angle;
    node.rel_depth = rel_depth;
    node.pos = polar(origin, rel_depth, angle);
    node.dir = polar(DVec2::ZERO, 1.0, angle);
}
