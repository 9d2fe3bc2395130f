use glam::DVec2;

use super::collapse::CollapseSizing;
use super::{NodeId, Tree};

struct RectangularState {
    next_y: f64,
    y_step: f64,
}

pub(super) fn build(tree: &mut Tree, slots: f64, sizing: &CollapseSizing) {
    let y_step = if slots > 1.0 {
        tree.height / (slots - 1.0)
    } else {
        0.0
    };
    let mut state = RectangularState {
        next_y: tree.origin.y,
        y_step,
    };

    let root = tree.root;
    assign_rectangular_positions(tree, root, sizing, &mut state);
}

/// Post-order placement. Returns the y coordinate assigned to `node_id`.
fn assign_rectangular_positions(
    tree: &mut Tree,
    node_id: NodeId,
    sizing: &CollapseSizing,
    state: &mut RectangularState,
) -> f64 {
    let y = if tree.nodes[node_id].is_collapsed_root {
        let width = sizing.slots(tree.nodes[node_id].num_leaves);
        let top = state.next_y;
        let bottom = top + (width - 1.0) * state.y_step;
        state.next_y += width * state.y_step;
        tree.nodes[node_id].collapse_span = Some((top, bottom));

        let y = 0.5 * (top + bottom);
        place_collapsed(tree, node_id, y);
        y
    } else if tree.nodes[node_id].is_leaf() {
        let y = state.next_y;
        state.next_y += state.y_step;
        y
    } else {
        let children = tree.nodes[node_id].children.clone();
        let mut sum = 0.0;
        for &child in &children {
            sum += assign_rectangular_positions(tree, child, sizing, state);
        }
        sum / children.len() as f64
    };

    place(tree, node_id, y);
    y
}

/// Descendants of a collapse root keep their own depth and share its y.
fn place_collapsed(tree: &mut Tree, root: NodeId, y: f64) {
    let below: Vec<NodeId> = tree.preorder_from(root).skip(1).collect();
    for id in below {
        place(tree, id, y);
    }
}

fn place(tree: &mut Tree, id: NodeId, y: f64) {
    let rel_depth = tree.scale_depth(tree.distance_to_root(id));
    let x = tree.origin.x + rel_depth;

    let node = &mut tree.nodes[id];
    node.rel_depth = rel_depth;
    node.angle = 0.0;
    node.pos = DVec2::new(x, y);
    node.dir = DVec2::X;
}
