use std::str::FromStr;

use glam::DVec2;
use log::info;

use super::{NodeId, Tree};
use crate::error::{ConfigError, TreeError};

mod circular;
mod cladogram;
pub mod collapse;
mod rectangular;

pub use cladogram::BranchTransform;
pub use collapse::{CollapseMethod, CollapseSizing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutType {
    Circular,
    #[default]
    Rectangular,
}

impl FromStr for LayoutType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CIRCULAR" => Ok(LayoutType::Circular),
            "RECTANGULAR" => Ok(LayoutType::Rectangular),
            _ => Err(ConfigError::invalid_value("TreeProps", "display_method", s)),
        }
    }
}

/// Placement of the drawing on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub layout_type: LayoutType,
    /// Depth extent (radius for circular trees).
    pub width: f64,
    /// Leaf extent (rectangular only).
    pub height: f64,
    pub origin: DVec2,
    pub rotation: f64,
    pub arc: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            layout_type: LayoutType::Rectangular,
            width: 1.0,
            height: 1.0,
            origin: DVec2::ZERO,
            rotation: 0.0,
            arc: 360.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSummary {
    pub leaves: usize,
    /// Leaf slots after collapse accounting.
    pub slots: f64,
    pub collapsed_lineages: usize,
}

/// Computes absolute node geometry for one of the supported strategies.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    params: LayoutParams,
    sizing: CollapseSizing,
    collapse_roots: Vec<NodeId>,
}

impl LayoutEngine {
    pub fn new(params: LayoutParams) -> Self {
        Self {
            params,
            sizing: CollapseSizing::default(),
            collapse_roots: Vec::new(),
        }
    }

    /// Collapse the subtrees rooted at `roots`, each occupying the number of
    /// leaf slots given by `sizing`.
    pub fn with_collapse(mut self, sizing: CollapseSizing, roots: Vec<NodeId>) -> Self {
        self.sizing = sizing;
        self.collapse_roots = roots;
        self
    }

    pub fn run(&self, tree: &mut Tree) -> Result<LayoutSummary, TreeError> {
        if tree.is_empty() {
            return Err(TreeError::Empty);
        }

        tree.layout_type = self.params.layout_type;
        tree.width = self.params.width;
        tree.height = self.params.height;
        tree.origin = self.params.origin;
        tree.rotation = self.params.rotation;
        tree.arc = self.params.arc;

        let leaves = count_leaves(tree);
        tree.deepest_node = tree
            .leaves()
            .map(|leaf| tree.distance_to_root(leaf))
            .fold(0.0, f64::max);
        info!("Total number of leaves: {leaves}");
        info!("Deepest leaf node: {:.2}", tree.deepest_node);

        let collapsed_lineages = collapse::mark(tree, &self.collapse_roots);
        let slots = collapse::layout_slots(tree, &self.sizing);
        info!("Collapsed {collapsed_lineages} lineages.");

        match self.params.layout_type {
            LayoutType::Circular => circular::build(tree, slots, &self.sizing),
            LayoutType::Rectangular => rectangular::build(tree, slots, &self.sizing),
        }
        assign_corners(tree);

        Ok(LayoutSummary {
            leaves,
            slots,
            collapsed_lineages,
        })
    }
}

impl Tree {
    /// Map a root-to-node distance onto the drawing's depth extent.
    pub fn scale_depth(&self, distance: f64) -> f64 {
        if self.deepest_node <= 0.0 {
            return 0.0;
        }
        distance / self.deepest_node * self.width
    }

    /// Largest relative depth among the leaves below `node`.
    pub fn deepest_leaf_depth(&self, node: NodeId) -> f64 {
        self.leaves_from(node)
            .map(|leaf| self.nodes[leaf].rel_depth)
            .fold(0.0, f64::max)
    }
}

/// Store the number of leaves below each node and return the total.
fn count_leaves(tree: &mut Tree) -> usize {
    let order: Vec<NodeId> = tree.postorder().collect();
    for id in order {
        let num_leaves = if tree.nodes[id].is_leaf() {
            1
        } else {
            tree.nodes[id]
                .children
                .iter()
                .map(|&c| tree.nodes[c].num_leaves)
                .sum()
        };
        tree.nodes[id].num_leaves = num_leaves;
    }
    tree.root().num_leaves
}

/// Second pass: the bend between each node and its parent. Runs after every
/// node position is final.
fn assign_corners(tree: &mut Tree) {
    let root = tree.root;
    tree.nodes[root].corner = tree.nodes[root].pos;

    for id in 0..tree.nodes.len() {
        let Some(parent) = tree.nodes[id].parent else {
            continue;
        };
        let parent_node = &tree.nodes[parent];
        let corner = match tree.layout_type {
            LayoutType::Circular => {
                crate::geometry::polar(tree.origin, parent_node.rel_depth, tree.nodes[id].angle)
            }
            LayoutType::Rectangular => DVec2::new(parent_node.pos.x, tree.nodes[id].pos.y),
        };
        tree.nodes[id].corner = corner;
    }
}
