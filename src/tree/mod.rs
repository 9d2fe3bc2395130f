use std::str::FromStr;

use glam::DVec2;

use crate::error::{ConfigError, TreeError};

pub mod label;
pub mod layout;

pub use label::{parse_label, ParsedLabel};
pub use layout::{BranchTransform, LayoutType};

/// Index of a node in [`Tree::nodes`]. Assigned once when the tree is built.
pub type NodeId = usize;

/// Rooted phylogenetic tree stored as an arena of nodes.
///
/// Geometry fields on the nodes are written by [`layout::LayoutEngine`] and
/// are read-only afterwards.
#[derive(Debug, Clone)]
pub struct Tree {
    pub root: NodeId,
    pub nodes: Vec<TreeNode>,
    pub layout_type: LayoutType,
    /// Depth extent of the drawing: radius for circular trees, horizontal
    /// extent for rectangular trees.
    pub width: f64,
    pub height: f64,
    /// Canvas centre for circular trees, top-left corner for rectangular ones.
    pub origin: DVec2,
    /// Angle of the first leaf (degrees, circular only).
    pub rotation: f64,
    /// Angular span shared by all leaves (degrees, circular only).
    pub arc: f64,
    /// Longest root-to-leaf distance, set by the layout engine.
    pub deepest_node: f64,
}

/// Node within a phylogenetic tree.
#[derive(Debug, Clone, Default)]
pub struct TreeNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub length: f64,
    pub label: Option<String>,
    pub support: Option<f64>,
    pub taxon: Option<String>,
    pub auxiliary: Option<String>,

    // Written by the layout engine.
    pub pos: DVec2,
    /// Bend between this node and its parent.
    pub corner: DVec2,
    /// Unit vector pointing away from the tree centre.
    pub dir: DVec2,
    /// Degrees, circular layout only.
    pub angle: f64,
    pub rel_depth: f64,
    pub num_leaves: usize,
    pub is_collapsed: bool,
    pub is_collapsed_root: bool,
    /// Extent of a collapsed block: angles (circular) or y range (rectangular).
    pub collapse_span: Option<(f64, f64)>,

    // Written by the contour decorator.
    pub contour: Option<f64>,
    // Written by the lineage decorator.
    pub label_depth: usize,
}

impl TreeNode {
    pub fn new(id: NodeId, label: Option<String>, length: f64) -> Self {
        Self {
            id,
            label,
            length,
            ..Self::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Fill `support`, `taxon` and `auxiliary` from the raw label. Leaf labels
    /// are taken verbatim as taxon names.
    fn classify_label(&mut self) {
        let Some(raw) = self.label.as_deref() else {
            return;
        };

        if self.children.is_empty() {
            let name = raw.trim().trim_matches('\'').trim_matches('"').trim();
            self.taxon = (!name.is_empty()).then(|| name.to_string());
            self.support = None;
            self.auxiliary = None;
        } else {
            let ParsedLabel {
                support,
                taxon,
                auxiliary,
            } = parse_label(raw);
            self.support = support;
            self.taxon = taxon;
            self.auxiliary = auxiliary;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ladderize {
    #[default]
    Default,
    /// Larger clades first.
    Top,
    /// Smaller clades first.
    Bottom,
}

impl FromStr for Ladderize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEFAULT" => Ok(Ladderize::Default),
            "TOP" => Ok(Ladderize::Top),
            "BOTTOM" => Ok(Ladderize::Bottom),
            _ => Err(ConfigError::invalid_value("TreeProps", "ladderize", s)),
        }
    }
}

impl Tree {
    /// Create a tree holding only a root node.
    pub fn new(root_label: Option<String>) -> Self {
        let mut root = TreeNode::new(0, root_label, 0.0);
        root.classify_label();
        Self {
            root: 0,
            nodes: vec![root],
            layout_type: LayoutType::default(),
            width: 1.0,
            height: 1.0,
            origin: DVec2::ZERO,
            rotation: 0.0,
            arc: 360.0,
            deepest_node: 0.0,
        }
    }

    /// Append a child to `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, label: Option<String>, length: f64) -> NodeId {
        let id = self.nodes.len();
        let mut node = TreeNode::new(id, label, length);
        node.parent = Some(parent);
        node.classify_label();
        self.nodes.push(node);
        self.nodes[parent].children.push(id);

        // the parent just stopped being a leaf
        if self.nodes[parent].children.len() == 1 {
            self.nodes[parent].classify_label();
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id]
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[self.root]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    pub fn preorder(&self) -> Preorder<'_> {
        self.preorder_from(self.root)
    }

    pub fn preorder_from(&self, start: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![start],
        }
    }

    pub fn postorder(&self) -> Postorder<'_> {
        self.postorder_from(self.root)
    }

    pub fn postorder_from(&self, start: NodeId) -> Postorder<'_> {
        Postorder {
            tree: self,
            stack: vec![(start, false)],
        }
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.leaves_from(self.root)
    }

    pub fn leaves_from(&self, start: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.preorder_from(start)
            .filter(move |&id| self.nodes[id].is_leaf())
    }

    /// Ids from `id` (exclusive) up to the root (inclusive).
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id].parent, move |&p| self.nodes[p].parent)
    }

    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Sum of branch lengths from `node` up to, but excluding, `ancestor`.
    pub fn distance_to_ancestor(&self, node: NodeId, ancestor: NodeId) -> Result<f64, TreeError> {
        let mut distance = 0.0;
        let mut current = node;
        while current != ancestor {
            distance += self.nodes[current].length;
            current = self.nodes[current]
                .parent
                .ok_or(TreeError::NotAnAncestor { node, ancestor })?;
        }
        Ok(distance)
    }

    pub fn distance_to_root(&self, node: NodeId) -> f64 {
        let mut distance = 0.0;
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            distance += self.nodes[current].length;
            current = parent;
        }
        distance
    }

    /// Distances from `node` to every leaf below it, in leaf order.
    pub fn leaf_distances(&self, node: NodeId) -> Vec<f64> {
        self.leaves_from(node)
            .filter_map(|leaf| self.distance_to_ancestor(leaf, node).ok())
            .collect()
    }

    pub fn mean_tip_distance(&self, node: NodeId) -> f64 {
        let distances = self.leaf_distances(node);
        if distances.is_empty() {
            return 0.0;
        }
        distances.iter().sum::<f64>() / distances.len() as f64
    }

    /// Most recent common ancestor of `ids`.
    pub fn mrca(&self, ids: &[NodeId]) -> Option<NodeId> {
        let (&first, rest) = ids.split_first()?;
        let mut path: Vec<NodeId> = std::iter::once(first).chain(self.ancestors(first)).collect();

        for &id in rest {
            let keep = path
                .iter()
                .position(|&candidate| self.is_ancestor_or_self(candidate, id))?;
            path.drain(..keep);
        }
        path.first().copied()
    }

    /// Leaf within `subtree` whose taxon label equals `taxon`.
    pub fn find_taxon(&self, subtree: NodeId, taxon: &str) -> Option<NodeId> {
        self.leaves_from(subtree)
            .find(|&id| self.nodes[id].taxon.as_deref() == Some(taxon))
    }

    /// Resolve a lineage identifier within `subtree`.
    ///
    /// `A|B|C` names the most recent common ancestor of the listed taxa.
    /// Otherwise a leaf with that taxon is preferred, then an internal node
    /// whose parsed taxon matches. `None` is a normal outcome: callers treat it
    /// as a warning.
    pub fn find_by_label(&self, subtree: NodeId, label: &str) -> Option<NodeId> {
        let label = label.trim();
        if label.contains('|') {
            let taxa: Option<Vec<NodeId>> = label
                .split('|')
                .map(|taxon| self.find_taxon(subtree, taxon.trim()))
                .collect();
            return taxa.and_then(|ids| self.mrca(&ids));
        }

        self.find_taxon(subtree, label).or_else(|| {
            self.preorder_from(subtree).find(|&id| {
                let node = &self.nodes[id];
                !node.is_leaf() && node.taxon.as_deref() == Some(label)
            })
        })
    }

    /// Calculate the number of leaf descendants for each node
    pub fn calculate_clade_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.nodes.len()];
        for id in self.postorder() {
            let node = &self.nodes[id];
            sizes[id] = if node.is_leaf() {
                1
            } else {
                node.children.iter().map(|&c| sizes[c]).sum()
            };
        }
        sizes
    }

    /// Order all nodes' children by clade size
    pub fn ladderize(&mut self, mode: Ladderize) {
        let increasing = match mode {
            Ladderize::Default => return,
            Ladderize::Top => false,
            Ladderize::Bottom => true,
        };

        let sizes = self.calculate_clade_sizes();
        for node in &mut self.nodes {
            if node.children.len() > 1 {
                node.children.sort_by(|&a, &b| {
                    if increasing {
                        sizes[a].cmp(&sizes[b])
                    } else {
                        sizes[b].cmp(&sizes[a])
                    }
                });
            }
        }
    }

    /// Depth extent of the drawing along the root-to-tip axis.
    pub fn depth_extent(&self) -> f64 {
        self.width
    }
}

/// Lazy pre-order walk. Children are visited in their stored order.
pub struct Preorder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.nodes[id].children.iter().rev().copied());
        Some(id)
    }
}

/// Lazy post-order walk: children before parents.
pub struct Postorder<'a> {
    tree: &'a Tree,
    stack: Vec<(NodeId, bool)>,
}

impl Iterator for Postorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, expanded) = self.stack.pop()?;
            let children = &self.tree.nodes[id].children;
            if expanded || children.is_empty() {
                return Some(id);
            }
            self.stack.push((id, true));
            self.stack
                .extend(children.iter().rev().map(|&child| (child, false)));
        }
    }
}
