//! Collapse accounting shared by both layout strategies.

use std::collections::HashSet;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::tree::{NodeId, Tree};

/// A collapsed lineage never takes fewer slots than this.
const MIN_COLLAPSED_SLOTS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapseMethod {
    #[default]
    Proportional,
    FixedWidth,
    Log,
}

impl FromStr for CollapseMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROPORTIONAL" => Ok(CollapseMethod::Proportional),
            "FIXED" | "FIXED_WIDTH" => Ok(CollapseMethod::FixedWidth),
            "LOG" => Ok(CollapseMethod::Log),
            _ => Err(ConfigError::invalid_value(
                "CollapseProps",
                "wedge_base_method",
                s,
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollapseSizing {
    pub method: CollapseMethod,
    /// Multiplier (PROPORTIONAL), slot count (FIXED_WIDTH) or logarithm base
    /// (LOG).
    pub scaling: f64,
}

impl Default for CollapseSizing {
    fn default() -> Self {
        Self {
            method: CollapseMethod::Proportional,
            scaling: 0.1,
        }
    }
}

impl CollapseSizing {
    /// Number of leaf slots occupied by a collapsed lineage with `num_leaves`
    /// leaves.
    pub fn slots(&self, num_leaves: usize) -> f64 {
        let n = num_leaves as f64;
        let slots = match self.method {
            CollapseMethod::FixedWidth => self.scaling,
            CollapseMethod::Proportional => self.scaling * n,
            CollapseMethod::Log => {
                if self.scaling > 0.0 && self.scaling != 1.0 && n > 0.0 {
                    n.log(self.scaling)
                } else {
                    0.0
                }
            }
        };
        slots.max(MIN_COLLAPSED_SLOTS)
    }
}

/// Flag collapse roots and their strict descendants. Requested roots that lie
/// inside an already collapsed lineage are ignored. Returns the number of
/// collapsed lineages.
pub(super) fn mark(tree: &mut Tree, roots: &[NodeId]) -> usize {
    let requested: HashSet<NodeId> = roots.iter().copied().collect();
    for node in &mut tree.nodes {
        node.is_collapsed = false;
        node.is_collapsed_root = false;
        node.collapse_span = None;
    }

    let mut lineages = 0;
    let mut stack = vec![tree.root];
    while let Some(id) = stack.pop() {
        if requested.contains(&id) {
            lineages += 1;
            tree.nodes[id].is_collapsed_root = true;
            let below: Vec<NodeId> = tree.preorder_from(id).skip(1).collect();
            for n in below {
                tree.nodes[n].is_collapsed = true;
            }
        } else {
            stack.extend(tree.nodes[id].children.iter().copied());
        }
    }
    lineages
}

/// Leaf slots needed for the layout: one per visible leaf plus the width of
/// every collapsed lineage.
pub(super) fn layout_slots(tree: &Tree, sizing: &CollapseSizing) -> f64 {
    tree.nodes
        .iter()
        .map(|node| {
            if node.is_collapsed_root {
                sizing.slots(node.num_leaves)
            } else if node.is_leaf() && !node.is_collapsed {
                1.0
            } else {
                0.0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::*;
    use crate::tree::layout::{LayoutEngine, LayoutParams, LayoutType};
    use glam::DVec2;

    fn sizing(method: CollapseMethod, scaling: f64) -> CollapseSizing {
        CollapseSizing { method, scaling }
    }

    #[test]
    fn slot_widths_never_drop_below_two() {
        assert_eq!(sizing(CollapseMethod::Proportional, 0.1).slots(10), 2.0);
        assert_eq!(sizing(CollapseMethod::Proportional, 0.5).slots(10), 5.0);
        assert_eq!(sizing(CollapseMethod::FixedWidth, 3.0).slots(100), 3.0);
        assert_eq!(sizing(CollapseMethod::FixedWidth, 1.0).slots(100), 2.0);
        assert!((sizing(CollapseMethod::Log, 2.0).slots(64) - 6.0).abs() < 1e-9);
        assert_eq!(sizing(CollapseMethod::Log, 10.0).slots(5), 2.0);
    }

    #[test]
    fn collapse_marks_strict_descendants() {
        let mut tree = uneven_seven();
        let big = tree.find_by_label(tree.root, "p__Big").unwrap();
        let count = mark(&mut tree, &[big]);
        assert_eq!(count, 1);
        assert!(tree.node(big).is_collapsed_root);
        assert!(!tree.node(big).is_collapsed);
        for id in tree.preorder_from(big).skip(1) {
            assert!(tree.node(id).is_collapsed);
            assert!(!tree.node(id).is_collapsed_root);
        }
        assert!(!tree.root().is_collapsed);
    }

    #[test]
    fn nested_collapse_requests_are_ignored() {
        let mut tree = uneven_seven();
        let big = tree.find_by_label(tree.root, "p__Big").unwrap();
        let efg = tree.find_by_label(tree.root, "E|G").unwrap();
        assert_eq!(mark(&mut tree, &[efg, big]), 1);
        assert!(!tree.node(efg).is_collapsed_root);
    }

    #[test]
    fn slot_accounting_matches_visible_leaves() {
        let mut tree = uneven_seven();
        let big = tree.find_by_label(tree.root, "p__Big").unwrap();
        let params = LayoutParams {
            layout_type: LayoutType::Rectangular,
            width: 100.0,
            height: 100.0,
            ..LayoutParams::default()
        };
        let summary = LayoutEngine::new(params)
            .with_collapse(sizing(CollapseMethod::FixedWidth, 3.0), vec![big])
            .run(&mut tree)
            .unwrap();

        // A, B and C stay visible; the four leaves below p__Big take 3 slots.
        assert_eq!(summary.slots, 6.0);
        assert_eq!(summary.collapsed_lineages, 1);

        let step = 100.0 / 5.0;
        let (lo, hi) = tree.node(big).collapse_span.unwrap();
        assert!((lo - 3.0 * step).abs() < 1e-9);
        assert!((hi - 5.0 * step).abs() < 1e-9);
        assert!((tree.node(big).pos.y - 4.0 * step).abs() < 1e-9);

        let g = tree.find_taxon(tree.root, "G").unwrap();
        assert_eq!(tree.node(g).pos.y, tree.node(big).pos.y);
        assert!(tree.node(g).pos.x > tree.node(big).pos.x);
    }

    #[test]
    fn dropping_the_collapse_restores_per_leaf_slots() {
        for layout_type in [LayoutType::Rectangular, LayoutType::Circular] {
            let params = LayoutParams {
                layout_type,
                width: 100.0,
                height: 100.0,
                origin: DVec2::new(150.0, 150.0),
                ..LayoutParams::default()
            };

            let mut fresh = uneven_seven();
            let expected = LayoutEngine::new(params).run(&mut fresh).unwrap();
            assert_eq!(expected.slots, fresh.leaf_count() as f64);

            let mut tree = uneven_seven();
            let big = tree.find_by_label(tree.root, "p__Big").unwrap();
            let collapsed = LayoutEngine::new(params)
                .with_collapse(sizing(CollapseMethod::FixedWidth, 3.0), vec![big])
                .run(&mut tree)
                .unwrap();
            assert_ne!(collapsed.slots, expected.slots);

            let restored = LayoutEngine::new(params).run(&mut tree).unwrap();
            assert_eq!(restored.slots, tree.leaf_count() as f64);
            assert_eq!(restored.collapsed_lineages, 0);
            for (a, b) in tree.nodes.iter().zip(&fresh.nodes) {
                assert!(a.pos.distance(b.pos) < 1e-9, "node {} moved", a.id);
                assert!(!a.is_collapsed && !a.is_collapsed_root);
            }
        }
    }

    #[test]
    fn circular_collapse_shares_block_angle() {
        let mut tree = uneven_seven();
        let big = tree.find_by_label(tree.root, "p__Big").unwrap();
        let params = LayoutParams {
            layout_type: LayoutType::Circular,
            width: 100.0,
            height: 100.0,
            origin: DVec2::new(150.0, 150.0),
            rotation: 0.0,
            arc: 360.0,
        };
        let summary = LayoutEngine::new(params)
            .with_collapse(sizing(CollapseMethod::FixedWidth, 3.0), vec![big])
            .run(&mut tree)
            .unwrap();
        assert_eq!(summary.slots, 6.0);

        // Slots: A=0, B=60, C=120, block starts at 180 and spans two steps.
        assert!((tree.node(big).angle - 240.0).abs() < 1e-9);
        assert_eq!(tree.node(big).collapse_span, Some((180.0, 300.0)));
        for id in tree.preorder_from(big) {
            assert!((tree.node(id).angle - 240.0).abs() < 1e-9);
        }
    }
}
