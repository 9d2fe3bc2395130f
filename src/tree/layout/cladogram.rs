use std::str::FromStr;

use super::Tree;
use crate::error::ConfigError;

/// Optional rewrite of branch lengths applied before layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchTransform {
    #[default]
    None,
    Cladogram,
}

impl FromStr for BranchTransform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(BranchTransform::None),
            "CLADOGRAM" => Ok(BranchTransform::Cladogram),
            _ => Err(ConfigError::invalid_value(
                "TreeProps",
                "branch_transformation",
                s,
            )),
        }
    }
}

impl Tree {
    pub fn apply_transform(&mut self, transform: BranchTransform) {
        match transform {
            BranchTransform::None => {}
            BranchTransform::Cladogram => self.apply_cladogram_transform(),
        }
    }

    /// Every edge spans the difference in edge height between parent and
    /// child, so all tips end up at the same depth.
    pub fn apply_cladogram_transform(&mut self) {
        let heights = calculate_edge_heights(self);
        for id in 0..self.nodes.len() {
            if let Some(parent) = self.nodes[id].parent {
                self.nodes[id].length = (heights[parent] - heights[id]) as f64;
            }
        }
    }
}

/// Number of edges between each node and its deepest descendant leaf.
fn calculate_edge_heights(tree: &Tree) -> Vec<usize> {
    let mut heights = vec![0; tree.nodes.len()];
    for id in tree.postorder() {
        heights[id] = tree.nodes[id]
            .children
            .iter()
            .map(|&c| heights[c] + 1)
            .max()
            .unwrap_or(0);
    }
    heights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::uneven_seven;

    #[test]
    fn cladogram_aligns_all_tips() {
        let mut tree = uneven_seven();
        tree.apply_transform(BranchTransform::Cladogram);
        let depths: Vec<f64> = tree.leaves().map(|l| tree.distance_to_root(l)).collect();
        assert!(depths.iter().all(|&d| d == 4.0), "{depths:?}");
    }

    #[test]
    fn cladogram_gives_cherries_unit_branches() {
        let mut tree = uneven_seven();
        tree.apply_cladogram_transform();
        let f = tree.find_taxon(tree.root, "F").unwrap();
        let c = tree.find_taxon(tree.root, "C").unwrap();
        assert_eq!(tree.node(f).length, 1.0);
        assert_eq!(tree.node(c).length, 2.0);
    }

    #[test]
    fn parses_transform_names() {
        assert_eq!(
            "cladogram".parse::<BranchTransform>().unwrap(),
            BranchTransform::Cladogram
        );
        assert!("ULTRAMETRIC".parse::<BranchTransform>().is_err());
    }
}
