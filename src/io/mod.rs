use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use phylotree::tree::Tree as PhyloTree;

use crate::decorate::symbols::SymbolTable;
use crate::error::{ResourceError, TreeError};
use crate::tree::{NodeId, Tree};

fn read_resource(path: &Path, what: &'static str) -> Result<String> {
    if !path.exists() {
        return Err(ResourceError::Missing {
            what,
            path: path.to_path_buf(),
        }
        .into());
    }
    let raw = fs::read_to_string(path).map_err(|source| ResourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(raw)
}

/// Read the first tree of a Newick file.
pub fn load_tree(path: &Path) -> Result<Tree> {
    info!("Reading tree from {}.", path.display());
    let raw = read_resource(path, "tree")?;

    let mut chunks = split_trees(&raw).into_iter();
    let Some(first) = chunks.next() else {
        bail!("tree file did not contain any trees: {}", path.display());
    };
    let extra = chunks.count();
    if extra > 0 {
        warn!("Ignoring {extra} additional tree(s) in {}.", path.display());
    }

    let tree = parse_newick(first)
        .with_context(|| format!("failed to read tree file: {}", path.display()))?;
    info!("Tree contains {} taxa.", tree.leaf_count());
    Ok(tree)
}

/// Complete `;`-terminated trees, ignoring semicolons inside quoted labels.
fn split_trees(raw: &str) -> Vec<&str> {
    let mut trees = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    for (index, c) in raw.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            ';' if !in_quote => {
                let tree = raw[start..=index].trim();
                if tree.len() > 1 {
                    trees.push(tree);
                }
                start = index + 1;
            }
            _ => {}
        }
    }
    trees
}

pub fn parse_newick(raw: &str) -> Result<Tree> {
    let (masked, quoted) = mask_quoted_labels(&normalise_newick(raw))?;
    let phylo = PhyloTree::from_newick(&masked).map_err(|err| TreeError::Newick(err.to_string()))?;
    convert(&phylo, &quoted)
}

const QUOTED_PREFIX: &str = "phylodrawquoted";

/// Replace every `'...'` label with a bare placeholder so that `:` and other
/// Newick punctuation inside it reach the label parser intact. Returns the
/// masked string and the unquoted labels in order of appearance.
fn mask_quoted_labels(newick: &str) -> Result<(String, Vec<String>), TreeError> {
    let mut masked = String::with_capacity(newick.len());
    let mut quoted = Vec::new();
    let mut chars = newick.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\'' {
            masked.push(c);
            continue;
        }
        let mut label = String::new();
        loop {
            match chars.next() {
                // '' is an escaped quote
                Some('\'') if chars.peek() == Some(&'\'') => {
                    chars.next();
                    label.push('\'');
                }
                Some('\'') => break,
                Some(c) => label.push(c),
                None => return Err(TreeError::Newick("unterminated quoted label".to_string())),
            }
        }
        masked.push_str(&format!("{QUOTED_PREFIX}{}", quoted.len()));
        quoted.push(label);
    }
    Ok((masked, quoted))
}

/// Copy a parsed tree into the arena, assigning ids in pre-order.
fn convert(phylo: &PhyloTree, quoted: &[String]) -> Result<Tree> {
    let root = phylo
        .get_root()
        .map_err(|err| TreeError::Newick(err.to_string()))?;
    let root_node = phylo.get(&root).map_err(|err| anyhow!("{err}"))?;

    let mut tree = Tree::new(clean_label(root_node.name.as_deref(), quoted));
    let mut stack: Vec<(usize, NodeId)> = root_node
        .children
        .iter()
        .rev()
        .map(|&child| (child, tree.root))
        .collect();

    while let Some((source, parent)) = stack.pop() {
        let node = phylo.get(&source).map_err(|err| anyhow!("{err}"))?;
        let id = tree.add_child(
            parent,
            clean_label(node.name.as_deref(), quoted),
            node.parent_edge.unwrap_or(0.0),
        );
        stack.extend(node.children.iter().rev().map(|&child| (child, id)));
    }
    Ok(tree)
}

fn clean_label(name: Option<&str>, quoted: &[String]) -> Option<String> {
    let mut label = name?.trim();
    if let Some(index) = label.strip_prefix(QUOTED_PREFIX) {
        let index = index.parse::<usize>().ok()?;
        label = quoted.get(index)?.trim();
    }
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

fn normalise_newick(raw: &str) -> String {
    let mut cleaned = raw.trim().trim_end_matches(';').trim().to_owned();
    cleaned.push(';');
    cleaned
}

/// Data lines of a tab separated file, with their 1-based line numbers.
fn data_lines(raw: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    raw.lines().enumerate().filter_map(|(index, line)| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        Some((index + 1, line.split('\t').map(str::trim).collect()))
    })
}

/// Read `identifier<TAB>value` pairs for value contours.
pub fn read_contour_values(path: &Path) -> Result<Vec<(String, f64)>> {
    let raw = read_resource(path, "contour")?;
    let mut values = Vec::new();
    for (line, fields) in data_lines(&raw) {
        let malformed = |message: String| ResourceError::Malformed {
            path: path.to_path_buf(),
            line,
            message,
        };
        let [identifier, value, ..] = fields[..] else {
            return Err(malformed("expected 'identifier<TAB>value'".to_string()).into());
        };
        let value = value
            .parse::<f64>()
            .map_err(|_| malformed(format!("'{value}' is not a number")))?;
        values.push((identifier.to_string(), value));
    }
    info!("Read {} contour values.", values.len());
    Ok(values)
}

/// Read `taxon<TAB>symbol,symbol,...` lines, counting repeated symbols.
pub fn read_symbol_table(path: &Path) -> Result<SymbolTable> {
    let raw = read_resource(path, "symbol")?;
    let mut table = SymbolTable::new();
    for (line, fields) in data_lines(&raw) {
        let [taxon, symbols, ..] = fields[..] else {
            return Err(ResourceError::Malformed {
                path: path.to_path_buf(),
                line,
                message: "expected 'taxon<TAB>symbols'".to_string(),
            }
            .into());
        };
        let counts = table.entry(taxon.to_string()).or_default();
        for symbol in symbols.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            *counts.entry(symbol.to_string()).or_insert(0) += 1;
        }
    }
    Ok(table)
}
