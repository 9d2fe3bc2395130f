use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use glam::DVec2;

use super::{Decorator, RenderContext, Stage};
use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;
use crate::export::{Canvas, Style};
use crate::geometry::polar;
use crate::rotated_text::{LabelPlacement, RotatedText};
use crate::tree::{LayoutType, NodeId, Tree};

const COMPONENT: &str = "SymbolProps";

/// Gap between the tree and the first symbol column, in pixels.
const SYMBOL_OFFSET: f64 = 20.0;
const COUNT_FONT_SIZE: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolShape {
    Circle,
    Square,
}

impl FromStr for SymbolShape {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circle" => Ok(SymbolShape::Circle),
            "square" => Ok(SymbolShape::Square),
            _ => Err(ConfigError::invalid_value(COMPONENT, "symbol", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSpec {
    pub column: usize,
    pub shape: SymbolShape,
    pub color: String,
    /// Half the symbol's extent, in inches.
    pub size: f64,
}

/// Symbols carried by each taxon, with the number of times each was listed.
pub type SymbolTable = BTreeMap<String, BTreeMap<String, usize>>;

pub struct SymbolDecorator {
    specs: BTreeMap<String, SymbolSpec>,
    table: SymbolTable,
    ctx: RenderContext,
    /// Leaf and taxon for every entry of the table found in the tree.
    resolved: Vec<(NodeId, String)>,
}

impl SymbolDecorator {
    pub fn new(specs: BTreeMap<String, SymbolSpec>, table: SymbolTable, ctx: RenderContext) -> Self {
        Self {
            specs,
            table,
            ctx,
            resolved: Vec::new(),
        }
    }

    fn radius(&self, spec: &SymbolSpec) -> f64 {
        spec.size * self.ctx.inch
    }

    /// Distance of a column's centre past the tree, along the depth axis.
    fn column_offset(&self, spec: &SymbolSpec) -> f64 {
        SYMBOL_OFFSET + 3.0 * self.radius(spec) * spec.column as f64
    }

    fn render_column_lines(&self, tree: &Tree, canvas: &mut dyn Canvas) {
        let style = Style::stroke("grey", 1.0);
        for spec in self.specs.values().filter(|spec| spec.column > 0) {
            let radius = self.radius(spec);
            let depth = tree.width + self.column_offset(spec) - 1.5 * radius;
            match tree.layout_type {
                LayoutType::Rectangular => {
                    let x = tree.origin.x + depth;
                    canvas.line(
                        DVec2::new(x, tree.origin.y - radius),
                        DVec2::new(x, tree.origin.y + tree.height + radius),
                        style.clone(),
                    );
                }
                LayoutType::Circular => canvas.circle(tree.origin, depth, style.clone()),
            }
        }
    }

    fn symbol_center(&self, tree: &Tree, leaf: NodeId, spec: &SymbolSpec) -> DVec2 {
        let node = tree.node(leaf);
        match tree.layout_type {
            LayoutType::Rectangular => DVec2::new(
                tree.origin.x + tree.width + self.column_offset(spec),
                node.pos.y,
            ),
            LayoutType::Circular => polar(
                tree.origin,
                tree.width + self.column_offset(spec),
                node.angle,
            ),
        }
    }
}

impl Decorator for SymbolDecorator {
    fn name(&self) -> &'static str {
        "symbols"
    }

    fn stage(&self) -> Stage {
        Stage::Symbols
    }

    fn decorate(&mut self, tree: &mut Tree, diag: &mut Diagnostics) {
        self.resolved.clear();

        let mut unknown = BTreeSet::new();
        for (taxon, symbols) in &self.table {
            unknown.extend(
                symbols
                    .keys()
                    .filter(|label| !self.specs.contains_key(*label))
                    .cloned(),
            );
            match tree.find_taxon(tree.root, taxon) {
                Some(leaf) if tree.node(leaf).is_collapsed => {}
                Some(leaf) => self.resolved.push((leaf, taxon.clone())),
                None => diag.unresolved(COMPONENT, taxon),
            }
        }
        for label in unknown {
            diag.warn(COMPONENT, format!("no symbol defined for '{label}'"));
        }
    }

    fn render(&self, tree: &Tree, canvas: &mut dyn Canvas, _diag: &mut Diagnostics) {
        canvas.begin_group("symbols");
        self.render_column_lines(tree, canvas);

        for (leaf, taxon) in &self.resolved {
            let Some(symbols) = self.table.get(taxon) else {
                continue;
            };
            for (label, &count) in symbols {
                let Some(spec) = self.specs.get(label) else {
                    continue;
                };
                let center = self.symbol_center(tree, *leaf, spec);
                let radius = self.radius(spec);
                let style = Style::fill(spec.color.clone()).with_stroke("grey", 1.0);
                match spec.shape {
                    SymbolShape::Circle => canvas.circle(center, radius, style),
                    SymbolShape::Square => {
                        canvas.rect(center - radius, DVec2::splat(2.0 * radius), style)
                    }
                }

                if count > 1 {
                    canvas.rotated_text(
                        center,
                        0.0,
                        count,
                        COUNT_FONT_SIZE,
                        "black",
                        LabelPlacement {
                            middle_x: true,
                            middle_y: true,
                        },
                    );
                }
            }
        }
        canvas.end_group();
    }
}
