//! Typed contents of each property file kind.

use std::collections::BTreeMap;
use std::path::PathBuf;

use glam::DVec2;
use log::debug;

use super::{parse_number, unexpected_attribute, Entry, PropertyFile};
use crate::decorate::branches::BranchStyle;
use crate::decorate::collapsed::{CollapseStyle, CollapsedLineage};
use crate::decorate::color::{ColorMap, ColorStop};
use crate::decorate::contour::{ContourBand, ContourMethod};
use crate::decorate::labels::LabelStyle;
use crate::decorate::lineage::{Lineage, LineageDepth, LineageMethod};
use crate::decorate::scale::ScaleStyle;
use crate::decorate::symbols::SymbolSpec;
use crate::decorate::RenderContext;
use crate::diagnostics::Diagnostics;
use crate::error::ConfigError;
use crate::tree::layout::{CollapseSizing, LayoutParams};
use crate::tree::{BranchTransform, Ladderize, LayoutType};

#[derive(Debug, Clone, PartialEq)]
pub struct TreeProps {
    pub show_tree: bool,
    pub layout_type: LayoutType,
    pub ladderize: Ladderize,
    pub transform: BranchTransform,
    /// Fraction of the canvas width.
    pub width: f64,
    /// Fraction of the canvas height.
    pub height: f64,
    pub rotation: f64,
    pub arc: f64,
    pub branch: BranchStyle,
    /// Support marker radius as a fraction of the tree width.
    pub node_radius: f64,
    pub scale: ScaleStyle,
}

impl Default for TreeProps {
    fn default() -> Self {
        Self {
            show_tree: true,
            layout_type: LayoutType::Rectangular,
            ladderize: Ladderize::Default,
            transform: BranchTransform::None,
            width: 0.8,
            height: 0.8,
            rotation: 0.0,
            arc: 360.0,
            branch: BranchStyle::default(),
            node_radius: 0.005,
            scale: ScaleStyle::default(),
        }
    }
}

impl TreeProps {
    pub fn parse(file: &PropertyFile, diag: &mut Diagnostics) -> Result<Self, ConfigError> {
        let c = file.component;
        let mut props = Self::default();
        for entry in &file.entries {
            match entry.attribute.as_str() {
                "show_tree" => props.show_tree = entry.flag(c)?,
                "display_method" => props.layout_type = entry.parse(c)?,
                "ladderize" => props.ladderize = entry.parse(c)?,
                "branch_transformation" => props.transform = entry.parse(c)?,
                "width" => props.width = entry.number(c)?,
                "height" => props.height = entry.number(c)?,
                "rotation" => props.rotation = entry.number(c)?,
                "arc" => props.arc = entry.number(c)?,
                "branch_width" => props.branch.width = entry.number(c)?,
                "branch_color" => props.branch.color = entry.first(c)?.to_string(),
                "node_radius" => props.node_radius = entry.number(c)?,
                "show_scale_bar" => props.scale.show_scale_bar = entry.flag(c)?,
                "scale_bar_width" => props.scale.bar_width = entry.number(c)?,
                "scale_font_size" => props.scale.font_size = entry.number(c)?,
                "show_scale_bar_contours" => props.scale.show_scale_lines = entry.flag(c)?,
                "scale_bar_contour_width" => props.scale.line_width = entry.number(c)?,
                _ => unexpected_attribute(file, entry, diag),
            }
        }
        Ok(props)
    }

    /// Drawing extent and origin on a canvas. Circular trees use half the
    /// requested width as their radius and sit at the canvas centre.
    pub fn layout_params(&self, ctx: &RenderContext) -> LayoutParams {
        let canvas = ctx.canvas_size;
        let mut size = DVec2::new(self.width * canvas.x, self.height * canvas.y);
        let origin = match self.layout_type {
            LayoutType::Circular => {
                size = DVec2::splat(0.5 * size.x);
                0.5 * canvas
            }
            LayoutType::Rectangular => 0.5 * (canvas - size),
        };
        LayoutParams {
            layout_type: self.layout_type,
            width: size.x,
            height: size.y,
            origin,
            rotation: self.rotation,
            arc: self.arc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollapseProps {
    pub show: bool,
    pub style: CollapseStyle,
    pub sizing: CollapseSizing,
    pub lineages: Vec<CollapsedLineage>,
}

impl CollapseProps {
    pub fn parse(file: &PropertyFile, diag: &mut Diagnostics) -> Result<Self, ConfigError> {
        let c = file.component;
        let mut props = Self::default();
        for entry in &file.entries {
            match entry.attribute.as_str() {
                "show_collapsed" => props.show = entry.flag(c)?,
                "display_method" => props.style.shape = entry.parse(c)?,
                "branch1_percentile" => props.style.branch1_percentile = entry.number(c)?,
                "branch2_percentile" => props.style.branch2_percentile = entry.number(c)?,
                "wedge_base_method" => props.sizing.method = entry.parse(c)?,
                "wedge_scaling" => props.sizing.scaling = entry.number(c)?,
                "show_labels" => props.style.show_labels = entry.flag(c)?,
                "label_position" => props.style.label_position = entry.parse(c)?,
                "show_leaf_count" => props.style.show_leaf_count = entry.flag(c)?,
                "font_size" => props.style.font_size = entry.number(c)?,
                "font_color" => props.style.font_color = entry.first(c)?.to_string(),
                "collapse_lineage" => {
                    let v = entry.exactly(c, &[5])?;
                    props.lineages.push(CollapsedLineage {
                        identifier: v[0].clone(),
                        color: v[1].clone(),
                        opacity: number(c, entry, &v[2])?,
                        stroke_width: number(c, entry, &v[3])?,
                        stroke_color: v[4].clone(),
                    });
                }
                _ => unexpected_attribute(file, entry, diag),
            }
        }
        if props.show {
            file.require(&[
                "display_method",
                "branch1_percentile",
                "branch2_percentile",
                "wedge_base_method",
                "wedge_scaling",
            ])?;
        }
        Ok(props)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapProps {
    pub show: bool,
    pub show_labels: bool,
    pub map: ColorMap,
}

impl BootstrapProps {
    pub fn parse(file: &PropertyFile, diag: &mut Diagnostics) -> Result<Self, ConfigError> {
        let c = file.component;
        let mut show = false;
        let mut show_labels = false;
        let mut discrete = Vec::new();
        let mut continuous = Vec::new();
        for entry in &file.entries {
            match entry.attribute.as_str() {
                "show_bootstraps" => show = entry.flag(c)?,
                "show_bootstrap_labels" => show_labels = entry.flag(c)?,
                "discrete_cm" => discrete.push(color_stop(c, entry)?),
                "continuous_cm" => continuous.push(color_stop(c, entry)?),
                _ => unexpected_attribute(file, entry, diag),
            }
        }

        if show && discrete.is_empty() && continuous.is_empty() {
            return Err(ConfigError::MissingField {
                component: c,
                field: "discrete_cm",
            });
        }

        let map = if continuous.is_empty() {
            ColorMap::discrete(discrete)
        } else {
            if !discrete.is_empty() {
                diag.warn(c, "both discrete and continuous maps given; using the continuous map");
            }
            ColorMap::continuous(c, &continuous)?
        };
        Ok(Self {
            show,
            show_labels,
            map,
        })
    }
}

fn color_stop(component: &'static str, entry: &Entry) -> Result<ColorStop, ConfigError> {
    let v = entry.exactly(component, &[2, 3])?;
    Ok(ColorStop {
        value: number(component, entry, &v[0])?,
        color: v[1].clone(),
        radius: v
            .get(2)
            .map(|r| number(component, entry, r))
            .transpose()?,
    })
}

fn number(component: &'static str, entry: &Entry, value: &str) -> Result<f64, ConfigError> {
    parse_number(component, &entry.attribute, value)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContourProps {
    pub show: bool,
    pub method: ContourMethod,
    /// Per-node values for [`ContourMethod::ByFile`].
    pub file: Option<PathBuf>,
    pub width: f64,
    pub bands: Vec<ContourBand>,
}

impl ContourProps {
    pub fn parse(file: &PropertyFile, diag: &mut Diagnostics) -> Result<Self, ConfigError> {
        let c = file.component;
        let mut props = Self {
            show: false,
            method: ContourMethod::default(),
            file: None,
            width: 1.0,
            bands: Vec::new(),
        };
        for entry in &file.entries {
            match entry.attribute.as_str() {
                "show_contours" => props.show = entry.flag(c)?,
                "contour_method" => props.method = entry.parse(c)?,
                "contour_file" => props.file = Some(file.resolve(entry.first(c)?)),
                "contour_width" => props.width = entry.number(c)?,
                "contour_cm" => {
                    let v = entry.exactly(c, &[5, 4])?;
                    props.bands.push(ContourBand {
                        outer: number(c, entry, &v[0])?,
                        inner: number(c, entry, &v[1])?,
                        color: v[2].clone(),
                        opacity: number(c, entry, &v[3])?,
                        label: v.get(4).cloned().unwrap_or_default(),
                    });
                }
                _ => unexpected_attribute(file, entry, diag),
            }
        }

        if props.show {
            file.require(&["contour_method"])?;
        }
        if props.show && props.method == ContourMethod::ByFile && props.file.is_none() {
            return Err(ConfigError::MissingField {
                component: c,
                field: "contour_file",
            });
        }
        Ok(props)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineageProps {
    pub show: bool,
    pub method: LineageMethod,
    pub depth: LineageDepth,
    pub font_size: f64,
    pub font_color: String,
    pub lineages: Vec<Lineage>,
}

impl LineageProps {
    pub fn parse(file: &PropertyFile, diag: &mut Diagnostics) -> Result<Self, ConfigError> {
        let c = file.component;
        let mut props = Self {
            show: false,
            method: LineageMethod::default(),
            depth: LineageDepth::default(),
            font_size: 8.0,
            font_color: "black".to_string(),
            lineages: Vec::new(),
        };
        for entry in &file.entries {
            match entry.attribute.as_str() {
                "show_lineages" => props.show = entry.flag(c)?,
                "display_method" => props.method = entry.parse(c)?,
                "label_depth" | "depth" => props.depth = entry.parse(c)?,
                "font_size" => props.font_size = entry.number(c)?,
                "font_color" => props.font_color = entry.first(c)?.to_string(),
                "contour_width" => debug!("Ignoring contour_width; each lineage sets its own stroke."),
                "lineage" => {
                    // name color alpha stroke, or name label color alpha stroke
                    let v = entry.exactly(c, &[4, 5])?;
                    let (label, rest) = if v.len() == 5 {
                        (Some(v[1].clone()), &v[2..])
                    } else {
                        (None, &v[1..])
                    };
                    props.lineages.push(Lineage {
                        identifier: v[0].clone(),
                        label,
                        color: rest[0].clone(),
                        opacity: number(c, entry, &rest[1])?,
                        stroke_width: number(c, entry, &rest[2])?,
                    });
                }
                _ => unexpected_attribute(file, entry, diag),
            }
        }
        if props.show {
            file.require(&["display_method"])?;
            if props.method == LineageMethod::ArcLabel {
                file.require(&["font_size", "font_color"])?;
            }
        }
        Ok(props)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelProps {
    pub style: LabelStyle,
}

impl LabelProps {
    pub fn parse(file: &PropertyFile, diag: &mut Diagnostics) -> Result<Self, ConfigError> {
        let c = file.component;
        let mut style = LabelStyle::default();
        for entry in &file.entries {
            match entry.attribute.as_str() {
                "show_leaf_labels" => style.show_leaf_labels = entry.flag(c)?,
                "show_internal_labels" => style.show_internal_labels = entry.flag(c)?,
                "internal_font_size" => style.internal_font_size = entry.number(c)?,
                "internal_font_color" => style.internal_font_color = entry.first(c)?.to_string(),
                "leaf_font_size" => style.leaf_font_size = entry.number(c)?,
                "leaf_font_color" => style.leaf_font_color = entry.first(c)?.to_string(),
                "internal_labels" => style.internal_labels.extend(entry.values.iter().cloned()),
                _ => unexpected_attribute(file, entry, diag),
            }
        }
        Ok(Self { style })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolProps {
    pub show: bool,
    pub specs: BTreeMap<String, SymbolSpec>,
    pub file: Option<PathBuf>,
}

impl SymbolProps {
    pub fn parse(file: &PropertyFile, diag: &mut Diagnostics) -> Result<Self, ConfigError> {
        let c = file.component;
        let mut props = Self::default();
        for entry in &file.entries {
            match entry.attribute.as_str() {
                "show_symbols" => props.show = entry.flag(c)?,
                "symbol_file" => props.file = Some(file.resolve(entry.first(c)?)),
                "symbol" => {
                    let v = entry.exactly(c, &[5])?;
                    let column = v[1]
                        .parse::<usize>()
                        .map_err(|_| ConfigError::invalid_number(c, "symbol", &v[1]))?;
                    props.specs.insert(
                        v[0].clone(),
                        SymbolSpec {
                            column,
                            shape: v[2].parse()?,
                            color: v[3].clone(),
                            size: number(c, entry, &v[4])?,
                        },
                    );
                }
                _ => unexpected_attribute(file, entry, diag),
            }
        }

        if props.show && props.file.is_none() {
            return Err(ConfigError::MissingField {
                component: c,
                field: "symbol_file",
            });
        }
        Ok(props)
    }
}
