use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use crate::config::{Config, ContourProps, SymbolProps};
use crate::decorate::branches::draw_branches;
use crate::decorate::collapsed::resolve_roots;
use crate::decorate::contour::ContourMethod;
use crate::decorate::scale::{draw_scale_bar, draw_scale_lines};
use crate::decorate::symbols::SymbolTable;
use crate::decorate::{
    BootstrapDecorator, CollapsedLineageDecorator, ContourDecorator, LabelDecorator,
    LineageDecorator, Pipeline, RenderContext, SymbolDecorator,
};
use crate::diagnostics::Diagnostics;
use crate::export::svg::SvgCanvas;
use crate::io;
use crate::tree::layout::{LayoutEngine, LayoutSummary};
use crate::tree::Tree;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "phylodraw",
    about = "Render annotated phylogenetic trees as SVG."
)]
pub struct AppConfig {
    /// Tree file in Newick format.
    #[arg(value_name = "TREE_FILE")]
    pub tree_path: PathBuf,

    /// Master configuration file listing the property files.
    #[arg(value_name = "CONFIG_FILE")]
    pub config_path: PathBuf,

    /// Canvas width in inches
    #[arg(long, default_value_t = 8.0)]
    pub width: f64,

    /// Canvas height in inches
    #[arg(long, default_value_t = 8.0)]
    pub height: f64,

    /// Pixels per inch
    #[arg(long, default_value_t = 90.0)]
    pub dpi: f64,

    /// Output path without extension; `.svg` (and `.png`) are appended.
    #[arg(short, long, value_name = "PREFIX", default_value = "tree")]
    pub output: PathBuf,

    /// Also rasterize the SVG to PNG with inkscape.
    #[arg(long)]
    pub png: bool,
}

impl AppConfig {
    pub fn context(&self) -> RenderContext {
        RenderContext::new(self.width, self.height, self.dpi)
    }

    pub fn svg_path(&self) -> PathBuf {
        with_suffix(&self.output, ".svg")
    }

    pub fn png_path(&self) -> PathBuf {
        with_suffix(&self.output, ".png")
    }
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Result of a single drawing pass.
pub struct Drawing {
    pub canvas: SvgCanvas,
    pub layout: LayoutSummary,
    pub decorators: Vec<&'static str>,
}

pub struct PhyloDraw;

impl PhyloDraw {
    pub fn run(config: &AppConfig) -> Result<()> {
        let mut diag = Diagnostics::new();
        let drawing = Self::draw(&config.tree_path, &config.config_path, config.context(), &mut diag)?;

        let svg_path = config.svg_path();
        drawing.canvas.save(&svg_path)?;
        info!("Wrote {}.", svg_path.display());

        if config.png {
            Self::rasterize(config, &svg_path)?;
        }

        diag.report();
        Ok(())
    }

    /// Load configuration, data files and tree, lay the tree out and draw
    /// every enabled layer.
    pub fn draw(
        tree_path: &Path,
        config_path: &Path,
        ctx: RenderContext,
        diag: &mut Diagnostics,
    ) -> Result<Drawing> {
        let config = Config::load(config_path, diag)
            .with_context(|| format!("invalid configuration: {}", config_path.display()))?;

        let contour_values = read_contour_values(config.contour.as_ref())?;
        let symbol_table = match config.symbols.as_ref() {
            Some(SymbolProps {
                show: true,
                file: Some(file),
                ..
            }) => Some(io::read_symbol_table(file)?),
            _ => None,
        };

        let mut tree = io::load_tree(tree_path)?;
        let tree_props = &config.tree;
        tree.ladderize(tree_props.ladderize);
        tree.apply_transform(tree_props.transform);

        let mut engine = LayoutEngine::new(tree_props.layout_params(&ctx));
        if let Some(collapse) = config.collapse.as_ref().filter(|c| c.show) {
            let roots = resolve_roots(&tree, &collapse.lineages, diag);
            engine = engine.with_collapse(collapse.sizing, roots);
        }
        let layout = engine.run(&mut tree)?;

        let mut canvas = SvgCanvas::new(ctx.canvas_size.x, ctx.canvas_size.y);
        if tree_props.show_tree {
            info!("Rendering branches.");
            draw_branches(&tree, &tree_props.branch, &mut canvas);
        }

        let mut pipeline = build_pipeline(&config, &tree, ctx, contour_values, symbol_table);
        let decorators = pipeline.names();
        pipeline.run(&mut tree, &mut canvas, diag);

        draw_scale_lines(&tree, &tree_props.scale, &mut canvas);
        draw_scale_bar(&tree, &tree_props.scale, &ctx, &mut canvas);

        Ok(Drawing {
            canvas,
            layout,
            decorators,
        })
    }

    fn rasterize(config: &AppConfig, svg_path: &Path) -> Result<()> {
        let Ok(inkscape) = which::which("inkscape") else {
            warn!("inkscape was not found on PATH; skipping PNG output.");
            return Ok(());
        };
        let png_path = config.png_path();
        let ctx = config.context();
        info!("Rasterizing {} with {}.", svg_path.display(), inkscape.display());

        let status = Command::new(&inkscape)
            .arg("-e")
            .arg(&png_path)
            .args(["-d", &config.dpi.to_string()])
            .arg("-z")
            .args(["-w", &ctx.canvas_size.x.round().to_string()])
            .args(["-h", &ctx.canvas_size.y.round().to_string()])
            .arg(svg_path)
            .status()
            .with_context(|| format!("failed to run {}", inkscape.display()))?;
        if !status.success() {
            bail!("inkscape exited with {status}");
        }
        info!("Wrote {}.", png_path.display());
        Ok(())
    }
}

fn read_contour_values(props: Option<&ContourProps>) -> Result<Vec<(String, f64)>> {
    match props {
        Some(ContourProps {
            show: true,
            method: ContourMethod::ByFile,
            file: Some(file),
            ..
        }) => io::read_contour_values(file),
        _ => Ok(Vec::new()),
    }
}

fn build_pipeline(
    config: &Config,
    tree: &Tree,
    ctx: RenderContext,
    contour_values: Vec<(String, f64)>,
    symbol_table: Option<SymbolTable>,
) -> Pipeline {
    let mut pipeline = Pipeline::new();

    if let Some(props) = config.bootstrap.as_ref().filter(|p| p.show) {
        let radius = config.tree.node_radius * tree.width;
        pipeline.push(BootstrapDecorator::new(
            props.map.clone(),
            radius,
            props.show_labels,
            ctx,
        ));
    }
    if let Some(props) = config.contour.as_ref().filter(|p| p.show) {
        pipeline.push(ContourDecorator::new(
            props.method,
            props.bands.clone(),
            props.width,
            contour_values,
            ctx,
        ));
    }
    if let Some(props) = config.lineage.as_ref().filter(|p| p.show) {
        pipeline.push(LineageDecorator::new(
            props.method,
            props.depth,
            props.lineages.clone(),
            props.font_size,
            props.font_color.clone(),
        ));
    }
    if let Some(props) = config.collapse.as_ref().filter(|p| p.show) {
        pipeline.push(CollapsedLineageDecorator::new(
            props.style.clone(),
            props.lineages.clone(),
            ctx,
        ));
    }
    if let (Some(props), Some(table)) = (config.symbols.as_ref().filter(|p| p.show), symbol_table) {
        pipeline.push(SymbolDecorator::new(props.specs.clone(), table, ctx));
    }
    if let Some(props) = config.labels.as_ref() {
        pipeline.push(LabelDecorator::new(props.style.clone()));
    }

    pipeline
}
