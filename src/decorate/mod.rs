//! Annotation layers drawn on top of a laid-out tree.
//!
//! Each decorator may first write one field of the tree in [`Decorator::decorate`]
//! and later emits primitives in [`Decorator::render`]. The pipeline runs every
//! `decorate` step before any `render` step, in a fixed order.

use glam::DVec2;
use log::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::export::Canvas;
use crate::tree::Tree;

pub mod bootstrap;
pub mod branches;
pub mod collapsed;
pub mod color;
pub mod contour;
pub mod labels;
pub mod lineage;
pub mod scale;
pub mod symbols;

pub use bootstrap::BootstrapDecorator;
pub use collapsed::CollapsedLineageDecorator;
pub use contour::ContourDecorator;
pub use labels::LabelDecorator;
pub use lineage::LineageDecorator;
pub use symbols::SymbolDecorator;

/// Canvas-wide measurements shared by the decorators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub canvas_size: DVec2,
    /// Pixels per inch.
    pub inch: f64,
    pub font_size: f64,
}

impl RenderContext {
    pub fn new(width_inches: f64, height_inches: f64, dpi: f64) -> Self {
        Self {
            canvas_size: DVec2::new(width_inches * dpi, height_inches * dpi),
            inch: dpi,
            font_size: (8.0 * dpi / 90.0 + 0.5).floor(),
        }
    }
}

/// Position of a decorator in the fixed drawing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Bootstrap,
    Contour,
    Lineage,
    Collapsed,
    Symbols,
    Labels,
}

pub trait Decorator {
    fn name(&self) -> &'static str;

    fn stage(&self) -> Stage;

    /// Attach derived values to the tree before anything is drawn.
    fn decorate(&mut self, _tree: &mut Tree, _diag: &mut Diagnostics) {}

    fn render(&self, tree: &Tree, canvas: &mut dyn Canvas, diag: &mut Diagnostics);
}

#[derive(Default)]
pub struct Pipeline {
    decorators: Vec<Box<dyn Decorator>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decorator: impl Decorator + 'static) {
        self.decorators.push(Box::new(decorator));
        self.decorators.sort_by_key(|d| d.stage());
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.decorators.iter().map(|d| d.name()).collect()
    }

    pub fn run(&mut self, tree: &mut Tree, canvas: &mut dyn Canvas, diag: &mut Diagnostics) {
        for decorator in &mut self.decorators {
            debug!("Decorating tree: {}", decorator.name());
            decorator.decorate(tree, diag);
        }
        for decorator in &self.decorators {
            info!("Rendering {}.", decorator.name());
            decorator.render(tree, canvas, diag);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::recording::{RecordingCanvas, Recorded};
    use crate::export::Style;
    use crate::tree::fixtures::balanced_four;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Probe {
        name: &'static str,
        stage: Stage,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Decorator for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn stage(&self) -> Stage {
            self.stage
        }

        fn decorate(&mut self, _tree: &mut Tree, _diag: &mut Diagnostics) {
            self.log.borrow_mut().push(format!("decorate {}", self.name));
        }

        fn render(&self, _tree: &Tree, canvas: &mut dyn Canvas, _diag: &mut Diagnostics) {
            self.log.borrow_mut().push(format!("render {}", self.name));
            canvas.begin_group(self.name);
            canvas.circle(DVec2::ZERO, 1.0, Style::default());
            canvas.end_group();
        }
    }

    #[test]
    fn runs_all_decorate_steps_before_rendering_in_stage_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        for (name, stage) in [
            ("labels", Stage::Labels),
            ("bootstrap", Stage::Bootstrap),
            ("contour", Stage::Contour),
        ] {
            pipeline.push(Probe {
                name,
                stage,
                log: Rc::clone(&log),
            });
        }

        let mut tree = balanced_four();
        let mut canvas = RecordingCanvas::new();
        let mut diag = Diagnostics::new();
        pipeline.run(&mut tree, &mut canvas, &mut diag);

        assert_eq!(
            *log.borrow(),
            vec![
                "decorate bootstrap",
                "decorate contour",
                "decorate labels",
                "render bootstrap",
                "render contour",
                "render labels",
            ]
        );
        assert_eq!(canvas.groups(), vec!["bootstrap", "contour", "labels"]);
        assert_eq!(canvas.calls.last(), Some(&Recorded::End));
    }

    #[test]
    fn font_size_scales_with_dpi() {
        assert_eq!(RenderContext::new(1.0, 1.0, 90.0).font_size, 8.0);
        assert_eq!(RenderContext::new(1.0, 1.0, 300.0).font_size, 27.0);
        assert_eq!(RenderContext::new(2.0, 3.0, 100.0).canvas_size, DVec2::new(200.0, 300.0));
    }
}
