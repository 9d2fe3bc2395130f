//! Layout and SVG rendering of annotated phylogenetic trees.

pub mod app;
pub mod config;
pub mod decorate;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod geometry;
pub mod io;
pub mod rotated_text;
pub mod tree;
