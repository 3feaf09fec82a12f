//! StagScribe - a plain-language scene description compiler
//!
//! This library provides a parser, layout resolver, and SVG renderer for
//! StagScribe documents. Elements are positioned with absolute coordinates,
//! percentages of their enclosing box, or relative to other named elements,
//! and are emitted in document order.
//!
//! # Example
//!
//! ```rust
//! use stagscribe::render;
//!
//! let svg = render("canvas 200 by 100\nrect \"box\"\n  size 50 by 20\n  at center\n  fill light blue\n").unwrap();
//! assert!(svg.contains(r##"<rect id="box" x="75" y="40" width="50" height="20" fill="#ADD8E6"/>"##));
//! ```

pub mod colors;
pub mod error;
pub mod layout;
pub mod parser;
pub mod renderer;

pub use colors::{Color, ColorTable};
pub use error::ParseError;
pub use layout::{LayoutConfig, LayoutError, LayoutResult};
pub use parser::{parse, Document};
pub use renderer::{render_svg, DebugOverlay, SvgConfig};

use log::warn;
use rayon::prelude::*;
use thiserror::Error;

/// Errors that can occur during the render pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// Error during parsing
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// Error during layout
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

impl From<Vec<ParseError>> for RenderError {
    fn from(errors: Vec<ParseError>) -> Self {
        RenderError::Parse(errors)
    }
}

impl RenderError {
    /// Render the error as an annotated report against the source
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            RenderError::Parse(errors) => errors
                .iter()
                .map(|e| e.format(source, filename))
                .collect::<Vec<_>>()
                .join("\n"),
            RenderError::Layout(err) => err.format(source, filename),
        }
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration for the complete render pipeline
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Layout configuration
    pub layout: LayoutConfig,
    /// SVG output configuration
    pub svg: SvgConfig,
    /// Named colors available to documents
    pub colors: ColorTable,
    /// Debug layers drawn over the scene
    pub debug: DebugOverlay,
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout configuration
    pub fn with_layout(mut self, config: LayoutConfig) -> Self {
        self.layout = config;
        self
    }

    /// Set the SVG configuration
    pub fn with_svg(mut self, config: SvgConfig) -> Self {
        self.svg = config;
        self
    }

    /// Replace the named color table
    pub fn with_colors(mut self, colors: ColorTable) -> Self {
        self.colors = colors;
        self
    }

    /// Select debug overlay layers
    pub fn with_debug(mut self, debug: DebugOverlay) -> Self {
        self.debug = debug;
        self
    }
}

/// Render source to SVG with default configuration
///
/// This is the main entry point for the library. It parses the source,
/// resolves the layout, and generates SVG output.
///
/// # Example
///
/// ```rust
/// use stagscribe::render;
///
/// let svg = render(r#"
/// canvas 400 by 300
/// rect "A"
///   at center
/// rect "B"
///   below "A" with gap 20
/// "#).unwrap();
///
/// assert!(svg.contains(r#"id="A""#));
/// assert!(svg.contains(r#"id="B""#));
/// ```
pub fn render(source: &str) -> Result<String, RenderError> {
    render_with_config(source, &RenderConfig::default())
}

/// Render source to SVG with custom configuration
///
/// # Example
///
/// ```rust
/// use stagscribe::{render_with_config, RenderConfig, LayoutConfig, SvgConfig};
///
/// let config = RenderConfig::new()
///     .with_layout(LayoutConfig::default().with_rect_size(40.0, 40.0))
///     .with_svg(SvgConfig::default().with_pretty_print(false));
///
/// let svg = render_with_config("canvas 100 by 100\nrect\n", &config).unwrap();
/// assert!(svg.contains(r#"<rect x="0" y="0" width="40" height="40"/>"#));
/// ```
pub fn render_with_config(source: &str, config: &RenderConfig) -> Result<String, RenderError> {
    let doc = parse(source)?;
    Ok(compile(&doc, config)?)
}

/// Compile a parsed document to SVG.
///
/// Builds the symbol table and dependency graph, resolves every element,
/// then emits SVG. Lint findings are logged with `warn!` and never fail the
/// compile.
pub fn compile(doc: &Document, config: &RenderConfig) -> Result<String, LayoutError> {
    let result = layout::resolve(doc, &config.layout, &config.colors)?;

    for warning in layout::lint::check(doc, &result) {
        warn!("{}", warning);
    }

    Ok(render_svg(&result, &config.svg, &config.debug))
}

/// Render several documents in parallel on the rayon thread pool.
///
/// Documents share nothing but the read-only configuration; results come
/// back in input order.
pub fn render_batch(sources: &[&str], config: &RenderConfig) -> Vec<Result<String, RenderError>> {
    sources
        .par_iter()
        .map(|source| render_with_config(source, config))
        .collect()
}
