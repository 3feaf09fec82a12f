//! SVG renderer for resolved layouts
//!
//! Takes a LayoutResult and produces SVG markup. Rendering is a pure
//! function of the layout and the configuration; nothing here touches the
//! file system.

pub mod config;
mod debug;
pub mod svg;

pub use config::{DebugOverlay, SvgConfig};
pub use svg::{format_number, render_svg, SvgBuilder};
