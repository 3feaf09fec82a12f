//! SVG generation from layout results
//!
//! Elements are emitted in document order (groups recurse into their
//! children), never in resolution order. Every tag writes its attributes in
//! a fixed order, so identical input gives byte-identical output.

use crate::colors::Color;
use crate::layout::{svg_id, ElementLayout, Gradient, LayoutResult, Paint, ResolvedStyles, Shape};
use crate::parser::ast::{DashStyle, FontWeight, TextAlign};

use super::config::{DebugOverlay, SvgConfig};
use super::debug;

/// Attributes of one tag, in emission order
pub type Attrs = Vec<(&'static str, String)>;

/// Build SVG elements incrementally
pub struct SvgBuilder {
    config: SvgConfig,
    background: Option<Color>,
    /// Lines inside `<defs>`, with their depth below it
    defs: Vec<(usize, String)>,
    /// Lines inside the root element, with their depth below it
    elements: Vec<(usize, String)>,
    depth: usize,
}

impl SvgBuilder {
    /// Create a new SVG builder
    pub fn new(config: SvgConfig) -> Self {
        Self {
            config,
            background: None,
            defs: vec![],
            elements: vec![],
            depth: 0,
        }
    }

    /// Format a number with the configured precision
    pub fn num(&self, value: f64) -> String {
        format_number(value, self.config.precision)
    }

    fn newline(&self) -> &str {
        if self.config.pretty_print {
            "\n"
        } else {
            ""
        }
    }

    fn push_line(&self, svg: &mut String, depth: usize, line: &str) {
        if self.config.pretty_print {
            svg.push_str(&"  ".repeat(depth));
        }
        svg.push_str(line);
        svg.push_str(self.newline());
    }

    /// Fill the whole canvas with a color behind every element
    pub fn set_background(&mut self, color: Color) {
        self.background = Some(color);
    }

    /// Add a vertical linear gradient definition
    pub fn add_gradient(&mut self, gradient: &Gradient) {
        self.defs.push((
            0,
            format!(
                r#"<linearGradient id="{}" x1="0" y1="0" x2="0" y2="1">"#,
                escape_xml(&gradient.id)
            ),
        ));
        self.defs.push((
            1,
            format!(r#"<stop offset="0" stop-color="{}"/>"#, gradient.from),
        ));
        self.defs.push((
            1,
            format!(r#"<stop offset="1" stop-color="{}"/>"#, gradient.to),
        ));
        self.defs.push((0, "</linearGradient>".to_string()));
    }

    /// Add an empty element
    pub fn add_element(&mut self, tag: &str, attrs: &Attrs) {
        self.elements
            .push((self.depth, format!("<{}{}/>", tag, format_attrs(attrs))));
    }

    /// Add a text element with escaped content
    pub fn add_text_element(&mut self, attrs: &Attrs, content: &str) {
        self.elements.push((
            self.depth,
            format!("<text{}>{}</text>", format_attrs(attrs), escape_xml(content)),
        ));
    }

    /// Open a group element
    pub fn start_group(&mut self, attrs: &Attrs) {
        self.elements
            .push((self.depth, format!("<g{}>", format_attrs(attrs))));
        self.depth += 1;
    }

    /// Close a group element
    pub fn end_group(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.elements.push((self.depth, "</g>".to_string()));
    }

    /// Build the final SVG string
    pub fn build(self, width: f64, height: f64) -> String {
        let mut svg = String::new();

        if self.config.standalone {
            svg.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
            svg.push_str(self.newline());
        }

        let (w, h) = (self.num(width), self.num(height));
        let root = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{}">"#,
            escape_xml(&self.config.font_family)
        );
        self.push_line(&mut svg, 0, &root);

        if let Some(background) = self.background {
            let rect = format!(r#"<rect width="100%" height="100%" fill="{}"/>"#, background);
            self.push_line(&mut svg, 1, &rect);
        }

        if !self.defs.is_empty() {
            self.push_line(&mut svg, 1, "<defs>");
            for (depth, line) in &self.defs {
                self.push_line(&mut svg, depth + 2, line);
            }
            self.push_line(&mut svg, 1, "</defs>");
        }

        for (depth, line) in &self.elements {
            self.push_line(&mut svg, depth + 1, line);
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Render a resolved layout to an SVG string
pub fn render_svg(result: &LayoutResult, config: &SvgConfig, overlay: &DebugOverlay) -> String {
    let mut builder = SvgBuilder::new(config.clone());

    if let Some(background) = result.canvas.background {
        builder.set_background(background);
    }
    for gradient in &result.gradients {
        builder.add_gradient(gradient);
    }

    for id in &result.top_level {
        if let Some(element) = result.get(*id) {
            render_element(result, element, &mut builder);
        }
    }

    if overlay.is_enabled() {
        debug::render_overlay(result, overlay, &mut builder);
    }

    builder.build(result.canvas.width, result.canvas.height)
}

/// Render a single element (and, for groups, its children) to the builder
fn render_element(result: &LayoutResult, element: &ElementLayout, builder: &mut SvgBuilder) {
    let b = &element.bounds;
    let styles = &element.styles;
    let center = b.center();
    let mut attrs: Attrs = vec![];

    if let Some(name) = &element.name {
        attrs.push(("id", svg_id(name)));
    }

    match &element.shape {
        Shape::Rectangle => {
            attrs.push(("x", builder.num(b.x)));
            attrs.push(("y", builder.num(b.y)));
            attrs.push(("width", builder.num(b.width)));
            attrs.push(("height", builder.num(b.height)));
            if let Some(r) = styles.corner_radius {
                attrs.push(("rx", builder.num(r)));
                attrs.push(("ry", builder.num(r)));
            }
            push_fill(&mut attrs, result, styles);
            push_stroke(&mut attrs, builder, styles, None);
            push_transform(&mut attrs, builder, element, None);
            builder.add_element("rect", &attrs);
        }
        Shape::Circle => {
            attrs.push(("cx", builder.num(center.x)));
            attrs.push(("cy", builder.num(center.y)));
            attrs.push(("r", builder.num(b.width.min(b.height) / 2.0)));
            push_fill(&mut attrs, result, styles);
            push_stroke(&mut attrs, builder, styles, None);
            push_transform(&mut attrs, builder, element, None);
            builder.add_element("circle", &attrs);
        }
        Shape::Ellipse => {
            attrs.push(("cx", builder.num(center.x)));
            attrs.push(("cy", builder.num(center.y)));
            attrs.push(("rx", builder.num(b.width / 2.0)));
            attrs.push(("ry", builder.num(b.height / 2.0)));
            push_fill(&mut attrs, result, styles);
            push_stroke(&mut attrs, builder, styles, None);
            push_transform(&mut attrs, builder, element, None);
            builder.add_element("ellipse", &attrs);
        }
        Shape::Line { from, to } => {
            attrs.push(("x1", builder.num(from.x)));
            attrs.push(("y1", builder.num(from.y)));
            attrs.push(("x2", builder.num(to.x)));
            attrs.push(("y2", builder.num(to.y)));
            // A line has no interior; it is only visible through its stroke
            attrs.push(("fill", "none".to_string()));
            push_stroke(&mut attrs, builder, styles, Some(Color::BLACK));
            push_transform(&mut attrs, builder, element, None);
            builder.add_element("line", &attrs);
        }
        Shape::Polygon { points } => {
            let points = points
                .iter()
                .map(|p| format!("{},{}", builder.num(p.x), builder.num(p.y)))
                .collect::<Vec<_>>()
                .join(" ");
            attrs.push(("points", points));
            push_fill(&mut attrs, result, styles);
            push_stroke(&mut attrs, builder, styles, None);
            push_transform(&mut attrs, builder, element, None);
            builder.add_element("polygon", &attrs);
        }
        Shape::Path { d } => {
            attrs.push(("d", d.clone()));
            push_fill(&mut attrs, result, styles);
            push_stroke(&mut attrs, builder, styles, None);
            let offset = (b.x != 0.0 || b.y != 0.0).then_some((b.x, b.y));
            push_transform(&mut attrs, builder, element, offset);
            builder.add_element("path", &attrs);
        }
        Shape::Image { src } => {
            attrs.push(("x", builder.num(b.x)));
            attrs.push(("y", builder.num(b.y)));
            attrs.push(("width", builder.num(b.width)));
            attrs.push(("height", builder.num(b.height)));
            if let Some(src) = src {
                attrs.push(("href", src.clone()));
            }
            push_stroke(&mut attrs, builder, styles, None);
            push_transform(&mut attrs, builder, element, None);
            builder.add_element("image", &attrs);
        }
        Shape::Text { content } => {
            let (x, anchor) = match styles.text_align.unwrap_or(TextAlign::Center) {
                TextAlign::Left => (b.x, "start"),
                TextAlign::Center => (center.x, "middle"),
                TextAlign::Right => (b.right(), "end"),
            };
            attrs.push(("x", builder.num(x)));
            attrs.push(("y", builder.num(center.y)));
            attrs.push(("text-anchor", anchor.to_string()));
            attrs.push(("dominant-baseline", "central".to_string()));
            if let Some(size) = styles.font_size {
                attrs.push(("font-size", builder.num(size)));
            }
            match styles.font_weight {
                Some(FontWeight::Bold) => attrs.push(("font-weight", "bold".to_string())),
                Some(FontWeight::Light) => attrs.push(("font-weight", "300".to_string())),
                None => {}
            }
            if styles.italic {
                attrs.push(("font-style", "italic".to_string()));
            }
            if let Some(family) = &styles.font_family {
                attrs.push(("font-family", family.clone()));
            }
            match styles.text_color {
                Some(color) => attrs.push(("fill", color.to_string())),
                None => push_fill(&mut attrs, result, styles),
            }
            push_stroke(&mut attrs, builder, styles, None);
            push_transform(&mut attrs, builder, element, None);
            builder.add_text_element(&attrs, content);
        }
        Shape::Group => {
            push_fill(&mut attrs, result, styles);
            push_stroke(&mut attrs, builder, styles, None);
            push_transform(&mut attrs, builder, element, None);
            builder.start_group(&attrs);
            for child in &element.children {
                if let Some(child) = result.get(*child) {
                    render_element(result, child, builder);
                }
            }
            builder.end_group();
        }
    }
}

fn paint_value(result: &LayoutResult, paint: &Paint) -> Option<String> {
    match paint {
        Paint::Solid(color) => Some(color.to_string()),
        Paint::Gradient(index) => result
            .gradients
            .get(*index)
            .map(|g| format!("url(#{})", g.id)),
    }
}

fn push_fill(attrs: &mut Attrs, result: &LayoutResult, styles: &ResolvedStyles) {
    if let Some(fill) = styles.fill.as_ref().and_then(|p| paint_value(result, p)) {
        attrs.push(("fill", fill));
    }
}

/// Stroke, stroke width, dash pattern and opacity, in that order
fn push_stroke(
    attrs: &mut Attrs,
    builder: &SvgBuilder,
    styles: &ResolvedStyles,
    default_stroke: Option<Color>,
) {
    if let Some(stroke) = styles.stroke.or(default_stroke) {
        attrs.push(("stroke", stroke.to_string()));
    }
    if let Some(width) = styles.stroke_width {
        attrs.push(("stroke-width", builder.num(width)));
    }
    match styles.dash {
        Some(DashStyle::Dashed) => attrs.push(("stroke-dasharray", "8,4".to_string())),
        Some(DashStyle::Dotted) => attrs.push(("stroke-dasharray", "2,2".to_string())),
        None => {}
    }
    if let Some(opacity) = styles.opacity {
        attrs.push(("opacity", builder.num(opacity)));
    }
}

/// Rotation around the element center, then the local offset for paths
fn push_transform(
    attrs: &mut Attrs,
    builder: &SvgBuilder,
    element: &ElementLayout,
    offset: Option<(f64, f64)>,
) {
    let mut parts = vec![];
    if let Some(degrees) = element.styles.rotation.filter(|d| *d != 0.0) {
        let c = element.bounds.center();
        parts.push(format!(
            "rotate({} {} {})",
            builder.num(degrees),
            builder.num(c.x),
            builder.num(c.y)
        ));
    }
    if let Some((x, y)) = offset {
        parts.push(format!("translate({} {})", builder.num(x), builder.num(y)));
    }
    if !parts.is_empty() {
        attrs.push(("transform", parts.join(" ")));
    }
}

fn format_attrs(attrs: &Attrs) -> String {
    attrs
        .iter()
        .map(|(key, value)| format!(r#" {}="{}""#, key, escape_xml(value)))
        .collect()
}

/// Round to `precision` decimals, dropping trailing zeros and negative zero
pub fn format_number(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Escape special XML characters
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
