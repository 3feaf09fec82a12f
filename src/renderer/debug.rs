//! Debug overlay drawn over a rendered scene
//!
//! Everything goes into one trailing `<g class="debug">` so the scene itself
//! is unchanged and the overlay can be stripped by removing a single group.

use crate::layout::LayoutResult;

use super::config::DebugOverlay;
use super::svg::{Attrs, SvgBuilder};

const GRID_STEP: f64 = 100.0;
const OVERLAY_COLOR: &str = "#FF00FF";
const GRID_COLOR: &str = "#999999";

pub(crate) fn render_overlay(result: &LayoutResult, overlay: &DebugOverlay, builder: &mut SvgBuilder) {
    builder.start_group(&vec![("class", "debug".to_string())]);

    if overlay.grid {
        render_grid(result, builder);
    }
    if overlay.boxes {
        render_boxes(result, builder);
    }
    if overlay.labels {
        render_labels(result, builder);
    }

    builder.end_group();
}

fn grid_positions(extent: f64) -> impl Iterator<Item = f64> {
    (0..)
        .map(|i| i as f64 * GRID_STEP)
        .take_while(move |p| *p <= extent)
}

fn render_grid(result: &LayoutResult, builder: &mut SvgBuilder) {
    let (width, height) = (result.canvas.width, result.canvas.height);
    builder.start_group(&vec![
        ("class", "debug-grid".to_string()),
        ("opacity", "0.4".to_string()),
    ]);

    for x in grid_positions(width) {
        let line: Attrs = vec![
            ("x1", builder.num(x)),
            ("y1", "0".to_string()),
            ("x2", builder.num(x)),
            ("y2", builder.num(height)),
            ("stroke", GRID_COLOR.to_string()),
            ("stroke-width", "0.5".to_string()),
        ];
        builder.add_element("line", &line);
        let label: Attrs = vec![
            ("x", builder.num(x + 2.0)),
            ("y", "10".to_string()),
            ("font-size", "8".to_string()),
            ("fill", GRID_COLOR.to_string()),
        ];
        let text = builder.num(x);
        builder.add_text_element(&label, &text);
    }

    for y in grid_positions(height) {
        let line: Attrs = vec![
            ("x1", "0".to_string()),
            ("y1", builder.num(y)),
            ("x2", builder.num(width)),
            ("y2", builder.num(y)),
            ("stroke", GRID_COLOR.to_string()),
            ("stroke-width", "0.5".to_string()),
        ];
        builder.add_element("line", &line);
        if y > 0.0 {
            let label: Attrs = vec![
                ("x", "2".to_string()),
                ("y", builder.num(y - 2.0)),
                ("font-size", "8".to_string()),
                ("fill", GRID_COLOR.to_string()),
            ];
            let text = builder.num(y);
            builder.add_text_element(&label, &text);
        }
    }

    builder.end_group();
}

fn render_boxes(result: &LayoutResult, builder: &mut SvgBuilder) {
    for element in &result.elements {
        let b = &element.bounds;
        let rect: Attrs = vec![
            ("x", builder.num(b.x)),
            ("y", builder.num(b.y)),
            ("width", builder.num(b.width)),
            ("height", builder.num(b.height)),
            ("fill", "none".to_string()),
            ("stroke", OVERLAY_COLOR.to_string()),
            ("stroke-width", "1".to_string()),
            ("stroke-dasharray", "4,2".to_string()),
        ];
        builder.add_element("rect", &rect);
    }
}

fn render_labels(result: &LayoutResult, builder: &mut SvgBuilder) {
    for element in &result.elements {
        let b = &element.bounds;
        let text: Attrs = vec![
            ("x", builder.num(b.x + 2.0)),
            ("y", builder.num(b.y + 10.0)),
            ("font-size", "10".to_string()),
            ("fill", OVERLAY_COLOR.to_string()),
        ];
        builder.add_text_element(&text, &element.label());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::ColorTable;
    use crate::layout::{resolve, LayoutConfig};
    use crate::parser::parse;
    use crate::renderer::{render_svg, SvgConfig};

    fn render(src: &str, overlay: DebugOverlay) -> String {
        let doc = parse(src).expect("parse");
        let result = resolve(&doc, &LayoutConfig::default(), &ColorTable::default()).expect("resolve");
        render_svg(&result, &SvgConfig::default(), &overlay)
    }

    #[test]
    fn test_no_overlay_by_default() {
        let out = render("canvas 200 by 100\nrect\n", DebugOverlay::none());
        assert!(!out.contains("debug"));
    }

    #[test]
    fn test_boxes_and_labels() {
        let out = render(
            "canvas 200 by 100\nrect \"A\"\n  size 50 by 20\ncircle\n  radius 5\n",
            DebugOverlay::none().with_boxes(true).with_labels(true),
        );
        assert!(out.contains(r#"<g class="debug">"#));
        assert!(out.contains(
            r##"<rect x="0" y="0" width="50" height="20" fill="none" stroke="#FF00FF" stroke-width="1" stroke-dasharray="4,2"/>"##
        ));
        assert!(out.contains(">A</text>"));
        assert!(out.contains(">&lt;circle #1&gt;</text>"));
        assert!(!out.contains("debug-grid"));
    }

    #[test]
    fn test_grid_lines() {
        let out = render("canvas 250 by 100\n", DebugOverlay::none().with_grid(true));
        assert!(out.contains(r#"<g class="debug-grid" opacity="0.4">"#));
        // x = 0, 100, 200 and y = 0, 100
        assert_eq!(out.matches("<line ").count(), 5);
        assert!(out.contains(r#"<line x1="200" y1="0" x2="200" y2="100""#));
    }

    #[test]
    fn test_overlay_comes_last() {
        let out = render("canvas 200 by 100\nrect\n", DebugOverlay::all());
        let scene = out.find("<rect x=\"0\" y=\"0\" width=\"100\" height=\"60\"/>").expect("scene rect");
        let overlay = out.find("<g class=\"debug\">").expect("overlay");
        assert!(scene < overlay);
        assert!(out.ends_with("</g>\n</svg>"));
    }
}
