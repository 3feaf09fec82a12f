//! Lint checks for resolved scenes.
//!
//! Runs after resolution and reports things that compile but are probably
//! not what the author meant: a missing canvas, shapes that fall back to
//! default sizes, and elements extending past the canvas edge. Warnings
//! never fail a compile.

use std::fmt;

use crate::parser::ast::{Document, ElementDecl, ElementKind, Span, Spanned, Statement, StyleProperty};

use super::expand::expand;
use super::types::{BoundingBox, ElementId, ElementLayout, LayoutResult};

/// Slack allowed when comparing boxes against the canvas edge
const EPSILON: f64 = 1e-6;

/// A lint warning about a likely authoring mistake
#[derive(Debug, Clone, PartialEq)]
pub struct LintWarning {
    pub category: LintCategory,
    pub message: String,
    pub element: Option<ElementId>,
    pub span: Option<Span>,
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Category of lint finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCategory {
    Structure,
    Style,
    Containment,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::Structure => write!(f, "structure"),
            LintCategory::Style => write!(f, "style"),
            LintCategory::Containment => write!(f, "containment"),
        }
    }
}

/// Run all lint checks on a resolved document.
pub fn check(doc: &Document, result: &LayoutResult) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    check_structure(doc, result, &mut warnings);
    check_styles(doc, result, &mut warnings);
    check_containment(result, &mut warnings);
    warnings
}

fn check_structure(doc: &Document, result: &LayoutResult, warnings: &mut Vec<LintWarning>) {
    if doc.canvas().is_none() {
        warnings.push(LintWarning {
            category: LintCategory::Structure,
            message: format!(
                "no canvas declared, using default size {} by {}",
                result.canvas.width, result.canvas.height
            ),
            element: None,
            span: None,
        });
    }
}

/// Element declarations in the same pre-order the arena uses
fn collect_decls<'a>(elements: impl Iterator<Item = &'a Spanned<ElementDecl>>, out: &mut Vec<&'a ElementDecl>) {
    for element in elements {
        out.push(&element.node);
        collect_decls(element.node.children.iter(), out);
    }
}

fn check_styles(doc: &Document, result: &LayoutResult, warnings: &mut Vec<LintWarning>) {
    // Generated elements are checked in their expanded form
    let Ok(doc) = expand(doc) else {
        return;
    };
    let mut decls = Vec::new();
    collect_decls(
        doc.statements.iter().filter_map(|stmt| match &stmt.node {
            Statement::Element(el) => Some(el),
            _ => None,
        }),
        &mut decls,
    );

    for (decl, layout) in decls.iter().zip(&result.elements) {
        let size = &decl.size;
        let message = match decl.kind.node {
            ElementKind::Rectangle | ElementKind::Ellipse | ElementKind::Image
                if size.is_empty() =>
            {
                Some(format!(
                    "{} has no dimensions, using default size {} by {}",
                    layout.label(),
                    layout.bounds.width,
                    layout.bounds.height
                ))
            }
            ElementKind::Circle if size.is_empty() => Some(format!(
                "{} has no radius, using default radius {}",
                layout.label(),
                layout.bounds.width / 2.0
            )),
            ElementKind::Text
                if !decl
                    .styles
                    .iter()
                    .any(|s| matches!(s.node, StyleProperty::FontSize(_))) =>
            {
                Some(format!("{} has no font size", layout.label()))
            }
            _ => None,
        };

        if let Some(message) = message {
            warnings.push(LintWarning {
                category: LintCategory::Style,
                message,
                element: Some(layout.id),
                span: Some(layout.span.clone()),
            });
        }
    }
}

fn outside(canvas: &BoundingBox, elem: &ElementLayout) -> bool {
    let b = &elem.bounds;
    b.x < canvas.x - EPSILON
        || b.y < canvas.y - EPSILON
        || b.right() > canvas.right() + EPSILON
        || b.bottom() > canvas.bottom() + EPSILON
}

fn check_containment(result: &LayoutResult, warnings: &mut Vec<LintWarning>) {
    let canvas = result.canvas.bounds();
    for elem in result.elements.iter().filter(|e| outside(&canvas, e)) {
        warnings.push(LintWarning {
            category: LintCategory::Containment,
            message: format!(
                "{} extends outside the canvas ({}, {}, {} x {})",
                elem.label(),
                elem.bounds.x,
                elem.bounds.y,
                elem.bounds.width,
                elem.bounds.height
            ),
            element: Some(elem.id),
            span: Some(elem.span.clone()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::ColorTable;
    use crate::layout::{resolve, LayoutConfig};
    use crate::parser::parse;

    fn lint(src: &str) -> Vec<LintWarning> {
        let doc = parse(src).expect("parse");
        let result = resolve(&doc, &LayoutConfig::default(), &ColorTable::default()).expect("resolve");
        check(&doc, &result)
    }

    fn categories(warnings: &[LintWarning]) -> Vec<LintCategory> {
        warnings.iter().map(|w| w.category).collect()
    }

    #[test]
    fn test_clean_document() {
        let warnings = lint("canvas 400 by 300\nrect \"A\"\n  size 100 by 60\n  at center\n");
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn test_missing_canvas() {
        let warnings = lint("rect\n  size 10 by 10\n");
        assert_eq!(categories(&warnings), vec![LintCategory::Structure]);
        assert!(warnings[0].message.contains("800 by 600"));
    }

    #[test]
    fn test_default_sizes_are_reported() {
        let warnings = lint("canvas 400 by 300\nrect \"A\"\ncircle \"B\"\n  at 200 0\ntext \"hi\"\n  at 10 10\n");
        assert_eq!(
            categories(&warnings),
            vec![LintCategory::Style, LintCategory::Style, LintCategory::Style]
        );
        assert_eq!(warnings[0].element, Some(ElementId(0)));
        assert!(warnings[1].message.contains("no radius"));
        assert!(warnings[2].message.contains("no font size"));
    }

    #[test]
    fn test_nested_element_matches_its_declaration() {
        let warnings = lint("canvas 400 by 300\ngroup\n  size 200 by 200\n  rect \"inner\"\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].element, Some(ElementId(1)));
        assert!(warnings[0].message.starts_with("inner"));
    }

    #[test]
    fn test_outside_canvas() {
        let warnings = lint("canvas 100 by 100\nrect \"wide\"\n  size 150 by 10\n");
        assert_eq!(categories(&warnings), vec![LintCategory::Containment]);
        assert_eq!(
            warnings[0].to_string(),
            "[containment] wide extends outside the canvas (0, 0, 150 x 10)"
        );
    }

    #[test]
    fn test_percent_edges_are_inside() {
        let warnings = lint("canvas 300 by 300\nrect\n  size 10% by 10%\n  at 90% 90%\n");
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn test_generated_elements_are_checked() {
        let warnings = lint("canvas 400 by 300\nfor i from 0 to 1\n  text \"t{i}\"\n    at i * 50 0\n");
        assert_eq!(
            categories(&warnings),
            vec![LintCategory::Style, LintCategory::Style]
        );
        assert!(warnings[1].message.starts_with("t1"));
    }
}
