//! Layout resolution tests against the public API
//!
//! Each test parses a small scene and checks the resolved geometry or the
//! error the resolver reports.

use pretty_assertions::assert_eq;

use stagscribe::colors::{Color, ColorTable};
use stagscribe::layout::{
    resolve, BoundingBox, ElementId, LayoutConfig, LayoutError, LayoutResult, Paint,
    RelativeAlignment,
};
use stagscribe::parse;

fn resolve_with(source: &str, config: &LayoutConfig) -> Result<LayoutResult, LayoutError> {
    let doc = parse(source).expect("Should parse");
    resolve(&doc, config, &ColorTable::default())
}

fn resolve_ok(source: &str) -> LayoutResult {
    resolve_with(source, &LayoutConfig::default()).expect("Should resolve")
}

fn resolve_err(source: &str) -> LayoutError {
    resolve_with(source, &LayoutConfig::default()).expect_err("Should fail to resolve")
}

fn bounds(result: &LayoutResult, name: &str) -> BoundingBox {
    result
        .get_by_name(name)
        .unwrap_or_else(|| panic!("no element named {}", name))
        .bounds
}

#[test]
fn test_percent_position_uses_canvas_width() {
    let result = resolve_ok("canvas 400 by 300\nrect \"A\"\n  at 50% 0\n");
    assert_eq!(bounds(&result, "A").x, 200.0);
}

#[test]
fn test_below_with_gap() {
    let result = resolve_ok(
        "rect \"A\"\n  at 100 100\n  size 200 by 50\nrect \"B\"\n  size 200 by 50\n  below \"A\" with gap 20\n",
    );
    assert_eq!(bounds(&result, "B"), BoundingBox::new(100.0, 170.0, 200.0, 50.0));
}

#[test]
fn test_at_center() {
    let result = resolve_ok("canvas 400 by 300\nrect \"A\"\n  size 100 by 60\n  at center\n");
    assert_eq!(bounds(&result, "A"), BoundingBox::new(150.0, 120.0, 100.0, 60.0));
}

#[test]
fn test_variable_gap_matches_literal_gap() {
    let with_variable = resolve_ok(
        "gap_size is 30\nrect \"A\"\n  at 10 10\nrect \"B\"\n  below \"A\" with gap gap_size\n",
    );
    let with_literal = resolve_ok("rect \"A\"\n  at 10 10\nrect \"B\"\n  below \"A\" with gap 30\n");
    assert_eq!(bounds(&with_variable, "B"), bounds(&with_literal, "B"));
    assert_eq!(bounds(&with_literal, "B").y, 100.0);
}

#[test]
fn test_resolving_twice_is_equal() {
    let doc = parse(include_str!("fixtures/office.stag")).expect("Should parse");
    let colors = ColorTable::default();
    let config = LayoutConfig::default();
    let first = resolve(&doc, &config, &colors).expect("Should resolve");
    let second = resolve(&doc, &config, &colors).expect("Should resolve");
    assert_eq!(first, second);
}

#[test]
fn test_forward_reference() {
    let result = resolve_ok("rect \"B\"\n  right of \"A\" with gap 10\nrect \"A\"\n  at 20 20\n");
    // Document order is kept, resolution order follows dependencies
    assert_eq!(result.elements[0].name.as_deref(), Some("B"));
    assert_eq!(result.resolution_order, vec![ElementId(1), ElementId(0)]);
    assert_eq!(bounds(&result, "B"), BoundingBox::new(130.0, 20.0, 100.0, 60.0));
}

#[test]
fn test_relative_placements() {
    let result = resolve_ok(
        "rect \"A\"\n  at 200 200\n  size 100 by 100\n\
         rect \"up\"\n  size 50 by 20\n  above \"A\" with gap 5\n\
         rect \"left\"\n  size 50 by 20\n  left of \"A\" with gap 5\n\
         rect \"corner\"\n  size 10 by 10\n  inside \"A\" at bottom right\n\
         rect \"middle\"\n  size 10 by 10\n  inside \"A\"\n",
    );
    assert_eq!(bounds(&result, "up"), BoundingBox::new(225.0, 175.0, 50.0, 20.0));
    assert_eq!(bounds(&result, "left"), BoundingBox::new(145.0, 240.0, 50.0, 20.0));
    assert_eq!(bounds(&result, "corner"), BoundingBox::new(290.0, 290.0, 10.0, 10.0));
    assert_eq!(bounds(&result, "middle"), BoundingBox::new(245.0, 245.0, 10.0, 10.0));
}

#[test]
fn test_start_alignment_policy() {
    let config = LayoutConfig::default().with_relative_alignment(RelativeAlignment::Start);
    let result = resolve_with(
        "rect \"A\"\n  at 100 100\n  size 200 by 50\nrect \"B\"\n  size 20 by 20\n  below \"A\"\n",
        &config,
    )
    .expect("Should resolve");
    assert_eq!(bounds(&result, "B"), BoundingBox::new(100.0, 150.0, 20.0, 20.0));
}

#[test]
fn test_nested_percentages_use_the_group() {
    let result = resolve_ok(
        "canvas 800 by 600\ngroup \"G\"\n  at 100 100\n  size 200 by 100\n  rect \"child\"\n    size 50% by 50%\n    at 50% 50%\n",
    );
    assert_eq!(bounds(&result, "child"), BoundingBox::new(200.0, 150.0, 100.0, 50.0));
    let group = result.get_by_name("G").expect("group");
    assert_eq!(group.children, vec![ElementId(1)]);
}

#[test]
fn test_group_fills_its_basis_by_default() {
    let result = resolve_ok("canvas 300 by 200\ngroup \"G\"\n  rect\n    at center\n");
    assert_eq!(bounds(&result, "G"), BoundingBox::new(0.0, 0.0, 300.0, 200.0));
    assert_eq!(result.elements[1].bounds, BoundingBox::new(100.0, 70.0, 100.0, 60.0));
}

#[test]
fn test_units_and_natural_sizes() {
    let result = resolve_ok(
        "canvas 400 by 200\nrect \"inch\"\n  size 1in by 1cm\nrect \"half\"\n  width half\n  height quarter\n",
    );
    let inch = bounds(&result, "inch");
    assert_eq!(inch.width, 96.0);
    assert!((inch.height - 37.7953).abs() < 1e-9);
    assert_eq!(bounds(&result, "half").width, 200.0);
    assert_eq!(bounds(&result, "half").height, 50.0);
}

#[test]
fn test_circle_radius() {
    let result = resolve_ok("circle \"c\"\n  radius 25\n  at 10 10\n");
    assert_eq!(bounds(&result, "c"), BoundingBox::new(10.0, 10.0, 50.0, 50.0));
}

#[test]
fn test_palette_entries_chain() {
    let result = resolve_ok("colors:\n  base = #102030\n  accent = base\nrect \"A\"\n  fill accent\n");
    let a = result.get_by_name("A").expect("A");
    assert_eq!(a.styles.fill, Some(Paint::Solid(Color::rgb(0x10, 0x20, 0x30))));
}

#[test]
fn test_gradient_ids_follow_document_order() {
    let result = resolve_ok(
        "rect \"late\"\n  below \"early\"\n  fill gradient red to blue\nrect \"early\"\n  fill gradient white to black\n",
    );
    assert_eq!(result.gradients[0].id, "gradient-0");
    assert_eq!(result.gradients[0].from, Color::rgb(255, 0, 0));
    assert_eq!(result.gradients[1].from, Color::WHITE);
}

#[test]
fn test_cycle_names_both_elements() {
    let err = resolve_err("rect \"A\"\n  below \"B\"\nrect \"B\"\n  below \"A\"\n");
    match err {
        LayoutError::CyclicReference { cycle } => {
            assert!(cycle.contains(&"A".to_string()));
            assert!(cycle.contains(&"B".to_string()));
        }
        other => panic!("expected a cycle, got {:?}", other),
    }
}

#[test]
fn test_unknown_reference() {
    let err = resolve_err("rect \"A\"\n  below \"Nowhere\"\n");
    assert!(matches!(err, LayoutError::UnknownReference { ref name, .. } if name == "Nowhere"));
}

#[test]
fn test_unknown_variable_and_color() {
    assert!(matches!(
        resolve_err("rect\n  width wide\n"),
        LayoutError::UnknownReference { .. }
    ));
    let err = resolve_err("rect\n  fill bleu\n");
    assert_eq!(err.suggestions(), Some(&["blue".to_string()][..]));
}

#[test]
fn test_duplicate_element_name() {
    assert!(matches!(
        resolve_err("rect \"A\"\ncircle \"A\"\n"),
        LayoutError::DuplicateName { .. }
    ));
}

#[test]
fn test_variable_cycle() {
    assert!(matches!(
        resolve_err("a is b + 1\nb is a\nrect\n"),
        LayoutError::CyclicReference { .. }
    ));
}

#[test]
fn test_unit_errors() {
    assert!(matches!(
        resolve_err("rect\n  width 1cm + 5px\n"),
        LayoutError::UnitMismatch { .. }
    ));
    assert!(matches!(
        resolve_err("rect\n  rotate 45px\n"),
        LayoutError::UnitMismatch { .. }
    ));
}

#[test]
fn test_relative_value_without_basis() {
    assert!(matches!(
        resolve_err("rect\n  stroke black 10%\n"),
        LayoutError::DivisionBasis { .. }
    ));
    assert!(matches!(
        resolve_err("canvas 50% by 100\n"),
        LayoutError::DivisionBasis { .. }
    ));
}

#[test]
fn test_invalid_values() {
    assert!(matches!(
        resolve_err("rect\n  width 10 / 0\n"),
        LayoutError::InvalidValue { .. }
    ));
    assert!(matches!(
        resolve_err("rect\n  opacity 150%\n"),
        LayoutError::InvalidValue { .. }
    ));
    assert!(matches!(
        resolve_err("rect\n  width (-10)\n"),
        LayoutError::InvalidValue { .. }
    ));
}

#[test]
fn test_overflowing_arithmetic_is_invalid() {
    let big = "9".repeat(300);
    let err = resolve_err(&format!("big is {}\nrect \"a\"\n  width big * big\n", big));
    assert!(matches!(err, LayoutError::InvalidValue { .. }), "{:?}", err);
}

#[test]
fn test_overflowing_unit_conversion_is_invalid() {
    let huge = "9".repeat(306);
    let err = resolve_err(&format!("rect \"a\"\n  width {} m\n", huge));
    assert!(
        matches!(err, LayoutError::InvalidValue { ref element, .. } if element == "a"),
        "{:?}",
        err
    );
}

#[test]
fn test_overflowing_position_is_invalid() {
    let huge = "9".repeat(308);
    let err = resolve_err(&format!(
        "rect \"a\"\n  at {} 0\n  width {}\n",
        huge, huge
    ));
    assert!(matches!(err, LayoutError::InvalidValue { .. }), "{:?}", err);
}

#[test]
fn test_loop_names_feed_anchors() {
    let result = resolve_ok(
        "for i from 0 to 2\n  rect \"Box_{i}\"\n    size 40 by 20\n    at i * 60 0\n  rect \"Tag_{i}\"\n    size 40 by 10\n    below \"Box_{i}\" with gap 5\n",
    );
    assert_eq!(bounds(&result, "Tag_0"), BoundingBox::new(0.0, 25.0, 40.0, 10.0));
    assert_eq!(bounds(&result, "Tag_2"), BoundingBox::new(120.0, 25.0, 40.0, 10.0));
}

#[test]
fn test_placed_template_geometry() {
    let result = resolve_ok(
        "define desk:\n  rect \"top\"\n    size 80 by 40\n  rect \"chair\"\n    size 20 by 20\n    below \"top\"\n\
         place desk \"D1\"\n  at 100 100\n  size 200 by 200\n  scale 0.5\n",
    );
    assert_eq!(bounds(&result, "D1.top"), BoundingBox::new(100.0, 100.0, 40.0, 20.0));
    assert_eq!(bounds(&result, "D1.chair"), BoundingBox::new(115.0, 120.0, 10.0, 10.0));
}

#[test]
fn test_loop_errors_surface_from_resolve() {
    assert!(matches!(
        resolve_err("for i from 0 to 3 step 0\n  rect\n"),
        LayoutError::InvalidValue { .. }
    ));
    assert!(matches!(
        resolve_err("place missing\n"),
        LayoutError::UnknownReference { .. }
    ));
}

