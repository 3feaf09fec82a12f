//! Geometry and style resolution
//!
//! Runs in two passes over the arena. Geometry is computed in dependency
//! order, so an anchored element always sees its target's final box and a
//! nested element always sees its group's box. Styles and shape data are
//! resolved afterwards in document order, which keeps generated ids (such
//! as gradient ids) in source order.

use log::trace;

use crate::colors::Color;
use crate::parser::ast::{
    ColorExpr, ElementKind, Expr, PositionExpr, Relation, Span, Spanned, StyleProperty, Unit,
    Value,
};

use super::config::{LayoutConfig, RelativeAlignment};
use super::error::LayoutError;
use super::symbols::{ElementNode, SymbolTable};
use super::types::{
    BoundingBox, CanvasLayout, ElementId, ElementLayout, Gradient, LayoutResult, Paint, Point,
    ResolvedStyles, Shape,
};
use super::units::{evaluate, finite, to_pixels};

/// Resolve the canvas size and background
pub fn resolve_canvas(
    table: &SymbolTable<'_>,
    config: &LayoutConfig,
) -> Result<CanvasLayout, LayoutError> {
    let (default_w, default_h) = config.canvas_size;
    let Some(decl) = table.canvas() else {
        return Ok(CanvasLayout {
            width: default_w,
            height: default_h,
            background: None,
        });
    };

    let dimension = |expr: &Option<Spanned<Expr>>,
                     quantity: &str,
                     default: f64|
     -> Result<f64, LayoutError> {
        let Some(expr) = expr else {
            return Ok(default);
        };
        let value = evaluate(&expr.node, &expr.span, "canvas", &mut |id| {
            table.lookup_variable(id, "canvas")
        })?;
        let px = to_pixels(value, None)
            .ok_or_else(|| LayoutError::no_basis("canvas", quantity, expr.span.clone()))?;
        let px = finite(px, "canvas", &expr.span)?;
        if px <= 0.0 {
            return Err(LayoutError::invalid_value(
                "canvas",
                format!("{} must be positive, got {}", quantity, px),
                expr.span.clone(),
            ));
        }
        Ok(px)
    };

    let width = dimension(&decl.width, "width", default_w)?;
    let height = dimension(&decl.height, "height", default_h)?;
    let background = decl
        .background
        .as_ref()
        .map(|bg| table.resolve_color(&bg.node, &bg.span, "canvas"))
        .transpose()?;

    Ok(CanvasLayout {
        width,
        height,
        background,
    })
}

/// Per-element resolution state
pub struct Resolver<'t, 'a> {
    table: &'t SymbolTable<'a>,
    config: &'t LayoutConfig,
    canvas: CanvasLayout,
    boxes: Vec<Option<BoundingBox>>,
    /// Line and polygon vertices relative to the element's box origin
    local_points: Vec<Option<Vec<Point>>>,
    gradients: Vec<Gradient>,
}

impl<'t, 'a> Resolver<'t, 'a> {
    pub fn new(table: &'t SymbolTable<'a>, config: &'t LayoutConfig, canvas: CanvasLayout) -> Self {
        let n = table.nodes().len();
        Self {
            table,
            config,
            canvas,
            boxes: vec![None; n],
            local_points: vec![None; n],
            gradients: Vec::new(),
        }
    }

    /// Evaluate an expression, substituting variables
    fn value(&self, expr: &Spanned<Expr>, owner: &str) -> Result<Value, LayoutError> {
        evaluate(&expr.node, &expr.span, owner, &mut |id| {
            self.table.lookup_variable(id, owner)
        })
    }

    /// Evaluate a length against an optional basis dimension
    fn length(
        &self,
        expr: &Spanned<Expr>,
        owner: &str,
        quantity: &str,
        basis: Option<f64>,
    ) -> Result<f64, LayoutError> {
        let value = self.value(expr, owner)?;
        let px = to_pixels(value, basis)
            .ok_or_else(|| LayoutError::no_basis(owner, quantity, expr.span.clone()))?;
        finite(px, owner, &expr.span)
    }

    /// A length that must not be negative and has no basis
    fn absolute_length(
        &self,
        expr: &Spanned<Expr>,
        owner: &str,
        quantity: &str,
    ) -> Result<f64, LayoutError> {
        let px = self.length(expr, owner, quantity, None)?;
        if px < 0.0 {
            return Err(LayoutError::invalid_value(
                owner,
                format!("{} cannot be negative, got {}", quantity, px),
                expr.span.clone(),
            ));
        }
        Ok(px)
    }

    /// Box of an already resolved element
    fn resolved_box(&self, id: ElementId, owner: &str, span: &Span) -> Result<BoundingBox, LayoutError> {
        self.boxes
            .get(id.index())
            .copied()
            .flatten()
            .ok_or_else(|| LayoutError::no_basis(owner, "position", span.clone()))
    }

    /// The box percentages and natural sizes of `node` are relative to
    fn basis(&self, node: &ElementNode<'_>) -> Result<BoundingBox, LayoutError> {
        match node.parent {
            Some(parent) => self.resolved_box(parent, &node.label(), &node.span),
            None => Ok(self.canvas.bounds()),
        }
    }

    /// Compute the bounding box of one element. All of its dependencies
    /// must have been resolved already.
    pub fn resolve_geometry(&mut self, id: ElementId) -> Result<BoundingBox, LayoutError> {
        let table = self.table;
        let node = table
            .node(id)
            .ok_or_else(|| LayoutError::invalid_value(format!("#{}", id.index()), "no such element", 0..0))?;
        let label = node.label();
        let basis = self.basis(node)?;

        let points = self.resolve_local_points(node, &label, &basis)?;
        let (width, height) = self.resolve_size(node, &label, &basis, points.as_deref())?;
        let (x, y) = self.resolve_position(node, &label, &basis, width, height)?;

        let bounds = BoundingBox::new(x, y, width, height);
        if !(bounds.right().is_finite() && bounds.bottom().is_finite()) {
            return Err(LayoutError::invalid_value(
                label,
                "value is too large to represent",
                node.span.clone(),
            ));
        }
        trace!(
            "resolved {}: x={} y={} w={} h={}",
            label,
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height
        );
        self.boxes[id.index()] = Some(bounds);
        self.local_points[id.index()] = points;
        Ok(bounds)
    }

    fn resolve_point(
        &self,
        (x, y): (&Spanned<Expr>, &Spanned<Expr>),
        label: &str,
        basis: &BoundingBox,
    ) -> Result<Point, LayoutError> {
        Ok(Point::new(
            self.length(x, label, "point x", Some(basis.width))?,
            self.length(y, label, "point y", Some(basis.height))?,
        ))
    }

    /// Line endpoints or polygon vertices, relative to the element's origin
    fn resolve_local_points(
        &self,
        node: &ElementNode<'_>,
        label: &str,
        basis: &BoundingBox,
    ) -> Result<Option<Vec<Point>>, LayoutError> {
        match node.decl.kind.node {
            ElementKind::Line => {
                let mut from = Point::new(0.0, 0.0);
                let mut to = Point::new(0.0, 0.0);
                for style in &node.decl.styles {
                    match &style.node {
                        StyleProperty::From(x, y) => from = self.resolve_point((x, y), label, basis)?,
                        StyleProperty::To(x, y) => to = self.resolve_point((x, y), label, basis)?,
                        _ => {}
                    }
                }
                Ok(Some(vec![from, to]))
            }
            ElementKind::Polygon => {
                let mut points = Vec::new();
                for style in &node.decl.styles {
                    if let StyleProperty::Points(list) = &style.node {
                        points = list
                            .iter()
                            .map(|(x, y)| self.resolve_point((x, y), label, basis))
                            .collect::<Result<Vec<_>, _>>()?;
                    }
                }
                Ok(Some(points))
            }
            _ => Ok(None),
        }
    }

    fn resolve_size(
        &self,
        node: &ElementNode<'_>,
        label: &str,
        basis: &BoundingBox,
        points: Option<&[Point]>,
    ) -> Result<(f64, f64), LayoutError> {
        let size = &node.decl.size;
        let config = self.config;

        let default = match node.decl.kind.node {
            ElementKind::Rectangle => config.default_rect_size,
            ElementKind::Circle => {
                let d = config.default_circle_radius * 2.0;
                (d, d)
            }
            ElementKind::Ellipse => config.default_ellipse_size,
            ElementKind::Image => config.default_image_size,
            ElementKind::Group => (basis.width, basis.height),
            ElementKind::Line | ElementKind::Polygon => points
                .unwrap_or(&[])
                .iter()
                .fold((0.0_f64, 0.0_f64), |(w, h), p| (w.max(p.x), h.max(p.y))),
            ElementKind::Text | ElementKind::Path => (0.0, 0.0),
        };

        // A radius sets both dimensions unless one is given explicitly
        let default = match &size.radius {
            Some(radius) => {
                let r = self.length(radius, label, "radius", Some(basis.width.min(basis.height)))?;
                (r * 2.0, r * 2.0)
            }
            None => default,
        };

        let width = match &size.width {
            Some(w) => self.length(w, label, "width", Some(basis.width))?,
            None => default.0,
        };
        let height = match &size.height {
            Some(h) => self.length(h, label, "height", Some(basis.height))?,
            None => default.1,
        };

        if width < 0.0 || height < 0.0 {
            let span = size
                .width
                .as_ref()
                .filter(|_| width < 0.0)
                .or(size.height.as_ref())
                .or(size.radius.as_ref())
                .map(|e| e.span.clone())
                .unwrap_or_else(|| node.span.clone());
            return Err(LayoutError::invalid_value(
                label,
                format!("size cannot be negative, got {} by {}", width, height),
                span,
            ));
        }

        Ok((width, height))
    }

    fn resolve_position(
        &self,
        node: &ElementNode<'_>,
        label: &str,
        basis: &BoundingBox,
        width: f64,
        height: f64,
    ) -> Result<(f64, f64), LayoutError> {
        let Some(position) = &node.decl.position else {
            return Ok((basis.x, basis.y));
        };

        match &position.node {
            // Percentages address the element's top-left corner
            PositionExpr::Point { x, y } => Ok((
                basis.x + self.length(x, label, "x", Some(basis.width))?,
                basis.y + self.length(y, label, "y", Some(basis.height))?,
            )),
            PositionExpr::Aligned(anchor) => {
                let (fx, fy) = anchor.fractions();
                Ok((
                    basis.x + fx * (basis.width - width),
                    basis.y + fy * (basis.height - height),
                ))
            }
            PositionExpr::Anchored {
                relation,
                target,
                gap,
            } => {
                let target_id = self.table.lookup_element(&target.node).ok_or_else(|| {
                    LayoutError::unknown(
                        target.node.as_str(),
                        label,
                        target.span.clone(),
                        self.table.similar_elements(&target.node),
                    )
                })?;
                let t = self.resolved_box(target_id, label, &target.span)?;

                let gap_basis = match relation {
                    Relation::Below | Relation::Above => basis.height,
                    _ => basis.width,
                };
                let gap = match gap {
                    Some(g) => self.length(g, label, "gap", Some(gap_basis))?,
                    None => 0.0,
                };

                let align = self.config.relative_alignment;
                let cross = |start: f64, extent: f64, own: f64| match align {
                    RelativeAlignment::Center => start + (extent - own) / 2.0,
                    RelativeAlignment::Start => start,
                };

                Ok(match relation {
                    Relation::Below => (cross(t.x, t.width, width), t.bottom() + gap),
                    Relation::Above => (cross(t.x, t.width, width), t.y - height - gap),
                    Relation::RightOf => (t.right() + gap, cross(t.y, t.height, height)),
                    Relation::LeftOf => (t.x - width - gap, cross(t.y, t.height, height)),
                    Relation::Inside(anchor) => {
                        let (fx, fy) = anchor.fractions();
                        (t.x + fx * (t.width - width), t.y + fy * (t.height - height))
                    }
                })
            }
        }
    }

    fn color(&self, expr: &ColorExpr, span: &Span, owner: &str) -> Result<Color, LayoutError> {
        self.table.resolve_color(expr, span, owner)
    }

    fn resolve_styles(&mut self, node: &ElementNode<'_>, label: &str) -> Result<ResolvedStyles, LayoutError> {
        let mut styles = ResolvedStyles::default();

        for style in &node.decl.styles {
            let span = &style.span;
            match &style.node {
                StyleProperty::Fill(c) => {
                    styles.fill = Some(Paint::Solid(self.color(c, span, label)?));
                }
                StyleProperty::Gradient { from, to } => {
                    let from = self.color(from, span, label)?;
                    let to = self.color(to, span, label)?;
                    let index = self.gradients.len();
                    self.gradients.push(Gradient {
                        id: format!("gradient-{}", index),
                        from,
                        to,
                    });
                    styles.fill = Some(Paint::Gradient(index));
                }
                StyleProperty::Stroke { color, width } => {
                    styles.stroke = Some(self.color(color, span, label)?);
                    if let Some(w) = width {
                        styles.stroke_width = Some(self.absolute_length(w, label, "stroke width")?);
                    }
                }
                StyleProperty::Dash(dash) => styles.dash = Some(*dash),
                StyleProperty::Opacity(expr) => {
                    let value = self.value(expr, label)?;
                    let opacity = match value.unit {
                        Unit::Percent => value.number / 100.0,
                        Unit::None => value.number,
                        unit => {
                            return Err(LayoutError::unit_mismatch(
                                format!("opacity must be a fraction or a percentage, got {}", unit),
                                expr.span.clone(),
                            ))
                        }
                    };
                    if !(0.0..=1.0).contains(&opacity) {
                        return Err(LayoutError::invalid_value(
                            label,
                            format!("opacity must be between 0 and 1, got {}", opacity),
                            expr.span.clone(),
                        ));
                    }
                    styles.opacity = Some(opacity);
                }
                StyleProperty::Rounded(expr) => {
                    styles.corner_radius = Some(self.absolute_length(expr, label, "corner radius")?);
                }
                StyleProperty::Rotate(expr) => {
                    let value = self.value(expr, label)?;
                    if value.unit != Unit::None {
                        return Err(LayoutError::unit_mismatch(
                            format!("rotation is in unitless degrees, got {}", value.unit),
                            expr.span.clone(),
                        ));
                    }
                    styles.rotation = Some(value.number);
                }
                StyleProperty::FontSize(expr) => {
                    styles.font_size = Some(self.absolute_length(expr, label, "font size")?);
                }
                StyleProperty::FontWeight(weight) => styles.font_weight = Some(*weight),
                StyleProperty::Italic => styles.italic = true,
                StyleProperty::FontFamily(family) => styles.font_family = Some(family.clone()),
                StyleProperty::TextColor(c) => {
                    styles.text_color = Some(self.color(c, span, label)?);
                }
                StyleProperty::Align(align) => styles.text_align = Some(*align),
                // Shape data, consumed by `resolve_shape`
                StyleProperty::From(..)
                | StyleProperty::To(..)
                | StyleProperty::Points(_)
                | StyleProperty::PathData(_)
                | StyleProperty::Source(_) => {}
            }
        }

        Ok(styles)
    }

    fn resolve_shape(&self, node: &ElementNode<'_>, bounds: &BoundingBox) -> Shape {
        let absolute = |p: &Point| Point::new(bounds.x + p.x, bounds.y + p.y);
        let local = self.local_points[node.id.index()].as_deref().unwrap_or(&[]);
        let mut path_data = None;
        let mut source = None;
        for style in &node.decl.styles {
            match &style.node {
                StyleProperty::PathData(d) => path_data = Some(d.clone()),
                StyleProperty::Source(src) => source = Some(src.clone()),
                _ => {}
            }
        }

        match node.decl.kind.node {
            ElementKind::Rectangle => Shape::Rectangle,
            ElementKind::Circle => Shape::Circle,
            ElementKind::Ellipse => Shape::Ellipse,
            ElementKind::Group => Shape::Group,
            ElementKind::Line => {
                let origin = Point::new(0.0, 0.0);
                let from = local.first().copied().unwrap_or(origin);
                let to = local.get(1).copied().unwrap_or(origin);
                Shape::Line {
                    from: absolute(&from),
                    to: absolute(&to),
                }
            }
            ElementKind::Polygon => Shape::Polygon {
                points: local.iter().map(absolute).collect(),
            },
            ElementKind::Path => Shape::Path {
                d: path_data.unwrap_or_default(),
            },
            ElementKind::Text => Shape::Text {
                content: node.name().unwrap_or_default().to_string(),
            },
            ElementKind::Image => Shape::Image { src: source },
        }
    }

    /// Resolve styles in document order and assemble the result
    pub fn finish(mut self, resolution_order: Vec<ElementId>) -> Result<LayoutResult, LayoutError> {
        let table = self.table;
        let mut elements = Vec::with_capacity(table.nodes().len());

        for node in table.nodes() {
            let label = node.label();
            let bounds = self.resolved_box(node.id, &label, &node.span)?;
            let styles = self.resolve_styles(node, &label)?;
            let shape = self.resolve_shape(node, &bounds);

            elements.push(ElementLayout {
                id: node.id,
                kind: node.decl.kind.node,
                name: node.name().map(str::to_string),
                bounds,
                shape,
                styles,
                parent: node.parent,
                children: node.children.clone(),
                span: node.span.clone(),
            });
        }

        Ok(LayoutResult {
            canvas: self.canvas,
            elements,
            top_level: table.top_level().to_vec(),
            gradients: self.gradients,
            resolution_order,
        })
    }
}
