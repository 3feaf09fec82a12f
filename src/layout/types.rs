//! Core types for resolved layouts

use crate::colors::Color;
use crate::parser::ast::{DashStyle, ElementKind, FontWeight, Span, TextAlign};

/// Stable index of an element in document pre-order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

impl ElementId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A 2D point in the coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A bounding box representing the spatial extent of an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a zero-sized bounding box at the origin
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Right edge x-coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point of the bounding box
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Check if another box lies entirely within this one
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Resolved fill paint
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Index into [`LayoutResult::gradients`]
    Gradient(usize),
}

/// A vertical linear gradient referenced by a fill
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub id: String,
    pub from: Color,
    pub to: Color,
}

/// Style properties after unit and color resolution
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedStyles {
    pub fill: Option<Paint>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
    pub dash: Option<DashStyle>,
    /// 0.0 to 1.0
    pub opacity: Option<f64>,
    pub corner_radius: Option<f64>,
    /// Degrees, clockwise around the element center
    pub rotation: Option<f64>,
    pub font_size: Option<f64>,
    pub font_weight: Option<FontWeight>,
    pub italic: bool,
    pub font_family: Option<String>,
    pub text_color: Option<Color>,
    pub text_align: Option<TextAlign>,
}

/// Kind-specific geometry, in absolute canvas coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle,
    Circle,
    Ellipse,
    Line { from: Point, to: Point },
    Polygon { points: Vec<Point> },
    /// Path data stays local to the element's box origin
    Path { d: String },
    Text { content: String },
    Group,
    Image { src: Option<String> },
}

/// A resolved element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementLayout {
    pub id: ElementId,
    pub kind: ElementKind,
    pub name: Option<String>,
    pub bounds: BoundingBox,
    pub shape: Shape,
    pub styles: ResolvedStyles,
    pub parent: Option<ElementId>,
    /// Nested elements in source order
    pub children: Vec<ElementId>,
    pub span: Span,
}

impl ElementLayout {
    /// Name for diagnostics: the element name, or its kind and index
    pub fn label(&self) -> String {
        element_label(self.name.as_deref(), self.kind, self.id)
    }
}

/// Diagnostic label for a possibly unnamed element
pub fn element_label(name: Option<&str>, kind: ElementKind, id: ElementId) -> String {
    match name {
        Some(name) => name.to_string(),
        None => format!("<{} #{}>", kind, id.0),
    }
}

/// SVG id for an element name. Whitespace becomes `_`, so the symbol table
/// rejects names that would share an id.
pub fn svg_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Resolved canvas
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasLayout {
    pub width: f64,
    pub height: f64,
    pub background: Option<Color>,
}

impl CanvasLayout {
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width, self.height)
    }
}

/// The result of layout resolution
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub canvas: CanvasLayout,
    /// Every element, indexed by [`ElementId`] (document pre-order)
    pub elements: Vec<ElementLayout>,
    /// Top-level elements in source order
    pub top_level: Vec<ElementId>,
    pub gradients: Vec<Gradient>,
    /// The order elements were resolved in
    pub resolution_order: Vec<ElementId>,
}

impl LayoutResult {
    pub fn get(&self, id: ElementId) -> Option<&ElementLayout> {
        self.elements.get(id.0)
    }

    /// Look up a named element
    pub fn get_by_name(&self, name: &str) -> Option<&ElementLayout> {
        self.elements
            .iter()
            .find(|el| el.name.as_deref() == Some(name))
    }
}
