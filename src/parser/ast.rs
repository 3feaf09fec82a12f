//! Abstract Syntax Tree types for the StagScribe scene language

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Valid identifier (alphanumeric + underscore, starts with letter/_)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Root AST node - a complete scene document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub statements: Vec<Spanned<Statement>>,
}

impl Document {
    /// Top-level element declarations in document order
    pub fn elements(&self) -> impl Iterator<Item = &Spanned<ElementDecl>> {
        self.statements.iter().filter_map(|stmt| match &stmt.node {
            Statement::Element(el) => Some(el),
            _ => None,
        })
    }

    /// The first canvas declaration, if any
    pub fn canvas(&self) -> Option<&CanvasDecl> {
        self.statements.iter().find_map(|stmt| match &stmt.node {
            Statement::Canvas(c) => Some(c),
            _ => None,
        })
    }
}

/// Top-level statement in a document
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Canvas declaration: `canvas 800 by 600 pixels`
    Canvas(CanvasDecl),
    /// Palette block: `colors:` followed by `name = color` lines
    Palette(Vec<Spanned<PaletteEntry>>),
    /// Variable binding: `gap_size is 30`
    Variable(VariableDecl),
    /// Element declaration, possibly with nested children
    Element(Spanned<ElementDecl>),
    /// Template definition: `define desk:` followed by indented elements
    Template(TemplateDecl),
    /// Template instantiation: `place desk "D1"` with optional overrides
    Place(PlaceDecl),
    /// Loop: `for i from 0 to 3 [step 1]` followed by an indented body
    Loop(LoopDecl),
}

impl Statement {
    /// True for statements that must be expanded before resolution
    pub fn is_generator(&self) -> bool {
        matches!(
            self,
            Statement::Template(_) | Statement::Place(_) | Statement::Loop(_)
        )
    }
}

/// Canvas dimensions and background
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanvasDecl {
    pub width: Option<Spanned<Expr>>,
    pub height: Option<Spanned<Expr>>,
    pub background: Option<Spanned<ColorExpr>>,
}

/// A single named palette color
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub name: Spanned<Identifier>,
    pub color: Spanned<ColorExpr>,
}

/// A variable binding
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: Spanned<Identifier>,
    pub value: Spanned<Expr>,
}

/// A reusable group of elements
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDecl {
    pub name: Spanned<Identifier>,
    pub body: Vec<Spanned<ElementDecl>>,
}

/// One instance of a template
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDecl {
    pub template: Spanned<Identifier>,
    /// Instance name; replaces the name of a single-element template
    pub name: Option<Spanned<String>>,
    pub size: SizeExpr,
    pub position: Option<Spanned<PositionExpr>>,
    /// Appended after the template's own styles, so they win
    pub styles: Vec<Spanned<StyleProperty>>,
    /// Factor applied to declared widths, heights and radii
    pub scale: Option<Spanned<Expr>>,
}

/// A counted loop, unrolled before resolution
#[derive(Debug, Clone, PartialEq)]
pub struct LoopDecl {
    pub var: Spanned<Identifier>,
    pub from: Spanned<Expr>,
    pub to: Spanned<Expr>,
    pub step: Option<Spanned<Expr>>,
    /// Elements, placements and nested loops
    pub body: Vec<Spanned<Statement>>,
}

/// Element declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    pub kind: Spanned<ElementKind>,
    /// Quoted name, used as a reference target
    pub name: Option<Spanned<String>>,
    pub size: SizeExpr,
    pub position: Option<Spanned<PositionExpr>>,
    pub styles: Vec<Spanned<StyleProperty>>,
    pub children: Vec<Spanned<ElementDecl>>,
}

impl ElementDecl {
    /// Create a bare element of the given kind
    pub fn new(kind: ElementKind, span: Span) -> Self {
        Self {
            kind: Spanned::new(kind, span),
            name: None,
            size: SizeExpr::default(),
            position: None,
            styles: vec![],
            children: vec![],
        }
    }

    pub fn name_str(&self) -> Option<&str> {
        self.name.as_ref().map(|n| n.node.as_str())
    }

    /// Visit every expression of this element and its descendants
    pub fn for_each_expr_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        self.size.for_each_expr_mut(f);
        if let Some(position) = &mut self.position {
            position.node.for_each_expr_mut(f);
        }
        for style in &mut self.styles {
            style.node.for_each_expr_mut(f);
        }
        for child in &mut self.children {
            child.node.for_each_expr_mut(f);
        }
    }

    /// Visit every element name and anchor target in this subtree
    pub fn for_each_name_mut(&mut self, f: &mut impl FnMut(&mut String)) {
        if let Some(name) = &mut self.name {
            f(&mut name.node);
        }
        if let Some(position) = &mut self.position {
            position.node.for_each_target_mut(f);
        }
        for child in &mut self.children {
            child.node.for_each_name_mut(f);
        }
    }
}

/// Built-in element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Rectangle,
    Circle,
    Ellipse,
    Line,
    Polygon,
    Path,
    Text,
    Group,
    Image,
}

impl ElementKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ElementKind::Rectangle => "rectangle",
            ElementKind::Circle => "circle",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Line => "line",
            ElementKind::Polygon => "polygon",
            ElementKind::Path => "path",
            ElementKind::Text => "text",
            ElementKind::Group => "group",
            ElementKind::Image => "image",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Raw, pre-resolution size of an element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SizeExpr {
    pub width: Option<Spanned<Expr>>,
    pub height: Option<Spanned<Expr>>,
    /// Circle radius; overrides width and height
    pub radius: Option<Spanned<Expr>>,
}

impl SizeExpr {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.radius.is_none()
    }

    pub fn for_each_expr_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        for expr in [&mut self.width, &mut self.height, &mut self.radius]
            .into_iter()
            .flatten()
        {
            f(&mut expr.node);
        }
    }
}

/// Raw, pre-resolution position of an element
#[derive(Debug, Clone, PartialEq)]
pub enum PositionExpr {
    /// `at X Y`: top-left corner, each axis absolute or a percentage of the basis
    Point { x: Spanned<Expr>, y: Spanned<Expr> },
    /// `at center`, `at top left`, ...: placed inside the basis by anchor
    Aligned(Anchor),
    /// `below "A" with gap 20`, `inside "A" at top left`, ...
    Anchored {
        relation: Relation,
        target: Spanned<String>,
        gap: Option<Spanned<Expr>>,
    },
}

impl PositionExpr {
    /// Name of the element this position depends on, if any
    pub fn target(&self) -> Option<&Spanned<String>> {
        match self {
            PositionExpr::Anchored { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn for_each_expr_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        match self {
            PositionExpr::Point { x, y } => {
                f(&mut x.node);
                f(&mut y.node);
            }
            PositionExpr::Aligned(_) => {}
            PositionExpr::Anchored { gap, .. } => {
                if let Some(gap) = gap {
                    f(&mut gap.node);
                }
            }
        }
    }

    pub fn for_each_target_mut(&mut self, f: &mut impl FnMut(&mut String)) {
        if let PositionExpr::Anchored { target, .. } = self {
            f(&mut target.node);
        }
    }
}

/// Relation of an anchored element to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Below,
    Above,
    LeftOf,
    RightOf,
    Inside(Anchor),
}

/// Anchor point inside a box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    /// Horizontal and vertical fraction of the free space before the element
    pub fn fractions(&self) -> (f64, f64) {
        match self {
            Anchor::Center => (0.5, 0.5),
            Anchor::Top => (0.5, 0.0),
            Anchor::Bottom => (0.5, 1.0),
            Anchor::Left => (0.0, 0.5),
            Anchor::Right => (1.0, 0.5),
            Anchor::TopLeft => (0.0, 0.0),
            Anchor::TopRight => (1.0, 0.0),
            Anchor::BottomLeft => (0.0, 1.0),
            Anchor::BottomRight => (1.0, 1.0),
        }
    }
}

/// Style property of an element, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub enum StyleProperty {
    Fill(ColorExpr),
    Gradient { from: ColorExpr, to: ColorExpr },
    Stroke {
        color: ColorExpr,
        width: Option<Spanned<Expr>>,
    },
    Dash(DashStyle),
    Opacity(Spanned<Expr>),
    Rounded(Spanned<Expr>),
    Rotate(Spanned<Expr>),
    FontSize(Spanned<Expr>),
    FontWeight(FontWeight),
    Italic,
    FontFamily(String),
    TextColor(ColorExpr),
    Align(TextAlign),
    From(Spanned<Expr>, Spanned<Expr>),
    To(Spanned<Expr>, Spanned<Expr>),
    Points(Vec<(Spanned<Expr>, Spanned<Expr>)>),
    PathData(String),
    Source(String),
}

impl StyleProperty {
    pub fn for_each_expr_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        match self {
            StyleProperty::Stroke { width: Some(w), .. } => f(&mut w.node),
            StyleProperty::Opacity(e)
            | StyleProperty::Rounded(e)
            | StyleProperty::Rotate(e)
            | StyleProperty::FontSize(e) => f(&mut e.node),
            StyleProperty::From(x, y) | StyleProperty::To(x, y) => {
                f(&mut x.node);
                f(&mut y.node);
            }
            StyleProperty::Points(points) => {
                for (x, y) in points {
                    f(&mut x.node);
                    f(&mut y.node);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashStyle {
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Bold,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// A color as written in the source
#[derive(Debug, Clone, PartialEq)]
pub enum ColorExpr {
    /// `#f00`, `#ff0000`, `#ff000080`
    Hex(String),
    /// `rgb(255 0 0)`
    Rgb(u8, u8, u8),
    /// Palette name or named color; multi-word names are joined by a space
    Named(String),
}

impl std::fmt::Display for ColorExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorExpr::Hex(s) | ColorExpr::Named(s) => f.write_str(s),
            ColorExpr::Rgb(r, g, b) => write!(f, "rgb({} {} {})", r, g, b),
        }
    }
}

/// Scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(Spanned<Identifier>),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Literal number with an optional unit
    pub fn number(number: f64, unit: Unit) -> Self {
        Expr::Literal(Value::new(number, unit))
    }

    /// Unitless literal
    pub fn px(number: f64) -> Self {
        Expr::number(number, Unit::None)
    }

    pub fn percent(number: f64) -> Self {
        Expr::number(number, Unit::Percent)
    }

    /// Replace every reference to the variable `name` with a literal
    pub fn substitute(&mut self, name: &str, value: Value) {
        let is_target = matches!(self, Expr::Var(id) if id.node.as_str() == name);
        if is_target {
            *self = Expr::Literal(value);
            return;
        }
        match self {
            Expr::Literal(_) | Expr::Var(_) => {}
            Expr::Neg(inner) => inner.substitute(name, value),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.substitute(name, value);
                rhs.substitute(name, value);
            }
        }
    }

    /// Visit every variable reference in this expression
    pub fn for_each_var<'a>(&'a self, f: &mut impl FnMut(&'a Spanned<Identifier>)) {
        match self {
            Expr::Literal(_) => {}
            Expr::Var(id) => f(id),
            Expr::Neg(inner) => inner.for_each_var(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_var(f);
                rhs.for_each_var(f);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        })
    }
}

/// A number with a unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Value {
    pub number: f64,
    pub unit: Unit,
}

impl Value {
    pub fn new(number: f64, unit: Unit) -> Self {
        Self { number, unit }
    }
}

/// Units understood by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Bare number, treated as pixels
    None,
    Pixels,
    Percent,
    Centimeters,
    Millimeters,
    Meters,
    Inches,
    Points,
    Natural(NaturalSize),
}

impl Unit {
    /// Parse a unit keyword following a number
    pub fn from_keyword(word: &str) -> Option<Unit> {
        let unit = match word {
            "px" | "pixels" | "pixel" => Unit::Pixels,
            "cm" => Unit::Centimeters,
            "mm" => Unit::Millimeters,
            "m" | "meters" => Unit::Meters,
            "in" | "inches" => Unit::Inches,
            "pt" => Unit::Points,
            other => Unit::Natural(NaturalSize::from_keyword(other)?),
        };
        Some(unit)
    }

    /// True for units whose value depends on a basis dimension
    pub fn is_relative(&self) -> bool {
        matches!(self, Unit::Percent | Unit::Natural(_))
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::None => f.write_str("unitless"),
            Unit::Pixels => f.write_str("px"),
            Unit::Percent => f.write_str("%"),
            Unit::Centimeters => f.write_str("cm"),
            Unit::Millimeters => f.write_str("mm"),
            Unit::Meters => f.write_str("m"),
            Unit::Inches => f.write_str("in"),
            Unit::Points => f.write_str("pt"),
            Unit::Natural(n) => f.write_str(n.keyword()),
        }
    }
}

/// Size keywords expressed as a fraction of the basis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NaturalSize {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
    Full,
    Half,
    Third,
    Quarter,
}

impl NaturalSize {
    pub fn from_keyword(word: &str) -> Option<NaturalSize> {
        Some(match word {
            "tiny" => NaturalSize::Tiny,
            "small" => NaturalSize::Small,
            "medium" => NaturalSize::Medium,
            "large" => NaturalSize::Large,
            "huge" => NaturalSize::Huge,
            "full" => NaturalSize::Full,
            "half" => NaturalSize::Half,
            "third" => NaturalSize::Third,
            "quarter" => NaturalSize::Quarter,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            NaturalSize::Tiny => "tiny",
            NaturalSize::Small => "small",
            NaturalSize::Medium => "medium",
            NaturalSize::Large => "large",
            NaturalSize::Huge => "huge",
            NaturalSize::Full => "full",
            NaturalSize::Half => "half",
            NaturalSize::Third => "third",
            NaturalSize::Quarter => "quarter",
        }
    }

    pub fn fraction(&self) -> f64 {
        match self {
            NaturalSize::Tiny => 0.1,
            NaturalSize::Small => 0.25,
            NaturalSize::Medium => 0.5,
            NaturalSize::Large => 0.75,
            NaturalSize::Huge => 0.9,
            NaturalSize::Full => 1.0,
            NaturalSize::Half => 0.5,
            NaturalSize::Third => 1.0 / 3.0,
            NaturalSize::Quarter => 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_fractions() {
        assert_eq!(Anchor::Center.fractions(), (0.5, 0.5));
        assert_eq!(Anchor::TopLeft.fractions(), (0.0, 0.0));
        assert_eq!(Anchor::BottomRight.fractions(), (1.0, 1.0));
        assert_eq!(Anchor::Right.fractions(), (1.0, 0.5));
    }

    #[test]
    fn test_unit_keywords() {
        assert_eq!(Unit::from_keyword("px"), Some(Unit::Pixels));
        assert_eq!(Unit::from_keyword("pixels"), Some(Unit::Pixels));
        assert_eq!(Unit::from_keyword("in"), Some(Unit::Inches));
        assert_eq!(
            Unit::from_keyword("half"),
            Some(Unit::Natural(NaturalSize::Half))
        );
        assert_eq!(Unit::from_keyword("furlong"), None);
        assert!(Unit::Percent.is_relative());
        assert!(!Unit::Centimeters.is_relative());
    }

    #[test]
    fn test_expr_var_visitor() {
        let expr = Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::Var(Spanned::new(Identifier::new("a"), 0..1))),
            rhs: Box::new(Expr::Neg(Box::new(Expr::Var(Spanned::new(
                Identifier::new("b"),
                4..5,
            ))))),
        };
        let mut seen = vec![];
        expr.for_each_var(&mut |id| seen.push(id.node.as_str()));
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_substitute_replaces_only_named_variable() {
        let var = |name: &str| Expr::Var(Spanned::new(Identifier::new(name), 0..1));
        let mut expr = Expr::Binary {
            op: BinaryOp::Mul,
            lhs: Box::new(var("i")),
            rhs: Box::new(Expr::Neg(Box::new(var("gap")))),
        };
        expr.substitute("i", Value::new(3.0, Unit::None));
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Mul,
                lhs: Box::new(Expr::px(3.0)),
                rhs: Box::new(Expr::Neg(Box::new(var("gap")))),
            }
        );
    }

    #[test]
    fn test_name_visitor_reaches_children_and_targets() {
        let mut child = ElementDecl::new(ElementKind::Circle, 0..1);
        child.name = Some(Spanned::new("dot".to_string(), 0..1));
        child.position = Some(Spanned::new(
            PositionExpr::Anchored {
                relation: Relation::Below,
                target: Spanned::new("box".to_string(), 0..1),
                gap: None,
            },
            0..1,
        ));
        let mut group = ElementDecl::new(ElementKind::Group, 0..1);
        group.children.push(Spanned::new(child, 0..1));

        let mut seen = vec![];
        group.for_each_name_mut(&mut |name| seen.push(name.clone()));
        assert_eq!(seen, vec!["dot".to_string(), "box".to_string()]);
    }

    #[test]
    fn test_position_target() {
        let pos = PositionExpr::Anchored {
            relation: Relation::Below,
            target: Spanned::new("A".to_string(), 0..3),
            gap: None,
        };
        assert_eq!(pos.target().map(|t| t.node.as_str()), Some("A"));
        assert!(PositionExpr::Aligned(Anchor::Center).target().is_none());
    }
}
