//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// One line of an element body, before it is folded into an `ElementDecl`
#[derive(Debug, Clone)]
enum BodyItem {
    Width(Spanned<Expr>),
    Height(Spanned<Expr>),
    Dimensions(Spanned<Expr>, Spanned<Expr>),
    Radius(Spanned<Expr>),
    Position(Spanned<PositionExpr>),
    Style(Spanned<StyleProperty>),
    Child(Spanned<ElementDecl>),
    Scale(Spanned<Expr>),
}

/// Parse scene source code into an AST
pub fn parse(input: &str) -> Result<Document, Vec<crate::ParseError>> {
    let len = input.len();

    let tokens = crate::parser::lexer::lex(input)?;
    let misused = misused_keywords(&tokens);
    let token_iter = tokens
        .into_iter()
        .map(|(tok, span)| (tok, SimpleSpan::from(span)));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            errs.into_iter()
                .map(|e| reserved_name_error(e.into(), &misused, input))
                .collect()
        })
}

/// Spans of keywords written where a variable or palette name is declared,
/// as in `top is 10` or `center = red`
fn misused_keywords(tokens: &[(Token, std::ops::Range<usize>)]) -> Vec<std::ops::Range<usize>> {
    tokens
        .windows(2)
        .filter(|pair| pair[0].0.is_keyword() && matches!(pair[1].0, Token::Is | Token::Equals))
        .map(|pair| pair[0].1.clone())
        .collect()
}

/// Explain a syntax error that starts at a misused keyword
fn reserved_name_error(
    err: crate::ParseError,
    misused: &[std::ops::Range<usize>],
    input: &str,
) -> crate::ParseError {
    match misused.iter().find(|span| span.start == err.span().start) {
        Some(span) => crate::ParseError::syntax(
            span.clone(),
            format!(
                "cannot use '{}' as a name, it is a reserved keyword",
                &input[span.clone()]
            ),
        ),
        None => err,
    }
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// In `200 by 100 pixels` the trailing unit belongs to both sides
fn share_trailing_unit(width: Spanned<Expr>, height: &Spanned<Expr>) -> Spanned<Expr> {
    match (&width.node, &height.node) {
        (Expr::Literal(w), Expr::Literal(h)) if w.unit == Unit::None && h.unit != Unit::None => {
            Spanned::new(Expr::number(w.number, h.unit), width.span)
        }
        _ => width,
    }
}

fn build_element(
    kind: Spanned<ElementKind>,
    name: Option<Spanned<String>>,
    items: Vec<BodyItem>,
) -> ElementDecl {
    let mut decl = ElementDecl::new(kind.node, kind.span);
    decl.name = name;
    // Later lines override earlier ones
    for item in items {
        match item {
            BodyItem::Width(w) => decl.size.width = Some(w),
            BodyItem::Height(h) => decl.size.height = Some(h),
            BodyItem::Dimensions(w, h) => {
                decl.size.width = Some(w);
                decl.size.height = Some(h);
            }
            BodyItem::Radius(r) => decl.size.radius = Some(r),
            BodyItem::Position(p) => decl.position = Some(p),
            BodyItem::Style(s) => decl.styles.push(s),
            BodyItem::Child(c) => decl.children.push(c),
            // Only `place` bodies accept a scale
            BodyItem::Scale(_) => {}
        }
    }
    decl
}

fn build_place(
    template: Spanned<Identifier>,
    name: Option<Spanned<String>>,
    items: Vec<BodyItem>,
) -> PlaceDecl {
    let mut place = PlaceDecl {
        template,
        name,
        size: SizeExpr::default(),
        position: None,
        styles: vec![],
        scale: None,
    };
    for item in items {
        match item {
            BodyItem::Width(w) => place.size.width = Some(w),
            BodyItem::Height(h) => place.size.height = Some(h),
            BodyItem::Dimensions(w, h) => {
                place.size.width = Some(w);
                place.size.height = Some(h);
            }
            BodyItem::Radius(r) => place.size.radius = Some(r),
            BodyItem::Position(p) => place.position = Some(p),
            BodyItem::Style(s) => place.styles.push(s),
            BodyItem::Scale(factor) => place.scale = Some(factor),
            // Only element bodies accept children
            BodyItem::Child(_) => {}
        }
    }
    place
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Document, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    // Basic token parsers
    let identifier = select! {
        Token::Ident(s) => Identifier::new(s),
    }
    .map_with(|id, e| Spanned::new(id, span_range(&e.span())));

    let string_literal = select! {
        Token::String(s) => s,
    }
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    let newline = just(Token::Newline);

    // Scalar expressions: literals with units, natural sizes, variables,
    // unary minus, + - * / and parentheses
    let expr = recursive(|expr| {
        let unit = choice((
            just(Token::Percent).to(Unit::Percent),
            select! { Token::Ident(s) => s }.try_map(|s, span| match Unit::from_keyword(&s) {
                Some(Unit::Natural(_)) | None => {
                    Err(Rich::custom(span, format!("'{}' is not a unit", s)))
                }
                Some(unit) => Ok(unit),
            }),
        ));

        let literal = select! { Token::Number(n) => n }
            .then(unit.or_not())
            .map(|(n, unit)| Expr::number(n, unit.unwrap_or(Unit::None)));

        let natural = select! { Token::Ident(s) => s }.try_map(|s, span| {
            NaturalSize::from_keyword(&s)
                .map(|size| Expr::number(1.0, Unit::Natural(size)))
                .ok_or_else(|| Rich::custom(span, format!("'{}' is not a natural size", s)))
        });

        let atom = choice((
            literal,
            natural,
            identifier.clone().map(Expr::Var),
            expr.delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        ));

        let unary = just(Token::Minus)
            .repeated()
            .foldr(atom, |_, inner| Expr::Neg(Box::new(inner)));

        let product = unary.clone().foldl(
            choice((
                just(Token::Star).to(BinaryOp::Mul),
                just(Token::Slash).to(BinaryOp::Div),
            ))
            .then(unary)
            .repeated(),
            |lhs, (op, rhs)| Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        );

        product.clone().foldl(
            choice((
                just(Token::Plus).to(BinaryOp::Add),
                just(Token::Minus).to(BinaryOp::Sub),
            ))
            .then(product)
            .repeated(),
            |lhs, (op, rhs)| Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        )
    })
    .map_with(|x, e| Spanned::new(x, span_range(&e.span())))
    .boxed();

    // W by H [unit]
    let dimensions = expr
        .clone()
        .then_ignore(just(Token::By))
        .then(expr.clone())
        .map(|(w, h)| (share_trailing_unit(w, &h), h));

    // Colors: hex, rgb(r g b), or one or more words
    let channel = select! { Token::Number(n) => n }.try_map(|n, span| {
        if n.fract() == 0.0 && (0.0..=255.0).contains(&n) {
            Ok(n as u8)
        } else {
            Err(Rich::custom(span, "color channel must be an integer from 0 to 255"))
        }
    });
    let comma = just(Token::Comma).or_not();

    let color = choice((
        select! { Token::HexColor(c) => ColorExpr::Hex(c) },
        just(Token::Rgb)
            .ignore_then(
                channel
                    .clone()
                    .then_ignore(comma.clone())
                    .then(channel.clone())
                    .then_ignore(comma)
                    .then(channel)
                    .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
            )
            .map(|((r, g), b)| ColorExpr::Rgb(r, g, b)),
        select! { Token::Ident(s) => s }
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|words| ColorExpr::Named(words.join(" "))),
    ))
    .map_with(|c, e| Spanned::new(c, span_range(&e.span())))
    .boxed();

    let anchor = choice((
        just(Token::Center).to(Anchor::Center),
        just(Token::Top)
            .ignore_then(
                choice((
                    just(Token::Left).to(Anchor::TopLeft),
                    just(Token::Right).to(Anchor::TopRight),
                ))
                .or_not(),
            )
            .map(|a| a.unwrap_or(Anchor::Top)),
        just(Token::Bottom)
            .ignore_then(
                choice((
                    just(Token::Left).to(Anchor::BottomLeft),
                    just(Token::Right).to(Anchor::BottomRight),
                ))
                .or_not(),
            )
            .map(|a| a.unwrap_or(Anchor::Bottom)),
        just(Token::Left).to(Anchor::Left),
        just(Token::Right).to(Anchor::Right),
    ));

    // Position lines
    let gap = just(Token::With)
        .ignore_then(just(Token::Gap))
        .ignore_then(expr.clone())
        .or_not();

    let relation = choice((
        just(Token::Below).to(Relation::Below),
        just(Token::Above).to(Relation::Above),
        just(Token::Left).then(just(Token::Of)).to(Relation::LeftOf),
        just(Token::Right).then(just(Token::Of)).to(Relation::RightOf),
    ));

    let position = choice((
        just(Token::At)
            .ignore_then(anchor.clone())
            .map(PositionExpr::Aligned),
        just(Token::At)
            .ignore_then(expr.clone())
            .then(expr.clone())
            .map(|(x, y)| PositionExpr::Point { x, y }),
        relation
            .then(string_literal.clone())
            .then(gap)
            .map(|((relation, target), gap)| PositionExpr::Anchored {
                relation,
                target,
                gap,
            }),
        just(Token::Inside)
            .ignore_then(string_literal.clone())
            .then(just(Token::At).ignore_then(anchor).or_not())
            .map(|(target, anchor)| PositionExpr::Anchored {
                relation: Relation::Inside(anchor.unwrap_or(Anchor::Center)),
                target,
                gap: None,
            }),
    ))
    .map_with(|p, e| BodyItem::Position(Spanned::new(p, span_range(&e.span()))));

    // Size lines; `size N` on its own is a font size
    let size = choice((
        just(Token::Width).ignore_then(expr.clone()).map(BodyItem::Width),
        just(Token::Height).ignore_then(expr.clone()).map(BodyItem::Height),
        just(Token::Radius).ignore_then(expr.clone()).map(BodyItem::Radius),
        just(Token::Size)
            .ignore_then(dimensions.clone())
            .map(|(w, h)| BodyItem::Dimensions(w, h)),
        just(Token::Size)
            .ignore_then(expr.clone())
            .map_with(|n, e| {
                BodyItem::Style(Spanned::new(
                    StyleProperty::FontSize(n),
                    span_range(&e.span()),
                ))
            }),
    ));

    // Bare-word style flags are identifiers so they stay usable in color names
    let flag = select! {
        Token::Ident(s) if s == "dashed" => StyleProperty::Dash(DashStyle::Dashed),
        Token::Ident(s) if s == "dotted" => StyleProperty::Dash(DashStyle::Dotted),
        Token::Ident(s) if s == "bold" => StyleProperty::FontWeight(FontWeight::Bold),
        Token::Ident(s) if s == "light" => StyleProperty::FontWeight(FontWeight::Light),
        Token::Ident(s) if s == "italic" => StyleProperty::Italic,
    };

    let text_align = choice((
        just(Token::Left).to(TextAlign::Left),
        just(Token::Center).to(TextAlign::Center),
        just(Token::Right).to(TextAlign::Right),
    ));

    let point = expr.clone().then(expr.clone());

    let style = choice((
        just(Token::Fill)
            .ignore_then(just(Token::Gradient))
            .ignore_then(color.clone())
            .then_ignore(just(Token::To))
            .then(color.clone())
            .map(|(from, to)| StyleProperty::Gradient {
                from: from.node,
                to: to.node,
            }),
        just(Token::Fill)
            .ignore_then(color.clone())
            .map(|c| StyleProperty::Fill(c.node)),
        just(Token::Stroke)
            .ignore_then(color.clone())
            .then(expr.clone().or_not())
            .map(|(c, width)| StyleProperty::Stroke {
                color: c.node,
                width,
            }),
        just(Token::Opacity)
            .ignore_then(expr.clone())
            .map(StyleProperty::Opacity),
        just(Token::Rounded)
            .ignore_then(expr.clone())
            .map(StyleProperty::Rounded),
        just(Token::Rotate)
            .ignore_then(expr.clone())
            .map(StyleProperty::Rotate),
        just(Token::Font)
            .ignore_then(string_literal.clone())
            .map(|f| StyleProperty::FontFamily(f.node)),
        just(Token::Color)
            .ignore_then(color.clone())
            .map(|c| StyleProperty::TextColor(c.node)),
        just(Token::Align)
            .ignore_then(text_align)
            .map(StyleProperty::Align),
        just(Token::From)
            .ignore_then(point.clone())
            .map(|(x, y)| StyleProperty::From(x, y)),
        just(Token::To)
            .ignore_then(point.clone())
            .map(|(x, y)| StyleProperty::To(x, y)),
        just(Token::Points)
            .ignore_then(
                point
                    .separated_by(just(Token::Comma))
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .map(StyleProperty::Points),
        select! { Token::Ident(s) if s == "d" => () }
            .ignore_then(string_literal.clone())
            .map(|d| StyleProperty::PathData(d.node)),
        select! { Token::Ident(s) if s == "src" => () }
            .ignore_then(string_literal.clone())
            .map(|s| StyleProperty::Source(s.node)),
        flag,
    ))
    .map_with(|s, e| BodyItem::Style(Spanned::new(s, span_range(&e.span()))))
    .boxed();

    let property = choice((size, position, style)).then_ignore(newline.clone());

    let scale = just(Token::Scale)
        .ignore_then(expr.clone())
        .map(BodyItem::Scale)
        .then_ignore(newline.clone());
    let place_body = choice((property.clone(), scale))
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .delimited_by(just(Token::Indent), just(Token::Dedent));

    let element_kind = select! {
        Token::Rectangle => ElementKind::Rectangle,
        Token::Circle => ElementKind::Circle,
        Token::Ellipse => ElementKind::Ellipse,
        Token::Line => ElementKind::Line,
        Token::Polygon => ElementKind::Polygon,
        Token::Path => ElementKind::Path,
        Token::Text => ElementKind::Text,
        Token::Group => ElementKind::Group,
        Token::Image => ElementKind::Image,
    }
    .map_with(|k, e| Spanned::new(k, span_range(&e.span())));

    // kind ["name"] followed by an optional indented body of properties and
    // nested elements
    let element = recursive(|element| {
        let body = choice((property, element.map(BodyItem::Child)))
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .delimited_by(just(Token::Indent), just(Token::Dedent));

        element_kind
            .then(string_literal.clone().or_not())
            .then_ignore(newline.clone())
            .then(body.or_not())
            .map_with(|((kind, name), items), e| {
                Spanned::new(
                    build_element(kind, name, items.unwrap_or_default()),
                    span_range(&e.span()),
                )
            })
    })
    .boxed();

    // place template ["instance"], with optional indented overrides
    let place = just(Token::Place)
        .ignore_then(identifier.clone())
        .then(string_literal.clone().or_not())
        .then_ignore(newline.clone())
        .then(place_body.or_not())
        .map(|((template, name), items)| build_place(template, name, items.unwrap_or_default()))
        .boxed();

    // define name: followed by the template's elements
    let template = just(Token::Define)
        .ignore_then(identifier.clone())
        .then_ignore(just(Token::Colon))
        .then_ignore(newline.clone())
        .then(
            element
                .clone()
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>()
                .delimited_by(just(Token::Indent), just(Token::Dedent)),
        )
        .map(|(name, body)| Statement::Template(TemplateDecl { name, body }));

    // for var from A to B [step C], with a body of elements, placements and
    // nested loops
    let for_loop = recursive(|for_loop| {
        let item = choice((
            element.clone().map(Statement::Element),
            place.clone().map(Statement::Place),
            for_loop,
        ))
        .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

        just(Token::For)
            .ignore_then(identifier.clone())
            .then_ignore(just(Token::From))
            .then(expr.clone())
            .then_ignore(just(Token::To))
            .then(expr.clone())
            .then(just(Token::Step).ignore_then(expr.clone()).or_not())
            .then_ignore(newline.clone())
            .then(
                item.repeated()
                    .at_least(1)
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::Indent), just(Token::Dedent)),
            )
            .map(|((((var, from), to), step), body)| {
                Statement::Loop(LoopDecl {
                    var,
                    from,
                    to,
                    step,
                    body,
                })
            })
    })
    .boxed();

    // canvas W by H [unit], with an optional indented background line
    let canvas = just(Token::Canvas)
        .ignore_then(dimensions.or_not())
        .then_ignore(newline.clone())
        .then(
            just(Token::Background)
                .ignore_then(color.clone())
                .then_ignore(newline.clone())
                .delimited_by(just(Token::Indent), just(Token::Dedent))
                .or_not(),
        )
        .map(|(dims, background)| {
            let (width, height) = match dims {
                Some((w, h)) => (Some(w), Some(h)),
                None => (None, None),
            };
            Statement::Canvas(CanvasDecl {
                width,
                height,
                background,
            })
        });

    let palette_entry = identifier
        .clone()
        .then_ignore(just(Token::Equals))
        .then(color)
        .then_ignore(newline.clone())
        .map_with(|(name, color), e| {
            Spanned::new(PaletteEntry { name, color }, span_range(&e.span()))
        });

    let palette = just(Token::Colors)
        .ignore_then(just(Token::Colon))
        .ignore_then(newline.clone())
        .ignore_then(
            palette_entry
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>()
                .delimited_by(just(Token::Indent), just(Token::Dedent)),
        )
        .map(Statement::Palette);

    let variable = identifier
        .then_ignore(just(Token::Is))
        .then(expr)
        .then_ignore(newline)
        .map(|(name, value)| Statement::Variable(VariableDecl { name, value }));

    let statement = choice((
        canvas,
        palette,
        template,
        place.map(Statement::Place),
        for_loop,
        variable,
        element.map(Statement::Element),
    ))
        .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    statement
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|statements| Document { statements })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Document {
        parse(input).unwrap_or_else(|errs| panic!("parse failed: {:?}", errs))
    }

    fn only_element(doc: &Document) -> &ElementDecl {
        &doc.elements().next().expect("an element").node
    }

    #[test]
    fn test_empty_document() {
        let doc = parse_ok("");
        assert!(doc.statements.is_empty());
    }

    #[test]
    fn test_canvas_with_shared_unit() {
        let doc = parse_ok("canvas 400 by 300 pixels\n");
        let canvas = doc.canvas().expect("canvas");
        assert_eq!(
            canvas.width.as_ref().map(|w| &w.node),
            Some(&Expr::number(400.0, Unit::Pixels))
        );
        assert_eq!(
            canvas.height.as_ref().map(|h| &h.node),
            Some(&Expr::number(300.0, Unit::Pixels))
        );
        assert!(canvas.background.is_none());
    }

    #[test]
    fn test_canvas_background() {
        let doc = parse_ok("canvas 400 by 300\n  background light gray\n");
        let canvas = doc.canvas().expect("canvas");
        assert_eq!(
            canvas.background.as_ref().map(|b| &b.node),
            Some(&ColorExpr::Named("light gray".to_string()))
        );
    }

    #[test]
    fn test_variable() {
        let doc = parse_ok("gap_size is 30\n");
        match &doc.statements[0].node {
            Statement::Variable(v) => {
                assert_eq!(v.name.node.as_str(), "gap_size");
                assert_eq!(v.value.node, Expr::px(30.0));
            }
            other => panic!("expected variable, got {:?}", other),
        }
    }

    #[test]
    fn test_palette() {
        let doc = parse_ok("colors:\n  brand = #336699\n  accent = rgb(255, 0 0)\n");
        match &doc.statements[0].node {
            Statement::Palette(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].node.name.node.as_str(), "brand");
                assert_eq!(entries[1].node.color.node, ColorExpr::Rgb(255, 0, 0));
            }
            other => panic!("expected palette, got {:?}", other),
        }
    }

    #[test]
    fn test_element_with_size_and_position() {
        let doc = parse_ok("rectangle \"A\"\n  size 200 by 50\n  at 100 100\n");
        let el = only_element(&doc);
        assert_eq!(el.kind.node, ElementKind::Rectangle);
        assert_eq!(el.name_str(), Some("A"));
        assert_eq!(el.size.width.as_ref().map(|w| &w.node), Some(&Expr::px(200.0)));
        assert!(matches!(
            el.position.as_ref().map(|p| &p.node),
            Some(PositionExpr::Point { .. })
        ));
    }

    #[test]
    fn test_anchored_position_with_gap() {
        let doc = parse_ok("rect \"B\"\n  below \"A\" with gap gap_size\n");
        let el = only_element(&doc);
        match el.position.as_ref().map(|p| &p.node) {
            Some(PositionExpr::Anchored {
                relation: Relation::Below,
                target,
                gap: Some(gap),
            }) => {
                assert_eq!(target.node, "A");
                assert!(matches!(&gap.node, Expr::Var(id) if id.node.as_str() == "gap_size"));
            }
            other => panic!("unexpected position {:?}", other),
        }
    }

    #[test]
    fn test_left_of_and_inside() {
        let doc = parse_ok("rect\n  left of \"A\"\nrect\n  inside \"A\" at top right\n");
        let els: Vec<_> = doc.elements().collect();
        assert!(matches!(
            els[0].node.position.as_ref().map(|p| &p.node),
            Some(PositionExpr::Anchored { relation: Relation::LeftOf, .. })
        ));
        assert!(matches!(
            els[1].node.position.as_ref().map(|p| &p.node),
            Some(PositionExpr::Anchored {
                relation: Relation::Inside(Anchor::TopRight),
                ..
            })
        ));
    }

    #[test]
    fn test_aligned_positions() {
        for (src, anchor) in [
            ("at center", Anchor::Center),
            ("at top", Anchor::Top),
            ("at bottom left", Anchor::BottomLeft),
            ("at right", Anchor::Right),
        ] {
            let doc = parse_ok(&format!("rect\n  {}\n", src));
            assert_eq!(
                only_element(&doc).position.as_ref().map(|p| &p.node),
                Some(&PositionExpr::Aligned(anchor)),
                "{}",
                src
            );
        }
    }

    #[test]
    fn test_expression_precedence() {
        let doc = parse_ok("w is 10 + 2 * 3\n");
        let Statement::Variable(v) = &doc.statements[0].node else {
            panic!("expected variable");
        };
        assert_eq!(
            v.value.node,
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr::px(10.0)),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: Box::new(Expr::px(2.0)),
                    rhs: Box::new(Expr::px(3.0)),
                }),
            }
        );
    }

    #[test]
    fn test_units_and_natural_sizes() {
        let doc = parse_ok("rect\n  width 50%\n  height half\n  at 2 cm (-1 in)\n");
        let el = only_element(&doc);
        assert_eq!(
            el.size.width.as_ref().map(|w| &w.node),
            Some(&Expr::percent(50.0))
        );
        assert_eq!(
            el.size.height.as_ref().map(|h| &h.node),
            Some(&Expr::number(1.0, Unit::Natural(NaturalSize::Half)))
        );
        match el.position.as_ref().map(|p| &p.node) {
            Some(PositionExpr::Point { x, y }) => {
                assert_eq!(x.node, Expr::number(2.0, Unit::Centimeters));
                assert_eq!(
                    y.node,
                    Expr::Neg(Box::new(Expr::number(1.0, Unit::Inches)))
                );
            }
            other => panic!("unexpected position {:?}", other),
        }
    }

    #[test]
    fn test_styles() {
        let src = "rect\n  fill light blue\n  stroke #000 2\n  dashed\n  opacity 50%\n  rounded 4\n  rotate 45\n";
        let doc = parse_ok(src);
        let styles: Vec<_> = only_element(&doc).styles.iter().map(|s| &s.node).collect();
        assert_eq!(styles.len(), 6);
        assert_eq!(
            styles[0],
            &StyleProperty::Fill(ColorExpr::Named("light blue".to_string()))
        );
        match styles[1] {
            StyleProperty::Stroke { color, width } => {
                assert_eq!(color, &ColorExpr::Hex("#000".to_string()));
                assert_eq!(width.as_ref().map(|w| &w.node), Some(&Expr::px(2.0)));
            }
            other => panic!("expected stroke, got {:?}", other),
        }
        assert_eq!(styles[2], &StyleProperty::Dash(DashStyle::Dashed));
        assert!(matches!(styles[3], StyleProperty::Opacity(o) if o.node == Expr::percent(50.0)));
        assert!(matches!(styles[4], StyleProperty::Rounded(r) if r.node == Expr::px(4.0)));
        assert!(matches!(styles[5], StyleProperty::Rotate(r) if r.node == Expr::px(45.0)));
    }

    #[test]
    fn test_gradient_fill() {
        let doc = parse_ok("rect\n  fill gradient white to dark blue\n");
        assert_eq!(
            only_element(&doc).styles[0].node,
            StyleProperty::Gradient {
                from: ColorExpr::Named("white".to_string()),
                to: ColorExpr::Named("dark blue".to_string()),
            }
        );
    }

    #[test]
    fn test_text_properties() {
        let doc = parse_ok("text \"Hello\"\n  size 24\n  bold\n  italic\n  font \"Inter\"\n  color red\n  align left\n");
        let el = only_element(&doc);
        assert_eq!(el.kind.node, ElementKind::Text);
        assert_eq!(el.name_str(), Some("Hello"));
        assert!(el.size.is_empty());
        let kinds: Vec<_> = el.styles.iter().map(|s| &s.node).collect();
        assert!(matches!(kinds[0], StyleProperty::FontSize(_)));
        assert_eq!(kinds[1], &StyleProperty::FontWeight(FontWeight::Bold));
        assert_eq!(kinds[2], &StyleProperty::Italic);
        assert_eq!(kinds[3], &StyleProperty::FontFamily("Inter".to_string()));
        assert_eq!(kinds[4], &StyleProperty::TextColor(ColorExpr::Named("red".to_string())));
        assert_eq!(kinds[5], &StyleProperty::Align(TextAlign::Left));
    }

    #[test]
    fn test_shape_data() {
        let doc = parse_ok(
            "line\n  from 0 0\n  to 100 50\npolygon\n  points 0 0, 10 0, 5 8\npath\n  d \"M0 0 L10 10\"\nimage\n  src \"logo.png\"\n",
        );
        let els: Vec<_> = doc.elements().collect();
        assert_eq!(els.len(), 4);
        assert!(matches!(els[0].node.styles[1].node, StyleProperty::To(_, _)));
        match &els[1].node.styles[0].node {
            StyleProperty::Points(points) => assert_eq!(points.len(), 3),
            other => panic!("expected points, got {:?}", other),
        }
        assert_eq!(
            els[2].node.styles[0].node,
            StyleProperty::PathData("M0 0 L10 10".to_string())
        );
        assert_eq!(
            els[3].node.styles[0].node,
            StyleProperty::Source("logo.png".to_string())
        );
    }

    #[test]
    fn test_nested_elements() {
        let src = "group \"G\"\n  size 200 by 200\n  rect \"inner\"\n    width 50%\n  circle\n    radius 10\n";
        let doc = parse_ok(src);
        let group = only_element(&doc);
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[0].node.name_str(), Some("inner"));
        assert_eq!(group.children[1].node.kind.node, ElementKind::Circle);
    }

    #[test]
    fn test_element_without_body() {
        let doc = parse_ok("rect \"A\"\ncircle \"B\"\n");
        assert_eq!(doc.elements().count(), 2);
    }

    #[test]
    fn test_unknown_property_is_error() {
        assert!(parse("rect\n  wiggle 5\n").is_err());
    }

    #[test]
    fn test_missing_target_quotes_is_error() {
        assert!(parse("rect\n  below A\n").is_err());
    }

    #[test]
    fn test_template_definition() {
        let doc = parse_ok("define desk:\n  rect \"top\"\n    size 80 by 50\n  rect \"leg\"\n");
        match &doc.statements[0].node {
            Statement::Template(t) => {
                assert_eq!(t.name.node.as_str(), "desk");
                assert_eq!(t.body.len(), 2);
                assert_eq!(t.body[1].node.name_str(), Some("leg"));
            }
            other => panic!("expected template, got {:?}", other),
        }
        assert_eq!(doc.elements().count(), 0);
    }

    #[test]
    fn test_place_with_overrides() {
        let doc = parse_ok("place desk \"D1\"\n  at 10 20\n  fill red\n  scale 2\n  rotate 90\n");
        match &doc.statements[0].node {
            Statement::Place(p) => {
                assert_eq!(p.template.node.as_str(), "desk");
                assert_eq!(p.name.as_ref().map(|n| n.node.as_str()), Some("D1"));
                assert!(matches!(
                    p.position.as_ref().map(|pos| &pos.node),
                    Some(PositionExpr::Point { .. })
                ));
                assert_eq!(p.styles.len(), 2);
                assert_eq!(p.scale.as_ref().map(|s| &s.node), Some(&Expr::px(2.0)));
            }
            other => panic!("expected place, got {:?}", other),
        }
    }

    #[test]
    fn test_place_without_body() {
        let doc = parse_ok("place desk\n");
        assert!(matches!(
            &doc.statements[0].node,
            Statement::Place(p) if p.name.is_none() && p.scale.is_none()
        ));
    }

    #[test]
    fn test_nested_loops() {
        let src = "for row from 0 to 1\n  for col from 0 to n step 2\n    rect \"Tile_{row}_{col}\"\n  place desk\n";
        let doc = parse_ok(src);
        let Statement::Loop(outer) = &doc.statements[0].node else {
            panic!("expected loop");
        };
        assert_eq!(outer.var.node.as_str(), "row");
        assert!(outer.step.is_none());
        assert_eq!(outer.body.len(), 2);
        let Statement::Loop(inner) = &outer.body[0].node else {
            panic!("expected nested loop");
        };
        assert!(matches!(&inner.to.node, Expr::Var(id) if id.node.as_str() == "n"));
        assert_eq!(inner.step.as_ref().map(|s| &s.node), Some(&Expr::px(2.0)));
        assert!(matches!(&inner.body[0].node, Statement::Element(_)));
        assert!(matches!(&outer.body[1].node, Statement::Place(_)));
    }

    #[test]
    fn test_descending_loop_step() {
        let doc = parse_ok("for i from 3 to 0 step -1\n  rect\n");
        let Statement::Loop(l) = &doc.statements[0].node else {
            panic!("expected loop");
        };
        assert_eq!(
            l.step.as_ref().map(|s| &s.node),
            Some(&Expr::Neg(Box::new(Expr::px(1.0))))
        );
    }

    #[test]
    fn test_keyword_as_variable_name() {
        let errors = parse("top is 10\n").unwrap_err();
        assert!(errors[0]
            .to_string()
            .contains("cannot use 'top' as a name, it is a reserved keyword"));
        assert_eq!(errors[0].span(), &(0..3));
    }

    #[test]
    fn test_keyword_as_palette_name() {
        let errors = parse("colors:\n  center = red\n").unwrap_err();
        assert!(errors[0].to_string().contains("cannot use 'center' as a name"));
    }
}
