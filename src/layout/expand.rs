//! Template and loop expansion
//!
//! `define`, `place` and `for` statements are rewritten into plain element
//! declarations before the symbol table is built. Templates are collected
//! first, so a template may be placed before it is defined. Loop bounds are
//! evaluated against the document's variables and must be plain numbers.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use log::debug;

use crate::parser::ast::{
    BinaryOp, Document, ElementDecl, ElementKind, Expr, LoopDecl, PlaceDecl, SizeExpr, Span,
    Spanned, Statement, TemplateDecl, Unit, Value, VariableDecl,
};

use super::error::{LayoutError, NameKind};
use super::find_similar;
use super::symbols::VariableEvaluator;
use super::units::evaluate;

/// Loops may nest at most this deep
pub const MAX_LOOP_DEPTH: usize = 5;

/// Upper bound on the iterations of a single loop
pub const MAX_LOOP_ITERATIONS: usize = 10_000;

/// Expand templates and loops into element statements.
///
/// Documents without generators are returned as they are.
pub fn expand(doc: &Document) -> Result<Cow<'_, Document>, LayoutError> {
    if !doc.statements.iter().any(|stmt| stmt.node.is_generator()) {
        return Ok(Cow::Borrowed(doc));
    }

    let mut expander = Expander::new(doc)?;
    let mut statements = Vec::with_capacity(doc.statements.len());
    for stmt in &doc.statements {
        match &stmt.node {
            Statement::Template(_) => {}
            Statement::Place(place) => statements.push(expander.place(place, &stmt.span)?),
            Statement::Loop(decl) => expander.unroll(decl, &stmt.span, 0, &mut statements)?,
            _ => statements.push(stmt.clone()),
        }
    }

    debug!(
        "expanded {} templates into {} statements",
        expander.templates.len(),
        statements.len()
    );
    Ok(Cow::Owned(Document { statements }))
}

struct Expander<'a> {
    templates: HashMap<&'a str, &'a TemplateDecl>,
    decls: HashMap<&'a str, &'a VariableDecl>,
    values: HashMap<&'a str, Value>,
}

impl<'a> Expander<'a> {
    fn new(doc: &'a Document) -> Result<Self, LayoutError> {
        let mut templates: HashMap<&'a str, &'a TemplateDecl> = HashMap::new();
        let mut decls = HashMap::new();

        for stmt in &doc.statements {
            match &stmt.node {
                Statement::Template(template) => {
                    let name = template.name.node.as_str();
                    if let Some(first) = templates.get(name) {
                        return Err(LayoutError::duplicate(
                            name,
                            NameKind::Template,
                            template.name.span.clone(),
                            first.name.span.clone(),
                        ));
                    }
                    templates.insert(name, template);
                }
                // Duplicates are reported by the symbol table
                Statement::Variable(var) => {
                    decls.entry(var.name.node.as_str()).or_insert(var);
                }
                _ => {}
            }
        }

        Ok(Self {
            templates,
            decls,
            values: HashMap::new(),
        })
    }

    /// Evaluate a loop bound or scale factor to a plain number
    fn number(&mut self, expr: &Spanned<Expr>, owner: &str, quantity: &str) -> Result<f64, LayoutError> {
        let mut evaluator = VariableEvaluator::new(&self.decls, &mut self.values);
        let value = evaluate(&expr.node, &expr.span, owner, &mut |id| {
            evaluator.value_of(id, owner)
        })?;
        if value.unit != Unit::None {
            return Err(LayoutError::unit_mismatch(
                format!("{} of {} must be a plain number, got {}", quantity, owner, value.unit),
                expr.span.clone(),
            ));
        }
        Ok(value.number)
    }

    /// Turn one placement into an element statement
    fn place(&mut self, place: &PlaceDecl, span: &Span) -> Result<Spanned<Statement>, LayoutError> {
        let template_name = place.template.node.as_str();
        let owner = match &place.name {
            Some(name) => format!("placement '{}'", name.node),
            None => format!("placement of '{}'", template_name),
        };
        let template = *self.templates.get(template_name).ok_or_else(|| {
            LayoutError::unknown(
                template_name,
                owner.as_str(),
                place.template.span.clone(),
                find_similar(self.templates.keys().copied(), template_name, 2),
            )
        })?;

        let factor = match &place.scale {
            Some(scale) => {
                let factor = self.number(scale, &owner, "scale")?;
                if factor <= 0.0 {
                    return Err(LayoutError::invalid_value(
                        owner.as_str(),
                        format!("scale must be positive, got {}", factor),
                        scale.span.clone(),
                    ));
                }
                Some(factor)
            }
            None => None,
        };

        let mut element = match template.body.as_slice() {
            [single] => {
                let mut element = single.node.clone();
                if let Some(name) = &place.name {
                    element.name = Some(name.clone());
                }
                element
            }
            body => {
                let mut group = ElementDecl::new(ElementKind::Group, place.template.span.clone());
                group.name = place.name.clone();
                group.children = body.to_vec();
                if let Some(instance) = &place.name {
                    let mut locals = HashSet::new();
                    for child in body {
                        collect_local_names(&child.node, &mut locals);
                    }
                    for child in &mut group.children {
                        qualify(&mut child.node, &instance.node, &locals);
                    }
                }
                group
            }
        };

        // Overrides win over the template's own properties
        if place.position.is_some() {
            element.position = place.position.clone();
        }
        for (slot, value) in [
            (&mut element.size.width, &place.size.width),
            (&mut element.size.height, &place.size.height),
            (&mut element.size.radius, &place.size.radius),
        ] {
            if value.is_some() {
                *slot = value.clone();
            }
        }
        element.styles.extend(place.styles.iter().cloned());

        if let Some(factor) = factor {
            // A wrapping group takes its size from the overrides alone
            if template.body.len() == 1 {
                scale_sizes(&mut element, factor);
            } else {
                for child in &mut element.children {
                    scale_sizes(&mut child.node, factor);
                }
            }
        }

        Ok(Spanned::new(
            Statement::Element(Spanned::new(element, span.clone())),
            span.clone(),
        ))
    }

    /// Unroll a loop into `out`, recursing into nested loops and placements
    fn unroll(
        &mut self,
        decl: &LoopDecl,
        span: &Span,
        depth: usize,
        out: &mut Vec<Spanned<Statement>>,
    ) -> Result<(), LayoutError> {
        let var = decl.var.node.as_str();
        let owner = format!("loop '{}'", var);
        if depth >= MAX_LOOP_DEPTH {
            return Err(LayoutError::invalid_value(
                owner,
                format!("loops cannot be nested more than {} deep", MAX_LOOP_DEPTH),
                span.clone(),
            ));
        }

        let from = self.number(&decl.from, &owner, "start")?;
        let to = self.number(&decl.to, &owner, "end")?;
        let step = match &decl.step {
            Some(step) => {
                let value = self.number(step, &owner, "step")?;
                if value == 0.0 {
                    return Err(LayoutError::invalid_value(
                        owner,
                        "step cannot be zero",
                        step.span.clone(),
                    ));
                }
                if (to - from) * value < 0.0 {
                    return Err(LayoutError::invalid_value(
                        owner,
                        format!("step {} never reaches {} from {}", value, to, from),
                        step.span.clone(),
                    ));
                }
                value
            }
            None if to < from => -1.0,
            None => 1.0,
        };

        let steps = ((to - from) / step + 1e-9).floor();
        if steps >= MAX_LOOP_ITERATIONS as f64 {
            return Err(LayoutError::invalid_value(
                owner,
                format!("more than {} iterations", MAX_LOOP_ITERATIONS),
                span.clone(),
            ));
        }
        let count = steps as usize + 1;
        debug!("unrolling {} over {} iterations", owner, count);

        let pattern = format!("{{{}}}", var);
        for n in 0..count {
            // Round away accumulated error from fractional steps
            let index = ((from + n as f64 * step) * 1e9).round() / 1e9 + 0.0;
            let text = index.to_string();
            for item in &decl.body {
                let mut node = item.node.clone();
                bind(&mut node, var, Value::new(index, Unit::None), &pattern, &text);
                match node {
                    Statement::Loop(inner) => self.unroll(&inner, &item.span, depth + 1, out)?,
                    Statement::Place(place) => out.push(self.place(&place, &item.span)?),
                    other => out.push(Spanned::new(other, item.span.clone())),
                }
            }
        }
        Ok(())
    }
}

/// Substitute the loop variable into one body statement: as a number in
/// expressions and as `{var}` text in names and anchor targets
fn bind(stmt: &mut Statement, var: &str, value: Value, pattern: &str, text: &str) {
    let mut substitute = |expr: &mut Expr| expr.substitute(var, value);
    let mut interpolate = |name: &mut String| {
        if name.contains(pattern) {
            *name = name.replace(pattern, text);
        }
    };

    match stmt {
        Statement::Element(element) => {
            element.node.for_each_expr_mut(&mut substitute);
            element.node.for_each_name_mut(&mut interpolate);
        }
        Statement::Place(place) => {
            place.size.for_each_expr_mut(&mut substitute);
            if let Some(position) = &mut place.position {
                position.node.for_each_expr_mut(&mut substitute);
                position.node.for_each_target_mut(&mut interpolate);
            }
            for style in &mut place.styles {
                style.node.for_each_expr_mut(&mut substitute);
            }
            if let Some(scale) = &mut place.scale {
                substitute(&mut scale.node);
            }
            if let Some(name) = &mut place.name {
                interpolate(&mut name.node);
            }
        }
        Statement::Loop(inner) => {
            substitute(&mut inner.from.node);
            substitute(&mut inner.to.node);
            if let Some(step) = &mut inner.step {
                substitute(&mut step.node);
            }
            // An inner loop over the same name shadows this one
            if inner.var.node.as_str() != var {
                for item in &mut inner.body {
                    bind(&mut item.node, var, value, pattern, text);
                }
            }
        }
        Statement::Canvas(_)
        | Statement::Palette(_)
        | Statement::Variable(_)
        | Statement::Template(_) => {}
    }
}

/// Names declared inside a template, excluding text content
fn collect_local_names(element: &ElementDecl, out: &mut HashSet<String>) {
    if element.kind.node != ElementKind::Text {
        if let Some(name) = element.name_str() {
            out.insert(name.to_string());
        }
    }
    for child in &element.children {
        collect_local_names(&child.node, out);
    }
}

/// Prefix template-local names, and anchors pointing at them, with the
/// instance name
fn qualify(element: &mut ElementDecl, instance: &str, locals: &HashSet<String>) {
    let qualified = |name: &str| format!("{}.{}", instance, name);
    if element.kind.node != ElementKind::Text {
        if let Some(name) = &mut element.name {
            name.node = qualified(&name.node);
        }
    }
    if let Some(position) = &mut element.position {
        position.node.for_each_target_mut(&mut |target| {
            if locals.contains(target.as_str()) {
                *target = qualified(target);
            }
        });
    }
    for child in &mut element.children {
        qualify(&mut child.node, instance, locals);
    }
}

/// Multiply every declared width, height and radius in a subtree
fn scale_sizes(element: &mut ElementDecl, factor: f64) {
    scale_size(&mut element.size, factor);
    for child in &mut element.children {
        scale_sizes(&mut child.node, factor);
    }
}

fn scale_size(size: &mut SizeExpr, factor: f64) {
    size.for_each_expr_mut(&mut |expr| {
        let base = std::mem::replace(expr, Expr::px(0.0));
        *expr = Expr::Binary {
            op: BinaryOp::Mul,
            lhs: Box::new(base),
            rhs: Box::new(Expr::px(factor)),
        };
    });
}
