//! Symbol table construction
//!
//! Flattens the element tree into an arena indexed by [`ElementId`] and
//! collects the three namespaces of a document: element names, palette
//! colors and variables. Palette entries and variables are resolved here,
//! once, so later phases only ever see final values.

use std::collections::HashMap;

use log::debug;

use crate::colors::{Color, ColorTable};
use crate::parser::ast::{
    CanvasDecl, ColorExpr, Document, ElementDecl, Identifier, Span, Spanned, Statement, Value,
    VariableDecl,
};

use super::error::{LayoutError, NameKind};
use super::find_similar;
use super::types::{element_label, svg_id, ElementId};
use super::units::evaluate;

/// An element in the arena
#[derive(Debug, Clone)]
pub struct ElementNode<'a> {
    pub id: ElementId,
    pub decl: &'a ElementDecl,
    pub span: Span,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
}

impl ElementNode<'_> {
    pub fn name(&self) -> Option<&str> {
        self.decl.name_str()
    }

    /// Name for diagnostics
    pub fn label(&self) -> String {
        element_label(self.name(), self.decl.kind.node, self.id)
    }
}

/// Lookup tables for a single document
#[derive(Debug)]
pub struct SymbolTable<'a> {
    nodes: Vec<ElementNode<'a>>,
    top_level: Vec<ElementId>,
    names: HashMap<&'a str, ElementId>,
    /// SVG ids of named elements, which must stay unique too
    ids: HashMap<String, ElementId>,
    palette: HashMap<&'a str, Color>,
    variables: HashMap<&'a str, Value>,
    canvas: Option<&'a CanvasDecl>,
    colors: &'a ColorTable,
}

impl<'a> SymbolTable<'a> {
    /// Build the symbol table for a document.
    ///
    /// Fails on duplicate names in any namespace, on a second canvas, on
    /// palette or variable references that cannot be resolved, and on
    /// variables that depend on themselves.
    pub fn build(doc: &'a Document, colors: &'a ColorTable) -> Result<Self, LayoutError> {
        let mut table = SymbolTable {
            nodes: Vec::new(),
            top_level: Vec::new(),
            names: HashMap::new(),
            ids: HashMap::new(),
            palette: HashMap::new(),
            variables: HashMap::new(),
            canvas: None,
            colors,
        };

        let mut canvas_span: Option<&Span> = None;
        let mut palette_spans: HashMap<&str, &Span> = HashMap::new();
        let mut variable_spans: HashMap<&str, &Span> = HashMap::new();
        let mut variable_decls: Vec<&'a VariableDecl> = Vec::new();

        for stmt in &doc.statements {
            match &stmt.node {
                Statement::Canvas(canvas) => {
                    if let Some(first) = canvas_span {
                        return Err(LayoutError::duplicate(
                            "canvas",
                            NameKind::Canvas,
                            stmt.span.clone(),
                            first.clone(),
                        ));
                    }
                    canvas_span = Some(&stmt.span);
                    table.canvas = Some(canvas);
                }
                Statement::Palette(entries) => {
                    for entry in entries {
                        let name = entry.node.name.node.as_str();
                        if let Some(first) = palette_spans.get(name) {
                            return Err(LayoutError::duplicate(
                                name,
                                NameKind::PaletteColor,
                                entry.node.name.span.clone(),
                                (*first).clone(),
                            ));
                        }
                        // Entries may only refer to colors defined before them
                        let color = table.resolve_color(
                            &entry.node.color.node,
                            &entry.node.color.span,
                            &format!("palette color '{}'", name),
                        )?;
                        table.palette.insert(name, color);
                        palette_spans.insert(name, &entry.node.name.span);
                    }
                }
                Statement::Variable(var) => {
                    let name = var.name.node.as_str();
                    if let Some(first) = variable_spans.get(name) {
                        return Err(LayoutError::duplicate(
                            name,
                            NameKind::Variable,
                            var.name.span.clone(),
                            (*first).clone(),
                        ));
                    }
                    variable_spans.insert(name, &var.name.span);
                    variable_decls.push(var);
                }
                Statement::Element(element) => {
                    let id = table.add_element(element, None)?;
                    table.top_level.push(id);
                }
                Statement::Template(_) | Statement::Place(_) | Statement::Loop(_) => {
                    return Err(LayoutError::invalid_value(
                        "document",
                        "templates and loops must be expanded before building the symbol table",
                        stmt.span.clone(),
                    ));
                }
            }
        }

        let decls = variable_decls
            .iter()
            .map(|decl| (decl.name.node.as_str(), *decl))
            .collect();
        let mut evaluator = VariableEvaluator::new(&decls, &mut table.variables);
        for decl in &variable_decls {
            evaluator.value_of(&decl.name, "document")?;
        }

        debug!(
            "symbol table: {} elements ({} named), {} palette colors, {} variables",
            table.nodes.len(),
            table.names.len(),
            table.palette.len(),
            table.variables.len()
        );

        Ok(table)
    }

    /// Add an element and its descendants in pre-order
    fn add_element(
        &mut self,
        element: &'a Spanned<ElementDecl>,
        parent: Option<ElementId>,
    ) -> Result<ElementId, LayoutError> {
        let id = ElementId(self.nodes.len());
        let decl = &element.node;

        if let Some(name) = &decl.name {
            if let Some(&first) = self.names.get(name.node.as_str()) {
                return Err(LayoutError::duplicate(
                    name.node.as_str(),
                    NameKind::Element,
                    name.span.clone(),
                    self.name_span(first),
                ));
            }
            let svg = svg_id(&name.node);
            if let Some(&first) = self.ids.get(&svg) {
                return Err(LayoutError::duplicate(
                    svg,
                    NameKind::ElementId,
                    name.span.clone(),
                    self.name_span(first),
                ));
            }
            self.names.insert(name.node.as_str(), id);
            self.ids.insert(svg, id);
        }

        self.nodes.push(ElementNode {
            id,
            decl,
            span: element.span.clone(),
            parent,
            children: Vec::new(),
        });

        for child in &decl.children {
            let child_id = self.add_element(child, Some(id))?;
            self.nodes[id.index()].children.push(child_id);
        }

        Ok(id)
    }

    /// Where an element's name was written
    fn name_span(&self, id: ElementId) -> Span {
        let node = &self.nodes[id.index()];
        node.decl
            .name
            .as_ref()
            .map(|n| n.span.clone())
            .unwrap_or_else(|| node.span.clone())
    }

    /// All elements in document pre-order
    pub fn nodes(&self) -> &[ElementNode<'a>] {
        &self.nodes
    }

    pub fn node(&self, id: ElementId) -> Option<&ElementNode<'a>> {
        self.nodes.get(id.index())
    }

    pub fn top_level(&self) -> &[ElementId] {
        &self.top_level
    }

    pub fn canvas(&self) -> Option<&'a CanvasDecl> {
        self.canvas
    }

    pub fn lookup_element(&self, name: &str) -> Option<ElementId> {
        self.names.get(name).copied()
    }

    /// Element names close to `name`, for "did you mean" hints
    pub fn similar_elements(&self, name: &str) -> Vec<String> {
        find_similar(self.names.keys().copied(), name, 2)
    }

    pub fn variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).copied()
    }

    /// Resolve a variable reference made by `owner`
    pub fn lookup_variable(
        &self,
        id: &Spanned<Identifier>,
        owner: &str,
    ) -> Result<Value, LayoutError> {
        self.variable(id.node.as_str()).ok_or_else(|| {
            LayoutError::unknown(
                id.node.as_str(),
                owner,
                id.span.clone(),
                find_similar(self.variables.keys().copied(), id.node.as_str(), 2),
            )
        })
    }

    pub fn palette_color(&self, name: &str) -> Option<Color> {
        self.palette.get(name).copied()
    }

    /// Resolve a color expression to its canonical value.
    ///
    /// Names are looked up in the document palette first, then in the
    /// named color table.
    pub fn resolve_color(
        &self,
        expr: &ColorExpr,
        span: &Span,
        owner: &str,
    ) -> Result<Color, LayoutError> {
        match expr {
            ColorExpr::Hex(hex) => Color::parse_hex(hex).ok_or_else(|| {
                LayoutError::invalid_value(
                    owner,
                    format!("'{}' is not a valid hex color", hex),
                    span.clone(),
                )
            }),
            ColorExpr::Rgb(r, g, b) => Ok(Color::rgb(*r, *g, *b)),
            ColorExpr::Named(name) => {
                if let Some(color) = self.palette_color(name) {
                    return Ok(color);
                }
                self.colors.lookup(name).ok_or_else(|| {
                    let candidates = self
                        .palette
                        .keys()
                        .copied()
                        .chain(self.colors.names());
                    LayoutError::unknown(
                        name.as_str(),
                        owner,
                        span.clone(),
                        find_similar(candidates, name, 2),
                    )
                })
            }
        }
    }
}

/// Evaluates variables on demand, each exactly once
pub(super) struct VariableEvaluator<'a, 'b> {
    decls: &'b HashMap<&'a str, &'a VariableDecl>,
    values: &'b mut HashMap<&'a str, Value>,
    /// Variables currently being evaluated, outermost first
    visiting: Vec<&'a str>,
}

impl<'a, 'b> VariableEvaluator<'a, 'b> {
    pub(super) fn new(
        decls: &'b HashMap<&'a str, &'a VariableDecl>,
        values: &'b mut HashMap<&'a str, Value>,
    ) -> Self {
        Self {
            decls,
            values,
            visiting: Vec::new(),
        }
    }

    pub(super) fn value_of(&mut self, id: &Spanned<Identifier>, owner: &str) -> Result<Value, LayoutError> {
        let name = id.node.as_str();
        if let Some(value) = self.values.get(name) {
            return Ok(*value);
        }

        let Some((&key, &decl)) = self.decls.get_key_value(name) else {
            return Err(LayoutError::unknown(
                name,
                owner,
                id.span.clone(),
                find_similar(self.decls.keys().copied(), name, 2),
            ));
        };

        if let Some(pos) = self.visiting.iter().position(|n| *n == key) {
            let mut cycle: Vec<String> = self.visiting[pos..].iter().map(|s| s.to_string()).collect();
            cycle.push(key.to_string());
            return Err(LayoutError::cyclic(cycle));
        }

        self.visiting.push(key);
        let var_owner = format!("variable '{}'", key);
        let value = evaluate(&decl.value.node, &decl.value.span, &var_owner, &mut |var| {
            self.value_of(var, &var_owner)
        });
        self.visiting.pop();

        let value = value?;
        self.values.insert(key, value);
        Ok(value)
    }
}
