//! Dependency graph between elements
//!
//! Nodes are arena indices from the symbol table. An edge `a -> b` means `a`
//! cannot be resolved before `b`: either `a` is anchored to `b`
//! (`below "b"`, `inside "b"`, ...) or `b` is the group enclosing `a`.

use log::debug;

use super::error::LayoutError;
use super::symbols::SymbolTable;
use super::types::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Directed "depends on" graph keyed by element identity
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyGraph {
    /// Outgoing edges per node, in the order they were discovered
    edges: Vec<Vec<ElementId>>,
}

impl DependencyGraph {
    /// Build the graph, rejecting anchors that name no element
    pub fn build(table: &SymbolTable<'_>) -> Result<Self, LayoutError> {
        let mut edges = vec![Vec::new(); table.nodes().len()];

        for node in table.nodes() {
            let out = &mut edges[node.id.index()];
            if let Some(parent) = node.parent {
                out.push(parent);
            }

            let Some(target) = node.decl.position.as_ref().and_then(|p| p.node.target()) else {
                continue;
            };
            let target_id = table.lookup_element(&target.node).ok_or_else(|| {
                LayoutError::unknown(
                    target.node.as_str(),
                    node.label(),
                    target.span.clone(),
                    table.similar_elements(&target.node),
                )
            })?;
            if !out.contains(&target_id) {
                out.push(target_id);
            }
        }

        Ok(DependencyGraph { edges })
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Elements `id` depends on
    pub fn dependencies(&self, id: ElementId) -> &[ElementId] {
        self.edges.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Elements with no dependencies, resolvable immediately
    pub fn roots(&self) -> Vec<ElementId> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, out)| out.is_empty())
            .map(|(i, _)| ElementId(i))
            .collect()
    }

    /// Order nodes so every node comes after everything it depends on.
    ///
    /// Depth-first with white/gray/black marking, starting from nodes in
    /// arena order so the result is deterministic. Reaching a gray node
    /// means a cycle; the error lists it starting and ending at the same
    /// element.
    pub fn topological_order(&self, table: &SymbolTable<'_>) -> Result<Vec<ElementId>, LayoutError> {
        let mut marks = vec![Mark::White; self.edges.len()];
        let mut stack = Vec::new();
        let mut order = Vec::with_capacity(self.edges.len());

        for start in 0..self.edges.len() {
            self.visit(ElementId(start), &mut marks, &mut stack, &mut order, table)?;
        }

        debug!(
            "resolution order: [{}]",
            order
                .iter()
                .map(|id| label(table, *id))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(order)
    }

    fn visit(
        &self,
        id: ElementId,
        marks: &mut [Mark],
        stack: &mut Vec<ElementId>,
        order: &mut Vec<ElementId>,
        table: &SymbolTable<'_>,
    ) -> Result<(), LayoutError> {
        match marks[id.index()] {
            Mark::Black => return Ok(()),
            Mark::Gray => {
                let start = stack.iter().position(|n| *n == id).unwrap_or(0);
                let mut cycle: Vec<String> =
                    stack[start..].iter().map(|n| label(table, *n)).collect();
                cycle.push(label(table, id));
                return Err(LayoutError::cyclic(cycle));
            }
            Mark::White => {}
        }

        marks[id.index()] = Mark::Gray;
        stack.push(id);
        for dep in self.dependencies(id) {
            self.visit(*dep, marks, stack, order, table)?;
        }
        stack.pop();
        marks[id.index()] = Mark::Black;
        order.push(id);
        Ok(())
    }
}

fn label(table: &SymbolTable<'_>, id: ElementId) -> String {
    table
        .node(id)
        .map(|n| n.label())
        .unwrap_or_else(|| format!("#{}", id.index()))
}
