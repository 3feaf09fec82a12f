//! Layout resolution for scene documents
//!
//! Takes a parsed AST and computes the absolute geometry and resolved styles
//! of every element. The pipeline is template and loop expansion, symbol
//! table, dependency graph, topological order, then the resolver.

pub mod config;
pub mod error;
pub mod expand;
pub mod graph;
pub mod lint;
pub mod resolver;
pub mod symbols;
pub mod types;
pub mod units;

pub use config::{LayoutConfig, RelativeAlignment};
pub use error::{LayoutError, NameKind};
pub use expand::expand;
pub use graph::DependencyGraph;
pub use resolver::Resolver;
pub use symbols::SymbolTable;
pub use types::*;

use log::debug;

use crate::colors::ColorTable;
use crate::parser::ast::Document;

/// Resolve every element of a document to absolute canvas coordinates.
///
/// Fails on the first duplicate name, unknown reference, dependency cycle,
/// unit mismatch, missing percentage basis or invalid value.
pub fn resolve(
    doc: &Document,
    config: &LayoutConfig,
    colors: &ColorTable,
) -> Result<LayoutResult, LayoutError> {
    let doc = expand(doc)?;
    let table = SymbolTable::build(&doc, colors)?;
    let graph = DependencyGraph::build(&table)?;
    let order = graph.topological_order(&table)?;

    let canvas = resolver::resolve_canvas(&table, config)?;
    debug!(
        "canvas {}x{}, {} elements",
        canvas.width,
        canvas.height,
        table.nodes().len()
    );

    let mut resolver = Resolver::new(&table, config, canvas);
    for id in &order {
        resolver.resolve_geometry(*id)?;
    }
    resolver.finish(order)
}

/// Compute Levenshtein edit distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut dp = vec![vec![0usize; n + 1]; m + 1];

    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }

    dp[m][n]
}

/// Find similar names within a maximum edit distance, closest first.
/// Ties are broken alphabetically so suggestions are stable.
pub(crate) fn find_similar<'s>(
    candidates: impl IntoIterator<Item = &'s str>,
    target: &str,
    max_distance: usize,
) -> Vec<String> {
    let mut matches: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter_map(|name| {
            let dist = levenshtein_distance(name, target);
            (dist <= max_distance && dist > 0).then_some((dist, name))
        })
        .collect();

    matches.sort();
    matches.dedup();
    matches
        .into_iter()
        .map(|(_, name)| name.to_string())
        .take(3)
        .collect()
}
