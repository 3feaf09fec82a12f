//! Error types for layout resolution

use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::ast::Span;

/// The namespace a duplicated name lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Element,
    PaletteColor,
    Variable,
    Canvas,
    Template,
    /// Two element names that map to the same SVG id
    ElementId,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NameKind::Element => "element name",
            NameKind::PaletteColor => "palette color name",
            NameKind::Variable => "variable name",
            NameKind::Canvas => "canvas name",
            NameKind::Template => "template name",
            NameKind::ElementId => "element id",
        })
    }
}

/// Errors that can occur during layout resolution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// Two entities in the same namespace share a name
    #[error("duplicate {kind} '{name}'")]
    DuplicateName {
        name: String,
        kind: NameKind,
        span: Span,
        /// Where the name was first defined
        first: Span,
    },

    /// Reference to an element, variable or color that does not exist
    #[error("unknown reference '{name}' in {referenced_by}")]
    UnknownReference {
        name: String,
        referenced_by: String,
        span: Span,
        suggestions: Vec<String>,
    },

    /// Dependency cycle among elements or variables
    #[error("cyclic reference: {}", cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },

    /// Arithmetic or property mixing incompatible units
    #[error("unit mismatch: {reason}")]
    UnitMismatch { reason: String, span: Span },

    /// A relative value where no basis dimension is defined
    #[error("{quantity} of {element} cannot be relative: no basis to resolve it against")]
    DivisionBasis {
        element: String,
        quantity: String,
        span: Span,
    },

    /// A value that resolves to something unusable
    #[error("invalid value for {element}: {reason}")]
    InvalidValue {
        element: String,
        reason: String,
        span: Span,
    },
}

impl LayoutError {
    /// Create a duplicate name error
    pub fn duplicate(name: impl Into<String>, kind: NameKind, span: Span, first: Span) -> Self {
        Self::DuplicateName {
            name: name.into(),
            kind,
            span,
            first,
        }
    }

    /// Create an unknown reference error with suggestions
    pub fn unknown(
        name: impl Into<String>,
        referenced_by: impl Into<String>,
        span: Span,
        suggestions: Vec<String>,
    ) -> Self {
        Self::UnknownReference {
            name: name.into(),
            referenced_by: referenced_by.into(),
            span,
            suggestions,
        }
    }

    /// Create a cyclic reference error; the cycle repeats its first entry
    pub fn cyclic(cycle: Vec<String>) -> Self {
        Self::CyclicReference { cycle }
    }

    pub fn unit_mismatch(reason: impl Into<String>, span: Span) -> Self {
        Self::UnitMismatch {
            reason: reason.into(),
            span,
        }
    }

    pub fn no_basis(element: impl Into<String>, quantity: impl Into<String>, span: Span) -> Self {
        Self::DivisionBasis {
            element: element.into(),
            quantity: quantity.into(),
            span,
        }
    }

    pub fn invalid_value(element: impl Into<String>, reason: impl Into<String>, span: Span) -> Self {
        Self::InvalidValue {
            element: element.into(),
            reason: reason.into(),
            span,
        }
    }

    /// Get the source span if available
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::DuplicateName { span, .. }
            | Self::UnknownReference { span, .. }
            | Self::UnitMismatch { span, .. }
            | Self::DivisionBasis { span, .. }
            | Self::InvalidValue { span, .. } => Some(span),
            Self::CyclicReference { .. } => None,
        }
    }

    /// Get suggestions if available
    pub fn suggestions(&self) -> Option<&[String]> {
        match self {
            Self::UnknownReference { suggestions, .. } => Some(suggestions),
            _ => None,
        }
    }

    /// Format the error with source context using ariadne
    ///
    /// Errors without a span (cycles) are rendered as a plain message.
    pub fn format(&self, source: &str, filename: &str) -> String {
        let Some(span) = self.span() else {
            return format!("Error: {}\n", self);
        };

        let mut report = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span.clone()))
                    .with_message(self.to_string())
                    .with_color(Color::Red),
            );

        if let Self::DuplicateName { first, .. } = self {
            report = report.with_label(
                Label::new((filename, first.clone()))
                    .with_message("first defined here")
                    .with_color(Color::Blue),
            );
        }

        if let Some(suggestions) = self.suggestions().filter(|s| !s.is_empty()) {
            report = report.with_help(format!("did you mean: {}?", suggestions.join(", ")));
        }

        let mut buf = Vec::new();
        if report
            .finish()
            .write((filename, Source::from(source)), &mut buf)
            .is_err()
        {
            return format!("Error: {}\n", self);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_reference_display() {
        let err = LayoutError::unknown("Bx", "element 'B'", 0..3, vec!["A".to_string()]);
        assert_eq!(err.to_string(), "unknown reference 'Bx' in element 'B'");
        assert_eq!(err.suggestions(), Some(&["A".to_string()][..]));
        assert_eq!(err.span(), Some(&(0..3)));
    }

    #[test]
    fn test_cyclic_reference_display() {
        let err = LayoutError::cyclic(vec!["A".to_string(), "B".to_string(), "A".to_string()]);
        assert!(err.to_string().contains("A -> B -> A"));
        assert_eq!(err.span(), None);
    }

    #[test]
    fn test_duplicate_name_display() {
        let err = LayoutError::duplicate("A", NameKind::Element, 10..13, 0..3);
        assert_eq!(err.to_string(), "duplicate element name 'A'");
        let err = LayoutError::duplicate("a_b", NameKind::ElementId, 10..15, 0..5);
        assert_eq!(err.to_string(), "duplicate element id 'a_b'");
    }

    #[test]
    fn test_format_with_suggestions() {
        let source = "rect \"box\"\nrect\n  below \"bax\"\n";
        let err = LayoutError::unknown("bax", "rectangle #1", 24..29, vec!["box".to_string()]);
        let report = err.format(source, "scene.stag");
        assert!(report.contains("scene.stag"));
        assert!(report.contains("did you mean: box?"));
    }

    #[test]
    fn test_format_without_span() {
        let err = LayoutError::cyclic(vec!["A".to_string(), "A".to_string()]);
        assert_eq!(err.format("", "scene.stag"), "Error: cyclic reference: A -> A\n");
    }
}
