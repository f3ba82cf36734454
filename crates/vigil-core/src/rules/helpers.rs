//! Shared helper functions for rule and fixer implementations.

use crate::diagnostic::Diagnostic;
use crate::model::{Model, Node, NodeKind};
use crate::span::Span;

/// Whether `name` starts with `prefix` followed by an uppercase letter.
///
/// A name consisting of the prefix alone also counts (`T` for a type parameter).
pub fn has_prefix(name: &str, prefix: char) -> bool {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), None) => first == prefix,
        (Some(first), Some(second)) => first == prefix && second.is_uppercase(),
        _ => false,
    }
}

/// `Shape` with prefix `I` becomes `IShape`; a lowercase first letter is raised.
pub fn with_prefix(name: &str, prefix: char) -> String {
    let mut chars = name.chars();
    let mut result = String::with_capacity(name.len() + prefix.len_utf8());
    result.push(prefix);
    if let Some(first) = chars.next() {
        result.extend(first.to_uppercase());
    }
    result.push_str(chars.as_str());
    result
}

/// The node of one of `kinds` that a diagnostic was reported on.
pub fn target_node<'a>(
    model: &'a Model,
    diagnostic: &Diagnostic,
    kinds: &[NodeKind],
) -> Option<&'a Node> {
    model
        .walk()
        .find(|n| kinds.contains(&n.kind) && n.report_span() == diagnostic.span)
}

/// Fixers leave generated code alone, including members of generated types.
pub fn is_fixable(model: &Model, node: &Node) -> bool {
    !model.ancestors(node).any(|n| n.modifiers.is_generated)
}

/// Offset of the first character of the line containing `offset`.
pub fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Leading whitespace of the line containing `offset`.
pub fn indentation_at(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let line = &source[start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Span covering the whole model text.
pub fn whole(model: &Model) -> Span {
    model.root().span
}
