//! Application of a batch of fix candidates to source text.

use tracing::debug;

use super::{FixCandidate, TextEdit};
use crate::diagnostic::Diagnostic;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixError {
    #[error(
        "fix for {} at {} conflicts with fix for {} at {} (edits {} and {})",
        .first.rule_id, .first.span, .second.rule_id, .second.span, .first_edit, .second_edit
    )]
    Conflict {
        first: Box<Diagnostic>,
        second: Box<Diagnostic>,
        first_edit: Span,
        second_edit: Span,
    },
    #[error(
        "fix for {} at {} edits {} outside the source text (length {})",
        .diagnostic.rule_id, .diagnostic.span, .span, .text_len
    )]
    InvalidEdit {
        diagnostic: Box<Diagnostic>,
        span: Span,
        text_len: usize,
    },
}

struct Entry<'a> {
    edit: &'a TextEdit,
    candidate: &'a FixCandidate,
}

/// Overlapping spans conflict, as do an insertion and any edit anchored at the same offset.
pub(super) fn edits_conflict(a: Span, b: Span) -> bool {
    a.overlaps(b) || (a.start == b.start && (a.is_empty() || b.is_empty()))
}

/// Applies every edit of every candidate in one step.
///
/// The batch is checked as a whole before any text is produced, so the result
/// does not depend on the order of `candidates`. Overlapping edits, and two edits
/// anchored at the same offset where one is an insertion, are rejected with
/// [`FixError::Conflict`]; nothing is applied in that case.
pub fn apply_fixes(source: &str, candidates: &[FixCandidate]) -> Result<String, FixError> {
    let mut entries = Vec::new();
    for candidate in candidates {
        for edit in &candidate.edits {
            if !edit.span.is_valid_for(source) {
                return Err(FixError::InvalidEdit {
                    diagnostic: Box::new(candidate.diagnostic.clone()),
                    span: edit.span,
                    text_len: source.len(),
                });
            }
            entries.push(Entry { edit, candidate });
        }
    }

    entries.sort_by(|a, b| {
        (a.edit.span.start, a.edit.span.end())
            .cmp(&(b.edit.span.start, b.edit.span.end()))
            .then_with(|| {
                let (left, right) = (&a.candidate.diagnostic, &b.candidate.diagnostic);
                left.sort_key().cmp(&right.sort_key())
            })
            .then_with(|| a.edit.replacement.cmp(&b.edit.replacement))
    });

    for pair in entries.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let (p, c) = (previous.edit.span, current.edit.span);
        if edits_conflict(p, c) {
            return Err(FixError::Conflict {
                first: Box::new(previous.candidate.diagnostic.clone()),
                second: Box::new(current.candidate.diagnostic.clone()),
                first_edit: p,
                second_edit: c,
            });
        }
    }

    debug!(
        candidates = candidates.len(),
        edits = entries.len(),
        "applying fixes"
    );

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for entry in &entries {
        output.push_str(&source[cursor..entry.edit.span.start]);
        output.push_str(&entry.edit.replacement);
        cursor = entry.edit.span.end();
    }
    output.push_str(&source[cursor..]);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;

    fn candidate(rule_id: &str, at: usize, edits: Vec<TextEdit>) -> FixCandidate {
        let diagnostic = Diagnostic::new(rule_id, Severity::Warning, "message", Span::new(at, 1));
        FixCandidate::new(diagnostic, "fix", edits)
    }

    #[test]
    fn applies_non_overlapping_edits() {
        let source = "interface Shape {} class Box<Item> {}";
        let fixes = vec![
            candidate("N001", 10, vec![TextEdit::insert(10, "I")]),
            candidate("N002", 29, vec![TextEdit::replace(Span::new(29, 4), "TItem")]),
        ];

        let fixed = apply_fixes(source, &fixes).unwrap();

        assert_eq!(fixed, "interface IShape {} class Box<TItem> {}");
    }

    #[test]
    fn result_is_independent_of_candidate_order() {
        let source = "abcdefghij";
        let a = candidate("A", 0, vec![TextEdit::replace(Span::new(0, 2), "XY")]);
        let b = candidate("B", 5, vec![TextEdit::delete(Span::new(5, 2))]);
        let c = candidate("C", 9, vec![TextEdit::insert(10, "!")]);

        let forward = apply_fixes(source, &[a.clone(), b.clone(), c.clone()]).unwrap();
        let backward = apply_fixes(source, &[c, b, a]).unwrap();

        assert_eq!(forward, "XYcdehij!");
        assert_eq!(forward, backward);
    }

    #[test]
    fn overlapping_edits_name_both_diagnostics() {
        let source = "public class Foo {}";
        let first = candidate("D001", 0, vec![TextEdit::replace(Span::new(0, 6), "internal")]);
        let second = candidate("D002", 3, vec![TextEdit::replace(Span::new(3, 5), "x")]);

        let err = apply_fixes(source, &[second, first]).unwrap_err();

        match err {
            FixError::Conflict { first, second, .. } => {
                assert_eq!(first.rule_id, "D001");
                assert_eq!(second.rule_id, "D002");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn insertions_at_same_offset_conflict() {
        let fixes = vec![
            candidate("A", 0, vec![TextEdit::insert(3, "x")]),
            candidate("B", 0, vec![TextEdit::insert(3, "y")]),
        ];

        let err = apply_fixes("abcdef", &fixes).unwrap_err();

        assert!(matches!(err, FixError::Conflict { .. }));
        assert!(err.to_string().contains("conflicts with"));
    }

    #[test]
    fn insertion_inside_replacement_conflicts() {
        let source = "0123456789abc";
        let fixes = vec![
            candidate("A", 5, vec![TextEdit::insert(5, "x")]),
            candidate("B", 0, vec![TextEdit::replace(Span::new(0, 10), "Z")]),
        ];

        let err = apply_fixes(source, &fixes).unwrap_err();

        match err {
            FixError::Conflict {
                first,
                second,
                first_edit,
                second_edit,
            } => {
                assert_eq!(first.rule_id, "B");
                assert_eq!(second.rule_id, "A");
                assert_eq!(first_edit, Span::new(0, 10));
                assert_eq!(second_edit, Span::empty(5));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn touching_edits_do_not_conflict() {
        let fixes = vec![
            candidate("A", 0, vec![TextEdit::replace(Span::new(0, 3), "X")]),
            candidate("B", 3, vec![TextEdit::replace(Span::new(3, 3), "Y")]),
        ];

        assert_eq!(apply_fixes("abcdef", &fixes).unwrap(), "XY");
    }

    #[test]
    fn edit_past_end_is_invalid() {
        let fixes = vec![candidate("A", 0, vec![TextEdit::replace(Span::new(4, 10), "x")])];

        let err = apply_fixes("short", &fixes).unwrap_err();

        assert_eq!(
            err.to_string(),
            "fix for A at 0..1 edits 4..14 outside the source text (length 5)"
        );
    }

    #[test]
    fn empty_batch_returns_source() {
        assert_eq!(apply_fixes("unchanged", &[]).unwrap(), "unchanged");
    }
}
