//! Automated fixes
//!
//! A [`Fixer`] turns one diagnostic into a [`FixCandidate`]: an ordered list of
//! non-overlapping text edits. Candidates are combined and applied by
//! [`apply_fixes`]; [`fix_all`] repeats analysis and application until the text
//! settles.

mod apply;
mod session;

pub use apply::{FixError, apply_fixes};
pub use session::{FixAllError, FixAllOptions, FixAllOutcome, fix_all};

use std::collections::HashMap;

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::model::Model;
use crate::rules::{RegistryError, design, naming, usage};
use crate::span::Span;

/// Replace the text at `span` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TextEdit {
    pub span: Span,
    pub replacement: String,
}

impl TextEdit {
    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(Span::empty(at), text)
    }

    pub fn delete(span: Span) -> Self {
        Self::replace(span, String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixCandidate {
    pub diagnostic: Diagnostic,
    pub title: String,
    pub edits: Vec<TextEdit>,
}

impl FixCandidate {
    /// Edits are sorted by position; callers may pass them in any order.
    pub fn new(diagnostic: Diagnostic, title: impl Into<String>, mut edits: Vec<TextEdit>) -> Self {
        edits.sort_by_key(|e| (e.span.start, e.span.end()));
        debug_assert!(
            edits.windows(2).all(|w| !w[0].span.overlaps(w[1].span)),
            "edits of one fix must not overlap"
        );
        Self {
            diagnostic,
            title: title.into(),
            edits,
        }
    }
}

pub trait Fixer: Send + Sync {
    fn fixable_rule_ids(&self) -> &[&'static str];

    /// `None` when the diagnostic cannot be fixed safely.
    fn propose(&self, diagnostic: &Diagnostic, model: &Model) -> Option<FixCandidate>;
}

/// Fixers keyed by the rule id they handle.
pub struct FixerRegistry {
    fixers: Vec<Box<dyn Fixer>>,
    by_rule: HashMap<&'static str, usize>,
}

impl FixerRegistry {
    pub fn new() -> Self {
        Self {
            fixers: Vec::new(),
            by_rule: HashMap::new(),
        }
    }

    pub fn register(&mut self, fixer: Box<dyn Fixer>) -> Result<(), RegistryError> {
        if let Some(id) = fixer
            .fixable_rule_ids()
            .iter()
            .find(|id| self.by_rule.contains_key(*id))
        {
            return Err(RegistryError::DuplicateFixer(id.to_string()));
        }
        let index = self.fixers.len();
        for &id in fixer.fixable_rule_ids() {
            self.by_rule.insert(id, index);
        }
        self.fixers.push(fixer);
        Ok(())
    }

    pub fn can_fix(&self, rule_id: &str) -> bool {
        self.by_rule.contains_key(rule_id)
    }

    pub fn propose(&self, diagnostic: &Diagnostic, model: &Model) -> Option<FixCandidate> {
        let index = *self.by_rule.get(diagnostic.rule_id.as_str())?;
        self.fixers[index].propose(diagnostic, model)
    }

    pub fn len(&self) -> usize {
        self.fixers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixers.is_empty()
    }
}

impl Default for FixerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixers for the built-in rules.
pub fn default_fixers() -> FixerRegistry {
    let fixers: Vec<Box<dyn Fixer>> = vec![
        Box::new(design::MakeConstructorProtected),
        Box::new(naming::AddInterfacePrefix),
        Box::new(naming::AddTypeParameterPrefix),
        Box::new(usage::AddAttributeUsage),
    ];

    let mut registry = FixerRegistry::new();
    for fixer in fixers {
        let _ = registry.register(fixer);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;

    struct NoopFixer(&'static [&'static str]);

    impl Fixer for NoopFixer {
        fn fixable_rule_ids(&self) -> &[&'static str] {
            self.0
        }

        fn propose(&self, _diagnostic: &Diagnostic, _model: &Model) -> Option<FixCandidate> {
            None
        }
    }

    #[test]
    fn candidate_sorts_edits() {
        let diagnostic = Diagnostic::new("T001", Severity::Warning, "m", Span::new(0, 1));
        let candidate = FixCandidate::new(
            diagnostic,
            "fix",
            vec![TextEdit::insert(9, "b"), TextEdit::replace(Span::new(2, 3), "a")],
        );

        let starts: Vec<_> = candidate.edits.iter().map(|e| e.span.start).collect();
        assert_eq!(starts, vec![2, 9]);
    }

    #[test]
    fn second_fixer_for_same_rule_is_rejected() {
        let mut registry = FixerRegistry::new();
        registry.register(Box::new(NoopFixer(&["T001", "T002"]))).unwrap();

        let err = registry.register(Box::new(NoopFixer(&["T002"]))).unwrap_err();

        assert_eq!(err, RegistryError::DuplicateFixer("T002".to_string()));
        assert_eq!(registry.len(), 1);
        assert!(registry.can_fix("T001"));
        assert!(!registry.can_fix("T003"));
    }

    #[test]
    fn default_fixers_cover_fixable_rules() {
        let registry = default_fixers();

        assert_eq!(registry.len(), 4);
        for id in ["D003", "N001", "N002", "U001"] {
            assert!(registry.can_fix(id), "missing fixer for {id}");
        }
        assert!(!registry.can_fix("D001"));
    }
}
