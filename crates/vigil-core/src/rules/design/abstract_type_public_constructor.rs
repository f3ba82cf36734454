//! abstract-type-public-constructor rule (D003): Abstract types should not have public constructors
//!
//! Only derived types can call the constructor of an abstract type, so `protected`
//! states the real accessibility. The fix rewrites the keyword, or inserts one when
//! the constructor is public by default.

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::fix::{FixCandidate, Fixer, TextEdit};
use crate::model::{Accessibility, Language, Model, Node, NodeKind};
use crate::rules::helpers::{is_fixable, target_node};
use crate::rules::{Rule, RuleContext, RuleError, RuleMetadata};

declare_rule!(
    AbstractTypePublicConstructor,
    id = "D003",
    name = "abstract-type-public-constructor",
    description = "Constructors of abstract types should be protected",
    category = Design,
    severity = Warning,
    applies_to = [Constructor],
    message = "Abstract type '{0}' has a public constructor; make it protected",
    examples = "// Bad\nexport abstract class Shape {\n    constructor() {}\n}\n\n// Good\nexport abstract class Shape {\n    protected constructor() {}\n}"
);

impl Rule for AbstractTypePublicConstructor {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn examine(
        &self,
        node: &Node,
        ctx: &RuleContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), RuleError> {
        if node.accessibility != Some(Accessibility::Public) {
            return Ok(());
        }

        let model = ctx.model();
        let Some(owner) = model.containing_type(node) else {
            return Ok(());
        };
        if owner.kind != NodeKind::Class || !owner.modifiers.is_abstract {
            return Ok(());
        }

        if model.is_externally_visible(node) {
            let diagnostic = ctx.report(node.report_span(), &[owner.name()]);
            diagnostics.push(diagnostic.with_symbol(owner.name()));
        }
        Ok(())
    }
}

pub struct MakeConstructorProtected;

fn protected_keyword(language: Language) -> &'static str {
    match language {
        Language::VisualBasic => "Protected",
        Language::CSharp | Language::TypeScript => "protected",
    }
}

impl Fixer for MakeConstructorProtected {
    fn fixable_rule_ids(&self) -> &[&'static str] {
        &["D003"]
    }

    fn propose(&self, diagnostic: &Diagnostic, model: &Model) -> Option<FixCandidate> {
        let ctor = target_node(model, diagnostic, &[NodeKind::Constructor])?;
        if !is_fixable(model, ctor) {
            return None;
        }

        let keyword = protected_keyword(model.language());
        let edit = match ctor.accessibility_span {
            Some(span) => TextEdit::replace(span, keyword),
            None => TextEdit::insert(ctor.span.start, format!("{keyword} ")),
        };

        Some(FixCandidate::new(
            diagnostic.clone(),
            "Make constructor protected",
            vec![edit],
        ))
    }
}
