//! interface-name-prefix rule (N001): Interface names start with `I`
//!
//! The fix renames the declaration and every type reference to it in the same
//! compilation unit, skipping references bound to a type parameter of that name.

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::fix::{FixCandidate, Fixer, TextEdit};
use crate::model::{Model, Node, NodeKind};
use crate::rules::helpers::{has_prefix, is_fixable, target_node, whole, with_prefix};
use crate::rules::{Rule, RuleContext, RuleError, RuleMetadata};

declare_rule!(
    InterfaceNamePrefix,
    id = "N001",
    name = "interface-name-prefix",
    description = "Externally visible interface names should start with 'I'",
    category = Naming,
    severity = Warning,
    applies_to = [Interface],
    message = "Interface name '{0}' should start with 'I'",
    examples = "// Bad\nexport interface Shape {}\n\n// Good\nexport interface IShape {}"
);

impl Rule for InterfaceNamePrefix {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn examine(
        &self,
        node: &Node,
        ctx: &RuleContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), RuleError> {
        let Some(name) = node.name.as_deref() else {
            return Ok(());
        };
        if !has_prefix(name, 'I') && ctx.model().is_externally_visible(node) {
            diagnostics.push(ctx.report_node(node, &[name]));
        }
        Ok(())
    }
}

pub struct AddInterfacePrefix;

impl Fixer for AddInterfacePrefix {
    fn fixable_rule_ids(&self) -> &[&'static str] {
        &["N001"]
    }

    fn propose(&self, diagnostic: &Diagnostic, model: &Model) -> Option<FixCandidate> {
        let interface = target_node(model, diagnostic, &[NodeKind::Interface])?;
        if !is_fixable(model, interface) || interface.modifiers.is_partial {
            return None;
        }
        let name = interface.name.as_deref()?;
        let name_span = interface.name_span?;
        let renamed = with_prefix(name, 'I');
        if model.walk().any(|n| n.kind.is_type() && n.name() == renamed) {
            return None;
        }

        let mut edits = vec![TextEdit::replace(name_span, renamed.clone())];
        edits.extend(
            model
                .references_to(name, whole(model))
                .filter(|r| !model.is_shadowed(r, name, None))
                .map(|r| TextEdit::replace(r.report_span(), renamed.clone())),
        );

        Some(FixCandidate::new(
            diagnostic.clone(),
            format!("Rename to '{renamed}'"),
            edits,
        ))
    }
}
