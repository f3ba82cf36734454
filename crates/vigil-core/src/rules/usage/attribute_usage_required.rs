//! attribute-usage-required rule (U001): Attribute classes declare where they apply
//!
//! The fix adds `AttributeUsage(AttributeTargets.All)` in the syntax of the model's
//! language, on its own line above the declaration when the declaration starts a line.

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::fix::{FixCandidate, Fixer, TextEdit};
use crate::model::{Language, Model, Node, NodeKind};
use crate::rules::helpers::{indentation_at, is_fixable, line_start, target_node};
use crate::rules::{Rule, RuleContext, RuleError, RuleMetadata};

const ATTRIBUTE_USAGE: &str = "AttributeUsage";

declare_rule!(
    AttributeUsageRequired,
    id = "U001",
    name = "attribute-usage-required",
    description = "Externally visible attribute classes should be marked with AttributeUsage",
    category = Usage,
    severity = Warning,
    applies_to = [Class],
    message = "Attribute class '{0}' should specify AttributeUsage",
    examples = "// Bad\npublic sealed class MarkerAttribute : Attribute {}\n\n// Good\n[AttributeUsage(AttributeTargets.Class)]\npublic sealed class MarkerAttribute : Attribute {}"
);

fn is_attribute_class(node: &Node) -> bool {
    node.name().ends_with("Attribute")
        || node
            .base_types
            .iter()
            .any(|base| base.rsplit('.').next().is_some_and(|b| b.ends_with("Attribute")))
}

impl Rule for AttributeUsageRequired {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn examine(
        &self,
        node: &Node,
        ctx: &RuleContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), RuleError> {
        if node.modifiers.is_abstract || !is_attribute_class(node) {
            return Ok(());
        }

        let model = ctx.model();
        if !model.has_attribute(node, ATTRIBUTE_USAGE) && model.is_externally_visible(node) {
            diagnostics.push(ctx.report_node(node, &[node.name()]));
        }
        Ok(())
    }
}

pub struct AddAttributeUsage;

fn usage_attribute(language: Language) -> &'static str {
    match language {
        Language::CSharp => "[AttributeUsage(AttributeTargets.All)]",
        Language::VisualBasic => "<AttributeUsage(AttributeTargets.All)>",
        Language::TypeScript => "@AttributeUsage(AttributeTargets.All)",
    }
}

impl Fixer for AddAttributeUsage {
    fn fixable_rule_ids(&self) -> &[&'static str] {
        &["U001"]
    }

    fn propose(&self, diagnostic: &Diagnostic, model: &Model) -> Option<FixCandidate> {
        let class = target_node(model, diagnostic, &[NodeKind::Class])?;
        if !is_fixable(model, class) || class.modifiers.is_partial {
            return None;
        }

        let source = model.source();
        let anchor = class.span.start;
        let start = line_start(source, anchor);
        let attribute = usage_attribute(model.language());

        // Only modifier keywords may precede the declaration on its line.
        let prefix = source.get(start..anchor)?;
        let edit = if prefix.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
            let indent = indentation_at(source, anchor);
            TextEdit::insert(start, format!("{indent}{attribute}\n"))
        } else {
            TextEdit::insert(anchor, format!("{attribute} "))
        };

        Some(FixCandidate::new(
            diagnostic.clone(),
            "Add AttributeUsage",
            vec![edit],
        ))
    }
}
