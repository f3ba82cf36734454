//! avoid-empty-interfaces rule (D005): Flags visible interfaces without members

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::model::Node;
use crate::rules::{Rule, RuleContext, RuleError, RuleMetadata};

declare_rule!(
    AvoidEmptyInterfaces,
    id = "D005",
    name = "avoid-empty-interfaces",
    description = "Externally visible interfaces should declare members",
    category = Design,
    severity = Info,
    applies_to = [Interface],
    message = "Interface '{0}' declares no members; use an attribute or remove it",
    examples = "// Bad\nexport interface IMarker {}\n\n// Good\nexport interface IShape {\n    area(): number;\n}"
);

impl Rule for AvoidEmptyInterfaces {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn examine(
        &self,
        node: &Node,
        ctx: &RuleContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), RuleError> {
        let model = ctx.model();
        let has_members = model.children(node).any(|c| c.kind.is_member());
        // An interface combining several others is a useful empty declaration.
        if has_members || node.base_types.len() > 1 {
            return Ok(());
        }

        if model.is_externally_visible(node) {
            diagnostics.push(ctx.report_node(node, &[node.name()]));
        }
        Ok(())
    }
}
