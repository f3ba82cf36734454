//! avoid-out-parameters rule (D001): Flags `out` parameters on visible methods

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::model::{Node, NodeKind, ParameterKind};
use crate::rules::{Rule, RuleContext, RuleError, RuleMetadata};

declare_rule!(
    AvoidOutParameters,
    id = "D001",
    name = "avoid-out-parameters",
    description = "Externally visible methods should return values instead of using out parameters",
    category = Design,
    severity = Warning,
    applies_to = [Parameter],
    message = "Parameter '{0}' of '{1}' is an out parameter; return a value instead",
    examples = "// Bad\npublic bool TryGet(out object value)\n\n// Good\npublic object? Get()"
);

impl Rule for AvoidOutParameters {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn examine(
        &self,
        node: &Node,
        ctx: &RuleContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), RuleError> {
        if node.parameter_kind != Some(ParameterKind::Out) {
            return Ok(());
        }

        let model = ctx.model();
        let Some(owner) = model.parent(node) else {
            return Err(RuleError::Model(format!(
                "parameter '{}' has no declaring member",
                node.name()
            )));
        };
        if !matches!(owner.kind, NodeKind::Method | NodeKind::Constructor) {
            return Ok(());
        }

        if model.is_externally_visible(node) {
            diagnostics.push(ctx.report_node(node, &[node.name(), owner.name()]));
        }
        Ok(())
    }
}
