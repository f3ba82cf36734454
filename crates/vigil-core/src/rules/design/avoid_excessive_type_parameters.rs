//! avoid-excessive-type-parameters rule (D002): Limits generic arity of visible declarations

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::model::Node;
use crate::rules::{Rule, RuleContext, RuleError, RuleMetadata};

const MAX_TYPE_PARAMETERS: usize = 2;

declare_rule!(
    AvoidExcessiveTypeParameters,
    id = "D002",
    name = "avoid-excessive-type-parameters",
    description = "Externally visible generic types and methods should have at most two type parameters",
    category = Design,
    severity = Warning,
    applies_to = [Class, Struct, Interface, Method],
    message = "'{0}' declares {1} type parameters; use at most 2",
    examples = "// Bad\nexport class Cache<TKey, TValue, TPolicy> {}\n\n// Good\nexport class Cache<TKey, TValue> {}"
);

impl Rule for AvoidExcessiveTypeParameters {
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
        let count = model.type_parameters(node).count();
        if count > MAX_TYPE_PARAMETERS && model.is_externally_visible(node) {
            let count = count.to_string();
            diagnostics.push(ctx.report_node(node, &[node.name(), &count]));
        }
        Ok(())
    }
}
