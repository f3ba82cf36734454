//! no-static-members-on-generic-types rule (D004): Flags static members of visible generic types
//!
//! Calling such a member requires spelling out the type arguments of the containing type.

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::model::Node;
use crate::rules::{Rule, RuleContext, RuleError, RuleMetadata};

declare_rule!(
    NoStaticMembersOnGenericTypes,
    id = "D004",
    name = "no-static-members-on-generic-types",
    description = "Generic types should not declare externally visible static members",
    category = Design,
    severity = Info,
    applies_to = [Method, Property, Field],
    message = "Static member '{0}' is declared on generic type '{1}'"
);

impl Rule for NoStaticMembersOnGenericTypes {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn examine(
        &self,
        node: &Node,
        ctx: &RuleContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), RuleError> {
        if !node.modifiers.is_static {
            return Ok(());
        }

        let model = ctx.model();
        let Some(owner) = model.containing_type(node) else {
            return Ok(());
        };
        // Only direct members; a member of a nested type belongs to that type.
        if node.parent != Some(owner.id) || model.type_parameters(owner).next().is_none() {
            return Ok(());
        }

        if model.is_externally_visible(node) {
            diagnostics.push(ctx.report_node(node, &[node.name(), owner.name()]));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelProvider, TypeScriptProvider};

    fn run_no_static_members_on_generic_types(code: &str) -> Vec<Diagnostic> {
        let model = TypeScriptProvider::new().build(code).unwrap();
        let rule = NoStaticMembersOnGenericTypes::new();
        let ctx = RuleContext::new(&model, rule.metadata(), rule.metadata().severity);
        let mut diagnostics = Vec::new();
        for node in model.walk() {
            if rule.interested_in().contains(&node.kind) {
                rule.examine(node, &ctx, &mut diagnostics).unwrap();
            }
        }
        diagnostics
    }

    #[test]
    fn detects_static_method_and_field() {
        let code = "export class Registry<T> {\n    static instance: number = 0;\n    static create(): void {}\n    lookup(): void {}\n}";

        let diagnostics = run_no_static_members_on_generic_types(code);

        let names: Vec<_> = diagnostics.iter().filter_map(|d| d.symbol.as_deref()).collect();
        assert_eq!(names, vec!["instance", "create"]);
        assert_eq!(
            diagnostics[1].message,
            "Static member 'create' is declared on generic type 'Registry'"
        );
    }

    #[test]
    fn ignores_non_generic_type() {
        let code = "export class Registry {\n    static create(): void {}\n}";

        assert!(run_no_static_members_on_generic_types(code).is_empty());
    }

    #[test]
    fn ignores_private_static() {
        let code = "export class Registry<T> {\n    private static create(): void {}\n}";

        assert!(run_no_static_members_on_generic_types(code).is_empty());
    }
}
