//! no-underscores-in-identifiers rule (N003): Visible identifiers use casing, not underscores
//!
//! Leading and trailing underscores are left to other conventions; only an
//! underscore between two word characters is reported.

use std::sync::LazyLock;

use regex::Regex;

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::model::Node;
use crate::rules::{Rule, RuleContext, RuleError, RuleMetadata};

static INNER_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]_+[\p{L}\p{N}]").expect("Invalid regex pattern"));

declare_rule!(
    NoUnderscoresInIdentifiers,
    id = "N003",
    name = "no-underscores-in-identifiers",
    description = "Externally visible identifiers should not contain underscores",
    category = Naming,
    severity = Info,
    applies_to = [Namespace, Class, Struct, Interface, Enum, Method, Property, Field, Parameter],
    message = "Identifier '{0}' contains an underscore"
);

impl Rule for NoUnderscoresInIdentifiers {
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
        if INNER_UNDERSCORE.is_match(name) && ctx.model().is_externally_visible(node) {
            diagnostics.push(ctx.report_node(node, &[name]));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelProvider, TypeScriptProvider};

    fn run_no_underscores_in_identifiers(code: &str) -> Vec<Diagnostic> {
        let model = TypeScriptProvider::new().build(code).unwrap();
        let rule = NoUnderscoresInIdentifiers::new();
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
    fn detects_underscore_in_class_and_method() {
        let code = "export class Order_Line {\n    get_total(): number { return 0; }\n}";

        let diagnostics = run_no_underscores_in_identifiers(code);

        let names: Vec<_> = diagnostics.iter().filter_map(|d| d.symbol.as_deref()).collect();
        assert_eq!(names, vec!["Order_Line", "get_total"]);
    }

    #[test]
    fn detects_parameter() {
        let code = "export function total(line_count: number): void {}";

        let diagnostics = run_no_underscores_in_identifiers(code);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Identifier 'line_count' contains an underscore");
    }

    #[test]
    fn ignores_leading_underscore() {
        let code = "export class Order {\n    _cache: number = 0;\n    __internal(): void {}\n}";

        assert!(run_no_underscores_in_identifiers(code).is_empty());
    }

    #[test]
    fn ignores_non_visible_members() {
        let code = "export class Order {\n    private line_total: number = 0;\n}\nclass Hidden_Type {}";

        assert!(run_no_underscores_in_identifiers(code).is_empty());
    }
}
