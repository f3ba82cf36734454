//! type-parameter-name-prefix rule (N002): Type parameter names start with `T`

use crate::declare_rule;
use crate::diagnostic::Diagnostic;
use crate::fix::{FixCandidate, Fixer, TextEdit};
use crate::model::{Model, Node, NodeKind};
use crate::rules::helpers::{has_prefix, is_fixable, target_node, with_prefix};
use crate::rules::{Rule, RuleContext, RuleError, RuleMetadata};

declare_rule!(
    TypeParameterNamePrefix,
    id = "N002",
    name = "type-parameter-name-prefix",
    description = "Type parameter names should be 'T' or start with 'T'",
    category = Naming,
    severity = Warning,
    applies_to = [TypeParameter],
    message = "Type parameter name '{0}' should start with 'T'",
    examples = "// Bad\nexport class Box<Item> {}\n\n// Good\nexport class Box<TItem> {}"
);

impl Rule for TypeParameterNamePrefix {
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
        if !has_prefix(name, 'T') && ctx.model().is_externally_visible(node) {
            diagnostics.push(ctx.report_node(node, &[name]));
        }
        Ok(())
    }
}

pub struct AddTypeParameterPrefix;

impl Fixer for AddTypeParameterPrefix {
    fn fixable_rule_ids(&self) -> &[&'static str] {
        &["N002"]
    }

    fn propose(&self, diagnostic: &Diagnostic, model: &Model) -> Option<FixCandidate> {
        let parameter = target_node(model, diagnostic, &[NodeKind::TypeParameter])?;
        let owner = model.parent(parameter)?;
        if !is_fixable(model, owner) || owner.modifiers.is_partial {
            return None;
        }
        let name = parameter.name.as_deref()?;
        let name_span = parameter.name_span?;
        let renamed = with_prefix(name, 'T');
        if model.type_parameters(owner).any(|p| p.name() == renamed) {
            return None;
        }

        // References to the parameter can only occur inside its declaring node.
        let mut edits = vec![TextEdit::replace(name_span, renamed.clone())];
        edits.extend(
            model
                .references_to(name, owner.span)
                .filter(|r| !model.is_shadowed(r, name, Some(owner)))
                .map(|r| TextEdit::replace(r.report_span(), renamed.clone())),
        );

        Some(FixCandidate::new(
            diagnostic.clone(),
            format!("Rename to '{renamed}'"),
            edits,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::apply_fixes;
    use crate::model::{
        Accessibility, Decl, Language, ModelBuilder, ModelProvider, TypeScriptProvider,
    };
    use crate::span::Span;

    fn run_type_parameter_name_prefix(model: &Model) -> Vec<Diagnostic> {
        let rule = TypeParameterNamePrefix::new();
        let ctx = RuleContext::new(model, rule.metadata(), rule.metadata().severity);
        let mut diagnostics = Vec::new();
        for node in model.walk().filter(|n| n.kind == NodeKind::TypeParameter) {
            rule.examine(node, &ctx, &mut diagnostics).unwrap();
        }
        diagnostics
    }

    fn fix(code: &str) -> String {
        let model = TypeScriptProvider::new().build(code).unwrap();
        let candidates: Vec<_> = run_type_parameter_name_prefix(&model)
            .iter()
            .filter_map(|d| AddTypeParameterPrefix.propose(d, &model))
            .collect();
        apply_fixes(code, &candidates).unwrap()
    }

    #[test]
    fn detects_unprefixed_type_parameters() {
        let model = TypeScriptProvider::new()
            .build("export class Cache<Key, TValue, T> {}")
            .unwrap();

        let diagnostics = run_type_parameter_name_prefix(&model);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(model.text(diagnostics[0].span), Some("Key"));
    }

    #[test]
    fn ignores_internal_declaration() {
        let model = TypeScriptProvider::new().build("class Cache<Key> {}").unwrap();

        assert!(run_type_parameter_name_prefix(&model).is_empty());
    }

    #[test]
    fn fix_renames_uses_inside_declaration() {
        let fixed = fix(
            "export class Box<Item> {\n    value?: Item;\n    get(): Item { return this.value!; }\n}\nexport type Item2 = string;",
        );

        assert_eq!(
            fixed,
            "export class Box<TItem> {\n    value?: TItem;\n    get(): TItem { return this.value!; }\n}\nexport type Item2 = string;"
        );
    }

    #[test]
    fn fix_skips_nested_redeclaration() {
        let code = concat!(
            "export class Box<Item> {\n",
            "    value?: Item;\n",
            "    map<Item>(x: Item): Item { return x; }\n",
            "}",
        );
        let model = TypeScriptProvider::new().build(code).unwrap();
        let diagnostics = run_type_parameter_name_prefix(&model);
        assert_eq!(diagnostics.len(), 2);

        let outer = AddTypeParameterPrefix.propose(&diagnostics[0], &model).unwrap();
        assert_eq!(outer.edits.len(), 2);

        assert_eq!(
            apply_fixes(code, &[outer]).unwrap(),
            concat!(
                "export class Box<TItem> {\n",
                "    value?: TItem;\n",
                "    map<Item>(x: Item): Item { return x; }\n",
                "}",
            )
        );
    }

    fn csharp_generic_class(mark: fn(Decl) -> Decl) -> Model {
        let source = "public class Box<Item>\n{\n    public Item Value;\n}\n";
        let mut builder = ModelBuilder::new(Language::CSharp, source);
        let class = Decl::new(NodeKind::Class, Span::from_range(0..source.trim_end().len()))
            .named("Box", builder.find("Box").unwrap())
            .accessibility(Accessibility::Public, Some(builder.find("public").unwrap()));
        builder.open(mark(class));
        let item = builder.find("Item").unwrap();
        builder.leaf(Decl::new(NodeKind::TypeParameter, item).named("Item", item));
        builder.close();
        builder.finish().unwrap()
    }

    #[test]
    fn fix_declines_generated_or_partial_owner() {
        let plain = csharp_generic_class(|decl| decl);
        let diagnostics = run_type_parameter_name_prefix(&plain);
        assert!(AddTypeParameterPrefix.propose(&diagnostics[0], &plain).is_some());

        for mark in [Decl::generated as fn(Decl) -> Decl, Decl::partial] {
            let model = csharp_generic_class(mark);
            let diagnostics = run_type_parameter_name_prefix(&model);

            assert_eq!(diagnostics.len(), 1);
            assert!(AddTypeParameterPrefix.propose(&diagnostics[0], &model).is_none());
        }
    }

    #[test]
    fn fix_leaves_outer_references_alone() {
        let fixed =
            fix("export function wrap<Item>(x: Item): Item { return x; }\nlet other: Item;");

        assert_eq!(
            fixed,
            "export function wrap<TItem>(x: TItem): TItem { return x; }\nlet other: Item;"
        );
    }
}
