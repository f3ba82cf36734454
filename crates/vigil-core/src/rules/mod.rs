//! Rules, their metadata, and the registry that selects which ones run.
//!
//! A rule declares the node kinds it cares about and examines each matching node
//! of a [`Model`]. Rules hold no state between invocations; the driver relies on
//! that to share one registry across threads.

pub mod design;
pub mod helpers;
pub mod naming;
pub mod usage;

use std::collections::{HashMap, HashSet};

use crate::config::RulesConfig;
use crate::diagnostic::{Diagnostic, Severity, format_message};
use crate::model::{Model, Node, NodeKind};
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    Design,
    Naming,
    Usage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: RuleCategory,
    pub severity: Severity,
    pub applies_to: &'static [NodeKind],
    /// Message template with `{0}`, `{1}`, ... placeholders.
    pub message: &'static str,
    pub docs_url: Option<&'static str>,
    pub examples: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("unexpected model shape: {0}")]
    Model(String),
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("rule id '{0}' is registered twice")]
    DuplicateRuleId(String),
    #[error("rule '{0}' already has a fixer")]
    DuplicateFixer(String),
}

/// What a rule sees while examining a node.
pub struct RuleContext<'a> {
    model: &'a Model,
    metadata: &'a RuleMetadata,
    severity: Severity,
}

impl<'a> RuleContext<'a> {
    pub fn new(model: &'a Model, metadata: &'a RuleMetadata, severity: Severity) -> Self {
        Self {
            model,
            metadata,
            severity,
        }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn metadata(&self) -> &'a RuleMetadata {
        self.metadata
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Builds a diagnostic for this rule from its message template.
    pub fn report(&self, span: Span, args: &[&str]) -> Diagnostic {
        let message = format_message(self.metadata.message, args);
        Diagnostic::new(self.metadata.id, self.severity, &message, span)
    }

    /// Reports at the node's name and records the node's name as the affected symbol.
    pub fn report_node(&self, node: &Node, args: &[&str]) -> Diagnostic {
        let diagnostic = self.report(node.report_span(), args);
        match &node.name {
            Some(name) => diagnostic.with_symbol(name.clone()),
            None => diagnostic,
        }
    }
}

pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;

    fn interested_in(&self) -> &[NodeKind] {
        self.metadata().applies_to
    }

    fn examine(
        &self,
        node: &Node,
        ctx: &RuleContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), RuleError>;

    /// Called once after the traversal for checks that need the whole unit.
    fn complete(
        &self,
        _ctx: &RuleContext<'_>,
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), RuleError> {
        Ok(())
    }
}

pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
    disabled_rules: HashSet<String>,
    severity_overrides: HashMap<String, Severity>,
    design_enabled: bool,
    naming_enabled: bool,
    usage_enabled: bool,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            disabled_rules: HashSet::new(),
            severity_overrides: HashMap::new(),
            design_enabled: true,
            naming_enabled: true,
            usage_enabled: true,
        }
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) -> Result<(), RegistryError> {
        let id = rule.metadata().id;
        if self.get_rule(id).is_some() {
            return Err(RegistryError::DuplicateRuleId(id.to_string()));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn configure(&mut self, config: &RulesConfig) {
        self.disabled_rules.clear();
        self.severity_overrides.clear();

        for rule_ref in &config.disabled {
            self.disabled_rules.insert(rule_ref.clone());
        }

        for (rule_ref, severity_value) in &config.severity {
            self.severity_overrides.insert(rule_ref.clone(), *severity_value);
        }

        self.design_enabled = config.design.unwrap_or(true);
        self.naming_enabled = config.naming.unwrap_or(true);
        self.usage_enabled = config.usage.unwrap_or(true);
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Enabled rules paired with the severity their diagnostics carry.
    pub fn active_rules(&self) -> impl Iterator<Item = (&dyn Rule, Severity)> {
        self.rules()
            .filter(|rule| self.should_run_rule(*rule))
            .map(|rule| (rule, self.effective_severity(rule.metadata())))
    }

    fn should_run_rule(&self, rule: &dyn Rule) -> bool {
        let metadata = rule.metadata();

        let category_enabled = match metadata.category {
            RuleCategory::Design => self.design_enabled,
            RuleCategory::Naming => self.naming_enabled,
            RuleCategory::Usage => self.usage_enabled,
        };

        category_enabled && !self.is_rule_disabled(metadata)
    }

    fn is_rule_disabled(&self, metadata: &RuleMetadata) -> bool {
        self.disabled_rules.contains(metadata.id) || self.disabled_rules.contains(metadata.name)
    }

    pub fn effective_severity(&self, metadata: &RuleMetadata) -> Severity {
        self.severity_overrides
            .get(metadata.id)
            .or_else(|| self.severity_overrides.get(metadata.name))
            .copied()
            .unwrap_or(metadata.severity)
    }

    pub fn is_rule_enabled(&self, id_or_name: &str) -> bool {
        if let Some(rule) = self
            .get_rule(id_or_name)
            .or_else(|| self.get_rule_by_name(id_or_name))
        {
            self.should_run_rule(rule)
        } else {
            false
        }
    }

    pub fn get_rule(&self, id: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().id == id)
            .map(|r| r.as_ref())
    }

    pub fn get_rule_by_name(&self, name: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().name == name)
            .map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The built-in rule set.
pub fn default_registry() -> RuleRegistry {
    let rules: Vec<Box<dyn Rule>> = vec![
        Box::new(design::AvoidOutParameters::new()),
        Box::new(design::AvoidExcessiveTypeParameters::new()),
        Box::new(design::AbstractTypePublicConstructor::new()),
        Box::new(design::NoStaticMembersOnGenericTypes::new()),
        Box::new(design::AvoidEmptyInterfaces::new()),
        Box::new(naming::InterfaceNamePrefix::new()),
        Box::new(naming::TypeParameterNamePrefix::new()),
        Box::new(naming::NoUnderscoresInIdentifiers::new()),
        Box::new(usage::AttributeUsageRequired::new()),
    ];

    let mut registry = RuleRegistry::new();
    for rule in rules {
        let _ = registry.register(rule);
    }
    registry
}

#[macro_export]
macro_rules! declare_rule {
    (
        $name:ident,
        id = $id:literal,
        name = $rule_name:literal,
        description = $desc:literal,
        category = $cat:ident,
        severity = $sev:ident,
        applies_to = [$($kind:ident),+ $(,)?],
        message = $message:literal
        $(, docs_url = $url:literal)?
        $(, examples = $examples:literal)?
    ) => {
        pub struct $name {
            metadata: $crate::rules::RuleMetadata,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    metadata: $crate::rules::RuleMetadata {
                        id: $id,
                        name: $rule_name,
                        description: $desc,
                        category: $crate::rules::RuleCategory::$cat,
                        severity: $crate::diagnostic::Severity::$sev,
                        applies_to: &[$($crate::model::NodeKind::$kind),+],
                        message: $message,
                        docs_url: $crate::declare_rule!(@docs_url $($url)?),
                        examples: $crate::declare_rule!(@examples $($examples)?),
                    },
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
    (@docs_url $url:literal) => { Some($url) };
    (@docs_url) => { None };
    (@examples $examples:literal) => { Some($examples) };
    (@examples) => { None };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Language, ModelBuilder};

    struct TestRule {
        metadata: RuleMetadata,
    }

    impl TestRule {
        fn new(id: &'static str) -> Self {
            Self {
                metadata: RuleMetadata {
                    id,
                    name: "test-rule",
                    description: "A test rule",
                    category: RuleCategory::Design,
                    severity: Severity::Warning,
                    applies_to: &[NodeKind::Class],
                    message: "Test message for '{0}'",
                    docs_url: None,
                    examples: None,
                },
            }
        }

        fn with_name(mut self, name: &'static str) -> Self {
            self.metadata.name = name;
            self
        }

        fn with_category(mut self, category: RuleCategory) -> Self {
            self.metadata.category = category;
            self
        }
    }

    impl Rule for TestRule {
        fn metadata(&self) -> &RuleMetadata {
            &self.metadata
        }

        fn examine(
            &self,
            _node: &Node,
            _ctx: &RuleContext<'_>,
            _diagnostics: &mut Vec<Diagnostic>,
        ) -> Result<(), RuleError> {
            Ok(())
        }
    }

    #[test]
    fn registry_keeps_registration_order() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(TestRule::new("T001"))).unwrap();
        registry.register(Box::new(TestRule::new("T002"))).unwrap();
        registry.register(Box::new(TestRule::new("T003"))).unwrap();

        let ids: Vec<_> = registry.rules().map(|r| r.metadata().id).collect();

        assert_eq!(ids, vec!["T001", "T002", "T003"]);
    }

    #[test]
    fn duplicate_rule_id_is_rejected() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(TestRule::new("T001"))).unwrap();

        let err = registry
            .register(Box::new(TestRule::new("T001")))
            .unwrap_err();

        assert_eq!(err, RegistryError::DuplicateRuleId("T001".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_get_rule_returns_none_for_unknown() {
        let registry = RuleRegistry::new();

        assert!(registry.get_rule("UNKNOWN").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn disabled_rule_by_id_or_name_is_inactive() {
        let mut registry = RuleRegistry::new();
        registry
            .register(Box::new(TestRule::new("T001").with_name("first")))
            .unwrap();
        registry
            .register(Box::new(TestRule::new("T002").with_name("second")))
            .unwrap();

        registry.configure(&RulesConfig {
            disabled: vec!["T001".to_string(), "second".to_string()],
            ..Default::default()
        });

        assert!(!registry.is_rule_enabled("T001"));
        assert!(!registry.is_rule_enabled("second"));
        assert_eq!(registry.active_rules().count(), 0);
    }

    #[test]
    fn category_toggle_disables_its_rules() {
        let mut registry = RuleRegistry::new();
        registry
            .register(Box::new(TestRule::new("D900").with_category(RuleCategory::Design)))
            .unwrap();
        registry
            .register(Box::new(TestRule::new("N900").with_category(RuleCategory::Naming)))
            .unwrap();

        registry.configure(&RulesConfig {
            naming: Some(false),
            ..Default::default()
        });

        let active: Vec<_> = registry.active_rules().map(|(r, _)| r.metadata().id).collect();
        assert_eq!(active, vec!["D900"]);
    }

    #[test]
    fn severity_override_by_name() {
        let mut registry = RuleRegistry::new();
        registry
            .register(Box::new(TestRule::new("T001").with_name("my-rule")))
            .unwrap();

        let mut severity = HashMap::new();
        severity.insert("my-rule".to_string(), Severity::Error);
        registry.configure(&RulesConfig {
            severity,
            ..Default::default()
        });

        let (_, effective) = registry.active_rules().next().unwrap();
        assert_eq!(effective, Severity::Error);
    }

    #[test]
    fn context_report_formats_template_and_symbol() {
        let source = "class Foo {}";
        let mut builder = ModelBuilder::new(Language::CSharp, source);
        let name = builder.find("Foo").unwrap();
        builder.leaf(
            crate::model::Decl::new(NodeKind::Class, Span::new(0, source.len())).named("Foo", name),
        );
        let model = builder.finish().unwrap();
        let rule = TestRule::new("T001");
        let ctx = RuleContext::new(&model, rule.metadata(), Severity::Info);
        let class = model.walk().find(|n| n.kind == NodeKind::Class).unwrap();

        let diagnostic = ctx.report_node(class, &["Foo"]);

        assert_eq!(diagnostic.message, "Test message for 'Foo'");
        assert_eq!(diagnostic.span, Span::new(6, 3));
        assert_eq!(diagnostic.severity, Severity::Info);
        assert_eq!(diagnostic.symbol.as_deref(), Some("Foo"));
    }

    #[test]
    fn default_registry_ids_are_unique() {
        let registry = default_registry();
        let ids: HashSet<_> = registry.rules().map(|r| r.metadata().id).collect();

        assert_eq!(ids.len(), registry.len());
        assert_eq!(registry.len(), 9);
    }

    declare_rule!(
        MacroTestRule,
        id = "M001",
        name = "macro-test",
        description = "Tests the declare_rule! macro",
        category = Usage,
        severity = Info,
        applies_to = [Class, Struct],
        message = "Macro message"
    );

    #[test]
    fn declare_rule_macro_creates_rule() {
        let rule = MacroTestRule::new();

        assert_eq!(rule.metadata.id, "M001");
        assert_eq!(rule.metadata.name, "macro-test");
        assert_eq!(rule.metadata.category, RuleCategory::Usage);
        assert_eq!(rule.metadata.severity, Severity::Info);
        assert_eq!(rule.metadata.applies_to, &[NodeKind::Class, NodeKind::Struct]);
        assert!(rule.metadata.docs_url.is_none());
        assert!(rule.metadata.examples.is_none());
    }
}
