//! Analysis engine: runs the enabled rules over a model in a single traversal.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::diagnostic::{Diagnostic, Severity};
use crate::model::{Language, Model, ModelError, ModelProvider, NodeKind};
use crate::rules::{Rule, RuleContext, RuleError, RuleRegistry, default_registry};
use crate::span::Span;

/// A rule that returned an error or panicked during a pass.
///
/// The rule's diagnostics for that pass are discarded; other rules are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("rule {rule_id} failed at {span}: {message}")]
pub struct RuleExecutionError {
    pub rule_id: String,
    pub span: Span,
    pub message: String,
    pub panicked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassResult {
    pub language: Language,
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<RuleExecutionError>,
}

impl PassResult {
    /// No diagnostics and no failed rules.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.failures.is_empty()
    }

    /// Every enabled rule ran to completion.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

pub struct AnalysisEngine {
    registry: RuleRegistry,
    /// Enabled rules as (registry index, effective severity).
    slots: Vec<(usize, Severity)>,
    /// Node kind to the slots interested in it.
    dispatch: HashMap<NodeKind, Vec<usize>>,
}

struct ActiveRule<'a> {
    rule: &'a dyn Rule,
    ctx: RuleContext<'a>,
    diagnostics: Vec<Diagnostic>,
    failure: Option<RuleExecutionError>,
}

impl ActiveRule<'_> {
    fn run<F>(&mut self, span: Span, f: F)
    where
        F: FnOnce(&dyn Rule, &RuleContext<'_>, &mut Vec<Diagnostic>) -> Result<(), RuleError>,
    {
        if self.failure.is_some() {
            return;
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            f(self.rule, &self.ctx, &mut self.diagnostics)
        }));
        let (message, panicked) = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => (err.to_string(), false),
            Err(payload) => (panic_message(payload.as_ref()), true),
        };

        let rule_id = self.rule.metadata().id;
        warn!(rule_id, %span, panicked, %message, "rule failed, discarding its diagnostics");
        self.diagnostics.clear();
        self.failure = Some(RuleExecutionError {
            rule_id: rule_id.to_string(),
            span,
            message,
            panicked,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "rule panicked".to_string()
    }
}

impl AnalysisEngine {
    pub fn new(registry: RuleRegistry) -> Self {
        let mut slots = Vec::new();
        let mut dispatch: HashMap<NodeKind, Vec<usize>> = HashMap::new();
        for (index, rule) in registry.rules().enumerate() {
            let metadata = rule.metadata();
            if !registry.is_rule_enabled(metadata.id) {
                continue;
            }
            let slot = slots.len();
            slots.push((index, registry.effective_severity(metadata)));
            for kind in rule.interested_in() {
                let entry = dispatch.entry(*kind).or_default();
                if !entry.contains(&slot) {
                    entry.push(slot);
                }
            }
        }
        debug!(rules = slots.len(), kinds = dispatch.len(), "built dispatch table");

        Self {
            registry,
            slots,
            dispatch,
        }
    }

    /// The built-in rules configured from `config`.
    pub fn with_config(config: &Config) -> Self {
        let mut registry = default_registry();
        for rule_ref in config.rules.unknown_rule_refs(&registry) {
            warn!(rule = rule_ref, "configuration names an unknown rule");
        }
        registry.configure(&config.rules);
        Self::new(registry)
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Runs every enabled rule over `model` in one pre-order traversal.
    ///
    /// Diagnostics are sorted by start offset then rule id, and a rule reporting the
    /// same span twice contributes one diagnostic.
    #[instrument(skip_all, fields(language = ?model.language(), nodes = model.len()))]
    pub fn run_pass(&self, model: &Model) -> PassResult {
        let rules: Vec<&dyn Rule> = self.registry.rules().collect();
        let mut active: Vec<ActiveRule<'_>> = self
            .slots
            .iter()
            .map(|&(index, severity)| ActiveRule {
                rule: rules[index],
                ctx: RuleContext::new(model, rules[index].metadata(), severity),
                diagnostics: Vec::new(),
                failure: None,
            })
            .collect();

        for node in model.walk() {
            let Some(indices) = self.dispatch.get(&node.kind) else {
                continue;
            };
            for &index in indices {
                active[index].run(node.span, |rule, ctx, out| rule.examine(node, ctx, out));
            }
        }

        let root_span = model.root().span;
        for slot in &mut active {
            slot.run(root_span, |rule, ctx, out| rule.complete(ctx, out));
        }

        let mut diagnostics = Vec::new();
        let mut failures = Vec::new();
        for slot in active {
            match slot.failure {
                Some(failure) => failures.push(failure),
                None => diagnostics.extend(slot.diagnostics),
            }
        }

        diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        diagnostics.dedup_by(|a, b| a.rule_id == b.rule_id && a.span == b.span);

        debug!(
            diagnostics = diagnostics.len(),
            failures = failures.len(),
            "pass complete"
        );

        PassResult {
            language: model.language(),
            diagnostics,
            failures,
        }
    }

    /// Builds the model for `source` and runs one pass over it.
    pub fn analyze(
        &self,
        provider: &dyn ModelProvider,
        source: &str,
    ) -> Result<PassResult, ModelError> {
        let model = provider.build(source)?;
        Ok(self.run_pass(&model))
    }

    /// Runs independent passes in parallel; results keep the order of `models`.
    pub fn run_many(&self, models: &[Model]) -> Vec<PassResult> {
        models.par_iter().map(|model| self.run_pass(model)).collect()
    }

    /// Builds and analyzes independent sources in parallel.
    pub fn analyze_many(
        &self,
        provider: &dyn ModelProvider,
        sources: &[&str],
    ) -> Vec<Result<PassResult, ModelError>> {
        sources
            .par_iter()
            .map(|source| self.analyze(provider, source))
            .collect()
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(default_registry())
    }
}
