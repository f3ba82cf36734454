//! Test helpers for rules and fixers
//!
//! Expected diagnostics are written inline in the source:
//!
//! - `[|text|]` marks a span the single enabled rule must report;
//! - `{|D001:text|}` marks a span rule `D001` must report.
//!
//! Markers may nest. They are stripped before the model is built.

use tracing::debug;

use crate::analysis::{AnalysisEngine, RuleExecutionError};
use crate::diagnostic::Diagnostic;
use crate::fix::{FixAllError, FixAllOptions, FixerRegistry, fix_all};
use crate::model::{ModelError, ModelProvider};
use crate::rules::{Rule, RuleRegistry};
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedSpan {
    /// `None` for `[|...|]` markers.
    pub rule_id: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    pub source: String,
    pub spans: Vec<MarkedSpan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expected {
    pub rule_id: String,
    pub span: Span,
    /// Checked only when present.
    pub message: Option<String>,
}

impl Expected {
    pub fn new(rule_id: &str, span: Span) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            span,
            message: None,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("invalid markup at offset {offset}: {message}")]
    Markup { offset: usize, message: String },
    #[error("model construction failed: {0}")]
    Model(#[from] ModelError),
    #[error("fixing failed: {0}")]
    Fix(#[from] FixAllError),
    #[error("{} rule(s) failed: {}", .0.len(), join(.0))]
    RuleFailed(Vec<RuleExecutionError>),
    #[error("`[|...|]` markers need exactly one enabled rule, found {0}")]
    AmbiguousRule(usize),
    #[error("diagnostics differ\nmissing:{}\nunexpected:{}", lines(.missing), lines(.unexpected))]
    Mismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    #[error("fixed text differs\n--- expected\n{expected}\n--- actual\n{actual}")]
    FixMismatch { expected: String, actual: String },
}

fn join(failures: &[RuleExecutionError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn lines(items: &[String]) -> String {
    if items.is_empty() {
        return " none".to_string();
    }
    items.iter().map(|item| format!("\n  {item}")).collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Marker {
    Bracket,
    Brace,
}

/// Strips markers from `markup` and returns the marked spans in order of their start.
pub fn parse_markup(markup: &str) -> Result<Markup, HarnessError> {
    let mut source = String::with_capacity(markup.len());
    let mut spans = Vec::new();
    let mut open: Vec<(Marker, Option<String>, usize, usize)> = Vec::new();
    let mut rest = markup;

    while !rest.is_empty() {
        let offset = markup.len() - rest.len();
        if let Some(after) = rest.strip_prefix("[|") {
            open.push((Marker::Bracket, None, source.len(), offset));
            rest = after;
        } else if let Some(after) = rest.strip_prefix("{|") {
            let Some(colon) = after.find(':') else {
                return Err(markup_error(offset, "`{|` without a rule id"));
            };
            let rule_id = &after[..colon];
            if rule_id.is_empty() || !rule_id.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(markup_error(offset, "`{|` without a rule id"));
            }
            open.push((Marker::Brace, Some(rule_id.to_string()), source.len(), offset));
            rest = &after[colon + 1..];
        } else if let Some(after) = rest
            .strip_prefix("|]")
            .map(|a| (Marker::Bracket, a))
            .or_else(|| rest.strip_prefix("|}").map(|a| (Marker::Brace, a)))
        {
            let (marker, after) = after;
            match open.pop() {
                Some((kind, rule_id, start, _)) if kind == marker => {
                    spans.push(MarkedSpan {
                        rule_id,
                        span: Span::from_range(start..source.len()),
                    });
                }
                _ => return Err(markup_error(offset, "closing marker without matching opener")),
            }
            rest = after;
        } else {
            let Some(c) = rest.chars().next() else {
                break;
            };
            source.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }

    if let Some((_, _, _, offset)) = open.pop() {
        return Err(markup_error(offset, "marker is never closed"));
    }

    spans.sort_by_key(|s| (s.span.start, s.span.end()));
    Ok(Markup { source, spans })
}

fn markup_error(offset: usize, message: &str) -> HarnessError {
    HarnessError::Markup {
        offset,
        message: message.to_string(),
    }
}

/// An engine running only `rule`, for `[|...|]` markup.
pub fn single_rule_engine(rule: Box<dyn Rule>) -> AnalysisEngine {
    let mut registry = RuleRegistry::new();
    // An empty registry cannot hold a duplicate id.
    let _ = registry.register(rule);
    AnalysisEngine::new(registry)
}

fn resolve(markup: &Markup, engine: &AnalysisEngine) -> Result<Vec<Expected>, HarnessError> {
    let mut default_id = None;
    let mut expected = Vec::with_capacity(markup.spans.len());
    for marked in &markup.spans {
        let rule_id = match &marked.rule_id {
            Some(id) => id.clone(),
            None => {
                if default_id.is_none() {
                    let active: Vec<_> = engine.registry().active_rules().collect();
                    if active.len() != 1 {
                        return Err(HarnessError::AmbiguousRule(active.len()));
                    }
                    default_id = Some(active[0].0.metadata().id.to_string());
                }
                default_id.clone().unwrap_or_default()
            }
        };
        expected.push(Expected::new(&rule_id, marked.span));
    }
    Ok(expected)
}

fn describe(source: &str, rule_id: &str, span: Span, message: Option<&str>) -> String {
    let text = source.get(span.range()).unwrap_or("<out of range>");
    match message {
        Some(message) => format!("{rule_id} at {span} '{text}': {message}"),
        None => format!("{rule_id} at {span} '{text}'"),
    }
}

fn compare(source: &str, expected: &[Expected], actual: &[Diagnostic]) -> Result<(), HarnessError> {
    let mut used = vec![false; actual.len()];
    let mut missing = Vec::new();

    for e in expected {
        let found = actual.iter().enumerate().position(|(i, d)| {
            !used[i]
                && d.rule_id == e.rule_id
                && d.span == e.span
                && e.message.as_ref().is_none_or(|m| *m == d.message)
        });
        match found {
            Some(i) => used[i] = true,
            None => missing.push(describe(source, &e.rule_id, e.span, e.message.as_deref())),
        }
    }

    let unexpected: Vec<String> = actual
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(d, _)| describe(source, &d.rule_id, d.span, Some(&d.message)))
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::Mismatch {
            missing,
            unexpected,
        })
    }
}

/// Analyzes `source` and checks the diagnostics against `expected` exactly.
pub fn verify_expected(
    provider: &dyn ModelProvider,
    engine: &AnalysisEngine,
    source: &str,
    expected: &[Expected],
) -> Result<(), HarnessError> {
    let result = engine.analyze(provider, source)?;
    if !result.failures.is_empty() {
        return Err(HarnessError::RuleFailed(result.failures));
    }
    debug!(
        expected = expected.len(),
        actual = result.diagnostics.len(),
        "verifying diagnostics"
    );
    compare(source, expected, &result.diagnostics)
}

/// Checks that the marked spans are exactly the diagnostics reported.
pub fn verify_diagnostics(
    provider: &dyn ModelProvider,
    engine: &AnalysisEngine,
    markup: &str,
) -> Result<(), HarnessError> {
    let parsed = parse_markup(markup)?;
    let expected = resolve(&parsed, engine)?;
    verify_expected(provider, engine, &parsed.source, &expected)
}

pub fn verify_no_diagnostics(
    provider: &dyn ModelProvider,
    engine: &AnalysisEngine,
    source: &str,
) -> Result<(), HarnessError> {
    verify_expected(provider, engine, source, &[])
}

/// Fixes `before` (which may carry markers to check first) and compares the
/// result with `after` character for character.
pub fn verify_fix(
    provider: &dyn ModelProvider,
    engine: &AnalysisEngine,
    fixers: &FixerRegistry,
    before: &str,
    after: &str,
) -> Result<(), HarnessError> {
    let parsed = parse_markup(before)?;
    if !parsed.spans.is_empty() {
        verify_diagnostics(provider, engine, before)?;
    }

    let outcome = fix_all(
        provider,
        engine,
        fixers,
        &parsed.source,
        FixAllOptions::default(),
    )?;
    if outcome.source != after {
        return Err(HarnessError::FixMismatch {
            expected: after.to_string(),
            actual: outcome.source,
        });
    }
    Ok(())
}

#[track_caller]
pub fn assert_diagnostics(provider: &dyn ModelProvider, engine: &AnalysisEngine, markup: &str) {
    if let Err(err) = verify_diagnostics(provider, engine, markup) {
        panic!("{err}");
    }
}

#[track_caller]
pub fn assert_no_diagnostics(provider: &dyn ModelProvider, engine: &AnalysisEngine, source: &str) {
    if let Err(err) = verify_no_diagnostics(provider, engine, source) {
        panic!("{err}");
    }
}

#[track_caller]
pub fn assert_fix(
    provider: &dyn ModelProvider,
    engine: &AnalysisEngine,
    fixers: &FixerRegistry,
    before: &str,
    after: &str,
) {
    if let Err(err) = verify_fix(provider, engine, fixers, before, after) {
        panic!("{err}");
    }
}
