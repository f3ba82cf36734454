//! JSON rendering of pass results for programmatic consumers.

use serde::Serialize;

use crate::analysis::{PassResult, RuleExecutionError};
use crate::diagnostic::Severity;
use crate::fix::FixerRegistry;
use crate::rules::{RuleCategory, RuleRegistry};

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub version: &'static str,
    pub summary: JsonSummary,
    pub diagnostics: Vec<JsonDiagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RuleExecutionError>,
}

#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub total_diagnostics: usize,
    pub failed_rules: usize,
    pub by_severity: SeverityCounts,
    pub by_category: CategoryCounts,
}

#[derive(Debug, Default, Serialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub hidden: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct CategoryCounts {
    pub design: usize,
    pub naming: usize,
    pub usage: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
    pub severity: Severity,
    pub message: String,
    pub location: JsonLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub fixable: bool,
}

#[derive(Debug, Serialize)]
pub struct JsonLocation {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

fn category_name(category: RuleCategory) -> &'static str {
    match category {
        RuleCategory::Design => "design",
        RuleCategory::Naming => "naming",
        RuleCategory::Usage => "usage",
    }
}

/// 1-based line and column (in characters) of a byte offset.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

impl JsonReport {
    pub fn new(
        result: &PassResult,
        source: &str,
        registry: &RuleRegistry,
        fixers: Option<&FixerRegistry>,
    ) -> Self {
        let mut by_severity = SeverityCounts::default();
        let mut by_category = CategoryCounts::default();
        let mut diagnostics = Vec::with_capacity(result.diagnostics.len());

        for d in &result.diagnostics {
            match d.severity {
                Severity::Error => by_severity.error += 1,
                Severity::Warning => by_severity.warning += 1,
                Severity::Info => by_severity.info += 1,
                Severity::Hidden => by_severity.hidden += 1,
            }

            let metadata = registry.get_rule(&d.rule_id).map(|r| r.metadata());
            if let Some(metadata) = metadata {
                match metadata.category {
                    RuleCategory::Design => by_category.design += 1,
                    RuleCategory::Naming => by_category.naming += 1,
                    RuleCategory::Usage => by_category.usage += 1,
                }
            }

            let (line, column) = line_column(source, d.span.start);
            diagnostics.push(JsonDiagnostic {
                rule_id: d.rule_id.clone(),
                rule_name: metadata.map(|m| m.name),
                category: metadata.map(|m| category_name(m.category)),
                severity: d.severity,
                message: d.message.clone(),
                location: JsonLocation {
                    start: d.span.start,
                    end: d.span.end(),
                    line,
                    column,
                },
                symbol: d.symbol.clone(),
                fixable: fixers.is_some_and(|f| f.can_fix(&d.rule_id)),
            });
        }

        Self {
            version: env!("CARGO_PKG_VERSION"),
            summary: JsonSummary {
                total_diagnostics: result.diagnostics.len(),
                failed_rules: result.failures.len(),
                by_severity,
                by_category,
            },
            diagnostics,
            failures: result.failures.clone(),
        }
    }
}

pub fn to_json(report: &JsonReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
