//! Repeated analyze-and-fix passes over one source text.

use tracing::{debug, instrument};

use super::apply::edits_conflict;
use super::{FixCandidate, FixError, FixerRegistry, apply_fixes};
use crate::analysis::{AnalysisEngine, PassResult};
use crate::config::{DEFAULT_MAX_FIX_PASSES, FixConfig};
use crate::model::{ModelError, ModelProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixAllOptions {
    /// Upper bound on analyze/apply rounds.
    pub max_passes: usize,
}

impl Default for FixAllOptions {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_FIX_PASSES,
        }
    }
}

impl From<&FixConfig> for FixAllOptions {
    fn from(config: &FixConfig) -> Self {
        Self {
            max_passes: config.max_passes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FixAllOutcome {
    pub source: String,
    /// Number of fix candidates applied across all passes.
    pub applied: usize,
    pub passes: usize,
    /// Result of analyzing the final text.
    pub remaining: PassResult,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FixAllError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Fix(#[from] FixError),
}

/// Fixes everything the fixers can fix.
///
/// Each round rebuilds the model, analyzes it, and applies the largest
/// conflict-free prefix of the proposed fixes in diagnostic order. Fixes that
/// conflict with an accepted one wait for the next round, where they are
/// proposed again against the updated text.
#[instrument(skip_all, fields(max_passes = options.max_passes))]
pub fn fix_all(
    provider: &dyn ModelProvider,
    engine: &AnalysisEngine,
    fixers: &FixerRegistry,
    source: &str,
    options: FixAllOptions,
) -> Result<FixAllOutcome, FixAllError> {
    let mut text = source.to_string();
    let mut applied = 0;
    let mut passes = 0;

    loop {
        let model = provider.build(&text)?;
        let result = engine.run_pass(&model);

        if passes >= options.max_passes {
            debug!(passes, "fix pass limit reached");
            return Ok(FixAllOutcome {
                source: text,
                applied,
                passes,
                remaining: result,
            });
        }

        let candidates: Vec<FixCandidate> = result
            .diagnostics
            .iter()
            .filter_map(|diagnostic| fixers.propose(diagnostic, &model))
            .collect();
        let batch = select_batch(candidates);
        if batch.is_empty() {
            return Ok(FixAllOutcome {
                source: text,
                applied,
                passes,
                remaining: result,
            });
        }

        text = apply_fixes(&text, &batch)?;
        applied += batch.len();
        passes += 1;
        debug!(pass = passes, fixes = batch.len(), "applied fix batch");
    }
}

fn select_batch(candidates: Vec<FixCandidate>) -> Vec<FixCandidate> {
    let mut batch: Vec<FixCandidate> = Vec::new();
    for candidate in candidates {
        let conflicts = candidate.edits.iter().any(|edit| {
            batch
                .iter()
                .flat_map(|accepted| &accepted.edits)
                .any(|other| edits_conflict(edit.span, other.span))
        });
        if !conflicts {
            batch.push(candidate);
        }
    }
    batch
}
