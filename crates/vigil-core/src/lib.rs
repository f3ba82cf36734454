//! Rule-based static analysis with automated fixes.
//!
//! Front ends lower source text into a language-neutral [`Model`]; the
//! [`AnalysisEngine`] runs every enabled rule over it in one traversal, and
//! fixers turn diagnostics into text edits applied by [`fix::apply_fixes`].

pub mod analysis;
pub mod config;
pub mod diagnostic;
pub mod fix;
pub mod harness;
pub mod model;
pub mod report;
pub mod rules;
pub mod span;

pub use analysis::{AnalysisEngine, PassResult, RuleExecutionError};
pub use config::{Config, LoadedConfig};
pub use diagnostic::{Diagnostic, Severity};
pub use fix::{FixCandidate, FixError, Fixer, FixerRegistry, TextEdit};
pub use model::{Language, Model, ModelError, ModelProvider, NodeKind, TypeScriptProvider};
pub use rules::{Rule, RuleRegistry};
pub use span::Span;
