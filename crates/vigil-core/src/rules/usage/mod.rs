//! Usage rules

pub mod attribute_usage_required;

pub use attribute_usage_required::{AddAttributeUsage, AttributeUsageRequired};
