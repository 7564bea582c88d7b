//! Execution result model.
//!
//! The payload returned by approve-action: which products were touched,
//! what changed, and the estimated impact. A result only counts as
//! validated when at least one change carries a non-empty after-value;
//! anything less must not advance the loop to `learn`.

use serde::{Deserialize, Serialize};

/// A single field-level content change applied to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Which product field was rewritten (title, description, ...).
    pub field: String,
    /// Value before the change.
    pub before: String,
    /// Value after the change.
    pub after: String,
    /// Why the change was made.
    #[serde(default)]
    pub reason: Option<String>,
}

/// All changes applied to one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOptimization {
    pub product_id: String,
    pub product_name: String,
    pub changes: Vec<FieldChange>,
    /// Merchant-facing explanation of the expected effect.
    #[serde(default)]
    pub impact_explanation: Option<String>,
}

/// Result payload of an approved action's execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Label of the executed action, e.g. "Rewrite thin product descriptions".
    pub action_label: String,
    #[serde(default)]
    pub products_optimized: Vec<ProductOptimization>,
    #[serde(default)]
    pub total_changes: u32,
    /// Estimated revenue impact, pre-formatted by the backend.
    #[serde(default)]
    pub estimated_impact: Option<String>,
    #[serde(default)]
    pub execution_time_ms: u64,
}

impl ExecutionResult {
    /// Whether this result carries validated content: at least one optimized
    /// product with at least one change whose after-value is non-empty.
    ///
    /// A completed execution without validated content is an unresolved
    /// state; the loop stays in `prove` rather than claiming success.
    pub fn has_validated_content(&self) -> bool {
        self.products_optimized
            .iter()
            .any(|p| p.changes.iter().any(|c| !c.after.trim().is_empty()))
    }
}
