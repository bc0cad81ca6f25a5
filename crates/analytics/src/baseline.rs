//! Baseline conversion rates across the full record set.

use funnel_core::types::{BaselineRates, FunnelRecord, StepTotals};
use funnel_core::{FunnelError, FunnelResult};

/// Compute overall step-conversion rates by summing counts across all
/// records and dividing the sums. Summing first keeps the result identical
/// whether records arrive as one batch or several; averaging per-record
/// rates would not.
pub fn calculate_baseline(records: &[FunnelRecord]) -> FunnelResult<BaselineRates> {
    let mut totals = StepTotals::default();
    for record in records {
        totals.accumulate(record);
    }

    if records.is_empty() || totals.view_item == 0 {
        return Err(FunnelError::InsufficientData {
            records: records.len(),
            view_items: totals.view_item,
        });
    }

    Ok(BaselineRates {
        view_to_cart_rate: totals.view_to_cart_rate(),
        cart_to_purchase_rate: totals.cart_to_purchase_rate(),
        overall_conversion_rate: totals.overall_conversion_rate(),
        totals,
    })
}
