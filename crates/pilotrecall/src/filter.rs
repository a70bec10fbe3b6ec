//! Phase filtering.
//!
//! Narrows a collection of recall items to those relevant to the current
//! flight phase. In critical mode only tier-1 items survive. The filter is
//! synchronous, allocation-light and linear in the number of items so it can
//! run on every phase change.

use crate::model::RecallItem;
use crate::phase::FlightPhase;

/// Whether `item` should be shown for `phase`.
#[must_use]
pub fn is_visible(item: &RecallItem, phase: FlightPhase, critical_only: bool) -> bool {
    item.applies_to(phase) && (!critical_only || item.is_tier1)
}

/// Items applicable to `phase`, in their original relative order.
///
/// With `critical_only` set, items without the tier-1 flag are dropped as
/// well. An empty result is a normal outcome.
#[must_use]
pub fn filter_items(
    phase: FlightPhase,
    items: &[RecallItem],
    critical_only: bool,
) -> Vec<&RecallItem> {
    items
        .iter()
        .filter(|item| is_visible(item, phase, critical_only))
        .collect()
}
