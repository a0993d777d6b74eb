//! Area lower bound used to prune the exhaustive search.

use crate::types::Demand;

pub fn remaining_area(demands: &[Demand]) -> u64 {
    demands.iter().map(Demand::remaining_area).sum()
}

/// Fewest extra length units any completion needs beyond `current_length`.
///
/// Pieces still to come may fill holes above `current_length`, so only the
/// total area can be charged: every completion is at least
/// `ceil((placed_area + remaining_area) / width)` long.
pub fn lower_bound_additional_length(
    current_length: u32,
    placed_area: u64,
    demands: &[Demand],
    width: u32,
) -> u64 {
    debug_assert!(width > 0, "roll width must be positive");
    placed_area
        .saturating_add(remaining_area(demands))
        .div_ceil(width as u64)
        .saturating_sub(current_length as u64)
}

/// False when no completion of the node can beat `best_length`.
pub fn is_promising(
    current_length: u32,
    placed_area: u64,
    demands: &[Demand],
    width: u32,
    best_length: u64,
) -> bool {
    let bound = lower_bound_additional_length(current_length, placed_area, demands, width);
    (current_length as u64).saturating_add(bound) < best_length
}
