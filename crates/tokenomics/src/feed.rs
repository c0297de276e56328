// tokenomics/src/feed.rs

use chain_core::{Asset, Price};

/// Median of a set of same-pair prices; `None` below one feed.
///
/// Feeds quoting a different pair than the first are discarded rather than
/// compared incomparably.
pub fn median_price(feeds: &[Price]) -> Option<Price> {
    let first = feeds.first()?;
    let mut same: Vec<&Price> = feeds.iter().filter(|p| p.same_pair(first)).collect();
    same.sort_by(|a, b| {
        a.partial_cmp(b)
            .expect("pairs filtered to a single orientation")
    });
    Some(*same[same.len() / 2])
}

/// The minimum debt price implied by the market-cap floor: debt valued at
/// the median may not exceed a tenth of the core market cap, i.e. the
/// median is clamped to `9 * debt_supply / core_supply`.
///
/// Returns `None` while either supply is empty (no meaningful floor).
pub fn market_cap_floor(debt_supply: Asset, core_supply: Asset) -> Option<Price> {
    if debt_supply.amount <= 0 || core_supply.amount <= 0 {
        return None;
    }
    let floor_base = debt_supply.amount.checked_mul(9)?;
    Price::new(Asset::agd(floor_base), core_supply).ok()
}

/// Clamp a median to the market-cap floor; returns the governing price and
/// whether the floor forced it
pub fn clamp_to_floor(median: Price, floor: Option<Price>) -> (Price, bool) {
    match floor {
        Some(floor) if floor > median => (floor, true),
        _ => (median, false),
    }
}
