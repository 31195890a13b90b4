//! Storage pricing per location and tier.
//!
//! Prices are a coarse USD/GiB·month table using the most expensive
//! region of each location, sourced from the public storage price list.
//! Cost rounds the byte count down to whole GiB, so anything under
//! 1 GiB in a tier estimates to zero.

use crate::models::explore::{TierCosts, TierSizes};
use crate::models::metadata::StorageClass;

const BYTES_PER_GIB: i64 = 1024 * 1024 * 1024;

/// Coarse bucket location used to pick a price column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Us,
    Asia,
    Eu,
    Ca,
    Au,
    In,
}

/// Applied to every query until per-bucket location tracking exists.
pub const DEFAULT_LOCATION: Location = Location::Us;

/// USD per GiB-month for a tier at a location.
pub fn price_per_gib(location: Location, class: StorageClass) -> f64 {
    use Location::*;
    use StorageClass::*;
    match (location, class) {
        (Us, Standard) => 0.0230,
        (Us, Nearline) => 0.0160,
        (Us, Coldline) => 0.0070,
        (Us, Archive) => 0.0025,

        (Asia, Standard) => 0.0230,
        (Asia, Nearline) => 0.0160,
        (Asia, Coldline) => 0.0070,
        (Asia, Archive) => 0.0025,

        (Eu, Standard) => 0.0250,
        (Eu, Nearline) => 0.0100,
        (Eu, Coldline) => 0.0070,
        (Eu, Archive) => 0.0025,

        (Ca, Standard) => 0.0230,
        (Ca, Nearline) => 0.0130,
        (Ca, Coldline) => 0.0070,
        (Ca, Archive) => 0.0025,

        (Au, Standard) => 0.0230,
        (Au, Nearline) => 0.0160,
        (Au, Coldline) => 0.0060,
        (Au, Archive) => 0.0025,

        (In, Standard) => 0.0230,
        (In, Nearline) => 0.0160,
        (In, Coldline) => 0.0060,
        (In, Archive) => 0.0025,
    }
}

/// Monthly cost of `bytes` stored in one tier. Partial GiB round down.
pub fn object_cost(location: Location, class: StorageClass, bytes: i64) -> f64 {
    (bytes / BYTES_PER_GIB) as f64 * price_per_gib(location, class)
}

/// Total monthly cost of a directory across all four tiers.
pub fn directory_cost(location: Location, sizes: &TierSizes) -> f64 {
    let costs = tier_costs(location, sizes);
    costs.standard + costs.nearline + costs.coldline + costs.archive
}

/// Per-tier monthly costs for a directory summary.
pub fn tier_costs(location: Location, sizes: &TierSizes) -> TierCosts {
    TierCosts {
        standard: object_cost(location, StorageClass::Standard, sizes.standard),
        nearline: object_cost(location, StorageClass::Nearline, sizes.nearline),
        coldline: object_cost(location, StorageClass::Coldline, sizes.coldline),
        archive: object_cost(location, StorageClass::Archive, sizes.archive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_gib_rounds_down_to_zero() {
        assert_eq!(
            object_cost(Location::Us, StorageClass::Standard, BYTES_PER_GIB - 1),
            0.0
        );
        assert_eq!(object_cost(Location::Us, StorageClass::Standard, 0), 0.0);
    }

    #[test]
    fn whole_gib_price_per_tier() {
        let one_gib = BYTES_PER_GIB;
        assert!((object_cost(Location::Us, StorageClass::Standard, one_gib) - 0.0230).abs() < 1e-12);
        assert!((object_cost(Location::Eu, StorageClass::Nearline, one_gib) - 0.0100).abs() < 1e-12);
        assert!((object_cost(Location::Au, StorageClass::Coldline, 3 * one_gib) - 0.0180).abs() < 1e-12);
    }

    #[test]
    fn directory_cost_sums_tiers() {
        let sizes = TierSizes {
            standard: 2 * BYTES_PER_GIB,
            nearline: BYTES_PER_GIB,
            coldline: 0,
            archive: BYTES_PER_GIB - 1,
        };
        let want = 2.0 * 0.0230 + 0.0160;
        assert!((directory_cost(Location::Us, &sizes) - want).abs() < 1e-12);
    }
}
