// crates/strand-registry/src/ranking.rs
//
// Holder ordering: trust descending, then most recently verified first, then
// NodeId ascending so equal entries still have a single deterministic order.

use std::cmp::Ordering;

use strand_core::location::LocationEntry;

pub fn holder_order(a: &LocationEntry, b: &LocationEntry) -> Ordering {
    b.trust
        .total_cmp(&a.trust)
        .then_with(|| b.last_verified.cmp(&a.last_verified))
        .then_with(|| a.node.cmp(&b.node))
}

/// Sort holders in place into ranking order.
pub fn rank(holders: &mut [LocationEntry]) {
    holders.sort_by(holder_order);
}
