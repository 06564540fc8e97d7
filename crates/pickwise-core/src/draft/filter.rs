// Candidate selection for the advisory prompt.

use std::collections::HashSet;

use crate::projections::{Catalog, PlayerRecord};

use super::slot::Slot;

/// Whether a record's own position is one of the needed slots.
///
/// No position maps to Bench, so an open bench never widens the set.
fn fits_needed(record: &PlayerRecord, needed: &[Slot]) -> bool {
    record.slot.is_some_and(|slot| needed.contains(&slot))
}

/// Select up to `limit` candidates from the catalog, in catalog order.
///
/// - records whose name matches any entry in `taken` are dropped
///   (`taken` holds name keys, see [`crate::projections::name_key`])
/// - only positions that fill a needed slot are kept
/// - when several providers list the same player, the first row wins
///
/// An empty `needed` list (full roster) yields no candidates.
pub fn filter_candidates<'a>(
    catalog: &'a Catalog,
    taken: &HashSet<String>,
    needed: &[Slot],
    limit: usize,
) -> Vec<&'a PlayerRecord> {
    if needed.is_empty() {
        return Vec::new();
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut candidates = Vec::new();
    for record in catalog.iter() {
        if candidates.len() >= limit {
            break;
        }
        if taken.contains(&record.key) || !fits_needed(record, needed) {
            continue;
        }
        if seen.insert(record.key.as_str()) {
            candidates.push(record);
        }
    }
    candidates
}
