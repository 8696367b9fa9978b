//! Merging of restroom batches into the keyed collection

use bathroom_core::models::{Toilet, ToiletId};
use std::collections::{HashMap, HashSet};

/// Counts from one merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Ids not present before the merge
    pub added: usize,
    /// Existing ids superseded by the batch
    pub replaced: usize,
}

/// Union of `existing` and `incoming`, keyed by id
///
/// Records in `incoming` supersede existing ones with the same id; ids only in
/// `existing` are kept unchanged. Within `incoming` the last record for an id wins.
pub fn merge(mut existing: HashMap<ToiletId, Toilet>, incoming: Vec<Toilet>) -> HashMap<ToiletId, Toilet> {
    merge_into(&mut existing, incoming);
    existing
}

/// In-place form of [`merge`]
pub fn merge_into(existing: &mut HashMap<ToiletId, Toilet>, incoming: Vec<Toilet>) -> MergeStats {
    let incoming_ids: HashSet<&ToiletId> = incoming.iter().map(|t| &t.id).collect();
    let replaced = incoming_ids.iter().filter(|id| existing.contains_key(**id)).count();
    let added = incoming_ids.len() - replaced;

    for toilet in incoming {
        existing.insert(toilet.id.clone(), toilet);
    }

    MergeStats { added, replaced }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bathroom_core::models::{Coordinates, Timestamp, ToiletOrigin, ToiletStatus};
    use proptest::prelude::*;

    fn toilet(id: &str, status: ToiletStatus) -> Toilet {
        Toilet {
            id: ToiletId::new(id),
            coordinates: Coordinates::new(1.0, 1.0).unwrap(),
            status,
            last_confirmed: Timestamp::Missing,
            is_accessible: false,
            report_count: 0,
            name: None,
            fee: None,
            origin: ToiletOrigin::Geodata,
        }
    }

    #[test]
    fn test_incoming_supersedes_existing() {
        let first = merge(HashMap::new(), vec![toilet("77", ToiletStatus::Open), toilet("1", ToiletStatus::Open)]);
        let second = merge(first, vec![toilet("77", ToiletStatus::Closed)]);

        assert_eq!(second.len(), 2);
        assert_eq!(second[&ToiletId::new("77")].status, ToiletStatus::Closed);
        assert_eq!(second[&ToiletId::new("1")].status, ToiletStatus::Open);
    }

    #[test]
    fn test_merge_stats() {
        let mut collection = merge(HashMap::new(), vec![toilet("a", ToiletStatus::Unknown)]);
        let stats = merge_into(
            &mut collection,
            vec![toilet("a", ToiletStatus::Unknown), toilet("b", ToiletStatus::Unknown)],
        );

        assert_eq!(stats, MergeStats { added: 1, replaced: 1 });
    }

    #[test]
    fn test_duplicate_ids_in_batch_keep_last() {
        let merged = merge(
            HashMap::new(),
            vec![toilet("x", ToiletStatus::Open), toilet("x", ToiletStatus::Closed)],
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[&ToiletId::new("x")].status, ToiletStatus::Closed);
    }

    fn status() -> impl Strategy<Value = ToiletStatus> {
        prop_oneof![Just(ToiletStatus::Open), Just(ToiletStatus::Closed), Just(ToiletStatus::Unknown)]
    }

    /// Two batches whose id sets do not overlap
    fn disjoint_batches() -> impl Strategy<Value = (Vec<Toilet>, Vec<Toilet>)> {
        prop::collection::hash_map("[a-z0-9/]{1,8}", (status(), any::<bool>()), 0..24).prop_map(|entries| {
            let mut a = Vec::new();
            let mut b = Vec::new();
            for (id, (status, to_a)) in entries {
                if to_a {
                    a.push(toilet(&id, status));
                } else {
                    b.push(toilet(&id, status));
                }
            }
            (a, b)
        })
    }

    proptest! {
        #[test]
        fn prop_disjoint_merges_are_order_independent((a, b) in disjoint_batches()) {
            let stepwise = merge(merge(HashMap::new(), a.clone()), b.clone());
            let union: Vec<Toilet> = a.iter().chain(b.iter()).cloned().collect();
            let at_once = merge(HashMap::new(), union);
            let reversed = merge(merge(HashMap::new(), b), a);

            prop_assert_eq!(&stepwise, &at_once);
            prop_assert_eq!(&stepwise, &reversed);
        }
    }
}
