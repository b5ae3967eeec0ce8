use crate::*;

use alloc::vec::Vec;
use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 16
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        start + (self.next_u64() % (end_exclusive - start) as u64) as usize
    }

    fn gen_range_u32(&mut self, start: u32, end_exclusive: u32) -> u32 {
        self.gen_range_usize(start as usize, end_exclusive as usize) as u32
    }
}

fn expected_outer(model: &[(u32, u32)], index: usize) -> u64 {
    model[..index].iter().map(|&(_, len)| len as u64).sum()
}

fn assert_matches_model(index: &PositionIndex<u32>, model: &[(u32, u32)]) {
    index.assert_invariants();
    assert_eq!(index.len(), model.len());
    assert_eq!(
        index.total_length(),
        model.iter().map(|&(_, len)| len as u64).sum::<u64>()
    );
    let items: Vec<(u32, u32)> = index.iter().map(|(item, len)| (*item, len)).collect();
    assert_eq!(items, model);
}

fn scenario_a() -> PositionIndex<u32> {
    PositionIndex::from_entries(
        [10, 20, 30, 40, 50]
            .into_iter()
            .enumerate()
            .map(|(i, len)| (i as u32, len)),
    )
}

#[test]
fn scenario_lookup_by_index_and_distance() {
    let index = scenario_a();
    assert_eq!(index.len(), 5);
    assert_eq!(index.total_length(), 150);

    let at = index.get_by_index(2).unwrap();
    assert_eq!(*at.item, 2);
    assert_eq!(at.outer_distance, 30);
    assert_eq!(at.length, 30);
    assert_eq!(at.inner_distance, 0);

    let at = index.get_by_distance(35).unwrap();
    assert_eq!(*at.item, 2);
    assert_eq!(at.index, 2);
    assert_eq!(at.outer_distance, 30);
    assert_eq!(at.inner_distance, 5);
    assert_eq!(at.end(), 60);
}

#[test]
fn distance_intervals_are_half_open() {
    let index = scenario_a();
    assert_eq!(*index.get_by_distance(0).unwrap().item, 0);
    assert_eq!(*index.get_by_distance(9).unwrap().item, 0);
    assert_eq!(*index.get_by_distance(10).unwrap().item, 1);
    assert_eq!(*index.get_by_distance(29).unwrap().item, 1);
    assert_eq!(*index.get_by_distance(30).unwrap().item, 2);
    assert_eq!(*index.get_by_distance(149).unwrap().item, 4);
}

#[test]
fn out_of_range_queries_clamp_by_default() {
    let mut index = scenario_a();

    let last = index.get_by_index(99).unwrap();
    assert_eq!(last.index, 4);
    assert_eq!(last.outer_distance, 100);

    let last = index.get_by_distance(10_000).unwrap();
    assert_eq!(last.index, 4);
    assert_eq!(last.inner_distance, 49);

    assert_eq!(index.update_length(99, 5), Some(-45));
    assert_eq!(index.length(4), Some(5));
    assert_eq!(index.total_length(), 105);
}

#[test]
fn strict_queries_report_range_errors() {
    let mut index = scenario_a();
    assert_eq!(
        index.try_get_by_index(5).unwrap_err(),
        RangeError::Index { index: 5, len: 5 }
    );
    assert_eq!(
        index.try_get_by_distance(150).unwrap_err(),
        RangeError::Distance {
            distance: 150,
            total: 150
        }
    );
    assert_eq!(
        index.try_update_length(7, 1).unwrap_err(),
        RangeError::Index { index: 7, len: 5 }
    );
    assert_eq!(index.try_update_length(0, 15), Ok(5));
    assert_eq!(index.try_get_by_distance(149).unwrap().index, 4);

    let msg = std::format!("{}", RangeError::Index { index: 5, len: 5 });
    assert_eq!(msg, "index 5 out of range for 5 items");
}

#[test]
fn empty_index_answers_none() {
    let mut index = PositionIndex::<u32>::new();
    assert!(index.is_empty());
    assert_eq!(index.get_by_index(0), None);
    assert_eq!(index.get_by_distance(0), None);
    assert_eq!(index.update_length(0, 1), None);
    assert_eq!(index.delete(0), None);
    assert_eq!(index.offset_of(3), 0);
    assert!(index.try_get_by_distance(0).is_err());
}

#[test]
fn zero_length_items_never_contain_a_distance() {
    let index: PositionIndex<u32> = [(0, 10), (1, 0), (2, 0), (3, 10)].into_iter().collect();
    let at = index.get_by_distance(10).unwrap();
    assert_eq!(at.index, 3);
    assert_eq!(at.outer_distance, 10);
    assert_eq!(at.inner_distance, 0);

    // Unmeasured items still have an exact outer distance.
    assert_eq!(index.get_by_index(2).unwrap().outer_distance, 10);
}

#[test]
fn all_zero_lengths_resolve_to_first_item() {
    let index: PositionIndex<u32> = (0..4).map(|i| (i, 0)).collect();
    let at = index.get_by_distance(7).unwrap();
    assert_eq!(at.index, 0);
    assert_eq!(at.inner_distance, 0);
}

#[test]
fn offset_of_and_span() {
    let index = scenario_a();
    assert_eq!(index.offset_of(0), 0);
    assert_eq!(index.offset_of(3), 60);
    assert_eq!(index.offset_of(5), 150);
    assert_eq!(index.offset_of(50), 150);
    assert_eq!(index.span(1, 4), 90);
    assert_eq!(index.span(4, 1), 0);
}

#[test]
fn insert_positions_and_clamping() {
    let mut index = PositionIndex::new();
    index.push_back(1u32, 10);
    index.push_back(3, 30);
    index.insert(1, 2, 20);
    index.push_front(0, 5);
    index.insert(100, 4, 40);
    assert_matches_model(&index, &[(0, 5), (1, 10), (2, 20), (3, 30), (4, 40)]);
    assert_eq!(index.get_by_index(3).unwrap().outer_distance, 35);
}

#[test]
fn sequential_appends_stay_balanced() {
    let mut index = PositionIndex::new();
    for i in 0..1024u32 {
        index.push_back(i, 1);
        index.assert_invariants();
    }
    assert_eq!(index.get_by_distance(777).unwrap().index, 777);
    for i in 0..1024 {
        index.delete(0);
        if i % 64 == 0 {
            index.assert_invariants();
        }
    }
    assert!(index.is_empty());
    index.assert_invariants();
}

#[test]
fn freed_slots_are_reused() {
    let mut index: PositionIndex<u32> = (0..8).map(|i| (i, 1)).collect();
    assert_eq!(index.delete(3), Some((3, 1)));
    assert_eq!(index.delete(3), Some((4, 1)));
    index.insert(3, 40, 4);
    index.insert(3, 30, 3);
    assert_matches_model(
        &index,
        &[(0, 1), (1, 1), (2, 1), (30, 3), (40, 4), (5, 1), (6, 1), (7, 1)],
    );
}

#[test]
fn random_operations_match_vec_model() {
    for seed in 0..24u64 {
        let mut rng = Lcg::new(seed);
        let mut index = PositionIndex::new();
        let mut model: Vec<(u32, u32)> = Vec::new();
        let mut next_item = 0u32;

        for _ in 0..400 {
            match rng.gen_range_usize(0, 4) {
                0 | 1 => {
                    let at = rng.gen_range_usize(0, model.len() + 1);
                    let len = rng.gen_range_u32(0, 50);
                    index.insert(at, next_item, len);
                    model.insert(at, (next_item, len));
                    next_item += 1;
                }
                2 if !model.is_empty() => {
                    let at = rng.gen_range_usize(0, model.len());
                    assert_eq!(index.delete(at), Some(model.remove(at)));
                }
                _ if !model.is_empty() => {
                    let at = rng.gen_range_usize(0, model.len());
                    let len = rng.gen_range_u32(0, 50);
                    let delta = index.try_update_length(at, len).unwrap();
                    assert_eq!(delta, len as i64 - model[at].1 as i64);
                    model[at].1 = len;
                }
                _ => {}
            }

            if !model.is_empty() {
                let at = rng.gen_range_usize(0, model.len());
                let found = index.get_by_index(at).unwrap();
                assert_eq!(*found.item, model[at].0);
                assert_eq!(found.outer_distance, expected_outer(&model, at));
            }
        }
        assert_matches_model(&index, &model);
    }
}

proptest! {
    #[test]
    fn outer_distance_is_prefix_sum(lengths in proptest::collection::vec(0u32..100, 1..200)) {
        let index: PositionIndex<usize> = lengths.iter().copied().enumerate().collect();
        let mut expected = 0u64;
        for (i, &len) in lengths.iter().enumerate() {
            let found = index.get_by_index(i).unwrap();
            prop_assert_eq!(found.outer_distance, expected);
            prop_assert_eq!(found.length, len);
            expected += len as u64;
        }
        prop_assert_eq!(index.total_length(), expected);
    }

    #[test]
    fn distance_lookup_finds_containing_interval(
        lengths in proptest::collection::vec(0u32..40, 1..120),
        probe in 0u64..10_000,
    ) {
        let index: PositionIndex<usize> = lengths.iter().copied().enumerate().collect();
        let total = index.total_length();
        prop_assume!(total > 0);
        let d = probe % total;
        let found = index.get_by_distance(d).unwrap();
        prop_assert!(found.outer_distance <= d);
        prop_assert!(d < found.end());
        prop_assert_eq!(found.inner_distance, d - found.outer_distance);
        prop_assert_eq!(found.outer_distance, index.offset_of(found.index));
    }

    #[test]
    fn insert_then_delete_everything_empties(
        lengths in proptest::collection::vec(0u32..100, 0..150),
        order_seed in any::<u64>(),
    ) {
        let mut rng = Lcg::new(order_seed);
        let mut index = PositionIndex::new();
        for (i, &len) in lengths.iter().enumerate() {
            let at = rng.gen_range_usize(0, index.len() + 1);
            index.insert(at, i, len);
        }
        index.assert_invariants();
        prop_assert_eq!(index.len(), lengths.len());
        prop_assert_eq!(index.total_length(), lengths.iter().map(|&l| l as u64).sum::<u64>());

        while !index.is_empty() {
            let at = rng.gen_range_usize(0, index.len());
            prop_assert!(index.delete(at).is_some());
            index.assert_invariants();
        }
        prop_assert_eq!(index.len(), 0);
        prop_assert_eq!(index.total_length(), 0);
    }
}
