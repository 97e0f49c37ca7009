use std::fmt;

/// Canonical slice-acquisition orders
///
/// Each order is a permutation of the zero-based slice indices: the
/// sequential orders walk the slices in index order, the alternating orders
/// interleave even- and odd-indexed slices, and the decreasing variants
/// reverse the traversal of each half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceOrder {
    SequentialIncreasing,
    SequentialDecreasing,
    AlternatingIncreasingEvenFirst,
    AlternatingIncreasingOddFirst,
    AlternatingDecreasingEvenFirst,
    AlternatingDecreasingOddFirst,
}

impl SliceOrder {
    pub const ALL: [SliceOrder; 6] = [
        SliceOrder::SequentialIncreasing,
        SliceOrder::SequentialDecreasing,
        SliceOrder::AlternatingIncreasingEvenFirst,
        SliceOrder::AlternatingIncreasingOddFirst,
        SliceOrder::AlternatingDecreasingEvenFirst,
        SliceOrder::AlternatingDecreasingOddFirst,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SliceOrder::SequentialIncreasing => "sequential increasing",
            SliceOrder::SequentialDecreasing => "sequential decreasing",
            SliceOrder::AlternatingIncreasingEvenFirst => "alternating increasing even first",
            SliceOrder::AlternatingIncreasingOddFirst => "alternating increasing odd first",
            SliceOrder::AlternatingDecreasingEvenFirst => "alternating decreasing even first",
            SliceOrder::AlternatingDecreasingOddFirst => "alternating decreasing odd first",
        }
    }

    pub fn from_name(name: &str) -> Option<SliceOrder> {
        SliceOrder::ALL.into_iter().find(|o| o.name() == name)
    }

    /// The acquisition permutation over `n_slices` slices
    ///
    /// Entry `i` is the slice excited at position `i` of the acquisition.
    pub fn acquisition_order(&self, n_slices: usize) -> Vec<usize> {
        let evens = || (0..n_slices).step_by(2);
        let odds = || (1..n_slices).step_by(2);

        match self {
            SliceOrder::SequentialIncreasing => (0..n_slices).collect(),
            SliceOrder::SequentialDecreasing => (0..n_slices).rev().collect(),
            SliceOrder::AlternatingIncreasingEvenFirst => evens().chain(odds()).collect(),
            SliceOrder::AlternatingIncreasingOddFirst => odds().chain(evens()).collect(),
            SliceOrder::AlternatingDecreasingEvenFirst => {
                evens().rev().chain(odds().rev()).collect()
            }
            SliceOrder::AlternatingDecreasingOddFirst => {
                odds().rev().chain(evens().rev()).collect()
            }
        }
    }
}

impl fmt::Display for SliceOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Synthesizes per-slice acquisition times for a named order
///
/// `timings[s]` is the acquisition offset of physical slice `s`, i.e. its
/// position in the acquisition permutation times `slice_duration`. Units
/// follow `slice_duration`.
pub fn timings_for(order: SliceOrder, n_slices: usize, slice_duration: f64) -> Vec<f64> {
    let mut timings = vec![0.0; n_slices];
    for (position, slice) in order.acquisition_order(n_slices).into_iter().enumerate() {
        timings[slice] = position as f64 * slice_duration;
    }
    timings
}

/// Classifies a timing vector back into a named order
///
/// Each slice's time is ranked among the distinct values of the vector. The
/// slices must split into equal-size groups per distinct value (one integer
/// multiband factor dividing the count); the rank sequence of the first
/// `k` slices (`k` = number of distinct values) is then matched exactly
/// against each canonical order. On a match the name is returned, suffixed
/// with the multiband factor when it exceeds 1; anything else is "unknown".
pub fn classify(timings: &[f64]) -> String {
    const UNKNOWN: &str = "unknown";

    let n_slices = timings.len();
    if n_slices == 0 {
        return UNKNOWN.to_string();
    }

    let mut distinct: Vec<f64> = timings.to_vec();
    distinct.sort_by(|a, b| a.partial_cmp(b).expect("slice times must be finite"));
    distinct.dedup();

    let n_distinct = distinct.len();
    if n_slices % n_distinct != 0 {
        return UNKNOWN.to_string();
    }
    let multiband_factor = n_slices / n_distinct;

    let ranks: Vec<usize> = timings
        .iter()
        .map(|t| {
            distinct
                .binary_search_by(|probe| probe.partial_cmp(t).unwrap())
                .expect("every time is one of the distinct values")
        })
        .collect();

    let mut group_sizes = vec![0usize; n_distinct];
    for &rank in &ranks {
        group_sizes[rank] += 1;
    }
    if group_sizes.iter().any(|&size| size != multiband_factor) {
        return UNKNOWN.to_string();
    }

    for order in SliceOrder::ALL {
        // The rank of a slice is its position in the acquisition order
        let mut expected_ranks = vec![0usize; n_distinct];
        for (position, slice) in order
            .acquisition_order(n_distinct)
            .into_iter()
            .enumerate()
        {
            expected_ranks[slice] = position;
        }

        if ranks[..n_distinct] == expected_ranks[..] {
            return if multiband_factor > 1 {
                format!("{} {}", order.name(), multiband_factor)
            } else {
                order.name().to_string()
            };
        }
    }

    UNKNOWN.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SliceOrder::SequentialIncreasing)]
    #[case(SliceOrder::SequentialDecreasing)]
    #[case(SliceOrder::AlternatingIncreasingEvenFirst)]
    #[case(SliceOrder::AlternatingIncreasingOddFirst)]
    #[case(SliceOrder::AlternatingDecreasingEvenFirst)]
    #[case(SliceOrder::AlternatingDecreasingOddFirst)]
    fn test_classify_roundtrip(
        #[case] order: SliceOrder,
        #[values(4, 5, 7, 12, 33)] n_slices: usize,
    ) {
        // Orders are pairwise distinct from 4 slices up
        let timings = timings_for(order, n_slices, 50.0);
        assert_eq!(classify(&timings), order.name());
    }

    #[rstest]
    #[case(SliceOrder::SequentialIncreasing, 40)]
    #[case(SliceOrder::AlternatingDecreasingOddFirst, 35)]
    fn test_timings_stay_within_repetition_time(#[case] order: SliceOrder, #[case] n_slices: usize) {
        let repetition_time_ms = 2500.0;
        let slice_duration = repetition_time_ms / n_slices as f64;
        let timings = timings_for(order, n_slices, slice_duration);

        assert_eq!(timings.len(), n_slices);
        assert!(timings.iter().all(|&t| (0.0..repetition_time_ms).contains(&t)));
        let max = timings.iter().cloned().fold(f64::MIN, f64::max);
        assert!((max - (n_slices as f64 - 1.0) * slice_duration).abs() < 1e-9);
    }

    #[test]
    fn test_acquisition_orders_are_permutations() {
        for order in SliceOrder::ALL {
            let mut indices = order.acquisition_order(9);
            indices.sort_unstable();
            assert_eq!(indices, (0..9).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_alternating_orders_interleave() {
        let order = SliceOrder::AlternatingIncreasingEvenFirst;
        assert_eq!(order.acquisition_order(5), vec![0, 2, 4, 1, 3]);
        let order = SliceOrder::AlternatingDecreasingEvenFirst;
        assert_eq!(order.acquisition_order(5), vec![4, 2, 0, 3, 1]);
    }

    #[test]
    fn test_classify_multiband() {
        // Two slice groups acquired simultaneously: the timing pattern of
        // the first half repeats over the second
        let base = timings_for(SliceOrder::AlternatingIncreasingEvenFirst, 4, 100.0);
        let mut timings = base.clone();
        timings.extend_from_slice(&base);

        assert_eq!(
            classify(&timings),
            "alternating increasing even first 2"
        );
    }

    #[test]
    fn test_classify_unequal_groups_is_unknown() {
        assert_eq!(classify(&[0.0, 0.0, 100.0]), "unknown");
    }

    #[test]
    fn test_classify_unmatched_permutation_is_unknown() {
        // A center-out pattern matches none of the canonical orders
        assert_eq!(classify(&[200.0, 0.0, 100.0, 300.0, 400.0]), "unknown");
    }

    #[test]
    fn test_single_slice_is_sequential() {
        assert_eq!(classify(&[0.0]), "sequential increasing");
    }

    #[test]
    fn test_from_name_roundtrip() {
        for order in SliceOrder::ALL {
            assert_eq!(SliceOrder::from_name(order.name()), Some(order));
        }
        assert_eq!(SliceOrder::from_name("spiral"), None);
    }
}
