//! Unstructured magnitude pruning masks.

/// Mask marking the `round(sparsity * n)` smallest-magnitude elements as
/// pruned (`true`).
///
/// Elements pruned in `previous` stay pruned and count towards the total, so
/// masks only grow across a schedule. Ties break by position.
pub fn magnitude_mask(values: &[f32], sparsity: f32, previous: Option<&[bool]>) -> Vec<bool> {
    let n = values.len();
    let k = ((n as f32 * sparsity.clamp(0.0, 1.0)).round() as usize).min(n);
    let was_pruned = |i: usize| previous.and_then(|p| p.get(i)).copied().unwrap_or(false);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        was_pruned(b)
            .cmp(&was_pruned(a))
            .then(values[a].abs().total_cmp(&values[b].abs()))
            .then(a.cmp(&b))
    });

    let mut mask: Vec<bool> = (0..n).map(was_pruned).collect();
    for &i in order.iter().take(k) {
        mask[i] = true;
    }
    mask
}

/// Zero every masked element, returning how many are zero afterwards.
pub fn apply_mask(values: &mut [f32], mask: &[bool]) -> usize {
    for (v, &pruned) in values.iter_mut().zip(mask) {
        if pruned {
            *v = 0.0;
        }
    }
    values.iter().filter(|v| **v == 0.0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_prunes_smallest() {
        let values = [0.5, -0.1, 2.0, 0.05, -3.0];
        let mask = magnitude_mask(&values, 0.4, None);
        assert_eq!(mask, vec![false, true, false, true, false]);
    }

    #[test]
    fn test_zero_and_full_sparsity() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(magnitude_mask(&values, 0.0, None), vec![false; 3]);
        assert_eq!(magnitude_mask(&values, 1.0, None), vec![true; 3]);
    }

    #[test]
    fn test_previous_mask_is_kept() {
        let values = [5.0, 0.1, 0.2, 0.3];
        // Large value pruned earlier stays pruned and fills the budget.
        let mask = magnitude_mask(&values, 0.25, Some(&[true, false, false, false]));
        assert_eq!(mask, vec![true, false, false, false]);
        let mask = magnitude_mask(&values, 0.5, Some(&mask));
        assert_eq!(mask, vec![true, true, false, false]);
    }

    #[test]
    fn test_apply_mask_counts_zeros() {
        let mut values = [1.0, 0.0, 3.0, 4.0];
        let zeros = apply_mask(&mut values, &[true, false, false, true]);
        assert_eq!(values, [0.0, 0.0, 3.0, 0.0]);
        assert_eq!(zeros, 3);
    }

    proptest! {
        #[test]
        fn prop_mask_hits_exact_count(
            values in prop::collection::vec(-10.0f32..10.0, 1..200),
            sparsity in 0.0f32..=1.0,
        ) {
            let mask = magnitude_mask(&values, sparsity, None);
            let expected = ((values.len() as f32 * sparsity).round() as usize).min(values.len());
            prop_assert_eq!(mask.iter().filter(|m| **m).count(), expected);
        }

        #[test]
        fn prop_pruned_never_larger_than_kept(
            values in prop::collection::vec(-10.0f32..10.0, 2..100),
            sparsity in 0.1f32..0.9,
        ) {
            let mask = magnitude_mask(&values, sparsity, None);
            let max_pruned = values.iter().zip(&mask).filter(|(_, m)| **m).map(|(v, _)| v.abs()).fold(0.0f32, f32::max);
            let min_kept = values.iter().zip(&mask).filter(|(_, m)| !**m).map(|(v, _)| v.abs()).fold(f32::INFINITY, f32::min);
            prop_assert!(max_pruned <= min_kept);
        }
    }
}
