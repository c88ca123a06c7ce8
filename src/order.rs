//! Random traversal orders over an image collection.

use rand::Rng;

/// A uniformly random permutation of `0..len`.
pub fn random_order<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    shuffle_in_place(&mut order, rng);
    order
}

/// Fisher–Yates: walk `i` from the last index down to 1 and swap with a
/// partner drawn uniformly from `0..=i`.
pub fn shuffle_in_place<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// `true` when `order` holds each of `0..order.len()` exactly once.
pub fn is_permutation(order: &[usize]) -> bool {
    let mut seen = vec![false; order.len()];
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashMap;

    #[test]
    fn every_length_yields_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in 0..64 {
            let order = random_order(len, &mut rng);
            assert_eq!(order.len(), len);
            assert!(is_permutation(&order), "not a permutation: {order:?}");
        }
    }

    #[test]
    fn all_orders_of_three_are_roughly_equally_likely() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut counts: HashMap<Vec<usize>, usize> = HashMap::new();
        for _ in 0..6000 {
            *counts.entry(random_order(3, &mut rng)).or_default() += 1;
        }
        assert_eq!(counts.len(), 6);
        for (order, count) in counts {
            assert!(
                (800..=1200).contains(&count),
                "{order:?} drawn {count} times"
            );
        }
    }

    #[test]
    fn permutation_check_rejects_duplicates_and_gaps() {
        assert!(is_permutation(&[2, 0, 1]));
        assert!(!is_permutation(&[0, 0, 1]));
        assert!(!is_permutation(&[0, 3, 1]));
    }
}
