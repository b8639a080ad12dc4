/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Tallies `keys` keeping first-encounter order, so a stable sort on the
/// counts breaks ties by whichever key showed up first.
pub fn ordered_tally<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: PartialEq,
    I: IntoIterator<Item = K>,
{
    let mut tally: Vec<(K, usize)> = Vec::new();
    for key in keys {
        match tally.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => tally.push((key, 1)),
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_values() {
        assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn test_ordered_tally_keeps_first_seen_order() {
        let tally = ordered_tally(["b", "a", "b", "c", "a", "b"]);
        assert_eq!(tally, vec![("b", 3), ("a", 2), ("c", 1)]);
    }
}
