//! Argument normalization into lists.

/// Materialize `args` into a `Vec`, treating `None` as an empty list.
///
/// Items keep the iteration order of the source. For hash-based collections
/// that order is unspecified.
pub fn listify<I: IntoIterator>(args: Option<I>) -> Vec<I::Item> {
    match args {
        Some(items) => items.into_iter().collect(),
        None => Vec::new(),
    }
}

/// Wrap a single optional value in a list.
pub fn listify_one<T>(arg: Option<T>) -> Vec<T> {
    arg.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    #[test]
    fn test_listify_vec_is_unchanged() {
        assert_eq!(listify(Some(vec![1, 2, 3])), vec![1, 2, 3]);
    }

    #[test]
    fn test_listify_ordered_sources() {
        assert_eq!(listify(Some(BTreeSet::from([3, 1, 2]))), vec![1, 2, 3]);
        assert_eq!(listify(Some([1, 2, 3])), vec![1, 2, 3]);
        assert_eq!(listify(Some((0..3).map(|x| x + 1))), vec![1, 2, 3]);
        assert_eq!(listify(Some(1..4)), vec![1, 2, 3]);
    }

    #[test]
    fn test_listify_hash_set_keeps_items() {
        let mut items = listify(Some(HashSet::from([1, 2, 3])));
        items.sort();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_listify_none_and_empty() {
        assert!(listify::<Vec<i32>>(None).is_empty());
        assert!(listify(Some(Vec::<i32>::new())).is_empty());
    }

    #[test]
    fn test_listify_one() {
        assert_eq!(listify_one(Some(1)), vec![1]);
        assert!(listify_one::<i32>(None).is_empty());
    }
}
