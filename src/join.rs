use std::{collections::HashMap, hash::Hash};

/// Builds a lookup from join key to every right-side row carrying that key.
pub fn index_by<'a, T, K, F>(rows: &'a [T], key: F) -> HashMap<K, Vec<&'a T>>
where
    K: Eq + Hash,
    F: Fn(&'a T) -> K,
{
    let mut map: HashMap<K, Vec<&'a T>> = HashMap::new();
    for row in rows {
        map.entry(key(row)).or_default().push(row);
    }
    map
}

/// Left outer join: every left row is kept; a row with `k` matches appears
/// `k` times, a row with none appears once paired with `None`.
pub fn left_join<'a, L, R, K, F>(
    left: &'a [L],
    lookup: &HashMap<K, Vec<&'a R>>,
    key: F,
) -> Vec<(&'a L, Option<&'a R>)>
where
    K: Eq + Hash,
    F: Fn(&'a L) -> K,
{
    let mut joined = Vec::with_capacity(left.len());
    for row in left {
        match lookup.get(&key(row)) {
            Some(bucket) if !bucket.is_empty() => {
                joined.extend(bucket.iter().map(|right| (row, Some(*right))));
            }
            _ => joined.push((row, None)),
        }
    }
    joined
}
