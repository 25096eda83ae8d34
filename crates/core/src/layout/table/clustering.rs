//! One-dimensional clustering of ruling coordinates.
//!
//! These functions reduce the positions of ruling lines to the distinct
//! grid boundaries of a table and map probe positions back onto them.

/// Cluster objects by a scalar key. Groups come out in key order and keep
/// the input order inside each group.
pub fn cluster_objects<T: Clone>(xs: &[T], key_fn: impl Fn(&T) -> f64, tolerance: f64) -> Vec<Vec<T>> {
    let mut keyed: Vec<(f64, usize)> = xs.iter().enumerate().map(|(i, x)| (key_fn(x), i)).collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    let mut groups: Vec<Vec<T>> = Vec::new();
    let mut last: Option<f64> = None;
    for (k, i) in keyed {
        match (last, groups.last_mut()) {
            (Some(l), Some(g)) if k <= l + tolerance => g.push(xs[i].clone()),
            _ => groups.push(vec![xs[i].clone()]),
        }
        last = Some(k);
    }
    groups
}

/// Sorts the boundaries and drops every value within `min_gap` of the last
/// kept one. The first value is always kept.
pub fn retain_centroids(mut xs: Vec<f64>, min_gap: f64) -> Vec<f64> {
    xs.sort_by(f64::total_cmp);
    let mut kept: Vec<f64> = Vec::with_capacity(xs.len());
    for x in xs {
        match kept.last() {
            Some(&prev) if x - prev <= min_gap => {}
            _ => kept.push(x),
        }
    }
    kept
}

/// Index of the value of `sorted` nearest to `v`; the lower index wins
/// ties. `sorted` must not be empty.
pub fn closest_index(sorted: &[f64], v: f64) -> usize {
    let i = sorted.partition_point(|&x| x < v);
    if i == 0 {
        return 0;
    }
    if i >= sorted.len() {
        return sorted.len() - 1;
    }
    if (v - sorted[i - 1]).abs() <= (sorted[i] - v).abs() {
        i - 1
    } else {
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_objects_keeps_input_order() {
        let items = [("b", 5.0), ("a", 0.0), ("c", 5.0)];
        let groups = cluster_objects(&items, |x| x.1, 0.0);
        let names: Vec<Vec<&str>> = groups.iter().map(|g| g.iter().map(|x| x.0).collect()).collect();
        assert_eq!(names, vec![vec!["a"], vec!["b", "c"]]);
    }

    #[test]
    fn test_retain_centroids_measures_from_last_kept() {
        assert_eq!(retain_centroids(vec![12.0, 0.0, 4.0, 8.0], 6.0), vec![0.0, 8.0]);
        assert_eq!(retain_centroids(vec![0.0, 6.0, 6.5], 6.0), vec![0.0, 6.5]);
    }

    #[test]
    fn test_closest_index() {
        let xs = [0.0, 10.0, 20.0];
        assert_eq!(closest_index(&xs, -3.0), 0);
        assert_eq!(closest_index(&xs, 4.0), 0);
        assert_eq!(closest_index(&xs, 5.0), 0);
        assert_eq!(closest_index(&xs, 6.0), 1);
        assert_eq!(closest_index(&xs, 99.0), 2);
    }
}
