//! Disjoint-set forest used by every alignment pass.
//!
//! The root of a set is always its smallest member, so cluster ids are
//! stable and independent of merge order.

#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    /// Creates `n` singleton sets.
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Find the root of `x` with path compression.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    pub fn same(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Merges the sets of `a` and `b`.
    ///
    /// Returns `(kept, absorbed)` roots when two distinct sets were merged;
    /// `kept` is the smaller root.
    pub fn union(&mut self, a: usize, b: usize) -> Option<(usize, usize)> {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return None;
        }
        let (kept, absorbed) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[absorbed] = kept;
        Some((kept, absorbed))
    }

    /// Root of every element, fully compressed.
    pub fn roots(&mut self) -> Vec<usize> {
        (0..self.parent.len()).map(|i| self.find(i)).collect()
    }

    /// Non-empty sets ordered by root, members ascending.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let roots = self.roots();
        let mut slots: Vec<Vec<usize>> = vec![Vec::new(); roots.len()];
        for (i, r) in roots.into_iter().enumerate() {
            slots[r].push(i);
        }
        slots.into_iter().filter(|g| !g.is_empty()).collect()
    }

    /// Runs `pass` until it stops merging anything.
    ///
    /// `pass` reports whether it performed at least one union.
    pub fn until_fixed_point(&mut self, mut pass: impl FnMut(&mut Self) -> bool) {
        while pass(self) {}
    }
}
