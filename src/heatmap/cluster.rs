//! Ward hierarchical clustering on Euclidean distances.
//!
//! Uses the nearest-neighbour-chain algorithm with Lance–Williams updates;
//! merges are then sorted by height and relabelled so node `n + i` is the
//! cluster created by merge `i`, with leaves numbered `0..n`.

#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub height: f64,
    pub size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Dendrogram {
    pub n_leaves: usize,
    pub merges: Vec<Merge>,
}

struct Condensed {
    n: usize,
    data: Vec<f64>,
}

impl Condensed {
    fn from_points(points: &[Vec<f64>]) -> Self {
        let n = points.len();
        let mut data = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                data.push(euclidean(&points[i], &points[j]));
            }
        }
        Self { n, data }
    }

    fn index(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.n * i - i * (i + 1) / 2 + (j - i - 1)
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.index(i, j)]
    }

    fn set(&mut self, i: usize, j: usize, v: f64) {
        let idx = self.index(i, j);
        self.data[idx] = v;
    }
}

/// Euclidean distance, scaled by the largest coordinate gap so squares of
/// values near `f64::MAX` do not overflow.
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    let scale = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f64, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (x - y) / scale;
            d * d
        })
        .sum();
    scale * sum.sqrt()
}

fn ward_update(d_ix: f64, d_iy: f64, d_xy: f64, s_i: f64, s_x: f64, s_y: f64) -> f64 {
    let scale = d_ix.max(d_iy).max(d_xy);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    let (a, b, c) = (d_ix / scale, d_iy / scale, d_xy / scale);
    let t = s_i + s_x + s_y;
    let v = ((s_i + s_x) * a * a + (s_i + s_y) * b * b - s_i * c * c) / t;
    scale * v.max(0.0).sqrt()
}

pub fn ward_linkage(points: &[Vec<f64>]) -> Dendrogram {
    let n = points.len();
    if n < 2 {
        return Dendrogram {
            n_leaves: n,
            merges: Vec::new(),
        };
    }

    let mut dist = Condensed::from_points(points);
    let mut size = vec![1usize; n];
    let mut active = vec![true; n];
    let mut raw: Vec<(usize, usize, f64)> = Vec::with_capacity(n - 1);
    let mut chain: Vec<usize> = Vec::with_capacity(n);

    'merge: for _ in 0..(n - 1) {
        if chain.is_empty() {
            if let Some(first) = active.iter().position(|&a| a) {
                chain.push(first);
            }
        }

        let (x, y) = loop {
            let x = chain[chain.len() - 1];
            let prev = if chain.len() >= 2 {
                Some(chain[chain.len() - 2])
            } else {
                None
            };
            // Ties prefer the previous chain element so the chain terminates.
            let mut nearest = prev.map(|p| (p, dist.get(x, p)));
            for i in 0..n {
                if !active[i] || i == x {
                    continue;
                }
                let d = dist.get(x, i);
                let closer = match nearest {
                    Some((_, best)) => d < best,
                    None => true,
                };
                if closer {
                    nearest = Some((i, d));
                }
            }
            let Some((y, _)) = nearest else {
                break 'merge;
            };
            if Some(y) == prev {
                chain.pop();
                chain.pop();
                break (x, y);
            }
            chain.push(y);
        };

        let (x, y) = if x < y { (x, y) } else { (y, x) };
        let d_xy = dist.get(x, y);
        raw.push((x, y, d_xy));

        // The merged cluster lives on in slot `y`.
        let (s_x, s_y) = (size[x] as f64, size[y] as f64);
        for i in 0..n {
            if !active[i] || i == x || i == y {
                continue;
            }
            let v = ward_update(dist.get(i, x), dist.get(i, y), d_xy, size[i] as f64, s_x, s_y);
            dist.set(i, y, v);
        }
        active[x] = false;
        size[y] += size[x];
    }

    // Ward is reducible, so sorting by height yields a valid dendrogram.
    raw.sort_by(|a, b| a.2.total_cmp(&b.2));
    let mut uf = UnionFind::new(n);
    let mut merges = Vec::with_capacity(n - 1);
    for (x, y, height) in raw {
        let a = uf.find(x);
        let b = uf.find(y);
        let (left, right) = if a < b { (a, b) } else { (b, a) };
        let node_size = uf.size[left] + uf.size[right];
        uf.union(left, right);
        merges.push(Merge {
            left,
            right,
            height,
            size: node_size,
        });
    }

    Dendrogram {
        n_leaves: n,
        merges,
    }
}

struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
    next: usize,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        let total = 2 * n - 1;
        let mut size = vec![0; total];
        for s in size.iter_mut().take(n) {
            *s = 1;
        }
        Self {
            parent: (0..total).collect(),
            size,
            next: n,
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let node = self.next;
        self.next += 1;
        self.parent[a] = node;
        self.parent[b] = node;
        self.size[node] = self.size[a] + self.size[b];
    }
}

impl Dendrogram {
    pub fn root(&self) -> Option<usize> {
        match self.n_leaves {
            0 => None,
            1 => Some(0),
            n => Some(n + self.merges.len() - 1),
        }
    }

    pub fn children(&self, node: usize) -> Option<(usize, usize)> {
        node.checked_sub(self.n_leaves)
            .and_then(|i| self.merges.get(i))
            .map(|m| (m.left, m.right))
    }

    pub fn height(&self, node: usize) -> f64 {
        node.checked_sub(self.n_leaves)
            .and_then(|i| self.merges.get(i))
            .map_or(0.0, |m| m.height)
    }

    /// Leaves in dendrogram order (left subtree first).
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.n_leaves);
        let Some(root) = self.root() else {
            return order;
        };
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match self.children(node) {
                Some((l, r)) => {
                    stack.push(r);
                    stack.push(l);
                }
                None => order.push(node),
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condensed_indexing() {
        let points = vec![vec![0.0], vec![1.0], vec![3.0], vec![6.0]];
        let d = Condensed::from_points(&points);
        assert_eq!(d.get(0, 3), 6.0);
        assert_eq!(d.get(3, 0), 6.0);
        assert_eq!(d.get(1, 2), 2.0);
    }

    #[test]
    fn ward_two_points() {
        let dendro = ward_linkage(&[vec![0.0, 0.0], vec![3.0, 4.0]]);
        assert_eq!(dendro.merges.len(), 1);
        assert!((dendro.merges[0].height - 5.0).abs() < 1e-12);
        assert_eq!(dendro.merges[0].size, 2);
    }
}
