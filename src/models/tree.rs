//! CART decision tree (Gini impurity) used as a forest member

use rand::rngs::StdRng;
use rand::seq::index;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Number of candidate features examined per split
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        /// Fraction of fraud samples that reached this leaf
        fraud_fraction: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted binary classification tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    root: Node,
    depth: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(frauds: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = frauds as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    /// Grow a tree on the rows selected by `rows` (duplicates allowed).
    ///
    /// `rng` drives per-split feature subsampling only, so the same rows,
    /// params and rng state always produce the same tree.
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[bool],
        rows: &[usize],
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut depth = 0;
        let root = Self::grow(features, labels, rows.to_vec(), 0, params, rng, &mut depth);
        Self { root, depth }
    }

    fn grow(
        features: &[Vec<f64>],
        labels: &[bool],
        rows: Vec<usize>,
        level: usize,
        params: TreeParams,
        rng: &mut StdRng,
        depth: &mut usize,
    ) -> Node {
        *depth = (*depth).max(level);

        let total = rows.len();
        let frauds = rows.iter().filter(|&&r| labels[r]).count();
        let leaf = Node::Leaf {
            fraud_fraction: if total == 0 {
                0.0
            } else {
                frauds as f64 / total as f64
            },
        };

        if frauds == 0 || frauds == total || level >= params.max_depth || total < params.min_samples_split {
            return leaf;
        }

        let dimension = features[rows[0]].len();
        let parent_impurity = gini(frauds, total);

        let split = match Self::best_split(features, labels, &rows, dimension, params, rng) {
            Some(split) if split.impurity < parent_impurity => split,
            _ => return leaf,
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| features[r][split.feature] <= split.threshold);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(Self::grow(
                features, labels, left_rows, level + 1, params, rng, depth,
            )),
            right: Box::new(Self::grow(
                features, labels, right_rows, level + 1, params, rng, depth,
            )),
        }
    }

    fn best_split(
        features: &[Vec<f64>],
        labels: &[bool],
        rows: &[usize],
        dimension: usize,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let amount = params.max_features.clamp(1, dimension);
        let mut candidates = index::sample(rng, dimension, amount).into_vec();
        candidates.sort_unstable();

        let total = rows.len();
        let total_frauds = rows.iter().filter(|&&r| labels[r]).count();
        let mut best: Option<BestSplit> = None;

        for feature in candidates {
            let mut column: Vec<(f64, bool)> =
                rows.iter().map(|&r| (features[r][feature], labels[r])).collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_frauds = 0;
            for i in 0..column.len() - 1 {
                if column[i].1 {
                    left_frauds += 1;
                }
                let (current, next) = (column[i].0, column[i + 1].0);
                if current == next {
                    continue;
                }

                let left = i + 1;
                let right = total - left;
                let impurity = (left as f64 * gini(left_frauds, left)
                    + right as f64 * gini(total_frauds - left_frauds, right))
                    / total as f64;

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = current + (next - current) / 2.0;
                    if threshold >= next {
                        threshold = current;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best
    }

    /// Fraud fraction of the leaf this feature vector lands in.
    pub fn fraud_probability(&self, features: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { fraud_fraction } => return *fraud_fraction,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Depth of the deepest leaf (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.depth
    }
}
