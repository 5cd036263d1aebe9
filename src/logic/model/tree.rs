//! CART regression tree
//!
//! Nodes live in a flat arena; children are indices into `nodes`.
//! A sample goes left when `x[feature] <= threshold`.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features per split
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Fitting state shared by every node of one tree
struct Grower<'a> {
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    params: &'a TreeParams,
    rng: &'a mut StdRng,
    importances: &'a mut [f64],
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit on the rows listed in `samples` (duplicates allowed).
    ///
    /// Impurity decrease per feature is accumulated into `importances`.
    pub fn fit<'a>(
        x: ArrayView2<'a, f64>,
        y: ArrayView1<'a, f64>,
        samples: &[usize],
        params: &'a TreeParams,
        rng: &'a mut StdRng,
        importances: &'a mut [f64],
    ) -> Self {
        let mut grower = Grower {
            x,
            y,
            params,
            rng,
            importances,
            nodes: Vec::new(),
        };
        if !samples.is_empty() {
            grower.grow(samples.to_vec(), 0);
        } else {
            grower.nodes.push(Node::Leaf { value: 0.0 });
        }
        Self { nodes: grower.nodes }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Arena indices must point forward and inside the arena
    pub fn is_well_formed(&self) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(i, node)| match node {
                Node::Leaf { value } => value.is_finite(),
                Node::Split { left, right, .. } => {
                    *left > i && *right > i && *left < self.nodes.len() && *right < self.nodes.len()
                }
            })
    }
}

impl Grower<'_> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let n = samples.len();
        let sum: f64 = samples.iter().map(|&i| self.y[i]).sum();
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: sum / n as f64 });

        let depth_reached = self.params.max_depth.map_or(false, |d| depth >= d);
        if depth_reached
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
        {
            return id;
        }

        let Some(best) = self.best_split(&samples, sum) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[[i, best.feature]] <= best.threshold);

        self.importances[best.feature] += best.gain;
        let left_id = self.grow(left, depth + 1);
        let right_id = self.grow(right, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: left_id,
            right: right_id,
        };
        id
    }

    /// Split with the largest SSE reduction over sampled features
    fn best_split(&mut self, samples: &[usize], total: f64) -> Option<BestSplit> {
        let n_features = self.x.ncols();
        if n_features == 0 {
            return None;
        }
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf.max(1);

        let amount = self.params.max_features.clamp(1, n_features);
        let mut features = rand::seq::index::sample(&mut *self.rng, n_features, amount).into_vec();
        features.sort_unstable();

        let parent = total * total / n as f64;
        let mut best: Option<BestSplit> = None;
        let mut order = samples.to_vec();

        for feature in features {
            order.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left_sum = 0.0;
            for split in 1..n {
                left_sum += self.y[order[split - 1]];
                if split < min_leaf || n - split < min_leaf {
                    continue;
                }
                let lo = self.x[[order[split - 1], feature]];
                let hi = self.x[[order[split], feature]];
                if lo == hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / split as f64
                    + right_sum * right_sum / (n - split) as f64
                    - parent;

                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }
}
