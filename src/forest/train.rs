//! Forest fitting: bootstrapped rows, random feature pools, exact gini
//! splits grown until leaves are pure.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::model::{DecisionTree, Node, RandomForest, MODEL_VERSION};

/// Training hyperparameters for the forest.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Number of trees in the ensemble.
    pub trees: usize,
    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum rows required to attempt a split.
    pub min_samples_split: usize,
    /// Seed driving bootstrap sampling and feature pool selection.
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

/// In-memory dataset used for fitting.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Ordered class names; row labels index into this list.
    pub classes: Vec<String>,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f64>>,
    /// Class codes aligned with `x`.
    pub y: Vec<usize>,
}

/// Fit a random forest on `dataset`. Each tree trains on a bootstrap sample
/// of the rows and considers `floor(sqrt(n_features))` candidate features
/// per split. The run is fully determined by `options.seed`.
pub fn train_forest(
    dataset: &TrainDataset,
    options: &TrainOptions,
    encoder_fingerprint: &str,
) -> Result<RandomForest, String> {
    if dataset.x.len() != dataset.y.len() {
        return Err(format!(
            "feature rows ({}) and labels ({}) disagree",
            dataset.x.len(),
            dataset.y.len()
        ));
    }
    if dataset.x.is_empty() {
        return Err("training set is empty".to_string());
    }
    if options.trees == 0 {
        return Err("tree count must be positive".to_string());
    }
    let n_classes = dataset.classes.len();
    if n_classes < 2 {
        return Err(format!("need at least 2 classes, got {n_classes}"));
    }
    let n_features = dataset.x[0].len();
    if n_features == 0 {
        return Err("feature rows are empty".to_string());
    }
    if let Some(row) = dataset.x.iter().find(|row| row.len() != n_features) {
        return Err(format!(
            "inconsistent feature row length: {} vs {}",
            row.len(),
            n_features
        ));
    }
    if dataset.y.iter().any(|&label| label >= n_classes) {
        return Err("label code out of class range".to_string());
    }

    let n = dataset.x.len();
    let ctx = TreeContext {
        x: &dataset.x,
        y: &dataset.y,
        n_classes,
        n_features,
        max_features: ((n_features as f64).sqrt().floor() as usize).max(1),
        max_depth: options.max_depth,
        min_samples_split: options.min_samples_split,
    };

    let mut trees = Vec::with_capacity(options.trees);
    for t in 0..options.trees {
        // Each tree owns a seed derived from the run seed, so a single tree
        // can be regrown in isolation.
        let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(t as u64));
        let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        trees.push(grow_tree(&ctx, sample, &mut rng));
    }

    let forest = RandomForest {
        model_version: MODEL_VERSION,
        n_features,
        classes: dataset.classes.clone(),
        encoder_fingerprint: encoder_fingerprint.to_string(),
        trees,
    };
    forest.validate()?;
    Ok(forest)
}

struct TreeContext<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    n_features: usize,
    max_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

fn grow_tree(ctx: &TreeContext, mut sample: Vec<usize>, rng: &mut StdRng) -> DecisionTree {
    let mut nodes = Vec::new();
    build_node(ctx, &mut sample, 0, rng, &mut nodes);
    DecisionTree { nodes }
}

fn build_node(
    ctx: &TreeContext,
    rows: &mut [usize],
    depth: usize,
    rng: &mut StdRng,
    nodes: &mut Vec<Node>,
) -> u32 {
    let counts = class_counts(ctx.y, rows, ctx.n_classes);
    let total = rows.len();
    let pure = counts.iter().any(|&c| c == total);
    let capped = ctx.max_depth.map_or(false, |d| depth >= d);
    if pure || total < ctx.min_samples_split || capped {
        return push_leaf(nodes, &counts, total);
    }

    let split = match best_split(ctx, rows, rng) {
        Some(split) => split,
        None => return push_leaf(nodes, &counts, total),
    };
    let mid = partition_rows(ctx.x, rows, split.feature, split.threshold);
    if mid == 0 || mid == rows.len() {
        return push_leaf(nodes, &counts, total);
    }

    let idx = nodes.len();
    nodes.push(Node::Split {
        feature: split.feature as u32,
        threshold: split.threshold,
        left: 0,
        right: 0,
    });
    let (left_rows, right_rows) = rows.split_at_mut(mid);
    let left = build_node(ctx, left_rows, depth + 1, rng, nodes);
    let right = build_node(ctx, right_rows, depth + 1, rng, nodes);
    if let Node::Split {
        left: l, right: r, ..
    } = &mut nodes[idx]
    {
        *l = left;
        *r = right;
    }
    idx as u32
}

/// Features are visited in random order until `max_features` of them have
/// produced a usable threshold. Constant features do not count against the
/// budget, so a node is never left impure just because the first features
/// drawn had nothing to offer.
fn best_split(ctx: &TreeContext, rows: &[usize], rng: &mut StdRng) -> Option<SplitCandidate> {
    let mut order: Vec<usize> = (0..ctx.n_features).collect();
    order.shuffle(rng);

    let mut best: Option<SplitCandidate> = None;
    let mut usable = 0;
    for &feature in &order {
        if usable >= ctx.max_features {
            break;
        }
        if let Some(candidate) = best_split_for_feature(ctx, rows, feature) {
            usable += 1;
            if best.map_or(true, |b| candidate.score < b.score) {
                best = Some(candidate);
            }
        }
    }
    best
}

/// Exact threshold sweep for one feature: sort the node's rows by value and
/// evaluate the weighted gini of every boundary between distinct values,
/// updating class counts incrementally.
fn best_split_for_feature(
    ctx: &TreeContext,
    rows: &[usize],
    feature: usize,
) -> Option<SplitCandidate> {
    let mut order: Vec<usize> = rows.to_vec();
    order.sort_by(|&a, &b| {
        ctx.x[a][feature]
            .partial_cmp(&ctx.x[b][feature])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total = order.len();
    let mut left_counts = vec![0usize; ctx.n_classes];
    let mut right_counts = class_counts(ctx.y, &order, ctx.n_classes);
    let mut left_sq = 0.0;
    let mut right_sq: f64 = right_counts.iter().map(|&c| (c * c) as f64).sum();

    let mut best_score = f64::INFINITY;
    let mut best_threshold = None;
    for i in 1..total {
        let class = ctx.y[order[i - 1]];
        // Move one row of `class` from the right side to the left; the
        // squared-count sums shift by 2c+1 and -(2c-1).
        left_sq += (2 * left_counts[class] + 1) as f64;
        right_sq -= (2 * right_counts[class] - 1) as f64;
        left_counts[class] += 1;
        right_counts[class] -= 1;

        let prev = ctx.x[order[i - 1]][feature];
        let cur = ctx.x[order[i]][feature];
        if prev == cur {
            continue;
        }
        let nl = i as f64;
        let nr = (total - i) as f64;
        let gini_left = 1.0 - left_sq / (nl * nl);
        let gini_right = 1.0 - right_sq / (nr * nr);
        let score = (nl * gini_left + nr * gini_right) / total as f64;
        if score < best_score {
            best_score = score;
            best_threshold = Some((prev + cur) / 2.0);
        }
    }

    best_threshold.map(|threshold| SplitCandidate {
        feature,
        threshold,
        score: best_score,
    })
}

fn partition_rows(x: &[Vec<f64>], rows: &mut [usize], feature: usize, threshold: f64) -> usize {
    let mut mid = 0;
    for j in 0..rows.len() {
        if x[rows[j]][feature] <= threshold {
            rows.swap(mid, j);
            mid += 1;
        }
    }
    mid
}

fn class_counts(y: &[usize], rows: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &row in rows {
        counts[y[row]] += 1;
    }
    counts
}

fn push_leaf(nodes: &mut Vec<Node>, counts: &[usize], total: usize) -> u32 {
    let idx = nodes.len() as u32;
    let distribution = counts.iter().map(|&c| c as f64 / total as f64).collect();
    nodes.push(Node::Leaf { distribution });
    idx
}
