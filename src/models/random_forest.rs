//! Random Forest для бинарной классификации

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{HealthError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    /// Доли классов среди обучающих строк листа
    Leaf { distribution: Vec<f64> },
    /// left/right: индексы узлов в том же дереве
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Дерево решений (Gini), растет до чистых листьев. Корень в узле 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ClassificationTree {
    nodes: Vec<TreeNode>,
}

struct TreeBuilder<'a> {
    X: &'a Array2<f64>,
    y: &'a Array1<usize>,
    n_classes: usize,
    max_features: usize,
    min_samples_split: usize,
}

impl<'a> TreeBuilder<'a> {
    fn build_tree(&self, indices: Vec<usize>, rng: &mut StdRng) -> ClassificationTree {
        let mut nodes = Vec::new();
        self.build(indices, rng, &mut nodes);
        ClassificationTree { nodes }
    }

    fn build(&self, indices: Vec<usize>, rng: &mut StdRng, nodes: &mut Vec<TreeNode>) -> usize {
        let counts = self.class_counts(&indices);
        let id = nodes.len();

        let is_pure = counts.iter().filter(|c| **c > 0).count() <= 1;
        let split = if is_pure || indices.len() < self.min_samples_split {
            None
        } else {
            self.best_split(&indices, rng)
        };

        let Some((feature, threshold)) = split else {
            nodes.push(self.leaf(&counts, indices.len()));
            return id;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.X[[i, feature]] <= threshold);

        // Заглушка, пока строятся потомки
        nodes.push(TreeNode::Leaf {
            distribution: Vec::new(),
        });
        let left = self.build(left_indices, rng, nodes);
        let right = self.build(right_indices, rng, nodes);
        nodes[id] = TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn leaf(&self, counts: &[usize], total: usize) -> TreeNode {
        let distribution = counts
            .iter()
            .map(|c| *c as f64 / total.max(1) as f64)
            .collect();
        TreeNode::Leaf { distribution }
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        counts
    }

    /// Перебор случайного подмножества признаков; постоянные признаки в лимит не входят
    fn best_split(&self, indices: &[usize], rng: &mut StdRng) -> Option<(usize, f64)> {
        let mut features: Vec<usize> = (0..self.X.ncols()).collect();
        features.shuffle(rng);

        let mut best: Option<(usize, f64, f64)> = None;
        let mut evaluated = 0;

        for feature in features {
            if evaluated >= self.max_features && best.is_some() {
                break;
            }

            let mut samples: Vec<(f64, usize)> = indices
                .iter()
                .map(|&i| (self.X[[i, feature]], self.y[i]))
                .collect();
            samples.sort_by(|a, b| a.0.total_cmp(&b.0));

            let first = samples[0].0;
            let last = samples[samples.len() - 1].0;
            if last - first < 1e-12 {
                continue;
            }
            evaluated += 1;

            if let Some((threshold, impurity)) = self.best_threshold(&samples) {
                let improves = best.map_or(true, |(_, _, b)| impurity < b);
                if improves {
                    best = Some((feature, threshold, impurity));
                }
            }
        }

        best.map(|(feature, threshold, _)| (feature, threshold))
    }

    /// Проход по отсортированным значениям: взвешенная Gini по обе стороны
    fn best_threshold(&self, samples: &[(f64, usize)]) -> Option<(f64, f64)> {
        let n = samples.len();
        let mut left = vec![0usize; self.n_classes];
        let mut right = vec![0usize; self.n_classes];
        for (_, class) in samples {
            right[*class] += 1;
        }

        let mut best: Option<(f64, f64)> = None;
        for i in 0..n - 1 {
            let (value, class) = samples[i];
            left[class] += 1;
            right[class] -= 1;

            let next = samples[i + 1].0;
            if next - value < 1e-12 {
                continue;
            }

            let n_left = (i + 1) as f64;
            let n_right = (n - i - 1) as f64;
            let impurity =
                (n_left * gini(&left, n_left) + n_right * gini(&right, n_right)) / n as f64;

            if best.map_or(true, |(_, b)| impurity < b) {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some((threshold, impurity));
            }
        }

        best
    }
}

fn gini(counts: &[usize], total: f64) -> f64 {
    1.0 - counts
        .iter()
        .map(|c| {
            let p = *c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

impl ClassificationTree {
    fn predict_distribution(&self, sample: &ArrayView1<f64>) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                TreeNode::Leaf { distribution } => return distribution,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if sample[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Ансамбль деревьев на бутстреп-выборках; вероятности усредняются
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_trees: usize,
    seed: u64,
    n_features: usize,
    n_classes: usize,
    trees: Vec<ClassificationTree>,
}

impl RandomForest {
    pub fn new(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees,
            seed,
            n_features: 0,
            n_classes: 0,
            trees: Vec::new(),
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        let n_samples = X.nrows();
        if n_samples == 0 || X.ncols() == 0 {
            return Err(HealthError::Model("Empty dataset".to_string()));
        }
        if n_samples != y.len() {
            return Err(HealthError::Model(format!(
                "{} samples but {} labels",
                n_samples,
                y.len()
            )));
        }
        if self.n_trees == 0 {
            return Err(HealthError::Model("Forest needs at least one tree".to_string()));
        }

        self.n_features = X.ncols();
        self.n_classes = y.iter().copied().max().unwrap_or(0).max(1) + 1;

        let builder = TreeBuilder {
            X,
            y,
            n_classes: self.n_classes,
            max_features: ((self.n_features as f64).sqrt() as usize).max(1),
            min_samples_split: 2,
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        self.trees = (0..self.n_trees)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                builder.build_tree(bootstrap, &mut rng)
            })
            .collect();

        Ok(())
    }

    /// Лес из деревьев-листьев с заданными распределениями
    #[cfg(test)]
    pub(crate) fn from_leaves(n_features: usize, leaves: Vec<Vec<f64>>) -> Self {
        let n_classes = leaves.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            n_trees: leaves.len(),
            seed: 0,
            n_features,
            n_classes,
            trees: leaves
                .into_iter()
                .map(|distribution| ClassificationTree {
                    nodes: vec![TreeNode::Leaf { distribution }],
                })
                .collect(),
        }
    }

    pub fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn predict_proba(&self, X: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_trained() {
            return Err(HealthError::Model("Model not trained".to_string()));
        }
        if X.ncols() != self.n_features {
            return Err(HealthError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.n_features,
                X.ncols()
            )));
        }

        let mut proba = Array2::zeros((X.nrows(), self.n_classes));
        for (i, sample) in X.axis_iter(Axis(0)).enumerate() {
            for tree in &self.trees {
                for (class, p) in tree.predict_distribution(&sample).iter().enumerate() {
                    proba[[i, class]] += p;
                }
            }
        }
        proba /= self.trees.len() as f64;

        Ok(proba)
    }

    pub fn predict(&self, X: &Array2<f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(X)?;
        Ok(proba.rows().into_iter().map(|row| argmax(&row)).collect())
    }
}

/// Первый максимум: при равенстве побеждает меньший класс
pub fn argmax(row: &ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, p) in row.iter().enumerate() {
        if *p > row[best] {
            best = i;
        }
    }
    best
}
