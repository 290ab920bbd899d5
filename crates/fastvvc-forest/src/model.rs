//! Forest model: per-shape selectors and tree ensembles
//!
//! A model maps `(kind, width, height)` to a trained forest: an ordered
//! feature-index selection plus an ensemble of binary trees. The ensemble
//! probability is the unweighted mean of the per-tree leaf probabilities.
//! Shapes without a trained forest evaluate to the 0.5 sentinel.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fastvvc_features::{HOR_VER_DIMS, QT_MTT_DIMS};

/// Which classifier a forest serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForestKind {
    /// Split-vs-no-split (optional; absent in the shipped model)
    NoSplit,
    /// Quad-tree vs multi-type tree
    QtMtt,
    /// Horizontal vs vertical MTT direction
    HorVer,
}

impl ForestKind {
    /// Length of the feature vector this kind consumes
    pub fn dims(&self) -> usize {
        match self {
            // the no-split cascade shares the QT-vs-MTT layout
            ForestKind::NoSplit | ForestKind::QtMtt => QT_MTT_DIMS,
            ForestKind::HorVer => HOR_VER_DIMS,
        }
    }
}

/// Node of a binary decision tree
///
/// Branches test `x[feature] <= threshold` on the selector-projected
/// sub-vector and descend left on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Branch {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        prob: f64,
    },
}

/// One decision tree, nodes in preorder with node 0 as root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Leaf probability for the projected sub-vector
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { prob } => return *prob,
                TreeNode::Branch {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Trained forest for one CU shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeForest {
    /// Ordered feature indices chosen at training time
    pub selector: Vec<usize>,
    pub trees: Vec<Tree>,
}

impl ShapeForest {
    /// Project the full feature vector and average the tree ensemble
    pub fn predict(&self, features: &[f32]) -> f64 {
        let projected: Vec<f64> = self
            .selector
            .iter()
            .map(|&i| features[i] as f64)
            .collect();
        let sum: f64 = self.trees.iter().map(|t| t.predict(&projected)).sum();
        sum / self.trees.len() as f64
    }
}

/// Model validation failures
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model resource is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind:?} {width}x{height}: selector index {index} out of range for {dims}-dim features")]
    SelectorOutOfRange {
        kind: ForestKind,
        width: u32,
        height: u32,
        index: usize,
        dims: usize,
    },

    #[error("{kind:?} {width}x{height}: tree {tree} is malformed: {message}")]
    MalformedTree {
        kind: ForestKind,
        width: u32,
        height: u32,
        tree: usize,
        message: String,
    },

    #[error("{kind:?} {width}x{height}: forest has no trees")]
    EmptyForest {
        kind: ForestKind,
        width: u32,
        height: u32,
    },
}

/// Serialized model layout
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelFile {
    forests: Vec<ShapeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShapeEntry {
    kind: ForestKind,
    width: u32,
    height: u32,
    #[serde(flatten)]
    forest: ShapeForest,
}

/// The complete classifier model, read-only after load
#[derive(Debug, Clone, Default)]
pub struct ForestModel {
    forests: HashMap<(ForestKind, u32, u32), ShapeForest>,
}

impl ForestModel {
    /// Model with no trained shapes; every query yields 0.5
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON model resource
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_str(json)?;
        let mut model = Self::empty();
        for entry in file.forests {
            validate_forest(&entry)?;
            model
                .forests
                .insert((entry.kind, entry.width, entry.height), entry.forest);
        }
        Ok(model)
    }

    /// Install a forest for one shape (test and tooling hook)
    pub fn insert(&mut self, kind: ForestKind, width: u32, height: u32, forest: ShapeForest) {
        self.forests.insert((kind, width, height), forest);
    }

    pub fn has_shape(&self, kind: ForestKind, width: u32, height: u32) -> bool {
        self.forests.contains_key(&(kind, width, height))
    }

    /// Ensemble probability in [0, 1]; 0.5 for untrained shapes.
    ///
    /// `features` must carry the layout matching `kind`.
    pub fn evaluate(&self, kind: ForestKind, width: u32, height: u32, features: &[f32]) -> f64 {
        debug_assert_eq!(features.len(), kind.dims());
        match self.forests.get(&(kind, width, height)) {
            Some(forest) => forest.predict(features),
            None => 0.5,
        }
    }

    /// The compiled-in default model
    pub fn builtin() -> &'static ForestModel {
        static BUILTIN: Lazy<ForestModel> = Lazy::new(|| {
            ForestModel::from_json_str(include_str!("../data/forest_default.json"))
                .expect("built-in forest model is validated at build time")
        });
        &BUILTIN
    }
}

fn validate_forest(entry: &ShapeEntry) -> Result<(), ModelError> {
    let dims = entry.kind.dims();
    if let Some(&index) = entry.forest.selector.iter().find(|&&i| i >= dims) {
        return Err(ModelError::SelectorOutOfRange {
            kind: entry.kind,
            width: entry.width,
            height: entry.height,
            index,
            dims,
        });
    }
    if entry.forest.trees.is_empty() {
        return Err(ModelError::EmptyForest {
            kind: entry.kind,
            width: entry.width,
            height: entry.height,
        });
    }
    let arity = entry.forest.selector.len();
    for (t, tree) in entry.forest.trees.iter().enumerate() {
        let bad = |message: String| ModelError::MalformedTree {
            kind: entry.kind,
            width: entry.width,
            height: entry.height,
            tree: t,
            message,
        };
        if tree.nodes.is_empty() {
            return Err(bad("empty tree".into()));
        }
        for (n, node) in tree.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { prob } => {
                    if !(0.0..=1.0).contains(prob) {
                        return Err(bad(format!("leaf {n} probability {prob} outside [0,1]")));
                    }
                }
                TreeNode::Branch {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= arity {
                        return Err(bad(format!(
                            "node {n} tests feature {feature} beyond selector arity {arity}"
                        )));
                    }
                    // children must point forward so traversal terminates
                    if *left <= n || *right <= n || *left >= tree.nodes.len() || *right >= tree.nodes.len()
                    {
                        return Err(bad(format!("node {n} has invalid children")));
                    }
                }
            }
        }
    }
    Ok(())
}
