//! Phenotype evaluation: grammar → program → drawing → feature vector.
//!
//! Every feature lies in `[0, 1]` so that population-relative normalization
//! compares like with like:
//!
//! - `Efficiency`: leaves per drawn element, `leaves / (leaves + segments)`
//! - `Phototropism`: mean upward tendency of segments, `(dy / len + 1) / 2`
//! - `Symmetry`: `1 - |L - R| / (L + R)` for stem length left/right of the trunk axis
//! - `Light`: fraction of leaves that are the highest in their `leaf_size` column
//! - `Branching`: `1 - exp(-branches / 8)` for branches that drew something

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{Environment, FEATURE_COUNT, Genotype};

use super::lsystem::expand;
use super::turtle::{Drawing, interpret};

/// Branch count at which the branching feature reaches `1 - 1/e`.
const BRANCH_SCALE: f64 = 8.0;

/// Horizontal distance under which a segment counts as on the trunk axis.
const AXIS_TOLERANCE: f64 = 1e-9;

/// Feature vector in [`Feature::ALL`] order.
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Semantic fitness dimensions, in weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Efficiency,
    Phototropism,
    Symmetry,
    Light,
    Branching,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Efficiency,
        Feature::Phototropism,
        Feature::Symmetry,
        Feature::Light,
        Feature::Branching,
    ];

    /// Column index in feature vectors and weights.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::Efficiency => "efficiency",
            Feature::Phototropism => "phototropism",
            Feature::Symmetry => "symmetry",
            Feature::Light => "light",
            Feature::Branching => "branching",
        };
        f.write_str(name)
    }
}

/// Expanded, interpreted and measured form of a genotype.
#[derive(Debug, Clone)]
pub struct Phenotype {
    /// Expanded program.
    pub code: String,
    /// Rewriting rounds used.
    pub iterations: usize,
    pub features: FeatureVector,
    /// Renderable geometry.
    pub drawing: Drawing,
}

impl Genotype {
    /// Grow this grammar in `env` and measure the result.
    pub fn generate(&self, env: &Environment) -> Phenotype {
        let expansion = expand(self, env);
        let drawing = interpret(&expansion.code, env.step, env.angle);
        let features = measure_features(&drawing, env);

        Phenotype {
            code: expansion.code,
            iterations: expansion.iterations,
            features,
            drawing,
        }
    }
}

/// Compute all five features of a drawing.
pub fn measure_features(drawing: &Drawing, env: &Environment) -> FeatureVector {
    let mut features = [0.0; FEATURE_COUNT];
    features[Feature::Efficiency.index()] = efficiency(drawing);
    features[Feature::Phototropism.index()] = phototropism(drawing);
    features[Feature::Symmetry.index()] = symmetry(drawing);
    features[Feature::Light.index()] = light_exposure(drawing, env.leaf_size);
    features[Feature::Branching.index()] = branching(drawing);
    features
}

fn efficiency(drawing: &Drawing) -> f64 {
    let leaves = drawing.leaves.len() as f64;
    let elements = leaves + drawing.segments.len() as f64;
    if elements == 0.0 {
        return 0.0;
    }
    leaves / elements
}

fn phototropism(drawing: &Drawing) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for segment in &drawing.segments {
        let len = segment.length();
        if len > 0.0 {
            total += ((segment.to.y - segment.from.y) / len + 1.0) * 0.5;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    total / count as f64
}

fn symmetry(drawing: &Drawing) -> f64 {
    let (mut left, mut right) = (0.0, 0.0);
    for segment in &drawing.segments {
        let mid = segment.midpoint();
        let len = segment.length();
        if mid.x < -AXIS_TOLERANCE {
            left += len;
        } else if mid.x > AXIS_TOLERANCE {
            right += len;
        } else {
            // On the axis: counts for both sides equally
            left += 0.5 * len;
            right += 0.5 * len;
        }
    }
    let total = left + right;
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - (left - right).abs() / total
}

fn light_exposure(drawing: &Drawing, leaf_size: f64) -> f64 {
    if drawing.leaves.is_empty() || leaf_size <= 0.0 {
        return 0.0;
    }
    // Each column has exactly one highest leaf, so lit leaves = occupied columns.
    let columns: HashSet<i64> = drawing
        .leaves
        .iter()
        .map(|leaf| (leaf.x / leaf_size).floor() as i64)
        .collect();
    columns.len() as f64 / drawing.leaves.len() as f64
}

fn branching(drawing: &Drawing) -> f64 {
    1.0 - (-(drawing.branch_points as f64) / BRANCH_SCALE).exp()
}
