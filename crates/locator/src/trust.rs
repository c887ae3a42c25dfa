// ABOUTME: Trust model: tunable parameters and scoring primitives for fuzzy ancestor matching.
// ABOUTME: Computes importance/rampup per ancestor level and the normalization constant.

//! Trust scoring.
//!
//! A candidate's trust is the sum of per-level scores along its ancestor
//! chain, divided by [`TrustModel::normalization`]. Each level is weighted by
//!
//! - `importance(p) = depth_decay / (p + sqrt(depth_decay))²`, which makes the
//!   anchor's neighborhood dominate and distant ancestors negligible, and
//! - `rampup(p) = min((p / rampup_span)², 1)`, which withholds trust from the
//!   anchor's own attributes until surrounding structure backs them up.

use serde::Deserialize;

use crate::error::{Result, Web2ApiError};

/// Maximum amount `id_weight + class_weight` may exceed 1.
pub const WEIGHT_TOLERANCE: f64 = 1e-4;

/// Number of terms summed to approximate the decay function's infinite tail.
pub const NORMALIZATION_TERMS: usize = 100;

fn default_prefilter_threshold() -> f64 {
    0.7
}

/// Raw trust parameters as they appear in a host config's `rating` block.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TrustParams {
    #[serde(alias = "depth_trust_threshold")]
    pub depth_decay: f64,
    #[serde(alias = "id_trust_ratio")]
    pub id_weight: f64,
    #[serde(alias = "class_trust_ratio")]
    pub class_weight: f64,
    pub rampup_span: f64,
    #[serde(default = "default_prefilter_threshold")]
    pub prefilter_threshold: f64,
    #[serde(alias = "trust_threshold")]
    pub accept_threshold: f64,
}

/// Validated trust parameters plus the precomputed normalization constant.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "TrustParams")]
pub struct TrustModel {
    params: TrustParams,
    normalization: f64,
}

impl TrustModel {
    /// Validates `params` and precomputes the normalization constant.
    pub fn new(params: TrustParams) -> Result<Self> {
        let fields = [
            ("depth_decay", params.depth_decay),
            ("id_weight", params.id_weight),
            ("class_weight", params.class_weight),
            ("rampup_span", params.rampup_span),
            ("prefilter_threshold", params.prefilter_threshold),
            ("accept_threshold", params.accept_threshold),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(invalid(format!("{} must be finite, got {}", name, value)));
            }
        }

        if params.depth_decay <= 0.0 {
            return Err(invalid(format!(
                "depth_decay must be positive, got {}",
                params.depth_decay
            )));
        }
        if params.rampup_span <= 0.0 {
            return Err(invalid(format!(
                "rampup_span must be positive, got {}",
                params.rampup_span
            )));
        }
        for (name, value) in &fields[1..3] {
            if !(0.0..=1.0).contains(value) {
                return Err(invalid(format!("{} must be in [0, 1], got {}", name, value)));
            }
        }
        for (name, value) in &fields[4..] {
            if !(0.0..=1.0).contains(value) {
                return Err(invalid(format!("{} must be in [0, 1], got {}", name, value)));
            }
        }
        if params.id_weight + params.class_weight > 1.0 + WEIGHT_TOLERANCE {
            return Err(invalid(format!(
                "id_weight + class_weight must not exceed 1, got {}",
                params.id_weight + params.class_weight
            )));
        }

        let normalization = (0..NORMALIZATION_TERMS)
            .map(|i| decay(params.depth_decay, i as f64))
            .sum();

        Ok(Self {
            params,
            normalization,
        })
    }

    /// Builds a model from a JSON mapping, reporting missing keys as
    /// `InvalidTrustModel`.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let params: TrustParams = serde_json::from_value(value.clone())
            .map_err(|e| Web2ApiError::invalid_trust_model("Build", Some(e.into())))?;
        Self::new(params)
    }

    pub fn params(&self) -> &TrustParams {
        &self.params
    }

    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    pub fn prefilter_threshold(&self) -> f64 {
        self.params.prefilter_threshold
    }

    pub fn accept_threshold(&self) -> f64 {
        self.params.accept_threshold
    }

    /// How much ancestor position `p` counts towards trust.
    pub fn importance(&self, p: usize) -> f64 {
        decay(self.params.depth_decay, p as f64)
    }

    /// Suppression factor for positions closer than `rampup_span`.
    pub fn rampup(&self, p: usize) -> f64 {
        let ratio = p as f64 / self.params.rampup_span;
        (ratio * ratio).min(1.0)
    }

    /// Score contributed by one ancestor level given its id and class
    /// similarities to the path segment at that position.
    pub fn level_score(&self, p: usize, id_similarity: f64, class_similarity: f64) -> f64 {
        self.rampup(p)
            * self.importance(p)
            * (id_similarity * self.params.id_weight + class_similarity * self.params.class_weight)
    }

    /// Credit for a path position the document is too shallow to verify.
    /// Counted at full trust.
    pub fn missing_level_credit(&self, p: usize) -> f64 {
        self.importance(p)
    }

    /// Converts a raw chain total into trust.
    pub fn trust(&self, total: f64) -> f64 {
        total / self.normalization
    }

    pub fn accepts(&self, trust: f64) -> bool {
        trust >= self.params.accept_threshold
    }

    /// Trust reached by an exact replica of an `segments`-long path in a
    /// document at least that deep.
    pub fn ceiling(&self, segments: usize) -> f64 {
        let weight = self.params.id_weight + self.params.class_weight;
        let total: f64 = (0..segments)
            .map(|p| self.rampup(p) * self.importance(p) * weight)
            .sum();
        self.trust(total)
    }
}

impl TryFrom<TrustParams> for TrustModel {
    type Error = Web2ApiError;

    fn try_from(params: TrustParams) -> Result<Self> {
        Self::new(params)
    }
}

fn decay(depth_decay: f64, p: f64) -> f64 {
    let denom = p + depth_decay.sqrt();
    depth_decay / (denom * denom)
}

fn invalid(msg: String) -> Web2ApiError {
    Web2ApiError::invalid_trust_model("Build", Some(anyhow::anyhow!(msg)))
}
