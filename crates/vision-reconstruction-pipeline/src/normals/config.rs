use serde::{Deserialize, Serialize};
use vision_reconstruction_linear::PlaneFitOptions;

use super::{NormalsError, OrientationPolicy};

/// Configuration for a normal estimation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalsConfig {
    /// Neighborhood size, the target vertex included.
    pub k: usize,
    /// How the reference camera is chosen for sign disambiguation.
    pub orientation: OrientationPolicy,
    /// Report progress every this many vertices.
    pub progress_interval: usize,
    /// Run per-vertex work on the rayon thread pool.
    pub parallel: bool,
    /// Robust plane fit options.
    pub plane_fit: PlaneFitOptions,
}

impl Default for NormalsConfig {
    fn default() -> Self {
        Self {
            k: 200,
            orientation: OrientationPolicy::default(),
            progress_interval: 100,
            parallel: false,
            plane_fit: PlaneFitOptions::default(),
        }
    }
}

impl NormalsConfig {
    pub fn validate(&self) -> Result<(), NormalsError> {
        if self.k < 3 {
            return Err(NormalsError::InvalidConfig(format!(
                "k must be at least 3 to fit a plane, got {}",
                self.k
            )));
        }
        if self.progress_interval == 0 {
            return Err(NormalsError::InvalidConfig(
                "progress_interval must be positive".to_string(),
            ));
        }
        self.plane_fit
            .validate()
            .map_err(|e| NormalsError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = NormalsConfig::default();
        assert_eq!(config.k, 200);
        assert_eq!(config.progress_interval, 100);
        assert_eq!(config.orientation, OrientationPolicy::FirstCalibrated);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let config = NormalsConfig {
            k: 2,
            ..NormalsConfig::default()
        };
        assert!(matches!(config.validate(), Err(NormalsError::InvalidConfig(_))));

        let config = NormalsConfig {
            progress_interval: 0,
            ..NormalsConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = NormalsConfig::default();
        config.plane_fit.min_inlier_ratio = 2.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_inlier_ratio"), "{err}");
    }

    #[test]
    fn json_roundtrip_with_partial_input() {
        let config: NormalsConfig =
            serde_json::from_str(r#"{"k": 16, "orientation": "majority_vote"}"#).unwrap();
        assert_eq!(config.k, 16);
        assert_eq!(config.orientation, OrientationPolicy::MajorityVote);
        assert_eq!(config.progress_interval, 100);

        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: NormalsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }
}
