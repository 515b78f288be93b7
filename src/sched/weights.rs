use serde::{Deserialize, Serialize};

/// Tuning knobs for the effective priority formula.
///
/// Each field scales one additive term; the critical-path multiplier is
/// applied after all terms are summed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    /// Scales the intrinsic priority ordinal (low=1 .. critical=4).
    pub base: f64,

    /// Scales the number of direct dependencies.
    pub dep_count: f64,

    /// Scales the number of transitive dependents (downstream impact).
    pub dependent_count: f64,

    /// Scales the longest root-to-task depth.
    pub path_depth: f64,

    /// Scales the estimated effort in hours.
    pub effort: f64,

    /// Scales the deadline urgency step.
    pub urgency: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            base: 1.0,
            dep_count: 0.5,
            dependent_count: 1.5,
            path_depth: 2.0,
            effort: 0.8,
            urgency: 1.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights() {
        let w = PriorityWeights::default();
        assert_eq!(w.base, 1.0);
        assert_eq!(w.dep_count, 0.5);
        assert_eq!(w.dependent_count, 1.5);
        assert_eq!(w.path_depth, 2.0);
        assert_eq!(w.effort, 0.8);
        assert_eq!(w.urgency, 1.2);
    }

    #[test]
    fn partial_deserialization_fills_defaults() {
        let w: PriorityWeights = serde_json::from_str(r#"{"urgency": 3.0}"#).unwrap();
        assert_eq!(w.urgency, 3.0);
        assert_eq!(w.base, 1.0);
    }
}
