//! Admission gate: decides whether a metric vector may be mined at all

use crate::config::AdmissionConfig;
use qcoin_core::{MetricVector, RejectionReason};

#[derive(Debug, Clone, Default)]
pub struct AdmissionGate {
    config: AdmissionConfig,
}

impl AdmissionGate {
    pub fn new(config: AdmissionConfig) -> Self {
        Self { config }
    }

    pub fn qualifies(&self, metrics: &MetricVector) -> bool {
        self.evaluate(metrics).is_ok()
    }

    /// Like [`qualifies`](Self::qualifies) but says why not.
    ///
    /// A finite value failing its clause wins over a non-finite value elsewhere,
    /// so low integration is always `MetricsBelowThreshold`.
    pub fn evaluate(&self, metrics: &MetricVector) -> Result<(), RejectionReason> {
        let c = &self.config;
        let clauses = [
            (metrics.integration(), metrics.integration() > c.min_integration),
            (metrics.coherence(), metrics.coherence() > c.min_coherence),
            (metrics.decoherence(), metrics.decoherence() < c.max_decoherence),
        ];

        if clauses.iter().any(|(value, ok)| value.is_finite() && !ok) {
            return Err(RejectionReason::MetricsBelowThreshold);
        }
        if !metrics.is_finite() {
            return Err(RejectionReason::MalformedInput);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AdmissionGate {
        AdmissionGate::default()
    }

    #[test]
    fn all_clauses_pass() {
        assert!(gate().qualifies(&MetricVector::new(1.0, 0.9, 0.1)));
        assert!(gate().qualifies(&MetricVector::new(0.51, 0.31, 0.89)));
    }

    #[test]
    fn thresholds_are_strict() {
        assert!(!gate().qualifies(&MetricVector::new(0.5, 0.9, 0.1)));
        assert!(!gate().qualifies(&MetricVector::new(1.0, 0.3, 0.1)));
        assert!(!gate().qualifies(&MetricVector::new(1.0, 0.9, 0.9)));
    }

    #[test]
    fn each_clause_fails_independently() {
        let cases = [
            MetricVector::new(0.4, 0.9, 0.1),
            MetricVector::new(1.0, 0.2, 0.1),
            MetricVector::new(1.0, 0.9, 0.95),
        ];
        for m in cases {
            assert_eq!(
                gate().evaluate(&m),
                Err(RejectionReason::MetricsBelowThreshold)
            );
        }
    }

    #[test]
    fn non_finite_is_malformed() {
        assert_eq!(
            gate().evaluate(&MetricVector::new(f64::NAN, 0.9, 0.1)),
            Err(RejectionReason::MalformedInput)
        );
        assert_eq!(
            gate().evaluate(&MetricVector::new(f64::INFINITY, 0.9, 0.1)),
            Err(RejectionReason::MalformedInput)
        );
        assert!(!gate().qualifies(&MetricVector::new(1.0, 0.9, f64::NEG_INFINITY)));
    }

    #[test]
    fn low_integration_wins_over_non_finite_fields() {
        assert_eq!(
            gate().evaluate(&MetricVector::new(0.4, f64::NAN, f64::INFINITY)),
            Err(RejectionReason::MetricsBelowThreshold)
        );
    }

    #[test]
    fn custom_thresholds() {
        let strict = AdmissionGate::new(AdmissionConfig {
            min_integration: 2.0,
            min_coherence: 0.3,
            max_decoherence: 0.9,
        });
        assert!(!strict.qualifies(&MetricVector::new(1.5, 0.9, 0.1)));
        assert!(strict.qualifies(&MetricVector::new(2.5, 0.9, 0.1)));
    }
}
