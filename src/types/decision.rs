//! Approval decision data structures

use crate::types::applicant::Applicant;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Outcome shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    pub fn from_approved(approved: bool) -> Self {
        if approved {
            Verdict::Approve
        } else {
            Verdict::Reject
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Approve => f.write_str("Approve"),
            Verdict::Reject => f.write_str("Reject!"),
        }
    }
}

/// Raw model output for one applicant.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Probability of the model's second class (index 1)
    pub probability: f64,
    /// Index into the model's class list
    pub class_index: usize,
    /// Class label at `class_index`
    pub label: String,
    /// Whether `label` is the approved label
    pub approved: bool,
}

/// Approval decision for one submitted form. Displayed, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Unique decision identifier
    pub decision_id: String,

    /// Decision timestamp
    pub timestamp: DateTime<Utc>,

    /// Probability of the model's positive class
    pub probability: f64,

    /// Predicted dataset label
    pub predicted_label: String,

    pub verdict: Verdict,

    /// Values exactly as entered in the form
    pub applicant: Applicant,
}

impl Decision {
    pub fn new(prediction: Prediction, applicant: Applicant) -> Self {
        Self {
            decision_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            probability: prediction.probability,
            verdict: Verdict::from_approved(prediction.approved),
            predicted_label: prediction.label,
            applicant,
        }
    }

    pub fn approved(&self) -> bool {
        self.verdict == Verdict::Approve
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::applicant::FeatureValue;

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::from_approved(true).to_string(), "Approve");
        assert_eq!(Verdict::from_approved(false).to_string(), "Reject!");
    }

    #[test]
    fn test_decision_serialization() {
        let prediction = Prediction {
            probability: 0.93,
            class_index: 1,
            label: "+".to_string(),
            approved: true,
        };
        let applicant = Applicant::new().with("Age", FeatureValue::Float(30.83));
        let decision = Decision::new(prediction, applicant);

        let json: serde_json::Value = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["verdict"], "approve");
        assert_eq!(json["predicted_label"], "+");
        assert_eq!(json["applicant"]["Age"], 30.83);
        assert_eq!(json["decision_id"].as_str().unwrap().len(), 36);
        assert!(decision.approved());
    }
}
