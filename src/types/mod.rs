//! Type definitions for the approval demo

pub mod applicant;
pub mod decision;

pub use applicant::{Applicant, FeatureValue};
pub use decision::{Decision, Prediction, Verdict};
