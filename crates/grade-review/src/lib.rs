//! Review and reconciliation of automated homework evaluations.
//!
//! A raw scoring result is normalized into an [`EvaluationDocument`], edited by a
//! grader, and exported into the bilingual payload accepted by the persistence sink.
//!
//! [`EvaluationDocument`]: workflows::grading::EvaluationDocument

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
