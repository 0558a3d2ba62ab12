//! Engineered feature derivation over a normalized batch.

use crate::config::EngagementWeights;
use crate::models::{FeatureRecord, StudentRecord};

/// TechScore component weights; fixed design constants.
const TECH_INTERNET_WEIGHT: f64 = 0.3;
const TECH_EDU_TECH_WEIGHT: f64 = 0.4;
const TECH_ONLINE_COURSES_WEIGHT: f64 = 0.3;

/// Batch-wide reference maxima used to scale activity ratios, each floored
/// at 1 so a uniformly-zero column cannot degenerate the scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceMaxima {
    pub study_hours: f64,
    pub assignment_completion: f64,
    pub discussions: f64,
    pub resources: f64,
}

impl ReferenceMaxima {
    /// Compute maxima over the whole batch.
    pub fn from_batch(records: &[StudentRecord]) -> Self {
        Self {
            study_hours: column_max(records, |r| r.study_hours),
            assignment_completion: column_max(records, |r| r.assignment_completion),
            discussions: column_max(records, |r| r.discussions),
            resources: column_max(records, |r| r.resources),
        }
    }
}

fn column_max(records: &[StudentRecord], get: impl Fn(&StudentRecord) -> Option<f64>) -> f64 {
    records
        .iter()
        .filter_map(get)
        .fold(f64::NEG_INFINITY, f64::max)
        .max(1.0)
}

/// Divide with a divisor substitution of 1 when the divisor is zero.
/// Numeric edge cases never error; the pipeline is total over any input.
fn safe_div(numerator: f64, divisor: f64) -> f64 {
    if divisor == 0.0 {
        numerator
    } else {
        numerator / divisor
    }
}

/// Derive the engineered feature set for a normalized batch.
///
/// Output ordering mirrors input ordering. Missing identity fields are
/// synthesized deterministically from the sequence index.
pub fn derive_features(
    records: &[StudentRecord],
    weights: &EngagementWeights,
) -> Vec<FeatureRecord> {
    let maxima = ReferenceMaxima::from_batch(records);

    records
        .iter()
        .enumerate()
        .map(|(index, record)| derive_one(record, index, &maxima, weights))
        .collect()
}

fn derive_one(
    record: &StudentRecord,
    index: usize,
    maxima: &ReferenceMaxima,
    weights: &EngagementWeights,
) -> FeatureRecord {
    let study_hours = record.study_hours.unwrap_or(0.0);
    let attendance = record.attendance.unwrap_or(0.0);
    let assignment_completion = record.assignment_completion.unwrap_or(0.0);
    let discussions = record.discussions.unwrap_or(0.0);
    let resources = record.resources.unwrap_or(0.0);
    let stress_level = record.stress_level.unwrap_or(0.0);

    let engagement_score = (study_hours / maxima.study_hours) * weights.study_hours_weight
        + (attendance / 100.0) * weights.attendance_weight
        + (assignment_completion / maxima.assignment_completion) * weights.assignment_weight
        + (discussions / maxima.discussions) * weights.discussion_weight
        + (resources / maxima.resources) * weights.resource_weight;

    let tech_score = record.internet.unwrap_or(0.0) * TECH_INTERNET_WEIGHT
        + record.edu_tech.unwrap_or(0.0) * TECH_EDU_TECH_WEIGHT
        + record.online_courses.unwrap_or(0.0) * TECH_ONLINE_COURSES_WEIGHT;

    let risk_score = ((100.0 - engagement_score) * 0.4
        + stress_level * 0.4
        + (100.0 - attendance) * 0.2)
        .clamp(0.0, 100.0);

    FeatureRecord {
        student_id: record
            .student_id
            .clone()
            .unwrap_or_else(|| format!("STU{:04}", index + 1)),
        name: record
            .name
            .clone()
            .unwrap_or_else(|| format!("Student {}", index + 1)),
        study_hours: record.study_hours,
        attendance: record.attendance,
        assignment_completion: record.assignment_completion,
        discussions: record.discussions,
        resources: record.resources,
        stress_level: record.stress_level,
        internet: record.internet,
        edu_tech: record.edu_tech,
        online_courses: record.online_courses,
        exam_score: record.exam_score,
        final_grade: record.final_grade,
        engagement_score,
        consistency: safe_div(study_hours, attendance),
        stress_impact: safe_div(stress_level, study_hours),
        tech_score,
        resource_usage: (resources + discussions + assignment_completion) / 3.0,
        study_efficiency: record.exam_score.map(|score| safe_div(score, study_hours)),
        attendance_impact: record.final_grade.map(|grade| safe_div(grade, attendance)),
        risk_score,
    }
}
