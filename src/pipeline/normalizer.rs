//! Raw record normalization: deduplication and missing-value imputation.

use crate::error::{AppError, Result};
use crate::models::StudentRecord;
use std::collections::{HashMap, HashSet};
use tracing::debug;

type FieldGetter = fn(&StudentRecord) -> Option<f64>;
type FieldSetter = fn(&mut StudentRecord, f64);

/// Numeric columns subject to median imputation, in schema order.
fn numeric_fields() -> [(&'static str, FieldGetter, FieldSetter); 11] {
    [
        ("StudyHours", |r| r.study_hours, |r, v| r.study_hours = Some(v)),
        ("Attendance", |r| r.attendance, |r, v| r.attendance = Some(v)),
        (
            "AssignmentCompletion",
            |r| r.assignment_completion,
            |r, v| r.assignment_completion = Some(v),
        ),
        ("Discussions", |r| r.discussions, |r, v| r.discussions = Some(v)),
        ("Resources", |r| r.resources, |r, v| r.resources = Some(v)),
        ("StressLevel", |r| r.stress_level, |r, v| r.stress_level = Some(v)),
        ("Internet", |r| r.internet, |r, v| r.internet = Some(v)),
        ("EduTech", |r| r.edu_tech, |r, v| r.edu_tech = Some(v)),
        (
            "OnlineCourses",
            |r| r.online_courses,
            |r, v| r.online_courses = Some(v),
        ),
        ("ExamScore", |r| r.exam_score, |r, v| r.exam_score = Some(v)),
        ("FinalGrade", |r| r.final_grade, |r, v| r.final_grade = Some(v)),
    ]
}

/// Normalize a raw batch: remove exact full-row duplicates, then impute
/// missing numeric values with the column median and missing categorical
/// values with the column mode.
///
/// Duplicates are removed before imputation so they do not bias the
/// statistics. A column with no observed value in the whole batch stays
/// absent; it is treated as not part of the source schema rather than
/// imputed from nothing. Runs over the whole batch before any statistic is
/// finalized.
pub fn normalize_batch(records: Vec<StudentRecord>) -> Result<Vec<StudentRecord>> {
    if records.is_empty() {
        return Err(AppError::DataUnavailable(
            "raw student batch is empty".to_string(),
        ));
    }

    let initial = records.len();

    // Exact full-row dedup, first occurrence wins, order preserved.
    let mut seen = HashSet::new();
    let mut batch: Vec<StudentRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.fingerprint()))
        .collect();

    let removed = initial - batch.len();
    if removed > 0 {
        debug!(duplicates_removed = removed, "Removed duplicate records");
    }

    for (column, get, set) in numeric_fields() {
        let observed: Vec<f64> = batch.iter().filter_map(get).collect();
        if observed.is_empty() {
            continue;
        }

        let column_median = median(&observed);
        let mut filled = 0usize;
        for record in batch.iter_mut() {
            if get(record).is_none() {
                set(record, column_median);
                filled += 1;
            }
        }
        if filled > 0 {
            debug!(column, filled, median = column_median, "Imputed missing values");
        }
    }

    // The only categorical column; student id is identity and is
    // synthesized downstream, never imputed.
    if let Some(name_mode) = mode(batch.iter().filter_map(|r| r.name.as_deref())) {
        for record in batch.iter_mut() {
            if record.name.is_none() {
                record.name = Some(name_mode.clone());
            }
        }
    }

    Ok(batch)
}

/// Median of a non-empty sample.
fn median(data: &[f64]) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    }
}

/// Most frequent value; ties broken lexicographically for determinism.
fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(value, _)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(study_hours: Option<f64>, attendance: Option<f64>) -> StudentRecord {
        StudentRecord {
            study_hours,
            attendance,
            assignment_completion: Some(50.0),
            discussions: Some(2.0),
            resources: Some(3.0),
            stress_level: Some(40.0),
            internet: Some(1.0),
            edu_tech: Some(0.0),
            online_courses: Some(1.0),
            exam_score: Some(60.0),
            final_grade: Some(65.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_batch_is_data_unavailable() {
        let err = normalize_batch(Vec::new()).unwrap_err();
        assert_eq!(err.error_code(), "DATA_UNAVAILABLE");
    }

    #[test]
    fn test_duplicates_removed_before_imputation() {
        // Three copies of the same row plus two distinct rows; the duplicate
        // must count once toward the median.
        let batch = vec![
            record(Some(10.0), Some(80.0)),
            record(Some(10.0), Some(80.0)),
            record(Some(10.0), Some(80.0)),
            record(Some(2.0), Some(80.0)),
            record(None, Some(80.0)),
        ];

        let normalized = normalize_batch(batch).unwrap();
        assert_eq!(normalized.len(), 3);

        // Median over the deduplicated {10, 2} is 6, not the duplicate-biased 10.
        assert_eq!(normalized[2].study_hours, Some(6.0));
    }

    #[test]
    fn test_median_imputation_odd_count() {
        let batch = vec![
            record(Some(4.0), Some(80.0)),
            record(Some(8.0), Some(70.0)),
            record(Some(12.0), Some(60.0)),
            record(None, Some(50.0)),
        ];

        let normalized = normalize_batch(batch).unwrap();
        assert_eq!(normalized[3].study_hours, Some(8.0));
    }

    #[test]
    fn test_zero_is_a_valid_observation_not_missing() {
        let batch = vec![record(Some(10.0), Some(0.0)), record(Some(4.0), Some(90.0))];

        let normalized = normalize_batch(batch).unwrap();
        // An observed 0 stays 0; only absent values are imputed.
        assert_eq!(normalized[0].attendance, Some(0.0));
    }

    #[test]
    fn test_fully_absent_column_stays_absent() {
        let mut a = record(Some(5.0), Some(70.0));
        let mut b = record(Some(7.0), Some(75.0));
        a.final_grade = None;
        b.final_grade = None;

        let normalized = normalize_batch(vec![a, b]).unwrap();
        assert!(normalized.iter().all(|r| r.final_grade.is_none()));
    }

    #[test]
    fn test_no_nulls_remain_in_observed_columns() {
        let batch = vec![
            record(None, None),
            record(Some(6.0), Some(88.0)),
            record(Some(2.0), Some(44.0)),
        ];

        let normalized = normalize_batch(batch).unwrap();
        assert!(normalized
            .iter()
            .all(|r| r.study_hours.is_some() && r.attendance.is_some()));
    }

    #[test]
    fn test_name_mode_imputation() {
        let mut a = record(Some(5.0), Some(70.0));
        let mut b = record(Some(6.0), Some(71.0));
        let mut c = record(Some(7.0), Some(72.0));
        a.name = Some("Ada".to_string());
        b.name = Some("Ada".to_string());
        c.name = None;

        let normalized = normalize_batch(vec![a, b, c]).unwrap();
        assert_eq!(normalized[2].name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_order_preserved() {
        let batch = vec![
            record(Some(1.0), Some(10.0)),
            record(Some(2.0), Some(20.0)),
            record(Some(3.0), Some(30.0)),
        ];

        let normalized = normalize_batch(batch).unwrap();
        let hours: Vec<f64> = normalized.iter().map(|r| r.study_hours.unwrap()).collect();
        assert_eq!(hours, vec![1.0, 2.0, 3.0]);
    }
}
