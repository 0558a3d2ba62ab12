use crate::error::FaultInfo;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Canonical column names of the student schema.
///
/// Feature vectors are positional: the ordered name list recorded at training
/// time is replayed through [`FeatureRecord::feature`] at inference time, so
/// these strings are part of the persisted artifact contract.
pub mod names {
    pub const STUDY_HOURS: &str = "StudyHours";
    pub const ATTENDANCE: &str = "Attendance";
    pub const ASSIGNMENT_COMPLETION: &str = "AssignmentCompletion";
    pub const DISCUSSIONS: &str = "Discussions";
    pub const RESOURCES: &str = "Resources";
    pub const STRESS_LEVEL: &str = "StressLevel";
    pub const INTERNET: &str = "Internet";
    pub const EDU_TECH: &str = "EduTech";
    pub const ONLINE_COURSES: &str = "OnlineCourses";
    pub const EXAM_SCORE: &str = "ExamScore";
    pub const FINAL_GRADE: &str = "FinalGrade";
    pub const ENGAGEMENT_SCORE: &str = "EngagementScore";
    pub const RISK_SCORE: &str = "RiskScore";
    pub const CONSISTENCY: &str = "Consistency";
    pub const STRESS_IMPACT: &str = "StressImpact";
    pub const TECH_SCORE: &str = "TechScore";
    pub const RESOURCE_USAGE: &str = "ResourceUsage";
    pub const STUDY_EFFICIENCY: &str = "StudyEfficiency";
    pub const ATTENDANCE_IMPACT: &str = "AttendanceImpact";
}

/// One row of unprocessed student behavior/academic data.
///
/// Numeric fields are `None` when the value is missing in the source; a
/// column absent from the whole batch stays `None` after normalization and is
/// treated as not part of the source schema. A present `0.0` is a valid
/// observation and is never re-imputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct StudentRecord {
    /// Student identifier; synthesized downstream when absent
    #[serde(rename = "StudentID", skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Weekly study hours
    pub study_hours: Option<f64>,

    /// Attendance percentage (0-100)
    pub attendance: Option<f64>,

    /// Assignment completion percentage
    pub assignment_completion: Option<f64>,

    /// Discussion participation count
    pub discussions: Option<f64>,

    /// Learning resource access count
    pub resources: Option<f64>,

    /// Self-reported stress level (0-100)
    pub stress_level: Option<f64>,

    /// Internet access indicator (0/1)
    pub internet: Option<f64>,

    /// Educational technology usage indicator (0/1 or normalized 0-1)
    pub edu_tech: Option<f64>,

    /// Online course usage indicator (0/1 or normalized 0-1)
    pub online_courses: Option<f64>,

    /// Exam score
    pub exam_score: Option<f64>,

    /// Final grade
    pub final_grade: Option<f64>,
}

impl StudentRecord {
    /// Content fingerprint used for exact full-row deduplication
    pub fn fingerprint(&self) -> String {
        // Canonical JSON keeps field order stable across identical rows.
        let canonical = serde_json::to_string(self).unwrap_or_default();
        let digest = Sha256::digest(canonical.as_bytes());
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// A student record extended with derived numeric signals.
///
/// Immutable once produced; the unit persisted to the backing store and
/// consumed by both training and inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeatureRecord {
    /// Unique student identifier (`STU` + zero-padded sequence when synthesized)
    #[serde(rename = "StudentID")]
    pub student_id: String,

    /// Display name
    pub name: String,

    pub study_hours: Option<f64>,
    pub attendance: Option<f64>,
    pub assignment_completion: Option<f64>,
    pub discussions: Option<f64>,
    pub resources: Option<f64>,
    pub stress_level: Option<f64>,
    pub internet: Option<f64>,
    pub edu_tech: Option<f64>,
    pub online_courses: Option<f64>,
    pub exam_score: Option<f64>,
    pub final_grade: Option<f64>,

    /// Weighted 0-100 composite of study, attendance, assignment,
    /// discussion, and resource activity
    pub engagement_score: f64,

    /// Study hours per attendance percentage point
    pub consistency: f64,

    /// Stress level per study hour
    pub stress_impact: f64,

    /// Combined technology usage score (0-1)
    pub tech_score: f64,

    /// Mean of resources, discussions, and assignment completion
    pub resource_usage: f64,

    /// Exam score per study hour; absent when the exam column is absent
    pub study_efficiency: Option<f64>,

    /// Final grade per attendance percentage point; absent when the grade
    /// column is absent
    pub attendance_impact: Option<f64>,

    /// 0-100 heuristic combining inverse engagement, stress, and inverse
    /// attendance, independent of the learned model
    pub risk_score: f64,
}

impl FeatureRecord {
    /// Name-keyed feature lookup backing the positional vector contract.
    ///
    /// Returns `None` for a column absent from this record's source schema
    /// and for unknown names.
    pub fn feature(&self, name: &str) -> Option<f64> {
        match name {
            names::STUDY_HOURS => self.study_hours,
            names::ATTENDANCE => self.attendance,
            names::ASSIGNMENT_COMPLETION => self.assignment_completion,
            names::DISCUSSIONS => self.discussions,
            names::RESOURCES => self.resources,
            names::STRESS_LEVEL => self.stress_level,
            names::INTERNET => self.internet,
            names::EDU_TECH => self.edu_tech,
            names::ONLINE_COURSES => self.online_courses,
            names::EXAM_SCORE => self.exam_score,
            names::FINAL_GRADE => self.final_grade,
            names::ENGAGEMENT_SCORE => Some(self.engagement_score),
            names::RISK_SCORE => Some(self.risk_score),
            names::CONSISTENCY => Some(self.consistency),
            names::STRESS_IMPACT => Some(self.stress_impact),
            names::TECH_SCORE => Some(self.tech_score),
            names::RESOURCE_USAGE => Some(self.resource_usage),
            names::STUDY_EFFICIENCY => self.study_efficiency,
            names::ATTENDANCE_IMPACT => self.attendance_impact,
            _ => None,
        }
    }
}

/// Coarse risk band attached to a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskBand::Low => write!(f, "low"),
            RiskBand::Medium => write!(f, "medium"),
            RiskBand::High => write!(f, "high"),
        }
    }
}

/// Leveled verdict of the risk assessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Outcome of a single completion prediction. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Student identifier
    pub student_id: String,

    /// Arg-max class verdict
    pub will_complete: bool,

    /// Probability of the will-complete class, 0-100
    pub completion_likelihood: f64,

    /// Maximum class probability, 0-100
    pub confidence: f64,

    /// Coarse band derived from the likelihood
    pub risk_band: RiskBand,
}

/// Per-item entry of a batch prediction; lookup misses become faults
/// rather than aborting the batch
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchPredictionEntry {
    Prediction(PredictionResult),
    Fault {
        student_id: String,
        #[serde(flatten)]
        fault: FaultInfo,
    },
}

impl BatchPredictionEntry {
    pub fn is_fault(&self) -> bool {
        matches!(self, BatchPredictionEntry::Fault { .. })
    }
}

/// Outcome of a risk assessment. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Student identifier
    pub student_id: String,

    /// Leveled verdict from the decision table
    pub risk_level: RiskLevel,

    /// Stored heuristic risk score, 0-100
    pub risk_score: f64,

    /// Completion likelihood from the predictor, 0-100
    pub completion_likelihood: f64,

    /// Labels of the triggered risk conditions, in evaluation order
    pub risk_factors: Vec<String>,

    /// Level-keyed action strings
    pub recommendations: Vec<String>,
}
