use uuid::Uuid;

use crate::houses::HouseKey;

/// Live counts behind the House directory: active therapists and the active
/// patients assigned to them.
#[derive(Debug, Clone, Copy, Default)]
pub struct HouseBasics {
    pub therapists_count: i64,
    pub active_patients: i64,
}

/// Inputs to the adherence formula for one House: payments recorded in the
/// window and the current active-patient headcount.
#[derive(Debug, Clone, Copy)]
pub struct AdherenceCounts {
    pub payments: i64,
    pub active_patients: i64,
}

/// Completed-session volume for one House in a window.
#[derive(Debug, Clone, Copy)]
pub struct SessionCounts {
    pub completed_sessions: i64,
    pub distinct_patients: i64,
}

/// Sum and count of non-null quality scores for one House in a window.
#[derive(Debug, Clone, Copy)]
pub struct QualityCounts {
    pub quality_sum: f64,
    pub rated_assessments: i64,
}

/// Completed versus scheduled sessions for one House in a window.
#[derive(Debug, Clone, Copy)]
pub struct AttendanceCounts {
    pub completed: i64,
    pub scheduled: i64,
}

/// One assessment record as stored, before entry/exit classification.
/// `individual` doubles as the validity marker: records where it is null are
/// excluded from the clinical-delta computation.
#[derive(Debug, Clone)]
pub struct AssessmentRecord {
    pub patient_id: Uuid,
    pub house: HouseKey,
    pub moment: String,
    pub individual: Option<f64>,
    pub interpersonal: Option<f64>,
    pub social: Option<f64>,
    pub overall: Option<f64>,
}
