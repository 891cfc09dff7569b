use std::collections::HashMap;

use uuid::Uuid;

use crate::houses::HouseKey;
use crate::models::{
    AdherenceCounts, AssessmentRecord, AttendanceCounts, QualityCounts, SessionCounts,
};

/// All KPIs are reported with one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Payments per active patient, normalized by the number of months in the
/// window so the accumulated period stays on a monthly scale. Percentage,
/// clamped to 100. A House with no active patients scores 0.
pub fn adherence_rate(counts: AdherenceCounts, month_count: u32) -> f64 {
    let denominator = counts.active_patients * month_count.max(1) as i64;
    if denominator <= 0 {
        return 0.0;
    }
    let rate = counts.payments as f64 / denominator as f64 * 100.0;
    round1(rate.min(100.0))
}

/// Mean completed sessions per patient seen at least once in the window.
pub fn sessions_per_patient(counts: SessionCounts) -> f64 {
    if counts.distinct_patients <= 0 {
        return 0.0;
    }
    round1(counts.completed_sessions as f64 / counts.distinct_patients as f64)
}

/// Mean of the 0-10 overall quality score across rated assessments.
pub fn quality_score(counts: QualityCounts) -> f64 {
    if counts.rated_assessments <= 0 {
        return 0.0;
    }
    round1(counts.quality_sum / counts.rated_assessments as f64)
}

/// Share of scheduled sessions that actually happened, as a percentage.
pub fn attendance_rate(counts: AttendanceCounts) -> f64 {
    if counts.scheduled <= 0 {
        return 0.0;
    }
    round1(counts.completed as f64 / counts.scheduled as f64 * 100.0)
}

/// The `moment` field is free user-entered text; the upstream data is
/// uncontrolled, so matching is a deliberately loose substring check on the
/// trimmed, lowercased value. A single record can qualify as both.
pub fn is_entry_moment(moment: &str) -> bool {
    moment.trim().to_lowercase().contains("entrada")
}

pub fn is_exit_moment(moment: &str) -> bool {
    let moment = moment.trim().to_lowercase();
    moment.contains("saída") || moment.contains("saida")
}

/// ORS total: the four sub-dimensions summed with nulls as zero. Callers
/// must already have excluded records with a null `individual` field.
fn ors_score(record: &AssessmentRecord) -> f64 {
    record.individual.unwrap_or(0.0)
        + record.interpersonal.unwrap_or(0.0)
        + record.social.unwrap_or(0.0)
        + record.overall.unwrap_or(0.0)
}

/// Mean ORS improvement (exit minus entry) per House, over all history.
///
/// Only patients with both an entry and an exit assessment contribute; every
/// (entry, exit) pair for a patient counts once, attributed to the entry
/// record's House. Deliberately not period-scoped: an entry/exit cycle may
/// straddle arbitrary time, so filtering by month would drop valid cycles.
pub fn clinical_delta(records: &[AssessmentRecord]) -> HashMap<HouseKey, f64> {
    let mut entries: HashMap<Uuid, Vec<(HouseKey, f64)>> = HashMap::new();
    let mut exits: HashMap<Uuid, Vec<f64>> = HashMap::new();

    for record in records {
        if record.individual.is_none() {
            continue;
        }
        let score = ors_score(record);
        if is_entry_moment(&record.moment) {
            entries
                .entry(record.patient_id)
                .or_default()
                .push((record.house, score));
        }
        if is_exit_moment(&record.moment) {
            exits.entry(record.patient_id).or_default().push(score);
        }
    }

    let mut sums: HashMap<HouseKey, (f64, i64)> = HashMap::new();
    for (patient_id, patient_entries) in &entries {
        let Some(patient_exits) = exits.get(patient_id) else {
            continue;
        };
        for (house, entry_score) in patient_entries {
            for exit_score in patient_exits {
                let slot = sums.entry(*house).or_insert((0.0, 0));
                slot.0 += exit_score - entry_score;
                slot.1 += 1;
            }
        }
    }

    sums.into_iter()
        .map(|(house, (total, pairs))| (house, round1(total / pairs as f64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessment(
        patient_id: Uuid,
        house: HouseKey,
        moment: &str,
        scores: [Option<f64>; 4],
    ) -> AssessmentRecord {
        AssessmentRecord {
            patient_id,
            house,
            moment: moment.to_string(),
            individual: scores[0],
            interpersonal: scores[1],
            social: scores[2],
            overall: scores[3],
        }
    }

    #[test]
    fn adherence_normalizes_by_month_count() {
        // 30 payments over 3 months for 20 patients: half a payment
        // per patient-month.
        let counts = AdherenceCounts {
            payments: 30,
            active_patients: 20,
        };
        assert_eq!(adherence_rate(counts, 3), 50.0);
        assert_eq!(adherence_rate(counts, 1), 100.0);
    }

    #[test]
    fn adherence_is_clamped_to_one_hundred() {
        let counts = AdherenceCounts {
            payments: 45,
            active_patients: 20,
        };
        assert_eq!(adherence_rate(counts, 1), 100.0);
    }

    #[test]
    fn adherence_with_no_patients_is_zero() {
        let counts = AdherenceCounts {
            payments: 0,
            active_patients: 0,
        };
        assert_eq!(adherence_rate(counts, 1), 0.0);
        assert_eq!(adherence_rate(counts, 3), 0.0);
    }

    #[test]
    fn sessions_per_patient_averages_over_seen_patients() {
        let counts = SessionCounts {
            completed_sessions: 17,
            distinct_patients: 5,
        };
        assert_eq!(sessions_per_patient(counts), 3.4);
        assert_eq!(
            sessions_per_patient(SessionCounts {
                completed_sessions: 0,
                distinct_patients: 0,
            }),
            0.0
        );
    }

    #[test]
    fn quality_score_is_mean_of_rated_assessments() {
        let counts = QualityCounts {
            quality_sum: 41.0,
            rated_assessments: 5,
        };
        assert_eq!(quality_score(counts), 8.2);
        assert_eq!(
            quality_score(QualityCounts {
                quality_sum: 0.0,
                rated_assessments: 0,
            }),
            0.0
        );
    }

    #[test]
    fn attendance_seven_of_ten_is_seventy() {
        let counts = AttendanceCounts {
            completed: 7,
            scheduled: 10,
        };
        assert_eq!(attendance_rate(counts), 70.0);
    }

    #[test]
    fn attendance_with_nothing_scheduled_is_zero() {
        let counts = AttendanceCounts {
            completed: 0,
            scheduled: 0,
        };
        assert_eq!(attendance_rate(counts), 0.0);
    }

    #[test]
    fn moment_matching_trims_and_ignores_case() {
        assert!(is_entry_moment("Entrada"));
        assert!(is_entry_moment("  entrada (primeira sessão)  "));
        assert!(is_exit_moment("Saída"));
        assert!(is_exit_moment("SAIDA"));
        assert!(is_exit_moment(" avaliação de saída "));
        assert!(!is_entry_moment("acompanhamento"));
        assert!(!is_exit_moment("entrada"));
    }

    #[test]
    fn clinical_delta_pairs_entry_and_exit_by_patient() {
        let patient = Uuid::new_v4();
        let records = vec![
            assessment(
                patient,
                HouseKey::Prisma,
                "Entrada",
                [Some(2.0), Some(3.0), Some(1.0), Some(4.0)],
            ),
            assessment(
                patient,
                HouseKey::Prisma,
                "Saída",
                [Some(5.0), Some(5.0), Some(5.0), Some(5.0)],
            ),
        ];
        let deltas = clinical_delta(&records);
        assert_eq!(deltas.get(&HouseKey::Prisma), Some(&10.0));
    }

    #[test]
    fn clinical_delta_skips_patients_without_complete_cycle() {
        let records = vec![
            assessment(
                Uuid::new_v4(),
                HouseKey::Macondo,
                "entrada",
                [Some(3.0), Some(3.0), Some(3.0), Some(3.0)],
            ),
            assessment(
                Uuid::new_v4(),
                HouseKey::Macondo,
                "saida",
                [Some(8.0), Some(8.0), Some(8.0), Some(8.0)],
            ),
        ];
        assert!(clinical_delta(&records).is_empty());
    }

    #[test]
    fn clinical_delta_excludes_records_missing_first_subdimension() {
        let patient = Uuid::new_v4();
        let records = vec![
            assessment(
                patient,
                HouseKey::Marmoris,
                "entrada",
                [None, Some(9.0), Some(9.0), Some(9.0)],
            ),
            assessment(
                patient,
                HouseKey::Marmoris,
                "saida",
                [Some(5.0), Some(5.0), Some(5.0), Some(5.0)],
            ),
        ];
        assert!(clinical_delta(&records).is_empty());
    }

    #[test]
    fn clinical_delta_treats_null_subdimensions_as_zero() {
        let patient = Uuid::new_v4();
        let records = vec![
            assessment(
                patient,
                HouseKey::Prisma,
                "entrada",
                [Some(2.0), None, None, Some(3.0)],
            ),
            assessment(
                patient,
                HouseKey::Prisma,
                "saida",
                [Some(4.0), Some(4.0), None, None],
            ),
        ];
        let deltas = clinical_delta(&records);
        // entry 5, exit 8
        assert_eq!(deltas.get(&HouseKey::Prisma), Some(&3.0));
    }

    #[test]
    fn clinical_delta_averages_across_patients_per_house() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let records = vec![
            assessment(first, HouseKey::Macondo, "entrada", [Some(10.0), None, None, None]),
            assessment(first, HouseKey::Macondo, "saida", [Some(16.0), None, None, None]),
            assessment(second, HouseKey::Macondo, "entrada", [Some(12.0), None, None, None]),
            assessment(second, HouseKey::Macondo, "saida", [Some(15.0), None, None, None]),
        ];
        let deltas = clinical_delta(&records);
        assert_eq!(deltas.get(&HouseKey::Macondo), Some(&4.5));
    }
}
