use std::collections::HashMap;

use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveTime};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::houses::HouseKey;
use crate::models::{
    AdherenceCounts, AssessmentRecord, AttendanceCounts, HouseBasics, QualityCounts, SessionCounts,
};

const RECOGNIZED_UNITS: &str = "('Prisma', 'Macondo', 'Marmoris')";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Active therapist and active patient headcounts per House. Houses with no
/// matching rows are simply absent here; the assembler fills in zeros.
pub async fn fetch_house_basics(pool: &PgPool) -> anyhow::Result<HashMap<HouseKey, HouseBasics>> {
    let rows = sqlx::query(&format!(
        "SELECT h.label AS house, \
                COUNT(DISTINCT t.id) AS therapists_count, \
                COUNT(DISTINCT p.id) AS active_patients \
         FROM arena.therapists t \
         JOIN arena.houses h ON t.house_id = h.id \
         LEFT JOIN arena.patients p ON p.therapist_id = t.id \
         WHERE t.is_active = TRUE \
           AND h.label IN {RECOGNIZED_UNITS} \
         GROUP BY h.label"
    ))
    .fetch_all(pool)
    .await
    .context("house basics query failed")?;

    let mut basics = HashMap::new();
    for row in rows {
        let label: String = row.get("house");
        if let Some(key) = HouseKey::from_unit_label(&label) {
            basics.insert(
                key,
                HouseBasics {
                    therapists_count: row.get("therapists_count"),
                    active_patients: row.get("active_patients"),
                },
            );
        }
    }
    Ok(basics)
}

/// Payments recorded in the window, paired with the current active-patient
/// headcount. The denominator is deliberately the live count, not a
/// point-in-time reconstruction.
pub async fn fetch_adherence_counts(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<HashMap<HouseKey, AdherenceCounts>> {
    let rows = sqlx::query(&format!(
        "WITH active_patients AS ( \
             SELECT h.label AS house, COUNT(DISTINCT p.id) AS total_patients \
             FROM arena.patients p \
             JOIN arena.therapists t ON p.therapist_id = t.id \
             JOIN arena.houses h ON t.house_id = h.id \
             WHERE t.is_active = TRUE \
               AND h.label IN {RECOGNIZED_UNITS} \
             GROUP BY h.label \
         ), \
         period_payments AS ( \
             SELECT h.label AS house, COUNT(DISTINCT pay.id) AS total_payments \
             FROM arena.payments pay \
             JOIN arena.therapists t ON pay.therapist_id = t.id \
             JOIN arena.houses h ON t.house_id = h.id \
             WHERE t.is_active = TRUE \
               AND pay.paid_at >= $1 \
               AND pay.paid_at <= $2 \
               AND h.label IN {RECOGNIZED_UNITS} \
             GROUP BY h.label \
         ) \
         SELECT ap.house, \
                ap.total_patients, \
                COALESCE(pp.total_payments, 0) AS total_payments \
         FROM active_patients ap \
         LEFT JOIN period_payments pp ON pp.house = ap.house"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("adherence query failed")?;

    let mut counts = HashMap::new();
    for row in rows {
        let label: String = row.get("house");
        if let Some(key) = HouseKey::from_unit_label(&label) {
            counts.insert(
                key,
                AdherenceCounts {
                    payments: row.get("total_payments"),
                    active_patients: row.get("total_patients"),
                },
            );
        }
    }
    Ok(counts)
}

/// Completed sessions and distinct patients seen in the window.
pub async fn fetch_session_counts(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<HashMap<HouseKey, SessionCounts>> {
    let rows = sqlx::query(&format!(
        "SELECT h.label AS house, \
                COUNT(s.id) AS completed_sessions, \
                COUNT(DISTINCT s.patient_id) AS distinct_patients \
         FROM arena.sessions s \
         JOIN arena.therapists t ON s.therapist_id = t.id \
         JOIN arena.houses h ON t.house_id = h.id \
         WHERE s.completed = TRUE \
           AND t.is_active = TRUE \
           AND s.session_date >= $1 \
           AND s.session_date <= $2 \
           AND h.label IN {RECOGNIZED_UNITS} \
         GROUP BY h.label"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("sessions query failed")?;

    let mut counts = HashMap::new();
    for row in rows {
        let label: String = row.get("house");
        if let Some(key) = HouseKey::from_unit_label(&label) {
            counts.insert(
                key,
                SessionCounts {
                    completed_sessions: row.get("completed_sessions"),
                    distinct_patients: row.get("distinct_patients"),
                },
            );
        }
    }
    Ok(counts)
}

/// Sum and count of non-null quality scores for assessments created in the
/// window. The creation timestamp filter is half-open on the end so the full
/// final day is included.
pub async fn fetch_quality_counts(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<HashMap<HouseKey, QualityCounts>> {
    let start_ts = start.and_time(NaiveTime::MIN);
    let end_exclusive = (end + Duration::days(1)).and_time(NaiveTime::MIN);

    let rows = sqlx::query(&format!(
        "SELECT h.label AS house, \
                COALESCE(SUM(a.overall_quality), 0) AS quality_sum, \
                COUNT(a.id) AS rated_assessments \
         FROM arena.assessments a \
         JOIN arena.therapists t ON a.therapist_id = t.id \
         JOIN arena.houses h ON t.house_id = h.id \
         WHERE a.overall_quality IS NOT NULL \
           AND t.is_active = TRUE \
           AND a.created_at >= $1 \
           AND a.created_at < $2 \
           AND h.label IN {RECOGNIZED_UNITS} \
         GROUP BY h.label"
    ))
    .bind(start_ts)
    .bind(end_exclusive)
    .fetch_all(pool)
    .await
    .context("quality query failed")?;

    let mut counts = HashMap::new();
    for row in rows {
        let label: String = row.get("house");
        if let Some(key) = HouseKey::from_unit_label(&label) {
            counts.insert(
                key,
                QualityCounts {
                    quality_sum: row.get("quality_sum"),
                    rated_assessments: row.get("rated_assessments"),
                },
            );
        }
    }
    Ok(counts)
}

/// Completed versus scheduled sessions in the window. The end date is
/// clamped to `today` so future-scheduled sessions never inflate the
/// denominator.
pub async fn fetch_attendance_counts(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> anyhow::Result<HashMap<HouseKey, AttendanceCounts>> {
    let effective_end = end.min(today);

    let rows = sqlx::query(&format!(
        "SELECT h.label AS house, \
                COUNT(s.id) FILTER (WHERE s.completed) AS completed, \
                COUNT(s.id) AS scheduled \
         FROM arena.sessions s \
         JOIN arena.therapists t ON s.therapist_id = t.id \
         JOIN arena.houses h ON t.house_id = h.id \
         WHERE t.is_active = TRUE \
           AND s.session_date >= $1 \
           AND s.session_date <= $2 \
           AND h.label IN {RECOGNIZED_UNITS} \
         GROUP BY h.label"
    ))
    .bind(start)
    .bind(effective_end)
    .fetch_all(pool)
    .await
    .context("attendance query failed")?;

    let mut counts = HashMap::new();
    for row in rows {
        let label: String = row.get("house");
        if let Some(key) = HouseKey::from_unit_label(&label) {
            counts.insert(
                key,
                AttendanceCounts {
                    completed: row.get("completed"),
                    scheduled: row.get("scheduled"),
                },
            );
        }
    }
    Ok(counts)
}

/// All assessment records, unscoped by date: entry/exit cycles straddle
/// arbitrary time, so the clinical-delta computation always sees full
/// history. Classification and pairing happen in `kpi::clinical_delta`.
pub async fn fetch_assessments(pool: &PgPool) -> anyhow::Result<Vec<AssessmentRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT a.patient_id, h.label AS house, a.moment, \
                a.individual, a.interpersonal, a.social, a.overall \
         FROM arena.assessments a \
         JOIN arena.therapists t ON a.therapist_id = t.id \
         JOIN arena.houses h ON t.house_id = h.id \
         WHERE t.is_active = TRUE \
           AND h.label IN {RECOGNIZED_UNITS}"
    ))
    .fetch_all(pool)
    .await
    .context("assessments query failed")?;

    let mut records = Vec::new();
    for row in rows {
        let label: String = row.get("house");
        let Some(house) = HouseKey::from_unit_label(&label) else {
            continue;
        };
        records.push(AssessmentRecord {
            patient_id: row.get("patient_id"),
            house,
            moment: row.get("moment"),
            individual: row.get("individual"),
            interpersonal: row.get("interpersonal"),
            social: row.get("social"),
            overall: row.get("overall"),
        });
    }
    Ok(records)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let houses = vec![
        ("7f1c2a90-1d4e-4b6a-9f3c-aa01b5e0c101", "Prisma"),
        ("7f1c2a90-1d4e-4b6a-9f3c-aa01b5e0c102", "Macondo"),
        ("7f1c2a90-1d4e-4b6a-9f3c-aa01b5e0c103", "Marmoris"),
        // Unit outside the recognized set; the extractors must ignore it.
        ("7f1c2a90-1d4e-4b6a-9f3c-aa01b5e0c104", "Integração"),
    ];

    for (id, label) in &houses {
        sqlx::query(
            "INSERT INTO arena.houses (id, label) VALUES ($1, $2) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(Uuid::parse_str(id)?)
        .bind(label)
        .execute(pool)
        .await?;
    }

    let therapists = vec![
        (
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9001",
            "Diogo Ferraz",
            "7f1c2a90-1d4e-4b6a-9f3c-aa01b5e0c101",
            true,
        ),
        (
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9002",
            "Marina Sales",
            "7f1c2a90-1d4e-4b6a-9f3c-aa01b5e0c101",
            true,
        ),
        (
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9003",
            "Flávia Monte",
            "7f1c2a90-1d4e-4b6a-9f3c-aa01b5e0c102",
            true,
        ),
        (
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9004",
            "Caio Brandão",
            "7f1c2a90-1d4e-4b6a-9f3c-aa01b5e0c102",
            false,
        ),
        (
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9005",
            "Alice Guedon",
            "7f1c2a90-1d4e-4b6a-9f3c-aa01b5e0c103",
            true,
        ),
        (
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9006",
            "Rui Tavares",
            "7f1c2a90-1d4e-4b6a-9f3c-aa01b5e0c104",
            true,
        ),
    ];

    for (id, name, house_id, is_active) in &therapists {
        sqlx::query(
            "INSERT INTO arena.therapists (id, full_name, house_id, is_active) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(Uuid::parse_str(id)?)
        .bind(name)
        .bind(Uuid::parse_str(house_id)?)
        .bind(is_active)
        .execute(pool)
        .await?;
    }

    let patients = vec![
        (
            "c4b2e1f0-0002-4d9a-8b32-6a7e8f9b0001",
            "Helena Prado",
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9001",
        ),
        (
            "c4b2e1f0-0002-4d9a-8b32-6a7e8f9b0002",
            "Otávio Lins",
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9002",
        ),
        (
            "c4b2e1f0-0002-4d9a-8b32-6a7e8f9b0003",
            "Beatriz Camargo",
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9003",
        ),
        (
            "c4b2e1f0-0002-4d9a-8b32-6a7e8f9b0004",
            "Samuel Rocha",
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9003",
        ),
        (
            "c4b2e1f0-0002-4d9a-8b32-6a7e8f9b0005",
            "Clara Nascimento",
            "b3a1d0e0-0001-4c8f-9a21-5f6d7e8a9005",
        ),
    ];

    for (id, name, therapist_id) in &patients {
        sqlx::query(
            "INSERT INTO arena.patients (id, full_name, therapist_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(Uuid::parse_str(id)?)
        .bind(name)
        .bind(Uuid::parse_str(therapist_id)?)
        .execute(pool)
        .await?;
    }

    let sessions = vec![
        ("d5c3f2a1-0003-4eab-9c43-7b8f9a0c0001", 0usize, 0usize, (2026, 2, 3), true),
        ("d5c3f2a1-0003-4eab-9c43-7b8f9a0c0002", 0, 0, (2026, 2, 10), true),
        ("d5c3f2a1-0003-4eab-9c43-7b8f9a0c0003", 0, 0, (2026, 2, 17), false),
        ("d5c3f2a1-0003-4eab-9c43-7b8f9a0c0004", 1, 1, (2026, 2, 5), true),
        ("d5c3f2a1-0003-4eab-9c43-7b8f9a0c0005", 2, 2, (2026, 2, 4), true),
        ("d5c3f2a1-0003-4eab-9c43-7b8f9a0c0006", 2, 3, (2026, 2, 11), true),
        ("d5c3f2a1-0003-4eab-9c43-7b8f9a0c0007", 2, 3, (2026, 2, 18), false),
        ("d5c3f2a1-0003-4eab-9c43-7b8f9a0c0008", 4, 4, (2026, 1, 20), true),
        ("d5c3f2a1-0003-4eab-9c43-7b8f9a0c0009", 4, 4, (2026, 2, 6), true),
        ("d5c3f2a1-0003-4eab-9c43-7b8f9a0c0010", 4, 4, (2026, 2, 20), true),
    ];

    for (id, therapist_idx, patient_idx, (y, m, d), completed) in &sessions {
        sqlx::query(
            "INSERT INTO arena.sessions (id, therapist_id, patient_id, session_date, completed) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(Uuid::parse_str(id)?)
        .bind(Uuid::parse_str(therapists[*therapist_idx].0)?)
        .bind(Uuid::parse_str(patients[*patient_idx].0)?)
        .bind(NaiveDate::from_ymd_opt(*y, *m, *d).context("invalid seed date")?)
        .bind(completed)
        .execute(pool)
        .await?;
    }

    let payments = vec![
        ("e6d4a3b2-0004-4fbc-8d54-8c9a0b1d0001", 0usize, (2026, 2, 1)),
        ("e6d4a3b2-0004-4fbc-8d54-8c9a0b1d0002", 1, (2026, 2, 2)),
        ("e6d4a3b2-0004-4fbc-8d54-8c9a0b1d0003", 2, (2026, 2, 5)),
        ("e6d4a3b2-0004-4fbc-8d54-8c9a0b1d0004", 2, (2026, 1, 8)),
        ("e6d4a3b2-0004-4fbc-8d54-8c9a0b1d0005", 4, (2026, 2, 3)),
        ("e6d4a3b2-0004-4fbc-8d54-8c9a0b1d0006", 4, (2025, 12, 28)),
    ];

    for (id, therapist_idx, (y, m, d)) in &payments {
        sqlx::query(
            "INSERT INTO arena.payments (id, therapist_id, paid_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(Uuid::parse_str(id)?)
        .bind(Uuid::parse_str(therapists[*therapist_idx].0)?)
        .bind(NaiveDate::from_ymd_opt(*y, *m, *d).context("invalid seed date")?)
        .execute(pool)
        .await?;
    }

    // (therapist, patient, moment, overall_quality, four ORS sub-dimensions,
    // created_at). Moments are free text on purpose.
    let assessments = vec![
        (
            "f7e5b4c3-0005-40cd-9e65-9d0b1c2e0001",
            0usize,
            0usize,
            "Entrada",
            Some(7.5),
            [Some(2.0), Some(3.0), Some(1.0), Some(4.0)],
            (2025, 12, 10),
        ),
        (
            "f7e5b4c3-0005-40cd-9e65-9d0b1c2e0002",
            0,
            0,
            "Saída",
            Some(8.5),
            [Some(5.0), Some(5.0), Some(5.0), Some(5.0)],
            (2026, 2, 12),
        ),
        (
            "f7e5b4c3-0005-40cd-9e65-9d0b1c2e0003",
            2,
            2,
            "entrada (primeira sessão)",
            Some(6.0),
            [Some(3.0), Some(2.5), Some(3.0), Some(2.0)],
            (2026, 1, 9),
        ),
        (
            "f7e5b4c3-0005-40cd-9e65-9d0b1c2e0004",
            2,
            3,
            "Acompanhamento",
            Some(8.0),
            [Some(4.0), Some(4.0), Some(4.0), Some(4.0)],
            (2026, 2, 6),
        ),
        (
            "f7e5b4c3-0005-40cd-9e65-9d0b1c2e0005",
            4,
            4,
            "ENTRADA",
            None,
            [Some(4.0), Some(3.0), Some(3.5), Some(3.0)],
            (2025, 12, 15),
        ),
        (
            "f7e5b4c3-0005-40cd-9e65-9d0b1c2e0006",
            4,
            4,
            "saida",
            Some(9.0),
            [Some(7.0), Some(6.5), Some(7.0), Some(7.5)],
            (2026, 2, 19),
        ),
    ];

    for (id, therapist_idx, patient_idx, moment, quality, scores, (y, m, d)) in &assessments {
        let created_at = NaiveDate::from_ymd_opt(*y, *m, *d)
            .context("invalid seed date")?
            .and_hms_opt(10, 0, 0)
            .context("invalid seed time")?;
        sqlx::query(
            "INSERT INTO arena.assessments \
             (id, therapist_id, patient_id, moment, overall_quality, \
              individual, interpersonal, social, overall, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(Uuid::parse_str(id)?)
        .bind(Uuid::parse_str(therapists[*therapist_idx].0)?)
        .bind(Uuid::parse_str(patients[*patient_idx].0)?)
        .bind(moment)
        .bind(quality)
        .bind(scores[0])
        .bind(scores[1])
        .bind(scores[2])
        .bind(scores[3])
        .bind(created_at)
        .execute(pool)
        .await?;
    }

    Ok(())
}
