use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::houses::{house_info, HouseKey};
use crate::models::HouseBasics;
use crate::period::Period;

/// One House in the output: static identity plus live counts.
#[derive(Debug, Clone, Serialize)]
pub struct HouseEntry {
    pub name: &'static str,
    pub leader: &'static str,
    pub sensibility: &'static str,
    pub motto: &'static str,
    pub therapists_count: i64,
    pub active_patients: i64,
}

/// The houses section. Fixed fields rather than a map: the closed House set
/// is part of the output contract, so a missing key is unrepresentable.
#[derive(Debug, Clone, Serialize)]
pub struct Houses {
    pub prisma: HouseEntry,
    pub macondo: HouseEntry,
    pub marmoris: HouseEntry,
}

/// One KPI cell row: the value for every House, absent Houses defaulted to 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HouseValues {
    pub prisma: f64,
    pub macondo: f64,
    pub marmoris: f64,
}

impl HouseValues {
    pub fn from_map(values: &HashMap<HouseKey, f64>) -> Self {
        HouseValues {
            prisma: values.get(&HouseKey::Prisma).copied().unwrap_or(0.0),
            macondo: values.get(&HouseKey::Macondo).copied().unwrap_or(0.0),
            marmoris: values.get(&HouseKey::Marmoris).copied().unwrap_or(0.0),
        }
    }
}

/// The five KPIs of one period, keyed as the dashboard expects them.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Kpis {
    pub adimplencia: HouseValues,
    pub sessoes_paciente: HouseValues,
    pub qualidade: HouseValues,
    pub comparecimento: HouseValues,
    pub evolucao_ors: HouseValues,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodSection {
    pub label: String,
    pub kpis: Kpis,
}

#[derive(Debug, Clone, Serialize)]
pub struct Periods {
    pub current: PeriodSection,
    pub accumulated: PeriodSection,
}

/// The snapshot document consumed by the dashboard. Rebuilt from scratch on
/// every run; only `updated_at` varies between runs over unchanged data.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub updated_at: NaiveDateTime,
    pub houses: Houses,
    pub periods: Periods,
}

/// Per-period KPI maps as produced by the extractors, before defaulting.
pub struct PeriodKpis {
    pub adimplencia: HashMap<HouseKey, f64>,
    pub sessoes_paciente: HashMap<HouseKey, f64>,
    pub qualidade: HashMap<HouseKey, f64>,
    pub comparecimento: HashMap<HouseKey, f64>,
}

fn house_entry(key: HouseKey, basics: &HashMap<HouseKey, HouseBasics>) -> HouseEntry {
    let info = house_info(key);
    let counts = basics.get(&key).copied().unwrap_or_default();
    HouseEntry {
        name: info.name,
        leader: info.leader,
        sensibility: info.sensibility,
        motto: info.motto,
        therapists_count: counts.therapists_count,
        active_patients: counts.active_patients,
    }
}

fn period_section(period: &Period, kpis: &PeriodKpis, evolucao_ors: HouseValues) -> PeriodSection {
    PeriodSection {
        label: period.label.clone(),
        kpis: Kpis {
            adimplencia: HouseValues::from_map(&kpis.adimplencia),
            sessoes_paciente: HouseValues::from_map(&kpis.sessoes_paciente),
            qualidade: HouseValues::from_map(&kpis.qualidade),
            comparecimento: HouseValues::from_map(&kpis.comparecimento),
            evolucao_ors,
        },
    }
}

/// Merges the House directory and the extractor outputs for both windows.
/// The clinical-delta map is computed once and lands in both sections.
pub fn build_report(
    updated_at: NaiveDateTime,
    basics: &HashMap<HouseKey, HouseBasics>,
    current: &Period,
    current_kpis: &PeriodKpis,
    accumulated: &Period,
    accumulated_kpis: &PeriodKpis,
    evolucao_ors: &HashMap<HouseKey, f64>,
) -> Report {
    let ors = HouseValues::from_map(evolucao_ors);
    Report {
        updated_at,
        houses: Houses {
            prisma: house_entry(HouseKey::Prisma, basics),
            macondo: house_entry(HouseKey::Macondo, basics),
            marmoris: house_entry(HouseKey::Marmoris, basics),
        },
        periods: Periods {
            current: period_section(current, current_kpis, ors),
            accumulated: period_section(accumulated, accumulated_kpis, ors),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period;
    use chrono::NaiveDate;

    fn empty_kpis() -> PeriodKpis {
        PeriodKpis {
            adimplencia: HashMap::new(),
            sessoes_paciente: HashMap::new(),
            qualidade: HashMap::new(),
            comparecimento: HashMap::new(),
        }
    }

    fn sample_report() -> Report {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let current = period::current_period(today);
        let accumulated = period::accumulated_period(today, 3);
        let mut ors = HashMap::new();
        ors.insert(HouseKey::Macondo, 6.2);
        build_report(
            today.and_hms_opt(8, 30, 0).unwrap(),
            &HashMap::new(),
            &current,
            &empty_kpis(),
            &accumulated,
            &empty_kpis(),
            &ors,
        )
    }

    #[test]
    fn absent_houses_default_to_zero_everywhere() {
        let report = sample_report();
        assert_eq!(report.houses.prisma.therapists_count, 0);
        assert_eq!(report.houses.marmoris.active_patients, 0);
        assert_eq!(report.periods.current.kpis.adimplencia.prisma, 0.0);
        assert_eq!(report.periods.accumulated.kpis.qualidade.marmoris, 0.0);
        assert_eq!(report.periods.current.kpis.evolucao_ors.macondo, 6.2);
        assert_eq!(report.periods.current.kpis.evolucao_ors.prisma, 0.0);
    }

    #[test]
    fn clinical_delta_is_shared_between_periods() {
        let report = sample_report();
        assert_eq!(
            report.periods.current.kpis.evolucao_ors,
            report.periods.accumulated.kpis.evolucao_ors
        );
    }

    #[test]
    fn static_house_identity_survives_empty_store() {
        let report = sample_report();
        assert_eq!(report.houses.prisma.name, "Prisma");
        assert_eq!(report.houses.macondo.leader, "Flávia");
        assert_eq!(report.houses.marmoris.sensibility, "Humanista");
    }

    #[test]
    fn serialized_document_has_the_dashboard_contract_keys() {
        let report = sample_report();
        let json = serde_json::to_value(&report).unwrap();
        for house in ["prisma", "macondo", "marmoris"] {
            assert!(json["houses"][house].is_object());
            for metric in [
                "adimplencia",
                "sessoes_paciente",
                "qualidade",
                "comparecimento",
                "evolucao_ors",
            ] {
                assert!(json["periods"]["current"]["kpis"][metric][house].is_number());
                assert!(json["periods"]["accumulated"]["kpis"][metric][house].is_number());
            }
        }
        assert_eq!(json["periods"]["current"]["label"], "Março 2024");
        assert_eq!(json["periods"]["accumulated"]["label"], "Jan 2024 — Mar 2024");
        assert!(json["updated_at"].is_string());
    }
}
