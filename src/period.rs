use chrono::{Datelike, NaiveDate};

/// A bounded date window over which KPIs are aggregated, with a display
/// label and the inclusive count of calendar months it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
    pub month_count: u32,
}

const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month - 1) as usize]
}

fn month_abbrev(month: u32) -> String {
    month_name(month).chars().take(3).collect()
}

/// Inclusive count of distinct calendar months spanned, floored at 1.
pub fn month_count(start: NaiveDate, end: NaiveDate) -> u32 {
    let months = (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32) + 1;
    months.max(1) as u32
}

/// First day of the month `months_back` months before `date`'s month.
fn first_of_month_back(date: NaiveDate, months_back: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month() as i32 - 1 - months_back as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// Window from the first day of `today`'s month through `today`.
pub fn current_period(today: NaiveDate) -> Period {
    let start = first_of_month_back(today, 0);
    Period {
        start,
        end: today,
        label: format!("{} {}", month_name(today.month()), today.year()),
        month_count: month_count(start, today),
    }
}

/// Rolling window covering `window_months` calendar months ending at `today`
/// (window of 3 = first day of the month two months back, through today).
pub fn accumulated_period(today: NaiveDate, window_months: u32) -> Period {
    let start = first_of_month_back(today, window_months.saturating_sub(1));
    let label = format!(
        "{} {} — {} {}",
        month_abbrev(start.month()),
        start.year(),
        month_abbrev(today.month()),
        today.year()
    );
    Period {
        start,
        end: today,
        label,
        month_count: month_count(start, today),
    }
}
