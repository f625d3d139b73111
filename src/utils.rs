use chrono::{Duration, NaiveDate, NaiveDateTime};

const SECONDS_PER_DAY: f64 = 86_400.0;

fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Converts an Excel 1900-system serial to a datetime.
///
/// Serials below 61 are off by one day because of Excel's phantom
/// 1900-02-29; personal finance sheets never reach back that far.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let seconds = (serial * SECONDS_PER_DAY).round() as i64;
    excel_epoch().checked_add_signed(Duration::try_seconds(seconds)?)
}

pub fn datetime_to_excel_serial(datetime: NaiveDateTime) -> f64 {
    let delta = datetime - excel_epoch();
    delta.num_seconds() as f64 / SECONDS_PER_DAY
}

/// Formats a value as dollars with thousands separators, e.g. `$1,234.50`.
/// Negative values keep the sign after the symbol: `$-75.00`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, cents)
}

/// Formats a percentage that is already scaled to 0-100.
pub fn format_percent(percent: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, percent)
}

/// Formats a ratio (0.05 = 5%) as a percentage.
pub fn format_ratio_as_percent(ratio: f64, decimals: usize) -> String {
    format_percent(ratio * 100.0, decimals)
}

/// "October 16, 2026"
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}
