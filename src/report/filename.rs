use chrono::NaiveDate;

use crate::model::ReportWindow;

/// Suggested download name, `<Brand>_<Kind>_<token>.pdf`.
///
/// The token depends on the window: the ISO date for current reports, `MonthName_Year` for
/// monthly ones, `Q<n>_Year` for quarterly ones and `YYYYMMDD_to_YYYYMMDD` for custom ranges.
pub fn report_filename(brand: &str, window: &ReportWindow, today: NaiveDate) -> String {
    let token = match *window {
        ReportWindow::Current => today.format("%Y-%m-%d").to_string(),
        ReportWindow::Monthly { year, month } => {
            let name = window
                .month_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Month{month}"));
            format!("{name}_{year}")
        }
        ReportWindow::Quarterly { year, quarter } => format!("Q{quarter}_{year}"),
        ReportWindow::Custom { start, end } => {
            format!("{}_to_{}", start.format("%Y%m%d"), end.format("%Y%m%d"))
        }
    };

    format!(
        "{}_{}_{}.pdf",
        sanitize_component(brand),
        window.kind_label(),
        token
    )
}

fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_whitespace() => '_',
            ch => ch,
        })
        .collect();

    if cleaned.is_empty() {
        "Report".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn current_reports_use_the_iso_date() {
        assert_eq!(
            report_filename("Community Platform", &ReportWindow::Current, date(2024, 3, 7)),
            "Community_Platform_Current_2024-03-07.pdf"
        );
    }

    #[test]
    fn monthly_reports_use_the_month_name() {
        let window = ReportWindow::Monthly {
            year: 2024,
            month: 10,
        };
        assert_eq!(
            report_filename("Barangay", &window, date(2024, 11, 1)),
            "Barangay_Monthly_October_2024.pdf"
        );
    }

    #[test]
    fn quarterly_reports_use_the_quarter_number() {
        let window = ReportWindow::Quarterly {
            year: 2023,
            quarter: 4,
        };
        assert_eq!(
            report_filename("Barangay", &window, date(2024, 1, 2)),
            "Barangay_Quarterly_Q4_2023.pdf"
        );
    }

    #[test]
    fn custom_reports_use_compact_dates() {
        let window = ReportWindow::Custom {
            start: date(2024, 1, 15),
            end: date(2024, 2, 29),
        };
        assert_eq!(
            report_filename("Barangay", &window, date(2024, 3, 1)),
            "Barangay_Custom_20240115_to_20240229.pdf"
        );
    }

    #[test]
    fn unsafe_brand_characters_are_replaced() {
        assert_eq!(
            report_filename(" A/B  Org ", &ReportWindow::Current, date(2024, 1, 1)),
            "A_B__Org_Current_2024-01-01.pdf"
        );
        assert_eq!(
            report_filename("   ", &ReportWindow::Current, date(2024, 1, 1)),
            "Report_Current_2024-01-01.pdf"
        );
    }
}
