use chrono::NaiveDate;
use dashboard_streamliner::builder::{DEBT_TRACKING, TRANSACTION_LOG};
use dashboard_streamliner::xlsx::read_workbook;
use dashboard_streamliner::*;
use rust_xlsxwriter::{Format, Workbook};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn row<const N: usize>(pairs: [(&str, CellValue); N]) -> SourceRow {
    SourceRow::from_pairs(pairs)
}

fn streamliner() -> DashboardStreamliner {
    DashboardStreamliner::new(StreamlinerConfig::default()).unwrap()
}

#[test]
fn test_only_account_balances_reports_total_assets() {
    let workbook = SourceWorkbook::from_sheets(vec![SourceSheet::from_rows(
        "Account Balances",
        vec![row([
            ("Asset Category", CellValue::from("Cash")),
            ("Amount", CellValue::from(1000.0)),
        ])],
    )]);

    let results = streamliner().streamline(&workbook);
    assert_eq!(
        results.metrics.display_rows(),
        vec![("Total Assets".to_string(), "$1,000.00".to_string())]
    );
    assert_eq!(results.metrics.net_worth, MetricOutcome::Unavailable);
    assert_eq!(results.metrics.total_debt, MetricOutcome::Unavailable);

    let output = streamliner().build_output(&results, day(2024, 6, 1));
    let dashboard = output.sheet("Dashboard").unwrap();
    assert_eq!(dashboard.row_display(5), vec!["Total Assets", "$1,000.00"]);
    assert!(dashboard.row_display(6).is_empty());
}

#[test]
fn test_personal_and_shared_transactions_in_log() {
    let d = day(2024, 3, 15);
    let workbook = SourceWorkbook::from_sheets(vec![
        SourceSheet::from_rows(
            "Personal Expenses Detail",
            vec![row([
                ("date", CellValue::from(d)),
                ("company", CellValue::from("Market")),
                ("category", CellValue::from("groceries")),
                ("price", CellValue::from(100.0)),
            ])],
        ),
        SourceSheet::from_rows(
            "Shared Expenses Detail",
            vec![row([
                ("date", CellValue::from(d)),
                ("company", CellValue::from("Landlord")),
                ("category", CellValue::from("rent or mortgage")),
                ("price", CellValue::from(2000.0)),
            ])],
        ),
    ]);

    let s = streamliner();
    let output = s.build_output(&s.streamline(&workbook), day(2024, 6, 1));
    let log = output.sheet(TRANSACTION_LOG).unwrap();

    assert_eq!(log.used_rows(), 3);
    assert_eq!(
        log.row_display(1),
        vec!["2024-03-15", "Market", "groceries", "Dining & Food", "Personal", "100", "100"]
    );
    assert_eq!(
        log.row_display(2),
        vec![
            "2024-03-15",
            "Landlord",
            "rent or mortgage",
            "Housing",
            "Shared (50%)",
            "2000",
            "1000"
        ]
    );
}

#[test]
fn test_category_totals_ordering_and_averages() {
    let d = CellValue::from(day(2024, 1, 10));
    let workbook = SourceWorkbook::from_sheets(vec![SourceSheet::from_rows(
        "Personal Expenses Detail",
        vec![
            row([
                ("date", d.clone()),
                ("category", CellValue::from("travel")),
                ("price", CellValue::from(40.0)),
            ]),
            row([
                ("date", d.clone()),
                ("category", CellValue::from("Groceries")),
                ("price", CellValue::from(60.0)),
            ]),
        ],
    )]);

    let totals = streamliner().streamline(&workbook).category_totals;
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].total_amount, 60.0);
    assert!((totals[0].pct_of_total - 60.0).abs() < 1e-9);
    assert!((totals[0].avg_monthly - 5.0).abs() < 1e-9);
    assert_eq!(totals[1].total_amount, 40.0);
    assert!((totals[1].pct_of_total - 40.0).abs() < 1e-9);
    assert!((totals[1].avg_monthly - 40.0 / 12.0).abs() < 1e-9);
}

#[test]
fn test_zero_net_pay_month_has_zero_savings_rate() {
    let workbook = SourceWorkbook::from_sheets(vec![SourceSheet::from_rows(
        "Income vs Expenses",
        vec![row([
            ("Start Date", CellValue::from(day(2024, 2, 1))),
            ("Net Pay", CellValue::from(0.0)),
            ("Personal Expenses", CellValue::from(300.0)),
            ("50% Shared Expenses", CellValue::from(200.0)),
        ])],
    )]);

    let s = streamliner();
    let results = s.streamline(&workbook);
    assert_eq!(results.monthly.len(), 1);
    assert_eq!(results.monthly[0].savings_rate_pct, 0.0);
    assert_eq!(results.monthly[0].net_savings, -500.0);

    let output = s.build_output(&results, day(2024, 6, 1));
    let monthly = output.sheet("Monthly Summary").unwrap();
    assert_eq!(monthly.row_display(1)[6], "0.0%");
}

#[test]
fn test_missing_debt_summary_still_consolidates_detail_sheets() {
    let detail = |name: &str, balances: &[(u32, f64)]| {
        SourceSheet::from_rows(
            name,
            balances
                .iter()
                .map(|(m, balance)| {
                    row([
                        ("date", CellValue::from(day(2024, *m, 1))),
                        ("current debt amount", CellValue::from(*balance)),
                        ("payment", CellValue::from(250.0)),
                    ])
                })
                .collect(),
        )
    };

    let workbook = SourceWorkbook::from_sheets(vec![
        detail("Mortgage", &[(1, 300_000.0), (2, 299_500.0)]),
        detail("Car", &[(1, 12_000.0), (2, 11_750.0), (3, 11_500.0)]),
    ]);

    let s = streamliner();
    let results = s.streamline(&workbook);
    let names: Vec<&str> = results.debts.iter().map(|d| d.debt_type.as_str()).collect();
    assert_eq!(names, vec!["Car (Detailed)", "Mortgage (Detailed)"]);
    assert_eq!(results.debts[0].current_balance, 11_500.0);
    assert_eq!(
        results.debts[0].last_updated,
        Some(CellValue::from(day(2024, 3, 1)))
    );
    assert_eq!(results.debts[1].current_balance, 299_500.0);

    let output = s.build_output(&results, day(2024, 6, 1));
    assert_eq!(output.sheet(DEBT_TRACKING).unwrap().used_rows(), 3);
}

#[test]
fn test_failed_metric_keeps_the_others() {
    let workbook = SourceWorkbook::from_sheets(vec![
        SourceSheet::from_rows(
            "Account Balances",
            vec![row([
                ("Asset Category", CellValue::from("Cash")),
                ("Amount", CellValue::from(2500.0)),
            ])],
        ),
        SourceSheet::from_rows(
            "Debt Summary",
            vec![row([
                ("Debt Type", CellValue::from("Car")),
                ("Balance", CellValue::from("see detail")),
            ])],
        ),
    ]);

    let rows = streamliner().streamline(&workbook).metrics.display_rows();
    assert_eq!(rows[0], ("Total Assets".to_string(), "$2,500.00".to_string()));
    assert_eq!(
        rows.last().unwrap(),
        &(
            "Note".to_string(),
            "Some metrics may be incomplete due to data structure".to_string()
        )
    );
    assert!(!rows.iter().any(|(label, _)| label == "Net Worth"));
}

fn write_source_workbook(path: &Path) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let serial = |d: NaiveDate| datetime_to_excel_serial(d.and_hms_opt(0, 0, 0).unwrap());

    let balances = workbook.add_worksheet();
    balances.set_name("Account Balances").unwrap();
    balances.write_string(0, 0, "Asset Category").unwrap();
    balances.write_string(0, 1, "Amount").unwrap();
    balances.write_string(0, 2, "3-Month Change").unwrap();
    balances.write_string(1, 0, "Savings").unwrap();
    balances.write_number(1, 1, 8000.0).unwrap();
    balances.write_number(1, 2, 0.025).unwrap();

    let personal = workbook.add_worksheet();
    personal.set_name("Personal Expenses Detail").unwrap();
    for (col, header) in ["date", "company", "category", "price"].iter().enumerate() {
        personal.write_string(0, col as u16, *header).unwrap();
    }
    personal
        .write_number_with_format(1, 0, serial(day(2024, 4, 2)), &date_format)
        .unwrap();
    personal.write_string(1, 1, "Bookshop").unwrap();
    personal.write_string(1, 2, "Books").unwrap();
    personal.write_number(1, 3, 35.0).unwrap();
    // No date: dropped from the log.
    personal.write_string(2, 1, "Mystery").unwrap();
    personal.write_string(2, 2, "crypto").unwrap();
    personal.write_number(2, 3, 999.0).unwrap();

    let car = workbook.add_worksheet();
    car.set_name("Car").unwrap();
    car.write_string(0, 0, "date").unwrap();
    car.write_string(0, 1, "current debt amount").unwrap();
    car.write_string(0, 2, "payment").unwrap();
    car.write_number_with_format(1, 0, serial(day(2024, 3, 1)), &date_format)
        .unwrap();
    car.write_number(1, 1, 9000.0).unwrap();
    car.write_number(1, 2, 300.0).unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn test_xlsx_run_writes_seven_tabs() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("Finances.xlsx");
    let destination = dir.path().join("Finances_Streamlined.xlsx");
    write_source_workbook(&source);

    let report = streamliner()
        .run(&source, &destination, day(2024, 6, 1))
        .unwrap();
    assert_eq!(report.load.loaded.len(), 3);
    assert!(report.load.skipped.is_empty());
    assert_eq!(report.tabs, TAB_NAMES.to_vec());
    assert_eq!(report.transactions, 1);
    assert_eq!(report.skipped_without_date, 1);

    let profile = profile_workbook(&destination).unwrap();
    assert!(profile.verify_tabs(&TAB_NAMES).is_ok());
    assert_eq!(profile.sheet("Transaction Log").unwrap().rows, 1);
    assert_eq!(profile.sheet("Budget Planning").unwrap().rows, 17);

    let (output, _) = read_workbook(&destination).unwrap();
    let log = output.load("Transaction Log").unwrap();
    assert_eq!(log.rows[0].text("Company").as_deref(), Some("Bookshop"));
    assert_eq!(
        log.rows[0].text("Standardized Category").as_deref(),
        Some("Education & Development")
    );
    assert_eq!(log.rows[0].number("Amount"), Some(35.0));
    assert_eq!(
        log.rows[0].get("Date").and_then(CellValue::as_date),
        day(2024, 4, 2).and_hms_opt(0, 0, 0)
    );

    let debts = output.load("Debt Tracking").unwrap();
    assert_eq!(debts.rows[0].text("Debt Type").as_deref(), Some("Car (Detailed)"));
    assert_eq!(debts.rows[0].number("Current Balance"), Some(9000.0));
}

/// Worksheet XML whose only cell points past the end of the shared strings table.
const UNREADABLE_SHEET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="s"><v>9999</v></c></row></sheetData></worksheet>"#;

/// Copies an xlsx package, replacing one worksheet part with `xml`.
fn replace_sheet_part(source: &Path, destination: &Path, part: &str, xml: &str) {
    let mut archive = ZipArchive::new(File::open(source).unwrap()).unwrap();
    let mut writer = ZipWriter::new(File::create(destination).unwrap());

    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx).unwrap();
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();

        writer
            .start_file(name.as_str(), SimpleFileOptions::default())
            .unwrap();
        if name == part {
            writer.write_all(xml.as_bytes()).unwrap();
        } else {
            writer.write_all(&data).unwrap();
        }
    }
    writer.finish().unwrap();
}

#[test]
fn test_unreadable_sheet_is_skipped_and_run_completes() {
    let dir = tempfile::tempdir().unwrap();
    let intact = dir.path().join("Intact.xlsx");
    let source = dir.path().join("Finances.xlsx");
    let destination = dir.path().join("Finances_Streamlined.xlsx");
    write_source_workbook(&intact);
    // "Car" is the third worksheet written above.
    replace_sheet_part(&intact, &source, "xl/worksheets/sheet3.xml", UNREADABLE_SHEET_XML);

    let (workbook, load) = read_workbook(&source).unwrap();
    assert_eq!(load.skipped.len(), 1);
    assert_eq!(load.skipped[0].name, "Car");
    assert!(workbook.load("Car").is_none());
    assert!(workbook.load("Account Balances").is_some());
    assert!(workbook.load("Personal Expenses Detail").is_some());

    let report = streamliner()
        .run(&source, &destination, day(2024, 6, 1))
        .unwrap();
    assert_eq!(report.load.loaded.len(), 2);
    assert_eq!(report.load.skipped.len(), 1);
    assert_eq!(report.tabs, TAB_NAMES.to_vec());
    assert!(report
        .summary_lines()
        .contains(&"Source sheets skipped: 1".to_string()));

    let profile = profile_workbook(&destination).unwrap();
    assert!(profile.verify_tabs(&TAB_NAMES).is_ok());
    assert_eq!(profile.sheet("Debt Tracking").unwrap().rows, 0);
    assert_eq!(profile.sheet("Transaction Log").unwrap().rows, 1);
}

#[test]
fn test_missing_source_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out.xlsx");

    let err = streamliner()
        .run(&dir.path().join("absent.xlsx"), &destination, day(2024, 6, 1))
        .unwrap_err();
    assert!(matches!(err, StreamlinerError::SourceOpen { .. }));
    assert!(!destination.exists());
}
