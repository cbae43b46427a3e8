//! Polars views of the output tables.
//!
//! Column names and order match the CSV export. Dates become polars `Date`
//! columns and missing values become nulls.

use crate::export::{ExportError, describe};
use chrono::NaiveDate;
use pitfund_engine::{AdjustedShare, CanonicalFact, DerivationRun, QuarterlyMetricRecord};
use polars::prelude::*;

fn epoch_days(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

/// Build a frame and cast the named day-count columns to `Date`.
fn with_dates(columns: Vec<Column>, date_columns: &[&str]) -> Result<DataFrame, ExportError> {
    let df = DataFrame::new(columns)?;
    let casts: Vec<Expr> = date_columns
        .iter()
        .map(|name| col(*name).cast(DataType::Date))
        .collect();
    Ok(df.lazy().with_columns(casts).collect()?)
}

/// Canonical facts as a DataFrame.
///
/// # Errors
///
/// Returns an error if the frame cannot be built.
pub fn canonical_frame(facts: &[CanonicalFact]) -> Result<DataFrame, ExportError> {
    let company: Vec<&str> = facts.iter().map(|f| f.company_id.as_str()).collect();
    let metric: Vec<&str> = facts.iter().map(|f| f.metric.as_str()).collect();
    let tag: Vec<&str> = facts.iter().map(|f| f.tag.as_str()).collect();
    let fiscal_year: Vec<i32> = facts.iter().map(|f| f.fiscal_year).collect();
    let fiscal_quarter: Vec<i32> = facts
        .iter()
        .map(|f| i32::from(f.fiscal_quarter.number()))
        .collect();
    let declared_fy: Vec<i32> = facts.iter().map(|f| f.declared_fiscal_year).collect();
    let declared_period: Vec<&str> = facts.iter().map(|f| f.declared_period.as_str()).collect();
    let period_end: Vec<i32> = facts.iter().map(|f| epoch_days(f.period_end)).collect();
    let filed_date: Vec<i32> = facts.iter().map(|f| epoch_days(f.filed_date)).collect();
    let form_type: Vec<&str> = facts.iter().map(|f| f.form_type.as_str()).collect();
    let value: Vec<f64> = facts.iter().map(|f| f.value).collect();

    with_dates(
        vec![
            Series::new("company_id".into(), company).into(),
            Series::new("metric".into(), metric).into(),
            Series::new("tag".into(), tag).into(),
            Series::new("fiscal_year".into(), fiscal_year).into(),
            Series::new("fiscal_quarter".into(), fiscal_quarter).into(),
            Series::new("declared_fiscal_year".into(), declared_fy).into(),
            Series::new("declared_period".into(), declared_period).into(),
            Series::new("period_end".into(), period_end).into(),
            Series::new("filed_date".into(), filed_date).into(),
            Series::new("form_type".into(), form_type).into(),
            Series::new("value".into(), value).into(),
        ],
        &["period_end", "filed_date"],
    )
}

/// Quarterly records as a DataFrame.
///
/// # Errors
///
/// Returns an error if the frame cannot be built.
pub fn quarterly_frame(records: &[QuarterlyMetricRecord]) -> Result<DataFrame, ExportError> {
    let company: Vec<&str> = records.iter().map(|r| r.company_id.as_str()).collect();
    let metric: Vec<&str> = records.iter().map(|r| r.metric.as_str()).collect();
    let fiscal_year: Vec<i32> = records.iter().map(|r| r.fiscal_year).collect();
    let fiscal_quarter: Vec<i32> = records
        .iter()
        .map(|r| i32::from(r.fiscal_quarter.number()))
        .collect();
    let declared_fy: Vec<i32> = records.iter().map(|r| r.declared_fiscal_year).collect();
    let period_end: Vec<i32> = records.iter().map(|r| epoch_days(r.period_end)).collect();
    let filed_date: Vec<i32> = records.iter().map(|r| epoch_days(r.filed_date)).collect();
    let q_val: Vec<Option<f64>> = records.iter().map(|r| r.q_val).collect();
    let ttm_val: Vec<Option<f64>> = records.iter().map(|r| r.ttm_val).collect();
    let derivation: Vec<String> = records.iter().map(|r| describe(&r.derivation)).collect();
    let ttm_status: Vec<&str> = records.iter().map(|r| r.ttm_status.as_str()).collect();
    let flags: Vec<String> = records.iter().map(|r| r.flags.to_string()).collect();

    with_dates(
        vec![
            Series::new("company_id".into(), company).into(),
            Series::new("metric".into(), metric).into(),
            Series::new("fiscal_year".into(), fiscal_year).into(),
            Series::new("fiscal_quarter".into(), fiscal_quarter).into(),
            Series::new("declared_fiscal_year".into(), declared_fy).into(),
            Series::new("period_end".into(), period_end).into(),
            Series::new("filed_date".into(), filed_date).into(),
            Series::new("q_val".into(), q_val).into(),
            Series::new("ttm_val".into(), ttm_val).into(),
            Series::new("derivation".into(), derivation).into(),
            Series::new("ttm_status".into(), ttm_status).into(),
            Series::new("flags".into(), flags).into(),
        ],
        &["period_end", "filed_date"],
    )
}

/// Adjusted share series as a DataFrame.
///
/// # Errors
///
/// Returns an error if the frame cannot be built.
pub fn adjusted_shares_frame(rows: &[AdjustedShare]) -> Result<DataFrame, ExportError> {
    let company: Vec<&str> = rows.iter().map(|r| r.company_id.as_str()).collect();
    let fiscal_year: Vec<i32> = rows.iter().map(|r| r.fiscal_year).collect();
    let fiscal_quarter: Vec<i32> = rows
        .iter()
        .map(|r| i32::from(r.fiscal_quarter.number()))
        .collect();
    let period_end: Vec<i32> = rows.iter().map(|r| epoch_days(r.period_end)).collect();
    let filed_date: Vec<i32> = rows.iter().map(|r| epoch_days(r.filed_date)).collect();
    let raw: Vec<Option<f64>> = rows.iter().map(|r| r.raw_shares).collect();
    let adjusted: Vec<Option<f64>> = rows.iter().map(|r| r.adjusted_shares).collect();
    let factor: Vec<f64> = rows.iter().map(|r| r.factor).collect();

    with_dates(
        vec![
            Series::new("company_id".into(), company).into(),
            Series::new("fiscal_year".into(), fiscal_year).into(),
            Series::new("fiscal_quarter".into(), fiscal_quarter).into(),
            Series::new("period_end".into(), period_end).into(),
            Series::new("filed_date".into(), filed_date).into(),
            Series::new("raw_shares".into(), raw).into(),
            Series::new("adjusted_shares".into(), adjusted).into(),
            Series::new("factor".into(), factor).into(),
        ],
        &["period_end", "filed_date"],
    )
}

/// Quarterly records visible on `as_of`, latest version per period.
///
/// # Errors
///
/// Returns an error if the frame cannot be built.
pub fn pit_frame(run: &DerivationRun, as_of: NaiveDate) -> Result<DataFrame, ExportError> {
    let visible: Vec<QuarterlyMetricRecord> = run.pit_view(as_of).into_iter().cloned().collect();
    quarterly_frame(&visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitfund_data::{CompanyId, FiscalQuarter, Metric};
    use pitfund_engine::{Derivation, Flags, TtmStatus};

    fn record(filed: NaiveDate, q_val: Option<f64>) -> QuarterlyMetricRecord {
        QuarterlyMetricRecord {
            company_id: CompanyId::from_cik(1),
            metric: Metric::Cfo,
            fiscal_year: 2020,
            fiscal_quarter: FiscalQuarter::Q1,
            declared_fiscal_year: 2020,
            period_end: NaiveDate::from_ymd_opt(2020, 3, 31).unwrap(),
            filed_date: filed,
            q_val,
            ttm_val: None,
            derivation: Derivation::Direct,
            ttm_status: TtmStatus::InsufficientHistory,
            flags: Flags::default(),
        }
    }

    #[test]
    fn test_epoch_days() {
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()), -1);
    }

    #[test]
    fn test_quarterly_frame_schema() {
        let filed = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        let df = quarterly_frame(&[record(filed, Some(1.0)), record(filed, None)]).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 12);
        assert_eq!(df.column("period_end").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("q_val").unwrap().null_count(), 1);
    }

    #[test]
    fn test_pit_frame_filters_by_filing_date() {
        let mut run = DerivationRun::default();
        run.quarterly.push(record(NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(), Some(1.0)));
        run.quarterly.push(record(NaiveDate::from_ymd_opt(2020, 8, 1).unwrap(), Some(2.0)));

        let df = pit_frame(&run, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()).unwrap();
        assert_eq!(df.height(), 1);
        let df = pit_frame(&run, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).unwrap();
        assert_eq!(df.height(), 0);
    }
}
