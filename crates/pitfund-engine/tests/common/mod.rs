//! Synthetic filing histories shared by the integration tests.

#![allow(dead_code, unreachable_pub)]

use chrono::{Days, NaiveDate};
use pitfund_data::{
    Company, CompanyId, CompanyRegistry, DeclaredPeriod, Metric, MonthDay, RawFact,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const CFO_TAG: &str = "NetCashProvidedByUsedInOperatingActivities";
pub const CFO_ALT_TAG: &str = "NetCashProvidedByUsedInOperatingActivitiesContinuingOperations";
pub const CAPEX_TAG: &str = "PaymentsToAcquirePropertyPlantAndEquipment";
pub const SHARES_TAG: &str = "WeightedAverageNumberOfDilutedSharesOutstanding";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[allow(clippy::too_many_arguments)]
pub fn raw(
    cik: u64,
    metric: Metric,
    tag: &str,
    period_end: NaiveDate,
    filed_date: NaiveDate,
    declared_period: DeclaredPeriod,
    declared_fiscal_year: i32,
    value: f64,
) -> RawFact {
    RawFact {
        company_id: CompanyId::from_cik(cik),
        metric,
        tag: tag.to_string(),
        namespace: "us-gaap".to_string(),
        unit: if metric == Metric::Shares { "shares" } else { "USD" }.to_string(),
        period_end,
        filed_date,
        declared_period,
        declared_fiscal_year,
        form_type: if declared_period == DeclaredPeriod::FY { "10-K" } else { "10-Q" }.to_string(),
        value,
    }
}

/// Knobs for a generated history.
#[derive(Debug, Clone, Copy)]
pub struct HistoryConfig {
    pub first_year: i32,
    pub years: i32,
    /// Chance a period is restated as a comparative in the next year's filing
    pub restate_prob: f64,
    /// Chance a period is also reported under a lower-priority tag
    pub alt_tag_prob: f64,
    /// Chance of a share split at a quarter
    pub split_prob: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            first_year: 2012,
            years: 8,
            restate_prob: 0.15,
            alt_tag_prob: 0.2,
            split_prob: 0.03,
        }
    }
}

const QUARTER_ENDS: [(u32, u32); 4] = [(3, 31), (6, 30), (9, 30), (12, 31)];

const fn declared(q: usize) -> DeclaredPeriod {
    match q {
        0 => DeclaredPeriod::Q1,
        1 => DeclaredPeriod::Q2,
        2 => DeclaredPeriod::Q3,
        _ => DeclaredPeriod::FY,
    }
}

/// Calendar-year filer: cumulative CFO and CAPEX, point-in-time share counts.
pub fn company_history(rng: &mut StdRng, cik: u64, config: HistoryConfig) -> Vec<RawFact> {
    let mut facts = Vec::new();
    let mut shares = rng.gen_range(50.0e6..500.0e6);
    // Filing date of each (year offset, quarter) so comparatives can reuse it
    let mut filed: Vec<[NaiveDate; 4]> = Vec::new();

    for y in 0..config.years {
        let fy = config.first_year + y;
        let mut dates = [date(fy, 1, 1); 4];
        for (q, (m, d)) in QUARTER_ENDS.iter().enumerate() {
            let lag = if q == 3 { rng.gen_range(40..70) } else { rng.gen_range(25..45) };
            dates[q] = date(fy, *m, *d) + Days::new(lag);
        }
        filed.push(dates);
    }

    for y in 0..config.years {
        let fy = config.first_year + y;
        let mut cfo_cum = 0.0;
        let mut capex_cum = 0.0;
        for (q, (m, d)) in QUARTER_ENDS.iter().enumerate() {
            let end = date(fy, *m, *d);
            let filed_at = filed[y as usize][q];
            let period = declared(q);

            cfo_cum += rng.gen_range(-50.0e6..200.0e6);
            capex_cum += rng.gen_range(5.0e6..80.0e6);
            if rng.gen_bool(config.split_prob) {
                shares *= f64::from(rng.gen_range(2_u32..4));
            }
            let shares_now = shares * rng.gen_range(0.98..1.02);

            facts.push(raw(cik, Metric::Cfo, CFO_TAG, end, filed_at, period, fy, cfo_cum));
            facts.push(raw(cik, Metric::Capex, CAPEX_TAG, end, filed_at, period, fy, capex_cum));
            facts.push(raw(cik, Metric::Shares, SHARES_TAG, end, filed_at, period, fy, shares_now));

            if rng.gen_bool(config.alt_tag_prob) {
                let alt = cfo_cum * rng.gen_range(0.9..1.1);
                facts.push(raw(cik, Metric::Cfo, CFO_ALT_TAG, end, filed_at, period, fy, alt));
            }

            let next = y as usize + 1;
            if next < filed.len() && rng.gen_bool(config.restate_prob) {
                let restated = cfo_cum * rng.gen_range(0.9..1.1);
                let later = filed[next][q];
                facts.push(raw(cik, Metric::Cfo, CFO_TAG, end, later, period, fy + 1, restated));
            }
        }
    }
    facts
}

/// Many companies with a registry declaring calendar year ends.
pub fn universe(
    seed: u64,
    companies: u64,
    config: HistoryConfig,
) -> (CompanyRegistry, Vec<RawFact>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut facts = Vec::new();
    let mut registry = CompanyRegistry::new();
    for cik in 1..=companies {
        let company = Company::new(CompanyId::from_cik(cik));
        registry.upsert(company.with_fiscal_year_end(MonthDay::DECEMBER_31));
        facts.extend(company_history(&mut rng, cik, config));
    }
    (registry, facts)
}
