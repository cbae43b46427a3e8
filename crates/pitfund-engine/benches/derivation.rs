//! Benchmarks for the per-company pipeline and the parallel batch
//!
//! Run with: cargo bench --package pitfund-engine

use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use pitfund_data::{
    Company, CompanyId, CompanyRegistry, DeclaredPeriod, FiscalCalendar, Metric, MetricCatalog,
    MonthDay, RawFact,
};
use pitfund_engine::{BatchRunner, CompanyInput, EngineConfig, process_company};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CFO: &str = "NetCashProvidedByUsedInOperatingActivities";
const CAPEX: &str = "PaymentsToAcquirePropertyPlantAndEquipment";
const SHARES: &str = "WeightedAverageNumberOfDilutedSharesOutstanding";

const PERIODS: [(u32, u32, DeclaredPeriod); 4] = [
    (3, 31, DeclaredPeriod::Q1),
    (6, 30, DeclaredPeriod::Q2),
    (9, 30, DeclaredPeriod::Q3),
    (12, 31, DeclaredPeriod::FY),
];

#[allow(clippy::too_many_arguments)]
fn fact(
    cik: u64,
    metric: Metric,
    tag: &str,
    end: NaiveDate,
    filed: NaiveDate,
    period: DeclaredPeriod,
    fy: i32,
    value: f64,
) -> RawFact {
    RawFact {
        company_id: CompanyId::from_cik(cik),
        metric,
        tag: tag.to_string(),
        namespace: "us-gaap".to_string(),
        unit: "USD".to_string(),
        period_end: end,
        filed_date: filed,
        declared_period: period,
        declared_fiscal_year: fy,
        form_type: "10-Q".to_string(),
        value,
    }
}

/// Calendar-year filer with one comparative restatement per quarter
fn history(rng: &mut StdRng, cik: u64, years: i32) -> Vec<RawFact> {
    let mut facts = Vec::new();
    for fy in 2000..2000 + years {
        let mut cfo = 0.0;
        let mut capex = 0.0;
        for (m, d, period) in PERIODS {
            let end = NaiveDate::from_ymd_opt(fy, m, d).unwrap();
            let filed = end + Days::new(40);
            cfo += rng.gen_range(-10.0e6..50.0e6);
            capex += rng.gen_range(1.0e6..20.0e6);
            let shares = rng.gen_range(99.0e6..101.0e6);
            facts.push(fact(cik, Metric::Cfo, CFO, end, filed, period, fy, cfo));
            facts.push(fact(cik, Metric::Capex, CAPEX, end, filed, period, fy, capex));
            facts.push(fact(cik, Metric::Shares, SHARES, end, filed, period, fy, shares));
            let restated_filed = filed + Days::new(365);
            let restated = cfo * 1.01;
            facts.push(fact(cik, Metric::Cfo, CFO, end, restated_filed, period, fy + 1, restated));
        }
    }
    facts
}

fn bench_company_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Company Pipeline");
    let catalog = MetricCatalog::default();
    let config = EngineConfig::default();
    let mut rng = StdRng::seed_from_u64(42);

    for years in [5, 20, 40] {
        let input = CompanyInput {
            company_id: CompanyId::from_cik(1),
            calendar: FiscalCalendar::declared(MonthDay::DECEMBER_31),
            facts: history(&mut rng, 1, years),
        };
        group.throughput(Throughput::Elements(input.facts.len() as u64));
        group.bench_with_input(BenchmarkId::new("process", years), &input, |b, input| {
            b.iter(|| process_company(black_box(input), &catalog, &config).unwrap());
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Batch");
    group.sample_size(20);
    let runner = BatchRunner::new(MetricCatalog::default(), EngineConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    for companies in [50_u64, 500] {
        let registry: CompanyRegistry = (1..=companies)
            .map(|cik| {
                Company::new(CompanyId::from_cik(cik)).with_fiscal_year_end(MonthDay::DECEMBER_31)
            })
            .collect();
        let facts: Vec<RawFact> = (1..=companies)
            .flat_map(|cik| history(&mut rng, cik, 15))
            .collect();

        group.throughput(Throughput::Elements(companies));
        group.bench_with_input(BenchmarkId::new("run", companies), &facts, |b, facts| {
            b.iter(|| runner.run(&registry, black_box(facts.clone())).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_company_pipeline, bench_batch);
criterion_main!(benches);
