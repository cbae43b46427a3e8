//! Company registry and fiscal calendar resolution.

use crate::company::{Company, CompanyId, MonthDay};
use crate::fact::{DeclaredPeriod, RawFact};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Where a company's fiscal year end came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarSource {
    /// Declared in the company's submissions
    Declared,
    /// Inferred from the period ends of full-year filings
    Inferred,
    /// Unknown, calendar year end assumed
    Defaulted,
}

/// Fiscal calendar used to assign periods for one company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalCalendar {
    /// Fiscal year end month/day
    pub fiscal_year_end: MonthDay,
    /// Provenance of `fiscal_year_end`
    pub source: CalendarSource,
}

impl FiscalCalendar {
    /// Calendar with a known fiscal year end.
    pub const fn declared(fiscal_year_end: MonthDay) -> Self {
        Self {
            fiscal_year_end,
            source: CalendarSource::Declared,
        }
    }

    /// Calendar-year fallback for companies with no usable fiscal year end.
    pub const fn defaulted() -> Self {
        Self {
            fiscal_year_end: MonthDay::DECEMBER_31,
            source: CalendarSource::Defaulted,
        }
    }

    /// Whether the fiscal year end had to be assumed.
    pub const fn is_defaulted(&self) -> bool {
        matches!(self.source, CalendarSource::Defaulted)
    }
}

/// Reference data for all known companies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyRegistry {
    companies: BTreeMap<CompanyId, Company>,
    inferred: BTreeMap<CompanyId, MonthDay>,
}

impl CompanyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a company, merging non-empty fields into any existing entry.
    pub fn upsert(&mut self, company: Company) {
        match self.companies.get_mut(&company.company_id) {
            Some(existing) => {
                existing.ticker = company.ticker.or(existing.ticker.take());
                existing.name = company.name.or(existing.name.take());
                existing.fiscal_year_end = company.fiscal_year_end.or(existing.fiscal_year_end);
                existing.first_disclosure_date = company
                    .first_disclosure_date
                    .or(existing.first_disclosure_date);
            }
            None => {
                self.companies.insert(company.company_id.clone(), company);
            }
        }
    }

    /// Look up a company.
    pub fn get(&self, company_id: &CompanyId) -> Option<&Company> {
        self.companies.get(company_id)
    }

    /// Companies in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Company> {
        self.companies.values()
    }

    /// Number of companies.
    pub fn len(&self) -> usize {
        self.companies.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    /// Fill in fiscal year ends for companies that lack one, using the most
    /// frequent period-end month/day among their full-year facts. Ties go to
    /// the earliest month/day. Companies seen only in `facts` are added.
    ///
    /// Every fact counts regardless of its filed date, so the inferred
    /// calendar is not point-in-time: full-year filings made after an as-of
    /// date can change the fiscal periods assigned before it. Declare the
    /// fiscal year end when that matters.
    ///
    /// Returns the number of companies whose fiscal year end was inferred.
    pub fn infer_fiscal_year_ends(&mut self, facts: &[RawFact]) -> usize {
        let mut counts: HashMap<&CompanyId, BTreeMap<MonthDay, usize>> = HashMap::new();
        for fact in facts {
            let entry = counts.entry(&fact.company_id).or_default();
            if fact.declared_period == DeclaredPeriod::FY {
                *entry.entry(MonthDay::from_date(fact.period_end)).or_default() += 1;
            }
        }

        let mut inferred = 0;
        for (company_id, histogram) in counts {
            let company = self
                .companies
                .entry(company_id.clone())
                .or_insert_with(|| Company::new(company_id.clone()));
            if company.fiscal_year_end.is_some() {
                continue;
            }
            // BTreeMap iterates in ascending month/day, so the first maximum wins ties
            let mode = histogram
                .iter()
                .fold(None::<(MonthDay, usize)>, |best, (md, n)| match best {
                    Some((_, best_n)) if best_n >= *n => best,
                    _ => Some((*md, *n)),
                });
            if let Some((fye, n)) = mode {
                debug!(
                    company = %company_id,
                    fye = %fye,
                    observations = n,
                    "inferred fiscal year end"
                );
                company.fiscal_year_end = Some(fye);
                self.inferred.insert(company_id.clone(), fye);
                inferred += 1;
            }
        }
        inferred
    }

    /// Fiscal calendar for a company, falling back to a calendar year end.
    pub fn fiscal_calendar(&self, company_id: &CompanyId) -> FiscalCalendar {
        match self.get(company_id).and_then(|c| c.fiscal_year_end) {
            Some(fye) if self.inferred.get(company_id) == Some(&fye) => FiscalCalendar {
                fiscal_year_end: fye,
                source: CalendarSource::Inferred,
            },
            Some(fye) => FiscalCalendar::declared(fye),
            None => FiscalCalendar::defaulted(),
        }
    }
}

impl FromIterator<Company> for CompanyRegistry {
    fn from_iter<I: IntoIterator<Item = Company>>(iter: I) -> Self {
        let mut registry = Self::new();
        for company in iter {
            registry.upsert(company);
        }
        registry
    }
}
