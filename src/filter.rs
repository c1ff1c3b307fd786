// Row filtering over the project table.
//
// A `FilterSpec` holds four independent predicate groups. A row passes when
// it satisfies every supplied predicate; empty predicates are skipped.
use crate::error::TrackerError;
use crate::types::{Cell, Column, ProjectRecord, Value};
use crate::util::coerce_date;
use chrono::NaiveDate;
use log::trace;

/// Inclusive `[min, max]`; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> NumRange {
        NumRange { min, max }
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    fn contains(&self, v: f64) -> bool {
        self.min.map_or(true, |m| v >= m) && self.max.map_or(true, |m| v <= m)
    }
}

/// Inclusive `[start, end]` over dates; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Bounds go through the same permissive coercion as cell values, but a
    /// bound that cannot be read is an error rather than "no constraint".
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<DateRange, TrackerError> {
        let bound = |s: Option<&str>| -> Result<Option<NaiveDate>, TrackerError> {
            match s.map(str::trim).filter(|s| !s.is_empty()) {
                None => Ok(None),
                Some(s) => coerce_date(Some(s))
                    .map(Some)
                    .ok_or_else(|| TrackerError::InvalidDate(s.to_string())),
            }
        };
        Ok(DateRange { start: bound(start)?, end: bound(end)? })
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    fn contains(&self, d: NaiveDate) -> bool {
        self.start.map_or(true, |s| d >= s) && self.end.map_or(true, |e| d <= e)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// Column must equal one of the listed values.
    pub equals: Vec<(Column, Vec<Value>)>,
    /// Case-insensitive substring.
    pub contains: Vec<(Column, String)>,
    pub num_ranges: Vec<(Column, NumRange)>,
    pub date_ranges: Vec<(Column, DateRange)>,
}

impl FilterSpec {
    pub fn new() -> FilterSpec {
        FilterSpec::default()
    }

    pub fn equals(mut self, column: Column, value: impl Into<Value>) -> Self {
        self.equals.push((column, vec![value.into()]));
        self
    }

    /// Exact match on a widget selection; `None` leaves the column unconstrained.
    pub fn equals_if_set(self, column: Column, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.equals(column, v),
            None => self,
        }
    }

    pub fn one_of(mut self, column: Column, values: Vec<Value>) -> Self {
        self.equals.push((column, values));
        self
    }

    pub fn contains(mut self, column: Column, fragment: impl Into<String>) -> Self {
        self.contains.push((column, fragment.into()));
        self
    }

    pub fn range(mut self, column: Column, range: NumRange) -> Self {
        self.num_ranges.push((column, range));
        self
    }

    pub fn date_range(mut self, column: Column, range: DateRange) -> Self {
        self.date_ranges.push((column, range));
        self
    }

    pub fn extend(&mut self, other: FilterSpec) {
        self.equals.extend(other.equals);
        self.contains.extend(other.contains);
        self.num_ranges.extend(other.num_ranges);
        self.date_ranges.extend(other.date_ranges);
    }

    pub fn matches(&self, r: &ProjectRecord) -> bool {
        let equals_ok = self
            .equals
            .iter()
            .filter(|(_, vals)| !vals.is_empty())
            .all(|(col, vals)| {
                let cell = col.cell(r);
                vals.iter().any(|v| v.matches(&cell))
            });
        if !equals_ok {
            return false;
        }

        let contains_ok = self
            .contains
            .iter()
            .filter(|(_, frag)| !frag.is_empty())
            .all(|(col, frag)| cell_contains(&col.cell(r), frag));
        if !contains_ok {
            return false;
        }

        let ranges_ok = self
            .num_ranges
            .iter()
            .filter(|(_, range)| !range.is_open())
            .all(|(col, range)| col.cell(r).as_f64().is_some_and(|v| range.contains(v)));
        if !ranges_ok {
            return false;
        }

        self.date_ranges
            .iter()
            .filter(|(_, range)| !range.is_open())
            .all(|(col, range)| cell_date(&col.cell(r)).is_some_and(|d| range.contains(d)))
    }
}

fn cell_contains(cell: &Cell<'_>, fragment: &str) -> bool {
    let haystack = match cell {
        Cell::Text(s) => s.to_lowercase(),
        Cell::Int(i) => i.to_string(),
        Cell::Number(n) => n.to_string(),
        Cell::Date(d) => d.to_string(),
        Cell::Missing => return false,
    };
    haystack.contains(&fragment.to_lowercase())
}

fn cell_date(cell: &Cell<'_>) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => coerce_date(Some(s)),
        _ => None,
    }
}

/// Rows satisfying every predicate in `spec`, in input order. The input is
/// only borrowed.
pub fn apply_filters<'a>(records: &'a [ProjectRecord], spec: &FilterSpec) -> Vec<&'a ProjectRecord> {
    let out: Vec<&ProjectRecord> = records.iter().filter(|r| spec.matches(r)).collect();
    trace!("Filter kept {} of {} rows", out.len(), records.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{project, sample_records};

    #[test]
    fn empty_spec_returns_everything_in_order() {
        let rows = sample_records();
        let out = apply_filters(&rows, &FilterSpec::new());
        assert_eq!(out.len(), rows.len());
        for (a, b) in out.iter().zip(rows.iter()) {
            assert_eq!(*a, b);
        }
    }

    #[test]
    fn empty_predicate_values_are_skipped() {
        let rows = sample_records();
        let spec = FilterSpec::new()
            .one_of(Column::Region, vec![])
            .contains(Column::Contractor, "")
            .range(Column::StartYear, NumRange::default())
            .date_range(Column::StartDate, DateRange::default());
        assert_eq!(apply_filters(&rows, &spec).len(), rows.len());
    }

    #[test]
    fn equality_and_membership() {
        let rows = sample_records();
        let spec = FilterSpec::new().equals(Column::Region, "Region III");
        let out = apply_filters(&rows, &spec);
        assert!(!out.is_empty());
        assert!(out.iter().all(|r| r.region.as_deref() == Some("Region III")));
        let excluded = rows.iter().filter(|r| r.region.as_deref() != Some("Region III")).count();
        assert_eq!(out.len() + excluded, rows.len());

        let spec = FilterSpec::new().one_of(
            Column::Region,
            vec!["Region III".into(), "National Capital Region".into()],
        );
        let out = apply_filters(&rows, &spec);
        assert!(out.iter().all(|r| matches!(
            r.region.as_deref(),
            Some("Region III") | Some("National Capital Region")
        )));
    }

    #[test]
    fn nulls_only_match_when_requested() {
        let mut rows = sample_records();
        rows.push(project(None, Some("Bulacan"), 5_000_000.0, Some(2022), None));
        let spec = FilterSpec::new().equals(Column::Region, "Region III");
        assert!(apply_filters(&rows, &spec).iter().all(|r| r.region.is_some()));

        let spec = FilterSpec::new().one_of(Column::Region, vec![Value::Null]);
        let out = apply_filters(&rows, &spec);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].region, None);

        let spec = FilterSpec::new().contains(Column::Region, "region");
        assert!(apply_filters(&rows, &spec).iter().all(|r| r.region.is_some()));
    }

    #[test]
    fn unset_selection_is_no_constraint() {
        let rows = sample_records();
        let spec = FilterSpec::new().equals_if_set(Column::Region, None);
        assert!(spec.equals.is_empty());
        assert_eq!(apply_filters(&rows, &spec).len(), rows.len());

        let spec = FilterSpec::new().equals_if_set(Column::Region, Some("Region III"));
        assert_eq!(apply_filters(&rows, &spec).len(), 3);
    }

    #[test]
    fn missing_cells_need_an_explicit_null() {
        let mut rows = sample_records();
        rows.push(project(None, None, 1.0, Some(2022), None));
        let text_only = FilterSpec::new().one_of(Column::Region, vec!["Region III".into()]);
        assert!(apply_filters(&rows, &text_only).iter().all(|r| r.region.is_some()));

        let with_null = FilterSpec::new().one_of(Column::Region, vec!["Region III".into(), Value::Null]);
        let out = apply_filters(&rows, &with_null);
        assert_eq!(out.len(), 4);
        assert!(out.iter().any(|r| r.region.is_none()));
    }

    #[test]
    fn unknown_value_yields_empty_result() {
        let rows = sample_records();
        let spec = FilterSpec::new().equals(Column::Contractor, "NOBODY & SONS");
        assert!(apply_filters(&rows, &spec).is_empty());
    }

    #[test]
    fn contains_is_case_insensitive() {
        let rows = sample_records();
        let spec = FilterSpec::new().contains(Column::Contractor, "acme");
        let out = apply_filters(&rows, &spec);
        assert!(!out.is_empty());
        assert!(out.iter().all(|r| r.contractor.as_deref().unwrap().contains("ACME")));
    }

    #[test]
    fn numeric_range_is_inclusive_and_drops_nulls() {
        let mut rows = sample_records();
        rows.push(project(Some("Region I"), Some("Ilocos Norte"), 1.0, None, None));
        let spec = FilterSpec::new().range(Column::StartYear, NumRange::new(Some(2021.0), Some(2022.0)));
        let out = apply_filters(&rows, &spec);
        assert!(!out.is_empty());
        for r in &out {
            let y = r.start_year.unwrap();
            assert!((2021..=2022).contains(&y));
        }
        assert!(out.iter().any(|r| r.start_year == Some(2021)));
        assert!(out.iter().any(|r| r.start_year == Some(2022)));

        let spec = FilterSpec::new().range(Column::ContractCost, NumRange::new(None, Some(10_000_000.0)));
        assert!(apply_filters(&rows, &spec).iter().all(|r| r.contract_cost <= 10_000_000.0));
    }

    #[test]
    fn date_range_coerces_bounds() {
        let rows = sample_records();
        let range = DateRange::parse(Some("2021/01/01"), Some("December 31, 2021")).unwrap();
        let spec = FilterSpec::new().date_range(Column::StartDate, range);
        let out = apply_filters(&rows, &spec);
        assert!(!out.is_empty());
        assert!(out.iter().all(|r| r.start_year == Some(2021)));

        assert!(matches!(
            DateRange::parse(Some("yesterday"), None),
            Err(TrackerError::InvalidDate(_))
        ));
        assert!(DateRange::parse(Some("  "), None).unwrap().is_open());
    }

    #[test]
    fn date_range_on_text_column_treats_garbage_as_missing() {
        let rows = sample_records();
        let range = DateRange::parse(Some("2000-01-01"), None).unwrap();
        let spec = FilterSpec::new().date_range(Column::Contractor, range);
        assert!(apply_filters(&rows, &spec).is_empty());
    }

    #[test]
    fn filtering_does_not_interfere_with_the_source() {
        let rows = sample_records();
        let snapshot = rows.clone();
        let a = apply_filters(&rows, &FilterSpec::new().equals(Column::Region, "Region III"));
        let b = apply_filters(&rows, &FilterSpec::new().equals(Column::Region, "National Capital Region"));
        assert!(a.iter().all(|r| r.region.as_deref() == Some("Region III")));
        assert!(b.iter().all(|r| r.region.as_deref() == Some("National Capital Region")));
        assert!(!a.is_empty() && !b.is_empty());
        assert_eq!(rows, snapshot);
    }
}
