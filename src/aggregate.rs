use crate::types::{Cell, Column, ContractorRow, ProjectRecord, YearlyRow};
use crate::util::{format_number, format_millions};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Group key taken from a single column. Rows whose key cell is missing do
/// not form a group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Int(i64),
    Text(String),
}

impl GroupKey {
    fn from_cell(cell: Cell<'_>) -> Option<GroupKey> {
        match cell {
            Cell::Text(s) => Some(GroupKey::Text(s.to_string())),
            Cell::Int(i) => Some(GroupKey::Int(i)),
            Cell::Date(d) => Some(GroupKey::Text(d.to_string())),
            Cell::Number(_) | Cell::Missing => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Int(i) => write!(f, "{}", i),
            GroupKey::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Count,
    Sum(Column),
    Mean(Column),
}

#[derive(Default)]
struct Acc {
    rows: usize,
    sum: f64,
    valued: usize,
}

/// Group `rows` by `key` and summarize with `metric`.
pub fn aggregate(rows: &[&ProjectRecord], key: Column, metric: Metric) -> BTreeMap<GroupKey, f64> {
    let mut map: BTreeMap<GroupKey, Acc> = BTreeMap::new();
    for r in rows {
        let Some(k) = GroupKey::from_cell(key.cell(r)) else { continue };
        let e = map.entry(k).or_default();
        e.rows += 1;
        let value_col = match metric {
            Metric::Count => continue,
            Metric::Sum(c) | Metric::Mean(c) => c,
        };
        if let Some(v) = value_col.cell(r).as_f64() {
            e.sum += v;
            e.valued += 1;
        }
    }
    map.into_iter()
        .filter_map(|(k, acc)| {
            let v = match metric {
                Metric::Count => acc.rows as f64,
                Metric::Sum(_) => acc.sum,
                Metric::Mean(_) if acc.valued == 0 => return None,
                Metric::Mean(_) => acc.sum / acc.valued as f64,
            };
            Some((k, v))
        })
        .collect()
}

pub fn count_by(rows: &[&ProjectRecord], key: Column) -> BTreeMap<GroupKey, f64> {
    aggregate(rows, key, Metric::Count)
}

pub fn sum_by(rows: &[&ProjectRecord], key: Column, value: Column) -> BTreeMap<GroupKey, f64> {
    aggregate(rows, key, Metric::Sum(value))
}

pub fn mean_by(rows: &[&ProjectRecord], key: Column, value: Column) -> BTreeMap<GroupKey, f64> {
    aggregate(rows, key, Metric::Mean(value))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub name: String,
    pub metric: f64,
    /// Share of the total over every group, rounded to 2 decimals.
    pub pct_of_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub entries: Vec<RankedEntry>,
    /// Share of the total covered by `entries`, in percent.
    pub pct_covered: f64,
}

impl Ranking {
    pub fn covered_text(&self) -> String {
        format!(
            "{}% of the contracts are awarded to these contractors.",
            self.pct_covered.round() as i64
        )
    }
}

/// Top `n` groups by metric, descending. Ties keep key order.
pub fn rank_top(grouped: BTreeMap<GroupKey, f64>, n: usize) -> Ranking {
    let total: f64 = grouped.values().sum();
    let mut all: Vec<(GroupKey, f64)> = grouped.into_iter().collect();
    all.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    all.truncate(n);

    let share = |v: f64| if total > 0.0 { v / total * 100.0 } else { 0.0 };
    let covered: f64 = all.iter().map(|(_, v)| *v).sum();
    let entries = all
        .into_iter()
        .map(|(k, v)| RankedEntry {
            name: k.to_string(),
            metric: v,
            pct_of_total: (share(v) * 100.0).round() / 100.0,
        })
        .collect();
    Ranking { entries, pct_covered: share(covered).clamp(0.0, 100.0) }
}

/// One table row per start year: project count, total and mean cost.
pub fn yearly_rows(rows: &[&ProjectRecord]) -> Vec<YearlyRow> {
    let counts = count_by(rows, Column::StartYear);
    let sums = sum_by(rows, Column::StartYear, Column::ContractCost);
    let means = mean_by(rows, Column::StartYear, Column::ContractCost);
    counts
        .into_iter()
        .filter_map(|(k, n)| {
            let total = sums.get(&k).copied().unwrap_or(0.0);
            let mean = means.get(&k).copied().unwrap_or(0.0);
            let GroupKey::Int(year) = k else { return None };
            Some(YearlyRow {
                start_year: year,
                projects: n as usize,
                total_cost: format_number(total, 2),
                average_cost: format_number(mean, 2),
            })
        })
        .collect()
}

pub fn ranking_rows(ranking: &Ranking, currency: bool) -> Vec<ContractorRow> {
    ranking
        .entries
        .iter()
        .enumerate()
        .map(|(idx, e)| ContractorRow {
            rank: idx + 1,
            contractor: e.name.clone(),
            metric: if currency { format_millions(e.metric, 1) } else { format_number(e.metric, 0) },
            pct_of_total: format_number(e.pct_of_total, 2),
        })
        .collect()
}
