use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumString};
use tabled::Tabled;

/// Administrative regions in display order. Anything else in the Region
/// property still loads, but sorts after these.
pub const REGION_ORDER: [&str; 16] = [
    "Cordillera Administrative Region",
    "National Capital Region",
    "Region I",
    "Region II",
    "Region III",
    "Region IV-A",
    "Region IV-B",
    "Region V",
    "Region VI",
    "Region VII",
    "Region VIII",
    "Region IX",
    "Region X",
    "Region XI",
    "Region XII",
    "Region XIII",
];

static REGION_RANK: Lazy<HashMap<&'static str, usize>> =
    Lazy::new(|| REGION_ORDER.iter().enumerate().map(|(i, r)| (*r, i)).collect());

pub fn region_rank(region: &str) -> Option<usize> {
    REGION_RANK.get(region).copied()
}

/// Feature properties as they appear in the GeoJSON file. Values are kept as
/// raw JSON because exports mix numbers, numeric strings and nulls.
#[derive(Debug, Default, Deserialize)]
pub struct RawProperties {
    #[serde(rename = "Region")]
    pub region: Option<serde_json::Value>,
    #[serde(rename = "Province")]
    pub province: Option<serde_json::Value>,
    #[serde(rename = "Municipality")]
    pub municipality: Option<serde_json::Value>,
    #[serde(rename = "TypeofWork")]
    pub type_of_work: Option<serde_json::Value>,
    #[serde(rename = "Contractor")]
    pub contractor: Option<serde_json::Value>,
    #[serde(rename = "ContractCost")]
    pub contract_cost: Option<serde_json::Value>,
    #[serde(rename = "StartDate")]
    pub start_date: Option<serde_json::Value>,
    #[serde(rename = "CompletionYear")]
    pub completion_year: Option<serde_json::Value>,
}

/// One flood-control contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    pub region: Option<String>,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub type_of_work: Option<String>,
    pub contractor: Option<String>,
    pub contract_cost: f64,
    pub start_date: Option<NaiveDate>,
    pub start_year: Option<i32>,
    pub completion_year: Option<i32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl ProjectRecord {
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Columns of the project table that filters and group-bys can address.
/// Parsing accepts the GeoJSON property names, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Column {
    Region,
    Province,
    Municipality,
    #[strum(to_string = "TypeofWork", serialize = "TypeOfWork")]
    TypeOfWork,
    Contractor,
    ContractCost,
    StartDate,
    StartYear,
    CompletionYear,
    #[strum(to_string = "lat", serialize = "Latitude")]
    Latitude,
    #[strum(to_string = "lon", serialize = "Longitude")]
    Longitude,
}

/// Administrative granularity used to group the distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum DrillLevel {
    Region,
    Province,
    Municipality,
}

impl DrillLevel {
    pub fn column(self) -> Column {
        match self {
            DrillLevel::Region => Column::Region,
            DrillLevel::Province => Column::Province,
            DrillLevel::Municipality => Column::Municipality,
        }
    }
}

/// A borrowed cell of a [`ProjectRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Int(i64),
    Number(f64),
    Date(NaiveDate),
    Missing,
}

impl Column {
    pub fn cell<'a>(&self, r: &'a ProjectRecord) -> Cell<'a> {
        fn text(v: &Option<String>) -> Cell<'_> {
            v.as_deref().map_or(Cell::Missing, Cell::Text)
        }
        fn int(v: Option<i32>) -> Cell<'static> {
            v.map_or(Cell::Missing, |y| Cell::Int(i64::from(y)))
        }
        fn number(v: Option<f64>) -> Cell<'static> {
            match v {
                Some(n) if !n.is_nan() => Cell::Number(n),
                _ => Cell::Missing,
            }
        }
        match self {
            Column::Region => text(&r.region),
            Column::Province => text(&r.province),
            Column::Municipality => text(&r.municipality),
            Column::TypeOfWork => text(&r.type_of_work),
            Column::Contractor => text(&r.contractor),
            Column::ContractCost => number(Some(r.contract_cost)),
            Column::StartDate => r.start_date.map_or(Cell::Missing, Cell::Date),
            Column::StartYear => int(r.start_year),
            Column::CompletionYear => int(r.completion_year),
            Column::Latitude => number(r.lat),
            Column::Longitude => number(r.lon),
        }
    }
}

impl Cell<'_> {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// An owned value used in equality predicates. `Null` matches missing cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Text(String),
    Int(i64),
    Number(f64),
    Null,
}

impl Value {
    pub fn matches(&self, cell: &Cell<'_>) -> bool {
        match (self, cell) {
            (Value::Null, Cell::Missing) => true,
            (Value::Text(a), Cell::Text(b)) => a == b,
            (Value::Text(a), Cell::Date(d)) => a == &d.to_string(),
            (Value::Int(_) | Value::Number(_), Cell::Int(_) | Cell::Number(_)) => {
                match (self.as_f64(), cell.as_f64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct YearlyRow {
    #[serde(rename = "StartYear")]
    #[tabled(rename = "StartYear")]
    pub start_year: i64,
    #[serde(rename = "Projects")]
    #[tabled(rename = "Projects")]
    pub projects: usize,
    #[serde(rename = "TotalCost")]
    #[tabled(rename = "TotalCost")]
    pub total_cost: String,
    #[serde(rename = "AverageCost")]
    #[tabled(rename = "AverageCost")]
    pub average_cost: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ContractorRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Contractor")]
    #[tabled(rename = "Contractor")]
    pub contractor: String,
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "PctOfTotal")]
    #[tabled(rename = "PctOfTotal")]
    pub pct_of_total: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_parse_case_insensitively() {
        assert_eq!("typeofwork".parse::<Column>().unwrap(), Column::TypeOfWork);
        assert_eq!("TypeOfWork".parse::<Column>().unwrap(), Column::TypeOfWork);
        assert_eq!("region".parse::<Column>().unwrap(), Column::Region);
        assert_eq!("lat".parse::<Column>().unwrap(), Column::Latitude);
        assert!("Budget".parse::<Column>().is_err());
        assert_eq!(Column::TypeOfWork.to_string(), "TypeofWork");
    }

    #[test]
    fn region_rank_follows_fixed_order() {
        assert_eq!(region_rank("Cordillera Administrative Region"), Some(0));
        assert_eq!(region_rank("Region XIII"), Some(15));
        assert_eq!(region_rank("BARMM"), None);
    }

    #[test]
    fn null_value_only_matches_missing() {
        assert!(Value::Null.matches(&Cell::Missing));
        assert!(!Value::Null.matches(&Cell::Text("Region I")));
        assert!(!Value::from("Region I").matches(&Cell::Missing));
    }

    #[test]
    fn numeric_values_compare_across_int_and_float() {
        assert!(Value::Int(2022).matches(&Cell::Number(2022.0)));
        assert!(Value::Number(5.0).matches(&Cell::Int(5)));
        assert!(!Value::Int(2022).matches(&Cell::Text("2022")));
    }
}
