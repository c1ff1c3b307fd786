// Command-line configuration.
use crate::dashboard::{parse_threshold, ColorScope, FilterState};
use crate::error::TrackerError;
use crate::filter::{DateRange, FilterSpec, NumRange};
use crate::loader::Dataset;
use crate::types::{Column, Value};
use clap::Parser;
use std::path::PathBuf;

/// Token for "missing" in `--where` value lists.
pub const NULL_TOKEN: &str = "<null>";

/// Explore Philippine flood-control projects on a map and summary charts.
#[derive(Parser, Debug, Clone)]
#[command(name = "ph_flood_tracker")]
#[command(about = "Explore Philippine flood-control projects on a map and summary charts")]
pub struct Args {
    /// GeoJSON file with one point feature per project.
    #[arg(long, default_value = "flood_control_projects.geojson")]
    pub input: PathBuf,

    /// Directory for the rendered dashboard and exported tables.
    #[arg(long, default_value = "output")]
    pub out_dir: PathBuf,

    /// Run the menu-driven session instead of a single render.
    #[arg(short, long)]
    pub interactive: bool,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long)]
    pub province: Option<String>,

    #[arg(long)]
    pub municipality: Option<String>,

    #[arg(long)]
    pub type_of_work: Option<String>,

    #[arg(long)]
    pub contractor: Option<String>,

    /// Inclusive start-year range, e.g. `2020..2023`. Defaults to the dataset span.
    #[arg(long, value_name = "FROM..TO")]
    pub start_year: Option<String>,

    /// Inclusive completion-year range. Defaults to the dataset span.
    #[arg(long, value_name = "FROM..TO")]
    pub completion_year: Option<String>,

    /// Cost threshold for the distribution chart, `1M` to `290M`.
    #[arg(long, default_value = "100M")]
    pub threshold: String,

    /// Fit marker colours to the whole dataset or only the filtered rows.
    #[arg(long, default_value = "dataset")]
    pub color_scope: ColorScope,

    /// Exact match, `COLUMN=A|B`. Use `<null>` to admit missing values.
    #[arg(long = "where", value_name = "COLUMN=VALUES")]
    pub where_: Vec<String>,

    /// Case-insensitive substring, `COLUMN=TEXT`.
    #[arg(long, value_name = "COLUMN=TEXT")]
    pub contains: Vec<String>,

    /// Inclusive numeric range, `COLUMN=MIN..MAX`; either side may be empty.
    #[arg(long, value_name = "COLUMN=MIN..MAX")]
    pub range: Vec<String>,

    /// Inclusive date range, `COLUMN=START..END`; either side may be empty.
    #[arg(long, value_name = "COLUMN=START..END")]
    pub date_range: Vec<String>,

    /// Rows shown in each console table preview.
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,
}

fn split_assignment(arg: &str) -> Result<(Column, &str), TrackerError> {
    let (col, rest) = arg
        .split_once('=')
        .ok_or_else(|| TrackerError::MalformedFilter(arg.to_string()))?;
    let column = col
        .trim()
        .parse::<Column>()
        .map_err(|_| TrackerError::UnknownColumn(col.trim().to_string()))?;
    Ok((column, rest))
}

/// `a..b`, `a..`, `..b` or a single `a` meaning `a..a`.
fn split_range(s: &str) -> (Option<&str>, Option<&str>) {
    fn non_empty(p: &str) -> Option<&str> {
        Some(p.trim()).filter(|p| !p.is_empty())
    }
    match s.split_once("..") {
        Some((lo, hi)) => (non_empty(lo), non_empty(hi)),
        None => (non_empty(s), non_empty(s)),
    }
}

fn parse_bound<T: std::str::FromStr>(arg: &str, s: Option<&str>) -> Result<Option<T>, TrackerError> {
    s.map(|v| v.replace(',', "").parse::<T>())
        .transpose()
        .map_err(|_| TrackerError::MalformedFilter(arg.to_string()))
}

pub fn parse_year_range(arg: &str) -> Result<(i32, i32), TrackerError> {
    let (lo, hi) = split_range(arg);
    match (parse_bound::<i32>(arg, lo)?, parse_bound::<i32>(arg, hi)?) {
        (Some(lo), Some(hi)) => Ok((lo, hi)),
        _ => Err(TrackerError::MalformedFilter(arg.to_string())),
    }
}

fn typed_value(column: Column, raw: &str) -> Result<Value, TrackerError> {
    let raw = raw.trim();
    if raw == NULL_TOKEN {
        return Ok(Value::Null);
    }
    let bad = || TrackerError::MalformedFilter(format!("{}={}", column, raw));
    Ok(match column {
        Column::StartYear | Column::CompletionYear => Value::Int(raw.parse().map_err(|_| bad())?),
        Column::ContractCost | Column::Latitude | Column::Longitude => {
            Value::Number(raw.replace(',', "").parse().map_err(|_| bad())?)
        }
        _ => Value::Text(raw.to_string()),
    })
}

/// Free-form predicates from `--where`, `--contains`, `--range`, `--date-range`.
pub fn parse_predicates(
    wheres: &[String],
    contains: &[String],
    ranges: &[String],
    date_ranges: &[String],
) -> Result<FilterSpec, TrackerError> {
    let mut spec = FilterSpec::new();
    for arg in wheres {
        let (col, rest) = split_assignment(arg)?;
        let values = rest.split('|').map(|v| typed_value(col, v)).collect::<Result<Vec<_>, _>>()?;
        spec = spec.one_of(col, values);
    }
    for arg in contains {
        let (col, rest) = split_assignment(arg)?;
        spec = spec.contains(col, rest);
    }
    for arg in ranges {
        let (col, rest) = split_assignment(arg)?;
        let (lo, hi) = split_range(rest);
        spec = spec.range(col, NumRange::new(parse_bound(arg, lo)?, parse_bound(arg, hi)?));
    }
    for arg in date_ranges {
        let (col, rest) = split_assignment(arg)?;
        let (lo, hi) = rest.split_once("..").unwrap_or((rest, ""));
        spec = spec.date_range(col, DateRange::parse(Some(lo), Some(hi))?);
    }
    Ok(spec)
}

impl Args {
    /// Widget state described by the flags. Unset year ranges span the dataset.
    pub fn filter_state(&self, ds: &Dataset) -> Result<FilterState, TrackerError> {
        let base = FilterState::for_dataset(ds);
        Ok(FilterState {
            region: self.region.clone(),
            province: self.province.clone(),
            municipality: self.municipality.clone(),
            type_of_work: self.type_of_work.clone(),
            contractor: self.contractor.clone(),
            start_years: match &self.start_year {
                Some(s) => Some(parse_year_range(s)?),
                None => base.start_years,
            },
            completion_years: match &self.completion_year {
                Some(s) => Some(parse_year_range(s)?),
                None => base.completion_years,
            },
            threshold: parse_threshold(&self.threshold)?,
            color_scope: self.color_scope,
            extra: parse_predicates(&self.where_, &self.contains, &self.range, &self.date_range)?,
        })
    }
}
