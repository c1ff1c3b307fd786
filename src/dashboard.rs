// Dashboard controller.
//
// `render` is the whole pipeline for one interaction: widget state in,
// everything the page shows out. It borrows the dataset and never keeps
// anything between calls.
use crate::aggregate::{count_by, rank_top, ranking_rows, sum_by, yearly_rows};
use crate::charts::{contractor_bar_chart, strip_chart, yearly_bar_chart, BarChart, StripChart};
use crate::colormap::CostScale;
use crate::error::TrackerError;
use crate::filter::{apply_filters, FilterSpec, NumRange};
use crate::loader::Dataset;
use crate::map::{build_map, MapView};
use crate::types::{Column, ContractorRow, DrillLevel, ProjectRecord, Value, YearlyRow, REGION_ORDER};
use log::debug;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use strum_macros::{Display, EnumString};

pub const TITLE: &str = "PH Flood Control Project Tracker";
pub const THRESHOLD_MIN: u64 = 1_000_000;
pub const THRESHOLD_MAX: u64 = 290_000_000;
pub const THRESHOLD_STEP: u64 = 1_000_000;
pub const DEFAULT_THRESHOLD: u64 = 100_000_000;
const TOP_CONTRACTORS: usize = 20;

static THRESHOLD_OPTIONS: Lazy<Vec<(String, u64)>> = Lazy::new(|| {
    (THRESHOLD_MIN..=THRESHOLD_MAX)
        .step_by(THRESHOLD_STEP as usize)
        .map(|v| (format!("{}M", v / 1_000_000), v))
        .collect()
});

/// Threshold selector options as `(label, value)`, e.g. `("100M", 100_000_000)`.
pub fn threshold_options() -> &'static [(String, u64)] {
    &THRESHOLD_OPTIONS
}

/// Accepts an option label (`"100M"`) or a raw peso amount that lands on a step.
pub fn parse_threshold(s: &str) -> Result<u64, TrackerError> {
    let s = s.trim();
    if let Some((_, v)) = threshold_options().iter().find(|(label, _)| label.eq_ignore_ascii_case(s)) {
        return Ok(*v);
    }
    let v: u64 = s
        .replace(',', "")
        .parse()
        .map_err(|_| TrackerError::InvalidThreshold(s.to_string()))?;
    validate_threshold(v)
}

pub fn validate_threshold(v: u64) -> Result<u64, TrackerError> {
    if threshold_options().iter().any(|(_, o)| *o == v) {
        Ok(v)
    } else {
        Err(TrackerError::InvalidThreshold(v.to_string()))
    }
}

/// Which cost range the marker colours are fitted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ColorScope {
    /// Whole dataset; colours are comparable across filters.
    #[default]
    Dataset,
    /// Only the rows that pass the current filter.
    Filtered,
}

/// Widget state for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub region: Option<String>,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub type_of_work: Option<String>,
    pub contractor: Option<String>,
    pub start_years: Option<(i32, i32)>,
    pub completion_years: Option<(i32, i32)>,
    pub threshold: u64,
    pub color_scope: ColorScope,
    /// Free-form predicates on top of the widgets.
    pub extra: FilterSpec,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            region: None,
            province: None,
            municipality: None,
            type_of_work: None,
            contractor: None,
            start_years: None,
            completion_years: None,
            threshold: DEFAULT_THRESHOLD,
            color_scope: ColorScope::default(),
            extra: FilterSpec::default(),
        }
    }
}

impl FilterState {
    /// Fresh state with both year sliders spanning the dataset.
    pub fn for_dataset(ds: &Dataset) -> FilterState {
        FilterState {
            start_years: ds.start_year_bounds(),
            completion_years: ds.completion_year_bounds(),
            ..FilterState::default()
        }
    }

    pub fn to_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::new();
        let selections = [
            (Column::Region, &self.region),
            (Column::Province, &self.province),
            (Column::Municipality, &self.municipality),
            (Column::TypeOfWork, &self.type_of_work),
            (Column::Contractor, &self.contractor),
        ];
        for (col, sel) in selections {
            spec = spec.equals_if_set(col, sel.as_deref());
        }
        let years = [(Column::StartYear, self.start_years), (Column::CompletionYear, self.completion_years)];
        for (col, range) in years {
            if let Some((lo, hi)) = range {
                spec = spec.range(col, NumRange::new(Some(f64::from(lo)), Some(f64::from(hi))));
            }
        }
        spec.extend(self.extra.clone());
        spec
    }

    /// Deepest administrative level implied by the selections.
    pub fn drill_level(&self) -> DrillLevel {
        if self.municipality.is_some() || self.province.is_some() {
            DrillLevel::Municipality
        } else if self.region.is_some() {
            DrillLevel::Province
        } else {
            DrillLevel::Region
        }
    }

    pub fn pills(&self) -> Vec<String> {
        let mut pills = Vec::new();
        let mut push = |label: &str, v: &Option<String>| {
            if let Some(v) = v {
                pills.push(format!("{}: {}", label, v));
            }
        };
        push("Region", &self.region);
        push("Province", &self.province);
        push("Municipality", &self.municipality);
        push("Type of Work", &self.type_of_work);
        if let Some((lo, hi)) = self.start_years {
            pills.push(format!("Start Year: ({}, {})", lo, hi));
        }
        if let Some((lo, hi)) = self.completion_years {
            pills.push(format!("Completion Year: ({}, {})", lo, hi));
        }
        if let Some(v) = &self.contractor {
            pills.push(format!("Contractor: {}", v));
        }
        for (col, vals) in &self.extra.equals {
            let shown: Vec<String> = vals.iter().map(display_value).collect();
            pills.push(format!("{}: {}", col, shown.join(" | ")));
        }
        for (col, frag) in &self.extra.contains {
            pills.push(format!("{} contains: {}", col, frag));
        }
        for (col, r) in &self.extra.num_ranges {
            pills.push(format!("{}: {}..{}", col, open_bound(r.min), open_bound(r.max)));
        }
        for (col, r) in &self.extra.date_ranges {
            pills.push(format!("{}: {}..{}", col, open_bound(r.start), open_bound(r.end)));
        }
        pills
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::Text(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "(none)".to_string(),
    }
}

fn open_bound<T: ToString>(b: Option<T>) -> String {
    b.map(|v| v.to_string()).unwrap_or_default()
}

/// Choices offered by the sidebar widgets for the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub provinces: Vec<String>,
    pub municipalities: Vec<String>,
    pub types_of_work: Vec<String>,
    pub contractors: Vec<String>,
    pub start_year_bounds: Option<(i32, i32)>,
    pub completion_year_bounds: Option<(i32, i32)>,
}

fn sorted_unique<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values.flatten().collect::<BTreeSet<_>>().into_iter().map(str::to_string).collect()
}

fn first_seen<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.flatten().filter(|v| seen.insert(*v)).map(str::to_string).collect()
}

impl FilterOptions {
    /// Province choices narrow to the selected region; municipality choices
    /// to the selected province, else the selected region.
    pub fn for_state(ds: &Dataset, state: &FilterState) -> FilterOptions {
        let rows = &ds.records;
        let in_region = |r: &&ProjectRecord| state.region.is_none() || r.region == state.region;
        let provinces = sorted_unique(rows.iter().filter(in_region).map(|r| r.province.as_deref()));
        let municipalities = match &state.province {
            Some(_) => sorted_unique(
                rows.iter().filter(|r| r.province == state.province).map(|r| r.municipality.as_deref()),
            ),
            None => sorted_unique(rows.iter().filter(in_region).map(|r| r.municipality.as_deref())),
        };
        FilterOptions {
            regions: REGION_ORDER.iter().map(|s| s.to_string()).collect(),
            provinces,
            municipalities,
            types_of_work: first_seen(rows.iter().map(|r| r.type_of_work.as_deref())),
            contractors: first_seen(rows.iter().map(|r| r.contractor.as_deref())),
            start_year_bounds: ds.start_year_bounds(),
            completion_year_bounds: ds.completion_year_bounds(),
        }
    }
}

/// Everything one render of the dashboard shows.
#[derive(Debug, Clone, Serialize)]
pub struct ViewModel {
    pub title: String,
    pub pills: Vec<String>,
    pub matching_projects: usize,
    pub total_projects: usize,
    pub map: MapView,
    pub projects_by_year: BarChart,
    pub cost_by_year: BarChart,
    pub distribution_title: String,
    pub threshold_label: String,
    pub distribution: StripChart,
    pub contractors_by_cost: BarChart,
    pub contractors_by_cost_text: String,
    pub contractors_by_count: BarChart,
    pub contractors_by_count_text: String,
    pub yearly_table: Vec<YearlyRow>,
    pub contractors_by_cost_table: Vec<ContractorRow>,
    pub contractors_by_count_table: Vec<ContractorRow>,
}

pub fn render(ds: &Dataset, state: &FilterState) -> Result<ViewModel, TrackerError> {
    let threshold = validate_threshold(state.threshold)?;
    let rows = apply_filters(&ds.records, &state.to_spec());
    debug!("{} of {} projects match the current filters", rows.len(), ds.len());

    let scale = match state.color_scope {
        ColorScope::Dataset => ds.cost_scale,
        ColorScope::Filtered => CostScale::fit(rows.iter().map(|r| r.contract_cost)),
    };
    let level = state.drill_level();

    let by_cost = rank_top(sum_by(&rows, Column::Contractor, Column::ContractCost), TOP_CONTRACTORS);
    let by_count = rank_top(count_by(&rows, Column::Contractor), TOP_CONTRACTORS);

    Ok(ViewModel {
        title: TITLE.to_string(),
        pills: state.pills(),
        matching_projects: rows.len(),
        total_projects: ds.len(),
        map: build_map(&rows, &scale),
        projects_by_year: yearly_bar_chart(&count_by(&rows, Column::StartYear), false),
        cost_by_year: yearly_bar_chart(&sum_by(&rows, Column::StartYear, Column::ContractCost), true),
        distribution_title: format!("Contract Cost by {}", level),
        threshold_label: format!("{}M", threshold / 1_000_000),
        distribution: strip_chart(&rows, level, &scale, threshold as f64),
        contractors_by_cost: contractor_bar_chart(&by_cost, true),
        contractors_by_cost_text: by_cost.covered_text(),
        contractors_by_count: contractor_bar_chart(&by_count, false),
        contractors_by_count_text: by_count.covered_text(),
        yearly_table: yearly_rows(&rows),
        contractors_by_cost_table: ranking_rows(&by_cost, true),
        contractors_by_count_table: ranking_rows(&by_count, false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::NEUTRAL_GRAY;
    use crate::map::Viewport;
    use crate::test_support::sample_records;

    fn dataset() -> Dataset {
        Dataset::new(sample_records())
    }

    #[test]
    fn threshold_options_cover_one_to_290_million() {
        let opts = threshold_options();
        assert_eq!(opts.len(), 290);
        assert_eq!(opts[0], ("1M".to_string(), 1_000_000));
        assert_eq!(opts[289], ("290M".to_string(), 290_000_000));
        assert_eq!(parse_threshold("100M").unwrap(), DEFAULT_THRESHOLD);
        assert_eq!(parse_threshold("25,000,000").unwrap(), 25_000_000);
        assert!(matches!(parse_threshold("0.5M"), Err(TrackerError::InvalidThreshold(_))));
        assert!(matches!(parse_threshold("291000000"), Err(TrackerError::InvalidThreshold(_))));
        assert!(validate_threshold(1_500_000).is_err());
    }

    #[test]
    fn drill_level_follows_selection_depth() {
        let mut state = FilterState::default();
        assert_eq!(state.drill_level(), DrillLevel::Region);
        state.region = Some("Region III".into());
        assert_eq!(state.drill_level(), DrillLevel::Province);
        state.province = Some("Bulacan".into());
        assert_eq!(state.drill_level(), DrillLevel::Municipality);
        state.province = None;
        state.municipality = Some("Malolos".into());
        assert_eq!(state.drill_level(), DrillLevel::Municipality);
    }

    #[test]
    fn default_state_renders_everything() {
        let ds = dataset();
        let view = render(&ds, &FilterState::for_dataset(&ds)).unwrap();
        assert_eq!(view.matching_projects, 6);
        assert_eq!(view.distribution_title, "Contract Cost by Region");
        assert_eq!(view.threshold_label, "100M");
        assert_eq!(view.projects_by_year.bars.len(), 4);
        assert_eq!(view.contractors_by_cost.bars[0].label, "BRAVO CORP");
        assert_eq!(view.contractors_by_cost_text, "100% of the contracts are awarded to these contractors.");
        assert!(matches!(view.map.viewport, Viewport::FitBounds { .. }));
        assert_eq!(view.pills, vec!["Start Year: (2020, 2023)", "Completion Year: (2021, 2024)"]);
    }

    #[test]
    fn region_selection_drills_to_provinces() {
        let ds = dataset();
        let state = FilterState { region: Some("Region III".into()), ..FilterState::default() };
        let view = render(&ds, &state).unwrap();
        assert_eq!(view.matching_projects, 3);
        assert_eq!(view.distribution_title, "Contract Cost by Province");
        assert_eq!(view.distribution.bands, vec!["Bulacan", "Pampanga"]);
        assert_eq!(view.pills, vec!["Region: Region III"]);
    }

    #[test]
    fn unmatched_selection_renders_empty_view() {
        let ds = dataset();
        let state = FilterState { contractor: Some("NOBODY".into()), ..FilterState::default() };
        let view = render(&ds, &state).unwrap();
        assert_eq!(view.matching_projects, 0);
        assert!(view.map.markers.is_empty());
        assert!(matches!(view.map.viewport, Viewport::Default { .. }));
        assert!(view.projects_by_year.bars.is_empty());
        assert_eq!(view.contractors_by_count_text, "0% of the contracts are awarded to these contractors.");
    }

    #[test]
    fn single_match_centers_map() {
        let ds = dataset();
        let state = FilterState { municipality: Some("Manila".into()), ..FilterState::default() };
        let view = render(&ds, &state).unwrap();
        assert_eq!(
            view.map.viewport,
            Viewport::Centered { center: (14.5995, 120.9842), zoom: crate::map::SINGLE_POINT_ZOOM }
        );
    }

    #[test]
    fn threshold_grays_out_cheaper_projects() {
        let ds = dataset();
        let state = FilterState { threshold: 200_000_000, ..FilterState::default() };
        let view = render(&ds, &state).unwrap();
        let gray = view.distribution.points.iter().filter(|p| p.color == NEUTRAL_GRAY).count();
        assert_eq!(gray, 5);
        assert_eq!(view.distribution.threshold_line.annotation, "> Php 200M");

        let bad = FilterState { threshold: 7, ..FilterState::default() };
        assert!(matches!(render(&ds, &bad), Err(TrackerError::InvalidThreshold(_))));
    }

    #[test]
    fn color_scope_controls_gradient_range() {
        let ds = dataset();
        let fixed = FilterState { region: Some("National Capital Region".into()), ..FilterState::default() };
        let rescaled = FilterState { color_scope: ColorScope::Filtered, ..fixed.clone() };
        let a = render(&ds, &fixed).unwrap();
        let b = render(&ds, &rescaled).unwrap();
        let manila = |v: &ViewModel| {
            v.map.markers.iter().find(|m| m.tooltip.contains("Manila")).unwrap().color.clone()
        };
        assert_eq!(manila(&a), ds.cost_scale.color(48_500_000.0));
        assert_eq!(manila(&b), "#fff5f0");
        assert_ne!(manila(&a), manila(&b));
    }

    #[test]
    fn options_cascade_from_region_and_province() {
        let ds = dataset();
        let all = FilterOptions::for_state(&ds, &FilterState::default());
        assert_eq!(all.regions.len(), 16);
        assert_eq!(all.provinces, vec!["Benguet", "Bulacan", "Metro Manila", "Pampanga"]);
        assert_eq!(all.contractors, vec!["ACME BUILDERS", "BRAVO CORP", "CHARLIE CONSTRUCTION", "DELTA WORKS"]);

        let region = FilterState { region: Some("Region III".into()), ..FilterState::default() };
        let opts = FilterOptions::for_state(&ds, &region);
        assert_eq!(opts.provinces, vec!["Bulacan", "Pampanga"]);
        assert_eq!(opts.municipalities, vec!["Calumpit", "Malolos", "San Fernando"]);

        let province = FilterState { province: Some("Bulacan".into()), ..region };
        let opts = FilterOptions::for_state(&ds, &province);
        assert_eq!(opts.municipalities, vec!["Calumpit", "Malolos"]);
    }

    #[test]
    fn extra_predicates_are_applied_and_shown() {
        let ds = dataset();
        let state = FilterState {
            extra: FilterSpec::new().contains(Column::Contractor, "bravo"),
            ..FilterState::default()
        };
        let view = render(&ds, &state).unwrap();
        assert_eq!(view.matching_projects, 2);
        assert_eq!(view.pills, vec!["Contractor contains: bravo"]);
    }
}
