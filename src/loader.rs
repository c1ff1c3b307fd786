use crate::colormap::CostScale;
use crate::error::TrackerError;
use crate::types::{ProjectRecord, RawProperties};
use crate::util::{coerce_date, json_f64, json_text, json_year};
use chrono::Datelike;
use geojson::{Feature, GeoJson};
use log::{debug, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_features: usize,
    pub kept_rows: usize,
    pub skipped_rows: usize,
    pub missing_coords: usize,
    pub unparsed_dates: usize,
}

/// The project table, loaded once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<ProjectRecord>,
    /// Colour range over every record, so colours stay comparable across filters.
    pub cost_scale: CostScale,
}

impl Dataset {
    pub fn new(records: Vec<ProjectRecord>) -> Dataset {
        let cost_scale = CostScale::fit(records.iter().map(|r| r.contract_cost));
        Dataset { records, cost_scale }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn start_year_bounds(&self) -> Option<(i32, i32)> {
        year_bounds(self.records.iter().filter_map(|r| r.start_year))
    }

    pub fn completion_year_bounds(&self) -> Option<(i32, i32)> {
        year_bounds(self.records.iter().filter_map(|r| r.completion_year))
    }
}

fn year_bounds(years: impl Iterator<Item = i32>) -> Option<(i32, i32)> {
    years.fold(None, |acc, y| match acc {
        None => Some((y, y)),
        Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
    })
}

pub fn load_dataset(path: impl AsRef<Path>) -> Result<(Dataset, LoadReport), TrackerError> {
    let path = path.as_ref();
    info!("Reading {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let geojson = GeoJson::from_reader(reader)?;
    load_geojson(geojson)
}

#[cfg(test)]
pub fn load_geojson_str(s: &str) -> Result<(Dataset, LoadReport), TrackerError> {
    load_geojson(s.parse::<GeoJson>()?)
}

fn load_geojson(geojson: GeoJson) -> Result<(Dataset, LoadReport), TrackerError> {
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(_) => return Err(TrackerError::NotAFeatureCollection("Feature".into())),
        GeoJson::Geometry(_) => return Err(TrackerError::NotAFeatureCollection("Geometry".into())),
    };

    let mut report = LoadReport { total_features: features.len(), ..LoadReport::default() };
    let mut records = Vec::with_capacity(features.len());

    for (idx, feature) in features.into_iter().enumerate() {
        match clean_feature(feature, &mut report) {
            Some(r) => records.push(r),
            None => {
                debug!("Skipping feature {} without a usable ContractCost", idx);
                report.skipped_rows += 1;
            }
        }
    }

    report.kept_rows = records.len();
    if report.skipped_rows > 0 {
        warn!("{} features skipped due to missing or invalid ContractCost", report.skipped_rows);
    }
    if records.is_empty() {
        return Err(TrackerError::EmptyDataset);
    }
    info!(
        "Loaded {} projects ({} without coordinates, {} with unparsed StartDate)",
        report.kept_rows, report.missing_coords, report.unparsed_dates
    );
    Ok((Dataset::new(records), report))
}

fn clean_feature(feature: Feature, report: &mut LoadReport) -> Option<ProjectRecord> {
    let props: RawProperties = match feature.properties {
        Some(map) => serde_json::from_value(serde_json::Value::Object(map)).unwrap_or_default(),
        None => RawProperties::default(),
    };

    let contract_cost = match json_f64(props.contract_cost.as_ref()) {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => return None,
    };

    let raw_date = json_text(props.start_date.as_ref());
    let start_date = coerce_date(raw_date.as_deref());
    if raw_date.is_some() && start_date.is_none() {
        report.unparsed_dates += 1;
    }

    let (lon, lat) = match feature.geometry.map(|g| g.value) {
        Some(geojson::Value::Point(p)) if p.len() >= 2 => (Some(p[0]), Some(p[1])),
        _ => (None, None),
    };

    let record = ProjectRecord {
        region: json_text(props.region.as_ref()),
        province: json_text(props.province.as_ref()),
        municipality: json_text(props.municipality.as_ref()),
        type_of_work: json_text(props.type_of_work.as_ref()),
        contractor: json_text(props.contractor.as_ref()),
        contract_cost,
        start_date,
        start_year: start_date.map(|d| d.year()),
        completion_year: json_year(props.completion_year.as_ref()),
        lat,
        lon,
    };
    if record.coords().is_none() {
        report.missing_coords += 1;
    }
    Some(record)
}
