use crate::types::ProjectRecord;
use chrono::NaiveDate;

pub fn project(
    region: Option<&str>,
    province: Option<&str>,
    cost: f64,
    start_year: Option<i32>,
    completion_year: Option<i32>,
) -> ProjectRecord {
    ProjectRecord {
        region: region.map(str::to_string),
        province: province.map(str::to_string),
        municipality: None,
        type_of_work: Some("Construction of Flood Mitigation Structure".to_string()),
        contractor: Some("ACME BUILDERS".to_string()),
        contract_cost: cost,
        start_date: start_year.and_then(|y| NaiveDate::from_ymd_opt(y, 6, 1)),
        start_year,
        completion_year,
        lat: None,
        lon: None,
    }
}

fn full(
    region: &str,
    province: &str,
    municipality: &str,
    contractor: &str,
    cost: f64,
    start_year: i32,
    (lat, lon): (f64, f64),
) -> ProjectRecord {
    ProjectRecord {
        municipality: Some(municipality.to_string()),
        contractor: Some(contractor.to_string()),
        lat: Some(lat),
        lon: Some(lon),
        ..project(Some(region), Some(province), cost, Some(start_year), Some(start_year + 1))
    }
}

pub fn sample_records() -> Vec<ProjectRecord> {
    vec![
        full("National Capital Region", "Metro Manila", "Manila", "ACME BUILDERS", 48_500_000.0, 2022, (14.5995, 120.9842)),
        full("National Capital Region", "Metro Manila", "Quezon City", "BRAVO CORP", 150_000_000.0, 2022, (14.6760, 121.0437)),
        full("Region III", "Bulacan", "Malolos", "ACME BUILDERS", 95_000_000.0, 2021, (14.8527, 120.8160)),
        full("Region III", "Pampanga", "San Fernando", "CHARLIE CONSTRUCTION", 5_000_000.0, 2020, (15.0286, 120.6898)),
        full("Region III", "Bulacan", "Calumpit", "BRAVO CORP", 210_000_000.0, 2023, (14.9161, 120.7658)),
        full("Cordillera Administrative Region", "Benguet", "La Trinidad", "DELTA WORKS", 12_000_000.0, 2021, (16.4550, 120.5870)),
    ]
}
