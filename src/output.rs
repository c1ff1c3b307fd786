use crate::dashboard::ViewModel;
use crate::error::TrackerError;
use crate::html;
use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub const DASHBOARD_FILE: &str = "dashboard.html";
pub const VIEW_MODEL_FILE: &str = "view_model.json";
pub const YEARLY_FILE: &str = "yearly_summary.csv";
pub const CONTRACTORS_COST_FILE: &str = "contractors_by_cost.csv";
pub const CONTRACTORS_COUNT_FILE: &str = "contractors_by_count.csv";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), TrackerError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), TrackerError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Write every artifact of one render into `dir`. Returns the page path.
pub fn write_dashboard(
    dir: &Path,
    view: &ViewModel,
    loaded_at: DateTime<Local>,
) -> Result<PathBuf, TrackerError> {
    std::fs::create_dir_all(dir)?;
    let page = dir.join(DASHBOARD_FILE);
    std::fs::write(&page, html::render_page(view, loaded_at)?)?;
    write_json(&dir.join(VIEW_MODEL_FILE), view)?;
    write_csv(&dir.join(YEARLY_FILE), &view.yearly_table)?;
    write_csv(&dir.join(CONTRACTORS_COST_FILE), &view.contractors_by_cost_table)?;
    write_csv(&dir.join(CONTRACTORS_COUNT_FILE), &view.contractors_by_count_table)?;
    info!("Dashboard written to {}", page.display());
    Ok(page)
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    preview_table_rows(rows, max_rows);
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
