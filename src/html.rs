// Self-contained dashboard page.
//
// The page shell is static; the view model is serialized to JSON and drawn
// client-side with Leaflet (map) and Plotly (charts).
use crate::dashboard::ViewModel;
use crate::error::TrackerError;
use crate::tooltip::escape_html;
use crate::util::format_int;
use chrono::{DateTime, Local};
use serde_json::json;

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<link rel="preconnect" href="https://fonts.googleapis.com">
<link href="https://fonts.googleapis.com/css2?family=Montserrat:wght@300;400;600;700&display=swap" rel="stylesheet">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<style>
  body { font-family: 'Montserrat', sans-serif; margin: 2rem; color: #151E3F; }
  h5 { font-size: 1.05rem; font-weight: 600; margin: 0 0 0.75rem; }
  .pill-container { background-color: #f9fafc; padding: 10px; border-radius: 10px;
    border: 1px solid #e0e0e0; display: flex; flex-wrap: wrap; gap: 8px; margin-bottom: 1rem; }
  .pill { background-color: #19535F; color: white; padding: 5px 12px; border-radius: 20px;
    font-size: 0.9em; white-space: nowrap; }
  .card { padding: 1rem; border-radius: 10px; background-color: #f9fafc;
    border: 1px solid #e0e0e0; margin-bottom: 1rem; }
  .row { display: flex; gap: 1rem; }
  .row > div { flex: 1; min-width: 0; }
  #map { height: 800px; }
  .caption { color: #777; font-size: 0.8em; }
</style>
</head>
<body>
<h1>__TITLE__</h1>
<p>__SUMMARY__</p>
<div class="pill-container">__PILLS__</div>
<div class="row">
  <div class="card"><h5>Total Projects by Start Year</h5><div id="projects-by-year"></div></div>
  <div class="card"><h5>Total Project Cost by Start Year (Php)</h5><div id="cost-by-year"></div></div>
</div>
<div class="card">
  <h5>Flood Control Projects across the Philippines</h5>
  <div class="row">
    <div><div id="map"></div></div>
    <div><h5>__DISTRIBUTION_TITLE__ (threshold __THRESHOLD__)</h5><div id="distribution"></div></div>
  </div>
</div>
<div class="card">
  <h5>Top 20 Contractors engaged in Flood Control Projects</h5>
  <div class="row">
    <div><h5>By Contract Cost</h5><p>__COST_TEXT__</p><div id="contractors-by-cost"></div></div>
    <div><h5>By Number of Projects</h5><p>__COUNT_TEXT__</p><div id="contractors-by-count"></div></div>
  </div>
</div>
<p class="caption">Loaded at __LOADED_AT__</p>
<script>
const VIEW = __VIEW_JSON__;
const CONFIG = { displayModeBar: false, responsive: true };
for (const [id, fig] of Object.entries(VIEW.figures)) {
  Plotly.newPlot(id, fig.data, fig.layout, CONFIG);
}
const map = L.map('map', { zoomSnap: 0.5 });
L.tileLayer(VIEW.map.tiles.url, { attribution: VIEW.map.tiles.attribution, subdomains: 'abcd', maxZoom: 20 }).addTo(map);
const vp = VIEW.map.viewport;
if (vp.kind === 'fit_bounds') {
  map.fitBounds([vp.south_west, vp.north_east], { padding: vp.padding });
} else {
  map.setView(vp.center, vp.zoom);
}
for (const m of VIEW.map.markers) {
  L.circleMarker([m.lat, m.lon], {
    radius: 6, weight: 1, color: m.color, fillColor: m.color, fillOpacity: m.fill_opacity,
  }).bindTooltip(m.tooltip).addTo(map);
}
</script>
</body>
</html>
"#;

pub fn render_page(view: &ViewModel, loaded_at: DateTime<Local>) -> Result<String, TrackerError> {
    let payload = json!({
        "map": view.map,
        "figures": {
            "projects-by-year": view.projects_by_year.to_plotly(),
            "cost-by-year": view.cost_by_year.to_plotly(),
            "distribution": view.distribution.to_plotly(),
            "contractors-by-cost": view.contractors_by_cost.to_plotly(),
            "contractors-by-count": view.contractors_by_count.to_plotly(),
        },
    });
    // Keep "</script>" inside string values from closing the tag.
    let view_json = serde_json::to_string(&payload)?.replace("</", "<\\/");

    let pills: Vec<String> = view
        .pills
        .iter()
        .map(|p| format!("<span class='pill'>{}</span>", escape_html(p)))
        .collect();
    let summary = format!(
        "Showing {} of {} flood control projects.",
        format_int(view.matching_projects),
        format_int(view.total_projects)
    );

    let title = escape_html(&view.title);
    let pills = pills.join(" ");
    let distribution_title = escape_html(&view.distribution_title);
    let threshold = escape_html(&view.threshold_label);
    let cost_text = escape_html(&view.contractors_by_cost_text);
    let count_text = escape_html(&view.contractors_by_count_text);
    let loaded_at = loaded_at.format("%Y-%m-%d %H:%M:%S").to_string();

    Ok(fill_template(
        PAGE,
        &[
            ("__TITLE__", title.as_str()),
            ("__SUMMARY__", summary.as_str()),
            ("__PILLS__", pills.as_str()),
            ("__DISTRIBUTION_TITLE__", distribution_title.as_str()),
            ("__THRESHOLD__", threshold.as_str()),
            ("__COST_TEXT__", cost_text.as_str()),
            ("__COUNT_TEXT__", count_text.as_str()),
            ("__LOADED_AT__", loaded_at.as_str()),
            ("__VIEW_JSON__", view_json.as_str()),
        ],
    ))
}

/// Single left-to-right pass over `template`. Substituted text is never
/// scanned again, so data containing a marker stays literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("__") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(marker, _)| tail.starts_with(marker)) {
            Some((marker, value)) => {
                out.push_str(value);
                rest = &tail[marker.len()..];
            }
            None => {
                out.push_str("__");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}
