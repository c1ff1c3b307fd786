// Chart builders.
//
// Each builder turns aggregated or filtered rows into a plain chart model.
// `to_plotly` on a model produces the Plotly figure JSON the dashboard page
// embeds; the models themselves carry no rendering state.
use crate::aggregate::{GroupKey, Ranking};
use crate::colormap::{CostScale, NEUTRAL_GRAY};
use crate::tooltip::project_tooltip;
use crate::types::{region_rank, Cell, DrillLevel, ProjectRecord};
use crate::util::{format_millions, format_number};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

pub const BAR_COLOR: &str = "#7B2D26";
pub const THRESHOLD_COLOR: &str = "#0B7A75";
pub const UNSPECIFIED_BAND: &str = "Unspecified";
const FONT_FAMILY: &str = "Montserrat, sans-serif";
const TOP_CONTRACTORS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub orientation: Orientation,
    /// Display order: left to right, or top to bottom when horizontal.
    pub bars: Vec<Bar>,
    pub color: String,
    /// Category axis shows integer steps only.
    pub integer_ticks: bool,
    pub value_gridlines: bool,
    pub height: Option<u32>,
}

fn value_label(value: f64, currency: bool) -> String {
    if currency {
        format_millions(value, 1)
    } else {
        format_number(value, 0)
    }
}

/// One bar per start year present in `grouped`.
pub fn yearly_bar_chart(grouped: &BTreeMap<GroupKey, f64>, currency: bool) -> BarChart {
    let bars = grouped
        .iter()
        .map(|(k, v)| Bar { label: k.to_string(), value: *v, text: value_label(*v, currency) })
        .collect();
    BarChart {
        orientation: Orientation::Vertical,
        bars,
        color: BAR_COLOR.to_string(),
        integer_ticks: true,
        value_gridlines: false,
        height: None,
    }
}

/// Horizontal ranking, largest first, at most 20 bars.
pub fn contractor_bar_chart(ranking: &Ranking, currency: bool) -> BarChart {
    let mut entries: Vec<_> = ranking.entries.iter().collect();
    entries.sort_by(|a, b| b.metric.partial_cmp(&a.metric).unwrap_or(Ordering::Equal));
    let bars = entries
        .into_iter()
        .take(TOP_CONTRACTORS)
        .map(|e| Bar { label: e.name.clone(), value: e.metric, text: value_label(e.metric, currency) })
        .collect();
    BarChart {
        orientation: Orientation::Horizontal,
        bars,
        color: BAR_COLOR.to_string(),
        integer_ticks: false,
        value_gridlines: true,
        height: Some(800),
    }
}

impl BarChart {
    pub fn to_plotly(&self) -> JsonValue {
        let labels: Vec<&str> = self.bars.iter().map(|b| b.label.as_str()).collect();
        let values: Vec<f64> = self.bars.iter().map(|b| b.value).collect();
        let texts: Vec<&str> = self.bars.iter().map(|b| b.text.as_str()).collect();

        let (trace, layout) = match self.orientation {
            Orientation::Vertical => {
                let trace = json!({
                    "type": "bar", "x": labels, "y": values, "text": texts,
                    "textposition": "outside", "textfont": { "size": 12 },
                    "marker": { "color": self.color },
                    "hovertemplate": "%{x}: %{text}<extra></extra>",
                });
                let xaxis = if self.integer_ticks {
                    json!({ "title": { "text": null }, "tickmode": "linear", "dtick": 1 })
                } else {
                    json!({ "title": { "text": null }, "type": "category" })
                };
                let layout = json!({
                    "xaxis": xaxis,
                    "yaxis": { "visible": false, "showgrid": self.value_gridlines },
                });
                (trace, layout)
            }
            Orientation::Horizontal => {
                let trace = json!({
                    "type": "bar", "orientation": "h", "x": values, "y": labels, "text": texts,
                    "textposition": "outside", "cliponaxis": false,
                    "marker": { "color": self.color },
                    "hovertemplate": "%{y}: %{text}<extra></extra>",
                });
                let layout = json!({
                    "xaxis": { "title": { "text": null }, "showgrid": self.value_gridlines },
                    "yaxis": {
                        "title": { "text": null }, "autorange": "reversed",
                        "type": "category", "automargin": true,
                    },
                    "autosize": true,
                });
                (trace, layout)
            }
        };

        let mut layout = layout;
        merge_base_layout(&mut layout);
        if let Some(h) = self.height {
            layout["height"] = json!(h);
        }
        json!({ "data": [trace], "layout": layout })
    }
}

fn merge_base_layout(layout: &mut JsonValue) {
    layout["font"] = json!({ "family": FONT_FAMILY, "size": 14, "color": "black" });
    layout["uniformtext"] = json!({ "minsize": 10 });
    layout["plot_bgcolor"] = json!("white");
    layout["paper_bgcolor"] = json!("white");
    layout["margin"] = json!({ "t": 30, "r": 20 });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripPoint {
    pub band: String,
    pub cost: f64,
    pub color: String,
    pub tooltip: String,
}

/// Background stripe behind a band, in category-axis units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandStripe {
    pub y0: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub x: f64,
    pub color: String,
    pub dash: String,
    pub width: u32,
    pub annotation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripChart {
    pub level: DrillLevel,
    /// Band order, first band first.
    pub bands: Vec<String>,
    pub points: Vec<StripPoint>,
    pub stripes: Vec<BandStripe>,
    pub threshold_line: ReferenceLine,
}

/// Colour for a point in the distribution chart: gray below the threshold,
/// the cost-gradient colour at or above it.
pub fn threshold_color(cost: f64, threshold: f64, scale: &CostScale) -> String {
    if cost < threshold {
        NEUTRAL_GRAY.to_string()
    } else {
        scale.color(cost)
    }
}

fn band_label(r: &ProjectRecord, level: DrillLevel) -> Option<&str> {
    match level.column().cell(r) {
        Cell::Text(s) => Some(s),
        _ => None,
    }
}

/// Regions follow the fixed order with unknown names after them; other
/// levels sort alphabetically. Missing units go last.
pub fn band_order(rows: &[&ProjectRecord], level: DrillLevel) -> Vec<String> {
    let present: HashSet<Option<&str>> = rows.iter().map(|r| band_label(r, level)).collect();
    let mut named: Vec<&str> = present.iter().flatten().copied().collect();
    named.sort_by(|a, b| {
        let rank = |s: &str| match level {
            DrillLevel::Region => region_rank(s).unwrap_or(usize::MAX),
            _ => 0,
        };
        rank(*a).cmp(&rank(*b)).then_with(|| a.cmp(b))
    });
    let mut bands: Vec<String> = named.into_iter().map(str::to_string).collect();
    if present.contains(&None) {
        bands.push(UNSPECIFIED_BAND.to_string());
    }
    bands
}

pub fn strip_chart(
    rows: &[&ProjectRecord],
    level: DrillLevel,
    scale: &CostScale,
    threshold: f64,
) -> StripChart {
    let bands = band_order(rows, level);
    let points = rows
        .iter()
        .map(|r| {
            let location = band_label(r, level);
            StripPoint {
                band: location.unwrap_or(UNSPECIFIED_BAND).to_string(),
                cost: r.contract_cost,
                color: threshold_color(r.contract_cost, threshold, scale),
                tooltip: project_tooltip(location, r),
            }
        })
        .collect();
    let stripes = (0..bands.len())
        .step_by(2)
        .map(|i| BandStripe { y0: i as f64 - 0.5, y1: i as f64 + 0.5 })
        .collect();
    let threshold_line = ReferenceLine {
        x: threshold,
        color: THRESHOLD_COLOR.to_string(),
        dash: "dot".to_string(),
        width: 2,
        annotation: format!("> Php {}M", (threshold / 1_000_000.0).floor() as i64),
    };
    StripChart { level, bands, points, stripes, threshold_line }
}

impl StripChart {
    pub fn to_plotly(&self) -> JsonValue {
        // One trace per colour, the way a colour-mapped strip plot splits them.
        let mut by_color: BTreeMap<&str, Vec<&StripPoint>> = BTreeMap::new();
        for p in &self.points {
            by_color.entry(p.color.as_str()).or_default().push(p);
        }
        let data: Vec<JsonValue> = by_color
            .into_iter()
            .map(|(color, pts)| {
                json!({
                    "type": "box", "orientation": "h", "boxpoints": "all",
                    "jitter": 0.4, "pointpos": 0, "hoveron": "points",
                    "x": pts.iter().map(|p| p.cost).collect::<Vec<_>>(),
                    "y": pts.iter().map(|p| p.band.as_str()).collect::<Vec<_>>(),
                    "text": pts.iter().map(|p| p.tooltip.as_str()).collect::<Vec<_>>(),
                    "hovertemplate": "%{text}<extra></extra>",
                    "marker": { "color": color, "size": 8, "opacity": 0.7 },
                    "fillcolor": "rgba(255,255,255,0)",
                    "line": { "color": "rgba(255,255,255,0)" },
                    "showlegend": false,
                })
            })
            .collect();

        let mut shapes: Vec<JsonValue> = self
            .stripes
            .iter()
            .map(|s| {
                json!({
                    "type": "rect", "xref": "paper", "x0": 0, "x1": 1,
                    "yref": "y", "y0": s.y0, "y1": s.y1,
                    "fillcolor": "lightgrey", "opacity": 0.2,
                    "line": { "width": 0 }, "layer": "below",
                })
            })
            .collect();
        let line = &self.threshold_line;
        shapes.push(json!({
            "type": "line", "xref": "x", "x0": line.x, "x1": line.x,
            "yref": "paper", "y0": 0, "y1": 1,
            "line": { "color": line.color, "width": line.width, "dash": line.dash },
        }));

        let mut layout = json!({
            "xaxis": { "title": { "text": "Contract Cost" } },
            "yaxis": {
                "title": { "text": null }, "showgrid": false, "type": "category",
                "categoryorder": "array", "categoryarray": self.bands,
                "autorange": "reversed", "automargin": true,
            },
            "shapes": shapes,
            "annotations": [{
                "x": line.x, "xref": "x", "y": 1, "yref": "paper", "yanchor": "bottom",
                "text": line.annotation, "showarrow": false,
            }],
            "showlegend": false,
            "height": 800,
            "boxmode": "overlay",
            "hoverlabel": {
                "font": { "size": 13, "color": "black" },
                "bgcolor": "white", "bordercolor": "#ccc",
            },
        });
        merge_base_layout(&mut layout);
        json!({ "data": data, "layout": layout })
    }
}
