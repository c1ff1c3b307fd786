// Map builder: one circle per project plus a viewport policy.
use crate::colormap::CostScale;
use crate::tooltip::project_tooltip;
use crate::types::ProjectRecord;
use serde::Serialize;

/// Roughly the middle of the archipelago.
pub const DEFAULT_CENTER: (f64, f64) = (13.0, 122.0);
pub const DEFAULT_ZOOM: f64 = 5.5;
pub const SINGLE_POINT_ZOOM: f64 = 12.0;
pub const FIT_PADDING: (u32, u32) = (30, 30);
pub const FILL_OPACITY: f64 = 0.7;

const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors &copy; CARTO";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url: String,
    pub attribution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleMarker {
    pub lat: f64,
    pub lon: f64,
    pub color: String,
    pub fill_opacity: f64,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Viewport {
    /// Nothing to fit; keep the default view.
    Default { center: (f64, f64), zoom: f64 },
    /// A single point, shown up close.
    Centered { center: (f64, f64), zoom: f64 },
    FitBounds { south_west: (f64, f64), north_east: (f64, f64), padding: (u32, u32) },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub tiles: TileLayer,
    pub markers: Vec<CircleMarker>,
    pub viewport: Viewport,
}

/// Viewport for a set of `(lat, lon)` points.
pub fn viewport_for(coords: &[(f64, f64)]) -> Viewport {
    match coords {
        [] => Viewport::Default { center: DEFAULT_CENTER, zoom: DEFAULT_ZOOM },
        [only] => Viewport::Centered { center: *only, zoom: SINGLE_POINT_ZOOM },
        [first, rest @ ..] => {
            let (mut sw, mut ne) = (*first, *first);
            for (lat, lon) in rest {
                sw = (sw.0.min(*lat), sw.1.min(*lon));
                ne = (ne.0.max(*lat), ne.1.max(*lon));
            }
            Viewport::FitBounds { south_west: sw, north_east: ne, padding: FIT_PADDING }
        }
    }
}

/// Rows without coordinates get no marker and do not count toward bounds.
pub fn build_map(rows: &[&ProjectRecord], scale: &CostScale) -> MapView {
    let markers: Vec<CircleMarker> = rows
        .iter()
        .filter_map(|r| {
            let (lat, lon) = r.coords()?;
            Some(CircleMarker {
                lat,
                lon,
                color: scale.color(r.contract_cost),
                fill_opacity: FILL_OPACITY,
                tooltip: project_tooltip(r.municipality.as_deref(), r),
            })
        })
        .collect();
    let coords: Vec<(f64, f64)> = markers.iter().map(|m| (m.lat, m.lon)).collect();
    MapView {
        tiles: TileLayer { url: TILE_URL.to_string(), attribution: TILE_ATTRIBUTION.to_string() },
        viewport: viewport_for(&coords),
        markers,
    }
}
