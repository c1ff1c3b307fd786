// Logarithmic cost-to-colour mapping.
//
// Costs are log-normalized between the smallest and largest positive cost
// and looked up on the sequential "Reds" palette.
use serde::Serialize;

/// Colour for points under the cost threshold.
pub const NEUTRAL_GRAY: &str = "#D3D3D3";

const REDS: [Rgb; 9] = [
    Rgb(0xff, 0xf5, 0xf0),
    Rgb(0xfe, 0xe0, 0xd2),
    Rgb(0xfc, 0xbb, 0xa1),
    Rgb(0xfc, 0x92, 0x72),
    Rgb(0xfb, 0x6a, 0x4a),
    Rgb(0xef, 0x3b, 0x2c),
    Rgb(0xcb, 0x18, 0x1d),
    Rgb(0xa5, 0x0f, 0x15),
    Rgb(0x67, 0x00, 0x0d),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

/// Sample the palette at `t` in `[0, 1]`.
pub fn reds(t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (REDS.len() - 1) as f64;
    let lo = pos.floor() as usize;
    if lo >= REDS.len() - 1 {
        return REDS[REDS.len() - 1];
    }
    REDS[lo].lerp(REDS[lo + 1], pos - lo as f64)
}

/// Log-scale normalization range, fitted to a set of costs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostScale {
    pub vmin: f64,
    pub vmax: f64,
}

impl CostScale {
    /// Fit over the positive costs only; zero has no logarithm.
    pub fn fit<I>(costs: I) -> CostScale
    where
        I: IntoIterator<Item = f64>,
    {
        let (mut vmin, mut vmax) = (f64::MAX, f64::MIN);
        for c in costs.into_iter().filter(|c| c.is_finite() && *c > 0.0) {
            vmin = vmin.min(c);
            vmax = vmax.max(c);
        }
        if vmin > vmax {
            return CostScale { vmin: 1.0, vmax: 1.0 };
        }
        CostScale { vmin, vmax }
    }

    pub fn normalize(&self, cost: f64) -> f64 {
        if !(cost > 0.0) {
            return 0.0;
        }
        let span = self.vmax.ln() - self.vmin.ln();
        if span.abs() < f64::EPSILON {
            return 0.0;
        }
        ((cost.ln() - self.vmin.ln()) / span).clamp(0.0, 1.0)
    }

    pub fn color(&self, cost: f64) -> String {
        reds(self.normalize(cost)).to_hex()
    }
}
