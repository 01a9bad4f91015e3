//! Page settings read from the query string, plus the tuning constants shared
//! by the simulation modules.

use web_sys::window;

// --- Bounce --------------------------------------------------------------------

/// Default sprite speed in CSS pixels per frame (scaled by devicePixelRatio).
pub const DEFAULT_SPEED: f64 = 1.0;
/// Distance in CSS pixels the sprite may overlap an edge before it reverses.
pub const BOUNCE_MARGIN_CSS: f64 = 32.0;

// --- Selection -----------------------------------------------------------------

/// One in `SPECIAL_ODDS` loads shows the special image.
pub const SPECIAL_ODDS: u32 = 70;
/// The draw in `0..SPECIAL_ODDS` that picks the special image.
pub const SPECIAL_SENTINEL: u32 = SPECIAL_ODDS - 1;
/// Reaching this load count forces the special image.
pub const SPECIAL_LOAD_COUNT: u32 = 42;
/// Redraw cap for the no-repeat rule.
pub const MAX_REDRAWS: usize = 32;

// --- Fireworks -----------------------------------------------------------------

pub const PARTICLES_PER_BURST: usize = 42;
pub const PARTICLE_RADIUS_MIN: u32 = 16;
pub const PARTICLE_RADIUS_MAX: u32 = 32;
pub const PARTICLE_FINAL_RADIUS: f64 = 0.1;
pub const PARTICLE_DISTANCE_MIN: u32 = 384;
pub const PARTICLE_DISTANCE_MAX: u32 = 640;
pub const BURST_DURATION_MIN_MS: u32 = 1500;
pub const BURST_DURATION_MAX_MS: u32 = 2000;

/// Settings controlled by URL query parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    /// Per-frame speed before devicePixelRatio scaling.
    pub speed: f64,
    /// `?click` enables pointer-triggered bursts.
    pub click_bursts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            click_bursts: false,
        }
    }
}

impl Settings {
    /// Parse a `location.search` string such as `?speed=2.5&click`.
    pub fn from_query(search: &str) -> Self {
        let speed = get_query_param(search, "speed")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .unwrap_or(DEFAULT_SPEED);
        let click_bursts = get_query_param(search, "click").is_some();
        Self {
            speed,
            click_bursts,
        }
    }

    /// Read settings from the current page URL; defaults when there is no window.
    pub fn from_location() -> Self {
        window()
            .and_then(|w| w.location().search().ok())
            .map(|s| Self::from_query(&s))
            .unwrap_or_default()
    }
}

/// Value of `key` in a query string. A bare key (`?click`) yields `Some("")`.
fn get_query_param(search: &str, key: &str) -> Option<String> {
    let s = search.trim_start_matches('?');
    for pair in s.split('&') {
        let mut it = pair.splitn(2, '=');
        let k = it.next().unwrap_or("");
        if k == key {
            let v = it.next().unwrap_or("");
            return Some(v.replace('+', " "));
        }
    }
    None
}
