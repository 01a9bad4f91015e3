//! Particle bursts ("fireworks") fired at bounce points or on tap.
//!
//! Every burst is its own timeline of [`PARTICLES_PER_BURST`] particles that fly
//! out from the origin and shrink to nothing. Bursts overlap freely; the layer
//! drops each one when its timeline completes.

use std::f64::consts::PI;

use rand::Rng;

use crate::bounce::BounceDirection;
use crate::config::{
    BURST_DURATION_MAX_MS, BURST_DURATION_MIN_MS, PARTICLE_DISTANCE_MAX, PARTICLE_DISTANCE_MIN,
    PARTICLE_FINAL_RADIUS, PARTICLE_RADIUS_MAX, PARTICLE_RADIUS_MIN, PARTICLES_PER_BURST,
};

/// Particle colours (Dracula palette).
pub const PALETTE: [&str; 8] = [
    "#ffffff", "#8be9fd", "#50fa7b", "#ffb86c", "#ff79c6", "#bd93f9", "#ff5555", "#f1fa8c",
];

/// Spread of a burst. Headings are compass degrees: 0 = up, clockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cone {
    #[default]
    Any,
    Up,
    Down,
    Left,
    Right,
}

impl Cone {
    /// Half-open `[start, end)` heading sweep; `end < start` wraps through 0.
    pub fn sweep(self) -> (u32, u32) {
        match self {
            Cone::Any => (0, 360),
            Cone::Up => (270, 90),
            Cone::Down => (90, 270),
            Cone::Left => (180, 360),
            Cone::Right => (0, 180),
        }
    }

    /// Whether `heading` (degrees, `0..360`) falls inside this cone.
    pub fn contains(self, heading: u32) -> bool {
        let (start, end) = self.sweep();
        let h = heading % 360;
        if start < end {
            (start..end).contains(&h)
        } else {
            h >= start || h < end
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "any" => Some(Cone::Any),
            "up" => Some(Cone::Up),
            "down" => Some(Cone::Down),
            "left" => Some(Cone::Left),
            "right" => Some(Cone::Right),
            _ => None,
        }
    }

    fn random_heading<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        let (start, end) = self.sweep();
        let last = end - 1;
        let span = if last < start { 360 - start + last } else { last - start };
        (start + rng.gen_range(0..=span)) % 360
    }
}

impl From<BounceDirection> for Cone {
    fn from(dir: BounceDirection) -> Self {
        match dir {
            BounceDirection::Up => Cone::Up,
            BounceDirection::Down => Cone::Down,
            BounceDirection::Left => Cone::Left,
            BounceDirection::Right => Cone::Right,
        }
    }
}

/// Scale applied to travel distance on high-density displays.
pub fn size_multiplier(dpr: f64) -> f64 {
    if dpr > 1.0 { dpr - 1.0 } else { dpr }
}

/// Fast start, long tail. Exactly 1 at and after `t = 1`.
pub fn ease_out_expo(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else if t <= 0.0 {
        0.0
    } else {
        1.0 - 2f64.powf(-10.0 * t)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub origin: (f64, f64),
    pub target: (f64, f64),
    pub x: f64,
    pub y: f64,
    pub start_radius: f64,
    pub radius: f64,
    pub color: &'static str,
    /// Compass heading in whole degrees.
    pub heading: u32,
}

impl Particle {
    fn spawn<R: Rng + ?Sized>(
        x: f64,
        y: f64,
        cone: Cone,
        distance_scale: f64,
        rng: &mut R,
    ) -> Self {
        let color = PALETTE[rng.gen_range(0..PALETTE.len())];
        let radius = rng.gen_range(PARTICLE_RADIUS_MIN..=PARTICLE_RADIUS_MAX) as f64;
        let heading = cone.random_heading(rng);
        let distance =
            rng.gen_range(PARTICLE_DISTANCE_MIN..=PARTICLE_DISTANCE_MAX) as f64 * distance_scale;
        // Canvas angles run clockwise from +x; compass 0 points up.
        let theta = (heading as f64 - 90.0) * PI / 180.0;
        let target = (
            x + (distance * theta.cos()).floor(),
            y + (distance * theta.sin()).floor(),
        );
        Self {
            origin: (x, y),
            target,
            x,
            y,
            start_radius: radius,
            radius,
            color,
            heading,
        }
    }

    fn interpolate(&mut self, progress: f64) {
        self.x = self.origin.0 + (self.target.0 - self.origin.0) * progress;
        self.y = self.origin.1 + (self.target.1 - self.origin.1) * progress;
        self.radius = self.start_radius + (PARTICLE_FINAL_RADIUS - self.start_radius) * progress;
    }
}

/// One burst timeline.
#[derive(Clone, Debug)]
pub struct Burst {
    particles: Vec<Particle>,
    duration_ms: f64,
    elapsed_ms: f64,
}

impl Burst {
    pub fn spawn<R: Rng + ?Sized>(
        x: f64,
        y: f64,
        cone: Cone,
        distance_scale: f64,
        rng: &mut R,
    ) -> Self {
        let duration_ms = rng.gen_range(BURST_DURATION_MIN_MS..=BURST_DURATION_MAX_MS) as f64;
        let particles = (0..PARTICLES_PER_BURST)
            .map(|_| Particle::spawn(x, y, cone, distance_scale, rng))
            .collect();
        Self {
            particles,
            duration_ms,
            elapsed_ms: 0.0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    pub fn advance(&mut self, dt_ms: f64) {
        self.elapsed_ms += dt_ms.max(0.0);
        let progress = ease_out_expo((self.elapsed_ms / self.duration_ms).min(1.0));
        for p in &mut self.particles {
            p.interpolate(progress);
        }
    }
}

/// All bursts in flight.
#[derive(Debug)]
pub struct Fireworks<R> {
    bursts: Vec<Burst>,
    rng: R,
    distance_scale: f64,
}

impl<R: Rng> Fireworks<R> {
    pub fn new(rng: R, dpr: f64) -> Self {
        Self {
            bursts: Vec::new(),
            rng,
            distance_scale: size_multiplier(dpr),
        }
    }

    pub fn set_pixel_ratio(&mut self, dpr: f64) {
        self.distance_scale = size_multiplier(dpr);
    }

    /// Fire a new burst at `(x, y)`.
    pub fn burst(&mut self, x: f64, y: f64, cone: Cone) {
        let burst = Burst::spawn(x, y, cone, self.distance_scale, &mut self.rng);
        self.bursts.push(burst);
    }

    /// Move every timeline forward and drop the completed ones.
    pub fn advance(&mut self, dt_ms: f64) {
        for b in &mut self.bursts {
            b.advance(dt_ms);
        }
        self.bursts.retain(|b| !b.is_finished());
    }

    pub fn is_idle(&self) -> bool {
        self.bursts.is_empty()
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.bursts.iter().flat_map(|b| b.particles.iter())
    }
}
