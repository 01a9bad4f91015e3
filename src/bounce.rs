//! DVD-screensaver bounce simulation.
//!
//! The sprite moves diagonally at a constant speed and reverses an axis when
//! its visible bounding box crosses a viewport edge by more than the bounce
//! tolerance. Each reversal is reported as a [`Collision`] so the page can fire
//! a burst at the impact point.

use rand::Rng;

use crate::bbox::BoundingBox;

/// Direction the sprite travels after a bounce (the burst fans out this way).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BounceDirection {
    Up,
    Down,
    Left,
    Right,
}

/// A reversal in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    pub x: f64,
    pub y: f64,
    pub direction: BounceDirection,
}

/// Drawing surface size in device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Device-pixel surface for a window of `css_w x css_h` CSS pixels.
    ///
    /// Some displays misreport devicePixelRatio; when the image is larger than
    /// the computed surface the surface is doubled so the sprite still fits.
    pub fn for_window(css_w: f64, css_h: f64, dpr: f64, image: Option<(u32, u32)>) -> Self {
        let dpr = sanitize_dpr(dpr);
        let width = css_w * dpr;
        let height = css_h * dpr;
        match image {
            Some((iw, ih)) if iw as f64 > width || ih as f64 > height => {
                Self::new((width * 2.0).floor(), (height * 2.0).floor())
            }
            _ => Self::new(width.floor(), height.floor()),
        }
    }
}

/// Treat a missing or nonsensical devicePixelRatio as 1.
pub fn sanitize_dpr(dpr: f64) -> f64 {
    if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 }
}

/// The bouncing image: top-left position, visible box and per-axis direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub x: f64,
    pub y: f64,
    pub bbox: BoundingBox,
    /// Horizontal direction, always -1 or 1.
    pub dx: i8,
    /// Vertical direction, always -1 or 1.
    pub dy: i8,
}

impl Sprite {
    pub fn new(x: f64, y: f64, bbox: BoundingBox, dx: i8, dy: i8) -> Self {
        Self {
            x,
            y,
            bbox,
            dx: if dx < 0 { -1 } else { 1 },
            dy: if dy < 0 { -1 } else { 1 },
        }
    }

    /// Random start keeping the whole `image` on screen where it fits, at least
    /// one pixel from the top-left corner, heading in a random diagonal.
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        viewport: Viewport,
        bbox: BoundingBox,
        image: (u32, u32),
    ) -> Self {
        let max_x = (viewport.width - image.0 as f64 - 1.0).max(1.0);
        let max_y = (viewport.height - image.1 as f64 - 1.0).max(1.0);
        let x = rng.gen_range(1.0..=max_x).floor();
        let y = rng.gen_range(1.0..=max_y).floor();
        let dx = if rng.gen_bool(0.5) { 1 } else { -1 };
        let dy = if rng.gen_bool(0.5) { 1 } else { -1 };
        Self::new(x, y, bbox, dx, dy)
    }

    pub fn left(&self) -> f64 {
        self.x + self.bbox.left as f64
    }

    pub fn right(&self) -> f64 {
        self.x + self.bbox.right as f64
    }

    pub fn top(&self) -> f64 {
        self.y + self.bbox.top as f64
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.bbox.bottom as f64
    }
}

/// Bounce state. "Not ready" (no sprite) until the image and its box arrive;
/// every tick before then is a no-op.
#[derive(Clone, Debug)]
pub struct Simulator {
    sprite: Option<Sprite>,
    viewport: Viewport,
    margin: f64,
    speed: f64,
}

impl Simulator {
    /// `margin` is how far the visible box may pass an edge before reversing.
    /// Negative speeds are taken by magnitude; the sprite direction already
    /// carries the sign.
    pub fn new(viewport: Viewport, margin: f64, speed: f64) -> Self {
        Self {
            sprite: None,
            viewport,
            margin: margin.max(0.0),
            speed: speed.abs(),
        }
    }

    /// Leave the "not ready" state. Only the first call has any effect.
    pub fn ready(&mut self, sprite: Sprite) -> bool {
        if self.sprite.is_some() {
            return false;
        }
        self.sprite = Some(sprite);
        true
    }

    pub fn is_ready(&self) -> bool {
        self.sprite.is_some()
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        self.sprite.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Replace the viewport; position, direction and speed are kept.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.abs();
    }

    pub fn set_margin(&mut self, margin: f64) {
        self.margin = margin.max(0.0);
    }

    /// Advance one frame. Returns the collision to celebrate, if any.
    ///
    /// When both axes reverse in the same frame the vertical direction is
    /// reported; the impact point still uses both edge coordinates. An axis on
    /// which the box cannot fit even with the tolerance on both sides is held
    /// centred and never reports a collision.
    pub fn tick(&mut self) -> Option<Collision> {
        let vp = self.viewport;
        let m = self.margin;
        let speed = self.speed;
        let sprite = self.sprite.as_mut()?;
        let b = sprite.bbox;
        let (bw, bh) = (b.width() as f64, b.height() as f64);
        let pin_x = bw > vp.width + 2.0 * m;
        let pin_y = bh > vp.height + 2.0 * m;

        let (left, right) = (sprite.left(), sprite.right());
        let (top, bottom) = (sprite.top(), sprite.bottom());
        let mut hit_x = None;
        let mut hit_y = None;
        let mut direction = None;

        if pin_x {
            sprite.x = (vp.width - bw) / 2.0 - b.left as f64;
        } else if left <= -m && sprite.dx < 0 {
            sprite.dx = 1;
            hit_x = Some(left);
            direction = Some(BounceDirection::Right);
        } else if right >= vp.width + m && sprite.dx > 0 {
            sprite.dx = -1;
            hit_x = Some(right);
            direction = Some(BounceDirection::Left);
        }
        if pin_y {
            sprite.y = (vp.height - bh) / 2.0 - b.top as f64;
        } else if top <= -m && sprite.dy < 0 {
            sprite.dy = 1;
            hit_y = Some(top);
            direction = Some(BounceDirection::Down);
        } else if bottom >= vp.height + m && sprite.dy > 0 {
            sprite.dy = -1;
            hit_y = Some(bottom);
            direction = Some(BounceDirection::Up);
        }

        let (cx, cy) = b.center();
        let collision = direction.map(|direction| Collision {
            x: hit_x.unwrap_or(sprite.x + cx),
            y: hit_y.unwrap_or(sprite.y + cy),
            direction,
        });

        // Large speeds can carry the box past an edge without tripping the
        // check above; snap back to just inside.
        if !pin_x {
            if left + bw < 0.0 {
                sprite.x = -(b.left as f64);
            } else if right - bw > vp.width {
                sprite.x = vp.width - b.right as f64;
            }
            sprite.x += speed * sprite.dx as f64;
        }
        if !pin_y {
            if top + bh < 0.0 {
                sprite.y = -(b.top as f64);
            } else if bottom - bh > vp.height {
                sprite.y = vp.height - b.bottom as f64;
            }
            sprite.y += speed * sprite.dy as f64;
        }
        collision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn square(size: u32) -> BoundingBox {
        BoundingBox {
            left: 0,
            top: 0,
            right: size,
            bottom: size,
        }
    }

    fn sim_with(sprite: Sprite, margin: f64, speed: f64) -> Simulator {
        let mut sim = Simulator::new(Viewport::new(800.0, 600.0), margin, speed);
        assert!(sim.ready(sprite));
        sim
    }

    #[test]
    fn not_ready_tick_is_noop() {
        let mut sim = Simulator::new(Viewport::new(800.0, 600.0), 0.0, 1.0);
        assert!(!sim.is_ready());
        assert_eq!(sim.tick(), None);
    }

    #[test]
    fn ready_fires_once() {
        let mut sim = sim_with(Sprite::new(10.0, 10.0, square(10), 1, 1), 0.0, 1.0);
        assert!(!sim.ready(Sprite::new(99.0, 99.0, square(10), 1, 1)));
        assert_eq!(sim.sprite().unwrap().x, 10.0);
    }

    #[test]
    fn right_edge_flips_dx_and_reports_left() {
        let mut sim = sim_with(Sprite::new(700.0, 200.0, square(100), 1, 1), 0.0, 1.0);
        let hit = sim.tick().expect("collision");
        assert_eq!(hit.direction, BounceDirection::Left);
        assert_eq!(hit.x, 800.0);
        assert_eq!(hit.y, 250.0);
        let s = sim.sprite().unwrap();
        assert_eq!(s.dx, -1);
        assert_eq!(s.dy, 1);
        assert_eq!((s.x, s.y), (699.0, 201.0));
        assert_eq!(sim.tick(), None);
    }

    #[test]
    fn margin_delays_the_bounce() {
        let mut sim = sim_with(Sprite::new(720.0, 200.0, square(100), 1, 1), 32.0, 1.0);
        assert_eq!(sim.tick(), None);
        let mut hits = 0;
        for _ in 0..20 {
            if sim.tick().is_some() {
                hits += 1;
            }
        }
        assert_eq!(hits, 1);
        assert_eq!(sim.sprite().unwrap().dx, -1);
    }

    #[test]
    fn zero_speed_never_moves() {
        let mut sim = sim_with(Sprite::new(123.0, 45.0, square(50), -1, 1), 0.0, 0.0);
        for _ in 0..1000 {
            sim.tick();
        }
        let s = sim.sprite().unwrap();
        assert_eq!((s.x, s.y), (123.0, 45.0));
    }

    #[test]
    fn moving_away_from_edge_does_not_collide() {
        // Overlapping the left edge but already heading right.
        let mut sim = sim_with(Sprite::new(-5.0, 100.0, square(100), 1, 1), 0.0, 1.0);
        assert_eq!(sim.tick(), None);
        assert_eq!(sim.sprite().unwrap().dx, 1);
    }

    #[test]
    fn bottom_edge_reports_up_with_horizontal_midpoint() {
        let bbox = BoundingBox {
            left: 20,
            top: 10,
            right: 60,
            bottom: 90,
        };
        let mut sim = sim_with(Sprite::new(100.0, 510.0, bbox, -1, 1), 0.0, 2.0);
        let hit = sim.tick().unwrap();
        assert_eq!(hit.direction, BounceDirection::Up);
        assert_eq!(hit.y, 600.0);
        assert_eq!(hit.x, 140.0);
        assert_eq!(sim.sprite().unwrap().dy, -1);
    }

    #[test]
    fn corner_hit_reports_vertical_direction() {
        let mut sim = sim_with(Sprite::new(0.0, 0.0, square(100), -1, -1), 0.0, 1.0);
        let hit = sim.tick().unwrap();
        assert_eq!(hit.direction, BounceDirection::Down);
        assert_eq!((hit.x, hit.y), (0.0, 0.0));
    }

    #[test]
    fn overshoot_snaps_back_inside() {
        let mut sim = sim_with(Sprite::new(5000.0, -900.0, square(100), 1, -1), 0.0, 0.0);
        let hit = sim.tick();
        assert!(hit.is_some());
        let s = sim.sprite().unwrap();
        assert_eq!(s.x, 700.0);
        assert_eq!(s.y, 0.0);
    }

    #[test]
    fn resize_keeps_motion_state() {
        let mut sim = sim_with(Sprite::new(300.0, 300.0, square(100), -1, 1), 0.0, 3.0);
        sim.tick();
        let before = *sim.sprite().unwrap();
        sim.set_viewport(Viewport::new(1024.0, 768.0));
        assert_eq!(*sim.sprite().unwrap(), before);
        assert_eq!(sim.speed(), 3.0);
        assert_eq!(sim.viewport(), Viewport::new(1024.0, 768.0));
    }

    #[test]
    fn viewport_doubles_for_oversized_image() {
        assert_eq!(
            Viewport::for_window(400.0, 300.0, 2.0, Some((512, 512))),
            Viewport::new(800.0, 600.0)
        );
        assert_eq!(
            Viewport::for_window(200.0, 150.0, 1.0, Some((512, 512))),
            Viewport::new(400.0, 300.0)
        );
        assert_eq!(
            Viewport::for_window(200.0, 150.0, f64::NAN, None),
            Viewport::new(200.0, 150.0)
        );
    }

    #[test]
    fn fractional_device_pixels_are_floored() {
        assert_eq!(
            Viewport::for_window(1366.0, 768.0, 1.25, None),
            Viewport::new(1707.0, 960.0)
        );
        assert_eq!(
            Viewport::for_window(1366.0, 767.0, 1.25, Some((64, 64))),
            Viewport::new(1707.0, 958.0)
        );
    }

    #[test]
    fn oversized_box_is_centred_without_bursts() {
        let bbox = BoundingBox {
            left: 0,
            top: 0,
            right: 500,
            bottom: 100,
        };
        let mut sim = Simulator::new(Viewport::new(400.0, 300.0), 32.0, 1.0);
        sim.ready(Sprite::new(1.0, 1.0, bbox, -1, 1));
        let mut hits = Vec::new();
        for _ in 0..300 {
            if let Some(hit) = sim.tick() {
                hits.push(hit);
            }
        }
        // Only the vertical axis still bounces.
        assert!(hits.len() <= 2, "{} collisions", hits.len());
        assert!(
            hits.iter()
                .all(|h| matches!(h.direction, BounceDirection::Up | BounceDirection::Down))
        );
        let s = sim.sprite().unwrap();
        assert_eq!(s.x, -50.0);
        assert_eq!(s.left() + s.right(), 400.0);
    }

    #[test]
    fn box_larger_than_both_axes_stays_put() {
        let mut sim = Simulator::new(Viewport::new(200.0, 100.0), 0.0, 4.0);
        sim.ready(Sprite::new(17.0, -3.0, square(512), 1, -1));
        for _ in 0..100 {
            assert_eq!(sim.tick(), None);
        }
        let s = sim.sprite().unwrap();
        assert_eq!((s.x, s.y), (-156.0, -206.0));
    }

    #[test]
    fn spawn_stays_on_screen() {
        let mut rng = StdRng::seed_from_u64(11);
        let vp = Viewport::new(1920.0, 1080.0);
        for _ in 0..100 {
            let s = Sprite::spawn(&mut rng, vp, square(512), (512, 512));
            assert!(s.x >= 1.0 && s.x + 512.0 <= vp.width);
            assert!(s.y >= 1.0 && s.y + 512.0 <= vp.height);
            assert!(s.dx == 1 || s.dx == -1);
            assert!(s.dy == 1 || s.dy == -1);
        }
    }

    #[test]
    fn spawn_in_tiny_viewport_uses_corner() {
        let mut rng = StdRng::seed_from_u64(5);
        let s = Sprite::spawn(&mut rng, Viewport::new(100.0, 100.0), square(512), (512, 512));
        assert_eq!((s.x, s.y), (1.0, 1.0));
    }
}
