//! Lower canvas that paints particle bursts. Runs its own animation loop, which
//! idles when no burst is in flight.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, window};

use super::{FrameCallback, request_frame};
use crate::bounce::sanitize_dpr;
use crate::error::{Error, Result};
use crate::fireworks::{Cone, Fireworks};

pub const CANVAS_SELECTOR: &str = "canvas.lower";

struct FireworksLayer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    fireworks: Fireworks<SmallRng>,
    gate: LoopGate,
}

/// Whether the burst loop is scheduled, and when its last frame ran.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct LoopGate {
    running: bool,
    last_ts: Option<f64>,
}

impl LoopGate {
    /// Mark the loop live. True when a frame has to be requested.
    fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.last_ts = None;
        true
    }

    /// Milliseconds since the previous frame, 0 on the first.
    fn step(&mut self, ts: f64) -> f64 {
        let dt = self.last_ts.map(|prev| (ts - prev).max(0.0)).unwrap_or(0.0);
        self.last_ts = Some(ts);
        dt
    }

    /// Close out a frame. Returns whether another one is needed.
    fn finish(&mut self, idle: bool) -> bool {
        if idle {
            self.running = false;
            self.last_ts = None;
        }
        self.running
    }
}

/// Factors mapping a `surface` of the given size onto a canvas of `canvas`
/// pixels. A degenerate surface axis maps one to one.
fn surface_scale(canvas: (u32, u32), surface: (f64, f64)) -> (f64, f64) {
    let axis = |c: u32, s: f64| if s > 0.0 { c as f64 / s } else { 1.0 };
    (axis(canvas.0, surface.0), axis(canvas.1, surface.1))
}

thread_local! {
    static LAYER: RefCell<Option<FireworksLayer>> = const { RefCell::new(None) };
    static LAYER_LOOP: FrameCallback = Rc::new(RefCell::new(None));
}

/// Find the lower canvas and prepare the burst loop.
pub fn init() -> Result<()> {
    let win = window().ok_or(Error::NoWindow)?;
    let doc = win.document().ok_or(Error::NoDocument)?;
    let canvas: HtmlCanvasElement = doc
        .query_selector(CANVAS_SELECTOR)?
        .ok_or(Error::MissingElement(CANVAS_SELECTOR))?
        .dyn_into()
        .map_err(JsValue::from)?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or(Error::NoContext(CANVAS_SELECTOR))?
        .dyn_into()
        .map_err(JsValue::from)?;

    let dpr = sanitize_dpr(win.device_pixel_ratio());
    let layer = FireworksLayer {
        canvas,
        ctx,
        fireworks: Fireworks::new(SmallRng::from_entropy(), dpr),
        gate: LoopGate::default(),
    };
    LAYER.with(|l| l.replace(Some(layer)));
    resize();

    LAYER_LOOP.with(|cb| {
        *cb.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
            let keep_going = LAYER.with(|l| {
                l.borrow_mut()
                    .as_mut()
                    .map(|layer| layer.frame(ts))
                    .unwrap_or(false)
            });
            if keep_going {
                LAYER_LOOP.with(|cb| request_frame(cb));
            }
        }) as Box<dyn FnMut(f64)>));
    });
    Ok(())
}

/// Match the canvas to the window in device pixels.
pub fn resize() {
    let Some(win) = window() else { return };
    let dpr = sanitize_dpr(win.device_pixel_ratio());
    let css_w = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let css_h = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    LAYER.with(|l| {
        if let Some(layer) = l.borrow_mut().as_mut() {
            layer.canvas.set_width((css_w * dpr).floor() as u32);
            layer.canvas.set_height((css_h * dpr).floor() as u32);
            layer.fireworks.set_pixel_ratio(dpr);
        }
    });
}

/// Fire a burst at `(x, y)` in this canvas's pixel space. No-op when the layer
/// failed to initialise.
pub fn burst(x: f64, y: f64, cone: Cone) {
    let start = LAYER.with(|l| {
        let mut l = l.borrow_mut();
        let Some(layer) = l.as_mut() else { return false };
        layer.fireworks.burst(x, y, cone);
        layer.gate.start()
    });
    if start {
        LAYER_LOOP.with(|cb| request_frame(cb));
    }
}

/// Fire a burst given coordinates on a surface of `width x height` pixels,
/// rescaled to this canvas.
pub fn burst_from_surface(x: f64, y: f64, width: f64, height: f64, cone: Cone) {
    let scale = LAYER.with(|l| {
        l.borrow().as_ref().map(|layer| {
            let canvas = (layer.canvas.width(), layer.canvas.height());
            surface_scale(canvas, (width, height))
        })
    });
    if let Some((sx, sy)) = scale {
        burst(x * sx, y * sy, cone);
    }
}

impl FireworksLayer {
    /// Advance and repaint. Returns whether another frame is needed.
    fn frame(&mut self, ts: f64) -> bool {
        let dt = self.gate.step(ts);
        self.fireworks.advance(dt);

        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
        self.ctx.clear_rect(0.0, 0.0, w, h);
        for p in self.fireworks.particles() {
            self.ctx.begin_path();
            if self.ctx.arc(p.x, p.y, p.radius.max(0.0), 0.0, TAU).is_ok() {
                self.ctx.set_fill_style(&JsValue::from_str(p.color));
                self.ctx.fill();
            }
        }

        self.gate.finish(self.fireworks.is_idle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_requests_one_frame_per_run() {
        let mut gate = LoopGate::default();
        assert!(gate.start());
        // Further bursts while live ride the scheduled loop.
        assert!(!gate.start());
        assert!(!gate.start());
        assert!(gate.running);
    }

    #[test]
    fn gate_measures_time_between_frames() {
        let mut gate = LoopGate::default();
        gate.start();
        assert_eq!(gate.step(1000.0), 0.0);
        assert_eq!(gate.step(1016.0), 16.0);
        assert_eq!(gate.step(1010.0), 0.0);
    }

    #[test]
    fn gate_stops_when_idle_and_restarts() {
        let mut gate = LoopGate::default();
        gate.start();
        gate.step(50.0);
        assert!(gate.finish(false));
        assert!(!gate.finish(true));
        assert_eq!(gate, LoopGate::default());

        // The next burst starts a fresh run without a stale timestamp.
        assert!(gate.start());
        assert_eq!(gate.step(9000.0), 0.0);
    }

    #[test]
    fn surface_coordinates_rescale_to_canvas() {
        let (sx, sy) = surface_scale((400, 300), (800.0, 600.0));
        assert_eq!((400.0 * sx, 300.0 * sy), (200.0, 150.0));
        assert_eq!(surface_scale((1920, 1080), (1920.0, 1080.0)), (1.0, 1.0));
        assert_eq!(surface_scale((640, 480), (0.0, 480.0)), (1.0, 1.0));
    }
}
