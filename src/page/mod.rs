//! Browser side of the screensaver: canvases, the bean image, animation loops
//! and DOM events. Everything stateful lives in [`Page`], owned by a
//! thread-local and borrowed for the length of one callback.
//!
//! Failures here never reach the host page: a missing canvas or context is
//! logged and only the affected layer stays dark.

mod fireworks_layer;
mod sprite_image;
mod storage;

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, window};

use crate::assets::AssetManifest;
use crate::bounce::{Simulator, Sprite, Viewport, sanitize_dpr};
use crate::config::{BOUNCE_MARGIN_CSS, Settings};
use crate::error::{Error, Result};
use crate::fireworks::Cone;
use crate::selector::{ImageSelector, MemoryStore};

pub use fireworks_layer::burst as fire_burst;

pub const BEAN_CANVAS_SELECTOR: &str = "canvas#bean";
pub const SCREEN_SELECTOR: &str = "div.screen";

pub(crate) type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Schedule `cb` for the next animation frame, returning the handle.
pub(crate) fn request_frame(cb: &FrameCallback) -> Option<i32> {
    let win = window()?;
    let cb = cb.borrow();
    let closure = cb.as_ref()?;
    win.request_animation_frame(closure.as_ref().unchecked_ref()).ok()
}

/// Bean canvas and its context. Absent when the page lacks the element.
struct Surface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

struct Page {
    surface: Option<Surface>,
    image: HtmlImageElement,
    /// Set once the image has loaded.
    image_size: Option<(u32, u32)>,
    simulator: Simulator,
    settings: Settings,
    rng: SmallRng,
    frame: Option<i32>,
}

thread_local! {
    static PAGE: RefCell<Option<Page>> = const { RefCell::new(None) };
    static BEAN_LOOP: FrameCallback = Rc::new(RefCell::new(None));
}

/// Pick today's bean, start loading it, and wire up resize, tap and animation.
pub fn start() -> Result<()> {
    let win = window().ok_or(Error::NoWindow)?;
    let doc = win.document().ok_or(Error::NoDocument)?;
    let settings = Settings::from_location();

    if let Err(err) = fireworks_layer::init() {
        log::error!("fireworks disabled: {err}");
    }

    let manifest = AssetManifest::bundled()?;
    let selector = ImageSelector::from_manifest(&manifest)?;
    let mut rng = SmallRng::from_entropy();
    let chosen = match storage::LocalStore::from_window() {
        Some(mut store) => selector.select_for_load(&mut store, &mut rng),
        None => {
            log::warn!("localStorage unavailable, selection will not persist");
            selector.select_for_load(&mut MemoryStore::default(), &mut rng)
        }
    };
    log::debug!("selected {}", chosen.url());

    let image = sprite_image::load_image(chosen.url(), on_image_loaded)?;
    match doc.query_selector(SCREEN_SELECTOR)? {
        Some(parent) => {
            parent.append_child(&image)?;
        }
        None => log::warn!("{SCREEN_SELECTOR} not found, bean image left detached"),
    }

    let surface = match bean_surface(&doc) {
        Ok(s) => Some(s),
        Err(err) => {
            log::error!("bean animation disabled: {err}");
            None
        }
    };

    let dpr = sanitize_dpr(win.device_pixel_ratio());
    let page = Page {
        surface,
        image,
        image_size: None,
        simulator: Simulator::new(
            Viewport::new(0.0, 0.0),
            BOUNCE_MARGIN_CSS * dpr,
            settings.speed * dpr,
        ),
        settings,
        rng,
        frame: None,
    };
    PAGE.with(|p| p.replace(Some(page)));

    BEAN_LOOP.with(|cb| {
        *cb.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
            PAGE.with(|p| {
                if let Some(page) = p.borrow_mut().as_mut() {
                    page.render();
                    page.frame = BEAN_LOOP.with(|cb| request_frame(cb));
                }
            });
        }) as Box<dyn FnMut(f64)>));
    });

    add_window_listeners(&win, &settings)?;
    on_resize();
    Ok(())
}

fn bean_surface(doc: &web_sys::Document) -> Result<Surface> {
    let canvas: HtmlCanvasElement = doc
        .query_selector(BEAN_CANVAS_SELECTOR)?
        .ok_or(Error::MissingElement(BEAN_CANVAS_SELECTOR))?
        .dyn_into()
        .map_err(JsValue::from)?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or(Error::NoContext(BEAN_CANVAS_SELECTOR))?
        .dyn_into()
        .map_err(JsValue::from)?;
    Ok(Surface { canvas, ctx })
}

fn add_window_listeners(win: &web_sys::Window, settings: &Settings) -> Result<()> {
    for event in ["resize", "orientationchange"] {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            on_resize();
        }) as Box<dyn FnMut(_)>);
        win.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    if settings.click_bursts {
        let has_touch =
            js_sys::Reflect::has(win, &JsValue::from_str("ontouchstart")).unwrap_or(false);
        let tap_event = if has_touch { "touchstart" } else { "mousedown" };
        let closure = Closure::wrap(Box::new(move |evt: web_sys::Event| {
            if let Some((x, y)) = pointer_position(&evt) {
                let dpr = window().map(|w| sanitize_dpr(w.device_pixel_ratio())).unwrap_or(1.0);
                fireworks_layer::burst(x * dpr, y * dpr, Cone::Any);
            }
        }) as Box<dyn FnMut(_)>);
        win.add_event_listener_with_callback(tap_event, closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

/// Client coordinates of a mouse or first-touch event.
fn pointer_position(evt: &web_sys::Event) -> Option<(f64, f64)> {
    if let Some(touch) = evt.dyn_ref::<web_sys::TouchEvent>() {
        let t = touch.touches().get(0)?;
        return Some((t.client_x() as f64, t.client_y() as f64));
    }
    let mouse = evt.dyn_ref::<web_sys::MouseEvent>()?;
    Some((mouse.client_x() as f64, mouse.client_y() as f64))
}

fn on_image_loaded(img: HtmlImageElement) {
    let Some(doc) = window().and_then(|w| w.document()) else {
        return;
    };
    let size = sprite_image::image_size(&img);
    let bbox = match sprite_image::image_bounding_box(&doc, &img) {
        Ok(Some(bbox)) => {
            log::debug!("bean bounding box: {bbox:?}");
            bbox
        }
        Ok(None) => {
            log::warn!("could not determine bean bounds; image is fully transparent");
            return;
        }
        Err(err) => {
            log::error!("could not measure bean image: {err}");
            return;
        }
    };

    PAGE.with(|p| {
        if let Some(page) = p.borrow_mut().as_mut() {
            page.image_size = Some(size);
            page.apply_window_size();
            let sprite = Sprite::spawn(&mut page.rng, page.simulator.viewport(), bbox, size);
            page.simulator.ready(sprite);
        }
    });
    on_resize();
}

/// Recompute surfaces for the current window and restart both layers'
/// geometry. Motion state is kept.
fn on_resize() {
    fireworks_layer::resize();
    PAGE.with(|p| {
        if let Some(page) = p.borrow_mut().as_mut() {
            page.apply_window_size();
            page.restart_loop();
        }
    });
}

impl Page {
    fn apply_window_size(&mut self) {
        let Some(win) = window() else { return };
        let dpr = sanitize_dpr(win.device_pixel_ratio());
        let css_w = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let css_h = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let viewport = Viewport::for_window(css_w, css_h, dpr, self.image_size);

        self.simulator.set_viewport(viewport);
        self.simulator.set_speed(self.settings.speed * dpr);
        self.simulator.set_margin(BOUNCE_MARGIN_CSS * dpr);
        if let Some(surface) = &self.surface {
            surface.canvas.set_width(viewport.width as u32);
            surface.canvas.set_height(viewport.height as u32);
        }
    }

    fn restart_loop(&mut self) {
        if self.surface.is_none() {
            return;
        }
        if let (Some(handle), Some(win)) = (self.frame.take(), window()) {
            let _ = win.cancel_animation_frame(handle);
        }
        self.frame = BEAN_LOOP.with(|cb| request_frame(cb));
    }

    fn render(&mut self) {
        let Some(surface) = &self.surface else { return };
        if !self.simulator.is_ready() {
            return;
        }
        let vp = self.simulator.viewport();
        surface.ctx.clear_rect(0.0, 0.0, vp.width, vp.height);

        if let Some(hit) = self.simulator.tick() {
            let cone: Cone = hit.direction.into();
            fireworks_layer::burst_from_surface(hit.x, hit.y, vp.width, vp.height, cone);
        }
        if let Some(sprite) = self.simulator.sprite() {
            let _ = surface
                .ctx
                .draw_image_with_html_image_element(&self.image, sprite.x, sprite.y);
        }
    }
}
