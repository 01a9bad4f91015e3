//! Loading the bean image and measuring its visible pixels.

use js_sys::{Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Document, HtmlCanvasElement,
    HtmlImageElement,
};

use crate::bbox::{BoundingBox, compute_bounding_box};
use crate::error::{Error, Result};

pub const IMAGE_ID: &str = "bean-image";

/// Create the hidden `<img>` and start loading `src`. `on_load` runs once,
/// after the image has decoded; a load error is only logged.
pub fn load_image(
    src: &str,
    on_load: impl FnOnce(HtmlImageElement) + 'static,
) -> Result<HtmlImageElement> {
    let img = HtmlImageElement::new()?;
    img.set_id(IMAGE_ID);
    img.style().set_property("display", "none")?;

    let opts = AddEventListenerOptions::new();
    opts.set_once(true);
    let loaded = img.clone();
    let mut on_load = Some(on_load);
    let closure = Closure::wrap(Box::new(move || {
        if let Some(cb) = on_load.take() {
            cb(loaded.clone());
        }
    }) as Box<dyn FnMut()>);
    img.add_event_listener_with_callback_and_add_event_listener_options(
        "load",
        closure.as_ref().unchecked_ref(),
        &opts,
    )?;
    closure.forget();

    let failed = img.clone();
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
        log::error!("failed to load bean image: {}", failed.src());
    }) as Box<dyn FnMut(_)>);
    img.add_event_listener_with_callback("error", closure.as_ref().unchecked_ref())?;
    closure.forget();

    img.set_src(src);
    Ok(img)
}

/// Natural size of a loaded image, falling back to its layout size.
pub fn image_size(img: &HtmlImageElement) -> (u32, u32) {
    let w = match img.natural_width() {
        0 => img.width(),
        w => w,
    };
    let h = match img.natural_height() {
        0 => img.height(),
        h => h,
    };
    (w, h)
}

/// Draw `img` at 1:1 onto an offscreen canvas and scan its alpha channel.
pub fn image_bounding_box(doc: &Document, img: &HtmlImageElement) -> Result<Option<BoundingBox>> {
    let (w, h) = image_size(img);
    if w == 0 || h == 0 {
        return Ok(None);
    }
    let canvas: HtmlCanvasElement = doc
        .create_element("canvas")?
        .dyn_into()
        .map_err(JsValue::from)?;
    canvas.set_width(w);
    canvas.set_height(h);

    let opts = Object::new();
    Reflect::set(&opts, &"willReadFrequently".into(), &JsValue::TRUE)?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context_with_context_options("2d", &opts)?
        .ok_or(Error::NoContext("offscreen canvas"))?
        .dyn_into()
        .map_err(JsValue::from)?;

    ctx.draw_image_with_html_image_element(img, 0.0, 0.0)?;
    let pixels = ctx.get_image_data(0.0, 0.0, w as f64, h as f64)?.data();
    compute_bounding_box(&pixels.0, w, h)
}
