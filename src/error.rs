//! Error type shared by the page glue and the pure simulation modules.

use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no global window")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("element not found: {0}")]
    MissingElement(&'static str),

    #[error("2d context unavailable for {0}")]
    NoContext(&'static str),

    #[error("pixel buffer holds {actual} bytes, {width}x{height} RGBA needs {expected}")]
    PixelBuffer {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("asset manifest lists no regular images")]
    EmptyAssetList,

    #[error("invalid asset manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("javascript error: {0}")]
    Js(String),
}

impl From<JsValue> for Error {
    fn from(value: JsValue) -> Self {
        Error::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<Error> for JsValue {
    fn from(err: Error) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
