use leptos::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::intersection::Thresholds;
use crate::observer_pool::DEFAULT_THRESHOLDS;

pub const CONFIG_GLOBAL: &str = "__STICKY_OVERLAY__";
pub const CONFIG_EVENT: &str = "sticky-overlay-config";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid overlay config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid overlay config object: {0}")]
    Js(String),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    pub threshold_top: f64,
    pub threshold_bottom: f64,
    pub outline_margin: f64,
    pub debug: bool,
    pub thresholds: Vec<f64>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            threshold_top: 10.0,
            threshold_bottom: 10.0,
            outline_margin: 30.0,
            debug: false,
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
        }
    }
}

impl OverlayConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_js(value: JsValue) -> Result<Self, ConfigError> {
        serde_wasm_bindgen::from_value(value).map_err(|err| ConfigError::Js(err.to_string()))
    }

    pub fn margins(&self) -> Thresholds {
        Thresholds {
            top: self.threshold_top,
            bottom: self.threshold_bottom,
        }
    }

    /// Reads `window.__STICKY_OVERLAY__`, falling back to defaults.
    pub fn load() -> Self {
        let global = js_sys::Reflect::get(&window(), &JsValue::from_str(CONFIG_GLOBAL))
            .unwrap_or(JsValue::UNDEFINED);
        if global.is_undefined() || global.is_null() {
            return Self::default();
        }
        match Self::from_js(global) {
            Ok(config) => {
                log::info!("loaded overlay config from window.{CONFIG_GLOBAL}");
                config
            }
            Err(err) => {
                log::warn!("{err}; using defaults");
                Self::default()
            }
        }
    }
}

/// Applies configs dispatched as `sticky-overlay-config` events with a JSON `detail`.
pub fn listen_for_updates(set_config: WriteSignal<OverlayConfig>) {
    let closure = Closure::<dyn FnMut(web_sys::CustomEvent)>::new(move |e: web_sys::CustomEvent| {
        let Some(detail) = e.detail().as_string() else {
            return;
        };
        match OverlayConfig::from_json(&detail) {
            Ok(config) => set_config.set(config),
            Err(err) => log::warn!("ignoring {CONFIG_EVENT} event: {err}"),
        }
    });
    if let Err(err) =
        window().add_event_listener_with_callback(CONFIG_EVENT, closure.as_ref().unchecked_ref())
    {
        log::warn!("could not listen for {CONFIG_EVENT}: {err:?}");
    }
    closure.forget();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = OverlayConfig::from_json(r#"{"debug": true}"#).unwrap();
        assert!(config.debug);
        assert_eq!(config.threshold_top, 10.0);
        assert_eq!(config.outline_margin, 30.0);
        assert_eq!(config.thresholds, DEFAULT_THRESHOLDS.to_vec());
    }

    #[test]
    fn margins_follow_thresholds() {
        let config =
            OverlayConfig::from_json(r#"{"threshold_top": 85, "threshold_bottom": 4}"#).unwrap();
        assert_eq!(
            config.margins(),
            Thresholds {
                top: 85.0,
                bottom: 4.0,
            }
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = OverlayConfig::from_json("{debug:").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("invalid overlay config json"));
    }

    #[test]
    fn wrong_field_type_is_an_error() {
        assert!(OverlayConfig::from_json(r#"{"threshold_top": "ten"}"#).is_err());
    }
}
