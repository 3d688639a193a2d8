mod app;
mod asset;
mod config;
mod geometry;
mod intersection;
mod observer_pool;
mod overlay;
mod presence;
mod preview;
mod validation;

use app::App;
use leptos::prelude::*;

fn main() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&format!("logger already initialised: {err}").into());
    }
    mount_to_body(|| {
        view! {
            <App/>
        }
    })
}
