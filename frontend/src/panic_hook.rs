use std::panic;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(inline_js = "export function get_stack() { return new Error().stack; }")]
extern "C" {
    fn get_stack() -> String;
}

/// Reports a panic through tracing, then hands it to `console_error_panic_hook`
/// so the browser console still shows the raw message with a JS stack.
fn hook(info: &panic::PanicHookInfo) {
    #[cfg(target_arch = "wasm32")]
    tracing::error!(stack = %get_stack(), "panic: {}", info);

    #[cfg(not(target_arch = "wasm32"))]
    tracing::error!("panic: {}", info);

    console_error_panic_hook::hook(info);
}

/// Registers the hook. Call once, after logging is up.
pub fn install() {
    panic::set_hook(Box::new(hook));
}
