//! WebAssembly bindings for the waterfall layout engine.
//!
//! ## Example
//!
//! ```js
//! import { WaterfallEngine } from 'waterfall-wasm';
//!
//! // `true`: sizes come from the ResizeObserver below, not from measuring.
//! const engine = new WaterfallEngine({ lineCount: 3, line: 'v', align: 'center', gutter: 12 }, true);
//!
//! const observer = new ResizeObserver((entries) => {
//!   for (const { target, contentRect } of entries) {
//!     engine.updateSize(Number(target.dataset.order), contentRect.width, contentRect.height);
//!   }
//! });
//! for (const [i, el] of [...container.children].entries()) {
//!   el.dataset.order = i;
//!   engine.register(i, el, 'waterfall-move');
//!   observer.observe(el);
//! }
//!
//! engine.onReflowed(() => {
//!   container.style.height = `${engine.totalExtent()}px`;
//!   for (const p of engine.placements()) {
//!     const el = container.children[p.order];
//!     el.style.transform = `translate(${p.left}px, ${p.top}px)`;
//!   }
//! });
//!
//! const tick = () => {
//!   engine.flush(container.clientWidth, container.clientHeight);
//!   requestAnimationFrame(tick);
//! };
//! requestAnimationFrame(tick);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use wasm_bindgen::prelude::*;
use waterfall_core::{LayoutConfig, Size, Token};
use waterfall_layout::{Block, BlockRegistry};
use waterfall_reflow::{Channel, Orchestrator, SignalBus, Subscription};

mod dom;
mod types;

pub use dom::*;
pub use types::*;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(debug_assertions)]
    console_error_panic_hook::set_once();
}

/// One waterfall container, driven from JavaScript.
///
/// Every method takes `&self`: listeners run synchronously inside `flush`,
/// `register` and friends, and may call back into the engine.
#[wasm_bindgen]
pub struct WaterfallEngine {
    orchestrator: Orchestrator<DomNode, DomMeasure>,
    config: Cell<LayoutConfig>,
    subscriptions: RefCell<IndexMap<u32, Subscription>>,
    next_subscription: Cell<u32>,
}

#[wasm_bindgen]
impl WaterfallEngine {
    /// Create an engine. `config` follows the component props
    /// `{ lineCount, line, align, gutter }`; missing fields take defaults.
    ///
    /// With `pushedSizes` set the engine never measures elements and uses
    /// the sizes reported through `updateSize` instead.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, pushed_sizes: Option<bool>) -> Result<WaterfallEngine, JsError> {
        let config = config_from_js(config)?;
        let measure = if pushed_sizes.unwrap_or(false) {
            DomMeasure::Pushed
        } else {
            DomMeasure::Live
        };
        let bus = Rc::new(SignalBus::new());
        let registry = Rc::new(RefCell::new(BlockRegistry::new()));
        Ok(Self {
            orchestrator: Orchestrator::new(bus, registry, measure),
            config: Cell::new(config),
            subscriptions: RefCell::new(IndexMap::new()),
            next_subscription: Cell::new(0),
        })
    }

    /// Replace the layout configuration and request a reflow tagged `config`.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&self, config: JsValue) -> Result<(), JsError> {
        self.config.set(config_from_js(config)?);
        self.orchestrator.request_reflow("config");
        Ok(())
    }

    /// Start managing `element` as the block with the given order.
    #[wasm_bindgen]
    pub fn register(
        &self,
        order: i32,
        element: web_sys::Element,
        move_class: Option<String>,
    ) -> Result<(), JsError> {
        let block = Block::new(order.into(), DomNode(element))
            .with_move_class(move_class.unwrap_or_default());
        self.orchestrator
            .register(block)
            .map_err(|e| JsError::new(&format!("Register error: {}", e)))
    }

    /// Stop managing a block. Returns `false` if the order was unknown.
    #[wasm_bindgen]
    pub fn unregister(&self, order: i32) -> bool {
        self.orchestrator.unregister(order.into()).is_some()
    }

    /// Record a size observed by the host (for example by a `ResizeObserver`)
    /// and request a reflow tagged `resize:<order>` if it changed. Returns
    /// `false` if the order was unknown.
    ///
    /// Only engines created with `pushedSizes` lay out with these sizes;
    /// otherwise the next measurement replaces them.
    #[wasm_bindgen(js_name = updateSize)]
    pub fn update_size(&self, order: i32, width: f64, height: f64) -> bool {
        self.orchestrator.update_size(order.into(), Size::new(width, height))
    }

    #[wasm_bindgen(js_name = requestReflow)]
    pub fn request_reflow(&self, token: String) {
        self.orchestrator.request_reflow(token);
    }

    /// Call `callback(token)` after every completed pass. Returns an id for `off`.
    #[wasm_bindgen(js_name = onReflowed)]
    pub fn on_reflowed(&self, callback: js_sys::Function) -> u32 {
        self.listen(Channel::Completed, callback)
    }

    /// Call `callback(token)` for every reflow request. Returns an id for `off`.
    #[wasm_bindgen(js_name = onReflowRequested)]
    pub fn on_reflow_requested(&self, callback: js_sys::Function) -> u32 {
        self.listen(Channel::Requested, callback)
    }

    /// Remove a listener added with `onReflowed` or `onReflowRequested`.
    #[wasm_bindgen]
    pub fn off(&self, id: u32) -> bool {
        let removed = self.subscriptions.borrow_mut().shift_remove(&id);
        match removed {
            Some(subscription) => self.orchestrator.bus().unsubscribe(subscription),
            None => false,
        }
    }

    /// Run the scheduled passes against a container of the given size.
    #[wasm_bindgen]
    pub fn flush(&self, container_width: f64, container_height: f64) -> Result<JsValue, JsError> {
        let config = self.config.get();
        let report = self
            .orchestrator
            .flush(&config, Size::new(container_width, container_height))
            .map_err(|e| JsError::new(&format!("Reflow error: {}", e)))?;

        serde_wasm_bindgen::to_value(&FlushJs::from(&report))
            .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
    }

    /// Current placement of every placed block.
    #[wasm_bindgen]
    pub fn placements(&self) -> Result<JsValue, JsError> {
        let rows = placements_of(&self.orchestrator.registry().borrow());
        serde_wasm_bindgen::to_value(&rows)
            .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
    }

    /// Overall height (columns) or width (rows) from the last pass.
    #[wasm_bindgen(js_name = totalExtent)]
    pub fn total_extent(&self) -> f64 {
        self.orchestrator.total_extent()
    }

    /// Remove move classes once transitions have ended.
    #[wasm_bindgen]
    pub fn settle(&self) {
        self.orchestrator.settle();
    }
}

impl WaterfallEngine {
    fn listen(&self, channel: Channel, callback: js_sys::Function) -> u32 {
        let subscription = self.orchestrator.bus().subscribe(channel, move |token: &Token| {
            let arg = JsValue::from_str(token.as_str());
            if let Err(err) = callback.call1(&JsValue::NULL, &arg) {
                web_sys::console::error_2(
                    &JsValue::from_str(&format!("waterfall listener failed on \"{}\":", token)),
                    &err,
                );
            }
        });
        let id = self.next_subscription.get();
        self.next_subscription.set(id + 1);
        self.subscriptions.borrow_mut().insert(id, subscription);
        id
    }
}

fn config_from_js(value: JsValue) -> Result<LayoutConfig, JsError> {
    let config: LayoutConfig = if value.is_undefined() || value.is_null() {
        LayoutConfig::default()
    } else {
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| JsError::new(&format!("Invalid layout config: {}", e)))?
    };
    config
        .validate()
        .map_err(|e| JsError::new(&format!("Invalid layout config: {}", e)))?;
    Ok(config)
}

/// Get the engine version.
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!get_version().is_empty());
    }
}
