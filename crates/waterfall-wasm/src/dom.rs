//! DOM adapters: class toggling and measurement on `web_sys::Element`.

use waterfall_core::{Element, Size};
use waterfall_reflow::Measure;

/// A block's DOM element.
#[derive(Debug, Clone)]
pub struct DomNode(pub web_sys::Element);

impl Element for DomNode {
    fn attr(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn add_class(&self, class: &str) {
        // DOMTokenList only rejects empty or whitespace tokens
        let _ = self.0.class_list().add_1(class);
    }

    fn remove_class(&self, class: &str) {
        let _ = self.0.class_list().remove_1(class);
    }
}

/// Where block sizes come from on each pass.
///
/// `Live` measures elements with `getBoundingClientRect`. Detached elements
/// and elements with an empty box report no size, so the engine waits for
/// them instead of stacking zero-height blocks.
///
/// `Pushed` never measures: the host reports sizes itself, typically from a
/// `ResizeObserver`, and the registry keeps what it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomMeasure {
    #[default]
    Live,
    Pushed,
}

impl Measure<DomNode> for DomMeasure {
    fn measure(&self, node: &DomNode) -> Option<Size> {
        if *self == DomMeasure::Pushed || !node.0.is_connected() {
            return None;
        }
        let rect = node.0.get_bounding_client_rect();
        let size = Size::new(rect.width(), rect.height());
        (size.width > 0.0 || size.height > 0.0).then_some(size)
    }
}
