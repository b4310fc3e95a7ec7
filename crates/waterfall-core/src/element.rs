//! Attribute and class helpers for the element a block renders into.
//!
//! The engine only ever toggles one transition-marker class on a node, so
//! the [`Element`] abstraction is deliberately small. The free functions take
//! an `Option<&E>` and do nothing when the element is missing; none of them
//! can fail.

/// An element whose attributes can be read and whose class list can be edited.
///
/// Methods take `&self`: host elements (DOM nodes in particular) are handles
/// with interior mutability.
pub trait Element {
    /// Value of the attribute `name`, if present.
    fn attr(&self, name: &str) -> Option<String>;

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|list| list.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn add_class(&self, class: &str);

    fn remove_class(&self, class: &str);
}

impl<E: Element + ?Sized> Element for &E {
    fn attr(&self, name: &str) -> Option<String> {
        (**self).attr(name)
    }

    fn has_class(&self, class: &str) -> bool {
        (**self).has_class(class)
    }

    fn add_class(&self, class: &str) {
        (**self).add_class(class)
    }

    fn remove_class(&self, class: &str) {
        (**self).remove_class(class)
    }
}

impl<E: Element + ?Sized> Element for std::rc::Rc<E> {
    fn attr(&self, name: &str) -> Option<String> {
        (**self).attr(name)
    }

    fn has_class(&self, class: &str) -> bool {
        (**self).has_class(class)
    }

    fn add_class(&self, class: &str) {
        (**self).add_class(class)
    }

    fn remove_class(&self, class: &str) {
        (**self).remove_class(class)
    }
}

/// Read an attribute.
pub fn attr<E: Element + ?Sized>(el: Option<&E>, name: &str) -> Option<String> {
    el?.attr(name)
}

/// Class names listed in the `class` attribute.
pub fn class_list<E: Element + ?Sized>(el: Option<&E>) -> Vec<String> {
    attr(el, "class")
        .map(|list| list.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn has_class<E: Element + ?Sized>(el: Option<&E>, class: &str) -> bool {
    match el {
        Some(el) if !class.is_empty() => el.has_class(class),
        _ => false,
    }
}

/// Add `class` unless it is already present.
pub fn add_class<E: Element + ?Sized>(el: Option<&E>, class: &str) {
    if let Some(el) = el {
        if !class.is_empty() && !el.has_class(class) {
            el.add_class(class);
        }
    }
}

/// Remove `class` if it is present.
pub fn remove_class<E: Element + ?Sized>(el: Option<&E>, class: &str) {
    if let Some(el) = el {
        if !class.is_empty() && el.has_class(class) {
            el.remove_class(class);
        }
    }
}
