//! The ordered set of blocks managed by one waterfall container.

use indexmap::IndexMap;
use waterfall_core::{ExtensionValue, Rect, RegistryError, Size};

use crate::allocator::Layout;

/// One managed child of the container.
#[derive(Debug, Clone)]
pub struct Block<N> {
    /// Declared sequence number, unique within a registry
    pub order: i64,
    /// Last measured width
    pub width: f64,
    /// Last measured height
    pub height: f64,
    /// Handle to the rendered node; the registry never owns its lifecycle
    pub node: N,
    /// Last computed placement, `None` until a pass places the block
    pub rect: Option<Rect>,
    /// Class applied to the node while it moves to a new position
    pub move_class: String,
}

impl<N> Block<N> {
    /// Create an unmeasured block.
    pub fn new(order: i64, node: N) -> Self {
        Self {
            order,
            width: 0.0,
            height: 0.0,
            node,
            rect: None,
            move_class: String::new(),
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_move_class(mut self, class: impl Into<String>) -> Self {
        self.move_class = class.into();
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// A partial update to a registered block.
#[derive(Debug, Clone, Default)]
pub struct BlockPatch {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub move_class: Option<String>,
    /// Annotations merged into the block's rect; ignored while it is unplaced
    pub extensions: Vec<(String, ExtensionValue)>,
}

impl BlockPatch {
    /// A patch carrying a new measurement.
    pub fn size(size: Size) -> Self {
        Self {
            width: Some(size.width),
            height: Some(size.height),
            ..Default::default()
        }
    }

    pub fn with_move_class(mut self, class: impl Into<String>) -> Self {
        self.move_class = Some(class.into());
        self
    }

    pub fn annotate(mut self, key: impl Into<String>, value: impl Into<ExtensionValue>) -> Self {
        self.extensions.push((key.into(), value.into()));
        self
    }
}

/// Blocks keyed by declared order, always iterated in ascending order.
#[derive(Debug, Clone)]
pub struct BlockRegistry<N> {
    blocks: IndexMap<i64, Block<N>>,
}

impl<N> Default for BlockRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> BlockRegistry<N> {
    pub fn new() -> Self {
        Self {
            blocks: IndexMap::new(),
        }
    }

    /// Add a block. Its order must not already be registered.
    pub fn register(&mut self, block: Block<N>) -> Result<(), RegistryError> {
        let order = block.order;
        if self.blocks.contains_key(&order) {
            return Err(RegistryError::DuplicateOrder { order });
        }
        let appended = self.blocks.last().map_or(true, |(&last, _)| last < order);
        self.blocks.insert(order, block);
        if !appended {
            self.blocks.sort_unstable_keys();
        }
        Ok(())
    }

    /// Remove a block. Unknown orders are ignored.
    pub fn unregister(&mut self, order: i64) -> Option<Block<N>> {
        self.blocks.shift_remove(&order)
    }

    /// Apply a patch. Returns `false` if no block has this order.
    pub fn update(&mut self, order: i64, patch: BlockPatch) -> bool {
        let Some(block) = self.blocks.get_mut(&order) else {
            return false;
        };
        if let Some(width) = patch.width {
            block.width = width;
        }
        if let Some(height) = patch.height {
            block.height = height;
        }
        if let Some(class) = patch.move_class {
            block.move_class = class;
        }
        if let Some(rect) = block.rect.as_mut() {
            for (key, value) in patch.extensions {
                rect.extensions.insert(key, value);
            }
        }
        true
    }

    pub fn get(&self, order: i64) -> Option<&Block<N>> {
        self.blocks.get(&order)
    }

    pub fn contains(&self, order: i64) -> bool {
        self.blocks.contains_key(&order)
    }

    /// Registered orders, ascending.
    pub fn orders(&self) -> impl Iterator<Item = i64> + '_ {
        self.blocks.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block<N>> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Orders of placed blocks whose geometry differs in `layout`.
    ///
    /// Blocks placed for the first time are not included: they appear, they
    /// do not move.
    pub fn moved(&self, layout: &Layout) -> Vec<i64> {
        layout
            .placements
            .iter()
            .filter_map(|(order, placement)| {
                let previous = self.blocks.get(order)?.rect.as_ref()?;
                (!previous.same_geometry(&placement.rect)).then_some(*order)
            })
            .collect()
    }

    /// Write a layout's geometry back into the registry.
    ///
    /// Each block's geometry is replaced as a whole and its rect extensions
    /// are kept. Placements for blocks unregistered since the snapshot are
    /// dropped. Returns the number of blocks written.
    pub fn commit(&mut self, layout: &Layout) -> usize {
        let mut written = 0;
        for (order, placement) in &layout.placements {
            let Some(block) = self.blocks.get_mut(order) else {
                continue;
            };
            match block.rect.as_mut() {
                Some(rect) => rect.set_geometry(&placement.rect),
                None => block.rect = Some(placement.rect.clone()),
            }
            written += 1;
        }
        written
    }
}

impl<N: Clone> BlockRegistry<N> {
    /// Copy of every block, ascending by order.
    pub fn snapshot(&self) -> Vec<Block<N>> {
        self.blocks.values().cloned().collect()
    }
}
