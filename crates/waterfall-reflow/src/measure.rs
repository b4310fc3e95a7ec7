use waterfall_core::Size;

/// Reports the current size of a node.
///
/// `None` means the node cannot be measured yet (for example it is not
/// attached). The block keeps its last known size and is retried on the
/// next pass.
pub trait Measure<N> {
    fn measure(&self, node: &N) -> Option<Size>;
}

impl<N, F> Measure<N> for F
where
    F: Fn(&N) -> Option<Size>,
{
    fn measure(&self, node: &N) -> Option<Size> {
        self(node)
    }
}
