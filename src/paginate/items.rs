use std::num::NonZeroUsize;

/// Split `items` into order-preserving groups of at most `size` elements.
/// An empty list still yields one (empty) group so a sheet is always printed.
pub fn chunk_items<T>(items: &[T], size: NonZeroUsize) -> Vec<&[T]> {
    if items.is_empty() {
        return vec![&items[..0]];
    }
    items.chunks(size.get()).collect()
}
