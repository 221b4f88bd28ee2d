//! Bounded history buffers.
//!
//! Every entity keeps a fixed-size, chronological window of its most recent
//! samples. Appending never touches the existing buffer: a new `Vec` holding
//! the last `capacity` items of `old ++ [item]` is returned, so a snapshot
//! taken before the append stays valid and complete.

/// Returns the last `capacity` items of `buffer` followed by `item`.
///
/// Oldest entries are evicted first. A `capacity` of zero yields an empty
/// buffer.
pub fn append_bounded<T: Clone>(buffer: &[T], item: T, capacity: usize) -> Vec<T> {
    if capacity == 0 {
        return Vec::new();
    }
    // Keep `capacity - 1` of the old items to leave room for the new one.
    let keep = buffer.len().min(capacity - 1);
    let mut next = Vec::with_capacity(keep + 1);
    next.extend_from_slice(&buffer[buffer.len() - keep..]);
    next.push(item);
    next
}
