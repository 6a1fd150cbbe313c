use std::sync::atomic::{AtomicU32, Ordering};

/// Correlation id carried by messages nobody will answer.
pub const UNCORRELATED: u32 = 0;

// Process-wide: worker threads each run their own interpreter, but ids must
// stay distinct across all of them.
static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// Resolve the correlation id for an outgoing request.
///
/// A nonzero `requested` id passes through untouched — callers following up
/// on an earlier request (close-by-id) supply the id they were handed. Zero
/// means "assign fresh": the shared counter is post-incremented, so fresh
/// ids start at 1 and are strictly increasing in resolution order. Ids are
/// never reused; wraparound at `u32::MAX` is accepted as unreachable in
/// practice.
pub fn next_id(requested: u32) -> u32 {
    if requested != 0 {
        requested
    } else {
        NEXT_ID.fetch_add(1, Ordering::Relaxed)
    }
}
