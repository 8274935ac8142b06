//! Mixing bridge lookup.

use crate::engine::Bridge;

/// Returns the first mixing bridge in engine order, if any.
///
/// At most one mixing bridge is expected to be live; when several exist the
/// first one listed wins.
#[must_use]
pub fn find_mixing_bridge(bridges: &[Bridge]) -> Option<&Bridge> {
    bridges.iter().find(|bridge| bridge.is_mixing())
}
