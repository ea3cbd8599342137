//! Label-based skip policy.
//!
//! Harness-granularity exclusion: one feature whose label disagrees with the
//! runtime filter skips the whole harness, even if its siblings match.

use harness_inventory::{Feature, HarnessId, Labels};

use crate::diagnostics::Diagnostic;

/// Decide whether a harness's creation is suppressed.
///
/// An empty filter never skips. A feature missing a filter key imposes no
/// constraint; a feature carrying the key with another value does.
pub fn should_skip(filter: &Labels, features: &[Feature]) -> bool {
    if filter.is_empty() {
        return false;
    }

    features.iter().any(|feat| {
        filter
            .iter()
            .any(|(key, want)| feat.labels.get(key).is_some_and(|have| have != want))
    })
}

/// Warning surfaced when a harness is skipped.
pub fn skip_warning(id: &HarnessId) -> Diagnostic {
    Diagnostic::warning(
        format!("skipping harness [{id}] creation"),
        "given provider runtime labels do not match feature labels",
    )
}
