//! Multiplexer page resolution
//!
//! Works out which selector values ("pages") a message declares and which one
//! a generated frame should use so that a given target signal is present.

use crate::signals::database::{MessageDefinition, SignalDefinition};
use rand::Rng;
use std::collections::BTreeSet;

/// Multiplexer resolver
pub struct MuxResolver;

impl MuxResolver {
    /// Sorted union of the pages declared by the message's non-selector
    /// signals. Empty if no signal is page-gated.
    pub fn valid_selector_values(message: &MessageDefinition) -> Vec<u64> {
        message
            .signals
            .iter()
            .filter(|s| !s.is_multiplexer)
            .filter_map(|s| s.pages())
            .flatten()
            .copied()
            .collect::<BTreeSet<u64>>()
            .into_iter()
            .collect()
    }

    /// The message's selector signal, if any
    pub fn selector(message: &MessageDefinition) -> Option<&SignalDefinition> {
        message.signals.iter().find(|s| s.is_multiplexer)
    }

    /// Pick the selector value for a frame built around `target`.
    ///
    /// A page-gated target gets its smallest page that the message actually
    /// declares. Otherwise a declared page is drawn at random, then a raw key
    /// of the selector's value table, and finally page 0.
    pub fn resolve_selector<R: Rng + ?Sized>(
        message: &MessageDefinition,
        selector: &SignalDefinition,
        target: &SignalDefinition,
        rng: &mut R,
    ) -> u64 {
        let valid = Self::valid_selector_values(message);

        if let Some(target_pages) = target.pages() {
            // BTreeSet iterates in ascending order
            let preferred = target_pages
                .iter()
                .find(|page| valid.is_empty() || valid.binary_search(*page).is_ok());
            if let Some(&page) = preferred.or_else(|| target_pages.iter().next()) {
                log::trace!(
                    "{}: selector {} = {} for target '{}'",
                    message.name,
                    selector.name,
                    page,
                    target.name
                );
                return page;
            }
        }

        if !valid.is_empty() {
            return valid[rng.random_range(0..valid.len())];
        }

        if let Some(choices) = selector.choices() {
            let keys: Vec<u64> = choices
                .keys()
                .filter_map(|&k| u64::try_from(k).ok())
                .collect();
            if !keys.is_empty() {
                return keys[rng.random_range(0..keys.len())];
            }
            log::warn!(
                "{}: selector '{}' has only negative value-table keys",
                message.name,
                selector.name
            );
        }

        0
    }

    /// True if `signal` is present when the selector holds `selector_value`.
    /// Signals without a page set are present on every page.
    pub fn is_active(signal: &SignalDefinition, selector_value: u64) -> bool {
        signal
            .pages()
            .map_or(true, |pages| pages.contains(&selector_value))
    }
}
