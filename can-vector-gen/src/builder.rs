//! Frame value assignment
//!
//! Builds the complete set of signal values for one frame of a message,
//! around a single target signal. For multiplexed messages the selector is
//! resolved first, and only signals present on that page are assigned.

use crate::mux::MuxResolver;
use crate::picker::ValuePicker;
use crate::signals::database::{MessageDefinition, SignalDefinition};
use crate::types::{GeneratorError, Result, SignalValue, ValueAssignment};
use rand::Rng;

/// Frame value builder
pub struct FrameValueBuilder;

impl FrameValueBuilder {
    /// Build a value assignment for `message` that carries `target_value` on
    /// `target`.
    ///
    /// # Arguments
    /// * `message` - Message definition the frame belongs to
    /// * `target` - Signal under test; must belong to `message`
    /// * `target_value` - Value requested for the target
    /// * `rng` - Random source for every other signal
    ///
    /// # Returns
    /// * The assignment, containing the target and every signal present on
    ///   the active page, and no signal gated to another page
    /// * `Err(SignalNotFound)` if `target` is not part of `message`
    ///
    /// When the target is the selector itself, the resolved page replaces
    /// `target_value` so the selector and the assigned signals stay consistent.
    pub fn build<R: Rng + ?Sized>(
        message: &MessageDefinition,
        target: &SignalDefinition,
        target_value: SignalValue,
        rng: &mut R,
    ) -> Result<ValueAssignment> {
        if message.signal(&target.name).is_none() {
            return Err(GeneratorError::SignalNotFound(format!(
                "{} in message {}",
                target.name, message.name
            )));
        }

        let mut values = ValueAssignment::new();
        let mut target_value = target_value;
        let selector = MuxResolver::selector(message);

        let page = selector.map(|selector| {
            let page = MuxResolver::resolve_selector(message, selector, target, rng);
            let page_value = SignalValue::from_page(page);
            values.insert(selector.name.as_str(), page_value);

            if selector.name == target.name {
                if target_value != page_value {
                    log::debug!(
                        "{}: selector target {} requested {}, using resolved page {}",
                        message.name,
                        target.name,
                        target_value,
                        page
                    );
                }
                target_value = page_value;
            }
            page
        });

        for signal in &message.signals {
            if selector.is_some_and(|s| s.name == signal.name) {
                continue;
            }
            if signal.name == target.name {
                values.insert(signal.name.as_str(), target_value);
                continue;
            }

            match page {
                Some(page) if !MuxResolver::is_active(signal, page) => continue,
                None if signal.pages().is_some() => {
                    log::warn!(
                        "{}: signal {} is page-gated but the message has no selector",
                        message.name,
                        signal.name
                    );
                    continue;
                }
                _ => {}
            }

            values.insert(signal.name.as_str(), ValuePicker::pick(signal, rng));
        }

        // Anything still missing and present on the active page gets a default
        for signal in &message.signals {
            if page.map_or(true, |page| MuxResolver::is_active(signal, page)) {
                values.insert_default(&signal.name, || ValuePicker::safe_default(signal));
            }
        }

        log::trace!("{}: {:?}", message.name, values);
        Ok(values)
    }

    /// Like [`FrameValueBuilder::build`], with the target looked up by name
    pub fn build_for<R: Rng + ?Sized>(
        message: &MessageDefinition,
        target_name: &str,
        target_value: SignalValue,
        rng: &mut R,
    ) -> Result<ValueAssignment> {
        let target = message.signal(target_name).ok_or_else(|| {
            GeneratorError::SignalNotFound(format!("{} in message {}", target_name, message.name))
        })?;
        Self::build(message, target, target_value, rng)
    }
}
