//! Random value selection
//!
//! Picks one legal value for a signal: an enumerated choice when the signal
//! has usable ones, a boolean for flag signals, otherwise a sample from the
//! encodable physical range.

use crate::domain::SignalDomain;
use crate::mux::MuxResolver;
use crate::signals::database::{MessageDefinition, SignalDefinition};
use crate::types::{round_to, SignalValue};
use rand::Rng;

/// Value-table labels meaning "signal not available". These raw values are
/// never generated.
pub const NOT_AVAILABLE_LABELS: &[&str] = &["sna", "na", "n/a"];

/// Tolerance when checking a choice against the physical range
const CHOICE_TOLERANCE: f64 = 1e-9;

/// Upper bound on the number of sampling steps across a continuous range
const MAX_SAMPLES: i64 = 2000;

/// Sample count used when the step cannot be trusted
const DEFAULT_SAMPLES: i64 = 100;

/// Decimal places kept on sampled continuous values
const SAMPLE_DECIMALS: i32 = 6;

/// Value returned by [`ValuePicker::safe_default`] when the signal's range
/// cannot be computed from its descriptor.
pub const FALLBACK_DEFAULT: SignalValue = SignalValue::Integer(0);

/// Value picker - draws legal values for signals
pub struct ValuePicker;

impl ValuePicker {
    /// Draw one legal value for `signal`
    pub fn pick<R: Rng + ?Sized>(signal: &SignalDefinition, rng: &mut R) -> SignalValue {
        let choices = Self::filtered_choices(signal);
        if !choices.is_empty() {
            return choices[rng.random_range(0..choices.len())];
        }

        if SignalDomain::is_boolean(signal) {
            return SignalValue::Boolean(rng.random_bool(0.5));
        }

        let range = SignalDomain::physical_range(signal);
        if range.min == range.max {
            return Self::physical_value(range.min, range.is_integral_step());
        }

        if range.is_integral_step() {
            let (mut lo, mut hi) = (range.min.round() as i64, range.max.round() as i64);
            if lo > hi {
                std::mem::swap(&mut lo, &mut hi);
            }
            return SignalValue::Integer(rng.random_range(lo..=hi));
        }

        let n = if range.step > 0.0 {
            (range.span() / range.step) as i64
        } else {
            DEFAULT_SAMPLES
        };
        // At least one step, so a sub-step range may overshoot max by < step
        let n = n.clamp(1, MAX_SAMPLES);
        let k = rng.random_range(0..=n);
        SignalValue::Float(round_to(range.min + k as f64 * range.step, SAMPLE_DECIMALS))
    }

    /// The enumerated values `pick` may return for this signal.
    ///
    /// "Not available" labels are dropped, signed raw keys are read as two's
    /// complement, and choices outside the physical range are discarded.
    /// Values are integers for unscaled signals, physical floats otherwise.
    pub fn filtered_choices(signal: &SignalDefinition) -> Vec<SignalValue> {
        let Some(choices) = signal.choices() else {
            return Vec::new();
        };

        let scale = SignalDomain::scale(signal);
        let range = SignalDomain::physical_range(signal);
        let unscaled = scale == 1.0 && signal.offset == 0.0;

        choices
            .iter()
            .filter(|(_, label)| !Self::is_not_available(label))
            .filter_map(|(&raw, _)| {
                let raw = if signal.is_signed() {
                    SignalDomain::twos_complement(i128::from(raw), i32::from(signal.length))
                } else {
                    i128::from(raw)
                };
                let physical = raw as f64 * scale + signal.offset;
                if !range.contains(physical, CHOICE_TOLERANCE) {
                    return None;
                }
                if !unscaled {
                    return Some(SignalValue::Float(physical));
                }
                match i64::try_from(raw) {
                    Ok(raw) => Some(SignalValue::Integer(raw)),
                    Err(_) => {
                        log::warn!("Choice {} of '{}' does not fit in i64, skipping", raw, signal.name);
                        None
                    }
                }
            })
            .collect()
    }

    /// A value that is always encodable, for signals the builder could not
    /// otherwise place.
    ///
    /// Booleans default to `false`, everything else to the bottom of its
    /// physical range. Descriptors whose range cannot be computed (zero or
    /// oversized bit length, non-finite scaling) get [`FALLBACK_DEFAULT`]: a
    /// best-effort value for the test harness, not a claim that it encodes.
    pub fn safe_default(signal: &SignalDefinition) -> SignalValue {
        if SignalDomain::is_boolean(signal) {
            return SignalValue::Boolean(false);
        }

        match SignalDomain::checked_physical_range(signal) {
            Some(range) => Self::physical_value(range.min, range.is_integral_step()),
            None => {
                log::warn!(
                    "Cannot compute range for signal '{}' (length {}, factor {}, offset {}), using {}",
                    signal.name,
                    signal.length,
                    signal.factor,
                    signal.offset,
                    FALLBACK_DEFAULT
                );
                FALLBACK_DEFAULT
            }
        }
    }

    /// The value a test should request for `signal` when it is the target of
    /// a generated frame. The selector gets one of the message's declared
    /// pages; other signals get a regular pick.
    pub fn candidate_for<R: Rng + ?Sized>(
        message: &MessageDefinition,
        signal: &SignalDefinition,
        rng: &mut R,
    ) -> SignalValue {
        if !signal.is_multiplexer {
            return Self::pick(signal, rng);
        }

        let pages = MuxResolver::valid_selector_values(message);
        if pages.is_empty() {
            Self::safe_default(signal)
        } else {
            SignalValue::from_page(pages[rng.random_range(0..pages.len())])
        }
    }

    fn is_not_available(label: &str) -> bool {
        let label = label.trim();
        NOT_AVAILABLE_LABELS
            .iter()
            .any(|sentinel| label.eq_ignore_ascii_case(sentinel))
    }

    fn physical_value(value: f64, integral: bool) -> SignalValue {
        if integral {
            SignalValue::Integer(value.round() as i64)
        } else {
            SignalValue::Float(value)
        }
    }
}
