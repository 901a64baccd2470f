//! Signal value domains
//!
//! Pure functions describing which values a signal can carry: the raw bit
//! range, the physical range after scaling and declared bounds, and whether
//! the signal is really a boolean flag.

use crate::signals::database::SignalDefinition;

/// Widest raw value a signal may declare
pub const MAX_SIGNAL_BITS: u16 = 64;

/// Physical values a signal can encode, and the granularity used to sample them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalRange {
    pub min: f64,
    pub max: f64,
    /// Sampling step in physical units. Never zero.
    pub step: f64,
}

impl PhysicalRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// True if `value` lies in `[min - tolerance, max + tolerance]`
    pub fn contains(&self, value: f64, tolerance: f64) -> bool {
        self.min - tolerance <= value && value <= self.max + tolerance
    }

    /// Step of at least 1 that is (numerically) a whole number
    pub fn is_integral_step(&self) -> bool {
        self.step >= 1.0 && (self.step - self.step.round()).abs() < 1e-12
    }

    fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.step.is_finite()
    }
}

/// Signal domain computations
pub struct SignalDomain;

impl SignalDomain {
    /// Raw integer range representable in the signal's bit width.
    ///
    /// Unsigned: `[0, 2^n - 1]`. Signed: `[-2^(n-1), 2^(n-1) - 1]`.
    /// Lengths outside `1..=64` are clamped into that interval.
    pub fn raw_range(signal: &SignalDefinition) -> (i128, i128) {
        let bits = u32::from(signal.length.clamp(1, MAX_SIGNAL_BITS));
        if signal.is_signed() {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        } else {
            (0, (1i128 << bits) - 1)
        }
    }

    /// Reinterpret an unsigned `bits`-wide integer as two's complement.
    ///
    /// The input is masked to `bits` first, so already-negative values map to
    /// themselves. `bits <= 0` (and widths beyond `i128`) return `raw` unchanged.
    pub fn twos_complement(raw: i128, bits: i32) -> i128 {
        if bits <= 0 || bits >= 128 {
            return raw;
        }
        let mask = (1i128 << bits) - 1;
        let raw = raw & mask;
        let sign_bit = 1i128 << (bits - 1);
        if raw & sign_bit != 0 {
            raw - (1i128 << bits)
        } else {
            raw
        }
    }

    /// Effective scale: a zero factor would collapse every value, so it is
    /// treated as 1.
    pub fn scale(signal: &SignalDefinition) -> f64 {
        if signal.factor == 0.0 {
            1.0
        } else {
            signal.factor
        }
    }

    /// Encodable physical range of a signal.
    ///
    /// The raw range is mapped through `raw * scale + offset`, then narrowed
    /// by the declared bounds. Declared bounds never widen the range; if they
    /// do not overlap it at all the raw-derived range is used. Near-continuous
    /// signals get a coarser sampling step of `span / 1000`.
    pub fn physical_range(signal: &SignalDefinition) -> PhysicalRange {
        let scale = Self::scale(signal);
        let (raw_min, raw_max) = Self::raw_range(signal);

        let mut phys_min = raw_min as f64 * scale + signal.offset;
        let mut phys_max = raw_max as f64 * scale + signal.offset;
        if phys_min > phys_max {
            std::mem::swap(&mut phys_min, &mut phys_max);
        }

        let mut min = signal.min.unwrap_or(phys_min);
        let mut max = signal.max.unwrap_or(phys_max);
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }

        min = min.max(phys_min);
        max = max.min(phys_max);
        if min > max {
            min = phys_min;
            max = phys_max;
        }

        let mut step = scale.abs();
        let span = max - min;
        if span > 0.0 && step < span / 10_000.0 {
            step = span / 1000.0;
        }

        PhysicalRange { min, max, step }
    }

    /// Like [`SignalDomain::physical_range`], but `None` for descriptors the
    /// range cannot be trusted for: bit lengths outside `1..=64` or
    /// non-finite scaling.
    pub fn checked_physical_range(signal: &SignalDefinition) -> Option<PhysicalRange> {
        if signal.length == 0 || signal.length > MAX_SIGNAL_BITS {
            return None;
        }
        if !signal.factor.is_finite() || !signal.offset.is_finite() {
            return None;
        }
        let range = Self::physical_range(signal);
        range.is_finite().then_some(range)
    }

    /// Single unsigned bit with identity scaling and bounds of at most `[0, 1]`
    pub fn is_boolean(signal: &SignalDefinition) -> bool {
        signal.length == 1
            && !signal.is_signed()
            && signal.factor == 1.0
            && signal.offset == 0.0
            && signal.min.map_or(true, |v| v == 0.0)
            && signal.max.map_or(true, |v| v == 1.0)
    }
}
