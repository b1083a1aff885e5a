use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use thiserror::Error;

/// Largest scale a [`Decimal`] may carry.
pub const MAX_SCALE: u8 = 38;

/// Errors raised while constructing or parsing a [`Decimal`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecimalError {
    /// The text is not a decimal number.
    #[error("invalid decimal literal '{0}'")]
    Invalid(String),
    /// The number needs more digits than 128-bit arithmetic holds.
    #[error("decimal literal '{0}' has too many digits")]
    Overflow(String),
    /// The scale is beyond [`MAX_SCALE`].
    #[error("decimal scale {0} exceeds {MAX_SCALE}")]
    Scale(i64),
}

/// Fixed-point decimal number: `unscaled * 10^-scale`.
///
/// Equality, ordering and hashing are numeric, so `2.10` equals `2.1`.
#[derive(Clone, Copy, Debug)]
pub struct Decimal {
    unscaled: i128,
    scale: u8,
}

fn pow10(exp: u8) -> i128 {
    10_i128.pow(u32::from(exp))
}

impl Decimal {
    /// Creates a decimal from its unscaled value and scale.
    pub fn try_new(unscaled: i128, scale: u8) -> Result<Self, DecimalError> {
        if scale > MAX_SCALE {
            return Err(DecimalError::Scale(i64::from(scale)));
        }
        Ok(Self { unscaled, scale })
    }

    /// The unscaled integer value.
    #[must_use]
    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    /// Digits after the decimal point.
    #[must_use]
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Number of significant digits of the unscaled value (at least 1).
    #[must_use]
    pub fn precision(&self) -> u8 {
        let mut magnitude = self.unscaled.unsigned_abs();
        let mut digits = 1;
        while magnitude >= 10 {
            magnitude /= 10;
            digits += 1;
        }
        digits
    }

    /// Re-expresses the value at `scale` digits, rounding half away from zero.
    ///
    /// Returns `None` when the result does not fit.
    #[must_use]
    pub fn rescale(&self, scale: u8) -> Option<Decimal> {
        if scale > MAX_SCALE {
            return None;
        }
        match scale.cmp(&self.scale) {
            Ordering::Equal => Some(*self),
            Ordering::Greater => {
                let unscaled = self.unscaled.checked_mul(pow10(scale - self.scale))?;
                Some(Decimal { unscaled, scale })
            }
            Ordering::Less => {
                let divisor = pow10(self.scale - scale);
                let mut unscaled = self.unscaled / divisor;
                let remainder = self.unscaled % divisor;
                if remainder.unsigned_abs() * 2 >= divisor.unsigned_abs() {
                    unscaled += self.unscaled.signum();
                }
                Some(Decimal { unscaled, scale })
            }
        }
    }

    /// The same number with trailing fractional zeros removed.
    #[must_use]
    pub fn normalize(&self) -> Decimal {
        let mut normalized = *self;
        while normalized.scale > 0 && normalized.unscaled % 10 == 0 {
            normalized.unscaled /= 10;
            normalized.scale -= 1;
        }
        normalized
    }

    fn split(&self) -> (i128, i128) {
        let divisor = pow10(self.scale);
        (self.unscaled / divisor, self.unscaled % divisor)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal {
            unscaled: i128::from(value),
            scale: 0,
        }
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecimalError::Invalid(s.to_owned());
        let overflow = || DecimalError::Overflow(s.to_owned());
        let text = s.trim();

        let (mantissa, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
            Some(idx) => (
                &text[..idx],
                text[idx + 1..].parse::<i32>().map_err(|_| invalid())?,
            ),
            None => (text, 0),
        };
        let (negative, digits) = match mantissa.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
        };
        let (integral, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if integral.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !integral
            .bytes()
            .chain(fraction.bytes())
            .all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let mut unscaled: i128 = 0;
        for b in integral.bytes().chain(fraction.bytes()) {
            unscaled = unscaled
                .checked_mul(10)
                .and_then(|v| v.checked_add(i128::from(b - b'0')))
                .ok_or_else(overflow)?;
        }
        let mut scale = fraction.len() as i64 - i64::from(exponent);
        if scale < 0 {
            let factor = u32::try_from(-scale)
                .ok()
                .and_then(|exp| 10_i128.checked_pow(exp))
                .ok_or_else(overflow)?;
            unscaled = unscaled.checked_mul(factor).ok_or_else(overflow)?;
            scale = 0;
        }
        let scale = u8::try_from(scale)
            .ok()
            .filter(|scale| *scale <= MAX_SCALE)
            .ok_or(DecimalError::Scale(scale))?;
        if negative {
            unscaled = -unscaled;
        }
        Ok(Decimal { unscaled, scale })
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.scale == other.scale {
            return self.unscaled.cmp(&other.unscaled);
        }
        // Integral parts first; fractional remainders are then aligned to the
        // wider scale, which stays below 10^38.
        let (left_int, left_frac) = self.split();
        let (right_int, right_frac) = other.split();
        left_int.cmp(&right_int).then_with(|| {
            let scale = self.scale.max(other.scale);
            (left_frac * pow10(scale - self.scale)).cmp(&(right_frac * pow10(scale - other.scale)))
        })
    }
}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let normalized = self.normalize();
        normalized.unscaled.hash(state);
        normalized.scale.hash(state);
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let magnitude = self.unscaled.unsigned_abs();
        if self.scale == 0 {
            return write!(f, "{sign}{magnitude}");
        }
        let divisor = 10_u128.pow(u32::from(self.scale));
        write!(
            f,
            "{sign}{}.{:0width$}",
            magnitude / divisor,
            magnitude % divisor,
            width = usize::from(self.scale)
        )
    }
}
