//! Guards that decide whether a provider-sourced value is a usable number.
//!
//! Every arithmetic operation and every rendered price goes through these
//! helpers, so an absent, null, NaN, infinite, or non-numeric value can never
//! reach a division or a format string.

/// Text shown in place of an unusable value.
pub const PLACEHOLDER: &str = "N/A";

/// Values that may or may not hold a finite real number.
pub trait MaybeNumeric {
    /// The value as a finite `f64`, or `None`.
    fn as_finite(&self) -> Option<f64>;
}

impl MaybeNumeric for f64 {
    fn as_finite(&self) -> Option<f64> {
        self.is_finite().then_some(*self)
    }
}

impl MaybeNumeric for f32 {
    fn as_finite(&self) -> Option<f64> {
        f64::from(*self).as_finite()
    }
}

impl MaybeNumeric for i64 {
    #[allow(clippy::cast_precision_loss)]
    fn as_finite(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl<T: MaybeNumeric> MaybeNumeric for Option<T> {
    fn as_finite(&self) -> Option<f64> {
        self.as_ref().and_then(MaybeNumeric::as_finite)
    }
}

impl<T: MaybeNumeric + ?Sized> MaybeNumeric for &T {
    fn as_finite(&self) -> Option<f64> {
        (**self).as_finite()
    }
}

impl MaybeNumeric for str {
    fn as_finite(&self) -> Option<f64> {
        self.trim().parse::<f64>().ok().and_then(|v| v.as_finite())
    }
}

impl MaybeNumeric for String {
    fn as_finite(&self) -> Option<f64> {
        self.as_str().as_finite()
    }
}

impl MaybeNumeric for serde_json::Value {
    fn as_finite(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64().and_then(|v| v.as_finite()),
            Self::String(s) => s.as_finite(),
            _ => None,
        }
    }
}

/// True iff `v` holds a finite real number.
pub fn is_numeric<T: MaybeNumeric + ?Sized>(v: &T) -> bool {
    v.as_finite().is_some()
}

/// Fixed-point `v` in `width` characters, or `"N/A"` right-justified to `width`.
pub fn format_or_placeholder<T: MaybeNumeric + ?Sized>(
    v: &T,
    width: usize,
    precision: usize,
) -> String {
    match v.as_finite() {
        Some(x) => format!("{x:width$.precision$}"),
        None => format!("{PLACEHOLDER:>width$}"),
    }
}

/// [`format_or_placeholder`] with the report's standard 10.2 layout.
pub fn format_price<T: MaybeNumeric + ?Sized>(v: &T) -> String {
    format_or_placeholder(v, 10, 2)
}

/// Percent change from `from` to `to`.
///
/// `None` when either operand is unusable or `from` is zero.
#[must_use]
pub fn pct_change(from: Option<f64>, to: Option<f64>) -> Option<f64> {
    let from = from.as_finite()?;
    let to = to.as_finite()?;
    if from == 0.0 {
        return None;
    }
    ((to - from) / from * 100.0).as_finite()
}
