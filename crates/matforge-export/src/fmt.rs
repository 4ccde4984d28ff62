//! Number and color formatting shared by the backends.
//!
//! Output text must be byte-identical across runs, so every float goes
//! through one of these helpers instead of ad-hoc `Display` calls.

use matforge_ir::Rgb;

/// Compact float: integral values lose the fraction, everything else keeps
/// Rust's shortest round-trip form.
pub(crate) fn num(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Color triple at the four-decimal precision of the statement formats.
pub(crate) fn col(c: Rgb) -> String {
    format!("{:.4} {:.4} {:.4}", c.r, c.g, c.b)
}
