//! Arithmetic on a single `<number> <op> <number>` line.

pub const USAGE_ERROR: &str = "Error: use '<number> <op> <number>'";
pub const INVALID_NUMBER: &str = "Error: invalid number";
pub const DIVISION_BY_ZERO: &str = "Error: division by zero";
pub const UNSUPPORTED_OPERATOR: &str = "Error: unsupported operator";

/// Evaluates one request line and returns the text to send back.
///
/// Errors are part of the returned text; this never fails.
pub fn evaluate(line: &str) -> String {
    let tokens = line.split_whitespace().collect::<Vec<_>>();
    let [left, op, right] = tokens[..] else {
        return USAGE_ERROR.to_string();
    };

    let (Ok(left), Ok(right)) = (left.parse::<f64>(), right.parse::<f64>()) else {
        return INVALID_NUMBER.to_string();
    };

    let result = match op {
        "+" => left + right,
        "-" => left - right,
        "*" => left * right,
        "/" => {
            // Also catches -0.0
            if right == 0.0 {
                return DIVISION_BY_ZERO.to_string();
            }
            left / right
        }
        _ => return UNSUPPORTED_OPERATOR.to_string(),
    };

    format_number(result)
}

/// Shortest text that round-trips to `value`, laid out like Java's
/// `Double.toString`: plain decimals for magnitudes in `[1e-3, 1e7)`,
/// `1.0E300` style otherwise, and `Infinity`/`NaN` for the special values.
fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{value:?}");
    }

    // `{:e}` gives e.g. `1.5e10` or `1e-5`; the mantissa always needs a fraction
    let text = format!("{value:e}");
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}
