use serde_json::Value;

/// Inserts `,` between every group of three digits.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_integer(n: i128) -> String {
    let grouped = group_thousands(&n.unsigned_abs().to_string());
    if n < 0 { format!("-{}", grouped) } else { grouped }
}

/// Whole values get no decimals, anything fractional gets exactly two.
pub fn format_float(f: f64) -> String {
    if !f.is_finite() {
        return f.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e18 {
        return format_integer(f as i128);
    }

    let fixed = format!("{:.2}", f.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if f < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, group_thousands(int_part), frac_part)
}

/// Formats a JSON number (or a numeric string) for display.
/// Returns `None` when the value is not numeric.
pub fn format_number(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(format_integer(i as i128))
            } else if let Some(u) = n.as_u64() {
                Some(format_integer(u as i128))
            } else {
                n.as_f64().map(format_float)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(i) = trimmed.parse::<i128>() {
                return Some(format_integer(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(format_float)
        }
        _ => None,
    }
}
