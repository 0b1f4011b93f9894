/// Format with a fixed number of decimals and `,` thousands separators,
/// e.g. `1234567.891` → `1,234,567.89`.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3 + 1);
    let negative = value < 0.0 && text.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    if negative {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Display a scaled metric value: `2,630B`, or `n/a` when missing.
pub fn format_value(value: f64, suffix: &str) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{}{suffix}", format_grouped(value, 0))
    }
}
