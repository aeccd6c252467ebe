/// Format a floating-point number for display
///
/// Very large (>= 1e9) or very small nonzero (< 0.005) magnitudes use
/// scientific notation with up to six significant digits. Everything else
/// is rounded to two decimals, half away from zero, with trailing zeros
/// removed (e.g., 4.0 -> "4", 62.1371 -> "62.14").
pub fn format_number(value: f64) -> String {
    let magnitude = value.abs();

    if magnitude >= 1e9 || (magnitude > 0.0 && magnitude < 0.005) {
        let formatted = format!("{:.5e}", value);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
                format!("{}e{}", mantissa, exponent)
            }
            None => formatted,
        };
    }

    // f64::round is half-away-from-zero
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }

    let formatted = format!("{:.2}", rounded);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
