// Console formatting helpers.
use num_format::{Locale, ToFormattedString};

/// Format a floating-point value with fixed decimals and thousands
/// separators (e.g. `1,234,567.89`) for console diagnostics.
pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative();
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators_and_sign() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1000.5, 2), "-1,000.50");
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_int(9855i64), "9,855");
    }
}
