//! Display masks for company contact fields.

/// Longest Brazilian phone number: two area digits plus a nine-digit mobile.
pub const PHONE_MAX_DIGITS: usize = 11;

/// Applies the `(NN) NNNNN-NNNN` mask to whatever digits are present.
///
/// Ten-digit landlines get `(NN) NNNN-NNNN`. Partial input is masked as far as
/// it goes and digits past the eleventh are dropped.
#[must_use]
pub fn format_phone(candidate: &str) -> String {
    let digits: String = candidate
        .chars()
        .filter(char::is_ascii_digit)
        .take(PHONE_MAX_DIGITS)
        .collect();

    if digits.len() <= 2 {
        return digits;
    }

    let (area, number) = digits.split_at(2);
    let prefix_len = if digits.len() == 10 { 4 } else { 5 };
    if number.len() <= prefix_len {
        return format!("({area}) {number}");
    }

    let (prefix, line) = number.split_at(prefix_len);
    format!("({area}) {prefix}-{line}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("11988887777"), "(11) 98888-7777");
        assert_eq!(format_phone("(11) 98888-7777"), "(11) 98888-7777");
        assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
        assert_eq!(format_phone("+55 11 98888-7777"), "(55) 11988-8877");
    }

    #[test]
    fn test_format_phone_partial_input() {
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("11"), "11");
        assert_eq!(format_phone("119"), "(11) 9");
        assert_eq!(format_phone("1198888"), "(11) 98888");
        assert_eq!(format_phone("11988887"), "(11) 98888-7");
        assert_eq!(format_phone("119888877771234"), "(11) 98888-7777");
    }
}
