//! Brazilian company tax ID (CNPJ) validation and formatting.
//!
//! A CNPJ is 14 digits; the last two are mod-11 check digits computed over the
//! preceding digits with cycling positional weights. Formatting characters
//! (`.`, `/`, `-`, spaces) are ignored when validating.

/// Number of digits in a CNPJ.
pub const TAX_ID_LEN: usize = 14;

/// Weights for the first check digit (over digits 0..12).
const FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
/// Weights for the second check digit (over digits 0..13).
const SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Returns only the ASCII digits of `candidate`.
#[must_use]
pub fn tax_id_digits(candidate: &str) -> String {
    candidate.chars().filter(char::is_ascii_digit).collect()
}

/// Checks a tax ID against the weighted mod-11 check-digit scheme.
///
/// Never fails: anything that is not 14 digits after stripping formatting, or
/// that repeats a single digit, is simply invalid.
#[must_use]
pub fn is_valid_tax_id(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != TAX_ID_LEN {
        return false;
    }

    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    check_digit(&digits[..12], &FIRST_WEIGHTS) == digits[12]
        && check_digit(&digits[..13], &SECOND_WEIGHTS) == digits[13]
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

/// Applies the `NN.NNN.NNN/NNNN-NN` mask to whatever digits are present.
///
/// Partial input is masked as far as it goes; digits past the fourteenth are dropped.
#[must_use]
pub fn format_tax_id(candidate: &str) -> String {
    let digits = tax_id_digits(candidate);
    let mut formatted = String::with_capacity(18);

    for (i, digit) in digits.chars().take(TAX_ID_LEN).enumerate() {
        match i {
            2 | 5 => formatted.push('.'),
            8 => formatted.push('/'),
            12 => formatted.push('-'),
            _ => {}
        }
        formatted.push(digit);
    }

    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "11.222.333/0001-81";

    #[test]
    fn test_known_valid_tax_id() {
        assert!(is_valid_tax_id(VALID));
        assert!(is_valid_tax_id("11222333000181"));
        assert!(is_valid_tax_id(" 11 222 333 0001 81 "));
    }

    #[test]
    fn test_other_valid_tax_ids() {
        assert!(is_valid_tax_id("45.997.418/0001-53"));
        assert!(is_valid_tax_id("00.000.000/0001-91"));
    }

    #[test]
    fn test_repeated_digits_rejected() {
        for d in 0..=9 {
            let candidate = d.to_string().repeat(TAX_ID_LEN);
            assert!(!is_valid_tax_id(&candidate), "{candidate} should be invalid");
        }
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(!is_valid_tax_id(""));
        assert!(!is_valid_tax_id("1122233300018"));
        assert!(!is_valid_tax_id("112223330001811"));
        assert!(!is_valid_tax_id("not a tax id"));
    }

    #[test]
    fn test_single_digit_flip_rejected() {
        let digits = tax_id_digits(VALID);

        for position in 0..TAX_ID_LEN {
            let mut flipped: Vec<char> = digits.chars().collect();
            let original = flipped[position].to_digit(10).unwrap_or_default();
            flipped[position] = char::from_digit((original + 1) % 10, 10).unwrap_or('0');
            let candidate: String = flipped.into_iter().collect();

            assert!(
                !is_valid_tax_id(&candidate),
                "flipping position {position} produced valid {candidate}"
            );
        }
    }

    #[test]
    fn test_tax_id_digits_strips_formatting() {
        assert_eq!(tax_id_digits(VALID), "11222333000181");
    }

    #[test]
    fn test_format_tax_id() {
        assert_eq!(format_tax_id("11222333000181"), VALID);
        assert_eq!(format_tax_id("112223"), "11.222.3");
        assert_eq!(format_tax_id("11222333000181999"), VALID);
        assert_eq!(format_tax_id(""), "");
    }
}
