//! Order number checksum validation.
//!
//! Order numbers are digit strings of any length protected by a Luhn check digit. They are never converted to a
//! numeric type, so there is no upper bound on their length.

/// Returns true if `number` is a non-empty string of ASCII digits with a valid Luhn checksum.
///
/// Digits are scanned from the right. The rightmost (check) digit is at offset zero, and every digit at an odd offset
/// is doubled, with 9 subtracted when the doubled value exceeds 9.
pub fn is_valid_order_number(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (offset, b) in number.bytes().rev().enumerate() {
        if !b.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(b - b'0');
        if offset % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum = (sum + digit) % 10;
    }
    sum == 0
}
