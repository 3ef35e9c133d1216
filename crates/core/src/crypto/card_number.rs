//! Card number, expiry and CVV generation.

use chrono::{Datelike, NaiveDate};
use rand::{Rng, rngs::OsRng};

use super::CryptoError;

/// Generates a random card number that starts with `prefix` and ends with a
/// Luhn check digit.
///
/// # Errors
///
/// Returns `CryptoError::InvalidPrefix` if the prefix is empty, contains
/// non-digits, or is not shorter than `length`.
pub fn generate_card_number(prefix: &str, length: usize) -> Result<String, CryptoError> {
    if prefix.is_empty() || prefix.len() >= length || !prefix.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(CryptoError::InvalidPrefix {
            prefix: prefix.to_string(),
            length,
        });
    }

    let mut rng = OsRng;
    let mut number = String::with_capacity(length);
    number.push_str(prefix);
    while number.len() < length - 1 {
        number.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    number.push(luhn_check_digit(&number));
    Ok(number)
}

/// Returns true if `number` is all digits and passes the Luhn checksum.
#[must_use]
pub fn luhn_valid(number: &str) -> bool {
    if number.len() < 2 || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    luhn_sum(number.bytes().rev(), false) % 10 == 0
}

/// Formats the expiry as `MM/YY`, `validity_years` after `today`.
#[must_use]
pub fn generate_expiry(today: NaiveDate, validity_years: i32) -> String {
    let year = (today.year() + validity_years).rem_euclid(100);
    format!("{:02}/{year:02}", today.month())
}

/// Returns three random digits, zero padded.
#[must_use]
pub fn generate_cvv() -> String {
    format!("{:03}", OsRng.gen_range(0..1000u16))
}

fn luhn_check_digit(payload: &str) -> char {
    // the check digit will sit to the right, so doubling starts at the last payload digit
    let sum = luhn_sum(payload.bytes().rev(), true);
    char::from_digit((10 - sum % 10) % 10, 10).unwrap_or('0')
}

fn luhn_sum(digits_from_right: impl Iterator<Item = u8>, double_first: bool) -> u32 {
    digits_from_right
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if (i % 2 == 0) == double_first {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum()
}
