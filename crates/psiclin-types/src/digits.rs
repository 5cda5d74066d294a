//! Digit-normalised identifier types.
//!
//! The backend expects identifier-like free text (CPF numbers, phone numbers)
//! as bare digit strings. Users type them with punctuation, so these types
//! strip every non-digit character on construction and re-apply the display
//! formatting on demand. Stripping the formatted output always yields the
//! original digits again.

use serde::{Deserialize, Serialize};

/// Errors that can occur when creating digit-normalised identifier types.
#[derive(Debug, thiserror::Error)]
pub enum DigitsError {
    /// The input contained no digits at all
    #[error("input contains no digits")]
    Empty,
    /// The digit count did not match what the identifier requires
    #[error("expected {expected} digits, got {actual}")]
    WrongLength {
        expected: &'static str,
        actual: usize,
    },
}

/// Strips every non-digit character from the input.
pub fn strip_non_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A Brazilian CPF number, held as exactly 11 digits.
///
/// Construction accepts formatted input (`123.456.789-09`) or bare digits
/// and normalises to the digit form the wire protocol expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpf(String);

impl Cpf {
    /// Creates a `Cpf` from formatted or unformatted input.
    ///
    /// # Errors
    ///
    /// Returns `DigitsError::Empty` if no digits are present, or
    /// `DigitsError::WrongLength` if the digit count is not exactly 11.
    pub fn new(input: impl AsRef<str>) -> Result<Self, DigitsError> {
        let digits = strip_non_digits(input.as_ref());
        if digits.is_empty() {
            return Err(DigitsError::Empty);
        }
        if digits.len() != 11 {
            return Err(DigitsError::WrongLength {
                expected: "11",
                actual: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    /// Returns the bare digit string (the wire form).
    pub fn as_digits(&self) -> &str {
        &self.0
    }

    /// Renders the display form: `123.456.789-09`.
    pub fn formatted(&self) -> String {
        format!(
            "{}.{}.{}-{}",
            &self.0[0..3],
            &self.0[3..6],
            &self.0[6..9],
            &self.0[9..11]
        )
    }
}

impl std::fmt::Display for Cpf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl Serialize for Cpf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Cpf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cpf::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A Brazilian phone number, held as 10 or 11 digits (area code included).
///
/// Mobile numbers carry 11 digits, landlines 10. As with [`Cpf`], any
/// punctuation in the input is stripped on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Creates a `PhoneNumber` from formatted or unformatted input.
    ///
    /// # Errors
    ///
    /// Returns `DigitsError::Empty` if no digits are present, or
    /// `DigitsError::WrongLength` if the digit count is not 10 or 11.
    pub fn new(input: impl AsRef<str>) -> Result<Self, DigitsError> {
        let digits = strip_non_digits(input.as_ref());
        if digits.is_empty() {
            return Err(DigitsError::Empty);
        }
        if digits.len() != 10 && digits.len() != 11 {
            return Err(DigitsError::WrongLength {
                expected: "10 or 11",
                actual: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    /// Returns the bare digit string (the wire form).
    pub fn as_digits(&self) -> &str {
        &self.0
    }

    /// Renders the display form: `(11) 98765-4321` or `(11) 8765-4321`.
    pub fn formatted(&self) -> String {
        let (area, rest) = self.0.split_at(2);
        let split = rest.len() - 4;
        format!("({}) {}-{}", area, &rest[..split], &rest[split..])
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PhoneNumber::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_strips_formatting() {
        let cpf = Cpf::new("123.456.789-09").expect("valid cpf");
        assert_eq!(cpf.as_digits(), "12345678909");
    }

    #[test]
    fn cpf_format_then_strip_round_trips() {
        let cpf = Cpf::new("12345678909").expect("valid cpf");
        assert_eq!(cpf.formatted(), "123.456.789-09");
        assert_eq!(strip_non_digits(&cpf.formatted()), "12345678909");
    }

    #[test]
    fn cpf_rejects_wrong_length() {
        let err = Cpf::new("123.456").expect_err("should reject short cpf");
        match err {
            DigitsError::WrongLength { actual, .. } => assert_eq!(actual, 6),
            other => panic!("expected WrongLength, got {other:?}"),
        }
    }

    #[test]
    fn cpf_serialises_as_digits() {
        let cpf = Cpf::new("123.456.789-09").expect("valid cpf");
        let json = serde_json::to_string(&cpf).expect("serialise");
        assert_eq!(json, "\"12345678909\"");
    }

    #[test]
    fn mobile_phone_format_then_strip_round_trips() {
        let phone = PhoneNumber::new("11987654321").expect("valid phone");
        assert_eq!(phone.formatted(), "(11) 98765-4321");
        assert_eq!(strip_non_digits(&phone.formatted()), "11987654321");
    }

    #[test]
    fn landline_phone_formats_with_four_digit_prefix() {
        let phone = PhoneNumber::new("1187654321").expect("valid phone");
        assert_eq!(phone.formatted(), "(11) 8765-4321");
    }

    #[test]
    fn phone_accepts_formatted_input() {
        let phone = PhoneNumber::new("(11) 98888-7777").expect("valid phone");
        assert_eq!(phone.as_digits(), "11988887777");
    }

    #[test]
    fn phone_rejects_empty_input() {
        assert!(matches!(PhoneNumber::new("abc"), Err(DigitsError::Empty)));
    }
}
