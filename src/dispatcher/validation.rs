//! Checks run before anything is sent to the composer service.

use dt_xsd_tree::{occurs::UNBOUNDED, MaxOccurs, Occurrences};
use lazy_static::lazy_static;
use regex::Regex;

pub const EMPTY_NAME: &str = "The name can't be empty.";
pub const NOT_LETTERS: &str = "The name can only contains letters.";
pub const MIN_NOT_INTEGER: &str = "minOccurs should be an integer.";
pub const MIN_NEGATIVE: &str = "minOccurs should be superior or equal to 0.";
pub const MAX_NOT_INTEGER: &str = "maxOccurs should be an integer or 'unbounded'.";
pub const MAX_BELOW_ONE: &str = "maxOccurs should be superior or equal to 1.";
pub const MAX_BELOW_MIN: &str = "maxOccurs should be superior or equal to minOccurs.";
pub const MIN_TOO_LARGE: &str = "minOccurs is too large.";
pub const MAX_TOO_LARGE: &str = "maxOccurs is too large.";

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^\s*([+-]?)([0-9]+)\s*$").unwrap();
    static ref LETTERS: Regex = Regex::new(r"^[a-zA-Z]*$").unwrap();
}

/// A well-formed integer, as far as occurrence bounds care about it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Integer {
    Negative,
    Count(u64),
    /// Past `u64::MAX`.
    TooLarge,
}

fn parse_int(value: &str) -> Option<Integer> {
    let captures = INTEGER.captures(value)?;
    let negative = &captures[1] == "-";
    let integer = match captures[2].parse::<u64>() {
        Ok(0) => Integer::Count(0),
        Ok(_) | Err(_) if negative => Integer::Negative,
        Ok(count) => Integer::Count(count),
        // only overflow is left, the digits were matched above
        Err(_) => Integer::TooLarge,
    };
    Some(integer)
}

/// Names of elements, templates and types must not be empty.
pub fn check_name(name: &str) -> Result<(), Vec<String>> {
    if name.is_empty() {
        Err(vec![EMPTY_NAME.to_string()])
    } else {
        Ok(())
    }
}

/// The root type of a new template may only use ASCII letters.
pub fn check_root_type_name(name: &str) -> Result<(), Vec<String>> {
    check_name(name)?;
    if LETTERS.is_match(name) {
        Ok(())
    } else {
        Err(vec![NOT_LETTERS.to_string()])
    }
}

/// Validates the occurrence bounds as typed into the dialog.
///
/// All applicable messages are collected. `maxOccurs` is only looked at once `minOccurs` is an
/// integer.
pub fn check_occurrences(min_occurs: &str, max_occurs: &str) -> Result<Occurrences, Vec<String>> {
    let mut errors = Vec::new();

    let min = match parse_int(min_occurs) {
        None => return Err(vec![MIN_NOT_INTEGER.to_string()]),
        Some(Integer::Negative) => {
            errors.push(MIN_NEGATIVE.to_string());
            None
        }
        Some(Integer::TooLarge) => {
            errors.push(MIN_TOO_LARGE.to_string());
            None
        }
        Some(Integer::Count(min)) => Some(min),
    };

    let max = match parse_int(max_occurs) {
        None if max_occurs == UNBOUNDED => Some(MaxOccurs::Unbounded),
        None => {
            errors.push(MAX_NOT_INTEGER.to_string());
            None
        }
        Some(Integer::Negative | Integer::Count(0)) => {
            errors.push(MAX_BELOW_ONE.to_string());
            None
        }
        Some(Integer::TooLarge) => {
            errors.push(MAX_TOO_LARGE.to_string());
            None
        }
        Some(Integer::Count(max)) if min.is_some_and(|min| max < min) => {
            errors.push(MAX_BELOW_MIN.to_string());
            None
        }
        Some(Integer::Count(max)) => Some(MaxOccurs::Count(max)),
    };

    match (min, max) {
        (Some(min), Some(max)) if errors.is_empty() => Ok(Occurrences::new(min, max)),
        _ => Err(errors),
    }
}
