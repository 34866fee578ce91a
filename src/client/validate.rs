// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use crate::error::MemcacheError;

/// Largest value this client will send in a `set` (1 MiB).
pub const MAX_VALUE_LEN: usize = 1024 * 1024;

/// `^[A-Za-z0-9]{1,250}$` (§6). Memcached itself accepts any byte except
/// NUL, space, tab, LF, CR; the restricted class here is deliberate, to
/// keep keys readable in logs and shell arguments.
pub fn validate_key(key: &str) -> Result<(), MemcacheError> {
    if key.is_empty() || key.len() > 250 {
        return Err(MemcacheError::Validation(format!(
            "key length {} out of range 1..=250",
            key.len()
        )));
    }
    if !key.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(MemcacheError::Validation(format!(
            "key {key:?} contains characters outside [A-Za-z0-9]"
        )));
    }
    Ok(())
}

pub fn validate_value(value: &[u8]) -> Result<(), MemcacheError> {
    if value.len() > MAX_VALUE_LEN {
        return Err(MemcacheError::Validation(format!(
            "value length {} exceeds {MAX_VALUE_LEN} bytes",
            value.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_key_lengths() {
        assert!(validate_key("a").is_ok());
        assert!(validate_key(&"a".repeat(250)).is_ok());
    }

    #[test]
    fn rejects_empty_and_overlong_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key(&"a".repeat(251)).is_err());
    }

    #[test]
    fn rejects_disallowed_characters() {
        assert!(validate_key("foo bar").is_err());
        assert!(validate_key("foo/bar").is_err());
        assert!(validate_key("foo\r\n").is_err());
    }

    #[test]
    fn accepts_boundary_value_lengths() {
        assert!(validate_value(&[]).is_ok());
        assert!(validate_value(&vec![0u8; MAX_VALUE_LEN]).is_ok());
    }

    #[test]
    fn rejects_oversized_value() {
        assert!(validate_value(&vec![0u8; MAX_VALUE_LEN + 1]).is_err());
    }
}
