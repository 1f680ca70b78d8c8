//! Phone number normalization.
//!
//! Numbers are stored the way users typed them, usually in national format
//! with a leading trunk `0`. Providers want international form, so the trunk
//! prefix is swapped for the configured calling code.

/// National trunk prefix replaced during normalization.
const TRUNK_PREFIX: char = '0';

/// Converts stored phone numbers into dialable international form.
#[derive(Debug, Clone)]
pub struct PhoneNormalizer {
    calling_code: String,
}

impl PhoneNormalizer {
    /// `calling_code` includes the leading `+`, e.g. `"+94"`.
    pub fn new(calling_code: impl Into<String>) -> Self {
        Self {
            calling_code: calling_code.into(),
        }
    }

    /// Normalize a raw stored number.
    ///
    /// Returns `None` for absent or empty input. A leading trunk `0` is
    /// replaced by the calling code; anything else is returned as-is.
    pub fn normalize(&self, raw: Option<&str>) -> Option<String> {
        let number = raw.filter(|n| !n.is_empty())?;

        match number.strip_prefix(TRUNK_PREFIX) {
            Some(national) => Some(format!("{}{}", self.calling_code, national)),
            None => Some(number.to_string()),
        }
    }
}

/// A recipient is included iff its addressee is a non-empty string.
pub fn is_deliverable(addressee: Option<&str>) -> bool {
    addressee.is_some_and(|a| !a.is_empty())
}
