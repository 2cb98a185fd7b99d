use crate::error::{Error, Result};
use std::fmt;

/// Longest host name accepted, in UTF-16 units.
pub const MAX_HOST_NAME_LEN: usize = 20;

/// Name of the host whose sessions are queried.
///
/// Only constructible through [`HostName::new`], so a value of this type
/// has always passed the length check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostName(String);

impl HostName {
    /// Validate `name` as a host name
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        let len = name.encode_utf16().count();
        if len > MAX_HOST_NAME_LEN {
            return Err(Error::InvalidHostName {
                len,
                max: MAX_HOST_NAME_LEN,
            });
        }
        Ok(Self(name))
    }

    /// Host name as given
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_up_to_twenty_units() {
        assert_eq!(HostName::new("localhost").unwrap().as_str(), "localhost");
        assert!(HostName::new("a".repeat(20)).is_ok());
    }

    #[test]
    fn rejects_longer_names() {
        let err = HostName::new("a".repeat(21)).unwrap_err();
        assert!(matches!(err, Error::InvalidHostName { len: 21, max: 20 }));
    }

    #[test]
    fn counts_utf16_units_not_bytes() {
        // 20 two-byte characters, one unit each
        assert!(HostName::new("é".repeat(20)).is_ok());
        // 11 astral characters take 22 units
        assert!(HostName::new("𝔸".repeat(11)).is_err());
    }
}
