use core::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

pub type Epoch = u64;
pub type Gwei = u64;
pub type Slot = u64;
pub type UnixSeconds = u64;

const HEX_PREFIX: &str = "0x";

/// Number of bytes shown by [`Root::short`].
///
/// Matches the 4 hex digits the dashboard used to label root lineage.
const SHORT_ROOT_BYTES: usize = 2;

#[derive(Debug, Error)]
pub enum RootError {
    #[error("root is not valid hexadecimal: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("root is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("root is empty")]
    Empty,
}

/// An opaque block root.
///
/// Beacon nodes encode roots differently (Prysm uses base64, everything else uses hex).
/// The bytes are kept as received and always displayed as `0x`-prefixed lowercase hex.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Root(Box<[u8]>);

impl Root {
    pub fn from_hex(string: &str) -> Result<Self, RootError> {
        let digits = string.strip_prefix(HEX_PREFIX).unwrap_or(string);
        Self::from_bytes(hex::decode(digits)?)
    }

    pub fn from_base64(string: &str) -> Result<Self, RootError> {
        Self::from_bytes(STANDARD.decode(string)?)
    }

    pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Result<Self, RootError> {
        let bytes = bytes.into();

        if bytes.is_empty() {
            return Err(RootError::Empty);
        }

        Ok(Self(bytes))
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        let prefix = self.0.get(..SHORT_ROOT_BYTES).unwrap_or(&self.0);
        hex::encode(prefix)
    }
}

impl Display for Root {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "{HEX_PREFIX}{}", hex::encode(&self.0))
    }
}

impl Debug for Root {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        Display::fmt(self, formatter)
    }
}

impl FromStr for Root {
    type Err = RootError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        Self::from_hex(string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prysm_base64_root_is_displayed_as_hex() -> Result<(), RootError> {
        let root = Root::from_base64("T61j0FpyjexOfeClkmtQh8ZsiFCAQMlpKPpUkg2DMCc=")?;

        assert_eq!(
            root.to_string(),
            "0x4fad63d05a728dec4e7de0a5926b5087c66c88508040c96928fa54920d833027",
        );
        assert_eq!(root.short(), "4fad");

        Ok(())
    }

    #[test]
    fn hex_root_accepts_optional_prefix() -> Result<(), RootError> {
        assert_eq!(Root::from_hex("0xabcd")?, Root::from_hex("ABCD")?);
        Ok(())
    }

    #[test]
    fn empty_root_is_rejected() {
        assert!(matches!(Root::from_hex("0x"), Err(RootError::Empty)));
        assert!(matches!(Root::from_base64(""), Err(RootError::Empty)));
    }

    #[test]
    fn root_serializes_as_hex_string() -> Result<(), serde_json::Error> {
        let root: Root = serde_json::from_str("\"0x0102\"")?;

        assert_eq!(root.as_bytes(), [1, 2]);
        assert_eq!(serde_json::to_string(&root)?, "\"0x0102\"");

        Ok(())
    }
}
