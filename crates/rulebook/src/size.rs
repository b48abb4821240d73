//! Size codes recognised by the harvest forms.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Harvested-stem length classification.
///
/// Tokens are lowercase on the wire (`"largo"`, `"corto"`, `"ruso"`, `"na"`).
/// [`SizeCode::NotApplicable`] is a pseudo-size: forms may offer it, but it is
/// never stored on a canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeCode {
    Largo,
    Corto,
    Ruso,
    #[serde(rename = "na")]
    NotApplicable,
}

impl SizeCode {
    /// Every code, in form display order.
    pub const ALL: [SizeCode; 4] = [
        SizeCode::Largo,
        SizeCode::Corto,
        SizeCode::Ruso,
        SizeCode::NotApplicable,
    ];

    /// Canonical lowercase token.
    pub fn as_str(self) -> &'static str {
        match self {
            SizeCode::Largo => "largo",
            SizeCode::Corto => "corto",
            SizeCode::Ruso => "ruso",
            SizeCode::NotApplicable => "na",
        }
    }

    /// `true` for the "not applicable" pseudo-size.
    pub fn is_pseudo(self) -> bool {
        matches!(self, SizeCode::NotApplicable)
    }

    /// Parses a free-form token, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for empty or unknown tokens.
    pub fn parse_lenient(raw: &str) -> Option<SizeCode> {
        raw.parse().ok()
    }
}

impl fmt::Display for SizeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a token does not name a known size.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown size code `{0}`")]
pub struct UnknownSizeCode(pub String);

impl FromStr for SizeCode {
    type Err = UnknownSizeCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        SizeCode::ALL
            .into_iter()
            .find(|code| code.as_str() == token)
            .ok_or(UnknownSizeCode(token))
    }
}
