//! Package identifiers
//!
//! Every package name that reaches an external command or a filesystem path
//! goes through [`PackageName::parse`] first. Names are passed to tools as
//! discrete arguments, never through a shell, but the allow-list still keeps
//! option-looking (`-x`) and path-looking (`..`) names out.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Reasons a raw string is rejected as a package name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageNameError {
    #[error("package name is empty")]
    Empty,

    #[error("package name '{name}' contains disallowed character {ch:?}")]
    InvalidChar { name: String, ch: char },

    #[error("package name '{0}' must start with a letter, digit or underscore")]
    InvalidStart(String),
}

/// Validated source package name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageName(String);

impl PackageName {
    /// Validate `raw` against the package name allow-list
    pub fn parse(raw: &str) -> Result<Self, PackageNameError> {
        let first = raw.chars().next().ok_or(PackageNameError::Empty)?;

        if let Some(ch) = raw.chars().find(|c| !is_allowed(*c)) {
            return Err(PackageNameError::InvalidChar {
                name: raw.to_string(),
                ch,
            });
        }

        if first == '-' || first == '.' || first == '+' {
            return Err(PackageNameError::InvalidStart(raw.to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+')
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PackageName {
    type Err = PackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strip the trailing `-<version>-<release>` from an index query token
///
/// `foo-bar-1.0-3.fc41.src` becomes `foo-bar`. Returns `None` when the token
/// does not carry both segments or the remaining name is empty.
pub fn name_from_nevra(token: &str) -> Option<&str> {
    let mut parts = token.rsplitn(3, '-');
    let _release = parts.next()?;
    let _version = parts.next()?;
    let name = parts.next()?;

    if name.is_empty() { None } else { Some(name) }
}
