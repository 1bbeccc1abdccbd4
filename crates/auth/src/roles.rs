use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role code used for RBAC.
///
/// Role codes are intentionally opaque strings at this layer; mapping codes to
/// stored role rows is done by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleCode(Cow<'static, str>);

impl RoleCode {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for RoleCode {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RoleCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
