//! The four HTTP verbs a route may declare.
//!
//! Method keys in the configuration are parsed into [`HttpVerb`] at load
//! time, so an unsupported verb is a load error rather than a route that
//! silently never binds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A supported HTTP verb.
///
/// The ordering (`Get < Post < Put < Delete`) is the order in which the
/// verbs of a single route are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpVerb {
    /// Collection read (or single-record read on CRUD routes).
    Get,
    /// Collection create.
    Post,
    /// Single-resource update, bound with an `/{id}` suffix.
    Put,
    /// Single-resource delete, bound with an `/{id}` suffix.
    Delete,
}

impl HttpVerb {
    /// All verbs in binding order.
    pub const ALL: [Self; 4] = [Self::Get, Self::Post, Self::Put, Self::Delete];

    /// Lowercase configuration key for this verb.
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
        }
    }

    /// Whether this verb addresses a single resource (`/{id}` suffix).
    pub const fn targets_single_resource(self) -> bool {
        matches!(self, Self::Put | Self::Delete)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let upper = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        f.write_str(upper)
    }
}

/// Error returned when a method key names a verb outside [`HttpVerb`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method `{0}` (expected get, post, put or delete)")]
pub struct UnsupportedVerb(pub String);

impl FromStr for HttpVerb {
    type Err = UnsupportedVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            _ => Err(UnsupportedVerb(s.to_owned())),
        }
    }
}

impl Serialize for HttpVerb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_key())
    }
}

impl<'de> Deserialize<'de> for HttpVerb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
