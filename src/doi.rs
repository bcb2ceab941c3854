//! DOI parsing and normalization.

use std::fmt;
use std::str::FromStr;

use crate::error::{DataCiteError, Result};

/// A DOI split into its registrant prefix and item suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Doi {
    prefix: String,
    suffix: String,
}

impl Doi {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.suffix)
    }
}

impl FromStr for Doi {
    type Err = DataCiteError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = normalize_doi(s)?;
        // normalize_doi guarantees a '/' after a valid prefix
        let (prefix, suffix) = normalized
            .split_once('/')
            .ok_or_else(|| DataCiteError::InvalidDoi(s.to_string()))?;
        Ok(Doi {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }
}

/// Returns the bare `10.xxxx/suffix` form of a DOI.
///
/// Accepts `doi:` prefixes and `doi.org` resolver URLs (with or without
/// scheme and the legacy `dx.` host).
pub fn normalize_doi(value: &str) -> Result<String> {
    let trimmed = value.trim();
    let bare = strip_resolver_prefix(trimmed);

    let (prefix, suffix) = bare
        .split_once('/')
        .ok_or_else(|| DataCiteError::InvalidDoi(value.to_string()))?;

    if suffix.is_empty() || !is_valid_prefix(prefix) {
        return Err(DataCiteError::InvalidDoi(value.to_string()));
    }

    Ok(bare.to_string())
}

fn strip_resolver_prefix(value: &str) -> &str {
    if let Some(rest) = strip_prefix_ignore_case(value, "doi:") {
        return rest.trim_start();
    }

    let mut rest = value;
    for scheme in ["https://", "http://"] {
        if let Some(r) = strip_prefix_ignore_case(rest, scheme) {
            rest = r;
            break;
        }
    }
    if let Some(r) = strip_prefix_ignore_case(rest, "dx.") {
        rest = r;
    }
    match strip_prefix_ignore_case(rest, "doi.org/") {
        Some(r) => r,
        None => value,
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}

/// `10.` followed by one or more dot-separated digit groups.
fn is_valid_prefix(prefix: &str) -> bool {
    let Some(registrant) = prefix.strip_prefix("10.") else {
        return false;
    };
    registrant
        .split('.')
        .all(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()))
}
