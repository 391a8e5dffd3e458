//! Hierarchical note addresses.
//!
//! # Responsibility
//! - Parse `scheme://authority/path` strings into comparable values.
//! - Answer ancestry questions used by change notification.
//!
//! # Invariants
//! - Empty path segments are dropped, so `/notes/` and `/notes` are equal.
//! - The scheme is carried for display only and never compared.

use crate::contract::SCHEME;
use crate::service::error::StoreError;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Parsed address of a note resource.
#[derive(Debug, Clone, Eq)]
pub struct NoteUri {
    scheme: String,
    authority: String,
    segments: Vec<String>,
}

impl NoteUri {
    /// Builds an address from an authority and path segments.
    pub fn new<I, S>(authority: impl Into<String>, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scheme: SCHEME.to_string(),
            authority: authority.into(),
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|segment: &String| !segment.is_empty())
                .collect(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `/`-joined path with a leading slash.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Appends a numeric id segment, e.g. `/notes` -> `/notes/7`.
    pub fn with_appended_id(&self, id: i64) -> Self {
        let mut next = self.clone();
        next.segments.push(id.to_string());
        next
    }

    /// Returns whether `self` is a strict path prefix of `other`.
    pub fn is_ancestor_of(&self, other: &NoteUri) -> bool {
        self.authority == other.authority
            && self.segments.len() < other.segments.len()
            && other.segments.starts_with(&self.segments)
    }
}

impl PartialEq for NoteUri {
    fn eq(&self, other: &Self) -> bool {
        self.authority == other.authority && self.segments == other.segments
    }
}

impl Hash for NoteUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.authority.hash(state);
        self.segments.hash(state);
    }
}

impl Display for NoteUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path())
    }
}

impl FromStr for NoteUri {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let without_suffix = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let (scheme, rest) = match without_suffix.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() => (scheme, rest),
            Some(_) => return Err(StoreError::UnknownUri(raw.to_string())),
            None => (SCHEME, without_suffix),
        };
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        if authority.is_empty() {
            return Err(StoreError::UnknownUri(raw.to_string()));
        }

        let mut uri = NoteUri::new(authority, path.split('/'));
        uri.scheme = scheme.to_string();
        Ok(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::NoteUri;

    #[test]
    fn parse_drops_empty_segments_and_query() {
        let uri: NoteUri = "content://org.notepad.provider//notes/4/?x=1"
            .parse()
            .unwrap();
        assert_eq!(uri.authority(), "org.notepad.provider");
        assert_eq!(uri.segments(), ["notes", "4"]);
        assert_eq!(uri.to_string(), "content://org.notepad.provider/notes/4");
    }

    #[test]
    fn scheme_is_not_part_of_equality() {
        let a: NoteUri = "content://auth/notes".parse().unwrap();
        let b: NoteUri = "file://auth/notes/".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_rejects_missing_authority() {
        assert!("content:///notes".parse::<NoteUri>().is_err());
        assert!("://auth/notes".parse::<NoteUri>().is_err());
    }

    #[test]
    fn ancestry_is_strict_prefix_within_authority() {
        let collection = NoteUri::new("auth", ["notes"]);
        let item = collection.with_appended_id(3);
        assert!(collection.is_ancestor_of(&item));
        assert!(!item.is_ancestor_of(&collection));
        assert!(!collection.is_ancestor_of(&collection));
        assert!(!NoteUri::new("other", ["notes"]).is_ancestor_of(&item));
    }
}
