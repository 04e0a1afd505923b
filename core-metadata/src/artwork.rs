//! Cover Candidates - Choose a Book Cover from Open Library Editions
//!
//! A book carries the Open Library edition ids (`olids`) that might have a
//! cover. Each id becomes a [`CoverCandidate`] with a large image and a
//! medium thumbnail. Open Library answers with a 1x1 placeholder when an
//! edition has no cover, so candidates whose thumbnail loads at that size
//! are discarded.
//!
//! ## Usage
//!
//! ```
//! use core_metadata::artwork::CoverCandidates;
//!
//! # fn main() -> core_metadata::Result<()> {
//! let mut covers = CoverCandidates::from_json(r#"["OL1M", "OL2M"]"#)?;
//!
//! // OL2M turned out to be blank
//! covers.on_thumbnail_loaded("OL2M", 1, 1);
//! assert_eq!(covers.len(), 1);
//!
//! covers.toggle_selection("OL1M")?;
//! assert_eq!(covers.selected().map(|c| c.unique_id.as_str()), Some("OL1M"));
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use core_library::models::{Book, CoverReference};

use crate::error::{MetadataError, Result};

const OPEN_LIBRARY_COVERS_URL: &str = "https://covers.openlibrary.org/b/olid";

/// Open Library cover sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSize {
    Small,
    Medium,
    Large,
}

impl CoverSize {
    fn suffix(&self) -> &'static str {
        match self {
            CoverSize::Small => "S",
            CoverSize::Medium => "M",
            CoverSize::Large => "L",
        }
    }
}

/// Cover image URL for an Open Library edition
///
/// ```
/// use core_metadata::artwork::{open_library_cover_url, CoverSize};
///
/// assert_eq!(
///     open_library_cover_url("OL7353617M", CoverSize::Large),
///     "https://covers.openlibrary.org/b/olid/OL7353617M-L.jpg"
/// );
/// ```
pub fn open_library_cover_url(olid: &str, size: CoverSize) -> String {
    format!("{}/{}-{}.jpg", OPEN_LIBRARY_COVERS_URL, olid, size.suffix())
}

/// Decode a book's JSON-encoded `olids` field
///
/// `null` and blank input decode to an empty list.
pub fn parse_olids(raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let olids: Option<Vec<String>> = serde_json::from_str(raw)?;
    Ok(olids
        .unwrap_or_default()
        .into_iter()
        .map(|olid| olid.trim().to_string())
        .filter(|olid| !olid.is_empty())
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    /// Open Library edition
    Olid,
    /// Local file chosen for upload
    File,
}

/// One selectable cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverCandidate {
    pub unique_id: String,
    pub kind: CandidateKind,
    /// Full-size image
    pub uri: String,
    /// Image shown in the picker
    pub thumb_uri: String,
}

impl CoverCandidate {
    pub fn from_olid(olid: &str) -> Self {
        Self {
            unique_id: olid.to_string(),
            kind: CandidateKind::Olid,
            uri: open_library_cover_url(olid, CoverSize::Large),
            thumb_uri: open_library_cover_url(olid, CoverSize::Medium),
        }
    }

    /// Candidate for a local file; the same URI serves both sizes
    pub fn local_file(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            unique_id: Uuid::new_v4().to_string(),
            kind: CandidateKind::File,
            thumb_uri: uri.clone(),
            uri,
        }
    }
}

/// Cover picker state: available candidates and the current choice
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverCandidates {
    candidates: Vec<CoverCandidate>,
    selected: Option<String>,
}

impl CoverCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    /// One candidate per edition id, duplicates dropped
    pub fn from_olids<S: AsRef<str>>(olids: &[S]) -> Self {
        let mut candidates: Vec<CoverCandidate> = Vec::with_capacity(olids.len());
        for olid in olids {
            let olid = olid.as_ref();
            if candidates.iter().any(|c| c.unique_id == olid) {
                continue;
            }
            candidates.push(CoverCandidate::from_olid(olid));
        }
        Self {
            candidates,
            selected: None,
        }
    }

    /// Candidates from a JSON-encoded `olids` value
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(Self::from_olids(parse_olids(raw)?.as_slice()))
    }

    /// Candidates for a book whose cover is still unresolved
    ///
    /// A book with a resolved cover, or without candidate ids, has none.
    pub fn for_book(book: &Book) -> Result<Self> {
        match book.cover_reference() {
            CoverReference::Candidates(raw) => Self::from_json(raw),
            CoverReference::Resolved(_) | CoverReference::Missing => Ok(Self::new()),
        }
    }

    /// Preselect a candidate, e.g. the edition already saved on the book
    pub fn with_selected(mut self, unique_id: &str) -> Self {
        if self.position(unique_id).is_some() {
            self.selected = Some(unique_id.to_string());
        }
        self
    }

    /// Put a local file at the front of the list
    pub fn push_local_file(&mut self, uri: impl Into<String>) -> &CoverCandidate {
        self.candidates.insert(0, CoverCandidate::local_file(uri));
        &self.candidates[0]
    }

    /// Record the natural size of a loaded thumbnail
    ///
    /// Returns `true` when the candidate was discarded as blank.
    pub fn on_thumbnail_loaded(&mut self, unique_id: &str, width: u32, height: u32) -> bool {
        if width != 1 && height != 1 {
            return false;
        }
        let Some(index) = self.position(unique_id) else {
            return false;
        };

        self.candidates.remove(index);
        if self.selected.as_deref() == Some(unique_id) {
            self.selected = None;
        }
        debug!(unique_id, width, height, "Discarded blank cover candidate");
        true
    }

    /// Select a candidate, or clear the selection if it is already selected
    pub fn toggle_selection(&mut self, unique_id: &str) -> Result<Option<&CoverCandidate>> {
        if self.position(unique_id).is_none() {
            return Err(MetadataError::UnknownCandidate(unique_id.to_string()));
        }

        if self.selected.as_deref() == Some(unique_id) {
            self.selected = None;
        } else {
            self.selected = Some(unique_id.to_string());
        }
        trace!(unique_id, selected = self.selected.is_some(), "Toggled cover selection");
        Ok(self.selected())
    }

    pub fn selected(&self) -> Option<&CoverCandidate> {
        let unique_id = self.selected.as_deref()?;
        self.candidates.iter().find(|c| c.unique_id == unique_id)
    }

    pub fn candidates(&self) -> &[CoverCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn position(&self, unique_id: &str) -> Option<usize> {
        self.candidates.iter().position(|c| c.unique_id == unique_id)
    }
}
