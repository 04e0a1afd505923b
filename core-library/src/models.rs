//! Domain models for the book library
//!
//! Records arrive from the REST collaborator as JSON and are read-only to
//! the core; the serde shapes below mirror that payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LibraryError;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub i64);

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a bookshelf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookshelfId(pub i64);

impl fmt::Display for BookshelfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// How far along the reader is with a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    #[default]
    NotRead,
    Reading,
    Read,
}

impl ReadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadStatus::NotRead => "not_read",
            ReadStatus::Reading => "reading",
            ReadStatus::Read => "read",
        }
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_read" => Ok(ReadStatus::NotRead),
            "reading" => Ok(ReadStatus::Reading),
            "read" => Ok(ReadStatus::Read),
            other => Err(LibraryError::InvalidInput {
                field: "read_status".to_string(),
                message: format!("Unknown read status '{}'", other),
            }),
        }
    }
}

/// Where a stored cover image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    OpenLibrary,
    DirectUpload,
}

// =============================================================================
// Domain Models
// =============================================================================

/// Cover image attached to a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    pub id: i64,
    pub source: ImageSource,
    /// Open Library edition id, or the generated id of a direct upload
    pub source_id: String,
    /// File extension including the dot (".jpg")
    pub extension: String,
    /// Fully resolved URI, when the backend provided one
    #[serde(default)]
    pub uri: Option<String>,
}

/// Book with reading metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
    /// JSON-encoded list of candidate Open Library edition ids
    #[serde(default)]
    pub olids: Option<String>,
    /// 1-5, unset when the book has not been rated
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub read_status: ReadStatus,
    /// ISO-8601 date
    #[serde(default)]
    pub read_start_date: Option<String>,
    /// ISO-8601 date
    #[serde(default)]
    pub read_end_date: Option<String>,
    #[serde(default)]
    pub image: Option<CoverImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bookshelves: Vec<Bookshelf>,
}

/// Where a book's cover comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverReference<'a> {
    /// A URI that can be loaded as-is
    Resolved(&'a str),
    /// JSON-encoded candidate ids still to be resolved
    Candidates(&'a str),
    Missing,
}

impl Book {
    /// Create a book with only the required fields set
    pub fn new(id: i64, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: BookId(id),
            title: title.into(),
            author: author.into(),
            year: None,
            olids: None,
            rating: None,
            review: None,
            read_status: ReadStatus::NotRead,
            read_start_date: None,
            read_end_date: None,
            image: None,
            bookshelves: Vec::new(),
        }
    }

    /// Validate book data
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Book title cannot be empty".to_string());
        }

        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(format!("Book rating {} is out of range 1-5", rating));
            }
        }

        if self.read_end_date.is_some() && self.read_start_date.is_none() {
            return Err("Book has an end date but no start date".to_string());
        }

        Ok(())
    }

    /// Resolved image URI first, then candidate ids
    pub fn cover_reference(&self) -> CoverReference<'_> {
        if let Some(uri) = self.image.as_ref().and_then(|image| image.uri.as_deref()) {
            return CoverReference::Resolved(uri);
        }
        match self.olids.as_deref() {
            Some(olids) if !olids.trim().is_empty() => CoverReference::Candidates(olids),
            _ => CoverReference::Missing,
        }
    }
}

/// Named user collection of books
///
/// `sort_key` and `sort_direction` carry the shelf's own default ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookshelf {
    pub id: BookshelfId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_key: Option<String>,
    #[serde(default)]
    pub sort_direction: Option<String>,
    /// Present on detail payloads only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub books: Vec<Book>,
}

impl Bookshelf {
    /// Validate bookshelf data
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Bookshelf title cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_deserializes_backend_payload() {
        let json = r#"{
            "id": 12,
            "title": "The Left Hand of Darkness",
            "author": "Ursula K. Le Guin",
            "year": 1969,
            "olids": "[\"OL24206828M\"]",
            "rating": null,
            "review": null,
            "read_status": "reading",
            "read_start_date": "2024-02-01",
            "read_end_date": null,
            "image": {"id": 3, "source": "open_library", "source_id": "OL24206828M", "extension": ".jpg", "uri": "https://example.test/OL24206828M.jpg"}
        }"#;

        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.id, BookId(12));
        assert_eq!(book.read_status, ReadStatus::Reading);
        assert_eq!(book.rating, None);
        assert_eq!(book.image.as_ref().unwrap().source, ImageSource::OpenLibrary);
        assert!(book.bookshelves.is_empty());
        assert!(book.validate().is_ok());
    }

    #[test]
    fn test_book_validation() {
        let mut book = Book::new(1, "Dune", "Frank Herbert");
        assert!(book.validate().is_ok());

        book.rating = Some(6);
        assert!(book.validate().is_err());

        book.rating = Some(5);
        book.read_end_date = Some("2024-01-01".to_string());
        assert!(book.validate().is_err());

        book.title = "   ".to_string();
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_cover_reference_prefers_resolved_uri() {
        let mut book = Book::new(1, "Dune", "Frank Herbert");
        assert_eq!(book.cover_reference(), CoverReference::Missing);

        book.olids = Some("[\"OL1M\"]".to_string());
        assert_eq!(book.cover_reference(), CoverReference::Candidates("[\"OL1M\"]"));

        book.image = Some(CoverImage {
            id: 1,
            source: ImageSource::DirectUpload,
            source_id: "abc123".to_string(),
            extension: ".png".to_string(),
            uri: Some("/images/abc123.png".to_string()),
        });
        assert_eq!(book.cover_reference(), CoverReference::Resolved("/images/abc123.png"));
    }

    #[test]
    fn test_read_status_round_trip_strings() {
        for status in [ReadStatus::NotRead, ReadStatus::Reading, ReadStatus::Read] {
            assert_eq!(status.as_str().parse::<ReadStatus>().unwrap(), status);
        }
        assert!("finished".parse::<ReadStatus>().is_err());
    }

    #[test]
    fn test_bookshelf_with_books() {
        let json = r#"{
            "id": 4,
            "title": "Favourites",
            "description": "",
            "sort_key": "author",
            "sort_direction": "descending",
            "books": [{"id": 1, "title": "Dune", "author": "Frank Herbert", "read_status": "read"}]
        }"#;

        let shelf: Bookshelf = serde_json::from_str(json).unwrap();
        assert_eq!(shelf.books.len(), 1);
        assert_eq!(shelf.sort_key.as_deref(), Some("author"));
        assert!(shelf.validate().is_ok());
    }
}
