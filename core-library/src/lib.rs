//! # Library Core Module
//!
//! Domain models and the client-side list engine for a personal book library.
//!
//! ## Overview
//!
//! This module manages:
//! - Book and bookshelf records as delivered by the backend
//! - Sort-key transforms and the book comparator
//! - Filtering, sorting and infinite-scroll pagination of book lists
//! - Persisted sort and filter preferences
//! - Text helpers for book cards

pub mod display;
pub mod error;
pub mod models;
pub mod pagination;
pub mod preferences;
pub mod record;
pub mod sort;
pub mod view;

pub use error::{LibraryError, Result};
pub use models::{Book, BookId, Bookshelf, BookshelfId, CoverImage, CoverReference, ImageSource, ReadStatus};
pub use pagination::{ScrollWindow, SentinelOutcome, SentinelTicket, PAGE_SIZE};
pub use preferences::ViewPreferences;
pub use record::{parse_books, parse_raw_books, FieldValue, LibraryRecord, RawBook};
pub use sort::{NullPolicy, SortContext, SortDirection, SortKey};
pub use view::{BookListView, BookListViewBuilder, PreferencesListener, StatusFilter};
