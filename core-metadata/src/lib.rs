//! # Cover Image Module
//!
//! Resolves and loads book cover images.
//!
//! ## Overview
//!
//! This module handles:
//! - Cover candidates built from Open Library edition ids
//! - Discarding blank Open Library placeholder covers
//! - Viewport-driven lazy loading of cover images

pub mod artwork;
pub mod error;
pub mod lazy_image;

pub use artwork::{CandidateKind, CoverCandidate, CoverCandidates, CoverSize};
pub use error::{MetadataError, Result};
pub use lazy_image::{ElementState, ImageEvent, LazyImageLoader};
