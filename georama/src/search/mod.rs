//! Search catalog publication.
//!
//! The search index holds one denormalized document per published map,
//! keyed by public id. It is always replaceable from the database plus the
//! filesystem; the reconciler rebuilds it wholesale after drift.
//!
//! - [`document`]: the fixed document schema and its builders
//! - [`client`]: the [`SearchIndex`] trait and the HTTP implementation

pub mod client;
pub mod document;
pub mod testing;

pub use client::{EsIndex, IndexError, SearchIndex};
pub use document::{derive_geometry, OnlineResource, SearchDocument};
