// src/lib.rs

//! NuGet catalog crawler library
//!
//! Follows the NuGet V3 catalog: an append-only log of package publish and
//! delete events. A [`pipeline::CatalogProcessor`] walks the catalog from a
//! persisted cursor and hands every event to a [`services::LeafProcessor`].

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
