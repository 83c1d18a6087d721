//! Mesh preparation for tile rendering.
//!
//! A [`ScalarField`] is filtered to the working bounds, triangulated once
//! into an immutable [`Triangulation`] and indexed by a [`SpatialIndex`]
//! that every tile worker queries concurrently.

pub mod delaunay;
pub mod error;
pub mod field;
pub mod index;
pub mod triangulation;

pub use error::{MeshError, MeshResult};
pub use field::ScalarField;
pub use index::{MeshSubset, SpatialIndex};
pub use triangulation::{MeshOptions, MeshStats, Triangulation, DEFAULT_MAX_TRIANGLE_RATIO};
