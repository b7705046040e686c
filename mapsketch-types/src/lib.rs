//! Geometry types used by the `mapsketch` drawing pipeline.
//!
//! The crate is intentionally small: a [`Position`] is a world coordinate of a placed marker, and a
//! [`Shape`] is an ordered sequence of positions tagged with a [`ShapeKind`]. Planar distance
//! helpers used for hit testing live in the [`PlanarPoint`] trait.
//!
//! With the `geojson` feature enabled, finalized shapes can be converted to and from
//! [`geojson::Geometry`](https://docs.rs/geojson) values.

pub mod error;
mod position;
pub mod shape;

#[cfg(feature = "geojson")]
pub mod geojson;

pub use position::{PlanarPoint, Position, Position2d};
pub use shape::{Shape, ShapeKind};
