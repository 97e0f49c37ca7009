//! Core type definitions for acquisition metadata
//!
//! This module provides the fundamental types used throughout the neurometa
//! library:
//! - [`MetadataValue`]: heterogeneous metadata map value
//! - [`AxisCode`] / [`SpaceCode`] / [`DirectionCode`]: direction encodings
//! - [`Orientation`]: anatomical orientation triple derived from an affine
//! - [`Datatype`]: acquisition kind driving schema selection
//! - [`CollectedMetadata`]: insertion-ordered collector output

mod collected;
mod direction;
mod orientation;
mod schema;
mod value;

pub use collected::CollectedMetadata;
pub use direction::{invert_location, parse_direction_str, AxisCode, DirectionCode, SpaceCode};
pub use orientation::{affine_orientation, Orientation};
pub use schema::{is_collected_field, metadata_fields, Datatype, COLLECTED_FIELDS, TEMPLATES};
pub use value::MetadataValue;
