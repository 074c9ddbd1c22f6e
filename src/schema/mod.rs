//! Schema annotation and matching.
//!
//! - [`annotator`] turns the base schemas of every entity family into
//!   [`SchemaConfiguration`]s carrying typed pointer markers
//! - [`matcher`] pairs the fragments of those schemas with document nodes
//! - [`structural`] runs plain JSON Schema validation through `jsonschema`

pub mod annotator;
pub mod families;
pub mod fragment;
pub mod matcher;
pub mod structural;

pub use annotator::{SchemaAnnotator, SchemaConfiguration};
pub use fragment::{AnnotatedSchema, FragmentId, SchemaFragment};
pub use matcher::{MatchingSchema, SchemaSet};
