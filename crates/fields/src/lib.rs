//! `fields` crate — safe field-path resolution over arbitrary JSON payloads.
//!
//! Pure and stateless: [`resolve`] never mutates its input and always
//! terminates, even on pathological paths (bounded by `max_depth`).

pub mod error;
pub mod path;
pub mod resolve;

pub use error::FieldError;
pub use path::{parse as parse_path, Segment};
pub use resolve::{resolve, resolve_presence, ResolveOptions};
