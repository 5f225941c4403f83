//! Serialization boundary.
//!
//! The kernel reads no file formats; loaders hand [`build_mesh`] a face list
//! directly. On the way out, [`text`] writes the named-face block format:
//!
//! ```text
//! vertices = { a, b, c, d };
//! mesh = {
//!   f0 = [a, b, c];
//!   f1 = [a, c, d];
//! };
//! ```
//!
//! [`build_mesh`]: crate::mesh::build_mesh

pub mod text;

pub use text::{save, to_text, write_mesh};
