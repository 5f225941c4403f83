//! Mesh-wide algorithms.
//!
//! - **Orientation**: consistent winding by breadth-first propagation, with
//!   non-orientability detection
//!
//! Local edits live with the mesh as Euler operators; see [`crate::mesh`].

pub mod orient;
