//! # Route description
//!
//! The immutable tree a [`Router`](crate::router::Router) walks: path segment
//! matchers, header guards, ordered alternatives and endpoints binding methods
//! to handlers. Trees are built in code with [`path`], [`alternatives`],
//! [`header_guard`] and the [`Endpoint`]/[`MethodSpec`] builders, or loaded
//! from a YAML/JSON document with [`load_routes`].

mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;
