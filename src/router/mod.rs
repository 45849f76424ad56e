//! # Router Module
//!
//! Matches a [`RequestContext`](crate::context::RequestContext) against a route
//! tree and produces exactly one terminal outcome: a [`Response`] to render, an
//! [`Upgrade`](crate::handler::Upgrade) handoff, or a [`RoutingError`].
//!
//! ## Traversal
//!
//! The walk is depth-first:
//!
//! - **Segments** consume one path segment. Literals compare case-sensitively,
//!   captures bind the segment under their name.
//! - **Header guards** require a request header (optionally with a given value).
//! - **Alternatives** are tried left to right. The routing state is forked before
//!   each child and restored when the child fails with an *ignorable* error, so
//!   nothing a failed branch consumed or recorded leaks into the next one.
//! - **Endpoints** require the whole path to be consumed, then dispatch on the
//!   method.
//!
//! ## Methods
//!
//! `HEAD` is answered by the `GET` handler with the body removed, and `OPTIONS`
//! is answered automatically with an `Allow` header unless declared. Any other
//! undeclared method fails with `405` and the same `Allow` set.
//!
//! ## Ignorable errors
//!
//! Under [`BacktrackPolicy::Strict`](crate::runtime_config::BacktrackPolicy)
//! only [`RoutingError::NotFound`] lets a sibling run; every other error ends
//! routing. [`BacktrackPolicy::MergeMethods`](crate::runtime_config::BacktrackPolicy)
//! also lets `405` fall through and unions the allowed methods of every branch
//! that matched the path.
//!
//! [`Response`]: crate::server::response::Response

mod core;
mod error;
mod verbs;

pub use core::{Outcome, Router};
pub use error::{AllowedMethods, RoutingError};
