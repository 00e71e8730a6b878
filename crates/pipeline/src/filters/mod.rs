//! Filter implementations for the ranking stage.
//!
//! This module contains the concrete filters that can be composed into a
//! FilterPipeline.

pub mod already_rated;
pub mod genre_membership;

// Re-export for convenience
pub use already_rated::AlreadyRatedFilter;
pub use genre_membership::GenreMembershipFilter;
