//! Domain services. Each returns a discriminated result for expected
//! business outcomes and `DbErr` only for storage failures.

pub mod badge;
pub mod finalization;
pub mod participation;
pub mod peer_review;
pub mod phase;
pub mod profile;
pub mod scoring;
pub mod submission;
pub mod title;

#[cfg(test)]
pub(crate) mod fixtures;
