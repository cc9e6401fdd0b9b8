pub mod auth;
pub mod challenge;
pub mod events;
pub mod match_setting;
pub mod peer_review;
pub mod reward;
pub mod submission;
