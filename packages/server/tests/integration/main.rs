mod common;

mod auth;
mod challenge;
mod migration;
mod peer_review;
mod rewards;
