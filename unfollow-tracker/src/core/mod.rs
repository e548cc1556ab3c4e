/*!
Core modules for the unfollow tracker
*/

pub mod auth;
pub mod config;
pub mod diff_engine;
pub mod output;
pub mod prompt;
pub mod session_store;
pub mod snapshot_store;
pub mod tracker;

#[cfg(test)]
pub mod testing;
