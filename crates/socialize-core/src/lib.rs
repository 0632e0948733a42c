//! Core types and trait definitions for Socialize.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the entity types, the [`store::SocialStore`] abstraction, and the rules
//! that keep reactions, cached counters and notifications consistent.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod actions;
pub mod content;
pub mod error;
pub mod fanout;
pub mod ledger;
pub mod mention;
pub mod notification;
pub mod reaction;
pub mod store;
pub mod user;
pub mod view;

pub use error::{Error, ErrorKind, Result};
