//! Core types and trait definitions for the campus board.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! identifier generation, the pagination cursor codec, page assembly, entity
//! validation and the [`store::BoardStore`] abstraction implemented by storage
//! backends.

pub mod clock;
pub mod comment;
pub mod cursor;
pub mod error;
pub mod id;
pub mod page;
pub mod reaction;
pub mod store;
pub mod text;
pub mod thread;
pub mod user;

pub use error::{Classify, Error, ErrorKind, FieldError, Result};
