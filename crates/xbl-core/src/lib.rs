//! # xbl-core
//!
//! Core types for the xblive authentication workspace.
//!
//! This crate has no network code. It provides:
//! - The six token kinds and the `Token` value with its validity predicate
//! - The identity claims resolved by the final authorization step
//! - `TokenStore`, the bundle of token slots and its merge policy
//! - The persisted token-file shape and its timestamp format
//! - Cross-cutting error types

pub mod errors;
pub mod identity;
pub mod persisted;
pub mod store;
pub mod timestamp;
pub mod token;

pub use errors::CoreError;
pub use identity::UserIdentity;
pub use persisted::TokenFile;
pub use store::{SlotState, TokenStore};
pub use token::{Token, TokenKind, TokenRecord};
