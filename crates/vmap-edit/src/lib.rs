#![forbid(unsafe_code)]

//! Edit sessions over change-tracked value maps.
//!
//! An [`EditModel`] pairs a [`ValueMap`](vmap_core::ValueMap) with a
//! [`Validator`], keeps an observable valid state in step with the map, and
//! offers per-key channels that separate "this model wrote the key" from
//! "the key changed".

pub mod edit_model;
pub mod error;
pub mod validator;

pub use edit_model::EditModel;
pub use error::{Result, ValidationError};
pub use validator::Validator;
