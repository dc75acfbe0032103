#![forbid(unsafe_code)]

//! vmap public facade crate.
//!
//! Re-exports the change-tracked map and, with the `edit` feature (on by
//! default), the edit model built on top of it.

pub use vmap_core::{ValueChange, ValueMap, ValueProvider};

#[cfg(feature = "edit")]
pub use vmap_edit::{EditModel, ValidationError, Validator};

pub mod prelude {
    pub use vmap_core as core;
    #[cfg(feature = "edit")]
    pub use vmap_edit as edit;

    pub use vmap_core::{MapHooks, Subscription, ValueChange, ValueMap, ValueProvider};
    #[cfg(feature = "edit")]
    pub use vmap_edit::{EditModel, ValidationError, Validator};
}
