//! Top-level facade crate for rulevault.
//!
//! Re-exports core types and the store library so users can depend on a single crate.

pub mod core {
    pub use rulevault_core::*;
}

pub mod store {
    pub use rulevault_store::*;
}
