//! Top-level facade crate for oscline.
//!
//! Re-exports the codec and the UDP gateway so users can depend on a single crate.

pub mod core {
    pub use oscline_core::*;
}

pub mod gateway {
    pub use oscline_gateway::*;
}
