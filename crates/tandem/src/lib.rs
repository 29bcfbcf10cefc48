//! Top-level facade crate for tandem.
//!
//! Re-exports the wire contracts, the relay server library and the client
//! connection manager so users can depend on a single crate.

pub mod core {
    pub use tandem_core::*;
}

pub mod relay {
    pub use tandem_relay::*;
}

pub mod client {
    pub use tandem_client::*;
}
