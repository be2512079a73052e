mod async_listener;
mod batch;
mod cancel;
mod error;
mod filter;
mod forwarder;
mod listener;
#[cfg(feature = "metrics")]
pub mod metrics;
mod mux;
mod packet;

pub use {
    async_listener::*, batch::*, cancel::*, error::*, filter::*, forwarder::*, listener::*,
    mux::listener_mux, packet::*,
};
