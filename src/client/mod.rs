mod buffer;
mod builder;
mod connection;
mod core;
mod state;

pub use buffer::OutgoingBuffer;
pub use builder::{DeepstreamClientBuilder, DeepstreamClientOptions};
pub use connection::{ConnectionManager, ConnectionState};
pub use core::DeepstreamClient;
pub use state::ClientState;
