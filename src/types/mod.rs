pub mod constants;
pub mod error;
pub mod message;

pub use error::{DeepstreamError, Result};
pub use message::{Action, DeepstreamMessage, Topic};
