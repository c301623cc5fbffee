pub mod codec;
mod router;

pub use router::MessageRouter;
