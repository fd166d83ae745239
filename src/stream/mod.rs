pub mod controller;

pub use controller::{stream_transactions, EventCallback, StreamHandle, StreamSession};
