pub mod client;
pub mod decode;
pub mod error;
mod retry;
pub mod types;

pub use client::SearchClient;
pub use decode::{decode_business, decode_page, decode_review, DecodeError};
pub use error::SearchError;
