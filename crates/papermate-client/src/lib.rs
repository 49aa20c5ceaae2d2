//! HTTP client for the PaperMate papers API.

pub mod client;
pub mod error;
pub mod http;

pub use client::PaperMateClient;
pub use error::{ClientError, Result};
