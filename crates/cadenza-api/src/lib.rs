//! Cadenza API - request router for video lookup and audio analysis
//!
//! Two endpoints dispatched on path suffix: `/info` returns video
//! metadata, `/audio-with-analysis` downloads the audio track and returns
//! its feature vector. Requests arrive as gateway-style events or through
//! the bundled HTTP server.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod request;
pub mod response;
pub mod router;
pub mod temp;

pub use config::{ServerConfig, ServiceConfig};
pub use error::ApiError;
pub use request::ApiRequest;
pub use response::ApiResponse;
pub use router::ApiRouter;
