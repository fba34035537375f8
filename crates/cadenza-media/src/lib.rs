//! Cadenza Media - video URL validation and audio acquisition
//!
//! Wraps an external resolver tool behind the `MediaResolver` trait:
//! metadata lookup, duration gating and audio download, each under a
//! timeout.

pub mod config;
pub mod error;
pub mod metadata;
pub mod resolver;
pub mod video_url;
pub mod ytdlp;

pub use config::MediaConfig;
pub use error::{AcquisitionError, Stage};
pub use metadata::{seconds_value, VideoMetadata};
pub use resolver::{acquire_audio, check_duration, MediaResolver};
pub use video_url::is_valid_video_url;
pub use ytdlp::YtDlp;
