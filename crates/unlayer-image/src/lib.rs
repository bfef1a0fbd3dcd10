//! Extract paths from layered container image tarballs without running the image.
//!
//! A container image saved as a tarball carries a `manifest.json` and one tar
//! blob per layer. Extracting a path the way the running container would see
//! it means searching the layers newest-first and taking the first layer that
//! carries the path, so a newer layer shadows the same path in older layers.
//!
//! # Architecture
//!
//! - `format.rs` - image format selection and layer codec sniffing
//! - `image.rs` - session-scoped image handle and manifest parsing
//! - `matcher.rs` - source path classification and destination rewriting
//! - `resolve.rs` - newest-first layer search with staged collection
//! - `extract.rs` - idempotency checks and commit to the filesystem
//! - `ownership.rs` - owner/group resolution and application
//! - `session.rs` - per-invocation session driving the pipeline

pub use error::{Error, Result};
pub use format::ImageFormat;
pub use image::{Image, LayerRef, Manifest};
pub use matcher::PathMatch;
pub use ownership::set_ownership;
pub use request::{ExtractOutcome, ExtractRequest, SessionReport};
pub use session::ExtractSession;

mod error;
mod extract;
mod format;
mod image;
mod matcher;
mod ownership;
mod request;
mod resolve;
mod session;
