//! DropGate upload widget support library.
//!
//! This crate marshals typed widget configuration into the flat options
//! object consumed by a client-side file-upload plugin, and issues one-time,
//! session-bound upload authorization tokens that a receiving endpoint can
//! later look up and consume. Rendering HTML and receiving the upload itself
//! stay with the embedding application.

pub mod background;
pub mod config;
pub mod error;
pub mod options;
pub mod session;
pub mod upload;
pub mod widget;

pub use crate::error::UploadAuthError;
pub use crate::options::{ParamName, UploadOptions};
pub use crate::session::{Session, SessionManager};
pub use crate::upload::{AuthorizationRecord, IssueParams};
pub use crate::widget::{FileUploadWidget, RenderSequence, RenderedWidget};
