//! Convenience re-exports for common `chatext` types.
//!
//! ```
//! use chatext::prelude::*;
//! ```
//!
//! Payload structs and the individual renderers' helpers (`embed_id`,
//! `parse_options`, ...) are left out; import those from [`crate::ext`].

// ── Core types ──────────────────────────────────────────────────────
pub use crate::json_schema_for;
pub use crate::trace::Trace;

// ── DOM ─────────────────────────────────────────────────────────────
pub use crate::dom::{Container, Element, EventKind, NodeId};

// ── Channels ────────────────────────────────────────────────────────
pub use crate::channel::{
    FnChannel, InteractionChannel, InteractionReport, LoggingChannel, NoopChannel,
    RecordingChannel,
};

// ── Extensions ──────────────────────────────────────────────────────
pub use crate::ext::{
    BuiltinExtension, DispatchOutcome, Extension, ExtensionRegistry, FileViewerDownloader,
    RenderError, SelectExtension, SelectHandle, SelectState, VideoExtension,
};

// ── Configuration ───────────────────────────────────────────────────
pub use crate::config::{DispatchMode, ExtensionConfig};

// ── Diagnostics ─────────────────────────────────────────────────────
pub use crate::diagnostics::{DiagnosticBuffer, DiagnosticLayer, LogLevel, LogLine};
