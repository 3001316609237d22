//! Extension contract and the built-in catalog.
//!
//! Every extension answers two questions about a [`Trace`]: "is this mine?"
//! ([`Extension::matches`]) and "draw it" ([`Extension::render`]). The
//! catalog is closed: [`BuiltinExtension`] enumerates the three renderers
//! and the [`ExtensionRegistry`] dispatches to them in registration order.
//!
//! | Key | Extension | Interaction |
//! |-----|-----------|-------------|
//! | `ext_video` | [`VideoExtension`] | none |
//! | `ext_file_viewer_downloader` | [`FileViewerDownloader`] | none (native anchor) |
//! | `ext_select` | [`SelectExtension`] | one `complete` report |

mod file;
mod registry;
mod select;
mod video;

pub use file::{FileKind, FilePayload, FileViewerDownloader};
pub use registry::{DispatchOutcome, ExtensionRegistry};
pub use select::{SelectExtension, SelectHandle, SelectPayload, SelectState, parse_options};
pub use video::{VideoExtension, VideoPayload, VideoSource, embed_id};

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::channel::InteractionChannel;
use crate::dom::{Container, NodeId};
use crate::trace::Trace;

/// Matching key of [`VideoExtension`].
pub const EXT_VIDEO: &str = "ext_video";
/// Matching key of [`FileViewerDownloader`].
pub const EXT_FILE_VIEWER_DOWNLOADER: &str = "ext_file_viewer_downloader";
/// Matching key of [`SelectExtension`].
pub const EXT_SELECT: &str = "ext_select";

/// Every catalog key, in default registration order.
pub const CATALOG_KEYS: &[&str] = &[EXT_VIDEO, EXT_FILE_VIEWER_DOWNLOADER, EXT_SELECT];

// ── Errors ───────────────────────────────────────────────────────────

/// A payload precondition failed; nothing was rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// The payload could not be read as the extension's payload type
    /// (missing required field, wrong JSON type).
    InvalidPayload {
        extension: &'static str,
        message: String,
    },
    /// A required string field was present but empty.
    EmptyField {
        extension: &'static str,
        field: &'static str,
    },
    /// Strict mode: the payload does not satisfy the extension's schema.
    SchemaViolation {
        extension: &'static str,
        errors: Vec<String>,
    },
}

impl RenderError {
    /// Name of the extension that refused to render.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::InvalidPayload { extension, .. }
            | Self::EmptyField { extension, .. }
            | Self::SchemaViolation { extension, .. } => *extension,
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPayload { extension, message } => {
                write!(f, "{extension}: invalid payload: {message}")
            }
            Self::EmptyField { extension, field } => {
                write!(f, "{extension}: no {field} provided")
            }
            Self::SchemaViolation { extension, errors } => {
                write!(f, "{extension}: payload schema violation: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for RenderError {}

// ── Extension trait ──────────────────────────────────────────────────

/// A renderer for one category of trace.
///
/// Implementations are stateless: the same instance renders any number of
/// traces into any number of containers.
pub trait Extension: Send + Sync {
    /// Human-readable name (e.g. `"Video"`).
    fn name(&self) -> &'static str;

    /// Reserved identifier matched against `trace.type` and
    /// `trace.payload.name`.
    fn key(&self) -> &'static str;

    /// Whether this extension is responsible for `trace`. Pure.
    fn matches(&self, trace: &Trace) -> bool {
        trace.carries(self.key())
    }

    /// JSON Schema of the payload this extension reads.
    fn payload_schema(&self) -> Value;

    /// Append the rendering of `trace` to `container`.
    ///
    /// Returns the id of the appended subtree root. On a failed precondition
    /// nothing is appended and the error is returned. The container's prior
    /// contents are never read or removed.
    fn render(
        &self,
        trace: &Trace,
        container: &mut Container,
        channel: &Arc<dyn InteractionChannel>,
    ) -> Result<NodeId, RenderError>;
}

/// The closed set of extensions shipped with this crate.
pub enum BuiltinExtension {
    Video(VideoExtension),
    FileViewerDownloader(FileViewerDownloader),
    Select(SelectExtension),
}

impl BuiltinExtension {
    fn inner(&self) -> &dyn Extension {
        match self {
            Self::Video(e) => e,
            Self::FileViewerDownloader(e) => e,
            Self::Select(e) => e,
        }
    }
}

impl Extension for BuiltinExtension {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn key(&self) -> &'static str {
        self.inner().key()
    }

    fn matches(&self, trace: &Trace) -> bool {
        self.inner().matches(trace)
    }

    fn payload_schema(&self) -> Value {
        self.inner().payload_schema()
    }

    fn render(
        &self,
        trace: &Trace,
        container: &mut Container,
        channel: &Arc<dyn InteractionChannel>,
    ) -> Result<NodeId, RenderError> {
        self.inner().render(trace, container, channel)
    }
}

impl fmt::Debug for BuiltinExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinExtension")
            .field("name", &self.name())
            .field("key", &self.key())
            .finish()
    }
}

impl From<VideoExtension> for BuiltinExtension {
    fn from(e: VideoExtension) -> Self {
        Self::Video(e)
    }
}

impl From<FileViewerDownloader> for BuiltinExtension {
    fn from(e: FileViewerDownloader) -> Self {
        Self::FileViewerDownloader(e)
    }
}

impl From<SelectExtension> for BuiltinExtension {
    fn from(e: SelectExtension) -> Self {
        Self::Select(e)
    }
}

// ── Payload helpers ──────────────────────────────────────────────────

/// Deserialize a trace payload, mapping serde errors to
/// [`RenderError::InvalidPayload`].
pub(crate) fn read_payload<T: DeserializeOwned>(
    extension: &'static str,
    trace: &Trace,
) -> Result<T, RenderError> {
    trace
        .payload_as::<T>()
        .map_err(|e| RenderError::InvalidPayload {
            extension,
            message: e.to_string(),
        })
}

/// Reject an empty required string field.
pub(crate) fn require_non_empty(
    extension: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), RenderError> {
    if value.is_empty() {
        return Err(RenderError::EmptyField { extension, field });
    }
    Ok(())
}

/// Validate a trace payload against a JSON Schema.
///
/// A schema that fails to compile is treated as permissive: the extension's
/// own precondition checks still apply.
pub fn validate_payload(
    extension: &'static str,
    schema: &Value,
    trace: &Trace,
) -> Result<(), RenderError> {
    let Ok(validator) = jsonschema::validator_for(schema) else {
        return Ok(());
    };
    let empty = Value::Object(serde_json::Map::new());
    let payload = if trace.payload.is_object() {
        &trace.payload
    } else {
        &empty
    };
    let errors: Vec<String> = validator
        .iter_errors(payload)
        .map(|e| format!("{}: {e}", e.instance_path()))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RenderError::SchemaViolation { extension, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtensionConfig;
    use serde_json::json;

    fn catalog() -> Vec<BuiltinExtension> {
        let config = ExtensionConfig::default();
        vec![
            VideoExtension::new(config.video).into(),
            FileViewerDownloader::new(config.file).into(),
            SelectExtension::new(config.select).into(),
        ]
    }

    #[test]
    fn catalog_keys_are_distinct_and_ordered() {
        let keys: Vec<&str> = catalog().iter().map(|e| e.key()).collect();
        assert_eq!(keys, CATALOG_KEYS);
    }

    #[test]
    fn matches_on_type_or_payload_name_only() {
        for ext in catalog() {
            let key = ext.key();
            assert!(ext.matches(&Trace::new(key, json!({}))));
            assert!(ext.matches(&Trace::new("custom", json!({"name": key}))));
            assert!(!ext.matches(&Trace::new("text", json!({"message": key}))));
            assert!(!ext.matches(&Trace::new("custom", json!({"name": "ext_other"}))));
        }
    }

    #[test]
    fn each_key_is_claimed_by_exactly_one_extension() {
        let catalog = catalog();
        for key in CATALOG_KEYS {
            let trace = Trace::new(*key, json!({}));
            assert_eq!(catalog.iter().filter(|e| e.matches(&trace)).count(), 1);
        }
    }

    #[test]
    fn payload_schemas_are_objects() {
        for ext in catalog() {
            let schema = ext.payload_schema();
            assert_eq!(schema["type"], "object", "{}", ext.name());
        }
    }

    #[test]
    fn validate_payload_reports_type_errors() {
        let ext = SelectExtension::default();
        let schema = ext.payload_schema();
        let ok = Trace::new(EXT_SELECT, json!({"options": "A,B"}));
        assert!(validate_payload(EXT_SELECT, &schema, &ok).is_ok());

        let bad = Trace::new(EXT_SELECT, json!({"options": ["A", "B"]}));
        let err = validate_payload(EXT_SELECT, &schema, &bad).unwrap_err();
        assert!(matches!(err, RenderError::SchemaViolation { .. }));
        assert_eq!(err.extension(), EXT_SELECT);
    }

    #[test]
    fn render_error_display_names_extension() {
        let err = RenderError::EmptyField {
            extension: "Video",
            field: "videoURL",
        };
        assert_eq!(err.to_string(), "Video: no videoURL provided");
        assert_eq!(err.extension(), "Video");
    }
}
