//! Pluggable renderers that turn conversation traces into interactive chat
//! widgets.
//!
//! A chat host receives [`Trace`](trace::Trace)s (`{type, payload}`) from a
//! conversational backend. Most are plain text; some call for a richer
//! widget. `chatext` ships a closed catalog of three such renderers and an
//! ordered [`ExtensionRegistry`](ext::ExtensionRegistry) that picks one per
//! trace and appends its rendering to a host-owned
//! [`Container`](dom::Container):
//!
//! - **Video**: an embedded YouTube player or a native `<video>` element.
//! - **FileViewerDownloader**: a card that previews and downloads a file.
//! - **Select**: a dropdown with a submit button that reports the choice
//!   back to the conversation exactly once.
//!
//! # Getting started
//!
//! ```
//! use std::sync::Arc;
//! use chatext::prelude::*;
//! use serde_json::json;
//!
//! let registry = ExtensionRegistry::builtin(&ExtensionConfig::default());
//! let recorder = RecordingChannel::new();
//! let channel: Arc<dyn InteractionChannel> = Arc::new(recorder.clone());
//! let mut container = Container::new();
//!
//! let trace = Trace::new("ext_select", json!({"options": "Yes,No"}));
//! let outcomes = registry.dispatch(&trace, &mut container, &channel);
//! let root = outcomes[0].root().unwrap();
//!
//! // Drive the control like a user would.
//! let select = SelectHandle::locate(&container, root).unwrap();
//! select.choose(&mut container, "No");
//! select.submit(&mut container);
//!
//! assert_eq!(recorder.reports(), vec![InteractionReport::complete("No")]);
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`trace`] | [`Trace`](trace::Trace) and discriminator matching |
//! | [`dom`] | Arena [`Container`](dom::Container), [`Element`](dom::Element) builder, click events, HTML serialization |
//! | [`channel`] | [`InteractionChannel`](channel::InteractionChannel) and the provided channels |
//! | [`ext`] | [`Extension`](ext::Extension) trait, the built-in renderers, [`ExtensionRegistry`](ext::ExtensionRegistry) |
//! | [`config`] | [`ExtensionConfig`](config::ExtensionConfig), loadable from JSON |
//! | [`diagnostics`] | Tracing layer capturing render diagnostics |

pub mod channel;
pub mod config;
pub mod diagnostics;
pub mod dom;
pub mod ext;
pub mod prelude;
pub mod trace;

use schemars::JsonSchema;

// Re-export schemars for downstream crates.
pub use schemars;

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`.
///
/// # Example
///
/// ```
/// use chatext::json_schema_for;
/// use chatext::ext::SelectPayload;
///
/// let schema = json_schema_for::<SelectPayload>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"options".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}
