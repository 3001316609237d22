//! Ordered extension registry and trace dispatch.
//!
//! Registration order is dispatch order. In [`DispatchMode::First`] the
//! first extension whose `matches` returns true renders the trace; in
//! [`DispatchMode::All`] every match renders, in order, into the same
//! container.
//!
//! A failing extension never breaks the caller: its [`RenderError`] is
//! logged at ERROR level and returned in the [`DispatchOutcome`], and the
//! container is left exactly as it was.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use super::{
    BuiltinExtension, Extension, FileViewerDownloader, RenderError, SelectExtension,
    VideoExtension, validate_payload,
};
use crate::channel::InteractionChannel;
use crate::config::{DispatchMode, ExtensionConfig};
use crate::dom::{Container, NodeId};
use crate::trace::Trace;

/// Result of dispatching a trace to one extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Name of the extension that handled the trace.
    pub extension: &'static str,
    /// Matching key of that extension.
    pub key: &'static str,
    /// Root of the appended subtree, or the precondition that failed.
    pub result: Result<NodeId, RenderError>,
}

impl DispatchOutcome {
    pub fn is_rendered(&self) -> bool {
        self.result.is_ok()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.result.as_ref().ok().copied()
    }
}

/// An ordered collection of extensions.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chatext::prelude::*;
///
/// let registry = ExtensionRegistry::builtin(&ExtensionConfig::default());
/// let channel: Arc<dyn InteractionChannel> = Arc::new(RecordingChannel::new());
/// let mut container = Container::new();
///
/// let trace = Trace::new("ext_video", serde_json::json!({"videoURL": "https://youtu.be/abc"}));
/// let outcomes = registry.dispatch(&trace, &mut container, &channel);
/// assert_eq!(outcomes.len(), 1);
/// assert!(container.to_html().starts_with("<iframe"));
/// ```
pub struct ExtensionRegistry {
    extensions: Vec<BuiltinExtension>,
    mode: DispatchMode,
    validate_payloads: bool,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("keys", &self.keys())
            .field("mode", &self.mode)
            .field("validate_payloads", &self.validate_payloads)
            .finish()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    /// Create an empty registry in first-match mode.
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
            mode: DispatchMode::First,
            validate_payloads: false,
        }
    }

    /// The full built-in catalog (Video, FileViewerDownloader, Select, in
    /// that order) configured from `config`.
    pub fn builtin(config: &ExtensionConfig) -> Self {
        Self::new()
            .with_mode(config.dispatch)
            .with_payload_validation(config.validate_payloads)
            .with(VideoExtension::new(config.video.clone()))
            .with(FileViewerDownloader::new(config.file.clone()))
            .with(SelectExtension::new(config.select.clone()))
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate payloads against each extension's schema before rendering.
    pub fn with_payload_validation(mut self, enabled: bool) -> Self {
        self.validate_payloads = enabled;
        self
    }

    /// Register an extension at the end of the dispatch order.
    ///
    /// An extension whose key is already registered replaces the existing
    /// one in place, keeping its position.
    pub fn register(&mut self, extension: impl Into<BuiltinExtension>) {
        let extension = extension.into();
        if let Some(slot) = self
            .extensions
            .iter_mut()
            .find(|e| e.key() == extension.key())
        {
            debug!("Replacing extension registered for {}", extension.key());
            *slot = extension;
        } else {
            self.extensions.push(extension);
        }
    }

    /// Register an extension (builder pattern).
    pub fn with(mut self, extension: impl Into<BuiltinExtension>) -> Self {
        self.register(extension);
        self
    }

    /// Register an extension only when `condition` is true.
    pub fn with_if(self, condition: bool, extension: impl Into<BuiltinExtension>) -> Self {
        if condition { self.with(extension) } else { self }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Matching keys in dispatch order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|e| e.key()).collect()
    }

    /// Registered extensions in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &BuiltinExtension> {
        self.extensions.iter()
    }

    /// The first extension claiming `trace`, if any.
    pub fn find(&self, trace: &Trace) -> Option<&BuiltinExtension> {
        self.extensions.iter().find(|e| e.matches(trace))
    }

    /// Every extension claiming `trace`, in dispatch order.
    pub fn matching<'a>(&'a self, trace: &'a Trace) -> impl Iterator<Item = &'a BuiltinExtension> {
        self.extensions.iter().filter(move |e| e.matches(trace))
    }

    /// Render `trace` into `container` with the matching extension(s).
    ///
    /// Returns one outcome per extension that was invoked; an empty vector
    /// means no extension claimed the trace.
    pub fn dispatch(
        &self,
        trace: &Trace,
        container: &mut Container,
        channel: &Arc<dyn InteractionChannel>,
    ) -> Vec<DispatchOutcome> {
        debug!(
            "Dispatching trace {} ({:?} mode)",
            trace.resolved_key().unwrap_or(&trace.kind),
            self.mode
        );
        let selected: Vec<&BuiltinExtension> = match self.mode {
            DispatchMode::First => self.find(trace).into_iter().collect(),
            DispatchMode::All => self.matching(trace).collect(),
        };

        if selected.is_empty() {
            debug!(
                "No extension matched trace type={:?} name={:?}",
                trace.kind,
                trace.payload_name()
            );
        }

        selected
            .into_iter()
            .map(|extension| self.render_with(extension, trace, container, channel))
            .collect()
    }

    fn render_with(
        &self,
        extension: &BuiltinExtension,
        trace: &Trace,
        container: &mut Container,
        channel: &Arc<dyn InteractionChannel>,
    ) -> DispatchOutcome {
        let result = if self.validate_payloads {
            validate_payload(extension.name(), &extension.payload_schema(), trace)
                .and_then(|()| extension.render(trace, container, channel))
        } else {
            extension.render(trace, container, channel)
        };

        match &result {
            Ok(root) => debug!(
                "{} rendered {} (root node {})",
                extension.name(),
                extension.key(),
                root.index()
            ),
            Err(e) => error!("{e}"),
        }

        DispatchOutcome {
            extension: extension.name(),
            key: extension.key(),
            result,
        }
    }
}
