//! Video renderer: hosted-platform embed or native media player.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{EXT_VIDEO, Extension, RenderError, read_payload, require_non_empty};
use crate::channel::InteractionChannel;
use crate::config::VideoConfig;
use crate::dom::{Container, Element, NodeId};
use crate::json_schema_for;
use crate::trace::Trace;

const NAME: &str = "Video";
const WATCH_MARKER: &str = "watch?v=";

/// Payload of an `ext_video` trace.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct VideoPayload {
    /// YouTube link or direct media URL.
    #[serde(rename = "videoURL")]
    pub video_url: String,
    /// Start playing immediately (direct media is muted when set).
    #[serde(default, deserialize_with = "crate::trace::truthy")]
    #[schemars(with = "bool")]
    pub autoplay: bool,
    /// Show native playback controls (direct media only).
    #[serde(default, deserialize_with = "crate::trace::truthy")]
    #[schemars(with = "bool")]
    pub controls: bool,
}

/// How a video URL will be rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoSource {
    /// Embedded player; carries the full embed URL.
    Hosted { embed_url: String },
    /// Native `<video>` element with a single source.
    Direct { url: String },
}

/// Extract the embeddable identifier from a hosted-platform URL.
///
/// Takes the text after `watch?v=` when present, otherwise the last path
/// segment. No further validation: a malformed URL still yields a
/// best-effort identifier.
pub fn embed_id(url: &str) -> &str {
    if url.contains(WATCH_MARKER) {
        return url.split(WATCH_MARKER).nth(1).unwrap_or_default();
    }
    url.rsplit('/').next().unwrap_or(url)
}

/// Renders `ext_video` traces.
#[derive(Clone, Debug, Default)]
pub struct VideoExtension {
    config: VideoConfig,
}

impl VideoExtension {
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }

    /// Whether `url` belongs to a hosted video platform.
    pub fn is_hosted(&self, url: &str) -> bool {
        self.config
            .hosted_domains
            .iter()
            .any(|domain| url.contains(domain.as_str()))
    }

    /// Classify a payload into the source that will be rendered.
    pub fn source(&self, payload: &VideoPayload) -> VideoSource {
        if !self.is_hosted(&payload.video_url) {
            return VideoSource::Direct {
                url: payload.video_url.clone(),
            };
        }
        let mut embed_url = format!(
            "{}{}",
            self.config.embed_base,
            embed_id(&payload.video_url)
        );
        if payload.autoplay {
            embed_url.push_str("?autoplay=1");
        }
        VideoSource::Hosted { embed_url }
    }

    fn build(&self, payload: &VideoPayload) -> Element {
        match self.source(payload) {
            VideoSource::Hosted { embed_url } => Element::new("iframe")
                .attr("src", embed_url)
                .attr("frameborder", "0")
                .attr("allow", self.config.frame_allow.as_str())
                .flag("allowfullscreen")
                .style("width", "100%")
                .style("height", self.config.frame_height.as_str()),
            VideoSource::Direct { url } => Element::new("video")
                .style("width", "100%")
                // Browsers refuse unmuted autoplay.
                .flag_if(payload.autoplay, "autoplay")
                .flag_if(payload.autoplay, "muted")
                .flag_if(payload.controls, "controls")
                .child(Element::new("source").attr("src", url)),
        }
    }
}

impl Extension for VideoExtension {
    fn name(&self) -> &'static str {
        NAME
    }

    fn key(&self) -> &'static str {
        EXT_VIDEO
    }

    fn payload_schema(&self) -> Value {
        json_schema_for::<VideoPayload>()
    }

    fn render(
        &self,
        trace: &Trace,
        container: &mut Container,
        _channel: &Arc<dyn InteractionChannel>,
    ) -> Result<NodeId, RenderError> {
        let payload: VideoPayload = read_payload(NAME, trace)?;
        require_non_empty(NAME, "videoURL", &payload.video_url)?;
        Ok(container.append(self.build(&payload)))
    }
}
