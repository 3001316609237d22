//! File card renderer: one anchor that previews (icon) and downloads.
//!
//! The whole card is a single `<a download target="_blank">`, so the
//! browser's native anchor activation is the entire control flow. No
//! listener is attached and no interaction report is produced.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{EXT_FILE_VIEWER_DOWNLOADER, Extension, RenderError, read_payload, require_non_empty};
use crate::channel::InteractionChannel;
use crate::config::FileConfig;
use crate::dom::{Container, Element, NodeId};
use crate::json_schema_for;
use crate::trace::Trace;

const NAME: &str = "FileViewerDownloader";

/// Coarse file classification used to pick an icon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    /// Anything else, including a missing or non-string `fileType`.
    #[default]
    Other,
}

impl FileKind {
    /// Classify a raw `fileType` value. Exact, case-sensitive match.
    pub fn classify(raw: Option<&str>) -> Self {
        match raw {
            Some("pdf") => Self::Pdf,
            Some("image") => Self::Image,
            _ => Self::Other,
        }
    }

    fn lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::classify(value.as_str()))
    }
}

/// Payload of an `ext_file_viewer_downloader` trace.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct FilePayload {
    /// Link target of the card.
    #[serde(rename = "fileURL")]
    pub file_url: String,
    /// `"pdf"`, `"image"`, or anything else for a generic icon.
    #[serde(rename = "fileType", default, deserialize_with = "FileKind::lenient")]
    #[schemars(with = "Option<String>")]
    pub file_type: FileKind,
    /// Visible label and suggested download name.
    #[serde(rename = "fileName", default)]
    pub file_name: Option<String>,
}

impl FilePayload {
    /// The non-empty file name, if any.
    pub fn name(&self) -> Option<&str> {
        self.file_name.as_deref().filter(|n| !n.is_empty())
    }
}

/// Renders `ext_file_viewer_downloader` traces.
#[derive(Clone, Debug, Default)]
pub struct FileViewerDownloader {
    config: FileConfig,
}

impl FileViewerDownloader {
    pub fn new(config: FileConfig) -> Self {
        Self { config }
    }

    /// Icon URL for a file kind.
    pub fn icon_for(&self, kind: FileKind) -> &str {
        match kind {
            FileKind::Pdf => &self.config.pdf_icon,
            FileKind::Image => &self.config.image_icon,
            FileKind::Other => &self.config.generic_icon,
        }
    }

    /// Visible label: the file name, or the configured placeholder.
    pub fn label<'a>(&'a self, payload: &'a FilePayload) -> &'a str {
        payload.name().unwrap_or(&self.config.placeholder_name)
    }

    fn build(&self, payload: &FilePayload) -> Element {
        let icon = Element::new("div").style("margin-right", "10px").child(
            Element::new("img")
                .attr("src", self.icon_for(payload.file_type))
                .style("width", self.config.icon_width.as_str()),
        );

        let label = Element::new("div")
            .text(self.label(payload))
            .style("flex-grow", "1")
            .style("font-size", "16px")
            .style("color", "#333");

        Element::new("a")
            .attr("href", payload.file_url.as_str())
            .attr("download", payload.name().unwrap_or_default())
            .attr("target", "_blank")
            .style("display", "flex")
            .style("align-items", "center")
            .style("margin", "10px 0")
            .style("padding", "10px")
            .style("border", "1px solid #ccc")
            .style("border-radius", "5px")
            .style("background-color", "#f9f9f9")
            .style("text-decoration", "none")
            .style("cursor", "pointer")
            .child(icon)
            .child(label)
    }
}

impl Extension for FileViewerDownloader {
    fn name(&self) -> &'static str {
        NAME
    }

    fn key(&self) -> &'static str {
        EXT_FILE_VIEWER_DOWNLOADER
    }

    fn payload_schema(&self) -> Value {
        json_schema_for::<FilePayload>()
    }

    fn render(
        &self,
        trace: &Trace,
        container: &mut Container,
        _channel: &Arc<dyn InteractionChannel>,
    ) -> Result<NodeId, RenderError> {
        let payload: FilePayload = read_payload(NAME, trace)?;
        require_non_empty(NAME, "fileURL", &payload.file_url)?;
        Ok(container.append(self.build(&payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::NoopChannel;
    use serde_json::json;

    fn render(payload: Value) -> (Container, Result<NodeId, RenderError>) {
        let channel: Arc<dyn InteractionChannel> = Arc::new(NoopChannel);
        let mut container = Container::new();
        let trace = Trace::new(EXT_FILE_VIEWER_DOWNLOADER, payload);
        let result = FileViewerDownloader::default().render(&trace, &mut container, &channel);
        (container, result)
    }

    fn icon_src(container: &Container, root: NodeId) -> String {
        let img = container.query_tag(root, "img")[0];
        container.attribute(img, "src").unwrap().to_string()
    }

    #[test]
    fn classify_is_closed_with_default() {
        assert_eq!(FileKind::classify(Some("pdf")), FileKind::Pdf);
        assert_eq!(FileKind::classify(Some("image")), FileKind::Image);
        assert_eq!(FileKind::classify(Some("PDF")), FileKind::Other);
        assert_eq!(FileKind::classify(Some("docx")), FileKind::Other);
        assert_eq!(FileKind::classify(None), FileKind::Other);
    }

    #[test]
    fn icon_follows_file_type() {
        let defaults = FileConfig::default();
        let cases = [
            (json!("pdf"), &defaults.pdf_icon),
            (json!("image"), &defaults.image_icon),
            (json!("zip"), &defaults.generic_icon),
            (json!(7), &defaults.generic_icon),
        ];
        for (file_type, expected) in cases {
            let (container, result) =
                render(json!({"fileURL": "https://x/f", "fileType": file_type}));
            assert_eq!(&icon_src(&container, result.unwrap()), expected);
        }

        let (container, result) = render(json!({"fileURL": "https://x/f"}));
        assert_eq!(icon_src(&container, result.unwrap()), defaults.generic_icon);
    }

    #[test]
    fn anchor_wraps_card_with_download_attributes() {
        let (container, result) = render(json!({
            "fileURL": "https://files.example.com/report.pdf",
            "fileType": "pdf",
            "fileName": "report.pdf",
        }));
        let root = result.unwrap();
        assert_eq!(container.roots(), &[root]);
        assert_eq!(container.get(root).unwrap().tag, "a");
        assert_eq!(
            container.attribute(root, "href"),
            Some("https://files.example.com/report.pdf")
        );
        assert_eq!(container.attribute(root, "download"), Some("report.pdf"));
        assert_eq!(container.attribute(root, "target"), Some("_blank"));
        assert_eq!(container.style(root, "display"), Some("flex"));

        let children = container.children(root);
        assert_eq!(children.len(), 2);
        assert_eq!(container.text(children[1]), Some("report.pdf"));
    }

    #[test]
    fn missing_name_uses_placeholder_label() {
        for payload in [
            json!({"fileURL": "https://x/f"}),
            json!({"fileURL": "https://x/f", "fileName": ""}),
        ] {
            let (container, result) = render(payload);
            let root = result.unwrap();
            let label = container.children(root)[1];
            assert_eq!(container.text(label), Some("Download File"));
            assert_eq!(container.attribute(root, "download"), Some(""));
        }
    }

    #[test]
    fn missing_url_renders_nothing() {
        let (container, result) = render(json!({"fileName": "a.txt"}));
        assert!(matches!(result, Err(RenderError::InvalidPayload { .. })));
        assert!(container.is_empty());

        let (container, result) = render(json!({"fileURL": ""}));
        assert!(matches!(result, Err(RenderError::EmptyField { field: "fileURL", .. })));
        assert!(container.is_empty());
    }

    #[test]
    fn file_name_is_escaped_in_html() {
        let (container, result) = render(json!({
            "fileURL": "https://x/f",
            "fileName": "<b>a</b>",
        }));
        result.unwrap();
        let html = container.to_html();
        assert!(html.contains("&lt;b&gt;a&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }
}
