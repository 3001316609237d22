//! Renderer configuration with sensible defaults.
//!
//! [`ExtensionConfig`] holds every constant the built-in extensions use
//! (embed template, frame size, icon URLs, labels) plus registry behavior.
//! All fields default, so a JSON file only needs to name what it overrides:
//!
//! ```json
//! { "select": { "submit_label": "Submit" }, "dispatch": "all" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// How the registry treats traces claimed by more than one extension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Render with the first matching extension in registration order.
    #[default]
    First,
    /// Render with every matching extension, in registration order.
    All,
}

/// Settings for [`VideoExtension`](crate::ext::VideoExtension).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Substrings that classify a URL as a hosted-platform video.
    /// Default: `["youtube.com", "youtu.be"]`.
    pub hosted_domains: Vec<String>,
    /// Prefix the embed identifier is appended to.
    /// Default: `"https://www.youtube.com/embed/"`.
    pub embed_base: String,
    /// Height of the embedded frame. Default: `"250px"`.
    pub frame_height: String,
    /// Permissions granted to the embedded frame.
    pub frame_allow: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            hosted_domains: vec!["youtube.com".into(), "youtu.be".into()],
            embed_base: "https://www.youtube.com/embed/".into(),
            frame_height: "250px".into(),
            frame_allow: "accelerometer; autoplay; encrypted-media; gyroscope; picture-in-picture"
                .into(),
        }
    }
}

/// Settings for [`FileViewerDownloader`](crate::ext::FileViewerDownloader).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub pdf_icon: String,
    pub image_icon: String,
    /// Icon for every file kind other than pdf and image.
    pub generic_icon: String,
    /// Rendered width of the icon. Default: `"40px"`.
    pub icon_width: String,
    /// Label shown when the payload has no file name.
    /// Default: `"Download File"`.
    pub placeholder_name: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            pdf_icon: "https://upload.wikimedia.org/wikipedia/commons/thumb/8/87/PDF_file_icon.svg/1667px-PDF_file_icon.svg.png".into(),
            image_icon: "https://cdn.icon-icons.com/icons2/2570/PNG/512/image_icon_153794.png"
                .into(),
            generic_icon: "https://example.com/icons/file-icon.png".into(),
            icon_width: "40px".into(),
            placeholder_name: "Download File".into(),
        }
    }
}

/// Settings for [`SelectExtension`](crate::ext::SelectExtension).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectConfig {
    /// Submit button label. Default: `"Seleccionar"`.
    pub submit_label: String,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            submit_label: "Seleccionar".into(),
        }
    }
}

/// Top-level configuration for the built-in catalog and its registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    pub video: VideoConfig,
    pub file: FileConfig,
    pub select: SelectConfig,
    /// Multiple-match policy. Default: [`DispatchMode::First`].
    pub dispatch: DispatchMode,
    /// Validate payloads against each extension's JSON Schema before
    /// rendering. Default: `false`.
    pub validate_payloads: bool,
}

impl ExtensionConfig {
    /// Load a configuration from a JSON file. Missing fields keep their
    /// defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {e}", path.display()))?;
        Self::from_json(&raw).map_err(|e| format!("invalid config {}: {e}", path.display()))
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    }

    pub fn with_dispatch(mut self, mode: DispatchMode) -> Self {
        self.dispatch = mode;
        self
    }

    pub fn with_payload_validation(mut self, enabled: bool) -> Self {
        self.validate_payloads = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_widget_constants() {
        let config = ExtensionConfig::default();
        assert_eq!(config.video.hosted_domains, vec!["youtube.com", "youtu.be"]);
        assert_eq!(config.video.embed_base, "https://www.youtube.com/embed/");
        assert_eq!(config.video.frame_height, "250px");
        assert_eq!(config.file.placeholder_name, "Download File");
        assert_eq!(config.select.submit_label, "Seleccionar");
        assert_eq!(config.dispatch, DispatchMode::First);
        assert!(!config.validate_payloads);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = ExtensionConfig::from_json(
            r#"{"select": {"submit_label": "Submit"}, "dispatch": "all"}"#,
        )
        .unwrap();
        assert_eq!(config.select.submit_label, "Submit");
        assert_eq!(config.dispatch, DispatchMode::All);
        assert_eq!(config.video, VideoConfig::default());
        assert_eq!(config.file, FileConfig::default());
    }

    #[test]
    fn from_path_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"video": {{"frame_height": "300px"}}}}"#).unwrap();

        let config = ExtensionConfig::from_path(file.path()).unwrap();
        assert_eq!(config.video.frame_height, "300px");
        assert_eq!(config.video.embed_base, "https://www.youtube.com/embed/");
    }

    #[test]
    fn from_path_reports_missing_and_invalid_files() {
        let err = ExtensionConfig::from_path("/nonexistent/chatext.json").unwrap_err();
        assert!(err.contains("failed to read config"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = ExtensionConfig::from_path(file.path()).unwrap_err();
        assert!(err.contains("invalid config"));
    }

    #[test]
    fn builder_helpers() {
        let config = ExtensionConfig::default()
            .with_dispatch(DispatchMode::All)
            .with_payload_validation(true);
        assert_eq!(config.dispatch, DispatchMode::All);
        assert!(config.validate_payloads);
    }
}
