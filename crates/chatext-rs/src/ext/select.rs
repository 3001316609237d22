//! Single-choice dropdown that reports the chosen value exactly once.
//!
//! # State machine
//!
//! ```text
//! Idle ──click submit──▶ Submitted (terminal)
//! ```
//!
//! The submit listener reads the `<select>` value, sends
//! `{type: "complete", payload: {selectedOption}}` to the injected channel,
//! then disables the button and adds the `disabled` class before returning.
//! Disabled nodes receive no events, so the listener can never run twice.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{EXT_SELECT, Extension, RenderError, read_payload};
use crate::channel::{InteractionChannel, InteractionReport};
use crate::config::SelectConfig;
use crate::dom::{Container, Element, EventKind, NodeId};
use crate::json_schema_for;
use crate::trace::Trace;

const NAME: &str = "Select";

/// Class of the `<select>` element.
pub const SELECT_CLASS: &str = "select-element";
/// Class of the submit `<button>`.
pub const SUBMIT_CLASS: &str = "submit-button";
/// Class added to the submit button once the choice is reported.
pub const DISABLED_CLASS: &str = "disabled";

const STYLE: &str = "
.select-container {
  margin-bottom: 10px;
}
.select-element {
  width: 100%;
  padding: 10px;
  border-radius: 5px;
  border: 1px solid #ccc;
}
.submit-button {
  background: linear-gradient(to right, #2e6ee1, #2e7ff1);
  border: none;
  color: white;
  padding: 10px;
  border-radius: 5px;
  width: 100%;
  cursor: pointer;
}
.submit-button.disabled {
  background: #ccc;
  cursor: not-allowed;
}
";

/// Payload of an `ext_select` trace.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct SelectPayload {
    /// Comma-separated option list, e.g. `"Yes, No"`.
    pub options: String,
}

/// Split a comma-separated option list into trimmed options, preserving
/// order. Empty segments are kept, so the result is never empty.
pub fn parse_options(raw: &str) -> Vec<String> {
    raw.split(',').map(|option| option.trim().to_string()).collect()
}

/// Lifecycle of one rendered select control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectState {
    /// Waiting for the user to submit.
    Idle,
    /// The choice was reported; the submit button is disabled.
    Submitted,
}

/// Node ids of a rendered select control, for driving it like a user would.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectHandle {
    pub select: NodeId,
    pub submit: NodeId,
}

impl SelectHandle {
    /// Find the select and submit nodes under a rendered root.
    pub fn locate(container: &Container, root: NodeId) -> Option<Self> {
        Some(Self {
            select: container.query_class(root, SELECT_CLASS)?,
            submit: container.query_class(root, SUBMIT_CLASS)?,
        })
    }

    /// Option values in display order.
    pub fn options(&self, container: &Container) -> Vec<String> {
        container.option_values(self.select)
    }

    /// The value that would be reported right now.
    pub fn selected(&self, container: &Container) -> Option<String> {
        container.value(self.select)
    }

    /// Pick an option by value. Returns `false` for unknown values.
    pub fn choose(&self, container: &mut Container, value: &str) -> bool {
        container.choose(self.select, value)
    }

    /// Activate the submit button. Returns `true` if the activation was
    /// delivered (i.e. the control was still idle).
    pub fn submit(&self, container: &mut Container) -> bool {
        container.click(self.submit) > 0
    }

    pub fn state(&self, container: &Container) -> SelectState {
        if container.is_disabled(self.submit) {
            SelectState::Submitted
        } else {
            SelectState::Idle
        }
    }

    fn wire(&self, container: &mut Container, channel: Arc<dyn InteractionChannel>) {
        let select = self.select;
        container.on(self.submit, EventKind::Click, move |c, button| {
            let selected_option = c.value(select).unwrap_or_default();
            channel.interact(InteractionReport::complete(selected_option));
            c.set_disabled(button, true);
            c.add_class(button, DISABLED_CLASS);
        });
    }
}

/// Renders `ext_select` traces.
#[derive(Clone, Debug, Default)]
pub struct SelectExtension {
    config: SelectConfig,
}

impl SelectExtension {
    pub fn new(config: SelectConfig) -> Self {
        Self { config }
    }

    fn build(&self, options: &[String]) -> Element {
        let select = Element::new("select")
            .class(SELECT_CLASS)
            .children(options.iter().map(|option| {
                Element::new("option")
                    .attr("value", option.as_str())
                    .text(option.as_str())
            }));

        Element::new("div")
            .child(Element::new("style").text(STYLE))
            .child(Element::new("div").class("select-container").child(select))
            .child(
                Element::new("button")
                    .class(SUBMIT_CLASS)
                    .text(self.config.submit_label.as_str()),
            )
    }
}

impl Extension for SelectExtension {
    fn name(&self) -> &'static str {
        NAME
    }

    fn key(&self) -> &'static str {
        EXT_SELECT
    }

    fn payload_schema(&self) -> Value {
        json_schema_for::<SelectPayload>()
    }

    fn render(
        &self,
        trace: &Trace,
        container: &mut Container,
        channel: &Arc<dyn InteractionChannel>,
    ) -> Result<NodeId, RenderError> {
        let payload: SelectPayload = read_payload(NAME, trace)?;
        if payload.options.trim().is_empty() {
            return Err(RenderError::EmptyField {
                extension: NAME,
                field: "options",
            });
        }
        let options = parse_options(&payload.options);
        let root = container.append(self.build(&options));
        if let Some(handle) = SelectHandle::locate(container, root) {
            handle.wire(container, channel.clone());
        }
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::RecordingChannel;
    use serde_json::json;

    fn render(payload: Value) -> (Container, RecordingChannel, Result<NodeId, RenderError>) {
        let recorder = RecordingChannel::new();
        let channel: Arc<dyn InteractionChannel> = Arc::new(recorder.clone());
        let mut container = Container::new();
        let trace = Trace::new(EXT_SELECT, payload);
        let result = SelectExtension::default().render(&trace, &mut container, &channel);
        (container, recorder, result)
    }

    #[test]
    fn parse_options_trims_and_keeps_order() {
        assert_eq!(parse_options("A, B ,C"), vec!["A", "B", "C"]);
        assert_eq!(parse_options("only"), vec!["only"]);
        assert_eq!(parse_options("A,,B"), vec!["A", "", "B"]);
        assert_eq!(parse_options(" , "), vec!["", ""]);
        assert_eq!(parse_options(""), vec![""]);
    }

    #[test]
    fn renders_options_in_order_with_identical_label_and_value() {
        let (container, _, result) = render(json!({"options": "Yes, No ,Maybe"}));
        let root = result.unwrap();
        let handle = SelectHandle::locate(&container, root).unwrap();
        assert_eq!(handle.options(&container), vec!["Yes", "No", "Maybe"]);

        for option in container.query_tag(root, "option") {
            assert_eq!(container.attribute(option, "value"), container.text(option));
        }
        assert_eq!(container.text(handle.submit), Some("Seleccionar"));
        assert_eq!(handle.state(&container), SelectState::Idle);
    }

    #[test]
    fn blank_options_render_nothing() {
        for raw in ["", "   "] {
            let (container, recorder, result) = render(json!({"options": raw}));
            assert_eq!(
                result,
                Err(RenderError::EmptyField {
                    extension: NAME,
                    field: "options"
                })
            );
            assert!(container.is_empty());
            assert!(recorder.is_empty());
        }
    }

    #[test]
    fn empty_segments_render_as_empty_options() {
        let (mut container, recorder, result) = render(json!({"options": ","}));
        let handle = SelectHandle::locate(&container, result.unwrap()).unwrap();
        assert_eq!(handle.options(&container), vec!["", ""]);
        assert!(container.to_html().contains("<option value></option><option value></option>"));

        handle.submit(&mut container);
        assert_eq!(recorder.reports(), vec![InteractionReport::complete("")]);
    }

    #[test]
    fn empty_segment_can_be_chosen_and_reported() {
        let (mut container, recorder, result) = render(json!({"options": ",B"}));
        let handle = SelectHandle::locate(&container, result.unwrap()).unwrap();
        assert_eq!(handle.options(&container), vec!["", "B"]);
        assert_eq!(handle.selected(&container).as_deref(), Some(""));

        assert!(handle.choose(&mut container, "B"));
        handle.submit(&mut container);
        assert_eq!(recorder.reports(), vec![InteractionReport::complete("B")]);
    }

    #[test]
    fn non_string_or_missing_options_render_nothing() {
        for payload in [json!({"options": ["A", "B"]}), json!({}), json!(null)] {
            let (container, _, result) = render(payload);
            assert!(matches!(result, Err(RenderError::InvalidPayload { .. })));
            assert!(container.is_empty());
        }
    }

    #[test]
    fn submit_reports_once_and_disables() {
        let (mut container, recorder, result) = render(json!({"options": "A,B,C"}));
        let handle = SelectHandle::locate(&container, result.unwrap()).unwrap();

        assert!(handle.choose(&mut container, "B"));
        assert!(handle.submit(&mut container));
        assert_eq!(recorder.reports(), vec![InteractionReport::complete("B")]);
        assert_eq!(handle.state(&container), SelectState::Submitted);
        assert!(container.is_disabled(handle.submit));
        assert!(container.has_class(handle.submit, DISABLED_CLASS));

        assert!(!handle.submit(&mut container));
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn submit_without_choice_reports_first_option() {
        let (mut container, recorder, result) = render(json!({"options": "First,Second"}));
        let handle = SelectHandle::locate(&container, result.unwrap()).unwrap();
        assert_eq!(handle.selected(&container).as_deref(), Some("First"));
        handle.submit(&mut container);
        assert_eq!(recorder.take(), vec![InteractionReport::complete("First")]);
    }

    #[test]
    fn choosing_unknown_value_keeps_current_selection() {
        let (mut container, _, result) = render(json!({"options": "A,B"}));
        let handle = SelectHandle::locate(&container, result.unwrap()).unwrap();
        assert!(!handle.choose(&mut container, "Z"));
        assert_eq!(handle.selected(&container).as_deref(), Some("A"));
    }

    #[test]
    fn independent_renders_do_not_share_state() {
        let recorder = RecordingChannel::new();
        let channel: Arc<dyn InteractionChannel> = Arc::new(recorder.clone());
        let ext = SelectExtension::default();
        let trace = Trace::new(EXT_SELECT, json!({"options": "X,Y"}));

        let mut first = Container::new();
        let mut second = Container::new();
        let first_root = ext.render(&trace, &mut first, &channel).unwrap();
        let second_root = ext.render(&trace, &mut second, &channel).unwrap();
        let a = SelectHandle::locate(&first, first_root).unwrap();
        let b = SelectHandle::locate(&second, second_root).unwrap();

        a.submit(&mut first);
        assert_eq!(a.state(&first), SelectState::Submitted);
        assert_eq!(b.state(&second), SelectState::Idle);

        b.choose(&mut second, "Y");
        b.submit(&mut second);
        assert_eq!(
            recorder.reports(),
            vec![InteractionReport::complete("X"), InteractionReport::complete("Y")]
        );
    }

    #[test]
    fn html_contains_style_block_and_escaped_options() {
        let (container, _, result) = render(json!({"options": "<A>,B"}));
        result.unwrap();
        let html = container.to_html();
        assert!(html.contains("<style>"));
        assert!(html.contains(".submit-button.disabled"));
        assert!(html.contains(r#"<option value="&lt;A&gt;">&lt;A&gt;</option>"#));
        assert!(html.contains(r#"<button class="submit-button">Seleccionar</button>"#));
    }
}
