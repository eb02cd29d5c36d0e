//! Scenario action model.
//!
//! Actions form a closed set of tagged YAML values. Deserialization is
//! driven by the `type` tag, so an unknown tag fails the file at load time
//! instead of surfacing mid-run. The wire field `constrains` keeps its
//! historical spelling; renaming it would break every existing scenario
//! file.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Optional per-action metadata, echoed verbatim into the step's outcome.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionMeta {
    /// Human-readable step name, used in screenshot file names and logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Free-form tag correlating steps across phases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// A form value: literal text, generated data, or a formatted date.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Verbatim text.
    Literal(String),

    /// Text generated from the named faker template.
    Faker {
        /// Generator name, e.g. `internet.email`.
        faker: String,
    },

    /// Today's date rendered with the given format string.
    Date {
        /// Date format, e.g. `YYYY-MM-DD`.
        date: String,
    },
}

/// Constraints applied to a form value.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Constraints {
    /// Whether the field must end up non-empty.
    #[serde(default)]
    pub required: bool,

    /// Regular expression the generated value must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexp: Option<String>,
}

/// Target and value of an `input` action.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InputForm {
    /// CSS selector of the field.
    pub selector: String,

    /// Value to type; absent means a generated one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Constraints on a generated value.
    #[serde(default, rename = "constrains", skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

/// Candidate values of a `select` action.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SelectConstraints {
    /// Whether an option must be picked.
    #[serde(default)]
    pub required: bool,

    /// Options the handler may pick from.
    pub values: Vec<serde_json::Value>,
}

/// Target and candidates of a `select` action.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SelectForm {
    /// CSS selector of the select element.
    pub selector: String,

    /// Candidate values.
    #[serde(rename = "constrains")]
    pub constraints: SelectConstraints,
}

/// Target of a `radio` action.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RadioForm {
    /// CSS selector of the radio group.
    pub selector: String,

    /// Constraints on the choice.
    #[serde(default, rename = "constrains", skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,

    /// Value of the button to check.
    pub value: String,
}

/// Expected page location of an `ensure` action.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Location {
    /// Exact URL the page must be at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Pattern the page URL must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexp: Option<String>,
}

/// One browser action, tagged by `type` on the wire.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Types a value into a form field.
    Input {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// Field and value.
        form: InputForm,
    },

    /// Clicks an element.
    Click {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// CSS selector of the element.
        selector: String,

        /// Whether the click triggers a page navigation to await.
        #[serde(default)]
        navigation: bool,

        /// Keeps the element's current content instead of clearing it.
        #[serde(default, rename = "avoidClear")]
        avoid_clear: bool,

        /// Moves the pointer to the element before clicking.
        #[serde(default, rename = "emulateMouse")]
        emulate_mouse: bool,
    },

    /// Picks an option of a select element.
    Select {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// Element and candidate values.
        form: SelectForm,
    },

    /// Pauses for the given number of milliseconds.
    Wait {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// Pause length in milliseconds.
        duration: u64,
    },

    /// Asserts the page is at the expected location.
    Ensure {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// Expected location.
        location: Location,
    },

    /// Checks a radio button.
    Radio {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// Group and value.
        form: RadioForm,
    },

    /// Captures a screenshot.
    Screenshot {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// Base name of the image file.
        name: String,

        /// Captures the full scrollable page instead of the viewport.
        #[serde(default, rename = "fullPage")]
        full_page: bool,
    },

    /// Navigates to a URL.
    Goto {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// Absolute URL to navigate to.
        url: String,
    },

    /// Clears a form field's current content.
    Clear {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// CSS selector of the field.
        selector: String,
    },

    /// Dumps the page's current markup.
    Dump {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,
    },

    /// Hovers the pointer over an element.
    Hover {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// CSS selector of the element.
        selector: String,
    },

    /// Focuses an element.
    Focus {
        /// Step metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<ActionMeta>,

        /// CSS selector of the element.
        selector: String,
    },
}

impl Action {
    /// The action's kind, used as the handler-registry key.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Input { .. } => ActionKind::Input,
            Self::Click { .. } => ActionKind::Click,
            Self::Select { .. } => ActionKind::Select,
            Self::Wait { .. } => ActionKind::Wait,
            Self::Ensure { .. } => ActionKind::Ensure,
            Self::Radio { .. } => ActionKind::Radio,
            Self::Screenshot { .. } => ActionKind::Screenshot,
            Self::Goto { .. } => ActionKind::Goto,
            Self::Clear { .. } => ActionKind::Clear,
            Self::Dump { .. } => ActionKind::Dump,
            Self::Hover { .. } => ActionKind::Hover,
            Self::Focus { .. } => ActionKind::Focus,
        }
    }

    /// The action's metadata, if any.
    #[must_use]
    pub fn meta(&self) -> Option<&ActionMeta> {
        match self {
            Self::Input { meta, .. }
            | Self::Click { meta, .. }
            | Self::Select { meta, .. }
            | Self::Wait { meta, .. }
            | Self::Ensure { meta, .. }
            | Self::Radio { meta, .. }
            | Self::Screenshot { meta, .. }
            | Self::Goto { meta, .. }
            | Self::Clear { meta, .. }
            | Self::Dump { meta }
            | Self::Hover { meta, .. }
            | Self::Focus { meta, .. } => meta.as_ref(),
        }
    }
}

/// Kind of an [`Action`], matching its wire `type` tag.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ActionKind {
    /// `input`
    #[display("input")]
    Input,

    /// `click`
    #[display("click")]
    Click,

    /// `select`
    #[display("select")]
    Select,

    /// `wait`
    #[display("wait")]
    Wait,

    /// `ensure`
    #[display("ensure")]
    Ensure,

    /// `radio`
    #[display("radio")]
    Radio,

    /// `screenshot`
    #[display("screenshot")]
    Screenshot,

    /// `goto`
    #[display("goto")]
    Goto,

    /// `clear`
    #[display("clear")]
    Clear,

    /// `dump`
    #[display("dump")]
    Dump,

    /// `hover`
    #[display("hover")]
    Hover,

    /// `focus`
    #[display("focus")]
    Focus,
}

/// One step of a scenario: an envelope around a single action.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Step {
    /// The action to perform.
    pub action: Action,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_literal_input_step() {
        let step: Step = serde_yaml::from_str(
            r##"
action:
  type: input
  form:
    selector: "#email"
    value: "a@b.com"
"##,
        )
        .unwrap();

        match step.action {
            Action::Input { meta, form } => {
                assert!(meta.is_none());
                assert_eq!(form.selector, "#email");
                assert_eq!(form.value, Some(Value::Literal("a@b.com".into())));
                assert!(form.constraints.is_none());
            }
            other => panic!("parsed into {other:?}"),
        }
    }

    #[test]
    fn parses_a_generated_input_with_constraints() {
        let step: Step = serde_yaml::from_str(
            r##"
action:
  type: input
  form:
    selector: "#zip"
    value:
      faker: address.zipCode
    constrains:
      required: true
      regexp: "^[0-9]{5}$"
"##,
        )
        .unwrap();

        match step.action {
            Action::Input { form, .. } => {
                assert_eq!(form.value, Some(Value::Faker { faker: "address.zipCode".into() }));
                let constraints = form.constraints.unwrap();
                assert!(constraints.required);
                assert_eq!(constraints.regexp.as_deref(), Some("^[0-9]{5}$"));
            }
            other => panic!("parsed into {other:?}"),
        }
    }

    #[test]
    fn click_flags_use_camel_case_and_default_off() {
        let step: Step = serde_yaml::from_str(
            r##"
action:
  type: click
  selector: "#submit"
  navigation: true
  avoidClear: true
"##,
        )
        .unwrap();

        match step.action {
            Action::Click { selector, navigation, avoid_clear, emulate_mouse, .. } => {
                assert_eq!(selector, "#submit");
                assert!(navigation);
                assert!(avoid_clear);
                assert!(!emulate_mouse);
            }
            other => panic!("parsed into {other:?}"),
        }
    }

    #[test]
    fn select_keeps_the_wire_spelling_of_constrains() {
        let step: Step = serde_yaml::from_str(
            r##"
action:
  type: select
  form:
    selector: "#prefecture"
    constrains:
      required: true
      values: [Tokyo, Osaka, 13]
"##,
        )
        .unwrap();

        match step.action {
            Action::Select { form, .. } => {
                assert!(form.constraints.required);
                assert_eq!(form.constraints.values.len(), 3);
                assert_eq!(form.constraints.values[0], "Tokyo");
                assert_eq!(form.constraints.values[2], 13);
            }
            other => panic!("parsed into {other:?}"),
        }
    }

    #[test]
    fn clear_carries_its_target_selector() {
        let step: Step = serde_yaml::from_str(
            r##"
action:
  type: clear
  selector: "#email"
"##,
        )
        .unwrap();

        match step.action {
            Action::Clear { meta, selector } => {
                assert!(meta.is_none());
                assert_eq!(selector, "#email");
            }
            other => panic!("parsed into {other:?}"),
        }

        // A selector-less clear is malformed.
        let result: Result<Step, _> = serde_yaml::from_str("action:\n  type: clear\n");
        assert!(result.is_err());
    }

    #[test]
    fn radio_addresses_its_group_by_selector() {
        let step: Step = serde_yaml::from_str(
            r##"
action:
  type: radio
  form:
    selector: "input[name='plan']"
    constrains:
      required: true
    value: premium
"##,
        )
        .unwrap();

        match step.action {
            Action::Radio { form, .. } => {
                assert_eq!(form.selector, "input[name='plan']");
                assert!(form.constraints.unwrap().required);
                assert_eq!(form.value, "premium");
            }
            other => panic!("parsed into {other:?}"),
        }
    }

    #[test]
    fn screenshot_full_page_is_camel_cased() {
        let step: Step = serde_yaml::from_str(
            r#"
action:
  type: screenshot
  name: after-login
  fullPage: true
"#,
        )
        .unwrap();

        match step.action {
            Action::Screenshot { name, full_page, .. } => {
                assert_eq!(name, "after-login");
                assert!(full_page);
            }
            other => panic!("parsed into {other:?}"),
        }
    }

    #[test]
    fn meta_survives_a_round_trip_into_kind_and_back() {
        let step: Step = serde_yaml::from_str(
            r#"
action:
  type: ensure
  meta:
    name: landed
    tag: smoke
  location:
    regexp: "/dashboard$"
"#,
        )
        .unwrap();

        assert_eq!(step.action.kind(), ActionKind::Ensure);
        let meta = step.action.meta().unwrap();
        assert_eq!(meta.name.as_deref(), Some("landed"));
        assert_eq!(meta.tag.as_deref(), Some("smoke"));
    }

    #[test]
    fn unknown_type_tags_fail_at_parse_time() {
        let result: Result<Step, _> = serde_yaml::from_str(
            r##"
action:
  type: teleport
  selector: "#nowhere"
"##,
        );
        assert!(result.is_err());
    }

    #[test]
    fn kind_displays_as_the_wire_tag() {
        assert_eq!(ActionKind::Screenshot.to_string(), "screenshot");
        assert_eq!(Action::Dump { meta: None }.kind().to_string(), "dump");
    }
}
