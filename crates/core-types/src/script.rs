//! Steps, commands, and scripts.

use serde::{Deserialize, Serialize};

use crate::query::StepElement;
use crate::selection::SelectionSet;

/// Action to perform against the elements of one step.
///
/// Stored scripts tag commands with their display names. A tag this build
/// does not know deserializes to [`Command::Unknown`] so that loading never
/// fails on it; executing such a step reports an unknown command instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "commandType")]
pub enum Command {
    #[serde(rename = "Click")]
    Click,

    #[serde(rename = "Input Text")]
    InputText {
        #[serde(default)]
        text: String,
    },

    #[serde(rename = "Open Link")]
    OpenLink {
        #[serde(
            rename = "scriptName",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        script_name: Option<String>,
    },

    #[serde(other)]
    Unknown,
}

impl Command {
    pub fn input_text(text: impl Into<String>) -> Self {
        Command::InputText { text: text.into() }
    }

    pub fn open_link(script_name: Option<String>) -> Self {
        Command::OpenLink { script_name }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Click => "Click",
            Command::InputText { .. } => "Input Text",
            Command::OpenLink { .. } => "Open Link",
            Command::Unknown => "Unknown",
        }
    }
}

/// One recorded step. Either half may still be missing while the user edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<StepElement>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,

    /// Facets the element was synthesized from, kept for re-editing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionSet>,
}

impl Step {
    pub fn new(element: StepElement, command: Command) -> Self {
        Self {
            element: Some(element),
            command: Some(command),
            selection: None,
        }
    }

    /// Both halves present, the element has at least one descriptor, the
    /// command is a known one, and an input command carries some text.
    pub fn is_executable(&self) -> bool {
        match (&self.element, &self.command) {
            (Some(element), _) if element.is_empty() => false,
            (Some(_), Some(Command::Unknown)) => false,
            (Some(_), Some(Command::InputText { text })) => !text.is_empty(),
            (Some(_), Some(_)) => true,
            _ => false,
        }
    }
}

/// A named, ordered list of steps recorded on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            steps: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn can_execute(&self) -> bool {
        self.steps.iter().all(Step::is_executable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryDescriptor;
    use serde_json::json;

    fn element() -> StepElement {
        StepElement::new(vec![QueryDescriptor::by_id("search")])
    }

    #[test]
    fn command_tags_use_display_names() {
        assert_eq!(
            serde_json::to_value(Command::input_text("hello")).unwrap(),
            json!({"commandType": "Input Text", "text": "hello"})
        );
        assert_eq!(
            serde_json::to_value(Command::open_link(None)).unwrap(),
            json!({"commandType": "Open Link"})
        );
        assert_eq!(
            serde_json::to_value(Command::Click).unwrap(),
            json!({"commandType": "Click"})
        );
    }

    #[test]
    fn unrecognised_command_loads_as_unknown() {
        let command: Command =
            serde_json::from_value(json!({"commandType": "Hover", "delay": 3})).unwrap();
        assert_eq!(command, Command::Unknown);
    }

    #[test]
    fn empty_input_text_is_not_executable() {
        let step = Step::new(element(), Command::input_text(""));
        assert!(!step.is_executable());

        let script = Script::new("demo", "https://example.com").with_step(step);
        assert!(!script.can_execute());
    }

    #[test]
    fn missing_halves_are_not_executable() {
        let no_command = Step {
            element: Some(element()),
            ..Step::default()
        };
        let no_element = Step {
            command: Some(Command::Click),
            ..Step::default()
        };
        assert!(!no_command.is_executable());
        assert!(!no_element.is_executable());
        assert!(Step::new(element(), Command::Click).is_executable());
    }

    #[test]
    fn element_without_descriptors_is_not_executable() {
        let step = Step::new(StepElement::new(Vec::new()), Command::Click);
        assert!(!step.is_executable());

        let script = Script::new("demo", "https://example.com").with_step(step);
        assert!(!script.can_execute());
    }

    #[test]
    fn unknown_command_is_not_executable() {
        let step: Step = serde_json::from_value(json!({
            "element": {"selectors": [{"searchAPI": "getElementById", "queryString": "search"}]},
            "command": {"commandType": "Hover"}
        }))
        .unwrap();
        assert_eq!(step.command, Some(Command::Unknown));
        assert!(!step.is_executable());
    }

    #[test]
    fn empty_script_can_execute() {
        assert!(Script::new("empty", "https://example.com").can_execute());
    }

    #[test]
    fn script_survives_json() {
        let script = Script::new("search", "https://example.com/")
            .with_step(Step::new(element(), Command::input_text("rust")))
            .with_step(Step::new(
                StepElement::new(vec![
                    QueryDescriptor::css("a.result"),
                    QueryDescriptor::text("Docs"),
                ]),
                Command::open_link(Some("docs-crawl".into())),
            ));

        let raw = serde_json::to_string(&script).unwrap();
        let parsed: Script = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, script);
    }
}
