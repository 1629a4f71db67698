use crate::error::ActionError;
use crate::keys::normalize_key_name;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Click,
    Drag,
    TypeText,
    KeyPress,
    Screenshot,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Move,
        ActionKind::Click,
        ActionKind::Drag,
        ActionKind::TypeText,
        ActionKind::KeyPress,
        ActionKind::Screenshot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Move => "move",
            ActionKind::Click => "click",
            ActionKind::Drag => "drag",
            ActionKind::TypeText => "type_text",
            ActionKind::KeyPress => "key_press",
            ActionKind::Screenshot => "screenshot",
        }
    }

    /// Whether the action drives pointer or keyboard state (everything but screenshots).
    pub fn injects_input(self) -> bool {
        !matches!(self, ActionKind::Screenshot)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ActionError;

    // The second spelling of each kind is the Anthropic computer-tool vocabulary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "move" | "mouse_move" => Ok(ActionKind::Move),
            "click" | "left_click" => Ok(ActionKind::Click),
            "drag" | "left_click_drag" => Ok(ActionKind::Drag),
            "type_text" | "type" => Ok(ActionKind::TypeText),
            "key_press" | "key" => Ok(ActionKind::KeyPress),
            "screenshot" => Ok(ActionKind::Screenshot),
            other => Err(ActionError::Unsupported { kind: other.into() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Raw, unvalidated arguments of one tool-use request.
///
/// `text` and `coordinate` stay as JSON so that wrongly typed values reach
/// validation instead of failing deserialization. JSON `null` counts as absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionArgs {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Value>,
}

impl ActionArgs {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            text: None,
            coordinate: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<Value>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_coordinate(mut self, coordinate: impl Into<Value>) -> Self {
        self.coordinate = Some(coordinate.into());
        self
    }

    /// Reads the arguments out of a tool-use `input` object.
    pub fn from_input(input: &Value) -> Result<Self, ActionError> {
        let obj = input
            .as_object()
            .ok_or_else(|| ActionError::MalformedInput(format!("expected an object, got {input}")))?;

        let action = match obj.get("action") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => {
                return Err(ActionError::MalformedInput("missing field 'action'".into()));
            }
            Some(other) => {
                return Err(ActionError::MalformedInput(format!(
                    "field 'action' must be a string, got {other}"
                )));
            }
        };

        Ok(Self {
            action,
            text: obj.get("text").cloned(),
            coordinate: obj.get("coordinate").cloned(),
        })
    }
}

/// A validated action. Each variant carries exactly the fields its kind accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Move { coordinate: Coordinate },
    Click,
    Drag { coordinate: Coordinate },
    TypeText { text: String },
    /// `key` is already normalized (see [`normalize_key_name`]).
    KeyPress { key: String },
    Screenshot,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Click => ActionKind::Click,
            Action::Drag { .. } => ActionKind::Drag,
            Action::TypeText { .. } => ActionKind::TypeText,
            Action::KeyPress { .. } => ActionKind::KeyPress,
            Action::Screenshot => ActionKind::Screenshot,
        }
    }

    /// Validates raw arguments against the per-kind rules.
    pub fn from_args(args: &ActionArgs) -> Result<Self, ActionError> {
        let kind: ActionKind = args.action.parse()?;
        let text = present(&args.text);
        let coordinate = present(&args.coordinate);

        match kind {
            ActionKind::Move | ActionKind::Drag => {
                let raw = coordinate.ok_or_else(|| ActionError::required(kind, "coordinate"))?;
                if text.is_some() {
                    return Err(ActionError::not_accepted(kind, "text"));
                }
                let coordinate = parse_coordinate(raw).ok_or_else(|| {
                    ActionError::invalid(
                        kind,
                        "coordinate",
                        format!("must be a pair of non-negative integers, got {raw}"),
                    )
                })?;

                Ok(if kind == ActionKind::Move {
                    Action::Move { coordinate }
                } else {
                    Action::Drag { coordinate }
                })
            }
            ActionKind::TypeText | ActionKind::KeyPress => {
                if coordinate.is_some() {
                    return Err(ActionError::not_accepted(kind, "coordinate"));
                }
                let raw = text.ok_or_else(|| ActionError::required(kind, "text"))?;
                let text = raw.as_str().ok_or_else(|| {
                    ActionError::invalid(kind, "text", format!("must be a string, got {raw}"))
                })?;

                if kind == ActionKind::TypeText {
                    return Ok(Action::TypeText { text: text.to_string() });
                }
                if text.trim().is_empty() {
                    return Err(ActionError::invalid(kind, "text", "must name a key".into()));
                }
                Ok(Action::KeyPress {
                    key: normalize_key_name(text),
                })
            }
            ActionKind::Click | ActionKind::Screenshot => {
                if text.is_some() {
                    return Err(ActionError::not_accepted(kind, "text"));
                }
                if coordinate.is_some() {
                    return Err(ActionError::not_accepted(kind, "coordinate"));
                }
                Ok(if kind == ActionKind::Click {
                    Action::Click
                } else {
                    Action::Screenshot
                })
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { coordinate } => write!(f, "move{coordinate}"),
            Action::Click => write!(f, "click()"),
            Action::Drag { coordinate } => write!(f, "drag{coordinate}"),
            Action::TypeText { text } => write!(f, "type_text({} chars)", text.chars().count()),
            Action::KeyPress { key } => write!(f, "key_press({key:?})"),
            Action::Screenshot => write!(f, "screenshot()"),
        }
    }
}

fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

fn coordinate_string_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Some models send the pair as a string, e.g. "[640, 400]".
        Regex::new(r"^\s*\[?\s*(\d+)\s*,\s*(\d+)\s*\]?\s*$").expect("valid coordinate regex")
    })
}

fn parse_coordinate(raw: &Value) -> Option<Coordinate> {
    match raw {
        Value::Array(items) if items.len() == 2 => {
            let x = u32::try_from(items[0].as_u64()?).ok()?;
            let y = u32::try_from(items[1].as_u64()?).ok()?;
            Some(Coordinate { x, y })
        }
        Value::String(s) => {
            let caps = coordinate_string_re().captures(s)?;
            let x = caps[1].parse().ok()?;
            let y = caps[2].parse().ok()?;
            Some(Coordinate { x, y })
        }
        _ => None,
    }
}
