//! # Quick-Reply Keyboard
//!
//! A structured description of rows of labeled buttons. Construction is data,
//! not behavior: composers build this model and only the VK client serializes
//! it into the wire JSON at send time.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    pub one_time: bool,
    pub buttons: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(one_time: bool) -> Self {
        Self {
            one_time,
            buttons: Vec::new(),
        }
    }

    pub fn row(mut self, row: Vec<Button>) -> Self {
        self.buttons.push(row);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub action: ButtonAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ButtonColor>,
}

impl Button {
    pub fn text(label: impl Into<String>, color: ButtonColor) -> Self {
        Self {
            action: ButtonAction::Text {
                label: label.into(),
            },
            color: Some(color),
        }
    }

    /// Link buttons carry no color on the wire.
    pub fn link(link: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action: ButtonAction::OpenLink {
                link: link.into(),
                label: label.into(),
            },
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ButtonAction {
    Text { label: String },
    OpenLink { link: String, label: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonColor {
    Primary,
    Secondary,
    Positive,
    Negative,
}
