//! Frame descriptors: the request-scoped description of a card embed.
//!
//! A descriptor is assembled with [`FrameBuilder`] and handed to the markup
//! renderer. Button indices are not stored; they are derived from position at
//! render time, which keeps them dense (`1..=N`) by construction.

use thiserror::Error;

/// Protocol convention: a frame carries at most four buttons.
pub const MAX_BUTTONS: usize = 4;

/// Protocol version advertised in the `fc:frame` tag.
pub const FRAME_VERSION: &str = "vNext";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("a frame supports at most {MAX_BUTTONS} buttons, got {count}")]
    TooManyButtons { count: usize },
    #[error("button {index} has an empty label")]
    EmptyLabel { index: usize },
    #[error("button {index} requires a target url")]
    MissingTarget { index: usize },
}

/// What a button does when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Post back to the frame's `post_url`.
    Navigate,
    /// Open an external URL.
    Link { target: String },
    /// Ask the client to build and submit a transaction.
    Tx { target: String, post_url: String },
}

impl ButtonAction {
    /// Value emitted in the `:action` tag, if any.
    pub fn action_name(&self) -> Option<&'static str> {
        match self {
            ButtonAction::Navigate => None,
            ButtonAction::Link { .. } => Some("link"),
            ButtonAction::Tx { .. } => Some("tx"),
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            ButtonAction::Navigate => None,
            ButtonAction::Link { target } | ButtonAction::Tx { target, .. } => Some(target),
        }
    }

    pub fn callback(&self) -> Option<&str> {
        match self {
            ButtonAction::Tx { post_url, .. } => Some(post_url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpec {
    pub label: String,
    pub action: ButtonAction,
}

impl ButtonSpec {
    pub fn navigate(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Navigate,
        }
    }

    pub fn link(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Link {
                target: target.into(),
            },
        }
    }

    pub fn tx(
        label: impl Into<String>,
        target: impl Into<String>,
        post_url: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Tx {
                target: target.into(),
                post_url: post_url.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub placeholder: String,
}

/// A validated frame ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub title: String,
    pub image_url: String,
    pub description: Option<String>,
    pub post_url: String,
    pub buttons: Vec<ButtonSpec>,
    pub text_input: Option<TextInput>,
}

impl FrameDescriptor {
    pub fn builder(
        title: impl Into<String>,
        image_url: impl Into<String>,
        post_url: impl Into<String>,
    ) -> FrameBuilder {
        FrameBuilder {
            frame: FrameDescriptor {
                title: title.into(),
                image_url: image_url.into(),
                description: None,
                post_url: post_url.into(),
                buttons: Vec::new(),
                text_input: None,
            },
        }
    }

    /// Buttons paired with their 1-based protocol index.
    pub fn indexed_buttons(&self) -> impl Iterator<Item = (usize, &ButtonSpec)> {
        self.buttons
            .iter()
            .enumerate()
            .map(|(position, button)| (position + 1, button))
    }
}

#[derive(Debug, Clone)]
pub struct FrameBuilder {
    frame: FrameDescriptor,
}

impl FrameBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.frame.description = Some(description.into());
        self
    }

    pub fn button(mut self, button: ButtonSpec) -> Self {
        self.frame.buttons.push(button);
        self
    }

    pub fn text_input(mut self, placeholder: impl Into<String>) -> Self {
        self.frame.text_input = Some(TextInput {
            placeholder: placeholder.into(),
        });
        self
    }

    /// The frame without buttons or input; always valid.
    pub fn into_bare(self) -> FrameDescriptor {
        FrameDescriptor {
            buttons: Vec::new(),
            text_input: None,
            ..self.frame
        }
    }

    pub fn build(self) -> Result<FrameDescriptor, FrameError> {
        let count = self.frame.buttons.len();
        if count > MAX_BUTTONS {
            return Err(FrameError::TooManyButtons { count });
        }

        for (index, button) in self.frame.indexed_buttons() {
            if button.label.trim().is_empty() {
                return Err(FrameError::EmptyLabel { index });
            }
            if matches!(button.action.target(), Some(target) if target.trim().is_empty()) {
                return Err(FrameError::MissingTarget { index });
            }
        }

        Ok(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_insertion_order() {
        let frame = FrameDescriptor::builder("t", "https://img", "https://post")
            .button(ButtonSpec::navigate("one"))
            .button(ButtonSpec::link("two", "https://example.com"))
            .button(ButtonSpec::navigate("three"))
            .build()
            .expect("valid frame");

        let indexed: Vec<_> = frame
            .indexed_buttons()
            .map(|(index, button)| (index, button.label.as_str()))
            .collect();
        assert_eq!(indexed, vec![(1, "one"), (2, "two"), (3, "three")]);
    }

    #[test]
    fn rejects_a_fifth_button() {
        let builder = (0..5).fold(
            FrameDescriptor::builder("t", "https://img", "https://post"),
            |builder, n| builder.button(ButtonSpec::navigate(format!("b{n}"))),
        );
        assert_eq!(
            builder.build().unwrap_err(),
            FrameError::TooManyButtons { count: 5 }
        );
    }

    #[test]
    fn link_buttons_need_a_target() {
        let err = FrameDescriptor::builder("t", "https://img", "https://post")
            .button(ButtonSpec::navigate("ok"))
            .button(ButtonSpec::link("broken", "  "))
            .build()
            .unwrap_err();
        assert_eq!(err, FrameError::MissingTarget { index: 2 });
    }

    #[test]
    fn empty_labels_are_rejected() {
        let err = FrameDescriptor::builder("t", "https://img", "https://post")
            .button(ButtonSpec::navigate(""))
            .build()
            .unwrap_err();
        assert_eq!(err, FrameError::EmptyLabel { index: 1 });
    }
}
