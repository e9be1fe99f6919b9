//! Modal asking the user for an image URL.
//!
//! The dialog has a single editing state and two ways out: saving a non-empty URL
//! closes it with a [`DialogResult`], cancelling closes it with nothing.

use crate::ui::element::{Element, Tone};

/// Value handed back to whoever opened the dialog.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DialogResult {
    pub success: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    UrlChanged(String),
    Save,
    Cancel,
}

/// Result of processing a dialog message.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Dialog stays open
    None,
    /// Dialog closed, with a result if the user confirmed
    Close(Option<DialogResult>),
}

#[derive(Debug, Default)]
pub struct UrlDialog {
    url: String,
}

impl UrlDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn update(&mut self, message: Message) -> Action {
        match message {
            Message::UrlChanged(url) => {
                self.url = url;
                Action::None
            }
            Message::Save => {
                if self.url.is_empty() {
                    return Action::None;
                }
                Action::Close(Some(DialogResult {
                    success: true,
                    url: self.url.clone(),
                }))
            }
            Message::Cancel => Action::Close(None),
        }
    }

    pub fn view(&self) -> Element<Message> {
        Element::Column(vec![
            Element::text_input("url", "Image URL", self.url.clone(), Message::UrlChanged),
            Element::toned("Type the address of an image, then save.", Tone::Muted),
            Element::Row(vec![
                Element::button("save", "Save", Some(Message::Save)),
                Element::button("cancel", "Cancel", Some(Message::Cancel)),
            ]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(url: &str) -> UrlDialog {
        let mut dialog = UrlDialog::new();
        assert_eq!(dialog.update(Message::UrlChanged(url.to_string())), Action::None);
        dialog
    }

    #[test]
    fn starts_empty() {
        assert_eq!(UrlDialog::new().url(), "");
    }

    #[test]
    fn saving_a_url_returns_it() {
        let mut dialog = typed("http://example.com");
        assert_eq!(
            dialog.update(Message::Save),
            Action::Close(Some(DialogResult {
                success: true,
                url: "http://example.com".to_string(),
            }))
        );
    }

    #[test]
    fn saving_empty_text_keeps_the_dialog_open() {
        let mut dialog = UrlDialog::new();
        assert_eq!(dialog.update(Message::Save), Action::None);

        let mut cleared = typed("http://example.com");
        cleared.update(Message::UrlChanged(String::new()));
        assert_eq!(cleared.update(Message::Save), Action::None);
    }

    #[test]
    fn cancel_returns_nothing_whatever_was_typed() {
        assert_eq!(UrlDialog::new().update(Message::Cancel), Action::Close(None));
        assert_eq!(typed("http://example.com").update(Message::Cancel), Action::Close(None));
    }

    #[test]
    fn result_serializes_like_the_web_payload() {
        let result = DialogResult {
            success: true,
            url: "http://example.com".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"success":true,"url":"http://example.com"}"#
        );
    }

    #[test]
    fn view_binds_input_and_buttons() {
        let view = typed("http://a").view();
        assert_eq!(view.find_input("url").unwrap().value, "http://a");
        assert_eq!(view.find_button("save").and_then(|b| b.press()), Some(Message::Save));
        assert_eq!(view.find_button("cancel").and_then(|b| b.press()), Some(Message::Cancel));
    }
}
