//! View tree produced by every `view` function, plus its plain-text renderer.
//!
//! Interactive widgets carry the message they publish, so a frontend can drive the
//! application purely from the rendered tree: look up a button by id and dispatch
//! its message, or feed typed text through an input's handler.

use std::fmt;
use std::sync::Arc;

/// Maximum number of characters of an image source shown by the text renderer.
const IMAGE_SRC_PREVIEW: usize = 48;
const INDENT: &str = "  ";

pub type InputHandler<M> = Arc<dyn Fn(String) -> M + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Normal,
    Muted,
    Success,
    Danger,
}

pub struct Button<M> {
    pub id: &'static str,
    pub label: String,
    /// `None` renders the button disabled
    pub on_press: Option<M>,
}

pub struct TextInput<M> {
    pub id: &'static str,
    pub label: String,
    pub value: String,
    pub on_input: InputHandler<M>,
}

pub enum Element<M> {
    Empty,
    Column(Vec<Element<M>>),
    Row(Vec<Element<M>>),
    Card(Vec<Element<M>>),
    Heading(String),
    Text { content: String, tone: Tone },
    Image { src: Option<String>, alt: String },
    Button(Button<M>),
    TextInput(TextInput<M>),
    Modal { title: String, content: Box<Element<M>> },
}

impl<M> Default for Element<M> {
    fn default() -> Self {
        Self::Empty
    }
}

// Builders
impl<M> Element<M> {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            tone: Tone::Normal,
        }
    }

    pub fn toned(content: impl Into<String>, tone: Tone) -> Self {
        Self::Text {
            content: content.into(),
            tone,
        }
    }

    pub fn heading(content: impl Into<String>) -> Self {
        Self::Heading(content.into())
    }

    pub fn image(src: Option<String>, alt: impl Into<String>) -> Self {
        Self::Image { src, alt: alt.into() }
    }

    pub fn button(id: &'static str, label: impl Into<String>, on_press: Option<M>) -> Self {
        Self::Button(Button {
            id,
            label: label.into(),
            on_press,
        })
    }

    pub fn text_input(
        id: &'static str,
        label: impl Into<String>,
        value: impl Into<String>,
        on_input: impl Fn(String) -> M + Send + Sync + 'static,
    ) -> Self {
        Self::TextInput(TextInput {
            id,
            label: label.into(),
            value: value.into(),
            on_input: Arc::new(on_input),
        })
    }

    pub fn modal(title: impl Into<String>, content: Element<M>) -> Self {
        Self::Modal {
            title: title.into(),
            content: Box::new(content),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn children(&self) -> &[Element<M>] {
        match self {
            Self::Column(children) | Self::Row(children) | Self::Card(children) => children,
            Self::Modal { content, .. } => std::slice::from_ref(content.as_ref()),
            _ => &[],
        }
    }

    /// Depth-first search for the first element matching `predicate`.
    pub fn find(&self, predicate: &impl Fn(&Element<M>) -> bool) -> Option<&Element<M>> {
        if predicate(self) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(predicate))
    }

    pub fn find_button(&self, id: &str) -> Option<&Button<M>> {
        match self.find(&|e: &Element<M>| matches!(e, Element::Button(b) if b.id == id)) {
            Some(Element::Button(button)) => Some(button),
            _ => None,
        }
    }

    pub fn find_input(&self, id: &str) -> Option<&TextInput<M>> {
        match self.find(&|e: &Element<M>| matches!(e, Element::TextInput(i) if i.id == id)) {
            Some(Element::TextInput(input)) => Some(input),
            _ => None,
        }
    }

    /// The open modal, if any. Modals capture all input while open.
    pub fn find_modal(&self) -> Option<&Element<M>> {
        self.find(&|e: &Element<M>| matches!(e, Element::Modal { .. }))
    }

    /// First text input in the tree; inside an open modal this is the focused field.
    pub fn first_input(&self) -> Option<&TextInput<M>> {
        match self.find(&|e: &Element<M>| matches!(e, Element::TextInput(_))) {
            Some(Element::TextInput(input)) => Some(input),
            _ => None,
        }
    }

    /// Ids of every enabled button, in render order.
    pub fn enabled_buttons(&self) -> Vec<&'static str> {
        let mut ids = Vec::new();
        self.collect_buttons(&mut ids);
        ids
    }

    fn collect_buttons(&self, ids: &mut Vec<&'static str>) {
        if let Element::Button(Button { id, on_press: Some(_), .. }) = self {
            ids.push(*id);
        }
        for child in self.children() {
            child.collect_buttons(ids);
        }
    }
}

impl<M: 'static> Element<M> {
    /// Wraps every message of this tree, used to embed a component view in its parent.
    pub fn map<N: 'static>(self, f: impl Fn(M) -> N + Send + Sync + 'static) -> Element<N> {
        let f: Arc<dyn Fn(M) -> N + Send + Sync> = Arc::new(f);
        self.map_with(&f)
    }

    fn map_with<N: 'static>(self, f: &Arc<dyn Fn(M) -> N + Send + Sync>) -> Element<N> {
        let map_all =
            |children: Vec<Element<M>>| -> Vec<Element<N>> { children.into_iter().map(|c| c.map_with(f)).collect() };
        match self {
            Self::Empty => Element::Empty,
            Self::Column(children) => Element::Column(map_all(children)),
            Self::Row(children) => Element::Row(map_all(children)),
            Self::Card(children) => Element::Card(map_all(children)),
            Self::Heading(content) => Element::Heading(content),
            Self::Text { content, tone } => Element::Text { content, tone },
            Self::Image { src, alt } => Element::Image { src, alt },
            Self::Button(Button { id, label, on_press }) => Element::Button(Button {
                id,
                label,
                on_press: on_press.map(|m| (**f)(m)),
            }),
            Self::TextInput(TextInput {
                id,
                label,
                value,
                on_input,
            }) => {
                let f = f.clone();
                Element::TextInput(TextInput {
                    id,
                    label,
                    value,
                    on_input: Arc::new(move |text| (*f)((*on_input)(text))),
                })
            }
            Self::Modal { title, content } => Element::Modal {
                title,
                content: Box::new(content.map_with(f)),
            },
        }
    }
}

impl<M: Clone> Button<M> {
    pub fn press(&self) -> Option<M> {
        self.on_press.clone()
    }
}

impl<M> TextInput<M> {
    pub fn input(&self, text: impl Into<String>) -> M {
        (self.on_input)(text.into())
    }
}

// Text rendering
impl<M> Element<M> {
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        self.render_into(&mut lines, 0);
        lines.join("\n")
    }

    fn render_into(&self, lines: &mut Vec<String>, depth: usize) {
        let pad = INDENT.repeat(depth);
        match self {
            Self::Empty => {}
            Self::Column(children) => {
                for child in children {
                    child.render_into(lines, depth);
                }
            }
            Self::Row(children) => {
                let rendered: Vec<String> = children.iter().filter(|c| !c.is_empty()).map(|c| c.render()).collect();
                if rendered.iter().all(|r| !r.contains('\n')) {
                    if !rendered.is_empty() {
                        lines.push(format!("{pad}{}", rendered.join("  ")));
                    }
                } else {
                    for child in children {
                        child.render_into(lines, depth);
                    }
                }
            }
            Self::Card(children) => {
                lines.push(format!("{pad}+{}", "-".repeat(40)));
                for child in children {
                    child.render_into(lines, depth + 1);
                }
                lines.push(format!("{pad}+{}", "-".repeat(40)));
            }
            Self::Heading(content) => {
                lines.push(format!("{pad}== {content} =="));
            }
            Self::Text { content, tone } => {
                let prefix = match tone {
                    Tone::Normal => "",
                    Tone::Muted => "~ ",
                    Tone::Success => "[ok] ",
                    Tone::Danger => "[error] ",
                };
                lines.push(format!("{pad}{prefix}{content}"));
            }
            Self::Image { src, alt } => {
                let line = match src {
                    Some(src) if src.chars().count() > IMAGE_SRC_PREVIEW => {
                        let head: String = src.chars().take(IMAGE_SRC_PREVIEW).collect();
                        format!("[image: {alt}] {head}... ({} chars)", src.len())
                    }
                    Some(src) => format!("[image: {alt}] {src}"),
                    None => format!("[image: {alt}] (none)"),
                };
                lines.push(format!("{pad}{line}"));
            }
            Self::Button(button) => {
                lines.push(format!("{pad}{button}"));
            }
            Self::TextInput(input) => {
                lines.push(format!("{pad}{}: {}_", input.label, input.value));
            }
            Self::Modal { title, content } => {
                lines.push(format!("{pad}#### {title} ####"));
                content.render_into(lines, depth + 1);
                lines.push(format!("{pad}{}", "#".repeat(title.chars().count() + 10)));
            }
        }
    }
}

impl<M> fmt::Display for Button<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.on_press {
            Some(_) => write!(f, "[:{}] {}", self.id, self.label),
            None => write!(f, "[:{}] {} (disabled)", self.id, self.label),
        }
    }
}
