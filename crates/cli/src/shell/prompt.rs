use nu_ansi_term::Color;
use reedline::{Prompt, PromptEditMode, PromptHistorySearch};
use std::borrow::Cow;

/// `usagescope <title> > `; the title of the open popup, if any.
pub struct DefaultPrompt {
    popup_title: Option<String>,
}

impl DefaultPrompt {
    pub fn new(popup_title: Option<String>) -> Self {
        Self { popup_title }
    }
}

impl Prompt for DefaultPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let prefix = Color::LightBlue.bold().paint("usagescope");
        match &self.popup_title {
            Some(title) => {
                let title = Color::Yellow.paint(shorten(title, 40));
                Cow::Owned(format!("{} [{}] > ", prefix, title))
            }
            None => Cow::Owned(format!("{} > ", prefix)),
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(".. ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        Cow::Borrowed("(search) ")
    }
}

fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(3)).collect();
    short.push_str("...");
    short
}
