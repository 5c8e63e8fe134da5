use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSpan {
    pub text: String,
    pub emphasized: bool,
}

impl TitleSpan {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: false,
        }
    }

    fn emphasized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasized: true,
        }
    }
}

/// Popup caption made of plain and emphasized runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Title {
    pub spans: Vec<TitleSpan>,
}

impl Title {
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text.chars().count()).sum()
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for span in &self.spans {
            f.write_str(&span.text)?;
        }
        Ok(())
    }
}

pub fn usages_count(count: usize) -> String {
    if count == 1 {
        "1 usage".to_string()
    } else {
        format!("{count} usages")
    }
}

/// Caption for the current state of a session.
///
/// `usage_count` is the number of accepted usages; `shown` the number of
/// displayed nodes. Both exclude the "more usages" marker.
pub fn full_title(
    title: &str,
    usage_count: usize,
    shown: usize,
    truncated: bool,
    in_progress: bool,
) -> Title {
    let so_far = if in_progress { " so far" } else { "" };
    if truncated {
        Title {
            spans: vec![
                TitleSpan::emphasized("Some"),
                TitleSpan::plain(format!(" {title} ")),
                TitleSpan::emphasized(format!("(Only {shown} usages shown{so_far})")),
            ],
        }
    } else {
        Title {
            spans: vec![TitleSpan::plain(format!(
                "{title} ({}{so_far})",
                usages_count(usage_count)
            ))],
        }
    }
}
