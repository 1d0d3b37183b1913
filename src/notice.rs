//! One-shot operator notifications raised by the flows.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// A toast-style message: a short title plus a description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, title: title.into(), description: description.into() }
    }

    /// Failure notices always carry the title `Error`.
    #[must_use]
    pub fn failure(description: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Failure, title: "Error".to_owned(), description: description.into() }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }
}
