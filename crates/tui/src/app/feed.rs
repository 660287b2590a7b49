use olla_core::diag::{Diagnostic, Level};
use olla_core::session::TurnSink;

/// What a chat feed line represents. The feed is display state; the transcript
/// lives in the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedKind {
    User,
    Assistant,
    /// Assistant reply still streaming.
    Pending { model: String },
    Notice(Level),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: u64,
    pub kind: FeedKind,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct Feed {
    entries: Vec<FeedEntry>,
    next_id: u64,
}

impl Feed {
    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    /// Append an entry and return its index.
    pub fn push(&mut self, kind: FeedKind, content: impl Into<String>) -> usize {
        self.next_id += 1;
        self.entries.push(FeedEntry {
            id: self.next_id,
            kind,
            content: content.into(),
        });
        self.entries.len() - 1
    }

    pub fn push_notice(&mut self, d: Diagnostic) -> usize {
        self.push(FeedKind::Notice(d.level), d.text)
    }

    pub fn set_content(&mut self, index: usize, content: &str) {
        if let Some(e) = self.entries.get_mut(index) {
            e.content.clear();
            e.content.push_str(content);
        }
    }

    /// Turn the entry at `index` into a settled assistant message.
    pub fn settle(&mut self, index: usize, content: String) {
        if let Some(e) = self.entries.get_mut(index) {
            e.kind = FeedKind::Assistant;
            e.content = content;
        }
    }

    pub fn remove(&mut self, index: usize) {
        if index < self.entries.len() {
            self.entries.remove(index);
        }
    }
}

/// Feeds one streaming turn into its pending entry.
pub struct LiveView<'a> {
    pub feed: &'a mut Feed,
    pub index: usize,
}

impl TurnSink for LiveView<'_> {
    fn on_partial(&mut self, accumulated: &str) {
        self.feed.set_content(self.index, accumulated);
    }

    fn on_diagnostic(&mut self, diag: Diagnostic) {
        self.feed.push_notice(diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_across_removal() {
        let mut feed = Feed::default();
        let a = feed.push(FeedKind::User, "hi");
        let b = feed.push(
            FeedKind::Pending {
                model: "m".into(),
            },
            "",
        );
        feed.remove(b);
        let c = feed.push(FeedKind::Notice(Level::Error), "oops");
        assert_eq!(a, 0);
        assert_eq!(c, 1);
        assert_ne!(feed.entries()[0].id, feed.entries()[1].id);
        assert_eq!(feed.entries()[1].id, 3);
    }

    #[test]
    fn live_view_tracks_accumulator() {
        let mut feed = Feed::default();
        let idx = feed.push(
            FeedKind::Pending {
                model: "m".into(),
            },
            "",
        );
        let mut view = LiveView {
            feed: &mut feed,
            index: idx,
        };
        view.on_partial("Hi");
        view.on_partial("Hi there");
        view.on_diagnostic(Diagnostic::warning("skipped"));
        assert_eq!(feed.entries()[idx].content, "Hi there");
        assert_eq!(feed.entries().len(), 2);

        feed.settle(idx, "Hi there".into());
        assert_eq!(feed.entries()[idx].kind, FeedKind::Assistant);
    }
}
