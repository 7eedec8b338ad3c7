//! View derivation
//!
//! Turns the full note set into the ordered list that is displayed, given the
//! active view selector, search text and tag filter. Recomputed from scratch on
//! every snapshot; note counts are expected to stay small.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::models::Note;

/// The active filter context choosing the base note subset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewSelector {
    #[default]
    All,
    Favorites,
    Uncategorized,
    Folder(Uuid),
}

impl ViewSelector {
    /// Whether a note belongs to the base set of this view
    pub fn includes(&self, note: &Note) -> bool {
        match self {
            ViewSelector::All => true,
            ViewSelector::Favorites => note.is_favorite,
            ViewSelector::Uncategorized => note.folder_id.is_none(),
            ViewSelector::Folder(id) => note.folder_id == Some(*id),
        }
    }
}

impl fmt::Display for ViewSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewSelector::All => f.write_str("all"),
            ViewSelector::Favorites => f.write_str("favorites"),
            ViewSelector::Uncategorized => f.write_str("uncategorized"),
            ViewSelector::Folder(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for ViewSelector {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(ViewSelector::All),
            "favorites" => Ok(ViewSelector::Favorites),
            "uncategorized" => Ok(ViewSelector::Uncategorized),
            other => Uuid::parse_str(other).map(ViewSelector::Folder),
        }
    }
}

/// Current view selector plus the search and tag filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub view: ViewSelector,
    pub search: String,
    pub tag_filter: Option<String>,
}

impl ViewState {
    pub fn new(view: ViewSelector) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_filter = Some(tag.into());
        self
    }

    /// Whether a note passes every active filter
    pub fn matches(&self, note: &Note) -> bool {
        if !self.view.includes(note) {
            return false;
        }

        // Whitespace only turns the search on; the raw query is what matches
        if !self.search.trim().is_empty() && !contains_ignore_case(&note.text, &self.search) {
            return false;
        }

        match &self.tag_filter {
            Some(tag) => note.has_tag(tag),
            None => true,
        }
    }
}

/// Filter and order notes for display
///
/// Pinned notes come first; within each group, newest first. The sort is
/// stable, so notes with equal timestamps keep their input order.
pub fn derive<'a, I>(notes: I, state: &ViewState) -> Vec<Note>
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut visible: Vec<Note> = notes
        .into_iter()
        .filter(|note| state.matches(note))
        .cloned()
        .collect();

    visible.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    visible
}

/// Case-insensitive search over the stored body, markup included
fn contains_ignore_case(body: &str, needle: &str) -> bool {
    body.to_lowercase().contains(&needle.to_lowercase())
}

/// Per-view note counts for the sidebar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteCounts {
    pub all: usize,
    pub favorites: usize,
    pub uncategorized: usize,
    pub by_folder: HashMap<Uuid, usize>,
}

impl NoteCounts {
    pub fn from_notes<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Self {
        let mut counts = Self::default();
        for note in notes {
            counts.all += 1;
            if note.is_favorite {
                counts.favorites += 1;
            }
            match note.folder_id {
                Some(id) => *counts.by_folder.entry(id).or_insert(0) += 1,
                None => counts.uncategorized += 1,
            }
        }
        counts
    }

    /// Count shown next to a view in the sidebar
    pub fn for_view(&self, view: &ViewSelector) -> usize {
        match view {
            ViewSelector::All => self.all,
            ViewSelector::Favorites => self.favorites,
            ViewSelector::Uncategorized => self.uncategorized,
            ViewSelector::Folder(id) => self.by_folder.get(id).copied().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn note(text: &str, created_ms: i64, pinned: bool) -> Note {
        let mut note = Note::new(text);
        note.created_at = Utc.timestamp_millis_opt(created_ms).unwrap();
        note.is_pinned = pinned;
        note
    }

    fn ids(notes: &[Note]) -> Vec<Uuid> {
        notes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_pinned_first_then_newest() {
        let milk = note("buy milk", 100, false);
        let mom = note("call mom", 50, true);
        let notes = vec![milk.clone(), mom.clone()];

        let visible = derive(&notes, &ViewState::default());
        assert_eq!(ids(&visible), vec![mom.id, milk.id]);
    }

    #[test]
    fn test_search_filters_body() {
        let milk = note("buy milk", 100, false);
        let mom = note("call mom", 50, true);
        let notes = vec![milk.clone(), mom];

        let visible = derive(&notes, &ViewState::default().with_search("milk"));
        assert_eq!(ids(&visible), vec![milk.id]);
    }

    #[test]
    fn test_search_matches_raw_body_case_insensitive() {
        let bold = note("<p><strong>bold</strong> idea</p>", 100, false);
        let milk = note("buy milk", 50, false);
        let notes = vec![bold.clone(), milk.clone()];

        let visible = derive(&notes, &ViewState::default().with_search("mILk"));
        assert_eq!(ids(&visible), vec![milk.id]);

        // Markup is part of the searched text
        let visible = derive(&notes, &ViewState::default().with_search("strong"));
        assert_eq!(ids(&visible), vec![bold.id]);

        // The query is not trimmed once search is active
        assert!(derive(&notes, &ViewState::default().with_search("milk ")).is_empty());
        assert!(derive(&notes, &ViewState::default().with_search(" bold")).is_empty());

        // Whitespace-only search is no filter
        assert_eq!(derive(&notes, &ViewState::default().with_search("   ")).len(), 2);
    }

    #[test]
    fn test_favorites_view() {
        let milk = note("buy milk", 100, false);
        let mut mom = note("call mom", 50, true);
        mom.is_favorite = true;
        let notes = vec![milk, mom.clone()];

        let visible = derive(&notes, &ViewState::new(ViewSelector::Favorites));
        assert_eq!(ids(&visible), vec![mom.id]);
    }

    #[test]
    fn test_folder_and_uncategorized_views() {
        let folder = Uuid::new_v4();
        let mut filed = note("filed", 100, false);
        filed.folder_id = Some(folder);
        let loose = note("loose", 50, false);
        let mut dangling = note("dangling", 10, false);
        dangling.folder_id = Some(Uuid::new_v4());
        let notes = vec![filed.clone(), loose.clone(), dangling];

        let visible = derive(&notes, &ViewState::new(ViewSelector::Folder(folder)));
        assert_eq!(ids(&visible), vec![filed.id]);

        let visible = derive(&notes, &ViewState::new(ViewSelector::Uncategorized));
        assert_eq!(ids(&visible), vec![loose.id]);
    }

    #[test]
    fn test_tag_filter() {
        let mut tagged = note("a", 100, false);
        tagged.add_tag("work");
        let notes = vec![tagged.clone(), note("b", 50, false)];

        let visible = derive(&notes, &ViewState::default().with_tag("work"));
        assert_eq!(ids(&visible), vec![tagged.id]);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let folder = Uuid::new_v4();
        let mut all_match = note("project plan", 100, false);
        all_match.folder_id = Some(folder);
        all_match.add_tag("work");

        let mut wrong_tag = all_match.clone();
        wrong_tag.id = Uuid::new_v4();
        wrong_tag.tags = vec!["home".to_string()];

        let mut wrong_text = all_match.clone();
        wrong_text.id = Uuid::new_v4();
        wrong_text.text = "grocery list".to_string();

        let mut wrong_folder = all_match.clone();
        wrong_folder.id = Uuid::new_v4();
        wrong_folder.folder_id = None;

        let notes = vec![
            wrong_tag,
            all_match.clone(),
            wrong_text,
            wrong_folder,
        ];
        let state = ViewState::new(ViewSelector::Folder(folder))
            .with_search("plan")
            .with_tag("work");

        let visible = derive(&notes, &state);
        assert_eq!(ids(&visible), vec![all_match.id]);
        assert!(visible.iter().all(|n| state.matches(n)));
    }

    #[test]
    fn test_ordering_properties() {
        let notes: Vec<Note> = (0..20)
            .map(|i| note(&format!("n{}", i), (i * 37 % 11) as i64, i % 3 == 0))
            .collect();

        let visible = derive(&notes, &ViewState::default());
        assert_eq!(visible.len(), notes.len());

        for pair in visible.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            // Pinned never after unpinned
            assert!(a.is_pinned || !b.is_pinned);
            if a.is_pinned == b.is_pinned {
                assert!(a.created_at >= b.created_at);
            }
        }
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let first = note("first", 100, false);
        let second = note("second", 100, false);
        let notes = vec![first.clone(), second.clone()];

        let visible = derive(&notes, &ViewState::default());
        assert_eq!(ids(&visible), vec![first.id, second.id]);
    }

    #[test]
    fn test_view_selector_parse() {
        let id = Uuid::new_v4();
        assert_eq!("all".parse::<ViewSelector>().unwrap(), ViewSelector::All);
        assert_eq!(
            "favorites".parse::<ViewSelector>().unwrap(),
            ViewSelector::Favorites
        );
        assert_eq!(
            "uncategorized".parse::<ViewSelector>().unwrap(),
            ViewSelector::Uncategorized
        );
        assert_eq!(
            id.to_string().parse::<ViewSelector>().unwrap(),
            ViewSelector::Folder(id)
        );
        assert!("bogus".parse::<ViewSelector>().is_err());
        assert_eq!(ViewSelector::Folder(id).to_string(), id.to_string());
    }

    #[test]
    fn test_note_counts() {
        let folder = Uuid::new_v4();
        let mut a = note("a", 1, false);
        a.folder_id = Some(folder);
        a.is_favorite = true;
        let mut b = note("b", 2, false);
        b.folder_id = Some(folder);
        let c = note("c", 3, false);

        let counts = NoteCounts::from_notes(&[a, b, c]);
        assert_eq!(counts.all, 3);
        assert_eq!(counts.favorites, 1);
        assert_eq!(counts.uncategorized, 1);
        assert_eq!(counts.for_view(&ViewSelector::Folder(folder)), 2);
        assert_eq!(counts.for_view(&ViewSelector::Folder(Uuid::new_v4())), 0);
    }
}
