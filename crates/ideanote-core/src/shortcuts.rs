//! Keyboard shortcut dispatch
//!
//! A `ShortcutMap` maps key chords to actions. Dispatch picks the first
//! registered chord that matches a key press. While focus is in a text input,
//! only the cancel chord (Escape) is considered, so typing never triggers
//! commands.

use std::fmt;

/// A key, independent of modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

impl Key {
    /// Same key, ignoring letter case
    fn matches(self, other: Key) -> bool {
        match (self, other) {
            (Key::Char(a), Key::Char(b)) => a.to_lowercase().eq(b.to_lowercase()),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(' ') => f.write_str("Space"),
            Key::Char(c) => write!(f, "{}", c),
            Key::Escape => f.write_str("Esc"),
            Key::Enter => f.write_str("Enter"),
            Key::Tab => f.write_str("Tab"),
            Key::BackTab => f.write_str("Shift+Tab"),
            Key::Backspace => f.write_str("Backspace"),
            Key::Delete => f.write_str("Del"),
            Key::Up => f.write_str("↑"),
            Key::Down => f.write_str("↓"),
            Key::Left => f.write_str("←"),
            Key::Right => f.write_str("→"),
            Key::Home => f.write_str("Home"),
            Key::End => f.write_str("End"),
            Key::PageUp => f.write_str("PgUp"),
            Key::PageDown => f.write_str("PgDn"),
        }
    }
}

/// A registered key combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: Key,
    /// Satisfied by either Ctrl or Meta
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub const fn ctrl(key: Key) -> Self {
        Self {
            key,
            ctrl: true,
            shift: false,
            alt: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// The chord that closes whatever is open
    pub const CANCEL: KeyChord = KeyChord::new(Key::Escape);

    pub fn matches(&self, press: &KeyPress) -> bool {
        let ctrl_pressed = press.ctrl || press.meta;
        self.key.matches(press.key)
            && self.ctrl == ctrl_pressed
            && self.shift == press.shift
            && self.alt == press.alt
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.alt {
            f.write_str("Alt+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// A key event as delivered by the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::new(key)
        }
    }
}

/// Where keyboard focus currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Normal,
    /// A text field or editable region
    TextInput,
}

/// Outcome of dispatching a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch<A> {
    /// A shortcut matched; default handling of the key is suppressed
    Handled(A),
    /// No shortcut matched; the key goes to the focused widget
    Passthrough,
}

/// A registered shortcut
#[derive(Debug, Clone)]
pub struct Shortcut<A> {
    pub chord: KeyChord,
    pub action: A,
    pub description: &'static str,
}

/// Ordered key chord → action bindings
#[derive(Debug, Clone)]
pub struct ShortcutMap<A> {
    shortcuts: Vec<Shortcut<A>>,
    enabled: bool,
}

impl<A> Default for ShortcutMap<A> {
    fn default() -> Self {
        Self {
            shortcuts: Vec::new(),
            enabled: true,
        }
    }
}

impl<A: Copy> ShortcutMap<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shortcut; earlier registrations win on conflicts
    pub fn bind(&mut self, chord: KeyChord, action: A, description: &'static str) -> &mut Self {
        self.shortcuts.push(Shortcut {
            chord,
            action,
            description,
        });
        self
    }

    pub fn dispatch(&self, press: &KeyPress, focus: Focus) -> Dispatch<A> {
        if !self.enabled {
            return Dispatch::Passthrough;
        }

        self.shortcuts
            .iter()
            .filter(|s| focus != Focus::TextInput || s.chord == KeyChord::CANCEL)
            .find(|s| s.chord.matches(press))
            .map(|s| Dispatch::Handled(s.action))
            .unwrap_or(Dispatch::Passthrough)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn shortcuts(&self) -> &[Shortcut<A>] {
        &self.shortcuts
    }
}

/// Panels that can sit on top of the note list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Form,
    Search,
    TagFilter,
}

/// Which overlays are open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overlays {
    pub form: bool,
    pub search: bool,
    pub tag_filter: bool,
}

impl Overlays {
    /// Close the topmost open overlay: form, then search, then tag filter
    pub fn close_topmost(&mut self) -> Option<Overlay> {
        if self.form {
            self.form = false;
            Some(Overlay::Form)
        } else if self.search {
            self.search = false;
            Some(Overlay::Search)
        } else if self.tag_filter {
            self.tag_filter = false;
            Some(Overlay::TagFilter)
        } else {
            None
        }
    }

    pub fn any_open(&self) -> bool {
        self.form || self.search || self.tag_filter
    }
}

/// Application commands reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NewNote,
    FocusSearch,
    Cancel,
    EditNote,
    DeleteNote,
    TogglePin,
    ToggleFavorite,
    MoveNote,
    CycleColor,
    TagFilter,
    NewFolder,
    DeleteFolder,
    ToggleTheme,
    NextView,
    PrevView,
    SelectNext,
    SelectPrev,
    Help,
    Quit,
}

/// The application's key bindings
pub fn default_shortcuts() -> ShortcutMap<Action> {
    let mut map = ShortcutMap::new();
    map.bind(KeyChord::ctrl(Key::Char('n')), Action::NewNote, "New note")
        .bind(KeyChord::ctrl(Key::Char('f')), Action::FocusSearch, "Search")
        .bind(KeyChord::CANCEL, Action::Cancel, "Close / cancel")
        .bind(KeyChord::new(Key::Char('/')), Action::FocusSearch, "Search")
        .bind(KeyChord::new(Key::Char('a')), Action::NewNote, "New note")
        .bind(KeyChord::new(Key::Char('e')), Action::EditNote, "Edit note")
        .bind(KeyChord::new(Key::Enter), Action::EditNote, "Edit note")
        .bind(KeyChord::new(Key::Char('d')), Action::DeleteNote, "Delete note")
        .bind(KeyChord::new(Key::Char('p')), Action::TogglePin, "Pin / unpin")
        .bind(KeyChord::new(Key::Char('s')), Action::ToggleFavorite, "Favorite")
        .bind(KeyChord::new(Key::Char('m')), Action::MoveNote, "Move to folder")
        .bind(KeyChord::new(Key::Char('c')), Action::CycleColor, "Next color")
        .bind(KeyChord::new(Key::Char('t')), Action::TagFilter, "Filter by tag")
        .bind(KeyChord::new(Key::Char('f')), Action::NewFolder, "New folder")
        .bind(KeyChord::new(Key::Char('x')), Action::DeleteFolder, "Delete folder")
        .bind(KeyChord::new(Key::Char('T')).with_shift(), Action::ToggleTheme, "Toggle theme")
        .bind(KeyChord::new(Key::Tab), Action::NextView, "Next view")
        .bind(KeyChord::new(Key::BackTab), Action::PrevView, "Previous view")
        .bind(KeyChord::new(Key::Char('j')), Action::SelectNext, "Down")
        .bind(KeyChord::new(Key::Down), Action::SelectNext, "Down")
        .bind(KeyChord::new(Key::Char('k')), Action::SelectPrev, "Up")
        .bind(KeyChord::new(Key::Up), Action::SelectPrev, "Up")
        .bind(KeyChord::new(Key::Char('?')), Action::Help, "Help")
        .bind(KeyChord::new(Key::Char('q')), Action::Quit, "Quit");
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_matches_ctrl_or_meta() {
        let map = default_shortcuts();

        assert_eq!(
            map.dispatch(&KeyPress::ctrl(Key::Char('n')), Focus::Normal),
            Dispatch::Handled(Action::NewNote)
        );

        let mut meta = KeyPress::new(Key::Char('n'));
        meta.meta = true;
        assert_eq!(
            map.dispatch(&meta, Focus::Normal),
            Dispatch::Handled(Action::NewNote)
        );
    }

    #[test]
    fn test_plain_chord_rejects_ctrl() {
        let mut map = ShortcutMap::new();
        map.bind(KeyChord::new(Key::Char('p')), Action::TogglePin, "Pin");

        assert_eq!(
            map.dispatch(&KeyPress::ctrl(Key::Char('p')), Focus::Normal),
            Dispatch::Passthrough
        );
        assert_eq!(
            map.dispatch(&KeyPress::new(Key::Char('p')), Focus::Normal),
            Dispatch::Handled(Action::TogglePin)
        );
    }

    #[test]
    fn test_case_insensitive_keys() {
        let mut map = ShortcutMap::new();
        map.bind(KeyChord::ctrl(Key::Char('f')), Action::FocusSearch, "Search");

        assert_eq!(
            map.dispatch(&KeyPress::ctrl(Key::Char('F')), Focus::Normal),
            Dispatch::Handled(Action::FocusSearch)
        );
    }

    #[test]
    fn test_shift_and_alt_must_match() {
        let map = default_shortcuts();

        let mut shifted = KeyPress::new(Key::Char('T'));
        shifted.shift = true;
        assert_eq!(
            map.dispatch(&shifted, Focus::Normal),
            Dispatch::Handled(Action::ToggleTheme)
        );

        // Unshifted t is the tag filter
        assert_eq!(
            map.dispatch(&KeyPress::new(Key::Char('t')), Focus::Normal),
            Dispatch::Handled(Action::TagFilter)
        );

        let mut alt = KeyPress::new(Key::Char('q'));
        alt.alt = true;
        assert_eq!(map.dispatch(&alt, Focus::Normal), Dispatch::Passthrough);
    }

    #[test]
    fn test_text_input_only_cancel() {
        let map = default_shortcuts();

        assert_eq!(
            map.dispatch(&KeyPress::new(Key::Char('q')), Focus::TextInput),
            Dispatch::Passthrough
        );
        assert_eq!(
            map.dispatch(&KeyPress::ctrl(Key::Char('n')), Focus::TextInput),
            Dispatch::Passthrough
        );
        assert_eq!(
            map.dispatch(&KeyPress::new(Key::Escape), Focus::TextInput),
            Dispatch::Handled(Action::Cancel)
        );
    }

    #[test]
    fn test_first_match_wins() {
        let mut map = ShortcutMap::new();
        map.bind(KeyChord::new(Key::Char('x')), Action::DeleteNote, "first")
            .bind(KeyChord::new(Key::Char('x')), Action::DeleteFolder, "second");

        assert_eq!(
            map.dispatch(&KeyPress::new(Key::Char('x')), Focus::Normal),
            Dispatch::Handled(Action::DeleteNote)
        );
    }

    #[test]
    fn test_disabled_map_passes_through() {
        let mut map = default_shortcuts();
        map.set_enabled(false);
        assert!(!map.is_enabled());
        assert_eq!(
            map.dispatch(&KeyPress::new(Key::Escape), Focus::Normal),
            Dispatch::Passthrough
        );
    }

    #[test]
    fn test_close_topmost_priority() {
        let mut overlays = Overlays {
            form: true,
            search: true,
            tag_filter: true,
        };

        assert_eq!(overlays.close_topmost(), Some(Overlay::Form));
        assert_eq!(overlays.close_topmost(), Some(Overlay::Search));
        assert_eq!(overlays.close_topmost(), Some(Overlay::TagFilter));
        assert_eq!(overlays.close_topmost(), None);
        assert!(!overlays.any_open());
    }

    #[test]
    fn test_chord_display() {
        assert_eq!(KeyChord::ctrl(Key::Char('n')).to_string(), "Ctrl+n");
        assert_eq!(KeyChord::CANCEL.to_string(), "Esc");
    }
}
