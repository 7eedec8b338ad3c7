//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use ideanote_core::{
    sanitize, AppContext, EntityStore, FolderColor, Note, NoteColor, Theme, ViewSelector,
};

use super::app::{App, ConfirmAction, InputMode};

/// Colors for the active theme
#[derive(Debug, Clone, Copy)]
struct Palette {
    fg: Color,
    bg: Color,
    dim: Color,
    accent: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                fg: Color::Black,
                bg: Color::White,
                dim: Color::Gray,
                accent: Color::Blue,
            },
            Theme::Dark => Self {
                fg: Color::White,
                bg: Color::Black,
                dim: Color::DarkGray,
                accent: Color::Cyan,
            },
        }
    }

    fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    fn dim(&self) -> Style {
        self.base().fg(self.dim)
    }
}

/// Main UI rendering function
pub fn draw<S: EntityStore>(frame: &mut Frame, app: &App, ctx: &AppContext<S>) {
    let palette = Palette::for_theme(ctx.theme.theme());
    frame.render_widget(Block::default().style(palette.base()), frame.area());

    if let Some(message) = app.load_error() {
        draw_error_screen(frame, message, &palette);
        return;
    }
    if app.snapshot().is_none() {
        let loading = Paragraph::new("Loading notes...").style(palette.dim());
        frame.render_widget(loading, frame.area());
        return;
    }

    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let pane_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(22),
            Constraint::Percentage(38),
            Constraint::Percentage(40),
        ])
        .split(outer_chunks[0]);

    draw_views_pane(frame, app, ctx, pane_chunks[0], &palette);
    draw_notes_pane(frame, app, ctx, pane_chunks[1], &palette);
    draw_detail_pane(frame, app, pane_chunks[2], &palette);

    match app.input_mode {
        InputMode::Search => {
            let matches = format!("  ({} matching)", app.notes.len());
            draw_input(frame, app, "/", &matches, outer_chunks[1], &palette)
        }
        InputMode::NewFolder => {
            draw_input(frame, app, "New folder: ", "", outer_chunks[1], &palette)
        }
        _ => draw_status_bar(frame, ctx, outer_chunks[1], &palette),
    }

    match app.input_mode {
        InputMode::TagFilter => draw_picker(frame, app, " Filter by tag ", &palette),
        InputMode::MoveNote => draw_picker(frame, app, " Move to folder ", &palette),
        InputMode::Confirm(action) => draw_confirm(frame, app, action, &palette),
        _ => {}
    }

    if app.show_help {
        draw_help_overlay(frame, ctx, &palette);
    }
}

/// Draw the views pane (left)
fn draw_views_pane<S: EntityStore>(
    frame: &mut Frame,
    app: &App,
    ctx: &AppContext<S>,
    area: Rect,
    palette: &Palette,
) {
    let items: Vec<ListItem> = app
        .views
        .iter()
        .map(|view| {
            let mut spans = Vec::new();
            if let ViewSelector::Folder(id) = view {
                let color = app
                    .snapshot()
                    .and_then(|s| s.folder(*id))
                    .map(|f| f.display_color())
                    .unwrap_or_default();
                spans.push(Span::styled("● ", Style::default().fg(folder_color(color))));
            }
            spans.push(Span::raw(app.view_label(view)));
            spans.push(Span::styled(
                format!(" ({})", app.counts.for_view(view)),
                palette.dim(),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let block = Block::default()
        .title(" Views ")
        .borders(Borders::ALL)
        .style(palette.base());

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(app.view_index(ctx.notebook.view())));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw the notes pane (middle)
fn draw_notes_pane<S: EntityStore>(
    frame: &mut Frame,
    app: &App,
    ctx: &AppContext<S>,
    area: Rect,
    palette: &Palette,
) {
    let max_len = area.width.saturating_sub(8) as usize;

    let items: Vec<ListItem> = app
        .notes
        .iter()
        .map(|note| {
            let title_line = Line::from(vec![
                Span::styled("█ ", Style::default().fg(note_color(note.color))),
                Span::styled(flags(note), Style::default().fg(palette.accent)),
                Span::raw(clip(&note.display_title(), max_len)),
            ]);

            let tags = if note.tags.is_empty() {
                String::new()
            } else {
                format!("#{}", note.tags.join(" #"))
            };
            let tag_line = Line::from(Span::styled(
                format!("    {}", clip(&tags, max_len)),
                palette.dim(),
            ));

            ListItem::new(vec![title_line, tag_line])
        })
        .collect();

    let state_info = ctx.notebook.view_state();
    let mut title = format!(" Notes ({}) ", app.notes.len());
    if !state_info.search.is_empty() {
        title.push_str(&format!("/{} ", state_info.search));
    }
    if let Some(tag) = &state_info.tag_filter {
        title.push_str(&format!("#{} ", tag));
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD))
        .style(palette.base());

    if app.notes.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No notes here. Press a to write one.", palette.dim())),
        ])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED),
    );

    let mut state = ListState::default();
    state.select(Some(app.note_index));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw the detail pane (right)
fn draw_detail_pane(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let block = Block::default()
        .title(" Note ")
        .borders(Borders::ALL)
        .style(palette.base());

    let bold = Style::default().add_modifier(Modifier::BOLD);

    let content = if let Some(note) = app.current_note() {
        let folder = note
            .folder_id
            .and_then(|id| app.snapshot().and_then(|s| s.folder(id)))
            .map(|f| f.name.clone())
            .unwrap_or_else(|| "-".to_string());
        let tags = if note.tags.is_empty() {
            "-".to_string()
        } else {
            note.tags.join(", ")
        };

        let mut lines = vec![
            Line::from(Span::styled(note.display_title(), bold)),
            Line::from(""),
            Line::from(vec![
                Span::styled("Color:   ", bold),
                Span::styled("█ ", Style::default().fg(note_color(note.color))),
                Span::raw(note.color.to_string()),
            ]),
            Line::from(vec![Span::styled("Folder:  ", bold), Span::raw(folder)]),
            Line::from(vec![Span::styled("Tags:    ", bold), Span::raw(tags)]),
            Line::from(vec![
                Span::styled("Created: ", bold),
                Span::raw(note.created_at.format("%Y-%m-%d %H:%M").to_string()),
            ]),
        ];

        let separator = "─".repeat(area.width.saturating_sub(2) as usize);
        lines.push(Line::from(Span::styled(separator, palette.dim())));

        let body = sanitize::plain_text(&sanitize::sanitize_html(&note.text));
        lines.extend(body.lines().map(|l| Line::from(l.to_string())));

        lines
    } else {
        vec![
            Line::from(""),
            Line::from(Span::styled("Select a note to read it", palette.dim())),
        ]
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Draw the status bar at the bottom
fn draw_status_bar<S>(frame: &mut Frame, ctx: &AppContext<S>, area: Rect, palette: &Palette) {
    let paragraph = match ctx.banner.message() {
        Some(message) => Paragraph::new(Line::from(vec![
            Span::styled("✓ ", Style::default().fg(Color::Green)),
            Span::raw(message),
        ]))
        .style(palette.base()),
        None => Paragraph::new(
            "a:new  e:edit  d:del  p:pin  s:fav  m:move  t:tag  /:search  f:folder  ?:help  q:quit",
        )
        .style(palette.dim()),
    };

    frame.render_widget(paragraph, area);
}

/// Draw a one-line text input at the bottom
fn draw_input(
    frame: &mut Frame,
    app: &App,
    prefix: &str,
    suffix: &str,
    area: Rect,
    palette: &Palette,
) {
    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(palette.accent)),
        Span::raw(app.input.as_str()),
        Span::styled(suffix, palette.dim()),
    ]);

    frame.render_widget(Paragraph::new(line).style(palette.base()), area);

    let cursor_x = area.x + (prefix.chars().count() + app.input.chars().count()) as u16;
    frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(1)), area.y));
}

/// Draw the tag or folder picker
fn draw_picker(frame: &mut Frame, app: &App, title: &str, palette: &Palette) {
    let items: Vec<ListItem> = app
        .picker_items()
        .into_iter()
        .map(ListItem::new)
        .collect();

    let height = (items.len() as u16 + 2).min(16);
    let area = centered(frame.area(), 36, height);
    frame.render_widget(Clear, area);

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().add_modifier(Modifier::BOLD))
                .style(palette.base()),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(app.picker_index));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw a y/n confirmation
fn draw_confirm(frame: &mut Frame, app: &App, action: ConfirmAction, palette: &Palette) {
    let question = match action {
        ConfirmAction::DeleteNote(id) => {
            let title = app
                .snapshot()
                .and_then(|s| s.note(id))
                .map(|n| n.display_title())
                .unwrap_or_default();
            format!("Delete note \"{}\"?", clip(&title, 30))
        }
        ConfirmAction::DeleteFolder(id) => {
            let name = app
                .snapshot()
                .and_then(|s| s.folder(id))
                .map(|f| f.name.clone())
                .unwrap_or_default();
            format!("Delete folder \"{}\"? Its notes stay, uncategorized.", clip(&name, 20))
        }
    };

    let area = centered(frame.area(), 60, 5);
    frame.render_widget(Clear, area);

    let paragraph = Paragraph::new(vec![
        Line::from(question),
        Line::from(""),
        Line::from(Span::styled("y: delete   any other key: cancel", palette.dim())),
    ])
    .block(
        Block::default()
            .title(" Confirm ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .style(palette.base()),
    )
    .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

/// Draw help overlay from the registered shortcuts
fn draw_help_overlay<S>(frame: &mut Frame, ctx: &AppContext<S>, palette: &Palette) {
    let mut help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    // Merge keys that share a description ("j, ↓  Down")
    let mut rows: Vec<(String, &str)> = Vec::new();
    for shortcut in ctx.shortcuts.shortcuts() {
        match rows.iter_mut().find(|(_, d)| *d == shortcut.description) {
            Some((keys, _)) => keys.push_str(&format!(", {}", shortcut.chord)),
            None => rows.push((shortcut.chord.to_string(), shortcut.description)),
        }
    }
    for (keys, description) in rows {
        help_text.push(Line::from(format!("  {:<14} {}", keys, description)));
    }

    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(
        "Press any key to close",
        palette.dim(),
    )));

    let height = (help_text.len() as u16 + 2).min(frame.area().height.saturating_sub(2));
    let area = centered(frame.area(), 50, height);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD))
        .style(palette.base());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Full-screen error when the store cannot be read
fn draw_error_screen(frame: &mut Frame, message: &str, palette: &Palette) {
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            "Could not load notes",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled("Press any key to quit", palette.dim())),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .style(palette.base()),
    )
    .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, frame.area());
}

/// A rectangle of at most `width` x `height`, centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

fn note_color(color: NoteColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb(r, g, b)
}

fn folder_color(color: FolderColor) -> Color {
    match color {
        FolderColor::Blue => Color::Blue,
        FolderColor::Green => Color::Green,
        FolderColor::Purple => Color::Magenta,
        FolderColor::Orange => Color::Yellow,
        FolderColor::Pink => Color::LightMagenta,
        FolderColor::Gray => Color::Gray,
    }
}

fn flags(note: &Note) -> String {
    format!(
        "{}{}",
        if note.is_pinned { "📌" } else { "" },
        if note.is_favorite { "★ " } else { "" }
    )
}

/// Cut to `max` characters, marking the cut with an ellipsis
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("a longer title", 6), "a lon…");
        assert_eq!(clip("", 0), "");
    }

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 80, 24);
        let popup = centered(area, 40, 10);
        assert_eq!(popup, Rect::new(20, 7, 40, 10));

        let tiny = centered(Rect::new(0, 0, 10, 4), 40, 10);
        assert!(tiny.width <= 6 && tiny.height <= 2);
    }

    #[test]
    fn test_note_color_matches_palette() {
        assert_eq!(note_color(NoteColor::Coral), Color::Rgb(0xFF, 0x99, 0x99));
    }
}
