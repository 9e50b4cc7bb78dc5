use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use command_menu::model::ItemKind;
use command_menu::reorder;
use command_menu::templates::TEMPLATES;

use super::app::{App, LineStyle, PopupState, Screen, INSERT_KINDS};
use super::Theme;

struct FooterShortcut {
    key: &'static str,
    label: &'static str,
}

const fn shortcut(key: &'static str, label: &'static str) -> FooterShortcut {
    FooterShortcut { key, label }
}

const LAUNCHER_SHORTCUTS: &[FooterShortcut] = &[
    shortcut("q", " Exit"),
    shortcut("←→", " Menu"),
    shortcut("↵", " Run / Open"),
    shortcut("r", " Reload"),
    shortcut("e", " Edit Menus"),
];

const GENERAL_SHORTCUTS: &[FooterShortcut] = &[
    shortcut("esc", " Back"),
    shortcut("↵", " Items"),
    shortcut("n", " New"),
    shortcut("t", " Template"),
    shortcut("d", " Remove"),
    shortcut("K/J", " Move"),
    shortcut("m", " Title & Place"),
    shortcut("s", " Settings"),
    shortcut("R", " Reset"),
];

const EDITOR_SHORTCUTS: &[FooterShortcut] = &[
    shortcut("esc", " Back"),
    shortcut("a", " Add"),
    shortcut("i", " Insert"),
    shortcut("↵", " Edit"),
    shortcut("d", " Delete"),
    shortcut("y", " Duplicate"),
    shortcut("m", " Move"),
    shortcut("w", " Apply"),
    shortcut("r", " Revert"),
];

const DRAG_SHORTCUTS: &[FooterShortcut] = &[
    shortcut("↑↓", " Target"),
    shortcut("↵", " Drop"),
    shortcut("esc", " Cancel"),
];

pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.size();
    let theme = &app.theme;
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(size);

    let screen_name = match app.screen {
        Screen::Launcher => "Launcher",
        Screen::General => "Menus",
        Screen::Editor => "Items",
    };
    let header = Paragraph::new(format!("{} - {screen_name}", app.title))
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(theme.text)
                .bg(theme.primary)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(header, chunks[0]);

    let shortcuts = Paragraph::new(footer_line(footer_shortcuts(app), theme))
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.highlight));
    frame.render_widget(shortcuts, chunks[1]);

    let content_area = chunks[2];
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.surface)),
        content_area,
    );
    let inner = content_area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });
    match app.screen {
        Screen::Launcher => render_launcher(frame, inner, app),
        Screen::General => render_general(frame, inner, app),
        Screen::Editor => render_editor(frame, inner, app),
    }

    let status = Paragraph::new(app.status_text())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(theme.primary)
                .fg(theme.text)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(status, chunks[3]);

    if let Some(popup) = &app.active_popup {
        render_popup(frame, popup, theme);
    }
}

fn footer_shortcuts(app: &App) -> &'static [FooterShortcut] {
    match app.screen {
        Screen::Launcher => LAUNCHER_SHORTCUTS,
        Screen::General => GENERAL_SHORTCUTS,
        Screen::Editor if app.editor.as_ref().is_some_and(|view| view.drag.is_some()) => {
            DRAG_SHORTCUTS
        }
        Screen::Editor => EDITOR_SHORTCUTS,
    }
}

fn footer_line(shortcuts: &[FooterShortcut], theme: &Theme) -> Line<'static> {
    let key_style = Style::default()
        .fg(theme.accent)
        .bg(theme.highlight)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(theme.background).bg(theme.highlight);
    let mut spans = Vec::new();
    for (index, shortcut) in shortcuts.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" | ", label_style));
        }
        spans.push(Span::styled(shortcut.key, key_style));
        spans.push(Span::styled(shortcut.label, label_style));
    }
    Line::from(spans)
}

fn selection_style(theme: &Theme) -> Style {
    Style::default()
        .bg(theme.highlight)
        .fg(theme.background)
        .add_modifier(Modifier::BOLD)
}

fn render_list(frame: &mut Frame, area: Rect, items: Vec<ListItem<'static>>, selected: usize, theme: &Theme) {
    let empty = items.is_empty();
    let list = List::new(items)
        .highlight_style(selection_style(theme))
        .block(Block::default().style(Style::default().bg(theme.surface).fg(theme.text)));
    let mut state = ListState::default().with_selected((!empty).then_some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_launcher(frame: &mut Frame, area: Rect, app: &App) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let theme = &app.theme;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    let menus = app.session.menus();
    let mut tabs = Vec::new();
    for (tab, &index) in app.launcher.order.iter().enumerate() {
        let Some(menu) = menus.get(index) else {
            continue;
        };
        let label = format!(" {} ", App::menu_label(menu, index));
        let style = if tab == app.launcher.tab {
            selection_style(theme)
        } else {
            Style::default().fg(theme.text)
        };
        tabs.push(Span::styled(label, style));
        tabs.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(tabs)), rows[0]);

    let width = rows[1].width as usize;
    let items = app
        .launcher
        .lines
        .iter()
        .map(|line| {
            let indent = "    ".repeat(line.depth);
            match line.style {
                LineStyle::Separator => {
                    let rule = "─".repeat(width.saturating_sub(indent.len() + 2).min(40));
                    ListItem::new(format!("{indent}{rule}")).style(Style::default().fg(theme.muted))
                }
                LineStyle::Label => ListItem::new(format!("{indent}{}", line.text)).style(
                    Style::default()
                        .fg(theme.muted)
                        .add_modifier(Modifier::ITALIC),
                ),
                LineStyle::Submenu => ListItem::new(format!("{indent}{}", line.text))
                    .style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
                LineStyle::Action => ListItem::new(format!("{indent}{}", line.text))
                    .style(Style::default().fg(theme.highlight)),
                LineStyle::Entry => ListItem::new(format!("{indent}  {}", line.text)),
            }
        })
        .collect();
    render_list(frame, rows[1], items, app.launcher.current, theme);
}

fn render_general(frame: &mut Frame, area: Rect, app: &App) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let theme = &app.theme;
    let items = app
        .session
        .menus()
        .iter()
        .enumerate()
        .map(|(index, menu)| {
            let line = Line::from(vec![
                Span::styled(
                    format!("{:<32}", App::menu_label(menu, index)),
                    Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(
                        "{} #{}  {} item(s)",
                        menu.position.as_str(),
                        menu.index,
                        menu.items.len()
                    ),
                    Style::default().fg(theme.muted),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();
    render_list(frame, area, items, app.general_index, theme);
}

fn render_editor(frame: &mut Frame, area: Rect, app: &App) {
    let Some(view) = &app.editor else {
        return;
    };
    if area.width == 0 || area.height == 0 {
        return;
    }
    let theme = &app.theme;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    let menu_index = view.editor.menu_index();
    let title = app
        .session
        .menus()
        .get(menu_index)
        .map(|menu| App::menu_label(menu, menu_index))
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(format!("Items of {title}"))
            .style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        rows[0],
    );

    let dragged = view
        .drag
        .as_ref()
        .map(|drag| reorder::subtree_span(view.editor.rows(), drag.source()));
    let items = view
        .editor
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut spans = vec![Span::raw("  ".repeat(row.depth))];
            let carried = dragged.as_ref().is_some_and(|span| span.contains(&index));
            let title_style = match row.kind {
                _ if carried => Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
                ItemKind::Separator => Style::default().fg(theme.muted),
                ItemKind::Label => Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
                ItemKind::Submenu => Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
                ItemKind::Command => Style::default().fg(theme.text),
            };
            spans.push(Span::styled(row.display_title(), title_style));
            if row.kind == ItemKind::Command && !row.command.is_empty() {
                spans.push(Span::styled(
                    format!("  $ {}", row.command),
                    Style::default().fg(theme.muted),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    render_list(frame, rows[1], items, view.current, theme);
}

fn render_popup(frame: &mut Frame, popup: &PopupState, theme: &Theme) {
    match popup {
        PopupState::Message(msg) => {
            render_text_popup(frame, "Message", format!("{msg}\n\nPress Enter or Esc to close."), theme);
        }
        PopupState::Confirm { message, .. } => {
            render_text_popup(frame, "Confirm", message.clone(), theme);
        }
        PopupState::Templates { selected } => {
            let items = TEMPLATES
                .iter()
                .map(|template| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!("{:<20}", template.name),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(template.description),
                    ]))
                })
                .collect();
            render_list_popup(frame, "Add From Template", items, *selected, theme);
        }
        PopupState::InsertKind { before, selected } => {
            let title = if before.is_some() {
                "Insert Before"
            } else {
                "Add At Top"
            };
            let items = INSERT_KINDS
                .iter()
                .map(|kind| ListItem::new(kind.label()))
                .collect();
            render_list_popup(frame, title, items, *selected, theme);
        }
        PopupState::RowForm(form) => {
            render_form_popup(frame, "Edit Row", &form.render_lines(theme), theme);
        }
        PopupState::MetaForm(form) => {
            render_form_popup(frame, "Edit Menu", &form.render_lines(theme), theme);
        }
        PopupState::SettingsForm(form) => {
            render_form_popup(frame, "Settings", &form.render_lines(theme), theme);
        }
    }
}

fn popup_block(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .style(Style::default().bg(theme.surface).fg(theme.text))
}

fn render_text_popup(frame: &mut Frame, title: &str, text: String, theme: &Theme) {
    let area = PopupSize::Message.area(frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(popup_block(title, theme));
    frame.render_widget(paragraph, area);
}

fn render_list_popup(
    frame: &mut Frame,
    title: &str,
    items: Vec<ListItem<'static>>,
    selected: usize,
    theme: &Theme,
) {
    let area = PopupSize::List.area(frame.size());
    frame.render_widget(Clear, area);
    let list = List::new(items)
        .highlight_style(selection_style(theme))
        .block(popup_block(title, theme));
    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_form_popup(frame: &mut Frame, title: &str, lines: &[FormLine], theme: &Theme) {
    let area = PopupSize::Form.area(frame.size());
    frame.render_widget(Clear, area);
    let block = popup_block(title, theme);
    let inner = block.inner(area).inner(&Margin {
        horizontal: 2,
        vertical: 1,
    });
    frame.render_widget(block, area);
    let mut rendered = materialize_form_lines(lines, inner.width as usize, theme);
    rendered.push(Line::from(""));
    rendered.push(Line::from(Span::styled(
        "Tab/↑↓ field, Enter save, Esc cancel",
        Style::default().fg(theme.muted),
    )));
    let paragraph = Paragraph::new(rendered).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

#[derive(Clone)]
pub struct FormLine {
    line: Line<'static>,
    highlight: bool,
}

impl FormLine {
    fn plain(line: Line<'static>) -> Self {
        Self {
            line,
            highlight: false,
        }
    }

    fn highlighted(line: Line<'static>) -> Self {
        Self {
            line,
            highlight: true,
        }
    }
}

fn materialize_form_lines(lines: &[FormLine], width: usize, theme: &Theme) -> Vec<Line<'static>> {
    lines
        .iter()
        .map(|form_line| {
            if form_line.highlight {
                highlight_line_with_width(form_line.line.clone(), width, theme)
            } else {
                form_line.line.clone()
            }
        })
        .collect()
}

/// Restyles `line` as selected and pads it to `width` columns.
fn highlight_line_with_width(mut line: Line<'static>, width: usize, theme: &Theme) -> Line<'static> {
    let highlight_style = selection_style(theme);
    let mut text_width = 0usize;
    for span in &mut line.spans {
        span.style = highlight_style;
        text_width += UnicodeWidthStr::width(span.content.as_ref());
    }
    if width > text_width {
        line.spans
            .push(Span::styled(" ".repeat(width - text_width), highlight_style));
    }
    line
}

pub fn plain_line(line: impl Into<Line<'static>>) -> FormLine {
    FormLine::plain(line.into())
}

pub fn make_field_line(label: &str, value: &str, selected: bool, theme: &Theme) -> FormLine {
    let value_display = if value.trim().is_empty() {
        "(empty)".to_string()
    } else {
        value.to_string()
    };
    let label_span = Span::styled(
        format!("{label}: "),
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
    );
    let value_span = Span::styled(value_display, Style::default().fg(theme.text));
    let line = Line::from(vec![label_span, value_span]);
    if selected {
        FormLine::highlighted(line)
    } else {
        FormLine::plain(line)
    }
}

pub fn make_toggle_line(label: &str, value: bool, selected: bool, theme: &Theme) -> FormLine {
    let status = if value { "Yes" } else { "No" };
    let label_span = Span::styled(
        format!("{label}: "),
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
    );
    let value_span = Span::styled(
        status,
        Style::default()
            .fg(if value { Color::Green } else { Color::Red })
            .add_modifier(Modifier::BOLD),
    );
    let line = Line::from(vec![label_span, value_span]);
    if selected {
        FormLine::highlighted(line)
    } else {
        FormLine::plain(line)
    }
}

#[derive(Clone, Copy)]
enum PopupSize {
    Message,
    List,
    Form,
}

impl PopupSize {
    /// Centred area for the popup, shrunk to fit small screens.
    fn area(self, screen: Rect) -> Rect {
        let (width_percent, height_percent, min_width, min_height) = match self {
            PopupSize::Message => (50, 30, 30, 5),
            PopupSize::List => (60, 40, 36, 8),
            PopupSize::Form => (70, 50, 44, 12),
        };
        let scale = |total: u16, percent: u32, min: u16| {
            let scaled = u16::try_from(u32::from(total) * percent / 100).unwrap_or(total);
            scaled.max(min).min(total)
        };
        let width = scale(screen.width, width_percent, min_width);
        let height = scale(screen.height, height_percent, min_height);
        Rect {
            x: screen.x + (screen.width - width) / 2,
            y: screen.y + (screen.height - height) / 2,
            width,
            height,
        }
    }
}
