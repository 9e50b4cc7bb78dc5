use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use command_menu::drag::DragSession;
use command_menu::editor::{ItemEditor, RowFields};
use command_menu::launcher::{self, PopupEntry};
use command_menu::model::{ItemKind, Menu, MenuMeta};
use command_menu::session::Session;
use command_menu::settings::Settings;
use command_menu::templates::TEMPLATES;
use command_menu::SessionError;

use super::forms::{FormKeyResult, MetaFormState, RowFormState, SettingsFormState};
use super::Theme;

pub const INSERT_KINDS: [ItemKind; 4] = [
    ItemKind::Command,
    ItemKind::Separator,
    ItemKind::Label,
    ItemKind::Submenu,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Launcher,
    General,
    Editor,
}

#[derive(Clone, Debug)]
pub struct PendingCommand {
    pub title: String,
    pub command: String,
}

/// Work that needs the terminal, run by the event loop.
pub enum DeferredAction {
    EditCommandsFile,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineAction {
    None,
    Run { title: String, command: String },
    Toggle(usize),
    EditCommands,
    Reload,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
    Separator,
    Label,
    Entry,
    Submenu,
    Action,
}

#[derive(Clone, Debug)]
pub struct LauncherLine {
    pub text: String,
    pub depth: usize,
    pub style: LineStyle,
    pub action: LineAction,
}

#[derive(Default)]
pub struct LauncherView {
    pub order: Vec<usize>,
    pub tab: usize,
    pub lines: Vec<LauncherLine>,
    pub current: usize,
    expanded: HashSet<usize>,
    seen_restart: Option<u64>,
}

pub struct EditorView {
    pub editor: ItemEditor,
    pub current: usize,
    pub drag: Option<DragSession>,
}

#[derive(Clone, Copy)]
pub enum ConfirmAction {
    RemoveMenu(usize),
    Reset,
    DiscardEdits,
}

pub enum PopupState {
    Message(String),
    Confirm {
        message: String,
        action: ConfirmAction,
    },
    Templates {
        selected: usize,
    },
    InsertKind {
        before: Option<usize>,
        selected: usize,
    },
    RowForm(RowFormState),
    MetaForm(MetaFormState),
    SettingsForm(SettingsFormState),
}

enum PopupResult {
    None,
    Close(Option<String>),
    Confirm(ConfirmAction),
    Template(usize),
    Insert(Option<usize>, ItemKind),
    RowSubmit(usize, RowFields),
    MetaSubmit(usize, MenuMeta),
    SettingsSubmit(Settings),
}

pub struct App {
    pub title: String,
    pub theme: Theme,
    pub screen: Screen,
    pub session: Session,
    pub settings: Settings,
    settings_file: PathBuf,
    commands_path: PathBuf,
    pub launcher: LauncherView,
    pub general_index: usize,
    pub editor: Option<EditorView>,
    pub active_popup: Option<PopupState>,
    pending_command: Option<PendingCommand>,
    pending_action: Option<DeferredAction>,
    status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        session: Session,
        settings: Settings,
        settings_file: PathBuf,
        commands_path: PathBuf,
        screen: Screen,
    ) -> Self {
        let mut app = Self {
            title: "Command Menu".to_string(),
            theme: Theme::default(),
            screen,
            session,
            settings,
            settings_file,
            commands_path,
            launcher: LauncherView::default(),
            general_index: 0,
            editor: None,
            active_popup: None,
            pending_command: None,
            pending_action: None,
            status_message: None,
            should_quit: false,
        };
        app.offer_reset_on_load_error();
        app.sync_with_session();
        app
    }

    pub fn commands_path(&self) -> &Path {
        &self.commands_path
    }

    /// Rebuilds the launcher whenever the session signals a change.
    pub fn sync_with_session(&mut self) {
        let counter = self.session.restart_counter();
        if self.launcher.seen_restart == Some(counter) {
            return;
        }
        self.launcher.seen_restart = Some(counter);
        self.launcher.order = launcher::panel_order(self.session.menus());
        self.launcher.expanded.clear();
        self.launcher.tab = self
            .launcher
            .tab
            .min(self.launcher.order.len().saturating_sub(1));
        self.general_index = self
            .general_index
            .min(self.session.menus().len().saturating_sub(1));
        self.rebuild_launcher_lines();
        tracing::debug!(counter, "launcher view rebuilt");
    }

    pub fn menu_label(menu: &Menu, index: usize) -> String {
        match (menu.display_title(), menu.icon.as_deref()) {
            ("", Some(icon)) => format!("Menu {} ({icon})", index + 1),
            ("", None) => format!("Menu {}", index + 1),
            (title, _) => title.to_string(),
        }
    }

    fn rebuild_launcher_lines(&mut self) {
        let mut lines = Vec::new();
        let menu = self
            .launcher
            .order
            .get(self.launcher.tab)
            .and_then(|&index| self.session.menus().get(index));
        if let Some(menu) = menu {
            for (index, entry) in launcher::popup_entries(menu, &self.settings)
                .into_iter()
                .enumerate()
            {
                push_entry(&mut lines, index, entry, 0, &self.launcher.expanded);
            }
        }
        self.launcher.current = self.launcher.current.min(lines.len().saturating_sub(1));
        self.launcher.lines = lines;
    }

    fn offer_reset_on_load_error(&mut self) {
        if let Some(err) = self.session.load_error() {
            let message = format!(
                "{} could not be read ({err}). Reset it to the default menu? (y/n)",
                self.commands_path.display()
            );
            self.active_popup = Some(PopupState::Confirm {
                message,
                action: ConfirmAction::Reset,
            });
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.active_popup.is_some() {
            self.handle_popup_key(key);
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match self.screen {
            Screen::Launcher => self.handle_launcher_key(key),
            Screen::General => self.handle_general_key(key),
            Screen::Editor => self.handle_editor_key(key),
        }
    }

    fn handle_launcher_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.launcher.current = step(self.launcher.current, self.launcher.lines.len(), -1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.launcher.current = step(self.launcher.current, self.launcher.lines.len(), 1);
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => self.switch_tab(-1),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => self.switch_tab(1),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_launcher_line(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('e') => self.screen = Screen::General,
            _ => {}
        }
    }

    fn switch_tab(&mut self, delta: isize) {
        let count = self.launcher.order.len();
        if count == 0 {
            return;
        }
        self.launcher.tab = (self.launcher.tab as isize + delta).rem_euclid(count as isize) as usize;
        self.launcher.current = 0;
        self.launcher.expanded.clear();
        self.rebuild_launcher_lines();
    }

    fn activate_launcher_line(&mut self) {
        let Some(line) = self.launcher.lines.get(self.launcher.current) else {
            return;
        };
        match line.action.clone() {
            LineAction::None => {}
            LineAction::Run { title, command } => {
                self.status_message = Some(format!("Running {title}"));
                self.pending_command = Some(PendingCommand { title, command });
            }
            LineAction::Toggle(index) => {
                if !self.launcher.expanded.remove(&index) {
                    self.launcher.expanded.insert(index);
                }
                self.rebuild_launcher_lines();
            }
            LineAction::EditCommands => self.pending_action = Some(DeferredAction::EditCommandsFile),
            LineAction::Reload => self.reload(),
        }
    }

    fn reload(&mut self) {
        match self.session.reload() {
            Ok(()) if self.session.load_error().is_some() => {
                self.offer_reset_on_load_error();
            }
            Ok(()) => self.set_status(Some("Configuration reloaded".into())),
            Err(err) => self.report("Reload failed", &err),
        }
    }

    /// Called by the event loop after the commands file was edited externally.
    pub fn finish_file_edit(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.reload(),
            Err(err) => {
                tracing::warn!(error = %err, "external edit failed");
                self.set_status(Some(format!("Edit failed: {err}")));
            }
        }
    }

    fn handle_general_key(&mut self, key: KeyEvent) {
        let count = self.session.menus().len();
        let selected = self.general_index;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Tab => self.screen = Screen::Launcher,
            KeyCode::Up | KeyCode::Char('k') => self.general_index = step(selected, count, -1),
            KeyCode::Down | KeyCode::Char('j') => self.general_index = step(selected, count, 1),
            KeyCode::Enter | KeyCode::Char('e') => self.open_editor(selected),
            KeyCode::Char('n') => match self.session.add_menu(None) {
                Ok(index) => {
                    self.general_index = index;
                    self.set_status(Some(format!("Added menu {}", index + 1)));
                }
                Err(err) => self.report("Adding a menu failed", &err),
            },
            KeyCode::Char('t') => {
                self.active_popup = Some(PopupState::Templates { selected: 0 });
            }
            KeyCode::Char('d') | KeyCode::Delete if selected < count => {
                let label = self
                    .session
                    .menus()
                    .get(selected)
                    .map(|menu| App::menu_label(menu, selected))
                    .unwrap_or_default();
                self.active_popup = Some(PopupState::Confirm {
                    message: format!("Remove {label} and all of its items? (y/n)"),
                    action: ConfirmAction::RemoveMenu(selected),
                });
            }
            KeyCode::Char('K') => match self.session.move_menu_up(selected) {
                Ok(index) => self.general_index = index,
                Err(err) => self.report("Moving the menu failed", &err),
            },
            KeyCode::Char('J') => match self.session.move_menu_down(selected) {
                Ok(index) => self.general_index = index,
                Err(err) => self.report("Moving the menu failed", &err),
            },
            KeyCode::Char('m') => {
                if let Some(menu) = self.session.menus().get(selected) {
                    self.active_popup =
                        Some(PopupState::MetaForm(MetaFormState::new(selected, menu.meta())));
                }
            }
            KeyCode::Char('s') => {
                self.active_popup = Some(PopupState::SettingsForm(SettingsFormState::new(
                    &self.settings,
                )));
            }
            KeyCode::Char('R') => {
                self.active_popup = Some(PopupState::Confirm {
                    message: "Replace every menu with the default configuration? (y/n)".into(),
                    action: ConfirmAction::Reset,
                });
            }
            _ => {}
        }
    }

    fn open_editor(&mut self, index: usize) {
        match self.session.menu(index) {
            Ok(menu) => {
                self.editor = Some(EditorView {
                    editor: ItemEditor::open(index, menu),
                    current: 0,
                    drag: None,
                });
                self.screen = Screen::Editor;
            }
            Err(err) => self.report("Opening the editor failed", &err),
        }
    }

    fn close_editor(&mut self) {
        if let Some(view) = self.editor.take() {
            if let Some(session) = view.drag {
                view.editor.cancel_drag(session);
            }
        }
        self.screen = Screen::General;
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let Some(view) = self.editor.as_mut() else {
            self.screen = Screen::General;
            return;
        };
        let len = view.editor.len();
        if let Some(source) = view.drag.as_ref().map(DragSession::source) {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => view.current = step(view.current, len, -1),
                KeyCode::Down | KeyCode::Char('j') => view.current = step(view.current, len, 1),
                KeyCode::Enter | KeyCode::Char('m') => {
                    if let Some(session) = view.drag.take() {
                        match view.editor.drop_on(session, view.current) {
                            Ok(moved) => {
                                view.current = moved.start;
                                self.status_message = Some("Moved".into());
                            }
                            Err(_) => {
                                view.current = source;
                                self.status_message = None;
                            }
                        }
                    }
                }
                KeyCode::Esc => {
                    if let Some(session) = view.drag.take() {
                        view.editor.cancel_drag(session);
                    }
                    view.current = source;
                    self.status_message = None;
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => view.current = step(view.current, len, -1),
            KeyCode::Down | KeyCode::Char('j') => view.current = step(view.current, len, 1),
            KeyCode::Char('a') => {
                self.active_popup = Some(PopupState::InsertKind {
                    before: None,
                    selected: 0,
                });
            }
            KeyCode::Char('i') if len > 0 => {
                self.active_popup = Some(PopupState::InsertKind {
                    before: Some(view.current),
                    selected: 0,
                });
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                let index = view.current;
                let form = view
                    .editor
                    .rows()
                    .get(index)
                    .map(|row| row.kind)
                    .zip(view.editor.fields(index))
                    .and_then(|(kind, fields)| RowFormState::new(index, kind, fields));
                match form {
                    Some(form) => self.active_popup = Some(PopupState::RowForm(form)),
                    None if len > 0 => {
                        self.status_message = Some("Separators have nothing to edit".into())
                    }
                    None => {}
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Ok(removed) = view.editor.delete(view.current) {
                    view.current = view.current.min(view.editor.len().saturating_sub(1));
                    self.status_message = Some(format!("Deleted {} row(s)", removed.len()));
                }
            }
            KeyCode::Char('y') => {
                if let Ok(copy) = view.editor.duplicate(view.current) {
                    view.current = copy.start;
                    self.status_message = Some("Duplicated".into());
                }
            }
            KeyCode::Char('m') => {
                if let Some(session) = view.editor.begin_drag(view.current) {
                    let title = view.editor.rows()[session.source()].display_title();
                    view.drag = Some(session);
                    self.status_message =
                        Some(format!("Moving {title}: pick a target, Enter to drop"));
                }
            }
            KeyCode::Char('w') => self.apply_editor(),
            KeyCode::Char('r') => {
                let index = view.editor.menu_index();
                self.open_editor(index);
                self.set_status(Some("Changes reverted".into()));
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                if view.editor.is_dirty() {
                    self.active_popup = Some(PopupState::Confirm {
                        message: "Discard changes that were not applied? (y/n)".into(),
                        action: ConfirmAction::DiscardEdits,
                    });
                } else {
                    self.close_editor();
                }
            }
            _ => {}
        }
    }

    fn apply_editor(&mut self) {
        let Some(view) = self.editor.as_mut() else {
            return;
        };
        match self
            .session
            .save_menu_items(view.editor.menu_index(), view.editor.rows())
        {
            Ok(()) => {
                view.editor.mark_saved();
                self.set_status(Some("Changes applied".into()));
            }
            Err(err) => self.report("Applying changes failed", &err),
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        let Some(popup) = self.active_popup.as_mut() else {
            return;
        };
        let result = match popup {
            PopupState::Message(_) => match key.code {
                KeyCode::Esc | KeyCode::Enter => PopupResult::Close(None),
                _ => PopupResult::None,
            },
            PopupState::Confirm { action, .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => PopupResult::Confirm(*action),
                KeyCode::Char('n') | KeyCode::Esc => PopupResult::Close(None),
                _ => PopupResult::None,
            },
            PopupState::Templates { selected } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    *selected = step(*selected, TEMPLATES.len(), -1);
                    PopupResult::None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    *selected = step(*selected, TEMPLATES.len(), 1);
                    PopupResult::None
                }
                KeyCode::Enter => PopupResult::Template(*selected),
                KeyCode::Esc => PopupResult::Close(None),
                _ => PopupResult::None,
            },
            PopupState::InsertKind { before, selected } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    *selected = step(*selected, INSERT_KINDS.len(), -1);
                    PopupResult::None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    *selected = step(*selected, INSERT_KINDS.len(), 1);
                    PopupResult::None
                }
                KeyCode::Enter => PopupResult::Insert(*before, INSERT_KINDS[*selected]),
                KeyCode::Esc => PopupResult::Close(None),
                _ => PopupResult::None,
            },
            PopupState::RowForm(form) => match form.handle_key(key) {
                FormKeyResult::Continue => PopupResult::None,
                FormKeyResult::Cancel => PopupResult::Close(Some("Row edit cancelled".into())),
                FormKeyResult::Submit(fields) => PopupResult::RowSubmit(form.index, fields),
            },
            PopupState::MetaForm(form) => match form.handle_key(key) {
                FormKeyResult::Continue => PopupResult::None,
                FormKeyResult::Cancel => PopupResult::Close(Some("Menu edit cancelled".into())),
                FormKeyResult::Submit(meta) => PopupResult::MetaSubmit(form.menu_index, meta),
            },
            PopupState::SettingsForm(form) => match form.handle_key(key) {
                FormKeyResult::Continue => PopupResult::None,
                FormKeyResult::Cancel => {
                    PopupResult::Close(Some("Settings update cancelled".into()))
                }
                FormKeyResult::Submit(settings) => PopupResult::SettingsSubmit(settings),
            },
        };

        match result {
            PopupResult::None => {}
            PopupResult::Close(status) => {
                self.active_popup = None;
                if status.is_some() {
                    self.set_status(status);
                }
            }
            PopupResult::Confirm(action) => {
                self.active_popup = None;
                self.confirm(action);
            }
            PopupResult::Template(index) => {
                self.active_popup = None;
                self.add_template(index);
            }
            PopupResult::Insert(before, kind) => {
                self.active_popup = None;
                if let Some(view) = self.editor.as_mut() {
                    let inserted = match before {
                        Some(index) => view.editor.insert_before(index, kind).ok(),
                        None => Some(view.editor.add(kind)),
                    };
                    if let Some(index) = inserted {
                        view.current = index;
                    }
                }
            }
            PopupResult::RowSubmit(index, fields) => {
                self.active_popup = None;
                if let Some(view) = self.editor.as_mut() {
                    if view.editor.update_fields(index, fields).is_ok() {
                        self.status_message = Some("Row updated".into());
                    }
                }
            }
            PopupResult::MetaSubmit(index, meta) => {
                self.active_popup = None;
                match self.session.update_menu_meta(index, meta) {
                    Ok(()) => self.set_status(Some("Menu updated".into())),
                    Err(err) => self.report("Updating the menu failed", &err),
                }
            }
            PopupResult::SettingsSubmit(settings) => match settings.save(&self.settings_file) {
                Ok(()) => {
                    self.active_popup = None;
                    self.settings = settings;
                    self.rebuild_launcher_lines();
                    self.set_status(Some("Settings saved".into()));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "saving settings failed");
                    self.active_popup = Some(PopupState::Message(format!(
                        "Saving settings failed: {err:#}"
                    )));
                }
            },
        }
    }

    fn confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::RemoveMenu(index) => match self.session.remove_menu(index) {
                Ok(menu) => {
                    self.general_index = self
                        .general_index
                        .min(self.session.menus().len().saturating_sub(1));
                    let label = App::menu_label(&menu, index);
                    self.set_status(Some(format!("Removed {label}")));
                }
                Err(err) => self.report("Removing the menu failed", &err),
            },
            ConfirmAction::Reset => match self.session.reset() {
                Ok(()) => {
                    self.general_index = 0;
                    self.set_status(Some("Configuration reset to default".into()));
                }
                Err(err) => self.report("Reset failed", &err),
            },
            ConfirmAction::DiscardEdits => {
                self.close_editor();
                self.set_status(Some("Edits discarded".into()));
            }
        }
    }

    fn add_template(&mut self, index: usize) {
        let Some(template) = TEMPLATES.get(index) else {
            return;
        };
        let menu = match template.menu() {
            Ok(menu) => menu,
            Err(err) => {
                tracing::error!(template = template.name, error = %err, "template failed to decode");
                self.set_status(Some(format!("Template {} is broken: {err}", template.name)));
                return;
            }
        };
        match self.session.add_menu(Some(menu)) {
            Ok(added) => {
                self.general_index = added;
                self.set_status(Some(format!("Added {}", template.name)));
            }
            Err(err) => self.report("Adding the template failed", &err),
        }
    }

    fn report(&mut self, what: &str, err: &SessionError) {
        tracing::warn!(error = %err, "{what}");
        self.set_status(Some(format!("{what}: {err}")));
    }

    pub fn take_pending_command(&mut self) -> Option<PendingCommand> {
        self.pending_command.take()
    }

    pub fn take_pending_action(&mut self) -> Option<DeferredAction> {
        self.pending_action.take()
    }

    pub fn set_status(&mut self, message: Option<String>) {
        self.status_message = message;
    }

    pub fn status_text(&self) -> String {
        let mut text = match self.screen {
            Screen::Launcher => format!(
                "Menu {}/{} | {}",
                position(self.launcher.tab, self.launcher.order.len()),
                self.launcher.order.len(),
                self.session.store_description()
            ),
            Screen::General => format!(
                "Menu {}/{} | {}",
                position(self.general_index, self.session.menus().len()),
                self.session.menus().len(),
                self.session.store_description()
            ),
            Screen::Editor => match &self.editor {
                Some(view) => format!(
                    "Row {}/{}{}",
                    position(view.current, view.editor.len()),
                    view.editor.len(),
                    if view.editor.is_dirty() { " | modified" } else { "" }
                ),
                None => String::new(),
            },
        };
        if let Some(msg) = &self.status_message {
            text.push_str(" | ");
            text.push_str(msg);
        }
        text
    }
}

fn push_entry(
    lines: &mut Vec<LauncherLine>,
    index: usize,
    entry: PopupEntry,
    depth: usize,
    expanded: &HashSet<usize>,
) {
    let line = |text: String, style, action| LauncherLine {
        text,
        depth,
        style,
        action,
    };
    match entry {
        PopupEntry::Separator => lines.push(line(String::new(), LineStyle::Separator, LineAction::None)),
        PopupEntry::Label(title) => lines.push(line(title, LineStyle::Label, LineAction::None)),
        PopupEntry::Command { title, command, .. } => lines.push(line(
            title.clone(),
            LineStyle::Entry,
            LineAction::Run { title, command },
        )),
        PopupEntry::Submenu { title, entries, .. } => {
            let open = expanded.contains(&index);
            let marker = if open { "▾" } else { "▸" };
            lines.push(line(
                format!("{marker} {title}"),
                LineStyle::Submenu,
                LineAction::Toggle(index),
            ));
            if open {
                for child in entries {
                    push_entry(lines, index, child, depth + 1, expanded);
                }
            }
        }
        PopupEntry::EditCommands => lines.push(line(
            "Edit Commands".into(),
            LineStyle::Action,
            LineAction::EditCommands,
        )),
        PopupEntry::Reload => lines.push(line("Reload".into(), LineStyle::Action, LineAction::Reload)),
    }
}

/// Wrapping cursor step over `len` entries.
fn step(current: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as isize + delta).rem_euclid(len as isize) as usize
}

fn position(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index + 1
    }
}
