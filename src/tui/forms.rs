use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use command_menu::editor::RowFields;
use command_menu::model::{ItemKind, MenuMeta, PanelPosition};
use command_menu::settings::Settings;

use super::render::{make_field_line, make_toggle_line, plain_line, FormLine};
use super::Theme;

pub enum FormKeyResult<T> {
    Continue,
    Cancel,
    Submit(T),
}

fn edit_text(value: &mut String, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            value.pop();
        }
        KeyCode::Delete => value.clear(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => value.push(c),
        _ => {}
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowField {
    Title,
    Icon,
    Command,
}

/// Edits the text fields of one editor row. Which fields exist depends on
/// the row kind.
pub struct RowFormState {
    pub index: usize,
    pub kind: ItemKind,
    pub title: String,
    pub icon: String,
    pub command: String,
    pub selected_field: RowField,
}

impl RowFormState {
    /// `None` for kinds with nothing to edit.
    pub fn new(index: usize, kind: ItemKind, fields: RowFields) -> Option<Self> {
        let mut form = Self {
            index,
            kind,
            title: fields.title,
            icon: fields.icon.unwrap_or_default(),
            command: fields.command,
            selected_field: RowField::Title,
        };
        form.selected_field = *form.fields().first()?;
        Some(form)
    }

    pub fn fields(&self) -> Vec<RowField> {
        let mut fields = Vec::new();
        if self.kind.has_title() {
            fields.push(RowField::Title);
        }
        if self.kind.has_icon() {
            fields.push(RowField::Icon);
        }
        if self.kind == ItemKind::Command {
            fields.push(RowField::Command);
        }
        fields
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormKeyResult<RowFields> {
        match key.code {
            KeyCode::Esc => FormKeyResult::Cancel,
            KeyCode::Enter => FormKeyResult::Submit(self.to_fields()),
            KeyCode::Tab | KeyCode::Down => {
                self.step_field(1);
                FormKeyResult::Continue
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.step_field(-1);
                FormKeyResult::Continue
            }
            _ => {
                edit_text(self.active_value_mut(), key);
                FormKeyResult::Continue
            }
        }
    }

    pub fn to_fields(&self) -> RowFields {
        RowFields {
            title: self.title.trim().to_string(),
            icon: optional(&self.icon),
            command: self.command.trim().to_string(),
        }
    }

    pub fn render_lines(&self, theme: &Theme) -> Vec<FormLine> {
        let mut lines = vec![
            plain_line(format!("Editing a {} row.", self.kind.label().to_lowercase())),
            plain_line(""),
        ];
        for field in self.fields() {
            let (label, value) = match field {
                RowField::Title => ("Title", &self.title),
                RowField::Icon => ("Icon", &self.icon),
                RowField::Command => ("Command", &self.command),
            };
            lines.push(make_field_line(
                label,
                value,
                field == self.selected_field,
                theme,
            ));
        }
        lines
    }

    fn step_field(&mut self, step: isize) {
        let fields = self.fields();
        let Some(current) = fields.iter().position(|f| *f == self.selected_field) else {
            return;
        };
        let len = fields.len() as isize;
        let next = (current as isize + step).rem_euclid(len) as usize;
        self.selected_field = fields[next];
    }

    fn active_value_mut(&mut self) -> &mut String {
        match self.selected_field {
            RowField::Title => &mut self.title,
            RowField::Icon => &mut self.icon,
            RowField::Command => &mut self.command,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetaField {
    Title,
    Icon,
    Position,
    Index,
}

pub struct MetaFormState {
    pub menu_index: usize,
    pub title: String,
    pub icon: String,
    pub position: PanelPosition,
    pub index_value: String,
    pub selected_field: MetaField,
    pub error: Option<String>,
}

impl MetaFormState {
    pub fn new(menu_index: usize, meta: MenuMeta) -> Self {
        Self {
            menu_index,
            title: meta.title.unwrap_or_default(),
            icon: meta.icon.unwrap_or_default(),
            position: meta.position,
            index_value: meta.index.to_string(),
            selected_field: MetaField::Title,
            error: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormKeyResult<MenuMeta> {
        self.error = None;
        match key.code {
            KeyCode::Esc => FormKeyResult::Cancel,
            KeyCode::Enter => match self.to_meta() {
                Ok(meta) => FormKeyResult::Submit(meta),
                Err(err) => {
                    self.error = Some(err);
                    FormKeyResult::Continue
                }
            },
            KeyCode::Tab | KeyCode::Down => {
                self.next_field();
                FormKeyResult::Continue
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.previous_field();
                FormKeyResult::Continue
            }
            KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right
                if self.selected_field == MetaField::Position =>
            {
                self.position = self.position.next();
                FormKeyResult::Continue
            }
            _ => {
                if let Some(value) = self.active_value_mut() {
                    edit_text(value, key);
                }
                FormKeyResult::Continue
            }
        }
    }

    pub fn to_meta(&self) -> Result<MenuMeta, String> {
        let index = self
            .index_value
            .trim()
            .parse::<i32>()
            .map_err(|_| "Panel index must be a whole number".to_string())?;
        Ok(MenuMeta {
            title: optional(&self.title),
            icon: optional(&self.icon),
            position: self.position,
            index,
        })
    }

    pub fn render_lines(&self, theme: &Theme) -> Vec<FormLine> {
        let mut lines = vec![
            plain_line("Menu title, icon and panel placement."),
            plain_line(""),
            make_field_line("Title", &self.title, self.selected_field == MetaField::Title, theme),
            make_field_line("Icon", &self.icon, self.selected_field == MetaField::Icon, theme),
            make_field_line(
                "Position",
                self.position.as_str(),
                self.selected_field == MetaField::Position,
                theme,
            ),
            make_field_line(
                "Index",
                &self.index_value,
                self.selected_field == MetaField::Index,
                theme,
            ),
        ];
        if let Some(err) = &self.error {
            lines.push(plain_line(""));
            lines.push(plain_line(format!("Error: {err}")));
        }
        lines
    }

    fn next_field(&mut self) {
        self.selected_field = match self.selected_field {
            MetaField::Title => MetaField::Icon,
            MetaField::Icon => MetaField::Position,
            MetaField::Position => MetaField::Index,
            MetaField::Index => MetaField::Title,
        };
    }

    fn previous_field(&mut self) {
        self.selected_field = match self.selected_field {
            MetaField::Title => MetaField::Index,
            MetaField::Icon => MetaField::Title,
            MetaField::Position => MetaField::Icon,
            MetaField::Index => MetaField::Position,
        };
    }

    fn active_value_mut(&mut self) -> Option<&mut String> {
        match self.selected_field {
            MetaField::Title => Some(&mut self.title),
            MetaField::Icon => Some(&mut self.icon),
            MetaField::Index => Some(&mut self.index_value),
            MetaField::Position => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsField {
    ConfigPath,
    EditButton,
    ReloadButton,
}

pub struct SettingsFormState {
    pub config_filepath: String,
    pub edit_button_visible: bool,
    pub reload_button_visible: bool,
    pub selected_field: SettingsField,
}

impl SettingsFormState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            config_filepath: settings.config_filepath.clone(),
            edit_button_visible: settings.edit_button_visible,
            reload_button_visible: settings.reload_button_visible,
            selected_field: SettingsField::ConfigPath,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormKeyResult<Settings> {
        match key.code {
            KeyCode::Esc => FormKeyResult::Cancel,
            KeyCode::Enter => FormKeyResult::Submit(self.to_settings()),
            KeyCode::Tab | KeyCode::Down => {
                self.selected_field = match self.selected_field {
                    SettingsField::ConfigPath => SettingsField::EditButton,
                    SettingsField::EditButton => SettingsField::ReloadButton,
                    SettingsField::ReloadButton => SettingsField::ConfigPath,
                };
                FormKeyResult::Continue
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.selected_field = match self.selected_field {
                    SettingsField::ConfigPath => SettingsField::ReloadButton,
                    SettingsField::EditButton => SettingsField::ConfigPath,
                    SettingsField::ReloadButton => SettingsField::EditButton,
                };
                FormKeyResult::Continue
            }
            KeyCode::Char(' ') if self.selected_field == SettingsField::EditButton => {
                self.edit_button_visible = !self.edit_button_visible;
                FormKeyResult::Continue
            }
            KeyCode::Char(' ') if self.selected_field == SettingsField::ReloadButton => {
                self.reload_button_visible = !self.reload_button_visible;
                FormKeyResult::Continue
            }
            _ => {
                if self.selected_field == SettingsField::ConfigPath {
                    edit_text(&mut self.config_filepath, key);
                }
                FormKeyResult::Continue
            }
        }
    }

    pub fn to_settings(&self) -> Settings {
        let path = self.config_filepath.trim();
        Settings {
            config_filepath: if path.is_empty() {
                Settings::default().config_filepath
            } else {
                path.to_string()
            },
            edit_button_visible: self.edit_button_visible,
            reload_button_visible: self.reload_button_visible,
        }
    }

    pub fn render_lines(&self, theme: &Theme) -> Vec<FormLine> {
        vec![
            plain_line("A new commands file path is used from the next start."),
            plain_line(""),
            make_field_line(
                "Commands file",
                &self.config_filepath,
                self.selected_field == SettingsField::ConfigPath,
                theme,
            ),
            make_toggle_line(
                "Show Edit Commands",
                self.edit_button_visible,
                self.selected_field == SettingsField::EditButton,
                theme,
            ),
            make_toggle_line(
                "Show Reload",
                self.reload_button_visible,
                self.selected_field == SettingsField::ReloadButton,
                theme,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut MetaFormState, text: &str) {
        for c in text.chars() {
            let _ = form.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn separator_rows_have_no_form() {
        assert!(RowFormState::new(0, ItemKind::Separator, RowFields::default()).is_none());
    }

    #[test]
    fn label_form_only_cycles_title() {
        let mut form = RowFormState::new(0, ItemKind::Label, RowFields::default()).unwrap();
        assert_eq!(form.fields(), vec![RowField::Title]);
        let _ = form.handle_key(key(KeyCode::Tab));
        assert_eq!(form.selected_field, RowField::Title);
    }

    #[test]
    fn command_form_edits_the_selected_field() {
        let fields = RowFields {
            title: "Run".into(),
            icon: None,
            command: "ls".into(),
        };
        let mut form = RowFormState::new(2, ItemKind::Command, fields).unwrap();
        let _ = form.handle_key(key(KeyCode::Up));
        assert_eq!(form.selected_field, RowField::Command);
        let _ = form.handle_key(key(KeyCode::Char(' ')));
        let _ = form.handle_key(key(KeyCode::Char('-')));
        let _ = form.handle_key(key(KeyCode::Char('l')));
        match form.handle_key(key(KeyCode::Enter)) {
            FormKeyResult::Submit(fields) => {
                assert_eq!(fields.command, "ls -l");
                assert_eq!(fields.title, "Run");
                assert_eq!(fields.icon, None);
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn meta_form_rejects_non_numeric_index() {
        let meta = MenuMeta {
            title: None,
            icon: None,
            position: PanelPosition::Left,
            index: 1,
        };
        let mut form = MetaFormState::new(0, meta);
        form.selected_field = MetaField::Index;
        let _ = form.handle_key(key(KeyCode::Delete));
        type_text(&mut form, "x");
        assert!(matches!(form.handle_key(key(KeyCode::Enter)), FormKeyResult::Continue));
        assert!(form.error.is_some());
    }

    #[test]
    fn meta_form_cycles_position_and_trims_title() {
        let meta = MenuMeta {
            title: Some("Apps".into()),
            icon: None,
            position: PanelPosition::Left,
            index: 1,
        };
        let mut form = MetaFormState::new(0, meta);
        type_text(&mut form, "  ");
        form.selected_field = MetaField::Position;
        let _ = form.handle_key(key(KeyCode::Char(' ')));
        let meta = form.to_meta().unwrap();
        assert_eq!(meta.title.as_deref(), Some("Apps"));
        assert_eq!(meta.position, PanelPosition::Center);
    }

    #[test]
    fn settings_form_toggles_buttons() {
        let mut form = SettingsFormState::new(&Settings::default());
        let _ = form.handle_key(key(KeyCode::Down));
        let _ = form.handle_key(key(KeyCode::Char(' ')));
        let settings = form.to_settings();
        assert!(!settings.edit_button_visible);
        assert!(settings.reload_button_visible);
    }
}
