use serde::{Deserialize, Serialize};

pub const DEFAULT_PANEL_INDEX: i32 = 1;
pub const DEFAULT_MENU_ICON: &str = "utilities-terminal";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelPosition {
    #[default]
    Left,
    Center,
    Right,
}

impl PanelPosition {
    /// Unknown names fall back to `Left`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "center" => PanelPosition::Center,
            "right" => PanelPosition::Right,
            _ => PanelPosition::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PanelPosition::Left => "left",
            PanelPosition::Center => "center",
            PanelPosition::Right => "right",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelPosition::Left => PanelPosition::Center,
            PanelPosition::Center => PanelPosition::Right,
            PanelPosition::Right => PanelPosition::Left,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Command,
    Separator,
    Label,
    Submenu,
}

impl ItemKind {
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Command => "Command",
            ItemKind::Separator => "Separator",
            ItemKind::Label => "Label",
            ItemKind::Submenu => "Submenu",
        }
    }

    pub fn has_icon(self) -> bool {
        matches!(self, ItemKind::Command | ItemKind::Submenu)
    }

    pub fn has_title(self) -> bool {
        !matches!(self, ItemKind::Separator)
    }
}

/// One entry of a menu. Only `Submenu` owns children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuItem {
    Command {
        title: String,
        icon: Option<String>,
        command: String,
    },
    Separator,
    Label {
        title: String,
    },
    Submenu {
        title: String,
        icon: Option<String>,
        children: Vec<MenuItem>,
    },
}

impl MenuItem {
    pub fn command(title: impl Into<String>, command: impl Into<String>) -> Self {
        MenuItem::Command {
            title: title.into(),
            icon: None,
            command: command.into(),
        }
    }

    pub fn label(title: impl Into<String>) -> Self {
        MenuItem::Label {
            title: title.into(),
        }
    }

    pub fn submenu(title: impl Into<String>, children: Vec<MenuItem>) -> Self {
        MenuItem::Submenu {
            title: title.into(),
            icon: None,
            children,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            MenuItem::Command { .. } => ItemKind::Command,
            MenuItem::Separator => ItemKind::Separator,
            MenuItem::Label { .. } => ItemKind::Label,
            MenuItem::Submenu { .. } => ItemKind::Submenu,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MenuItem::Command { title, .. }
            | MenuItem::Label { title }
            | MenuItem::Submenu { title, .. } => title,
            MenuItem::Separator => "",
        }
    }

    pub fn icon(&self) -> Option<&str> {
        match self {
            MenuItem::Command { icon, .. } | MenuItem::Submenu { icon, .. } => icon.as_deref(),
            MenuItem::Separator | MenuItem::Label { .. } => None,
        }
    }

    pub fn children(&self) -> &[MenuItem] {
        match self {
            MenuItem::Submenu { children, .. } => children,
            _ => &[],
        }
    }
}

/// One top-level panel menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Menu {
    pub id: u64,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub position: PanelPosition,
    pub index: i32,
    pub items: Vec<MenuItem>,
}

impl Menu {
    pub fn empty(id: u64) -> Self {
        Menu {
            id,
            title: None,
            icon: None,
            position: PanelPosition::Left,
            index: DEFAULT_PANEL_INDEX,
            items: Vec::new(),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn meta(&self) -> MenuMeta {
        MenuMeta {
            title: self.title.clone(),
            icon: self.icon.clone(),
            position: self.position,
            index: self.index,
        }
    }

    pub fn apply_meta(&mut self, meta: MenuMeta) {
        self.title = meta.title;
        self.icon = meta.icon;
        self.position = meta.position;
        self.index = meta.index;
    }
}

/// The editable header fields of a [`Menu`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuMeta {
    pub title: Option<String>,
    pub icon: Option<String>,
    pub position: PanelPosition,
    pub index: i32,
}

/// Next id after the highest one in use. Once the highest is `u64::MAX`
/// the lowest unused id is handed out instead.
pub fn next_menu_id(menus: &[Menu]) -> u64 {
    match menus.iter().map(|menu| menu.id).max() {
        None => 1,
        Some(highest) => highest
            .checked_add(1)
            .unwrap_or_else(|| lowest_free_id(|id| menus.iter().any(|menu| menu.id == id))),
    }
}

pub(crate) fn lowest_free_id(taken: impl Fn(u64) -> bool) -> u64 {
    (1..=u64::MAX).find(|&id| !taken(id)).unwrap_or(0)
}
