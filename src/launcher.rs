//! The popup hides untitled entries and commands without a command string,
//! and only expands top-level submenus.

use std::process::Command;

use crate::model::{Menu, MenuItem};
use crate::settings::Settings;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PopupEntry {
    Separator,
    Label(String),
    Command {
        title: String,
        icon: Option<String>,
        command: String,
    },
    Submenu {
        title: String,
        icon: Option<String>,
        entries: Vec<PopupEntry>,
    },
    EditCommands,
    Reload,
}

pub fn popup_entries(menu: &Menu, settings: &Settings) -> Vec<PopupEntry> {
    let mut entries = Vec::new();
    collect(&menu.items, 0, &mut entries);

    let mut actions = Vec::new();
    if settings.edit_button_visible {
        actions.push(PopupEntry::EditCommands);
    }
    if settings.reload_button_visible {
        actions.push(PopupEntry::Reload);
    }
    if !actions.is_empty() {
        entries.push(PopupEntry::Separator);
        entries.extend(actions);
    }
    entries
}

fn collect(items: &[MenuItem], level: usize, out: &mut Vec<PopupEntry>) {
    for item in items {
        match item {
            MenuItem::Separator => out.push(PopupEntry::Separator),
            item if item.title().is_empty() => {}
            MenuItem::Label { title } => out.push(PopupEntry::Label(title.clone())),
            MenuItem::Submenu {
                title,
                icon,
                children,
            } if level == 0 => {
                let mut entries = Vec::new();
                collect(children, level + 1, &mut entries);
                out.push(PopupEntry::Submenu {
                    title: title.clone(),
                    icon: icon.clone(),
                    entries,
                });
            }
            MenuItem::Submenu { .. } => {}
            MenuItem::Command { command, .. } if command.trim().is_empty() => {}
            MenuItem::Command {
                title,
                icon,
                command,
            } => out.push(PopupEntry::Command {
                title: title.clone(),
                icon: icon.clone(),
                command: command.clone(),
            }),
        }
    }
}

/// Menu indices in panel order: left, center, right, each by panel index.
/// Ties keep file order.
pub fn panel_order(menus: &[Menu]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..menus.len()).collect();
    order.sort_by_key(|&i| (menus[i].position, menus[i].index));
    order
}

/// The shell invocation used to run a menu command.
pub fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}
