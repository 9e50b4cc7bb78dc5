use crate::codec;
use crate::error::CodecError;
use crate::model::Menu;

pub struct Template {
    pub name: &'static str,
    pub description: &'static str,
    source: &'static str,
}

pub const TEMPLATES: &[Template] = &[
    Template {
        name: "Simple Apps Menu",
        description: "A handful of everyday applications.",
        source: include_str!("../templates/simplemenu.json"),
    },
    Template {
        name: "Apple Menu",
        description: "A classic system menu with sleep, restart and log out.",
        source: include_str!("../templates/applemenu.json"),
    },
    Template {
        name: "Files Menu",
        description: "Shortcuts to common folders.",
        source: include_str!("../templates/filesmenu.json"),
    },
    Template {
        name: "Penguin Menu",
        description: "Applications and maintenance tasks in submenus.",
        source: include_str!("../templates/penguinmenu.json"),
    },
    Template {
        name: "System Menu",
        description: "Power and session actions.",
        source: include_str!("../templates/systemmenu.json"),
    },
];

impl Template {
    /// Decodes the template into a menu ready to be added to a session.
    pub fn menu(&self) -> Result<Menu, CodecError> {
        Ok(codec::decode(self.source.as_bytes())?
            .into_iter()
            .next()
            .unwrap_or_else(|| Menu::empty(0)))
    }
}
