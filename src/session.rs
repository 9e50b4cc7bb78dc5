use crate::codec;
use crate::error::{CodecError, SessionError};
use crate::model::{next_menu_id, Menu, MenuMeta, PanelPosition, DEFAULT_MENU_ICON};
use crate::store::Store;
use crate::tree::{self, Row};

/// Written when the commands file does not exist yet, or on reset.
pub const DEFAULT_CONFIG: &str = r#"[{ "icon": "utilities-terminal-symbolic", "menu": [] }]"#;

pub struct Session {
    menus: Vec<Menu>,
    store: Box<dyn Store>,
    load_error: Option<CodecError>,
    restart_counter: u64,
}

impl Session {
    /// Loads the menus, creating the file with the default content when it
    /// is missing. A file that cannot be decoded leaves one empty menu and
    /// keeps the error in [`Session::load_error`].
    pub fn open(store: Box<dyn Store>) -> Result<Self, SessionError> {
        let mut session = Session {
            menus: Vec::new(),
            store,
            load_error: None,
            restart_counter: 0,
        };
        session.load()?;
        Ok(session)
    }

    fn load(&mut self) -> Result<(), SessionError> {
        let bytes = match self.store.load()? {
            Some(bytes) => bytes,
            None => {
                tracing::info!(store = %self.store.describe(), "creating default configuration");
                self.store.save(DEFAULT_CONFIG.as_bytes())?;
                DEFAULT_CONFIG.as_bytes().to_vec()
            }
        };
        match codec::decode(&bytes) {
            Ok(menus) => {
                self.menus = menus;
                self.load_error = None;
            }
            Err(err) => {
                tracing::warn!(store = %self.store.describe(), error = %err, "could not parse configuration");
                self.menus = vec![Menu::empty(1)];
                self.load_error = Some(err);
            }
        }
        Ok(())
    }

    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    pub fn menu(&self, index: usize) -> Result<&Menu, SessionError> {
        self.menus.get(index).ok_or(SessionError::NoSuchMenu {
            index,
            len: self.menus.len(),
        })
    }

    pub fn load_error(&self) -> Option<&CodecError> {
        self.load_error.as_ref()
    }

    pub fn restart_counter(&self) -> u64 {
        self.restart_counter
    }

    pub fn store_description(&self) -> String {
        self.store.describe()
    }

    /// Re-reads the file, dropping unsaved state.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        self.load()?;
        self.trigger_refresh();
        Ok(())
    }

    /// Overwrites the file with the default configuration and reloads it.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        tracing::warn!(store = %self.store.describe(), "resetting configuration");
        self.store.save(DEFAULT_CONFIG.as_bytes())?;
        self.reload()
    }

    /// Appends `template`, or a fresh empty menu, and returns its index.
    pub fn add_menu(&mut self, template: Option<Menu>) -> Result<usize, SessionError> {
        self.mutate(|menus| {
            let id = next_menu_id(menus);
            let menu = match template {
                Some(template) => Menu { id, ..template },
                None => Menu {
                    title: Some(format!("Menu {}", menus.len() + 1)),
                    icon: Some(DEFAULT_MENU_ICON.to_string()),
                    position: PanelPosition::Left,
                    ..Menu::empty(id)
                },
            };
            menus.push(menu);
            Ok(menus.len() - 1)
        })
    }

    pub fn remove_menu(&mut self, index: usize) -> Result<Menu, SessionError> {
        self.mutate(|menus| {
            check_index(menus, index)?;
            Ok(menus.remove(index))
        })
    }

    pub fn swap_menus(&mut self, a: usize, b: usize) -> Result<(), SessionError> {
        self.mutate(|menus| {
            check_index(menus, a)?;
            check_index(menus, b)?;
            menus.swap(a, b);
            Ok(())
        })
    }

    /// Returns the menu's new index; the first menu stays put.
    pub fn move_menu_up(&mut self, index: usize) -> Result<usize, SessionError> {
        if index == 0 {
            check_index(&self.menus, index)?;
            return Ok(0);
        }
        self.swap_menus(index - 1, index)?;
        Ok(index - 1)
    }

    /// Returns the menu's new index; the last menu stays put.
    pub fn move_menu_down(&mut self, index: usize) -> Result<usize, SessionError> {
        check_index(&self.menus, index)?;
        if index + 1 == self.menus.len() {
            return Ok(index);
        }
        self.swap_menus(index, index + 1)?;
        Ok(index + 1)
    }

    pub fn update_menu_meta(&mut self, index: usize, meta: MenuMeta) -> Result<(), SessionError> {
        self.mutate(|menus| {
            check_index(menus, index)?;
            menus[index].apply_meta(meta);
            Ok(())
        })
    }

    /// Compiles edited rows into the menu's items and saves.
    pub fn save_menu_items(&mut self, index: usize, rows: &[Row]) -> Result<(), SessionError> {
        if let Some(gap) = tree::check_depths(rows) {
            tracing::warn!(
                row = gap.index,
                depth = gap.depth,
                max_depth = gap.max_depth,
                "row nested deeper than its parent allows, attaching to nearest submenu"
            );
        }
        let items = tree::compile(rows);
        self.mutate(|menus| {
            check_index(menus, index)?;
            menus[index].items = items;
            Ok(())
        })
    }

    /// A failed save puts the previous menus back.
    fn mutate<T>(
        &mut self,
        apply: impl FnOnce(&mut Vec<Menu>) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let snapshot = self.menus.clone();
        let value = apply(&mut self.menus)?;
        if let Err(err) = self.persist() {
            tracing::error!(store = %self.store.describe(), error = %err, "failed to save menus, rolling back");
            self.menus = snapshot;
            return Err(err);
        }
        self.trigger_refresh();
        Ok(value)
    }

    fn persist(&self) -> Result<(), SessionError> {
        let bytes = codec::encode(&self.menus)?;
        self.store.save(&bytes)?;
        tracing::debug!(store = %self.store.describe(), menus = self.menus.len(), "saved menus");
        Ok(())
    }

    fn trigger_refresh(&mut self) {
        self.restart_counter += 1;
    }
}

fn check_index(menus: &[Menu], index: usize) -> Result<(), SessionError> {
    if index < menus.len() {
        Ok(())
    } else {
        Err(SessionError::NoSuchMenu {
            index,
            len: menus.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MenuItem;
    use crate::store::MemoryStore;

    fn open(store: &MemoryStore) -> Session {
        Session::open(Box::new(store.clone())).unwrap()
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let store = MemoryStore::new();
        let session = open(&store);
        assert_eq!(store.contents().as_deref(), Some(DEFAULT_CONFIG.as_bytes()));
        assert_eq!(session.menus().len(), 1);
        assert_eq!(
            session.menus()[0].icon.as_deref(),
            Some("utilities-terminal-symbolic")
        );
        assert!(session.load_error().is_none());
    }

    #[test]
    fn unparsable_file_falls_back_to_empty_menu() {
        let store = MemoryStore::with_contents("{ broken");
        let mut session = open(&store);
        assert!(session.load_error().is_some());
        assert_eq!(session.menus(), &[Menu::empty(1)]);

        session.reset().unwrap();
        assert!(session.load_error().is_none());
        assert_eq!(store.contents().as_deref(), Some(DEFAULT_CONFIG.as_bytes()));
    }

    #[test]
    fn adding_after_u64_max_id_reuses_lowest_free() {
        let store = MemoryStore::with_contents(r#"[{"id":18446744073709551615,"menu":[]}]"#);
        let mut session = open(&store);
        assert_eq!(session.menus()[0].id, u64::MAX);
        let added = session.add_menu(None).unwrap();
        assert_eq!(session.menus()[added].id, 1);
        let added = session.add_menu(None).unwrap();
        assert_eq!(session.menus()[added].id, 2);
    }

    #[test]
    fn add_remove_swap_persist() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let added = session.add_menu(None).unwrap();
        assert_eq!(added, 1);
        assert_eq!(session.menus()[1].title.as_deref(), Some("Menu 2"));
        assert_ne!(session.menus()[0].id, session.menus()[1].id);

        session.swap_menus(0, 1).unwrap();
        assert_eq!(session.menus()[0].title.as_deref(), Some("Menu 2"));

        let removed = session.remove_menu(0).unwrap();
        assert_eq!(removed.title.as_deref(), Some("Menu 2"));

        let reloaded = codec::decode(&store.contents().unwrap()).unwrap();
        assert_eq!(reloaded, session.menus());
        assert_eq!(session.restart_counter(), 3);
    }

    #[test]
    fn failed_save_rolls_back() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        session.add_menu(None).unwrap();
        let before = session.menus().to_vec();
        let counter = session.restart_counter();
        let saved = store.contents();

        store.set_fail_saves(true);
        assert!(matches!(session.remove_menu(0), Err(SessionError::Store(_))));
        assert!(session.add_menu(None).is_err());
        assert!(session.swap_menus(0, 1).is_err());

        assert_eq!(session.menus(), before.as_slice());
        assert_eq!(session.restart_counter(), counter);
        assert_eq!(store.contents(), saved);
    }

    #[test]
    fn bad_index_changes_nothing() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let saves = store.save_count();
        assert!(matches!(
            session.remove_menu(4),
            Err(SessionError::NoSuchMenu { index: 4, len: 1 })
        ));
        assert_eq!(store.save_count(), saves);
    }

    #[test]
    fn move_up_and_down_stop_at_edges() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        session.add_menu(None).unwrap();
        assert_eq!(session.move_menu_up(0).unwrap(), 0);
        assert_eq!(session.move_menu_down(1).unwrap(), 1);
        assert_eq!(session.move_menu_down(0).unwrap(), 1);
        assert_eq!(session.menus()[0].title.as_deref(), Some("Menu 2"));
    }

    #[test]
    fn template_gets_fresh_id() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let template = Menu {
            title: Some("Template".into()),
            items: vec![MenuItem::command("a", "a")],
            ..Menu::empty(1)
        };
        let index = session.add_menu(Some(template)).unwrap();
        assert_eq!(session.menus()[index].id, 2);
        assert_eq!(session.menus()[index].items.len(), 1);
    }

    #[test]
    fn saving_rows_compiles_items() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let rows = vec![
            Row::submenu("Dev", 0),
            Row::command("Build", "make", 1),
            Row::command("Run", "./run", 0),
        ];
        session.save_menu_items(0, &rows).unwrap();
        assert_eq!(
            session.menus()[0].items,
            vec![
                MenuItem::submenu("Dev", vec![MenuItem::command("Build", "make")]),
                MenuItem::command("Run", "./run"),
            ]
        );
        let reloaded = codec::decode(&store.contents().unwrap()).unwrap();
        assert_eq!(reloaded[0].items, session.menus()[0].items);
    }

    #[test]
    fn meta_update_and_reload() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        session
            .update_menu_meta(
                0,
                MenuMeta {
                    title: Some("Tools".into()),
                    icon: None,
                    position: PanelPosition::Right,
                    index: 4,
                },
            )
            .unwrap();
        session.reload().unwrap();
        let menu = session.menu(0).unwrap();
        assert_eq!(menu.title.as_deref(), Some("Tools"));
        assert_eq!(menu.position, PanelPosition::Right);
        assert_eq!(menu.index, 4);
    }
}
