use std::ops::Range;

use crate::drag::DragSession;
use crate::error::MoveError;
use crate::model::{ItemKind, Menu, MenuItem, DEFAULT_MENU_ICON};
use crate::reorder;
use crate::tree::{self, Row};

/// Text fields of a row that the editor lets users change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowFields {
    pub title: String,
    pub icon: Option<String>,
    pub command: String,
}

/// Editing state for the items of one menu.
///
/// The rows are the single source of truth while editing; [`compile`]
/// turns them back into a tree when the menu is saved.
///
/// [`compile`]: ItemEditor::compile
#[derive(Debug, Clone)]
pub struct ItemEditor {
    menu_index: usize,
    rows: Vec<Row>,
    revision: u64,
    dirty: bool,
}

impl ItemEditor {
    pub fn open(menu_index: usize, menu: &Menu) -> Self {
        Self {
            menu_index,
            rows: tree::rows(&menu.items),
            revision: 0,
            dirty: false,
        }
    }

    pub fn menu_index(&self) -> usize {
        self.menu_index
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn compile(&self) -> Vec<MenuItem> {
        tree::compile(&self.rows)
    }

    pub fn fields(&self, index: usize) -> Option<RowFields> {
        self.rows.get(index).map(|row| RowFields {
            title: row.title.clone(),
            icon: row.icon.clone(),
            command: row.command.clone(),
        })
    }

    /// Field edits keep the row where it is, so a running drag stays valid.
    pub fn update_fields(&mut self, index: usize, fields: RowFields) -> Result<(), MoveError> {
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or(MoveError::OutOfRange { index, len })?;
        if row.kind.has_title() {
            row.title = fields.title;
        }
        if row.kind.has_icon() {
            row.icon = fields.icon.filter(|icon| !icon.trim().is_empty());
        }
        if row.kind == ItemKind::Command {
            row.command = fields.command;
        }
        self.dirty = true;
        Ok(())
    }

    /// Adds a new top-level row of `kind` at the top of the list.
    pub fn add(&mut self, kind: ItemKind) -> usize {
        self.rows.insert(0, new_row(kind, 0));
        self.touch();
        0
    }

    /// Inserts a new row of `kind` just before `index`, at the same depth.
    pub fn insert_before(&mut self, index: usize, kind: ItemKind) -> Result<usize, MoveError> {
        let depth = self.rows.get(index).map_or(0, |row| row.depth);
        reorder::insert_row(&mut self.rows, index, new_row(kind, depth))?;
        self.touch();
        Ok(index)
    }

    pub fn delete(&mut self, index: usize) -> Result<Vec<Row>, MoveError> {
        let removed = reorder::delete_subtree(&mut self.rows, index)?;
        self.touch();
        Ok(removed)
    }

    pub fn duplicate(&mut self, index: usize) -> Result<Range<usize>, MoveError> {
        let copy = reorder::duplicate_subtree(&mut self.rows, index)?;
        self.touch();
        Ok(copy)
    }

    pub fn begin_drag(&self, index: usize) -> Option<DragSession> {
        (index < self.rows.len()).then(|| DragSession::new(index, self.revision))
    }

    /// Ends a drag by dropping onto `target`. The session is consumed either
    /// way; a rejected drop leaves the rows unchanged.
    pub fn drop_on(&mut self, session: DragSession, target: usize) -> Result<Range<usize>, MoveError> {
        if session.revision() != self.revision {
            tracing::debug!(source = session.source(), "stale drag rejected");
            return Err(MoveError::StaleDrag);
        }
        let moved = reorder::move_subtree(&mut self.rows, session.source(), target)?;
        self.touch();
        Ok(moved)
    }

    pub fn cancel_drag(&self, session: DragSession) {
        tracing::debug!(source = session.source(), "drag cancelled");
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.dirty = true;
    }
}

fn new_row(kind: ItemKind, depth: usize) -> Row {
    match kind {
        ItemKind::Command => Row {
            icon: Some(DEFAULT_MENU_ICON.to_string()),
            ..Row::command("New Command", "notify-send hello", depth)
        },
        ItemKind::Separator => Row::separator(depth),
        ItemKind::Label => Row::label("New Label", depth),
        ItemKind::Submenu => Row::submenu("New Submenu", depth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_menu() -> Menu {
        Menu {
            items: vec![
                MenuItem::submenu(
                    "Dev",
                    vec![MenuItem::command("Build", "make"), MenuItem::command("Test", "make test")],
                ),
                MenuItem::command("Run", "./run"),
            ],
            ..Menu::empty(1)
        }
    }

    #[test]
    fn open_then_compile_is_identity() {
        let menu = dev_menu();
        let editor = ItemEditor::open(0, &menu);
        assert_eq!(editor.len(), 4);
        assert_eq!(editor.compile(), menu.items);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn drag_and_drop_moves_rows() {
        let mut editor = ItemEditor::open(0, &dev_menu());
        let session = editor.begin_drag(1).unwrap();
        editor.drop_on(session, 3).unwrap();
        assert_eq!(
            editor.compile(),
            vec![
                MenuItem::submenu("Dev", vec![MenuItem::command("Test", "make test")]),
                MenuItem::command("Run", "./run"),
                MenuItem::command("Build", "make"),
            ]
        );
        assert!(editor.is_dirty());
    }

    #[test]
    fn drag_after_structural_edit_is_stale() {
        let mut editor = ItemEditor::open(0, &dev_menu());
        let session = editor.begin_drag(3).unwrap();
        editor.add(ItemKind::Separator);
        let before = editor.rows().to_vec();
        assert_eq!(editor.drop_on(session, 0), Err(MoveError::StaleDrag));
        assert_eq!(editor.rows(), before.as_slice());
    }

    #[test]
    fn field_edits_keep_drag_valid() {
        let mut editor = ItemEditor::open(0, &dev_menu());
        let session = editor.begin_drag(3).unwrap();
        editor
            .update_fields(
                3,
                RowFields {
                    title: "Run it".into(),
                    icon: Some("media-playback-start".into()),
                    command: "./run --fast".into(),
                },
            )
            .unwrap();
        editor.drop_on(session, 0).unwrap();
        assert_eq!(
            editor.compile()[0],
            MenuItem::Command {
                title: "Run it".into(),
                icon: Some("media-playback-start".into()),
                command: "./run --fast".into(),
            }
        );
    }

    #[test]
    fn rejected_drop_still_consumes_session() {
        let mut editor = ItemEditor::open(0, &dev_menu());
        let session = editor.begin_drag(0).unwrap();
        assert_eq!(editor.drop_on(session, 2), Err(MoveError::IntoOwnSubtree));
        assert!(!editor.is_dirty());
        assert!(editor.begin_drag(9).is_none());
    }

    #[test]
    fn separator_ignores_text_fields() {
        let mut editor = ItemEditor::open(0, &Menu::empty(1));
        editor.add(ItemKind::Separator);
        editor
            .update_fields(
                0,
                RowFields {
                    title: "ignored".into(),
                    icon: Some("x".into()),
                    command: "y".into(),
                },
            )
            .unwrap();
        assert_eq!(editor.compile(), vec![MenuItem::Separator]);
    }

    #[test]
    fn insert_before_uses_neighbour_depth() {
        let mut editor = ItemEditor::open(0, &dev_menu());
        editor.insert_before(2, ItemKind::Label).unwrap();
        assert_eq!(
            editor.compile()[0],
            MenuItem::submenu(
                "Dev",
                vec![
                    MenuItem::command("Build", "make"),
                    MenuItem::label("New Label"),
                    MenuItem::command("Test", "make test"),
                ]
            )
        );
    }
}
