//! Rows are listed in pre-order: a submenu row is followed by all rows of its
//! children before its next sibling, so the rows after a row `R` with a depth
//! strictly greater than `R`'s form exactly the subtree of `R`.

use std::slice;

use crate::model::{ItemKind, MenuItem};

/// An owned, editable projection of one [`MenuItem`] without its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub kind: ItemKind,
    pub title: String,
    pub icon: Option<String>,
    pub command: String,
    pub depth: usize,
}

impl Row {
    pub fn new(kind: ItemKind, title: impl Into<String>, depth: usize) -> Self {
        Row {
            kind,
            title: title.into(),
            icon: None,
            command: String::new(),
            depth,
        }
    }

    pub fn command(title: impl Into<String>, command: impl Into<String>, depth: usize) -> Self {
        Row {
            command: command.into(),
            ..Row::new(ItemKind::Command, title, depth)
        }
    }

    pub fn separator(depth: usize) -> Self {
        Row::new(ItemKind::Separator, "", depth)
    }

    pub fn label(title: impl Into<String>, depth: usize) -> Self {
        Row::new(ItemKind::Label, title, depth)
    }

    pub fn submenu(title: impl Into<String>, depth: usize) -> Self {
        Row::new(ItemKind::Submenu, title, depth)
    }

    /// Builds the node this row stands for. Submenus come out empty; their
    /// children are the rows that follow.
    pub fn to_item(&self) -> MenuItem {
        let icon = self.icon.clone().filter(|icon| !icon.trim().is_empty());
        match self.kind {
            ItemKind::Command => MenuItem::Command {
                title: self.title.clone(),
                icon,
                command: self.command.clone(),
            },
            ItemKind::Separator => MenuItem::Separator,
            ItemKind::Label => MenuItem::Label {
                title: self.title.clone(),
            },
            ItemKind::Submenu => MenuItem::Submenu {
                title: self.title.clone(),
                icon,
                children: Vec::new(),
            },
        }
    }

    pub fn display_title(&self) -> String {
        match self.kind {
            ItemKind::Separator => "Separator".to_string(),
            ItemKind::Command if self.title.is_empty() => "Untitled".to_string(),
            ItemKind::Command => self.title.clone(),
            kind => format!("{}: {}", kind.label(), self.title),
        }
    }
}

/// A borrowed row produced by [`flatten`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRef<'a> {
    pub item: &'a MenuItem,
    pub depth: usize,
}

impl From<RowRef<'_>> for Row {
    fn from(row: RowRef<'_>) -> Self {
        let item = row.item;
        Row {
            kind: item.kind(),
            title: item.title().to_string(),
            icon: item.icon().map(str::to_string),
            command: match item {
                MenuItem::Command { command, .. } => command.clone(),
                _ => String::new(),
            },
            depth: row.depth,
        }
    }
}

/// Lazy pre-order walk over a list of items. A clone continues independently
/// from the same point.
#[derive(Clone, Debug)]
pub struct Flatten<'a> {
    stack: Vec<(slice::Iter<'a, MenuItem>, usize)>,
}

pub fn flatten(items: &[MenuItem], depth: usize) -> Flatten<'_> {
    Flatten {
        stack: vec![(items.iter(), depth)],
    }
}

impl<'a> Iterator for Flatten<'a> {
    type Item = RowRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (iter, depth) = self.stack.last_mut()?;
            let depth = *depth;
            match iter.next() {
                Some(item) => {
                    if let MenuItem::Submenu { children, .. } = item {
                        self.stack.push((children.iter(), depth + 1));
                    }
                    return Some(RowRef { item, depth });
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Owned rows for an editor, starting at depth 0.
pub fn rows(items: &[MenuItem]) -> Vec<Row> {
    flatten(items, 0).map(Row::from).collect()
}

struct OpenSubmenu {
    depth: usize,
    title: String,
    icon: Option<String>,
    children: Vec<MenuItem>,
}

impl OpenSubmenu {
    fn close(self) -> MenuItem {
        MenuItem::Submenu {
            title: self.title,
            icon: self.icon,
            children: self.children,
        }
    }
}

/// Rebuilds the tree from rows in one pass.
///
/// A row closes every open submenu whose depth is at or below its own, then
/// joins the innermost one still open.
pub fn compile(rows: &[Row]) -> Vec<MenuItem> {
    let mut root = Vec::new();
    let mut open: Vec<OpenSubmenu> = Vec::new();

    for row in rows {
        while open.last().is_some_and(|top| top.depth >= row.depth) {
            close_innermost(&mut open, &mut root);
        }
        match row.to_item() {
            MenuItem::Submenu { title, icon, .. } => open.push(OpenSubmenu {
                depth: row.depth,
                title,
                icon,
                children: Vec::new(),
            }),
            item => innermost(&mut open, &mut root).push(item),
        }
    }
    while !open.is_empty() {
        close_innermost(&mut open, &mut root);
    }
    root
}

fn innermost<'a>(open: &'a mut [OpenSubmenu], root: &'a mut Vec<MenuItem>) -> &'a mut Vec<MenuItem> {
    match open.last_mut() {
        Some(top) => &mut top.children,
        None => root,
    }
}

fn close_innermost(open: &mut Vec<OpenSubmenu>, root: &mut Vec<MenuItem>) {
    if let Some(top) = open.pop() {
        let item = top.close();
        innermost(open, root).push(item);
    }
}

/// A row nested deeper than its predecessor allows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthGap {
    pub index: usize,
    pub depth: usize,
    pub max_depth: usize,
}

/// Finds the first row whose depth exceeds the deepest level it could belong
/// to: one below the previous submenu row, or the previous row's own depth.
pub fn check_depths(rows: &[Row]) -> Option<DepthGap> {
    let mut max_depth = 0;
    for (index, row) in rows.iter().enumerate() {
        if row.depth > max_depth {
            return Some(DepthGap {
                index,
                depth: row.depth,
                max_depth,
            });
        }
        max_depth = if row.kind == ItemKind::Submenu {
            row.depth + 1
        } else {
            row.depth
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_rows() -> Vec<Row> {
        vec![
            Row::submenu("Dev", 0),
            Row::command("Build", "make", 1),
            Row::command("Test", "make test", 1),
            Row::command("Run", "./run", 0),
        ]
    }

    #[test]
    fn compile_nests_by_depth() {
        let tree = compile(&dev_rows());
        assert_eq!(
            tree,
            vec![
                MenuItem::submenu(
                    "Dev",
                    vec![
                        MenuItem::command("Build", "make"),
                        MenuItem::command("Test", "make test"),
                    ]
                ),
                MenuItem::command("Run", "./run"),
            ]
        );
        assert_eq!(rows(&tree), dev_rows());
    }

    #[test]
    fn flatten_is_preorder_with_depths() {
        let tree = vec![
            MenuItem::label("Top"),
            MenuItem::submenu(
                "A",
                vec![
                    MenuItem::submenu("B", vec![MenuItem::command("deep", "x")]),
                    MenuItem::Separator,
                ],
            ),
            MenuItem::command("last", "y"),
        ];
        let seen: Vec<(&str, usize)> = flatten(&tree, 0)
            .map(|row| (row.item.title(), row.depth))
            .collect();
        assert_eq!(
            seen,
            vec![("Top", 0), ("A", 0), ("B", 1), ("deep", 2), ("", 1), ("last", 0)]
        );
    }

    #[test]
    fn flatten_can_start_deeper() {
        let tree = vec![MenuItem::command("x", "x")];
        let depths: Vec<usize> = flatten(&tree, 3).map(|row| row.depth).collect();
        assert_eq!(depths, vec![3]);
    }

    #[test]
    fn empty_submenu_survives() {
        let rows = vec![Row::submenu("Empty", 0), Row::label("after", 0)];
        let tree = compile(&rows);
        assert_eq!(
            tree,
            vec![MenuItem::submenu("Empty", Vec::new()), MenuItem::label("after")]
        );
    }

    #[test]
    fn skipped_depths_collapse_leniently() {
        let rows = vec![
            Row::submenu("S", 0),
            Row::command("too deep", "x", 3),
            Row::command("back", "y", 1),
        ];
        let tree = compile(&rows);
        assert_eq!(
            tree,
            vec![MenuItem::submenu(
                "S",
                vec![MenuItem::command("too deep", "x"), MenuItem::command("back", "y")]
            )]
        );
        assert_eq!(
            check_depths(&rows),
            Some(DepthGap {
                index: 1,
                depth: 3,
                max_depth: 1
            })
        );
    }

    #[test]
    fn rows_under_a_leaf_attach_to_the_enclosing_level() {
        let rows = vec![Row::command("a", "a", 0), Row::command("b", "b", 1)];
        assert_eq!(
            compile(&rows),
            vec![MenuItem::command("a", "a"), MenuItem::command("b", "b")]
        );
        assert!(check_depths(&rows).is_some());
    }

    #[test]
    fn well_formed_rows_have_no_gap() {
        assert_eq!(check_depths(&dev_rows()), None);
        assert_eq!(check_depths(&[]), None);
    }

    #[test]
    fn blank_icon_is_dropped() {
        let mut row = Row::command("a", "a", 0);
        row.icon = Some("  ".into());
        assert_eq!(row.to_item(), MenuItem::command("a", "a"));
    }
}
