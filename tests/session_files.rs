use std::fs;
use std::path::Path;

use command_menu::codec;
use command_menu::editor::ItemEditor;
use command_menu::model::{MenuItem, PanelPosition};
use command_menu::session::{Session, DEFAULT_CONFIG};
use command_menu::store::FileStore;
use command_menu::templates::TEMPLATES;
use command_menu::SessionError;
use tempfile::TempDir;

fn open(path: &Path) -> Session {
    Session::open(Box::new(FileStore::new(path))).unwrap()
}

#[test]
fn missing_file_is_created_in_a_new_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("commands.json");
    let session = open(&path);
    assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    assert_eq!(session.menus().len(), 1);
    assert_eq!(session.store_description(), path.display().to_string());
}

#[test]
fn legacy_bare_items_file_is_rewritten_as_menu_list() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands.json");
    fs::write(
        &path,
        r#"[
            { "title": "Terminal", "command": "gnome-terminal", "icon": "" },
            { "type": "separator" },
            { "title": "Tools", "type": "submenu", "submenu": [ { "title": "Top", "command": "top" } ] }
        ]"#,
    )
    .unwrap();

    let mut session = open(&path);
    assert_eq!(session.menus().len(), 1);
    session.add_menu(None).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let menus = written.as_array().unwrap();
    assert_eq!(menus.len(), 2);
    let first = &menus[0]["menu"];
    assert_eq!(first[0]["title"], "Terminal");
    assert!(first[0].get("icon").is_none());
    assert!(first[0].get("type").is_none());
    assert_eq!(first[1]["type"], "separator");
    assert_eq!(first[2]["submenu"][0]["command"], "top");
    assert_eq!(menus[1]["title"], "Menu 2");
}

#[test]
fn edits_survive_reopening() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands.json");
    let mut session = open(&path);

    let template = TEMPLATES
        .iter()
        .find(|template| template.name == "System Menu")
        .unwrap();
    let added = session.add_menu(Some(template.menu().unwrap())).unwrap();

    let mut editor = ItemEditor::open(added, session.menu(added).unwrap());
    let last = editor.len() - 1;
    let drag = editor.begin_drag(last).unwrap();
    editor.drop_on(drag, 0).unwrap();
    session.save_menu_items(added, editor.rows()).unwrap();
    session.move_menu_up(added).unwrap();

    let reopened = open(&path);
    assert_eq!(reopened.menus(), session.menus());
    let menu = &reopened.menus()[0];
    assert_eq!(menu.position, PanelPosition::Right);
    assert_eq!(menu.items, editor.compile());
}

#[test]
fn failed_write_rolls_back() {
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("config");
    let path = config_dir.join("commands.json");
    let mut session = open(&path);
    let before = session.menus().to_vec();
    let counter = session.restart_counter();

    // A plain file where the directory should be makes every save fail.
    fs::remove_dir_all(&config_dir).unwrap();
    fs::write(&config_dir, "not a directory").unwrap();

    let err = session.add_menu(None).unwrap_err();
    assert!(matches!(err, SessionError::Store(_)));
    assert_eq!(session.menus(), before.as_slice());
    assert_eq!(session.restart_counter(), counter);

    let rows = vec![command_menu::Row::command("x", "true", 0)];
    assert!(session.save_menu_items(0, &rows).is_err());
    assert_eq!(session.menus(), before.as_slice());
}

#[test]
fn unreadable_file_can_be_reset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands.json");
    fs::write(&path, "[{ oops").unwrap();

    let mut session = open(&path);
    assert!(session.load_error().is_some());
    assert_eq!(fs::read_to_string(&path).unwrap(), "[{ oops");

    session.reset().unwrap();
    assert!(session.load_error().is_none());
    let menus = codec::decode(fs::read_to_string(&path).unwrap().as_bytes()).unwrap();
    assert_eq!(menus, session.menus());
    assert_eq!(menus[0].items, Vec::<MenuItem>::new());
}
