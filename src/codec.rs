//! Three top-level shapes are accepted, checked in this order:
//!
//! 1. an object with a `menu` array: one menu;
//! 2. a non-empty array whose first element is an array or a menu object:
//!    one menu per element;
//! 3. any other array: a single menu made of those items.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CodecError;
use crate::model::{lowest_free_id, Menu, MenuItem, PanelPosition, DEFAULT_PANEL_INDEX};

#[derive(Debug, Default, Deserialize)]
struct ItemRecord {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    submenu: Option<Value>,
}

#[derive(Serialize)]
struct ItemOut<'a> {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submenu: Option<Vec<ItemOut<'a>>>,
}

#[derive(Serialize)]
struct MenuOut<'a> {
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    position: PanelPosition,
    index: i32,
    menu: Vec<ItemOut<'a>>,
}

enum Shape<'a> {
    MenuObject(&'a Map<String, Value>),
    MenuList(&'a [Value]),
    BareItems(&'a [Value]),
    Unknown,
}

impl<'a> Shape<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::Object(map) if is_menu_object(map) => Shape::MenuObject(map),
            Value::Array(values) => match values.first() {
                Some(Value::Array(_)) => Shape::MenuList(values),
                Some(Value::Object(map)) if is_menu_object(map) => Shape::MenuList(values),
                _ => Shape::BareItems(values),
            },
            _ => Shape::Unknown,
        }
    }
}

fn is_menu_object(map: &Map<String, Value>) -> bool {
    matches!(map.get("menu"), Some(Value::Array(_)))
}

/// A menu as read from disk, before ids are settled.
struct Decoded {
    id: Option<u64>,
    menu: Menu,
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Menu>, CodecError> {
    let value: Value = serde_json::from_slice(bytes)?;
    decode_value(&value)
}

pub fn decode_value(value: &Value) -> Result<Vec<Menu>, CodecError> {
    let decoded = match Shape::of(value) {
        Shape::MenuObject(map) => vec![decode_menu_object(map, "$")?],
        Shape::MenuList(values) => values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let path = format!("$[{i}]");
                match value {
                    Value::Object(map) if is_menu_object(map) => decode_menu_object(map, &path),
                    Value::Array(items) => Ok(Decoded {
                        id: None,
                        menu: Menu {
                            items: decode_items(items, &path)?,
                            ..Menu::empty(0)
                        },
                    }),
                    _ => {
                        tracing::warn!(%path, "entry is not a menu, using an empty one");
                        Ok(Decoded {
                            id: None,
                            menu: Menu::empty(0),
                        })
                    }
                }
            })
            .collect::<Result<Vec<_>, _>>()?,
        Shape::BareItems(values) => vec![Decoded {
            id: None,
            menu: Menu {
                items: decode_items(values, "$")?,
                ..Menu::empty(0)
            },
        }],
        Shape::Unknown => {
            tracing::warn!("commands file has no menu, using an empty one");
            vec![Decoded {
                id: None,
                menu: Menu::empty(0),
            }]
        }
    };
    Ok(settle_ids(decoded))
}

/// Keeps explicit ids that are unique and numbers the rest after the highest.
fn settle_ids(decoded: Vec<Decoded>) -> Vec<Menu> {
    let explicit: HashSet<u64> = decoded.iter().filter_map(|d| d.id).collect();
    let mut next = explicit.iter().max().map_or(Some(1), |id| id.checked_add(1));
    let mut used = HashSet::new();
    decoded
        .into_iter()
        .map(|Decoded { id, mut menu }| {
            menu.id = match id {
                Some(id) if used.insert(id) => id,
                _ => {
                    let taken = |id: u64| used.contains(&id) || explicit.contains(&id);
                    let id = loop {
                        match next {
                            Some(candidate) if taken(candidate) => next = candidate.checked_add(1),
                            Some(candidate) => break candidate,
                            None => break lowest_free_id(taken),
                        }
                    };
                    used.insert(id);
                    next = id.checked_add(1);
                    id
                }
            };
            menu
        })
        .collect()
}

/// Header fields of the wrong type are treated as absent.
fn decode_menu_object(map: &Map<String, Value>, path: &str) -> Result<Decoded, CodecError> {
    let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_owned);
    let items = match map.get("menu") {
        Some(Value::Array(values)) => decode_items(values, &format!("{path}.menu"))?,
        _ => Vec::new(),
    };
    Ok(Decoded {
        id: map.get("id").and_then(Value::as_u64),
        menu: Menu {
            id: 0,
            title: text("title"),
            icon: text("icon"),
            position: text("position")
                .as_deref()
                .map(PanelPosition::from_name)
                .unwrap_or_default(),
            index: map
                .get("index")
                .and_then(parse_index)
                .unwrap_or(DEFAULT_PANEL_INDEX),
            items,
        },
    })
}

/// Accepts integral numbers and numeric strings.
fn parse_index(value: &Value) -> Option<i32> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return i32::try_from(int).ok();
            }
            let float = number.as_f64()?;
            if float.fract() == 0.0 && float >= f64::from(i32::MIN) && float <= f64::from(i32::MAX)
            {
                Some(float as i32)
            } else {
                None
            }
        }
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn decode_items(values: &[Value], path: &str) -> Result<Vec<MenuItem>, CodecError> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| decode_item(value, &format!("{path}[{i}]")))
        .collect()
}

fn decode_item(value: &Value, path: &str) -> Result<MenuItem, CodecError> {
    let record = ItemRecord::deserialize(value).map_err(|source| CodecError::Item {
        path: path.to_string(),
        source,
    })?;
    let title = record.title.unwrap_or_default();
    let item = match record.kind.as_deref() {
        Some("separator") => MenuItem::Separator,
        Some("label") => MenuItem::Label { title },
        Some("submenu") => {
            let children = match &record.submenu {
                Some(Value::Array(values)) => decode_items(values, &format!("{path}.submenu"))?,
                _ => Vec::new(),
            };
            MenuItem::Submenu {
                title,
                icon: non_empty(record.icon),
                children,
            }
        }
        _ => MenuItem::Command {
            title,
            icon: non_empty(record.icon),
            command: record.command.unwrap_or_default(),
        },
    };
    Ok(item)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

pub fn encode(menus: &[Menu]) -> Result<Vec<u8>, CodecError> {
    let out: Vec<MenuOut<'_>> = menus.iter().map(menu_out).collect();
    let mut bytes = serde_json::to_vec_pretty(&out)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn menu_out(menu: &Menu) -> MenuOut<'_> {
    MenuOut {
        id: menu.id,
        title: menu.title.as_deref(),
        icon: menu.icon.as_deref(),
        position: menu.position,
        index: menu.index,
        menu: menu.items.iter().map(item_out).collect(),
    }
}

fn item_out(item: &MenuItem) -> ItemOut<'_> {
    match item {
        MenuItem::Command {
            title,
            icon,
            command,
        } => ItemOut {
            kind: None,
            title: Some(title),
            icon: icon.as_deref(),
            command: Some(command),
            submenu: None,
        },
        MenuItem::Separator => ItemOut {
            kind: Some("separator"),
            title: None,
            icon: None,
            command: None,
            submenu: None,
        },
        MenuItem::Label { title } => ItemOut {
            kind: Some("label"),
            title: Some(title),
            icon: None,
            command: None,
            submenu: None,
        },
        MenuItem::Submenu {
            title,
            icon,
            children,
        } => ItemOut {
            kind: Some("submenu"),
            title: Some(title),
            icon: icon.as_deref(),
            command: None,
            submenu: Some(children.iter().map(item_out).collect()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_json(value: Value) -> Vec<Menu> {
        decode(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn bare_array_is_one_menu() {
        let menus = decode_json(json!([{ "title": "A", "command": "echo A" }]));
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].items, vec![MenuItem::command("A", "echo A")]);
        assert_eq!(menus[0].index, DEFAULT_PANEL_INDEX);
        assert_eq!(menus[0].position, PanelPosition::Left);
    }

    #[test]
    fn menu_object_and_list_of_one_agree() {
        let items = json!([
            { "type": "label", "title": "Tools" },
            { "title": "Top", "command": "htop" }
        ]);
        let single = decode_json(json!({ "title": "T", "menu": items.clone() }));
        let listed = decode_json(json!([{ "title": "T", "menu": items }]));
        assert_eq!(single, listed);
        assert_eq!(single[0].title.as_deref(), Some("T"));
        assert_eq!(single[0].items.len(), 2);
    }

    #[test]
    fn list_of_arrays_and_objects() {
        let menus = decode_json(json!([
            [{ "title": "one", "command": "1" }],
            { "menu": [], "position": "Right", "index": "3" },
            42
        ]));
        assert_eq!(menus.len(), 3);
        assert_eq!(menus[0].items.len(), 1);
        assert_eq!(menus[1].position, PanelPosition::Right);
        assert_eq!(menus[1].index, 3);
        assert!(menus[2].items.is_empty());
    }

    #[test]
    fn empty_array_and_plain_object_give_one_empty_menu() {
        assert_eq!(decode_json(json!([])).len(), 1);
        let menus = decode_json(json!({ "title": "no menu key" }));
        assert_eq!(menus.len(), 1);
        assert!(menus[0].items.is_empty());
    }

    #[test]
    fn item_kinds() {
        let menus = decode_json(json!([
            { "type": "separator" },
            { "type": "submenu", "title": "Dev", "icon": "code", "submenu": [
                { "title": "Build", "command": "make" }
            ]},
            { "type": "submenu", "title": "Empty" },
            { "type": "mystery", "title": "X", "command": "x" }
        ]));
        let items = &menus[0].items;
        assert_eq!(items[0], MenuItem::Separator);
        assert_eq!(
            items[1],
            MenuItem::Submenu {
                title: "Dev".into(),
                icon: Some("code".into()),
                children: vec![MenuItem::command("Build", "make")],
            }
        );
        assert_eq!(items[2], MenuItem::submenu("Empty", Vec::new()));
        assert_eq!(items[3], MenuItem::command("X", "x"));
    }

    #[test]
    fn index_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_index(&json!(4)), Some(4));
        assert_eq!(parse_index(&json!(2.0)), Some(2));
        assert_eq!(parse_index(&json!(" 7 ")), Some(7));
        assert_eq!(parse_index(&json!(2.5)), None);
        assert_eq!(parse_index(&json!("left")), None);
        assert_eq!(parse_index(&json!(null)), None);
    }

    #[test]
    fn ids_are_kept_or_assigned_uniquely() {
        let menus = decode_json(json!([
            { "id": 5, "menu": [] },
            { "menu": [] },
            { "id": 5, "menu": [] }
        ]));
        let ids: Vec<u64> = menus.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![5, 6, 7]);
    }

    #[test]
    fn ids_after_u64_max_start_from_lowest_free() {
        let menus = decode_json(json!([
            { "id": u64::MAX, "menu": [] },
            { "menu": [] },
            { "id": 1, "menu": [] },
            { "id": u64::MAX, "menu": [] }
        ]));
        let ids: Vec<u64> = menus.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![u64::MAX, 2, 1, 3]);
    }

    #[test]
    fn wrong_typed_header_fields_are_ignored() {
        let menus =
            decode(br#"{ "position": 2, "menu": [ {"title":"A","command":"a"} ] }"#).unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].position, PanelPosition::Left);
        assert_eq!(menus[0].items, vec![MenuItem::command("A", "a")]);

        let menus = decode_json(json!([
            { "id": "x", "title": 7, "icon": false, "menu": [] },
            { "id": -1, "menu": [] },
            { "id": 4, "menu": [] }
        ]));
        let ids: Vec<u64> = menus.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![5, 6, 4]);
        assert_eq!(menus[0].title, None);
        assert_eq!(menus[0].icon, None);
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(decode(b"{ not json"), Err(CodecError::Json(_))));
        let err = decode(br#"[{ "title": 5, "command": "x" }]"#).unwrap_err();
        match err {
            CodecError::Item { path, .. } => assert_eq!(path, "$[0]"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn encode_writes_normalized_shape() {
        let menu = Menu {
            id: 1,
            title: Some("Main".into()),
            icon: None,
            position: PanelPosition::Center,
            index: 2,
            items: vec![
                MenuItem::command("A", "echo A"),
                MenuItem::Separator,
                MenuItem::submenu("Sub", vec![MenuItem::label("L")]),
            ],
        };
        let bytes = encode(std::slice::from_ref(&menu)).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!([{
                "id": 1,
                "title": "Main",
                "position": "center",
                "index": 2,
                "menu": [
                    { "title": "A", "command": "echo A" },
                    { "type": "separator" },
                    { "type": "submenu", "title": "Sub", "submenu": [
                        { "type": "label", "title": "L" }
                    ]}
                ]
            }])
        );
        assert_eq!(decode(&bytes).unwrap(), vec![menu]);
    }
}
