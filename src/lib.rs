pub mod codec;
pub mod drag;
pub mod editor;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod model;
pub mod reorder;
pub mod session;
pub mod settings;
pub mod store;
pub mod templates;
pub mod tree;

pub use error::{CodecError, MoveError, SessionError, StoreError};
pub use model::{ItemKind, Menu, MenuItem, MenuMeta, PanelPosition};
pub use tree::Row;
