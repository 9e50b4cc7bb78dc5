/// An in-progress drag of one row (and its subtree) in an [`ItemEditor`].
///
/// A session is handed out by [`ItemEditor::begin_drag`] and taken back by
/// value on drop or cancel, so it can never outlive the gesture. It is tied
/// to the editor revision it was started at; any structural edit in between
/// makes it stale.
///
/// [`ItemEditor`]: crate::editor::ItemEditor
/// [`ItemEditor::begin_drag`]: crate::editor::ItemEditor::begin_drag
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a drag session must be dropped or cancelled"]
pub struct DragSession {
    source: usize,
    revision: u64,
}

impl DragSession {
    pub(crate) fn new(source: usize, revision: u64) -> Self {
        Self { source, revision }
    }

    pub fn source(&self) -> usize {
        self.source
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }
}
