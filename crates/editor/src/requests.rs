use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

/// Something the UI or window asked the orchestrator to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorRequest {
    EnterPlayMode,
    ExitPlayMode,
    OpenProject(PathBuf),
}

/// Shared request queue, drained once per tick by the orchestrator.
///
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct EditorRequests(Rc<RefCell<VecDeque<EditorRequest>>>);

impl EditorRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, request: EditorRequest) {
        tracing::debug!(?request, "editor request queued");
        self.0.borrow_mut().push_back(request);
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Take every pending request in arrival order.
    pub fn drain(&self) -> Vec<EditorRequest> {
        self.0.borrow_mut().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_queue() {
        let requests = EditorRequests::new();
        let ui_side = requests.clone();
        ui_side.push(EditorRequest::EnterPlayMode);
        ui_side.push(EditorRequest::OpenProject("demo".into()));

        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests.drain(),
            vec![
                EditorRequest::EnterPlayMode,
                EditorRequest::OpenProject("demo".into())
            ]
        );
        assert!(ui_side.is_empty());
    }
}
