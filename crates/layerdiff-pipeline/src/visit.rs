//! Visit records and the handle filters use to act on them.
//!
//! A traversal keeps every visit in one arena ([`VisitTree`]). Parents refer
//! to children and children to parents by [`VisitId`]; there are no live
//! pointers between records. Traversal order is owned by the processor's work
//! stack, not by links stored in the visits.

use std::fmt;

use crate::operation::Operation;

/// Index of a visit inside its [`VisitTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisitId(usize);

impl VisitId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How a child visit is addressed from its parent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChildKey {
    /// Property of a keyed mapping.
    Property(String),
    /// Position in an ordered sequence.
    Index(usize),
}

impl ChildKey {
    pub fn as_property(&self) -> Option<&str> {
        match self {
            Self::Property(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Property(_) => None,
        }
    }
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(name) => write!(f, "{name}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for ChildKey {
    fn from(name: &str) -> Self {
        Self::Property(name.to_string())
    }
}

impl From<String> for ChildKey {
    fn from(name: String) -> Self {
        Self::Property(name)
    }
}

impl From<usize> for ChildKey {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// Render a path of keys as a JSON-pointer-like string (`/layers/3/name`).
pub fn format_path(path: &[ChildKey]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter().map(|key| format!("/{key}")).collect()
}

// ---------------------------------------------------------------------------
// Visit
// ---------------------------------------------------------------------------

/// Per-node traversal record.
pub struct Visit<'a, O: Operation> {
    state: O::State<'a>,
    result: Option<O::Output>,
    parent: Option<VisitId>,
    key: Option<ChildKey>,
    children: Vec<VisitId>,
    /// Children already handed to the processor.
    scheduled: usize,
    exiting: bool,
    redirect: Option<String>,
}

// ---------------------------------------------------------------------------
// VisitTree
// ---------------------------------------------------------------------------

/// Arena of visits for one traversal.
pub struct VisitTree<'a, O: Operation> {
    visits: Vec<Visit<'a, O>>,
    config: &'a O::Config,
}

impl<'a, O: Operation> VisitTree<'a, O> {
    /// Create a tree holding only the root visit.
    pub fn new(root: O::State<'a>, config: &'a O::Config) -> Self {
        let mut tree = Self {
            visits: Vec::new(),
            config,
        };
        tree.insert(root, None, None);
        tree
    }

    /// The root visit's id.
    pub fn root(&self) -> VisitId {
        VisitId(0)
    }

    /// Number of visits created so far.
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn config(&self) -> &'a O::Config {
        self.config
    }

    pub fn state(&self, id: VisitId) -> &O::State<'a> {
        &self.visits[id.0].state
    }

    pub fn result(&self, id: VisitId) -> Option<&O::Output> {
        self.visits[id.0].result.as_ref()
    }

    pub fn has_result(&self, id: VisitId) -> bool {
        self.visits[id.0].result.is_some()
    }

    /// Remove and return a visit's result.
    pub fn take_result(&mut self, id: VisitId) -> Option<O::Output> {
        self.visits[id.0].result.take()
    }

    pub fn parent(&self, id: VisitId) -> Option<VisitId> {
        self.visits[id.0].parent
    }

    pub fn key(&self, id: VisitId) -> Option<&ChildKey> {
        self.visits[id.0].key.as_ref()
    }

    pub fn children(&self, id: VisitId) -> &[VisitId] {
        &self.visits[id.0].children
    }

    /// Keys from the root down to `id`.
    pub fn path(&self, id: VisitId) -> Vec<ChildKey> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(visit) = current {
            if let Some(key) = self.key(visit) {
                path.push(key.clone());
            }
            current = self.parent(visit);
        }
        path.reverse();
        path
    }

    pub(crate) fn take_exiting(&mut self, id: VisitId) -> bool {
        std::mem::take(&mut self.visits[id.0].exiting)
    }

    pub(crate) fn take_redirect(&mut self, id: VisitId) -> Option<String> {
        self.visits[id.0].redirect.take()
    }

    /// Mark any unscheduled children as scheduled and return them in order.
    pub(crate) fn schedule_children(&mut self, id: VisitId) -> Vec<VisitId> {
        let visit = &mut self.visits[id.0];
        let pending = visit.children[visit.scheduled..].to_vec();
        visit.scheduled = visit.children.len();
        pending
    }

    pub(crate) fn has_unscheduled_children(&self, id: VisitId) -> bool {
        let visit = &self.visits[id.0];
        visit.scheduled < visit.children.len()
    }

    fn insert(
        &mut self,
        state: O::State<'a>,
        parent: Option<VisitId>,
        key: Option<ChildKey>,
    ) -> VisitId {
        let id = VisitId(self.visits.len());
        self.visits.push(Visit {
            state,
            result: None,
            parent,
            key,
            children: Vec::new(),
            scheduled: 0,
            exiting: false,
            redirect: None,
        });
        if let Some(parent) = parent {
            self.visits[parent.0].children.push(id);
        }
        id
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// A filter's handle on the visit being processed.
pub struct Step<'t, 'a, O: Operation> {
    tree: &'t mut VisitTree<'a, O>,
    id: VisitId,
}

impl<'t, 'a, O: Operation> Step<'t, 'a, O> {
    pub fn new(tree: &'t mut VisitTree<'a, O>, id: VisitId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> VisitId {
        self.id
    }

    pub fn is_root(&self) -> bool {
        self.tree.parent(self.id).is_none()
    }

    /// The key this visit was registered under by its parent.
    pub fn key(&self) -> Option<&ChildKey> {
        self.tree.key(self.id)
    }

    /// Keys from the root down to this visit.
    pub fn path(&self) -> Vec<ChildKey> {
        self.tree.path(self.id)
    }

    pub fn config(&self) -> &'a O::Config {
        self.tree.config
    }

    pub fn state(&self) -> &O::State<'a> {
        &self.tree.visits[self.id.0].state
    }

    pub fn state_mut(&mut self) -> &mut O::State<'a> {
        &mut self.tree.visits[self.id.0].state
    }

    pub fn has_result(&self) -> bool {
        self.tree.has_result(self.id)
    }

    pub fn result(&self) -> Option<&O::Output> {
        self.tree.result(self.id)
    }

    /// Record the visit's result. Chain with [`Step::exit`] to stop the pipe.
    pub fn set_result(&mut self, output: O::Output) -> &mut Self {
        self.tree.visits[self.id.0].result = Some(output);
        self
    }

    /// Skip the remaining filters of the current pipe for this visit.
    pub fn exit(&mut self) -> &mut Self {
        self.tree.visits[self.id.0].exiting = true;
        self
    }

    /// Send this visit's children and its after-children pass through
    /// another pipe. Without children, the visit itself is re-run there.
    pub fn redirect(&mut self, pipe: impl Into<String>) -> &mut Self {
        self.tree.visits[self.id.0].redirect = Some(pipe.into());
        self
    }

    /// Register a child visit. Children run depth-first, in registration
    /// order, once the current pipe finishes; the pipe then runs again on
    /// this visit.
    pub fn push_child(&mut self, key: impl Into<ChildKey>, state: O::State<'a>) -> VisitId {
        self.tree.insert(state, Some(self.id), Some(key.into()))
    }

    /// Returns `true` once this visit has registered children, i.e. on the
    /// after-children pass.
    pub fn has_children(&self) -> bool {
        !self.tree.children(self.id).is_empty()
    }

    /// Drain every child's result, paired with the child's key, in
    /// registration order.
    pub fn take_child_results(&mut self) -> Vec<(ChildKey, Option<O::Output>)> {
        let children = self.tree.children(self.id).to_vec();
        children
            .into_iter()
            .filter_map(|child| {
                let key = self.tree.key(child)?.clone();
                Some((key, self.tree.take_result(child)))
            })
            .collect()
    }
}
