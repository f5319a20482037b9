//! Named, ordered filter lists.

use std::fmt;

use tracing::trace;

use crate::error::{PipelineError, PipelineResult};
use crate::operation::{Filter, Operation};
use crate::visit::{format_path, Step, VisitId, VisitTree};

/// A named, ordered list of filters implementing one operation.
///
/// The filter list is typed and built once; the name-based registration
/// methods (`after`, `before`, `replace`, `remove`) exist for customizing a
/// pipe, not for dispatch.
pub struct Pipe<O: Operation> {
    name: String,
    filters: Vec<Box<dyn Filter<O>>>,
    requires_result: bool,
}

impl<O: Operation> Pipe<O> {
    /// Create an empty pipe.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
            requires_result: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the filters in evaluation order.
    pub fn list(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Require every visit to finish this pipe with a result.
    pub fn should_have_result(&mut self) -> &mut Self {
        self.requires_result = true;
        self
    }

    pub fn requires_result(&self) -> bool {
        self.requires_result
    }

    /// Add filters at the end of the pipe.
    pub fn append(&mut self, filters: impl IntoIterator<Item = Box<dyn Filter<O>>>) -> &mut Self {
        self.filters.extend(filters);
        self
    }

    /// Add filters at the start of the pipe, keeping their relative order.
    pub fn prepend(&mut self, filters: impl IntoIterator<Item = Box<dyn Filter<O>>>) -> &mut Self {
        self.filters.splice(0..0, filters);
        self
    }

    /// Insert filters right after the filter named `name`.
    pub fn after(
        &mut self,
        name: &str,
        filters: impl IntoIterator<Item = Box<dyn Filter<O>>>,
    ) -> PipelineResult<&mut Self> {
        let index = self.index_of(name)?;
        self.filters.splice(index + 1..index + 1, filters);
        Ok(self)
    }

    /// Insert filters right before the filter named `name`.
    pub fn before(
        &mut self,
        name: &str,
        filters: impl IntoIterator<Item = Box<dyn Filter<O>>>,
    ) -> PipelineResult<&mut Self> {
        let index = self.index_of(name)?;
        self.filters.splice(index..index, filters);
        Ok(self)
    }

    /// Swap the filter named `name` for `filters`.
    pub fn replace(
        &mut self,
        name: &str,
        filters: impl IntoIterator<Item = Box<dyn Filter<O>>>,
    ) -> PipelineResult<&mut Self> {
        let index = self.index_of(name)?;
        self.filters.splice(index..index + 1, filters);
        Ok(self)
    }

    /// Remove the filter named `name`.
    pub fn remove(&mut self, name: &str) -> PipelineResult<&mut Self> {
        let index = self.index_of(name)?;
        self.filters.remove(index);
        Ok(self)
    }

    /// Remove every filter.
    pub fn clear(&mut self) -> &mut Self {
        self.filters.clear();
        self
    }

    /// Run the filters over one visit, stopping early once a filter marks
    /// the visit exiting.
    pub fn process<'a>(&self, tree: &mut VisitTree<'a, O>, id: VisitId) -> Result<(), O::Error> {
        for filter in &self.filters {
            filter.process(&mut Step::new(tree, id))?;
            if tree.take_exiting(id) {
                trace!(pipe = %self.name, filter = filter.name(), visit = id.index(), "exit");
                break;
            }
        }
        Ok(())
    }

    /// Fail if this pipe requires a result and the finished visit has none.
    pub(crate) fn check_result<'a>(
        &self,
        tree: &VisitTree<'a, O>,
        id: VisitId,
    ) -> PipelineResult<()> {
        if self.requires_result && !tree.has_result(id) {
            return Err(PipelineError::MissingResult {
                pipe: self.name.clone(),
                path: format_path(&tree.path(id)),
            });
        }
        Ok(())
    }

    fn index_of(&self, name: &str) -> PipelineResult<usize> {
        self.filters
            .iter()
            .position(|f| f.name() == name)
            .ok_or_else(|| PipelineError::FilterNotFound {
                pipe: self.name.clone(),
                filter: name.to_string(),
            })
    }
}

impl<O: Operation> fmt::Debug for Pipe<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("name", &self.name)
            .field("filters", &self.list())
            .field("requires_result", &self.requires_result)
            .finish()
    }
}
