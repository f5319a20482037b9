//! Depth-first traversal over named pipes.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use crate::error::{PipelineError, PipelineResult};
use crate::operation::Operation;
use crate::pipe::Pipe;
use crate::visit::{VisitId, VisitTree};

/// Owns the named pipes of one operation and drives traversal.
///
/// Traversal is single-threaded and depth-first over an explicit work stack:
/// run the frame's pipe over its visit; if the visit registered children,
/// schedule an after-children pass of the visit and then each child (first
/// child on top); otherwise the visit is finished. The traversal ends when
/// the stack is empty and yields the root visit's result.
pub struct Processor<O: Operation> {
    pipes: BTreeMap<String, Pipe<O>>,
}

struct Frame<'p, O: Operation> {
    visit: VisitId,
    pipe: &'p Pipe<O>,
}

impl<O: Operation> Processor<O> {
    pub fn new() -> Self {
        Self {
            pipes: BTreeMap::new(),
        }
    }

    /// Attach a pipe, replacing any pipe with the same name.
    pub fn add_pipe(&mut self, pipe: Pipe<O>) -> &mut Self {
        self.pipes.insert(pipe.name().to_string(), pipe);
        self
    }

    pub fn pipe(&self, name: &str) -> PipelineResult<&Pipe<O>> {
        self.pipes
            .get(name)
            .ok_or_else(|| PipelineError::PipeNotFound(name.to_string()))
    }

    /// Mutable access for filter registration.
    pub fn pipe_mut(&mut self, name: &str) -> PipelineResult<&mut Pipe<O>> {
        self.pipes
            .get_mut(name)
            .ok_or_else(|| PipelineError::PipeNotFound(name.to_string()))
    }

    /// Names of the attached pipes.
    pub fn pipe_names(&self) -> Vec<&str> {
        self.pipes.keys().map(String::as_str).collect()
    }

    /// Run a traversal from `root` through the pipe named `pipe`.
    pub fn process<'a>(
        &self,
        pipe: &str,
        root: O::State<'a>,
        config: &'a O::Config,
    ) -> Result<Option<O::Output>, O::Error> {
        let mut tree = VisitTree::new(root, config);
        let root = tree.root();
        self.run(&mut tree, pipe)?;
        Ok(tree.take_result(root))
    }

    /// Drive an existing visit tree from its root. Exposed so callers can
    /// inspect the finished tree (visit count, child layout).
    pub fn run<'a>(&self, tree: &mut VisitTree<'a, O>, pipe: &str) -> Result<(), O::Error> {
        let mut stack = vec![Frame {
            visit: tree.root(),
            pipe: self.pipe(pipe)?,
        }];
        let mut steps = 0usize;

        while let Some(frame) = stack.pop() {
            steps += 1;
            frame.pipe.process(tree, frame.visit)?;

            let next_pipe = match tree.take_redirect(frame.visit) {
                Some(name) => {
                    trace!(from = frame.pipe.name(), to = %name, "redirect");
                    Some(self.pipe(&name)?)
                }
                None => None,
            };

            if tree.has_unscheduled_children(frame.visit) {
                let pipe = next_pipe.unwrap_or(frame.pipe);
                stack.push(Frame {
                    visit: frame.visit,
                    pipe,
                });
                for child in tree.schedule_children(frame.visit).into_iter().rev() {
                    stack.push(Frame { visit: child, pipe });
                }
            } else if let Some(pipe) = next_pipe {
                stack.push(Frame {
                    visit: frame.visit,
                    pipe,
                });
            } else {
                frame.pipe.check_result(tree, frame.visit)?;
            }
        }

        debug!(pipe, visits = tree.len(), steps, "traversal finished");
        Ok(())
    }
}

impl<O: Operation> Default for Processor<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Operation> fmt::Debug for Processor<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.pipes.values()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::operation::Filter;
    use crate::visit::{ChildKey, Step};

    /// A toy tree: each node's result is its own weight plus its children's.
    struct Node {
        name: &'static str,
        weight: i64,
        children: Vec<Node>,
    }

    fn node(name: &'static str, weight: i64, children: Vec<Node>) -> Node {
        Node {
            name,
            weight,
            children,
        }
    }

    /// Records the order in which filters see visits.
    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl Log {
        fn push(&self, entry: String) {
            self.0.lock().unwrap().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct Sum;

    impl Operation for Sum {
        type State<'a> = &'a Node;
        type Output = i64;
        type Config = Log;
        type Error = PipelineError;
    }

    struct Collect;

    impl Filter<Sum> for Collect {
        fn name(&self) -> &str {
            "collect"
        }

        fn process<'a>(&self, step: &mut Step<'_, 'a, Sum>) -> Result<(), PipelineError> {
            if !step.has_children() {
                return Ok(());
            }
            let node = *step.state();
            step.config().push(format!("collect {}", node.name));
            let total: i64 = step
                .take_child_results()
                .into_iter()
                .filter_map(|(_, r)| r)
                .sum();
            step.set_result(total + node.weight).exit();
            Ok(())
        }
    }

    struct Descend;

    impl Filter<Sum> for Descend {
        fn name(&self) -> &str {
            "descend"
        }

        fn process<'a>(&self, step: &mut Step<'_, 'a, Sum>) -> Result<(), PipelineError> {
            let node: &'a Node = *step.state();
            step.config().push(format!("visit {}", node.name));
            if node.children.is_empty() {
                return Ok(());
            }
            for (i, child) in node.children.iter().enumerate() {
                step.push_child(i, child);
            }
            step.exit();
            Ok(())
        }
    }

    struct Leaf;

    impl Filter<Sum> for Leaf {
        fn name(&self) -> &str {
            "leaf"
        }

        fn process<'a>(&self, step: &mut Step<'_, 'a, Sum>) -> Result<(), PipelineError> {
            let weight = step.state().weight;
            step.set_result(weight).exit();
            Ok(())
        }
    }

    struct Never;

    impl Filter<Sum> for Never {
        fn name(&self) -> &str {
            "never"
        }

        fn process<'a>(&self, step: &mut Step<'_, 'a, Sum>) -> Result<(), PipelineError> {
            step.config().push("never ran".into());
            Ok(())
        }
    }

    /// Sends the visit to the "leaf" pipe.
    struct Handoff;

    impl Filter<Sum> for Handoff {
        fn name(&self) -> &str {
            "handoff"
        }

        fn process<'a>(&self, step: &mut Step<'_, 'a, Sum>) -> Result<(), PipelineError> {
            step.redirect("leaf").exit();
            Ok(())
        }
    }

    fn sum_processor() -> Processor<Sum> {
        let mut pipe = Pipe::new("sum");
        pipe.append([
            Box::new(Collect) as Box<dyn Filter<Sum>>,
            Box::new(Descend),
            Box::new(Leaf),
            Box::new(Never),
        ]);
        pipe.should_have_result();
        let mut processor = Processor::new();
        processor.add_pipe(pipe);
        processor
    }

    fn sample() -> Node {
        node(
            "root",
            1,
            vec![
                node("a", 10, vec![node("a0", 100, vec![]), node("a1", 200, vec![])]),
                node("b", 20, vec![]),
            ],
        )
    }

    #[test]
    fn sums_the_tree() {
        let tree = sample();
        let log = Log::default();
        let total = sum_processor().process("sum", &tree, &log).unwrap();
        assert_eq!(total, Some(331));
    }

    #[test]
    fn traversal_is_depth_first_with_after_children_pass() {
        let tree = sample();
        let log = Log::default();
        sum_processor().process("sum", &tree, &log).unwrap();
        assert_eq!(
            log.entries(),
            vec![
                "visit root",
                "visit a",
                "visit a0",
                "visit a1",
                "collect a",
                "visit b",
                "collect root",
            ]
        );
    }

    #[test]
    fn exit_skips_remaining_filters() {
        let tree = node("solo", 5, vec![]);
        let log = Log::default();
        sum_processor().process("sum", &tree, &log).unwrap();
        assert!(!log.entries().iter().any(|e| e == "never ran"));
    }

    #[test]
    fn child_keys_are_kept_in_the_tree() {
        let tree = sample();
        let log = Log::default();
        let processor = sum_processor();
        let mut visits = VisitTree::new(&tree, &log);
        processor.run(&mut visits, "sum").unwrap();
        assert_eq!(visits.len(), 5);
        let root = visits.root();
        let first = visits.children(root)[0];
        let grandchild = visits.children(first)[1];
        assert_eq!(
            visits.path(grandchild),
            vec![ChildKey::Index(0), ChildKey::Index(1)]
        );
    }

    #[test]
    fn unknown_pipe_is_an_error() {
        let tree = sample();
        let log = Log::default();
        let err = sum_processor().process("patch", &tree, &log).unwrap_err();
        assert_eq!(err, PipelineError::PipeNotFound("patch".into()));
    }

    #[test]
    fn missing_result_is_fatal() {
        let mut processor = sum_processor();
        processor.pipe_mut("sum").unwrap().remove("leaf").unwrap();
        let tree = sample();
        let log = Log::default();
        let err = processor.process("sum", &tree, &log).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingResult {
                pipe: "sum".into(),
                path: "/0/0".into(),
            }
        );
    }

    #[test]
    fn registration_by_name() {
        let mut processor = sum_processor();
        let pipe = processor.pipe_mut("sum").unwrap();
        pipe.before("leaf", [Box::new(Never) as Box<dyn Filter<Sum>>])
            .unwrap();
        assert_eq!(pipe.list(), vec!["collect", "descend", "never", "leaf", "never"]);
        pipe.remove("never").unwrap();
        pipe.replace("never", [Box::new(Handoff) as Box<dyn Filter<Sum>>])
            .unwrap();
        pipe.after("collect", [Box::new(Never) as Box<dyn Filter<Sum>>])
            .unwrap();
        pipe.prepend([Box::new(Leaf) as Box<dyn Filter<Sum>>]);
        assert_eq!(
            pipe.list(),
            vec!["leaf", "collect", "never", "descend", "leaf", "handoff"]
        );
    }

    #[test]
    fn registration_with_unknown_filter_fails() {
        let mut processor = sum_processor();
        let pipe = processor.pipe_mut("sum").unwrap();
        let err = pipe.remove("dates").unwrap_err();
        assert_eq!(
            err,
            PipelineError::FilterNotFound {
                pipe: "sum".into(),
                filter: "dates".into(),
            }
        );
        assert!(pipe
            .after("dates", [Box::new(Never) as Box<dyn Filter<Sum>>])
            .is_err());
        assert_eq!(pipe.len(), 4);
    }

    #[test]
    fn redirect_reruns_the_visit_in_another_pipe() {
        let mut processor = Processor::new();
        let mut entry = Pipe::new("entry");
        entry.append([Box::new(Handoff) as Box<dyn Filter<Sum>>]);
        let mut leaf = Pipe::new("leaf");
        leaf.append([Box::new(Leaf) as Box<dyn Filter<Sum>>]);
        leaf.should_have_result();
        processor.add_pipe(entry).add_pipe(leaf);

        let tree = node("solo", 7, vec![]);
        let log = Log::default();
        assert_eq!(processor.process("entry", &tree, &log).unwrap(), Some(7));
    }

    #[test]
    fn redirect_to_missing_pipe_fails() {
        let mut processor = Processor::new();
        let mut entry = Pipe::new("entry");
        entry.append([Box::new(Handoff) as Box<dyn Filter<Sum>>]);
        processor.add_pipe(entry);

        let tree = node("solo", 7, vec![]);
        let log = Log::default();
        assert_eq!(
            processor.process("entry", &tree, &log).unwrap_err(),
            PipelineError::PipeNotFound("leaf".into())
        );
    }
}
