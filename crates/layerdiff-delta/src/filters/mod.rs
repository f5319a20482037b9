//! Built-in filters and the default pipes they make up.
//!
//! Each filter type serves every operation it has a rule for, so the diff,
//! patch and reverse rules for one kind of value live side by side.

pub mod arrays;
pub mod binary;
pub mod collect;
pub mod dates;
mod lcs;
pub mod objects;
pub mod texts;
pub mod trivial;

use layerdiff_pipeline::{Filter, Pipe};

use crate::context::{DiffOp, PatchOp, ReverseOp, DIFF_PIPE, PATCH_PIPE, REVERSE_PIPE};

pub use arrays::Arrays;
pub use binary::Binary;
pub use collect::CollectChildren;
pub use dates::Dates;
pub use objects::Objects;
pub use texts::Texts;
pub use trivial::Trivial;

// ---- Filter names ----

pub const COLLECT_CHILDREN: &str = "collect_children";
pub const TRIVIAL: &str = "trivial";
pub const DATES: &str = "dates";
pub const TEXTS: &str = "texts";
pub const BINARY: &str = "binary";
pub const OBJECTS: &str = "objects";
pub const ARRAYS: &str = "arrays";

/// `collect_children, trivial, dates, texts, objects, arrays`
pub fn diff_pipe() -> Pipe<DiffOp> {
    let mut pipe = Pipe::new(DIFF_PIPE);
    pipe.append([
        Box::new(CollectChildren) as Box<dyn Filter<DiffOp>>,
        Box::new(Trivial),
        Box::new(Dates),
        Box::new(Texts),
        Box::new(Objects),
        Box::new(Arrays),
    ])
    .should_have_result();
    pipe
}

/// `collect_children, trivial, texts, binary, objects, arrays`
pub fn patch_pipe() -> Pipe<PatchOp> {
    let mut pipe = Pipe::new(PATCH_PIPE);
    pipe.append([
        Box::new(CollectChildren) as Box<dyn Filter<PatchOp>>,
        Box::new(Trivial),
        Box::new(Texts),
        Box::new(Binary),
        Box::new(Objects),
        Box::new(Arrays),
    ])
    .should_have_result();
    pipe
}

/// `collect_children, trivial, objects, arrays`
pub fn reverse_pipe() -> Pipe<ReverseOp> {
    let mut pipe = Pipe::new(REVERSE_PIPE);
    pipe.append([
        Box::new(CollectChildren) as Box<dyn Filter<ReverseOp>>,
        Box::new(Trivial),
        Box::new(Objects),
        Box::new(Arrays),
    ])
    .should_have_result();
    pipe
}
