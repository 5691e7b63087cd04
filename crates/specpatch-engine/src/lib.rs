pub mod chain;
pub mod workfile;
pub mod workflow;

pub use chain::{unified_diff, Compiled, PatchChain, UpdateCheck, UpstreamUpdate};
pub use workfile::{
    default_compile_file, default_work_file, ensure_absent, fix_patch_level, read_work_file,
};
pub use workflow::{Capabilities, EditSession, UpdateOutcome, Workflow};
