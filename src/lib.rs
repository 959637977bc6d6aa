pub mod compiler;
pub mod options;

pub use compiler::error::{CompileError, ErrorKind};
pub use compiler::{analyze, analyze_with, assemble, assemble_with, optimize, parse};
pub use options::Options;
