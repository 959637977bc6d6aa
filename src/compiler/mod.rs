#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod ast;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod error;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod lexer;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod parser;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod types;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod builtins;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod ir;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod scope;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod analyzer;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod optimize;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod assembler;

use tracing::debug;

use crate::options::Options;
use ast::Program;
use error::CompileError;
use ir::IrEvent;

/// Lex and parse a source string.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    let tokens = lexer::lex(source)?;
    debug!(tokens = tokens.len(), "lexed source");
    parser::parse(tokens)
}

/// Parse and type-check a source string with default options, returning the
/// unoptimized IR.
pub fn analyze(source: &str) -> Result<Vec<IrEvent>, CompileError> {
    analyze_with(source, &Options::default())
}

pub fn analyze_with(source: &str, options: &Options) -> Result<Vec<IrEvent>, CompileError> {
    let program = parse(source)?;
    analyzer::analyze(&program, options)
}

pub use optimize::optimize;

/// Compile a source string to workshop text with default options.
///
/// source → lex → parse → analyze → optimize → assemble
pub fn assemble(source: &str) -> Result<String, CompileError> {
    assemble_with(source, &Options::default())
}

pub fn assemble_with(source: &str, options: &Options) -> Result<String, CompileError> {
    let mut events = analyze_with(source, options)?;
    if options.optimize {
        events = optimize(events);
    }
    Ok(assembler::assemble(&events, &options.variable_array))
}
