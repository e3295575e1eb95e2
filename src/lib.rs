//! Semantic pipeline for a bytecode script compiler.
//!
//! Given a module's parsed source files and its already-compiled imports,
//! this crate builds a unified symbol table (the "stub library"), resolves
//! names and types, elaborates every function body, and emits a linear
//! opcode stream per function. Lexing, the resource/"cooker" pipeline that
//! discovers files and writes the final portable blob, and the bytecode
//! executor are all external collaborators and are not implemented here.
#![allow(dead_code)]

pub mod arena;
pub mod artifact;
pub mod cast_matrix;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod elaborator;
pub mod file_builder;
pub mod function_ast;
pub mod function_parser;
pub mod interned_path;
pub mod opcode_emitter;
pub mod string_interning;
pub mod stub_library;
pub mod stubs;
pub mod tokens;

pub use diagnostics::{CompileOutcome, CompilerMessage, Diagnostic, ErrorSink, Severity};
pub use driver::{ImportedModule, compile_module};
