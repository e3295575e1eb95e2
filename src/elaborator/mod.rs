//! C9 — function elaborator (§4.8): takes the raw AST C8 parsed out of a
//! function body and runs the two passes that turn it into something C10
//! can emit opcodes from. `connect_scopes` wires every identifier to the
//! local, argument, property, constant or enum option it names; then
//! `resolve_types` walks bottom-up assigning a type to every node,
//! resolving operators and overloaded calls, and inserting the casts
//! each assignment/argument/return site needs.

pub mod casts;
pub mod resolve_types;
pub mod scopes;

use crate::cast_matrix::CastMatrix;
use crate::function_ast::FunctionAst;
use crate::stub_library::StubLibrary;
use crate::stubs::ids::FunctionId;

pub use resolve_types::resolve_types;
pub use scopes::connect_scopes;

/// Runs both elaboration passes over one function body in order.
pub fn elaborate(lib: &mut StubLibrary, matrix: &CastMatrix, owner: FunctionId, ast: &mut FunctionAst) {
    connect_scopes(lib, owner, ast);
    resolve_types(lib, matrix, owner, ast);
}
