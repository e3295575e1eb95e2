//! The top-level driver (§2, §7): wires every component from C4 through
//! C10 into the one control-flow order the pipeline actually runs in,
//! and turns the finished [`StubLibrary`] into a [`CompileOutcome`] for
//! the caller. The lexer is an external collaborator (§1), so the only
//! input this crate accepts is an already-tokenized file list — the CLI
//! (C12) is the thing that would normally sit between a real lexer and
//! this function.

use crate::diagnostics::CompileOutcome;
use crate::elaborator;
use crate::file_builder::FileBuilder;
use crate::function_parser::parse_function_body;
use crate::interned_path::InternedPath;
use crate::opcode_emitter::Emitter;
use crate::stub_library::{ResolvedStub, StubLibrary};
use crate::stubs::ids::FunctionId;
use crate::stubs::StubOwner;
use crate::string_interning::StringId;
use crate::tokens::Token;
use std::path::PathBuf;

/// One source file handed to [`compile_module`]: its depot-relative path
/// (used for diagnostics and for the `import`/module-name match), its
/// already-lexed token stream, and the string pool those tokens were
/// interned against. A standalone lexer run has no way to share the
/// library's own `StringTable` (it doesn't exist yet), so every file
/// carries its own local pool; `StringId`s inside `tokens` are indices
/// into `strings`, not into any shared table, and get remapped into the
/// library's table as the file is built.
pub struct SourceFile {
    pub depot_path: String,
    pub strings: Vec<String>,
    pub tokens: Vec<Token>,
}

impl SourceFile {
    pub fn new(depot_path: impl Into<String>, strings: Vec<String>, tokens: Vec<Token>) -> Self {
        Self { depot_path: depot_path.into(), strings, tokens }
    }
}

/// An already-compiled module offered to [`compile_module`] as an
/// import. `name` is matched against the text of the `import <name>;`
/// declarations found while building `files` (§4.3.9); a library with no
/// matching `import` is merged but simply never referenced by name
/// resolution.
pub struct ImportedModule {
    pub name: String,
    pub library: StubLibrary,
}

impl ImportedModule {
    pub fn new(name: impl Into<String>, library: StubLibrary) -> Self {
        Self { name: name.into(), library }
    }
}

/// Runs the full pipeline over one module's source files, merging in any
/// already-compiled imports, and returns the populated library alongside
/// the diagnostics collected along the way. The library is returned
/// regardless of success so a caller (the CLI's `build`/`dump-opcodes`
/// subcommands) can still inspect stubs and opcodes after a failed
/// compile; per §7 a failed compile just means no artifact should be
/// written from it.
pub fn compile_module(
    module_name: &str,
    files: Vec<SourceFile>,
    imports: Vec<ImportedModule>,
) -> (StubLibrary, CompileOutcome) {
    let mut lib = StubLibrary::new();

    let name_id = lib.strings.intern(module_name);
    let primary = lib.create_module(name_id);
    lib.primary_module = Some(primary);

    // C6 — build every file's stubs. The spec allows fanning this out
    // per file (§5); this driver takes the "sequential per-file pass is
    // also acceptable" escape hatch (§9) since `StubLibrary`'s creation
    // APIs aren't behind a lock here.
    let mut file_ids = Vec::with_capacity(files.len());
    let mut file_tokens: Vec<Vec<Token>> = Vec::with_capacity(files.len());
    for file in &files {
        let depot_id = lib.strings.intern(&file.depot_path);
        let abs_path = PathBuf::from(&file.depot_path);
        let file_id = lib.create_file(primary, depot_id, abs_path);

        let string_map: Vec<StringId> = file.strings.iter().map(|s| lib.strings.intern(s)).collect();
        let tokens: Vec<Token> = file.tokens.iter().map(|t| t.remap(file_id, &string_map)).collect();
        FileBuilder::new(&mut lib, file_id, &tokens).build();

        file_ids.push(file_id);
        file_tokens.push(tokens);
    }
    lib.finalize_module_members(primary);

    // Merge every supplied import, then resolve each `import` decl found
    // in the files we just built against the merged module it names.
    let mut merged: Vec<(String, crate::stubs::ids::ModuleId)> = Vec::new();
    for imported in imports {
        let import_name_id = lib.strings.intern(&imported.name);
        let module_id = lib.merge_imported_module(import_name_id, &imported.library);
        lib.modules.get_mut(primary).imported_modules.push(module_id);
        merged.push((imported.name, module_id));
    }
    let import_ids: Vec<crate::stubs::ids::ModuleImportId> = lib.module_imports.ids().collect();
    for import_id in import_ids {
        let import = lib.module_imports.get(import_id);
        let owner = import.owner;
        let name = import.name;
        let location = import.location;
        let name_str = name.resolve(&lib.strings).to_string();
        match merged.iter().find(|(n, _)| *n == name_str) {
            Some((_, module_id)) => {
                lib.module_imports.get_mut(import_id).resolved = Some(*module_id);
            }
            None => {
                let path = lib.file_abs_path(owner);
                lib.errors.report_error(
                    path,
                    location.line,
                    crate::diagnostics::CompilerMessage::UnresolvedSymbol {
                        name: name_str,
                        scope: "module import".to_string(),
                    },
                );
            }
        }
    }

    if lib.errors.has_errors() {
        return finish(lib);
    }

    // C4's resolution/validation/linking sub-passes, in the order their
    // own doc comments require (type refs/decls before class linking,
    // enums/functions/operators/ctor-dtor after).
    lib.resolve_type_refs();
    lib.resolve_type_decls();
    if lib.errors.has_errors() {
        return finish(lib);
    }

    lib.link_classes();
    lib.validate_enums();
    lib.validate_functions();
    lib.name_operators_and_casts();
    lib.synthesize_ctors_and_dtors();
    if lib.errors.has_errors() {
        return finish(lib);
    }

    // C5 — one cast matrix covering every function in the library
    // (imports included, since an imported overload can still be a cast
    // target or an alias candidate).
    let ctx = elaborator::casts::cast_ctx(&lib);
    let mut matrix = crate::cast_matrix::CastMatrix::new();
    matrix.build(lib.functions.iter_with_ids(), &ctx);

    // C8/C9/C10 — per function body still carrying raw tokens. Built
    // sequentially, file by file, since a function's body range indexes
    // into its own declaring file's token array.
    let function_ids: Vec<FunctionId> = lib.functions.ids().collect();
    for fid in function_ids {
        if lib.functions.get(fid).body_tokens.is_none() {
            continue;
        }
        let owner = lib.functions.get(fid).owner;
        let Some(file_id) = lib.file_of_owner(owner) else { continue };
        let Some(file_index) = file_ids.iter().position(|&id| id == file_id) else { continue };

        let Some(mut ast) = parse_function_body(&mut lib, fid, file_id, &file_tokens[file_index]) else {
            continue;
        };
        elaborator::elaborate(&mut lib, &matrix, fid, &mut ast);

        let Some(root) = ast.root else { continue };
        let result = {
            let emitter = Emitter::new(
                &ast,
                &lib.type_decls,
                &lib.type_refs,
                &lib.functions,
                &lib.function_args,
                &lib.enum_options,
                &lib.constant_values,
                &lib.files,
                &lib.strings,
                &lib.errors,
            );
            emitter.emit_function(root)
        };
        match result {
            Ok(list) => lib.functions.get_mut(fid).opcodes = list.opcodes,
            Err(err) => {
                let location = match err {
                    crate::opcode_emitter::EmitError::BreakOutsideLoop { location } => location,
                    crate::opcode_emitter::EmitError::ContinueOutsideLoop { location } => location,
                };
                let path = lib.file_abs_path(file_id);
                lib.errors.report_error(
                    path,
                    location.line,
                    crate::diagnostics::CompilerMessage::InternalError { detail: format!("{err:?}") },
                );
            }
        }
    }

    if !lib.errors.has_errors() {
        lib.prune_unused_imports();
    }

    finish(lib)
}

/// Looks up a function by its dotted qualified name (e.g.
/// `Game.Entity.update`) within `lib`'s primary module, for the CLI's
/// `dump-opcodes <function>` form.
pub fn find_function(lib: &StubLibrary, qualified_name: &str) -> Option<FunctionId> {
    let primary = lib.primary_module?;
    let mut path = InternedPath::new();
    for part in qualified_name.split('.') {
        if let Some(id) = lib.strings.get_existing(part) {
            path.push(id);
        } else {
            return None;
        }
    }
    match lib.resolve_name(&path, StubOwner::Module(primary))? {
        ResolvedStub::Function(id) => Some(id),
        _ => None,
    }
}

fn finish(lib: StubLibrary) -> (StubLibrary, CompileOutcome) {
    let outcome = lib.errors.to_outcome();
    (lib, outcome)
}
