//! C12 — command-line entrypoint (§4.11). Grounded on the teacher's
//! `projects::cli`: a small `Command` enum, `env::args()` dispatch, and
//! `saying::say!` for colored terminal output.
//!
//! The lexer is an external collaborator (§1), so `<file...>` arguments
//! here are pre-tokenized JSON (a serialized `Vec<Token>` per file) —
//! the same shape the integration tests build by hand — rather than raw
//! script source a real lexer would otherwise produce.

use crate::artifact::ModuleArtifact;
use crate::config::Config;
use crate::diagnostics::{CompileOutcome, Diagnostic};
use crate::driver::{self, ImportedModule, SourceFile};
use crate::tokens::Token;
use saying::say;
use serde::Deserialize;
use std::path::Path;
use std::{env, fs};

/// On-disk shape of a pre-tokenized source file (§4.11): the lexer that
/// produced it is an external collaborator with its own local string
/// pool, remapped into the shared library table by the driver.
#[derive(Deserialize)]
struct TokenFile {
    strings: Vec<String>,
    tokens: Vec<Token>,
}

enum Command {
    Build { module_name: String, files: Vec<String>, imports: Vec<String>, config_path: Option<String> },
    DumpOpcodes { module_name: String, files: Vec<String>, function: Option<String> },
    Help,
}

pub fn start_cli() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    let command = match get_command(&args[1..]) {
        Ok(command) => command,
        Err(e) => {
            say!(Red e);
            print_help();
            return;
        }
    };

    match command {
        Command::Help => print_help(),
        Command::Build { module_name, files, imports, config_path } => run_build(&module_name, &files, &imports, config_path.as_deref()),
        Command::DumpOpcodes { module_name, files, function } => run_dump_opcodes(&module_name, &files, function.as_deref()),
    }
}

fn get_command(args: &[String]) -> Result<Command, String> {
    match args.first().map(String::as_str) {
        Some("help") | None => Ok(Command::Help),
        Some("build") => parse_build(&args[1..]),
        Some("dump-opcodes") => parse_dump_opcodes(&args[1..]),
        Some(other) => Err(format!("Invalid command: '{other}'")),
    }
}

fn parse_build(args: &[String]) -> Result<Command, String> {
    let Some(module_name) = args.first() else {
        return Err("Usage: scriptc build <module-name> <file...> [--import path.json]... [--config scriptc.toml]".to_string());
    };
    let mut files = Vec::new();
    let mut imports = Vec::new();
    let mut config_path = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--import" => {
                let path = args.get(i + 1).ok_or("Missing value for --import")?;
                imports.push(path.clone());
                i += 2;
            }
            "--config" => {
                let path = args.get(i + 1).ok_or("Missing value for --config")?;
                config_path = Some(path.clone());
                i += 2;
            }
            other => {
                files.push(other.to_string());
                i += 1;
            }
        }
    }
    if files.is_empty() {
        return Err("build requires at least one source file".to_string());
    }
    Ok(Command::Build { module_name: module_name.clone(), files, imports, config_path })
}

fn parse_dump_opcodes(args: &[String]) -> Result<Command, String> {
    let Some(module_name) = args.first() else {
        return Err("Usage: scriptc dump-opcodes <module-name> <file...> [<function-qualified-name>]".to_string());
    };
    let rest = &args[1..];
    if rest.is_empty() {
        return Err("dump-opcodes requires at least one source file".to_string());
    }
    // A trailing non-`.json` argument names the function to restrict the
    // dump to; every other argument is a token-stream file.
    let (files, function) = match rest.split_last() {
        Some((last, init)) if !last.ends_with(".json") && !init.is_empty() => {
            (init.to_vec(), Some(last.clone()))
        }
        _ => (rest.to_vec(), None),
    };
    Ok(Command::DumpOpcodes { module_name: module_name.clone(), files, function })
}

fn load_token_file(path: &str) -> Result<TokenFile, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("couldn't read {path}: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("couldn't parse {path} as a token file: {e}"))
}

fn load_import(path: &str) -> Result<ImportedModule, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("couldn't read {path}: {e}"))?;
    let artifact: ModuleArtifact =
        serde_json::from_str(&text).map_err(|e| format!("couldn't parse {path} as a module artifact: {e}"))?;
    let name = artifact.module_name().unwrap_or("").to_string();
    Ok(ImportedModule::new(name, artifact.into_library()))
}

fn load_source_files(files: &[String]) -> Result<Vec<SourceFile>, String> {
    files
        .iter()
        .map(|path| {
            let file = load_token_file(path)?;
            Ok(SourceFile::new(path.clone(), file.strings, file.tokens))
        })
        .collect()
}

fn load_imports(paths: &[String]) -> Result<Vec<ImportedModule>, String> {
    paths.iter().map(|path| load_import(path)).collect()
}

fn run_build(module_name: &str, file_paths: &[String], import_paths: &[String], config_path: Option<&str>) {
    let config = match Config::load(config_path.map(Path::new)) {
        Ok(c) => c,
        Err(e) => {
            say!(Red e);
            return;
        }
    };

    let files = match load_source_files(file_paths) {
        Ok(f) => f,
        Err(e) => {
            say!(Red e);
            return;
        }
    };
    let imports = match load_imports(import_paths) {
        Ok(i) => i,
        Err(e) => {
            say!(Red e);
            return;
        }
    };

    let (lib, outcome) = driver::compile_module(module_name, files, imports);
    print_outcome(module_name, &outcome);

    if config.dump_opcodes {
        print_opcodes(&lib, config.dump_opcodes_for_function.as_deref());
    }

    if outcome.is_success() {
        let artifact = ModuleArtifact::from_library(&lib);
        match serde_json::to_string_pretty(&artifact) {
            Ok(json) => {
                let out_path = format!("{module_name}.module.json");
                if let Err(e) = fs::write(&out_path, json) {
                    say!(Red "failed to write ", out_path, ": ", e);
                } else {
                    say!(Green "wrote ", out_path);
                }
            }
            Err(e) => say!(Red "failed to serialize module artifact: ", e),
        }
    }
}

fn run_dump_opcodes(module_name: &str, file_paths: &[String], function: Option<&str>) {
    let files = match load_source_files(file_paths) {
        Ok(f) => f,
        Err(e) => {
            say!(Red e);
            return;
        }
    };

    let (lib, outcome) = driver::compile_module(module_name, files, Vec::new());
    print_outcome(module_name, &outcome);
    print_opcodes(&lib, function);
}

fn print_outcome(module_name: &str, outcome: &CompileOutcome) {
    say!(Bold module_name, ": ", outcome.errors.len(), " error(s), ", outcome.warnings.len(), " warning(s)");
    for diagnostic in &outcome.errors {
        print_diagnostic(diagnostic, true);
    }
    for diagnostic in &outcome.warnings {
        print_diagnostic(diagnostic, false);
    }
}

fn print_diagnostic(diagnostic: &Diagnostic, is_error: bool) {
    if is_error {
        say!(Red diagnostic.file_abs_path.display(), ":", diagnostic.line, ": ", diagnostic.message);
    } else {
        say!(Yellow diagnostic.file_abs_path.display(), ":", diagnostic.line, ": ", diagnostic.message);
    }
}

fn print_opcodes(lib: &crate::stub_library::StubLibrary, only_function: Option<&str>) {
    let ids: Vec<_> = match only_function {
        Some(name) => driver::find_function(lib, name).into_iter().collect(),
        None => lib.functions.ids().collect(),
    };
    for id in ids {
        let function = lib.functions.get(id);
        if function.opcodes.is_empty() {
            continue;
        }
        say!(Bold Green function.name.resolve(&lib.strings));
        for (index, opcode) in function.opcodes.iter().enumerate() {
            say!("  ", index, ": ", format!("{opcode:?}"));
        }
    }
}

fn print_help() {
    say!(Green Bold "scriptc — script compiler driver");
    say!(Green Bold "\nCommands:");
    say!("  build <module-name> <file...> [--import path.json]... [--config scriptc.toml]");
    say!("  dump-opcodes <module-name> <file...> [<function-qualified-name>]");
    say!("  help");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_at_least_one_file() {
        let args = vec!["my_module".to_string()];
        assert!(parse_build(&args).is_err());
    }

    #[test]
    fn build_parses_import_and_config_flags() {
        let args = vec![
            "my_module".to_string(),
            "a.tokens.json".to_string(),
            "--import".to_string(),
            "base.module.json".to_string(),
            "--config".to_string(),
            "scriptc.toml".to_string(),
        ];
        match parse_build(&args).unwrap() {
            Command::Build { module_name, files, imports, config_path } => {
                assert_eq!(module_name, "my_module");
                assert_eq!(files, vec!["a.tokens.json".to_string()]);
                assert_eq!(imports, vec!["base.module.json".to_string()]);
                assert_eq!(config_path, Some("scriptc.toml".to_string()));
            }
            _ => panic!("expected Build"),
        }
    }

    #[test]
    fn dump_opcodes_splits_off_trailing_function_name() {
        let args = vec!["my_module".to_string(), "a.tokens.json".to_string(), "Game.Entity.update".to_string()];
        match parse_dump_opcodes(&args).unwrap() {
            Command::DumpOpcodes { files, function, .. } => {
                assert_eq!(files, vec!["a.tokens.json".to_string()]);
                assert_eq!(function, Some("Game.Entity.update".to_string()));
            }
            _ => panic!("expected DumpOpcodes"),
        }
    }
}
