//! End-to-end tests driving `compile_module` over small hand-tokenized
//! programs. There's no lexer in this crate (it's an external
//! collaborator), so each test builds its own token stream with the
//! tiny scanner below rather than going through `FileBuilder` directly.

use script_compiler::arena::ArenaId;
use script_compiler::driver::{self, SourceFile};
use script_compiler::opcode_emitter::Opcode;
use script_compiler::stubs::ids::FileId;
use script_compiler::string_interning::StringId;
use script_compiler::tokens::{Keyword, Token, TokenKind};
use script_compiler::stubs::SourceLocation;

// ---------------------------------------------------------------------
// A minimal scanner, just enough to produce the token shape the driver
// expects: a flat `Vec<Token>` plus the local string pool those tokens'
// `StringId`s index into (§6.1; see `driver::SourceFile`'s doc comment).
// ---------------------------------------------------------------------

struct Pool {
    strings: Vec<String>,
    by_text: std::collections::HashMap<String, StringId>,
}

impl Pool {
    fn new() -> Self {
        Self { strings: Vec::new(), by_text: std::collections::HashMap::new() }
    }

    fn intern(&mut self, text: &str) -> StringId {
        if let Some(&id) = self.by_text.get(text) {
            return id;
        }
        let id = StringId::from_u32(self.strings.len() as u32);
        self.strings.push(text.to_string());
        self.by_text.insert(text.to_string(), id);
        id
    }
}

fn keyword_for(word: &str) -> Option<Keyword> {
    Some(match word {
        "module" => Keyword::Module,
        "import" => Keyword::Import,
        "class" => Keyword::Class,
        "struct" => Keyword::Struct,
        "enum" => Keyword::Enum,
        "extends" => Keyword::Extends,
        "function" => Keyword::Function,
        "var" => Keyword::Var,
        "const" => Keyword::Const,
        "static" => Keyword::Static,
        "final" => Keyword::Final,
        "override" => Keyword::Override,
        "operator" => Keyword::Operator,
        "cast" => Keyword::Cast,
        "alias" => Keyword::Alias,
        "signal" => Keyword::Signal,
        "ref" => Keyword::Ref,
        "out" => Keyword::Out,
        "explicit" => Keyword::Explicit,
        "return" => Keyword::Return,
        "break" => Keyword::Break,
        "continue" => Keyword::Continue,
        "if" => Keyword::If,
        "else" => Keyword::Else,
        "switch" => Keyword::Switch,
        "case" => Keyword::Case,
        "default" => Keyword::Default,
        "for" => Keyword::For,
        "while" => Keyword::While,
        "do" => Keyword::Do,
        "new" => Keyword::New,
        "this" => Keyword::This,
        "null" => Keyword::Null,
        "true" => Keyword::True,
        "false" => Keyword::False,
        "private" => Keyword::Private,
        "protected" => Keyword::Protected,
        "public" => Keyword::Public,
        _ => return None,
    })
}

/// Placeholder location used by every token built here; the driver
/// overwrites `.file` with the real `FileId` as it remaps each token
/// into the shared library (`Token::remap`), so only `line` matters.
fn loc(line: u32) -> SourceLocation {
    SourceLocation::new(FileId::from_index(0), line, 1)
}

fn lex(source: &str, pool: &mut Pool) -> Vec<Token> {
    let bytes: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    let mut line = 1u32;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            '\n' => {
                line += 1;
                i += 1;
            }
            c if c.is_whitespace() => i += 1,
            c if c.is_ascii_digit() => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let mut is_float = false;
                if i < bytes.len() && bytes[i] == '.' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
                    is_float = true;
                    i += 1;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = bytes[start..i].iter().collect();
                let id = pool.intern(&text);
                let kind = if is_float {
                    TokenKind::Float(text.parse().unwrap(), id)
                } else {
                    TokenKind::Integer(text.parse().unwrap(), id)
                };
                tokens.push(Token::new(kind, loc(line)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_alphanumeric() || bytes[i] == '_') {
                    i += 1;
                }
                let word: String = bytes[start..i].iter().collect();
                let kind = match keyword_for(&word) {
                    Some(kw) => TokenKind::Keyword(kw),
                    None => TokenKind::Identifier(pool.intern(&word)),
                };
                tokens.push(Token::new(kind, loc(line)));
            }
            '/' if i + 1 < bytes.len() && bytes[i + 1] == '/' => {
                while i < bytes.len() && bytes[i] != '\n' {
                    i += 1;
                }
            }
            _ => {
                tokens.push(Token::new(TokenKind::Char(c), loc(line)));
                i += 1;
            }
        }
    }
    tokens
}

fn source_file(path: &str, text: &str) -> SourceFile {
    let mut pool = Pool::new();
    let tokens = lex(text, &mut pool);
    SourceFile::new(path, pool.strings, tokens)
}

// ---------------------------------------------------------------------
// Scenario 1 — enum value assignment
// ---------------------------------------------------------------------

#[test]
fn enum_values_assigned_sequentially_around_user_overrides() {
    let file = source_file("e.script", "enum E { A, B = 5, C, D }");
    let (lib, outcome) = driver::compile_module("m", vec![file], Vec::new());
    assert!(outcome.is_success(), "unexpected errors: {:?}", outcome.errors);

    let e = lib.enums.iter().next().expect("enum E should exist");
    let values: Vec<i64> = e.options.iter().map(|&id| lib.enum_options.get(id).value).collect();
    assert_eq!(values, vec![0, 5, 6, 7]);
}

// ---------------------------------------------------------------------
// Scenario 2 — override signature mismatch
// ---------------------------------------------------------------------

#[test]
fn override_with_mismatched_signature_is_an_error() {
    let file = source_file(
        "c.script",
        "class B { function foo(x: int): int; } \
         class D extends B { override function foo(x: float): int; }",
    );
    let (_lib, outcome) = driver::compile_module("m", vec![file], Vec::new());
    assert!(outcome.errors.iter().any(|d| d.message.contains("does not match signature of the base function")), "{:?}", outcome.errors);
}

// ---------------------------------------------------------------------
// Scenario 3 — implicit numeric overflow on a constant
// ---------------------------------------------------------------------

#[test]
fn assigning_an_out_of_range_constant_is_an_error() {
    let file = source_file("p.script", "var x : uint8; function run() { x = 300; }");
    let (_lib, outcome) = driver::compile_module("m", vec![file], Vec::new());
    assert!(
        outcome.errors.iter().any(|d| d.message.contains("300") && d.message.contains("uint8")),
        "{:?}",
        outcome.errors
    );
}

// ---------------------------------------------------------------------
// Scenario 4 — operator overload resolution with casting
// ---------------------------------------------------------------------

#[test]
fn operator_overload_casts_integer_literal_into_float_operand() {
    let file = source_file(
        "o.script",
        "operator function opAdd(a: float, b: float): float { return a; } \
         function run(): float { var x : float; x = 1 + 2.0; return x; }",
    );
    let (lib, outcome) = driver::compile_module("m", vec![file], Vec::new());
    assert!(outcome.is_success(), "unexpected errors: {:?}", outcome.errors);

    let op_add = driver::find_function(&lib, "opAdd").expect("opAdd should be declared");
    let run = driver::find_function(&lib, "run").expect("run should be declared");
    let opcodes = &lib.functions.get(run).opcodes;
    assert!(
        opcodes.iter().any(|op| matches!(op, Opcode::StaticFunc { function, .. } if *function == op_add)),
        "expected a call to opAdd in run's opcodes: {opcodes:?}"
    );
}

// ---------------------------------------------------------------------
// Scenario 5 — scope destructor emitted on every exit path
// ---------------------------------------------------------------------

#[test]
fn scoped_local_is_destructed_on_both_the_early_return_and_fallthrough_paths() {
    let file = source_file(
        "s.script",
        "class MyClass { } \
         function f(cond: bool): int { \
           { var a : MyClass = new MyClass(); if (cond) return 1; } \
           return 0; \
         }",
    );
    let (lib, outcome) = driver::compile_module("m", vec![file], Vec::new());
    assert!(outcome.is_success(), "unexpected errors: {:?}", outcome.errors);

    let f = driver::find_function(&lib, "f").expect("f should be declared");
    let opcodes = &lib.functions.get(f).opcodes;

    let ctor_count = opcodes.iter().filter(|op| matches!(op, Opcode::LocalCtor { .. })).count();
    let dtor_count = opcodes.iter().filter(|op| matches!(op, Opcode::LocalDtor { .. })).count();
    assert_eq!(ctor_count, 1, "expected one constructor for `a`: {opcodes:?}");
    assert_eq!(dtor_count, 2, "expected a destructor on both the early-return and fallthrough paths: {opcodes:?}");
}

// ---------------------------------------------------------------------
// Scenario 6 — ambiguous alias call, then resolved by a narrower cast
// ---------------------------------------------------------------------

#[test]
fn call_to_two_equally_costed_alias_overloads_is_ambiguous() {
    let file = source_file(
        "a.script",
        "alias Print function PrintInt(x: int): void { } \
         alias Print function PrintFloat(x: float): void { } \
         function run(): void { Print(0); }",
    );
    let (_lib, outcome) = driver::compile_module("m", vec![file], Vec::new());
    assert!(
        outcome.errors.iter().any(|d| d.message.contains("ambiguous") && d.message.contains("Print")),
        "{:?}",
        outcome.errors
    );
}

#[test]
fn call_to_alias_overloads_prefers_the_narrower_cast() {
    let file = source_file(
        "b.script",
        "alias Print function PrintInt(x: int): void { } \
         alias Print function PrintWide(x: int64): void { } \
         function run(): void { Print(0); }",
    );
    let (lib, outcome) = driver::compile_module("m", vec![file], Vec::new());
    assert!(outcome.is_success(), "unexpected errors: {:?}", outcome.errors);

    let print_int = driver::find_function(&lib, "PrintInt").expect("PrintInt should be declared");
    let run = driver::find_function(&lib, "run").expect("run should be declared");
    let opcodes = &lib.functions.get(run).opcodes;
    assert!(
        opcodes.iter().any(|op| matches!(op, Opcode::StaticFunc { function, .. } if *function == print_int)),
        "expected `Print(0)` to resolve to the narrower `int` overload: {opcodes:?}"
    );
}
