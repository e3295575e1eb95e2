//! C6 — the file semantic builder (§4.5). Walks one file's flat token
//! stream in encounter order and populates the stub library: module
//! imports, class/struct/enum declarations (via an object stack so
//! nested members attach to whichever compound is currently open),
//! properties, function signatures (bodies are slurped as raw token
//! ranges for C8), and constants. Never looks outside the current file
//! — cross-file name resolution is C4's job once every file is built.

use crate::interned_path::InternedPath;
use crate::stub_library::StubLibrary;
use crate::stubs::ids::{ClassId, FileId, FunctionId, StubOwner, TypeDeclId};
use crate::stubs::kinds::{ConstantValue, EngineType};
use crate::stubs::{ArgFlags, ClassFlags, FunctionFlags, MemberFlags, SourceLocation};
use crate::string_interning::StringId;
use crate::tokens::{Keyword, Token, TokenCursor, TokenKind};

/// One entry in the object stack driving `beginCompound`/`endObject`
/// (§4.5). Only classes/structs and enums open a compound; function
/// bodies are never entered here, just recorded as a token range.
enum Compound {
    Class(ClassId),
    Enum(crate::stubs::ids::EnumId),
}

pub struct FileBuilder<'a, 'lib> {
    lib: &'lib mut StubLibrary,
    file: FileId,
    cursor: TokenCursor<'a>,
    stack: Vec<Compound>,
}

impl<'a, 'lib> FileBuilder<'a, 'lib> {
    pub fn new(lib: &'lib mut StubLibrary, file: FileId, tokens: &'a [Token]) -> Self {
        Self { lib, file, cursor: TokenCursor::new(tokens), stack: Vec::new() }
    }

    /// Drives the whole file. Returns once the token stream is exhausted
    /// or a top-level production can't be started (an error is already
    /// reported to the error sink in that case; the caller moves on to
    /// the next file).
    pub fn build(mut self) {
        while !self.cursor.is_at_end() {
            if !self.top_level_declaration() {
                // Couldn't make progress on this token; skip it so a
                // stray token doesn't wedge the whole file.
                self.cursor.pop();
            }
        }
    }

    fn current_owner(&self) -> StubOwner {
        match self.stack.last() {
            Some(Compound::Class(id)) => StubOwner::Class(*id),
            Some(Compound::Enum(_)) => {
                // Enums can't own nested members; callers that need an
                // enum's owner go through `current_enum` directly.
                StubOwner::File(self.file)
            }
            None => StubOwner::File(self.file),
        }
    }

    fn location(&self, tok: &Token) -> SourceLocation {
        SourceLocation::new(self.file, tok.location.line, tok.location.column)
    }

    fn error(&mut self, line: u32, msg: impl Into<String>) {
        let path = self.lib.file_abs_path(self.file);
        self.lib.errors.report_error(path, line, msg.into());
    }

    fn peek_keyword(&self) -> Option<Keyword> {
        self.cursor.peek().and_then(|t| t.as_keyword())
    }

    fn peek_char(&self) -> Option<char> {
        self.cursor.peek().and_then(|t| t.as_char())
    }

    fn expect_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.cursor.pop();
            true
        } else {
            false
        }
    }

    fn expect_identifier(&mut self) -> Option<(StringId, SourceLocation)> {
        let tok = self.cursor.peek()?;
        let name = tok.as_identifier()?;
        let loc = self.location(tok);
        self.cursor.pop();
        Some((name, loc))
    }

    /// Top-level production dispatch. Returns `false` when the current
    /// token doesn't start any recognized declaration.
    fn top_level_declaration(&mut self) -> bool {
        if self.expect_char(';') {
            return true;
        }
        if self.expect_char('}') {
            return self.end_object();
        }

        let Some(kw) = self.peek_keyword() else { return false };
        match kw {
            Keyword::Import => self.module_import(),
            Keyword::Class | Keyword::Struct => self.class_decl(kw == Keyword::Struct, MemberFlags::empty()),
            Keyword::Enum => self.enum_decl(MemberFlags::empty()),
            Keyword::Var => self.property_decl(MemberFlags::empty()),
            Keyword::Const => self.constant_decl(),
            Keyword::Function | Keyword::Static | Keyword::Signal | Keyword::Override | Keyword::Final | Keyword::Operator | Keyword::Cast | Keyword::Import_ | Keyword::Alias => {
                self.function_decl(MemberFlags::empty())
            }
            Keyword::Private => {
                self.cursor.pop();
                self.access_qualified_declaration(MemberFlags::PRIVATE)
            }
            Keyword::Protected => {
                self.cursor.pop();
                self.access_qualified_declaration(MemberFlags::PROTECTED)
            }
            Keyword::Public => {
                self.cursor.pop();
                self.access_qualified_declaration(MemberFlags::empty())
            }
            _ => false,
        }
    }

    fn access_qualified_declaration(&mut self, access: MemberFlags) -> bool {
        match self.peek_keyword() {
            Some(Keyword::Class) => self.class_decl(false, access),
            Some(Keyword::Struct) => self.class_decl(true, access),
            Some(Keyword::Enum) => self.enum_decl(access),
            Some(Keyword::Var) => self.property_decl(access),
            Some(
                Keyword::Function | Keyword::Static | Keyword::Signal | Keyword::Override | Keyword::Final | Keyword::Operator | Keyword::Cast | Keyword::Import_ | Keyword::Alias,
            ) => self.function_decl(access),
            _ => false,
        }
    }

    // -----------------------------------------------------------------
    // Module imports
    // -----------------------------------------------------------------

    fn module_import(&mut self) -> bool {
        let kw_tok = self.cursor.pop().unwrap();
        let loc = self.location(kw_tok);
        let Some((name, _)) = self.expect_identifier() else {
            self.error(loc.line, "expected module name after `import`");
            return true;
        };
        if self.lib.module_imports.iter().any(|m| m.owner == self.file && m.name == name) {
            self.error(loc.line, format!("module `{}` already imported in this file", name.resolve(&self.lib.strings)));
        }
        self.lib.create_module_import(self.file, loc, name);
        self.expect_char(';');
        true
    }

    // -----------------------------------------------------------------
    // Class / struct
    // -----------------------------------------------------------------

    fn class_decl(&mut self, is_struct: bool, access: MemberFlags) -> bool {
        let kw_tok = self.cursor.pop().unwrap();
        let loc = self.location(kw_tok);
        let Some((name, _)) = self.expect_identifier() else {
            self.error(loc.line, "expected class name");
            return true;
        };

        let mut flags = ClassFlags::empty();
        if is_struct {
            flags |= ClassFlags::STRUCT;
        }
        if access.contains(MemberFlags::PRIVATE) {
            flags |= ClassFlags::PRIVATE;
        }
        if access.contains(MemberFlags::PROTECTED) {
            flags |= ClassFlags::PROTECTED;
        }

        let owner = self.current_owner();
        let class = self.lib.create_class(owner, loc, name, flags);

        if self.expect_char(':') || (self.peek_keyword() == Some(Keyword::Extends) && self.cursor.pop().is_some()) {
            if let Some((base_name, base_loc)) = self.expect_identifier() {
                self.lib.classes.get_mut(class).base_name = Some(base_name);
                let _ = base_loc;
            }
        }

        if !self.expect_char('{') {
            self.error(loc.line, format!("expected `{{` after class `{}`", name.resolve(&self.lib.strings)));
            return true;
        }
        self.stack.push(Compound::Class(class));
        true
    }

    // -----------------------------------------------------------------
    // Enum
    // -----------------------------------------------------------------

    fn enum_decl(&mut self, access: MemberFlags) -> bool {
        let kw_tok = self.cursor.pop().unwrap();
        let loc = self.location(kw_tok);
        let Some((name, _)) = self.expect_identifier() else {
            self.error(loc.line, "expected enum name");
            return true;
        };
        let owner = self.current_owner();
        let e = self.lib.create_enum(owner, loc, name, access);

        if !self.expect_char('{') {
            self.error(loc.line, format!("expected `{{` after enum `{}`", name.resolve(&self.lib.strings)));
            return true;
        }
        self.stack.push(Compound::Enum(e));
        self.enum_options(e);
        true
    }

    /// Enum bodies are a flat comma-separated option list, not a nested
    /// declaration space, so they're consumed directly here instead of
    /// going back through `top_level_declaration`.
    fn enum_options(&mut self, e: crate::stubs::ids::EnumId) {
        loop {
            if self.expect_char('}') {
                self.stack.pop();
                return;
            }
            let Some((name, loc)) = self.expect_identifier() else {
                // Malformed option list; bail out of the enum so the
                // outer loop can resynchronize on the next token.
                self.stack.pop();
                return;
            };
            let mut value = None;
            if self.expect_char('=') {
                if let Some(tok) = self.cursor.peek() {
                    if let TokenKind::Integer(v, _) = tok.kind {
                        value = Some(v);
                        self.cursor.pop();
                    }
                }
            }
            self.lib.create_enum_option(e, loc, name, value);
            if !self.expect_char(',') && self.peek_char() != Some('}') {
                self.stack.pop();
                return;
            }
        }
    }

    fn end_object(&mut self) -> bool {
        match self.stack.pop() {
            Some(_) => {
                self.expect_char(';');
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------
    // Property
    // -----------------------------------------------------------------

    fn property_decl(&mut self, access: MemberFlags) -> bool {
        let kw_tok = self.cursor.pop().unwrap();
        let loc = self.location(kw_tok);
        let Some((name, _)) = self.expect_identifier() else {
            self.error(loc.line, "expected property name after `var`");
            return true;
        };
        if !self.expect_char(':') {
            self.error(loc.line, format!("expected `:` after `var {}`", name.resolve(&self.lib.strings)));
            self.skip_to_semicolon();
            return true;
        }
        let owner = self.current_owner();
        let type_decl = self.parse_type(owner);

        let default_value = if self.expect_char('=') { self.parse_constant_value(owner) } else { None };

        self.lib.create_property(owner, loc, name, access, type_decl, default_value);
        self.expect_char(';');
        true
    }

    // -----------------------------------------------------------------
    // Function
    // -----------------------------------------------------------------

    fn function_decl(&mut self, access: MemberFlags) -> bool {
        let start_loc = self.cursor.peek().map(|t| self.location(t)).unwrap();
        let mut flags = FunctionFlags::empty();
        if access.contains(MemberFlags::PRIVATE) {
            flags |= FunctionFlags::PRIVATE;
        }
        if access.contains(MemberFlags::PROTECTED) {
            flags |= FunctionFlags::PROTECTED;
        }

        let mut alias_name: Option<StringId> = None;

        loop {
            match self.peek_keyword() {
                Some(Keyword::Alias) => {
                    self.cursor.pop();
                    match self.expect_identifier() {
                        Some((name, _)) => alias_name = Some(name),
                        None => self.error(start_loc.line, "expected alias name after `alias`"),
                    }
                }
                Some(Keyword::Static) => {
                    flags |= FunctionFlags::STATIC;
                    self.cursor.pop();
                }
                Some(Keyword::Final) => {
                    flags |= FunctionFlags::FINAL;
                    self.cursor.pop();
                }
                Some(Keyword::Override) => {
                    flags |= FunctionFlags::OVERRIDE;
                    self.cursor.pop();
                }
                Some(Keyword::Signal) => {
                    flags |= FunctionFlags::SIGNAL;
                    self.cursor.pop();
                }
                Some(Keyword::Import_) => {
                    flags |= FunctionFlags::IMPORT;
                    self.cursor.pop();
                }
                Some(Keyword::Operator) => {
                    flags |= FunctionFlags::OPERATOR;
                    self.cursor.pop();
                }
                Some(Keyword::Cast) => {
                    flags |= FunctionFlags::CAST;
                    self.cursor.pop();
                }
                Some(Keyword::Function) => {
                    self.cursor.pop();
                    break;
                }
                _ => break,
            }
        }

        if matches!(self.current_owner(), StubOwner::File(_)) {
            flags |= FunctionFlags::STATIC;
        }

        let Some((name, _)) = self.expect_identifier() else {
            self.error(start_loc.line, "expected function name");
            return true;
        };

        if !self.expect_char('(') {
            self.error(start_loc.line, format!("expected `(` after function name `{}`", name.resolve(&self.lib.strings)));
            return true;
        }

        let owner = self.current_owner();
        let func = self.lib.create_function(owner, start_loc, name, flags, None);
        if alias_name.is_some() {
            self.lib.functions.get_mut(func).alias_name = alias_name;
        }
        self.function_args(func);

        if !self.expect_char(')') {
            self.error(start_loc.line, "expected `)` to close argument list");
        }

        if self.expect_char(':') {
            let ret = self.parse_type(StubOwner::Function(func));
            self.lib.functions.get_mut(func).return_type = Some(ret);
        }

        if self.peek_char_is('{') {
            if let Some(range) = self.cursor.extract_balanced('{', '}') {
                self.lib.functions.get_mut(func).body_tokens = Some(range);
            }
        } else {
            self.expect_char(';');
        }
        true
    }

    fn peek_char_is(&self, c: char) -> bool {
        self.peek_char() == Some(c)
    }

    fn function_args(&mut self, func: FunctionId) {
        if self.peek_char_is(')') {
            return;
        }
        loop {
            let mut flags = ArgFlags::empty();
            loop {
                match self.peek_keyword() {
                    Some(Keyword::Ref) => {
                        flags |= ArgFlags::REF;
                        self.cursor.pop();
                    }
                    Some(Keyword::Out) => {
                        flags |= ArgFlags::OUT;
                        self.cursor.pop();
                    }
                    Some(Keyword::Explicit) => {
                        flags |= ArgFlags::EXPLICIT;
                        self.cursor.pop();
                    }
                    _ => break,
                }
            }
            let Some((name, loc)) = self.expect_identifier() else { return };
            if !self.expect_char(':') {
                self.error(loc.line, format!("expected `:` after argument `{}`", name.resolve(&self.lib.strings)));
                return;
            }
            let owner = StubOwner::Function(func);
            let type_decl = self.parse_type(owner);
            let default_value = if self.expect_char('=') { self.parse_constant_value(owner) } else { None };
            self.lib.create_function_arg(func, loc, name, type_decl, flags, default_value);
            if !self.expect_char(',') {
                return;
            }
        }
    }

    // -----------------------------------------------------------------
    // Constants
    // -----------------------------------------------------------------

    fn constant_decl(&mut self) -> bool {
        let kw_tok = self.cursor.pop().unwrap();
        let loc = self.location(kw_tok);
        let Some((name, _)) = self.expect_identifier() else {
            self.error(loc.line, "expected constant name after `const`");
            return true;
        };
        let owner = self.current_owner();
        let type_decl = if self.expect_char(':') { self.parse_type(owner) } else { self.lib.engine_type_decl(EngineType::Int) };

        if !self.expect_char('=') {
            self.error(loc.line, format!("expected `=` for constant `{}`", name.resolve(&self.lib.strings)));
            self.skip_to_semicolon();
            return true;
        }

        let Some(value) = self.parse_constant_value(owner) else {
            self.error(loc.line, "expected a constant value");
            self.skip_to_semicolon();
            return true;
        };

        self.lib.create_constant(owner, loc, name, type_decl, value);
        self.expect_char(';');
        true
    }

    fn parse_constant_value(&mut self, owner: StubOwner) -> Option<crate::stubs::ids::ConstantValueId> {
        let tok = self.cursor.peek()?;
        let value = match tok.kind.clone() {
            TokenKind::Integer(v, _) => {
                self.cursor.pop();
                ConstantValue::Integer(v)
            }
            TokenKind::Float(v, _) => {
                self.cursor.pop();
                ConstantValue::Float(v)
            }
            TokenKind::String(s) => {
                self.cursor.pop();
                ConstantValue::String(s)
            }
            TokenKind::Name(s) => {
                self.cursor.pop();
                ConstantValue::Name(s)
            }
            TokenKind::Keyword(Keyword::True) => {
                self.cursor.pop();
                ConstantValue::Bool(true)
            }
            TokenKind::Keyword(Keyword::False) => {
                self.cursor.pop();
                ConstantValue::Bool(false)
            }
            TokenKind::Char('{') => {
                self.cursor.pop();
                let type_decl = self.placeholder_type_decl();
                let mut inner = Vec::new();
                while !self.expect_char('}') {
                    if let Some(v) = self.parse_constant_value(owner) {
                        inner.push(v);
                    } else {
                        break;
                    }
                    if !self.expect_char(',') && self.peek_char() != Some('}') {
                        break;
                    }
                }
                ConstantValue::Compound { type_decl, inner }
            }
            _ => return None,
        };
        Some(self.lib.create_constant_value(value))
    }

    fn placeholder_type_decl(&mut self) -> TypeDeclId {
        self.lib.engine_type_decl(EngineType::Variant)
    }

    fn skip_to_semicolon(&mut self) {
        while let Some(tok) = self.cursor.peek() {
            if tok.as_char() == Some(';') {
                self.cursor.pop();
                return;
            }
            self.cursor.pop();
        }
    }

    // -----------------------------------------------------------------
    // Type expressions, built bottom-up (§4.5)
    // -----------------------------------------------------------------

    fn parse_type(&mut self, owner: StubOwner) -> TypeDeclId {
        // Engine primitives (`int`, `float`, ...) lex as plain
        // identifiers, not keywords, so they're recognized by spelling
        // here before falling through to the general named-type path.
        if let Some(tok) = self.cursor.peek() {
            if let Some(name) = tok.as_identifier() {
                let spelling = name.resolve(&self.lib.strings).to_string();
                if let Some(engine) = engine_primitive_by_name(&spelling) {
                    self.cursor.pop();
                    let base = self.lib.engine_type_decl(engine);
                    return self.parse_type_suffix(base);
                }
            }
        }

        // `ptr<X>` / `weak<X>` / `class<X>`
        if let Some((name, loc)) = self.peek_template_head() {
            let name_str = name.resolve(&self.lib.strings).to_string();
            if matches!(name_str.as_str(), "ptr" | "weak" | "class") {
                self.cursor.pop();
                self.cursor.pop(); // '<'
                let path = self.parse_qualified_name();
                self.expect_char('>');
                let type_ref = self.lib.create_type_ref(Some(owner), loc, path);
                return match name_str.as_str() {
                    "ptr" => self.lib.ptr_type_decl(type_ref),
                    "weak" => self.lib.weak_ptr_type_decl(type_ref),
                    _ => self.lib.class_type_decl(type_ref),
                };
            }
        }

        let loc = self.cursor.peek().map(|t| self.location(t)).unwrap_or(SourceLocation::new(self.file, 0, 0));
        let path = self.parse_qualified_name();
        if path.is_empty() {
            self.error(loc.line, "expected a type");
            return self.lib.engine_type_decl(EngineType::Variant);
        }
        let type_ref = self.lib.create_type_ref(Some(owner), loc, path);
        let base = self.lib.simple_type_decl(type_ref);
        self.parse_type_suffix(base)
    }

    /// `T[]` (dynamic array) and `T[N]` (static array), stackable.
    fn parse_type_suffix(&mut self, mut decl: TypeDeclId) -> TypeDeclId {
        while self.expect_char('[') {
            if let Some(tok) = self.cursor.peek() {
                if let TokenKind::Integer(size, _) = tok.kind {
                    self.cursor.pop();
                    self.expect_char(']');
                    decl = self.lib.static_array_type_decl(decl, size as u32);
                    continue;
                }
            }
            self.expect_char(']');
            decl = self.lib.dynamic_array_type_decl(decl);
        }
        decl
    }

    /// Peeks an `identifier <` sequence without consuming it, the
    /// lookahead `ptr<X>`/`weak<X>`/`class<X>` parsing needs to
    /// distinguish a template type from a bare qualified name followed by
    /// a `<` comparison (never happens in a type position, but kept
    /// explicit rather than assumed).
    fn peek_template_head(&self) -> Option<(StringId, SourceLocation)> {
        let first = self.cursor.peek()?;
        let name = first.as_identifier()?;
        let second = self.cursor.peek_nth(1)?;
        if second.as_char() == Some('<') {
            Some((name, self.location(first)))
        } else {
            None
        }
    }

    fn parse_qualified_name(&mut self) -> InternedPath {
        let mut path = InternedPath::new();
        let Some((first, _)) = self.expect_identifier() else { return path };
        path.push(first);
        while self.peek_char() == Some('.') {
            self.cursor.pop();
            let Some((next, _)) = self.expect_identifier() else { break };
            path.push(next);
        }
        path
    }
}

/// Recognizes the identifier spelling of an engine primitive, used from
/// `parse_type`'s fallback path before falling through to a `TypeRef`.
fn engine_primitive_by_name(name: &str) -> Option<EngineType> {
    match name {
        "int" => Some(EngineType::Int),
        "uint" => Some(EngineType::Uint),
        "int64" => Some(EngineType::Int64),
        "uint64" => Some(EngineType::Uint64),
        "int16" => Some(EngineType::Int16),
        "int8" => Some(EngineType::Int8),
        "uint8" => Some(EngineType::Uint8),
        "uint16" => Some(EngineType::Uint16),
        "float" => Some(EngineType::Float),
        "double" => Some(EngineType::Double),
        "bool" => Some(EngineType::Bool),
        "strid" => Some(EngineType::Strid),
        "string" => Some(EngineType::String),
        "Variant" => Some(EngineType::Variant),
        "void" => Some(EngineType::Void),
        _ => None,
    }
}
