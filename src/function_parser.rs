//! C8 — the function body parser (§4.7). Walks one function's raw
//! `body_tokens` range and produces a fresh `FunctionAst` of unresolved
//! `NodeKind` variants only: no scope wiring, no variable/type
//! resolution, no overload or cast resolution — all of that is the
//! elaborator's job (C9) over the tree this module hands back. The one
//! exception is `resolve_name`, consulted purely to tell whether a bare
//! call's callee names a type (`Foo(x)`, a struct construction or a
//! user cast) rather than an ordinary function (§4.5/§4.7).

use crate::function_ast::{FunctionAst, Node, NodeId, NodeKind};
use crate::interned_path::InternedPath;
use crate::stub_library::{ResolvedStub, StubLibrary};
use crate::stubs::ids::{FileId, FunctionId, StubOwner, TypeDeclId};
use crate::stubs::kinds::{ConstantValue, EngineType};
use crate::stubs::SourceLocation;
use crate::string_interning::StringId;
use crate::tokens::{Keyword, Token, TokenCursor, TokenKind};

/// Parses `owner`'s body into a fresh `FunctionAst`. `file_tokens` is the
/// full token array of the file `owner` was declared in — `body_tokens`
/// is a range into that array, not a self-contained slice (§6.1) — and
/// `file` is that same file, supplied by the caller rather than derived,
/// since the driver already knows it from the file-building pass that
/// just ran. Returns `None` for a function with no body (an import or a
/// bare declaration); those never reach C9/C10.
pub fn parse_function_body(
    lib: &mut StubLibrary,
    owner: FunctionId,
    file: FileId,
    file_tokens: &[Token],
) -> Option<FunctionAst> {
    let range = lib.functions.get(owner).body_tokens?;
    let tokens = &file_tokens[range.start as usize..range.end as usize];
    let mut parser = FunctionParser {
        lib,
        owner,
        file,
        cursor: TokenCursor::new(tokens),
        ast: FunctionAst::new(),
    };
    let root = parser.parse_block();
    parser.ast.root = Some(root);
    Some(parser.ast)
}

struct FunctionParser<'a, 'lib> {
    lib: &'lib mut StubLibrary,
    owner: FunctionId,
    file: FileId,
    cursor: TokenCursor<'a>,
    ast: FunctionAst,
}

impl<'a, 'lib> FunctionParser<'a, 'lib> {
    fn loc_here(&self) -> SourceLocation {
        self.cursor.peek().map(|t| t.location).unwrap_or_else(|| self.lib.functions.get(self.owner).location)
    }

    fn error(&mut self, loc: SourceLocation, msg: impl Into<String>) {
        let path = self.lib.file_abs_path(self.file);
        self.lib.errors.report_error(path, loc.line, msg.into());
    }

    fn peek_keyword(&self) -> Option<Keyword> {
        self.cursor.peek().and_then(|t| t.as_keyword())
    }

    fn peek_char(&self) -> Option<char> {
        self.cursor.peek().and_then(|t| t.as_char())
    }

    fn peek_char_is(&self, c: char) -> bool {
        self.peek_char() == Some(c)
    }

    fn expect_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.cursor.pop();
            true
        } else {
            false
        }
    }

    /// Like `expect_char` but hands back the location of the consumed
    /// token, for operator/statement nodes that need to point at it.
    fn try_consume_op1(&mut self, c: char) -> Option<SourceLocation> {
        let loc = self.cursor.peek().filter(|t| t.as_char() == Some(c))?.location;
        self.cursor.pop();
        Some(loc)
    }

    /// Consumes two adjacent single-char tokens as one operator (`==`,
    /// `<=`, `&&`, …); tokens carry one punctuation char each (§6.1), so
    /// multi-char operators are recombined here rather than lexed whole.
    fn try_consume_op2(&mut self, a: char, b: char) -> Option<SourceLocation> {
        let first = self.cursor.peek()?;
        if first.as_char() != Some(a) {
            return None;
        }
        let second = self.cursor.peek_nth(1)?;
        if second.as_char() != Some(b) {
            return None;
        }
        let loc = first.location;
        self.cursor.pop();
        self.cursor.pop();
        Some(loc)
    }

    /// Consumes a single `c` as long as it isn't the first half of the
    /// doubled operator `cc` (`|` vs `||`, `&` vs `&&`), which binds at a
    /// different (lower) precedence level and is handled by the caller
    /// above this one.
    fn try_consume_single_not_doubled(&mut self, c: char) -> Option<SourceLocation> {
        let first = self.cursor.peek()?;
        if first.as_char() != Some(c) {
            return None;
        }
        if self.cursor.peek_nth(1).and_then(|t| t.as_char()) == Some(c) {
            return None;
        }
        let loc = first.location;
        self.cursor.pop();
        Some(loc)
    }

    fn expect_identifier(&mut self) -> Option<(StringId, SourceLocation)> {
        let tok = self.cursor.peek()?;
        let name = tok.as_identifier()?;
        let loc = tok.location;
        self.cursor.pop();
        Some((name, loc))
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

    fn wrap_operator(&mut self, symbol: &str, loc: SourceLocation, children: Vec<NodeId>) -> NodeId {
        let sym = self.lib.strings.intern(symbol);
        self.ast.alloc(Node::new(NodeKind::Operator(sym), loc).with_children(children))
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn parse_block(&mut self) -> NodeId {
        let loc = self.loc_here();
        self.expect_char('{');
        let mut children = Vec::new();
        while !self.peek_char_is('}') && !self.cursor.is_at_end() {
            children.push(self.parse_statement());
        }
        self.expect_char('}');
        self.ast.alloc(Node::new(NodeKind::Scope, loc).with_children(children))
    }

    fn parse_statement(&mut self) -> NodeId {
        let loc = self.loc_here();
        if self.peek_char_is('{') {
            return self.parse_block();
        }
        if self.expect_char(';') {
            return self.ast.alloc(Node::new(NodeKind::Nop, loc));
        }
        match self.peek_keyword() {
            Some(Keyword::If) => return self.parse_if(),
            Some(Keyword::Switch) => return self.parse_switch(),
            Some(Keyword::For) => return self.parse_for(),
            Some(Keyword::While) => return self.parse_while(),
            Some(Keyword::Do) => return self.parse_do_while(),
            Some(Keyword::Return) => return self.parse_return(),
            Some(Keyword::Break) => {
                self.cursor.pop();
                self.expect_char(';');
                return self.ast.alloc(Node::new(NodeKind::Break, loc));
            }
            Some(Keyword::Continue) => {
                self.cursor.pop();
                self.expect_char(';');
                return self.ast.alloc(Node::new(NodeKind::Continue, loc));
            }
            Some(Keyword::Var) => return self.parse_var_decl(),
            _ => {}
        }
        let expr = self.parse_assignment();
        self.expect_char(';');
        self.ast.alloc(Node::new(NodeKind::Statement, loc).with_children(vec![expr]))
    }

    fn parse_if(&mut self) -> NodeId {
        let loc = self.cursor.pop().unwrap().location;
        self.expect_char('(');
        let cond = self.parse_assignment();
        self.expect_char(')');
        let then_branch = self.parse_statement();
        let mut children = vec![cond, then_branch];
        if self.peek_keyword() == Some(Keyword::Else) {
            self.cursor.pop();
            children.push(self.parse_statement());
        }
        self.ast.alloc(Node::new(NodeKind::IfThenElse, loc).with_children(children))
    }

    fn parse_switch(&mut self) -> NodeId {
        let loc = self.cursor.pop().unwrap().location;
        self.expect_char('(');
        let subject = self.parse_assignment();
        self.expect_char(')');
        self.expect_char('{');
        let mut children = vec![subject];
        loop {
            match self.peek_keyword() {
                Some(Keyword::Case) => children.push(self.parse_case()),
                Some(Keyword::Default) => children.push(self.parse_default_case()),
                _ => break,
            }
        }
        self.expect_char('}');
        self.ast.alloc(Node::new(NodeKind::Switch, loc).with_children(children))
    }

    fn parse_case(&mut self) -> NodeId {
        let loc = self.cursor.pop().unwrap().location;
        let value = self.parse_assignment();
        self.expect_char(':');
        let body = self.parse_case_body(loc);
        self.ast.alloc(Node::new(NodeKind::Case, loc).with_children(vec![value, body]))
    }

    fn parse_default_case(&mut self) -> NodeId {
        let loc = self.cursor.pop().unwrap().location;
        self.expect_char(':');
        let body = self.parse_case_body(loc);
        self.ast.alloc(Node::new(NodeKind::DefaultCase, loc).with_children(vec![body]))
    }

    /// The statement list between one `case`/`default` label and the
    /// next (or the closing `}`), with no fallthrough handling of its
    /// own — §4.9's lowering pass is the one that turns this into jumps.
    fn parse_case_body(&mut self, loc: SourceLocation) -> NodeId {
        let mut stmts = Vec::new();
        while !matches!(self.peek_keyword(), Some(Keyword::Case) | Some(Keyword::Default)) && !self.peek_char_is('}') && !self.cursor.is_at_end() {
            stmts.push(self.parse_statement());
        }
        self.ast.alloc(Node::new(NodeKind::StatementList, loc).with_children(stmts))
    }

    /// `for(init; cond; incr) body`. The `For` node itself only ever
    /// carries `[condition, increment, body]` (§4.6); an init clause, if
    /// present, is lowered here into an enclosing `Scope` that holds the
    /// init statement followed by the loop, so the init variable's scope
    /// still ends where the loop does without the node needing a fourth
    /// child slot.
    fn parse_for(&mut self) -> NodeId {
        let loc = self.cursor.pop().unwrap().location;
        self.expect_char('(');
        let init = if self.expect_char(';') {
            None
        } else if self.peek_keyword() == Some(Keyword::Var) {
            Some(self.parse_var_decl())
        } else {
            let stmt_loc = self.loc_here();
            let e = self.parse_assignment();
            self.expect_char(';');
            Some(self.ast.alloc(Node::new(NodeKind::Statement, stmt_loc).with_children(vec![e])))
        };
        let cond = if self.peek_char_is(';') {
            self.ast.alloc(Node::new(NodeKind::Nop, loc))
        } else {
            self.parse_assignment()
        };
        self.expect_char(';');
        let incr = if self.peek_char_is(')') {
            self.ast.alloc(Node::new(NodeKind::Nop, loc))
        } else {
            self.parse_assignment()
        };
        self.expect_char(')');
        let body = self.parse_statement();
        let for_node = self.ast.alloc(Node::new(NodeKind::For, loc).with_children(vec![cond, incr, body]));
        match init {
            Some(init_stmt) => self.ast.alloc(Node::new(NodeKind::Scope, loc).with_children(vec![init_stmt, for_node])),
            None => for_node,
        }
    }

    fn parse_while(&mut self) -> NodeId {
        let loc = self.cursor.pop().unwrap().location;
        self.expect_char('(');
        let cond = self.parse_assignment();
        self.expect_char(')');
        let body = self.parse_statement();
        let incr = self.ast.alloc(Node::new(NodeKind::Nop, loc));
        self.ast.alloc(Node::new(NodeKind::While, loc).with_children(vec![cond, incr, body]))
    }

    fn parse_do_while(&mut self) -> NodeId {
        let loc = self.cursor.pop().unwrap().location;
        let body = self.parse_statement();
        if self.peek_keyword() == Some(Keyword::While) {
            self.cursor.pop();
        } else {
            self.error(loc, "expected `while` after `do` body");
        }
        self.expect_char('(');
        let cond = self.parse_assignment();
        self.expect_char(')');
        self.expect_char(';');
        let incr = self.ast.alloc(Node::new(NodeKind::Nop, loc));
        self.ast.alloc(Node::new(NodeKind::DoWhile, loc).with_children(vec![cond, incr, body]))
    }

    fn parse_return(&mut self) -> NodeId {
        let loc = self.cursor.pop().unwrap().location;
        let mut children = Vec::new();
        if !self.peek_char_is(';') {
            children.push(self.parse_assignment());
        }
        self.expect_char(';');
        self.ast.alloc(Node::new(NodeKind::Return, loc).with_children(children))
    }

    fn parse_var_decl(&mut self) -> NodeId {
        let loc = self.cursor.pop().unwrap().location;
        let Some((name, _)) = self.expect_identifier() else {
            self.error(loc, "expected variable name after `var`");
            self.skip_to_semicolon();
            return self.ast.alloc(Node::new(NodeKind::Nop, loc));
        };
        let type_decl = if self.expect_char(':') {
            self.parse_type_expr()
        } else {
            self.lib.engine_type_decl(EngineType::Variant)
        };
        let mut children = Vec::new();
        if self.expect_char('=') {
            children.push(self.parse_assignment());
        }
        self.expect_char(';');
        self.ast.alloc(Node::new(NodeKind::Var { name, type_decl }, loc).with_children(children))
    }

    // -----------------------------------------------------------------
    // Expressions, precedence-climbing one level per method
    // -----------------------------------------------------------------

    fn parse_assignment(&mut self) -> NodeId {
        let left = self.parse_conditional();
        if let Some(loc) = self.try_consume_op1('=') {
            let right = self.parse_assignment();
            return self.ast.alloc(Node::new(NodeKind::Assign, loc).with_children(vec![left, right]));
        }
        left
    }

    fn parse_conditional(&mut self) -> NodeId {
        let cond = self.parse_logical_or();
        if let Some(loc) = self.try_consume_op1('?') {
            let then_expr = self.parse_assignment();
            self.expect_char(':');
            let else_expr = self.parse_conditional();
            return self.ast.alloc(Node::new(NodeKind::Conditional, loc).with_children(vec![cond, then_expr, else_expr]));
        }
        cond
    }

    fn parse_logical_or(&mut self) -> NodeId {
        let mut left = self.parse_logical_and();
        while let Some(loc) = self.try_consume_op2('|', '|') {
            let right = self.parse_logical_and();
            left = self.wrap_operator("opOr", loc, vec![left, right]);
        }
        left
    }

    fn parse_logical_and(&mut self) -> NodeId {
        let mut left = self.parse_bit_or();
        while let Some(loc) = self.try_consume_op2('&', '&') {
            let right = self.parse_bit_or();
            left = self.wrap_operator("opAnd", loc, vec![left, right]);
        }
        left
    }

    fn parse_bit_or(&mut self) -> NodeId {
        let mut left = self.parse_bit_xor();
        while let Some(loc) = self.try_consume_single_not_doubled('|') {
            let right = self.parse_bit_xor();
            left = self.wrap_operator("opBinaryOr", loc, vec![left, right]);
        }
        left
    }

    fn parse_bit_xor(&mut self) -> NodeId {
        let mut left = self.parse_bit_and();
        while let Some(loc) = self.try_consume_op1('^') {
            let right = self.parse_bit_and();
            left = self.wrap_operator("opBinaryXor", loc, vec![left, right]);
        }
        left
    }

    fn parse_bit_and(&mut self) -> NodeId {
        let mut left = self.parse_equality();
        while let Some(loc) = self.try_consume_single_not_doubled('&') {
            let right = self.parse_equality();
            left = self.wrap_operator("opBinaryAnd", loc, vec![left, right]);
        }
        left
    }

    fn parse_equality(&mut self) -> NodeId {
        let mut left = self.parse_relational();
        loop {
            if let Some(loc) = self.try_consume_op2('=', '=') {
                let right = self.parse_relational();
                left = self.wrap_operator("opEqual", loc, vec![left, right]);
            } else if let Some(loc) = self.try_consume_op2('!', '=') {
                let right = self.parse_relational();
                left = self.wrap_operator("opNotEqual", loc, vec![left, right]);
            } else {
                return left;
            }
        }
    }

    fn parse_relational(&mut self) -> NodeId {
        let mut left = self.parse_shift();
        loop {
            if let Some(loc) = self.try_consume_op2('<', '=') {
                let right = self.parse_shift();
                left = self.wrap_operator("opLessEqual", loc, vec![left, right]);
            } else if let Some(loc) = self.try_consume_op2('>', '=') {
                let right = self.parse_shift();
                left = self.wrap_operator("opGreaterEqual", loc, vec![left, right]);
            } else if let Some(loc) = self.try_consume_op1('<') {
                let right = self.parse_shift();
                left = self.wrap_operator("opLess", loc, vec![left, right]);
            } else if let Some(loc) = self.try_consume_op1('>') {
                let right = self.parse_shift();
                left = self.wrap_operator("opGreater", loc, vec![left, right]);
            } else {
                return left;
            }
        }
    }

    fn parse_shift(&mut self) -> NodeId {
        let mut left = self.parse_additive();
        loop {
            if let Some(loc) = self.try_consume_op2('<', '<') {
                let right = self.parse_additive();
                left = self.wrap_operator("opShiftLeft", loc, vec![left, right]);
            } else if let Some(loc) = self.try_consume_op2('>', '>') {
                let right = self.parse_additive();
                left = self.wrap_operator("opShiftRight", loc, vec![left, right]);
            } else {
                return left;
            }
        }
    }

    fn parse_additive(&mut self) -> NodeId {
        let mut left = self.parse_multiplicative();
        loop {
            if let Some(loc) = self.try_consume_op1('+') {
                let right = self.parse_multiplicative();
                left = self.wrap_operator("opAdd", loc, vec![left, right]);
            } else if let Some(loc) = self.try_consume_op1('-') {
                let right = self.parse_multiplicative();
                left = self.wrap_operator("opSubtract", loc, vec![left, right]);
            } else {
                return left;
            }
        }
    }

    fn parse_multiplicative(&mut self) -> NodeId {
        let mut left = self.parse_unary();
        loop {
            if let Some(loc) = self.try_consume_op1('*') {
                let right = self.parse_unary();
                left = self.wrap_operator("opMultiply", loc, vec![left, right]);
            } else if let Some(loc) = self.try_consume_op1('/') {
                let right = self.parse_unary();
                left = self.wrap_operator("opDivide", loc, vec![left, right]);
            } else if let Some(loc) = self.try_consume_op1('%') {
                let right = self.parse_unary();
                left = self.wrap_operator("opModulo", loc, vec![left, right]);
            } else {
                return left;
            }
        }
    }

    fn parse_unary(&mut self) -> NodeId {
        if let Some(loc) = self.try_consume_op2('+', '+') {
            let inner = self.parse_unary();
            return self.wrap_operator("opIncrement", loc, vec![inner]);
        }
        if let Some(loc) = self.try_consume_op2('-', '-') {
            let inner = self.parse_unary();
            return self.wrap_operator("opDecrement", loc, vec![inner]);
        }
        if let Some(loc) = self.try_consume_op1('-') {
            let inner = self.parse_unary();
            return self.wrap_operator("opNegate", loc, vec![inner]);
        }
        if let Some(loc) = self.try_consume_op1('+') {
            let inner = self.parse_unary();
            return self.wrap_operator("opPlus", loc, vec![inner]);
        }
        if let Some(loc) = self.try_consume_op1('!') {
            let inner = self.parse_unary();
            return self.wrap_operator("opNot", loc, vec![inner]);
        }
        if let Some(loc) = self.try_consume_op1('~') {
            let inner = self.parse_unary();
            return self.wrap_operator("opBinaryNot", loc, vec![inner]);
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> NodeId {
        let mut node = self.parse_primary();
        loop {
            if self.peek_char_is('(') {
                node = self.finish_call(node);
            } else if let Some(loc) = self.try_consume_op1('[') {
                let index = self.parse_assignment();
                self.expect_char(']');
                node = self.ast.alloc(Node::new(NodeKind::AccessIndex, loc).with_children(vec![node, index]));
            } else if let Some(loc) = self.try_consume_op1('.') {
                let Some((name, _)) = self.expect_identifier() else {
                    self.error(loc, "expected a member name after `.`");
                    break;
                };
                node = self.ast.alloc(Node::new(NodeKind::AccessMember(name), loc).with_children(vec![node]));
            } else if let Some(loc) = self.try_consume_op2('+', '+') {
                node = self.wrap_operator("opPostIncrement", loc, vec![node]);
            } else if let Some(loc) = self.try_consume_op2('-', '-') {
                node = self.wrap_operator("opPostDecrement", loc, vec![node]);
            } else {
                break;
            }
        }
        node
    }

    fn finish_call(&mut self, callee: NodeId) -> NodeId {
        let loc = self.loc_here();
        self.cursor.pop(); // '('
        let mut args = Vec::new();
        if !self.peek_char_is(')') {
            loop {
                args.push(self.parse_assignment());
                if self.try_consume_op1(',').is_none() {
                    break;
                }
            }
        }
        self.expect_char(')');
        let callee = self.maybe_type_callee(callee);
        let mut children = vec![callee];
        children.append(&mut args);
        self.ast.alloc(Node::new(NodeKind::Call, loc).with_children(children))
    }

    /// `Foo(x)` where `Foo` names a type (a struct constructor or a user
    /// `cast` function) parses its callee as a `Type` node instead of a
    /// bare `Ident`, so the elaborator doesn't have to re-derive the
    /// distinction from scratch (§4.5/§4.7's disambiguation note). Only
    /// a single bare identifier is considered; a qualified path already
    /// parsed as `AccessMember` chains is left as an ordinary call.
    fn maybe_type_callee(&mut self, callee: NodeId) -> NodeId {
        let (name, location) = match &self.ast.get(callee).kind {
            NodeKind::Ident(name) => (*name, self.ast.get(callee).location),
            _ => return callee,
        };
        let spelling = name.resolve(&self.lib.strings).to_string();
        if let Some(engine) = engine_primitive_by_name(&spelling) {
            let decl = self.lib.engine_type_decl(engine);
            return self.ast.alloc(Node::new(NodeKind::Type(decl), location));
        }
        let mut path = InternedPath::new();
        path.push(name);
        let resolved = self.lib.resolve_name(&path, StubOwner::Function(self.owner));
        let is_type = matches!(resolved, Some(ResolvedStub::Class(_)) | Some(ResolvedStub::TypeName(_)));
        if !is_type {
            return callee;
        }
        let type_ref = self.lib.create_type_ref(Some(StubOwner::Function(self.owner)), location, path);
        let decl = self.lib.simple_type_decl(type_ref);
        self.ast.alloc(Node::new(NodeKind::Type(decl), location))
    }

    fn parse_new(&mut self) -> NodeId {
        let loc = self.cursor.pop().unwrap().location;
        let type_decl = self.parse_type_expr();
        let mut args = Vec::new();
        if self.expect_char('(') {
            if !self.peek_char_is(')') {
                loop {
                    args.push(self.parse_assignment());
                    if self.try_consume_op1(',').is_none() {
                        break;
                    }
                }
            }
            self.expect_char(')');
        }
        let type_node = self.ast.alloc(Node::new(NodeKind::Type(type_decl), loc));
        let mut children = vec![type_node];
        children.append(&mut args);
        self.ast.alloc(Node::new(NodeKind::New, loc).with_children(children))
    }

    fn parse_primary(&mut self) -> NodeId {
        let loc = self.loc_here();
        let Some(tok) = self.cursor.peek().cloned() else {
            self.error(loc, "unexpected end of function body");
            return self.ast.alloc(Node::new(NodeKind::Nop, loc));
        };
        match tok.kind {
            TokenKind::Integer(v, _) => {
                self.cursor.pop();
                let c = self.lib.create_constant_value(ConstantValue::Integer(v));
                self.ast.alloc(Node::new(NodeKind::Const(c), loc))
            }
            TokenKind::Float(v, _) => {
                self.cursor.pop();
                let c = self.lib.create_constant_value(ConstantValue::Float(v));
                self.ast.alloc(Node::new(NodeKind::Const(c), loc))
            }
            TokenKind::String(s) => {
                self.cursor.pop();
                let c = self.lib.create_constant_value(ConstantValue::String(s));
                self.ast.alloc(Node::new(NodeKind::Const(c), loc))
            }
            TokenKind::Name(s) => {
                self.cursor.pop();
                let c = self.lib.create_constant_value(ConstantValue::Name(s));
                self.ast.alloc(Node::new(NodeKind::Const(c), loc))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.cursor.pop();
                let c = self.lib.create_constant_value(ConstantValue::Bool(true));
                self.ast.alloc(Node::new(NodeKind::Const(c), loc))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.cursor.pop();
                let c = self.lib.create_constant_value(ConstantValue::Bool(false));
                self.ast.alloc(Node::new(NodeKind::Const(c), loc))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.cursor.pop();
                self.ast.alloc(Node::new(NodeKind::Null, loc))
            }
            TokenKind::Keyword(Keyword::This) => {
                self.cursor.pop();
                self.ast.alloc(Node::new(NodeKind::This, loc))
            }
            TokenKind::Keyword(Keyword::New) => self.parse_new(),
            TokenKind::Char('(') => {
                self.cursor.pop();
                let inner = self.parse_assignment();
                self.expect_char(')');
                inner
            }
            TokenKind::Identifier(name) => {
                self.cursor.pop();
                self.ast.alloc(Node::new(NodeKind::Ident(name), loc))
            }
            _ => {
                self.error(loc, "expected an expression");
                self.cursor.pop();
                self.ast.alloc(Node::new(NodeKind::Nop, loc))
            }
        }
    }

    // -----------------------------------------------------------------
    // Type expressions inside a body (`var x: T`, `new T(...)`). Mirrors
    // `file_builder::FileBuilder::parse_type` against a function-scoped
    // owner instead of the file/class being built (§4.5, §4.7).
    // -----------------------------------------------------------------

    fn parse_type_expr(&mut self) -> TypeDeclId {
        let owner = StubOwner::Function(self.owner);

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

        let loc = self.loc_here();
        let path = self.parse_qualified_name();
        if path.is_empty() {
            self.error(loc, "expected a type");
            return self.lib.engine_type_decl(EngineType::Variant);
        }
        let type_ref = self.lib.create_type_ref(Some(owner), loc, path);
        let base = self.lib.simple_type_decl(type_ref);
        self.parse_type_suffix(base)
    }

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

    fn peek_template_head(&self) -> Option<(StringId, SourceLocation)> {
        let first = self.cursor.peek()?;
        let name = first.as_identifier()?;
        let second = self.cursor.peek_nth(1)?;
        if second.as_char() == Some('<') {
            Some((name, first.location))
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
