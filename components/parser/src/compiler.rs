//! Single-pass compiler from Lox source to bytecode.
//!
//! A Pratt parser drives code generation directly: there is no syntax tree.
//! Each function body gets a [`FunctionScope`]; finished functions are moved
//! onto the heap and referenced from their enclosing chunk's constant pool.
//!
//! Functions still being compiled are not reachable from the VM, so the
//! compiler reports them (constant pools and names) as extra GC roots on top
//! of whatever roots the host passes in.

use bytecode_system::{Disassembler, OpCode, MAX_CONSTANTS};
use core_types::{ObjRef, Value};
use memory_manager::{Heap, Marker, Obj, RootSource, Trace};

use crate::error::{CompileError, CompileErrors, ErrorLocation};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::scope::{
    resolve_upvalue, ClassScope, FunctionKind, FunctionScope, Local, UpvalueRef, MAX_LOCALS,
};

/// Compile `source` into the top-level script function.
///
/// `roots` is the host's root set; it stays alive through any collection
/// triggered while compiling.
///
/// # Examples
///
/// ```
/// use memory_manager::{Heap, NoRoots};
///
/// let mut heap = Heap::new();
/// let script = parser::compile("print 1 + 2;", &mut heap, &NoRoots).unwrap();
/// assert_eq!(heap.render(script.into()), "<script>");
///
/// let errors = parser::compile("print ;", &mut heap, &NoRoots).unwrap_err();
/// assert_eq!(errors.to_string(), "[line 1] Error at ';': Expect expression.");
/// ```
pub fn compile(
    source: &str,
    heap: &mut Heap,
    roots: &dyn RootSource,
) -> Result<ObjRef, CompileErrors> {
    let mut compiler = Compiler::new(source, heap, roots);
    compiler.advance();
    while !compiler.matches(TokenKind::Eof) {
        compiler.declaration();
    }
    let (script, _) = compiler.end_function();
    if compiler.errors.is_empty() {
        Ok(script)
    } else {
        Err(CompileErrors(compiler.errors))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    fn next(self) -> Self {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

type ParseFn<'src, 'a> = fn(&mut Compiler<'src, 'a>, bool);

struct ParseRule<'src, 'a> {
    prefix: Option<ParseFn<'src, 'a>>,
    infix: Option<ParseFn<'src, 'a>>,
    precedence: Precedence,
}

struct CompilerRoots<'r, 'src> {
    outer: &'r dyn RootSource,
    functions: &'r [FunctionScope<'src>],
}

impl RootSource for CompilerRoots<'_, '_> {
    fn mark_roots(&self, marker: &mut Marker<'_>) {
        self.outer.mark_roots(marker);
        for function in self.functions {
            function.trace(marker);
        }
    }
}

struct Compiler<'src, 'a> {
    lexer: Lexer<'src>,
    current: Token<'src>,
    previous: Token<'src>,
    panic_mode: bool,
    errors: Vec<CompileError>,
    heap: &'a mut Heap,
    roots: &'a dyn RootSource,
    functions: Vec<FunctionScope<'src>>,
    classes: Vec<ClassScope>,
}

impl<'src, 'a> Compiler<'src, 'a> {
    fn new(source: &'src str, heap: &'a mut Heap, roots: &'a dyn RootSource) -> Self {
        let start = Token {
            kind: TokenKind::Eof,
            lexeme: "",
            line: 1,
        };
        Self {
            lexer: Lexer::new(source),
            current: start,
            previous: start,
            panic_mode: false,
            errors: Vec::new(),
            heap,
            roots,
            functions: vec![FunctionScope::new(FunctionKind::Script, None)],
            classes: Vec::new(),
        }
    }

    // ---- token plumbing ----

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.lexer.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            self.error_at_current(self.current.lexeme);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.check(kind) {
            self.advance();
        } else {
            self.error_at_current(message);
        }
    }

    // ---- error reporting ----

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::End,
            TokenKind::Error => ErrorLocation::Unspecified,
            _ => ErrorLocation::At(token.lexeme.to_string()),
        };
        self.errors.push(CompileError {
            line: token.line,
            location,
            message: message.to_string(),
        });
    }

    fn error(&mut self, message: &str) {
        self.error_at(self.previous, message);
    }

    fn error_at_current(&mut self, message: &str) {
        self.error_at(self.current, message);
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => self.advance(),
            }
        }
    }

    // ---- emission ----

    fn scope(&self) -> &FunctionScope<'src> {
        let Some(scope) = self.functions.last() else {
            unreachable!("the script scope is never popped while compiling");
        };
        scope
    }

    fn scope_mut(&mut self) -> &mut FunctionScope<'src> {
        let Some(scope) = self.functions.last_mut() else {
            unreachable!("the script scope is never popped while compiling");
        };
        scope
    }

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.scope_mut().function.chunk.write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op.as_byte());
    }

    fn emit_op_arg(&mut self, op: OpCode, arg: u8) {
        self.emit_op(op);
        self.emit_byte(arg);
    }

    fn emit_return(&mut self) {
        if self.scope().kind == FunctionKind::Initializer {
            self.emit_op_arg(OpCode::GetLocal, 0);
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.emit_op(OpCode::Return);
    }

    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.scope().function.chunk.len() - 2
    }

    fn patch_jump(&mut self, offset: usize) {
        let jump = self.scope().function.chunk.len() - offset - 2;
        let Ok(jump) = u16::try_from(jump) else {
            self.error("Too much code to jump over.");
            return;
        };
        self.scope_mut().function.chunk.patch_u16(offset, jump);
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(OpCode::Loop);
        let offset = self.scope().function.chunk.len() - loop_start + 2;
        let offset = u16::try_from(offset).unwrap_or_else(|_| {
            self.error("Loop body too large.");
            0
        });
        let [hi, lo] = offset.to_be_bytes();
        self.emit_byte(hi);
        self.emit_byte(lo);
    }

    fn emit_constant(&mut self, value: Value) {
        if self.scope().function.chunk.constants().len() >= MAX_CONSTANTS {
            self.error("Too many constants in one chunk.");
            return;
        }
        let line = self.previous.line;
        self.scope_mut().function.chunk.write_constant(value, line);
    }

    /// Add a constant addressed by a one-byte operand.
    fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.scope_mut().function.chunk.add_constant(value);
        u8::try_from(index).unwrap_or_else(|_| {
            self.error("Too many constants in one chunk.");
            0
        })
    }

    fn intern(&mut self, chars: &str) -> ObjRef {
        let roots = CompilerRoots {
            outer: self.roots,
            functions: &self.functions,
        };
        self.heap.intern(chars, &roots)
    }

    fn identifier_constant(&mut self, name: &str) -> u8 {
        let string = self.intern(name);
        self.make_constant(Value::Obj(string))
    }

    fn end_function(&mut self) -> (ObjRef, Vec<UpvalueRef>) {
        self.emit_return();
        let Some(scope) = self.functions.pop() else {
            unreachable!("end_function without an open function");
        };

        if self.errors.is_empty()
            && tracing::enabled!(target: "compiler", tracing::Level::DEBUG)
        {
            let name = match scope.function.name {
                Some(name) => self.heap.as_str(name).to_string(),
                None => "<script>".to_string(),
            };
            let listing = Disassembler::new(&scope.function.chunk, &*self.heap).disassemble(&name);
            tracing::debug!(target: "compiler", "\n{}", listing);
        }

        let roots = CompilerRoots {
            outer: self.roots,
            functions: &self.functions,
        };
        let function = self.heap.alloc(Obj::Function(scope.function), &roots);
        (function, scope.upvalues)
    }

    // ---- scopes and variables ----

    fn begin_scope(&mut self) {
        self.scope_mut().scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.scope_mut().scope_depth -= 1;
        loop {
            let scope = self.scope();
            let Some(local) = scope.locals.last() else {
                break;
            };
            if local.depth.map_or(true, |depth| depth <= scope.scope_depth) {
                break;
            }
            let op = if local.is_captured {
                OpCode::CloseUpvalue
            } else {
                OpCode::Pop
            };
            self.emit_op(op);
            self.scope_mut().locals.pop();
        }
    }

    fn add_local(&mut self, name: &'src str) {
        if self.scope().locals.len() == MAX_LOCALS {
            self.error("Too many local variables in function.");
            return;
        }
        self.scope_mut().locals.push(Local {
            name,
            depth: None,
            is_captured: false,
        });
    }

    fn declare_variable(&mut self) {
        let scope = self.scope();
        if scope.scope_depth == 0 {
            return;
        }
        let name = self.previous.lexeme;
        let duplicate = scope
            .locals
            .iter()
            .rev()
            .take_while(|local| local.depth.map_or(true, |depth| depth >= scope.scope_depth))
            .any(|local| local.name == name);
        if duplicate {
            self.error("Already a variable with this name in this scope.");
        }
        self.add_local(name);
    }

    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenKind::Identifier, message);
        self.declare_variable();
        if self.scope().scope_depth > 0 {
            return 0;
        }
        self.identifier_constant(self.previous.lexeme)
    }

    fn mark_initialized(&mut self) {
        let scope = self.scope_mut();
        if scope.scope_depth == 0 {
            return;
        }
        let depth = scope.scope_depth;
        if let Some(local) = scope.locals.last_mut() {
            local.depth = Some(depth);
        }
    }

    fn define_variable(&mut self, global: u8) {
        if self.scope().scope_depth > 0 {
            self.mark_initialized();
            return;
        }
        self.emit_op_arg(OpCode::DefineGlobal, global);
    }

    fn named_variable(&mut self, name: &'src str, can_assign: bool) {
        let (get, set, arg) = match self.scope().resolve_local(name) {
            Ok(Some(slot)) => (OpCode::GetLocal, OpCode::SetLocal, slot),
            Err(message) => {
                self.error(message);
                (OpCode::GetLocal, OpCode::SetLocal, 0)
            }
            Ok(None) => match resolve_upvalue(&mut self.functions, name) {
                Ok(Some(index)) => (OpCode::GetUpvalue, OpCode::SetUpvalue, index),
                Ok(None) => {
                    let constant = self.identifier_constant(name);
                    (OpCode::GetGlobal, OpCode::SetGlobal, constant)
                }
                Err(message) => {
                    self.error(message);
                    (OpCode::GetUpvalue, OpCode::SetUpvalue, 0)
                }
            },
        };

        if can_assign && self.matches(TokenKind::Equal) {
            self.expression();
            self.emit_op_arg(set, arg);
        } else {
            self.emit_op_arg(get, arg);
        }
    }

    fn argument_list(&mut self) -> u8 {
        let mut count: usize = 0;
        if !self.check(TokenKind::RightParen) {
            loop {
                self.expression();
                if count == 255 {
                    self.error("Can't have more than 255 arguments.");
                }
                count += 1;
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after arguments.");
        count.min(255) as u8
    }

    // ---- declarations ----

    fn declaration(&mut self) {
        if self.matches(TokenKind::Class) {
            self.class_declaration();
        } else if self.matches(TokenKind::Fun) {
            self.fun_declaration();
        } else if self.matches(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }
        if self.panic_mode {
            self.synchronize();
        }
    }

    fn class_declaration(&mut self) {
        self.consume(TokenKind::Identifier, "Expect class name.");
        let class_name = self.previous;
        let name_constant = self.identifier_constant(class_name.lexeme);
        self.declare_variable();

        self.emit_op_arg(OpCode::Class, name_constant);
        self.define_variable(name_constant);

        self.classes.push(ClassScope::default());

        if self.matches(TokenKind::Less) {
            self.consume(TokenKind::Identifier, "Expect superclass name.");
            self.variable(false);
            if class_name.lexeme == self.previous.lexeme {
                self.error("A class can't inherit from itself.");
            }

            self.begin_scope();
            self.add_local("super");
            self.define_variable(0);

            self.named_variable(class_name.lexeme, false);
            self.emit_op(OpCode::Inherit);
            if let Some(class) = self.classes.last_mut() {
                class.has_superclass = true;
            }
        }

        self.named_variable(class_name.lexeme, false);
        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.");
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.method();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after class body.");
        self.emit_op(OpCode::Pop);

        if self.classes.pop().is_some_and(|class| class.has_superclass) {
            self.end_scope();
        }
    }

    fn method(&mut self) {
        self.consume(TokenKind::Identifier, "Expect method name.");
        let constant = self.identifier_constant(self.previous.lexeme);
        let kind = if self.previous.lexeme == "init" {
            FunctionKind::Initializer
        } else {
            FunctionKind::Method
        };
        self.function(kind);
        self.emit_op_arg(OpCode::Method, constant);
    }

    fn fun_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        self.mark_initialized();
        self.function(FunctionKind::Function);
        self.define_variable(global);
    }

    fn function(&mut self, kind: FunctionKind) {
        let name = self.intern(self.previous.lexeme);
        self.functions.push(FunctionScope::new(kind, Some(name)));
        self.begin_scope();

        self.consume(TokenKind::LeftParen, "Expect '(' after function name.");
        if !self.check(TokenKind::RightParen) {
            loop {
                if self.scope().function.arity == 255 {
                    self.error_at_current("Can't have more than 255 parameters.");
                } else {
                    self.scope_mut().function.arity += 1;
                }
                let constant = self.parse_variable("Expect parameter name.");
                self.define_variable(constant);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.");
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.");
        self.block();

        let (function, upvalues) = self.end_function();
        let constant = self.make_constant(Value::Obj(function));
        self.emit_op_arg(OpCode::Closure, constant);
        for upvalue in upvalues {
            self.emit_byte(u8::from(upvalue.is_local));
            self.emit_byte(upvalue.index);
        }
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");
        if self.matches(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        );
        self.define_variable(global);
    }

    // ---- statements ----

    fn statement(&mut self) {
        if self.matches(TokenKind::Print) {
            self.print_statement();
        } else if self.matches(TokenKind::For) {
            self.for_statement();
        } else if self.matches(TokenKind::If) {
            self.if_statement();
        } else if self.matches(TokenKind::Return) {
            self.return_statement();
        } else if self.matches(TokenKind::While) {
            self.while_statement();
        } else if self.matches(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    fn return_statement(&mut self) {
        if self.scope().kind == FunctionKind::Script {
            self.error("Can't return from top-level code.");
        }
        if self.matches(TokenKind::Semicolon) {
            self.emit_return();
            return;
        }
        if self.scope().kind == FunctionKind::Initializer {
            self.error("Can't return a value from an initializer.");
        }
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.");
        self.emit_op(OpCode::Return);
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();
        let else_jump = self.emit_jump(OpCode::Jump);

        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);
        if self.matches(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.scope().function.chunk.len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
    }

    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.");
        if self.matches(TokenKind::Semicolon) {
            // No initializer.
        } else if self.matches(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.scope().function.chunk.len();
        let mut exit_jump = None;
        if !self.matches(TokenKind::Semicolon) {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.");
            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
            self.emit_op(OpCode::Pop);
        }

        if !self.matches(TokenKind::RightParen) {
            let body_jump = self.emit_jump(OpCode::Jump);
            let increment_start = self.scope().function.chunk.len();
            self.expression();
            self.emit_op(OpCode::Pop);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(OpCode::Pop);
        }
        self.end_scope();
    }

    // ---- expressions ----

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = Self::rule(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };
        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= Self::rule(self.current.kind).precedence {
            self.advance();
            if let Some(infix) = Self::rule(self.previous.kind).infix {
                infix(self, can_assign);
            }
        }

        if can_assign && self.matches(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn rule(kind: TokenKind) -> ParseRule<'src, 'a> {
        use TokenKind as T;
        let (prefix, infix, precedence): (
            Option<ParseFn<'src, 'a>>,
            Option<ParseFn<'src, 'a>>,
            Precedence,
        ) = match kind {
            T::LeftParen => (Some(Self::grouping), Some(Self::call), Precedence::Call),
            T::Dot => (None, Some(Self::dot), Precedence::Call),
            T::Minus => (Some(Self::unary), Some(Self::binary), Precedence::Term),
            T::Plus => (None, Some(Self::binary), Precedence::Term),
            T::Slash | T::Star => (None, Some(Self::binary), Precedence::Factor),
            T::Bang => (Some(Self::unary), None, Precedence::None),
            T::BangEqual | T::EqualEqual => (None, Some(Self::binary), Precedence::Equality),
            T::Greater | T::GreaterEqual | T::Less | T::LessEqual => {
                (None, Some(Self::binary), Precedence::Comparison)
            }
            T::Identifier => (Some(Self::variable), None, Precedence::None),
            T::String => (Some(Self::string), None, Precedence::None),
            T::Number => (Some(Self::number), None, Precedence::None),
            T::And => (None, Some(Self::and), Precedence::And),
            T::Or => (None, Some(Self::or), Precedence::Or),
            T::False | T::Nil | T::True => (Some(Self::literal), None, Precedence::None),
            T::Super => (Some(Self::super_), None, Precedence::None),
            T::This => (Some(Self::this), None, Precedence::None),
            _ => (None, None, Precedence::None),
        };
        ParseRule {
            prefix,
            infix,
            precedence,
        }
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn call(&mut self, _can_assign: bool) {
        let arg_count = self.argument_list();
        self.emit_op_arg(OpCode::Call, arg_count);
    }

    fn dot(&mut self, can_assign: bool) {
        self.consume(TokenKind::Identifier, "Expect property name after '.'.");
        let name = self.identifier_constant(self.previous.lexeme);

        if can_assign && self.matches(TokenKind::Equal) {
            self.expression();
            self.emit_op_arg(OpCode::SetProperty, name);
        } else if self.matches(TokenKind::LeftParen) {
            let arg_count = self.argument_list();
            self.emit_op_arg(OpCode::Invoke, name);
            self.emit_byte(arg_count);
        } else {
            self.emit_op_arg(OpCode::GetProperty, name);
        }
    }

    fn unary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => {}
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        let precedence = Self::rule(operator).precedence;
        self.parse_precedence(precedence.next());

        let op = match operator {
            TokenKind::BangEqual => OpCode::NotEqual,
            TokenKind::EqualEqual => OpCode::Equal,
            TokenKind::Greater => OpCode::Greater,
            TokenKind::GreaterEqual => OpCode::GreaterEqual,
            TokenKind::Less => OpCode::Less,
            TokenKind::LessEqual => OpCode::LessEqual,
            TokenKind::Plus => OpCode::Add,
            TokenKind::Minus => OpCode::Subtract,
            TokenKind::Star => OpCode::Multiply,
            TokenKind::Slash => OpCode::Divide,
            _ => return,
        };
        self.emit_op(op);
    }

    fn and(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    fn or(&mut self, _can_assign: bool) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn number(&mut self, _can_assign: bool) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(value) => self.emit_constant(Value::Number(value)),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    fn string(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let contents = &lexeme[1..lexeme.len() - 1];
        let string = self.intern(contents);
        self.emit_constant(Value::Obj(string));
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            TokenKind::True => self.emit_op(OpCode::True),
            _ => {}
        }
    }

    fn variable(&mut self, can_assign: bool) {
        self.named_variable(self.previous.lexeme, can_assign);
    }

    fn this(&mut self, _can_assign: bool) {
        if self.classes.is_empty() {
            self.error("Can't use 'this' outside of a class.");
            return;
        }
        self.variable(false);
    }

    fn super_(&mut self, _can_assign: bool) {
        match self.classes.last() {
            None => self.error("Can't use 'super' outside of a class."),
            Some(class) if !class.has_superclass => {
                self.error("Can't use 'super' in a class with no superclass.")
            }
            Some(_) => {}
        }

        self.consume(TokenKind::Dot, "Expect '.' after 'super'.");
        self.consume(TokenKind::Identifier, "Expect superclass method name.");
        let name = self.identifier_constant(self.previous.lexeme);

        self.named_variable("this", false);
        if self.matches(TokenKind::LeftParen) {
            let arg_count = self.argument_list();
            self.named_variable("super", false);
            self.emit_op_arg(OpCode::SuperInvoke, name);
            self.emit_byte(arg_count);
        } else {
            self.named_variable("super", false);
            self.emit_op_arg(OpCode::GetSuper, name);
        }
    }
}
