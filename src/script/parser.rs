// src/script/parser.rs

//! Recursive-descent parser turning tokens into a [`Program`].

use super::ast::{
    BinaryOp, DeclKind, Expr, FunctionBody, FunctionDef, LogicalOp, Program, PropKey, Stmt,
    TemplatePart, UnaryOp,
};
use super::error::ScriptError;
use super::lexer::{self, Keyword, Punct, TemplateChunk, Token, TokenKind};
use super::value::format_number;
use std::rc::Rc;

/// Parses a complete script.
///
/// # Errors
/// Returns `ScriptError::Syntax` pointing at the first token that does not fit
/// the grammar, or at the first token nested deeper than [`MAX_NESTING`].
pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let tokens = lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens);
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.statement()?);
    }
    Ok(Program { body })
}

/// Parses a standalone expression such as a QUBO objective or constraint side.
pub(crate) fn parse_expression(source: &str) -> Result<Expr, ScriptError> {
    let tokens = lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens);
    let expr = parser.expression()?;
    if !parser.at_eof() {
        return Err(parser.unexpected("end of expression"));
    }
    Ok(expr)
}

// Binding power of binary and logical operators; higher binds tighter.
fn binary_precedence(kind: &TokenKind) -> Option<(u8, Operator)> {
    let entry = match kind {
        TokenKind::Punct(Punct::QuestionQuestion) => (1, Operator::Logical(LogicalOp::Nullish)),
        TokenKind::Punct(Punct::OrOr) => (2, Operator::Logical(LogicalOp::Or)),
        TokenKind::Punct(Punct::AndAnd) => (3, Operator::Logical(LogicalOp::And)),
        TokenKind::Punct(Punct::EqEq) => (4, Operator::Binary(BinaryOp::Eq)),
        TokenKind::Punct(Punct::NotEq) => (4, Operator::Binary(BinaryOp::NotEq)),
        TokenKind::Punct(Punct::EqEqEq) => (4, Operator::Binary(BinaryOp::StrictEq)),
        TokenKind::Punct(Punct::NotEqEq) => (4, Operator::Binary(BinaryOp::StrictNotEq)),
        TokenKind::Punct(Punct::Lt) => (5, Operator::Binary(BinaryOp::Lt)),
        TokenKind::Punct(Punct::Gt) => (5, Operator::Binary(BinaryOp::Gt)),
        TokenKind::Punct(Punct::LtEq) => (5, Operator::Binary(BinaryOp::LtEq)),
        TokenKind::Punct(Punct::GtEq) => (5, Operator::Binary(BinaryOp::GtEq)),
        TokenKind::Keyword(Keyword::In) => (5, Operator::Binary(BinaryOp::In)),
        TokenKind::Punct(Punct::Plus) => (6, Operator::Binary(BinaryOp::Add)),
        TokenKind::Punct(Punct::Minus) => (6, Operator::Binary(BinaryOp::Sub)),
        TokenKind::Punct(Punct::Star) => (7, Operator::Binary(BinaryOp::Mul)),
        TokenKind::Punct(Punct::Slash) => (7, Operator::Binary(BinaryOp::Div)),
        TokenKind::Punct(Punct::Percent) => (7, Operator::Binary(BinaryOp::Rem)),
        TokenKind::Punct(Punct::StarStar) => (8, Operator::Binary(BinaryOp::Pow)),
        _ => return None,
    };
    Some(entry)
}

#[derive(Clone, Copy)]
enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Nesting levels the parser accepts before rejecting the source.
pub const MAX_NESTING: usize = 256;

fn assignment_op(kind: &TokenKind) -> Option<Option<BinaryOp>> {
    match kind {
        TokenKind::Punct(Punct::Assign) => Some(None),
        TokenKind::Punct(Punct::PlusAssign) => Some(Some(BinaryOp::Add)),
        TokenKind::Punct(Punct::MinusAssign) => Some(Some(BinaryOp::Sub)),
        TokenKind::Punct(Punct::StarAssign) => Some(Some(BinaryOp::Mul)),
        TokenKind::Punct(Punct::SlashAssign) => Some(Some(BinaryOp::Div)),
        TokenKind::Punct(Punct::PercentAssign) => Some(Some(BinaryOp::Rem)),
        _ => None,
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Set while parsing a `for (...)` head, where `in` starts a for-in loop.
    no_in: bool,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, no_in: false, depth: 0 }
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ScriptError>,
    ) -> Result<T, ScriptError> {
        if self.depth >= MAX_NESTING {
            let token = self.peek();
            return Err(ScriptError::syntax(
                token.line,
                token.column,
                format!("nesting deeper than {MAX_NESTING} levels"),
            ));
        }
        self.depth += 1;
        let parsed = parse(self);
        self.depth -= 1;
        parsed
    }

    // --- token helpers ---

    fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn is_punct(&self, punct: Punct) -> bool {
        self.peek().kind == TokenKind::Punct(punct)
    }

    fn is_keyword(&self, keyword: Keyword) -> bool {
        self.peek().kind == TokenKind::Keyword(keyword)
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.is_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: Punct, what: &str) -> Result<(), ScriptError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, expected: &str) -> ScriptError {
        let token = self.peek();
        let found = match &token.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Keyword(keyword) => format!("keyword '{}'", keyword.as_str()),
            TokenKind::Number(n) => format!("number {}", format_number(*n)),
            TokenKind::Str(_) | TokenKind::Template(_) => "string".to_string(),
            TokenKind::Punct(punct) => format!("{punct:?}"),
        };
        ScriptError::syntax(token.line, token.column, format!("expected {expected}, found {found}"))
    }

    fn identifier(&mut self, what: &str) -> Result<String, ScriptError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Automatic semicolon insertion: a statement may end at `;`, before `}`,
    /// at end of input or at a line break.
    fn end_statement(&mut self) -> Result<(), ScriptError> {
        if self.eat_punct(Punct::Semi) || self.is_punct(Punct::RBrace) || self.at_eof() || self.peek().newline_before {
            Ok(())
        } else {
            Err(self.unexpected("';'"))
        }
    }

    // --- statements ---

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        self.nested(Self::statement_inner)
    }

    fn statement_inner(&mut self) -> Result<Stmt, ScriptError> {
        match &self.peek().kind {
            TokenKind::Punct(Punct::LBrace) => Ok(Stmt::Block(self.block()?)),
            TokenKind::Punct(Punct::Semi) => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::Keyword(Keyword::Var | Keyword::Let | Keyword::Const) => {
                let stmt = self.var_declaration()?;
                self.end_statement()?;
                Ok(stmt)
            }
            TokenKind::Keyword(Keyword::Function)
                if matches!(self.peek_kind_at(1), TokenKind::Ident(_)) =>
            {
                self.advance();
                let def = self.function_rest(true)?;
                Ok(Stmt::Function(Rc::new(def)))
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                let value = if self.is_punct(Punct::Semi)
                    || self.is_punct(Punct::RBrace)
                    || self.at_eof()
                    || self.peek().newline_before
                {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.end_statement()?;
                Ok(Stmt::Return(value))
            }
            TokenKind::Keyword(Keyword::If) => self.if_statement(),
            TokenKind::Keyword(Keyword::While) => {
                self.advance();
                let cond = self.paren_expression()?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While { cond, body })
            }
            TokenKind::Keyword(Keyword::Do) => {
                self.advance();
                let body = Box::new(self.statement()?);
                if !self.eat_keyword(Keyword::While) {
                    return Err(self.unexpected("'while'"));
                }
                let cond = self.paren_expression()?;
                self.eat_punct(Punct::Semi);
                Ok(Stmt::DoWhile { body, cond })
            }
            TokenKind::Keyword(Keyword::For) => self.for_statement(),
            TokenKind::Keyword(Keyword::Break) => {
                self.advance();
                self.end_statement()?;
                Ok(Stmt::Break)
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.advance();
                self.end_statement()?;
                Ok(Stmt::Continue)
            }
            TokenKind::Keyword(Keyword::Throw) => {
                self.advance();
                if self.peek().newline_before {
                    return Err(self.unexpected("expression on the same line as 'throw'"));
                }
                let value = self.expression()?;
                self.end_statement()?;
                Ok(Stmt::Throw(value))
            }
            TokenKind::Keyword(Keyword::Try) => self.try_statement(),
            _ => {
                let expr = self.expression()?;
                self.end_statement()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.nested(Self::block_body)
    }

    fn block_body(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.expect_punct(Punct::LBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.is_punct(Punct::RBrace) {
            if self.at_eof() {
                return Err(self.unexpected("'}'"));
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn decl_kind(&mut self) -> Option<DeclKind> {
        let kind = match self.peek().kind {
            TokenKind::Keyword(Keyword::Var) => DeclKind::Var,
            TokenKind::Keyword(Keyword::Let) => DeclKind::Let,
            TokenKind::Keyword(Keyword::Const) => DeclKind::Const,
            _ => return None,
        };
        self.advance();
        Some(kind)
    }

    fn var_declaration(&mut self) -> Result<Stmt, ScriptError> {
        let kind = self.decl_kind().ok_or_else(|| self.unexpected("declaration"))?;
        let mut decls = Vec::new();
        loop {
            let name = self.identifier("variable name")?;
            let init = if self.eat_punct(Punct::Assign) {
                Some(self.assignment()?)
            } else {
                None
            };
            decls.push((name, init));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(Stmt::Var { kind, decls })
    }

    fn paren_expression(&mut self) -> Result<Expr, ScriptError> {
        self.expect_punct(Punct::LParen, "'('")?;
        let expr = self.expression()?;
        self.expect_punct(Punct::RParen, "')'")?;
        Ok(expr)
    }

    fn if_statement(&mut self) -> Result<Stmt, ScriptError> {
        self.advance();
        let cond = self.paren_expression()?;
        let then = Box::new(self.statement()?);
        let otherwise = if self.eat_keyword(Keyword::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If { cond, then, otherwise })
    }

    fn for_statement(&mut self) -> Result<Stmt, ScriptError> {
        self.advance();
        self.expect_punct(Punct::LParen, "'(' after 'for'")?;

        // for (x of ...) / for (const x in ...)
        let declared = matches!(
            self.peek().kind,
            TokenKind::Keyword(Keyword::Var | Keyword::Let | Keyword::Const)
        );
        let binding_offset = usize::from(declared);
        if let TokenKind::Ident(name) = self.peek_kind_at(binding_offset).clone() {
            let follower = self.peek_kind_at(binding_offset + 1).clone();
            let is_of = matches!(&follower, TokenKind::Ident(word) if word == "of");
            let is_in = follower == TokenKind::Keyword(Keyword::In);
            if is_of || is_in {
                let kind = self.decl_kind();
                self.advance(); // binding name
                self.advance(); // of / in
                let target = self.expression()?;
                self.expect_punct(Punct::RParen, "')'")?;
                let body = Box::new(self.statement()?);
                return Ok(if is_of {
                    Stmt::ForOf { kind, name, iterable: target, body }
                } else {
                    Stmt::ForIn { kind, name, object: target, body }
                });
            }
        }

        let init = if self.is_punct(Punct::Semi) {
            None
        } else {
            self.no_in = true;
            let init = if declared {
                self.var_declaration()
            } else {
                self.expression().map(Stmt::Expr)
            };
            self.no_in = false;
            Some(Box::new(init?))
        };
        self.expect_punct(Punct::Semi, "';' in for header")?;
        let cond = if self.is_punct(Punct::Semi) { None } else { Some(self.expression()?) };
        self.expect_punct(Punct::Semi, "';' in for header")?;
        let update = if self.is_punct(Punct::RParen) { None } else { Some(self.expression()?) };
        self.expect_punct(Punct::RParen, "')'")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::For { init, cond, update, body })
    }

    fn try_statement(&mut self) -> Result<Stmt, ScriptError> {
        self.advance();
        let block = self.block()?;
        let mut param = None;
        let mut handler = None;
        if self.eat_keyword(Keyword::Catch) {
            if self.eat_punct(Punct::LParen) {
                param = Some(self.identifier("catch binding")?);
                self.expect_punct(Punct::RParen, "')'")?;
            }
            handler = Some(self.block()?);
        }
        let finalizer = if self.eat_keyword(Keyword::Finally) { Some(self.block()?) } else { None };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.unexpected("'catch' or 'finally'"));
        }
        Ok(Stmt::Try { block, param, handler, finalizer })
    }

    /// Parses `name(params) { body }` after the `function` keyword.
    fn function_rest(&mut self, require_name: bool) -> Result<FunctionDef, ScriptError> {
        let name = match &self.peek().kind {
            TokenKind::Ident(_) => Some(self.identifier("function name")?),
            _ if require_name => return Err(self.unexpected("function name")),
            _ => None,
        };
        let params = self.parameter_list()?;
        let body = FunctionBody::Block(self.block()?);
        Ok(FunctionDef { name, params, body })
    }

    fn parameter_list(&mut self) -> Result<Vec<String>, ScriptError> {
        self.expect_punct(Punct::LParen, "'('")?;
        let mut params = Vec::new();
        while !self.is_punct(Punct::RParen) {
            params.push(self.identifier("parameter name")?);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RParen, "')'")?;
        Ok(params)
    }

    // --- expressions ---

    fn expression(&mut self) -> Result<Expr, ScriptError> {
        self.nested(Self::assignment)
    }

    /// Looks past a parenthesised list to see whether it opens an arrow function.
    fn arrow_ahead(&self) -> bool {
        match self.peek_kind_at(0) {
            TokenKind::Ident(_) => *self.peek_kind_at(1) == TokenKind::Punct(Punct::Arrow),
            TokenKind::Punct(Punct::LParen) => {
                let mut depth = 0usize;
                let mut offset = 0usize;
                loop {
                    match self.peek_kind_at(offset) {
                        TokenKind::Punct(Punct::LParen) => depth += 1,
                        TokenKind::Punct(Punct::RParen) => {
                            depth -= 1;
                            if depth == 0 {
                                return *self.peek_kind_at(offset + 1) == TokenKind::Punct(Punct::Arrow);
                            }
                        }
                        TokenKind::Eof => return false,
                        _ => {}
                    }
                    offset += 1;
                }
            }
            _ => false,
        }
    }

    fn arrow_function(&mut self) -> Result<Expr, ScriptError> {
        let params = if self.is_punct(Punct::LParen) {
            self.parameter_list()?
        } else {
            vec![self.identifier("parameter name")?]
        };
        self.expect_punct(Punct::Arrow, "'=>'")?;
        let body = if self.is_punct(Punct::LBrace) {
            FunctionBody::Block(self.block()?)
        } else {
            FunctionBody::Expr(Box::new(self.assignment()?))
        };
        Ok(Expr::Function(Rc::new(FunctionDef { name: None, params, body })))
    }

    fn assignment(&mut self) -> Result<Expr, ScriptError> {
        self.nested(Self::assignment_inner)
    }

    fn assignment_inner(&mut self) -> Result<Expr, ScriptError> {
        if self.arrow_ahead() {
            return self.arrow_function();
        }
        let target = self.conditional()?;
        if let Some(op) = assignment_op(&self.peek().kind) {
            if !target.is_assignable() {
                return Err(self.unexpected("assignable expression before assignment"));
            }
            self.advance();
            let value = self.assignment()?;
            return Ok(Expr::Assign { op, target: Box::new(target), value: Box::new(value) });
        }
        Ok(target)
    }

    fn conditional(&mut self) -> Result<Expr, ScriptError> {
        let cond = self.binary(0)?;
        if !self.eat_punct(Punct::Question) {
            return Ok(cond);
        }
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let then = self.assignment()?;
        self.expect_punct(Punct::Colon, "':' in conditional expression")?;
        let otherwise = self.assignment()?;
        self.no_in = saved_no_in;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr, ScriptError> {
        let mut left = self.unary()?;
        loop {
            let Some((precedence, operator)) = binary_precedence(&self.peek().kind) else {
                break;
            };
            if precedence <= min_precedence && !(precedence == min_precedence && precedence == 8) {
                break;
            }
            if self.no_in && matches!(operator, Operator::Binary(BinaryOp::In)) {
                break;
            }
            self.advance();
            // `**` is right-associative.
            let next = if precedence == 8 { precedence - 1 } else { precedence };
            let right = self.nested(|parser| parser.binary(next))?;
            left = match operator {
                Operator::Binary(op) => Expr::Binary { op, left: Box::new(left), right: Box::new(right) },
                Operator::Logical(op) => Expr::Logical { op, left: Box::new(left), right: Box::new(right) },
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let op = match self.peek().kind {
            TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Neg),
            TokenKind::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            TokenKind::Punct(Punct::Bang) => Some(UnaryOp::Not),
            TokenKind::Keyword(Keyword::Typeof) => Some(UnaryOp::Typeof),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.nested(Self::unary)?;
            return Ok(Expr::Unary { op, expr: Box::new(expr) });
        }
        if self.is_punct(Punct::PlusPlus) || self.is_punct(Punct::MinusMinus) {
            let increment = self.is_punct(Punct::PlusPlus);
            self.advance();
            let target = self.nested(Self::unary)?;
            if !target.is_assignable() {
                return Err(self.unexpected("assignable operand for prefix update"));
            }
            return Ok(Expr::Update { increment, prefix: true, target: Box::new(target) });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let expr = self.call_member()?;
        let is_update = self.is_punct(Punct::PlusPlus) || self.is_punct(Punct::MinusMinus);
        if is_update && !self.peek().newline_before {
            if !expr.is_assignable() {
                return Err(self.unexpected("assignable operand for postfix update"));
            }
            let increment = self.is_punct(Punct::PlusPlus);
            self.advance();
            return Ok(Expr::Update { increment, prefix: false, target: Box::new(expr) });
        }
        Ok(expr)
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ScriptError> {
        self.nested(Self::argument_list)
    }

    fn argument_list(&mut self) -> Result<Vec<Expr>, ScriptError> {
        self.expect_punct(Punct::LParen, "'('")?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let mut args = Vec::new();
        while !self.is_punct(Punct::RParen) {
            args.push(self.assignment()?);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.no_in = saved_no_in;
        self.expect_punct(Punct::RParen, "')' after arguments")?;
        Ok(args)
    }

    fn property_name(&mut self) -> Result<String, ScriptError> {
        match self.advance().kind {
            TokenKind::Ident(name) => Ok(name),
            TokenKind::Keyword(keyword) => Ok(keyword.as_str().to_string()),
            _ => {
                self.pos -= 1;
                Err(self.unexpected("property name"))
            }
        }
    }

    fn call_member(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = if self.eat_keyword(Keyword::New) {
            let mut callee = self.primary()?;
            while self.eat_punct(Punct::Dot) {
                let property = self.property_name()?;
                callee = Expr::Member { object: Box::new(callee), property };
            }
            let args = if self.is_punct(Punct::LParen) { self.arguments()? } else { Vec::new() };
            Expr::New { callee: Box::new(callee), args }
        } else {
            self.primary()?
        };

        loop {
            if self.eat_punct(Punct::Dot) {
                let property = self.property_name()?;
                expr = Expr::Member { object: Box::new(expr), property };
            } else if self.is_punct(Punct::LBracket) {
                self.advance();
                let saved_no_in = std::mem::replace(&mut self.no_in, false);
                let index = self.expression()?;
                self.no_in = saved_no_in;
                self.expect_punct(Punct::RBracket, "']'")?;
                expr = Expr::Index { object: Box::new(expr), index: Box::new(index) };
            } else if self.is_punct(Punct::LParen) {
                let args = self.arguments()?;
                expr = Expr::Call { callee: Box::new(expr), args };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::Number(n) => Expr::Number(n),
            TokenKind::Str(s) => Expr::Str(s),
            TokenKind::Template(chunks) => self.template(chunks)?,
            TokenKind::Ident(name) => Expr::Ident(name),
            TokenKind::Keyword(Keyword::True) => Expr::Bool(true),
            TokenKind::Keyword(Keyword::False) => Expr::Bool(false),
            TokenKind::Keyword(Keyword::Null) => Expr::Null,
            TokenKind::Keyword(Keyword::Undefined) => Expr::Undefined,
            TokenKind::Keyword(Keyword::Function) => {
                Expr::Function(Rc::new(self.function_rest(false)?))
            }
            TokenKind::Punct(Punct::LParen) => {
                let saved_no_in = std::mem::replace(&mut self.no_in, false);
                let inner = self.expression()?;
                self.no_in = saved_no_in;
                self.expect_punct(Punct::RParen, "')'")?;
                inner
            }
            TokenKind::Punct(Punct::LBracket) => self.nested(Self::array_literal)?,
            TokenKind::Punct(Punct::LBrace) => self.nested(Self::object_literal)?,
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.unexpected("expression"));
            }
        };
        Ok(expr)
    }

    fn template(&mut self, chunks: Vec<TemplateChunk>) -> Result<Expr, ScriptError> {
        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match chunk {
                TemplateChunk::Text(text) => parts.push(TemplatePart::Text(text)),
                TemplateChunk::Code { source, line, column } => {
                    let tokens = lexer::tokenize_at(&source, line, column)?;
                    let mut inner = Parser { depth: self.depth, ..Parser::new(tokens) };
                    let expr = inner.expression()?;
                    if !inner.at_eof() {
                        return Err(inner.unexpected("'}' closing template expression"));
                    }
                    parts.push(TemplatePart::Expr(expr));
                }
            }
        }
        Ok(Expr::Template(parts))
    }

    fn array_literal(&mut self) -> Result<Expr, ScriptError> {
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let mut elements = Vec::new();
        while !self.is_punct(Punct::RBracket) {
            elements.push(self.assignment()?);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.no_in = saved_no_in;
        self.expect_punct(Punct::RBracket, "']'")?;
        Ok(Expr::Array(elements))
    }

    fn object_literal(&mut self) -> Result<Expr, ScriptError> {
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let mut properties = Vec::new();
        while !self.is_punct(Punct::RBrace) {
            let token = self.advance();
            let (key, shorthand) = match token.kind {
                TokenKind::Ident(name) => (PropKey::Static(name.clone()), Some(name)),
                TokenKind::Keyword(keyword) => (PropKey::Static(keyword.as_str().to_string()), None),
                TokenKind::Str(s) => (PropKey::Static(s), None),
                TokenKind::Number(n) => (PropKey::Static(format_number(n)), None),
                TokenKind::Punct(Punct::LBracket) => {
                    let key = self.assignment()?;
                    self.expect_punct(Punct::RBracket, "']' after computed key")?;
                    (PropKey::Computed(key), None)
                }
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.unexpected("property key"));
                }
            };

            let value = if self.eat_punct(Punct::Colon) {
                self.assignment()?
            } else if self.is_punct(Punct::LParen) {
                // Method shorthand: `name(args) { ... }`
                let params = self.parameter_list()?;
                let body = FunctionBody::Block(self.block()?);
                let name = match &key {
                    PropKey::Static(name) => Some(name.clone()),
                    PropKey::Computed(_) => None,
                };
                Expr::Function(Rc::new(FunctionDef { name, params, body }))
            } else if let Some(name) = shorthand {
                Expr::Ident(name)
            } else {
                return Err(self.unexpected("':' after property key"));
            };
            properties.push((key, value));
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.no_in = saved_no_in;
        self.expect_punct(Punct::RBrace, "'}' closing object literal")?;
        Ok(Expr::Object(properties))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entry_point_declaration() {
        let program = parse(
            "function createQuboForSingleMove(board) {\n  return { linear: { 4: -3 }, quadratic: {} };\n}",
        )
        .expect("program should parse");
        assert_eq!(program.declared_functions(), vec!["createQuboForSingleMove"]);
    }

    #[test]
    fn precedence_groups_multiplication_first() {
        let expr = parse_expression("1 + 2 * 3").expect("parse");
        let Expr::Binary { op: BinaryOp::Add, right, .. } = expr else {
            panic!("expected addition at the root");
        };
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn exponent_is_right_associative() {
        let expr = parse_expression("2 ** 3 ** 2").expect("parse");
        let Expr::Binary { op: BinaryOp::Pow, left, right } = expr else {
            panic!("expected power at the root");
        };
        assert!(matches!(*left, Expr::Number(n) if n == 2.0));
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn arrow_functions_and_loops_parse() {
        let source = r#"
            const weights = [];
            for (let i = 0; i < 9; i++) weights.push(i === 4 ? -3 : -1)
            for (const w of weights) { total += w }
            for (const k in weights) continue;
            const double = (x) => x * 2;
            const id = x => { return x; };
        "#;
        let program = parse(source).expect("program should parse");
        assert_eq!(program.statement_count(), 6);
    }

    #[test]
    fn object_literal_keys_are_normalised() {
        let expr = parse_expression(r#"({ 4: -3, "0,2": 3, [k]: 1, short })"#).expect("parse");
        let Expr::Object(props) = expr else {
            panic!("expected object literal");
        };
        assert!(matches!(&props[0].0, PropKey::Static(k) if k == "4"));
        assert!(matches!(&props[1].0, PropKey::Static(k) if k == "0,2"));
        assert!(matches!(&props[2].0, PropKey::Computed(_)));
        assert!(matches!(&props[3].1, Expr::Ident(name) if name == "short"));
    }

    #[test]
    fn missing_brace_is_reported() {
        let err = parse("function f() { return 1;").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { .. }), "got {err:?}");
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let brackets = "[".repeat(3000);
        let err = parse(&brackets).unwrap_err();
        let ScriptError::Syntax { message, .. } = err else {
            panic!("expected syntax error, got {err:?}");
        };
        assert!(message.contains("nesting"), "got {message}");

        let parens = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(parse_expression(&parens), Err(ScriptError::Syntax { .. })));
        assert!(parse(&"-".repeat(5000)).is_err());
        assert!(parse(&"{".repeat(5000)).is_err());
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let source = format!("var a = {}1{};", "[".repeat(40), "]".repeat(40));
        assert!(parse(&source).is_ok());
        let calls = format!("{}0{}", "f(".repeat(40), ")".repeat(40));
        assert!(parse_expression(&calls).is_ok());
    }

    #[test]
    fn assignment_to_literal_is_rejected() {
        assert!(parse("1 = 2;").is_err());
    }
}
