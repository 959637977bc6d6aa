use super::ast::*;
use super::error::CompileError;
use super::lexer::{SpannedToken, Token};

pub fn parse(tokens: Vec<SpannedToken>) -> Result<Program, CompileError> {
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}

/// Parse a standalone type annotation such as `player | player[]`.
pub fn parse_type(tokens: Vec<SpannedToken>) -> Result<TypeExpr, CompileError> {
    let mut parser = Parser::new(tokens);
    let ty = parser.parse_type()?;
    if !parser.at_eof() {
        return Err(CompileError::parse(
            format!("Unexpected {:?} after type", parser.peek()),
            parser.span(),
        ));
    }
    Ok(ty)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut items = Vec::new();
        self.skip_terminators();

        while !self.at_eof() {
            let item = match self.peek() {
                Token::Function => Item::Function(self.parse_function()?),
                Token::Event => Item::Event(self.parse_event()?),
                Token::Type => Item::Type(self.parse_type_decl()?),
                _ => {
                    return Err(CompileError::parse(
                        format!(
                            "Expected function, event or type declaration, got {:?}",
                            self.peek()
                        ),
                        self.span(),
                    ));
                }
            };
            items.push(item);
            self.skip_terminators();
        }

        Ok(Program { items })
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map_or(&Token::Eof, |t| &t.token)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).map_or(&Token::Eof, |t| &t.token)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map_or(Span::new(0, 0), |t| t.span)
    }

    /// Span of the most recently consumed token.
    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(Span::new(0, 0), |t| t.span)
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Span, CompileError> {
        if self.peek() == expected {
            let sp = self.span();
            self.advance();
            Ok(sp)
        } else {
            Err(CompileError::parse(
                format!("Expected {expected:?}, got {:?}", self.peek()),
                self.span(),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), CompileError> {
        if let Token::Ident(name) = self.peek().clone() {
            let sp = self.span();
            self.advance();
            Ok((name, sp))
        } else {
            Err(CompileError::parse(
                format!("Expected identifier, got {:?}", self.peek()),
                self.span(),
            ))
        }
    }

    fn skip_terminators(&mut self) {
        while matches!(self.peek(), Token::Semicolon) {
            self.advance();
        }
    }

    // ── Declarations ──────────────────────────────────────────────

    fn parse_function(&mut self) -> Result<FunctionDecl, CompileError> {
        let start = self.expect(&Token::Function)?;
        let (name, _) = self.expect_ident()?;

        let mut generics = Vec::new();
        if self.eat(&Token::Lt) {
            loop {
                let (gname, gspan) = self.expect_ident()?;
                let bound = if self.eat(&Token::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                generics.push(GenericParam {
                    name: gname,
                    bound,
                    span: gspan.merge(self.prev_span()),
                });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::Gt)?;
        }

        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        while !matches!(self.peek(), Token::RParen | Token::Eof) {
            let (pname, pspan) = self.expect_ident()?;
            self.expect(&Token::Colon)?;
            let ty = self.parse_type()?;
            params.push(Param {
                name: pname,
                span: pspan.merge(ty.span),
                ty,
            });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;

        let ret = if self.eat(&Token::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block()?;
        Ok(FunctionDecl {
            name,
            generics,
            params,
            ret,
            body,
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_event(&mut self) -> Result<EventDecl, CompileError> {
        let start = self.expect(&Token::Event)?;
        let (name, _) = self.expect_ident()?;
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        while !matches!(self.peek(), Token::RParen | Token::Eof) {
            let (arg, _) = self.expect_ident()?;
            args.push(arg);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        let body = self.parse_block()?;
        Ok(EventDecl {
            name,
            args,
            body,
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_type_decl(&mut self) -> Result<TypeDecl, CompileError> {
        let start = self.expect(&Token::Type)?;
        let (name, _) = self.expect_ident()?;
        self.expect(&Token::Eq)?;
        let ty = self.parse_type()?;
        Ok(TypeDecl {
            name,
            span: start.merge(ty.span),
            ty,
        })
    }

    // ── Types ─────────────────────────────────────────────────────

    fn parse_type(&mut self) -> Result<TypeExpr, CompileError> {
        let first = self.parse_type_atom()?;
        if !matches!(self.peek(), Token::Pipe) {
            return Ok(first);
        }
        let mut span = first.span;
        let mut members = vec![first];
        while self.eat(&Token::Pipe) {
            let member = self.parse_type_atom()?;
            span = span.merge(member.span);
            members.push(member);
        }
        Ok(TypeExpr {
            kind: TypeExprKind::Union(members),
            span,
        })
    }

    fn parse_type_atom(&mut self) -> Result<TypeExpr, CompileError> {
        let start = self.span();
        let mut ty = match self.peek().clone() {
            Token::Ellipsis => {
                self.advance();
                let inner = self.parse_type_atom()?;
                TypeExpr {
                    span: start.merge(inner.span),
                    kind: TypeExprKind::Variadic(Box::new(inner)),
                }
            }
            Token::Fn => {
                self.advance();
                self.expect(&Token::LParen)?;
                let mut params = Vec::new();
                while !matches!(self.peek(), Token::RParen | Token::Eof) {
                    params.push(self.parse_type()?);
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.expect(&Token::RParen)?;
                let ret = if self.eat(&Token::Colon) {
                    Some(Box::new(self.parse_type()?))
                } else {
                    None
                };
                TypeExpr {
                    kind: TypeExprKind::Function { params, ret },
                    span: start.merge(self.prev_span()),
                }
            }
            Token::Ident(name) => {
                self.advance();
                TypeExpr {
                    kind: TypeExprKind::Named(name),
                    span: start,
                }
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(&Token::RParen)?;
                inner
            }
            _ => {
                return Err(CompileError::parse(
                    format!("Expected type, got {:?}", self.peek()),
                    self.span(),
                ));
            }
        };

        // `T[]`, `T[][]`
        while matches!(self.peek(), Token::LBracket) && matches!(self.peek_at(1), Token::RBracket) {
            self.advance();
            self.advance();
            ty = TypeExpr {
                span: ty.span.merge(self.prev_span()),
                kind: TypeExprKind::Array(Box::new(ty)),
            };
        }
        Ok(ty)
    }

    // ── Statements ────────────────────────────────────────────────

    fn parse_block(&mut self) -> Result<Vec<Stmt>, CompileError> {
        self.expect(&Token::LBrace)?;
        let mut stmts = Vec::new();
        self.skip_terminators();
        while !matches!(self.peek(), Token::RBrace | Token::Eof) {
            stmts.push(self.parse_stmt()?);
            self.skip_terminators();
        }
        self.expect(&Token::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, CompileError> {
        let start = self.span();
        let kind = match self.peek() {
            Token::Let | Token::Const => {
                let constant = matches!(self.peek(), Token::Const);
                self.advance();
                let (name, _) = self.expect_ident()?;
                let ty = if self.eat(&Token::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let value = if self.eat(&Token::Eq) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                StmtKind::Let {
                    name,
                    ty,
                    value,
                    constant,
                }
            }
            Token::If => return self.parse_if(),
            Token::While => {
                self.advance();
                let condition = self.parse_expr()?;
                let body = self.parse_block()?;
                StmtKind::While { condition, body }
            }
            Token::For => {
                self.advance();
                let (marker, _) = self.expect_ident()?;
                self.expect(&Token::In)?;
                let start_expr = self.parse_expr()?;
                self.expect(&Token::DotDot)?;
                let end = self.parse_expr()?;
                let body = self.parse_block()?;
                StmtKind::For {
                    marker,
                    start: start_expr,
                    end,
                    body,
                }
            }
            Token::Return => {
                self.advance();
                if matches!(self.peek(), Token::Semicolon | Token::RBrace) {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.parse_expr()?))
                }
            }
            Token::Break => {
                self.advance();
                StmtKind::Break
            }
            Token::Continue => {
                self.advance();
                StmtKind::Continue
            }
            Token::LBrace => StmtKind::Block(self.parse_block()?),
            _ => self.parse_expr_stmt()?,
        };
        Ok(Stmt {
            kind,
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, CompileError> {
        let start = self.expect(&Token::If)?;
        let condition = self.parse_expr()?;
        let body = self.parse_block()?;
        let else_body = if self.eat(&Token::Else) {
            if matches!(self.peek(), Token::If) {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                body,
                else_body,
            },
            span: start.merge(self.prev_span()),
        })
    }

    /// Assignment, compound assignment, field assignment or call.
    fn parse_expr_stmt(&mut self) -> Result<StmtKind, CompileError> {
        let target = self.parse_expr()?;

        // `obj.field = value`: parse_postfix leaves `.field =` in the stream.
        if matches!(self.peek(), Token::Dot) {
            self.advance();
            let (field, _) = self.expect_ident()?;
            self.expect(&Token::Eq)?;
            let value = self.parse_expr()?;
            return Ok(StmtKind::IndexAssign {
                object: target,
                field,
                value,
            });
        }

        let compound = match self.peek() {
            Token::Eq => None,
            Token::PlusEq => Some(BinOp::Add),
            Token::MinusEq => Some(BinOp::Sub),
            Token::StarEq => Some(BinOp::Mul),
            Token::SlashEq => Some(BinOp::Div),
            _ => {
                return match target.kind {
                    ExprKind::Call { name, args } => Ok(StmtKind::Call { name, args }),
                    _ => Err(CompileError::parse(
                        "Only function calls can be used as statements",
                        target.span,
                    )),
                };
            }
        };

        let ExprKind::Ident(name) = target.kind else {
            return Err(CompileError::parse("Invalid assignment target", target.span));
        };
        self.advance();
        let rhs = self.parse_expr()?;
        let value = match compound {
            None => rhs,
            // `x += e` is `x = x + e`
            Some(op) => Expr {
                span: target.span.merge(rhs.span),
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(Expr {
                        kind: ExprKind::Ident(name.clone()),
                        span: target.span,
                    }),
                    right: Box::new(rhs),
                },
            },
        };
        Ok(StmtKind::Assign { name, value })
    }

    // ── Expression parsing (precedence climbing) ──────────────────

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        self.parse_or()
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        Expr {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        }
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Self::binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_equality()?;
        while self.eat(&Token::And) {
            let right = self.parse_equality()?;
            left = Self::binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinOp::Eq,
                Token::Ne => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_add()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_add(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let start = self.span();
        match self.peek() {
            Token::Bang => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr {
                    span: start.merge(operand.span),
                    kind: ExprKind::Not(Box::new(operand)),
                })
            }
            Token::TypeOf => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr {
                    span: start.merge(operand.span),
                    kind: ExprKind::TypeOf(Box::new(operand)),
                })
            }
            Token::Minus => {
                // `-e` is `0 - e`; the target has no negation action.
                self.advance();
                let operand = self.parse_unary()?;
                let zero = Expr {
                    kind: ExprKind::Number(0.0),
                    span: start,
                };
                Ok(Self::binary(BinOp::Sub, zero, operand))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek() {
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let end = self.expect(&Token::RBracket)?;
                    expr = Expr {
                        span: expr.span.merge(end),
                        kind: ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                    };
                }
                Token::Dot => {
                    match (self.peek_at(1), self.peek_at(2)) {
                        // Method call: obj.method(args) is method(obj, args)
                        (Token::Ident(method), Token::LParen) => {
                            let method = method.clone();
                            self.advance();
                            self.advance();
                            self.advance();
                            let object_span = expr.span;
                            let mut args = vec![expr];
                            args.extend(self.parse_args()?);
                            expr = Expr {
                                kind: ExprKind::Call { name: method, args },
                                span: object_span.merge(self.prev_span()),
                            };
                        }
                        // Field assignment target, handled by the statement parser.
                        (Token::Ident(_), Token::Eq) => break,
                        (Token::Ident(field), _) => {
                            return Err(CompileError::parse(
                                format!("Reading field .{field} is not supported; fields can only be assigned"),
                                self.span(),
                            ));
                        }
                        _ => {
                            return Err(CompileError::parse(
                                format!("Expected identifier after '.', got {:?}", self.peek_at(1)),
                                self.span(),
                            ));
                        }
                    }
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Comma-separated expressions up to and including the closing `)`.
    fn parse_args(&mut self) -> Result<Vec<Expr>, CompileError> {
        self.parse_list(&Token::RParen)
    }

    fn parse_list(&mut self, close: &Token) -> Result<Vec<Expr>, CompileError> {
        let mut items = Vec::new();
        while self.peek() != close && !self.at_eof() {
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let span = self.span();
        match self.peek().clone() {
            Token::Number(v) => {
                self.advance();
                Ok(Expr { kind: ExprKind::Number(v), span })
            }
            Token::String(s) => {
                self.advance();
                Ok(Expr { kind: ExprKind::String(s), span })
            }
            Token::True => {
                self.advance();
                Ok(Expr { kind: ExprKind::Boolean(true), span })
            }
            Token::False => {
                self.advance();
                Ok(Expr { kind: ExprKind::Boolean(false), span })
            }
            Token::Ident(name) => {
                self.advance();
                if self.eat(&Token::LParen) {
                    let args = self.parse_args()?;
                    return Ok(Expr {
                        kind: ExprKind::Call { name, args },
                        span: span.merge(self.prev_span()),
                    });
                }
                Ok(Expr { kind: ExprKind::Ident(name), span })
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => {
                self.advance();
                let items = self.parse_list(&Token::RBracket)?;
                Ok(Expr {
                    kind: ExprKind::Array { item: None, items },
                    span: span.merge(self.prev_span()),
                })
            }
            // `<number>[1, 2]`
            Token::Lt => {
                self.advance();
                let item = self.parse_type()?;
                self.expect(&Token::Gt)?;
                self.expect(&Token::LBracket)?;
                let items = self.parse_list(&Token::RBracket)?;
                Ok(Expr {
                    kind: ExprKind::Array { item: Some(item), items },
                    span: span.merge(self.prev_span()),
                })
            }
            _ => Err(CompileError::parse(
                format!("Unexpected token: {:?}", self.peek()),
                self.span(),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::compiler::lexer::lex;

    fn parse_str(s: &str) -> Program {
        parse(lex(s).unwrap()).unwrap()
    }

    fn parse_err(s: &str) -> CompileError {
        parse(lex(s).unwrap()).unwrap_err()
    }

    fn event_body(s: &str) -> Vec<Stmt> {
        let program = parse_str(&format!("event server() {{ {s} }}"));
        match program.items.into_iter().next().unwrap() {
            Item::Event(event) => event.body,
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn parse_event_with_args() {
        let program = parse_str("event playerDied(victim, attacker) { }");
        let Item::Event(event) = &program.items[0] else { panic!("expected event") };
        assert_eq!(event.name, "playerDied");
        assert_eq!(event.args, vec!["victim", "attacker"]);
        assert!(event.body.is_empty());
    }

    #[test]
    fn parse_generic_function() {
        let program = parse_str("function first<T: any[]>(items: T, n: number): number { return n }");
        let Item::Function(func) = &program.items[0] else { panic!("expected function") };
        assert_eq!(func.name, "first");
        assert_eq!(func.generics.len(), 1);
        assert_eq!(func.generics[0].name, "T");
        let bound = func.generics[0].bound.as_ref().unwrap();
        assert!(matches!(bound.kind, TypeExprKind::Array(_)));
        assert_eq!(func.params.len(), 2);
        assert!(matches!(func.ret.as_ref().unwrap().kind, TypeExprKind::Named(ref n) if n == "number"));
        assert!(matches!(func.body[0].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn parse_type_alias_union() {
        let program = parse_str("type Target = player | player[];");
        let Item::Type(decl) = &program.items[0] else { panic!("expected type") };
        assert_eq!(decl.name, "Target");
        let TypeExprKind::Union(members) = &decl.ty.kind else { panic!("expected union") };
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn parse_function_type() {
        let ty = parse_type(lex("fn(number, string): boolean").unwrap()).unwrap();
        let TypeExprKind::Function { params, ret } = ty.kind else { panic!("expected fn") };
        assert_eq!(params.len(), 2);
        assert!(ret.is_some());
    }

    #[test]
    fn precedence_mul_over_add() {
        let body = event_body("let x = 1 + 2 * 3");
        let StmtKind::Let { value: Some(value), .. } = &body[0].kind else { panic!("expected let") };
        let ExprKind::Binary { op: BinOp::Add, right, .. } = &value.kind else { panic!("expected add") };
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn precedence_and_over_or() {
        let body = event_body("let x = a || b && c");
        let StmtKind::Let { value: Some(value), .. } = &body[0].kind else { panic!("expected let") };
        let ExprKind::Binary { op: BinOp::Or, right, .. } = &value.kind else { panic!("expected or") };
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::And, .. }));
    }

    #[test]
    fn compound_assignment_desugars() {
        let body = event_body("x += 2;");
        let StmtKind::Assign { name, value } = &body[0].kind else { panic!("expected assign") };
        assert_eq!(name, "x");
        let ExprKind::Binary { op, left, .. } = &value.kind else { panic!("expected binary") };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(left.kind, ExprKind::Ident(ref n) if n == "x"));
    }

    #[test]
    fn method_call_desugars() {
        let body = event_body("players.setInvisible(INVISIBLE_TO_ALL)");
        let StmtKind::Call { name, args } = &body[0].kind else { panic!("expected call") };
        assert_eq!(name, "setInvisible");
        assert_eq!(args.len(), 2);
        assert!(matches!(args[0].kind, ExprKind::Ident(ref n) if n == "players"));
    }

    #[test]
    fn field_assignment() {
        let body = event_body("victim.score = 10");
        let StmtKind::IndexAssign { object, field, .. } = &body[0].kind else { panic!("expected index assign") };
        assert_eq!(field, "score");
        assert!(matches!(object.kind, ExprKind::Ident(ref n) if n == "victim"));
    }

    #[test]
    fn field_read_is_rejected() {
        let err = parse_err("event server() { let x = victim.score }");
        assert!(err.message.contains("Reading field .score"));
    }

    #[test]
    fn for_loop() {
        let body = event_body("for i in 0..5 { wait(1) }");
        let StmtKind::For { marker, body, .. } = &body[0].kind else { panic!("expected for") };
        assert_eq!(marker, "i");
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn if_else_chain() {
        let body = event_body("if a { } else if b { } else { }");
        let StmtKind::If { else_body: Some(else_body), .. } = &body[0].kind else { panic!("expected if") };
        assert!(matches!(else_body[0].kind, StmtKind::If { else_body: Some(_), .. }));
    }

    #[test]
    fn typed_array_literal() {
        let body = event_body("let xs = <number>[]");
        let StmtKind::Let { value: Some(value), .. } = &body[0].kind else { panic!("expected let") };
        let ExprKind::Array { item, items } = &value.kind else { panic!("expected array") };
        assert!(item.is_some());
        assert!(items.is_empty());
    }

    #[test]
    fn unary_minus_is_subtraction_from_zero() {
        let body = event_body("let x = -5");
        let StmtKind::Let { value: Some(value), .. } = &body[0].kind else { panic!("expected let") };
        let ExprKind::Binary { op: BinOp::Sub, left, .. } = &value.kind else { panic!("expected sub") };
        assert!(matches!(left.kind, ExprKind::Number(n) if n == 0.0));
    }

    #[test]
    fn let_without_value() {
        let body = event_body("let x: number; const y = 2;");
        assert!(matches!(body[0].kind, StmtKind::Let { value: None, ty: Some(_), constant: false, .. }));
        assert!(matches!(body[1].kind, StmtKind::Let { constant: true, .. }));
    }

    #[test]
    fn bare_expression_statement_rejected() {
        let err = parse_err("event server() { 1 + 2 }");
        assert_eq!(err.message, "Only function calls can be used as statements");
    }

    #[test]
    fn top_level_statement_rejected() {
        let err = parse_err("let x = 1");
        assert!(err.message.starts_with("Expected function, event or type declaration"));
    }

    #[test]
    fn missing_brace() {
        let err = parse_err("event server() { wait(1)");
        assert!(err.message.contains("RBrace"));
    }
}
