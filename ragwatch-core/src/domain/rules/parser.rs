// ragwatch-core/src/domain/rules/parser.rs
//
// Recursive descent, lowest precedence first:
//   or      := and ( "||" and )*
//   and     := compare ( "&&" compare )*
//   compare := additive ( ("=="|"!="|"<"|"<="|">"|">=") additive )*
//   additive:= unary ( ("+"|"-") unary )*
//   unary   := ("!"|"-") unary | postfix
//   postfix := primary ( "." ident [ "(" [ lambda | or ] ")" ] )*
//   lambda  := ident "=>" or
//
// Every nested or chained node counts towards MAX_DEPTH, which bounds both
// the parser's and the evaluator's recursion.

use crate::domain::rules::ast::{
    ArgShape, BinaryOp, CallArg, Expr, Method, Property, UnaryOp, normalize,
};
use crate::domain::rules::error::CompileError;
use crate::domain::rules::lexer::{Token, TokenKind, tokenize};

pub const MAX_DEPTH: usize = 256;

pub fn parse(source: &str) -> Result<Expr, CompileError> {
    if source.trim().is_empty() {
        return Err(CompileError::Empty);
    }
    let mut parser = Parser {
        tokens: tokenize(source)?,
        index: 0,
        params: Vec::new(),
        depth: 0,
    };
    let expr = parser.parse_or()?;
    let trailing = parser.peek();
    if trailing.kind != TokenKind::Eof {
        return Err(syntax(trailing.position, "unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    /// Lambda parameters in scope, outermost first.
    params: Vec<String>,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The token stream always ends with Eof, and advance() never moves past it.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.index + offset).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, CompileError> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(syntax(token.position, &format!("expected {}", what)))
        }
    }

    /// One level deeper. Callers restore `depth` once their node is built.
    fn descend(&mut self) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(syntax(self.peek().position, "expression nested too deeply"));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let base = self.depth;
        let mut left = self.parse_and()?;
        while self.peek().kind == TokenKind::OrOr {
            self.advance();
            self.descend()?;
            let right = self.parse_and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let base = self.depth;
        let mut left = self.parse_compare()?;
        while self.peek().kind == TokenKind::AndAnd {
            self.advance();
            self.descend()?;
            let right = self.parse_compare()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_compare(&mut self) -> Result<Expr, CompileError> {
        let base = self.depth;
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.parse_additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let base = self.depth;
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            self.descend()?;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        self.advance();
        self.descend()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let base = self.depth;
        let mut expr = self.parse_primary()?;

        while self.peek().kind == TokenKind::Dot {
            self.advance();
            self.descend()?;
            let member = self.advance();
            let TokenKind::Ident(name) = member.kind else {
                return Err(syntax(member.position, "expected a member name after '.'"));
            };

            if self.peek().kind == TokenKind::LParen {
                let method =
                    Method::resolve(&name).ok_or_else(|| CompileError::UnknownMember {
                        name: name.clone(),
                        position: member.position,
                    })?;
                let arg = self.parse_call_arg(method, member.position)?;
                expr = Expr::Call(Box::new(expr), method, arg);
            } else {
                let property = Property::resolve(&name).ok_or(CompileError::UnknownMember {
                    name,
                    position: member.position,
                })?;
                expr = Expr::Property(Box::new(expr), property);
            }
        }

        self.depth = base;
        Ok(expr)
    }

    fn parse_call_arg(
        &mut self,
        method: Method,
        position: usize,
    ) -> Result<Option<CallArg>, CompileError> {
        self.expect(TokenKind::LParen, "'('")?;

        let arg = if self.peek().kind == TokenKind::RParen {
            None
        } else if matches!(self.peek().kind, TokenKind::Ident(_))
            && self.peek_kind_at(1) == Some(&TokenKind::Arrow)
        {
            Some(CallArg::Lambda(Box::new(self.parse_lambda()?)))
        } else {
            Some(CallArg::Value(Box::new(self.parse_or()?)))
        };

        let shape = method.shape();
        let accepted = matches!(
            (shape, &arg),
            (ArgShape::Nothing, None)
                | (ArgShape::OptionalLambda, None)
                | (ArgShape::OptionalLambda, Some(CallArg::Lambda(_)))
                | (ArgShape::Lambda, Some(CallArg::Lambda(_)))
                | (ArgShape::Value, Some(CallArg::Value(_)))
        );
        if !accepted || self.peek().kind == TokenKind::Comma {
            return Err(CompileError::Arity {
                method: method.name().to_string(),
                expected: shape.describe(),
                position,
            });
        }

        self.expect(TokenKind::RParen, "')'")?;
        Ok(arg)
    }

    fn parse_lambda(&mut self) -> Result<Expr, CompileError> {
        let token = self.advance();
        let TokenKind::Ident(param) = token.kind else {
            return Err(syntax(token.position, "expected a lambda parameter"));
        };
        self.expect(TokenKind::Arrow, "'=>'")?;
        self.descend()?;
        self.params.push(param);
        let body = self.parse_or();
        self.params.pop();
        self.depth -= 1;
        body
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Int(value) => Ok(Expr::Int(value)),
            TokenKind::Str(text) => Ok(Expr::Str(text)),
            TokenKind::LParen => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen, "')'")?;
                self.depth -= 1;
                Ok(inner)
            }
            TokenKind::Ident(name) => self.resolve_identifier(name, token.position),
            TokenKind::Eof => Err(syntax(token.position, "unexpected end of expression")),
            other => Err(syntax(
                token.position,
                &format!("unexpected token {:?}", other),
            )),
        }
    }

    fn resolve_identifier(&self, name: String, position: usize) -> Result<Expr, CompileError> {
        if let Some(depth) = self.params.iter().rposition(|p| *p == name) {
            return Ok(Expr::Param(depth));
        }
        match normalize(&name).as_str() {
            "true" => Ok(Expr::Bool(true)),
            "false" => Ok(Expr::Bool(false)),
            "runs" | "jobstats" => Ok(Expr::Runs),
            "referencedate" | "currentdate" | "today" => Ok(Expr::Reference),
            _ => Err(CompileError::UnknownIdentifier { name, position }),
        }
    }
}

fn syntax(position: usize, message: &str) -> CompileError {
    CompileError::Syntax {
        position,
        message: message.to_string(),
    }
}
