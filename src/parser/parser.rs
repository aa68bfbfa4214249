//! Parser implementation for building the Abstract Syntax Tree.
//!
//! This module contains the main Parser struct and parsing functions.
//! The parser uses a Pratt parser approach with NUD/LED handlers for
//! expression parsing and specialized functions for statement parsing.
//!
//! It maintains lookup tables for:
//! - Statement handlers
//! - NUD (null denotation) handlers for prefix expressions
//! - LED (left denotation) handlers for infix expressions
//! - Binding powers for operator precedence
//! - Type parsing handlers

use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::ast::{NodeId, Program},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position, Span,
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup,
        StmtHandler, StmtLookup,
    },
    stmt::parse_stmt,
    types::{
        create_token_type_lookups, TypeBPLookup, TypeLEDHandler, TypeLEDLookup, TypeNUDHandler,
        TypeNUDLookup,
    },
};

/// The main parser structure that maintains parsing state.
///
/// The token stream always ends with an EOF token; reading past it keeps
/// returning that token.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: Rc<String>,
    stmt_lookup: StmtLookup,
    nud_lookup: NUDLookup,
    led_lookup: LEDLookup,
    binding_power_lookup: BPLookup,
    type_nud_lookup: TypeNUDLookup,
    type_led_lookup: TypeLEDLookup,
    type_binding_power_lookup: TypeBPLookup,
    /// Counter for node ids
    current_id: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, file: Rc<String>) -> Self {
        Parser {
            tokens,
            pos: 0,
            file,
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            type_nud_lookup: HashMap::new(),
            type_led_lookup: HashMap::new(),
            type_binding_power_lookup: HashMap::new(),
            current_id: 0,
        }
    }

    pub fn current_token(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Advances to the next token and returns the previous token.
    pub fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        let token = self.current_token();
        if token.kind != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: token.value.clone(),
                    },
                    token.span.start.clone(),
                )),
            }
        } else {
            Ok(self.advance().clone())
        }
    }

    /// Expects a token of the specified kind with default error message.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Builds an `UnexpectedTokenDetailed` error at the current token.
    pub fn detailed_error(&self, message: &str) -> Error {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: self.current_token().value.clone(),
                message: String::from(message),
            },
            self.get_position(),
        )
    }

    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    pub fn get_type_bp_lookup(&self) -> &TypeBPLookup {
        &self.type_binding_power_lookup
    }

    pub fn get_type_nud_lookup(&self) -> &TypeNUDLookup {
        &self.type_nud_lookup
    }

    pub fn get_type_led_lookup(&self) -> &TypeLEDLookup {
        &self.type_led_lookup
    }

    /// Binding power of the current token, `Default` when it has none.
    pub fn current_binding_power(&self) -> BindingPower {
        *self
            .binding_power_lookup
            .get(&self.current_token_kind())
            .unwrap_or(&BindingPower::Default)
    }

    /// Registers a left denotation (infix) handler for a token.
    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a null denotation (prefix) handler for a token.
    ///
    /// The token's binding power is left alone: `(` and `[` are both a
    /// prefix and an infix token.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    /// Registers a statement handler for a token.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.binding_power_lookup
            .entry(kind)
            .or_insert(BindingPower::Default);
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    pub fn type_led(
        &mut self,
        kind: TokenKind,
        binding_power: BindingPower,
        led_fn: TypeLEDHandler,
    ) {
        self.type_binding_power_lookup.insert(kind, binding_power);
        self.type_led_lookup.insert(kind, led_fn);
    }

    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: TypeNUDHandler) {
        self.type_nud_lookup.insert(kind, nud_fn);
    }

    /// Hands out the next node id.
    pub fn advance_id(&mut self) -> NodeId {
        let id = self.current_id;
        self.current_id += 1;
        NodeId(id)
    }

    /// Source position of the current token.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    /// Span from `start` to the end of the last consumed token.
    pub fn span_from(&self, start: Position) -> Span {
        let end = if self.pos == 0 {
            start.clone()
        } else {
            self.tokens[(self.pos - 1).min(self.tokens.len() - 1)]
                .span
                .end
                .clone()
        };

        Span { start, end }
    }

    pub fn get_file(&self) -> Rc<String> {
        Rc::clone(&self.file)
    }
}

/// Parses a stream of tokens into a `Program`.
///
/// Returns the parser alongside the result so callers can inspect where
/// parsing stopped.
pub fn parse(tokens: Vec<Token>, file: Rc<String>) -> (Parser, Result<Program, Error>) {
    let mut parser = Parser::new(tokens, Rc::clone(&file));
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    let start = Position::new(1, 1, Rc::clone(&file));
    let mut body = vec![];

    while parser.has_tokens() {
        match parse_stmt(&mut parser) {
            Ok(stmt) => body.push(stmt),
            Err(error) => return (parser, Err(error)),
        }
    }

    let program = Ok(Program {
        body,
        span: Span {
            start,
            end: parser.get_position(),
        },
    });

    (parser, program)
}
