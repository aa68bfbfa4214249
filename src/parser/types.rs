//! Type parsing implementation.
//!
//! This module handles parsing of type annotations. It supports:
//!
//! - Primitive types (`int`, `boolean`, `string`, `var`, `void`)
//! - Fixed-length array types (`int[3]`)
//! - Sum types (`int | boolean`)
//!
//! Similar to expression parsing, it uses NUD/LED handlers with
//! binding powers for parsing complex type expressions.

use std::collections::HashMap;

use crate::{
    ast::types::TypeAnnotation,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeAnnotation, Error>;

pub type TypeLEDHandler =
    fn(&mut Parser, TypeAnnotation, BindingPower) -> Result<TypeAnnotation, Error>;

pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;

pub type TypeBPLookup = HashMap<TokenKind, BindingPower>;

/// Initializes the type parsing lookup tables.
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::IntType, parse_primitive_type);
    parser.type_nud(TokenKind::BooleanType, parse_primitive_type);
    parser.type_nud(TokenKind::StringType, parse_primitive_type);
    parser.type_nud(TokenKind::Var, parse_primitive_type);
    parser.type_nud(TokenKind::Void, parse_primitive_type);

    parser.type_led(TokenKind::OpenBracket, BindingPower::Call, parse_array_type);
    parser.type_led(TokenKind::Or, BindingPower::LogicalOr, parse_sum_type);
}

pub fn parse_primitive_type(parser: &mut Parser) -> Result<TypeAnnotation, Error> {
    let token = parser.advance().clone();

    match token.kind {
        TokenKind::IntType => Ok(TypeAnnotation::Int),
        TokenKind::BooleanType => Ok(TypeAnnotation::Boolean),
        TokenKind::StringType => Ok(TypeAnnotation::String),
        TokenKind::Var => Ok(TypeAnnotation::Var),
        TokenKind::Void => Ok(TypeAnnotation::Void),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken { token: token.value },
            token.span.start,
        )),
    }
}

/// `T[n]`
pub fn parse_array_type(
    parser: &mut Parser,
    left: TypeAnnotation,
    _bp: BindingPower,
) -> Result<TypeAnnotation, Error> {
    parser.expect(TokenKind::OpenBracket)?;

    let error = parser.detailed_error("expected the array length");
    let length_token = parser.expect_error(TokenKind::Number, Some(error))?;
    let length = length_token.value.parse::<u32>().map_err(|_| {
        Error::new(
            ErrorImpl::NumberParseError {
                token: length_token.value.clone(),
            },
            length_token.span.start.clone(),
        )
    })?;

    parser.expect(TokenKind::CloseBracket)?;

    Ok(TypeAnnotation::Array(Box::new(left), length))
}

/// `T1 | T2`, flattened so `a | b | c` has three cases.
pub fn parse_sum_type(
    parser: &mut Parser,
    left: TypeAnnotation,
    bp: BindingPower,
) -> Result<TypeAnnotation, Error> {
    parser.expect(TokenKind::Or)?;
    let right = parse_type(parser, bp)?;

    let mut cases = match left {
        TypeAnnotation::Sum(cases) => cases,
        other => vec![other],
    };
    cases.push(right);

    Ok(TypeAnnotation::Sum(cases))
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<TypeAnnotation, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_type_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("expected a type"),
                },
                parser.get_position(),
            ))
        }
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser
            .get_type_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);

        if token_bp <= bp {
            break;
        }

        let led = match parser.get_type_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => break,
        };

        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}
