use crate::{
    ast::{
        ast::Expr,
        expressions::{
            ArrayExpr, AssignmentExpr, BinaryExpr, BinaryOperator, BooleanExpr, CallExpr,
            IndexExpr, NumberExpr, PrefixExpr, PrefixOperator, StringExpr, SymbolExpr,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_position(),
            ))
        }
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    while parser.current_binding_power() > bp {
        let token_kind = parser.current_token_kind();
        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: parser.current_token().value.clone(),
                    },
                    parser.get_position(),
                ))
            }
        };

        let binding_power = parser.current_binding_power();
        left = led(parser, left, binding_power)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let id = parser.advance_id();

    match parser.current_token_kind() {
        TokenKind::Number => {
            let value = parser.current_token().value.parse::<i32>().map_err(|_| {
                Error::new(
                    ErrorImpl::NumberParseError {
                        token: parser.current_token().value.clone(),
                    },
                    parser.get_position(),
                )
            })?;

            Ok(Expr::Number(NumberExpr {
                id,
                value,
                span: parser.advance().span.clone(),
            }))
        }
        TokenKind::True | TokenKind::False => {
            let token = parser.advance();
            Ok(Expr::Boolean(BooleanExpr {
                id,
                value: token.kind == TokenKind::True,
                span: token.span.clone(),
            }))
        }
        TokenKind::Identifier => {
            let token = parser.advance();
            Ok(Expr::Symbol(SymbolExpr {
                id,
                value: token.value.clone(),
                span: token.span.clone(),
            }))
        }
        TokenKind::StringLiteral => {
            let token = parser.advance();
            Ok(Expr::String(StringExpr {
                id,
                value: token.value.clone(),
                span: token.span.clone(),
            }))
        }
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        )),
    }
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = BinaryOperator::from_token(operator_token.kind).ok_or_else(|| {
        Error::new(
            ErrorImpl::UnexpectedToken {
                token: operator_token.value.clone(),
            },
            operator_token.span.start.clone(),
        )
    })?;

    let right = parse_expr(parser, bp)?;

    Ok(Expr::Binary(BinaryExpr {
        id: parser.advance_id(),
        span: Span {
            start: left.get_span().start.clone(),
            end: right.get_span().end.clone(),
        },
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operator = if operator_token.kind == TokenKind::Tilde {
        PrefixOperator::Not
    } else {
        PrefixOperator::Negate
    };

    let rhs = parse_expr(parser, BindingPower::Unary)?;

    Ok(Expr::Prefix(PrefixExpr {
        id: parser.advance_id(),
        span: Span {
            start: operator_token.span.start.clone(),
            end: rhs.get_span().end.clone(),
        },
        operator,
        right_expr: Box::new(rhs),
    }))
}

/// `name <- value`, right associative.
pub fn parse_assignment_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    let assignee = match left {
        Expr::Symbol(symbol) => symbol,
        other => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: String::from("<-"),
                    message: String::from("only a variable can be assigned to"),
                },
                other.get_span().start.clone(),
            ))
        }
    };

    parser.advance();
    let rhs = parse_expr(parser, BindingPower::Comma)?;

    Ok(Expr::Assignment(AssignmentExpr {
        id: parser.advance_id(),
        span: Span {
            start: assignee.span.start.clone(),
            end: rhs.get_span().end.clone(),
        },
        assignee: assignee.value,
        value: Box::new(rhs),
    }))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

/// Parses a comma separated list of expressions up to `closing`.
pub fn parse_expr_list(parser: &mut Parser, closing: TokenKind) -> Result<Vec<Expr>, Error> {
    let mut items = vec![];

    while parser.current_token_kind() != closing {
        items.push(parse_expr(parser, BindingPower::Comma)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != closing {
            return Err(parser.detailed_error("expected `,` between items"));
        }
    }

    parser.expect(closing)?;
    Ok(items)
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let callee = match left {
        Expr::Symbol(symbol) => symbol,
        other => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: String::from("("),
                    message: String::from("only a named function can be called"),
                },
                other.get_span().start.clone(),
            ))
        }
    };

    parser.advance();
    let arguments = parse_expr_list(parser, TokenKind::CloseParen)?;

    Ok(Expr::Call(CallExpr {
        id: parser.advance_id(),
        span: parser.span_from(callee.span.start.clone()),
        callee: callee.value,
        arguments,
    }))
}

pub fn parse_index_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    Ok(Expr::Index(IndexExpr {
        id: parser.advance_id(),
        span: parser.span_from(left.get_span().start.clone()),
        base: Box::new(left),
        index: Box::new(index),
    }))
}

pub fn parse_array_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start.clone();
    let elements = parse_expr_list(parser, TokenKind::CloseBracket)?;

    if elements.is_empty() {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: String::from("]"),
                message: String::from("an array literal needs at least one element"),
            },
            start,
        ));
    }

    Ok(Expr::Array(ArrayExpr {
        id: parser.advance_id(),
        span: parser.span_from(start),
        elements,
    }))
}
