use crate::{
    ast::{
        ast::Stmt,
        statements::{
            BlockStmt, ExpressionStmt, FnDeclStmt, IfStmt, Parameter, PrintStmt, ReturnStmt,
            SelectCase, SelectStmt, VarDeclStmt, WhileStmt,
        },
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{
        expr::{parse_expr, parse_expr_list},
        lookups::BindingPower,
    },
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if let Some(handler) = parser.get_stmt_lookup().get(&parser.current_token_kind()) {
        let handler = *handler;
        return handler(parser);
    }

    let start = parser.get_position();
    let expression = parse_expr(parser, BindingPower::Default)?;

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Expression(ExpressionStmt {
        id: parser.advance_id(),
        span: parser.span_from(start),
        expression,
    }))
}

/// `T name <- value;` or `T name;`
pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let explicit_type = parse_type(parser, BindingPower::Default)?;

    let error = parser.detailed_error("expected identifier during variable declaration");
    let identifier = parser
        .expect_error(TokenKind::Identifier, Some(error))?
        .value;

    let assigned_value = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::VarDecl(VarDeclStmt {
        id: parser.advance_id(),
        span: parser.span_from(start),
        identifier,
        explicit_type,
        assigned_value,
    }))
}

/// Parses a `{ ... }` block.
pub fn parse_block(parser: &mut Parser) -> Result<BlockStmt, Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;

    let mut body = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.detailed_error("expected `}` before the end of the file"));
        }
        body.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(BlockStmt {
        id: parser.advance_id(),
        span: parser.span_from(start),
        body,
    })
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Block(parse_block(parser)?))
}

fn parse_if(parser: &mut Parser) -> Result<IfStmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let then_body = parse_block(parser)?;

    let else_body = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();

        if parser.current_token_kind() == TokenKind::If {
            // else if: the nested if becomes the only statement of the else block
            let nested = parse_if(parser)?;
            Some(BlockStmt {
                id: parser.advance_id(),
                span: nested.span.clone(),
                body: vec![Stmt::If(nested)],
            })
        } else {
            Some(parse_block(parser)?)
        }
    } else {
        None
    };

    Ok(IfStmt {
        id: parser.advance_id(),
        span: parser.span_from(start),
        condition,
        then_body,
        else_body,
    })
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::If(parse_if(parser)?))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_block(parser)?;

    Ok(Stmt::While(WhileStmt {
        id: parser.advance_id(),
        span: parser.span_from(start),
        condition,
        body,
    }))
}

/// `select { case c1 { ... } case c2: { ... } default { ... } }`
pub fn parse_select_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();
    parser.expect(TokenKind::OpenCurly)?;

    let mut cases = vec![];
    let mut default = None;

    while parser.current_token_kind() != TokenKind::CloseCurly {
        match parser.current_token_kind() {
            TokenKind::Case if default.is_none() => {
                let case_start = parser.advance().span.start.clone();
                let condition = parse_expr(parser, BindingPower::Default)?;
                if parser.current_token_kind() == TokenKind::Colon {
                    parser.advance();
                }
                let body = parse_block(parser)?;

                cases.push(SelectCase {
                    span: parser.span_from(case_start),
                    condition,
                    body,
                });
            }
            TokenKind::Default if default.is_none() => {
                parser.advance();
                if parser.current_token_kind() == TokenKind::Colon {
                    parser.advance();
                }
                default = Some(parse_block(parser)?);
            }
            _ => {
                return Err(parser.detailed_error("expected `case` or a single trailing `default`"))
            }
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt::Select(SelectStmt {
        id: parser.advance_id(),
        span: parser.span_from(start),
        cases,
        default,
    }))
}

/// `function T name(T1 a, ...) { ... }` or a forward declaration ending in `;`
pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let return_type = parse_type(parser, BindingPower::Default)?;
    let identifier = parser.expect(TokenKind::Identifier)?.value;

    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseParen {
        let param_start = parser.get_position();
        let ty = parse_type(parser, BindingPower::Comma)?;
        let name = parser.expect(TokenKind::Identifier)?.value;

        parameters.push(Parameter {
            id: parser.advance_id(),
            span: parser.span_from(param_start),
            name,
            ty,
        });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.detailed_error("expected `,` or `)` in parameter list"));
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let body = if parser.current_token_kind() == TokenKind::Semicolon {
        parser.advance();
        None
    } else {
        Some(parse_block(parser)?)
    };

    Ok(Stmt::FnDecl(FnDeclStmt {
        id: parser.advance_id(),
        span: parser.span_from(start),
        identifier,
        parameters,
        return_type,
        body,
    }))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let value = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Return(ReturnStmt {
        id: parser.advance_id(),
        span: parser.span_from(start),
        value,
    }))
}

/// `print(a, b, ...);`
pub fn parse_print_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    parser.expect(TokenKind::OpenParen)?;
    let arguments = parse_expr_list(parser, TokenKind::CloseParen)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Print(PrintStmt {
        id: parser.advance_id(),
        span: parser.span_from(start),
        arguments,
    }))
}
