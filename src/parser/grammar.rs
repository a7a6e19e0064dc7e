//! Pest grammar parser for qq queries

use std::sync::LazyLock;

use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;

use crate::error::{QqError, Result};
use crate::parser::ast::*;
use crate::store::value::{parse_number, Value};

#[derive(Parser)]
#[grammar = "../grammar/qq.pest"]
pub struct QqParser;

static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::or_op, Assoc::Left))
        .op(Op::infix(Rule::and_op, Assoc::Left))
        .op(Op::prefix(Rule::not_op))
        .op(Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::ne, Assoc::Left)
            | Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left)
            | Op::infix(Rule::like, Assoc::Left)
            | Op::infix(Rule::not_like, Assoc::Left)
            | Op::postfix(Rule::is_null_op)
            | Op::postfix(Rule::in_op))
        .op(Op::infix(Rule::concat, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::pos))
});

/// Parse a query string into an AST
pub fn parse_query(input: &str) -> Result<Query> {
    let pairs = QqParser::parse(Rule::query, input)
        .map_err(|e| QqError::ParseError(e.to_string()))?;

    let query = pairs
        .into_iter()
        .next()
        .ok_or_else(|| QqError::ParseError("Empty input".to_string()))?;

    let statement = query
        .into_inner()
        .find(|p| p.as_rule() == Rule::select_stmt)
        .ok_or_else(|| QqError::ParseError("Expected SELECT statement".to_string()))?;

    parse_select(statement)
}

fn parse_select(pair: Pair<Rule>) -> Result<Query> {
    let mut query = Query {
        distinct: false,
        items: Vec::new(),
        from: None,
        where_clause: None,
        group_by: Vec::new(),
        having: None,
        order_by: Vec::new(),
        limit: None,
        offset: None,
    };

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::kw_distinct => query.distinct = true,
            Rule::select_list => query.items = parse_select_list(item)?,
            Rule::from_clause => query.from = Some(parse_from_clause(item)?),
            Rule::where_clause => query.where_clause = Some(parse_clause_expr(item)?),
            Rule::group_by_clause => query.group_by = parse_expr_list(item)?,
            Rule::having_clause => query.having = Some(parse_clause_expr(item)?),
            Rule::order_by_clause => {
                query.order_by = item
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::order_term)
                    .map(parse_order_term)
                    .collect::<Result<_>>()?;
            }
            Rule::limit_clause => {
                let mut counts = item.into_inner().filter(|p| p.as_rule() == Rule::count);
                query.limit = counts.next().map(parse_count).transpose()?;
                query.offset = counts.next().map(parse_count).transpose()?;
            }
            _ => {}
        }
    }

    Ok(query)
}

// ============================================================================
// Select list
// ============================================================================

fn parse_select_list(pair: Pair<Rule>) -> Result<Vec<SelectItem>> {
    pair.into_inner().map(parse_select_item).collect()
}

fn parse_select_item(pair: Pair<Rule>) -> Result<SelectItem> {
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| QqError::ParseError("Expected select item".to_string()))?;

    match first.as_rule() {
        Rule::wildcard => Ok(SelectItem::Wildcard),
        Rule::qualified_wildcard => {
            let table = first
                .into_inner()
                .next()
                .ok_or_else(|| QqError::ParseError("Expected table name before .*".to_string()))?;
            Ok(SelectItem::QualifiedWildcard(parse_identifier(table)?))
        }
        Rule::expr => {
            let text = first.as_str().trim().to_string();
            let expr = parse_expr(first)?;
            let alias = inner.next().map(parse_alias).transpose()?;
            Ok(SelectItem::Expr { expr, alias, text })
        }
        _ => Err(QqError::ParseError(format!(
            "Unexpected rule in select list: {:?}",
            first.as_rule()
        ))),
    }
}

fn parse_alias(pair: Pair<Rule>) -> Result<String> {
    let ident = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::identifier)
        .ok_or_else(|| QqError::ParseError("Expected alias name".to_string()))?;
    parse_identifier(ident)
}

// ============================================================================
// FROM Clause Parsing
// ============================================================================

fn parse_from_clause(pair: Pair<Rule>) -> Result<FromClause> {
    let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::kw_from);

    let table = inner
        .next()
        .ok_or_else(|| QqError::ParseError("Expected table in FROM".to_string()))?;
    let table = parse_table_ref(table)?;

    let joins = inner.map(parse_join).collect::<Result<_>>()?;

    Ok(FromClause { table, joins })
}

fn parse_table_ref(pair: Pair<Rule>) -> Result<TableRef> {
    let mut inner = pair.into_inner();

    let name = inner
        .next()
        .ok_or_else(|| QqError::ParseError("Expected table name".to_string()))?;
    let name = parse_identifier(name)?;
    let alias = inner.next().map(parse_alias).transpose()?;

    Ok(TableRef { name, alias })
}

fn parse_join(pair: Pair<Rule>) -> Result<Join> {
    let mut kind = JoinKind::Inner;
    let mut table = None;
    let mut on = None;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::join_kind => {
                let is_left = item
                    .into_inner()
                    .next()
                    .is_some_and(|k| k.as_rule() == Rule::left_join);
                if is_left {
                    kind = JoinKind::Left;
                }
            }
            Rule::table_ref => table = Some(parse_table_ref(item)?),
            Rule::join_condition => on = Some(parse_clause_expr(item)?),
            _ => {}
        }
    }

    let table = table.ok_or_else(|| QqError::ParseError("Expected table in JOIN".to_string()))?;
    Ok(Join { kind, table, on })
}

// ============================================================================
// Clauses
// ============================================================================

/// The single expression of WHERE, HAVING or ON.
fn parse_clause_expr(pair: Pair<Rule>) -> Result<Expr> {
    let rule = pair.as_rule();
    let expr = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| QqError::ParseError(format!("Expected expression in {:?}", rule)))?;
    parse_expr(expr)
}

fn parse_expr_list(pair: Pair<Rule>) -> Result<Vec<Expr>> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::expr)
        .map(parse_expr)
        .collect()
}

fn parse_order_term(pair: Pair<Rule>) -> Result<OrderTerm> {
    let mut expr = None;
    let mut descending = false;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::expr => expr = Some(parse_expr(item)?),
            Rule::kw_desc => descending = true,
            _ => {}
        }
    }

    let expr = expr.ok_or_else(|| QqError::ParseError("Expected ORDER BY term".to_string()))?;
    Ok(OrderTerm { expr, descending })
}

fn parse_count(pair: Pair<Rule>) -> Result<u64> {
    pair.as_str()
        .parse()
        .map_err(|_| QqError::ParseError(format!("Invalid count: {}", pair.as_str())))
}

// ============================================================================
// Expression Parsing
// ============================================================================

fn parse_expr(pair: Pair<Rule>) -> Result<Expr> {
    PRATT
        .map_primary(parse_primary)
        .map_prefix(|op, rhs| {
            let op = match op.as_rule() {
                Rule::not_op => UnaryOp::Not,
                Rule::neg => UnaryOp::Neg,
                Rule::pos => UnaryOp::Pos,
                rule => {
                    return Err(QqError::ParseError(format!(
                        "Unexpected prefix operator: {:?}",
                        rule
                    )))
                }
            };
            Ok(Expr::Unary {
                op,
                expr: Box::new(rhs?),
            })
        })
        .map_postfix(|lhs, op| {
            let expr = Box::new(lhs?);
            let negated = op.clone().into_inner().any(|p| p.as_rule() == Rule::kw_not);
            match op.as_rule() {
                Rule::is_null_op => Ok(Expr::IsNull { expr, negated }),
                Rule::in_op => {
                    let list = op
                        .into_inner()
                        .filter(|p| p.as_rule() == Rule::expr)
                        .map(parse_expr)
                        .collect::<Result<_>>()?;
                    Ok(Expr::InList {
                        expr,
                        list,
                        negated,
                    })
                }
                rule => Err(QqError::ParseError(format!(
                    "Unexpected postfix operator: {:?}",
                    rule
                ))),
            }
        })
        .map_infix(|lhs, op, rhs| {
            let left = lhs?;
            let right = rhs?;
            let op = match op.as_rule() {
                Rule::or_op => BinaryOp::Or,
                Rule::and_op => BinaryOp::And,
                Rule::eq => BinaryOp::Eq,
                Rule::ne => BinaryOp::Ne,
                Rule::lt => BinaryOp::Lt,
                Rule::le => BinaryOp::Le,
                Rule::gt => BinaryOp::Gt,
                Rule::ge => BinaryOp::Ge,
                Rule::concat => BinaryOp::Concat,
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                Rule::rem => BinaryOp::Rem,
                Rule::like | Rule::not_like => {
                    return Ok(Expr::Like {
                        expr: Box::new(left),
                        pattern: Box::new(right),
                        negated: op.as_rule() == Rule::not_like,
                    })
                }
                rule => {
                    return Err(QqError::ParseError(format!(
                        "Unexpected operator: {:?}",
                        rule
                    )))
                }
            };
            Ok(Expr::binary(op, left, right))
        })
        .parse(pair.into_inner())
}

fn parse_primary(pair: Pair<Rule>) -> Result<Expr> {
    match pair.as_rule() {
        Rule::expr => parse_expr(pair),
        Rule::number => {
            let s = pair.as_str();
            let value = parse_number(s)
                .or_else(|| s.parse::<i64>().ok().map(Value::Integer))
                .or_else(|| s.parse::<f64>().ok().map(Value::Real))
                .ok_or_else(|| QqError::ParseError(format!("Invalid number: {}", s)))?;
            Ok(Expr::Literal(value))
        }
        Rule::string => {
            let s = pair.as_str();
            Ok(Expr::Literal(Value::Text(unquote(s, '\''))))
        }
        Rule::null_literal => Ok(Expr::Literal(Value::Null)),
        Rule::true_literal => Ok(Expr::Literal(Value::Integer(1))),
        Rule::false_literal => Ok(Expr::Literal(Value::Integer(0))),
        Rule::function_call => parse_function_call(pair),
        Rule::column_ref => {
            let mut parts = pair
                .into_inner()
                .map(parse_identifier)
                .collect::<Result<Vec<_>>>()?;
            let name = parts
                .pop()
                .ok_or_else(|| QqError::ParseError("Expected column name".to_string()))?;
            Ok(Expr::Column {
                table: parts.pop(),
                name,
            })
        }
        rule => Err(QqError::ParseError(format!(
            "Unexpected expression: {:?}",
            rule
        ))),
    }
}

fn parse_function_call(pair: Pair<Rule>) -> Result<Expr> {
    let mut inner = pair.into_inner();

    let name = inner
        .next()
        .ok_or_else(|| QqError::ParseError("Expected function name".to_string()))?
        .as_str()
        .to_uppercase();

    let args = match inner.next() {
        None => FunctionArgs::List {
            distinct: false,
            args: Vec::new(),
        },
        Some(args) => {
            let mut distinct = false;
            let mut list = Vec::new();
            let mut star = false;
            for arg in args.into_inner() {
                match arg.as_rule() {
                    Rule::star_arg => star = true,
                    Rule::kw_distinct => distinct = true,
                    Rule::expr => list.push(parse_expr(arg)?),
                    _ => {}
                }
            }
            if star {
                FunctionArgs::Star
            } else {
                FunctionArgs::List {
                    distinct,
                    args: list,
                }
            }
        }
    };

    Ok(Expr::Function { name, args })
}

// ============================================================================
// Identifiers
// ============================================================================

fn parse_identifier(pair: Pair<Rule>) -> Result<String> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| QqError::ParseError("Expected identifier".to_string()))?;

    let s = inner.as_str();
    match inner.as_rule() {
        Rule::bare_identifier => Ok(s.to_string()),
        Rule::double_quoted => Ok(unquote(s, '"')),
        Rule::backquoted => Ok(unquote(s, '`')),
        Rule::bracketed => Ok(s[1..s.len() - 1].to_string()),
        _ => Err(QqError::ParseError("Invalid identifier".to_string())),
    }
}

/// Strip the surrounding quotes and collapse doubled quote characters.
fn unquote(s: &str, quote: char) -> String {
    let doubled: String = [quote, quote].iter().collect();
    s[1..s.len() - 1].replace(&doubled, &quote.to_string())
}

// ============================================================================
// Tests
// ============================================================================
