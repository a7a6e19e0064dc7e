//! Query executor

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::engine::eval::{contains_aggregate, AggregateCall, Compiled, Compiler, Scope};
use crate::error::{QqError, Result};
use crate::parser::{Expr, FromClause, JoinKind, OrderTerm, Query, SelectItem};
use crate::store::value::ValueKey;
use crate::store::{Database, Value};

/// Column names plus rows of a finished query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Execute a parsed query against the tables of `db`.
pub fn execute(query: &Query, db: &Database) -> Result<ResultSet> {
    let source = build_source(query.from.as_ref(), db)?;
    let scope = &source.scope;

    let mut rows = source.rows;
    if let Some(condition) = &query.where_clause {
        let condition = Compiler::scalar(scope).compile(condition)?;
        rows.retain(|row| condition.is_true(row, &[]));
        trace!(rows = rows.len(), "applied WHERE");
    }

    let aggregate_query = !query.group_by.is_empty()
        || query.having.is_some()
        || query.items.iter().any(|item| match item {
            SelectItem::Expr { expr, .. } => contains_aggregate(expr),
            _ => false,
        })
        || query.order_by.iter().any(|term| contains_aggregate(&term.expr));

    let mut compiler = if aggregate_query {
        Compiler::grouped(scope)
    } else {
        Compiler::scalar(scope)
    };

    let projection = project(&query.items, scope, &mut compiler)?;
    let having = query
        .having
        .as_ref()
        .map(|e| compiler.compile(e))
        .transpose()?;
    let sort_keys = order_keys(&query.order_by, &query.items, &projection, &mut compiler)?;
    let aggregates = compiler.into_aggregates();

    // Each output candidate is the row it is evaluated on plus the aggregate
    // values of its group.
    let candidates: Vec<(Vec<Value>, Vec<Value>)> = if aggregate_query {
        let group_by = query
            .group_by
            .iter()
            .map(|e| Compiler::scalar(scope).compile(e))
            .collect::<Result<Vec<_>>>()?;
        group(rows, &group_by, &aggregates, scope.width())
    } else {
        rows.into_iter().map(|row| (row, Vec::new())).collect()
    };

    let mut output: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();
    for (row, aggs) in &candidates {
        if let Some(having) = &having {
            if !having.is_true(row, aggs) {
                continue;
            }
        }
        let values: Vec<Value> = projection.exprs.iter().map(|e| e.eval(row, aggs)).collect();
        let keys: Vec<Value> = sort_keys
            .iter()
            .map(|key| match &key.source {
                SortSource::Output(i) => values[*i].clone(),
                SortSource::Expr(e) => e.eval(row, aggs),
            })
            .collect();
        output.push((values, keys));
    }

    if query.distinct {
        let mut seen = HashSet::new();
        output.retain(|(values, _)| seen.insert(values.iter().map(Value::key).collect::<Vec<_>>()));
    }

    if !sort_keys.is_empty() {
        output.sort_by(|(_, a), (_, b)| {
            sort_keys
                .iter()
                .zip(a.iter().zip(b))
                .map(|(key, (x, y))| {
                    let ordering = x.sort_cmp(y);
                    if key.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                })
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let offset = query.offset.unwrap_or(0) as usize;
    let limit = query.limit.map_or(usize::MAX, |l| l as usize);
    let rows: Vec<Vec<Value>> = output
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|(values, _)| values)
        .collect();

    debug!(columns = projection.names.len(), rows = rows.len(), "executed query");

    Ok(ResultSet {
        columns: projection.names,
        rows,
    })
}

// ============================================================================
// FROM
// ============================================================================

struct Source {
    scope: Scope,
    rows: Vec<Vec<Value>>,
}

/// Build the joined rows of the FROM clause. A query without FROM sees one
/// empty row.
fn build_source(from: Option<&FromClause>, db: &Database) -> Result<Source> {
    let Some(from) = from else {
        return Ok(Source {
            scope: Scope::default(),
            rows: vec![Vec::new()],
        });
    };

    let first = db.table(&from.table.name)?;
    let mut scope = Scope::default();
    scope.push_table(from.table.qualifier(), first);
    let mut rows = first.rows.clone();

    for join in &from.joins {
        let right = db.table(&join.table.name)?;
        scope.push_table(join.table.qualifier(), right);
        let on = join
            .on
            .as_ref()
            .map(|e| Compiler::scalar(&scope).compile(e))
            .transpose()?;

        let mut joined = Vec::new();
        for left in &rows {
            let mut matched = false;
            for r in &right.rows {
                let combined: Vec<Value> = left.iter().chain(r).cloned().collect();
                if on.as_ref().is_some_and(|on| !on.is_true(&combined, &[])) {
                    continue;
                }
                matched = true;
                joined.push(combined);
            }
            if !matched && join.kind == JoinKind::Left {
                let mut padded = left.clone();
                padded.resize(left.len() + right.columns.len(), Value::Null);
                joined.push(padded);
            }
        }

        trace!(table = %join.table.name, rows = joined.len(), "joined table");
        rows = joined;
    }

    Ok(Source { scope, rows })
}

// ============================================================================
// Select list
// ============================================================================

struct Projection {
    names: Vec<String>,
    exprs: Vec<Compiled>,
}

fn project(items: &[SelectItem], scope: &Scope, compiler: &mut Compiler) -> Result<Projection> {
    let mut names = Vec::new();
    let mut exprs = Vec::new();

    for item in items {
        match item {
            SelectItem::Wildcard => {
                for (i, binding) in scope.bindings().iter().enumerate() {
                    names.push(binding.column.clone());
                    exprs.push(Compiled::Column(i));
                }
                if scope.width() == 0 {
                    return Err(QqError::ExecutionError("no tables specified".to_string()));
                }
            }
            SelectItem::QualifiedWildcard(qualifier) => {
                if !scope.has_qualifier(qualifier) {
                    return Err(QqError::NoSuchTable(qualifier.clone()));
                }
                for (i, binding) in scope.bindings().iter().enumerate() {
                    if binding.qualifier.eq_ignore_ascii_case(qualifier) {
                        names.push(binding.column.clone());
                        exprs.push(Compiled::Column(i));
                    }
                }
            }
            SelectItem::Expr { expr, alias, text } => {
                let compiled = compiler.compile(expr)?;
                let name = match (alias, &compiled) {
                    (Some(alias), _) => alias.clone(),
                    (None, Compiled::Column(i)) if matches!(expr, Expr::Column { .. }) => {
                        scope.bindings()[*i].column.clone()
                    }
                    _ => text.clone(),
                };
                names.push(name);
                exprs.push(compiled);
            }
        }
    }

    Ok(Projection { names, exprs })
}

// ============================================================================
// ORDER BY
// ============================================================================

enum SortSource {
    /// Sort on an output column.
    Output(usize),
    Expr(Compiled),
}

struct SortKey {
    source: SortSource,
    descending: bool,
}

/// Resolve ORDER BY terms. An integer literal is a 1-based output column
/// position and a bare name matching a select alias refers to that column.
fn order_keys(
    terms: &[OrderTerm],
    items: &[SelectItem],
    projection: &Projection,
    compiler: &mut Compiler,
) -> Result<Vec<SortKey>> {
    terms
        .iter()
        .map(|term| {
            let source = match &term.expr {
                Expr::Literal(Value::Integer(n)) => {
                    let columns = projection.names.len();
                    if *n < 1 || *n as usize > columns {
                        return Err(QqError::ExecutionError(format!(
                            "ORDER BY term out of range - should be between 1 and {}",
                            columns
                        )));
                    }
                    SortSource::Output(*n as usize - 1)
                }
                Expr::Column { table: None, name } => match alias_position(items, name) {
                    Some(i) => SortSource::Output(i),
                    None => SortSource::Expr(compiler.compile(&term.expr)?),
                },
                expr => SortSource::Expr(compiler.compile(expr)?),
            };
            Ok(SortKey {
                source,
                descending: term.descending,
            })
        })
        .collect()
}

/// Output position of the select item aliased `name`. Wildcards never carry
/// aliases, so the position is only meaningful when none precede it.
fn alias_position(items: &[SelectItem], name: &str) -> Option<usize> {
    let position = items.iter().position(|item| {
        matches!(item, SelectItem::Expr { alias: Some(alias), .. } if alias.eq_ignore_ascii_case(name))
    })?;
    let wildcard_before = items[..position]
        .iter()
        .any(|item| !matches!(item, SelectItem::Expr { .. }));
    (!wildcard_before).then_some(position)
}

// ============================================================================
// GROUP BY
// ============================================================================

/// Partition rows by their GROUP BY keys, in order of first appearance, and
/// fold every aggregate call per group. Without GROUP BY all rows form one
/// group, even when there are none.
fn group(
    rows: Vec<Vec<Value>>,
    group_by: &[Compiled],
    aggregates: &[AggregateCall],
    width: usize,
) -> Vec<(Vec<Value>, Vec<Value>)> {
    let mut groups: Vec<Vec<Vec<Value>>> = Vec::new();

    if group_by.is_empty() {
        groups.push(rows);
    } else {
        let mut index: HashMap<Vec<ValueKey>, usize> = HashMap::new();
        for row in rows {
            let key: Vec<ValueKey> = group_by.iter().map(|e| e.eval(&row, &[]).key()).collect();
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row);
        }
    }

    debug!(groups = groups.len(), "grouped rows");

    groups
        .into_iter()
        .map(|members| {
            let values = aggregates.iter().map(|call| fold(call, &members)).collect();
            let representative = members
                .into_iter()
                .next()
                .unwrap_or_else(|| vec![Value::Null; width]);
            (representative, values)
        })
        .collect()
}

fn fold(call: &AggregateCall, members: &[Vec<Value>]) -> Value {
    let mut inputs = Vec::with_capacity(members.len());
    let mut seen = HashSet::new();

    for row in members {
        let value = match &call.arg {
            Some(arg) => arg.eval(row, &[]),
            None => Value::Integer(1),
        };
        if value.is_null() || (call.distinct && !seen.insert(value.key())) {
            continue;
        }
        inputs.push(value);
    }

    let separator = call
        .separator
        .as_ref()
        .and_then(|s| members.first().map(|row| s.eval(row, &[]).to_string()))
        .unwrap_or_else(|| ",".to_string());

    call.func.finish(&inputs, &separator)
}
