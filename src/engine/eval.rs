//! Name resolution and expression evaluation

use std::cmp::Ordering;

use crate::engine::functions::{like_match, AggregateFn, ScalarFn};
use crate::error::{QqError, Result};
use crate::parser::{BinaryOp, Expr, FunctionArgs, UnaryOp};
use crate::store::{Table, Value};

// ============================================================================
// Scope
// ============================================================================

/// One column visible to expressions, with the table name or alias that
/// qualifies it.
#[derive(Debug, Clone)]
pub struct Binding {
    pub qualifier: String,
    pub column: String,
}

/// The columns of every table in FROM, in the order rows are laid out.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: Vec<Binding>,
}

impl Scope {
    pub fn push_table(&mut self, qualifier: &str, table: &Table) {
        self.bindings.extend(table.columns.iter().map(|c| Binding {
            qualifier: qualifier.to_string(),
            column: c.name.clone(),
        }));
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn width(&self) -> usize {
        self.bindings.len()
    }

    pub fn has_qualifier(&self, qualifier: &str) -> bool {
        self.bindings
            .iter()
            .any(|b| b.qualifier.eq_ignore_ascii_case(qualifier))
    }

    /// Position of a column reference in a row of this scope.
    pub fn resolve(&self, table: Option<&str>, name: &str) -> Result<usize> {
        let display = || match table {
            Some(t) => format!("{}.{}", t, name),
            None => name.to_string(),
        };

        let mut found = None;
        for (i, binding) in self.bindings.iter().enumerate() {
            if !binding.column.eq_ignore_ascii_case(name) {
                continue;
            }
            if table.is_some_and(|t| !binding.qualifier.eq_ignore_ascii_case(t)) {
                continue;
            }
            if found.is_some() {
                return Err(QqError::AmbiguousColumn(display()));
            }
            found = Some(i);
        }

        found.ok_or_else(|| QqError::NoSuchColumn(display()))
    }
}

// ============================================================================
// Compilation
// ============================================================================

/// An expression with column references resolved to row positions.
#[derive(Debug, Clone)]
pub enum Compiled {
    Literal(Value),
    Column(usize),
    /// Result of the n-th aggregate call of the query.
    Aggregate(usize),
    Unary(UnaryOp, Box<Compiled>),
    Binary(BinaryOp, Box<Compiled>, Box<Compiled>),
    Like {
        expr: Box<Compiled>,
        pattern: Box<Compiled>,
        negated: bool,
    },
    InList {
        expr: Box<Compiled>,
        list: Vec<Compiled>,
        negated: bool,
    },
    IsNull {
        expr: Box<Compiled>,
        negated: bool,
    },
    Scalar {
        func: ScalarFn,
        args: Vec<Compiled>,
    },
}

/// One aggregate call, evaluated once per group.
#[derive(Debug, Clone)]
pub struct AggregateCall {
    pub func: AggregateFn,
    /// `None` for `COUNT(*)`
    pub arg: Option<Compiled>,
    pub separator: Option<Compiled>,
    pub distinct: bool,
}

/// Is `name(args)` an aggregate call?
pub fn is_aggregate_call(name: &str, args: &FunctionArgs) -> bool {
    let argc = match args {
        FunctionArgs::Star => 1,
        FunctionArgs::List { args, .. } => args.len(),
    };
    AggregateFn::from_name(name, argc).is_some()
}

/// Does the expression contain an aggregate call anywhere?
pub fn contains_aggregate(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(_) | Expr::Column { .. } => false,
        Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => contains_aggregate(expr),
        Expr::Binary { left, right, .. } => contains_aggregate(left) || contains_aggregate(right),
        Expr::Like { expr, pattern, .. } => contains_aggregate(expr) || contains_aggregate(pattern),
        Expr::InList { expr, list, .. } => {
            contains_aggregate(expr) || list.iter().any(contains_aggregate)
        }
        Expr::Function { name, args } => {
            is_aggregate_call(name, args)
                || matches!(args, FunctionArgs::List { args, .. } if args.iter().any(contains_aggregate))
        }
    }
}

/// Resolves expressions against a scope and collects aggregate calls.
pub struct Compiler<'a> {
    scope: &'a Scope,
    allow_aggregates: bool,
    in_aggregate: bool,
    aggregates: Vec<AggregateCall>,
}

impl<'a> Compiler<'a> {
    /// A compiler for per-row expressions such as WHERE or ON.
    pub fn scalar(scope: &'a Scope) -> Self {
        Self {
            scope,
            allow_aggregates: false,
            in_aggregate: false,
            aggregates: Vec::new(),
        }
    }

    /// A compiler for per-group expressions: the select list, HAVING and
    /// ORDER BY of an aggregate query.
    pub fn grouped(scope: &'a Scope) -> Self {
        Self {
            allow_aggregates: true,
            ..Self::scalar(scope)
        }
    }

    pub fn into_aggregates(self) -> Vec<AggregateCall> {
        self.aggregates
    }

    pub fn compile(&mut self, expr: &Expr) -> Result<Compiled> {
        Ok(match expr {
            Expr::Literal(v) => Compiled::Literal(v.clone()),
            Expr::Column { table, name } => {
                Compiled::Column(self.scope.resolve(table.as_deref(), name)?)
            }
            Expr::Unary { op, expr } => Compiled::Unary(*op, Box::new(self.compile(expr)?)),
            Expr::Binary { op, left, right } => Compiled::Binary(
                *op,
                Box::new(self.compile(left)?),
                Box::new(self.compile(right)?),
            ),
            Expr::Like {
                expr,
                pattern,
                negated,
            } => Compiled::Like {
                expr: Box::new(self.compile(expr)?),
                pattern: Box::new(self.compile(pattern)?),
                negated: *negated,
            },
            Expr::InList {
                expr,
                list,
                negated,
            } => Compiled::InList {
                expr: Box::new(self.compile(expr)?),
                list: list
                    .iter()
                    .map(|e| self.compile(e))
                    .collect::<Result<_>>()?,
                negated: *negated,
            },
            Expr::IsNull { expr, negated } => Compiled::IsNull {
                expr: Box::new(self.compile(expr)?),
                negated: *negated,
            },
            Expr::Function { name, args } if is_aggregate_call(name, args) => {
                self.compile_aggregate(name, args)?
            }
            Expr::Function { name, args } => match args {
                FunctionArgs::Star => {
                    return Err(QqError::ExecutionError(format!(
                        "wrong number of arguments to function {}()",
                        name
                    )))
                }
                FunctionArgs::List { distinct: true, .. } => {
                    return Err(QqError::ExecutionError(format!(
                        "DISTINCT is only allowed in aggregate functions: {}()",
                        name
                    )))
                }
                FunctionArgs::List { args, .. } => Compiled::Scalar {
                    func: ScalarFn::from_name(name, args.len())?,
                    args: args
                        .iter()
                        .map(|e| self.compile(e))
                        .collect::<Result<_>>()?,
                },
            },
        })
    }

    fn compile_aggregate(&mut self, name: &str, args: &FunctionArgs) -> Result<Compiled> {
        if !self.allow_aggregates || self.in_aggregate {
            return Err(QqError::ExecutionError(format!(
                "misuse of aggregate function {}()",
                name
            )));
        }

        let (distinct, args) = match args {
            FunctionArgs::Star if name == "COUNT" => (false, &[][..]),
            FunctionArgs::Star => {
                return Err(QqError::ExecutionError(format!(
                    "wrong number of arguments to function {}()",
                    name
                )))
            }
            FunctionArgs::List { distinct, args } => (*distinct, args.as_slice()),
        };

        let func = AggregateFn::from_name(name, args.len()).ok_or_else(|| {
            QqError::ExecutionError(format!("no such function: {}", name))
        })?;
        let (min, max) = func.arity();
        let star = args.is_empty() && func == AggregateFn::Count;
        if !star && (args.len() < min.max(1) || args.len() > max) {
            return Err(QqError::ExecutionError(format!(
                "wrong number of arguments to function {}()",
                name
            )));
        }

        self.in_aggregate = true;
        let compiled: Result<Vec<Compiled>> = args.iter().map(|e| self.compile(e)).collect();
        self.in_aggregate = false;
        let mut compiled = compiled?.into_iter();

        self.aggregates.push(AggregateCall {
            func,
            arg: compiled.next(),
            separator: compiled.next(),
            distinct,
        });
        Ok(Compiled::Aggregate(self.aggregates.len() - 1))
    }
}

// ============================================================================
// Evaluation
// ============================================================================

impl Compiled {
    /// Evaluate against one row. `aggregates` holds the finished aggregate
    /// values of the row's group and is empty outside aggregate queries.
    pub fn eval(&self, row: &[Value], aggregates: &[Value]) -> Value {
        match self {
            Compiled::Literal(v) => v.clone(),
            Compiled::Column(i) => row.get(*i).cloned().unwrap_or(Value::Null),
            Compiled::Aggregate(i) => aggregates.get(*i).cloned().unwrap_or(Value::Null),
            Compiled::Unary(op, expr) => unary(*op, expr.eval(row, aggregates)),
            Compiled::Binary(BinaryOp::And, left, right) => {
                let l = left.eval(row, aggregates).truthiness();
                if l == Some(false) {
                    return Value::from_bool(false);
                }
                match (l, right.eval(row, aggregates).truthiness()) {
                    (_, Some(false)) => Value::from_bool(false),
                    (Some(true), Some(true)) => Value::from_bool(true),
                    _ => Value::Null,
                }
            }
            Compiled::Binary(BinaryOp::Or, left, right) => {
                let l = left.eval(row, aggregates).truthiness();
                if l == Some(true) {
                    return Value::from_bool(true);
                }
                match (l, right.eval(row, aggregates).truthiness()) {
                    (_, Some(true)) => Value::from_bool(true),
                    (Some(false), Some(false)) => Value::from_bool(false),
                    _ => Value::Null,
                }
            }
            Compiled::Binary(op, left, right) => {
                binary(*op, left.eval(row, aggregates), right.eval(row, aggregates))
            }
            Compiled::Like {
                expr,
                pattern,
                negated,
            } => {
                let value = expr.eval(row, aggregates);
                let pattern = pattern.eval(row, aggregates);
                if value.is_null() || pattern.is_null() {
                    return Value::Null;
                }
                let matched = like_match(&value.to_string(), &pattern.to_string());
                Value::from_bool(matched != *negated)
            }
            Compiled::InList {
                expr,
                list,
                negated,
            } => {
                let value = expr.eval(row, aggregates);
                if value.is_null() {
                    return Value::Null;
                }
                let mut saw_null = false;
                for item in list {
                    match value.compare(&item.eval(row, aggregates)) {
                        Some(Ordering::Equal) => return Value::from_bool(!*negated),
                        None => saw_null = true,
                        _ => {}
                    }
                }
                if saw_null {
                    Value::Null
                } else {
                    Value::from_bool(*negated)
                }
            }
            Compiled::IsNull { expr, negated } => {
                Value::from_bool(expr.eval(row, aggregates).is_null() != *negated)
            }
            Compiled::Scalar { func, args } => {
                let args: Vec<Value> = args.iter().map(|a| a.eval(row, aggregates)).collect();
                func.call(&args)
            }
        }
    }

    /// Whether the expression holds for a row. NULL counts as false.
    pub fn is_true(&self, row: &[Value], aggregates: &[Value]) -> bool {
        self.eval(row, aggregates).truthiness() == Some(true)
    }
}

fn unary(op: UnaryOp, value: Value) -> Value {
    match (op, value) {
        (_, Value::Null) => Value::Null,
        (UnaryOp::Not, v) => match v.truthiness() {
            Some(b) => Value::from_bool(!b),
            None => Value::Null,
        },
        (UnaryOp::Pos, v) => v,
        (UnaryOp::Neg, v) => match v.as_number() {
            Some(Value::Integer(i)) => i
                .checked_neg()
                .map_or(Value::Real(-(i as f64)), Value::Integer),
            Some(Value::Real(r)) => Value::Real(-r),
            _ => Value::Integer(0),
        },
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }

    let ordering = |test: fn(Ordering) -> bool| match left.compare(&right) {
        Some(o) => Value::from_bool(test(o)),
        None => Value::Null,
    };

    match op {
        BinaryOp::Eq => ordering(|o| o == Ordering::Equal),
        BinaryOp::Ne => ordering(|o| o != Ordering::Equal),
        BinaryOp::Lt => ordering(|o| o == Ordering::Less),
        BinaryOp::Le => ordering(|o| o != Ordering::Greater),
        BinaryOp::Gt => ordering(|o| o == Ordering::Greater),
        BinaryOp::Ge => ordering(|o| o != Ordering::Less),
        BinaryOp::Concat => Value::Text(format!("{}{}", left, right)),
        BinaryOp::And | BinaryOp::Or => Value::Null,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, &left, &right)
        }
    }
}

/// Integer arithmetic while both sides are integers and nothing overflows,
/// real arithmetic otherwise. Text that is not a number counts as 0. Division
/// by zero is NULL.
fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let l = left.as_number().unwrap_or(Value::Integer(0));
    let r = right.as_number().unwrap_or(Value::Integer(0));

    if let (Value::Integer(a), Value::Integer(b)) = (&l, &r) {
        let (a, b) = (*a, *b);
        let exact = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div if b == 0 => return Value::Null,
            BinaryOp::Div => a.checked_div(b),
            BinaryOp::Rem if b == 0 => return Value::Null,
            BinaryOp::Rem => a.checked_rem(b),
            _ => None,
        };
        if let Some(v) = exact {
            return Value::Integer(v);
        }
    }

    let a = l.as_f64().unwrap_or(0.0);
    let b = r.as_f64().unwrap_or(0.0);
    match op {
        BinaryOp::Add => Value::Real(a + b),
        BinaryOp::Sub => Value::Real(a - b),
        BinaryOp::Mul => Value::Real(a * b),
        BinaryOp::Div if b == 0.0 => Value::Null,
        BinaryOp::Div => Value::Real(a / b),
        BinaryOp::Rem => {
            let (a, b) = (a as i64, b as i64);
            if b == 0 {
                Value::Null
            } else {
                Value::Real(a.wrapping_rem(b) as f64)
            }
        }
        _ => Value::Null,
    }
}
