// ragwatch-core/src/domain/rules/eval.rs

use std::cmp::Ordering;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::domain::entity::JobRun;
use crate::domain::rules::ast::{BinaryOp, CallArg, Expr, Method, Property, RunField, UnaryOp};
use crate::domain::rules::error::EvalError;

#[derive(Debug, Clone)]
enum Value<'a> {
    Bool(bool),
    Int(i64),
    Str(String),
    Time(NaiveDateTime),
    Run(&'a JobRun),
    Runs(Vec<&'a JobRun>),
}

impl Value<'_> {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Time(_) => "date-time",
            Value::Run(_) => "run",
            Value::Runs(_) => "run sequence",
        }
    }
}

fn mismatch(operation: impl Into<String>, operands: &[&Value<'_>]) -> EvalError {
    let found = operands
        .iter()
        .map(|v| v.type_name())
        .collect::<Vec<_>>()
        .join(" and ");
    EvalError::TypeMismatch {
        operation: operation.into(),
        found,
    }
}

/// Runs a compiled expression against one entity's runs and requires a
/// boolean result.
pub fn evaluate_predicate(
    expr: &Expr,
    runs: &[JobRun],
    reference: NaiveDateTime,
) -> Result<bool, EvalError> {
    let mut scope = Scope {
        runs,
        reference,
        params: Vec::new(),
    };
    match scope.eval(expr)? {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::NotBoolean(other.type_name().to_string())),
    }
}

struct Scope<'a> {
    runs: &'a [JobRun],
    reference: NaiveDateTime,
    params: Vec<&'a JobRun>,
}

impl<'a> Scope<'a> {
    fn eval(&mut self, expr: &Expr) -> Result<Value<'a>, EvalError> {
        match expr {
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Runs => Ok(Value::Runs(self.runs.iter().collect())),
            Expr::Reference => Ok(Value::Time(self.reference)),
            Expr::Param(depth) => self
                .params
                .get(*depth)
                .copied()
                .map(Value::Run)
                .ok_or_else(|| EvalError::OutOfRange(format!("lambda parameter #{}", depth))),
            Expr::Unary(op, operand) => {
                let value = self.eval(operand)?;
                match (op, value) {
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOp::Neg, Value::Int(i)) => Ok(Value::Int(i.saturating_neg())),
                    (UnaryOp::Not, other) => Err(mismatch("'!'", &[&other])),
                    (UnaryOp::Neg, other) => Err(mismatch("unary '-'", &[&other])),
                }
            }
            Expr::Binary(BinaryOp::And, left, right) => {
                if !self.eval_bool(left, "'&&'")? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval_bool(right, "'&&'")?))
            }
            Expr::Binary(BinaryOp::Or, left, right) => {
                if self.eval_bool(left, "'||'")? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval_bool(right, "'||'")?))
            }
            Expr::Binary(op, left, right) => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                binary(*op, l, r)
            }
            Expr::Property(target, property) => {
                let value = self.eval(target)?;
                property_of(value, *property)
            }
            Expr::Call(target, method, arg) => {
                let value = self.eval(target)?;
                self.call(value, *method, arg.as_ref())
            }
        }
    }

    fn eval_bool(&mut self, expr: &Expr, operation: &str) -> Result<bool, EvalError> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(operation, &[&other])),
        }
    }

    fn apply(&mut self, body: &Expr, run: &'a JobRun) -> Result<Value<'a>, EvalError> {
        self.params.push(run);
        let result = self.eval(body);
        self.params.pop();
        result
    }

    fn test(&mut self, body: &Expr, run: &'a JobRun, method: Method) -> Result<bool, EvalError> {
        match self.apply(body, run)? {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(format!("{}() predicate", method.name()), &[&other])),
        }
    }

    fn call(
        &mut self,
        target: Value<'a>,
        method: Method,
        arg: Option<&CallArg>,
    ) -> Result<Value<'a>, EvalError> {
        let (lambda, value_arg) = match arg {
            Some(CallArg::Lambda(body)) => (Some(body.as_ref()), None),
            Some(CallArg::Value(expr)) => (None, Some(self.eval(expr)?)),
            None => (None, None),
        };

        match (target, value_arg) {
            (Value::Runs(runs), value_arg) => self.call_sequence(runs, method, lambda, value_arg),
            (Value::Str(s), value_arg) => call_string(s, method, value_arg),
            (Value::Time(t), value_arg) => call_time(t, method, value_arg),
            (other, _) => Err(mismatch(format!("{}()", method.name()), &[&other])),
        }
    }

    fn call_sequence(
        &mut self,
        runs: Vec<&'a JobRun>,
        method: Method,
        lambda: Option<&Expr>,
        value_arg: Option<Value<'a>>,
    ) -> Result<Value<'a>, EvalError> {
        match (method, lambda) {
            (Method::Any, None) => Ok(Value::Bool(!runs.is_empty())),
            (Method::Any, Some(body)) => {
                for run in runs {
                    if self.test(body, run, method)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            (Method::All, Some(body)) => {
                for run in runs {
                    if !self.test(body, run, method)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            (Method::Count, body) => {
                let matching = self.filter(runs, body, method)?;
                Ok(Value::Int(saturating_i64(matching.len() as u64)))
            }
            (Method::First, body) => self
                .filter(runs, body, method)?
                .first()
                .copied()
                .map(Value::Run)
                .ok_or(EvalError::EmptySequence("first")),
            (Method::Last, body) => self
                .filter(runs, body, method)?
                .last()
                .copied()
                .map(Value::Run)
                .ok_or(EvalError::EmptySequence("last")),
            (Method::Where, body @ Some(_)) => Ok(Value::Runs(self.filter(runs, body, method)?)),
            (Method::Skip | Method::Take, _) => {
                let n = match value_arg {
                    Some(Value::Int(n)) => usize::try_from(n.max(0)).unwrap_or(usize::MAX),
                    Some(other) => {
                        return Err(mismatch(format!("{}()", method.name()), &[&other]));
                    }
                    None => 0,
                };
                let n = n.min(runs.len());
                Ok(Value::Runs(if method == Method::Skip {
                    runs[n..].to_vec()
                } else {
                    runs[..n].to_vec()
                }))
            }
            (Method::OrderBy | Method::OrderByDescending, Some(body)) => {
                let mut keyed = Vec::with_capacity(runs.len());
                for run in runs {
                    keyed.push((self.apply(body, run)?, run));
                }
                let descending = method == Method::OrderByDescending;
                let mut failure = None;
                keyed.sort_by(|(a, _), (b, _)| {
                    let ordered = if descending { compare(b, a) } else { compare(a, b) };
                    ordered.unwrap_or_else(|err| {
                        failure.get_or_insert(err);
                        Ordering::Equal
                    })
                });
                if let Some(err) = failure {
                    return Err(err);
                }
                Ok(Value::Runs(keyed.into_iter().map(|(_, run)| run).collect()))
            }
            (Method::Sum, Some(body)) => {
                let mut total: i64 = 0;
                for run in runs {
                    match self.apply(body, run)? {
                        Value::Int(i) => total = total.saturating_add(i),
                        other => return Err(mismatch("sum()", &[&other])),
                    }
                }
                Ok(Value::Int(total))
            }
            (Method::Max | Method::Min, Some(body)) => {
                let mut best: Option<Value<'a>> = None;
                for run in runs {
                    let candidate = self.apply(body, run)?;
                    best = Some(match best {
                        None => candidate,
                        Some(current) => {
                            let ord = compare(&candidate, &current)?;
                            let better = if method == Method::Max {
                                ord == Ordering::Greater
                            } else {
                                ord == Ordering::Less
                            };
                            if better { candidate } else { current }
                        }
                    });
                }
                best.ok_or(EvalError::EmptySequence(method.name()))
            }
            (method, _) => Err(EvalError::TypeMismatch {
                operation: format!("{}()", method.name()),
                found: "run sequence".to_string(),
            }),
        }
    }

    fn filter(
        &mut self,
        runs: Vec<&'a JobRun>,
        body: Option<&Expr>,
        method: Method,
    ) -> Result<Vec<&'a JobRun>, EvalError> {
        let Some(body) = body else {
            return Ok(runs);
        };
        let mut kept = Vec::new();
        for run in runs {
            if self.test(body, run, method)? {
                kept.push(run);
            }
        }
        Ok(kept)
    }
}

fn call_string<'a>(
    s: String,
    method: Method,
    arg: Option<Value<'a>>,
) -> Result<Value<'a>, EvalError> {
    match (method, arg) {
        (Method::ToLower, None) => Ok(Value::Str(s.to_lowercase())),
        (Method::ToUpper, None) => Ok(Value::Str(s.to_uppercase())),
        (Method::Trim, None) => Ok(Value::Str(s.trim().to_string())),
        (Method::EqualsIgnoreCase, Some(Value::Str(other))) => {
            Ok(Value::Bool(s.to_lowercase() == other.to_lowercase()))
        }
        (Method::Contains, Some(Value::Str(other))) => Ok(Value::Bool(s.contains(&other))),
        (Method::StartsWith, Some(Value::Str(other))) => Ok(Value::Bool(s.starts_with(&other))),
        (Method::EndsWith, Some(Value::Str(other))) => Ok(Value::Bool(s.ends_with(&other))),
        (method, Some(other)) => Err(mismatch(
            format!("{}()", method.name()),
            &[&Value::Str(s), &other],
        )),
        (method, None) => Err(mismatch(format!("{}()", method.name()), &[&Value::Str(s)])),
    }
}

fn call_time<'a>(
    t: NaiveDateTime,
    method: Method,
    arg: Option<Value<'a>>,
) -> Result<Value<'a>, EvalError> {
    let amount = match (method, arg) {
        (Method::AddHours | Method::AddMinutes | Method::AddDays, Some(Value::Int(n))) => n,
        (method, Some(other)) => {
            return Err(mismatch(
                format!("{}()", method.name()),
                &[&Value::Time(t), &other],
            ));
        }
        (method, None) => return Err(mismatch(format!("{}()", method.name()), &[&Value::Time(t)])),
    };

    let delta = match method {
        Method::AddHours => TimeDelta::try_hours(amount),
        Method::AddMinutes => TimeDelta::try_minutes(amount),
        _ => TimeDelta::try_days(amount),
    };
    delta
        .and_then(|d| t.checked_add_signed(d))
        .map(Value::Time)
        .ok_or_else(|| EvalError::OutOfRange(format!("{}({})", method.name(), amount)))
}

fn property_of(value: Value<'_>, property: Property) -> Result<Value<'_>, EvalError> {
    match (value, property) {
        (Value::Run(run), Property::Field(field)) => Ok(match field {
            RunField::BusinessEntity => Value::Str(run.business_entity.clone()),
            RunField::JobStart => Value::Time(run.job_start),
            RunField::JobEnd => Value::Time(run.job_end),
            RunField::JobStatus => Value::Str(run.job_status.clone()),
            RunField::QualityStatus => Value::Str(run.quality_status.clone()),
            RunField::RecordAsOfDate => Value::Time(run.record_as_of_date.and_time(NaiveTime::MIN)),
            RunField::RecordLoaded => Value::Int(saturating_i64(run.record_loaded)),
            RunField::RecordFailed => Value::Int(saturating_i64(run.record_failed)),
            RunField::Message => Value::Str(run.message.clone().unwrap_or_default()),
        }),
        // Date-typed fields double as date-times, so `r.asOf.date` reads naturally.
        (Value::Time(t), Property::Date) => Ok(Value::Time(t.date().and_time(NaiveTime::MIN))),
        (Value::Time(t), Property::Hour) => Ok(Value::Int(i64::from(t.hour()))),
        (Value::Str(s), Property::Length) => Ok(Value::Int(saturating_i64(s.chars().count() as u64))),
        (Value::Runs(runs), Property::Length) => Ok(Value::Int(saturating_i64(runs.len() as u64))),
        (other, property) => Err(mismatch(format!("property {:?}", property), &[&other])),
    }
}

fn binary<'a>(op: BinaryOp, l: Value<'a>, r: Value<'a>) -> Result<Value<'a>, EvalError> {
    match op {
        BinaryOp::Eq => equals(&l, &r, op).map(Value::Bool),
        BinaryOp::Ne => equals(&l, &r, op).map(|eq| Value::Bool(!eq)),
        BinaryOp::Lt => Ok(Value::Bool(compare(&l, &r)? == Ordering::Less)),
        BinaryOp::Le => Ok(Value::Bool(compare(&l, &r)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(compare(&l, &r)? == Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(compare(&l, &r)? != Ordering::Less)),
        BinaryOp::Add => match (l, r) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.saturating_add(b))),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (l, r) => Err(mismatch("'+'", &[&l, &r])),
        },
        BinaryOp::Sub => match (l, r) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.saturating_sub(b))),
            (l, r) => Err(mismatch("'-'", &[&l, &r])),
        },
        BinaryOp::And | BinaryOp::Or => Err(mismatch(op.symbol(), &[&l, &r])),
    }
}

fn equals(l: &Value<'_>, r: &Value<'_>, op: BinaryOp) -> Result<bool, EvalError> {
    match (l, r) {
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Time(a), Value::Time(b)) => Ok(a == b),
        (Value::Run(a), Value::Run(b)) => Ok(std::ptr::eq(*a, *b)),
        _ => Err(mismatch(format!("'{}'", op.symbol()), &[l, r])),
    }
}

fn compare(l: &Value<'_>, r: &Value<'_>) -> Result<Ordering, EvalError> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Ok(a.cmp(b)),
        _ => Err(mismatch("ordering", &[l, r])),
    }
}

fn saturating_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
