use hdoc::expression::{BinaryOperator, Expression, TemplatePart, UnaryOperator};

use crate::error::EvalError;
use crate::scope::Scope;
use crate::value::Value;

/// Evaluate an expression against a scope.
pub fn evaluate(expr: &Expression, scope: &Scope<'_>) -> Result<Value, EvalError> {
    match expr {
        // --- Literals ---
        Expression::NumberLiteral(n) => Ok(Value::Number(*n)),
        Expression::StringLiteral(s) => Ok(Value::String(s.clone())),
        Expression::BooleanLiteral(b) => Ok(Value::Boolean(*b)),
        Expression::NullLiteral => Ok(Value::Null),

        Expression::Template(parts) => eval_template(parts, scope),

        Expression::Tuple(items) => {
            let values = items
                .iter()
                .map(|item| evaluate(item, scope))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(values))
        }

        // --- References ---
        Expression::VariableReference(name, _) => scope
            .lookup_variable(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),

        Expression::FunctionCall { name, args, .. } => {
            let function = scope
                .lookup_function(name)
                .ok_or_else(|| EvalError::UndefinedFunction(name.clone()))?;
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            function(args.as_slice())
        }

        Expression::Index {
            collection, key, ..
        } => {
            let collection = evaluate(collection, scope)?;
            let key = evaluate(key, scope)?;
            index(&collection, &key)
        }

        // --- Operations ---
        Expression::UnaryOperation { operator, operand } => {
            let val = evaluate(operand, scope)?;
            match operator {
                UnaryOperator::Negation => Ok(Value::Number(-coerce_number(&val)?)),
                UnaryOperator::LogicalNot => Ok(Value::Boolean(!coerce_bool(&val)?)),
            }
        }

        Expression::BinaryOperation {
            operator,
            left,
            right,
        } => {
            let l = evaluate(left, scope)?;
            // Logical operators short-circuit
            match operator {
                BinaryOperator::LogicalAnd => {
                    if !coerce_bool(&l)? {
                        return Ok(Value::Boolean(false));
                    }
                    let r = evaluate(right, scope)?;
                    return Ok(Value::Boolean(coerce_bool(&r)?));
                }
                BinaryOperator::LogicalOr => {
                    if coerce_bool(&l)? {
                        return Ok(Value::Boolean(true));
                    }
                    let r = evaluate(right, scope)?;
                    return Ok(Value::Boolean(coerce_bool(&r)?));
                }
                _ => {}
            }
            let r = evaluate(right, scope)?;
            eval_binary_op(*operator, &l, &r)
        }

        // --- Control flow ---
        Expression::Conditional {
            condition,
            true_branch,
            false_branch,
        } => {
            let cond = evaluate(condition, scope)?;
            if coerce_bool(&cond)? {
                evaluate(true_branch, scope)
            } else {
                evaluate(false_branch, scope)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn eval_template(parts: &[TemplatePart], scope: &Scope<'_>) -> Result<Value, EvalError> {
    // A template that is exactly one interpolation yields the value unconverted
    if let [TemplatePart::Interpolation(expr)] = parts {
        return evaluate(expr, scope);
    }

    let mut result = String::new();
    for part in parts {
        match part {
            TemplatePart::Literal(s) => result.push_str(s),
            TemplatePart::Interpolation(expr) => match evaluate(expr, scope)? {
                v @ (Value::String(_) | Value::Number(_) | Value::Boolean(_)) => {
                    result.push_str(&v.to_string());
                }
                other => return Err(EvalError::type_error("string", other.type_name())),
            },
        }
    }
    Ok(Value::String(result))
}

fn index(collection: &Value, key: &Value) -> Result<Value, EvalError> {
    let Value::List(items) = collection else {
        return Err(EvalError::type_error("list", collection.type_name()));
    };
    let n = coerce_number(key)?;
    if n < 0.0 || n.fract() != 0.0 || n >= items.len() as f64 {
        return Err(EvalError::IndexOutOfRange {
            index: key.to_string(),
            len: items.len(),
        });
    }
    Ok(items[n as usize].clone())
}

fn coerce_number(val: &Value) -> Result<f64, EvalError> {
    match val {
        Value::Number(n) => Ok(*n),
        other => Err(EvalError::type_error("number", other.type_name())),
    }
}

fn coerce_bool(val: &Value) -> Result<bool, EvalError> {
    match val {
        Value::Boolean(b) => Ok(*b),
        other => Err(EvalError::type_error("bool", other.type_name())),
    }
}

fn eval_binary_op(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOperator::Addition => numeric_binop(left, right, |a, b| a + b),
        BinaryOperator::Subtraction => numeric_binop(left, right, |a, b| a - b),
        BinaryOperator::Multiplication => numeric_binop(left, right, |a, b| a * b),
        BinaryOperator::Division => {
            let a = coerce_number(left)?;
            let b = coerce_number(right)?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Number(a / b))
        }
        BinaryOperator::Modulo => {
            let a = coerce_number(left)?;
            let b = coerce_number(right)?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Number(a % b))
        }
        BinaryOperator::Equality => Ok(Value::Boolean(left == right)),
        BinaryOperator::Inequality => Ok(Value::Boolean(left != right)),
        BinaryOperator::GreaterThan => numeric_cmp(left, right, |a, b| a > b),
        BinaryOperator::LessThan => numeric_cmp(left, right, |a, b| a < b),
        BinaryOperator::GreaterThanOrEqual => numeric_cmp(left, right, |a, b| a >= b),
        BinaryOperator::LessThanOrEqual => numeric_cmp(left, right, |a, b| a <= b),
        BinaryOperator::LogicalAnd => Ok(Value::Boolean(coerce_bool(left)? && coerce_bool(right)?)),
        BinaryOperator::LogicalOr => Ok(Value::Boolean(coerce_bool(left)? || coerce_bool(right)?)),
    }
}

fn numeric_binop(
    left: &Value,
    right: &Value,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let a = coerce_number(left)?;
    let b = coerce_number(right)?;
    Ok(Value::Number(f(a, b)))
}

fn numeric_cmp(
    left: &Value,
    right: &Value,
    f: impl Fn(f64, f64) -> bool,
) -> Result<Value, EvalError> {
    let a = coerce_number(left)?;
    let b = coerce_number(right)?;
    Ok(Value::Boolean(f(a, b)))
}
