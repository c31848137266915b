//! Scalar fields sampled by the tracer and the fill resolver.

use std::collections::HashMap;
use std::fmt;

use meval::{Context, ContextProvider, Expr};

/// A scalar function of plot coordinates. `NaN` marks an undefined value.
pub trait ScalarField {
    fn value_at(&self, x: f64, y: f64) -> f64;
}

impl<F> ScalarField for F
where
    F: Fn(f64, f64) -> f64,
{
    fn value_at(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum FieldError {
    #[error("expression `{source_text}` could not be parsed: {message}")]
    Parse {
        source_text: String,
        message: String,
    },
    #[error("expression `{source_text}` could not be evaluated: {message}")]
    Evaluate {
        source_text: String,
        message: String,
    },
}

/// A field given as a text expression in `x` and `y`.
///
/// Besides the built-in functions the expression may call `clamp`, `lerp`,
/// `deg`, `rad`, `frac`, `mod`, `sign` and `sgn`. Evaluation errors and
/// non-finite results read as `NaN`.
pub struct ExpressionField {
    source: String,
    expr: Expr,
    context: Context<'static>,
}

impl ExpressionField {
    pub fn parse(source: &str) -> Result<Self, FieldError> {
        let normalized = normalize_expression(source);
        if normalized.is_empty() {
            return Err(FieldError::Parse {
                source_text: source.to_owned(),
                message: "empty expression".to_owned(),
            });
        }

        let expr: Expr = normalized.parse().map_err(|error: meval::Error| FieldError::Parse {
            source_text: source.to_owned(),
            message: error.to_string(),
        })?;

        let field = Self {
            source: source.to_owned(),
            expr,
            context: build_context(),
        };

        // Unknown names only surface on evaluation.
        field
            .try_value_at(0.0, 0.0)
            .map_err(|message| FieldError::Evaluate {
                source_text: source.to_owned(),
                message,
            })?;

        Ok(field)
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    fn try_value_at(&self, x: f64, y: f64) -> Result<f64, String> {
        let vars = PointContext::new(x, y);
        self.expr
            .eval_with_context((&vars, &self.context))
            .map_err(|error| error.to_string())
    }
}

impl ScalarField for ExpressionField {
    fn value_at(&self, x: f64, y: f64) -> f64 {
        match self.try_value_at(x, y) {
            Ok(value) if value.is_finite() => value,
            _ => f64::NAN,
        }
    }
}

impl fmt::Debug for ExpressionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionField")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

struct PointContext {
    mapping: HashMap<&'static str, f64>,
}

impl PointContext {
    fn new(x: f64, y: f64) -> Self {
        let mapping = HashMap::from([("x", x), ("X", x), ("y", y), ("Y", y)]);
        Self { mapping }
    }
}

impl ContextProvider for PointContext {
    fn get_var(&self, name: &str) -> Option<f64> {
        self.mapping.get(name).copied()
    }
}

fn normalize_expression(source: &str) -> String {
    let mut normalized = source.trim().replace("**", "^");
    while normalized.ends_with(';') {
        normalized.pop();
        normalized = normalized.trim_end().to_owned();
    }
    normalized
}

fn build_context() -> Context<'static> {
    let mut context = Context::new();
    context.func3("clamp", clamp);
    context.func3("lerp", |a, b, t| a + (b - a) * t);
    context.func("deg", f64::to_degrees);
    context.func("rad", f64::to_radians);
    context.func("frac", f64::fract);
    context.func2("mod", modulo);
    context.func("sign", f64::signum);
    context.func("sgn", f64::signum);
    context
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    let lower = min.min(max);
    let upper = min.max(max);
    value.max(lower).min(upper)
}

/// Remainder with the divisor's sign; `NaN` for a zero divisor.
fn modulo(dividend: f64, divisor: f64) -> f64 {
    if divisor == 0.0 {
        return f64::NAN;
    }
    let remainder = dividend % divisor;
    if remainder != 0.0 && (remainder < 0.0) != (divisor < 0.0) {
        remainder + divisor
    } else {
        remainder
    }
}
