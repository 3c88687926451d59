#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RootFindError {
    #[error("invalid bracket [{lower}, {upper}]")]
    InvalidBracket { lower: f64, upper: f64 },
    #[error("function has the same sign at both ends of the bracket (f(lower)={f_lower}, f(upper)={f_upper})")]
    NoSignChange { f_lower: f64, f_upper: f64 },
    #[error("function is not finite at x={x}")]
    NonFinite { x: f64 },
    #[error("bisection did not reach tolerance after {iterations} iterations")]
    NoConvergence { iterations: usize },
}

/// Bracketed bisection for a root of `f` in `[lower, upper]`.
pub fn bisect<F>(
    f: F,
    lower: f64,
    upper: f64,
    x_tolerance: f64,
    max_iterations: usize,
) -> Result<f64, RootFindError>
where
    F: Fn(f64) -> f64,
{
    if !(lower.is_finite() && upper.is_finite() && lower < upper) {
        return Err(RootFindError::InvalidBracket { lower, upper });
    }

    let evaluate = |x: f64| {
        let value = f(x);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(RootFindError::NonFinite { x })
        }
    };

    let (mut a, mut b) = (lower, upper);
    let mut f_a = evaluate(a)?;
    let f_b = evaluate(b)?;
    if f_a == 0.0 {
        return Ok(a);
    }
    if f_b == 0.0 {
        return Ok(b);
    }
    if f_a.signum() == f_b.signum() {
        return Err(RootFindError::NoSignChange {
            f_lower: f_a,
            f_upper: f_b,
        });
    }

    for _ in 0..max_iterations {
        let midpoint = 0.5 * (a + b);
        let f_mid = evaluate(midpoint)?;
        if f_mid == 0.0 || 0.5 * (b - a) <= x_tolerance {
            return Ok(midpoint);
        }
        if f_mid.signum() == f_a.signum() {
            a = midpoint;
            f_a = f_mid;
        } else {
            b = midpoint;
        }
    }

    Err(RootFindError::NoConvergence {
        iterations: max_iterations,
    })
}
