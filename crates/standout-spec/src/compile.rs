//! Lowering of expression trees to directly callable closures.
//!
//! Each node becomes one closure that calls its children's closures, so the
//! tree is walked once at compile time instead of on every evaluation. `And`
//! and `Or` short-circuit.

use std::sync::Arc;

use crate::expr::Expr;

/// A compiled predicate.
pub type Evaluator<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Compiles `expr` into an [`Evaluator`].
///
/// This is the uncached path; [`EvaluatorCache`](crate::EvaluatorCache)
/// memoizes its output.
pub fn compile<T: 'static>(expr: &Expr<T>) -> Evaluator<T> {
    match expr {
        Expr::Const(value) => {
            let value = *value;
            Arc::new(move |_: &T| value)
        }
        Expr::Compare {
            condition,
            accessor,
            ..
        } => {
            let condition = Arc::clone(condition);
            let accessor = *accessor;
            Arc::new(move |item: &T| condition.matches(&accessor(item, &condition.field)))
        }
        Expr::Test { test, .. } => Arc::clone(test),
        Expr::Not(inner) => {
            let inner = compile(inner);
            Arc::new(move |item: &T| !inner(item))
        }
        Expr::And(l, r) => {
            let (l, r) = (compile(l), compile(r));
            Arc::new(move |item: &T| l(item) && r(item))
        }
        Expr::Or(l, r) => {
            let (l, r) = (compile(l), compile(r));
            Arc::new(move |item: &T| l(item) || r(item))
        }
        Expr::Xor(l, r) => {
            let (l, r) = (compile(l), compile(r));
            Arc::new(move |item: &T| l(item) != r(item))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::param::Param;
    use crate::value::{Number, Value};

    struct Reading {
        celsius: i64,
        label: String,
    }

    fn accessor<'a>(r: &'a Reading, field: &str) -> Value<'a> {
        match field {
            "celsius" => Value::Number(Number::I64(r.celsius)),
            "label" => Value::String(&r.label),
            _ => Value::None,
        }
    }

    fn reading(celsius: i64, label: &str) -> Reading {
        Reading {
            celsius,
            label: label.to_string(),
        }
    }

    #[test]
    fn compiles_leaves() {
        let p = Param::<Reading>::new("r");
        let hot = compile(&p.field_with("celsius", accessor).gt(30));
        let lab = compile(&p.field_with("label", accessor).starts_with("lab"));

        assert!(hot(&reading(31, "x")));
        assert!(!hot(&reading(30, "x")));
        assert!(lab(&reading(0, "lab-2")));
        assert!(!lab(&reading(0, "field")));
        assert!(compile::<Reading>(&Expr::constant(true))(&reading(0, "")));
    }

    #[test]
    fn compiles_connectives() {
        let p = Param::<Reading>::new("r");
        let hot = || p.field_with("celsius", accessor).gt(30);
        let lab = || p.field_with("label", accessor).eq("lab");

        let and = compile(&(hot() & lab()));
        let or = compile(&(hot() | lab()));
        let xor = compile(&(hot() ^ lab()));
        let not = compile(&!hot());

        let cases = [
            (reading(40, "lab"), [true, true, false, false]),
            (reading(40, "out"), [false, true, true, false]),
            (reading(10, "lab"), [false, true, true, true]),
            (reading(10, "out"), [false, false, false, true]),
        ];
        for (item, [want_and, want_or, want_xor, want_not]) in cases {
            assert_eq!(and(&item), want_and);
            assert_eq!(or(&item), want_or);
            assert_eq!(xor(&item), want_xor);
            assert_eq!(not(&item), want_not);
        }
    }

    #[test]
    fn and_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);

        let p = Param::<Reading>::new("r");
        let expr = Expr::and(
            Expr::constant(false),
            p.test("counted", move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
                true
            }),
        );

        let eval = compile(&expr);
        assert!(!eval(&reading(0, "")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
