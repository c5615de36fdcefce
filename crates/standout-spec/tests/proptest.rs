//! Property-based tests for the specification algebra using proptest.

use proptest::prelude::*;
use standout_spec::{compile, Fields, Number, Param, Specification, Value};

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone)]
struct Member {
    score: i64,
    name: String,
    active: bool,
}

impl Fields for Member {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "score" => Value::Number(Number::I64(self.score)),
            "name" => Value::String(&self.name),
            "active" => Value::Bool(self.active),
            _ => Value::None,
        }
    }
}

fn member_strategy() -> impl Strategy<Value = Member> {
    (-1000i64..1000, "[a-z]{0,6}", any::<bool>()).prop_map(|(score, name, active)| Member {
        score,
        name,
        active,
    })
}

/// Score above a threshold, built from an inspectable field comparison on its
/// own parameter.
fn score_above(threshold: i64) -> Specification<Member> {
    let m = Param::<Member>::new("m");
    Specification::try_new(m.clone(), m.field("score").gt(threshold), "ScoreAbove").unwrap()
}

/// Name containing a fragment, built from a closure.
fn name_contains(fragment: String) -> Specification<Member> {
    Specification::from_fn("NameContains", move |m: &Member| m.name.contains(&fragment))
}

fn is_active() -> Specification<Member> {
    let m = Param::<Member>::new("m");
    Specification::try_new(m.clone(), m.field("active").eq(true), "IsActive").unwrap()
}

fn holds(spec: &Specification<Member>, item: &Member) -> bool {
    spec.evaluate(item).is_ok()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Each binary combinator matches its boolean connective.
    #[test]
    fn combinators_follow_boolean_laws(
        item in member_strategy(),
        threshold in -1000i64..1000,
        fragment in "[a-z]{0,2}",
    ) {
        let a = score_above(threshold);
        let b = name_contains(fragment);
        let (x, y) = (holds(&a, &item), holds(&b, &item));

        prop_assert_eq!(holds(&a.and(&b), &item), x && y);
        prop_assert_eq!(holds(&a.or(&b), &item), x || y);
        prop_assert_eq!(holds(&a.not(), &item), !x);
        prop_assert_eq!(holds(&a.xor(&b), &item), x != y);
        prop_assert_eq!(holds(&a.nand(&b), &item), !(x && y));
        prop_assert_eq!(holds(&a.nor(&b), &item), !(x || y));
    }

    /// Operators agree with the named combinators.
    #[test]
    fn operators_agree_with_methods(
        item in member_strategy(),
        threshold in -1000i64..1000,
    ) {
        let a = score_above(threshold);
        let b = is_active();

        prop_assert_eq!(holds(&(&a & &b), &item), holds(&a.and(&b), &item));
        prop_assert_eq!(holds(&(&a | &b), &item), holds(&a.or(&b), &item));
        prop_assert_eq!(holds(&(&a ^ &b), &item), holds(&a.xor(&b), &item));
        prop_assert_eq!(holds(&!&a, &item), holds(&a.not(), &item));
    }

    /// Double negation keeps the truth value.
    #[test]
    fn double_negation_is_identity(
        item in member_strategy(),
        threshold in -1000i64..1000,
    ) {
        let a = score_above(threshold);
        prop_assert_eq!(holds(&a.not().not(), &item), holds(&a, &item));
    }

    /// De Morgan: not (a and b) == (not a) or (not b).
    #[test]
    fn de_morgan_holds(
        item in member_strategy(),
        threshold in -1000i64..1000,
        fragment in "[a-z]{0,2}",
    ) {
        let a = score_above(threshold);
        let b = name_contains(fragment);
        prop_assert_eq!(
            holds(&a.nand(&b), &item),
            holds(&a.not().or(&b.not()), &item)
        );
    }

    /// Cached evaluation equals direct compilation of the same tree.
    #[test]
    fn caching_is_transparent(
        items in prop::collection::vec(member_strategy(), 0..30),
        threshold in -1000i64..1000,
    ) {
        let spec = score_above(threshold).xor(&is_active());
        let direct = compile(spec.predicate().body());

        for item in &items {
            prop_assert_eq!(spec.evaluate(item).is_ok(), direct(item));
            // Second call goes through the cache hit path.
            prop_assert_eq!(spec.evaluate(item).is_ok(), direct(item));
        }
    }

    /// evaluate_all returns one result per item, in input order.
    #[test]
    fn evaluate_all_preserves_order(
        items in prop::collection::vec(member_strategy(), 0..50),
        threshold in -1000i64..1000,
    ) {
        let spec = score_above(threshold);
        let results = spec.evaluate_all(&items);

        prop_assert_eq!(results.len(), items.len());
        for (item, result) in items.iter().zip(&results) {
            prop_assert_eq!(result.is_ok(), item.score > threshold);
        }
    }

    /// Evaluation is deterministic.
    #[test]
    fn evaluation_is_repeatable(
        item in member_strategy(),
        threshold in -1000i64..1000,
    ) {
        let spec = score_above(threshold).or(&is_active());
        let first = spec.evaluate(&item);
        for _ in 0..3 {
            prop_assert_eq!(spec.evaluate(&item), first);
        }
    }
}
