use super::FlowProceedCondition;
use crate::params::{param_as_i64, param_value};
use crate::{InstanceId, Params, SequenceFlow};
use serde_json::Value;

/// Integer comparison operator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparator {
    pub const ALL: [Comparator; 6] = [
        Comparator::Eq,
        Comparator::Ne,
        Comparator::Gt,
        Comparator::Ge,
        Comparator::Lt,
        Comparator::Le,
    ];

    /// `expected <op> actual`: the declared value is the left operand, so
    /// `Ge(k, 100)` matches any parameter up to and including 100.
    pub fn apply(&self, expected: i64, actual: i64) -> bool {
        match self {
            Self::Eq => expected == actual,
            Self::Ne => expected != actual,
            Self::Gt => expected > actual,
            Self::Ge => expected >= actual,
            Self::Lt => expected < actual,
            Self::Le => expected <= actual,
        }
    }
}

/// Compares a fixed value with an integer parameter, as
/// `expected <op> parameter`.
///
/// A missing parameter, or one that is neither a number nor an integer
/// string, never matches, whatever the operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumericCondition {
    comparator: Comparator,
    key: String,
    expected: i64,
}

impl NumericCondition {
    pub fn new(comparator: Comparator, key: impl Into<String>, expected: i64) -> Self {
        Self {
            comparator,
            key: key.into(),
            expected,
        }
    }

    /// Build from declaration arguments; `expected` must be an integer literal
    pub fn parse(comparator: Comparator, key: &str, expected: &str) -> Result<Self, String> {
        let expected = expected
            .parse::<i64>()
            .map_err(|e| format!("expected value '{expected}' is not an integer: {e}"))?;
        Ok(Self::new(comparator, key, expected))
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }
}

impl FlowProceedCondition for NumericCondition {
    fn is_match(&self, _: &InstanceId, params: Option<&Params>, _: &SequenceFlow) -> bool {
        param_as_i64(params, &self.key)
            .map(|actual| self.comparator.apply(self.expected, actual))
            .unwrap_or(false)
    }
}

/// Matches when the parameter is a string equal to the expected one
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringEqualCondition {
    key: String,
    expected: String,
}

impl StringEqualCondition {
    pub fn new(key: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expected: expected.into(),
        }
    }
}

impl FlowProceedCondition for StringEqualCondition {
    fn is_match(&self, _: &InstanceId, params: Option<&Params>, _: &SequenceFlow) -> bool {
        matches!(param_value(params, &self.key), Some(Value::String(s)) if *s == self.expected)
    }
}

/// Matches when the parameter is present and is not the expected string.
///
/// An absent key does not match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringNotEqualCondition {
    key: String,
    expected: String,
}

impl StringNotEqualCondition {
    pub fn new(key: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expected: expected.into(),
        }
    }
}

impl FlowProceedCondition for StringNotEqualCondition {
    fn is_match(&self, _: &InstanceId, params: Option<&Params>, _: &SequenceFlow) -> bool {
        match param_value(params, &self.key) {
            Some(value) => value.as_str() != Some(self.expected.as_str()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn flow() -> SequenceFlow {
        SequenceFlow::new("s1", "g01", "f50")
    }

    fn check(condition: &dyn FlowProceedCondition, params: Value) -> bool {
        condition.is_match(&InstanceId::new("i-1"), params.as_object(), &flow())
    }

    #[test]
    fn test_eq_against_int_param() {
        let eq = NumericCondition::parse(Comparator::Eq, "intVal", "99999").unwrap();
        assert!(check(&eq, json!({ "intVal": 99999 })));
        assert!(!check(&eq, json!({ "intVal": 99998 })));
        assert!(check(&eq, json!({ "intVal": "99999" })));
        assert!(!check(&eq, json!({ "intVal": [99999] })));
        assert!(!check(&eq, json!({ "intVal": true })));
        assert!(!check(&eq, json!({ "other": 99999 })));
        assert!(!eq.is_match(&InstanceId::new("i-1"), None, &flow()));
    }

    #[test]
    fn test_ge_boundary() {
        let ge = NumericCondition::new(Comparator::Ge, "amount", 100);
        assert!(check(&ge, json!({ "amount": 100 })));
        assert!(check(&ge, json!({ "amount": 99 })));
        assert!(!check(&ge, json!({ "amount": 101 })));
    }

    #[test]
    fn test_declared_value_is_left_operand() {
        let params = json!({ "k": 5 });
        let cases = [
            (Comparator::Gt, 6, true),
            (Comparator::Gt, 5, false),
            (Comparator::Lt, 4, true),
            (Comparator::Lt, 5, false),
            (Comparator::Le, 5, true),
            (Comparator::Le, 6, false),
            (Comparator::Ne, 4, true),
            (Comparator::Ne, 5, false),
        ];
        for (comparator, expected, want) in cases {
            let condition = NumericCondition::new(comparator, "k", expected);
            assert_eq!(
                check(&condition, params.clone()),
                want,
                "{comparator:?}({expected}) against 5"
            );
        }
    }

    #[test]
    fn test_numeric_parse_rejects_non_integer() {
        assert!(NumericCondition::parse(Comparator::Lt, "k", "ten").is_err());
        assert!(NumericCondition::parse(Comparator::Lt, "k", "1.5").is_err());
    }

    #[test]
    fn test_unparsable_string_param_never_matches() {
        for comparator in Comparator::ALL {
            let condition = NumericCondition::new(comparator, "k", 0);
            assert!(!check(&condition, json!({ "k": "zero" })));
        }
    }

    #[test]
    fn test_unsigned_overflow_never_matches() {
        let eq = NumericCondition::new(Comparator::Eq, "k", i64::MAX);
        assert!(!check(&eq, json!({ "k": u64::MAX })));
        assert!(check(&eq, json!({ "k": i64::MAX })));
    }

    #[test]
    fn test_float_param_truncated() {
        let eq = NumericCondition::new(Comparator::Eq, "k", 12);
        assert!(check(&eq, json!({ "k": 12.99 })));
    }

    #[test]
    fn test_string_equal() {
        let eq = StringEqualCondition::new("var", "b");
        assert!(check(&eq, json!({ "var": "b" })));
        assert!(!check(&eq, json!({ "var": "a" })));
        assert!(!check(&eq, json!({ "var": 1 })));
        assert!(!check(&eq, json!({})));
    }

    #[test]
    fn test_string_not_equal_requires_presence() {
        let ne = StringNotEqualCondition::new("var", "b");
        assert!(!check(&ne, json!({})));
        assert!(check(&ne, json!({ "var": "a" })));
        assert!(!check(&ne, json!({ "var": "b" })));
        assert!(!ne.is_match(&InstanceId::new("i-1"), None, &flow()));
    }

    fn comparator_strategy() -> impl Strategy<Value = Comparator> {
        prop::sample::select(Comparator::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_numeric_agrees_with_operator(
            comparator in comparator_strategy(),
            actual in any::<i64>(),
            expected in any::<i64>(),
        ) {
            let condition = NumericCondition::new(comparator, "k", expected);
            let want = match comparator {
                Comparator::Eq => expected == actual,
                Comparator::Ne => expected != actual,
                Comparator::Gt => expected > actual,
                Comparator::Ge => expected >= actual,
                Comparator::Lt => expected < actual,
                Comparator::Le => expected <= actual,
            };
            prop_assert_eq!(check(&condition, json!({ "k": actual })), want);
            prop_assert_eq!(check(&condition, json!({ "k": actual.to_string() })), want);
        }

        #[test]
        fn prop_missing_key_never_matches(
            comparator in comparator_strategy(),
            expected in any::<i64>(),
        ) {
            let condition = NumericCondition::new(comparator, "k", expected);
            let matched = check(&condition, json!({ "other": expected }));
            prop_assert!(!matched);
        }
    }
}
