//! Strategy loader: turns declarations into live condition strategies
//!
//! A [`StrategyRegistry`] maps a name to one constructor per arity. The
//! constructors are plain function pointers that receive the declaration's
//! arguments as strings and validate them. Resolution happens once, while a
//! definition is compiled.

use crate::declaration::Declaration;
use std::collections::HashMap;
use std::sync::Arc;
use workflow_types::condition::{
    AllCompletionCondition, Comparator, CompletionCondition, FlowProceedCondition,
    NumericCondition, OrCompletionCondition, SingleCompletionCondition, StringEqualCondition,
    StringNotEqualCondition,
};
use workflow_types::{WorkflowError, WorkflowResult};

/// Output of a constructor: the strategy or why it could not be built
pub type Constructed<S> = Result<Arc<S>, String>;

/// A typed constructor, selected by argument count
pub enum Constructor<S: ?Sized> {
    Nullary(fn() -> Constructed<S>),
    Unary(fn(&str) -> Constructed<S>),
    Binary(fn(&str, &str) -> Constructed<S>),
    Ternary(fn(&str, &str, &str) -> Constructed<S>),
}

impl<S: ?Sized> Constructor<S> {
    pub fn arity(&self) -> usize {
        match self {
            Self::Nullary(_) => 0,
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
            Self::Ternary(_) => 3,
        }
    }

    fn invoke(&self, args: &[String]) -> Constructed<S> {
        match (self, args) {
            (Self::Nullary(f), []) => f(),
            (Self::Unary(f), [a]) => f(a),
            (Self::Binary(f), [a, b]) => f(a, b),
            (Self::Ternary(f), [a, b, c]) => f(a, b, c),
            _ => Err(format!(
                "constructor takes {} argument(s), got {}",
                self.arity(),
                args.len()
            )),
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Named constructors for one strategy family
pub struct StrategyRegistry<S: ?Sized> {
    constructors: HashMap<String, Vec<Constructor<S>>>,
}

impl<S: ?Sized> StrategyRegistry<S> {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor, replacing any with the same name and arity
    pub fn register(&mut self, name: impl Into<String>, constructor: Constructor<S>) {
        let entry = self.constructors.entry(name.into()).or_default();
        entry.retain(|c| c.arity() != constructor.arity());
        entry.push(constructor);
    }

    pub fn with(mut self, name: impl Into<String>, constructor: Constructor<S>) -> Self {
        self.register(name, constructor);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Build the strategy a declaration names
    pub fn resolve(&self, declaration: &str) -> WorkflowResult<Arc<S>> {
        let parsed = Declaration::parse(declaration)?;
        let failed = |reason: String| WorkflowError::StrategyCreation {
            declaration: declaration.trim().to_string(),
            reason,
        };

        let candidates = self
            .constructors
            .get(&parsed.name)
            .ok_or_else(|| failed(format!("no strategy registered as '{}'", parsed.name)))?;
        let constructor = candidates
            .iter()
            .find(|c| c.arity() == parsed.arity())
            .ok_or_else(|| {
                failed(format!(
                    "'{}' has no constructor taking {} argument(s)",
                    parsed.name,
                    parsed.arity()
                ))
            })?;

        constructor.invoke(parsed.arg_slice()).map_err(failed)
    }
}

impl<S: ?Sized> Default for StrategyRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> std::fmt::Debug for StrategyRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("StrategyRegistry")
            .field("names", &names)
            .finish()
    }
}

// ── Loader ───────────────────────────────────────────────────────────

/// Both strategy families used by definitions
#[derive(Debug, Default)]
pub struct StrategyLoader {
    proceed: StrategyRegistry<dyn FlowProceedCondition>,
    completion: StrategyRegistry<dyn CompletionCondition>,
}

impl StrategyLoader {
    /// A loader with nothing registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// A loader with the built-in comparators and completion rules
    pub fn with_builtins() -> Self {
        let proceed = StrategyRegistry::<dyn FlowProceedCondition>::new()
            .with("proceed.Eq", Constructor::Binary(|k, v| numeric(Comparator::Eq, k, v)))
            .with("proceed.Ne", Constructor::Binary(|k, v| numeric(Comparator::Ne, k, v)))
            .with("proceed.Gt", Constructor::Binary(|k, v| numeric(Comparator::Gt, k, v)))
            .with("proceed.Ge", Constructor::Binary(|k, v| numeric(Comparator::Ge, k, v)))
            .with("proceed.Lt", Constructor::Binary(|k, v| numeric(Comparator::Lt, k, v)))
            .with("proceed.Le", Constructor::Binary(|k, v| numeric(Comparator::Le, k, v)))
            .with("proceed.StringEqual", Constructor::Binary(string_equal))
            .with("proceed.StringNotEqual", Constructor::Binary(string_not_equal));

        let completion = StrategyRegistry::<dyn CompletionCondition>::new()
            .with("completion.Single", Constructor::Nullary(single))
            .with("completion.All", Constructor::Nullary(all))
            .with("completion.Or", Constructor::Unary(or));

        Self {
            proceed,
            completion,
        }
    }

    pub fn register_proceed(
        &mut self,
        name: impl Into<String>,
        constructor: Constructor<dyn FlowProceedCondition>,
    ) {
        self.proceed.register(name, constructor);
    }

    pub fn register_completion(
        &mut self,
        name: impl Into<String>,
        constructor: Constructor<dyn CompletionCondition>,
    ) {
        self.completion.register(name, constructor);
    }

    pub fn proceed_condition(
        &self,
        declaration: &str,
    ) -> WorkflowResult<Arc<dyn FlowProceedCondition>> {
        self.proceed.resolve(declaration)
    }

    pub fn completion_condition(
        &self,
        declaration: &str,
    ) -> WorkflowResult<Arc<dyn CompletionCondition>> {
        self.completion.resolve(declaration)
    }
}

fn numeric(
    comparator: Comparator,
    key: &str,
    expected: &str,
) -> Constructed<dyn FlowProceedCondition> {
    Ok(Arc::new(NumericCondition::parse(comparator, key, expected)?))
}

fn string_equal(key: &str, expected: &str) -> Constructed<dyn FlowProceedCondition> {
    Ok(Arc::new(StringEqualCondition::new(key, expected)))
}

fn string_not_equal(key: &str, expected: &str) -> Constructed<dyn FlowProceedCondition> {
    Ok(Arc::new(StringNotEqualCondition::new(key, expected)))
}

fn single() -> Constructed<dyn CompletionCondition> {
    Ok(Arc::new(SingleCompletionCondition))
}

fn all() -> Constructed<dyn CompletionCondition> {
    Ok(Arc::new(AllCompletionCondition))
}

fn or(threshold: &str) -> Constructed<dyn CompletionCondition> {
    Ok(Arc::new(OrCompletionCondition::parse(threshold)?))
}
