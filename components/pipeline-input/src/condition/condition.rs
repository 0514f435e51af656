// Local crates
use crate::{
    condition::{
        constant::{StaticCondition, StaticConfig},
        content::{ContentCondition, ContentConfig},
        count::{CountCondition, CountConfig},
        logical::{AndCondition, NotCondition, OrCondition},
    },
    error::ConditionError,
    types::message::Message,
};

// External crates
use serde::{Deserialize, Serialize};
use std::fmt;

/// A predicate over a message. Implementations may keep state (e.g. count
/// messages) through interior mutability, `check` is called once per message
/// read from an input.
pub trait Condition: Send + Sync + fmt::Debug {
    /// Returns whether the message satisfies the condition
    fn check(&self, msg: &Message) -> bool;
}

/// Condition configuration, selected by its `type` field.
///
/// ```toml
/// [input.condition]
/// type = "content"
/// operator = "equals"
/// arg = "bar"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionConfig {
    /// Compare the content of a message part
    Content(ContentConfig),
    /// Fire on every Nth message
    Count(CountConfig),
    /// Always return a fixed value
    Static(StaticConfig),
    /// Invert a child condition
    Not {
        /// The condition to invert
        condition: Box<ConditionConfig>,
    },
    /// True when every child is true
    And {
        /// Child conditions, evaluated in order
        #[serde(default)]
        conditions: Vec<ConditionConfig>,
    },
    /// True when any child is true
    Or {
        /// Child conditions, evaluated in order
        #[serde(default)]
        conditions: Vec<ConditionConfig>,
    },
}

impl ConditionConfig {
    /// Type name as written in configuration
    pub fn kind(&self) -> &'static str {
        match self {
            ConditionConfig::Content(_) => "content",
            ConditionConfig::Count(_) => "count",
            ConditionConfig::Static(_) => "static",
            ConditionConfig::Not { .. } => "not",
            ConditionConfig::And { .. } => "and",
            ConditionConfig::Or { .. } => "or",
        }
    }
}

/// Construct a condition from its configuration
pub fn new_condition(conf: &ConditionConfig) -> Result<Box<dyn Condition>, ConditionError> {
    let cond: Box<dyn Condition> = match conf {
        ConditionConfig::Content(c) => Box::new(ContentCondition::new(c)?),
        ConditionConfig::Count(c) => Box::new(CountCondition::new(c)),
        ConditionConfig::Static(c) => Box::new(StaticCondition::new(c)),
        ConditionConfig::Not { condition } => Box::new(NotCondition::new(new_child(condition)?)),
        ConditionConfig::And { conditions } => Box::new(AndCondition::new(new_children(conditions)?)),
        ConditionConfig::Or { conditions } => Box::new(OrCondition::new(new_children(conditions)?)),
    };
    Ok(cond)
}

fn new_child(conf: &ConditionConfig) -> Result<Box<dyn Condition>, ConditionError> {
    new_condition(conf).map_err(|e| ConditionError::Child {
        kind: conf.kind(),
        source: Box::new(e),
    })
}

fn new_children(confs: &[ConditionConfig]) -> Result<Vec<Box<dyn Condition>>, ConditionError> {
    confs.iter().map(new_child).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_config() {
        let conf: ConditionConfig = toml::from_str(
            r#"
            type = "content"
            operator = "equals"
            arg = "bar"
            "#,
        )
        .unwrap();

        assert_eq!(conf.kind(), "content");
        let cond = new_condition(&conf).unwrap();
        assert!(cond.check(&Message::from("BAR")));
        assert!(!cond.check(&Message::from("foo")));
    }

    #[test]
    fn test_parse_nested_config() {
        let conf: ConditionConfig = toml::from_str(
            r#"
            type = "or"

            [[conditions]]
            type = "static"
            value = false

            [[conditions]]
            type = "not"
            condition = { type = "content", operator = "prefix_cs", arg = "foo" }
            "#,
        )
        .unwrap();

        let cond = new_condition(&conf).unwrap();
        assert!(cond.check(&Message::from("bar")));
        assert!(!cond.check(&Message::from("foobar")));
    }

    #[test]
    fn test_child_error_is_wrapped() {
        let conf = ConditionConfig::Not {
            condition: Box::new(ConditionConfig::Content(ContentConfig {
                operator: "nope".into(),
                part: 0,
                arg: String::new(),
            })),
        };

        match new_condition(&conf).unwrap_err() {
            ConditionError::Child { kind, source } => {
                assert_eq!(kind, "content");
                assert!(matches!(*source, ConditionError::UnknownOperator(ref op) if op == "nope"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
