//! Boolean combinators over child conditions.
//!
//! `and`/`or` short circuit, so stateful children after the deciding child
//! are not checked for that message.

// Local crates
use crate::{condition::condition::Condition, types::message::Message};

/// Inverts its child
#[derive(Debug)]
pub struct NotCondition {
    child: Box<dyn Condition>,
}

impl NotCondition {
    /// Wrap a child condition
    pub fn new(child: Box<dyn Condition>) -> Self {
        Self { child }
    }
}

impl Condition for NotCondition {
    fn check(&self, msg: &Message) -> bool {
        !self.child.check(msg)
    }
}

/// True when every child is true, an empty list is true
#[derive(Debug)]
pub struct AndCondition {
    children: Vec<Box<dyn Condition>>,
}

impl AndCondition {
    /// Combine child conditions
    pub fn new(children: Vec<Box<dyn Condition>>) -> Self {
        Self { children }
    }
}

impl Condition for AndCondition {
    fn check(&self, msg: &Message) -> bool {
        self.children.iter().all(|c| c.check(msg))
    }
}

/// True when any child is true, an empty list is false
#[derive(Debug)]
pub struct OrCondition {
    children: Vec<Box<dyn Condition>>,
}

impl OrCondition {
    /// Combine child conditions
    pub fn new(children: Vec<Box<dyn Condition>>) -> Self {
        Self { children }
    }
}

impl Condition for OrCondition {
    fn check(&self, msg: &Message) -> bool {
        self.children.iter().any(|c| c.check(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::constant::{StaticCondition, StaticConfig};

    fn fixed(value: bool) -> Box<dyn Condition> {
        Box::new(StaticCondition::new(&StaticConfig { value }))
    }

    #[test]
    fn test_not() {
        let msg = Message::from("foo");
        assert!(NotCondition::new(fixed(false)).check(&msg));
        assert!(!NotCondition::new(fixed(true)).check(&msg));
    }

    #[test]
    fn test_and_or() {
        let msg = Message::from("foo");

        assert!(AndCondition::new(vec![fixed(true), fixed(true)]).check(&msg));
        assert!(!AndCondition::new(vec![fixed(true), fixed(false)]).check(&msg));
        assert!(OrCondition::new(vec![fixed(false), fixed(true)]).check(&msg));
        assert!(!OrCondition::new(vec![fixed(false), fixed(false)]).check(&msg));
    }

    #[test]
    fn test_empty_children() {
        let msg = Message::from("foo");
        assert!(AndCondition::new(Vec::new()).check(&msg));
        assert!(!OrCondition::new(Vec::new()).check(&msg));
    }
}
