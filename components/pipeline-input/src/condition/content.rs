//! `content` condition: compares the raw content of one message part against
//! an argument using a configurable operator.
//!
//! Operators ending in `_cs` are case sensitive and compare bytes directly,
//! the others lowercase both sides first.

// Local crates
use crate::{condition::condition::Condition, error::ConditionError, types::message::Message};

// External crates
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

/// Configuration of the `content` condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentConfig {
    /// One of `equals_cs`, `equals`, `contains_cs`, `contains`, `prefix_cs`,
    /// `prefix`, `suffix_cs`, `suffix`, `regexp_partial`, `regexp_exact`
    #[serde(default = "default_operator")]
    pub operator: String,
    /// Index of the part to check, negative values count from the end
    #[serde(default)]
    pub part: isize,
    /// Argument the part content is compared with
    #[serde(default)]
    pub arg: String,
}

fn default_operator() -> String {
    "equals_cs".to_string()
}

#[derive(Debug)]
enum Operator {
    EqualsCs(Vec<u8>),
    Equals(String),
    ContainsCs(Vec<u8>),
    Contains(String),
    PrefixCs(Vec<u8>),
    Prefix(String),
    SuffixCs(Vec<u8>),
    Suffix(String),
    Regexp(Regex),
}

impl Operator {
    fn parse(operator: &str, arg: &str) -> Result<Self, ConditionError> {
        let cs = || arg.as_bytes().to_vec();
        let ci = || arg.to_lowercase();

        let op = match operator {
            "equals_cs" => Operator::EqualsCs(cs()),
            "equals" => Operator::Equals(ci()),
            "contains_cs" => Operator::ContainsCs(cs()),
            "contains" => Operator::Contains(ci()),
            "prefix_cs" => Operator::PrefixCs(cs()),
            "prefix" => Operator::Prefix(ci()),
            "suffix_cs" => Operator::SuffixCs(cs()),
            "suffix" => Operator::Suffix(ci()),
            "regexp_partial" => Operator::Regexp(Regex::new(arg)?),
            "regexp_exact" => Operator::Regexp(Regex::new(&format!("^(?:{arg})$"))?),
            other => return Err(ConditionError::UnknownOperator(other.to_string())),
        };
        Ok(op)
    }

    fn matches(&self, content: &[u8]) -> bool {
        match self {
            Operator::EqualsCs(arg) => content == arg.as_slice(),
            Operator::ContainsCs(arg) => contains_bytes(content, arg),
            Operator::PrefixCs(arg) => content.starts_with(arg),
            Operator::SuffixCs(arg) => content.ends_with(arg),
            Operator::Equals(arg) => lowercase(content) == *arg,
            Operator::Contains(arg) => lowercase(content).contains(arg.as_str()),
            Operator::Prefix(arg) => lowercase(content).starts_with(arg.as_str()),
            Operator::Suffix(arg) => lowercase(content).ends_with(arg.as_str()),
            Operator::Regexp(re) => re.is_match(content),
        }
    }
}

fn lowercase(content: &[u8]) -> String {
    String::from_utf8_lossy(content).to_lowercase()
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// Checks the content of a single message part
#[derive(Debug)]
pub struct ContentCondition {
    operator: Operator,
    part: isize,
}

impl ContentCondition {
    /// Build the condition, failing on an unknown operator or a regular
    /// expression that does not compile
    pub fn new(conf: &ContentConfig) -> Result<Self, ConditionError> {
        Ok(Self {
            operator: Operator::parse(&conf.operator, &conf.arg)?,
            part: conf.part,
        })
    }
}

impl Condition for ContentCondition {
    fn check(&self, msg: &Message) -> bool {
        match msg.get(self.part) {
            Some(content) => self.operator.matches(content),
            None => false,
        }
    }
}
