//! Append-only event log containers.
//!
//! An [`EventLog`] is an ordered list of [`Trace`]s, a trace is an ordered list of
//! [`Event`]s, and both traces and events carry insertion-ordered attribute maps keyed
//! by the usual XES names.

mod timestamp;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use timestamp::{Clock, ClockError, Timestamp};

pub const DEFAULT_NAME_KEY: &str = "concept:name";
pub const DEFAULT_TIMESTAMP_KEY: &str = "time:timestamp";
pub const DEFAULT_TRACEID_KEY: &str = "concept:name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    Date(Timestamp),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            AttributeValue::Date(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<Timestamp> for AttributeValue {
    fn from(value: Timestamp) -> Self {
        AttributeValue::Date(value)
    }
}

pub type Attributes = IndexMap<String, AttributeValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    pub attributes: Attributes,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// String values stored under `key`, one per event that has one.
    pub fn activities<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.events
            .iter()
            .filter_map(move |event| event.get(key).and_then(AttributeValue::as_str))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub traces: Vec<Trace>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trace> {
        self.traces.iter()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.traces.iter().flat_map(Trace::iter)
    }

    /// Builds a log from activity sequences, mostly for reference logs in tests and tools.
    pub fn from_activities<I, T, S>(traces: I, activity_key: &str) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut log = Self::new();
        for (case, activities) in traces.into_iter().enumerate() {
            let mut trace = Trace::new();
            trace
                .attributes
                .insert(DEFAULT_TRACEID_KEY.to_owned(), case.to_string().into());
            for activity in activities {
                let activity: String = activity.into();
                trace.push(Event::new().with(activity_key, activity));
            }
            log.push(trace);
        }
        log
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Trace;
    type IntoIter = std::slice::Iter<'a, Trace>;

    fn into_iter(self) -> Self::IntoIter {
        self.traces.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activities_skip_events_without_the_key() {
        let mut trace = Trace::new();
        trace.push(Event::new().with(DEFAULT_NAME_KEY, "A"));
        trace.push(Event::new().with("other", "x"));
        trace.push(Event::new().with(DEFAULT_NAME_KEY, "B"));
        assert_eq!(
            trace.activities(DEFAULT_NAME_KEY).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        assert_eq!(trace.len(), 3);
    }

    #[test]
    fn from_activities_assigns_case_ids() {
        let log = EventLog::from_activities([vec!["A", "B"], vec![]], DEFAULT_NAME_KEY);
        assert_eq!(log.len(), 2);
        assert_eq!(
            log.traces[1].attributes[DEFAULT_TRACEID_KEY].as_str(),
            Some("1")
        );
        assert_eq!(log.events().count(), 2);
    }

    #[test]
    fn json_uses_tagged_attribute_values() {
        let event = Event::new()
            .with("concept:name", "A")
            .with("time:timestamp", Timestamp::from_secs(5).unwrap());
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"concept:name":{"string":"A"},"time:timestamp":{"date":5}}"#
        );
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
