use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::field::FieldValue;
use crate::error::FormError;

/// A node in the answer tree: either a leaf value or a nested group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerNode {
    Value(FieldValue),
    Group(Answers),
}

/// Answers collected for one intake, keyed by field id.
///
/// Field ids may encode nesting with dots (`"address.city"`). Writes through
/// [`Answers::set`] always land in the nested shape; reads through
/// [`Answers::get`] also find legacy flat keys that contain a literal dot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, AnswerNode>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up the value stored for a field id.
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        match self.get_nested(path) {
            Some(value) => Some(value),
            None => match self.0.get(path) {
                Some(AnswerNode::Value(value)) => Some(value),
                _ => None,
            },
        }
    }

    fn get_nested(&self, path: &str) -> Option<&FieldValue> {
        let mut segments = path.split('.');
        let mut node = self.0.get(segments.next()?)?;
        for segment in segments {
            match node {
                AnswerNode::Group(group) => node = group.0.get(segment)?,
                AnswerNode::Value(_) => return None,
            }
        }
        match node {
            AnswerNode::Value(value) => Some(value),
            AnswerNode::Group(_) => None,
        }
    }

    /// Write a value at a (possibly dotted) field id, creating intermediate
    /// groups as needed. A leaf sitting where a group is needed is replaced.
    pub fn set(&mut self, path: &str, value: FieldValue) {
        if path.contains('.') {
            self.0.remove(path);
        }
        let (parents, leaf) = split_path(path);
        let mut current = self;
        for segment in parents {
            let node = current
                .0
                .entry(segment.to_string())
                .or_insert_with(|| AnswerNode::Group(Answers::new()));
            if let AnswerNode::Value(_) = node {
                *node = AnswerNode::Group(Answers::new());
            }
            let AnswerNode::Group(group) = node else {
                return;
            };
            current = group;
        }
        current.0.insert(leaf.to_string(), AnswerNode::Value(value));
    }

    /// Remove the value at a field id. Returns the removed value, if any.
    pub fn remove(&mut self, path: &str) -> Option<FieldValue> {
        if path.contains('.')
            && matches!(self.0.get(path), Some(AnswerNode::Value(_)))
            && let Some(AnswerNode::Value(value)) = self.0.remove(path)
        {
            return Some(value);
        }
        let (parents, leaf) = split_path(path);
        let mut current = self;
        for segment in parents {
            current = match current.0.get_mut(segment) {
                Some(AnswerNode::Group(group)) => group,
                _ => return None,
            };
        }
        match current.0.remove(leaf) {
            Some(AnswerNode::Value(value)) => Some(value),
            Some(group) => {
                current.0.insert(leaf.to_string(), group);
                None
            }
            None => None,
        }
    }

    /// Shallow-merge a JSON object into the answers. Top-level keys replace
    /// what was there; a `null` removes the key.
    pub fn merge_json(
        &mut self,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), FormError> {
        for (key, value) in data {
            if value.is_null() {
                self.0.remove(&key);
                continue;
            }
            let node: AnswerNode = serde_json::from_value(value).map_err(|e| {
                FormError::validation(format!("unsupported value for '{key}': {e}"))
            })?;
            self.0.insert(key, node);
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn split_path(path: &str) -> (Vec<&str>, &str) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = segments.pop().unwrap_or(path);
    (segments, leaf)
}
