//! Converts aggregate output into [`Value`]s for templating.

use crate::aggregate::{Aggregate, CategorySummary, TagCount};
use gtmpl::Value;
use std::collections::HashMap;

impl From<&TagCount> for Value {
    fn from(t: &TagCount) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("tag".to_owned(), (&t.tag).into());
        m.insert("count".to_owned(), Value::from(t.count as u64));
        Value::Object(m)
    }
}

impl From<&CategorySummary> for Value {
    fn from(c: &CategorySummary) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("slug".to_owned(), (&c.slug).into());
        m.insert("name".to_owned(), (&c.name).into());
        m.insert("count".to_owned(), Value::from(c.count as u64));
        Value::Object(m)
    }
}

impl From<&Aggregate> for Value {
    /// Produces `{tags: [{tag, count}], categories: [{slug, name, count}]}`.
    fn from(a: &Aggregate) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "tags".to_owned(),
            Value::Array(a.tags.iter().map(Value::from).collect()),
        );
        m.insert(
            "categories".to_owned(),
            Value::Array(a.categories.iter().map(Value::from).collect()),
        );
        Value::Object(m)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn field<'a>(value: &'a Value, key: &str) -> &'a Value {
        match value {
            Value::Object(m) => &m[key],
            _ => panic!("expected an object with `{}`", key),
        }
    }

    fn string(value: &Value) -> &str {
        match value {
            Value::String(s) => s,
            _ => panic!("expected a string"),
        }
    }

    #[test]
    fn test_aggregate_value() {
        let aggregate = Aggregate {
            tags: vec![TagCount {
                tag: "rust".to_owned(),
                count: 3,
            }],
            categories: vec![CategorySummary {
                slug: "tech".to_owned(),
                name: "Tech".to_owned(),
                count: 1,
            }],
        };
        let value = Value::from(&aggregate);

        match field(&value, "tags") {
            Value::Array(tags) => {
                assert_eq!(tags.len(), 1);
                assert_eq!(string(field(&tags[0], "tag")), "rust");
            }
            _ => panic!("expected `tags` to be an array"),
        }
        match field(&value, "categories") {
            Value::Array(categories) => {
                assert_eq!(string(field(&categories[0], "name")), "Tech");
                assert_eq!(string(field(&categories[0], "slug")), "tech");
            }
            _ => panic!("expected `categories` to be an array"),
        }
    }
}
