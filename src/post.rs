//! Defines [`PostRecord`], the metadata the aggregator reads from each post,
//! along with the best-effort validation that turns loosely-shaped
//! frontmatter fields into typed values. Field shapes are checked exactly
//! once, at deserialization time; after that the aggregator only sees typed
//! data.

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// The taxonomy metadata of a single post. Records are supplied by whoever
/// loads content (see [`crate::parser`]) and are only ever read by the
/// aggregator.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PostRecord {
    /// The post's raw tags, in source order. `None` when the field is absent
    /// or isn't a sequence.
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Option<Vec<String>>,

    /// The preferred category field.
    #[serde(default, deserialize_with = "deserialize_category")]
    pub category: Option<CategoryField>,

    /// The fallback category field, consulted only when `category` is
    /// absent.
    #[serde(default, deserialize_with = "deserialize_category")]
    pub categories: Option<CategoryField>,
}

/// The validated shape of a `category`/`categories` field.
#[derive(Clone, Debug, PartialEq)]
pub enum CategoryField {
    /// A single category name.
    Name(String),

    /// A list of category names. Only the first one counts.
    List(Vec<String>),

    /// A value of some other shape (a number, a mapping, a list that doesn't
    /// start with a string). It names no category but still shadows the
    /// fallback field.
    Other,
}

impl CategoryField {
    /// Validates a raw YAML value. Returns `None` for values that count as
    /// missing: null, `false`, zero, NaN, and the empty string.
    pub fn from_value(value: Value) -> Option<CategoryField> {
        match value {
            Value::Null | Value::Bool(false) => None,
            Value::Number(n) if n.as_f64().map_or(false, |f| f == 0.0 || f.is_nan()) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(CategoryField::Name(s)),
            Value::Sequence(items) => match items.first() {
                None => Some(CategoryField::List(Vec::new())),
                Some(Value::String(_)) => Some(CategoryField::List(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                )),
                Some(_) => Some(CategoryField::Other),
            },
            _ => Some(CategoryField::Other),
        }
    }

    /// Returns the raw category name this field designates, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            CategoryField::Name(name) => Some(name),
            CategoryField::List(names) => names.first().map(String::as_str),
            CategoryField::Other => None,
        }
    }
}

impl PostRecord {
    /// Replaces the record's tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the `category` field to a single name.
    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = Some(CategoryField::Name(category.into()));
        self
    }

    /// Sets the `categories` field to a list of names.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(CategoryField::List(
            categories.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Resolves the single category this post contributes to: `category` if
    /// present, otherwise `categories`. Returns the trimmed name, or `None`
    /// when nothing usable remains.
    pub fn category_name(&self) -> Option<&str> {
        self.category
            .as_ref()
            .or_else(|| self.categories.as_ref())
            .and_then(CategoryField::name)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Best-effort conversion of a YAML value into its string form. Scalars
/// convert the obvious way and sequences join their elements with `,`. Null
/// and mappings have no string form.
pub fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Sequence(items) => Some(
            items
                .iter()
                .map(|item| coerce(item).unwrap_or_default())
                .collect::<Vec<String>>()
                .join(","),
        ),
        Value::Null | Value::Mapping(_) => None,
    }
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Sequence(items) => Some(
            items
                .iter()
                .filter_map(coerce)
                .filter(|tag| !tag.trim().is_empty())
                .collect(),
        ),
        _ => None,
    })
}

fn deserialize_category<'de, D>(deserializer: D) -> Result<Option<CategoryField>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(CategoryField::from_value(Value::deserialize(deserializer)?))
}

/// Deserializes any scalar as a string, yielding `None` for values without a
/// string form.
pub(crate) fn deserialize_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce(&Value::deserialize(deserializer)?))
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(yaml: &str) -> PostRecord {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_absent_fields() {
        assert_eq!(record("title: x"), PostRecord::default());
    }

    #[test]
    fn test_tags_coercion() {
        let r = record("tags: [Rust, 42, true, null, '  ', {a: b}, [x, y]]");
        assert_eq!(
            r.tags,
            Some(vec![
                "Rust".to_owned(),
                "42".to_owned(),
                "true".to_owned(),
                "x,y".to_owned(),
            ])
        );
    }

    #[test]
    fn test_malformed_tags() {
        assert_eq!(record("tags: rust").tags, None);
        assert_eq!(record("tags: {a: 1}").tags, None);
    }

    #[test]
    fn test_category_shapes() {
        assert_eq!(
            record("category: Web").category,
            Some(CategoryField::Name("Web".to_owned()))
        );
        assert_eq!(record("category: ''").category, None);
        assert_eq!(record("category: false").category, None);
        assert_eq!(record("category: 7").category, Some(CategoryField::Other));
        assert_eq!(
            record("categories: [A, B]").categories,
            Some(CategoryField::List(vec!["A".to_owned(), "B".to_owned()]))
        );
        assert_eq!(
            record("categories: [1, B]").categories,
            Some(CategoryField::Other)
        );
        assert_eq!(
            record("categories: []").categories,
            Some(CategoryField::List(Vec::new()))
        );
    }

    #[test]
    fn test_category_name_resolution() {
        assert_eq!(
            PostRecord::default()
                .with_category(" Tech ")
                .with_categories(vec!["Other"])
                .category_name(),
            Some("Tech")
        );
        assert_eq!(
            PostRecord::default()
                .with_categories(vec!["A", "B"])
                .category_name(),
            Some("A")
        );
        assert_eq!(
            record("category: 7\ncategories: [A]").category_name(),
            None
        );
        assert_eq!(record("category: ''\ncategories: A").category_name(), Some("A"));
        assert_eq!(
            record("category: 0\ncategories: [Fallback]").category_name(),
            Some("Fallback")
        );
        assert_eq!(
            record("category: 0.0\ncategories: Fallback").category_name(),
            Some("Fallback")
        );
        assert_eq!(
            record("category: .nan\ncategories: Fallback").category_name(),
            Some("Fallback")
        );
        assert_eq!(
            record("category: -1\ncategories: [A]").category_name(),
            None
        );
        assert_eq!(record("category: '   '").category_name(), None);
        assert_eq!(record("categories: []").category_name(), None);
    }
}
