//! URL and query-string construction.

use serde_json::Value;

/// Parameter key whose value is appended to the query string verbatim.
pub const QUERY_STRING_KEY: &str = "_queryString";

/// Query parameters for a read request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Params {
    /// No parameters.
    #[default]
    None,
    /// A pre-built query string, used as-is.
    Raw(String),
    /// Key/value pairs, encoded on serialization.
    Pairs(Vec<(String, String)>),
}

impl Params {
    /// Parameters holding a single pair.
    pub fn pair(key: impl Into<String>, value: impl ToString) -> Self {
        Params::Pairs(vec![(key.into(), value.to_string())])
    }

    /// Add a pair, turning `None` into `Pairs`.
    ///
    /// A raw query string is kept and the pair is appended as a second fragment.
    pub fn with(self, key: impl Into<String>, value: impl ToString) -> Self {
        let pair = (key.into(), value.to_string());
        match self {
            Params::None => Params::Pairs(vec![pair]),
            Params::Raw(raw) => Params::Pairs(vec![(QUERY_STRING_KEY.to_string(), raw), pair]),
            Params::Pairs(mut pairs) => {
                pairs.push(pair);
                Params::Pairs(pairs)
            }
        }
    }

    /// Returns true if serializing yields an empty query string.
    pub fn is_empty(&self) -> bool {
        match self {
            Params::None => true,
            Params::Raw(raw) => raw.is_empty(),
            Params::Pairs(pairs) => pairs.is_empty(),
        }
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Params::None
    }
}

impl From<&str> for Params {
    fn from(raw: &str) -> Self {
        Params::Raw(raw.to_string())
    }
}

impl From<String> for Params {
    fn from(raw: String) -> Self {
        Params::Raw(raw)
    }
}

impl From<Vec<(String, String)>> for Params {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Params::Pairs(pairs)
    }
}

impl<K: Into<String>, V: ToString, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        Params::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_string()))
                .collect(),
        )
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Params::None,
            Value::String(raw) => Params::Raw(raw),
            Value::Object(map) => Params::Pairs(
                map.into_iter()
                    .map(|(k, v)| (k, param_text(&v)))
                    .collect(),
            ),
            other => Params::Raw(param_text(&other)),
        }
    }
}

/// Render a JSON value the way it appears inside a query string.
fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(param_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Serialize parameters into a query string.
///
/// Keys and values are URL-component encoded and joined with `=` and `&`.
/// The [`QUERY_STRING_KEY`] entry is passed through untouched.
pub fn build_query(params: &Params) -> String {
    match params {
        Params::None => String::new(),
        Params::Raw(raw) => raw.clone(),
        Params::Pairs(pairs) => pairs
            .iter()
            .map(|(key, value)| {
                if key == QUERY_STRING_KEY {
                    value.clone()
                } else {
                    format!(
                        "{}={}",
                        urlencoding::encode(key),
                        urlencoding::encode(value)
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("&"),
    }
}

/// Build the full URL for a resource path.
///
/// A query fragment already present in `path` ends up behind the format suffix:
/// `projects?customer_id=1` becomes `<root>/projects.json?customer_id=1`.
pub fn build_url(root: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut url = format!("{}/{}{}", root, path, crate::FORMAT_SUFFIX);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Append an encoded query string, picking `?` or `&` as separator.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Singular name of a plural resource path, used to wrap write payloads.
///
/// `time_entries` -> `time_entry`, `customers` -> `customer`
pub fn resource_name(path: &str) -> String {
    let name = path.strip_suffix('s').unwrap_or(path);
    match name.strip_suffix("ie") {
        Some(stem) => format!("{stem}y"),
        None => name.to_string(),
    }
}
