//! Ordered, case-insensitive header multi-map.

/// An ordered multi-map from header name to header values.
///
/// Names compare case-insensitively (ASCII). The spelling used when a name is
/// first inserted is the one reported by [`HeaderCollection::iter`]. Values
/// under a name keep their insertion order and may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderCollection {
    entries: Vec<HeaderEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    /// Name as first inserted
    name: String,
    /// Values in insertion order
    values: Vec<String>,
}

impl HeaderCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// All values stored under `name`, in order. Empty if the name is absent.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.position(name)
            .map(|i| self.entries[i].values.as_slice())
            .unwrap_or(&[])
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Whether at least one value is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        !self.get_all(name).is_empty()
    }

    /// Append a value under `name`, keeping any existing values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.entries[i].values.push(value.into()),
            None => self.entries.push(HeaderEntry {
                name,
                values: vec![value.into()],
            }),
        }
    }

    /// Remove every value under `name`, returning them if any existed.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.position(name).map(|i| self.entries.remove(i).values)
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Header names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Every `(name, value)` pair, grouped by name, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|e| {
            e.values
                .iter()
                .map(move |v| (e.name.as_str(), v.as_str()))
        })
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderCollection
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        headers.extend(iter);
        headers
    }
}

impl<K, V> Extend<(K, V)> for HeaderCollection
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.append(name, value);
        }
    }
}
