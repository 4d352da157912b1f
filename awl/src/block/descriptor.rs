use std::collections::BTreeMap;
use std::fmt;

/// Header metadata keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DescriptorKey {
    Title,
    Author,
    Family,
    Name,
    Version,
}

impl DescriptorKey {
    pub fn from_keyword(word: &str) -> Option<DescriptorKey> {
        match word.to_ascii_uppercase().as_str() {
            "TITLE" => Some(DescriptorKey::Title),
            "AUTHOR" => Some(DescriptorKey::Author),
            "FAMILY" => Some(DescriptorKey::Family),
            "NAME" => Some(DescriptorKey::Name),
            "VERSION" => Some(DescriptorKey::Version),
            _ => None,
        }
    }
}

impl fmt::Display for DescriptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DescriptorKey::Title => "TITLE",
            DescriptorKey::Author => "AUTHOR",
            DescriptorKey::Family => "FAMILY",
            DescriptorKey::Name => "NAME",
            DescriptorKey::Version => "VERSION",
        })
    }
}

/// Block header metadata. Every key can be set at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptors {
    values: BTreeMap<DescriptorKey, String>,
}

impl Descriptors {
    pub fn get(&self, key: DescriptorKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Record a value. Returns `false` (leaving the old value) if the key
    /// was already set.
    pub fn set(&mut self, key: DescriptorKey, value: impl Into<String>) -> bool {
        if self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, value.into());
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (DescriptorKey, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
