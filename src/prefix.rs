//! Key namespace prefixing

use std::borrow::Cow;

use bytes::Bytes;

/// Optional prefix prepended to every key before encoding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPrefix {
    prefix: Option<Bytes>,
}

impl KeyPrefix {
    pub fn new(prefix: Option<&[u8]>) -> Self {
        Self {
            prefix: prefix
                .filter(|p| !p.is_empty())
                .map(Bytes::copy_from_slice),
        }
    }

    pub fn get(&self) -> Option<&[u8]> {
        self.prefix.as_deref()
    }

    /// `prefix + key`, or the key untouched when no prefix is set
    pub fn apply<'a>(&self, key: &'a [u8]) -> Cow<'a, [u8]> {
        match &self.prefix {
            None => Cow::Borrowed(key),
            Some(prefix) => {
                let mut out = Vec::with_capacity(prefix.len() + key.len());
                out.extend_from_slice(prefix);
                out.extend_from_slice(key);
                Cow::Owned(out)
            }
        }
    }

    pub fn apply_all<K: AsRef<[u8]>>(&self, keys: &[K]) -> Vec<Vec<u8>> {
        keys.iter()
            .map(|k| self.apply(k.as_ref()).into_owned())
            .collect()
    }
}
