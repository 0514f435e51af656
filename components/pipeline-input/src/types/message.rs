// External crates
use bytes::Bytes;

/// `Message` is the unit of data an input emits downstream. It is an ordered
/// list of raw byte parts, a single line read from a file is a message with
/// one part, a multipart block is a message with one part per line.
///
/// Stages that forward a message never mutate it, cloning only bumps the
/// reference counts of the underlying `Bytes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    parts: Vec<Bytes>,
}

impl Message {
    /// Create a new `Message` from already framed parts
    pub fn new(parts: Vec<Bytes>) -> Self {
        Self { parts }
    }

    /// Create a single part `Message`
    pub fn single(part: impl Into<Bytes>) -> Self {
        Self {
            parts: vec![part.into()],
        }
    }

    /// Get a part by index. Negative indexes count backwards from the last
    /// part, so `-1` is the last part of the message.
    pub fn get(&self, index: isize) -> Option<&Bytes> {
        let len = self.parts.len() as isize;
        let index = if index < 0 { len + index } else { index };
        if index < 0 || index >= len {
            return None;
        }
        self.parts.get(index as usize)
    }

    /// Number of parts in the message
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the message carries no parts at all
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterate over the parts in order
    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.parts.iter()
    }

    /// Total size of all parts in bytes, used for logging only
    pub fn size(&self) -> usize {
        self.parts.iter().map(|p| p.len()).sum()
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Message::single(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Message {
    fn from(value: String) -> Self {
        Message::single(Bytes::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_positive_and_negative_index() {
        let msg = Message::new(vec![
            Bytes::from_static(b"first"),
            Bytes::from_static(b"second"),
            Bytes::from_static(b"third"),
        ]);

        assert_eq!(msg.get(0).map(|b| b.as_ref()), Some(&b"first"[..]));
        assert_eq!(msg.get(2).map(|b| b.as_ref()), Some(&b"third"[..]));
        assert_eq!(msg.get(-1).map(|b| b.as_ref()), Some(&b"third"[..]));
        assert_eq!(msg.get(-3).map(|b| b.as_ref()), Some(&b"first"[..]));
    }

    #[test]
    fn test_get_out_of_range() {
        let msg = Message::from("only");
        assert!(msg.get(1).is_none());
        assert!(msg.get(-2).is_none());
        assert!(Message::default().get(0).is_none());
    }

    #[test]
    fn test_size_sums_parts() {
        let msg = Message::new(vec![Bytes::from_static(b"ab"), Bytes::from_static(b"cde")]);
        assert_eq!(msg.len(), 2);
        assert_eq!(msg.size(), 5);
        assert!(!msg.is_empty());
    }
}
