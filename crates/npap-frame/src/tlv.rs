//! Recursive parameter-tree decoding for alert payloads.
//!
//! An alert payload carries a list of entries. Entries whose feature type is
//! 1 hold a tree of parameter nodes:
//!
//! ```text
//! node  := pid (1B, signed) | pdt (1B) | value
//! pdt 0 := count (2B) | size (2B) | node × count     (group)
//! pdt 1 := len (2B) | integer of len bytes           (integer)
//! pdt 2 := len (2B) | len bytes of UTF-8             (text)
//! pdt 3 := same as pdt 2
//! ```
//!
//! The tree is flattened into a [`ParameterMap`] keyed by dotted paths built
//! from the pids along the way from the root, e.g. `.1.1.1.2`. Decoding never
//! fails: malformed input yields a partial (possibly empty) map.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::cursor::ByteCursor;

/// Value recorded for a node whose data type is not understood.
pub const UNKNOWN_DATA_TYPE: &str = "unknown data type";

/// Deepest group nesting that is descended into.
pub const MAX_DEPTH: usize = 64;

/// Offset of the byte holding the length of the variable prefix.
const PREFIX_LEN_OFFSET: usize = 7;
/// Fixed bytes before the variable prefix ends and the entry count begins.
const COUNT_BASE: usize = 8;
/// Header skipped at the start of every entry.
const ENTRY_HEADER_SIZE: usize = 10;
/// Block skipped between the feature type and the parameter tree.
const ENTRY_BLOCK_SIZE: usize = 34;
/// Feature type of entries that carry a parameter tree.
const FEATURE_PARAMETER_TREE: i32 = 1;

/// Parameter data type (`pdt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Group,
    Integer,
    Text,
    Unknown(i32),
}

impl ParameterType {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ParameterType::Group,
            1 => ParameterType::Integer,
            2 | 3 => ParameterType::Text,
            other => ParameterType::Unknown(other),
        }
    }
}

/// Flat mapping from dotted path to decimal or text value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    entries: BTreeMap<String, String>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value. The first value for a path wins; returns `false` when
    /// the path was already present.
    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<String>) -> bool {
        let path = path.into();
        if self.entries.contains_key(&path) {
            debug!(%path, "duplicate parameter path, keeping first value");
            return false;
        }
        self.entries.insert(path, value.into());
        true
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Parse the value at `path` as a decimal integer.
    pub fn integer(&self, path: &str) -> Option<i32> {
        self.get(path)?.trim().parse().ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParameterMap::new();
        for (path, value) in iter {
            map.insert(path, value);
        }
        map
    }
}

/// Decode the parameter trees of an alert payload (the bytes after the
/// 12-byte alert header).
pub fn decode_parameters(payload: &[u8]) -> ParameterMap {
    let mut map = ParameterMap::new();

    let Some(&prefix_len) = payload.get(PREFIX_LEN_OFFSET) else {
        return map;
    };
    let mut cursor = ByteCursor::at(payload, COUNT_BASE + usize::from(prefix_len));
    let Some(entries) = cursor.read_u8() else {
        return map;
    };

    for entry in 0..entries {
        cursor.skip(ENTRY_HEADER_SIZE);
        let Some(descriptor) = cursor.peek(1) else {
            trace!(entry, offset = cursor.position(), "entry descriptor past end");
            break;
        };
        if descriptor & 0x01 == 0 {
            continue;
        }

        let feature = cursor.read_number(2);
        if feature == FEATURE_PARAMETER_TREE {
            cursor.skip(ENTRY_BLOCK_SIZE);
            decode_node(&mut cursor, "", 0, &mut map);
        }
    }

    map
}

fn decode_node(cursor: &mut ByteCursor<'_>, prefix: &str, depth: usize, map: &mut ParameterMap) {
    if cursor.is_exhausted() {
        return;
    }

    let pid = cursor.read_number(1);
    let pdt = cursor.read_number(1);
    let path = format!("{prefix}.{pid}");

    let value = match ParameterType::from_code(pdt) {
        ParameterType::Group => {
            let count = cursor.read_number(2);
            // Declared byte size of the group; children are walked by count.
            let _size = cursor.read_number(2);
            map.insert(path.as_str(), count.to_string());

            if depth >= MAX_DEPTH {
                debug!(%path, depth, "parameter tree too deep, not descending");
                return;
            }
            for _ in 0..count.max(0) {
                decode_node(cursor, &path, depth + 1, map);
            }
            return;
        }
        ParameterType::Integer => {
            let len = cursor.read_number(2);
            cursor.read_number(len).to_string()
        }
        ParameterType::Text => {
            let len = cursor.read_number(2);
            match usize::try_from(len) {
                Ok(len) => String::from_utf8_lossy(cursor.take_clipped(len)).into_owned(),
                Err(_) => String::new(),
            }
        }
        ParameterType::Unknown(code) => {
            trace!(%path, code, "unknown parameter data type");
            UNKNOWN_DATA_TYPE.to_string()
        }
    };

    map.insert(path, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(pid: u8, count: u16) -> Vec<u8> {
        let mut out = vec![pid, 0];
        out.extend_from_slice(&count.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out
    }

    fn integer(pid: u8, value: &[u8]) -> Vec<u8> {
        let mut out = vec![pid, 1];
        out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        out.extend_from_slice(value);
        out
    }

    fn text(pid: u8, value: &str) -> Vec<u8> {
        let mut out = vec![pid, 2];
        out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        out.extend_from_slice(value.as_bytes());
        out
    }

    /// Alert payload with one prefix byte and a single tree-carrying entry.
    fn payload_with_tree(tree: &[u8]) -> Vec<u8> {
        let mut out = vec![0xA5, 0x00, 0x00, 0x50, 0xE0, 0x73, 0x01];
        out.push(1); // prefix length
        out.push(0xAA); // prefix
        out.push(1); // entry count
        out.extend_from_slice(&[0u8; ENTRY_HEADER_SIZE]);
        out.extend_from_slice(&[0x00, 0x01]); // feature type 1, bit 0 set
        out.extend_from_slice(&[0u8; ENTRY_BLOCK_SIZE]);
        out.extend_from_slice(tree);
        out
    }

    #[test]
    fn group_of_two_integers() {
        let mut tree = group(1, 2);
        tree.extend(integer(2, &77i32.to_be_bytes()));
        tree.extend(integer(7, &2000i16.to_be_bytes()));

        let map = decode_parameters(&payload_with_tree(&tree));

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(".1"), Some("2"));
        assert_eq!(map.get(".1.2"), Some("77"));
        assert_eq!(map.get(".1.7"), Some("2000"));
    }

    #[test]
    fn nested_groups_build_dotted_paths() {
        let mut tree = group(1, 1);
        tree.extend(group(1, 1));
        tree.extend(group(1, 2));
        tree.extend(text(2, "job-9"));
        tree.extend(text(4, "UR: alice"));

        let map = decode_parameters(&payload_with_tree(&tree));

        assert_eq!(map.get(".1.1.1"), Some("2"));
        assert_eq!(map.get(".1.1.1.2"), Some("job-9"));
        assert_eq!(map.get(".1.1.1.4"), Some("UR: alice"));
    }

    #[test]
    fn pid_is_signed() {
        let tree = integer(0x81, &[0x05]);
        let map = decode_parameters(&payload_with_tree(&tree));
        assert_eq!(map.get(".-127"), Some("5"));
    }

    #[test]
    fn unknown_data_type_is_recorded() {
        let tree = vec![3, 9];
        let map = decode_parameters(&payload_with_tree(&tree));
        assert_eq!(map.get(".3"), Some(UNKNOWN_DATA_TYPE));
    }

    #[test]
    fn pdt_three_is_text() {
        let mut tree = text(5, "tray 2");
        tree[1] = 3;
        let map = decode_parameters(&payload_with_tree(&tree));
        assert_eq!(map.get(".5"), Some("tray 2"));
    }

    #[test]
    fn short_text_is_clipped() {
        let mut tree = vec![6, 2, 0x00, 0x10];
        tree.extend_from_slice(b"abc");
        let map = decode_parameters(&payload_with_tree(&tree));
        assert_eq!(map.get(".6"), Some("abc"));
    }

    #[test]
    fn three_byte_integer_reads_zero_and_desynchronizes() {
        let mut tree = group(1, 2);
        tree.extend(integer(2, &[0x00, 0x00, 0x2A]));
        tree.extend(integer(3, &[0x01]));

        let map = decode_parameters(&payload_with_tree(&tree));

        assert_eq!(map.get(".1.2"), Some("0"));
        // The unread value bytes are taken as the next node's pid and pdt.
        assert_eq!(map.get(".1.3"), None);
        assert!(map.contains(".1.0"));
    }

    #[test]
    fn entry_without_descriptor_bit_is_skipped() {
        let mut payload = payload_with_tree(&integer(1, &[0x01]));
        let descriptor = 10 + ENTRY_HEADER_SIZE;
        payload[descriptor + 1] = 0x00;

        assert!(decode_parameters(&payload).is_empty());
    }

    #[test]
    fn entry_with_other_feature_type_is_skipped() {
        let mut payload = payload_with_tree(&integer(1, &[0x01]));
        let descriptor = 10 + ENTRY_HEADER_SIZE;
        payload[descriptor] = 0x01; // feature type 0x0101

        assert!(decode_parameters(&payload).is_empty());
    }

    #[test]
    fn truncated_payload_yields_partial_map() {
        let mut tree = group(1, 3);
        tree.extend(integer(2, &[0x07]));
        tree.extend(integer(3, &[0x08]));
        let mut payload = payload_with_tree(&tree);
        payload.truncate(payload.len() - 5);

        let map = decode_parameters(&payload);
        assert_eq!(map.get(".1"), Some("3"));
        assert_eq!(map.get(".1.2"), Some("7"));
        assert!(!map.contains(".1.3"));
    }

    #[test]
    fn empty_and_tiny_payloads_yield_empty_map() {
        assert!(decode_parameters(&[]).is_empty());
        assert!(decode_parameters(&[0u8; 8]).is_empty());
        assert!(decode_parameters(&[0u8; 9]).is_empty());
    }

    #[test]
    fn duplicate_path_keeps_first_value() {
        let mut tree = group(1, 2);
        tree.extend(integer(2, &[0x01]));
        tree.extend(integer(2, &[0x02]));

        let map = decode_parameters(&payload_with_tree(&tree));
        assert_eq!(map.get(".1.2"), Some("1"));
    }

    #[test]
    fn deep_nesting_stops_descending() {
        let mut tree = Vec::new();
        for _ in 0..(MAX_DEPTH + 8) {
            tree.extend(group(1, 1));
        }
        let map = decode_parameters(&payload_with_tree(&tree));
        assert_eq!(map.len(), MAX_DEPTH + 1);
    }

    #[test]
    fn map_from_iterator_and_integer_lookup() {
        let map: ParameterMap = [(".1.1.1.7", "2000"), (".1.1.1.2", "x")]
            .into_iter()
            .collect();
        assert_eq!(map.integer(".1.1.1.7"), Some(2000));
        assert_eq!(map.integer(".1.1.1.2"), None);
        assert_eq!(map.integer(".9"), None);
    }
}
