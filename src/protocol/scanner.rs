//! Line-oriented field scanner
//!
//! Several server replies pack key/value pairs into one text payload:
//!
//! ```text
//! INFO          # Server\r\nredis_version:7.2.0\r\nuptime_in_seconds:42\r\n
//! CLIENT LIST   id=3 addr=127.0.0.1:5000 age=10 db=0\nid=4 ...\n
//! DEBUG OBJECT  Value at:0x7f refcount:1 encoding:embstr serializedlength:4
//! ```
//!
//! All three are split with the same scanner, differing only in separators.
//! Values made entirely of ASCII digits become integers.

use bytes::Bytes;
use indexmap::IndexMap;

use crate::value::Value;

/// Scan `pair_sep`-separated `key<kv_sep>value` fields
///
/// Fields without `kv_sep` are skipped. The key ends at the first `kv_sep`,
/// so values may contain the separator themselves.
pub fn scan_fields(text: &[u8], pair_sep: u8, kv_sep: u8) -> IndexMap<Bytes, Value> {
    let mut fields = IndexMap::new();
    for field in text.split(|&b| b == pair_sep) {
        let field = trim_cr(field);
        if let Some(pos) = field.iter().position(|&b| b == kv_sep) {
            let key = Bytes::copy_from_slice(&field[..pos]);
            fields.insert(key, field_value(&field[pos + 1..]));
        }
    }
    fields
}

/// INFO payload: one `key:value` per line, `#` section headers skipped
pub fn scan_info(text: &[u8]) -> IndexMap<Bytes, Value> {
    let mut fields = IndexMap::new();
    for line in text.split(|&b| b == b'\n') {
        let line = trim_cr(line);
        if line.is_empty() || line[0] == b'#' {
            continue;
        }
        fields.extend(scan_fields(line, b'\n', b':'));
    }
    fields
}

/// CLIENT LIST payload: one client per line, `key=value` fields
pub fn scan_client_list(text: &[u8]) -> Vec<IndexMap<Bytes, Value>> {
    text.split(|&b| b == b'\n')
        .map(trim_cr)
        .filter(|line| !line.is_empty())
        .map(|line| scan_fields(line, b' ', b'='))
        .collect()
}

/// DEBUG OBJECT status line: space-separated `key:value` fields
pub fn scan_debug_object(text: &[u8]) -> IndexMap<Bytes, Value> {
    scan_fields(text, b' ', b':')
}

fn field_value(raw: &[u8]) -> Value {
    if !raw.is_empty() && raw.iter().all(u8::is_ascii_digit) {
        if let Some(n) = std::str::from_utf8(raw).ok().and_then(|s| s.parse().ok()) {
            return Value::Int(n);
        }
    }
    Value::Bytes(Bytes::copy_from_slice(raw))
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
