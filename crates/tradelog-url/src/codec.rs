//! Minimal percent-encoding for query components.
//!
//! Unreserved characters (RFC 3986) plus `:` and `/` pass through; every
//! other byte is `%XX` encoded. `,` is always encoded inside a value so it
//! stays free to act as the list separator.

/// Bytes written without escaping.
fn is_passthrough(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b':' | b'/')
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode one component.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if is_passthrough(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode one component. `+` becomes a space; a malformed escape is kept
/// literally; invalid UTF-8 is replaced.
pub fn unescape(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let decoded = bytes
                    .get(i + 1..i + 3)
                    .and_then(|pair| Some(hex_value(pair[0])? << 4 | hex_value(pair[1])?));
                match decoded {
                    Some(v) => {
                        out.push(v);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Split a query string into decoded `(name, value)` pairs, in order.
///
/// A leading `?` is accepted. Empty segments are skipped and a segment
/// without `=` yields an empty value.
pub fn parse_pairs(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((k, v)) => (unescape(k), unescape(v)),
            None => (unescape(segment), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_passthrough() {
        assert_eq!(escape("BTC"), "BTC");
        assert_eq!(escape("EUR/USD"), "EUR/USD");
        assert_eq!(escape("pnl:desc"), "pnl:desc");
    }

    #[test]
    fn test_escape_reserved() {
        assert_eq!(escape("fear of missing out"), "fear%20of%20missing%20out");
        assert_eq!(escape("a,b&c=d"), "a%2Cb%26c%3Dd");
        assert_eq!(escape("é"), "%C3%A9");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("fear%20of+missing"), "fear of missing");
        assert_eq!(unescape("%C3%A9"), "é");
        assert_eq!(unescape("100%"), "100%");
        assert_eq!(unescape("%zz1"), "%zz1");
    }

    #[test]
    fn test_parse_pairs() {
        let pairs = parse_pairs("?symbols=BTC,ETH&&side=Buy&flag");
        assert_eq!(
            pairs,
            vec![
                ("symbols".to_string(), "BTC,ETH".to_string()),
                ("side".to_string(), "Buy".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
    }
}
