use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

use super::Result;
use crate::trigger::Trigger;

/// Wire payload shared by every protocol: the owning trigger as compact JSON,
/// with `<`, `>`, `&`, U+2028 and U+2029 written as `\u` escapes so the bytes
/// equal what the configuration tools emit for the same rule.
pub fn payload(owner: &Trigger) -> Result<Vec<u8>> {
    let mut ser = serde_json::Serializer::with_formatter(Vec::new(), HtmlSafe);
    owner.serialize(&mut ser)?;
    Ok(ser.into_inner())
}

/// Compact output plus HTML-safe string escaping.
struct HtmlSafe;

impl Formatter for HtmlSafe {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
