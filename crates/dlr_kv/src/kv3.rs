//! KeyValues3 text reader and writer.
//!
//! Covers the subset of KV3 that `.vdata` files use: the `<!-- kv3 ... -->`
//! header, objects, arrays, quoted and `"""` multi-line strings, numbers,
//! `true`/`false`/`null`, type flags (`resource_name:"..."`, `subclass:{...}`)
//! and `#[ .. ]` binary blobs. Comments are accepted and dropped.

use crate::error::{Error, Result};
use crate::lexer::{escape, Cursor};
use crate::node::{DocumentNode, Value};
use std::fmt::Write as _;

/// Header written when a document was built in memory without one.
pub const DEFAULT_HEADER: &str =
    "<!-- kv3 encoding:text:version{e21c7f3c-8a33-41c5-9977-a76d3a32aa0d} format:generic:version{7412167c-06e9-4698-aff2-e63eb59037e7} -->";

/// The name of the root directive listing included files.
pub const INCLUDE_KEY: &str = "_include";

/// A parsed KV3 document: the header line plus its root object.
#[derive(Debug, Clone, PartialEq)]
pub struct Kv3Document {
    pub header: String,
    pub root: DocumentNode,
}

impl Kv3Document {
    /// Replace the value of a root `_include` directive with an empty array.
    ///
    /// Included files are not part of the compiled addon, so leaving the
    /// directive in place breaks resource compilation. Returns `true` when a
    /// directive was found.
    pub fn clear_includes(&mut self) -> bool {
        match self.root.find_child_mut(INCLUDE_KEY) {
            Some(include) => {
                include.set_value(Value::Array(Vec::new()));
                tracing::debug!("cleared _include directive");
                true
            }
            None => false,
        }
    }
}

/// Parse a KV3 text document.
pub fn parse(text: &str) -> Result<Kv3Document> {
    let mut cursor = Cursor::new(text);
    cursor.skip_trivia()?;

    let header = if cursor.starts_with("<!--") {
        let body = {
            cursor.advance(4);
            cursor.take_until("-->")?
        };
        format!("<!--{body}-->")
    } else {
        DEFAULT_HEADER.to_string()
    };

    cursor.skip_trivia()?;
    if cursor.peek() != Some(b'{') {
        return Err(Error::RootNotObject);
    }
    let value = parse_value(&mut cursor)?;
    cursor.skip_trivia()?;
    if !cursor.is_eof() {
        return Err(cursor.unexpected("trailing content after root object"));
    }

    Ok(Kv3Document {
        header,
        root: DocumentNode {
            name: String::new(),
            value,
        },
    })
}

/// Serialize a KV3 document back to text.
pub fn to_string(doc: &Kv3Document) -> String {
    let mut out = String::new();
    out.push_str(&doc.header);
    out.push('\n');
    write_value(&mut out, &doc.root.value, 0);
    out.push('\n');
    out
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

fn parse_value(cursor: &mut Cursor<'_>) -> Result<Value> {
    cursor.skip_trivia()?;
    match cursor.peek() {
        Some(b'{') => parse_object(cursor),
        Some(b'[') => parse_array(cursor),
        Some(b'"') if cursor.starts_with("\"\"\"") => {
            cursor.advance(3);
            let body = cursor.take_until("\"\"\"")?;
            Ok(Value::String(strip_multiline(body)))
        }
        Some(b'"') => Ok(Value::String(cursor.quoted_string()?)),
        Some(b'#') if cursor.starts_with("#[") => parse_binary(cursor),
        Some(b) if matches!(b, b'-' | b'+' | b'.') || b.is_ascii_digit() => parse_number(cursor),
        Some(b) if is_ident_byte(b) => {
            let word = cursor.take_while(is_ident_byte);
            match word {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                "null" => Ok(Value::Null),
                flag => {
                    if !cursor.eat(b':') {
                        return Err(cursor.unexpected(&format!("expected ':' after flag '{flag}'")));
                    }
                    let inner = parse_value(cursor)?;
                    Ok(Value::Flagged {
                        flag: flag.to_string(),
                        value: Box::new(inner),
                    })
                }
            }
        }
        _ => Err(cursor.unexpected("expected a value")),
    }
}

fn parse_object(cursor: &mut Cursor<'_>) -> Result<Value> {
    cursor.expect(b'{')?;
    let mut node = DocumentNode::object("", Vec::new());
    loop {
        cursor.skip_trivia()?;
        match cursor.peek() {
            Some(b'}') => {
                cursor.bump();
                return Ok(node.value);
            }
            Some(b',') => {
                cursor.bump();
            }
            Some(b'"') => {
                let key = cursor.quoted_string()?;
                let value = parse_member_value(cursor)?;
                node.insert(DocumentNode { name: key, value });
            }
            Some(b) if is_ident_byte(b) => {
                let key = cursor.take_while(is_ident_byte).to_string();
                let value = parse_member_value(cursor)?;
                node.insert(DocumentNode { name: key, value });
            }
            None => return Err(Error::UnexpectedEof("unterminated object".into())),
            _ => return Err(cursor.unexpected("expected a key or '}'")),
        }
    }
}

fn parse_member_value(cursor: &mut Cursor<'_>) -> Result<Value> {
    cursor.skip_trivia()?;
    cursor.expect(b'=')?;
    parse_value(cursor)
}

fn parse_array(cursor: &mut Cursor<'_>) -> Result<Value> {
    cursor.expect(b'[')?;
    let mut items = Vec::new();
    loop {
        cursor.skip_trivia()?;
        match cursor.peek() {
            Some(b']') => {
                cursor.bump();
                return Ok(Value::Array(items));
            }
            Some(b',') => {
                cursor.bump();
            }
            None => return Err(Error::UnexpectedEof("unterminated array".into())),
            _ => items.push(parse_value(cursor)?),
        }
    }
}

fn parse_binary(cursor: &mut Cursor<'_>) -> Result<Value> {
    cursor.advance(2);
    let body = cursor.take_until("]")?;
    let digits: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if !digits.is_ascii() || digits.len() % 2 != 0 {
        return Err(cursor.unexpected("malformed binary blob"));
    }
    let bytes = (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16))
        .collect::<std::result::Result<Vec<u8>, _>>()
        .map_err(|_| cursor.unexpected("invalid hex digit in binary blob"))?;
    Ok(Value::Binary(bytes))
}

fn parse_number(cursor: &mut Cursor<'_>) -> Result<Value> {
    let text = cursor.take_while(|b| {
        b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E')
    });
    let is_float = text.contains(['.', 'e', 'E']);
    if !is_float {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Int(i));
        }
    }
    text.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| cursor.unexpected(&format!("invalid number '{text}'")))
}

/// KV3 multi-line strings start and end on their own lines; those two
/// newlines are delimiters rather than content.
fn strip_multiline(body: &str) -> String {
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    let body = body
        .strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body);
    body.to_string()
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key.bytes().all(is_ident_byte)
        && !key.as_bytes()[0].is_ascii_digit()
        && !matches!(key, "true" | "false" | "null")
}

fn write_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_key(out: &mut String, key: &str) {
    if is_bare_key(key) {
        out.push_str(key);
    } else {
        let _ = write!(out, "\"{}\"", escape(key));
    }
}

fn is_block(value: &Value) -> bool {
    match value {
        Value::Object(children) => !children.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

pub(crate) fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => out.push_str(&format_float(*f)),
        Value::String(s) if s.contains('\n') && !s.contains("\"\"\"") => {
            let _ = write!(out, "\"\"\"\n{s}\n\"\"\"");
        }
        Value::String(s) => {
            let _ = write!(out, "\"{}\"", escape(s));
        }
        Value::Binary(bytes) => {
            out.push_str("#[");
            for b in bytes {
                let _ = write!(out, " {b:02X}");
            }
            out.push_str(" ]");
        }
        Value::Flagged { flag, value } => {
            out.push_str(flag);
            out.push(':');
            write_value(out, value, depth);
        }
        Value::Object(children) if children.is_empty() => out.push_str("{}"),
        Value::Object(children) => {
            out.push_str("{\n");
            for child in children {
                write_indent(out, depth + 1);
                write_key(out, &child.name);
                out.push_str(" =");
                if is_block(child.value.unflagged()) && !matches!(child.value, Value::Flagged { .. })
                {
                    out.push('\n');
                    write_indent(out, depth + 1);
                } else {
                    out.push(' ');
                }
                write_value(out, &child.value, depth + 1);
                out.push('\n');
            }
            write_indent(out, depth);
            out.push('}');
        }
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for item in items {
                write_indent(out, depth + 1);
                write_value(out, item, depth + 1);
                out.push_str(",\n");
            }
            write_indent(out, depth);
            out.push(']');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<!-- kv3 encoding:text:version{e21c7f3c-8a33-41c5-9977-a76d3a32aa0d} format:generic:version{7412167c-06e9-4698-aff2-e63eb59037e7} -->
{
	_include =
	[
		"resource_name:scripts/abilities_base.vdata",
	]
	// comment between entries
	ability_charge =
	{
		_class = "ability_charge"
		m_eAbilityType = "EAbilityType_Signature"
		m_strAbilityImage = panorama:"file://{images}/hud/charge.psd"
		m_flCooldown = 15.5
		m_nMaxCharges = -1
		m_bHidden = false
		m_Blob = #[ 0A FF ]
		m_strNotes = """
line one
line two
"""
	}
	"quoted key" = null
}
"#;

    #[test]
    fn parses_sample() {
        let doc = parse(SAMPLE).unwrap();
        assert!(doc.header.starts_with("<!-- kv3"));

        let charge = doc.root.find_child("ability_charge").unwrap();
        assert_eq!(
            charge.find_child("m_eAbilityType").unwrap().value.as_str(),
            Some("EAbilityType_Signature")
        );
        assert_eq!(
            charge.find_child("m_flCooldown").unwrap().value,
            Value::Float(15.5)
        );
        assert_eq!(charge.find_child("m_nMaxCharges").unwrap().value, Value::Int(-1));
        assert_eq!(
            charge.find_child("m_Blob").unwrap().value,
            Value::Binary(vec![0x0A, 0xFF])
        );
        assert_eq!(
            charge.find_child("m_strNotes").unwrap().value.as_str(),
            Some("line one\nline two")
        );
        match &charge.find_child("m_strAbilityImage").unwrap().value {
            Value::Flagged { flag, value } => {
                assert_eq!(flag, "panorama");
                assert_eq!(value.as_str(), Some("file://{images}/hud/charge.psd"));
            }
            other => panic!("expected flagged value, got {other:?}"),
        }
        assert_eq!(doc.root.find_child("quoted key").unwrap().value, Value::Null);
    }

    #[test]
    fn round_trip_preserves_structure_and_order() {
        let doc = parse(SAMPLE).unwrap();
        let text = to_string(&doc);
        let reparsed = parse(&text).unwrap();
        assert_eq!(doc, reparsed);

        let names: Vec<_> = reparsed.root.children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["_include", "ability_charge", "quoted key"]);
    }

    #[test]
    fn serialization_is_stable() {
        let doc = parse(SAMPLE).unwrap();
        let once = to_string(&doc);
        let twice = to_string(&parse(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn clear_includes_empties_directive() {
        let mut doc = parse(SAMPLE).unwrap();
        assert!(doc.clear_includes());
        assert_eq!(
            doc.root.find_child(INCLUDE_KEY).unwrap().value,
            Value::Array(vec![])
        );
        assert_eq!(doc.root.child_index(INCLUDE_KEY), Some(0));
        assert!(to_string(&doc).contains("_include = []"));
    }

    #[test]
    fn clear_includes_without_directive() {
        let mut doc = parse("{ a = 1 }").unwrap();
        assert!(!doc.clear_includes());
        assert_eq!(doc.header, DEFAULT_HEADER);
    }

    #[test]
    fn floats_keep_their_type() {
        let doc = parse("{ a = 1.0 b = 2 c = 1e-05 }").unwrap();
        let reparsed = parse(&to_string(&doc)).unwrap();
        assert_eq!(reparsed.root.find_child("a").unwrap().value, Value::Float(1.0));
        assert_eq!(reparsed.root.find_child("b").unwrap().value, Value::Int(2));
        assert_eq!(reparsed.root.find_child("c").unwrap().value, Value::Float(1e-5));
    }

    #[test]
    fn rejects_non_object_root() {
        assert_eq!(parse("[1, 2]"), Err(Error::RootNotObject));
    }

    #[test]
    fn rejects_unterminated_object() {
        assert!(matches!(parse("{ a = 1"), Err(Error::UnexpectedEof(_))));
    }

    #[test]
    fn rejects_missing_equals() {
        assert!(matches!(parse("{ a 1 }"), Err(Error::Parse { .. })));
    }
}
