//! KeyValues (v1) text reader and writer, as used by `gameinfo.gi` and
//! Steam's `libraryfolders.vdf`.
//!
//! Every scalar is a string. Keys may repeat inside a block; the returned root
//! node is an unnamed object holding the top-level pairs. Platform
//! conditionals (`"key" "value" [$WIN32]`, `Block [$WIN32] { ... }`) are kept
//! as a [`Value::Flagged`] whose flag is the condition text.

use crate::error::{Error, Result};
use crate::lexer::{escape, Cursor};
use crate::node::{DocumentNode, Value};
use std::fmt::Write as _;

/// Parse a KV1 document.
pub fn parse(text: &str) -> Result<DocumentNode> {
    let mut cursor = Cursor::new(text);
    let children = parse_pairs(&mut cursor, false)?;
    Ok(DocumentNode::object("", children))
}

/// Serialize a root produced by [`parse`] (or built by hand) back to text.
pub fn to_string(root: &DocumentNode) -> String {
    let mut out = String::new();
    for child in root.children() {
        write_pair(&mut out, child, 0);
    }
    out
}

fn is_token_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'{' | b'}' | b'"')
}

fn read_token(cursor: &mut Cursor<'_>) -> Result<String> {
    match cursor.peek() {
        Some(b'"') => cursor.quoted_string(),
        Some(b) if is_token_byte(b) => Ok(cursor.take_while(is_token_byte).to_string()),
        _ => Err(cursor.unexpected("expected a token")),
    }
}

fn parse_pairs(cursor: &mut Cursor<'_>, nested: bool) -> Result<Vec<DocumentNode>> {
    let mut pairs = Vec::new();
    loop {
        cursor.skip_trivia()?;
        match cursor.peek() {
            None if nested => return Err(Error::UnexpectedEof("unterminated block".into())),
            None => return Ok(pairs),
            Some(b'}') if nested => {
                cursor.bump();
                return Ok(pairs);
            }
            Some(b'}') => return Err(cursor.unexpected("unbalanced '}'")),
            Some(_) => {
                let key = read_token(cursor)?;
                let leading = read_condition(cursor)?;
                let value = if cursor.eat(b'{') {
                    Value::Object(parse_pairs(cursor, true)?)
                } else {
                    Value::String(read_token(cursor)?)
                };
                let condition = match leading {
                    Some(condition) => Some(condition),
                    None => read_condition(cursor)?,
                };
                let value = match condition {
                    Some(flag) => Value::Flagged {
                        flag,
                        value: Box::new(value),
                    },
                    None => value,
                };
                pairs.push(DocumentNode { name: key, value });
            }
        }
    }
}

/// Read a `[$PLATFORM]` / `[!$PLATFORM]` conditional if one follows.
fn read_condition(cursor: &mut Cursor<'_>) -> Result<Option<String>> {
    cursor.skip_trivia()?;
    if cursor.starts_with("[$") || cursor.starts_with("[!$") {
        cursor.bump();
        let condition = cursor.take_until("]")?.to_string();
        cursor.skip_trivia()?;
        return Ok(Some(condition));
    }
    Ok(None)
}

fn write_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => crate::kv3::format_float(*f),
        Value::String(s) => s.clone(),
        Value::Binary(bytes) => bytes.iter().map(|b| format!("{b:02X}")).collect(),
        Value::Array(_) | Value::Object(_) | Value::Flagged { .. } => String::new(),
    }
}

fn write_pair(out: &mut String, node: &DocumentNode, depth: usize) {
    let (value, condition) = match &node.value {
        Value::Flagged { flag, value } => (value.as_ref(), Some(flag.as_str())),
        other => (other, None),
    };

    write_indent(out, depth);
    let _ = write!(out, "\"{}\"", escape(&node.name));

    match value {
        Value::Object(children) => {
            if let Some(condition) = condition {
                let _ = write!(out, " [{condition}]");
            }
            out.push('\n');
            write_indent(out, depth);
            out.push_str("{\n");
            for child in children {
                write_pair(out, child, depth + 1);
            }
            write_indent(out, depth);
            out.push_str("}\n");
        }
        Value::Array(items) => {
            // KV1 has no arrays; emit one pair per element under the same key.
            out.push('\n');
            for item in items {
                write_pair(
                    out,
                    &DocumentNode {
                        name: node.name.clone(),
                        value: item.clone(),
                    },
                    depth,
                );
            }
        }
        scalar => {
            let _ = write!(out, "\t\t\"{}\"", escape(&scalar_text(scalar)));
            if let Some(condition) = condition {
                let _ = write!(out, " [{condition}]");
            }
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GAMEINFO: &str = r#"
"GameInfo"
{
	game		"citadel"
	FileSystem
	{
		SearchPaths
		{
			Mod		citadel
			Write	citadel
			Game	citadel
			Write	core
			Mod		core
			Game	core
		}
	}
	ToolsEnvironment [$WIN32]
	{
		"Engine"	"Source 2"
	}
	// trailing comment
}
"#;

    #[test]
    fn parses_repeated_keys_in_order() {
        let root = parse(GAMEINFO).unwrap();
        let search_paths = root
            .find_path(&["GameInfo", "FileSystem", "SearchPaths"])
            .unwrap();

        let games: Vec<_> = search_paths
            .find_all("Game")
            .filter_map(|n| n.value.as_str())
            .collect();
        assert_eq!(games, vec!["citadel", "core"]);
        assert_eq!(search_paths.children().len(), 6);
    }

    #[test]
    fn keeps_conditionals() {
        let root = parse(GAMEINFO).unwrap();
        let tools = root.find_path(&["GameInfo", "ToolsEnvironment"]).unwrap();
        assert!(matches!(&tools.value, Value::Flagged { flag, .. } if flag == "$WIN32"));
        assert_eq!(
            tools.find_child("Engine").and_then(|n| n.value.as_str()),
            Some("Source 2")
        );
    }

    #[test]
    fn round_trip() {
        let root = parse(GAMEINFO).unwrap();
        let text = to_string(&root);
        assert_eq!(parse(&text).unwrap(), root);
    }

    #[test]
    fn reads_block_condition_before_brace_on_one_line() {
        let root =
            parse(r#""GameInfo" { "ToolsEnvironment" [$WIN32] { "Engine" "Source 2" } }"#).unwrap();
        let tools = root.find_path(&["GameInfo", "ToolsEnvironment"]).unwrap();
        assert!(matches!(&tools.value, Value::Flagged { flag, .. } if flag == "$WIN32"));
        assert_eq!(
            tools.find_child("Engine").and_then(|n| n.value.as_str()),
            Some("Source 2")
        );
    }

    #[test]
    fn reads_condition_between_key_and_scalar() {
        let root = parse("\"k\" [$X] \"v\"\n\"next\" \"1\"").unwrap();
        let k = root.find_child("k").unwrap();
        assert_eq!(
            k.value,
            Value::Flagged {
                flag: "$X".to_string(),
                value: Box::new(Value::String("v".to_string())),
            }
        );
        assert_eq!(k.value.as_str(), Some("v"));
        assert_eq!(root.find_child("next").and_then(|n| n.value.as_str()), Some("1"));
    }

    #[test]
    fn reparses_written_conditional_block() {
        let root = DocumentNode::object(
            "",
            vec![DocumentNode {
                name: "Tools".to_string(),
                value: Value::Flagged {
                    flag: "$WIN32".to_string(),
                    value: Box::new(Value::Object(vec![DocumentNode::new("a", "b")])),
                },
            }],
        );
        let text = to_string(&root);
        assert_eq!(text, "\"Tools\" [$WIN32]\n{\n\t\"a\"\t\t\"b\"\n}\n");
        assert_eq!(parse(&text).unwrap(), root);
    }

    #[test]
    fn parses_windows_paths() {
        let root = parse(r#""libraryfolders" { "0" { "path" "C:\\Program Files (x86)\\Steam" } }"#)
            .unwrap();
        assert_eq!(
            root.find_path(&["libraryfolders", "0", "path"])
                .and_then(|n| n.value.as_str()),
            Some(r"C:\Program Files (x86)\Steam")
        );
    }

    #[test]
    fn rejects_unterminated_block() {
        assert!(matches!(parse("\"a\" {"), Err(Error::UnexpectedEof(_))));
    }

    #[test]
    fn rejects_stray_brace() {
        assert!(matches!(parse("}"), Err(Error::Parse { .. })));
    }
}
