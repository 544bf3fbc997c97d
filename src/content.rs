use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

static NO_CONTENT: Value = Value::Null;

lazy_static! {
    static ref LINE_BREAK: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// One block of an article body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Header { level: u8, text: String },
    Paragraph(String),
    Quote { text: String, author: Option<String> },
    User { name: String, bio: String },
    Image { url: String, caption: Option<String> },
    List { ordered: bool, items: Vec<String> },
    Divider,
    Code(String),
    Link { url: String, text: String, description: Option<String> },
    Unknown(String),
}

/// Strip inline markup and decode entities.
pub fn plain_text(raw: &str) -> String {
    let text = LINE_BREAK.replace_all(raw, "\n");
    let text = TAG.replace_all(&text, "");
    html_escape::decode_html_entities(&text).trim().to_string()
}

fn str_at(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(plain_text)
        .filter(|text| !text.is_empty())
}

fn text_at(value: &Value, key: &str) -> String {
    str_at(value, key).unwrap_or_default()
}

/// Decode the serialized body of an article.
///
/// Accepts the section list the site editor writes and the older block
/// document (`{ "blocks": [...] }`). Anything else, including blank or
/// unparseable content, decodes to no sections.
pub fn parse_sections(raw: &str) -> Vec<Section> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let document: Value = match serde_json::from_str(raw) {
        Ok(document) => document,
        Err(e) => {
            log::warn!("Error parsing content for display: {}", e);
            return Vec::new();
        }
    };

    if let Some(sections) = document.as_array() {
        return parse_section_list(sections);
    }
    if let Some(blocks) = document.get("blocks").and_then(Value::as_array) {
        return blocks.iter().map(convert_block).collect();
    }
    Vec::new()
}

fn parse_section_list(sections: &[Value]) -> Vec<Section> {
    let mut ordered: Vec<(i64, usize, Section)> = sections
        .iter()
        .enumerate()
        .map(|(index, section)| {
            let order = section
                .get("order")
                .and_then(Value::as_i64)
                .unwrap_or(index as i64);
            (order, index, parse_section(section))
        })
        .collect();

    // Stable on ties: fall back to the position in the document
    ordered.sort_by_key(|(order, index, _)| (*order, *index));
    ordered.into_iter().map(|(_, _, section)| section).collect()
}

fn parse_section(section: &Value) -> Section {
    let kind = section.get("type").and_then(Value::as_str).unwrap_or("");
    let content = section.get("content").unwrap_or(&NO_CONTENT);

    match kind {
        "header" => Section::Header {
            level: content
                .get("level")
                .and_then(Value::as_u64)
                .map(|level| level.clamp(1, 6) as u8)
                .unwrap_or(2),
            text: text_at(content, "text"),
        },
        "paragraph" => Section::Paragraph(text_at(content, "text")),
        "quote" => Section::Quote {
            text: text_at(content, "text"),
            author: str_at(content, "author"),
        },
        "user" => Section::User {
            name: text_at(content, "name"),
            bio: text_at(content, "bio"),
        },
        "image" => Section::Image {
            url: content
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            caption: str_at(content, "caption"),
        },
        "list" => Section::List {
            ordered: content
                .get("ordered")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            items: content
                .get("items")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(plain_text)
                        .collect()
                })
                .unwrap_or_default(),
        },
        "divider" => Section::Divider,
        // Code is shown verbatim
        "code" => Section::Code(
            content
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        "link" => {
            let url = content
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let text = str_at(content, "text").unwrap_or_else(|| url.clone());
            Section::Link {
                url,
                text,
                description: str_at(content, "description"),
            }
        }
        other => Section::Unknown(other.to_string()),
    }
}

/// Legacy block documents carry `{ type, data }` per block.
fn convert_block(block: &Value) -> Section {
    let data = block.get("data").unwrap_or(&NO_CONTENT);
    match block.get("type").and_then(Value::as_str) {
        Some("header") => Section::Header {
            level: data
                .get("level")
                .and_then(Value::as_u64)
                .map(|level| level.clamp(1, 6) as u8)
                .unwrap_or(2),
            text: text_at(data, "text"),
        },
        Some("paragraph") => Section::Paragraph(text_at(data, "text")),
        Some("quote") => Section::Quote {
            text: text_at(data, "text"),
            author: str_at(data, "caption"),
        },
        _ => Section::Paragraph(
            str_at(data, "text").unwrap_or_else(|| "Converted content".to_string()),
        ),
    }
}
