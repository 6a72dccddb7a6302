use engine_logging::engine_trace;
use serde_json::Value;

use super::BlockNode;

const INDENT: &str = "  ";

/// Renders a page's block tree to markdown.
///
/// Consecutive list items are separated by a single newline, everything else
/// by a blank line. Unknown block types are dropped.
pub(crate) fn render_blocks(blocks: &[BlockNode]) -> String {
    let mut out = String::new();
    let mut prev_list_item = false;
    let mut number = 0usize;

    for node in blocks {
        let kind = node.block.kind.as_str();
        number = if kind == "numbered_list_item" { number + 1 } else { 0 };
        let Some(rendered) = render_block(node, number) else {
            continue;
        };
        let list_item = is_list_item(kind);
        if !out.is_empty() {
            out.push_str(if list_item && prev_list_item { "\n" } else { "\n\n" });
        }
        out.push_str(&rendered);
        prev_list_item = list_item;
    }
    out
}

fn is_list_item(kind: &str) -> bool {
    matches!(kind, "bulleted_list_item" | "numbered_list_item" | "to_do")
}

fn render_block(node: &BlockNode, number: usize) -> Option<String> {
    let block = &node.block;
    let payload = block.payload();
    let text = || payload.map(|p| rich_text(&p["rich_text"])).unwrap_or_default();

    let rendered = match block.kind.as_str() {
        "paragraph" => {
            let text = text();
            if text.is_empty() && node.children.is_empty() {
                return None;
            }
            with_children(text, &node.children)
        }
        "heading_1" => format!("# {}", text()),
        "heading_2" => format!("## {}", text()),
        "heading_3" => format!("### {}", text()),
        "bulleted_list_item" => nested(format!("- {}", text()), &node.children),
        "numbered_list_item" => nested(format!("{number}. {}", text()), &node.children),
        "to_do" => {
            let checked = payload
                .and_then(|p| p["checked"].as_bool())
                .unwrap_or(false);
            let mark = if checked { "x" } else { " " };
            nested(format!("- [{mark}] {}", text()), &node.children)
        }
        "toggle" => nested(text(), &node.children),
        "quote" | "callout" => {
            let body = with_children(text(), &node.children);
            quote_lines(&body)
        }
        "code" => {
            let language = payload
                .and_then(|p| p["language"].as_str())
                .filter(|lang| *lang != "plain text")
                .unwrap_or("");
            let code = payload.map(|p| plain_text(&p["rich_text"])).unwrap_or_default();
            format!("```{language}\n{code}\n```")
        }
        "divider" => "---".to_string(),
        "equation" => {
            let expression = payload
                .and_then(|p| p["expression"].as_str())
                .unwrap_or("");
            format!("$$\n{expression}\n$$")
        }
        "image" => {
            let url = payload.and_then(file_url)?;
            let caption = payload.map(|p| plain_text(&p["caption"])).unwrap_or_default();
            format!("![{caption}]({url})")
        }
        "bookmark" | "embed" | "link_preview" => {
            let url = payload.and_then(|p| p["url"].as_str())?;
            let caption = payload.map(|p| plain_text(&p["caption"])).unwrap_or_default();
            if caption.is_empty() {
                format!("<{url}>")
            } else {
                format!("[{caption}]({url})")
            }
        }
        other => {
            engine_trace!("Skipping unsupported block type {} ({})", other, block.id);
            return None;
        }
    };
    Some(rendered)
}

/// `file.url` for uploaded files, `external.url` for linked ones.
fn file_url(payload: &Value) -> Option<&str> {
    let source = payload["type"].as_str()?;
    payload[source]["url"].as_str()
}

fn nested(head: String, children: &[BlockNode]) -> String {
    if children.is_empty() {
        return head;
    }
    let body = render_blocks(children);
    format!("{head}\n{}", indent_lines(&body))
}

fn with_children(head: String, children: &[BlockNode]) -> String {
    if children.is_empty() {
        return head;
    }
    format!("{head}\n\n{}", render_blocks(children))
}

fn indent_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn plain_text(rich: &Value) -> String {
    rich.as_array()
        .map(|segments| {
            segments
                .iter()
                .filter_map(|s| s["plain_text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Applies annotations and links to each rich-text segment.
fn rich_text(rich: &Value) -> String {
    let Some(segments) = rich.as_array() else {
        return String::new();
    };
    let mut out = String::new();
    for segment in segments {
        let text = segment["plain_text"].as_str().unwrap_or("");
        if text.trim().is_empty() {
            out.push_str(text);
            continue;
        }
        let mut piece = if segment["type"] == "equation" {
            format!("${text}$")
        } else {
            text.to_string()
        };
        let annotations = &segment["annotations"];
        let flag = |name: &str| annotations[name].as_bool().unwrap_or(false);
        if flag("code") {
            piece = format!("`{piece}`");
        }
        if flag("bold") {
            piece = format!("**{piece}**");
        }
        if flag("italic") {
            piece = format!("_{piece}_");
        }
        if flag("strikethrough") {
            piece = format!("~~{piece}~~");
        }
        if let Some(href) = segment["href"].as_str() {
            piece = format!("[{piece}]({href})");
        }
        out.push_str(&piece);
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::notion::RawBlock;

    fn block(value: Value) -> BlockNode {
        BlockNode {
            block: serde_json::from_value::<RawBlock>(value).unwrap(),
            children: Vec::new(),
        }
    }

    fn text_block(kind: &str, text: &str) -> BlockNode {
        block(json!({
            "id": format!("{kind}-{text}"),
            "type": kind,
            kind: { "rich_text": [ { "type": "text", "plain_text": text, "annotations": {} } ] }
        }))
    }

    #[test]
    fn headings_and_paragraphs_are_separated_by_blank_lines() {
        let blocks = vec![text_block("heading_1", "Title"), text_block("paragraph", "Body")];
        assert_eq!(render_blocks(&blocks), "# Title\n\nBody");
    }

    #[test]
    fn list_items_are_tight_and_numbered() {
        let blocks = vec![
            text_block("numbered_list_item", "one"),
            text_block("numbered_list_item", "two"),
            text_block("paragraph", "after"),
            text_block("bulleted_list_item", "dot"),
        ];
        assert_eq!(render_blocks(&blocks), "1. one\n2. two\n\nafter\n\n- dot");
    }

    #[test]
    fn nested_list_children_are_indented() {
        let mut parent = text_block("bulleted_list_item", "parent");
        parent.children = vec![text_block("bulleted_list_item", "child")];
        assert_eq!(render_blocks(&[parent]), "- parent\n  - child");
    }

    #[test]
    fn annotations_and_links_are_applied() {
        let node = block(json!({
            "id": "p1",
            "type": "paragraph",
            "paragraph": { "rich_text": [
                { "type": "text", "plain_text": "bold", "annotations": { "bold": true } },
                { "type": "text", "plain_text": " and ", "annotations": {} },
                { "type": "text", "plain_text": "site", "annotations": {}, "href": "https://example.com" }
            ] }
        }));
        assert_eq!(render_blocks(&[node]), "**bold** and [site](https://example.com)");
    }

    #[test]
    fn images_become_markers_with_caption() {
        let node = block(json!({
            "id": "img",
            "type": "image",
            "image": {
                "type": "file",
                "file": { "url": "https://files.example.com/a/photo.png?sig=1" },
                "caption": [ { "type": "text", "plain_text": "A photo" } ]
            }
        }));
        assert_eq!(
            render_blocks(&[node]),
            "![A photo](https://files.example.com/a/photo.png?sig=1)"
        );
    }

    #[test]
    fn code_blocks_keep_raw_text() {
        let node = block(json!({
            "id": "c",
            "type": "code",
            "code": {
                "language": "rust",
                "rich_text": [ { "type": "text", "plain_text": "fn main() {}", "annotations": { "bold": true } } ]
            }
        }));
        assert_eq!(render_blocks(&[node]), "```rust\nfn main() {}\n```");
    }

    #[test]
    fn unknown_blocks_and_empty_paragraphs_are_dropped() {
        let blocks = vec![
            text_block("paragraph", ""),
            block(json!({ "id": "u", "type": "unsupported", "unsupported": {} })),
            text_block("quote", "wise words"),
        ];
        assert_eq!(render_blocks(&blocks), "> wise words");
    }
}
