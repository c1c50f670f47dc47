use anyhow::{Result, anyhow, bail};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

use super::xml::attr_string;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentComment {
    pub comment_id: Option<String>,
    pub author: Option<String>,
    pub initials: Option<String>,
    pub timestamp: Option<String>,
    pub text: String,
}

/// Parses `word/comments.xml`; a comment's paragraphs are joined with newlines.
pub fn parse_comments_xml(xml: &str) -> Result<Vec<DocumentComment>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut comments = Vec::new();
    let mut current: Option<(DocumentComment, Vec<String>)> = None;
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:comment" => {
                    let comment = DocumentComment {
                        comment_id: attr_string(e, b"w:id"),
                        author: attr_string(e, b"w:author").filter(|value| !value.is_empty()),
                        initials: attr_string(e, b"w:initials").filter(|value| !value.is_empty()),
                        timestamp: attr_string(e, b"w:date").filter(|value| !value.is_empty()),
                        text: String::new(),
                    };
                    current = Some((comment, Vec::new()));
                }
                b"w:p" => {
                    if let Some((_, paragraphs)) = current.as_mut() {
                        paragraphs.push(String::new());
                    }
                }
                b"w:t" => in_text = current.is_some(),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| anyhow!("failed to decode comment text: {err}"))?;
                if let Some(paragraph) = current
                    .as_mut()
                    .and_then(|(_, paragraphs)| paragraphs.last_mut())
                {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:comment" => {
                    if let Some((mut comment, paragraphs)) = current.take() {
                        comment.text = paragraphs.join("\n").trim().to_string();
                        comments.push(comment);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => bail!("failed to parse comments part: {err}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(comments)
}
