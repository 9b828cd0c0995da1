//! MIME extraction: text body, HTML body and attachment payloads.
//!
//! Transfer encodings (base64, quoted-printable) and charsets are decoded by
//! `mail-parser`; this module only decides which part plays which role.

use mail_parser::{MessageParser, MessagePart, MimeHeaders, PartType};
use tracing::{debug, warn};

use crate::pipeline::types::{Attachment, EmailContent};

/// Maximum depth for descending into embedded `message/rfc822` parts.
const MAX_DEPTH: usize = 10;

/// Parse raw RFC 822 bytes into bodies and attachments.
///
/// Pure: the same bytes always give the same content. Input that cannot be
/// parsed at all yields empty content.
pub fn extract_content(raw: &[u8]) -> EmailContent {
    let mut content = EmailContent::default();

    let Some(message) = MessageParser::default().parse(raw) else {
        warn!(bytes = raw.len(), "Unparseable message, body will be empty");
        return content;
    };

    let Some(root) = message.parts.first() else {
        return content;
    };

    if matches!(root.body, PartType::Multipart(_)) {
        walk_parts(&message.parts, &mut content, 0);
    } else {
        match content_type(root).as_str() {
            "text/plain" => content.text_body = part_text(root),
            "text/html" => content.html_body = part_text(root),
            other => warn!(
                content_type = other,
                "Unknown content type for single-part message, body will be empty"
            ),
        }
    }

    content
}

/// Visit parts in document order, classifying each one.
fn walk_parts(parts: &[MessagePart<'_>], content: &mut EmailContent, depth: usize) {
    for part in parts {
        if let PartType::Multipart(_) = part.body {
            continue;
        }

        let ctype = content_type(part);
        let filename = part.attachment_name().filter(|name| !name.is_empty());
        let disposition = part
            .content_disposition()
            .map(|d| d.ctype().to_ascii_lowercase());

        let declared_attachment = match disposition.as_deref() {
            Some("attachment") => true,
            Some("inline") => filename.is_some(),
            _ => false,
        };
        let undeclared_file = disposition.is_none()
            && filename.is_some()
            && (ctype.starts_with("image/") || ctype.starts_with("application/"));

        if declared_attachment || undeclared_file {
            match filename {
                Some(name) => {
                    let payload = part.contents().to_vec();
                    debug!(filename = name, content_type = %ctype, size = payload.len(), "Found attachment");
                    content.attachments.push(Attachment::new(name, ctype, payload));
                }
                None => debug!(content_type = %ctype, "Skipping attachment part without filename"),
            }
            continue;
        }

        match &part.body {
            PartType::Message(inner) if depth < MAX_DEPTH => {
                walk_parts(&inner.parts, content, depth + 1);
            }
            _ if ctype == "text/plain" && content.text_body.is_empty() => {
                content.text_body = part_text(part);
            }
            _ if ctype == "text/html" && content.html_body.is_empty() => {
                content.html_body = part_text(part);
            }
            _ => {}
        }
    }
}

/// Lowercased `type/subtype`, defaulting to `text/plain`.
fn content_type(part: &MessagePart<'_>) -> String {
    match part.content_type() {
        Some(ct) => match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub).to_ascii_lowercase(),
            None => ct.ctype().to_ascii_lowercase(),
        },
        None => "text/plain".to_string(),
    }
}

/// Decoded text of a part; raw bytes are decoded lossily when the parser
/// could not produce text.
fn part_text(part: &MessagePart<'_>) -> String {
    match &part.body {
        PartType::Text(text) | PartType::Html(text) => text.to_string(),
        _ => String::from_utf8_lossy(part.contents()).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALTERNATIVE: &str = "From: alice@example.com\r\n\
To: issues@example.com\r\n\
Subject: Test\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"ALT\"\r\n\
\r\n\
--ALT\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Plain body\r\n\
--ALT\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>HTML body</p>\r\n\
--ALT--\r\n";

    #[test]
    fn multipart_alternative_both_bodies() {
        let content = extract_content(ALTERNATIVE.as_bytes());
        assert_eq!(content.text_body.trim(), "Plain body");
        assert_eq!(content.html_body.trim(), "<p>HTML body</p>");
        assert!(content.attachments.is_empty());
        assert_eq!(content.body_for_agent().trim(), "Plain body");
    }

    #[test]
    fn first_text_part_wins() {
        let raw = "Content-Type: multipart/mixed; boundary=\"B\"\r\n\
\r\n\
--B\r\n\
Content-Type: text/plain\r\n\
\r\n\
first plain\r\n\
--B\r\n\
Content-Type: text/plain\r\n\
\r\n\
second plain\r\n\
--B--\r\n";
        let content = extract_content(raw.as_bytes());
        assert_eq!(content.text_body.trim(), "first plain");
        assert!(!content.text_body.contains("second"));
    }

    #[test]
    fn attachment_with_disposition() {
        let raw = "Content-Type: multipart/mixed; boundary=\"B\"\r\n\
\r\n\
--B\r\n\
Content-Type: text/plain\r\n\
\r\n\
See attached\r\n\
--B\r\n\
Content-Type: image/png; name=\"shot.png\"\r\n\
Content-Disposition: attachment; filename=\"shot.png\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
UE5HREFUQQ==\r\n\
--B--\r\n";
        let content = extract_content(raw.as_bytes());
        assert_eq!(content.text_body.trim(), "See attached");
        assert_eq!(content.attachments.len(), 1);
        let att = &content.attachments[0];
        assert_eq!(att.filename, "shot.png");
        assert_eq!(att.content_type, "image/png");
        assert_eq!(att.content.as_deref(), Some(&b"PNGDATA"[..]));
        assert_eq!(att.size_bytes, 7);
        assert!(att.url.is_none());
    }

    #[test]
    fn inline_with_filename_is_attachment() {
        let raw = "Content-Type: multipart/related; boundary=\"B\"\r\n\
\r\n\
--B\r\n\
Content-Type: text/html\r\n\
\r\n\
<img src=\"cid:logo\">\r\n\
--B\r\n\
Content-Type: image/jpeg\r\n\
Content-Disposition: inline; filename=\"logo.jpg\"\r\n\
Content-ID: <logo>\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
SlBFRw==\r\n\
--B--\r\n";
        let content = extract_content(raw.as_bytes());
        assert_eq!(content.attachments.len(), 1);
        assert_eq!(content.attachments[0].filename, "logo.jpg");
        assert_eq!(content.attachments[0].content.as_deref(), Some(&b"JPEG"[..]));
        assert!(content.text_body.is_empty());
        assert!(content.html_body.contains("cid:logo"));
    }

    #[test]
    fn inline_text_without_filename_is_body() {
        let raw = "Content-Type: multipart/mixed; boundary=\"B\"\r\n\
\r\n\
--B\r\n\
Content-Type: text/plain\r\n\
Content-Disposition: inline\r\n\
\r\n\
Inline body\r\n\
--B--\r\n";
        let content = extract_content(raw.as_bytes());
        assert_eq!(content.text_body.trim(), "Inline body");
        assert!(content.attachments.is_empty());
    }

    #[test]
    fn named_application_part_without_disposition() {
        let raw = "Content-Type: multipart/mixed; boundary=\"B\"\r\n\
\r\n\
--B\r\n\
Content-Type: text/plain\r\n\
\r\n\
Report attached\r\n\
--B\r\n\
Content-Type: application/pdf; name=\"report.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0=\r\n\
--B--\r\n";
        let content = extract_content(raw.as_bytes());
        assert_eq!(content.attachments.len(), 1);
        assert_eq!(content.attachments[0].filename, "report.pdf");
        assert_eq!(content.attachments[0].content_type, "application/pdf");
        assert_eq!(content.attachments[0].content.as_deref(), Some(&b"%PDF-"[..]));
    }

    #[test]
    fn decodes_base64_and_quoted_printable() {
        let raw = "Content-Type: multipart/alternative; boundary=\"B\"\r\n\
\r\n\
--B\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
SGVsbG8gV29ybGQ=\r\n\
--B\r\n\
Content-Type: text/html; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
<p>caf=C3=A9</p>\r\n\
--B--\r\n";
        let content = extract_content(raw.as_bytes());
        assert_eq!(content.text_body.trim(), "Hello World");
        assert_eq!(content.html_body.trim(), "<p>café</p>");
    }

    #[test]
    fn single_part_plain() {
        let raw = "From: a@example.com\r\nSubject: hi\r\nContent-Type: text/plain\r\n\r\nJust text\r\n";
        let content = extract_content(raw.as_bytes());
        assert_eq!(content.text_body.trim(), "Just text");
        assert!(content.html_body.is_empty());
    }

    #[test]
    fn single_part_html() {
        let raw = "Subject: hi\r\nContent-Type: text/html\r\n\r\n<b>bold</b>\r\n";
        let content = extract_content(raw.as_bytes());
        assert!(content.text_body.is_empty());
        assert_eq!(content.html_body.trim(), "<b>bold</b>");
        assert_eq!(content.body_for_agent().trim(), "<b>bold</b>");
    }

    #[test]
    fn single_part_unknown_type_is_empty() {
        let raw = "Subject: hi\r\nContent-Type: application/octet-stream\r\n\r\nxxxx\r\n";
        let content = extract_content(raw.as_bytes());
        assert!(!content.has_content());
        assert!(content.attachments.is_empty());
    }

    #[test]
    fn deterministic() {
        let a = extract_content(ALTERNATIVE.as_bytes());
        let b = extract_content(ALTERNATIVE.as_bytes());
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_yields_empty_content() {
        let content = extract_content(b"");
        assert!(!content.has_content());
        assert!(content.attachments.is_empty());
    }
}
