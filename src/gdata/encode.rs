//! Upload body encoding
//!
//! Builds the create-photo request body using one of two strategies: the raw
//! image bytes with a `Slug` header, or an RFC 2387 multipart/related body
//! combining an Atom metadata part with a base64 binary part. The multipart
//! layout is assembled by hand; the album service is strict about the exact
//! boundary and CRLF placement, so this stays a small tested function rather
//! than a general MIME library.

use base64::Engine;

/// Boundary token separating the multipart body's two parts. Underscores
/// keep it out of the base64 alphabet, so it can never collide with the
/// encoded payload.
pub const BOUNDARY: &str = "END_OF_PART";

/// Maximum slug length the album service accepts
pub const MAX_SLUG_LEN: usize = 255;

/// Substituted when a slug would otherwise be empty
const EMPTY_SLUG: &str = "empty";

/// Body strategy for the create-photo request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadEncoding {
    /// RFC 2387 multipart/related carrying metadata XML plus the image.
    /// Canonical strategy.
    Multipart,
    /// Image bytes as-is, filename hint via the `Slug` header
    RawBinary,
}

/// A fully assembled request body plus the headers it requires
#[derive(Debug, Clone)]
pub struct EncodedUpload {
    /// Request body bytes
    pub body: Vec<u8>,
    /// Value for the `Content-Type` header
    pub content_type: String,
    /// Value for the `Slug` header (raw-binary strategy only)
    pub slug: Option<String>,
    /// Whether the request must carry `MIME-version: 1.0`
    pub mime_version: bool,
}

/// Derive the filename/title slug from the image URL.
///
/// The service mishandles identifiers longer than 255 characters, so longer
/// URLs are cut to their first 255 characters; an empty URL becomes the
/// literal placeholder.
pub fn slug(image_url: &str) -> String {
    let truncated: String = image_url.chars().take(MAX_SLUG_LEN).collect();
    if truncated.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        truncated
    }
}

/// Escape text for interpolation into an XML document.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Atom entry declaring the new photo: title, page/image summary, and the
/// kind category marking it as a photo entry.
pub fn photo_entry_xml(title_slug: &str, page_url: &str, image_url: &str) -> String {
    format!(
        concat!(
            r#"<entry xmlns="http://www.w3.org/2005/Atom">"#,
            "<title>{}</title>",
            "<summary>{}\n{}</summary>",
            r#"<category scheme="http://schemas.google.com/g/2005#kind" "#,
            r#"term="http://schemas.google.com/photos/2007#photo"/>"#,
            "</entry>"
        ),
        xml_escape(title_slug),
        xml_escape(page_url),
        xml_escape(image_url),
    )
}

/// Summary-only Atom entry used to patch the photo's description.
pub fn summary_entry_xml(page_url: &str, image_url: &str) -> String {
    format!(
        concat!(
            r#"<entry xmlns="http://www.w3.org/2005/Atom">"#,
            "<summary>{}\n{}</summary>",
            "</entry>"
        ),
        xml_escape(page_url),
        xml_escape(image_url),
    )
}

/// Assemble the RFC 2387 multipart/related body: metadata XML first, base64
/// image second, `--boundary` before each part and `--boundary--` after the
/// last, CRLF between every structural element.
pub fn multipart_related(
    metadata_xml: &str,
    image_bytes: &[u8],
    content_type: &str,
    boundary: &str,
) -> Vec<u8> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(image_bytes);

    let mut body = Vec::with_capacity(metadata_xml.len() + encoded.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/atom+xml\r\n");
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(metadata_xml.as_bytes());
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    body.extend_from_slice(b"Content-Transfer-Encoding: base64\r\n");
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(encoded.as_bytes());
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{}--", boundary).as_bytes());
    body
}

/// Build the request body and companion headers for the chosen strategy.
pub fn encode_upload(
    encoding: UploadEncoding,
    image_url: &str,
    page_url: &str,
    image_bytes: &[u8],
    image_content_type: &str,
) -> EncodedUpload {
    match encoding {
        UploadEncoding::Multipart => {
            let xml = photo_entry_xml(&slug(image_url), page_url, image_url);
            EncodedUpload {
                body: multipart_related(&xml, image_bytes, image_content_type, BOUNDARY),
                content_type: format!("multipart/related; boundary={}", BOUNDARY),
                slug: None,
                mime_version: true,
            }
        }
        UploadEncoding::RawBinary => EncodedUpload {
            body: image_bytes.to_vec(),
            content_type: image_content_type.to_string(),
            slug: Some(slug(image_url)),
            mime_version: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_short_url_unchanged() {
        assert_eq!(slug("http://example.com/cat.png"), "http://example.com/cat.png");
    }

    #[test]
    fn test_slug_long_url_truncated() {
        let url = format!("http://example.com/{}", "a".repeat(300));
        let s = slug(&url);
        assert_eq!(s.chars().count(), 255);
        assert_eq!(s, url.chars().take(255).collect::<String>());
    }

    #[test]
    fn test_slug_truncation_respects_multibyte_chars() {
        let url = "é".repeat(300);
        let s = slug(&url);
        assert_eq!(s.chars().count(), 255);
        assert!(s.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_slug_empty_url_gets_placeholder() {
        assert_eq!(slug(""), "empty");
        assert_ne!(slug(""), "");
    }

    #[test]
    fn test_xml_escape_special_chars() {
        assert_eq!(
            xml_escape(r#"a<b>&"c'"#),
            "a&lt;b&gt;&amp;&quot;c&apos;"
        );
    }

    #[test]
    fn test_xml_escape_plain_text_unchanged() {
        assert_eq!(xml_escape("plain text 123"), "plain text 123");
    }

    #[test]
    fn test_photo_entry_xml_escapes_urls() {
        let xml = photo_entry_xml(
            "title",
            "http://example.com/?a=1&b=<2>",
            "http://example.com/img.png",
        );
        assert!(xml.contains("http://example.com/?a=1&amp;b=&lt;2&gt;"));
        assert!(!xml.contains("b=<2>"));
        assert!(xml.contains(r#"term="http://schemas.google.com/photos/2007#photo""#));
        assert!(xml.contains(r#"scheme="http://schemas.google.com/g/2005#kind""#));
    }

    #[test]
    fn test_photo_entry_xml_summary_has_both_urls_on_separate_lines() {
        let xml = photo_entry_xml("t", "http://page", "http://image");
        assert!(xml.contains("<summary>http://page\nhttp://image</summary>"));
    }

    #[test]
    fn test_summary_entry_xml_has_no_title_or_category() {
        let xml = summary_entry_xml("http://page", "http://image");
        assert!(xml.contains("<summary>http://page\nhttp://image</summary>"));
        assert!(!xml.contains("<title>"));
        assert!(!xml.contains("<category"));
    }

    #[test]
    fn test_multipart_has_exactly_two_parts_in_order() {
        let xml = photo_entry_xml("t", "http://page", "http://image");
        let body = multipart_related(&xml, b"imagedata", "image/png", BOUNDARY);
        let text = String::from_utf8(body).unwrap();

        let delimiter = format!("--{}\r\n", BOUNDARY);
        let parts: Vec<&str> = text.split(&delimiter).collect();
        // First split element is the empty prefix before the opening boundary
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "");
        assert!(parts[1].starts_with("Content-Type: application/atom+xml\r\n"));
        assert!(parts[2].starts_with("Content-Type: image/png\r\n"));
        assert!(parts[2].contains("Content-Transfer-Encoding: base64\r\n"));
    }

    #[test]
    fn test_multipart_ends_with_closing_delimiter() {
        let body = multipart_related("<entry/>", b"x", "image/jpeg", BOUNDARY);
        let text = String::from_utf8(body).unwrap();
        assert!(text.ends_with(&format!("--{}--", BOUNDARY)));
    }

    #[test]
    fn test_multipart_payload_is_base64_of_image_bytes() {
        let body = multipart_related("<entry/>", b"hello world", "image/png", BOUNDARY);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("aGVsbG8gd29ybGQ="));
        assert!(!text.contains("hello world"));
    }

    #[test]
    fn test_multipart_uses_crlf_between_headers_and_body() {
        let body = multipart_related("<entry/>", b"x", "image/png", BOUNDARY);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("Content-Type: application/atom+xml\r\n\r\n<entry/>\r\n"));
        assert!(text.contains("Content-Transfer-Encoding: base64\r\n\r\n"));
    }

    #[test]
    fn test_encode_upload_multipart_headers() {
        let encoded = encode_upload(
            UploadEncoding::Multipart,
            "http://example.com/img.png",
            "http://example.com/page",
            b"data",
            "image/png",
        );
        assert_eq!(
            encoded.content_type,
            format!("multipart/related; boundary={}", BOUNDARY)
        );
        assert!(encoded.mime_version);
        assert!(encoded.slug.is_none());
    }

    #[test]
    fn test_encode_upload_raw_binary_passes_bytes_through() {
        let encoded = encode_upload(
            UploadEncoding::RawBinary,
            "http://example.com/img.jpg",
            "http://example.com/page",
            b"rawdata",
            "image/jpeg",
        );
        assert_eq!(encoded.body, b"rawdata");
        assert_eq!(encoded.content_type, "image/jpeg");
        assert_eq!(encoded.slug.as_deref(), Some("http://example.com/img.jpg"));
        assert!(!encoded.mime_version);
    }
}
