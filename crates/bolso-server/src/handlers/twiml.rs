//! TwiML replies for the messaging gateway

/// Escape text for an XML element body
pub fn escape_xml(text: &str) -> String {
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

/// `<Response>` with one `<Message>` per reply, in order
pub fn messaging_response(replies: &[String]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
    for reply in replies {
        out.push_str("<Message>");
        out.push_str(&escape_xml(reply));
        out.push_str("</Message>");
    }
    out.push_str("</Response>");
    out
}
