//! Normalization of server-supplied error text into display sentences.

use url::{Host, Url};

const END_PUNCTUATION: &[char] = &['.', '?', '!'];

/// Characters a link detector does not consider part of a trailing URL.
const LINK_TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', '\'', '"'];

/// Converts a free-text server message into a well-formed sentence.
///
/// Returns `None` for absent or empty input. A message that is entirely a
/// hyperlink is returned unchanged. Otherwise a period is appended unless the
/// text already ends in `.`, `?` or `!`, and the first character is
/// capitalized unless the message begins with a hyperlink.
pub fn convert_to_sentence(message: Option<&str>) -> Option<String> {
    let message = message?;
    if message.is_empty() {
        return None;
    }

    let leading_link = leading_link_len(message);
    if leading_link == Some(message.len()) {
        return Some(message.to_string());
    }

    let mut sentence = message.to_string();
    if !sentence.ends_with(END_PUNCTUATION) {
        sentence.push('.');
    }
    if leading_link.is_none() {
        sentence = capitalize_first(&sentence);
    }
    Some(sentence)
}

/// Byte length of a hyperlink that starts at position 0, if any.
fn leading_link_len(text: &str) -> Option<usize> {
    let token = text.split(char::is_whitespace).next()?;
    let candidate = token.trim_end_matches(LINK_TRAILING_PUNCTUATION);
    if candidate.is_empty() || !is_link(candidate) {
        return None;
    }
    Some(candidate.len())
}

fn is_link(candidate: &str) -> bool {
    if let Ok(url) = Url::parse(candidate) {
        match url.scheme() {
            "http" | "https" | "ftp" => return url.host_str().is_some(),
            "mailto" => return !url.path().is_empty(),
            _ => {}
        }
    }
    is_email_address(candidate) || is_bare_web_address(candidate)
}

/// `local@domain`, where the domain is a bare host name.
fn is_email_address(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_alphanumeric() || "._%+-".contains(c))
        && is_domain_name(domain)
}

/// A host name with an optional port and path, e.g. `example.com/status`.
fn is_bare_web_address(candidate: &str) -> bool {
    let authority = candidate
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = match authority.rsplit_once(':') {
        Some((host, port)) if port.parse::<u16>().is_ok() => host,
        Some(_) => return false,
        None => authority,
    };
    is_domain_name(host)
}

/// Dot-separated labels ending in an alphabetic top-level label of two or
/// more characters.
fn is_domain_name(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    let [.., tld] = labels.as_slice() else {
        return false;
    };
    labels.len() >= 2
        && tld.chars().count() >= 2
        && tld.chars().all(char::is_alphabetic)
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
        && matches!(Host::parse(host), Ok(Host::Domain(_)))
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
