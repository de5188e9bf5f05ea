//! Local-name derivation for predicate IRIs.
//!
//! The local name of a predicate is its fragment when it has one, otherwise
//! the final path segment without any file extension:
//! - `http://xmlns.com/foaf/0.1/name` -> `name`
//! - `http://www.w3.org/1999/02/22-rdf-syntax-ns#type` -> `type`
//! - `http://www.w3.org/ns/posix/stat#mtime` -> `mtime`
//!
//! Local names are camel-cased so `has-email` and `has_email` both match a
//! context entry written as `hasEmail`.

use oxiri::Iri;

/// Separators that start a new camel-case hump.
const SEPARATORS: &[char] = &['-', '_', '.', ' '];

/// Derive the camel-cased local name of a predicate IRI.
///
/// # Examples
///
/// ```
/// use shapemap_context::names::local_name;
///
/// assert_eq!(local_name("http://purl.org/dc/elements/1.1/title"), "title");
/// assert_eq!(local_name("http://www.w3.org/2006/vcard/ns#hasEmail"), "hasEmail");
/// assert_eq!(local_name("http://example.org/terms/date-created"), "dateCreated");
/// ```
pub fn local_name(predicate: &str) -> String {
    camel_case(raw_local_name(predicate))
}

/// The local name exactly as it appears in the IRI.
pub fn raw_local_name(predicate: &str) -> &str {
    let Ok(iri) = Iri::parse(predicate) else {
        let tail = predicate.rsplit(['#', '/']).next().unwrap_or(predicate);
        return strip_extension(tail);
    };
    if iri.fragment().is_some_and(|fragment| !fragment.is_empty()) {
        if let Some((_, fragment)) = predicate.split_once('#') {
            return fragment;
        }
    }
    // The path ends where the query or fragment starts.
    let end = predicate.find(['?', '#']).unwrap_or(predicate.len());
    let start = end - iri.path().len();
    strip_extension(last_segment(&predicate[start..end]))
}

fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

fn strip_extension(segment: &str) -> &str {
    match segment.rfind('.') {
        Some(dot) if dot > 0 => &segment[..dot],
        _ => segment,
    }
}

/// Convert a word to camel case.
///
/// Existing humps are preserved, fully upper-case words are lowered, and
/// separators (`-`, `_`, `.`, space) start a new hump.
pub fn camel_case(input: &str) -> String {
    let words: Vec<&str> = input.split(SEPARATORS).filter(|w| !w.is_empty()).collect();
    let mut out = String::with_capacity(input.len());
    for (index, word) in words.iter().enumerate() {
        let lowered;
        let word = if word.chars().all(|c| !c.is_lowercase()) {
            lowered = word.to_lowercase();
            lowered.as_str()
        } else {
            word
        };
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if index == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}
