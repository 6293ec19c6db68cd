//! # Accessory attribute grammar
//!
//! An accessory answers the attribute query with a flat list of pairs:
//!
//! ```text
//! reply   = segment *( ";" segment )
//! segment = *WSP [ key "=" value ] *WSP
//! ```
//!
//! Empty segments and segments without `=` are skipped. A reply that yields
//! no pair at all is malformed. There is no escaping, so values cannot hold
//! the `;` delimiter. A repeated key keeps its first position and takes the
//! last value.
//!
//! Older firmware labels some attributes in a human-readable form
//! (`PS9: Full`) and separates them with line breaks. Those labels are
//! rewritten to their canonical keys before tokenizing.

use std::net::Ipv4Addr;

use tadisc_common::device::{Attributes, MalformedResponse};
use tracing::trace;

pub const PAIR_DELIMITER: char = ';';
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Legacy firmware labels and the keys they stand for.
const LABEL_REWRITES: &[(&str, &str)] = &[
    ("ethaddr=", "MAC="),
    ("PS9: ", "Batt="),
    ("PS8: ", "PoeV="),
    ("EtherType: ", "NsType="),
    ("Device ID: ", "NsDev="),
    ("Addresses: ", "NsAddr="),
    ("Platform: ", "NsPlatform="),
    ("Port ID: ", "NsPort="),
    ("Vlan ID:", "NsVlan="),
];

/// Line breaks, including the two-character `\n` escape some firmware sends.
const LINE_BREAKS: &[&str] = &["\\n", "\r\n", "\n", "\r"];

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Pair { key: &'a str, value: &'a str },
    Junk(&'a str),
}

/// Parses a raw accessory reply into its ordered attributes.
pub fn parse_response(bytes: &[u8]) -> Result<Attributes, MalformedResponse> {
    if bytes.is_empty() {
        return Err(MalformedResponse::Empty);
    }

    let text: &str = std::str::from_utf8(bytes).map_err(|_| MalformedResponse::NotUtf8)?;
    let normalized: String = normalize(text);

    let mut attributes: Attributes = Attributes::new();
    for token in tokenize(&normalized) {
        match token {
            Token::Pair { key, value } => {
                attributes.insert(key, collapse_whitespace(value));
            }
            Token::Junk(segment) => trace!("skipping segment without a pair: {segment:?}"),
        }
    }

    if attributes.is_empty() {
        return Err(MalformedResponse::NoPairs);
    }

    Ok(attributes)
}

/// Rewrites legacy labels and turns line breaks into pair delimiters.
fn normalize(text: &str) -> String {
    let mut normalized: String = text.to_string();

    for (label, key) in LABEL_REWRITES {
        normalized = normalized.replace(label, key);
    }

    for line_break in LINE_BREAKS {
        normalized = normalized.replace(line_break, ";");
    }

    normalized
}

fn tokenize(text: &str) -> impl Iterator<Item = Token<'_>> {
    text.split(PAIR_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once(KEY_VALUE_SEPARATOR) {
            Some((key, value)) if !key.trim().is_empty() => Token::Pair {
                key: key.trim(),
                value: value.trim(),
            },
            _ => Token::Junk(segment),
        })
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Formats one accessory-file line: `<IP>: key1=value1;key2=value2`.
pub fn format_record(address: Ipv4Addr, attributes: &Attributes) -> String {
    let pairs: Vec<String> = attributes
        .iter()
        .map(|(key, value)| format!("{key}{KEY_VALUE_SEPARATOR}{value}"))
        .collect();

    format!("{address}: {}", pairs.join(&PAIR_DELIMITER.to_string()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "MAC=00:11:22:33:44:55;Batt=Full;PoeV=48V;NsType=Ethernet";

    fn pairs(attrs: &Attributes) -> Vec<(&str, &str)> {
        attrs.iter().collect()
    }

    #[test]
    fn parses_the_canonical_reply_in_order() {
        let attrs: Attributes = parse_response(EXAMPLE.as_bytes()).unwrap();
        assert_eq!(
            pairs(&attrs),
            vec![
                ("MAC", "00:11:22:33:44:55"),
                ("Batt", "Full"),
                ("PoeV", "48V"),
                ("NsType", "Ethernet"),
            ]
        );
    }

    #[test]
    fn empty_reply_is_malformed() {
        assert_eq!(parse_response(b""), Err(MalformedResponse::Empty));
    }

    #[test]
    fn reply_without_separator_is_malformed() {
        assert_eq!(parse_response(b"garbage"), Err(MalformedResponse::NoPairs));
        assert_eq!(parse_response(b" ; ;; "), Err(MalformedResponse::NoPairs));
        assert_eq!(parse_response(b"=novalue"), Err(MalformedResponse::NoPairs));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        assert_eq!(
            parse_response(&[0x4d, 0x41, 0x43, 0x3d, 0xff, 0xfe]),
            Err(MalformedResponse::NotUtf8)
        );
    }

    #[test]
    fn whitespace_and_empty_segments_are_ignored() {
        let attrs: Attributes = parse_response(b"  MAC = aa ;; junk ;Batt=Full;  ").unwrap();
        assert_eq!(pairs(&attrs), vec![("MAC", "aa"), ("Batt", "Full")]);
    }

    #[test]
    fn last_duplicate_wins_in_first_position() {
        let attrs: Attributes = parse_response(b"Batt=Low;MAC=aa;Batt=Full").unwrap();
        assert_eq!(pairs(&attrs), vec![("Batt", "Full"), ("MAC", "aa")]);
    }

    #[test]
    fn value_may_contain_the_separator() {
        let attrs: Attributes = parse_response(b"NsAddr=ip=10.0.0.1").unwrap();
        assert_eq!(attrs.get("NsAddr"), Some("ip=10.0.0.1"));
    }

    #[test]
    fn legacy_labels_are_rewritten() {
        let raw: &str = "iPerf Remote\\nethaddr=00:11:22:33:44:55\\nPS9: Full\\nPS8: 48V\\n\
                         EtherType: Ethernet\\nDevice ID: core-sw1\\nPort ID: Gi1/0/12\\nVlan ID: 20";
        let attrs: Attributes = parse_response(raw.as_bytes()).unwrap();
        assert_eq!(
            pairs(&attrs),
            vec![
                ("MAC", "00:11:22:33:44:55"),
                ("Batt", "Full"),
                ("PoeV", "48V"),
                ("NsType", "Ethernet"),
                ("NsDev", "core-sw1"),
                ("NsPort", "Gi1/0/12"),
                ("NsVlan", "20"),
            ]
        );
    }

    #[test]
    fn real_line_breaks_delimit_pairs() {
        let attrs: Attributes = parse_response(b"MAC=aa\r\nPlatform: cisco  WS-C2960\n").unwrap();
        assert_eq!(
            pairs(&attrs),
            vec![("MAC", "aa"), ("NsPlatform", "cisco WS-C2960")]
        );
    }

    #[test]
    fn record_matches_accessory_file_format() {
        let attrs: Attributes = parse_response(EXAMPLE.as_bytes()).unwrap();
        assert_eq!(
            format_record(Ipv4Addr::new(192, 168, 1, 2), &attrs),
            format!("192.168.1.2: {EXAMPLE}")
        );
    }
}
