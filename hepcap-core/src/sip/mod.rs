//! Invocation of the external SIP parser (contract in spec §6.2) and the
//! validation/normalisation rules the ingest pipeline applies to its output.

use crate::error::{HepError, Result};

/// The request/status line of a SIP message, as surfaced to the core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartLine {
    /// Request method (e.g. "INVITE"). Empty for responses, unless the
    /// enricher has unified it with the response phrase (see [`enrich`]).
    pub method: String,
    /// Response status phrase (e.g. "OK"). Empty for requests.
    pub resp: String,
    /// Request-URI. Empty for responses or when absent.
    pub uri: String,
}

/// The subset of a parsed SIP message the ingest core reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSip {
    pub start_line: StartLine,
    pub cseq_method: String,
    pub call_id: String,
}

/// Outcome of invoking the external SIP grammar (spec §6.2).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SipParseOutput {
    pub start_line: Option<StartLine>,
    pub cseq_method: String,
    pub call_id: String,
    /// Set when the parser itself rejected the payload as malformed SIP.
    pub parse_error: Option<String>,
}

/// The external SIP grammar the core depends on (spec §6.2). The core only
/// needs read access to the fields of [`SipParseOutput`]; the concrete
/// grammar is out of scope and supplied by the host application.
pub trait SipParser: Send + Sync {
    fn parse(&self, text: &str) -> SipParseOutput;
}

/// Minimum payload length (in bytes) before SIP enrichment is attempted,
/// per spec §4.2.
pub const MIN_SIP_PAYLOAD_LEN: usize = 64;

/// Apply SIP enrichment rules (spec §4.2) to the output of a [`SipParser`].
///
/// Installs empty defaults for a missing start line / request-URI, unifies
/// `method` with the response phrase when the parser reports a response, and
/// enforces the CSeq/Call-ID minimum-length invariants.
pub fn enrich(output: SipParseOutput) -> Result<ParsedSip> {
    if let Some(err) = output.parse_error {
        return Err(HepError::SipParse(err));
    }

    let mut start_line = output.start_line.unwrap_or_default();
    if start_line.method.is_empty() {
        start_line.method = start_line.resp.clone();
    }

    if output.cseq_method.trim().len() < 3 {
        return Err(HepError::NoCseq);
    }
    if output.call_id.trim().len() < 3 {
        return Err(HepError::NoCallId);
    }

    Ok(ParsedSip { start_line, cseq_method: output.cseq_method, call_id: output.call_id })
}

/// A minimal SIP start-line/Call-ID/CSeq scanner, good enough to satisfy the
/// enrichment contract without pulling in a full SIP grammar crate. Intended
/// as the default; a real grammar implementation is a drop-in [`SipParser`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanningSipParser;

impl SipParser for ScanningSipParser {
    fn parse(&self, text: &str) -> SipParseOutput {
        let mut lines = text.split("\r\n").flat_map(|l| l.split('\n'));
        let first_line = match lines.next() {
            Some(line) if !line.is_empty() => line,
            _ => {
                return SipParseOutput {
                    parse_error: Some("empty SIP message".to_string()),
                    ..Default::default()
                }
            }
        };

        let start_line = parse_start_line(first_line);

        let mut cseq_method = String::new();
        let mut call_id = String::new();
        for line in text.split("\r\n").flat_map(|l| l.split('\n')) {
            if let Some(rest) = strip_header(line, "CSeq") {
                cseq_method = rest.split_whitespace().nth(1).unwrap_or_default().to_string();
            } else if let Some(rest) = strip_header(line, "Call-ID").or_else(|| strip_header(line, "i"))
            {
                call_id = rest.trim().to_string();
            }
        }

        SipParseOutput { start_line: Some(start_line), cseq_method, call_id, parse_error: None }
    }
}

fn strip_header<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (header, value) = line.split_once(':')?;
    if header.trim().eq_ignore_ascii_case(name) {
        Some(value.trim())
    } else {
        None
    }
}

fn parse_start_line(line: &str) -> StartLine {
    let mut parts = line.split_whitespace();
    let first = parts.next().unwrap_or_default();
    if let Some(stripped) = first.strip_prefix("SIP/") {
        // status line: "SIP/2.0 200 OK"
        let _version = stripped;
        let _status_code = parts.next().unwrap_or_default();
        let resp = parts.collect::<Vec<_>>().join(" ");
        StartLine { method: String::new(), resp, uri: String::new() }
    } else {
        // request line: "INVITE sip:bob@example.com SIP/2.0"
        let uri = parts.next().unwrap_or_default().to_string();
        StartLine { method: first.to_string(), resp: String::new(), uri }
    }
}
