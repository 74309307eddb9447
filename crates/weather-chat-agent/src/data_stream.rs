//! Line decoder for the agent's prefix-tagged data stream.
//!
//! Each line of the response body has the shape `<tag>:<payload>`. Only the
//! text-token and tool-result tags carry content; the step/finish tags are
//! metadata and everything else is skipped.

use serde_json::Value;
use tracing::{trace, warn};

/// The closed set of tags the agent emits, plus a catch-all for new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineTag {
    /// `0`: a fragment of the reply text.
    TextToken,
    /// `a`: the result of a tool call, `{"result": ...}`.
    ToolResult,
    /// `f`: start of a step.
    StartStep,
    /// `9`: a tool call being issued.
    ToolCall,
    /// `e`: end of a step.
    FinishStep,
    /// `d`: end of the message.
    FinishMessage,
    /// Any tag this decoder does not know about. Always ignored.
    Unknown(String),
}

impl LineTag {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "0" => LineTag::TextToken,
            "a" => LineTag::ToolResult,
            "f" => LineTag::StartStep,
            "9" => LineTag::ToolCall,
            "e" => LineTag::FinishStep,
            "d" => LineTag::FinishMessage,
            other => LineTag::Unknown(other.to_string()),
        }
    }

    /// Wire representation of the tag.
    pub fn as_str(&self) -> &str {
        match self {
            LineTag::TextToken => "0",
            LineTag::ToolResult => "a",
            LineTag::StartStep => "f",
            LineTag::ToolCall => "9",
            LineTag::FinishStep => "e",
            LineTag::FinishMessage => "d",
            LineTag::Unknown(tag) => tag.as_str(),
        }
    }

    /// Tags whose payload is JSON kept only for diagnostics.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            LineTag::StartStep | LineTag::ToolCall | LineTag::FinishStep | LineTag::FinishMessage
        )
    }
}

/// A raw line split at its first colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseLine<'a> {
    pub tag: &'a str,
    pub payload: &'a str,
}

impl<'a> ResponseLine<'a> {
    /// Split a line into tag and payload. Returns `None` when there is no
    /// colon or the tag before it is empty.
    pub fn split(line: &'a str) -> Option<Self> {
        match line.find(':') {
            Some(idx) if idx > 0 => Some(Self {
                tag: &line[..idx],
                payload: &line[idx + 1..],
            }),
            _ => None,
        }
    }
}

/// What a single line contributes to the reply.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedRecord {
    TextToken { text: String },
    ToolResult { result: Value },
    Metadata { tag: LineTag, value: Value },
    /// The payload did not decode for its tag. Carries nothing forward.
    Unparseable { tag: LineTag },
}

/// Decode one line of the response body.
///
/// Returns `None` for lines that are not `<tag>:<payload>` and for unknown
/// tags. Malformed JSON payloads become [`DecodedRecord::Unparseable`].
pub fn decode_line(line: &str) -> Option<DecodedRecord> {
    let ResponseLine { tag, payload } = ResponseLine::split(line)?;
    let tag = LineTag::parse(tag);
    trace!(tag = tag.as_str(), payload, "Decoding line");

    match tag {
        LineTag::TextToken => Some(DecodedRecord::TextToken {
            text: strip_outer_quotes(payload).to_string(),
        }),
        LineTag::ToolResult => match serde_json::from_str::<Value>(payload) {
            Ok(mut value) => match value.get_mut("result").map(Value::take) {
                Some(result) if !result.is_null() => Some(DecodedRecord::ToolResult { result }),
                _ => Some(DecodedRecord::Metadata { tag, value }),
            },
            Err(e) => {
                warn!(%e, payload, "Failed to parse tool result");
                Some(DecodedRecord::Unparseable { tag })
            }
        },
        _ if tag.is_metadata() => match serde_json::from_str::<Value>(payload) {
            Ok(value) => {
                trace!(tag = tag.as_str(), %value, "Metadata");
                Some(DecodedRecord::Metadata { tag, value })
            }
            Err(e) => {
                warn!(tag = tag.as_str(), %e, payload, "Failed to parse metadata");
                Some(DecodedRecord::Unparseable { tag })
            }
        },
        _ => {
            trace!(tag = tag.as_str(), "Ignoring unknown tag");
            None
        }
    }
}

/// Iterate the non-blank lines of a response body.
///
/// The body is trimmed first and a trailing `\r` is dropped from each line;
/// leading whitespace inside a line is payload and is kept.
pub fn body_lines(body: &str) -> impl Iterator<Item = &str> {
    body.trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
}

/// Strip exactly one pair of double quotes wrapping the whole payload.
fn strip_outer_quotes(payload: &str) -> &str {
    if payload.len() >= 2 && payload.starts_with('"') && payload.ends_with('"') {
        &payload[1..payload.len() - 1]
    } else {
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_requires_non_empty_tag() {
        assert_eq!(ResponseLine::split("no colon here"), None);
        assert_eq!(ResponseLine::split(":payload"), None);
        assert_eq!(
            ResponseLine::split("0:\"a:b\""),
            Some(ResponseLine {
                tag: "0",
                payload: "\"a:b\""
            })
        );
    }

    #[test]
    fn test_text_token_quote_stripping() {
        assert_eq!(
            decode_line("0:\"Hello\""),
            Some(DecodedRecord::TextToken {
                text: "Hello".into()
            })
        );
        assert_eq!(
            decode_line("0:\" world\""),
            Some(DecodedRecord::TextToken {
                text: " world".into()
            })
        );
        // Unquoted payloads are kept verbatim
        assert_eq!(
            decode_line("0:plain"),
            Some(DecodedRecord::TextToken {
                text: "plain".into()
            })
        );
        // Only the outer pair goes
        assert_eq!(
            decode_line("0:\"\"quoted\"\""),
            Some(DecodedRecord::TextToken {
                text: "\"quoted\"".into()
            })
        );
        // A lone quote is not a pair
        assert_eq!(
            decode_line("0:\""),
            Some(DecodedRecord::TextToken { text: "\"".into() })
        );
    }

    #[test]
    fn test_text_token_escapes_are_not_interpreted() {
        assert_eq!(
            decode_line(r#"0:"line\n""#),
            Some(DecodedRecord::TextToken {
                text: r"line\n".into()
            })
        );
    }

    #[test]
    fn test_tool_result() {
        let record = decode_line(r#"a:{"toolCallId":"c1","result":{"temperature":20}}"#);
        assert_eq!(
            record,
            Some(DecodedRecord::ToolResult {
                result: json!({"temperature": 20})
            })
        );
    }

    #[test]
    fn test_tool_result_without_result_field_is_metadata() {
        let record = decode_line(r#"a:{"toolCallId":"c1"}"#).unwrap();
        assert!(matches!(
            record,
            DecodedRecord::Metadata {
                tag: LineTag::ToolResult,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_tool_result_is_unparseable() {
        assert_eq!(
            decode_line("a:{not json"),
            Some(DecodedRecord::Unparseable {
                tag: LineTag::ToolResult
            })
        );
    }

    #[test]
    fn test_metadata_tags() {
        for line in [
            r#"f:{"messageId":"msg-1"}"#,
            r#"9:{"toolCallId":"c1","toolName":"weatherTool","args":{}}"#,
            r#"e:{"finishReason":"stop"}"#,
            r#"d:{"finishReason":"stop","usage":{"promptTokens":1}}"#,
        ] {
            assert!(
                matches!(decode_line(line), Some(DecodedRecord::Metadata { .. })),
                "expected metadata for {line}"
            );
        }
        assert_eq!(
            decode_line("f:oops"),
            Some(DecodedRecord::Unparseable {
                tag: LineTag::StartStep
            })
        );
    }

    #[test]
    fn test_unknown_tag_produces_nothing() {
        assert_eq!(decode_line("2:[{\"x\":1}]"), None);
        assert_eq!(decode_line("zz:anything"), None);
        assert_eq!(LineTag::parse("zz"), LineTag::Unknown("zz".into()));
        assert_eq!(LineTag::parse("zz").as_str(), "zz");
    }

    #[test]
    fn test_body_lines_skips_blanks_and_carriage_returns() {
        let body = "\n0:\"a\"\r\n\r\n   \n0:\" b\"\n\n";
        let lines: Vec<&str> = body_lines(body).collect();
        assert_eq!(lines, vec!["0:\"a\"", "0:\" b\""]);
    }
}
