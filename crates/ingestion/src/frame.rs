//! Line-protocol frame parsing
//!
//! A frame is one whitespace-separated text line: a node identifier followed
//! by one or more numeric readings, e.g. `10 150 3450.5`.

use contracts::Record;
use thiserror::Error;

/// Frame parse failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Blank or whitespace-only line
    #[error("empty frame")]
    Empty,

    /// First token is not a node identifier
    #[error("invalid node id '{0}'")]
    InvalidNode(String),

    /// Frame carries a node id but no readings
    #[error("frame for node {node} has no values")]
    NoValues { node: u32 },

    /// A reading failed to parse as a number
    #[error("invalid value '{value}' at position {position}")]
    InvalidValue { value: String, position: usize },
}

/// Parse one frame into a `Record`.
///
/// `timestamp` is the arrival time stamped by the source; `reference` is the
/// diagnostic correlation tag attached for log tracing.
pub fn parse_frame(
    line: &str,
    timestamp: u64,
    reference: impl Into<String>,
) -> Result<Record, FrameError> {
    let mut tokens = line.split_whitespace();

    let node_token = tokens.next().ok_or(FrameError::Empty)?;
    let node: u32 = node_token
        .parse()
        .map_err(|_| FrameError::InvalidNode(node_token.to_string()))?;

    let mut values = Vec::new();
    for (position, token) in tokens.enumerate() {
        let value: f64 = token.parse().map_err(|_| FrameError::InvalidValue {
            value: token.to_string(),
            position,
        })?;
        values.push(value);
    }

    if values.is_empty() {
        return Err(FrameError::NoValues { node });
    }

    Ok(Record::new(timestamp, node, values).with_reference(reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_and_values() {
        let record = parse_frame("10 150 3450", 1399980731, "udp#1").unwrap();
        assert_eq!(record.node, 10);
        assert_eq!(record.timestamp, 1399980731);
        assert_eq!(record.values, vec![150.0, 3450.0]);
        assert_eq!(record.reference.as_deref(), Some("udp#1"));
    }

    #[test]
    fn parses_float_values() {
        let record = parse_frame("5 21.5 -3.25", 100, "t").unwrap();
        assert_eq!(record.values, vec![21.5, -3.25]);
    }

    #[test]
    fn tolerates_extra_whitespace() {
        let record = parse_frame("  7   1 2  3 \r\n", 100, "t").unwrap();
        assert_eq!(record.node, 7);
        assert_eq!(record.values.len(), 3);
    }

    #[test]
    fn rejects_empty_line() {
        assert_eq!(parse_frame("   ", 100, "t"), Err(FrameError::Empty));
    }

    #[test]
    fn rejects_bad_node() {
        assert_eq!(
            parse_frame("node5 1 2", 100, "t"),
            Err(FrameError::InvalidNode("node5".to_string()))
        );
    }

    #[test]
    fn rejects_missing_values() {
        assert_eq!(
            parse_frame("12", 100, "t"),
            Err(FrameError::NoValues { node: 12 })
        );
    }

    #[test]
    fn rejects_bad_value() {
        assert_eq!(
            parse_frame("12 1.5 hot", 100, "t"),
            Err(FrameError::InvalidValue {
                value: "hot".to_string(),
                position: 1
            })
        );
    }
}
