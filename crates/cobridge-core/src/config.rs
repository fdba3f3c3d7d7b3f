//! Line-oriented node configuration.
//!
//! The configuration source is plain text, one setting per line:
//!
//! 1. Transport line: a selector word, optionally followed by a broker
//!    address override (e.g. `mqtt tcp://broker:1883`). Only the
//!    message-queue transport (`mqtt`) is accepted.
//! 2. Node line: the node name, optionally followed by a workspace
//!    identifier (e.g. `node1 myworkspace`).
//! 3. Optional option lines:
//!    - `quitifobnstops` — ask the engine to quit when the node's
//!      simulation terminates.
//!    - `timeout <seconds>` — default wait timeout; non-positive values
//!      mean wait indefinitely.
//!
//! Malformed or missing required lines fail startup; the node is never
//! created. Unknown options are warned about and ignored.

use std::path::Path;
use std::time::Duration;

use cobridge_common::ConfigError;
use tracing::warn;

/// Transport selector for the co-simulation network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Message-queue transport (the only one supported).
    Mqtt,
}

/// Parsed node configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Transport to reach the co-simulation network.
    pub transport: Transport,
    /// Broker address override, when the transport line carries one.
    pub broker_address: Option<String>,
    /// Node name on the network.
    pub name: String,
    /// Optional workspace identifier.
    pub workspace: Option<String>,
    /// Quit the engine when the node's simulation terminates.
    pub quit_engine_on_terminate: bool,
    /// Default wait timeout; `None` means wait indefinitely.
    pub timeout: Option<Duration>,
}

impl NodeConfig {
    /// Parse a configuration from its text form.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut lines = text.lines();

        let (transport_word, broker_address) = split_first_word(
            lines.next().ok_or(ConfigError::MissingTransportLine)?,
        );
        if transport_word.is_empty() {
            return Err(ConfigError::MissingTransportLine);
        }
        let transport = match transport_word.to_lowercase().as_str() {
            "mqtt" => Transport::Mqtt,
            other => return Err(ConfigError::UnsupportedTransport(other.to_string())),
        };

        let (name, workspace) =
            split_first_word(lines.next().ok_or(ConfigError::MissingNodeLine)?);
        if name.is_empty() {
            return Err(ConfigError::MissingNodeLine);
        }
        if !is_valid_node_name(&name) {
            return Err(ConfigError::InvalidNodeName(name));
        }

        let mut config = NodeConfig {
            transport,
            broker_address,
            name,
            workspace,
            quit_engine_on_terminate: false,
            timeout: None,
        };

        for line in lines {
            let (option, rest) = split_first_word(line);
            if option.is_empty() {
                continue;
            }
            match option.to_lowercase().as_str() {
                "quitifobnstops" => config.quit_engine_on_terminate = true,
                "timeout" => {
                    if let Some(value) = rest {
                        let secs: i64 = value
                            .parse()
                            .map_err(|_| ConfigError::InvalidTimeout(value.clone()))?;
                        // Non-positive means wait indefinitely.
                        config.timeout = if secs > 0 {
                            Some(Duration::from_secs(secs as u64))
                        } else {
                            None
                        };
                    }
                }
                unknown => warn!("ignoring unknown configuration option {unknown:?}"),
            }
        }

        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

/// Split a line into its first whitespace-delimited word and the trimmed
/// remainder (if any).
fn split_first_word(line: &str) -> (String, Option<String>) {
    let trimmed = line.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => {
            let rest = rest.trim();
            (
                first.to_string(),
                (!rest.is_empty()).then(|| rest.to_string()),
            )
        }
        None => (trimmed.to_string(), None),
    }
}

/// Validity predicate for node names: non-empty, leading alphabetic or
/// underscore, then alphanumerics, underscores, or hyphens. Keeps names
/// safe for the transport's topic namespace.
pub fn is_valid_node_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_scenario() {
        let config = NodeConfig::parse("mqtt\nnode1 myworkspace\ntimeout 5\n").unwrap();
        assert_eq!(config.transport, Transport::Mqtt);
        assert_eq!(config.name, "node1");
        assert_eq!(config.workspace.as_deref(), Some("myworkspace"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(!config.quit_engine_on_terminate);
    }

    #[test]
    fn test_parse_broker_address_override() {
        let config = NodeConfig::parse("mqtt tcp://broker:1883\nnode1\n").unwrap();
        assert_eq!(config.broker_address.as_deref(), Some("tcp://broker:1883"));
        assert_eq!(config.workspace, None);
    }

    #[test]
    fn test_quitifobnstops_option() {
        let config = NodeConfig::parse("mqtt\nnode1\nquitifobnstops\n").unwrap();
        assert!(config.quit_engine_on_terminate);
    }

    #[test]
    fn test_non_positive_timeout_means_indefinite() {
        let config = NodeConfig::parse("mqtt\nnode1\ntimeout -1\n").unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_unsupported_transport_fails() {
        match NodeConfig::parse("yarp\nnode1\n") {
            Err(ConfigError::UnsupportedTransport(t)) => assert_eq!(t, "yarp"),
            other => panic!("expected unsupported transport, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_lines_fail() {
        assert!(matches!(
            NodeConfig::parse(""),
            Err(ConfigError::MissingTransportLine)
        ));
        assert!(matches!(
            NodeConfig::parse("mqtt\n"),
            Err(ConfigError::MissingNodeLine)
        ));
    }

    #[test]
    fn test_invalid_node_name_fails() {
        assert!(matches!(
            NodeConfig::parse("mqtt\n1badname\n"),
            Err(ConfigError::InvalidNodeName(_))
        ));
        assert!(matches!(
            NodeConfig::parse("mqtt\nbad!name\n"),
            Err(ConfigError::InvalidNodeName(_))
        ));
    }

    #[test]
    fn test_malformed_timeout_fails() {
        assert!(matches!(
            NodeConfig::parse("mqtt\nnode1\ntimeout soon\n"),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_node_name_predicate() {
        assert!(is_valid_node_name("node1"));
        assert!(is_valid_node_name("_hvac-zone2"));
        assert!(!is_valid_node_name(""));
        assert!(!is_valid_node_name("2fast"));
        assert!(!is_valid_node_name("has space"));
    }
}
