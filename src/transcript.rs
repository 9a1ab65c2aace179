//! Recorded device sessions, replayed as a read-only channel.
//!
//! ```toml
//! [[exchange]]
//! command = "show running-config | include ^ip vrf"
//! output = """
//! ip vrf CUST
//! """
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use translate::{Channel, ChannelError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default, rename = "exchange")]
    pub exchanges: Vec<Exchange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub command: String,
    #[serde(default)]
    pub output: String,
}

impl Transcript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read transcript {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid transcript format in {}", path.display()))
    }
}

fn normalize(command: &str) -> &str {
    command.trim_end_matches(['\r', '\n'])
}

/// Channel answering from a [`Transcript`].
///
/// Commands missing from the transcript answer with empty output, the same
/// as a device whose `include` filter matches nothing. Later exchanges for the
/// same command win.
#[derive(Debug, Default)]
pub struct ReplayChannel {
    outputs: HashMap<String, String>,
    missed: Mutex<Vec<String>>,
}

impl ReplayChannel {
    pub fn new(transcript: Transcript) -> Self {
        let outputs = transcript
            .exchanges
            .into_iter()
            .map(|e| (normalize(&e.command).to_string(), e.output))
            .collect();
        Self {
            outputs,
            missed: Mutex::new(Vec::new()),
        }
    }

    /// Commands that were asked for but not recorded, in order
    pub fn missed(&self) -> Vec<String> {
        self.missed
            .lock()
            .map(|m| m.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Channel for ReplayChannel {
    fn execute(&self, command: &str) -> Result<String, ChannelError> {
        let command = normalize(command);
        if let Some(output) = self.outputs.get(command) {
            return Ok(output.clone());
        }
        log::warn!("No recorded output for '{command}'");
        if let Ok(mut missed) = self.missed.lock() {
            missed.push(command.to_string());
        }
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TRANSCRIPT: &str = r#"
[[exchange]]
command = "show running-config | include ^ip vrf"
output = """
ip vrf CUST
ip vrf MGMT
"""

[[exchange]]
command = "show version"
output = "Cisco IOS Software"
"#;

    #[test]
    fn test_replay_recorded_output() {
        let transcript: Transcript = toml::from_str(TRANSCRIPT).unwrap();
        assert_eq!(transcript.exchanges.len(), 2);

        let channel = ReplayChannel::new(transcript);
        assert_eq!(
            channel
                .execute("show running-config | include ^ip vrf")
                .unwrap(),
            "ip vrf CUST\nip vrf MGMT\n"
        );
        assert_eq!(channel.execute("show version\n").unwrap(), "Cisco IOS Software");
        assert!(channel.missed().is_empty());
    }

    #[test]
    fn test_unrecorded_command_is_empty() {
        let channel = ReplayChannel::new(Transcript::default());
        assert_eq!(channel.execute("show ip ospf").unwrap(), "");
        assert_eq!(channel.missed(), ["show ip ospf"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pe1.toml");
        fs::write(&path, TRANSCRIPT).unwrap();
        assert_eq!(Transcript::load(&path).unwrap().exchanges[1].command, "show version");

        let err = Transcript::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
