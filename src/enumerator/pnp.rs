//! Windows Device Manager enumeration through `Win32_PnPEntity`.
//!
//! The query runs in PowerShell and is piped through `ConvertTo-Json` so the
//! result is parsed as structured data rather than scraped from the table
//! formatter.

use super::command::run_command;
use super::DeviceEnumerator;
use crate::error::{MonitorError, Result};
use crate::snapshot::DeviceSnapshot;
use std::time::Duration;

/// Name fragments that identify phones in download, bootloader or EDL mode.
pub const DEFAULT_NAME_PATTERNS: &[&str] = &[
    "MediaTek",
    "Android",
    "Nokia",
    "MTK",
    "PreLoader",
    "Bootloader",
    "9008",
    "Qualcomm",
];

#[derive(Debug, Clone)]
pub struct PnpEnumerator {
    shell: String,
    patterns: Vec<String>,
    timeout: Option<Duration>,
}

impl PnpEnumerator {
    pub fn new(patterns: Vec<String>, timeout: Option<Duration>) -> Self {
        Self {
            shell: "powershell".to_string(),
            patterns,
            timeout,
        }
    }

    pub fn query(&self) -> String {
        build_query(&self.patterns)
    }
}

impl Default for PnpEnumerator {
    fn default() -> Self {
        Self::new(
            DEFAULT_NAME_PATTERNS.iter().map(|s| s.to_string()).collect(),
            None,
        )
    }
}

impl DeviceEnumerator for PnpEnumerator {
    fn name(&self) -> &str {
        "pnp"
    }

    fn enumerate(&self) -> Result<DeviceSnapshot> {
        let args = vec![
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            self.query(),
        ];
        let stdout = run_command(&self.shell, &args, self.timeout)?;
        parse_pnp_json(&stdout)
    }
}

/// Build the PowerShell pipeline for the given name patterns.
pub fn build_query(patterns: &[String]) -> String {
    let filter = patterns
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("$_.Name -like '*{}*'", p.trim().replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(" -or ");

    let mut query = String::from("Get-CimInstance -ClassName Win32_PnPEntity");
    if !filter.is_empty() {
        query.push_str(&format!(" | Where-Object {{ {} }}", filter));
    }
    query.push_str(" | Select-Object Name, DeviceID | ConvertTo-Json -Compress");
    query
}

/// Parse `ConvertTo-Json` output. PowerShell emits nothing for zero
/// matches, a bare object for one and an array for several.
pub fn parse_pnp_json(stdout: &str) -> Result<DeviceSnapshot> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(DeviceSnapshot::new());
    }

    let json: serde_json::Value = serde_json::from_str(trimmed)?;
    let items = match json {
        serde_json::Value::Array(items) => items,
        obj @ serde_json::Value::Object(_) => vec![obj],
        other => {
            return Err(MonitorError::Parse(format!(
                "unexpected PnP query output: {}",
                other
            )))
        }
    };

    let mut snapshot = DeviceSnapshot::new();
    for item in &items {
        let name = item.get("Name").and_then(|v| v.as_str()).unwrap_or("").trim();
        let device_id = item
            .get("DeviceID")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();

        match (name.is_empty(), device_id.is_empty()) {
            (true, true) => continue,
            (false, true) => snapshot.insert(name),
            (true, false) => snapshot.insert(format!("[{}]", device_id)),
            (false, false) => snapshot.insert(format!("{} [{}]", name, device_id)),
        };
    }
    Ok(snapshot)
}
