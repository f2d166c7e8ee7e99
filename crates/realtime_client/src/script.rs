//! Subprocess-backed provider implementations.
//!
//! One interpreter process per call, stdout captured, bounded by a
//! timeout. A hung script therefore costs one row, never a whole batch.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use common::{Enrichment, Error, Result, WeatherSample};

use crate::{parse, LookupProvider, WeatherProvider};

/// Real-time lookup via a per-call script invocation.
#[derive(Debug, Clone)]
pub struct ScriptLookupProvider {
    python_bin: String,
    script: String,
    timeout: Duration,
}

impl ScriptLookupProvider {
    pub fn new(python_bin: impl Into<String>, script: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python_bin: python_bin.into(),
            script: script.into(),
            timeout,
        }
    }
}

#[async_trait]
impl LookupProvider for ScriptLookupProvider {
    async fn lookup(&self, key: &str) -> Result<Enrichment> {
        let stdout = run_script(&self.python_bin, &self.script, Some(key), self.timeout).await?;
        debug!("Lookup output for {}: {}", key, stdout.trim());
        parse::enrichment_from_output(&stdout)
    }
}

/// Weather fetch via a per-call script invocation.
#[derive(Debug, Clone)]
pub struct ScriptWeatherProvider {
    python_bin: String,
    script: String,
    timeout: Duration,
}

impl ScriptWeatherProvider {
    pub fn new(python_bin: impl Into<String>, script: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python_bin: python_bin.into(),
            script: script.into(),
            timeout,
        }
    }
}

#[async_trait]
impl WeatherProvider for ScriptWeatherProvider {
    async fn fetch(&self) -> Result<WeatherSample> {
        let stdout = run_script(&self.python_bin, &self.script, None, self.timeout).await?;
        parse::weather_from_output(&stdout)
    }
}

async fn run_script(
    python_bin: &str,
    script: &str,
    arg: Option<&str>,
    timeout: Duration,
) -> Result<String> {
    let mut cmd = Command::new(python_bin);
    cmd.arg(script);
    if let Some(arg) = arg {
        cmd.arg(arg);
    }
    let child = cmd
        .kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Provider(format!("failed to spawn {}: {}", python_bin, e)))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| Error::ProviderTimeout(timeout.as_secs()))?
        .map_err(|e| Error::Provider(format!("script {} failed: {}", script, e)))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        return Err(Error::Provider(format!(
            "script {} exited with {}: {}",
            script,
            output.status,
            stderr.trim()
        )));
    }
    if !stderr.trim().is_empty() {
        return Err(Error::Provider(format!(
            "script {} wrote to stderr: {}",
            script,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
