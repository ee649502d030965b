use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Default base URL for the ARM Live Data web service.
pub const DEFAULT_API_BASE: &str = "https://adc.arm.gov/armlive/data";

/// Immutable service configuration, built once at startup and passed
/// explicitly into the client. Nothing mutates it afterwards, which is what
/// makes concurrent tool invocations lock-free.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base API URL, typically [`DEFAULT_API_BASE`].
    pub url: String,
    /// ARM account username.
    pub username: String,
    /// ARM Live Data API access token.
    pub token: String,
    /// Whether the process runs inside a container. In container mode only
    /// environment variables are consulted, never rc files.
    pub container: bool,
}

impl Config {
    /// Loads configuration from environment variables and/or `.armliverc`.
    ///
    /// Equivalent to `Config::load(None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::load(None, None, None)
    }

    /// Loads configuration using (in order of precedence):
    /// - explicit `url`/`username`/`token` arguments
    /// - environment variables `ARM_LIVE_URL`, `ARM_USERNAME`, `ARM_API_TOKEN`
    /// - config file from `ARM_LIVE_RC`, `./.armliverc`, or `~/.armliverc`
    ///   (skipped entirely when `ARM_MCP_CONTAINER` is set)
    pub fn load(
        url: Option<String>,
        username: Option<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let container = env_flag("ARM_MCP_CONTAINER");

        let mut url = url.or_else(|| std::env::var("ARM_LIVE_URL").ok());
        let mut username = username.or_else(|| std::env::var("ARM_USERNAME").ok());
        let mut token = token.or_else(|| std::env::var("ARM_API_TOKEN").ok());

        let rc_candidates = if container {
            Vec::new()
        } else {
            rc_candidates()
        };

        if username.is_none() || token.is_none() || url.is_none() {
            for rc_path in &rc_candidates {
                if rc_path.exists() {
                    let cfg = read_rc(rc_path).with_context(|| {
                        format!("failed to read configuration file {}", rc_path.display())
                    })?;

                    if url.is_none() {
                        url = cfg.url;
                    }
                    if username.is_none() {
                        username = cfg.username;
                    }
                    if token.is_none() {
                        token = cfg.token;
                    }
                    break;
                }
            }
        }

        let username = match username {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => bail!(missing_message("username", "ARM_USERNAME", &rc_candidates)),
        };

        let token = match token {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => bail!(missing_message("token", "ARM_API_TOKEN", &rc_candidates)),
        };

        let url = url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Config {
            url,
            username,
            token,
            container,
        })
    }
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes")
    )
}

fn missing_message(field: &str, var: &str, rc_candidates: &[PathBuf]) -> String {
    if rc_candidates.is_empty() {
        return format!("Missing configuration: {field} (set {var})");
    }
    format!(
        "Missing configuration: {field} (set {var} or put `{field}:` in one of: {})",
        rc_candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    username: Option<String>,
    token: Option<String>,
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    let mut cfg = RcConfig::default();

    // Support formatting where `token:` is on one line and the value is on
    // the next line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key {
            // Continuation value line (no colon)
            if !line.contains(':') {
                let v = strip_quotes(line);
                match pk {
                    "url" => cfg.url = Some(v.to_string()),
                    "username" => cfg.username = Some(v.to_string()),
                    "token" => cfg.token = Some(v.to_string()),
                    _ => {}
                }
                pending_key = None;
                continue;
            }
            pending_key = None;
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "url" => {
                    if !v.is_empty() {
                        cfg.url = Some(v.to_string());
                    } else {
                        pending_key = Some("url");
                    }
                }
                "username" => {
                    if !v.is_empty() {
                        cfg.username = Some(v.to_string());
                    } else {
                        pending_key = Some("username");
                    }
                }
                "token" => {
                    if !v.is_empty() {
                        cfg.token = Some(v.to_string());
                    } else {
                        pending_key = Some("token");
                    }
                }
                _ => {}
            }
        }
    }

    Ok(cfg)
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order:
    // 1) ARM_LIVE_RC (explicit)
    // 2) ./.armliverc (current working directory)
    // 3) ~/.armliverc
    if let Ok(p) = std::env::var("ARM_LIVE_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".armliverc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".armliverc"));
    }
    v
}
