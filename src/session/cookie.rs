//! Document cookie parsing and cookie source resolution.

use std::path::Path;

use crate::config::SessionConfig;
use crate::error::{AppError, Result};

/// Find `name` in a document cookie string (`a=1; b=2`).
///
/// Values are percent-decoded; surrounding double quotes are stripped.
pub fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
}

/// Resolve the document cookie string.
///
/// Precedence: explicit value, explicit file, configured value, configured file.
pub fn resolve_cookie_header(
    config: &SessionConfig,
    cookie: Option<&str>,
    cookie_file: Option<&Path>,
) -> Result<Option<String>> {
    if let Some(cookie) = cookie {
        return Ok(Some(cookie.to_string()));
    }
    if let Some(path) = cookie_file {
        return read_cookie_file(path).map(Some);
    }
    if let Some(cookie) = &config.cookie {
        return Ok(Some(cookie.clone()));
    }
    if let Some(path) = &config.cookie_file {
        return read_cookie_file(path).map(Some);
    }
    Ok(None)
}

fn read_cookie_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::not_found(format!("cookie file {} is empty", path.display())));
    }
    Ok(content.to_string())
}
