use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::cookie::Jar;
use url::Url;

use crate::error::CredentialError;

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// One line of a Netscape cookie file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Unix time; 0 for session cookies.
    pub expires: u64,
    pub name: String,
    pub value: String,
    pub http_only: bool,
}

impl Cookie {
    fn origin(&self) -> Option<Url> {
        let host = self.domain.trim_start_matches('.');
        let scheme = if self.secure { "https" } else { "http" };
        Url::parse(&format!("{}://{}{}", scheme, host, self.path)).ok()
    }

    fn set_cookie_header(&self) -> String {
        let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.include_subdomains {
            header.push_str("; Domain=");
            header.push_str(self.domain.trim_start_matches('.'));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        header
    }
}

/// Credentials attached to every outgoing request of a session.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    cookies: Vec<Cookie>,
}

impl CredentialSet {
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    #[cfg(test)]
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Cookies whose expiry lies before `now` (Unix seconds). Session cookies never expire.
    pub fn expired_count(&self, now: u64) -> usize {
        self.cookies
            .iter()
            .filter(|c| c.expires != 0 && c.expires < now)
            .count()
    }

    /// Adds every cookie to `jar`. Cookies whose domain cannot form a URL are skipped.
    pub fn install(&self, jar: &Jar) {
        for cookie in &self.cookies {
            match cookie.origin() {
                Some(url) => jar.add_cookie_str(&cookie.set_cookie_header(), &url),
                None => tracing::warn!(domain = %cookie.domain, name = %cookie.name, "skipping cookie with unusable domain"),
            }
        }
    }
}

/// Load a Netscape-format cookie file. Expired cookies are kept.
pub fn load_credentials(path: &Path) -> Result<CredentialSet, CredentialError> {
    if !path.exists() {
        return Err(CredentialError::Missing(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let set = parse_cookie_file(&content)?;
    tracing::info!(count = set.len(), path = %path.display(), "loaded cookies");

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let expired = set.expired_count(now);
    if expired > 0 {
        tracing::warn!(expired, "cookie file contains expired cookies, sending them anyway");
    }
    Ok(set)
}

pub fn parse_cookie_file(content: &str) -> Result<CredentialSet, CredentialError> {
    let mut cookies = Vec::new();

    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }

        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None if line.starts_with('#') => continue,
            None => (line, false),
        };

        cookies.push(parse_line(line, http_only).map_err(|reason| CredentialError::Malformed {
            line: i + 1,
            reason,
        })?);
    }

    Ok(CredentialSet { cookies })
}

fn parse_line(line: &str, http_only: bool) -> Result<Cookie, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 7 {
        return Err(format!("expected 7 tab-separated fields, found {}", fields.len()));
    }

    let expires = if fields[4].is_empty() {
        0
    } else {
        fields[4]
            .parse()
            .map_err(|_| format!("invalid expiry {:?}", fields[4]))?
    };

    Ok(Cookie {
        domain: fields[0].to_string(),
        include_subdomains: parse_flag(fields[1])?,
        path: fields[2].to_string(),
        secure: parse_flag(fields[3])?,
        expires,
        name: fields[5].to_string(),
        value: fields[6].to_string(),
        http_only,
    })
}

fn parse_flag(s: &str) -> Result<bool, String> {
    match s {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        other => Err(format!("expected TRUE or FALSE, found {:?}", other)),
    }
}
