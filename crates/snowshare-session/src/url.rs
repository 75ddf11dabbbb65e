//! Account identifier derivation from account URLs
//!
//! `SHOW MANAGED ACCOUNTS` reports a full login URL; connecting needs the
//! bare account identifier.

/// Derive the connectable account identifier from an account URL
///
/// `https://orgname-accountname.snowflakecomputing.com` becomes
/// `orgname-accountname`. Inputs without a scheme or suffix pass through
/// with only the path stripped.
pub fn account_identifier_from_url(account_url: &str) -> String {
    let mut url = account_url;
    if let Some(rest) = url.strip_prefix("https://") {
        url = rest;
    } else if let Some(rest) = url.strip_prefix("http://") {
        url = rest;
    }

    let host = url.split('/').next().unwrap_or(url);
    match host.split_once(".snowflakecomputing.com") {
        Some((account, _)) => account.to_string(),
        None => host.to_string(),
    }
}
