use chrono::{DateTime, Duration, Utc};
use http::header::{HeaderMap, HeaderValue, SET_COOKIE};

use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;

/// Emit the session cookie carrying `session_id`, valid for the session timeout.
pub(super) fn set_session_cookie(
    headers: &mut HeaderMap,
    config: &SessionConfig,
    session_id: &str,
) -> Result<(), SessionError> {
    let max_age = i64::try_from(config.timeout()).unwrap_or(i64::MAX);
    let expires_at = Duration::try_seconds(max_age)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    header_set_cookie(
        headers,
        config.cookie_name(),
        session_id,
        expires_at,
        max_age,
        config.secure_cookie(),
    )
}

/// Emit a cookie that makes the client drop the session cookie.
pub(super) fn clear_session_cookie(
    headers: &mut HeaderMap,
    config: &SessionConfig,
) -> Result<(), SessionError> {
    header_set_cookie(
        headers,
        config.cookie_name(),
        "",
        Utc::now() - Duration::seconds(3),
        0,
        config.secure_cookie(),
    )
}

/// Add a `Set-Cookie` header, replacing any earlier one for the same cookie
/// name so the response carries a single instruction per cookie.
fn header_set_cookie(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
    expires_at: DateTime<Utc>,
    max_age: i64,
    secure: bool,
) -> Result<(), SessionError> {
    let secure = if secure { " Secure;" } else { "" };
    let expires = expires_at.format("%a, %d %b %Y %H:%M:%S GMT");
    let cookie = format!(
        "{name}={value}; SameSite=Lax;{secure} HttpOnly; Path=/; Max-Age={max_age}; Expires={expires}"
    );

    let header_value: HeaderValue = cookie
        .parse()
        .map_err(|_| SessionError::Cookie(format!("Failed to parse cookie for {name}")))?;

    let prefix = format!("{name}=");
    let kept: Vec<HeaderValue> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter(|existing| !existing.as_bytes().starts_with(prefix.as_bytes()))
        .cloned()
        .collect();
    headers.remove(SET_COOKIE);
    for existing in kept {
        headers.append(SET_COOKIE, existing);
    }
    headers.append(SET_COOKIE, header_value);

    tracing::debug!("Set-Cookie: {}", cookie);
    Ok(())
}
