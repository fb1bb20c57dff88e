// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Request authentication. A request is authenticated if it carries a valid
//! session cookie, or a bearer token equal to the configured API token.
//!
//! A session cookie has the form `username.issued_at.mac`, where the
//! username is percent-encoded, `issued_at` is a Unix timestamp in seconds,
//! and `mac` is a keyed BLAKE3 hash of the other two parts.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::header::COOKIE;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;

use crate::config::AuthConfig;
use crate::types::timestamp::Timestamp;

pub const SESSION_COOKIE: &str = "flashsched_session";

const KEY_CONTEXT: &str = "flashsched 2025-01-01 session cookie v1";

/// Whether the request is authenticated. Headers that cannot be parsed
/// count as missing credentials.
pub fn check_auth(headers: &HeaderMap, config: &AuthConfig, now: Timestamp) -> bool {
    if let Some(session) = get_cookie(headers, SESSION_COOKIE) {
        if verify_session(config, session, now) {
            return true;
        }
    }
    match (bearer_token(headers), &config.api_token) {
        (Some(given), Some(expected)) => secure_eq(given, expected),
        _ => false,
    }
}

/// Whether a login attempt matches the configured credentials.
pub fn check_credentials(config: &AuthConfig, username: &str, password: &str) -> bool {
    // Evaluate both so a wrong username takes as long as a wrong password.
    let user_ok = secure_eq(username, &config.username);
    let pass_ok = secure_eq(password, &config.password);
    user_ok && pass_ok
}

/// A fresh session value for the configured user.
pub fn create_session(config: &AuthConfig, now: Timestamp) -> String {
    let username = utf8_percent_encode(&config.username, NON_ALPHANUMERIC).to_string();
    let issued_at = now.into_inner().timestamp();
    let mac = sign(config, &username, issued_at);
    format!("{username}.{issued_at}.{}", mac.to_hex())
}

/// Whether a session value was issued by this server for the configured
/// user and has not expired.
pub fn verify_session(config: &AuthConfig, value: &str, now: Timestamp) -> bool {
    let mut parts = value.splitn(3, '.');
    let (Some(username), Some(issued_at), Some(mac)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(issued_at) = issued_at.parse::<i64>() else {
        return false;
    };
    let Ok(mac) = blake3::Hash::from_hex(mac) else {
        return false;
    };
    // `blake3::Hash` compares in constant time.
    if sign(config, username, issued_at) != mac {
        return false;
    }
    let age = now.into_inner().timestamp() - issued_at;
    let max_age = config.session_max_age_days as i64 * 86400;
    if !(0..=max_age).contains(&age) {
        return false;
    }
    match percent_decode_str(username).decode_utf8() {
        Ok(username) => username == config.username,
        Err(_) => false,
    }
}

/// The `Set-Cookie` value that stores a session.
pub fn session_cookie(config: &AuthConfig, value: &str) -> String {
    let max_age = config.session_max_age_days as u64 * 86400;
    format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

/// The `Set-Cookie` value that removes the session.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

fn sign(config: &AuthConfig, username: &str, issued_at: i64) -> blake3::Hash {
    let key = blake3::derive_key(KEY_CONTEXT, config.session_secret.as_bytes());
    blake3::keyed_hash(&key, format!("{username}:{issued_at}").as_bytes())
}

fn secure_eq(a: &str, b: &str) -> bool {
    blake3::hash(a.as_bytes()) == blake3::hash(b.as_bytes())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use chrono::Duration;

    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            username: "ana maría".to_string(),
            password: "hunter2".to_string(),
            api_token: Some("tok".to_string()),
            session_secret: "secret".to_string(),
            session_max_age_days: 7,
        }
    }

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_session_round_trip() {
        let config = config();
        let now = Timestamp::now();
        let session = create_session(&config, now);
        assert!(verify_session(&config, &session, now));
        assert!(verify_session(&config, &session, now.plus(Duration::days(6))));
        assert!(!verify_session(&config, &session, now.plus(Duration::days(8))));
    }

    #[test]
    fn test_session_tampering() {
        let config = config();
        let now = Timestamp::now();
        let session = create_session(&config, now);
        let forged = session.replacen("ana", "bob", 1);
        assert!(!verify_session(&config, &forged, now));
        assert!(!verify_session(&config, "garbage", now));
        assert!(!verify_session(&config, "a.b.c", now));

        let other = AuthConfig {
            session_secret: "other".to_string(),
            ..config.clone()
        };
        assert!(!verify_session(&other, &session, now));
    }

    #[test]
    fn test_check_auth_with_cookie() {
        let config = config();
        let now = Timestamp::now();
        let session = create_session(&config, now);
        let cookie = format!("theme=dark; {SESSION_COOKIE}={session}");
        assert!(check_auth(&headers(&[(COOKIE, &cookie)]), &config, now));
        assert!(!check_auth(&headers(&[(COOKIE, "theme=dark")]), &config, now));
    }

    #[test]
    fn test_check_auth_with_token() {
        let config = config();
        let now = Timestamp::now();
        assert!(check_auth(
            &headers(&[(AUTHORIZATION, "Bearer tok")]),
            &config,
            now
        ));
        assert!(!check_auth(
            &headers(&[(AUTHORIZATION, "Bearer nope")]),
            &config,
            now
        ));
        assert!(!check_auth(&headers(&[(AUTHORIZATION, "tok")]), &config, now));
        assert!(!check_auth(&headers(&[(AUTHORIZATION, "Bearer ")]), &config, now));
        assert!(!check_auth(&HeaderMap::new(), &config, now));

        let no_token = AuthConfig {
            api_token: None,
            ..config
        };
        assert!(!check_auth(
            &headers(&[(AUTHORIZATION, "Bearer tok")]),
            &no_token,
            now
        ));
    }

    #[test]
    fn test_malformed_headers_are_not_credentials() {
        let config = config();
        let mut map = HeaderMap::new();
        map.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftok").unwrap(),
        );
        map.insert(COOKIE, HeaderValue::from_static(";;=;novalue"));
        assert!(!check_auth(&map, &config, Timestamp::now()));
    }

    #[test]
    fn test_credentials() {
        let config = config();
        assert!(check_credentials(&config, "ana maría", "hunter2"));
        assert!(!check_credentials(&config, "ana maría", "hunter3"));
        assert!(!check_credentials(&config, "admin", "hunter2"));
    }

    #[test]
    fn test_cookie_headers() {
        let config = config();
        assert_eq!(
            session_cookie(&config, "v"),
            "flashsched_session=v; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800"
        );
        assert!(clear_session_cookie().ends_with("Max-Age=0"));
    }
}
