//! Account client: status, login, logout, registration and profile updates.
//!
//! All endpoints are form posts against the site's account views. The client
//! keeps a cookie store for the session and the `csrftoken` cookie, and sends
//! the token back as `X-CSRFToken` together with `X-Requested-With` so the
//! views answer with JSON instead of redirects.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::REFERER;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::{AuthEndpoints, MonthcalConfig, join_url};
use crate::error::{CalendarError, CalendarResult};

const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";

/// JSON body returned by the account endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    /// Form errors by field name.
    #[serde(default)]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    /// Anything else the endpoint sent (e.g. user details on status checks).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AuthResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Where to go after a successful login or registration.
    pub fn redirect_or_root(&self) -> &str {
        self.redirect_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or("/")
    }

    pub fn message_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(default)
    }

    /// Form errors flattened to `field: message` lines.
    pub fn error_lines(&self) -> Vec<String> {
        self.errors
            .iter()
            .flatten()
            .flat_map(|(field, messages)| {
                messages
                    .iter()
                    .map(move |message| format!("{}: {}", field, message))
            })
            .collect()
    }
}

pub struct AuthClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
    endpoints: AuthEndpoints,
}

impl AuthClient {
    pub fn new(base_url: Url, endpoints: AuthEndpoints, timeout: Duration) -> CalendarResult<Self> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(timeout)
            .build()?;

        Ok(AuthClient {
            http,
            jar,
            base_url,
            endpoints,
        })
    }

    pub fn from_config(config: &MonthcalConfig) -> CalendarResult<Self> {
        Self::new(
            config.base_url()?,
            config.auth.clone(),
            config.request_timeout(),
        )
    }

    pub fn endpoints(&self) -> &AuthEndpoints {
        &self.endpoints
    }

    /// The CSRF token currently held in the cookie store, percent-decoded.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;

        let raw = cookies
            .split(';')
            .map(str::trim)
            .find_map(|cookie| cookie.strip_prefix(CSRF_COOKIE)?.strip_prefix('='))?;

        percent_decode_str(raw)
            .decode_utf8()
            .ok()
            .map(|token| token.into_owned())
    }

    pub async fn check_status(&self) -> CalendarResult<AuthResponse> {
        let url = join_url(&self.base_url, &self.endpoints.status)?;
        debug!(%url, "Checking auth status");

        let resp = self.http.get(url.clone()).send().await?;
        read_response(resp, &url).await
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> CalendarResult<AuthResponse> {
        let remember_me = remember_me.to_string();
        let form = [
            ("username", username),
            ("password", password),
            ("remember_me", remember_me.as_str()),
        ];

        self.post_form(&self.endpoints.login, &form).await
    }

    pub async fn logout(&self) -> CalendarResult<AuthResponse> {
        let form: [(&str, &str); 0] = [];
        self.post_form(&self.endpoints.logout, &form).await
    }

    pub async fn register(&self, fields: &[(String, String)]) -> CalendarResult<AuthResponse> {
        self.post_form(&self.endpoints.register, fields).await
    }

    pub async fn update_profile(&self, fields: &[(String, String)]) -> CalendarResult<AuthResponse> {
        self.post_form(&self.endpoints.profile, fields).await
    }

    /// Fetch the status endpoint once if no CSRF cookie has been issued yet.
    async fn ensure_csrf_token(&self) -> CalendarResult<Option<String>> {
        if let Some(token) = self.csrf_token() {
            return Ok(Some(token));
        }

        let url = join_url(&self.base_url, &self.endpoints.status)?;
        debug!(%url, "Priming CSRF cookie");
        self.http.get(url).send().await?;

        let token = self.csrf_token();
        if token.is_none() {
            warn!("Server did not issue a CSRF cookie; posting without token");
        }
        Ok(token)
    }

    async fn post_form<T: Serialize + ?Sized>(
        &self,
        path: &str,
        form: &T,
    ) -> CalendarResult<AuthResponse> {
        let url = join_url(&self.base_url, path)?;
        let token = self.ensure_csrf_token().await?;

        debug!(%url, "Posting account form");

        let mut req = self
            .http
            .post(url.clone())
            .header("X-Requested-With", "XMLHttpRequest")
            .header(REFERER, self.base_url.as_str())
            .form(form);

        if let Some(token) = token {
            req = req.header(CSRF_HEADER, token);
        }

        let resp = req.send().await?;
        read_response(resp, &url).await
    }
}

/// Account views answer validation failures with a 4xx and a JSON body, so a
/// non-2xx reply that still carries a status is returned as a response.
async fn read_response(resp: reqwest::Response, url: &Url) -> CalendarResult<AuthResponse> {
    let status = resp.status();
    let body = resp.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    match serde_json::from_str::<AuthResponse>(&body) {
        Ok(parsed) if !parsed.status.is_empty() => Ok(parsed),
        _ => Err(CalendarError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_lines_flatten_field_errors() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"status": "error", "errors": {
                "email": ["Enter a valid email address."],
                "password2": ["Passwords do not match.", "Too short."]
            }}"#,
        )
        .unwrap();

        assert!(!response.is_success());
        assert_eq!(
            response.error_lines(),
            vec![
                "email: Enter a valid email address.",
                "password2: Passwords do not match.",
                "password2: Too short.",
            ]
        );
    }

    #[test]
    fn test_redirect_defaults_to_root() {
        let mut response = AuthResponse {
            status: "success".into(),
            ..Default::default()
        };
        assert_eq!(response.redirect_or_root(), "/");

        response.redirect_url = Some("/dashboard/".into());
        assert_eq!(response.redirect_or_root(), "/dashboard/");
    }

    #[test]
    fn test_extra_fields_and_null_errors_are_tolerated() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"status": "authenticated", "errors": null, "username": "wanjiku"}"#,
        )
        .unwrap();

        assert!(response.error_lines().is_empty());
        assert_eq!(response.extra["username"], "wanjiku");
        assert_eq!(response.message_or("none"), "none");
    }

    #[test]
    fn test_csrf_token_is_read_from_cookie_store() {
        let base = Url::parse("http://127.0.0.1:8000").unwrap();
        let client = AuthClient::new(
            base.clone(),
            AuthEndpoints::default(),
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(client.csrf_token(), None);

        client.jar.add_cookie_str("sessionid=s1; Path=/", &base);
        client.jar.add_cookie_str("csrftoken=abc123; Path=/", &base);
        assert_eq!(client.csrf_token().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_csrf_token_is_percent_decoded() {
        let base = Url::parse("http://127.0.0.1:8000").unwrap();
        let client = AuthClient::new(
            base.clone(),
            AuthEndpoints::default(),
            Duration::from_secs(1),
        )
        .unwrap();

        client.jar.add_cookie_str("csrftoken=ab%2Fc%3D%3D; Path=/", &base);
        assert_eq!(client.csrf_token().as_deref(), Some("ab/c=="));
    }
}
