//! monthcal configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Weekday;
use chrono_tz::Tz;
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CalendarError, CalendarResult};
use crate::grid::weekday_from_index;

static DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
static DEFAULT_EVENTS_PATH: &str = "/api/events/";
const DEFAULT_FIRST_DAY_OF_WEEK: u8 = 1;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_events_path() -> String {
    DEFAULT_EVENTS_PATH.to_string()
}

fn default_first_day_of_week() -> u8 {
    DEFAULT_FIRST_DAY_OF_WEEK
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Paths of the account endpoints, relative to `base_url`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AuthEndpoints {
    pub status: String,
    pub login: String,
    pub logout: String,
    pub register: String,
    pub profile: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        AuthEndpoints {
            status: "/accounts/api/auth/status/".into(),
            login: "/accounts/account_login/".into(),
            logout: "/accounts/account_logout/".into(),
            register: "/accounts/register/".into(),
            profile: "/accounts/profile/".into(),
        }
    }
}

/// Configuration at ~/.config/monthcal/config.toml, overridable with
/// `MONTHCAL_*` environment variables (`MONTHCAL_AUTH__LOGIN` for nested keys).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MonthcalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_events_path")]
    pub events_path: String,

    /// 0 = Sunday .. 6 = Saturday
    #[serde(default = "default_first_day_of_week")]
    pub first_day_of_week: u8,

    /// IANA name; offset timestamps are shown in this zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub auth: AuthEndpoints,
}

impl Default for MonthcalConfig {
    fn default() -> Self {
        MonthcalConfig {
            base_url: default_base_url(),
            events_path: default_events_path(),
            first_day_of_week: DEFAULT_FIRST_DAY_OF_WEEK,
            timezone: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auth: AuthEndpoints::default(),
        }
    }
}

impl MonthcalConfig {
    pub fn config_path() -> CalendarResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalendarError::Config("Could not determine config directory".into()))?
            .join("monthcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented file on first use.
    pub fn load() -> CalendarResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> CalendarResult<Self> {
        Self::load_layered(path, None)
    }

    /// Load `path` with `MONTHCAL_*` overrides on top, read from `env` when
    /// given instead of the process environment.
    fn load_layered(path: &Path, env: Option<Map<String, String>>) -> CalendarResult<Self> {
        let config: MonthcalConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("MONTHCAL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .map_err(|e| CalendarError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalendarError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CalendarResult<()> {
        self.first_day_of_week()?;
        self.timezone()?;
        self.events_url()?;
        Ok(())
    }

    pub fn first_day_of_week(&self) -> CalendarResult<Weekday> {
        weekday_from_index(self.first_day_of_week)
    }

    pub fn timezone(&self) -> CalendarResult<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|e| CalendarError::Config(format!("Unknown timezone '{name}': {e}")))
            })
            .transpose()
    }

    pub fn base_url(&self) -> CalendarResult<Url> {
        Url::parse(&self.base_url).map_err(|e| CalendarError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })
    }

    pub fn events_url(&self) -> CalendarResult<Url> {
        join_url(&self.base_url()?, &self.events_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Save the current config to ~/.config/monthcal/config.toml
    pub fn save(&self) -> CalendarResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> CalendarResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CalendarError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalendarError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| CalendarError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalendarResult<()> {
        let contents = format!(
            "\
# monthcal configuration

# Server hosting the events and account endpoints:
# base_url = \"{}\"

# Events endpoint, queried with ?year=YYYY&month=M:
# events_path = \"{}\"

# First column of the month grid (0 = Sunday, 1 = Monday):
# first_day_of_week = {}

# Show event times in this timezone (defaults to the system timezone):
# timezone = \"Africa/Nairobi\"

# request_timeout_secs = {}

# [auth]
# login = \"/accounts/account_login/\"
",
            DEFAULT_BASE_URL, DEFAULT_EVENTS_PATH, DEFAULT_FIRST_DAY_OF_WEEK, DEFAULT_REQUEST_TIMEOUT_SECS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalendarError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalendarError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

/// Join an endpoint path onto the base URL.
pub(crate) fn join_url(base: &Url, path: &str) -> CalendarResult<Url> {
    base.join(path).map_err(|e| CalendarError::InvalidUrl {
        url: format!("{}{}", base, path),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MonthcalConfig::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.first_day_of_week().unwrap(), Weekday::Mon);
        assert_eq!(
            config.events_url().unwrap().as_str(),
            "http://127.0.0.1:8000/api/events/"
        );
        assert_eq!(config.auth.login, "/accounts/account_login/");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_commented_default_file_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monthcal").join("config.toml");

        MonthcalConfig::create_default_config(&path).unwrap();
        let config = MonthcalConfig::load_from(&path).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.first_day_of_week, DEFAULT_FIRST_DAY_OF_WEEK);
        assert!(config.timezone.is_none());
    }

    #[test]
    fn test_file_overrides_and_nested_auth_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
base_url = "https://esa.example.org"
first_day_of_week = 0
timezone = "Africa/Nairobi"

[auth]
login = "/auth/login/"
"#,
        )
        .unwrap();

        let config = MonthcalConfig::load_from(&path).unwrap();

        assert_eq!(config.first_day_of_week().unwrap(), Weekday::Sun);
        assert_eq!(config.timezone().unwrap(), Some(chrono_tz::Africa::Nairobi));
        assert_eq!(config.auth.login, "/auth/login/");
        assert_eq!(config.auth.logout, "/accounts/account_logout/");
        assert_eq!(
            config.events_url().unwrap().as_str(),
            "https://esa.example.org/api/events/"
        );
    }

    #[test]
    fn test_environment_overrides_file_and_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "first_day_of_week = 1\n\n[auth]\nlogin = \"/auth/login/\"\n",
        )
        .unwrap();

        let env = Map::from([
            ("MONTHCAL_FIRST_DAY_OF_WEEK".to_string(), "0".to_string()),
            ("MONTHCAL_AUTH__LOGIN".to_string(), "/x/login/".to_string()),
            ("MONTHCAL_BASE_URL".to_string(), "https://esa.example.org".to_string()),
            ("MONTHCAL_LOG".to_string(), "debug".to_string()),
            ("OTHER_FIRST_DAY_OF_WEEK".to_string(), "5".to_string()),
        ]);

        let config = MonthcalConfig::load_layered(&path, Some(env)).unwrap();

        assert_eq!(config.first_day_of_week().unwrap(), Weekday::Sun);
        assert_eq!(config.auth.login, "/x/login/");
        assert_eq!(config.auth.logout, "/accounts/account_logout/");
        assert_eq!(config.base_url, "https://esa.example.org");
    }

    #[test]
    fn test_invalid_environment_override_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let env = Map::from([("MONTHCAL_FIRST_DAY_OF_WEEK".to_string(), "7".to_string())]);

        assert!(matches!(
            MonthcalConfig::load_layered(&dir.path().join("absent.toml"), Some(env)),
            Err(CalendarError::InvalidFirstDayOfWeek(7))
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "first_day_of_week = 9\n").unwrap();
        assert!(matches!(
            MonthcalConfig::load_from(&path),
            Err(CalendarError::InvalidFirstDayOfWeek(9))
        ));

        std::fs::write(&path, "timezone = \"Mars/Olympus\"\n").unwrap();
        assert!(matches!(
            MonthcalConfig::load_from(&path),
            Err(CalendarError::Config(_))
        ));

        std::fs::write(&path, "base_url = \"not a url\"\n").unwrap();
        assert!(matches!(
            MonthcalConfig::load_from(&path),
            Err(CalendarError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = MonthcalConfig {
            first_day_of_week: 0,
            timezone: Some("Europe/Berlin".into()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(MonthcalConfig::load_from(&path).unwrap(), config);
    }
}
