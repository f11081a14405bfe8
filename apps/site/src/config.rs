use std::{fs, path::Path, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use mail_relay::{RelayCredentials, DEFAULT_RELAY_ENDPOINT, DEFAULT_RELAY_TIMEOUT};
use page_core::{
    CounterTimings, ObserveConfig, PageConfig, StaggerTimings, StaticLayout, TrackerConfig,
};
use serde::Deserialize;
use shared::domain::{SectionExtent, SectionId, SectionRegistry};

const DEFAULT_CONFIG_FILE: &str = "site.toml";

/// Document placement of one section, as written in `site.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionSetting {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl SectionSetting {
    fn new(id: &str, top: f64, height: f64) -> Self {
        Self {
            id: id.to_string(),
            top,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub sections: Vec<SectionSetting>,
    pub viewport_height: f64,
    pub activation_line: f64,
    pub scrolled_threshold: f64,
    pub reveal_threshold: f64,
    pub stagger_delay_ms: u64,
    pub stagger_step_ms: u64,
    pub stagger_duration_ms: u64,
    pub counter_delay_ms: u64,
    pub counter_duration_ms: u64,
    pub rotation_interval_ms: u64,
    pub roles: Vec<String>,
    pub project_count: usize,
    pub relay_endpoint: String,
    pub relay_timeout_ms: u64,
    pub relay_service_id: Option<String>,
    pub relay_template_id: Option<String>,
    pub relay_user_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let section = SectionSetting::new;
        Self {
            sections: vec![
                section("about", 900.0, 600.0),
                section("skills", 1500.0, 800.0),
                section("projects", 2300.0, 700.0),
                section("experience", 3000.0, 600.0),
                section("contact", 3600.0, 600.0),
            ],
            viewport_height: 800.0,
            activation_line: 100.0,
            scrolled_threshold: 50.0,
            reveal_threshold: 0.1,
            stagger_delay_ms: 100,
            stagger_step_ms: 200,
            stagger_duration_ms: 600,
            counter_delay_ms: 500,
            counter_duration_ms: 1500,
            rotation_interval_ms: 3000,
            roles: vec![
                "Full Stack Developer".into(),
                "REST API Creator".into(),
                "Database Design Expert".into(),
                "Responsive Web Developer".into(),
            ],
            project_count: 4,
            relay_endpoint: DEFAULT_RELAY_ENDPOINT.into(),
            relay_timeout_ms: DEFAULT_RELAY_TIMEOUT.as_millis() as u64,
            relay_service_id: None,
            relay_template_id: None,
            relay_user_id: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    sections: Option<Vec<SectionSetting>>,
    viewport_height: Option<f64>,
    activation_line: Option<f64>,
    scrolled_threshold: Option<f64>,
    reveal_threshold: Option<f64>,
    stagger_delay_ms: Option<u64>,
    stagger_step_ms: Option<u64>,
    stagger_duration_ms: Option<u64>,
    counter_delay_ms: Option<u64>,
    counter_duration_ms: Option<u64>,
    rotation_interval_ms: Option<u64>,
    roles: Option<Vec<String>>,
    project_count: Option<usize>,
    relay: Option<FileRelay>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileRelay {
    endpoint: Option<String>,
    timeout_ms: Option<u64>,
    service_id: Option<String>,
    template_id: Option<String>,
    user_id: Option<String>,
}

/// Defaults, then `site.toml` (or `path`), then `SITE_*` / `APP__*` env vars.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            apply_file(&mut settings, &raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                apply_file(&mut settings, &raw)
                    .with_context(|| format!("invalid config file '{DEFAULT_CONFIG_FILE}'"))?;
            }
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file.sections {
        settings.sections = v;
    }
    if let Some(v) = file.viewport_height {
        settings.viewport_height = v;
    }
    if let Some(v) = file.activation_line {
        settings.activation_line = v;
    }
    if let Some(v) = file.scrolled_threshold {
        settings.scrolled_threshold = v;
    }
    if let Some(v) = file.reveal_threshold {
        settings.reveal_threshold = v;
    }
    if let Some(v) = file.stagger_delay_ms {
        settings.stagger_delay_ms = v;
    }
    if let Some(v) = file.stagger_step_ms {
        settings.stagger_step_ms = v;
    }
    if let Some(v) = file.stagger_duration_ms {
        settings.stagger_duration_ms = v;
    }
    if let Some(v) = file.counter_delay_ms {
        settings.counter_delay_ms = v;
    }
    if let Some(v) = file.counter_duration_ms {
        settings.counter_duration_ms = v;
    }
    if let Some(v) = file.rotation_interval_ms {
        settings.rotation_interval_ms = v;
    }
    if let Some(v) = file.roles {
        settings.roles = v;
    }
    if let Some(v) = file.project_count {
        settings.project_count = v;
    }
    if let Some(relay) = file.relay {
        if let Some(v) = relay.endpoint {
            settings.relay_endpoint = v;
        }
        if let Some(v) = relay.timeout_ms {
            settings.relay_timeout_ms = v;
        }
        if relay.service_id.is_some() {
            settings.relay_service_id = relay.service_id;
        }
        if relay.template_id.is_some() {
            settings.relay_template_id = relay.template_id;
        }
        if relay.user_id.is_some() {
            settings.relay_user_id = relay.user_id;
        }
    }

    Ok(())
}

/// Each setting accepts a `SITE_` name and an `APP__` name; the latter wins.
fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let var = |name: &str| {
        lookup(&format!("APP__{name}")).or_else(|| lookup(&format!("SITE_{name}")))
    };

    if let Some(v) = var("VIEWPORT_HEIGHT") {
        settings.viewport_height = parse("VIEWPORT_HEIGHT", &v)?;
    }
    if let Some(v) = var("ACTIVATION_LINE") {
        settings.activation_line = parse("ACTIVATION_LINE", &v)?;
    }
    if let Some(v) = var("SCROLLED_THRESHOLD") {
        settings.scrolled_threshold = parse("SCROLLED_THRESHOLD", &v)?;
    }
    if let Some(v) = var("REVEAL_THRESHOLD") {
        settings.reveal_threshold = parse("REVEAL_THRESHOLD", &v)?;
    }
    if let Some(v) = var("ROTATION_INTERVAL_MS") {
        settings.rotation_interval_ms = parse("ROTATION_INTERVAL_MS", &v)?;
    }
    if let Some(v) = var("ROLES") {
        settings.roles = v
            .split(',')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(v) = var("RELAY_ENDPOINT") {
        settings.relay_endpoint = v;
    }
    if let Some(v) = var("RELAY_TIMEOUT_MS") {
        settings.relay_timeout_ms = parse("RELAY_TIMEOUT_MS", &v)?;
    }
    if let Some(v) = var("RELAY_SERVICE_ID") {
        settings.relay_service_id = Some(v);
    }
    if let Some(v) = var("RELAY_TEMPLATE_ID") {
        settings.relay_template_id = Some(v);
    }
    if let Some(v) = var("RELAY_USER_ID") {
        settings.relay_user_id = Some(v);
    }

    Ok(())
}

fn parse<T>(name: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value for {name}: '{raw}'"))
}

impl Settings {
    pub fn extents(&self) -> anyhow::Result<Vec<SectionExtent>> {
        self.sections
            .iter()
            .map(|section| -> anyhow::Result<SectionExtent> {
                let id = SectionId::new(section.id.as_str())
                    .with_context(|| format!("invalid section id '{}'", section.id))?;
                if section.height < 0.0 {
                    bail!("section '{id}' has a negative height");
                }
                Ok(SectionExtent {
                    id,
                    top: section.top,
                    height: section.height,
                })
            })
            .collect()
    }

    pub fn registry(&self) -> anyhow::Result<SectionRegistry> {
        let ids = self.extents()?.into_iter().map(|extent| extent.id).collect();
        Ok(SectionRegistry::from_ids(ids)?)
    }

    pub fn layout(&self) -> anyhow::Result<StaticLayout> {
        Ok(StaticLayout::new(self.extents()?))
    }

    pub fn page_config(&self) -> anyhow::Result<PageConfig> {
        if self.viewport_height <= 0.0 {
            bail!("viewport_height must be positive");
        }

        let mut config = PageConfig::new(Arc::new(self.registry()?), self.roles.clone());
        config.tracker = TrackerConfig {
            activation_line: self.activation_line,
            scrolled_threshold: self.scrolled_threshold,
        };
        config.observe = ObserveConfig::new(self.reveal_threshold);
        config.stagger = StaggerTimings {
            initial_delay: Duration::from_millis(self.stagger_delay_ms),
            stagger: Duration::from_millis(self.stagger_step_ms),
            child_duration: Duration::from_millis(self.stagger_duration_ms),
        };
        config.counter = CounterTimings {
            delay: Duration::from_millis(self.counter_delay_ms),
            duration: Duration::from_millis(self.counter_duration_ms),
        };
        config.rotation_interval = Duration::from_millis(self.rotation_interval_ms);
        config.project_count = self.project_count;
        Ok(config)
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }

    /// `None` until all three relay identifiers are configured.
    pub fn relay_credentials(&self) -> Option<RelayCredentials> {
        Some(RelayCredentials {
            service_id: self.relay_service_id.clone()?,
            template_id: self.relay_template_id.clone()?,
            user_id: self.relay_user_id.clone()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_build_a_page_config() {
        let settings = Settings::default();
        let config = settings.page_config().expect("page config");

        assert_eq!(config.registry.len(), 5);
        assert_eq!(config.tracker, TrackerConfig::default());
        assert_eq!(config.observe.threshold(), 0.1);
        assert_eq!(config.stagger, StaggerTimings::default());
        assert_eq!(config.counter, CounterTimings::default());
        assert_eq!(config.rotation_interval, Duration::from_secs(3));
        assert_eq!(config.roles.len(), 4);
        assert!(settings.relay_credentials().is_none());
        assert_eq!(settings.relay_timeout(), DEFAULT_RELAY_TIMEOUT);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        apply_file(
            &mut settings,
            r#"
                viewport_height = 1024.0
                roles = ["Engineer"]
                sections = [
                    { id = "about", top = 700.0, height = 500.0 },
                    { id = "contact", top = 1200.0, height = 400.0 },
                ]

                [relay]
                timeout_ms = 2500
                service_id = "service_abc"
                template_id = "template_xyz"
                user_id = "user_123"
            "#,
        )
        .expect("apply file");

        assert_eq!(settings.viewport_height, 1024.0);
        assert_eq!(settings.roles, vec!["Engineer".to_string()]);
        assert_eq!(settings.sections.len(), 2);
        assert_eq!(settings.activation_line, 100.0);
        let credentials = settings.relay_credentials().expect("credentials");
        assert_eq!(credentials.service_id, "service_abc");
        assert_eq!(settings.relay_endpoint, DEFAULT_RELAY_ENDPOINT);
        assert_eq!(settings.relay_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut settings = Settings::default();
        assert!(apply_file(&mut settings, "viewport = 10.0").is_err());
        assert!(apply_file(&mut settings, "[relay]\nsecret = \"x\"").is_err());
    }

    #[test]
    fn blank_section_id_fails_page_config() {
        let mut settings = Settings::default();
        apply_file(
            &mut settings,
            r#"sections = [{ id = "  ", top = 0.0, height = 10.0 }]"#,
        )
        .expect("apply file");
        assert!(settings.page_config().is_err());
        assert!(settings.layout().is_err());
    }

    #[test]
    fn duplicate_sections_fail_page_config() {
        let mut settings = Settings::default();
        let about = settings.sections[0].clone();
        settings.sections.push(about);
        let err = settings.page_config().expect_err("duplicate");
        assert!(err.to_string().contains("about"));
    }

    #[test]
    fn app_prefixed_env_wins_over_site_prefix() {
        let mut settings = Settings::default();
        apply_env(
            &mut settings,
            env(&[
                ("SITE_ACTIVATION_LINE", "80"),
                ("APP__ACTIVATION_LINE", "120"),
                ("SITE_ROLES", "Engineer, , Writer"),
                ("SITE_RELAY_USER_ID", "user_123"),
                ("APP__RELAY_TIMEOUT_MS", "750"),
            ]),
        )
        .expect("apply env");

        assert_eq!(settings.activation_line, 120.0);
        assert_eq!(settings.roles, vec!["Engineer", "Writer"]);
        assert_eq!(settings.relay_user_id.as_deref(), Some("user_123"));
        assert_eq!(settings.relay_timeout_ms, 750);
    }

    #[test]
    fn malformed_env_number_is_an_error() {
        let mut settings = Settings::default();
        let err = apply_env(&mut settings, env(&[("SITE_VIEWPORT_HEIGHT", "tall")]))
            .expect_err("should fail");
        assert!(err.to_string().contains("VIEWPORT_HEIGHT"));
    }
}
