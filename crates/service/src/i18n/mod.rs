//! Message templates for system notes and report labels.
//!
//! Templates use `%{name}` placeholders. Lookups fall back from a regional
//! locale (`pt_BR`) to its language (`pt`) and finally to `en`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::errors::ServiceError;

const BUILTIN: &str = include_str!("locales.toml");
pub const FALLBACK_LOCALE: &str = "en";
const DATE_ONLY_KEY: &str = "date_formats.date_only";

pub trait Localizer: Send + Sync {
    fn translate(&self, locale: &str, key: &str, vars: &[(&str, &str)]) -> Result<String, ServiceError>;

    fn format_date_only(&self, locale: &str, at: DateTime<Utc>) -> Result<String, ServiceError>;
}

/// In-memory catalogue of `locale -> dotted key -> template`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, HashMap<String, String>>,
}

impl Catalog {
    /// Templates shipped with the crate.
    pub fn builtin() -> Result<Self, ServiceError> {
        Self::from_toml_str(BUILTIN)
    }

    /// Builtin templates overlaid with the ones from `path`.
    pub async fn builtin_with_overrides(path: &Path) -> Result<Self, ServiceError> {
        let mut catalog = Self::builtin()?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServiceError::Localization(format!("{}: {e}", path.display())))?;
        catalog.merge(Self::from_toml_str(&content)?);
        Ok(catalog)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ServiceError> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| ServiceError::Localization(e.to_string()))?;
        let mut messages = HashMap::new();
        for (locale, value) in table {
            let mut flat = HashMap::new();
            flatten("", &value, &mut flat)?;
            messages.insert(locale, flat);
        }
        Ok(Self { messages })
    }

    pub fn merge(&mut self, other: Catalog) {
        for (locale, entries) in other.messages {
            self.messages.entry(locale).or_default().extend(entries);
        }
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.messages.contains_key(locale)
    }

    fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        let language = locale.split(['_', '-']).next().unwrap_or(locale);
        [locale, language, FALLBACK_LOCALE]
            .into_iter()
            .find_map(|l| self.messages.get(l).and_then(|m| m.get(key)))
            .map(String::as_str)
    }
}

fn flatten(prefix: &str, value: &toml::Value, out: &mut HashMap<String, String>) -> Result<(), ServiceError> {
    match value {
        toml::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        toml::Value::Table(t) => {
            for (k, v) in t {
                let key = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                flatten(&key, v, out)?;
            }
        }
        other => {
            return Err(ServiceError::Localization(format!(
                "`{prefix}` must be a string or table, found {}",
                other.type_str()
            )))
        }
    }
    Ok(())
}

/// Substitute `%{name}` placeholders in one pass; unknown names are kept verbatim.
pub fn interpolate(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match vars.iter().find(|(k, _)| *k == name) {
                    Some((_, v)) => out.push_str(v),
                    None => {
                        out.push_str("%{");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

impl Localizer for Catalog {
    fn translate(&self, locale: &str, key: &str, vars: &[(&str, &str)]) -> Result<String, ServiceError> {
        let template = self
            .lookup(locale, key)
            .ok_or_else(|| ServiceError::Localization(format!("missing translation `{key}` for `{locale}`")))?;
        Ok(interpolate(template, vars))
    }

    fn format_date_only(&self, locale: &str, at: DateTime<Utc>) -> Result<String, ServiceError> {
        let pattern = self.lookup(locale, DATE_ONLY_KEY).unwrap_or("%Y-%m-%d");
        let mut out = String::new();
        write!(out, "{}", at.format(pattern))
            .map_err(|_| ServiceError::Localization(format!("bad date format `{pattern}`")))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builtin_catalog_renders_templates() {
        let c = Catalog::builtin().unwrap();
        let text = c
            .translate("en", "user_notes.user_suspended", &[("username", "alice"), ("suspended_till", "May 1, 2026"), ("reason", "spam")])
            .unwrap();
        assert_eq!(text, "@alice suspended this account till May 1, 2026. Reason: spam");
        assert!(c.has_locale("de"));
    }

    #[test]
    fn regional_and_missing_locales_fall_back() {
        let c = Catalog::builtin().unwrap();
        let de = c.translate("de_AT", "reports.user_notes.labels.user", &[]).unwrap();
        assert_eq!(de, "Benutzer");
        let title = c.translate("de", "reports.user_notes.title", &[]).unwrap();
        assert_eq!(title, "User Notes");
        assert!(c.translate("en", "user_notes.nope", &[]).is_err());
    }

    #[test]
    fn dates_follow_locale_pattern() {
        let c = Catalog::builtin().unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 10, 0, 0).unwrap();
        assert_eq!(c.format_date_only("en", at).unwrap(), "March 7, 2026");
        assert_eq!(c.format_date_only("de", at).unwrap(), "07.03.2026");
    }

    #[test]
    fn interpolation_is_single_pass() {
        assert_eq!(interpolate("%{a} and %{b}", &[("a", "%{b}"), ("b", "x")]), "%{b} and x");
        assert_eq!(interpolate("keep %{unknown} %{", &[]), "keep %{unknown} %{");
    }

    #[test]
    fn overrides_merge_over_builtin() {
        let mut c = Catalog::builtin().unwrap();
        c.merge(Catalog::from_toml_str("[en.user_notes]\nofficial_warning = \"Warned by %{username}\"").unwrap());
        let text = c.translate("en", "user_notes.official_warning", &[("username", "bo")]).unwrap();
        assert_eq!(text, "Warned by bo");
        assert!(c.translate("en", "user_notes.user_silenced", &[]).is_ok());
        assert!(Catalog::from_toml_str("[en]\nnum = 3").is_err());
    }
}
