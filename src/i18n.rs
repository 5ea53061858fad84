use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Zh,
    Ja,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Zh, Locale::Ja];
    pub const DEFAULT: Locale = Locale::En;

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
            Locale::Ja => "ja",
        }
    }

    /// Label shown in the language switcher, always in its own language.
    pub fn native_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Zh => "简体中文",
            Locale::Ja => "日本語",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    /// Picks the first supported language from an `Accept-Language` header,
    /// honoring only list order (q-values are not ranked).
    pub fn from_accept_language(header: &str) -> Option<Self> {
        header
            .split(',')
            .filter_map(|part| part.split(';').next())
            .map(|tag| tag.trim().to_ascii_lowercase())
            .find_map(|tag| {
                let primary = tag.split('-').next().unwrap_or(&tag).to_string();
                Self::from_code(&primary)
            })
    }

    /// `/download` -> `/zh/download`.
    pub fn localized_path(self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("/{}/", self.code())
        } else {
            format!("/{}/{}", self.code(), path)
        }
    }
}

/// Rewrites the locale segment of a site path. Paths without a locale get one
/// prepended; anything that is not a same-site absolute path goes to the
/// locale's download page.
pub fn switch_language_path(path: &str, locale: Locale) -> String {
    if !path.starts_with('/') || path.starts_with("//") {
        return locale.localized_path("/download");
    }

    let mut parts: Vec<&str> = path.split('/').collect();
    match parts.get(1) {
        Some(segment) if Locale::from_code(segment).is_some() => {
            parts[1] = locale.code();
            parts.join("/")
        }
        _ => locale.localized_path(path),
    }
}

/// Flat dotted-key view over one locale's nested JSON catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    pub fn from_json(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source).context("Failed to parse catalog")?;
        let mut entries = HashMap::new();
        flatten("", &value, &mut entries);
        Ok(Self { entries })
    }

    /// Missing keys render as the key itself.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{}.{}", prefix, k)
                };
                flatten(&key, v, out);
            }
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Null => {}
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

#[derive(Debug, Clone)]
pub struct Translations {
    en: Catalog,
    zh: Catalog,
    ja: Catalog,
}

impl Translations {
    pub fn load() -> Result<Self> {
        Ok(Self {
            en: Catalog::from_json(include_str!("../locales/en.json"))
                .context("Invalid catalog for locale en")?,
            zh: Catalog::from_json(include_str!("../locales/zh.json"))
                .context("Invalid catalog for locale zh")?,
            ja: Catalog::from_json(include_str!("../locales/ja.json"))
                .context("Invalid catalog for locale ja")?,
        })
    }

    pub fn catalog(&self, locale: Locale) -> &Catalog {
        match locale {
            Locale::En => &self.en,
            Locale::Zh => &self.zh,
            Locale::Ja => &self.ja,
        }
    }
}
