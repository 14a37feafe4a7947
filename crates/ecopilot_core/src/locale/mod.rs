//! Bilingual (fr/en) message catalog.
//!
//! # Responsibility
//! - Own the Fluent bundles for every user-facing string in core.
//! - Negotiate a supported language from UI-provided language tags.
//!
//! # Invariants
//! - French is the fallback language, matching the companion's defaults.
//! - A missing key never panics; it renders as `[key]` for diagnosis.
//!
//! # See also
//! - docs/architecture/localization.md

use fluent::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use fluent_langneg::{negotiate_languages, NegotiationStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use unic_langid::LanguageIdentifier;

const FR_FTL: &str = include_str!("fr.ftl");
const EN_FTL: &str = include_str!("en.ftl");

/// Languages the companion ships resources for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Fr,
    En,
}

impl Language {
    /// BCP 47 primary tag for this language.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::En => "en",
        }
    }

    /// Exact-tag parse; use [`negotiate_language`] for regional tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "fr" => Some(Self::Fr),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::Fr
    }
}

/// Picks the best supported language for a UI-provided tag.
///
/// Handles regional variants (`fr-CA`, `en-US`) and falls back to French
/// when nothing matches.
pub fn negotiate_language(requested: &str) -> Language {
    let requested: Vec<LanguageIdentifier> = requested
        .split(',')
        .filter_map(|tag| tag.trim().parse().ok())
        .collect();
    let available: Vec<LanguageIdentifier> = ["fr", "en"]
        .iter()
        .filter_map(|tag| tag.parse().ok())
        .collect();
    let default: LanguageIdentifier = match "fr".parse() {
        Ok(id) => id,
        Err(_) => return Language::Fr,
    };

    let negotiated = negotiate_languages(
        &requested,
        &available,
        Some(&default),
        NegotiationStrategy::Filtering,
    );

    match negotiated.first() {
        Some(id) if id.language.as_str() == "en" => Language::En,
        _ => Language::Fr,
    }
}

/// Errors while building the embedded message bundles.
#[derive(Debug)]
pub enum LocaleError {
    /// Embedded FTL resource failed to parse.
    ParseResource(&'static str),
    /// Resource could not be added to its bundle.
    AddResource(&'static str),
}

impl Display for LocaleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseResource(tag) => write!(f, "failed to parse FTL resource `{tag}`"),
            Self::AddResource(tag) => write!(f, "failed to register FTL resource `{tag}`"),
        }
    }
}

impl Error for LocaleError {}

/// Message formatter over the embedded fr/en Fluent bundles.
pub struct Localizer {
    bundles: HashMap<Language, FluentBundle<FluentResource>>,
}

impl Localizer {
    /// Builds both bundles from the embedded resources.
    pub fn new() -> Result<Self, LocaleError> {
        let mut bundles = HashMap::new();
        bundles.insert(Language::Fr, build_bundle("fr", FR_FTL)?);
        bundles.insert(Language::En, build_bundle("en", EN_FTL)?);
        Ok(Self { bundles })
    }

    /// Formats a message without arguments.
    pub fn text(&self, language: Language, key: &str) -> String {
        self.format(language, key, &[])
    }

    /// Formats a message with named arguments.
    ///
    /// Falls back to French when the key is missing in the requested
    /// language, then to `[key]` when it is missing everywhere.
    pub fn format(
        &self,
        language: Language,
        key: &str,
        args: &[(&str, FluentValue<'_>)],
    ) -> String {
        if let Some(text) = self.try_format(language, key, args) {
            return text;
        }
        if language != Language::Fr {
            if let Some(text) = self.try_format(Language::Fr, key, args) {
                return text;
            }
        }
        format!("[{key}]")
    }

    fn try_format(
        &self,
        language: Language,
        key: &str,
        args: &[(&str, FluentValue<'_>)],
    ) -> Option<String> {
        let bundle = self.bundles.get(&language)?;
        let message = bundle.get_message(key)?;
        let pattern = message.value()?;

        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, value.clone());
        }

        let mut errors = Vec::new();
        let formatted = bundle.format_pattern(pattern, Some(&fluent_args), &mut errors);
        Some(formatted.to_string())
    }
}

fn build_bundle(
    tag: &'static str,
    ftl: &'static str,
) -> Result<FluentBundle<FluentResource>, LocaleError> {
    let resource =
        FluentResource::try_new(ftl.to_string()).map_err(|_| LocaleError::ParseResource(tag))?;
    let lang_id: LanguageIdentifier = tag
        .parse()
        .map_err(|_| LocaleError::ParseResource(tag))?;

    let mut bundle = FluentBundle::new(vec![lang_id]);
    // Isolation marks garble plain-text notification bodies.
    bundle.set_use_isolating(false);
    bundle
        .add_resource(resource)
        .map_err(|_| LocaleError::AddResource(tag))?;
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::{negotiate_language, Language, Localizer};
    use fluent::FluentValue;

    #[test]
    fn both_languages_format_plain_messages() {
        let localizer = Localizer::new().unwrap();
        assert_eq!(
            localizer.text(Language::Fr, "plant-not-found"),
            "Plante non trouvée"
        );
        assert_eq!(
            localizer.text(Language::En, "plant-not-found"),
            "Plant not found"
        );
    }

    #[test]
    fn arguments_are_interpolated_without_isolation_marks() {
        let localizer = Localizer::new().unwrap();
        let body = localizer.format(
            Language::En,
            "home-departure-body",
            &[("distance", FluentValue::from("150m"))],
        );
        assert_eq!(body, "150m from home. Don't forget your plants!");
    }

    #[test]
    fn water_reminder_carries_name_and_days() {
        let localizer = Localizer::new().unwrap();
        let body = localizer.format(
            Language::Fr,
            "water-reminder-body",
            &[
                ("name", FluentValue::from("Monstera")),
                ("days", FluentValue::from(5)),
            ],
        );
        assert!(body.contains("Monstera"));
        assert!(body.contains('5'));
    }

    #[test]
    fn missing_key_renders_as_bracketed_key() {
        let localizer = Localizer::new().unwrap();
        assert_eq!(localizer.text(Language::En, "no-such-key"), "[no-such-key]");
    }

    #[test]
    fn negotiation_handles_regional_tags_and_defaults_to_french() {
        assert_eq!(negotiate_language("en-US"), Language::En);
        assert_eq!(negotiate_language("fr-CA"), Language::Fr);
        assert_eq!(negotiate_language("de"), Language::Fr);
        assert_eq!(negotiate_language(""), Language::Fr);
    }

    #[test]
    fn exact_tag_parse_is_strict() {
        assert_eq!(Language::from_tag(" EN "), Some(Language::En));
        assert_eq!(Language::from_tag("en-US"), None);
    }
}
