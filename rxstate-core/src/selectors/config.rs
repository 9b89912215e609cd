//! Loose memoizer configuration.
//!
//! [`MemoizeConfig`] mirrors the plain options object an application keeps in
//! its settings: `{ "equality": { "size": 10 } }` or `{ "hash": true }`.
//! Unlike [`MemoizeOptions`] it can name several strategies at once, so it is
//! validated when converted.

use serde::{Deserialize, Serialize};

use super::memoize::MemoizeOptions;
use super::types::strict_equality;
use crate::error::ConfigError;

/// Equality strategy settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EqualityConfig {
    /// LRU capacity. Absent or zero keeps a single value.
    pub size: Option<usize>,
}

/// Memoizer settings as read from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoizeConfig {
    pub equality: Option<EqualityConfig>,
    pub hash: bool,
}

impl MemoizeConfig {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Configure the equality strategy.
    pub fn with_equality(mut self, size: Option<usize>) -> Self {
        self.equality = Some(EqualityConfig { size });
        self
    }

    /// Configure the hash strategy.
    pub fn with_hash(mut self) -> Self {
        self.hash = true;
        self
    }

    /// Check that at most one strategy is selected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let selected: Vec<&str> = [
            self.equality.is_some().then_some("equality"),
            self.hash.then_some("hash"),
        ]
        .into_iter()
        .flatten()
        .collect();

        if selected.len() > 1 {
            return Err(ConfigError::ConflictingCacheOptions {
                selected: selected.join(", "),
            });
        }
        Ok(())
    }

    /// Build typed options.
    ///
    /// The equality strategy compares arguments with `PartialEq`. With no
    /// strategy selected the hash strategy is used.
    pub fn into_options<E, V>(self) -> Result<MemoizeOptions<E, V>, ConfigError>
    where
        E: PartialEq + Serialize + 'static,
        V: 'static,
    {
        self.validate()?;
        Ok(match self.equality {
            Some(EqualityConfig { size: Some(size) }) if size > 0 => {
                MemoizeOptions::lru(size, strict_equality::<E>)
            }
            Some(_) => MemoizeOptions::equality(strict_equality::<E>),
            None => MemoizeOptions::hash(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_defaults_to_hash() {
        let options = MemoizeConfig::default().into_options::<i32, i32>().unwrap();
        assert_eq!(options.strategy(), "hash");
    }

    #[test]
    fn equality_and_hash_conflict() {
        let config = MemoizeConfig::default().with_equality(Some(2)).with_hash();

        let err = config.into_options::<i32, i32>().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConflictingCacheOptions { ref selected } if selected == "equality, hash"
        ));
    }

    #[test]
    fn hash_false_does_not_conflict() {
        let config = MemoizeConfig::from_json(r#"{"equality": {"size": 3}, "hash": false}"#).unwrap();
        assert_eq!(config.equality, Some(EqualityConfig { size: Some(3) }));
        assert_eq!(config.into_options::<i32, i32>().unwrap().strategy(), "equality");
    }

    #[test]
    fn from_json_rejects_conflicts() {
        let err = MemoizeConfig::from_json(r#"{"equality": {}, "hash": true}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingCacheOptions { .. }));
    }

    #[test]
    fn from_json_rejects_unknown_fields() {
        let err = MemoizeConfig::from_json(r#"{"strategy": "lru"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_size_keeps_single_value() {
        let options = MemoizeConfig::default()
            .with_equality(Some(0))
            .into_options::<i32, i32>()
            .unwrap();

        match options {
            MemoizeOptions::Equality(factory) => assert_eq!(factory.size(), None),
            other => panic!("unexpected strategy {other:?}"),
        }
    }
}
