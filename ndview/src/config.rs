/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Process-wide settings, loaded once from the environment.
//!
//! | Variable               | Values                    | Default |
//! |------------------------|---------------------------|---------|
//! | `NDVIEW_META_ENCODING` | `wide`, `split`, `auto`   | `auto`  |

use std::env;
use std::sync::LazyLock;

use crate::meta::MetaEncoding;

/// Environment variable that selects the metadata word writer.
pub const META_ENCODING_ENV: &str = "NDVIEW_META_ENCODING";

const AUTO: &str = "auto";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Word writer for binary metadata. `None` selects by host
    /// capability.
    pub meta_encoding: Option<MetaEncoding>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name
    /// to its value. Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(value) = lookup(META_ENCODING_ENV) {
            let value = value.trim();
            if value.eq_ignore_ascii_case(AUTO) {
                config.meta_encoding = None;
            } else {
                match MetaEncoding::parse(&value.to_ascii_lowercase()) {
                    Ok(encoding) => config.meta_encoding = Some(encoding),
                    Err(e) => {
                        tracing::error!(
                            "failed to override config key meta_encoding from value \"{}\" in ${}: {}",
                            value,
                            META_ENCODING_ENV,
                            e
                        );
                    }
                }
            }
        }
        config
    }
}

static GLOBAL: LazyLock<Config> = LazyLock::new(Config::from_env);

/// The process-wide configuration, read from the environment on first
/// use.
pub fn global() -> &'static Config {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tracing_test::traced_test;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
        assert_eq!(Config::default().meta_encoding, None);
    }

    #[test]
    fn test_meta_encoding() {
        let config = Config::from_lookup(lookup(&[(META_ENCODING_ENV, "split")]));
        assert_eq!(config.meta_encoding, Some(MetaEncoding::Split));

        let config = Config::from_lookup(lookup(&[(META_ENCODING_ENV, " Wide ")]));
        assert_eq!(config.meta_encoding, Some(MetaEncoding::Wide));

        let config = Config::from_lookup(lookup(&[(META_ENCODING_ENV, "AUTO")]));
        assert_eq!(config.meta_encoding, None);
    }

    #[traced_test]
    #[test]
    fn test_invalid_value_is_logged() {
        let config = Config::from_lookup(lookup(&[(META_ENCODING_ENV, "double")]));
        assert_eq!(config.meta_encoding, None);
        assert!(logs_contain("failed to override config key meta_encoding"));
        assert!(logs_contain("double"));
    }
}
