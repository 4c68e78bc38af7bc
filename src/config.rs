// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Settings taken from the process environment.
//!
//! The environment is read once at startup; everything downstream receives
//! these values explicitly.

/// Variable holding an `owner/name` repository override.
pub const REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";

/// Variable holding a GitHub API token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Values read from environment variables.
///
/// Empty variables are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Repository override from `GITHUB_REPOSITORY`.
    pub repository: Option<String>,

    /// Bearer token from `GITHUB_TOKEN`.
    pub token: Option<String>,
}

impl Environment {
    /// Reads the settings from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    /// Builds the settings from `(name, value)` pairs.
    #[must_use]
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut env = Self::default();
        for (key, value) in vars {
            let slot = match key.as_ref() {
                REPOSITORY_VAR => &mut env.repository,
                TOKEN_VAR => &mut env.token,
                _ => continue,
            };
            let value: String = value.into();
            *slot = (!value.is_empty()).then_some(value);
        }
        env
    }
}
