//! CLI configuration: thin wrapper around `hassdeck_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --token, --prefs-url, --insecure, --timeout).

use std::path::PathBuf;

use secrecy::SecretString;

use hassdeck_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use hassdeck_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config, store_token,
};

/// Everything a hub-facing command needs to start.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub controller: ControllerConfig,
    /// Directory holding this profile's local preferences.
    pub data_dir: PathBuf,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Comma-separated profile names for diagnostics.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build the controller configuration from the config file, profile, and CLI overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // No profile: flags and env vars alone must carry the hub URL.
        None if global.url.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    resolve_profile(&profile, &profile_name, &cfg.defaults, global)
}

/// Translate a `Profile` + global flags into a [`Resolved`] configuration.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<Resolved, CliError> {
    let mut profile = profile.clone();
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if let Some(ref prefs_url) = global.prefs_url {
        profile.prefs_url = Some(prefs_url.clone());
    }
    if global.local_only {
        profile.prefs_url = None;
    }

    let token = match global.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => hassdeck_config::resolve_token(&profile, profile_name)?,
    };

    let controller = hassdeck_config::profile_to_controller_config(&profile, defaults, token)?;

    Ok(Resolved {
        profile_name: profile_name.to_owned(),
        controller,
        data_dir: hassdeck_config::data_dir(profile_name),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use secrecy::ExposeSecret;

    use hassdeck_core::TlsVerification;

    use super::*;
    use crate::cli::Cli;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hassdeck").chain(args.iter().copied())).unwrap()
    }

    fn home_profile() -> Profile {
        Profile {
            url: "http://ha.local:8123".into(),
            token: Some("from-profile".into()),
            prefs_url: Some("http://nas.local:9000".into()),
            timeout: Some(4),
            ..Profile::default()
        }
    }

    #[test]
    fn flags_override_profile_values() {
        let cli = parse(&[
            "--url",
            "https://other.local:8123",
            "--token",
            "from-flag",
            "--timeout",
            "20",
            "-k",
            "status",
        ]);
        let resolved =
            resolve_profile(&home_profile(), "home", &Defaults::default(), &cli.global).unwrap();

        let config = resolved.controller;
        assert_eq!(config.url.as_str(), "https://other.local:8123/");
        assert_eq!(config.token.expose_secret(), "from-flag");
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(resolved.profile_name, "home");
        assert!(resolved.data_dir.ends_with("home"));
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let cli = parse(&["status"]);
        let resolved =
            resolve_profile(&home_profile(), "home", &Defaults::default(), &cli.global).unwrap();

        let config = resolved.controller;
        assert_eq!(config.token.expose_secret(), "from-profile");
        assert_eq!(config.timeout, Duration::from_secs(4));
        assert!(config.preferences.is_some());
    }

    #[test]
    fn local_only_drops_the_preference_store() {
        let cli = parse(&["--local-only", "status"]);
        let resolved =
            resolve_profile(&home_profile(), "home", &Defaults::default(), &cli.global).unwrap();
        assert!(resolved.controller.preferences.is_none());
    }

    #[test]
    fn available_profiles_are_sorted() {
        let mut config = Config::default();
        assert_eq!(available_profiles(&config), "(none)");

        config.profiles.insert("work".into(), Profile::default());
        config.profiles.insert("home".into(), Profile::default());
        assert_eq!(available_profiles(&config), "home, work");
    }
}
