//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod areas;
pub mod config_cmd;
pub mod control;
pub mod entities;
pub mod prefs;
pub mod status;
pub mod util;
pub mod watch;

use std::sync::Arc;

use tracing::debug;

use hassdeck_core::{
    Controller, JsonFileStore, LocalStore, PreferenceBackend, PreferenceSync, RemotePrefs,
};

use crate::cli::{Command, GlobalOpts, WatchArgs};
use crate::config::Resolved;
use crate::error::CliError;

// ── Session ─────────────────────────────────────────────────────────

/// A connected controller plus the profile's preference sync.
pub struct Session {
    pub controller: Controller,
    pub prefs: PreferenceSync,
    pub profile_name: String,
}

impl Session {
    /// Load preferences, then connect.
    ///
    /// Preferences come first so the polling interval and hidden sets
    /// are in place before the first snapshot is published.
    pub async fn open(resolved: Resolved, polling: bool) -> Result<Self, CliError> {
        let Resolved {
            profile_name,
            mut controller,
            data_dir,
        } = resolved;
        if !polling {
            controller.refresh_interval_secs = 0;
        }

        let controller = Controller::from_config(controller)?;

        let remote = match controller.config().preferences {
            Some(ref store) => {
                let remote = RemotePrefs::from_config(store, &controller.config().transport())?;
                Some(Arc::new(remote) as Arc<dyn PreferenceBackend>)
            }
            None => None,
        };
        let local: Arc<dyn LocalStore> = Arc::new(JsonFileStore::new(data_dir));
        let prefs = PreferenceSync::new(Arc::clone(controller.store()), local, remote);

        prefs.load().await;
        debug!(
            profile = %profile_name,
            remote = prefs.remote_available(),
            "preferences loaded"
        );

        controller.connect().await?;
        Ok(Self {
            controller,
            prefs,
            profile_name,
        })
    }

    /// Wait for preference pushes, then stop background work.
    pub async fn close(self) {
        self.prefs.flush().await;
        self.controller.shutdown().await;
    }
}

/// Dispatch a hub-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, resolved: Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let polling = matches!(cmd, Command::Watch(WatchArgs { interval: None, .. }));
    let session = Session::open(resolved, polling).await?;

    let result = match cmd {
        Command::Status => status::handle(&session, global),
        Command::Entities(args) => entities::handle(&session, &args, global),
        Command::Areas(args) => areas::handle(&session, &args, global),
        Command::Related { entity_id } => areas::related(&session, &entity_id, global),
        Command::Call(args) => control::call(&session, &args, global).await,
        Command::Service(args) => control::service(&session, args, global).await,
        Command::Set(args) => control::set(&session, &args, global).await,
        Command::Hide(args) => prefs::hide(&session, &args, global),
        Command::Show(args) => prefs::show(&session, &args, global),
        Command::Rename(args) => prefs::rename(&session, args, global),
        Command::Settings(args) => prefs::settings(&session, args, global),
        Command::Watch(args) => watch::handle(&session, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    };

    session.close().await;
    result
}
