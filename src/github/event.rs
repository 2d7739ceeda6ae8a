//! Classification of GitHub deliveries into the mirror actions they trigger.
//!
//! The `X-GitHub-Event` header picks an [`EventKind`]; for `repository`
//! events the payload `action` picks a [`RepositoryAction`]. [`plan`] turns
//! the pair into a [`Plan`] without touching the filesystem or spawning
//! anything, so the dispatch table can be checked in isolation.

use std::fmt;

use tracing::{info, warn};

use crate::error::DispatchError;
use crate::github::models::{InstallationRepositoriesEvent, RepositoryEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Push,
    Create,
    Delete,
    Release,
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::Push => "push",
            SyncTrigger::Create => "create",
            SyncTrigger::Delete => "delete",
            SyncTrigger::Release => "release",
        }
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Repository,
    InstallationRepositories,
    Sync(SyncTrigger),
    Unrecognized(String),
}

impl EventKind {
    pub fn from_header(name: &str) -> Self {
        match name {
            "repository" => EventKind::Repository,
            "installation_repositories" => EventKind::InstallationRepositories,
            "push" => EventKind::Sync(SyncTrigger::Push),
            "create" => EventKind::Sync(SyncTrigger::Create),
            "delete" => EventKind::Sync(SyncTrigger::Delete),
            "release" => EventKind::Sync(SyncTrigger::Release),
            other => EventKind::Unrecognized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryAction {
    Created,
    Publicized,
    Deleted,
    Privatized,
    Renamed,
    Other(String),
}

impl RepositoryAction {
    pub fn parse(action: &str) -> Self {
        match action {
            "created" => RepositoryAction::Created,
            "publicized" => RepositoryAction::Publicized,
            "deleted" => RepositoryAction::Deleted,
            "privatized" => RepositoryAction::Privatized,
            "renamed" => RepositoryAction::Renamed,
            other => RepositoryAction::Other(other.to_string()),
        }
    }
}

/// A side effect on the local mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorAction {
    /// Run mirror-create with the clone url.
    Mirror { clone_url: String },
    /// Delete `root/name` recursively.
    Remove { name: String },
    /// Move `root/from` to `root/to`.
    Rename { from: String, to: String },
    /// Run mirror-sync with no arguments.
    Sync { trigger: SyncTrigger },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    RepositoryAction(String),
    Installation {
        action: String,
        added: usize,
        removed: usize,
    },
    UnrecognizedEvent(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Act(MirrorAction),
    Ignore(IgnoreReason),
}

pub fn plan(kind: &EventKind, body: &[u8]) -> Result<Plan, DispatchError> {
    match kind {
        EventKind::Repository => plan_repository(body),
        EventKind::InstallationRepositories => {
            let event: InstallationRepositoriesEvent = serde_json::from_slice(body)?;
            let added = event.repositories_added.len();
            let removed = event.repositories_removed.len();
            info!(
                action = %event.action,
                added,
                removed,
                "installation_repositories ignored"
            );
            Ok(Plan::Ignore(IgnoreReason::Installation {
                action: event.action,
                added,
                removed,
            }))
        }
        EventKind::Sync(trigger) => {
            info!(event = %trigger, "triggering mirror-sync");
            Ok(Plan::Act(MirrorAction::Sync { trigger: *trigger }))
        }
        EventKind::Unrecognized(name) => {
            info!(event = %name, "Ignoring event");
            Ok(Plan::Ignore(IgnoreReason::UnrecognizedEvent(name.clone())))
        }
    }
}

fn plan_repository(body: &[u8]) -> Result<Plan, DispatchError> {
    let event: RepositoryEvent = serde_json::from_slice(body)?;
    let repo = &event.repository;

    info!(
        action = %event.action,
        repo = %repo.name,
        full_name = %repo.full_name,
        private = repo.private,
        "repository event"
    );

    let action = match RepositoryAction::parse(&event.action) {
        RepositoryAction::Created | RepositoryAction::Publicized => {
            if repo.clone_url.is_empty() {
                return Err(DispatchError::MissingField("repository.clone_url"));
            }
            if repo.clone_url.starts_with('-') {
                return Err(DispatchError::UnsafeCloneUrl(repo.clone_url.clone()));
            }
            MirrorAction::Mirror {
                clone_url: repo.clone_url.clone(),
            }
        }
        RepositoryAction::Deleted | RepositoryAction::Privatized => MirrorAction::Remove {
            name: checked_name(&repo.name)?,
        },
        RepositoryAction::Renamed => {
            let from = event
                .previous_name()
                .ok_or(DispatchError::MissingField("repository.previous_name"))?;
            MirrorAction::Rename {
                from: checked_name(from)?,
                to: checked_name(&repo.name)?,
            }
        }
        RepositoryAction::Other(other) => {
            return Ok(Plan::Ignore(IgnoreReason::RepositoryAction(other)));
        }
    };

    Ok(Plan::Act(action))
}

/// Repository names become a single path component under the mirror root.
/// Anything that could step outside it is refused.
fn checked_name(name: &str) -> Result<String, DispatchError> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if unsafe_name {
        warn!(repo = %name, "repository name is not a plain directory name");
        return Err(DispatchError::UnsafeRepositoryName(name.to_string()));
    }
    Ok(name.to_string())
}
