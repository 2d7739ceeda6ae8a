use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub clone_url: String,
    #[serde(default)]
    pub private: bool,
    /// Older hook senders put the pre-rename name here.
    #[serde(default)]
    pub previous_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct RepositoryEvent {
    pub action: String,
    pub repository: Repository,
    #[serde(default)]
    pub changes: Option<RepositoryChanges>,
}

impl RepositoryEvent {
    /// Name the repository had before a `renamed` action.
    pub fn previous_name(&self) -> Option<&str> {
        self.repository
            .previous_name
            .as_deref()
            .or_else(|| {
                self.changes
                    .as_ref()
                    .and_then(|c| c.repository.as_ref())
                    .and_then(|r| r.name.as_ref())
                    .map(|n| n.from.as_str())
            })
            .filter(|name| !name.is_empty())
    }
}

#[derive(Deserialize, Debug)]
pub struct RepositoryChanges {
    pub repository: Option<RepositoryNameChange>,
}

#[derive(Deserialize, Debug)]
pub struct RepositoryNameChange {
    pub name: Option<ChangedValue>,
}

#[derive(Deserialize, Debug)]
pub struct ChangedValue {
    pub from: String,
}

#[derive(Deserialize, Debug)]
pub struct InstallationRepositoriesEvent {
    pub action: String,
    #[serde(default)]
    pub repositories_added: Vec<Repository>,
    #[serde(default)]
    pub repositories_removed: Vec<Repository>,
}
