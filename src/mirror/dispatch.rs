use tracing::info;

use crate::app_state::AppConfig;
use crate::error::DispatchError;
use crate::github::event::{plan, EventKind, IgnoreReason, MirrorAction, Plan};
use crate::mirror::command::run_command;
use crate::mirror::local::{remove_mirror, rename_mirror};
use crate::utils::verify_signature;

/// What a verified delivery ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Executed(MirrorAction),
    Ignored(IgnoreReason),
}

/// Headers of a delivery that drive dispatch.
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    pub signature: Option<&'a str>,
    pub event: Option<&'a str>,
}

/// Verifies, classifies and carries out one webhook delivery.
pub async fn handle_delivery(
    config: &AppConfig,
    delivery: Delivery<'_>,
    body: &[u8],
) -> Result<Outcome, DispatchError> {
    let signature = delivery.signature.unwrap_or_default();
    if !verify_signature(signature, body, &config.webhook_secret) {
        return Err(DispatchError::InvalidSignature);
    }

    let event = delivery.event.unwrap_or_default();
    info!(event, "Received event");

    match plan(&EventKind::from_header(event), body)? {
        Plan::Act(action) => {
            execute(config, &action).await?;
            Ok(Outcome::Executed(action))
        }
        Plan::Ignore(reason) => Ok(Outcome::Ignored(reason)),
    }
}

pub async fn execute(config: &AppConfig, action: &MirrorAction) -> Result<(), DispatchError> {
    match action {
        MirrorAction::Mirror { clone_url } => {
            run_command(&config.mirror_bin, &[clone_url.as_str()], config.command_timeout).await?
        }
        MirrorAction::Remove { name } => remove_mirror(&config.repo_root, name).await?,
        MirrorAction::Rename { from, to } => rename_mirror(&config.repo_root, from, to).await?,
        MirrorAction::Sync { .. } => {
            run_command(&config.mirror_sync_bin, &[], config.command_timeout).await?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;
    use crate::github::event::SyncTrigger;
    use crate::test_support::{recorded_args, recording_script};
    use crate::utils::sign;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    const SECRET: &str = "test-secret";

    fn config(root: &Path, mirror_bin: &str, mirror_sync_bin: &str) -> AppConfig {
        AppConfig {
            webhook_secret: SECRET.to_string(),
            mirror_bin: mirror_bin.to_string(),
            mirror_sync_bin: mirror_sync_bin.to_string(),
            repo_root: root.to_path_buf(),
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            command_timeout: None,
        }
    }

    fn signature_for(body: &[u8]) -> String {
        format!("sha256={}", sign(body, SECRET).unwrap())
    }

    async fn deliver(
        config: &AppConfig,
        event: &str,
        body: &[u8],
    ) -> Result<Outcome, DispatchError> {
        let signature = signature_for(body);
        let delivery = Delivery {
            signature: Some(&signature),
            event: Some(event),
        };
        handle_delivery(config, delivery, body).await
    }

    #[tokio::test]
    async fn bad_signature_touches_nothing() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("r")).unwrap();
        // Anything that runs would fail loudly.
        let config = config(root.path(), "false", "false");
        let body = json!({ "action": "deleted", "repository": { "name": "r" } }).to_string();

        for signature in [None, Some("sha256=00"), Some("garbage")] {
            let delivery = Delivery {
                signature,
                event: Some("repository"),
            };
            let err = handle_delivery(&config, delivery, body.as_bytes())
                .await
                .unwrap_err();
            assert!(matches!(err, DispatchError::InvalidSignature));
        }

        let wrong_key = format!("sha256={}", sign(body.as_bytes(), "other").unwrap());
        let delivery = Delivery {
            signature: Some(&wrong_key),
            event: Some("push"),
        };
        let err = handle_delivery(&config, delivery, body.as_bytes())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidSignature));

        assert!(root.path().join("r").is_dir());
    }

    #[tokio::test]
    async fn created_runs_mirror_with_clone_url() {
        let root = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let (mirror, record) = recording_script(bin.path(), "mirror", "");
        let config = config(root.path(), mirror.to_str().unwrap(), "false");
        let body = json!({
            "action": "created",
            "repository": {
                "name": "r",
                "full_name": "org/r",
                "clone_url": "https://example.com/r.git",
                "private": false
            }
        })
        .to_string();

        let outcome = deliver(&config, "repository", body.as_bytes())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Executed(MirrorAction::Mirror {
                clone_url: "https://example.com/r.git".into()
            })
        );
        assert_eq!(
            recorded_args(&record),
            Some(vec!["https://example.com/r.git".to_string()])
        );
    }

    #[tokio::test]
    async fn deleted_removes_local_mirror() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("r/refs")).unwrap();
        std::fs::create_dir(root.path().join("keep")).unwrap();
        let config = config(root.path(), "false", "false");
        let body = json!({ "action": "privatized", "repository": { "name": "r" } }).to_string();

        let outcome = deliver(&config, "repository", body.as_bytes())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Executed(MirrorAction::Remove { name: "r".into() })
        );
        assert!(!root.path().join("r").exists());
        assert!(root.path().join("keep").is_dir());
    }

    #[tokio::test]
    async fn renamed_moves_local_mirror() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("old")).unwrap();
        let config = config(root.path(), "false", "false");
        let body = json!({
            "action": "renamed",
            "repository": { "name": "new", "previous_name": "old" }
        })
        .to_string();

        deliver(&config, "repository", body.as_bytes())
            .await
            .unwrap();

        assert!(!root.path().join("old").exists());
        assert!(root.path().join("new").is_dir());
    }

    #[tokio::test]
    async fn push_runs_mirror_sync_without_arguments() {
        let root = TempDir::new().unwrap();
        let bin = TempDir::new().unwrap();
        let (mirror, mirror_record) = recording_script(bin.path(), "mirror", "");
        let (sync, sync_record) = recording_script(bin.path(), "mirror-sync", "");
        let config = config(
            root.path(),
            mirror.to_str().unwrap(),
            sync.to_str().unwrap(),
        );
        let body = br#"{"ref":"refs/heads/main","repository":{"clone_url":"https://example.com/r.git"}}"#;

        let outcome = deliver(&config, "push", body).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Executed(MirrorAction::Sync {
                trigger: SyncTrigger::Push
            })
        );
        assert_eq!(recorded_args(&sync_record), Some(vec![]));
        assert_eq!(recorded_args(&mirror_record), None);
    }

    #[tokio::test]
    async fn failing_mirror_sync_is_reported() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), "true", "false");

        let err = deliver(&config, "release", b"{}").await.unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Command(CommandError::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn installation_repositories_runs_nothing() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), "false", "false");
        let body = json!({
            "action": "added",
            "repositories_added": [{ "name": "a" }, { "name": "b" }, { "name": "c" }],
            "repositories_removed": [{ "name": "d" }]
        })
        .to_string();

        let outcome = deliver(&config, "installation_repositories", body.as_bytes())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Ignored(IgnoreReason::Installation {
                action: "added".into(),
                added: 3,
                removed: 1
            })
        );
    }

    #[tokio::test]
    async fn ping_is_ignored() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), "false", "false");

        let outcome = deliver(&config, "ping", br#"{"zen":"Keep it logically awesome."}"#)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Ignored(IgnoreReason::UnrecognizedEvent("ping".into()))
        );
    }

    #[tokio::test]
    async fn malformed_repository_payload_runs_nothing() {
        let root = TempDir::new().unwrap();
        let config = config(root.path(), "false", "false");

        let err = deliver(&config, "repository", b"not json").await.unwrap_err();

        assert!(matches!(err, DispatchError::InvalidPayload(_)));
    }
}
