use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use leethub::contract::{MockRemoteRepo, MockStore, RepoFile, RepoInfo};
use leethub::error::{RepoError, SyncError};
use leethub::link::{
    create_repository_and_link, link_repository, record_authentication, sync_remote_stats,
    unlink_repository, REPO_DESCRIPTION,
};

type WriteLog = Arc<Mutex<Vec<(String, Value)>>>;

/// Record every `set` and `remove` so the tests can assert on the final
/// storage writes. Removals log a null value.
fn log_writes(store: &mut MockStore) -> WriteLog {
    let log: WriteLog = Arc::new(Mutex::new(Vec::new()));
    let set_log = Arc::clone(&log);
    store.expect_set().returning(move |key, value| {
        set_log.lock().expect("lock").push((key.to_owned(), value));
        Ok(())
    });
    let remove_log = Arc::clone(&log);
    store.expect_remove().returning(move |key| {
        remove_log
            .lock()
            .expect("lock")
            .push((key.to_owned(), Value::Null));
        Ok(())
    });
    log
}

fn written(log: &WriteLog, key: &str) -> Option<Value> {
    log.lock()
        .expect("lock")
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

fn store_with_token() -> MockStore {
    let mut store = MockStore::new();
    store.expect_get().returning(|key| {
        Ok(match key {
            "leethub_token" => Some(json!("token-123")),
            "mode_type" => Some(json!("commit")),
            "leethub_hook" => Some(json!("octocat/leetcode-archive")),
            _ => None,
        })
    });
    store
}

#[tokio::test]
async fn linking_an_accessible_repository_enables_commit_mode() {
    let mut store = store_with_token();
    let writes = log_writes(&mut store);

    let mut repo = MockRemoteRepo::new();
    repo.expect_repository()
        .withf(|_, full_name| full_name == "octocat/leetcode-archive")
        .returning(|_, full_name| {
            Ok(RepoInfo {
                full_name: full_name.to_owned(),
                html_url: format!("https://github.com/{full_name}"),
            })
        });

    let info = link_repository(&repo, &store, "octocat/leetcode-archive")
        .await
        .expect("link succeeds");

    assert_eq!(info.full_name, "octocat/leetcode-archive");
    assert_eq!(written(&writes, "mode_type"), Some(json!("commit")));
    assert_eq!(
        written(&writes, "leethub_hook"),
        Some(json!("octocat/leetcode-archive"))
    );
}

#[tokio::test]
async fn a_failed_link_resets_to_hook_mode() {
    let mut store = store_with_token();
    let writes = log_writes(&mut store);

    let mut repo = MockRemoteRepo::new();
    repo.expect_repository()
        .returning(|_, _| Err(RepoError::Status { status: 404 }));

    let err = link_repository(&repo, &store, "octocat/absent")
        .await
        .expect_err("link fails");
    assert!(matches!(
        err,
        SyncError::Remote(RepoError::Status { status: 404 })
    ));
    assert_eq!(written(&writes, "mode_type"), Some(json!("hook")));
    assert_eq!(written(&writes, "leethub_hook"), Some(Value::Null));
}

#[tokio::test]
async fn creating_a_repository_links_it_and_drops_stale_stats() {
    let mut store = store_with_token();
    let writes = log_writes(&mut store);

    let mut repo = MockRemoteRepo::new();
    repo.expect_create_repository()
        .withf(|_, req| req.name == "leetcode-archive" && req.description == REPO_DESCRIPTION)
        .returning(|_, req| {
            Ok(RepoInfo {
                full_name: format!("octocat/{}", req.name),
                html_url: format!("https://github.com/octocat/{}", req.name),
            })
        });

    let info = create_repository_and_link(&repo, &store, "leetcode-archive")
        .await
        .expect("creation succeeds");

    assert_eq!(info.full_name, "octocat/leetcode-archive");
    assert_eq!(written(&writes, "mode_type"), Some(json!("commit")));
    assert_eq!(
        written(&writes, "leethub_hook"),
        Some(json!("octocat/leetcode-archive"))
    );
    assert_eq!(written(&writes, "stats"), Some(Value::Null));
}

#[tokio::test]
async fn unlinking_clears_the_link_and_rearms_the_stats_sync() {
    let mut store = MockStore::new();
    let writes = log_writes(&mut store);

    unlink_repository(&store).await.expect("unlink succeeds");

    assert_eq!(written(&writes, "mode_type"), Some(json!("hook")));
    assert_eq!(written(&writes, "leethub_hook"), Some(Value::Null));
    assert_eq!(written(&writes, "sync_stats"), Some(json!(true)));
    assert_eq!(written(&writes, "stats"), Some(Value::Null));
}

#[tokio::test]
async fn recording_authentication_persists_token_and_username() {
    let mut store = MockStore::new();
    let writes = log_writes(&mut store);

    let mut repo = MockRemoteRepo::new();
    repo.expect_authenticated_user()
        .withf(|creds| creds.token == "fresh-token")
        .returning(|_| Ok("octocat".to_owned()));

    let username = record_authentication(&repo, &store, "fresh-token")
        .await
        .expect("token is valid");

    assert_eq!(username, "octocat");
    assert_eq!(written(&writes, "leethub_token"), Some(json!("fresh-token")));
    assert_eq!(written(&writes, "leethub_username"), Some(json!("octocat")));
}

#[tokio::test]
async fn first_sync_pulls_the_remote_ledger_and_disarms_itself() {
    let mut store = store_with_token();
    let writes = log_writes(&mut store);

    let remote_stats = json!({
        "leetcode": {
            "solved": 2,
            "easy": 1,
            "medium": 1,
            "hard": 0,
            "shas": {
                "two-sum": { "sha": "abc", "difficulty": "easy" },
                "lru-cache": { "sha": "def", "difficulty": "medium" }
            }
        }
    });
    let mut repo = MockRemoteRepo::new();
    repo.expect_get_file()
        .withf(|_, path| path == "stats.json")
        .returning(move |_, _| {
            Ok(RepoFile {
                text: remote_stats.to_string(),
                sha: "statssha".to_owned(),
            })
        });

    let ledger = sync_remote_stats(&repo, &store).await.expect("sync works");

    assert_eq!(ledger.solved, 2);
    assert!(ledger.is_consistent());
    assert_eq!(written(&writes, "sync_stats"), Some(json!(false)));
    let persisted = written(&writes, "stats").expect("ledger persisted");
    assert_eq!(persisted["solved"], json!(2));
}

#[tokio::test]
async fn sync_without_remote_stats_starts_fresh() {
    let mut store = store_with_token();
    let writes = log_writes(&mut store);

    let mut repo = MockRemoteRepo::new();
    repo.expect_get_file().returning(|_, path| {
        Err(RepoError::NotFound {
            path: path.to_owned(),
        })
    });

    let ledger = sync_remote_stats(&repo, &store).await.expect("sync works");

    assert_eq!(ledger.solved, 0);
    assert_eq!(written(&writes, "sync_stats"), Some(json!(false)));
}

#[tokio::test]
async fn an_already_synced_store_is_left_alone() {
    let mut store = MockStore::new();
    store.expect_get().returning(|key| {
        Ok(match key {
            "sync_stats" => Some(json!(false)),
            "stats" => Some(json!({ "solved": 3, "easy": 3, "medium": 0, "hard": 0, "shas": {} })),
            _ => None,
        })
    });
    store.expect_set().times(0);
    let repo = MockRemoteRepo::new();

    let ledger = sync_remote_stats(&repo, &store).await.expect("no-op sync");
    assert_eq!(ledger.solved, 3);
}
