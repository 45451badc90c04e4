//! Dispatch pipeline integration tests with mock collaborators

use std::sync::Arc;
use std::time::Duration;

use nova_assistant::command::{Dispatcher, Effects, load_custom_commands};
use nova_assistant::launch::{ExecCache, ExecutableResolver, LaunchSupervisor, Resolve};

mod common;
use common::{MockLauncher, MockShellRunner, MockUrlOpener, collecting_sink, wait_for};

async fn effects_with(
    dispatcher_custom: Vec<nova_assistant::command::CustomCommand>,
    resolver: Arc<dyn Resolve>,
    launcher: Arc<MockLauncher>,
) -> (
    Dispatcher,
    Effects,
    nova_assistant::speech::SpeechSink,
    std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    Arc<MockUrlOpener>,
    Arc<MockShellRunner>,
) {
    let (sink, spoken) = collecting_sink().await;
    let urls = Arc::new(MockUrlOpener::default());
    let shell = Arc::new(MockShellRunner::default());

    let supervisor = LaunchSupervisor::new(resolver, launcher, sink.handle());
    // Windows-style suffix keeps executable names deterministic in tests
    let dispatcher = Dispatcher::new(dispatcher_custom, ".exe".to_string());
    let fx = Effects {
        speech: sink.handle(),
        launcher: supervisor,
        urls: urls.clone(),
        shell: shell.clone(),
    };

    (dispatcher, fx, sink, spoken, urls, shell)
}

fn resolver_in(dir: &std::path::Path) -> Arc<ExecutableResolver> {
    let cache = ExecCache::load(dir.join("cache.json"));
    Arc::new(ExecutableResolver::new(cache, vec![dir.to_path_buf()], 4))
}

#[tokio::test]
async fn time_command_speaks_without_touching_anything_else() {
    let dir = tempfile::tempdir().unwrap();
    let launcher = Arc::new(MockLauncher::default());
    let (dispatcher, fx, sink, spoken, urls, shell) =
        effects_with(Vec::new(), resolver_in(dir.path()), launcher.clone()).await;

    dispatcher.dispatch("what time is it", &fx).await;
    sink.shutdown().await;

    let spoken = spoken.lock().unwrap();
    assert_eq!(spoken.len(), 1);
    assert!(spoken[0].starts_with("It's "));
    assert!(spoken[0].ends_with("AM") || spoken[0].ends_with("PM"));

    assert_eq!(launcher.launch_count(), 0);
    assert!(urls.opened.lock().unwrap().is_empty());
    assert!(shell.commands.lock().unwrap().is_empty());
}

#[tokio::test]
async fn custom_url_command_opens_the_exact_url() {
    let custom_file = tempfile::tempdir().unwrap();
    let path = custom_file.path().join("custom_commands.json");
    std::fs::write(
        &path,
        r#"{"commands": [{"phrase": "standup playlist", "action": "url",
            "url": "https://example.com/playlist", "response": "Starting the playlist."}]}"#,
    )
    .unwrap();
    let custom = load_custom_commands(&path).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let launcher = Arc::new(MockLauncher::default());
    let (dispatcher, fx, sink, spoken, urls, _) =
        effects_with(custom, resolver_in(dir.path()), launcher).await;

    dispatcher.dispatch("standup playlist", &fx).await;
    sink.shutdown().await;

    assert_eq!(
        *urls.opened.lock().unwrap(),
        vec!["https://example.com/playlist"]
    );
    assert_eq!(*spoken.lock().unwrap(), vec!["Starting the playlist."]);
}

#[tokio::test]
async fn open_command_searches_launches_and_fills_the_cache() {
    // Scenario: empty cache, chrome.exe present under a search root
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("apps/chrome.exe");
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, b"").unwrap();

    let launcher = Arc::new(MockLauncher::default());
    let (dispatcher, fx, sink, spoken, _, _) =
        effects_with(Vec::new(), resolver_in(dir.path()), launcher.clone()).await;

    dispatcher.dispatch("open chrome", &fx).await;

    let launched = wait_for(Duration::from_secs(3), || launcher.launch_count() == 1).await;
    assert!(launched, "background worker never launched");
    assert_eq!(launcher.launched.lock().unwrap()[0], target);

    sink.shutdown().await;
    let spoken = spoken.lock().unwrap();
    assert!(spoken.iter().any(|s| s.contains("Searching for")));
    assert!(spoken.iter().any(|s| s.contains("Found and opening")));

    // One launch attempt, and the discovery is cached for next time
    assert_eq!(launcher.launch_count(), 1);
    let mut cache = ExecCache::load(dir.path().join("cache.json"));
    assert_eq!(cache.lookup_valid("chrome.exe"), Some(target));
}

#[tokio::test]
async fn cached_entry_launches_inline() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("chrome.exe");
    std::fs::write(&target, b"").unwrap();

    let mut cache = ExecCache::load(dir.path().join("cache.json"));
    cache.insert("chrome.exe", target.clone());
    let resolver = Arc::new(ExecutableResolver::new(cache, vec![], 1));

    let launcher = Arc::new(MockLauncher::default());
    let (dispatcher, fx, sink, spoken, _, _) =
        effects_with(Vec::new(), resolver, launcher.clone()).await;

    dispatcher.dispatch("chrome", &fx).await;
    sink.shutdown().await;

    // No search announcement: the cache hit went straight to launch
    assert_eq!(launcher.launch_count(), 1);
    let spoken = spoken.lock().unwrap();
    assert_eq!(spoken.len(), 1);
    assert!(spoken[0].contains("Opening Google Chrome"));
}

#[tokio::test]
async fn unhandled_command_gets_the_fixed_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let launcher = Arc::new(MockLauncher::default());
    let (dispatcher, fx, sink, spoken, _, _) =
        effects_with(Vec::new(), resolver_in(dir.path()), launcher.clone()).await;

    dispatcher.dispatch("make me a sandwich", &fx).await;
    sink.shutdown().await;

    assert_eq!(
        *spoken.lock().unwrap(),
        vec!["I'm not sure how to do that."]
    );
    assert_eq!(launcher.launch_count(), 0);
}

#[tokio::test]
async fn custom_shell_command_runs_and_confirms() {
    let custom = vec![nova_assistant::command::CustomCommand {
        phrase: "backup notes".to_string(),
        action: nova_assistant::command::CustomAction::Shell {
            shell_cmd: "tar czf notes.tgz notes/".to_string(),
        },
        response: Some("Backing up.".to_string()),
    }];

    let dir = tempfile::tempdir().unwrap();
    let launcher = Arc::new(MockLauncher::default());
    let (dispatcher, fx, sink, spoken, _, shell) =
        effects_with(custom, resolver_in(dir.path()), launcher).await;

    dispatcher.dispatch("backup notes", &fx).await;
    sink.shutdown().await;

    assert_eq!(
        *shell.commands.lock().unwrap(),
        vec!["tar czf notes.tgz notes/"]
    );
    assert_eq!(*spoken.lock().unwrap(), vec!["Backing up."]);
}
