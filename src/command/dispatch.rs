//! Multi-tier command dispatch
//!
//! Matching precedence is an explicit ordered algorithm over a tagged
//! command table, not iteration order:
//!
//! 1. exact match against the built-in table
//! 2. substring match against built-in keys, longest key first
//! 3. "open <app>" / "launch <app>" grammar
//! 4. custom command, exact phrase only
//! 5. fixed fallback response
//!
//! Exactly one handler fires per command; once a tier matches, no lower
//! tier is evaluated.

use std::sync::Arc;

use chrono::{Local, NaiveTime, Timelike};

use super::custom::{CustomAction, CustomCommand};
use crate::launch::LaunchSupervisor;
use crate::platform::{ShellRunner, UrlOpener};
use crate::speech::SpeechHandle;

/// Fallback response when no tier matches
const UNHANDLED_RESPONSE: &str = "I'm not sure how to do that.";

#[cfg(windows)]
const SLEEP_COMMAND: &str = "rundll32.exe powrprof.dll,SetSuspendState 0,1,0";
#[cfg(not(windows))]
const SLEEP_COMMAND: &str = "systemctl suspend";

/// Built-in handler kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinAction {
    /// Speak the current time of day
    SpeakTime,
    /// Open a fixed URL in the browser
    OpenUrl {
        url: &'static str,
        response: &'static str,
    },
    /// Resolve and launch an application (base executable name, no suffix)
    LaunchApp {
        exe: &'static str,
        label: &'static str,
    },
    /// Run a fixed OS command line
    System {
        command_line: &'static str,
        response: &'static str,
    },
}

/// The one handler the dispatcher committed to for this command
#[derive(Debug, PartialEq)]
pub enum Matched<'a> {
    /// Tier 1 or 2: built-in table entry
    Builtin {
        phrase: &'a str,
        action: &'a BuiltinAction,
        exact: bool,
    },
    /// Tier 3: open/launch grammar resolved to an executable request
    AppRequest { exe: String, label: String },
    /// Tier 4: user-declared command
    Custom(&'a CustomCommand),
    /// Tier 5: nothing matched
    Unhandled,
}

impl Matched<'_> {
    const fn tier_name(&self) -> &'static str {
        match self {
            Self::Builtin { exact: true, .. } => "exact",
            Self::Builtin { exact: false, .. } => "substring",
            Self::AppRequest { .. } => "prefix",
            Self::Custom(_) => "custom",
            Self::Unhandled => "fallback",
        }
    }
}

/// Spoken alias table for the open/launch grammar: spoken name → (base
/// executable name, spoken label)
const APP_ALIASES: &[(&str, &str, &str)] = &[
    ("chrome", "chrome", "Google Chrome"),
    ("google chrome", "chrome", "Google Chrome"),
    ("firefox", "firefox", "Mozilla Firefox"),
    ("brave", "brave", "Brave Browser"),
    ("edge", "msedge", "Microsoft Edge"),
    ("code", "code", "Visual Studio Code"),
    ("vs code", "code", "Visual Studio Code"),
    ("visual studio", "devenv", "Visual Studio"),
    ("intellij", "idea64", "IntelliJ IDEA"),
    ("pycharm", "pycharm64", "PyCharm"),
    ("notepad", "notepad", "Notepad"),
    ("calculator", "calc", "Calculator"),
];

/// Collaborator handles the dispatcher drives
pub struct Effects {
    pub speech: SpeechHandle,
    pub launcher: LaunchSupervisor,
    pub urls: Arc<dyn UrlOpener>,
    pub shell: Arc<dyn ShellRunner>,
}

/// Ordered command dispatcher
pub struct Dispatcher {
    builtins: Vec<(String, BuiltinAction)>,
    /// Indices into `builtins`, longest key first, for the substring tier
    substring_order: Vec<usize>,
    custom: Vec<CustomCommand>,
    default_suffix: String,
}

impl Dispatcher {
    /// Build the dispatcher from the built-in table and validated custom
    /// commands. `default_suffix` is appended to bare executable guesses
    /// (".exe" on Windows, empty elsewhere).
    #[must_use]
    pub fn new(custom: Vec<CustomCommand>, default_suffix: String) -> Self {
        let builtins = builtin_table();

        let mut substring_order: Vec<usize> = (0..builtins.len()).collect();
        substring_order.sort_by_key(|&i| std::cmp::Reverse(builtins[i].0.len()));

        Self {
            builtins,
            substring_order,
            custom,
            default_suffix,
        }
    }

    /// Built-in phrases, for diagnostics
    pub fn builtin_phrases(&self) -> impl Iterator<Item = &str> {
        self.builtins.iter().map(|(phrase, _)| phrase.as_str())
    }

    /// Custom commands, for diagnostics
    #[must_use]
    pub fn custom_commands(&self) -> &[CustomCommand] {
        &self.custom
    }

    /// The ordered matching algorithm; commits to exactly one handler
    #[must_use]
    pub fn match_command(&self, command: &str) -> Matched<'_> {
        // Tier 1: exact built-in key
        if let Some((phrase, action)) = self.builtins.iter().find(|(p, _)| p == command) {
            return Matched::Builtin {
                phrase,
                action,
                exact: true,
            };
        }

        // Tier 2: substring over built-in keys, longest first so a
        // multi-word phrase beats a single word it contains
        for &i in &self.substring_order {
            let (phrase, action) = &self.builtins[i];
            if command.contains(phrase.as_str()) {
                return Matched::Builtin {
                    phrase,
                    action,
                    exact: false,
                };
            }
        }

        // Tier 3: open/launch grammar
        if let Some(rest) = command
            .strip_prefix("open ")
            .or_else(|| command.strip_prefix("launch "))
        {
            let rest = rest.trim();
            if !rest.is_empty() {
                return self.resolve_app_request(rest);
            }
        }

        // Tier 4: custom command, full phrase equality only
        if let Some(custom) = self.custom.iter().find(|c| c.phrase == command) {
            return Matched::Custom(custom);
        }

        Matched::Unhandled
    }

    /// Resolve the free-form app name of an open/launch command
    fn resolve_app_request(&self, name: &str) -> Matched<'_> {
        if let Some((_, exe, label)) = APP_ALIASES.iter().find(|(spoken, _, _)| *spoken == name) {
            return Matched::AppRequest {
                exe: self.with_suffix(exe),
                label: (*label).to_string(),
            };
        }

        // Custom commands' declared application names
        for custom in &self.custom {
            if let CustomAction::Launch { exe_name, app_name } = &custom.action {
                if app_name.to_lowercase() == name {
                    return Matched::AppRequest {
                        exe: exe_name.clone(),
                        label: app_name.clone(),
                    };
                }
            }
        }

        // Generic guess
        Matched::AppRequest {
            exe: self.with_suffix(name),
            label: name.to_string(),
        }
    }

    /// Append the platform executable suffix unless the name already has one
    fn with_suffix(&self, name: &str) -> String {
        if name.contains('.') || self.default_suffix.is_empty() {
            name.to_string()
        } else {
            format!("{name}{}", self.default_suffix)
        }
    }

    /// Match and invoke exactly one handler
    pub async fn dispatch(&self, command: &str, fx: &Effects) {
        let matched = self.match_command(command);
        tracing::info!(command, tier = matched.tier_name(), "dispatching");

        match matched {
            Matched::Builtin { action, .. } => match action {
                BuiltinAction::SpeakTime => {
                    fx.speech.say(spoken_time(Local::now().time())).await;
                }
                BuiltinAction::OpenUrl { url, response } => {
                    if let Err(e) = fx.urls.open(url) {
                        tracing::error!(error = %e, url, "browser open failed");
                        fx.speech.say("I couldn't open the browser.").await;
                    } else {
                        fx.speech.say(*response).await;
                    }
                }
                BuiltinAction::LaunchApp { exe, label } => {
                    fx.launcher.launch(&self.with_suffix(exe), label).await;
                }
                BuiltinAction::System {
                    command_line,
                    response,
                } => {
                    if let Err(e) = fx.shell.run(command_line) {
                        tracing::error!(error = %e, "system command failed");
                        fx.speech.say("I couldn't do that.").await;
                    } else {
                        fx.speech.say(*response).await;
                    }
                }
            },
            Matched::AppRequest { exe, label } => {
                fx.launcher.launch(&exe, &label).await;
            }
            Matched::Custom(custom) => match &custom.action {
                CustomAction::Launch { exe_name, app_name } => {
                    fx.launcher.launch(exe_name, app_name).await;
                }
                CustomAction::Url { url } => {
                    if let Err(e) = fx.urls.open(url) {
                        tracing::error!(error = %e, url, "browser open failed");
                        fx.speech.say("I couldn't open the browser.").await;
                    } else if let Some(response) = &custom.response {
                        fx.speech.say(response.clone()).await;
                    }
                }
                CustomAction::Shell { shell_cmd } => {
                    if let Err(e) = fx.shell.run(shell_cmd) {
                        tracing::error!(error = %e, "custom shell command failed");
                        fx.speech.say("I couldn't do that.").await;
                    } else if let Some(response) = &custom.response {
                        fx.speech.say(response.clone()).await;
                    }
                }
            },
            Matched::Unhandled => {
                fx.speech.say(UNHANDLED_RESPONSE).await;
            }
        }
    }
}

/// The built-in command table
fn builtin_table() -> Vec<(String, BuiltinAction)> {
    let entries: Vec<(&str, BuiltinAction)> = vec![
        ("what time is it", BuiltinAction::SpeakTime),
        (
            "google",
            BuiltinAction::OpenUrl {
                url: "https://www.google.com",
                response: "Opening Google.",
            },
        ),
        (
            "youtube",
            BuiltinAction::OpenUrl {
                url: "https://www.youtube.com",
                response: "Opening YouTube.",
            },
        ),
        (
            "chrome",
            BuiltinAction::LaunchApp {
                exe: "chrome",
                label: "Google Chrome",
            },
        ),
        (
            "firefox",
            BuiltinAction::LaunchApp {
                exe: "firefox",
                label: "Mozilla Firefox",
            },
        ),
        (
            "brave",
            BuiltinAction::LaunchApp {
                exe: "brave",
                label: "Brave Browser",
            },
        ),
        (
            "edge",
            BuiltinAction::LaunchApp {
                exe: "msedge",
                label: "Microsoft Edge",
            },
        ),
        (
            "pycharm",
            BuiltinAction::LaunchApp {
                exe: "pycharm64",
                label: "PyCharm",
            },
        ),
        (
            "intellij",
            BuiltinAction::LaunchApp {
                exe: "idea64",
                label: "IntelliJ IDEA",
            },
        ),
        (
            "visual studio",
            BuiltinAction::LaunchApp {
                exe: "devenv",
                label: "Visual Studio",
            },
        ),
        (
            "code",
            BuiltinAction::LaunchApp {
                exe: "code",
                label: "Visual Studio Code",
            },
        ),
        (
            "put computer to sleep",
            BuiltinAction::System {
                command_line: SLEEP_COMMAND,
                response: "Going to sleep.",
            },
        ),
        (
            "sleep",
            BuiltinAction::System {
                command_line: SLEEP_COMMAND,
                response: "Going to sleep.",
            },
        ),
    ];

    entries
        .into_iter()
        .map(|(phrase, action)| (phrase.to_string(), action))
        .collect()
}

/// Fixed spoken time format: "It's 2:05 PM"
#[must_use]
pub fn spoken_time(time: NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    let period = if pm { "PM" } else { "AM" };
    format!("It's {hour}:{:02} {period}", time.minute())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher_with(custom: Vec<CustomCommand>) -> Dispatcher {
        Dispatcher::new(custom, String::new())
    }

    #[test]
    fn every_builtin_key_exact_matches_its_own_handler() {
        let dispatcher = dispatcher_with(Vec::new());
        let keys: Vec<String> = dispatcher.builtin_phrases().map(String::from).collect();

        for key in keys {
            match dispatcher.match_command(&key) {
                Matched::Builtin { phrase, exact, .. } => {
                    assert_eq!(phrase, key);
                    assert!(exact);
                }
                other => panic!("key {key:?} matched {other:?}"),
            }
        }
    }

    #[test]
    fn longer_substring_key_beats_its_own_substring() {
        let dispatcher = dispatcher_with(Vec::new());

        match dispatcher.match_command("please put computer to sleep now") {
            Matched::Builtin { phrase, exact, .. } => {
                assert_eq!(phrase, "put computer to sleep");
                assert!(!exact);
            }
            other => panic!("matched {other:?}"),
        }
    }

    #[test]
    fn prefix_grammar_uses_alias_table() {
        let dispatcher = Dispatcher::new(Vec::new(), ".exe".to_string());

        match dispatcher.match_command("open visual studio") {
            Matched::AppRequest { exe, label } => {
                assert_eq!(exe, "devenv.exe");
                assert_eq!(label, "Visual Studio");
            }
            other => panic!("matched {other:?}"),
        }
    }

    #[test]
    fn prefix_grammar_guesses_with_suffix() {
        let dispatcher = Dispatcher::new(Vec::new(), ".exe".to_string());

        match dispatcher.match_command("launch spotify") {
            Matched::AppRequest { exe, label } => {
                assert_eq!(exe, "spotify.exe");
                assert_eq!(label, "spotify");
            }
            other => panic!("matched {other:?}"),
        }
    }

    #[test]
    fn prefix_grammar_respects_existing_suffix() {
        let dispatcher = Dispatcher::new(Vec::new(), ".exe".to_string());

        match dispatcher.match_command("open spotify.exe") {
            Matched::AppRequest { exe, .. } => assert_eq!(exe, "spotify.exe"),
            other => panic!("matched {other:?}"),
        }
    }

    #[test]
    fn prefix_grammar_consults_custom_app_names() {
        let custom = vec![CustomCommand {
            phrase: "my editor".to_string(),
            action: CustomAction::Launch {
                exe_name: "sublime_text.exe".to_string(),
                app_name: "Sublime".to_string(),
            },
            response: None,
        }];
        let dispatcher = Dispatcher::new(custom, ".exe".to_string());

        match dispatcher.match_command("open sublime") {
            Matched::AppRequest { exe, label } => {
                assert_eq!(exe, "sublime_text.exe");
                assert_eq!(label, "Sublime");
            }
            other => panic!("matched {other:?}"),
        }
    }

    #[test]
    fn custom_commands_match_exactly_not_substring() {
        let custom = vec![CustomCommand {
            phrase: "standup playlist".to_string(),
            action: CustomAction::Url {
                url: "https://example.com/playlist".to_string(),
            },
            response: None,
        }];
        let dispatcher = dispatcher_with(custom);

        assert!(matches!(
            dispatcher.match_command("standup playlist"),
            Matched::Custom(_)
        ));
        assert_eq!(
            dispatcher.match_command("play standup playlist"),
            Matched::Unhandled
        );
    }

    #[test]
    fn builtin_tiers_win_over_custom() {
        let custom = vec![CustomCommand {
            phrase: "google".to_string(),
            action: CustomAction::Shell {
                shell_cmd: "true".to_string(),
            },
            response: None,
        }];
        let dispatcher = dispatcher_with(custom);

        assert!(matches!(
            dispatcher.match_command("google"),
            Matched::Builtin { exact: true, .. }
        ));
    }

    #[test]
    fn unmatched_commands_fall_through() {
        let dispatcher = dispatcher_with(Vec::new());
        assert_eq!(
            dispatcher.match_command("make me a sandwich"),
            Matched::Unhandled
        );
    }

    #[test]
    fn spoken_time_is_twelve_hour() {
        let afternoon = NaiveTime::from_hms_opt(14, 5, 0).unwrap();
        assert_eq!(spoken_time(afternoon), "It's 2:05 PM");

        let morning = NaiveTime::from_hms_opt(0, 30, 0).unwrap();
        assert_eq!(spoken_time(morning), "It's 12:30 AM");
    }
}
