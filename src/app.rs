use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};

use crate::action::{Action, Connection};
use crate::commands::{Command, CommandKind};
use crate::event::{is_quit_key, Event};
use crate::input::{InputEdit, InputField};
use crate::types::{Severity, SidePanel, Status, User};

/// Connect errors are cut to this many chars in the status bar
pub const ERROR_DISPLAY_CAP: usize = 35;

pub const SET_USER: usize = 0;
pub const FETCH_TOKEN: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Default, // Navigating the actions list
    Input,   // Typing an email
    Loading, // Waiting on connect or token fetch
}

/// One navigable entry of the actions list. Identity is its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionItem {
    pub label: String,
    pub disabled: bool,
}

impl ActionItem {
    fn new(label: &str, disabled: bool) -> Self {
        Self {
            label: label.to_string(),
            disabled,
        }
    }
}

/// Commands currently running, at most one per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InFlight {
    pub connect: bool,
    pub lookup: bool,
    pub fetch: bool,
}

impl InFlight {
    fn slot(&mut self, kind: CommandKind) -> &mut bool {
        match kind {
            CommandKind::Connect => &mut self.connect,
            CommandKind::Lookup => &mut self.lookup,
            CommandKind::Fetch => &mut self.fetch,
        }
    }

    pub fn contains(&self, kind: CommandKind) -> bool {
        match kind {
            CommandKind::Connect => self.connect,
            CommandKind::Lookup => self.lookup,
            CommandKind::Fetch => self.fetch,
        }
    }
}

pub struct App {
    pub actions: Vec<ActionItem>,
    pub cursor: usize,
    pub mode: Mode,
    pub status: Status,
    pub connection: Option<Connection>,
    pub current_user: Option<User>,
    pub side_panel: SidePanel,
    pub input: InputField,
    pub in_flight: InFlight,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            actions: vec![
                ActionItem::new("Set user", false),
                ActionItem::new("Fetch token", true),
                ActionItem::new("Other...", false),
            ],
            cursor: 0,
            mode: Mode::Loading,
            status: Status::new(Severity::Info, "Initializing..."),
            connection: None,
            current_user: None,
            side_panel: SidePanel::default(),
            input: InputField::default(),
            in_flight: InFlight::default(),
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::Connect,
            Event::Tick => Action::Tick,
            Event::Key(key) => self.handle_key(key),
            Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if is_quit_key(&key) {
            return Action::Quit;
        }

        match self.mode {
            Mode::Loading => Action::None,
            Mode::Default => match key.code {
                KeyCode::Char('k') | KeyCode::Up => Action::CursorUp,
                KeyCode::Char('j') | KeyCode::Down => Action::CursorDown,
                KeyCode::Enter => Action::Select,
                _ => Action::None,
            },
            Mode::Input => match key.code {
                KeyCode::Tab => Action::ExitInput,
                KeyCode::Enter => Action::SubmitInput,
                KeyCode::Backspace => Action::InputEdit(InputEdit::Backspace),
                KeyCode::Delete => Action::InputEdit(InputEdit::Delete),
                KeyCode::Left => Action::InputEdit(InputEdit::Left),
                KeyCode::Right => Action::InputEdit(InputEdit::Right),
                KeyCode::Home => Action::InputEdit(InputEdit::Home),
                KeyCode::End => Action::InputEdit(InputEdit::End),
                KeyCode::Char(c)
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    Action::InputChar(c)
                }
                _ => Action::None,
            },
        }
    }

    /// Apply one action. Returns the command to run next, if any.
    ///
    /// Actions are re-checked against the current mode: a key mapped before a
    /// transition but applied after it is dropped.
    pub fn update(&mut self, action: Action) -> Option<Command> {
        match action {
            Action::Quit => {
                self.should_quit = true;
                None
            }
            Action::Tick => {
                if self.mode == Mode::Loading {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
                None
            }
            Action::CursorUp => {
                if self.mode == Mode::Default {
                    self.move_up();
                }
                None
            }
            Action::CursorDown => {
                if self.mode == Mode::Default {
                    self.move_down();
                }
                None
            }
            Action::Select => {
                if self.mode == Mode::Default {
                    self.select()
                } else {
                    None
                }
            }
            Action::InputChar(c) => {
                if self.mode == Mode::Input {
                    self.input.insert(c);
                }
                None
            }
            Action::InputEdit(edit) => {
                if self.mode == Mode::Input {
                    self.input.apply(edit);
                }
                None
            }
            Action::ExitInput => {
                if self.mode == Mode::Input {
                    self.input.clear();
                    self.mode = Mode::Default;
                }
                None
            }
            Action::SubmitInput => {
                if self.mode == Mode::Input {
                    self.submit_input()
                } else {
                    None
                }
            }

            Action::Connect => {
                if self.mode != Mode::Loading || self.connection.is_some() {
                    return None;
                }
                self.status = Status::new(Severity::Info, "Connecting to database...");
                self.issue(Command::Connect)
            }
            Action::Connected(connection) => {
                self.finish(CommandKind::Connect);
                if self.mode == Mode::Loading {
                    self.connection = Some(connection);
                    self.status = Status::new(Severity::Success, "Connected to database");
                    self.mode = Mode::Default;
                }
                None
            }
            Action::ConnectFailed(err) => {
                self.finish(CommandKind::Connect);
                if self.mode == Mode::Loading {
                    self.status = Status::new(
                        Severity::Error,
                        format!(
                            "Failed to connect to database: {}",
                            shorten(&err, ERROR_DISPLAY_CAP)
                        ),
                    );
                    self.mode = Mode::Default;
                }
                None
            }

            // Lookup results leave the mode alone: they are issued from input mode,
            // which has already returned to Default, and must not cut short a fetch.
            Action::UserLoaded(Some(user)) => {
                self.finish(CommandKind::Lookup);
                info!(email = %user.email, "user set");
                self.side_panel = SidePanel::new("User", user.field_lines());
                self.current_user = Some(user);
                self.actions[FETCH_TOKEN].disabled = false;
                self.status = Status::new(Severity::Info, "User set");
                None
            }
            Action::UserLoaded(None) => {
                self.finish(CommandKind::Lookup);
                self.clear_user(vec!["Not Found".to_string()]);
                self.status = Status::new(Severity::Warning, "User not found");
                None
            }
            Action::LookupFailed(err) => {
                self.finish(CommandKind::Lookup);
                self.clear_user(Vec::new());
                self.status = Status::new(Severity::Error, err);
                None
            }

            Action::TokenFetched(token) => {
                self.finish(CommandKind::Fetch);
                if self.mode == Mode::Loading {
                    self.side_panel = SidePanel::new("Token", vec![token]);
                    self.status = Status::new(Severity::Success, "Retrieved token");
                    self.mode = Mode::Default;
                }
                None
            }
            Action::FetchFailed(err) => {
                self.finish(CommandKind::Fetch);
                if self.mode == Mode::Loading {
                    self.status = Status::new(Severity::Error, err);
                    self.mode = Mode::Default;
                }
                None
            }

            Action::None => None,
        }
    }

    // Single skip: a second disabled entry in a row is not searched past.
    fn move_up(&mut self) {
        if self.cursor > 0 {
            let step = if self.actions[self.cursor - 1].disabled {
                2
            } else {
                1
            };
            self.cursor = self.cursor.saturating_sub(step);
        }
    }

    fn move_down(&mut self) {
        let last = self.actions.len().saturating_sub(1);
        if self.cursor < last {
            let step = if self.actions[self.cursor + 1].disabled {
                2
            } else {
                1
            };
            self.cursor = (self.cursor + step).min(last);
        }
    }

    fn select(&mut self) -> Option<Command> {
        match self.cursor {
            SET_USER => {
                self.input.clear();
                self.mode = Mode::Input;
                None
            }
            FETCH_TOKEN => {
                if self.actions[FETCH_TOKEN].disabled {
                    return None;
                }
                let email = self.current_user.as_ref()?.email.clone();
                if self.in_flight.contains(CommandKind::Fetch) {
                    return None;
                }
                // The pending lookup may replace the user this token would be for.
                if self.in_flight.contains(CommandKind::Lookup) {
                    self.status = Status::new(Severity::Warning, "Lookup in progress, try again");
                    return None;
                }
                self.status = Status::new(Severity::Info, format!("Fetching {} token...", email));
                self.mode = Mode::Loading;
                self.issue(Command::FetchToken { email })
            }
            _ => None,
        }
    }

    fn submit_input(&mut self) -> Option<Command> {
        if self.input.is_empty() {
            return None;
        }
        let email = self.input.take();
        self.mode = Mode::Default;

        let Some(repo) = self.connection.clone() else {
            self.status = Status::new(Severity::Error, "Not connected to database");
            return None;
        };
        if self.in_flight.contains(CommandKind::Lookup) {
            self.status = Status::new(Severity::Warning, "Lookup already in progress");
            return None;
        }

        self.status = Status::new(Severity::Info, format!("Looking up {}...", email));
        self.issue(Command::LookupUser { repo, email })
    }

    fn issue(&mut self, command: Command) -> Option<Command> {
        let slot = self.in_flight.slot(command.kind());
        if *slot {
            return None;
        }
        *slot = true;
        debug!(kind = ?command.kind(), "issuing command");
        Some(command)
    }

    fn finish(&mut self, kind: CommandKind) {
        *self.in_flight.slot(kind) = false;
    }

    fn clear_user(&mut self, panel_lines: Vec<String>) {
        self.current_user = None;
        self.actions[FETCH_TOKEN].disabled = true;
        self.side_panel = SidePanel::new("User", panel_lines);
    }
}

/// Cap `msg` at `cap` chars, marking the cut with `...`
pub fn shorten(msg: &str, cap: usize) -> String {
    if msg.chars().count() < cap {
        return msg.to_string();
    }
    let mut short: String = msg.chars().take(cap).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::error::Result;
    use crate::store::UserRepository;

    #[derive(Debug)]
    struct NullRepo;

    #[async_trait]
    impl UserRepository for NullRepo {
        async fn ensure_seeded(&self, _email: &str) -> Result<()> {
            Ok(())
        }

        async fn find_by_email(&self, _email: &str) -> Result<Option<User>> {
            Ok(None)
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn user(email: &str) -> User {
        User {
            id: "65f0c0ffee".to_string(),
            email: email.to_string(),
        }
    }

    /// Route an event through key mapping and update, like the dispatch loop does.
    fn press(app: &mut App, event: Event) -> Option<Command> {
        let action = app.handle_event(event);
        app.update(action)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, key(KeyCode::Char(c)));
        }
    }

    fn connected_app() -> App {
        let mut app = App::new();
        assert!(matches!(press(&mut app, Event::Init), Some(Command::Connect)));
        app.update(Action::Connected(Arc::new(NullRepo)));
        app
    }

    fn app_with_user(email: &str) -> App {
        let mut app = connected_app();
        app.update(Action::UserLoaded(Some(user(email))));
        app
    }

    fn assert_invariants(app: &App) {
        assert!(app.cursor < app.actions.len());
        if app.current_user.is_none() {
            assert!(app.actions[FETCH_TOKEN].disabled);
        }
    }

    #[test]
    fn starts_loading_with_fixed_actions() {
        let app = App::new();
        assert_eq!(app.mode, Mode::Loading);
        assert!(app.connection.is_none());
        let labels: Vec<&str> = app.actions.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["Set user", "Fetch token", "Other..."]);
        assert!(app.actions[FETCH_TOKEN].disabled);
        assert_invariants(&app);
    }

    #[test]
    fn connect_is_issued_once() {
        let mut app = App::new();
        assert!(matches!(app.update(Action::Connect), Some(Command::Connect)));
        assert!(app.update(Action::Connect).is_none());
        assert!(app.in_flight.connect);
    }

    #[test]
    fn connect_success_enters_default() {
        let app = connected_app();
        assert_eq!(app.mode, Mode::Default);
        assert!(app.connection.is_some());
        assert_eq!(app.status.severity, Severity::Success);
        assert!(!app.in_flight.connect);
    }

    #[test]
    fn connect_failure_is_truncated() {
        let mut app = App::new();
        app.update(Action::Connect);
        let err = "server selection error: context deadline exceeded, current topology";
        app.update(Action::ConnectFailed(err.to_string()));

        assert_eq!(app.mode, Mode::Default);
        assert!(app.connection.is_none());
        assert_eq!(app.status.severity, Severity::Error);
        let expected = format!("Failed to connect to database: {}...", &err[..ERROR_DISPLAY_CAP]);
        assert_eq!(app.status.message, expected);
        assert_eq!(
            app.status.message.len(),
            "Failed to connect to database: ".len() + ERROR_DISPLAY_CAP + 3
        );
    }

    #[test]
    fn shorten_exact_lengths() {
        assert_eq!(shorten("short", 35), "short");
        let just_under = "x".repeat(34);
        assert_eq!(shorten(&just_under, 35), just_under);
        // At the cap the message is already cut
        let at_cap = "y".repeat(35);
        assert_eq!(shorten(&at_cap, 35), format!("{}...", at_cap));
        let long = "z".repeat(80);
        assert_eq!(shorten(&long, 35).chars().count(), 38);
    }

    #[test]
    fn shorten_counts_chars_not_bytes() {
        let msg = "é".repeat(40);
        assert_eq!(shorten(&msg, 35), format!("{}...", "é".repeat(35)));
    }

    #[test]
    fn quit_works_in_every_mode() {
        let ctrl_q = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));

        let mut loading = App::new();
        press(&mut loading, ctrl_q.clone());
        assert!(loading.should_quit);

        let mut input = connected_app();
        press(&mut input, key(KeyCode::Enter));
        assert_eq!(input.mode, Mode::Input);
        press(&mut input, ctrl_q);
        assert!(input.should_quit);
    }

    #[test]
    fn cursor_never_leaves_bounds() {
        let mut app = app_with_user("john@gmail.com");
        for _ in 0..5 {
            press(&mut app, key(KeyCode::Up));
            assert_eq!(app.cursor, 0);
        }
        for _ in 0..5 {
            press(&mut app, key(KeyCode::Down));
            assert_invariants(&app);
        }
        assert_eq!(app.cursor, 2);
    }

    #[test]
    fn vim_keys_navigate() {
        let mut app = app_with_user("john@gmail.com");
        press(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.cursor, 1);
        press(&mut app, key(KeyCode::Char('k')));
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn disabled_entry_is_skipped() {
        let mut app = connected_app();
        press(&mut app, key(KeyCode::Down));
        assert_eq!(app.cursor, 2);
        press(&mut app, key(KeyCode::Up));
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn skip_past_end_is_clamped() {
        let mut app = connected_app();
        app.actions = vec![
            ActionItem::new("a", false),
            ActionItem::new("b", false),
            ActionItem::new("c", true),
        ];
        app.cursor = 1;
        press(&mut app, key(KeyCode::Down));
        assert_eq!(app.cursor, 2);

        app.actions[0].disabled = true;
        app.actions[2].disabled = false;
        app.cursor = 1;
        press(&mut app, key(KeyCode::Up));
        assert_eq!(app.cursor, 0);
    }

    // Two disabled entries in a row: the single skip rests on the second one.
    #[test]
    fn single_skip_can_land_on_disabled_entry() {
        let mut app = connected_app();
        app.actions = vec![
            ActionItem::new("a", false),
            ActionItem::new("b", true),
            ActionItem::new("c", true),
            ActionItem::new("d", false),
        ];
        press(&mut app, key(KeyCode::Down));
        assert_eq!(app.cursor, 2);
        assert!(app.actions[app.cursor].disabled);

        app.cursor = 3;
        press(&mut app, key(KeyCode::Up));
        assert_eq!(app.cursor, 1);
        assert!(app.actions[app.cursor].disabled);
    }

    #[test]
    fn loading_ignores_navigation_and_enter() {
        let mut app = App::new();
        press(&mut app, Event::Init);
        for code in [KeyCode::Up, KeyCode::Down, KeyCode::Enter, KeyCode::Tab] {
            assert!(press(&mut app, key(code)).is_none());
        }
        assert_eq!(app.mode, Mode::Loading);
        assert_eq!(app.cursor, 0);
        assert!(app.input.is_empty());
    }

    #[test]
    fn stale_actions_are_dropped_while_loading() {
        let mut app = App::new();
        assert!(app.update(Action::CursorDown).is_none());
        assert!(app.update(Action::Select).is_none());
        assert!(app.update(Action::InputChar('x')).is_none());
        assert_eq!(app.cursor, 0);
        assert_eq!(app.mode, Mode::Loading);
    }

    #[test]
    fn tick_advances_spinner_only_while_loading() {
        let mut app = App::new();
        press(&mut app, Event::Tick);
        assert_eq!(app.spinner_frame, 1);
        app.update(Action::Connected(Arc::new(NullRepo)));
        press(&mut app, Event::Tick);
        assert_eq!(app.spinner_frame, 1);
    }

    #[test]
    fn enter_on_set_user_opens_input() {
        let mut app = connected_app();
        press(&mut app, key(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Input);
        assert!(app.input.is_empty());
    }

    #[test]
    fn tab_discards_edits() {
        let mut app = app_with_user("john@gmail.com");
        let panel = app.side_panel.clone();
        press(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "someone@else.com");
        press(&mut app, key(KeyCode::Tab));

        assert_eq!(app.mode, Mode::Default);
        assert!(app.input.is_empty());
        assert_eq!(app.current_user, Some(user("john@gmail.com")));
        assert_eq!(app.side_panel, panel);
    }

    #[test]
    fn input_mode_types_navigation_letters() {
        let mut app = connected_app();
        press(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "jk");
        press(&mut app, key(KeyCode::Down));
        assert_eq!(app.input.value(), "jk");
        assert_eq!(app.cursor, 0);
        press(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.input.value(), "j");
    }

    #[test]
    fn empty_submit_stays_in_input() {
        let mut app = connected_app();
        press(&mut app, key(KeyCode::Enter));
        assert!(press(&mut app, key(KeyCode::Enter)).is_none());
        assert_eq!(app.mode, Mode::Input);
    }

    #[test]
    fn set_user_scenario() {
        let mut app = connected_app();
        assert_eq!(app.status.severity, Severity::Success);

        press(&mut app, key(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Input);
        type_text(&mut app, "ana2@yahoo.com");

        let command = press(&mut app, key(KeyCode::Enter));
        match command {
            Some(Command::LookupUser { email, .. }) => assert_eq!(email, "ana2@yahoo.com"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(app.mode, Mode::Default);
        assert!(app.input.is_empty());

        app.update(Action::UserLoaded(Some(user("ana2@yahoo.com"))));
        assert_eq!(app.current_user.as_ref().unwrap().email, "ana2@yahoo.com");
        assert!(!app.actions[FETCH_TOKEN].disabled);
        assert_eq!(app.mode, Mode::Default);
        assert_eq!(app.status, Status::new(Severity::Info, "User set"));
        assert_eq!(app.side_panel.title, "User");
        assert_eq!(
            app.side_panel.lines,
            vec!["id: 65f0c0ffee", "email: ana2@yahoo.com"]
        );
        assert_invariants(&app);
    }

    #[test]
    fn unknown_user_scenario() {
        let mut app = app_with_user("john@gmail.com");
        press(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "unknown@x.com");
        assert!(press(&mut app, key(KeyCode::Enter)).is_some());

        app.update(Action::UserLoaded(None));
        assert_eq!(app.status.severity, Severity::Warning);
        assert_eq!(app.side_panel.title, "User");
        assert_eq!(app.side_panel.lines, vec!["Not Found"]);
        assert!(app.actions[FETCH_TOKEN].disabled);
        assert!(app.current_user.is_none());
        assert_invariants(&app);
    }

    #[test]
    fn lookup_failure_clears_user() {
        let mut app = app_with_user("john@gmail.com");
        app.update(Action::LookupFailed("failed searching user by email: io".into()));
        assert!(app.current_user.is_none());
        assert!(app.actions[FETCH_TOKEN].disabled);
        assert_eq!(app.status.severity, Severity::Error);
        assert_eq!(app.status.message, "failed searching user by email: io");
        assert_invariants(&app);
    }

    #[test]
    fn submit_without_connection_reports_error() {
        let mut app = App::new();
        app.update(Action::Connect);
        app.update(Action::ConnectFailed("refused".into()));
        press(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "john@gmail.com");
        assert!(press(&mut app, key(KeyCode::Enter)).is_none());
        assert_eq!(app.mode, Mode::Default);
        assert_eq!(app.status.severity, Severity::Error);
        assert!(app.input.is_empty());
    }

    #[test]
    fn one_lookup_in_flight_at_a_time() {
        let mut app = connected_app();
        press(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "john@gmail.com");
        assert!(press(&mut app, key(KeyCode::Enter)).is_some());

        press(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "ana2@yahoo.com");
        assert!(press(&mut app, key(KeyCode::Enter)).is_none());
        assert_eq!(app.status.severity, Severity::Warning);

        app.update(Action::UserLoaded(None));
        press(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "ana2@yahoo.com");
        assert!(press(&mut app, key(KeyCode::Enter)).is_some());
    }

    #[test]
    fn fetch_token_scenario_issues_once() {
        let mut app = app_with_user("john@gmail.com");
        press(&mut app, key(KeyCode::Down));
        assert_eq!(app.cursor, 1);

        let command = press(&mut app, key(KeyCode::Enter));
        match command {
            Some(Command::FetchToken { email }) => assert_eq!(email, "john@gmail.com"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(app.mode, Mode::Loading);
        assert_eq!(
            app.status,
            Status::new(Severity::Info, "Fetching john@gmail.com token...")
        );

        for _ in 0..3 {
            assert!(press(&mut app, key(KeyCode::Enter)).is_none());
            assert!(app.update(Action::Select).is_none());
        }
        assert_eq!(app.mode, Mode::Loading);

        app.update(Action::TokenFetched("john@gmail.com2024-01-01T00:00:00Z".into()));
        assert_eq!(app.mode, Mode::Default);
        assert_eq!(app.status, Status::new(Severity::Success, "Retrieved token"));
        assert_eq!(app.side_panel.title, "Token");
        assert_eq!(
            app.side_panel.lines,
            vec!["john@gmail.com2024-01-01T00:00:00Z"]
        );
        assert!(!app.in_flight.fetch);
    }

    #[test]
    fn fetch_failure_returns_to_default() {
        let mut app = app_with_user("john@gmail.com");
        app.cursor = FETCH_TOKEN;
        assert!(app.update(Action::Select).is_some());
        app.update(Action::FetchFailed("year outside of range".into()));
        assert_eq!(app.mode, Mode::Default);
        assert_eq!(app.status.severity, Severity::Error);
        assert!(app.update(Action::Select).is_some());
    }

    #[test]
    fn fetch_requires_user() {
        let mut app = connected_app();
        app.cursor = FETCH_TOKEN;
        assert!(app.update(Action::Select).is_none());
        assert_eq!(app.mode, Mode::Default);
    }

    #[test]
    fn fetch_waits_for_pending_lookup() {
        let mut app = app_with_user("john@gmail.com");
        press(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "unknown@x.com");
        assert!(press(&mut app, key(KeyCode::Enter)).is_some());

        app.cursor = FETCH_TOKEN;
        assert!(press(&mut app, key(KeyCode::Enter)).is_none());
        assert_eq!(app.mode, Mode::Default);
        assert_eq!(app.status.severity, Severity::Warning);
        assert!(!app.in_flight.fetch);

        app.update(Action::UserLoaded(None));
        app.update(Action::TokenFetched("john@gmail.com2024".into()));
        assert!(app.current_user.is_none());
        assert_eq!(app.side_panel, SidePanel::new("User", vec!["Not Found".into()]));
        assert_invariants(&app);
    }

    #[test]
    fn fetch_after_lookup_targets_new_user() {
        let mut app = app_with_user("john@gmail.com");
        press(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "ana2@yahoo.com");
        press(&mut app, key(KeyCode::Enter));
        app.update(Action::UserLoaded(Some(user("ana2@yahoo.com"))));

        app.cursor = FETCH_TOKEN;
        match app.update(Action::Select) {
            Some(Command::FetchToken { email }) => assert_eq!(email, "ana2@yahoo.com"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn seeded_user_round_trip() {
        let config = crate::config::Config {
            database_url: "sqlite::memory:".to_string(),
            ..crate::config::Config::default()
        };
        let mut app = App::new();
        let Some(Command::Connect) = press(&mut app, Event::Init) else {
            panic!("expected connect");
        };
        app.update(crate::commands::connect(&config).await);
        assert_eq!(app.mode, Mode::Default);

        press(&mut app, key(KeyCode::Enter));
        type_text(&mut app, "john@gmail.com");
        let Some(Command::LookupUser { repo, email }) = press(&mut app, key(KeyCode::Enter))
        else {
            panic!("expected lookup");
        };
        app.update(crate::commands::lookup_user(repo.as_ref(), &email).await);

        assert_eq!(app.current_user.as_ref().unwrap().email, "john@gmail.com");
        assert!(!app.actions[FETCH_TOKEN].disabled);
        assert_eq!(app.status, Status::new(Severity::Info, "User set"));
        assert_invariants(&app);
    }

    #[test]
    fn other_entry_is_a_noop() {
        let mut app = connected_app();
        app.cursor = 2;
        assert!(app.update(Action::Select).is_none());
        assert_eq!(app.mode, Mode::Default);
    }

    #[test]
    fn results_outside_loading_are_ignored() {
        let mut app = connected_app();
        let status = app.status.clone();
        app.update(Action::TokenFetched("t".into()));
        app.update(Action::ConnectFailed("late".into()));
        assert_eq!(app.status, status);
        assert_eq!(app.side_panel, SidePanel::default());
        assert!(app.connection.is_some());
    }
}
