mod runner;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use porthole_core::api::PortholeApi;
use porthole_core::client::PortholeClient;
use porthole_core::connections::RdbmsKind;
use porthole_core::effects::{Completion, Effect};
use porthole_core::schema_metadata::SchemaTreeEntry;
use porthole_core::settings::SettingsField;
use porthole_core::settings_panel::ConnectionField;
use porthole_core::workbench::ActivePanel;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::runner::RequestRunner;

const TICK_RATE: Duration = Duration::from_millis(120);
const SECRET_MASK: &str = "********";

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Settings,
    Workbench,
}

impl Screen {
    fn next(self) -> Self {
        match self {
            Self::Settings => Self::Workbench,
            Self::Workbench => Self::Settings,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Settings => "Settings",
            Self::Workbench => "Query Workbench",
        }
    }

    fn default_focus(self) -> Focus {
        match self {
            Self::Settings => Focus::SettingsFields,
            Self::Workbench => Focus::ConnectionSelector,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    SettingsFields,
    Connections,
    ConnectionForm,
    ConnectionSelector,
    SchemaTree,
    QueryList,
    QueryName,
    QueryEditor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectionKey {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputTarget {
    Setting(SettingsField),
    Connection(ConnectionField),
    QueryName,
    QueryEditor,
}

impl InputTarget {
    fn is_multiline(self) -> bool {
        matches!(self, Self::QueryEditor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextInput {
    target: InputTarget,
    buffer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMsg {
    Insert(char),
    Backspace,
    Newline,
    Commit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Msg {
    Quit,
    ToggleHelp,
    SwitchScreen,
    NextFocus,
    Navigate(DirectionKey),
    Activate,
    Edit,
    Add,
    Delete,
    Test,
    Connect,
    Save,
    Cancel,
    ShowPanel(ActivePanel),
    Input(InputMsg),
}

#[derive(Debug)]
struct TuiApp {
    client: PortholeClient,
    server_label: String,
    screen: Screen,
    focus: Focus,
    settings_cursor: usize,
    connection_cursor: usize,
    form_cursor: usize,
    tree_cursor: usize,
    query_cursor: usize,
    input: Option<TextInput>,
    in_flight: usize,
    show_help: bool,
    should_quit: bool,
    status_line: String,
}

impl TuiApp {
    fn new(server_label: impl Into<String>) -> Self {
        Self {
            client: PortholeClient::new(),
            server_label: server_label.into(),
            screen: Screen::Workbench,
            focus: Focus::ConnectionSelector,
            settings_cursor: 0,
            connection_cursor: 0,
            form_cursor: 0,
            tree_cursor: 0,
            query_cursor: 0,
            input: None,
            in_flight: 0,
            show_help: false,
            should_quit: false,
            status_line: "Loading settings and saved queries".to_string(),
        }
    }

    fn start(&mut self) -> Vec<Effect> {
        self.client.start()
    }

    fn complete(&mut self, completion: Completion) -> Vec<Effect> {
        let effects = self.client.apply(completion);
        self.clamp_cursors();
        effects
    }

    fn handle(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::Quit => {
                self.should_quit = true;
                Vec::new()
            }
            Msg::ToggleHelp => {
                self.show_help = !self.show_help;
                Vec::new()
            }
            Msg::SwitchScreen => {
                self.screen = self.screen.next();
                self.focus = self.screen.default_focus();
                self.status_line = format!("Switched to {}", self.screen.title());
                Vec::new()
            }
            Msg::NextFocus => {
                self.focus = self.next_focus();
                Vec::new()
            }
            Msg::Navigate(direction) => {
                self.navigate(direction);
                Vec::new()
            }
            Msg::Activate => self.activate(),
            Msg::Edit => self.edit(),
            Msg::Add => {
                self.add();
                Vec::new()
            }
            Msg::Delete => self.delete(),
            Msg::Test => self.test_connection(),
            Msg::Connect => self.connect(),
            Msg::Save => self.save(),
            Msg::Cancel => {
                self.cancel();
                Vec::new()
            }
            Msg::ShowPanel(panel) => {
                self.client.workbench.show_panel(panel);
                if self.screen == Screen::Workbench && self.focus != Focus::ConnectionSelector {
                    self.focus = match panel {
                        ActivePanel::Queries => Focus::QueryList,
                        ActivePanel::Schema => Focus::SchemaTree,
                    };
                }
                Vec::new()
            }
            Msg::Input(input) => {
                self.handle_input(input);
                Vec::new()
            }
        }
    }

    fn next_focus(&self) -> Focus {
        let form_open = self.client.settings.connection_form().is_some();
        let schema_active = self.client.workbench.active_panel() == ActivePanel::Schema;
        match self.focus {
            Focus::SettingsFields => Focus::Connections,
            Focus::Connections if form_open => Focus::ConnectionForm,
            Focus::Connections | Focus::ConnectionForm => Focus::SettingsFields,
            Focus::ConnectionSelector if schema_active => Focus::SchemaTree,
            Focus::ConnectionSelector => Focus::QueryList,
            Focus::QueryList => Focus::QueryName,
            Focus::QueryName => Focus::QueryEditor,
            Focus::SchemaTree | Focus::QueryEditor => Focus::ConnectionSelector,
        }
    }

    fn navigate(&mut self, direction: DirectionKey) {
        match self.focus {
            Focus::SettingsFields => {
                self.settings_cursor =
                    step(self.settings_cursor, SettingsField::ALL.len(), direction);
            }
            Focus::Connections => {
                let count = self.client.settings.snapshot().connections.len();
                self.connection_cursor = step(self.connection_cursor, count, direction);
            }
            Focus::ConnectionForm => {
                self.form_cursor = step(self.form_cursor, ConnectionField::ALL.len(), direction);
            }
            Focus::ConnectionSelector => self.cycle_connection(direction),
            Focus::SchemaTree => {
                let count = self.client.workbench.schema_tree().entries().len();
                self.tree_cursor = step(self.tree_cursor, count, direction);
            }
            Focus::QueryList => {
                let count = self.client.workbench.query_names().len();
                self.query_cursor = step(self.query_cursor, count, direction);
            }
            Focus::QueryName | Focus::QueryEditor => {}
        }
    }

    fn cycle_connection(&mut self, direction: DirectionKey) {
        let choices = self.client.workbench.connection_choices();
        let current = choices
            .iter()
            .position(|choice| choice == self.client.workbench.selection())
            .unwrap_or(0);
        let next = match direction {
            DirectionKey::Left | DirectionKey::Up => {
                current.checked_sub(1).unwrap_or(choices.len() - 1)
            }
            DirectionKey::Right | DirectionKey::Down => (current + 1) % choices.len(),
        };
        let Some(choice) = choices.get(next).cloned() else {
            return;
        };

        self.status_line = format!("Connection: {}", choice.label());
        self.tree_cursor = 0;
        self.client
            .workbench
            .select_connection(choice, &mut self.client.requests);
    }

    fn activate(&mut self) -> Vec<Effect> {
        match self.focus {
            Focus::SettingsFields => {
                let field = SettingsField::ALL[self.settings_cursor];
                if self.client.settings.is_editing() {
                    self.begin_input(InputTarget::Setting(field));
                } else {
                    self.status_line = "Press e to edit settings".to_string();
                }
                Vec::new()
            }
            Focus::Connections => self.edit(),
            Focus::ConnectionForm => {
                let field = ConnectionField::ALL[self.form_cursor];
                if field == ConnectionField::Rdbms {
                    self.cycle_rdbms();
                } else {
                    self.begin_input(InputTarget::Connection(field));
                }
                Vec::new()
            }
            Focus::ConnectionSelector => self.connect(),
            Focus::SchemaTree => {
                if !self.client.workbench.select_tree_entry(self.tree_cursor) {
                    self.status_line = "Select a table to list its columns".to_string();
                }
                Vec::new()
            }
            Focus::QueryList => {
                if self.client.workbench.select_query(self.query_cursor) {
                    self.status_line = "Press e to edit or d to delete".to_string();
                }
                Vec::new()
            }
            Focus::QueryName => {
                self.begin_input(InputTarget::QueryName);
                Vec::new()
            }
            Focus::QueryEditor => {
                self.begin_input(InputTarget::QueryEditor);
                Vec::new()
            }
        }
    }

    fn cycle_rdbms(&mut self) {
        let Some(form) = self.client.settings.connection_form() else {
            return;
        };
        let current = RdbmsKind::parse(ConnectionField::Rdbms.value(form));
        let next = RdbmsKind::CHOICES
            .iter()
            .position(|choice| *choice == current)
            .map_or(0, |index| (index + 1) % RdbmsKind::CHOICES.len());
        self.client
            .settings
            .set_connection_field(ConnectionField::Rdbms, RdbmsKind::CHOICES[next].as_str());
    }

    fn edit(&mut self) -> Vec<Effect> {
        match self.screen {
            Screen::Settings if self.focus == Focus::Connections => {
                if let Some(name) = self.connection_under_cursor() {
                    if self.client.settings.edit_connection(&name) {
                        self.focus = Focus::ConnectionForm;
                        self.form_cursor = 0;
                        self.status_line = format!("Editing connection `{name}`");
                    }
                }
                Vec::new()
            }
            Screen::Settings => {
                self.client.settings.toggle_edit();
                self.focus = Focus::SettingsFields;
                Vec::new()
            }
            Screen::Workbench => {
                let effect = self.client.workbench.edit_query(&mut self.client.requests);
                if effect.is_some() {
                    self.focus = Focus::QueryEditor;
                }
                effect.into_iter().collect()
            }
        }
    }

    fn add(&mut self) {
        match self.screen {
            Screen::Settings => {
                self.client.settings.toggle_add_connection();
                self.form_cursor = 0;
                self.focus = if self.client.settings.connection_form().is_some() {
                    Focus::ConnectionForm
                } else {
                    Focus::Connections
                };
            }
            Screen::Workbench => {
                self.client.workbench.clear_query();
                self.focus = Focus::QueryName;
            }
        }
    }

    fn delete(&mut self) -> Vec<Effect> {
        match self.screen {
            Screen::Settings => {
                if self.focus != Focus::Connections {
                    return Vec::new();
                }
                let Some(name) = self.connection_under_cursor() else {
                    return Vec::new();
                };
                self.status_line = format!("Deleting connection `{name}`");
                vec![self
                    .client
                    .settings
                    .delete_connection(&name, &mut self.client.requests)]
            }
            Screen::Workbench => self
                .client
                .workbench
                .delete_query(&mut self.client.requests)
                .into_iter()
                .collect(),
        }
    }

    fn test_connection(&mut self) -> Vec<Effect> {
        if self.screen != Screen::Settings || self.focus != Focus::Connections {
            return Vec::new();
        }
        let Some(name) = self.connection_under_cursor() else {
            return Vec::new();
        };
        vec![self
            .client
            .settings
            .test_connection(&name, &mut self.client.requests)]
    }

    fn connect(&mut self) -> Vec<Effect> {
        if self.screen != Screen::Workbench {
            return Vec::new();
        }
        self.tree_cursor = 0;
        self.client
            .workbench
            .connect(&mut self.client.requests)
            .into_iter()
            .collect()
    }

    fn save(&mut self) -> Vec<Effect> {
        let effect = match self.screen {
            Screen::Settings if self.client.settings.connection_form().is_some() => self
                .client
                .settings
                .save_connection(&mut self.client.requests),
            Screen::Settings => self.client.settings.save_settings(&mut self.client.requests),
            Screen::Workbench => self.client.workbench.save_query(&mut self.client.requests),
        };
        effect.into_iter().collect()
    }

    fn cancel(&mut self) {
        if self.screen != Screen::Settings {
            return;
        }
        if self.client.settings.connection_form().is_some() {
            self.client.settings.toggle_add_connection();
            self.focus = Focus::Connections;
        } else if self.client.settings.is_editing() {
            self.client.settings.toggle_edit();
        }
    }

    fn begin_input(&mut self, target: InputTarget) {
        let buffer = match target {
            InputTarget::Setting(field) => self.client.settings.draft().get(field).to_string(),
            InputTarget::Connection(field) => self
                .client
                .settings
                .connection_form()
                .map(|form| field.value(form).to_string())
                .unwrap_or_default(),
            InputTarget::QueryName => self.client.workbench.display_name().to_string(),
            InputTarget::QueryEditor => self.client.workbench.editor().to_string(),
        };
        self.input = Some(TextInput { target, buffer });
    }

    fn handle_input(&mut self, msg: InputMsg) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        match msg {
            InputMsg::Insert(character) => input.buffer.push(character),
            InputMsg::Backspace => {
                input.buffer.pop();
            }
            InputMsg::Newline => input.buffer.push('\n'),
            InputMsg::Commit => {
                if let Some(input) = self.input.take() {
                    self.commit_input(input);
                }
            }
        }
    }

    fn commit_input(&mut self, input: TextInput) {
        let TextInput { target, buffer } = input;
        match target {
            InputTarget::Setting(field) => {
                if !self.client.settings.set_setting(field, &buffer) {
                    self.status_line = "Settings are not editable".to_string();
                }
            }
            InputTarget::Connection(field) => {
                self.client.settings.set_connection_field(field, &buffer);
            }
            InputTarget::QueryName => *self.client.workbench.display_name_mut() = buffer,
            InputTarget::QueryEditor => *self.client.workbench.editor_mut() = buffer,
        }
    }

    fn connection_under_cursor(&self) -> Option<String> {
        self.client
            .settings
            .snapshot()
            .connections
            .names()
            .nth(self.connection_cursor)
            .map(str::to_string)
    }

    fn clamp_cursors(&mut self) {
        let connections = self.client.settings.snapshot().connections.len();
        self.connection_cursor = self.connection_cursor.min(connections.saturating_sub(1));
        let tree = self.client.workbench.schema_tree().entries().len();
        self.tree_cursor = self.tree_cursor.min(tree.saturating_sub(1));
        let queries = self.client.workbench.query_names().len();
        self.query_cursor = self.query_cursor.min(queries.saturating_sub(1));
        if self.focus == Focus::ConnectionForm && self.client.settings.connection_form().is_none()
        {
            self.focus = Focus::Connections;
        }
    }

    fn marker(&self, focus: Focus, cursor: usize, index: usize) -> &'static str {
        if self.focus == focus && cursor == index {
            ">"
        } else {
            " "
        }
    }
}

fn step(cursor: usize, len: usize, direction: DirectionKey) -> usize {
    if len == 0 {
        return 0;
    }
    match direction {
        DirectionKey::Up | DirectionKey::Left => cursor.saturating_sub(1),
        DirectionKey::Down | DirectionKey::Right => (cursor + 1).min(len - 1),
    }
}

/// Runs the terminal client until the user quits.
///
/// Server calls run on a dedicated tokio runtime; the UI loop stays on the
/// calling thread and owns all client state.
pub fn run(api: Arc<dyn PortholeApi>, server_label: &str) -> Result<(), TuiError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("porthole-requests")
        .build()?;
    let (sender, mut completions) = mpsc::unbounded_channel();
    let mut runner = RequestRunner::new(runtime.handle().clone(), api, sender);
    let mut app = TuiApp::new(server_label);

    let mut terminal = setup_terminal()?;
    let run_result = run_loop(&mut terminal, &mut app, &mut runner, &mut completions);
    let restore_result = restore_terminal(&mut terminal);

    drop(runner);
    runtime.shutdown_background();

    if let Err(error) = run_result {
        restore_result?;
        return Err(error);
    }

    restore_result?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), TuiError> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut TuiApp,
    runner: &mut RequestRunner,
    completions: &mut UnboundedReceiver<Completion>,
) -> Result<(), TuiError> {
    runner.spawn_all(app.start());

    loop {
        while let Ok(completion) = completions.try_recv() {
            runner.spawn_all(app.complete(completion));
        }
        runner.prune(&app.client.requests);
        app.in_flight = runner.in_flight();

        terminal.draw(|frame| render(frame, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let message = match app.input.as_ref() {
                        Some(input) => {
                            map_input_key(key, input.target.is_multiline()).map(Msg::Input)
                        }
                        None => map_key_event(key),
                    };
                    if let Some(message) = message {
                        runner.spawn_all(app.handle(message));
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn render(frame: &mut Frame<'_>, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", app.screen.title()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::raw(format!("Server: {}", app.server_label)),
        Span::raw(" | "),
        Span::raw(format!("Requests: {}", app.in_flight)),
        Span::raw(" | "),
        Span::raw(format!(
            "Input: {}",
            if app.input.is_some() {
                "editing"
            } else {
                "idle"
            }
        )),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Porthole"));
    frame.render_widget(header, chunks[0]);

    match app.screen {
        Screen::Settings => render_settings(frame, app, chunks[1]),
        Screen::Workbench => render_workbench(frame, app, chunks[1]),
    }

    let hints = match (app.input.as_ref(), app.screen) {
        (Some(input), _) if input.target.is_multiline() => {
            "Type to edit | Enter: newline | Esc: done"
        }
        (Some(_), _) => "Type to edit | Enter/Esc: done",
        (None, Screen::Settings) => {
            "w: workbench | Tab: focus | e: edit | a: add connection | t: test | d: delete | Ctrl+S: save | Esc: cancel"
        }
        (None, Screen::Workbench) => {
            "w: settings | Tab: focus | </>: connection | c: connect | 1/2: tabs | e: edit | a: new | d: delete | Ctrl+S: save"
        }
    };
    let footer = Paragraph::new(vec![
        Line::from(hints),
        Line::from(format!("Status: {}", app.status_line)),
    ])
    .block(Block::default().borders(Borders::ALL).title("Keys"));
    frame.render_widget(footer, chunks[2]);

    if app.show_help {
        render_help_popup(frame);
    }
}

fn render_settings(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let settings = &app.client.settings;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut lines = Vec::new();
    if let Some(flash) = settings.flash() {
        lines.push(Line::styled(flash, Style::default().fg(Color::Cyan)));
        lines.push(Line::from(""));
    }
    let mut controls = format!("[e] {}", settings.edit_label());
    if settings.save_visible() {
        controls.push_str("  [Ctrl+S] Save Settings");
    }
    lines.push(Line::from(controls));
    for (index, field) in SettingsField::ALL.iter().enumerate() {
        let value = input_or(app, InputTarget::Setting(*field), settings.draft().get(*field));
        let shown = if field.is_secret() && !value.is_empty() {
            SECRET_MASK
        } else {
            value
        };
        let style = if settings.is_editing() {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::styled(
            format!(
                "{} {}: {}",
                app.marker(Focus::SettingsFields, app.settings_cursor, index),
                field.label(),
                shown
            ),
            style,
        ));
    }
    let general = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("General Settings"),
    );
    frame.render_widget(general, columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);

    let mut connection_lines = vec![Line::from(format!(
        "[a] {}",
        settings.add_connection_label()
    ))];
    for (index, connection) in settings.snapshot().connections.connections().iter().enumerate() {
        connection_lines.push(Line::from(format!(
            "{} {} ({} {})",
            app.marker(Focus::Connections, app.connection_cursor, index),
            connection.name,
            connection.rdbms,
            connection.host
        )));
        if let Some(result) = settings.test_result(&connection.name) {
            connection_lines.push(Line::styled(
                format!("    {result}"),
                Style::default().fg(Color::Green),
            ));
        }
    }
    let connections = Paragraph::new(connection_lines)
        .block(Block::default().borders(Borders::ALL).title("Connections"));
    frame.render_widget(connections, right[0]);

    let form_lines = match settings.connection_form() {
        Some(form) => ConnectionField::ALL
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let value = input_or(app, InputTarget::Connection(*field), field.value(form));
                let shown = if *field == ConnectionField::Password && !value.is_empty() {
                    SECRET_MASK
                } else {
                    value
                };
                Line::from(format!(
                    "{} {}: {}",
                    app.marker(Focus::ConnectionForm, app.form_cursor, index),
                    field.label(),
                    shown
                ))
            })
            .collect(),
        None => vec![Line::from("Press a to add a connection or e to edit one")],
    };
    let form = Paragraph::new(form_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Connection (Ctrl+S: Save Connection)"),
    );
    frame.render_widget(form, right[1]);
}

fn render_workbench(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let workbench = &app.client.workbench;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(4),
        ])
        .split(area);

    let selector_marker = if app.focus == Focus::ConnectionSelector {
        ">"
    } else {
        " "
    };
    let mut selector_lines = vec![Line::from(format!(
        "{selector_marker} Connection: < {} >",
        workbench.selection().label()
    ))];
    let mut status_line = Vec::new();
    if workbench.connect_visible() {
        status_line.push(Span::raw(format!("[c] {}", workbench.connect_label())));
        status_line.push(Span::raw("  "));
    }
    status_line.push(Span::styled(
        workbench.status().to_string(),
        Style::default().fg(Color::Cyan),
    ));
    selector_lines.push(Line::from(status_line));
    let selector = Paragraph::new(selector_lines)
        .block(Block::default().borders(Borders::ALL).title("Connection"));
    frame.render_widget(selector, rows[0]);

    let selected_tab = match workbench.active_panel() {
        ActivePanel::Queries => 0,
        ActivePanel::Schema => 1,
    };
    let tabs = Tabs::new(vec!["1 Queries", "2 Schema"])
        .select(selected_tab)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(tabs, rows[1]);

    match workbench.active_panel() {
        ActivePanel::Queries => render_queries(frame, app, rows[2]),
        ActivePanel::Schema => render_schema(frame, app, rows[2]),
    }
}

fn render_queries(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let workbench = &app.client.workbench;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    let mut list_lines = Vec::new();
    for (index, name) in workbench.query_names().iter().enumerate() {
        let selected = if workbench.selected_query() == Some(name.as_str()) {
            "*"
        } else {
            " "
        };
        list_lines.push(Line::from(format!(
            "{}{selected} {name}",
            app.marker(Focus::QueryList, app.query_cursor, index)
        )));
    }
    if list_lines.is_empty() {
        list_lines.push(Line::from("No saved queries"));
    }
    if workbench.action_row_visible() {
        list_lines.push(Line::from(""));
        list_lines.push(Line::from("[e] Edit  [d] Delete"));
    }
    let list = Paragraph::new(list_lines)
        .block(Block::default().borders(Borders::ALL).title("Saved Queries"));
    frame.render_widget(list, columns[0]);

    let editor_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(columns[1]);

    let name = input_or(app, InputTarget::QueryName, workbench.display_name());
    let name_widget = Paragraph::new(name.to_string()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(focus_title("Query Name", app.focus == Focus::QueryName)),
    );
    frame.render_widget(name_widget, editor_rows[0]);

    let sql = input_or(app, InputTarget::QueryEditor, workbench.editor());
    let editor = Paragraph::new(sql.to_string())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(focus_title("SQL", app.focus == Focus::QueryEditor)),
        );
    frame.render_widget(editor, editor_rows[1]);

    let response = Paragraph::new(workbench.save_response().unwrap_or("").to_string())
        .block(Block::default().borders(Borders::ALL).title("Save"));
    frame.render_widget(response, editor_rows[2]);
}

fn render_schema(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let workbench = &app.client.workbench;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let tree = workbench.schema_tree();
    let tree_lines = if workbench.results_visible() {
        tree.entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let marker = app.marker(Focus::SchemaTree, app.tree_cursor, index);
                match entry {
                    SchemaTreeEntry::Schema(name) => Line::styled(
                        format!("{marker} {name}"),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    SchemaTreeEntry::Table { .. } => {
                        Line::from(format!("{marker}   {}", entry.label()))
                    }
                }
            })
            .collect()
    } else {
        vec![Line::from("Select a connection and press c to connect")]
    };
    let tree_widget = Paragraph::new(tree_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(focus_title("Schemas", app.focus == Focus::SchemaTree)),
    );
    frame.render_widget(tree_widget, columns[0]);

    let (title, column_lines) = match tree.column_panel() {
        Some(panel) if workbench.results_visible() => (
            format!("Columns: {}", panel.table),
            panel
                .columns
                .iter()
                .map(|column| Line::from(column.as_str()))
                .collect::<Vec<_>>(),
        ),
        _ => ("Columns".to_string(), Vec::new()),
    };
    let column_widget =
        Paragraph::new(column_lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(column_widget, columns[1]);
}

/// The live input buffer when `target` is being edited, otherwise `stored`.
fn input_or<'a>(app: &'a TuiApp, target: InputTarget, stored: &'a str) -> &'a str {
    match app.input.as_ref() {
        Some(input) if input.target == target => input.buffer.as_str(),
        _ => stored,
    }
}

fn focus_title(title: &str, focused: bool) -> String {
    if focused {
        format!("> {title}")
    } else {
        title.to_string()
    }
}

fn render_help_popup(frame: &mut Frame<'_>) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);
    let help = Paragraph::new(vec![
        Line::from("Global keymap"),
        Line::from("q: quit"),
        Line::from("?: toggle help"),
        Line::from("w: switch between settings and workbench"),
        Line::from("Tab: cycle focus"),
        Line::from("Arrows or hjkl: navigation"),
        Line::from("Enter: edit field, select entry or connect"),
        Line::from("Ctrl+S: save settings, connection or query"),
        Line::from(""),
        Line::from("Settings: e edit/cancel, a add connection, t test, d delete, Esc cancel"),
        Line::from("Workbench: c connect, 1/2 switch tab, e edit query, a new query, d delete"),
    ])
    .alignment(Alignment::Left)
    .block(Block::default().borders(Borders::ALL).title("Help"));
    frame.render_widget(help, area);
}

fn centered_rect(width_percent: u16, height_percent: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100_u16 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100_u16 - height_percent) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100_u16 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100_u16 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}

fn map_key_event(key: KeyEvent) -> Option<Msg> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('s')) => Some(Msg::Save),
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Msg::Quit),
        (_, KeyCode::Char('q')) => Some(Msg::Quit),
        (_, KeyCode::Char('?')) => Some(Msg::ToggleHelp),
        (_, KeyCode::Char('w')) => Some(Msg::SwitchScreen),
        (_, KeyCode::Tab) => Some(Msg::NextFocus),
        (_, KeyCode::Enter) => Some(Msg::Activate),
        (_, KeyCode::Esc) => Some(Msg::Cancel),
        (_, KeyCode::Char('e')) => Some(Msg::Edit),
        (_, KeyCode::Char('a')) => Some(Msg::Add),
        (_, KeyCode::Char('d')) => Some(Msg::Delete),
        (_, KeyCode::Char('t')) => Some(Msg::Test),
        (_, KeyCode::Char('c')) => Some(Msg::Connect),
        (_, KeyCode::Char('1')) => Some(Msg::ShowPanel(ActivePanel::Queries)),
        (_, KeyCode::Char('2')) => Some(Msg::ShowPanel(ActivePanel::Schema)),
        (_, KeyCode::Up | KeyCode::Char('k')) => Some(Msg::Navigate(DirectionKey::Up)),
        (_, KeyCode::Down | KeyCode::Char('j')) => Some(Msg::Navigate(DirectionKey::Down)),
        (_, KeyCode::Left | KeyCode::Char('h')) => Some(Msg::Navigate(DirectionKey::Left)),
        (_, KeyCode::Right | KeyCode::Char('l')) => Some(Msg::Navigate(DirectionKey::Right)),
        _ => None,
    }
}

fn map_input_key(key: KeyEvent, multiline: bool) -> Option<InputMsg> {
    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => Some(InputMsg::Commit),
        (_, KeyCode::Enter) if multiline => Some(InputMsg::Newline),
        (_, KeyCode::Enter) => Some(InputMsg::Commit),
        (_, KeyCode::Backspace) => Some(InputMsg::Backspace),
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(character)) => {
            Some(InputMsg::Insert(character))
        }
        _ => None,
    }
}
