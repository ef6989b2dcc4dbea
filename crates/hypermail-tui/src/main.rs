use std::collections::HashSet;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
};
use unicode_width::UnicodeWidthChar as _;

use hypermail_content::DisplayText;
use hypermail_core::{
    ComposeField, ComposeForm, ComposeMode, ConfigDocument, Contact, Draft, ListKey, ListModel,
    LocalStore, SettingField, log_debug,
};
use hypermail_mail::{ApiKeyInfo, Domain, Folder, MailEngine, MailEvent, RemoteMessage};

mod app_lifecycle_mod;
mod cli;
mod input_compose_mod;
mod input_list_mod;
mod input_main_mod;
mod input_settings_mod;
mod overlay_mod;
mod render_mod;
mod ui_theme_mod;

use crate::cli::Cli;

const TICK_RATE: Duration = Duration::from_millis(200);
const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
const MENU_ITEMS: [(char, &str, &str); 8] = [
    ('c', "Compose", "Write a new email"),
    ('i', "Inbox", "View received emails"),
    ('t', "Sent", "View sent emails"),
    ('d', "Drafts", "Resume a saved draft"),
    ('o', "Contacts", "Manage your address book"),
    ('s', "Settings", "Configure email & signature"),
    ('?', "Help", "Keyboard shortcuts"),
    ('q', "Quit", "Exit hypermail"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Setup,
    Menu,
    Inbox,
    Sent,
    Drafts,
    Contacts,
    Compose,
    Settings,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupStep {
    ApiKey,
    Validating,
    DefaultFrom,
}

struct SetupState {
    step: SetupStep,
    key_input: String,
    from_input: String,
    error: Option<String>,
}

/// An opened remote message. The summary is shown until the full body lands.
struct MessageView {
    summary: RemoteMessage,
    message: Option<RemoteMessage>,
    display: Option<DisplayText>,
    loading: bool,
    error: Option<String>,
    scroll: u16,
    confirm_archive: bool,
}

struct RemoteList {
    folder: Folder,
    list: ListModel<RemoteMessage>,
    loading: bool,
    error: Option<String>,
    detail: Option<MessageView>,
}

struct ContactForm {
    name: String,
    email: String,
    on_email: bool,
    error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComposeStatus {
    Editing,
    Sending,
}

struct ComposeState {
    mode: ComposeMode,
    form: ComposeForm,
    focus: ComposeField,
    draft_id: Option<String>,
    status: ComposeStatus,
    error: Option<String>,
    return_to: Mode,
}

struct SettingsState {
    field: SettingField,
    draft: ConfigDocument,
    pending_key: Option<String>,
    saved: bool,
    error: Option<String>,
    account_loading: bool,
}

struct UiTheme {
    base: Style,
    border: Style,
    bar: Style,
    show_bars: bool,
    title: Style,
    focus_bg: Style,
    table_header: Style,
    unread: Style,
    label: Style,
    label_focus: Style,
    muted: Style,
    hotkey: Style,
    error: Style,
    success: Style,
    warn: Style,
}

struct App {
    mode: Mode,
    help_return: Mode,
    store: LocalStore,
    runtime: Arc<tokio::runtime::Runtime>,
    engine: MailEngine,
    events: tokio::sync::mpsc::Receiver<MailEvent>,
    ui_theme: UiTheme,
    last_tick: Instant,
    spinner: usize,
    body_width: usize,
    status_message: Option<String>,
    menu_index: usize,
    setup: SetupState,
    inbox: RemoteList,
    sent: RemoteList,
    read_ids: HashSet<String>,
    drafts: ListModel<Draft>,
    contacts: ListModel<Contact>,
    contact_form: Option<ContactForm>,
    picking_contact: bool,
    compose: ComposeState,
    settings: SettingsState,
    domains: Vec<Domain>,
    api_keys: Vec<ApiKeyInfo>,
    account_error: Option<String>,
}

/// Terminal key to the list model's vocabulary. Modified keys are not list keys.
fn list_key(key: KeyEvent) -> Option<ListKey> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match key.code {
        KeyCode::Up => Some(ListKey::Up),
        KeyCode::Down => Some(ListKey::Down),
        KeyCode::Enter => Some(ListKey::Enter),
        KeyCode::Esc => Some(ListKey::Esc),
        KeyCode::Backspace => Some(ListKey::Backspace),
        KeyCode::Char(c) => Some(ListKey::Char(c)),
        _ => None,
    }
}

/// Appends printable characters and handles Backspace. Returns true on change.
fn apply_text_key(target: &mut String, key: KeyEvent) -> bool {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return false;
    }
    match key.code {
        KeyCode::Backspace => target.pop().is_some(),
        KeyCode::Char(c) if !c.is_control() => {
            target.push(c);
            true
        }
        _ => false,
    }
}

fn is_ctrl(key: KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

fn mask(value: &str) -> String {
    "*".repeat(value.chars().count())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = LocalStore::resolve(cli.config.clone());
    let ui_theme = UiTheme::from_name(&cli.theme_name());
    log_debug(&format!("startup config={}", store.path().display()));

    let rt = Arc::new(tokio::runtime::Runtime::new()?);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(store, rt.clone(), ui_theme);
    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Ok(rt) = Arc::try_unwrap(rt) {
        rt.shutdown_timeout(Duration::from_millis(200));
    }
    res
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui(frame, &mut app))?;

        app.drain_channels();

        let timeout = TICK_RATE.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == event::KeyEventKind::Press && app.on_key(key) {
                    return Ok(());
                }
            }
        }

        if app.last_tick.elapsed() >= TICK_RATE {
            app.last_tick = Instant::now();
            app.on_tick();
        }
    }
}

fn ui(frame: &mut ratatui::Frame, app: &mut App) {
    let area = frame.area();
    app.body_width = area.width.saturating_sub(4).max(20) as usize;
    frame.render_widget(
        ratatui::widgets::Block::default().style(app.ui_theme.base),
        area,
    );
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(area);

    render_mod::render_status_bar(frame, layout[0], app);
    match app.mode {
        Mode::Setup => render_mod::render_setup(frame, layout[1], app),
        Mode::Menu => render_mod::render_menu(frame, layout[1], app),
        Mode::Inbox | Mode::Sent => render_mod::render_remote_list(frame, layout[1], app),
        Mode::Drafts => render_mod::render_drafts(frame, layout[1], app),
        Mode::Contacts => render_mod::render_contacts(frame, layout[1], app),
        Mode::Compose => render_mod::render_compose(frame, layout[1], app),
        Mode::Settings => render_mod::render_settings(frame, layout[1], app),
        Mode::Help => render_mod::render_help(frame, layout[1], app),
    }
    render_mod::render_help_bar(frame, layout[2], app);

    overlay_mod::render_overlays(frame, area, app);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Single-line label no wider than `max_cols` terminal columns.
fn truncate_label(label: &str, max_cols: usize) -> String {
    let text = label.replace(['\n', '\r'], " ");
    let width: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if width <= max_cols {
        return text;
    }
    if max_cols <= 3 {
        return text.chars().take(max_cols).collect();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_cols - 3 {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use hypermail_core::ListKey;

    use super::{apply_text_key, is_ctrl, list_key, mask, truncate_label};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn terminal_keys_map_to_list_keys() {
        assert_eq!(list_key(key(KeyCode::Up)), Some(ListKey::Up));
        assert_eq!(list_key(key(KeyCode::Enter)), Some(ListKey::Enter));
        assert_eq!(list_key(key(KeyCode::Char('/'))), Some(ListKey::Char('/')));
        assert_eq!(list_key(key(KeyCode::Tab)), None);
        let ctrl_d = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_eq!(list_key(ctrl_d), None);
        assert!(is_ctrl(ctrl_d, 'd'));
        assert!(!is_ctrl(key(KeyCode::Char('d')), 'd'));
    }

    #[test]
    fn text_keys_edit_the_end_of_the_buffer() {
        let mut value = String::from("ab");
        assert!(apply_text_key(&mut value, key(KeyCode::Char('c'))));
        assert!(apply_text_key(&mut value, key(KeyCode::Backspace)));
        assert!(apply_text_key(&mut value, key(KeyCode::Backspace)));
        assert_eq!(value, "a");
        let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert!(!apply_text_key(&mut value, ctrl_s));
        let shifted = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert!(apply_text_key(&mut value, shifted));
        assert_eq!(value, "aA");
    }

    #[test]
    fn labels_truncate_by_display_width() {
        assert_eq!(truncate_label("short", 10), "short");
        assert_eq!(truncate_label("a long subject line", 10), "a long ...");
        assert_eq!(truncate_label("two\nlines", 20), "two lines");
        assert_eq!(mask("re_123"), "******");
    }
}
