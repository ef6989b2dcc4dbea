use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Row, Table, Wrap},
};
use unicode_width::UnicodeWidthStr as _;

use hypermail_core::{ComposeField, ComposeMode, ListMode, ListView, SettingField};
use hypermail_mail::Folder;

use super::{
    App, ComposeStatus, MENU_ITEMS, MessageView, Mode, RemoteList, SPINNER_FRAMES, SetupStep,
    centered_rect, mask, truncate_label,
};

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Setup => "SETUP",
        Mode::Menu => "MENU",
        Mode::Inbox => "INBOX",
        Mode::Sent => "SENT",
        Mode::Drafts => "DRAFTS",
        Mode::Contacts => "CONTACTS",
        Mode::Compose => "COMPOSE",
        Mode::Settings => "SETTINGS",
        Mode::Help => "HELP",
    }
}

fn spinner(app: &App) -> &'static str {
    SPINNER_FRAMES[app.spinner % SPINNER_FRAMES.len()]
}

/// Places the terminal cursor after the last character of `text`.
fn set_cursor_at_end(frame: &mut ratatui::Frame, area: Rect, text: &str, line_offset: usize) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let line = text.split('\n').count().saturating_sub(1) + line_offset;
    let col = text.rsplit('\n').next().unwrap_or_default().width();
    let x = area.x + (col as u16).min(area.width.saturating_sub(1));
    let y = area.y + (line as u16).min(area.height.saturating_sub(1));
    frame.set_cursor_position((x, y));
}

fn panel(app: &App, title: impl Into<String>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title.into(), app.ui_theme.title))
        .style(app.ui_theme.base)
        .border_style(app.ui_theme.border)
}

pub(crate) fn render_status_bar(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(" HYPERMAIL ", app.ui_theme.title),
        Span::raw(format!(" {} ", mode_label(app.mode))),
    ];
    if !app.inbox.list.items().is_empty() {
        spans.push(Span::styled(
            format!(" inbox: {} unread ", app.unread_count()),
            app.ui_theme.unread,
        ));
    }
    let busy = app.inbox.loading
        || app.sent.loading
        || app.settings.pending_key.is_some()
        || app.compose.status == ComposeStatus::Sending;
    if busy {
        spans.push(Span::styled(
            format!(" {} working ", spinner(app)),
            app.ui_theme.warn,
        ));
    }
    let block = Block::default()
        .borders(if app.ui_theme.show_bars {
            Borders::BOTTOM
        } else {
            Borders::NONE
        })
        .style(app.ui_theme.bar)
        .border_style(app.ui_theme.border);
    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(app.ui_theme.bar)
            .block(block),
        area,
    );
}

fn list_hints(mode: ListMode, normal: &'static str) -> &'static str {
    match mode {
        ListMode::Searching => "type to filter  Enter keep  Backspace delete  Esc clear",
        ListMode::Confirming => "y confirm  n cancel  Esc close",
        ListMode::Normal => normal,
    }
}

pub(crate) fn render_help_bar(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let hints = match app.mode {
        Mode::Setup => "Enter confirm  Backspace delete  Ctrl+C quit",
        Mode::Menu => "j/k move  Enter open  c i t d o s ? jump  q quit",
        Mode::Inbox => match &app.inbox.detail {
            Some(view) if view.confirm_archive => "y confirm  n cancel  Esc close",
            Some(_) => "j/k scroll  r reply  f forward  d delete  Esc back",
            None => list_hints(
                app.inbox.list.mode(),
                "j/k move  Enter open  / search  n/p page  r refresh  a mark all read  d delete  Esc back",
            ),
        },
        Mode::Sent => match &app.sent.detail {
            Some(_) => "j/k scroll  f forward  Esc back",
            None => list_hints(
                app.sent.list.mode(),
                "j/k move  Enter open  / search  n/p page  r refresh  Esc back",
            ),
        },
        Mode::Drafts => list_hints(
            app.drafts.mode(),
            "j/k move  Enter edit  / search  n/p page  d delete  Esc back",
        ),
        Mode::Contacts if app.contact_form.is_some() => {
            "Tab switch field  Enter next/save  Ctrl+S save  Esc cancel"
        }
        Mode::Contacts if app.picking_contact => list_hints(
            app.contacts.mode(),
            "j/k move  Enter insert  / search  n/p page  Esc back to compose",
        ),
        Mode::Contacts => list_hints(
            app.contacts.mode(),
            "j/k move  Enter compose  a add  d delete  / search  n/p page  Esc back",
        ),
        Mode::Compose => "Tab/Shift+Tab field  Ctrl+S send  Ctrl+D save draft  Ctrl+T contacts  Esc back",
        Mode::Settings => "Tab/Shift+Tab field  Ctrl+S save  Esc back",
        Mode::Help => "Esc/q/? close",
    };
    let mut help = String::from(hints);
    if let Some(msg) = &app.status_message {
        help.push_str("  |  ");
        help.push_str(msg);
    }
    let block = Block::default()
        .borders(if app.ui_theme.show_bars {
            Borders::TOP
        } else {
            Borders::NONE
        })
        .style(app.ui_theme.bar)
        .border_style(app.ui_theme.border);
    frame.render_widget(
        Paragraph::new(help).style(app.ui_theme.bar).block(block),
        area,
    );
}

pub(crate) fn render_setup(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let popup = centered_rect(70, 50, area);
    let block = panel(app, "WELCOME TO HYPERMAIL");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let setup = &app.setup;
    let mut lines = Vec::new();
    let mut input: Option<(String, usize)> = None;
    match setup.step {
        SetupStep::ApiKey => {
            lines.push(Line::from("Enter your Resend API key to get started."));
            lines.push(Line::styled(
                "Create one at https://resend.com/api-keys",
                app.ui_theme.muted,
            ));
            lines.push(Line::from(""));
            let masked = mask(&setup.key_input);
            lines.push(Line::from(vec![
                Span::styled("API key: ", app.ui_theme.label_focus),
                Span::raw(masked.clone()),
            ]));
            input = Some((format!("API key: {}", masked), lines.len() - 1));
        }
        SetupStep::Validating => {
            lines.push(Line::styled(
                format!("{} Validating API key...", spinner(app)),
                app.ui_theme.warn,
            ));
        }
        SetupStep::DefaultFrom => {
            lines.push(Line::styled("API key saved.", app.ui_theme.success));
            lines.push(Line::from(
                "Default From address, e.g. You <you@yourdomain.com>",
            ));
            lines.push(Line::styled(
                "Optional. Press Enter to skip.",
                app.ui_theme.muted,
            ));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("From: ", app.ui_theme.label_focus),
                Span::raw(setup.from_input.as_str()),
            ]));
            input = Some((format!("From: {}", setup.from_input), lines.len() - 1));
        }
    }
    if let Some(err) = &setup.error {
        lines.push(Line::from(""));
        lines.push(Line::styled(err.clone(), app.ui_theme.error));
    }
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(app.ui_theme.base)
            .wrap(Wrap { trim: false }),
        inner,
    );
    if let Some((text, row)) = input {
        set_cursor_at_end(frame, inner, &text, row);
    }
}

pub(crate) fn render_menu(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let popup = centered_rect(60, 60, area);
    let block = panel(app, "HYPERMAIL");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let lines: Vec<Line> = MENU_ITEMS
        .iter()
        .enumerate()
        .map(|(idx, (key, label, desc))| {
            let row_style = if idx == app.menu_index {
                app.ui_theme.focus_bg
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!(" [{}] ", key), app.ui_theme.hotkey),
                Span::raw(format!("{:<10}", label)),
                Span::styled(format!(" {}", desc), app.ui_theme.muted),
            ])
            .style(row_style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).style(app.ui_theme.base), inner);
}

fn search_line<T>(app: &App, view: &ListView<T>) -> Line<'static> {
    match view.mode {
        ListMode::Searching => Line::from(vec![
            Span::styled("Search: ", app.ui_theme.label_focus),
            Span::raw(format!("{}_", view.query)),
        ]),
        _ if !view.query.is_empty() => Line::from(vec![
            Span::styled("Search: ", app.ui_theme.label),
            Span::raw(view.query.clone()),
            Span::styled("  (Esc clears)", app.ui_theme.muted),
        ]),
        _ => Line::styled("/ to search", app.ui_theme.muted),
    }
}

fn list_footer<T>(view: &ListView<T>) -> String {
    format!(
        "{} of {}  Page {}/{}",
        view.filtered_count,
        view.total,
        view.page + 1,
        view.page_count.max(1)
    )
}

struct ListFrame<'a> {
    title: String,
    header: &'a [&'a str],
    widths: &'a [Constraint],
    empty: &'a str,
    status: Option<Line<'static>>,
    footer_extra: Option<String>,
}

fn render_list<T>(
    frame: &mut ratatui::Frame,
    area: Rect,
    app: &App,
    view: &ListView<T>,
    opts: ListFrame<'_>,
    row: impl Fn(&T) -> (Vec<String>, Style),
) {
    let block = panel(app, opts.title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(search_line(app, view)).style(app.ui_theme.base),
        rows[0],
    );

    if view.visible.is_empty() {
        let text = if view.query.is_empty() {
            opts.empty.to_string()
        } else {
            format!("No matches for \"{}\"", view.query)
        };
        frame.render_widget(Paragraph::new(text).style(app.ui_theme.muted), rows[1]);
    } else {
        let table_rows: Vec<Row> = view
            .visible
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let (cells, style) = row(item);
                let style = if idx == view.selection {
                    style.patch(app.ui_theme.focus_bg)
                } else {
                    style
                };
                Row::new(cells).style(style)
            })
            .collect();
        let header = Row::new(opts.header.to_vec()).style(app.ui_theme.table_header);
        let table = Table::new(table_rows, opts.widths.to_vec())
            .header(header)
            .style(app.ui_theme.base);
        frame.render_widget(table, rows[1]);
    }

    if let Some(status) = opts.status {
        frame.render_widget(Paragraph::new(status), rows[2]);
    }
    let mut footer = list_footer(view);
    if let Some(extra) = opts.footer_extra {
        footer.push_str("  ");
        footer.push_str(&extra);
    }
    frame.render_widget(Paragraph::new(footer).style(app.ui_theme.label), rows[3]);
}

fn remote_status(app: &App, remote: &RemoteList) -> Option<Line<'static>> {
    if remote.loading {
        return Some(Line::styled(
            format!("{} Loading {}...", spinner(app), remote.folder.label()),
            app.ui_theme.warn,
        ));
    }
    remote.error.as_ref().map(|err| {
        Line::styled(
            format!("Error: {}  (r to retry)", err),
            app.ui_theme.error,
        )
    })
}

pub(crate) fn render_remote_list(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let remote = if app.mode == Mode::Sent {
        &app.sent
    } else {
        &app.inbox
    };
    if let Some(view) = &remote.detail {
        render_message_detail(frame, area, app, remote.folder, view);
        return;
    }
    let view = remote.list.view();
    match remote.folder {
        Folder::Inbox => {
            let opts = ListFrame {
                title: format!("INBOX ({})", view.total),
                header: &["", "From", "Subject", "Date"],
                widths: &[
                    Constraint::Length(1),
                    Constraint::Percentage(30),
                    Constraint::Min(10),
                    Constraint::Length(16),
                ],
                empty: if remote.loading { "" } else { "No emails" },
                status: remote_status(app, remote),
                footer_extra: Some(format!("{} unread", app.unread_count())),
            };
            render_list(frame, area, app, &view, opts, |m| {
                let unread = !app.read_ids.contains(&m.id);
                let style = if unread {
                    app.ui_theme.unread.add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let subject = if m.subject.is_empty() {
                    "(no subject)".to_string()
                } else {
                    m.subject.clone()
                };
                (
                    vec![
                        if unread { "*" } else { " " }.to_string(),
                        truncate_label(&m.from, 40),
                        subject,
                        m.display_date(),
                    ],
                    style,
                )
            });
        }
        Folder::Sent => {
            let opts = ListFrame {
                title: format!("SENT ({})", view.total),
                header: &["To", "Subject", "Date", "Status"],
                widths: &[
                    Constraint::Percentage(30),
                    Constraint::Min(10),
                    Constraint::Length(16),
                    Constraint::Length(12),
                ],
                empty: if remote.loading { "" } else { "No sent emails" },
                status: remote_status(app, remote),
                footer_extra: None,
            };
            render_list(frame, area, app, &view, opts, |m| {
                (
                    vec![
                        truncate_label(&m.to_line(), 40),
                        m.subject.clone(),
                        m.display_date(),
                        m.last_event.clone().unwrap_or_default(),
                    ],
                    Style::default(),
                )
            });
        }
    }
}

fn render_message_detail(
    frame: &mut ratatui::Frame,
    area: Rect,
    app: &App,
    folder: Folder,
    view: &MessageView,
) {
    let message = view.message.as_ref().unwrap_or(&view.summary);
    let block = panel(app, folder.label().to_uppercase());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<9}", label), app.ui_theme.label),
            Span::raw(value),
        ])
    };
    let mut lines = vec![
        header("From:", message.from.clone()),
        header("To:", message.to_line()),
        header("Subject:", message.subject.clone()),
        header("Date:", message.display_date()),
    ];
    if let Some(event) = &message.last_event {
        lines.push(header("Status:", event.clone()));
    }
    lines.push(Line::styled(
        "-".repeat(inner.width as usize),
        app.ui_theme.border,
    ));

    if let Some(display) = &view.display {
        lines.extend(display.text.lines().map(|l| Line::from(l.to_string())));
        if !display.links.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::styled("Links:", app.ui_theme.label));
            for (idx, link) in display.links.iter().enumerate() {
                lines.push(Line::from(vec![
                    Span::styled(format!("[{}] ", idx + 1), app.ui_theme.hotkey),
                    Span::raw(link.clone()),
                ]));
            }
        }
    } else if view.loading {
        lines.push(Line::styled(
            format!("{} Loading message...", spinner(app)),
            app.ui_theme.warn,
        ));
    }
    if let Some(err) = &view.error {
        lines.push(Line::styled(format!("Error: {}", err), app.ui_theme.error));
    }

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(app.ui_theme.base)
            .wrap(Wrap { trim: false })
            .scroll((view.scroll, 0)),
        inner,
    );
}

pub(crate) fn render_drafts(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let view = app.drafts.view();
    let opts = ListFrame {
        title: format!("DRAFTS ({})", view.total),
        header: &["To", "Subject", "Saved"],
        widths: &[
            Constraint::Percentage(35),
            Constraint::Min(10),
            Constraint::Length(16),
        ],
        empty: "No drafts",
        status: None,
        footer_extra: None,
    };
    render_list(frame, area, app, &view, opts, |d| {
        let saved = d.updated_at.as_deref().unwrap_or(&d.created_at);
        (
            vec![
                if d.to.is_empty() {
                    "(no recipient)".to_string()
                } else {
                    truncate_label(&d.to, 40)
                },
                if d.subject.is_empty() {
                    "(no subject)".to_string()
                } else {
                    d.subject.clone()
                },
                saved.chars().take(16).collect::<String>().replace('T', " "),
            ],
            Style::default(),
        )
    });
}

pub(crate) fn render_contacts(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let view = app.contacts.view();
    let title = if app.picking_contact {
        format!("PICK A CONTACT ({})", view.total)
    } else {
        format!("CONTACTS ({})", view.total)
    };
    let opts = ListFrame {
        title,
        header: &["Name", "Email"],
        widths: &[Constraint::Percentage(40), Constraint::Min(10)],
        empty: "No contacts. Press a to add one.",
        status: None,
        footer_extra: None,
    };
    render_list(frame, area, app, &view, opts, |c| {
        (vec![c.name.clone(), c.email.clone()], Style::default())
    });
}

/// Saturates at `u16::MAX` for very long text.
fn line_rows(text: &str) -> u16 {
    u16::try_from(text.split('\n').count()).unwrap_or(u16::MAX)
}

pub(crate) fn render_compose(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let compose = &app.compose;
    let mut title = match compose.mode {
        ComposeMode::New => "NEW EMAIL".to_string(),
        ComposeMode::Reply => "REPLY".to_string(),
        ComposeMode::Forward => "FORWARD".to_string(),
    };
    if compose.draft_id.is_some() {
        title.push_str("  [draft]");
    }
    let block = panel(app, title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    let label_width = 10;
    for (idx, field) in [ComposeField::From, ComposeField::To, ComposeField::Subject]
        .into_iter()
        .enumerate()
    {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(label_width), Constraint::Min(1)])
            .split(rows[idx]);
        let style = if compose.focus == field {
            app.ui_theme.label_focus
        } else {
            app.ui_theme.label
        };
        frame.render_widget(
            Paragraph::new(format!("{}:", field.label())).style(style),
            cols[0],
        );
        frame.render_widget(
            Paragraph::new(compose.form.get(field)).style(app.ui_theme.base),
            cols[1],
        );
        if compose.focus == field && compose.status == ComposeStatus::Editing {
            set_cursor_at_end(frame, cols[1], compose.form.get(field), 0);
        }
    }
    frame.render_widget(
        Paragraph::new("-".repeat(inner.width as usize)).style(app.ui_theme.border),
        rows[3],
    );

    let body = compose.form.get(ComposeField::Body);
    let body_rows = line_rows(body);
    let scroll = body_rows.saturating_sub(rows[4].height.max(1));
    let body_style = if compose.focus == ComposeField::Body {
        app.ui_theme.base
    } else {
        app.ui_theme.base.patch(app.ui_theme.muted)
    };
    frame.render_widget(
        Paragraph::new(body).style(body_style).scroll((scroll, 0)),
        rows[4],
    );
    if compose.focus == ComposeField::Body && compose.status == ComposeStatus::Editing {
        let last = body.rsplit('\n').next().unwrap_or_default();
        let row = body_rows.saturating_sub(1).saturating_sub(scroll) as usize;
        set_cursor_at_end(frame, rows[4], last, row);
    }

    let status = if compose.status == ComposeStatus::Sending {
        Line::styled(format!("{} Sending...", spinner(app)), app.ui_theme.warn)
    } else if let Some(err) = &compose.error {
        Line::styled(err.clone(), app.ui_theme.error)
    } else {
        Line::styled(
            format!("{} recipient(s)", compose.form.recipients().len()),
            app.ui_theme.muted,
        )
    };
    frame.render_widget(Paragraph::new(status), rows[5]);
}

pub(crate) fn render_settings(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let settings = &app.settings;
    let block = panel(app, "SETTINGS");
    let inner = block.inner(columns[0]);
    frame.render_widget(block, columns[0]);

    let mut lines = Vec::new();
    let mut cursor: Option<(String, usize)> = None;
    for field in SettingField::ALL {
        let focused = settings.field == field;
        let style = if focused {
            app.ui_theme.label_focus
        } else {
            app.ui_theme.label
        };
        lines.push(Line::styled(field.label(), style));
        let raw = settings.draft.get(field).unwrap_or_default();
        let value = if field.masked() {
            mask(raw)
        } else {
            raw.to_string()
        };
        if field.multiline() {
            lines.extend(value.split('\n').map(|l| Line::from(format!("  {}", l))));
        } else {
            lines.push(Line::from(format!("  {}", value)));
        }
        if focused {
            let last = value.rsplit('\n').next().unwrap_or_default();
            cursor = Some((format!("  {}", last), lines.len() - 1));
        }
        lines.push(Line::from(""));
    }
    if settings.pending_key.is_some() {
        lines.push(Line::styled(
            format!("{} Validating API key...", spinner(app)),
            app.ui_theme.warn,
        ));
    } else if let Some(err) = &settings.error {
        lines.push(Line::styled(err.clone(), app.ui_theme.error));
    } else if settings.saved {
        lines.push(Line::styled(
            "Settings saved! Press Esc, q or Enter to return.",
            app.ui_theme.success,
        ));
    }
    frame.render_widget(
        Paragraph::new(Text::from(lines)).style(app.ui_theme.base),
        inner,
    );
    if let Some((text, row)) = cursor {
        if settings.pending_key.is_none() && !settings.saved {
            set_cursor_at_end(frame, inner, &text, row);
        }
    }

    render_account(frame, columns[1], app);
}

fn render_account(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let block = panel(app, "ACCOUNT");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::styled("Domains", app.ui_theme.table_header)];
    if app.settings.account_loading && app.domains.is_empty() {
        lines.push(Line::styled(
            format!("{} Loading...", spinner(app)),
            app.ui_theme.warn,
        ));
    } else if app.domains.is_empty() {
        lines.push(Line::styled("  (none)", app.ui_theme.muted));
    }
    for domain in &app.domains {
        let style = if domain.is_verified() {
            app.ui_theme.success
        } else {
            app.ui_theme.muted
        };
        let region = domain
            .region
            .as_deref()
            .map(|r| format!(" [{}]", r))
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::raw(format!("  {}", domain.name)),
            Span::styled(format!("  {}{}", domain.status, region), style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled("API keys", app.ui_theme.table_header));
    if app.api_keys.is_empty() && !app.settings.account_loading {
        lines.push(Line::styled("  (none)", app.ui_theme.muted));
    }
    for key in &app.api_keys {
        let name = if key.name.is_empty() { &key.id } else { &key.name };
        lines.push(Line::from(format!("  {}", truncate_label(name, 40))));
    }
    if let Some(err) = &app.account_error {
        lines.push(Line::from(""));
        lines.push(Line::styled(err.clone(), app.ui_theme.error));
    }
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(app.ui_theme.base)
            .wrap(Wrap { trim: false }),
        inner,
    );
}

const HELP_SECTIONS: [(&str, &[(&str, &str)]); 5] = [
    (
        "Menu",
        &[
            ("c i t d o s", "compose, inbox, sent, drafts, contacts, settings"),
            ("j/k Enter", "move and open"),
            ("q", "quit"),
        ],
    ),
    (
        "Lists",
        &[
            ("j/k", "move selection"),
            ("n/p", "next and previous page"),
            ("/", "search, Enter keeps the query, Esc clears it"),
            ("Enter", "open"),
            ("d", "delete (asks y/n)"),
            ("r", "refresh inbox or sent"),
            ("a", "inbox: mark all read, contacts: add"),
            ("Esc/q", "clear search, then go back"),
        ],
    ),
    (
        "Message",
        &[
            ("j/k PgUp/PgDn", "scroll"),
            ("r", "reply"),
            ("f", "forward"),
            ("d", "delete from inbox (local archive)"),
        ],
    ),
    (
        "Compose",
        &[
            ("Tab/Shift+Tab", "next and previous field"),
            ("Ctrl+S", "send"),
            ("Ctrl+D", "save draft"),
            ("Ctrl+T", "insert a contact"),
            ("Esc", "back"),
        ],
    ),
    (
        "Settings",
        &[
            ("Tab/Shift+Tab", "next and previous field"),
            ("Ctrl+S", "save, a new API key is checked first"),
        ],
    ),
];

pub(crate) fn render_help(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let block = panel(app, "KEYBOARD SHORTCUTS");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    for (section, keys) in HELP_SECTIONS {
        lines.push(Line::styled(section, app.ui_theme.table_header));
        for (key, desc) in keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<16}", key), app.ui_theme.hotkey),
                Span::raw(*desc),
            ]));
        }
        lines.push(Line::from(""));
    }
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(app.ui_theme.base)
            .wrap(Wrap { trim: false }),
        inner,
    );
}

#[cfg(test)]
mod tests {
    use super::line_rows;

    #[test]
    fn line_rows_saturates() {
        assert_eq!(line_rows(""), 1);
        assert_eq!(line_rows("a\nb\n"), 3);
        let long = "\n".repeat(70_000);
        assert_eq!(line_rows(&long), u16::MAX);
    }
}
