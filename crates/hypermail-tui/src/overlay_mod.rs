use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::{App, ContactForm, Mode, centered_rect, truncate_label};

pub(crate) fn render_overlays(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    match app.mode {
        Mode::Inbox => {
            let subject = match &app.inbox.detail {
                Some(view) if view.confirm_archive => Some(view.summary.subject.as_str()),
                Some(_) => None,
                None => app.inbox.list.pending_delete().map(|m| m.subject.as_str()),
            };
            if let Some(subject) = subject {
                render_confirm_delete_overlay(
                    frame,
                    area,
                    app,
                    "Delete this email?",
                    subject,
                    Some("It is hidden from the inbox on this machine only."),
                );
            }
        }
        Mode::Drafts => {
            if let Some(draft) = app.drafts.pending_delete() {
                render_confirm_delete_overlay(
                    frame,
                    area,
                    app,
                    "Delete this draft?",
                    &draft.subject,
                    None,
                );
            }
        }
        Mode::Contacts => {
            if let Some(form) = &app.contact_form {
                render_contact_form_overlay(frame, area, app, form);
            } else if let Some(contact) = app.contacts.pending_delete() {
                render_confirm_delete_overlay(
                    frame,
                    area,
                    app,
                    "Delete this contact?",
                    &contact.display(),
                    None,
                );
            }
        }
        _ => {}
    }
}

fn render_confirm_delete_overlay(
    frame: &mut ratatui::Frame,
    area: Rect,
    app: &App,
    question: &str,
    target: &str,
    note: Option<&str>,
) {
    let popup = centered_rect(50, 30, area);
    frame.render_widget(Clear, popup);

    let width = popup.width.saturating_sub(2) as usize;
    let target = if target.is_empty() { "(untitled)" } else { target };
    let mut lines = vec![
        Line::from(question.to_string()),
        Line::styled(truncate_label(target, width), app.ui_theme.label_focus),
    ];
    if let Some(note) = note {
        lines.push(Line::styled(note.to_string(), app.ui_theme.muted));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("y confirm"));
    lines.push(Line::from("n cancel"));
    lines.push(Line::from("Esc close"));

    let block = Block::default()
        .borders(Borders::ALL)
        .title("CONFIRM")
        .style(app.ui_theme.base)
        .border_style(app.ui_theme.border);
    let paragraph = Paragraph::new(Text::from(lines))
        .style(app.ui_theme.base)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}

fn render_contact_form_overlay(
    frame: &mut ratatui::Frame,
    area: Rect,
    app: &App,
    form: &ContactForm,
) {
    let popup = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("ADD CONTACT")
        .style(app.ui_theme.base)
        .border_style(app.ui_theme.border);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    let fields = [("Name:  ", &form.name, !form.on_email), ("Email: ", &form.email, form.on_email)];
    for (idx, (label, value, focused)) in fields.into_iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(7), Constraint::Min(1)])
            .split(rows[idx]);
        let style = if focused {
            app.ui_theme.label_focus
        } else {
            app.ui_theme.label
        };
        frame.render_widget(Paragraph::new(label).style(style), cols[0]);
        frame.render_widget(
            Paragraph::new(value.as_str()).style(app.ui_theme.base),
            cols[1],
        );
        if focused {
            let col = unicode_width::UnicodeWidthStr::width(value.as_str()) as u16;
            let x = cols[1].x + col.min(cols[1].width.saturating_sub(1));
            frame.set_cursor_position((x, cols[1].y));
        }
    }
    if let Some(err) = &form.error {
        frame.render_widget(
            Paragraph::new(err.as_str())
                .style(app.ui_theme.error)
                .wrap(Wrap { trim: false }),
            rows[3],
        );
    }
}
