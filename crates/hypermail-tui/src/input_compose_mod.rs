use crossterm::event::{KeyCode, KeyEvent};

use hypermail_core::{ComposeContext, ComposeField, ComposeForm, ComposeMode, Draft};
use hypermail_mail::{MailCommand, SendRequest};

use super::{App, ComposeState, ComposeStatus, Mode, apply_text_key, is_ctrl, log_debug};

impl App {
    pub(crate) fn start_compose(&mut self, ctx: Option<ComposeContext>, return_to: Mode) {
        let default_from = self.store.default_from();
        let signature = self.store.signature();
        let form = ComposeForm::from_context(ctx.as_ref(), default_from.as_deref(), signature.as_deref());
        let mode = ctx.map(|c| c.mode).unwrap_or_default();
        self.compose = ComposeState {
            mode,
            focus: form.initial_focus(mode),
            form,
            draft_id: None,
            status: ComposeStatus::Editing,
            error: None,
            return_to,
        };
        self.mode = Mode::Compose;
    }

    pub(crate) fn start_compose_from_draft(&mut self, draft: &Draft) {
        let default_from = self.store.default_from();
        let form = ComposeForm::from_draft(draft, default_from.as_deref());
        let focus = if form.to.is_empty() {
            ComposeField::To
        } else {
            ComposeField::Body
        };
        self.compose = ComposeState {
            mode: ComposeMode::New,
            form,
            focus,
            draft_id: Some(draft.id.clone()),
            status: ComposeStatus::Editing,
            error: None,
            return_to: Mode::Drafts,
        };
        self.mode = Mode::Compose;
    }

    fn leave_compose(&mut self) {
        let target = self.compose.return_to;
        self.compose = ComposeState::empty();
        match target {
            Mode::Drafts | Mode::Contacts | Mode::Menu => self.enter_mode(target),
            // Back to the message the reply started from.
            _ => self.mode = target,
        }
    }

    pub(crate) fn on_key_compose(&mut self, key: KeyEvent) {
        if self.compose.status == ComposeStatus::Sending {
            return;
        }
        if is_ctrl(key, 's') {
            self.send_compose();
            return;
        }
        if is_ctrl(key, 'd') {
            self.save_compose_draft();
            return;
        }
        if is_ctrl(key, 't') {
            self.picking_contact = true;
            self.enter_mode(Mode::Contacts);
            return;
        }
        if key.code == KeyCode::Esc {
            self.leave_compose();
            return;
        }
        let compose = &mut self.compose;
        match key.code {
            KeyCode::Tab | KeyCode::Down => compose.focus = compose.focus.next(),
            KeyCode::BackTab | KeyCode::Up => compose.focus = compose.focus.prev(),
            KeyCode::Enter if compose.focus == ComposeField::Body => {
                compose.form.body.push('\n');
            }
            KeyCode::Enter => compose.focus = compose.focus.next(),
            _ => {
                if apply_text_key(compose.form.get_mut(compose.focus), key) {
                    compose.error = None;
                }
            }
        }
    }

    fn send_compose(&mut self) {
        if let Err(err) = self.compose.form.validate() {
            self.compose.error = Some(err.to_string());
            return;
        }
        let form = &self.compose.form;
        let request = SendRequest {
            from: form.from.trim().to_string(),
            to: form.recipients(),
            subject: form.subject.clone(),
            text: Some(form.body.clone()),
            html: None,
        };
        if self.send_command(MailCommand::Send(request)) {
            self.compose.status = ComposeStatus::Sending;
            self.compose.error = None;
        } else {
            self.compose.error = self.status_message.take();
        }
    }

    /// Sent successfully: a draft that was being edited is consumed.
    pub(crate) fn finish_send(&mut self) {
        let message = match self.compose.mode {
            ComposeMode::Reply => "Reply sent successfully!",
            ComposeMode::Forward => "Email forwarded successfully!",
            ComposeMode::New => "Email sent successfully!",
        };
        if let Some(id) = self.compose.draft_id.take() {
            if let Err(err) = self.store.delete_draft(&id) {
                log_debug(&format!("delete sent draft failed: {:#}", err));
            }
        }
        self.leave_compose();
        self.status_message = Some(message.to_string());
    }

    fn save_compose_draft(&mut self) {
        let fields = self.compose.form.to_draft_fields();
        let result = match self.compose.draft_id.clone() {
            Some(id) => self.store.update_draft(&id, fields.clone()).and_then(|found| {
                if found {
                    Ok(id)
                } else {
                    self.store.save_draft(fields).map(|d| d.id)
                }
            }),
            None => self.store.save_draft(fields).map(|d| d.id),
        };
        match result {
            Ok(id) => {
                self.compose.draft_id = Some(id);
                self.compose.error = None;
                self.status_message = Some("Draft saved".to_string());
            }
            Err(err) => {
                log_debug(&format!("save draft failed: {:#}", err));
                self.compose.error = Some(format!("Could not save draft: {}", err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use hypermail_core::{ComposeField, LocalStore};
    use hypermail_mail::MailEvent;

    use crate::{App, ComposeStatus, Mode, UiTheme};

    fn temp_app(tag: &str) -> App {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path: PathBuf = std::env::temp_dir()
            .join(format!("hypermail-compose-{}-{}-{}", tag, std::process::id(), ts))
            .join("config.json");
        let store = LocalStore::new(path);
        store.set_default_from("me@example.com").unwrap();
        store.set_signature("Me").unwrap();
        let rt = Arc::new(tokio::runtime::Runtime::new().unwrap());
        App::new(store, rt, UiTheme::from_name("default"))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut App, c: char) {
        app.on_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn new_compose_prefills_sender_and_signature() {
        let mut app = temp_app("prefill");
        app.start_compose(None, Mode::Menu);
        assert_eq!(app.compose.form.from, "me@example.com");
        assert_eq!(app.compose.form.body, "\n\n--\nMe");
        assert_eq!(app.compose.focus, ComposeField::To);
    }

    #[test]
    fn send_requires_subject() {
        let mut app = temp_app("required");
        app.start_compose(None, Mode::Menu);
        type_str(&mut app, "bob@example.com");
        ctrl(&mut app, 's');
        assert_eq!(app.compose.status, ComposeStatus::Editing);
        assert!(app.compose.error.is_some());
    }

    #[test]
    fn draft_saves_then_updates_in_place() {
        let mut app = temp_app("draft");
        app.start_compose(None, Mode::Menu);
        type_str(&mut app, "bob@example.com");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Plans");
        ctrl(&mut app, 'd');
        let first = app.compose.draft_id.clone().unwrap();
        type_str(&mut app, "!");
        ctrl(&mut app, 'd');
        assert_eq!(app.compose.draft_id.as_deref(), Some(first.as_str()));
        let drafts = app.store.list_drafts();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].subject, "Plans!");
        assert_eq!(drafts[0].from, "me@example.com");
    }

    #[test]
    fn sending_a_draft_deletes_it() {
        let mut app = temp_app("senddraft");
        app.start_compose(None, Mode::Menu);
        type_str(&mut app, "bob@example.com");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "Hi");
        ctrl(&mut app, 'd');
        app.compose.status = ComposeStatus::Sending;
        app.on_event(MailEvent::SendCompleted {
            id: "e1".to_string(),
        });
        assert!(app.store.list_drafts().is_empty());
        assert_eq!(app.mode, Mode::Menu);
        assert_eq!(app.status_message.as_deref(), Some("Email sent successfully!"));
    }

    #[test]
    fn failed_send_returns_to_editing() {
        let mut app = temp_app("sendfail");
        app.start_compose(None, Mode::Menu);
        app.compose.status = ComposeStatus::Sending;
        app.on_event(MailEvent::SendFailed {
            reason: "bad from".to_string(),
        });
        assert_eq!(app.mode, Mode::Compose);
        assert_eq!(app.compose.status, ComposeStatus::Editing);
        assert!(app.compose.error.as_deref().unwrap().contains("bad from"));
    }
}
