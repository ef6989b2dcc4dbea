use crossterm::event::{KeyCode, KeyEvent};

use hypermail_core::{ComposeContext, ComposeMode, ContactFields, ListCommand, ListKey, ListOutcome};
use hypermail_mail::{Folder, MailCommand, RemoteMessage};

use super::{App, ContactForm, MessageView, Mode, apply_text_key, is_ctrl, list_key, log_debug};

impl App {
    fn current_folder(&self) -> Folder {
        if self.mode == Mode::Sent {
            Folder::Sent
        } else {
            Folder::Inbox
        }
    }

    pub(crate) fn on_key_remote(&mut self, key: KeyEvent) {
        let folder = self.current_folder();
        if self.remote_list_mut(folder).detail.is_some() {
            self.on_key_detail(folder, key);
            return;
        }
        let Some(list_key) = list_key(key) else {
            return;
        };
        match self.remote_list_mut(folder).list.handle_key(list_key) {
            ListOutcome::Handled => {}
            ListOutcome::Command(ListCommand::Open(message)) => self.open_detail(folder, message),
            ListOutcome::Command(ListCommand::Delete(message)) => self.archive_message(&message.id),
            ListOutcome::Command(ListCommand::Leave) => self.enter_mode(Mode::Menu),
            ListOutcome::Unhandled(ListKey::Char('r')) => self.refresh_remote(folder),
            ListOutcome::Unhandled(ListKey::Char('a')) if folder == Folder::Inbox => {
                self.mark_all_read()
            }
            ListOutcome::Unhandled(_) => {}
        }
    }

    fn open_detail(&mut self, folder: Folder, summary: RemoteMessage) {
        let id = summary.id.clone();
        self.remote_list_mut(folder).detail = Some(MessageView {
            summary,
            message: None,
            display: None,
            loading: true,
            error: None,
            scroll: 0,
            confirm_archive: false,
        });
        let cmd = match folder {
            Folder::Inbox => MailCommand::FetchReceived { id },
            Folder::Sent => MailCommand::FetchSent { id },
        };
        if !self.send_command(cmd) {
            if let Some(view) = self.remote_list_mut(folder).detail.as_mut() {
                view.loading = false;
                view.error = Some("Could not request message".to_string());
            }
        }
    }

    fn on_key_detail(&mut self, folder: Folder, key: KeyEvent) {
        let Some(view) = self.remote_list_mut(folder).detail.as_mut() else {
            return;
        };
        if view.confirm_archive {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    let id = view.summary.id.clone();
                    self.archive_message(&id);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    view.confirm_archive = false;
                }
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => {
                self.remote_list_mut(folder).detail = None;
            }
            KeyCode::Down | KeyCode::Char('j') => view.scroll = view.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => view.scroll = view.scroll.saturating_sub(1),
            KeyCode::PageDown => view.scroll = view.scroll.saturating_add(10),
            KeyCode::PageUp => view.scroll = view.scroll.saturating_sub(10),
            KeyCode::Char('r') if folder == Folder::Inbox => {
                let ctx = compose_context(view, ComposeMode::Reply);
                self.start_compose(Some(ctx), self.mode);
            }
            KeyCode::Char('f') => {
                let ctx = compose_context(view, ComposeMode::Forward);
                self.start_compose(Some(ctx), self.mode);
            }
            KeyCode::Char('d') if folder == Folder::Inbox => view.confirm_archive = true,
            _ => {}
        }
    }

    /// Local-only delete: the id joins the archived set and leaves the list.
    fn archive_message(&mut self, id: &str) {
        match self.store.archive(id) {
            Ok(()) => {
                self.inbox.list.remove_where(|m| m.id == id);
                self.inbox.detail = None;
                self.status_message = Some("Email archived".to_string());
            }
            Err(err) => {
                log_debug(&format!("archive failed: {:#}", err));
                if let Some(view) = self.inbox.detail.as_mut() {
                    view.confirm_archive = false;
                }
                self.status_message = Some(format!("Could not archive: {}", err));
            }
        }
    }

    fn mark_all_read(&mut self) {
        let ids: Vec<String> = self
            .inbox
            .list
            .filtered()
            .into_iter()
            .map(|m| m.id.clone())
            .collect();
        match self.store.mark_all_read(&ids) {
            Ok(added) => {
                self.read_ids.extend(ids);
                self.status_message = Some(format!("Marked {} as read", added));
            }
            Err(err) => {
                log_debug(&format!("mark all read failed: {:#}", err));
                self.status_message = Some(format!("Could not save read state: {}", err));
            }
        }
    }

    pub(crate) fn on_key_drafts(&mut self, key: KeyEvent) {
        let Some(list_key) = list_key(key) else {
            return;
        };
        match self.drafts.handle_key(list_key) {
            ListOutcome::Command(ListCommand::Open(draft)) => self.start_compose_from_draft(&draft),
            ListOutcome::Command(ListCommand::Delete(draft)) => match self.store.delete_draft(&draft.id)
            {
                Ok(_) => {
                    self.drafts.remove_where(|d| d.id == draft.id);
                    self.status_message = Some("Draft deleted".to_string());
                }
                Err(err) => {
                    log_debug(&format!("delete draft failed: {:#}", err));
                    self.status_message = Some(format!("Could not delete draft: {}", err));
                }
            },
            ListOutcome::Command(ListCommand::Leave) => self.enter_mode(Mode::Menu),
            ListOutcome::Handled | ListOutcome::Unhandled(_) => {}
        }
    }

    pub(crate) fn on_key_contacts(&mut self, key: KeyEvent) {
        if self.contact_form.is_some() {
            self.on_key_contact_form(key);
            return;
        }
        let Some(list_key) = list_key(key) else {
            return;
        };
        match self.contacts.handle_key(list_key) {
            ListOutcome::Command(ListCommand::Open(contact)) => {
                if self.picking_contact {
                    self.picking_contact = false;
                    self.compose.form.add_recipient(&contact.email);
                    self.mode = Mode::Compose;
                } else {
                    let ctx = ComposeContext {
                        to: Some(contact.email.clone()),
                        ..Default::default()
                    };
                    self.start_compose(Some(ctx), Mode::Contacts);
                }
            }
            ListOutcome::Command(ListCommand::Delete(contact)) => {
                match self.store.delete_contact(&contact.id) {
                    Ok(_) => {
                        self.contacts.remove_where(|c| c.id == contact.id);
                        self.status_message = Some("Contact deleted".to_string());
                    }
                    Err(err) => {
                        log_debug(&format!("delete contact failed: {:#}", err));
                        self.status_message = Some(format!("Could not delete contact: {}", err));
                    }
                }
            }
            ListOutcome::Command(ListCommand::Leave) => {
                if self.picking_contact {
                    self.picking_contact = false;
                    self.mode = Mode::Compose;
                } else {
                    self.enter_mode(Mode::Menu);
                }
            }
            ListOutcome::Unhandled(ListKey::Char('a')) => {
                self.contact_form = Some(ContactForm {
                    name: String::new(),
                    email: String::new(),
                    on_email: false,
                    error: None,
                });
            }
            ListOutcome::Handled | ListOutcome::Unhandled(_) => {}
        }
    }

    fn on_key_contact_form(&mut self, key: KeyEvent) {
        if is_ctrl(key, 's') {
            self.save_contact_form();
            return;
        }
        let Some(form) = self.contact_form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.contact_form = None,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.on_email = !form.on_email;
            }
            KeyCode::Enter => {
                if form.on_email {
                    self.save_contact_form();
                } else {
                    form.on_email = true;
                }
            }
            _ => {
                let target = if form.on_email {
                    &mut form.email
                } else {
                    &mut form.name
                };
                apply_text_key(target, key);
            }
        }
    }

    fn save_contact_form(&mut self) {
        let Some(form) = self.contact_form.as_mut() else {
            return;
        };
        let fields = ContactFields {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
        };
        if fields.name.is_empty() || fields.email.is_empty() {
            form.error = Some("Name and email are required".to_string());
            return;
        }
        if !fields.email.contains('@') {
            form.error = Some("Email address looks invalid".to_string());
            return;
        }
        match self.store.add_contact(fields) {
            Ok(contact) => {
                self.contact_form = None;
                self.contacts.refresh(self.store.list_contacts());
                self.status_message = Some(format!("Added {}", contact.display()));
            }
            Err(err) => {
                log_debug(&format!("add contact failed: {:#}", err));
                form.error = Some(format!("Could not save contact: {}", err));
            }
        }
    }
}

fn compose_context(view: &MessageView, mode: ComposeMode) -> ComposeContext {
    let message = view.message.as_ref().unwrap_or(&view.summary);
    let original_body = message
        .text
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| view.display.as_ref().map(|d| d.text.clone()));
    ComposeContext {
        mode,
        to: (mode == ComposeMode::Reply).then(|| message.from.clone()),
        subject: message.subject.clone(),
        original_body,
        original_from: Some(message.from.clone()),
        original_to: Some(message.to_line()).filter(|t| !t.is_empty()),
        original_date: Some(message.display_date()).filter(|d| !d.is_empty()),
    }
}
