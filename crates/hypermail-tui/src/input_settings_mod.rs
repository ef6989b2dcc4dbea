use crossterm::event::{KeyCode, KeyEvent};

use hypermail_core::SettingField;
use hypermail_mail::MailCommand;

use super::{App, Mode, apply_text_key, is_ctrl, log_debug};

impl App {
    pub(crate) fn open_settings(&mut self) {
        self.settings.field = SettingField::DefaultFrom;
        self.settings.draft = self.store.load();
        self.settings.pending_key = None;
        self.settings.saved = false;
        self.settings.error = None;
        self.account_error = None;
        let domains = self.send_command(MailCommand::ListDomains);
        let keys = self.send_command(MailCommand::ListApiKeys);
        self.settings.account_loading = domains || keys;
    }

    pub(crate) fn on_key_settings(&mut self, key: KeyEvent) {
        if self.settings.pending_key.is_some() {
            return;
        }
        if self.settings.saved {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')
            ) {
                self.enter_mode(Mode::Menu);
                return;
            }
            self.settings.saved = false;
        }
        if is_ctrl(key, 's') {
            self.save_settings();
            return;
        }
        if key.code == KeyCode::Esc {
            self.enter_mode(Mode::Menu);
            return;
        }
        let settings = &mut self.settings;
        match key.code {
            KeyCode::Tab | KeyCode::Down => settings.field = settings.field.next(),
            KeyCode::BackTab | KeyCode::Up => settings.field = settings.field.prev(),
            KeyCode::Enter if settings.field.multiline() => {
                let mut value = settings.draft.get(settings.field).unwrap_or_default().to_string();
                value.push('\n');
                settings.draft.set_raw(settings.field, value);
            }
            KeyCode::Enter => settings.field = settings.field.next(),
            _ => {
                let mut value = settings.draft.get(settings.field).unwrap_or_default().to_string();
                if apply_text_key(&mut value, key) {
                    settings.draft.set_raw(settings.field, value);
                    settings.error = None;
                }
            }
        }
    }

    /// A changed API key is validated before anything is written.
    fn save_settings(&mut self) {
        let candidate = self
            .settings
            .draft
            .get(SettingField::ApiKey)
            .unwrap_or_default()
            .trim()
            .to_string();
        if candidate.is_empty() {
            self.settings.error = Some("API key cannot be empty".to_string());
            return;
        }
        if self.store.api_key().as_deref() == Some(candidate.as_str()) {
            self.commit_settings(None);
            return;
        }
        if self.send_command(MailCommand::ValidateKey {
            candidate: candidate.clone(),
        }) {
            self.settings.pending_key = Some(candidate);
            self.settings.error = None;
        } else {
            self.settings.error = self.status_message.take();
        }
    }

    pub(crate) fn commit_settings(&mut self, new_key: Option<&str>) {
        let mut doc = self.store.load();
        for field in [SettingField::DefaultFrom, SettingField::Signature] {
            doc.set(field, self.settings.draft.get(field).map(str::to_string));
        }
        if let Some(key) = new_key {
            doc.set(SettingField::ApiKey, Some(key.to_string()));
        }
        match self.store.save(&doc) {
            Ok(()) => {
                self.settings.draft = doc;
                self.settings.saved = true;
                self.settings.error = None;
                if let Some(key) = new_key {
                    self.restart_engine(key);
                    let domains = self.send_command(MailCommand::ListDomains);
                    let keys = self.send_command(MailCommand::ListApiKeys);
                    self.settings.account_loading = domains || keys;
                }
            }
            Err(err) => {
                log_debug(&format!("save settings failed: {:#}", err));
                self.settings.error = Some(format!("Could not save settings: {}", err));
            }
        }
    }
}
