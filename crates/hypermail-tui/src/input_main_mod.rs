use crossterm::event::{KeyCode, KeyEvent};

use hypermail_mail::MailCommand;

use super::{App, MENU_ITEMS, Mode, SetupStep, apply_text_key, is_ctrl, log_debug};

impl App {
    /// Returns true when the app should quit.
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> bool {
        if is_ctrl(key, 'c') {
            return true;
        }
        match self.mode {
            Mode::Setup => self.on_key_setup(key),
            Mode::Menu => return self.on_key_menu(key),
            Mode::Inbox | Mode::Sent => self.on_key_remote(key),
            Mode::Drafts => self.on_key_drafts(key),
            Mode::Contacts => self.on_key_contacts(key),
            Mode::Compose => self.on_key_compose(key),
            Mode::Settings => self.on_key_settings(key),
            Mode::Help => self.on_key_help(key),
        }
        false
    }

    fn activate_menu(&mut self, hotkey: char) -> bool {
        match hotkey {
            'c' => self.enter_mode(Mode::Compose),
            'i' => self.enter_mode(Mode::Inbox),
            't' => self.enter_mode(Mode::Sent),
            'd' => self.enter_mode(Mode::Drafts),
            'o' => {
                self.picking_contact = false;
                self.enter_mode(Mode::Contacts);
            }
            's' => self.enter_mode(Mode::Settings),
            '?' => self.enter_mode(Mode::Help),
            'q' => return true,
            _ => {}
        }
        false
    }

    fn on_key_menu(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_index = self.menu_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.menu_index + 1 < MENU_ITEMS.len() {
                    self.menu_index += 1;
                }
            }
            KeyCode::Enter => {
                let (hotkey, _, _) = MENU_ITEMS[self.menu_index];
                return self.activate_menu(hotkey);
            }
            KeyCode::Esc => return false,
            KeyCode::Char(c) => {
                if let Some(idx) = MENU_ITEMS.iter().position(|(k, _, _)| *k == c) {
                    self.menu_index = idx;
                    return self.activate_menu(c);
                }
            }
            _ => {}
        }
        false
    }

    fn on_key_help(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')
        ) {
            self.mode = self.help_return;
        }
    }

    fn on_key_setup(&mut self, key: KeyEvent) {
        match self.setup.step {
            SetupStep::ApiKey => match key.code {
                KeyCode::Enter => {
                    let candidate = self.setup.key_input.trim().to_string();
                    if candidate.is_empty() {
                        return;
                    }
                    if self.send_command(MailCommand::ValidateKey { candidate }) {
                        self.setup.error = None;
                        self.setup.step = SetupStep::Validating;
                    }
                }
                _ => {
                    apply_text_key(&mut self.setup.key_input, key);
                }
            },
            SetupStep::Validating => {}
            SetupStep::DefaultFrom => match key.code {
                KeyCode::Enter => {
                    let from = self.setup.from_input.trim().to_string();
                    if !from.is_empty() {
                        if let Err(err) = self.store.set_default_from(&from) {
                            log_debug(&format!("save default from failed: {:#}", err));
                            self.setup.error = Some(format!("Could not save: {}", err));
                            return;
                        }
                    }
                    self.setup.key_input.clear();
                    self.setup.from_input.clear();
                    self.setup.step = SetupStep::ApiKey;
                    self.setup.error = None;
                    self.mode = Mode::Menu;
                }
                _ => {
                    apply_text_key(&mut self.setup.from_input, key);
                }
            },
        }
    }
}
