use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use hypermail_content::display_body;
use hypermail_core::{
    ComposeField, ComposeForm, ComposeMode, ListModel, LocalStore, SettingField, log_debug,
};
use hypermail_mail::{Folder, MailCommand, MailEngine, MailEvent, RemoteMessage, ResendClient};

use super::{
    App, ComposeState, ComposeStatus, Mode, RemoteList, SPINNER_FRAMES, SettingsState,
    SetupState, SetupStep, UiTheme,
};

impl RemoteList {
    fn new(folder: Folder) -> Self {
        let mut list = ListModel::default();
        if folder == Folder::Sent {
            list.set_delete_enabled(false);
        }
        Self {
            folder,
            list,
            loading: false,
            error: None,
            detail: None,
        }
    }
}

impl ComposeState {
    pub(crate) fn empty() -> Self {
        Self {
            mode: ComposeMode::New,
            form: ComposeForm::default(),
            focus: ComposeField::To,
            draft_id: None,
            status: ComposeStatus::Editing,
            error: None,
            return_to: Mode::Menu,
        }
    }
}

impl App {
    pub(crate) fn new(
        store: LocalStore,
        runtime: Arc<tokio::runtime::Runtime>,
        ui_theme: UiTheme,
    ) -> Self {
        let api_key = store.api_key();
        let (engine, events) = start_engine(&runtime, api_key.as_deref().unwrap_or_default());
        let mode = if api_key.is_some() {
            Mode::Menu
        } else {
            Mode::Setup
        };
        let read_ids = store.read_ids().into_iter().collect();
        Self {
            mode,
            help_return: Mode::Menu,
            store,
            runtime,
            engine,
            events,
            ui_theme,
            last_tick: Instant::now(),
            spinner: 0,
            body_width: 80,
            status_message: None,
            menu_index: 0,
            setup: SetupState {
                step: SetupStep::ApiKey,
                key_input: String::new(),
                from_input: String::new(),
                error: None,
            },
            inbox: RemoteList::new(Folder::Inbox),
            sent: RemoteList::new(Folder::Sent),
            read_ids,
            drafts: ListModel::default(),
            contacts: ListModel::default(),
            contact_form: None,
            picking_contact: false,
            compose: ComposeState::empty(),
            settings: SettingsState {
                field: SettingField::DefaultFrom,
                draft: Default::default(),
                pending_key: None,
                saved: false,
                error: None,
                account_loading: false,
            },
            domains: Vec::new(),
            api_keys: Vec::new(),
            account_error: None,
        }
    }

    /// Replaces the engine after the API key changed. Events still in flight
    /// for the old key are dropped with its receiver.
    pub(crate) fn restart_engine(&mut self, api_key: &str) {
        let (engine, events) = start_engine(&self.runtime, api_key);
        self.engine = engine;
        self.events = events;
        self.inbox.list.refresh(Vec::new());
        self.sent.list.refresh(Vec::new());
        self.domains.clear();
        self.api_keys.clear();
        log_debug("mail engine restarted");
    }

    pub(crate) fn send_command(&mut self, cmd: MailCommand) -> bool {
        match self.engine.send(cmd) {
            Ok(()) => true,
            Err(err) => {
                self.status_message = Some(format!("Request not sent: {}", err));
                false
            }
        }
    }

    pub(crate) fn remote_list_mut(&mut self, folder: Folder) -> &mut RemoteList {
        match folder {
            Folder::Inbox => &mut self.inbox,
            Folder::Sent => &mut self.sent,
        }
    }

    pub(crate) fn refresh_remote(&mut self, folder: Folder) {
        let cmd = match folder {
            Folder::Inbox => MailCommand::ListReceived,
            Folder::Sent => MailCommand::ListSent,
        };
        if self.send_command(cmd) {
            let list = self.remote_list_mut(folder);
            list.loading = true;
            list.error = None;
        }
    }

    pub(crate) fn enter_mode(&mut self, mode: Mode) {
        self.status_message = None;
        match mode {
            Mode::Inbox => {
                self.inbox.detail = None;
                self.read_ids = self.store.read_ids().into_iter().collect();
                self.refresh_remote(Folder::Inbox);
            }
            Mode::Sent => {
                self.sent.detail = None;
                self.refresh_remote(Folder::Sent);
            }
            Mode::Drafts => {
                self.drafts.refresh(self.store.list_drafts());
            }
            Mode::Contacts => {
                self.contact_form = None;
                self.contacts.set_delete_enabled(!self.picking_contact);
                self.contacts.set_searching(false);
                self.contacts.set_query("");
                self.contacts.refresh(self.store.list_contacts());
            }
            Mode::Compose => self.start_compose(None, Mode::Menu),
            Mode::Settings => self.open_settings(),
            Mode::Help => {
                if self.mode != Mode::Help {
                    self.help_return = self.mode;
                }
            }
            Mode::Setup | Mode::Menu => {}
        }
        self.mode = mode;
    }

    pub(crate) fn drain_channels(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.on_event(event);
        }
    }

    pub(crate) fn on_tick(&mut self) {
        let busy = self.inbox.loading
            || self.sent.loading
            || self.setup.step == SetupStep::Validating
            || self.settings.pending_key.is_some()
            || self.compose.status == ComposeStatus::Sending;
        if busy {
            self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
        } else {
            self.spinner = 0;
        }
    }

    pub(crate) fn on_event(&mut self, event: MailEvent) {
        match event {
            MailEvent::MessagesLoaded { folder, result } => {
                let archived: HashSet<String> = match folder {
                    Folder::Inbox => self.store.archived_ids().into_iter().collect(),
                    Folder::Sent => HashSet::new(),
                };
                let list = self.remote_list_mut(folder);
                list.loading = false;
                match result {
                    Ok(messages) => {
                        let messages: Vec<RemoteMessage> = messages
                            .into_iter()
                            .filter(|m| !archived.contains(&m.id))
                            .collect();
                        list.error = None;
                        list.list.refresh(messages);
                    }
                    Err(reason) => {
                        list.error = Some(reason);
                    }
                }
            }
            MailEvent::MessageLoaded { folder, id, result } => {
                let width = self.body_width;
                let list = self.remote_list_mut(folder);
                let Some(view) = list.detail.as_mut().filter(|v| v.summary.id == id) else {
                    return;
                };
                view.loading = false;
                match result {
                    Ok(message) => {
                        view.display = Some(display_body(
                            message.text.as_deref(),
                            message.html.as_deref(),
                            width,
                        ));
                        view.message = Some(message);
                        view.error = None;
                        if folder == Folder::Inbox {
                            self.mark_read(&id);
                        }
                    }
                    Err(reason) => view.error = Some(reason),
                }
            }
            MailEvent::SendCompleted { id } => {
                log_debug(&format!("sent {}", id));
                if self.compose.status == ComposeStatus::Sending {
                    self.finish_send();
                }
            }
            MailEvent::SendFailed { reason } => {
                self.compose.status = ComposeStatus::Editing;
                self.compose.error = Some(format!("Failed to send email: {}", reason));
            }
            MailEvent::DomainsLoaded(result) => {
                self.settings.account_loading = false;
                match result {
                    Ok(domains) => self.domains = domains,
                    Err(reason) => self.account_error = Some(reason),
                }
            }
            MailEvent::ApiKeysLoaded(result) => match result {
                Ok(keys) => self.api_keys = keys,
                Err(reason) => self.account_error = Some(reason),
            },
            MailEvent::KeyValidated { candidate, result } => {
                self.on_key_validated(&candidate, result);
            }
        }
    }

    fn on_key_validated(&mut self, candidate: &str, result: Result<bool, String>) {
        if self.setup.step == SetupStep::Validating && self.setup.key_input.trim() == candidate {
            self.finish_setup_validation(candidate, result);
        } else if self.settings.pending_key.as_deref() == Some(candidate) {
            self.settings.pending_key = None;
            match result {
                Ok(true) => self.commit_settings(Some(candidate)),
                Ok(false) => self.settings.error = Some("Invalid API key".to_string()),
                Err(reason) => {
                    self.settings.error = Some(format!("Could not validate API key: {}", reason))
                }
            }
        }
    }

    fn finish_setup_validation(&mut self, candidate: &str, result: Result<bool, String>) {
        match result {
            Ok(true) => match self.store.set_api_key(candidate) {
                Ok(()) => {
                    self.restart_engine(candidate);
                    self.setup.error = None;
                    self.setup.step = SetupStep::DefaultFrom;
                }
                Err(err) => {
                    log_debug(&format!("save api key failed: {:#}", err));
                    self.setup.error = Some(format!("Could not save API key: {}", err));
                    self.setup.step = SetupStep::ApiKey;
                }
            },
            Ok(false) => {
                self.setup.error = Some("Invalid API key. Please try again.".to_string());
                self.setup.step = SetupStep::ApiKey;
            }
            Err(reason) => {
                self.setup.error = Some(format!("Could not reach Resend: {}", reason));
                self.setup.step = SetupStep::ApiKey;
            }
        }
    }

    pub(crate) fn mark_read(&mut self, id: &str) {
        if self.read_ids.contains(id) {
            return;
        }
        self.read_ids.insert(id.to_string());
        if let Err(err) = self.store.mark_read(id) {
            log_debug(&format!("mark read failed: {:#}", err));
            self.status_message = Some(format!("Could not save read state: {}", err));
        }
    }

    pub(crate) fn unread_count(&self) -> usize {
        self.inbox
            .list
            .items()
            .iter()
            .filter(|m| !self.read_ids.contains(&m.id))
            .count()
    }
}

fn start_engine(
    runtime: &tokio::runtime::Runtime,
    api_key: &str,
) -> (MailEngine, tokio::sync::mpsc::Receiver<MailEvent>) {
    let _guard = runtime.enter();
    MailEngine::start(Arc::new(ResendClient::new(api_key)))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    use hypermail_core::LocalStore;
    use hypermail_mail::{Folder, MailEvent, RemoteMessage};

    use crate::{App, Mode, UiTheme};

    fn temp_app(tag: &str) -> App {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path: PathBuf = std::env::temp_dir()
            .join(format!("hypermail-tui-{}-{}-{}", tag, std::process::id(), ts))
            .join("config.json");
        let rt = Arc::new(tokio::runtime::Runtime::new().unwrap());
        App::new(LocalStore::new(path), rt, UiTheme::from_name("default"))
    }

    fn msg(id: &str) -> RemoteMessage {
        RemoteMessage {
            id: id.to_string(),
            from: "bob@example.com".to_string(),
            subject: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_key_starts_in_setup() {
        let app = temp_app("setup");
        assert_eq!(app.mode, Mode::Setup);
    }

    #[test]
    fn archived_messages_are_filtered_from_inbox() {
        let mut app = temp_app("archived");
        app.store.archive("m2").unwrap();
        app.on_event(MailEvent::MessagesLoaded {
            folder: Folder::Inbox,
            result: Ok(vec![msg("m1"), msg("m2"), msg("m3")]),
        });
        let ids: Vec<String> = app.inbox.list.items().iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
        assert_eq!(app.unread_count(), 2);
    }

    #[test]
    fn failed_refresh_keeps_last_good_list() {
        let mut app = temp_app("lastgood");
        app.on_event(MailEvent::MessagesLoaded {
            folder: Folder::Sent,
            result: Ok(vec![msg("s1")]),
        });
        app.on_event(MailEvent::MessagesLoaded {
            folder: Folder::Sent,
            result: Err("rate limited".to_string()),
        });
        assert_eq!(app.sent.list.items().len(), 1);
        assert_eq!(app.sent.error.as_deref(), Some("rate limited"));
    }
}
