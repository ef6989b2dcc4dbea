//! JSON-backed local state: credential, preferences, drafts, contacts and the
//! read/archived shadows of remote messages.
//!
//! Every operation reloads the whole document from disk, applies one change
//! and rewrites the whole document. Reads are fail-soft: a missing or
//! malformed file is an empty document.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::list::Searchable;
use crate::{log_debug, xdg_config_dir};

/// An explicit `null` reads as the empty collection.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, rename = "archivedEmails", deserialize_with = "null_as_default")]
    pub archived_email_ids: Vec<String>,
    #[serde(default, rename = "readEmails", deserialize_with = "null_as_default")]
    pub read_email_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub drafts: Vec<Draft>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contacts: Vec<Contact>,
    /// Keys this version does not know about, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftFields {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
}

impl Contact {
    /// `Name <email>`, or the bare address when the name is empty.
    pub fn display(&self) -> String {
        if self.name.trim().is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", self.name, self.email)
        }
    }
}

impl Searchable for Contact {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str()]
    }
}

impl Searchable for Draft {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.to.as_str(), self.subject.as_str()]
    }
}

/// Scalar settings stored at the top level of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingField {
    ApiKey,
    DefaultFrom,
    Signature,
}

type SlotRef = fn(&ConfigDocument) -> &Option<String>;
type SlotMut = fn(&mut ConfigDocument) -> &mut Option<String>;

fn api_key_ref(doc: &ConfigDocument) -> &Option<String> {
    &doc.api_key
}
fn api_key_mut(doc: &mut ConfigDocument) -> &mut Option<String> {
    &mut doc.api_key
}
fn default_from_ref(doc: &ConfigDocument) -> &Option<String> {
    &doc.default_from
}
fn default_from_mut(doc: &mut ConfigDocument) -> &mut Option<String> {
    &mut doc.default_from
}
fn signature_ref(doc: &ConfigDocument) -> &Option<String> {
    &doc.signature
}
fn signature_mut(doc: &mut ConfigDocument) -> &mut Option<String> {
    &mut doc.signature
}

impl SettingField {
    pub const ALL: [SettingField; 3] = [
        SettingField::DefaultFrom,
        SettingField::Signature,
        SettingField::ApiKey,
    ];

    fn accessors(self) -> (SlotRef, SlotMut) {
        match self {
            SettingField::ApiKey => (api_key_ref, api_key_mut),
            SettingField::DefaultFrom => (default_from_ref, default_from_mut),
            SettingField::Signature => (signature_ref, signature_mut),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingField::ApiKey => "API Key",
            SettingField::DefaultFrom => "Default From Email",
            SettingField::Signature => "Signature",
        }
    }

    pub fn masked(self) -> bool {
        self == SettingField::ApiKey
    }

    pub fn multiline(self) -> bool {
        self == SettingField::Signature
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl ConfigDocument {
    pub fn get(&self, field: SettingField) -> Option<&str> {
        let (get, _) = field.accessors();
        get(self).as_deref()
    }

    /// Blank values clear the field.
    pub fn set(&mut self, field: SettingField, value: Option<String>) {
        let (_, get_mut) = field.accessors();
        *get_mut(self) = value.filter(|v| !v.trim().is_empty());
    }

    /// Stores the text as typed. Used by editors; `set` normalises on save.
    pub fn set_raw(&mut self, field: SettingField, value: String) {
        let (_, get_mut) = field.accessors();
        *get_mut(self) = Some(value);
    }

    pub fn is_archived(&self, id: &str) -> bool {
        self.archived_email_ids.iter().any(|v| v == id)
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.read_email_ids.iter().any(|v| v == id)
    }

    fn normalize(&mut self) {
        dedup_in_place(&mut self.archived_email_ids);
        dedup_in_place(&mut self.read_email_ids);
    }
}

fn dedup_in_place(ids: &mut Vec<String>) {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}

fn insert_unique(ids: &mut Vec<String>, id: &str) -> bool {
    if ids.iter().any(|v| v == id) {
        return false;
    }
    ids.push(id.to_string());
    true
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Millisecond timestamp, bumped past every numeric id already in use.
fn next_id<'a>(existing: impl Iterator<Item = &'a str>) -> String {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let max = existing.filter_map(|id| id.parse::<u64>().ok()).max();
    match max {
        Some(max) if max >= now => (max + 1).to_string(),
        _ => now.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        xdg_config_dir().join("hypermail").join("config.json")
    }

    /// Explicit path, then `HYPERMAIL_CONFIG`, then the XDG location.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let path = explicit
            .or_else(|| std::env::var_os("HYPERMAIL_CONFIG").map(PathBuf::from))
            .unwrap_or_else(Self::default_path);
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ConfigDocument {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log_debug(&format!("config read failed {}: {}", self.path.display(), err));
                }
                return ConfigDocument::default();
            }
        };
        match serde_json::from_str::<ConfigDocument>(&content) {
            Ok(mut doc) => {
                doc.normalize();
                doc
            }
            Err(err) => {
                log_debug(&format!(
                    "config parse failed {}: {}; treating as empty",
                    self.path.display(),
                    err
                ));
                ConfigDocument::default()
            }
        }
    }

    /// Writes a sibling temp file and renames it over the target.
    pub fn save(&self, doc: &ConfigDocument) -> Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
        let mut content = serde_json::to_string_pretty(doc)?;
        content.push('\n');
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content.as_bytes())
            .with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }

    /// Load, apply `f`, and save only when `f` reports a change.
    fn update<R>(&self, f: impl FnOnce(&mut ConfigDocument) -> (R, bool)) -> Result<R> {
        let mut doc = self.load();
        let (out, changed) = f(&mut doc);
        if changed {
            self.save(&doc)?;
        }
        Ok(out)
    }

    pub fn get(&self, field: SettingField) -> Option<String> {
        self.load().get(field).map(str::to_string)
    }

    pub fn set(&self, field: SettingField, value: Option<String>) -> Result<()> {
        self.update(|doc| {
            doc.set(field, value);
            ((), true)
        })
    }

    pub fn api_key(&self) -> Option<String> {
        self.get(SettingField::ApiKey)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn set_api_key(&self, key: &str) -> Result<()> {
        self.set(SettingField::ApiKey, Some(key.trim().to_string()))
    }

    pub fn default_from(&self) -> Option<String> {
        self.get(SettingField::DefaultFrom)
    }

    pub fn set_default_from(&self, from: &str) -> Result<()> {
        self.set(SettingField::DefaultFrom, Some(from.trim().to_string()))
    }

    pub fn signature(&self) -> Option<String> {
        self.get(SettingField::Signature)
    }

    pub fn set_signature(&self, signature: &str) -> Result<()> {
        self.set(SettingField::Signature, Some(signature.to_string()))
    }

    pub fn archived_ids(&self) -> Vec<String> {
        self.load().archived_email_ids
    }

    pub fn archive(&self, id: &str) -> Result<()> {
        self.update(|doc| ((), insert_unique(&mut doc.archived_email_ids, id)))
    }

    pub fn is_archived(&self, id: &str) -> bool {
        self.load().is_archived(id)
    }

    pub fn read_ids(&self) -> Vec<String> {
        self.load().read_email_ids
    }

    pub fn mark_read(&self, id: &str) -> Result<()> {
        self.update(|doc| ((), insert_unique(&mut doc.read_email_ids, id)))
    }

    /// One save for the whole batch; returns how many ids were new.
    pub fn mark_all_read<I>(&self, ids: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.update(|doc| {
            let added = ids
                .into_iter()
                .filter(|id| insert_unique(&mut doc.read_email_ids, id.as_ref()))
                .count();
            (added, added > 0)
        })
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.load().is_read(id)
    }

    pub fn list_drafts(&self) -> Vec<Draft> {
        self.load().drafts
    }

    pub fn get_draft(&self, id: &str) -> Option<Draft> {
        self.load().drafts.into_iter().find(|d| d.id == id)
    }

    pub fn save_draft(&self, fields: DraftFields) -> Result<Draft> {
        self.update(|doc| {
            let draft = Draft {
                id: next_id(doc.drafts.iter().map(|d| d.id.as_str())),
                from: fields.from,
                to: fields.to,
                subject: fields.subject,
                body: fields.body,
                created_at: now_rfc3339(),
                updated_at: None,
            };
            doc.drafts.push(draft.clone());
            (draft, true)
        })
    }

    /// No-op (and `false`) when the id is unknown.
    pub fn update_draft(&self, id: &str, fields: DraftFields) -> Result<bool> {
        self.update(|doc| {
            let Some(draft) = doc.drafts.iter_mut().find(|d| d.id == id) else {
                return (false, false);
            };
            draft.from = fields.from;
            draft.to = fields.to;
            draft.subject = fields.subject;
            draft.body = fields.body;
            draft.updated_at = Some(now_rfc3339());
            (true, true)
        })
    }

    pub fn delete_draft(&self, id: &str) -> Result<bool> {
        self.update(|doc| {
            let before = doc.drafts.len();
            doc.drafts.retain(|d| d.id != id);
            let removed = doc.drafts.len() != before;
            (removed, removed)
        })
    }

    pub fn list_contacts(&self) -> Vec<Contact> {
        self.load().contacts
    }

    pub fn add_contact(&self, fields: ContactFields) -> Result<Contact> {
        self.update(|doc| {
            let contact = Contact {
                id: next_id(doc.contacts.iter().map(|c| c.id.as_str())),
                name: fields.name.trim().to_string(),
                email: fields.email.trim().to_string(),
            };
            doc.contacts.push(contact.clone());
            (contact, true)
        })
    }

    pub fn delete_contact(&self, id: &str) -> Result<bool> {
        self.update(|doc| {
            let before = doc.contacts.len();
            doc.contacts.retain(|c| c.id != id);
            let removed = doc.contacts.len() != before;
            (removed, removed)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{ContactFields, DraftFields, LocalStore, SettingField};

    fn temp_store(tag: &str) -> LocalStore {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir: PathBuf = std::env::temp_dir().join(format!(
            "hypermail-store-{}-{}-{}",
            tag,
            std::process::id(),
            ts
        ));
        LocalStore::new(dir.join("config.json"))
    }

    #[test]
    fn missing_file_loads_empty_document() {
        let store = temp_store("missing");
        let doc = store.load();
        assert_eq!(doc, Default::default());
        assert!(!store.has_api_key());
    }

    #[test]
    fn null_collections_keep_the_rest_of_the_document() -> anyhow::Result<()> {
        let store = temp_store("nulls");
        std::fs::create_dir_all(store.path().parent().unwrap())?;
        std::fs::write(
            store.path(),
            r#"{"apiKey":"re_keep","contacts":[{"id":"1","name":"Bob","email":"bob@example.com"}],"readEmails":null,"drafts":null}"#,
        )?;
        assert_eq!(store.api_key().as_deref(), Some("re_keep"));
        store.archive("m1")?;
        let doc = store.load();
        assert_eq!(doc.api_key.as_deref(), Some("re_keep"));
        assert_eq!(doc.contacts.len(), 1);
        assert_eq!(doc.archived_email_ids, vec!["m1".to_string()]);
        assert!(doc.read_email_ids.is_empty());
        assert!(doc.drafts.is_empty());
        Ok(())
    }

    #[test]
    fn corrupt_file_loads_empty_document() -> anyhow::Result<()> {
        let store = temp_store("corrupt");
        std::fs::create_dir_all(store.path().parent().unwrap())?;
        std::fs::write(store.path(), "{ not json")?;
        assert_eq!(store.load(), Default::default());
        Ok(())
    }

    #[test]
    fn setting_one_field_leaves_others_untouched() -> anyhow::Result<()> {
        let store = temp_store("fields");
        store.set_api_key("re_123")?;
        store.set_signature("Cheers\nAlice")?;
        store.archive("m1")?;
        let before = store.load();

        store.set_default_from("alice@example.com")?;
        let mut after = store.load();
        assert_eq!(after.default_from.as_deref(), Some("alice@example.com"));
        after.default_from = None;
        assert_eq!(after, before);
        Ok(())
    }

    #[test]
    fn blank_value_clears_setting() -> anyhow::Result<()> {
        let store = temp_store("blank");
        store.set(SettingField::Signature, Some("sig".to_string()))?;
        store.set(SettingField::Signature, Some("   ".to_string()))?;
        assert_eq!(store.signature(), None);
        Ok(())
    }

    #[test]
    fn archive_twice_keeps_single_entry() -> anyhow::Result<()> {
        let store = temp_store("archive");
        store.archive("m1")?;
        store.archive("m1")?;
        assert_eq!(store.archived_ids(), vec!["m1".to_string()]);
        assert!(store.is_archived("m1"));
        assert!(!store.is_archived("m2"));
        Ok(())
    }

    #[test]
    fn mark_all_read_is_idempotent_and_batched() -> anyhow::Result<()> {
        let store = temp_store("read");
        store.mark_read("a")?;
        let added = store.mark_all_read(["a", "b", "c", "b"])?;
        assert_eq!(added, 2);
        assert_eq!(store.mark_all_read(["a", "b", "c"])?, 0);
        assert_eq!(store.read_ids(), vec!["a", "b", "c"]);
        Ok(())
    }

    #[test]
    fn load_dedups_hand_edited_sets() -> anyhow::Result<()> {
        let store = temp_store("dedup");
        std::fs::create_dir_all(store.path().parent().unwrap())?;
        std::fs::write(
            store.path(),
            r#"{"readEmails": ["x", "y", "x"], "archivedEmails": ["z", "z"]}"#,
        )?;
        let doc = store.load();
        assert_eq!(doc.read_email_ids, vec!["x", "y"]);
        assert_eq!(doc.archived_email_ids, vec!["z"]);
        Ok(())
    }

    #[test]
    fn unknown_keys_survive_a_rewrite() -> anyhow::Result<()> {
        let store = temp_store("extra");
        std::fs::create_dir_all(store.path().parent().unwrap())?;
        std::fs::write(
            store.path(),
            r#"{"apiKey": "re_1", "theme": {"accent": "cyan"}, "futureFlag": true}"#,
        )?;
        store.archive("m9")?;
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path())?)?;
        assert_eq!(raw["theme"]["accent"], "cyan");
        assert_eq!(raw["futureFlag"], true);
        assert_eq!(raw["apiKey"], "re_1");
        assert_eq!(raw["archivedEmails"][0], "m9");
        Ok(())
    }

    #[test]
    fn drafts_get_unique_ids_and_update_in_place() -> anyhow::Result<()> {
        let store = temp_store("drafts");
        let mut ids = HashSet::new();
        for n in 0..5 {
            let draft = store.save_draft(DraftFields {
                to: format!("to{}@example.com", n),
                subject: format!("s{}", n),
                ..Default::default()
            })?;
            assert!(!draft.created_at.is_empty());
            assert!(ids.insert(draft.id));
        }
        let first = store.list_drafts()[0].clone();
        let updated = store.update_draft(
            &first.id,
            DraftFields {
                to: "new@example.com".to_string(),
                subject: "changed".to_string(),
                body: "body".to_string(),
                ..Default::default()
            },
        )?;
        assert!(updated);
        let reloaded = store.get_draft(&first.id).unwrap();
        assert_eq!(reloaded.subject, "changed");
        assert_eq!(reloaded.created_at, first.created_at);
        assert!(reloaded.updated_at.is_some());
        assert_eq!(store.list_drafts().len(), 5);
        assert_eq!(store.list_drafts()[0].id, first.id);
        Ok(())
    }

    #[test]
    fn update_and_delete_of_unknown_draft_are_noops() -> anyhow::Result<()> {
        let store = temp_store("noop");
        assert!(!store.update_draft("nope", DraftFields::default())?);
        assert!(!store.delete_draft("nope")?);
        assert!(!store.path().exists());
        Ok(())
    }

    #[test]
    fn contacts_add_and_delete() -> anyhow::Result<()> {
        let store = temp_store("contacts");
        let alice = store.add_contact(ContactFields {
            name: " Alice ".to_string(),
            email: "alice@example.com".to_string(),
        })?;
        let bob = store.add_contact(ContactFields {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
        })?;
        assert_ne!(alice.id, bob.id);
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.display(), "Alice <alice@example.com>");
        assert!(store.delete_contact(&alice.id)?);
        let left = store.list_contacts();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].email, "bob@example.com");
        Ok(())
    }

    #[test]
    fn save_leaves_no_temp_file_behind() -> anyhow::Result<()> {
        let store = temp_store("atomic");
        store.set_api_key("re_abc")?;
        let tmp = store.path().with_extension("json.tmp");
        assert!(store.path().exists());
        assert!(!tmp.exists());
        Ok(())
    }

    #[test]
    fn save_fails_when_parent_is_a_file() -> anyhow::Result<()> {
        let store = temp_store("blocked");
        let parent = store.path().parent().unwrap().to_path_buf();
        std::fs::create_dir_all(parent.parent().unwrap())?;
        std::fs::write(&parent, "not a dir")?;
        assert!(store.set_api_key("re_x").is_err());
        Ok(())
    }
}
