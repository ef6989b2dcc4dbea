use anyhow::{Result, anyhow};

use crate::store::{Draft, DraftFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposeMode {
    #[default]
    New,
    Reply,
    Forward,
}

/// What a reply or forward starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeContext {
    pub mode: ComposeMode,
    pub to: Option<String>,
    pub subject: String,
    pub original_body: Option<String>,
    pub original_from: Option<String>,
    pub original_to: Option<String>,
    pub original_date: Option<String>,
}

pub fn format_subject(ctx: &ComposeContext) -> String {
    let subject = ctx.subject.as_str();
    match ctx.mode {
        ComposeMode::Reply if !subject.starts_with("Re: ") => format!("Re: {}", subject),
        ComposeMode::Forward if !subject.starts_with("Fwd: ") => format!("Fwd: {}", subject),
        _ => subject.to_string(),
    }
}

fn reply_block(ctx: &ComposeContext) -> String {
    let mut body = String::from("\n\n---\n");
    if let Some(from) = ctx.original_from.as_deref() {
        let date = ctx.original_date.as_deref().unwrap_or("unknown date");
        body.push_str(&format!("On {}, {} wrote:\n", date, from));
    }
    if let Some(original) = ctx.original_body.as_deref() {
        let quoted = original
            .split('\n')
            .map(|line| format!("> {}", line))
            .collect::<Vec<_>>()
            .join("\n");
        body.push_str(&quoted);
    }
    body
}

fn forward_block(ctx: &ComposeContext) -> String {
    let mut body = String::from("\n\n---------- Forwarded message ----------\n");
    if let Some(from) = ctx.original_from.as_deref() {
        body.push_str(&format!("From: {}\n", from));
    }
    if let Some(to) = ctx.original_to.as_deref() {
        body.push_str(&format!("To: {}\n", to));
    }
    if let Some(date) = ctx.original_date.as_deref() {
        body.push_str(&format!("Date: {}\n", date));
    }
    body.push_str(&format!("Subject: {}\n\n", ctx.subject));
    if let Some(original) = ctx.original_body.as_deref() {
        body.push_str(original);
    }
    body
}

/// Signature first, then the quoted or forwarded original.
pub fn format_body(ctx: Option<&ComposeContext>, signature: Option<&str>) -> String {
    let mut body = match signature {
        Some(sig) if !sig.is_empty() => format!("\n\n--\n{}", sig),
        _ => String::new(),
    };
    match ctx.map(|c| (c.mode, c)) {
        Some((ComposeMode::Reply, ctx)) => body.push_str(&reply_block(ctx)),
        Some((ComposeMode::Forward, ctx)) => body.push_str(&forward_block(ctx)),
        _ => {}
    }
    body
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeField {
    From,
    To,
    Subject,
    Body,
}

impl ComposeField {
    pub const ALL: [ComposeField; 4] = [
        ComposeField::From,
        ComposeField::To,
        ComposeField::Subject,
        ComposeField::Body,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ComposeField::From => "From",
            ComposeField::To => "To",
            ComposeField::Subject => "Subject",
            ComposeField::Body => "Body",
        }
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

type FieldRef = fn(&ComposeForm) -> &String;
type FieldMut = fn(&mut ComposeForm) -> &mut String;

fn from_ref(form: &ComposeForm) -> &String {
    &form.from
}
fn from_mut(form: &mut ComposeForm) -> &mut String {
    &mut form.from
}
fn to_ref(form: &ComposeForm) -> &String {
    &form.to
}
fn to_mut(form: &mut ComposeForm) -> &mut String {
    &mut form.to
}
fn subject_ref(form: &ComposeForm) -> &String {
    &form.subject
}
fn subject_mut(form: &mut ComposeForm) -> &mut String {
    &mut form.subject
}
fn body_ref(form: &ComposeForm) -> &String {
    &form.body
}
fn body_mut(form: &mut ComposeForm) -> &mut String {
    &mut form.body
}

impl ComposeField {
    fn accessors(self) -> (FieldRef, FieldMut) {
        match self {
            ComposeField::From => (from_ref, from_mut),
            ComposeField::To => (to_ref, to_mut),
            ComposeField::Subject => (subject_ref, subject_mut),
            ComposeField::Body => (body_ref, body_mut),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeForm {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ComposeForm {
    /// Prefills a form for a new message, reply or forward.
    pub fn from_context(
        ctx: Option<&ComposeContext>,
        default_from: Option<&str>,
        signature: Option<&str>,
    ) -> Self {
        Self {
            from: default_from.unwrap_or_default().to_string(),
            to: ctx.and_then(|c| c.to.clone()).unwrap_or_default(),
            subject: ctx.map(format_subject).unwrap_or_default(),
            body: format_body(ctx, signature),
        }
    }

    pub fn from_draft(draft: &Draft, default_from: Option<&str>) -> Self {
        let from = if draft.from.is_empty() {
            default_from.unwrap_or_default().to_string()
        } else {
            draft.from.clone()
        };
        Self {
            from,
            to: draft.to.clone(),
            subject: draft.subject.clone(),
            body: draft.body.clone(),
        }
    }

    pub fn get(&self, field: ComposeField) -> &str {
        let (get, _) = field.accessors();
        get(self).as_str()
    }

    pub fn get_mut(&mut self, field: ComposeField) -> &mut String {
        let (_, get_mut) = field.accessors();
        get_mut(self)
    }

    /// Forwards and empty new messages start on To; everything else on Body.
    pub fn initial_focus(&self, mode: ComposeMode) -> ComposeField {
        if mode == ComposeMode::Forward || (mode == ComposeMode::New && self.to.is_empty()) {
            ComposeField::To
        } else {
            ComposeField::Body
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.from.trim().is_empty() || self.to.trim().is_empty() || self.subject.trim().is_empty()
        {
            return Err(anyhow!("From, To, and Subject are required"));
        }
        Ok(())
    }

    pub fn recipients(&self) -> Vec<String> {
        self.to
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Appends an address to To, comma separated.
    pub fn add_recipient(&mut self, address: &str) {
        let current = self.to.trim_end().trim_end_matches(',').trim_end();
        self.to = if current.is_empty() {
            address.to_string()
        } else {
            format!("{}, {}", current, address)
        };
    }

    pub fn to_draft_fields(&self) -> DraftFields {
        DraftFields {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }
}

impl From<DraftFields> for ComposeForm {
    fn from(fields: DraftFields) -> Self {
        Self {
            from: fields.from,
            to: fields.to,
            subject: fields.subject,
            body: fields.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ComposeContext, ComposeField, ComposeForm, ComposeMode, format_body, format_subject,
    };

    fn reply_ctx() -> ComposeContext {
        ComposeContext {
            mode: ComposeMode::Reply,
            to: Some("bob@example.com".to_string()),
            subject: "Lunch".to_string(),
            original_body: Some("Are you free?\nNoon works".to_string()),
            original_from: Some("bob@example.com".to_string()),
            original_to: Some("alice@example.com".to_string()),
            original_date: Some("2024-01-05".to_string()),
        }
    }

    #[test]
    fn subject_prefix_is_added_once() {
        let mut ctx = reply_ctx();
        assert_eq!(format_subject(&ctx), "Re: Lunch");
        ctx.subject = "Re: Lunch".to_string();
        assert_eq!(format_subject(&ctx), "Re: Lunch");
        ctx.mode = ComposeMode::Forward;
        assert_eq!(format_subject(&ctx), "Fwd: Re: Lunch");
        ctx.mode = ComposeMode::New;
        assert_eq!(format_subject(&ctx), "Re: Lunch");
    }

    #[test]
    fn reply_body_quotes_original_after_signature() {
        let body = format_body(Some(&reply_ctx()), Some("Alice"));
        assert_eq!(
            body,
            "\n\n--\nAlice\n\n---\nOn 2024-01-05, bob@example.com wrote:\n> Are you free?\n> Noon works"
        );
    }

    #[test]
    fn reply_without_date_says_unknown() {
        let mut ctx = reply_ctx();
        ctx.original_date = None;
        let body = format_body(Some(&ctx), None);
        assert!(body.contains("On unknown date, bob@example.com wrote:"));
    }

    #[test]
    fn forward_body_has_header_block() {
        let mut ctx = reply_ctx();
        ctx.mode = ComposeMode::Forward;
        let body = format_body(Some(&ctx), None);
        assert_eq!(
            body,
            "\n\n---------- Forwarded message ----------\nFrom: bob@example.com\nTo: alice@example.com\nDate: 2024-01-05\nSubject: Lunch\n\nAre you free?\nNoon works"
        );
    }

    #[test]
    fn new_message_body_is_signature_only() {
        assert_eq!(format_body(None, Some("sig")), "\n\n--\nsig");
        assert_eq!(format_body(None, None), "");
    }

    #[test]
    fn fields_cycle_both_ways() {
        assert_eq!(ComposeField::Body.next(), ComposeField::From);
        assert_eq!(ComposeField::From.prev(), ComposeField::Body);
        assert_eq!(ComposeField::To.next(), ComposeField::Subject);
    }

    #[test]
    fn form_validation_and_recipients() {
        let mut form = ComposeForm::from_context(None, Some("me@example.com"), None);
        assert_eq!(form.initial_focus(ComposeMode::New), ComposeField::To);
        assert!(form.validate().is_err());
        form.get_mut(ComposeField::To).push_str("a@example.com, b@example.com ,");
        form.get_mut(ComposeField::Subject).push_str("Hi");
        assert!(form.validate().is_ok());
        assert_eq!(form.recipients(), vec!["a@example.com", "b@example.com"]);
        form.add_recipient("c@example.com");
        assert_eq!(form.get(ComposeField::To), "a@example.com, b@example.com, c@example.com");
    }

    #[test]
    fn reply_focuses_body_and_forward_focuses_to() {
        let ctx = reply_ctx();
        let form = ComposeForm::from_context(Some(&ctx), None, None);
        assert_eq!(form.initial_focus(ComposeMode::Reply), ComposeField::Body);
        assert_eq!(form.to, "bob@example.com");
        assert_eq!(form.initial_focus(ComposeMode::Forward), ComposeField::To);
    }
}
