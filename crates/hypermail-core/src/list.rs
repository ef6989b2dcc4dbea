//! Filter, paginate, select and navigate over any list of records.
//!
//! Every list-backed view (inbox, sent, drafts, contacts) owns a
//! [`ListModel`]. Views translate terminal keys into [`ListKey`], feed them to
//! [`ListModel::handle_key`] and act on the returned [`ListOutcome`].

pub const PAGE_SIZE: usize = 10;

/// Text fields matched by the search query.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;

    fn matches(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty()
            || self
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle_lower))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKey {
    Up,
    Down,
    Enter,
    Esc,
    Backspace,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand<T> {
    Open(T),
    Delete(T),
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome<T> {
    Handled,
    Command(ListCommand<T>),
    Unhandled(ListKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Normal,
    Searching,
    Confirming,
}

/// Snapshot of what a view needs to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView<T> {
    pub visible: Vec<T>,
    pub selection: usize,
    pub page: usize,
    pub page_count: usize,
    pub filtered_count: usize,
    pub total: usize,
    pub query: String,
    pub mode: ListMode,
}

#[derive(Debug, Clone)]
pub struct ListModel<T> {
    items: Vec<T>,
    query: String,
    searching: bool,
    selection: usize,
    page: usize,
    pending_delete: Option<T>,
    delete_enabled: bool,
}

impl<T> Default for ListModel<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            query: String::new(),
            searching: false,
            selection: 0,
            page: 0,
            pending_delete: None,
            delete_enabled: true,
        }
    }
}

impl<T: Searchable + Clone> ListModel<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn pending_delete(&self) -> Option<&T> {
        self.pending_delete.as_ref()
    }

    pub fn mode(&self) -> ListMode {
        if self.pending_delete.is_some() {
            ListMode::Confirming
        } else if self.searching {
            ListMode::Searching
        } else {
            ListMode::Normal
        }
    }

    pub fn set_delete_enabled(&mut self, enabled: bool) {
        self.delete_enabled = enabled;
        if !enabled {
            self.pending_delete = None;
        }
    }

    pub fn filtered(&self) -> Vec<&T> {
        let needle = self.query.to_lowercase();
        self.items.iter().filter(|item| item.matches(&needle)).collect()
    }

    pub fn page_count(&self) -> usize {
        self.filtered().len().div_ceil(PAGE_SIZE)
    }

    pub fn visible(&self) -> Vec<T> {
        self.filtered()
            .into_iter()
            .skip(self.page * PAGE_SIZE)
            .take(PAGE_SIZE)
            .cloned()
            .collect()
    }

    pub fn selected(&self) -> Option<T> {
        self.visible().into_iter().nth(self.selection)
    }

    pub fn view(&self) -> ListView<T> {
        let filtered_count = self.filtered().len();
        ListView {
            visible: self.visible(),
            selection: self.selection,
            page: self.page,
            page_count: filtered_count.div_ceil(PAGE_SIZE),
            filtered_count,
            total: self.items.len(),
            query: self.query.clone(),
            mode: self.mode(),
        }
    }

    /// Page first, then selection within the (possibly shorter) page.
    fn clamp(&mut self) {
        let last_page = self.page_count().saturating_sub(1);
        self.page = self.page.min(last_page);
        let last_row = self.visible().len().saturating_sub(1);
        self.selection = self.selection.min(last_row);
    }

    fn reset_position(&mut self) {
        self.page = 0;
        self.selection = 0;
    }

    pub fn refresh(&mut self, items: Vec<T>) -> ListView<T> {
        self.items = items;
        self.clamp();
        self.view()
    }

    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> ListView<T> {
        self.items.retain(|item| !pred(item));
        self.clamp();
        self.view()
    }

    pub fn set_query(&mut self, query: &str) -> ListView<T> {
        self.query = query.to_string();
        self.reset_position();
        self.view()
    }

    pub fn set_searching(&mut self, searching: bool) -> ListView<T> {
        self.searching = searching;
        self.view()
    }

    pub fn move_selection(&mut self, delta: isize) -> ListView<T> {
        let len = self.visible().len();
        if len > 0 {
            let next = self.selection as isize + delta;
            self.selection = next.clamp(0, len as isize - 1) as usize;
        }
        self.view()
    }

    pub fn next_page(&mut self) -> ListView<T> {
        if self.page + 1 < self.page_count() {
            self.page += 1;
            self.selection = 0;
        }
        self.view()
    }

    pub fn prev_page(&mut self) -> ListView<T> {
        if self.page > 0 {
            self.page -= 1;
            self.selection = 0;
        }
        self.view()
    }

    pub fn request_delete(&mut self) -> ListView<T> {
        if self.delete_enabled {
            self.pending_delete = self.selected();
        }
        self.view()
    }

    /// Clears the pending delete; returns the item when confirmed.
    pub fn confirm_delete(&mut self, confirmed: bool) -> Option<T> {
        let item = self.pending_delete.take();
        if confirmed { item } else { None }
    }

    pub fn open_selected(&self) -> Option<T> {
        self.selected()
    }

    pub fn handle_key(&mut self, key: ListKey) -> ListOutcome<T> {
        match self.mode() {
            ListMode::Confirming => self.handle_confirming(key),
            ListMode::Searching => self.handle_searching(key),
            ListMode::Normal => self.handle_normal(key),
        }
    }

    fn handle_confirming(&mut self, key: ListKey) -> ListOutcome<T> {
        match key {
            ListKey::Char('y') | ListKey::Char('Y') => match self.confirm_delete(true) {
                Some(item) => ListOutcome::Command(ListCommand::Delete(item)),
                None => ListOutcome::Handled,
            },
            ListKey::Char('n') | ListKey::Char('N') | ListKey::Esc => {
                self.confirm_delete(false);
                ListOutcome::Handled
            }
            _ => ListOutcome::Handled,
        }
    }

    fn handle_searching(&mut self, key: ListKey) -> ListOutcome<T> {
        match key {
            ListKey::Esc => {
                self.searching = false;
                self.set_query("");
            }
            ListKey::Enter => {
                self.searching = false;
            }
            ListKey::Backspace => {
                let mut query = self.query.clone();
                query.pop();
                self.set_query(&query);
            }
            ListKey::Char(c) if !c.is_control() => {
                let mut query = self.query.clone();
                query.push(c);
                self.set_query(&query);
            }
            other => return ListOutcome::Unhandled(other),
        }
        ListOutcome::Handled
    }

    fn handle_normal(&mut self, key: ListKey) -> ListOutcome<T> {
        match key {
            ListKey::Up | ListKey::Char('k') => {
                self.move_selection(-1);
            }
            ListKey::Down | ListKey::Char('j') => {
                self.move_selection(1);
            }
            ListKey::Char('/') => {
                self.searching = true;
            }
            ListKey::Char('n') => {
                self.next_page();
            }
            ListKey::Char('p') => {
                self.prev_page();
            }
            ListKey::Enter => {
                if let Some(item) = self.open_selected() {
                    return ListOutcome::Command(ListCommand::Open(item));
                }
            }
            ListKey::Char('d') if self.delete_enabled => {
                self.request_delete();
            }
            ListKey::Esc | ListKey::Char('q') => {
                if self.query.is_empty() {
                    return ListOutcome::Command(ListCommand::Leave);
                }
                self.set_query("");
            }
            other => return ListOutcome::Unhandled(other),
        }
        ListOutcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::{ListCommand, ListKey, ListMode, ListModel, ListOutcome, PAGE_SIZE, Searchable};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Row {
        name: String,
        email: String,
    }

    impl Searchable for Row {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.name.as_str(), self.email.as_str()]
        }
    }

    fn row(name: &str) -> Row {
        Row {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n).map(|i| row(&format!("msg{:02}", i))).collect()
    }

    fn type_str<T: Searchable + Clone>(model: &mut ListModel<T>, text: &str) {
        for c in text.chars() {
            model.handle_key(ListKey::Char(c));
        }
    }

    fn assert_bounds<T: Searchable + Clone>(model: &ListModel<T>) {
        let view = model.view();
        assert!(view.page <= view.page_count.saturating_sub(1));
        assert!(view.visible.len() <= PAGE_SIZE);
        assert!(view.selection <= view.visible.len().saturating_sub(1));
    }

    #[test]
    fn fifteen_items_make_two_pages() {
        let mut model = ListModel::new(rows(15));
        assert_eq!(model.page_count(), 2);
        model.move_selection(3);
        assert_eq!(model.handle_key(ListKey::Char('n')), ListOutcome::Handled);
        let view = model.view();
        assert_eq!(view.page, 1);
        assert_eq!(view.visible.len(), 5);
        assert_eq!(view.selection, 0);
        assert_eq!(view.visible[0].name, "msg10");
        model.next_page();
        assert_eq!(model.page(), 1);
        model.handle_key(ListKey::Char('p'));
        assert_eq!(model.page(), 0);
    }

    #[test]
    fn query_keeps_matches_in_order() {
        let contacts = vec![
            row("Alice"),
            row("Bob"),
            Row {
                name: "Carol".to_string(),
                email: "alice.c@example.com".to_string(),
            },
            row("Dave"),
            row("Eve"),
        ];
        let mut model = ListModel::new(contacts);
        let view = model.set_query("alice");
        assert_eq!(view.filtered_count, 2);
        assert_eq!(view.visible[0].name, "Alice");
        assert_eq!(view.visible[1].name, "Carol");
        let view = model.set_query("ALICE");
        assert_eq!(view.filtered_count, 2);
    }

    #[test]
    fn empty_query_matches_everything() {
        let model = ListModel::new(rows(7));
        assert_eq!(model.filtered().len(), 7);
    }

    #[test]
    fn deleting_only_item_leaves_empty_page() {
        let mut model = ListModel::new(vec![row("Solo")]);
        model.handle_key(ListKey::Char('d'));
        assert_eq!(model.mode(), ListMode::Confirming);
        let outcome = model.handle_key(ListKey::Char('y'));
        assert_eq!(outcome, ListOutcome::Command(ListCommand::Delete(row("Solo"))));
        let view = model.remove_where(|r| r.name == "Solo");
        assert!(view.visible.is_empty());
        assert_eq!(view.selection, 0);
        assert_eq!(view.page, 0);
        assert_eq!(view.mode, ListMode::Normal);
    }

    #[test]
    fn removing_last_row_moves_cursor_back() {
        let mut model = ListModel::new(rows(11));
        model.next_page();
        assert_eq!(model.visible().len(), 1);
        let view = model.remove_where(|r| r.name == "msg10");
        assert_eq!(view.page, 0);
        assert_eq!(view.selection, 0);

        model.move_selection(9);
        let view = model.remove_where(|r| r.name == "msg09");
        assert_eq!(view.selection, 8);
    }

    #[test]
    fn cancel_delete_keeps_item() {
        let mut model = ListModel::new(rows(3));
        model.handle_key(ListKey::Char('d'));
        model.handle_key(ListKey::Char('x'));
        assert_eq!(model.mode(), ListMode::Confirming);
        model.handle_key(ListKey::Esc);
        assert_eq!(model.mode(), ListMode::Normal);
        assert_eq!(model.items().len(), 3);
    }

    #[test]
    fn delete_disabled_passes_key_through() {
        let mut model = ListModel::new(rows(3));
        model.set_delete_enabled(false);
        assert_eq!(
            model.handle_key(ListKey::Char('d')),
            ListOutcome::Unhandled(ListKey::Char('d'))
        );
        assert!(model.pending_delete().is_none());
    }

    #[test]
    fn search_mode_edits_query() {
        let mut model = ListModel::new(rows(15));
        model.next_page();
        model.handle_key(ListKey::Char('/'));
        assert_eq!(model.mode(), ListMode::Searching);
        type_str(&mut model, "msg1");
        assert_eq!(model.query(), "msg1");
        assert_eq!(model.page(), 0);
        assert_eq!(model.filtered().len(), 5);
        model.handle_key(ListKey::Backspace);
        assert_eq!(model.query(), "msg");
        model.handle_key(ListKey::Enter);
        assert_eq!(model.mode(), ListMode::Normal);
        assert_eq!(model.query(), "msg");

        model.handle_key(ListKey::Char('/'));
        model.handle_key(ListKey::Esc);
        assert_eq!(model.query(), "");
        assert_eq!(model.mode(), ListMode::Normal);
    }

    #[test]
    fn arrows_are_ignored_while_searching() {
        let mut model = ListModel::new(rows(6));
        model.handle_key(ListKey::Down);
        model.handle_key(ListKey::Char('/'));
        for key in [ListKey::Down, ListKey::Up] {
            assert_eq!(model.handle_key(key), ListOutcome::Unhandled(key));
        }
        assert_eq!(model.selection(), 1);
        assert_eq!(model.mode(), ListMode::Searching);
    }

    #[test]
    fn esc_clears_query_before_leaving() {
        let mut model = ListModel::new(rows(4));
        model.set_query("msg01");
        assert_eq!(model.handle_key(ListKey::Esc), ListOutcome::Handled);
        assert_eq!(model.query(), "");
        assert_eq!(
            model.handle_key(ListKey::Char('q')),
            ListOutcome::Command(ListCommand::Leave)
        );
    }

    #[test]
    fn enter_opens_selected_row() {
        let mut model = ListModel::new(rows(4));
        model.handle_key(ListKey::Down);
        model.handle_key(ListKey::Char('j'));
        assert_eq!(
            model.handle_key(ListKey::Enter),
            ListOutcome::Command(ListCommand::Open(row("msg02")))
        );
    }

    #[test]
    fn empty_list_ignores_navigation() {
        let mut model: ListModel<Row> = ListModel::new(Vec::new());
        model.handle_key(ListKey::Down);
        model.handle_key(ListKey::Char('n'));
        model.handle_key(ListKey::Char('d'));
        assert_eq!(model.handle_key(ListKey::Enter), ListOutcome::Handled);
        assert_eq!(model.mode(), ListMode::Normal);
        assert_bounds(&model);
    }

    #[test]
    fn unknown_keys_are_returned() {
        let mut model = ListModel::new(rows(2));
        assert_eq!(
            model.handle_key(ListKey::Char('r')),
            ListOutcome::Unhandled(ListKey::Char('r'))
        );
    }

    #[test]
    fn bounds_hold_across_mixed_operations() {
        let mut model = ListModel::new(rows(23));
        let keys = [
            ListKey::Char('n'),
            ListKey::Char('n'),
            ListKey::Down,
            ListKey::Down,
            ListKey::Char('n'),
            ListKey::Up,
            ListKey::Char('/'),
            ListKey::Char('2'),
            ListKey::Enter,
            ListKey::Char('j'),
            ListKey::Char('p'),
        ];
        for key in keys {
            model.handle_key(key);
            assert_bounds(&model);
        }
        model.refresh(rows(4));
        assert_bounds(&model);
        model.set_query("");
        model.move_selection(50);
        assert_eq!(model.selection(), 3);
        model.refresh(rows(2));
        assert_eq!(model.selection(), 1);
        model.move_selection(-10);
        assert_eq!(model.selection(), 0);
    }
}
