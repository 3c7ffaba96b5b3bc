//! Application state machine and event dispatcher.
//!
//! The ledger view follows `Unauthenticated → Loading(owner) → Live` and
//! drops back to `Unauthenticated` on sign-out. `records` is a read-only
//! projection of the store, replaced wholesale on every feed push.

use std::{sync::Arc, time::Duration};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use subspace_core::{
  feed::RecordSnapshot,
  principal::{Principal, PrincipalState},
  record::{RecordDraft, SubscriptionRecord},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::client::ApiClient;

// ─── Screens and focus ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// The sign-in / register dialog.
  Auth,
  /// The record list, entry form, and due summary.
  Ledger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTab {
  SignIn,
  Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
  Email,
  Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
  Name,
  Price,
  DueDate,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub screen:          Screen,
  pub principal_state: PrincipalState,

  // Auth dialog.
  pub auth_tab:      AuthTab,
  pub auth_field:    AuthField,
  pub auth_email:    String,
  pub auth_password: String,
  /// Provider error message, shown verbatim in the dialog.
  pub auth_error:    Option<String>,

  // Ledger view.
  pub records:        Vec<SubscriptionRecord>,
  /// False until the first snapshot arrives for the current owner.
  pub records_loaded: bool,
  pub list_cursor:    usize,

  // Record entry form.
  pub draft:       RecordDraft,
  pub form_active: bool,
  pub form_field:  FormField,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Shared HTTP client.
  pub client: Arc<ApiClient>,

  feed_rx:   Option<mpsc::Receiver<RecordSnapshot>>,
  feed_task: Option<JoinHandle<()>>,
}

impl App {
  pub fn new(client: ApiClient) -> Self {
    Self {
      screen:          Screen::Auth,
      principal_state: PrincipalState::Unknown,
      auth_tab:        AuthTab::SignIn,
      auth_field:      AuthField::Email,
      auth_email:      String::new(),
      auth_password:   String::new(),
      auth_error:      None,
      records:         Vec::new(),
      records_loaded:  false,
      list_cursor:     0,
      draft:           RecordDraft::default(),
      form_active:     false,
      form_field:      FormField::Name,
      status_msg:      String::new(),
      client:          Arc::new(client),
      feed_rx:         None,
      feed_task:       None,
    }
  }

  // ── Startup and teardown ──────────────────────────────────────────────────

  /// Resolve the startup principal state: sign in when credentials were
  /// provided, otherwise start anonymous.
  pub async fn resolve_startup(
    &mut self,
    email: Option<&str>,
    password: Option<&str>,
  ) {
    if let (Some(email), Some(password)) = (email, password) {
      match self.client.sign_in(email, password).await {
        Ok(principal) => {
          self.enter_ledger(principal);
          return;
        }
        Err(e) => self.auth_error = Some(e.to_string()),
      }
    }
    self.principal_state = PrincipalState::Anonymous;
  }

  /// Cancel the live subscription. Called once on client teardown so no
  /// callback fires after disposal.
  pub fn shutdown(&mut self) {
    self.stop_feed();
  }

  // ── Live feed ─────────────────────────────────────────────────────────────

  /// Start the long-poll task for the current principal's records. Each
  /// received snapshot fully replaces the in-memory list.
  fn start_feed(&mut self) {
    self.stop_feed();

    let (tx, rx) = mpsc::channel(8);
    let client = self.client.clone();
    let handle = tokio::spawn(async move {
      let mut after = 0u64;
      loop {
        match client.poll_feed(after).await {
          Ok(snapshot) => {
            if snapshot.seq > after {
              after = snapshot.seq;
              if tx.send(snapshot).await.is_err() {
                break;
              }
            }
          }
          Err(_) => {
            // The subscription re-establishes itself after transport
            // hiccups; the UI keeps showing the last snapshot meanwhile.
            tokio::time::sleep(Duration::from_secs(2)).await;
          }
        }
      }
    });

    self.feed_rx = Some(rx);
    self.feed_task = Some(handle);
  }

  fn stop_feed(&mut self) {
    if let Some(task) = self.feed_task.take() {
      task.abort();
    }
    self.feed_rx = None;
  }

  /// Apply any snapshots the feed task has delivered since the last tick.
  pub fn drain_feed(&mut self) {
    let mut latest = None;
    if let Some(rx) = self.feed_rx.as_mut() {
      while let Ok(snapshot) = rx.try_recv() {
        latest = Some(snapshot);
      }
    }
    if let Some(snapshot) = latest {
      self.replace_records(snapshot.records);
    }
  }

  fn replace_records(&mut self, records: Vec<SubscriptionRecord>) {
    self.records = records;
    self.records_loaded = true;
    if self.list_cursor >= self.records.len() {
      self.list_cursor = self.records.len().saturating_sub(1);
    }
  }

  // ── Session transitions ───────────────────────────────────────────────────

  fn enter_ledger(&mut self, principal: Principal) {
    self.principal_state = PrincipalState::Authenticated(principal);
    self.auth_email.clear();
    self.auth_password.clear();
    self.auth_error = None;
    self.screen = Screen::Ledger;
    self.records_loaded = false;
    self.start_feed();
  }

  async fn sign_out(&mut self) {
    // Tear the subscription down first so no stale push lands after the
    // owner is gone, then reset the view to empty.
    self.stop_feed();
    self.records.clear();
    self.records_loaded = false;
    self.list_cursor = 0;
    self.draft.clear();
    self.form_active = false;

    if let Err(e) = self.client.sign_out().await {
      self.status_msg = format!("Error: {e}");
    }

    self.principal_state = PrincipalState::Anonymous;
    self.screen = Screen::Auth;
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL)
      && key.code == KeyCode::Char('c')
    {
      return Ok(false);
    }

    match self.screen {
      Screen::Auth => self.handle_auth_key(key).await,
      Screen::Ledger if self.form_active => self.handle_form_key(key).await,
      Screen::Ledger => self.handle_ledger_key(key).await,
    }
  }

  async fn handle_auth_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => return Ok(false),

      // Switching tabs resets the dialog.
      KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
        self.auth_tab = match self.auth_tab {
          AuthTab::SignIn => AuthTab::Register,
          AuthTab::Register => AuthTab::SignIn,
        };
        self.auth_email.clear();
        self.auth_password.clear();
        self.auth_error = None;
        self.auth_field = AuthField::Email;
      }

      KeyCode::Up | KeyCode::Down => {
        self.auth_field = match self.auth_field {
          AuthField::Email => AuthField::Password,
          AuthField::Password => AuthField::Email,
        };
      }

      KeyCode::Enter => self.submit_auth().await,

      KeyCode::Backspace => {
        self.auth_field_mut().pop();
      }
      KeyCode::Char(c) => {
        self.auth_field_mut().push(c);
      }

      _ => {}
    }
    Ok(true)
  }

  fn auth_field_mut(&mut self) -> &mut String {
    match self.auth_field {
      AuthField::Email => &mut self.auth_email,
      AuthField::Password => &mut self.auth_password,
    }
  }

  async fn submit_auth(&mut self) {
    self.auth_error = None;
    let result = match self.auth_tab {
      AuthTab::SignIn => {
        self
          .client
          .sign_in(&self.auth_email, &self.auth_password)
          .await
      }
      AuthTab::Register => {
        self
          .client
          .sign_up(&self.auth_email, &self.auth_password)
          .await
      }
    };

    match result {
      Ok(principal) => self.enter_ledger(principal),
      // The provider's message, verbatim; state stays unauthenticated.
      Err(e) => self.auth_error = Some(e.to_string()),
    }
  }

  async fn handle_ledger_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Down | KeyCode::Char('j') => {
        if !self.records.is_empty() && self.list_cursor + 1 < self.records.len()
        {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.list_cursor > 0 {
          self.list_cursor -= 1;
        }
      }

      KeyCode::Char('a') => {
        self.form_active = true;
        self.form_field = FormField::Name;
      }

      KeyCode::Char('d') | KeyCode::Delete => self.remove_selected().await,

      KeyCode::Char('r') => self.refresh().await,

      KeyCode::Char('o') => self.sign_out().await,

      _ => {}
    }
    Ok(true)
  }

  async fn handle_form_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => self.form_active = false,

      KeyCode::Tab | KeyCode::Down => {
        self.form_field = match self.form_field {
          FormField::Name => FormField::Price,
          FormField::Price => FormField::DueDate,
          FormField::DueDate => FormField::Name,
        };
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.form_field = match self.form_field {
          FormField::Name => FormField::DueDate,
          FormField::Price => FormField::Name,
          FormField::DueDate => FormField::Price,
        };
      }

      KeyCode::Enter => self.submit_record().await,

      KeyCode::Backspace => {
        self.form_field_mut().pop();
      }
      KeyCode::Char(c) => {
        self.form_field_mut().push(c);
      }

      _ => {}
    }
    Ok(true)
  }

  fn form_field_mut(&mut self) -> &mut String {
    match self.form_field {
      FormField::Name => &mut self.draft.name,
      FormField::Price => &mut self.draft.price,
      FormField::DueDate => &mut self.draft.due_date,
    }
  }

  async fn submit_record(&mut self) {
    let Some(owner) =
      self.principal_state.principal().map(|p| p.principal_id)
    else {
      return;
    };
    // Missing or invalid fields: refuse to submit, no message.
    let Some(input) = self.draft.parse(owner) else {
      return;
    };

    match self
      .client
      .add_record(&input.name, input.price, input.due_date)
      .await
    {
      Ok(_) => {
        // Submission accepted: clear the form now. The list itself updates
        // later, when the feed pushes the new snapshot.
        self.draft.clear();
        self.form_field = FormField::Name;
        self.status_msg = String::new();
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  /// Remove the record under the cursor. No confirmation step; the list
  /// shrinks when the feed push arrives.
  async fn remove_selected(&mut self) {
    let Some(record) = self.records.get(self.list_cursor) else {
      return;
    };
    if let Err(e) = self.client.remove_record(record.record_id).await {
      self.status_msg = format!("Error: {e}");
    }
  }

  /// Manual reload, for when the feed connection is down.
  async fn refresh(&mut self) {
    match self.client.list_records().await {
      Ok(records) => {
        self.replace_records(records);
        self.status_msg = String::new();
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }
}
