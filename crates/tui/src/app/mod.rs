use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use olla_core::catalog::ModelCatalog;
use olla_core::diag::Diagnostic;
use olla_core::llm::{ChatDelta, ChatError, ChatOpts, ModelClient};
use olla_core::session::{rejection_notice, Accumulator, ChatSession, Flow, PendingTurn, TurnOutcome};
use olla_providers::OllamaClient;
use ratatui::layout::Rect;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::startup::Startup;
use crate::strings::{
    model_cleared, model_fallback, model_not_installed, model_selected, models_refreshed,
    BUSY_REFRESH, BUSY_SELECT, BUSY_SUBMIT, REFRESHING,
};

pub mod chat;
pub mod feed;
pub mod history;
pub mod input;
pub mod picker;

use chat::WrappedEntry;
use feed::{Feed, FeedKind, LiveView};
use input::InputBuffer;
use picker::ModelPickerState;

/// Progress of one generation, tagged with its turn id by the worker.
#[derive(Debug)]
pub enum TurnEvent {
    Delta(ChatDelta),
    Failed(ChatError),
    /// The body ended without a `done` fragment.
    Closed,
}

#[derive(Debug)]
pub enum WorkerEvent {
    Turn(u64, TurnEvent),
    Catalog(ModelCatalog, Vec<Diagnostic>),
}

struct LiveTurn {
    id: u64,
    turn: PendingTurn,
    acc: Accumulator,
    feed_index: usize,
    task: JoinHandle<()>,
}

pub struct App {
    client: OllamaClient,
    rt: Handle,
    tx: Sender<WorkerEvent>,
    rx: Receiver<WorkerEvent>,
    pub session: ChatSession,
    pub catalog: ModelCatalog,
    pub base_url: String,
    pub feed: Feed,
    live: Option<LiveTurn>,
    turn_seq: u64,
    pub refreshing: bool,
    pub input: InputBuffer,
    pub history: Vec<String>,
    pub history_index: Option<usize>,
    pub should_quit: bool,
    pub show_help: bool,
    pub model_picker: Option<ModelPickerState>,
    pub chat_area: Option<Rect>,
    pub chat_scroll: u16,
    pub stick_to_bottom: bool,
    pub chat_viewport: u16,
    pub chat_wrap_width: u16,
    pub chat_cache: Vec<WrappedEntry>,
    pub chat_total_lines: usize,
    pub input_visible_lines: u16,
    pub input_max_lines: u16,
    pub dirty: bool,
}

impl App {
    pub fn new(client: OllamaClient, rt: Handle, startup: Startup) -> Self {
        let (tx, rx) = mpsc::channel();
        let base_url = client.base_url().to_string();
        let mut feed = Feed::default();
        for d in startup.notices {
            feed.push_notice(d);
        }
        Self {
            client,
            rt,
            tx,
            rx,
            session: ChatSession::new(startup.selected),
            catalog: startup.catalog,
            base_url,
            feed,
            live: None,
            turn_seq: 0,
            refreshing: false,
            input: InputBuffer::default(),
            history: Vec::new(),
            history_index: None,
            should_quit: false,
            show_help: false,
            model_picker: None,
            chat_area: None,
            chat_scroll: 0,
            stick_to_bottom: true,
            chat_viewport: 0,
            chat_wrap_width: 0,
            chat_cache: Vec::new(),
            chat_total_lines: 0,
            input_visible_lines: 1,
            input_max_lines: 6,
            dirty: true,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.live.is_some()
    }

    pub fn model_label(&self) -> &str {
        self.session.selected_model().unwrap_or("no model")
    }

    fn notice(&mut self, d: Diagnostic) {
        self.feed.push_notice(d);
        self.stick_to_bottom = true;
        self.dirty = true;
    }

    // Returns true if the text was one of the slash commands. Anything else is a prompt.
    fn try_handle_slash_command(&mut self, text: &str) -> bool {
        let Some(rest) = text.trim().strip_prefix('/') else {
            return false;
        };
        let mut parts = rest.splitn(2, char::is_whitespace);
        let cmd = parts.next().unwrap_or("").to_lowercase();
        let arg = parts.next().unwrap_or("").trim();
        match cmd.as_str() {
            "model" if arg.is_empty() => self.open_model_picker(),
            "model" => self.select_model(arg),
            "refresh" if arg.is_empty() => self.refresh_models(),
            "help" if arg.is_empty() => self.show_help = true,
            _ => return false,
        }
        true
    }

    pub fn submit(&mut self) {
        if self.input.as_str().trim().is_empty() {
            return;
        }
        let text = self.input.as_str().to_string();
        if self.try_handle_slash_command(&text) {
            self.record_history_entry(text.trim());
            self.input.clear();
            self.dirty = true;
            return;
        }
        if self.refreshing {
            self.notice(Diagnostic::warning(BUSY_SUBMIT));
            return;
        }
        let turn = match self.session.begin_turn(&text) {
            Ok(t) => t,
            Err(e) => {
                // Nothing was recorded; the text stays in the editor.
                self.notice(rejection_notice(&e));
                return;
            }
        };
        info!(target: "tui", "submit: model={} input_len={}", turn.model(), text.len());
        self.record_history_entry(&text);
        self.input.clear();

        self.feed.push(FeedKind::User, text.clone());
        let feed_index = self.feed.push(
            FeedKind::Pending {
                model: turn.model().to_string(),
            },
            String::new(),
        );
        self.turn_seq += 1;
        let id = self.turn_seq;
        let task = self.spawn_generation(id, turn.opts(), text);
        self.live = Some(LiveTurn {
            id,
            turn,
            acc: Accumulator::default(),
            feed_index,
            task,
        });
        self.stick_to_bottom = true;
        self.chat_scroll = 0;
        self.dirty = true;
    }

    fn spawn_generation(&self, id: u64, opts: ChatOpts, prompt: String) -> JoinHandle<()> {
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.rt.spawn(async move {
            let send = |ev: TurnEvent| tx.send(WorkerEvent::Turn(id, ev)).is_ok();
            let mut stream = match client.stream_generate(opts, prompt).await {
                Ok(s) => s,
                Err(e) => {
                    error!(target: "tui", "stream start error: {}", e);
                    send(TurnEvent::Failed(e));
                    return;
                }
            };
            while let Some(item) = stream.next().await {
                match item {
                    Ok(ChatDelta::Finish) => {
                        send(TurnEvent::Delta(ChatDelta::Finish));
                        return;
                    }
                    Ok(delta) => {
                        if !send(TurnEvent::Delta(delta)) {
                            return;
                        }
                    }
                    Err(e) => {
                        error!(target: "tui", "stream delta error: {}", e);
                        send(TurnEvent::Failed(e));
                        return;
                    }
                }
            }
            send(TurnEvent::Closed);
        })
    }

    pub fn open_model_picker(&mut self) {
        if self.catalog.is_empty() {
            self.notice(ModelCatalog::empty_warning());
            return;
        }
        if self.session.is_busy() {
            self.notice(Diagnostic::warning(BUSY_SELECT));
            return;
        }
        self.model_picker = Some(ModelPickerState::new(
            self.catalog.models(),
            self.session.selected_model(),
        ));
        self.dirty = true;
    }

    pub fn select_model(&mut self, name: &str) {
        if !self.catalog.contains(name) {
            self.notice(Diagnostic::warning(model_not_installed(name)));
            return;
        }
        match self.session.select_model(Some(name.to_string())) {
            Ok(()) => self.notice(Diagnostic::info(model_selected(name))),
            Err(_) => self.notice(Diagnostic::warning(BUSY_SELECT)),
        }
    }

    pub fn refresh_models(&mut self) {
        if self.session.is_busy() {
            self.notice(Diagnostic::warning(BUSY_REFRESH));
            return;
        }
        if self.refreshing {
            return;
        }
        self.refreshing = true;
        self.notice(Diagnostic::info(REFRESHING));
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.rt.spawn(async move {
            let mut diags = Vec::new();
            let catalog = ModelCatalog::load(&client, &mut diags).await;
            let _ = tx.send(WorkerEvent::Catalog(catalog, diags));
        });
    }

    fn apply_catalog(&mut self, catalog: ModelCatalog, diags: Vec<Diagnostic>) {
        self.refreshing = false;
        for d in diags {
            self.notice(d);
        }
        let current = self.session.selected_model().map(str::to_string);
        let next = catalog.choose(current.as_deref());
        let changed = current != next;
        if !catalog.is_empty() {
            self.notice(Diagnostic::success(models_refreshed(catalog.len())));
        }
        self.catalog = catalog;
        if !changed {
            return;
        }
        if self.session.select_model(next.clone()).is_err() {
            debug!(target: "tui", "selection kept while a turn is running");
            return;
        }
        match (current, next) {
            (Some(wanted), Some(using)) => {
                self.notice(Diagnostic::warning(model_fallback(&wanted, &using)))
            }
            (None, Some(using)) => self.notice(Diagnostic::info(model_selected(&using))),
            (Some(gone), None) => self.notice(Diagnostic::warning(model_cleared(&gone))),
            (None, None) => {}
        }
    }

    fn apply_turn_event(&mut self, id: u64, ev: TurnEvent) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if live.id != id {
            debug!(target: "tui", "dropping event for stale turn {}", id);
            return;
        }
        match ev {
            TurnEvent::Delta(delta) => {
                let mut view = LiveView {
                    feed: &mut self.feed,
                    index: live.feed_index,
                };
                if live.acc.apply(delta, &mut view) == Flow::Stop {
                    self.finish_live(None);
                }
            }
            TurnEvent::Failed(e) => self.finish_live(Some(e)),
            TurnEvent::Closed => self.finish_live(None),
        }
        self.dirty = true;
    }

    fn finish_live(&mut self, failure: Option<ChatError>) {
        let Some(live) = self.live.take() else {
            return;
        };
        let outcome = match failure {
            Some(e) => TurnOutcome::Failed(e),
            None => TurnOutcome::Completed(live.acc.into_text()),
        };
        let mut notices: Vec<Diagnostic> = Vec::new();
        match self.session.finish_turn(live.turn, outcome, &mut notices) {
            Some(msg) => self.feed.settle(live.feed_index, msg.content),
            None => self.feed.remove(live.feed_index),
        }
        for d in notices {
            self.notice(d);
        }
    }

    pub fn insert_text(&mut self, s: &str) {
        if let Some(st) = &mut self.model_picker {
            st.filter.insert(&s.replace(['\r', '\n'], ""));
            st.refilter(self.catalog.models());
        } else if !self.show_help {
            self.input.insert(&s.replace("\r\n", "\n").replace('\r', "\n"));
        }
        self.dirty = true;
    }

    fn on_picker_key(&mut self, key: KeyEvent) {
        let Some(st) = &mut self.model_picker else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.model_picker = None,
            KeyCode::Enter => {
                let choice = st.current().map(str::to_string);
                self.model_picker = None;
                if let Some(m) = choice {
                    self.select_model(&m);
                }
            }
            KeyCode::Up => st.up(),
            KeyCode::Down => st.down(),
            KeyCode::Backspace => {
                st.filter.delete_left();
                st.refilter(self.catalog.models());
            }
            KeyCode::Delete => {
                st.filter.delete_right();
                st.refilter(self.catalog.models());
            }
            KeyCode::Left => st.filter.move_left(),
            KeyCode::Right => st.filter.move_right(),
            KeyCode::Home => st.filter.move_home(),
            KeyCode::End => st.filter.move_end(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                st.filter.insert_char(c);
                st.refilter(self.catalog.models());
            }
            _ => {}
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.dirty = true;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }
        if self.model_picker.is_some() {
            self.on_picker_key(key);
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Char('o') if ctrl => self.open_model_picker(),
            KeyCode::Char('r') if ctrl => self.refresh_models(),
            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
            {
                self.input.insert_char('\n');
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char('a') if ctrl => self.input.move_line_start(),
            KeyCode::Char('e') if ctrl => self.input.move_line_end(),
            KeyCode::Char('w') if ctrl => self.input.delete_prev_word(),
            KeyCode::Char('u') if ctrl => self.input.kill_to_line_start(),
            KeyCode::Char('k') if ctrl => self.input.kill_to_line_end(),
            KeyCode::Char(c) if !ctrl => self.input.insert_char(c),
            KeyCode::Backspace => self.input.delete_left(),
            KeyCode::Delete => self.input.delete_right(),
            KeyCode::Left if ctrl => self.input.move_word_left(),
            KeyCode::Right if ctrl => self.input.move_word_right(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home if ctrl => self.scroll_to_top(),
            KeyCode::End if ctrl => self.scroll_to_bottom(),
            KeyCode::Home => self.input.move_line_start(),
            KeyCode::End => self.input.move_line_end(),
            KeyCode::Up if ctrl => self.scroll_up(1),
            KeyCode::Down if ctrl => self.scroll_down(1),
            KeyCode::Up => self.history_prev(),
            KeyCode::Down => self.history_next(),
            KeyCode::PageUp if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.scroll_up(self.chat_viewport.saturating_mul(2).max(1))
            }
            KeyCode::PageDown if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.scroll_down(self.chat_viewport.saturating_mul(2).max(1))
            }
            KeyCode::PageUp => self.scroll_up(self.chat_viewport.max(1)),
            KeyCode::PageDown => self.scroll_down(self.chat_viewport.max(1)),
            _ => {}
        }
    }

    pub fn on_tick(&mut self) {
        let worker_done = self.live.as_ref().is_some_and(|l| l.task.is_finished());
        for _ in 0..256 {
            match self.rx.try_recv() {
                Ok(WorkerEvent::Turn(id, ev)) => self.apply_turn_event(id, ev),
                Ok(WorkerEvent::Catalog(cat, diags)) => self.apply_catalog(cat, diags),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if worker_done && self.live.is_some() {
            error!(target: "tui", "generation task ended without reporting");
            self.finish_live(Some(ChatError::Other(
                "generation task ended unexpectedly".into(),
            )));
            self.dirty = true;
        }
    }
}
