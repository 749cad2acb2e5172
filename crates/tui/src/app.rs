use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ejaice_core::{
    export,
    listview::{self, SortOrder},
    models::{Card, StorageEntry, UserProfile},
    report::{self, DashboardSummary},
    scan::{ScanConfig, ScanEvent, ScanState, Scanner},
    ApiClient, ApiError, AppConfig, SessionEvent,
};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Login,
    Dashboard,
    Cards,
    Users,
    Storages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginField {
    Phone,
    Password,
}

/// Results of background fetches, applied only when their generation
/// still matches the live view.
enum DataEvent {
    Dashboard(Result<DashboardSummary, ApiError>),
    Cards(Result<Vec<Card>, ApiError>),
    Users(Result<Vec<UserProfile>, ApiError>),
    Storages(Result<Vec<StorageEntry>, ApiError>),
    LoggedIn(Result<UserProfile, ApiError>),
    CardRegistered(Result<String, ApiError>),
}

enum AppEvent {
    Input(Event),
    Tick,
    Session(SessionEvent),
    Scan(ScanEvent),
    Data { generation: u64, event: DataEvent },
}

/// Search/sort/page state for one list screen.
#[derive(Default)]
struct ListPane {
    search: String,
    searching: bool,
    order: SortOrder,
    page: usize,
}

pub struct ConsoleApp {
    client: ApiClient,
    config: AppConfig,
    screen: Screen,
    status: String,
    loading: bool,
    should_quit: bool,
    /// Bumped on every refresh and screen change; responses from older
    /// generations are stale and dropped instead of applied.
    generation: u64,
    dashboard: Option<DashboardSummary>,
    cards: Vec<Card>,
    users: Vec<UserProfile>,
    storages: Vec<StorageEntry>,
    cards_pane: ListPane,
    users_pane: ListPane,
    storages_pane: ListPane,
    phone: String,
    password: String,
    login_field: LoginField,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    session_rx: Option<mpsc::Receiver<SessionEvent>>,
    scan_state: ScanState,
    scan_cancel: Option<CancellationToken>,
}

impl ConsoleApp {
    pub fn new(client: ApiClient, config: AppConfig) -> Self {
        let screen = if client.session().is_authenticated() {
            Screen::Dashboard
        } else {
            Screen::Login
        };
        Self {
            client,
            config,
            screen,
            status: "Ready".to_string(),
            loading: false,
            should_quit: false,
            generation: 0,
            dashboard: None,
            cards: Vec::new(),
            users: Vec::new(),
            storages: Vec::new(),
            cards_pane: ListPane::default(),
            users_pane: ListPane::default(),
            storages_pane: ListPane::default(),
            phone: String::new(),
            password: String::new(),
            login_field: LoginField::Phone,
            event_tx: None,
            session_rx: None,
            scan_state: ScanState::Idle,
            scan_cancel: None,
        }
    }

    pub fn attach_session_events(&mut self, receiver: mpsc::Receiver<SessionEvent>) {
        self.session_rx = Some(receiver);
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        if let Some(mut session_rx) = self.session_rx.take() {
            let forward = event_tx.clone();
            spawn(async move {
                while let Some(event) = session_rx.recv().await {
                    if forward.send(AppEvent::Session(event)).await.is_err() {
                        break;
                    }
                }
            });
        }
        self.event_tx = Some(event_tx);

        if self.screen != Screen::Login {
            if let Some(profile) = self.client.session().profile() {
                self.status = format!("Session restored for {}", profile.display_name());
            }
            self.refresh();
        }

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            match event_rx.recv().await {
                Some(event) => self.process_event(event),
                None => break,
            }

            if self.should_quit {
                break;
            }
        }

        self.stop_scan();
        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(Event::Key(key)) => self.handle_key(key),
            AppEvent::Input(_) | AppEvent::Tick => {}
            AppEvent::Session(SessionEvent::Expired) => {
                self.stop_scan();
                self.screen = Screen::Login;
                self.password.clear();
                self.loading = false;
                self.status = "Session expired, please log in again".to_string();
            }
            AppEvent::Scan(event) => self.handle_scan_event(event),
            AppEvent::Data { generation, event } => {
                if generation != self.generation {
                    info!("dropping stale response from generation {generation}");
                    return;
                }
                self.apply_data(event);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.screen == Screen::Login {
            self.handle_login_key(key);
            return;
        }

        if self.pane().searching {
            match key.code {
                KeyCode::Esc => {
                    let pane = self.pane_mut();
                    pane.searching = false;
                    pane.search.clear();
                    pane.page = 0;
                }
                KeyCode::Enter => self.pane_mut().searching = false,
                KeyCode::Backspace => {
                    let pane = self.pane_mut();
                    pane.search.pop();
                    pane.page = 0;
                }
                KeyCode::Char(ch) => {
                    let pane = self.pane_mut();
                    pane.search.push(ch);
                    pane.page = 0;
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.switch_screen(Screen::Dashboard),
            KeyCode::Char('2') => self.switch_screen(Screen::Cards),
            KeyCode::Char('3') => self.switch_screen(Screen::Users),
            KeyCode::Char('4') => self.switch_screen(Screen::Storages),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('/') => {
                if self.screen != Screen::Dashboard {
                    self.pane_mut().searching = true;
                }
            }
            KeyCode::Char('s') => {
                if self.screen != Screen::Dashboard {
                    let pane = self.pane_mut();
                    pane.order = pane.order.toggled();
                }
            }
            KeyCode::Char('n') | KeyCode::Right => {
                if self.screen != Screen::Dashboard {
                    let pane = self.pane_mut();
                    pane.page = pane.page.saturating_add(1);
                }
            }
            KeyCode::Char('p') | KeyCode::Left => {
                if self.screen != Screen::Dashboard {
                    let pane = self.pane_mut();
                    pane.page = pane.page.saturating_sub(1);
                }
            }
            KeyCode::Char('e') => self.export(false),
            KeyCode::Char('t') => self.export(true),
            KeyCode::Char('c') => self.toggle_scan(),
            KeyCode::Char('l') => self.logout(),
            _ => {}
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
                self.login_field = match self.login_field {
                    LoginField::Phone => LoginField::Password,
                    LoginField::Password => LoginField::Phone,
                };
            }
            KeyCode::Backspace => {
                match self.login_field {
                    LoginField::Phone => self.phone.pop(),
                    LoginField::Password => self.password.pop(),
                };
            }
            KeyCode::Char(ch) => match self.login_field {
                LoginField::Phone => self.phone.push(ch),
                LoginField::Password => self.password.push(ch),
            },
            KeyCode::Enter => self.submit_login(),
            KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        if self.phone.is_empty() || self.password.is_empty() {
            self.status = "Enter phone and password".to_string();
            return;
        }
        self.loading = true;
        self.status = "Logging in...".to_string();
        let generation = self.bump_generation();
        let client = self.client.clone();
        let phone = self.phone.clone();
        let password = self.password.clone();
        let Some(sender) = self.event_tx.clone() else { return };
        spawn(async move {
            let result = client.auth().login(&phone, &password).await;
            let _ = sender
                .send(AppEvent::Data {
                    generation,
                    event: DataEvent::LoggedIn(result),
                })
                .await;
        });
    }

    fn logout(&mut self) {
        self.stop_scan();
        let client = self.client.clone();
        spawn(async move {
            if let Err(err) = client.auth().logout().await {
                error!("logout failed: {err}");
            }
        });
        self.screen = Screen::Login;
        self.password.clear();
        self.status = "Logged out".to_string();
        self.bump_generation();
    }

    fn switch_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.refresh();
        }
    }

    fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Re-fetch the current screen's data. Mutations elsewhere in the app
    /// always funnel back through here rather than patching local state.
    fn refresh(&mut self) {
        let generation = self.bump_generation();
        let client = self.client.clone();
        let Some(sender) = self.event_tx.clone() else { return };
        self.loading = true;

        let screen = self.screen;
        spawn(async move {
            let event = match screen {
                Screen::Login => return,
                Screen::Dashboard => DataEvent::Dashboard(report::load_dashboard(&client).await),
                Screen::Cards => DataEvent::Cards(client.cards().list().await),
                Screen::Users => DataEvent::Users(client.users().list().await),
                Screen::Storages => DataEvent::Storages(client.storages().list().await),
            };
            let _ = sender.send(AppEvent::Data { generation, event }).await;
        });
    }

    fn apply_data(&mut self, event: DataEvent) {
        self.loading = false;
        match event {
            DataEvent::Dashboard(Ok(summary)) => {
                self.status = format!(
                    "Dashboard updated at {}",
                    Utc::now().format("%H:%M:%S")
                );
                self.dashboard = Some(summary);
            }
            DataEvent::Cards(Ok(cards)) => {
                self.status = format!("{} cards", cards.len());
                self.cards = cards;
            }
            DataEvent::Users(Ok(users)) => {
                self.status = format!("{} members", users.len());
                self.users = users;
            }
            DataEvent::Storages(Ok(storages)) => {
                self.status = format!("{} storage entries", storages.len());
                self.storages = storages;
            }
            DataEvent::LoggedIn(Ok(profile)) => {
                self.status = format!("Welcome, {}", profile.display_name());
                self.password.clear();
                self.screen = Screen::Dashboard;
                self.refresh();
            }
            DataEvent::CardRegistered(Ok(message)) => {
                self.status = message;
                if self.screen == Screen::Cards {
                    self.refresh();
                }
            }
            DataEvent::Dashboard(Err(err))
            | DataEvent::Cards(Err(err))
            | DataEvent::Users(Err(err))
            | DataEvent::Storages(Err(err))
            | DataEvent::LoggedIn(Err(err))
            | DataEvent::CardRegistered(Err(err)) => {
                self.status = err.user_message();
            }
        }
    }

    fn toggle_scan(&mut self) {
        if self.scan_cancel.is_some() {
            self.stop_scan();
            self.status = "Scan stopped".to_string();
            return;
        }

        let Some(sender) = self.event_tx.clone() else { return };
        let cancel = CancellationToken::new();
        let scanner = Scanner::new(ScanConfig {
            device: self.config.scan_device.clone(),
            fallback: self.config.scan_fallback,
        });
        let (scan_tx, mut scan_rx) = mpsc::channel(16);
        let forward = sender.clone();
        spawn(async move {
            while let Some(event) = scan_rx.recv().await {
                if forward.send(AppEvent::Scan(event)).await.is_err() {
                    break;
                }
            }
        });
        let task_cancel = cancel.clone();
        spawn(async move {
            if let Err(err) = scanner.run(scan_tx, task_cancel).await {
                error!("scanner failed: {err}");
            }
        });

        self.scan_cancel = Some(cancel);
        self.scan_state = ScanState::Connecting;
        self.status = "Waiting for card reader...".to_string();
    }

    fn stop_scan(&mut self) {
        if let Some(cancel) = self.scan_cancel.take() {
            cancel.cancel();
        }
        self.scan_state = ScanState::Idle;
    }

    fn handle_scan_event(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Connected => {
                self.scan_state = ScanState::Listening;
                self.status = "Card reader connected".to_string();
            }
            ScanEvent::Card(frame) => {
                self.status = format!("Scanned card {}", frame.card_uuid);
                let generation = self.generation;
                let client = self.client.clone();
                let Some(sender) = self.event_tx.clone() else { return };
                spawn(async move {
                    let result = client
                        .cards()
                        .initial_card_setup(&frame.card_uuid)
                        .await
                        .map(|response| {
                            format!("Card {} registered", response.uuid)
                        });
                    let _ = sender
                        .send(AppEvent::Data {
                            generation,
                            event: DataEvent::CardRegistered(result),
                        })
                        .await;
                });
            }
            ScanEvent::Disconnected => {
                self.scan_state = ScanState::Idle;
                self.scan_cancel = None;
                self.status = "Card reader disconnected".to_string();
            }
            ScanEvent::Failed(message) => {
                self.scan_state = ScanState::Idle;
                self.scan_cancel = None;
                self.status = format!("Scan failed: {message}");
            }
        }
    }

    fn export(&mut self, as_table: bool) {
        let dir = dirs::download_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| std::path::PathBuf::from("."));
        let result = match self.screen {
            Screen::Cards => {
                let items = self.visible_cards();
                if as_table {
                    export::write_table(&dir, "Cards", &items)
                } else {
                    export::write_csv(&dir, &items)
                }
            }
            Screen::Users => {
                let items = self.visible_users();
                if as_table {
                    export::write_table(&dir, "Members", &items)
                } else {
                    export::write_csv(&dir, &items)
                }
            }
            Screen::Storages => {
                let items = self.visible_storages();
                if as_table {
                    export::write_table(&dir, "Storage", &items)
                } else {
                    export::write_csv(&dir, &items)
                }
            }
            _ => return,
        };
        match result {
            Ok(path) => self.status = format!("Exported {}", path.display()),
            Err(err) => self.status = format!("Export failed: {err}"),
        }
    }

    fn pane(&self) -> &ListPane {
        match self.screen {
            Screen::Users => &self.users_pane,
            Screen::Storages => &self.storages_pane,
            _ => &self.cards_pane,
        }
    }

    fn pane_mut(&mut self) -> &mut ListPane {
        match self.screen {
            Screen::Users => &mut self.users_pane,
            Screen::Storages => &mut self.storages_pane,
            _ => &mut self.cards_pane,
        }
    }

    /// The cards list as currently filtered and sorted; the same sequence
    /// drives both the table and the export.
    fn visible_cards(&self) -> Vec<Card> {
        let mut items = listview::filter(&self.cards, &self.cards_pane.search);
        listview::sort_by_key(&mut items, self.cards_pane.order, |card| {
            card.name_on_card.to_lowercase()
        });
        items
    }

    fn visible_users(&self) -> Vec<UserProfile> {
        let mut items = listview::filter(&self.users, &self.users_pane.search);
        listview::sort_by_key(&mut items, self.users_pane.order, |user| {
            (user.first_name.to_lowercase(), user.last_name.to_lowercase())
        });
        items
    }

    fn visible_storages(&self) -> Vec<StorageEntry> {
        let mut items = listview::filter(&self.storages, &self.storages_pane.search);
        listview::sort_by_key(&mut items, self.storages_pane.order, |entry| entry.check_in);
        items
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(4),
                Constraint::Length(3),
            ])
            .split(frame.size());

        self.draw_header(frame, chunks[0]);
        match self.screen {
            Screen::Login => self.draw_login(frame, chunks[1]),
            Screen::Dashboard => self.draw_dashboard(frame, chunks[1]),
            Screen::Cards => self.draw_cards(frame, chunks[1]),
            Screen::Users => self.draw_users(frame, chunks[1]),
            Screen::Storages => self.draw_storages(frame, chunks[1]),
        }
        self.draw_status(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let operator = self
            .client
            .session()
            .profile()
            .map(|profile| profile.display_name())
            .unwrap_or_else(|| "not logged in".to_string());
        let tabs = match self.screen {
            Screen::Login => Line::from("Eja-iCe operator console"),
            _ => Line::from(vec![
                Span::styled("Eja-iCe", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  [1] Dashboard  [2] Cards  [3] Members  [4] Storage  "),
                Span::styled(operator, Style::default().fg(Color::Cyan)),
            ]),
        };
        let header = Paragraph::new(tabs)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Left);
        frame.render_widget(header, area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let scan = match self.scan_state {
            ScanState::Idle => "",
            ScanState::Connecting => "  scan: connecting",
            ScanState::Listening => "  scan: listening",
        };
        let loading = if self.loading { "  loading..." } else { "" };
        let line = Line::from(vec![
            Span::raw(self.status.clone()),
            Span::styled(loading, Style::default().fg(Color::Yellow)),
            Span::styled(scan, Style::default().fg(Color::Green)),
        ]);
        let help = "q quit  r refresh  / search  s sort  n/p page  e csv  t table  c scan  l logout";
        let status = Paragraph::new(vec![line, Line::from(Span::styled(
            help,
            Style::default().fg(Color::DarkGray),
        ))])
        .block(Block::default().borders(Borders::TOP));
        frame.render_widget(status, area);
    }

    fn draw_login(&self, frame: &mut Frame, area: Rect) {
        let form = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(centered(area, 50, 9));

        let field = |label: &str, value: &str, active: bool| {
            let style = if active {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            Paragraph::new(value.to_string())
                .block(Block::default().borders(Borders::ALL).title(label.to_string()))
                .style(style)
        };

        frame.render_widget(
            field("Phone", &self.phone, self.login_field == LoginField::Phone),
            form[0],
        );
        let masked = "*".repeat(self.password.len());
        frame.render_widget(
            field("Password", &masked, self.login_field == LoginField::Password),
            form[1],
        );
        frame.render_widget(
            Paragraph::new("Enter to log in, Tab to switch fields, Esc to quit")
                .style(Style::default().fg(Color::DarkGray)),
            form[2],
        );
    }

    fn draw_dashboard(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(3)])
            .split(area);
        let tiles = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
            ])
            .split(rows[0]);

        let tile = |title: &str, value: String| {
            Paragraph::new(Line::from(Span::styled(
                value,
                Style::default().add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        };

        match &self.dashboard {
            Some(summary) => {
                frame.render_widget(
                    tile("Total cards", summary.total_cards.to_string()),
                    tiles[0],
                );
                frame.render_widget(
                    tile("Active cards", summary.active_cards.to_string()),
                    tiles[1],
                );
                frame.render_widget(
                    tile("Active storage", summary.active_storages.to_string()),
                    tiles[2],
                );
                frame.render_widget(
                    tile("Total balance", summary.total_balance.to_string()),
                    tiles[3],
                );

                let entries: Vec<Row> = summary
                    .recent_transactions
                    .iter()
                    .map(|tx| {
                        Row::new(vec![
                            Cell::from(tx.created.format("%Y-%m-%d %H:%M").to_string()),
                            Cell::from(format!("{:?}", tx.direction)),
                            Cell::from(tx.signed_amount().to_string()),
                            Cell::from(tx.description.clone()),
                        ])
                    })
                    .collect();
                let table = Table::new(
                    entries,
                    [
                        Constraint::Length(17),
                        Constraint::Length(7),
                        Constraint::Length(12),
                        Constraint::Min(10),
                    ],
                )
                .header(
                    Row::new(vec!["When", "Type", "Amount", "Description"])
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                )
                .block(Block::default().borders(Borders::ALL).title("Recent activity"));
                frame.render_widget(table, rows[1]);
            }
            None => {
                frame.render_widget(
                    Paragraph::new("Loading dashboard... press r to retry")
                        .alignment(Alignment::Center),
                    rows[1],
                );
            }
        }
    }

    fn draw_cards(&self, frame: &mut Frame, area: Rect) {
        let items = self.visible_cards();
        let page = listview::paginate(&items, self.cards_pane.page, self.config.page_size);
        let rows: Vec<Row> = page
            .items
            .iter()
            .map(|card| {
                Row::new(vec![
                    Cell::from(card.uuid.to_string()),
                    Cell::from(card.name_on_card.clone()),
                    Cell::from(card.user_name.clone().unwrap_or_default()),
                    Cell::from(card.user_phone.clone().unwrap_or_default()),
                    Cell::from(
                        card.balance
                            .map(|balance| balance.to_string())
                            .unwrap_or_default(),
                    ),
                    Cell::from(if card.is_blocked { "blocked" } else { "active" }),
                ])
            })
            .collect();
        self.draw_list(
            frame,
            area,
            "Cards",
            &["UUID", "Name", "Holder", "Phone", "Balance", "Status"],
            [
                Constraint::Length(36),
                Constraint::Length(16),
                Constraint::Length(18),
                Constraint::Length(14),
                Constraint::Length(12),
                Constraint::Length(8),
            ]
            .to_vec(),
            rows,
            &page,
            &self.cards_pane,
        );
    }

    fn draw_users(&self, frame: &mut Frame, area: Rect) {
        let items = self.visible_users();
        let page = listview::paginate(&items, self.users_pane.page, self.config.page_size);
        let rows: Vec<Row> = page
            .items
            .iter()
            .map(|user| {
                Row::new(vec![
                    Cell::from(user.display_name()),
                    Cell::from(user.phone.clone()),
                    Cell::from(user.address.clone()),
                ])
            })
            .collect();
        self.draw_list(
            frame,
            area,
            "Members",
            &["Name", "Phone", "Address"],
            [
                Constraint::Length(24),
                Constraint::Length(14),
                Constraint::Min(20),
            ]
            .to_vec(),
            rows,
            &page,
            &self.users_pane,
        );
    }

    fn draw_storages(&self, frame: &mut Frame, area: Rect) {
        let now = Utc::now();
        let items = self.visible_storages();
        let page = listview::paginate(&items, self.storages_pane.page, self.config.page_size);
        let rows: Vec<Row> = page
            .items
            .iter()
            .map(|entry| {
                Row::new(vec![
                    Cell::from(entry.commodity.clone()),
                    Cell::from(entry.user_name.clone().unwrap_or_default()),
                    Cell::from(format!("{} kg", entry.weight)),
                    Cell::from(entry.check_in.format("%Y-%m-%d %H:%M").to_string()),
                    Cell::from(if entry.is_active() { "active" } else { "out" }),
                    // Preview only; the checkout response carries the charge.
                    Cell::from(report::estimate_cost(entry, now).to_string()),
                ])
            })
            .collect();
        self.draw_list(
            frame,
            area,
            "Storage",
            &["Commodity", "Holder", "Weight", "Check-in", "State", "Est. cost"],
            [
                Constraint::Length(18),
                Constraint::Length(18),
                Constraint::Length(10),
                Constraint::Length(17),
                Constraint::Length(7),
                Constraint::Length(12),
            ]
            .to_vec(),
            rows,
            &page,
            &self.storages_pane,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_list<T>(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        headers: &[&str],
        widths: Vec<Constraint>,
        rows: Vec<Row>,
        page: &listview::Page<T>,
        pane: &ListPane,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let search_label = if pane.searching {
            format!("Search (typing): {}", pane.search)
        } else if pane.search.is_empty() {
            "Search: press / to filter".to_string()
        } else {
            format!("Search: {}", pane.search)
        };
        frame.render_widget(
            Paragraph::new(search_label).block(Block::default().borders(Borders::ALL)),
            chunks[0],
        );

        if page.is_empty() {
            // Empty state: no rows, no pagination footer.
            frame.render_widget(
                Paragraph::new("No records match")
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL).title(title.to_string())),
                chunks[1],
            );
            return;
        }

        let order = match pane.order {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        };
        let footer = format!(
            "{title} | page {}/{} | {} records | sort {order}",
            page.page + 1,
            page.pages,
            page.total
        );
        let table = Table::new(rows, widths)
            .header(
                Row::new(headers.iter().map(|header| Cell::from(*header)))
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(Block::default().borders(Borders::ALL).title(footer));
        frame.render_widget(table, chunks[1]);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ejaice_core::{scan::ScanFrame, SessionStore};
    use std::sync::Arc;

    fn test_app() -> ConsoleApp {
        let config = AppConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout_secs: 1,
            page_size: 10,
            scan_device: None,
            scan_fallback: false,
        };
        let (tx, _rx) = mpsc::channel(4);
        let client = ApiClient::new(&config, Arc::new(SessionStore::in_memory()), tx).unwrap();
        ConsoleApp::new(client, config)
    }

    #[test]
    fn scan_failure_resets_the_scanner_to_idle() {
        let mut app = test_app();
        app.scan_state = ScanState::Connecting;
        app.scan_cancel = Some(CancellationToken::new());

        app.handle_scan_event(ScanEvent::Failed("no scan device configured".to_string()));

        assert_eq!(app.scan_state, ScanState::Idle);
        assert!(app.scan_cancel.is_none());
        assert!(app.status.contains("no scan device configured"), "status: {}", app.status);
    }

    #[test]
    fn disconnect_also_returns_the_scanner_to_idle() {
        let mut app = test_app();
        app.scan_state = ScanState::Listening;
        app.scan_cancel = Some(CancellationToken::new());

        app.handle_scan_event(ScanEvent::Disconnected);

        assert_eq!(app.scan_state, ScanState::Idle);
        assert!(app.scan_cancel.is_none());
    }

    #[test]
    fn a_scanned_card_updates_the_status_line() {
        let mut app = test_app();
        app.handle_scan_event(ScanEvent::Card(ScanFrame {
            card_uuid: "abc-123".to_string(),
        }));
        assert!(app.status.contains("abc-123"), "status: {}", app.status);
    }
}
