use crate::{
    actions::CreateEventRequest,
    aggregator::EventSummary,
    client::AppSnapshot,
    rules::{
        self,
        EventState,
        PermissionSet,
    },
};
use alloy::primitives::Address;
use color_eyre::eyre::Result;
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use itertools::Itertools;
use raffyl_abi::{
    format_address,
    format_token_amount,
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthStr;

pub enum UserEvent {
    Quit,
    Redraw,
    Refresh,
    Connect,
    Disconnect,
    Register(Address),
    Fund(Address),
    SelectWinners(Address),
    Disburse(Address),
    Withdraw(Address),
    CreateEvent(CreateEventRequest),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Browse,
    Host,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum View {
    #[default]
    Landing,
    List,
    Detail(Address),
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    CreateModal(CreateState),
    WithdrawModal(Address),
    QuitModal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum CreateField {
    #[default]
    Name,
    Token,
    Prize,
    Winners,
}

#[derive(Clone, Debug)]
struct CreateState {
    focus: CreateField,
    name: String,
    token_idx: usize,
    prize: String,
    winners: String,
}

impl Default for CreateState {
    fn default() -> Self {
        CreateState {
            focus: CreateField::Name,
            name: String::new(),
            token_idx: 0,
            prize: String::new(),
            winners: String::from("3"),
        }
    }
}

pub struct UiState {
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
    view: View,
    tab: Tab,
    selected: usize,
    mode: Mode,
}

impl Default for UiState {
    fn default() -> Self {
        UiState {
            terminal: None,
            view: View::default(),
            tab: Tab::default(),
            selected: 0,
            mode: Mode::Normal,
        }
    }
}

pub type InputEventReceiver = mpsc::UnboundedReceiver<Event>;

/// Forwards raw terminal events from a blocking reader thread into the async
/// main loop.
pub fn input_event_stream() -> InputEventReceiver {
    let (sender, receiver) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            match event::read() {
                Ok(raw) => {
                    if sender.send(raw).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    receiver
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen
    )?;
    // One persistent Terminal so buffers survive across draws.
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

fn visible_events<'a>(state: &UiState, snap: &'a AppSnapshot) -> &'a [EventSummary] {
    match state.tab {
        Tab::Browse => &snap.events,
        Tab::Host => &snap.my_events,
    }
}

fn selected_event(state: &UiState, snap: &AppSnapshot) -> Option<EventSummary> {
    visible_events(state, snap).get(state.selected).cloned()
}

fn find_event(snap: &AppSnapshot, address: Address) -> Option<EventSummary> {
    snap.events
        .iter()
        .chain(snap.my_events.iter())
        .find(|event| event.address == address)
        .cloned()
}

pub fn interpret_event(
    state: &mut UiState,
    raw: Event,
    snap: &AppSnapshot,
) -> Option<UserEvent> {
    let Event::Key(key) = raw else {
        return Some(UserEvent::Redraw);
    };
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match &mut state.mode {
        Mode::QuitModal => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::WithdrawModal(address) => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let address = *address;
                state.mode = Mode::Normal;
                Some(UserEvent::Withdraw(address))
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::CreateModal(form) => match key.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Tab | KeyCode::Down => {
                form.focus = match form.focus {
                    CreateField::Name => CreateField::Token,
                    CreateField::Token => CreateField::Prize,
                    CreateField::Prize => CreateField::Winners,
                    CreateField::Winners => CreateField::Name,
                };
                Some(UserEvent::Redraw)
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus = match form.focus {
                    CreateField::Name => CreateField::Winners,
                    CreateField::Token => CreateField::Name,
                    CreateField::Prize => CreateField::Token,
                    CreateField::Winners => CreateField::Prize,
                };
                Some(UserEvent::Redraw)
            }
            KeyCode::Left if form.focus == CreateField::Token => {
                let count = snap.tokens.len().max(1);
                form.token_idx = (form.token_idx + count - 1) % count;
                Some(UserEvent::Redraw)
            }
            KeyCode::Right if form.focus == CreateField::Token => {
                let count = snap.tokens.len().max(1);
                form.token_idx = (form.token_idx + 1) % count;
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let token = snap.tokens.get(form.token_idx)?.clone();
                let request = CreateEventRequest {
                    name: form.name.clone(),
                    token,
                    prize_amount: form.prize.clone(),
                    winner_count: form.winners.parse().unwrap_or(0),
                };
                state.mode = Mode::Normal;
                Some(UserEvent::CreateEvent(request))
            }
            KeyCode::Backspace => {
                match form.focus {
                    CreateField::Name => {
                        form.name.pop();
                    }
                    CreateField::Prize => {
                        form.prize.pop();
                    }
                    CreateField::Winners => {
                        form.winners.pop();
                    }
                    CreateField::Token => {}
                }
                Some(UserEvent::Redraw)
            }
            KeyCode::Char(c) => {
                match form.focus {
                    CreateField::Name => form.name.push(c),
                    CreateField::Prize => {
                        if c.is_ascii_digit() || (c == '.' && !form.prize.contains('.'))
                        {
                            form.prize.push(c);
                        }
                    }
                    CreateField::Winners => {
                        if c.is_ascii_digit() && form.winners.len() < 3 {
                            form.winners.push(c);
                        }
                    }
                    CreateField::Token => {}
                }
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::Normal => interpret_normal(state, key.code, snap),
    }
}

fn interpret_normal(
    state: &mut UiState,
    code: KeyCode,
    snap: &AppSnapshot,
) -> Option<UserEvent> {
    if state.view == View::Landing {
        return match code {
            KeyCode::Char('q') => Some(UserEvent::Quit),
            KeyCode::Char('c') => Some(UserEvent::Connect),
            KeyCode::Enter | KeyCode::Char(' ') => {
                state.view = View::List;
                Some(UserEvent::Redraw)
            }
            _ => None,
        };
    }

    // Keys shared by the list and detail views.
    match code {
        KeyCode::Char('q') => {
            state.mode = Mode::QuitModal;
            return Some(UserEvent::Redraw);
        }
        KeyCode::Char('r') => return Some(UserEvent::Refresh),
        KeyCode::Char('c') => return Some(UserEvent::Connect),
        KeyCode::Char('d') => return Some(UserEvent::Disconnect),
        _ => {}
    }

    match state.view {
        View::Landing => None,
        View::List => match code {
            KeyCode::Tab | KeyCode::Char('1') | KeyCode::Char('2') => {
                state.tab = match (code, state.tab) {
                    (KeyCode::Char('1'), _) => Tab::Browse,
                    (KeyCode::Char('2'), _) => Tab::Host,
                    (_, Tab::Browse) => Tab::Host,
                    (_, Tab::Host) => Tab::Browse,
                };
                state.selected = 0;
                Some(UserEvent::Redraw)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let count = visible_events(state, snap).len();
                if count > 0 {
                    state.selected = (state.selected + 1).min(count - 1);
                }
                Some(UserEvent::Redraw)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                state.selected = state.selected.saturating_sub(1);
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let event = selected_event(state, snap)?;
                state.view = View::Detail(event.address);
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('n') if state.tab == Tab::Host => {
                if snap.is_connected {
                    state.mode = Mode::CreateModal(CreateState::default());
                }
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        View::Detail(address) => {
            let event = find_event(snap, address)?;
            let permissions = rules::permissions(&event, snap.account);
            match code {
                KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                    state.view = View::List;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Char('e') if permissions.can_register => {
                    Some(UserEvent::Register(address))
                }
                KeyCode::Char('f') if permissions.can_fund => {
                    Some(UserEvent::Fund(address))
                }
                KeyCode::Char('s') if permissions.can_select_winners => {
                    Some(UserEvent::SelectWinners(address))
                }
                KeyCode::Char('p') if permissions.can_disburse => {
                    Some(UserEvent::Disburse(address))
                }
                KeyCode::Char('w') if permissions.can_withdraw => {
                    state.mode = Mode::WithdrawModal(address);
                    Some(UserEvent::Redraw)
                }
                _ => None,
            }
        }
    }
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    // Keep the cursor on a row that still exists after a refresh.
    let count = visible_events(state, snap).len();
    if count == 0 {
        state.selected = 0;
    } else if state.selected >= count {
        state.selected = count - 1;
    }

    if let Some(mut terminal) = state.terminal.take() {
        terminal.draw(|frame| ui(frame, state, snap))?;
        state.terminal = Some(terminal);
    }
    Ok(())
}

fn ui(frame: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    match state.view {
        View::Landing => draw_landing(frame, snap),
        View::List => draw_list(frame, state, snap),
        View::Detail(address) => match find_event(snap, address) {
            Some(event) => draw_detail(frame, snap, &event),
            None => draw_list(frame, state, snap),
        },
    }

    match &state.mode {
        Mode::Normal => {}
        Mode::CreateModal(form) => draw_create_modal(frame, snap, form),
        Mode::WithdrawModal(address) => draw_withdraw_modal(frame, *address),
        Mode::QuitModal => draw_quit_modal(frame),
    }
}

fn state_color(state: EventState) -> Color {
    match state {
        EventState::Open => Color::Green,
        EventState::WinnersSelected => Color::Blue,
        EventState::Completed => Color::DarkGray,
    }
}

fn truncated(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + 1 >= max_width {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

fn header_lines(snap: &AppSnapshot) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    lines.push(Line::from(vec![
        Span::styled(
            "Raffyl",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" — on-chain raffle events · "),
        Span::styled(
            format!("{} (chain {})", snap.network_name, snap.chain_id),
            Style::default().fg(Color::Cyan),
        ),
    ]));

    let account_line = match snap.account {
        Some(account) => {
            let balance = snap
                .native_balance
                .map(|balance| {
                    format!(
                        " · {} {}",
                        format_token_amount(balance, snap.native_decimals),
                        snap.native_symbol
                    )
                })
                .unwrap_or_default();
            Line::from(vec![
                Span::raw("Account "),
                Span::styled(
                    format_address(account),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(balance),
            ])
        }
        None if snap.is_connecting => Line::from("Connecting wallet..."),
        None => Line::from("Not connected — press c to connect"),
    };
    lines.push(account_line);

    let refreshed = snap
        .last_refresh
        .as_deref()
        .map(|at| format!(" · refreshed {at}"))
        .unwrap_or_default();
    lines.push(Line::from(format!("{}{}", snap.status, refreshed)));

    if let Some(error) = snap.connection_error.as_deref().or(snap.errors.first().map(String::as_str))
    {
        lines.push(Line::from(Span::styled(
            truncated(error, 120),
            Style::default().fg(Color::Red),
        )));
    }
    if let Some(tx) = snap.last_tx.as_deref() {
        lines.push(Line::from(Span::styled(
            format!("tx {tx}"),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

fn draw_landing(frame: &mut Frame, snap: &AppSnapshot) {
    let area = frame.area();
    let block = Block::default().borders(Borders::ALL).title(" Raffyl ");
    let connect_hint = if snap.is_connected {
        "Wallet connected."
    } else {
        "Press c to connect a wallet (read-only browsing works without one)."
    };
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Raffyl — decentralized raffles",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Create an event with prize details, fund it with tokens,"),
        Line::from("let participants register, select random winners on-chain,"),
        Line::from("and disburse prizes straight from the event contract."),
        Line::from(""),
        Line::from(format!(
            "Network: {} (chain {})",
            snap.network_name, snap.chain_id
        )),
        Line::from(connect_hint),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to browse events · q to quit",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_list(frame: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_lines(snap))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let tabs = Tabs::new(vec!["Browse [1]", "Host [2]"])
        .select(match state.tab {
            Tab::Browse => 0,
            Tab::Host => 1,
        })
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, chunks[1]);

    let events = visible_events(state, snap);
    if events.is_empty() {
        let message = match state.tab {
            Tab::Browse if !snap.is_connected => {
                "No events loaded. Press r to refresh."
            }
            Tab::Browse => "No events found. Create the first one in the Host tab!",
            Tab::Host if !snap.is_connected => {
                "Connect a wallet to see the events you organize."
            }
            Tab::Host => "You organize no events yet. Press n to create one.",
        };
        let empty = Paragraph::new(message)
            .block(Block::default().borders(Borders::ALL).title(" Events "));
        frame.render_widget(empty, chunks[2]);
    } else {
        let rows: Vec<Row> = events
            .iter()
            .enumerate()
            .map(|(index, event)| {
                let mut flags: Vec<&str> = Vec::new();
                if snap.account == Some(event.organizer) {
                    flags.push("HOST");
                }
                if event.is_user_registered {
                    flags.push("IN");
                }
                if event.is_user_winner {
                    flags.push("WON");
                }
                let style = if index == state.selected {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(truncated(&event.name, 28)),
                    Cell::from(event.state.label())
                        .style(Style::default().fg(state_color(event.state))),
                    Cell::from(format!(
                        "{} {}",
                        format_token_amount(event.prize_amount, event.token_decimals),
                        event.token_symbol
                    )),
                    Cell::from(format!(
                        "{}/{}",
                        event.winners.len(),
                        event.winner_count
                    )),
                    Cell::from(event.participant_count().to_string()),
                    Cell::from(if event.is_funded { "funded" } else { "unfunded" }),
                    Cell::from(flags.join("/")),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(30),
                Constraint::Length(18),
                Constraint::Length(16),
                Constraint::Length(9),
                Constraint::Length(9),
                Constraint::Length(9),
                Constraint::Min(6),
            ],
        )
        .header(
            Row::new(vec![
                "Name", "State", "Prize", "Winners", "Entrants", "Funding", "",
            ])
            .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(" Events "));
        frame.render_widget(table, chunks[2]);
    }

    let hints = [
        Some("enter: details"),
        Some("tab: switch tab"),
        (state.tab == Tab::Host && snap.is_connected).then_some("n: new event"),
        Some("r: refresh"),
        snap.is_connected.then_some("d: disconnect"),
        (!snap.is_connected).then_some("c: connect"),
        Some("q: quit"),
    ]
    .into_iter()
    .flatten()
    .join("  ·  ");
    frame.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );
}

fn draw_detail(frame: &mut Frame, snap: &AppSnapshot, event: &EventSummary) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_lines(snap))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let token_line = if event.is_native_prize() {
        format!("Native {}", event.token_symbol)
    } else {
        format!("{} ({})", event.token_symbol, event.token_address)
    };
    let info = vec![
        Line::from(vec![
            Span::styled(
                truncated(&event.name, 40),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                event.state.label(),
                Style::default().fg(state_color(event.state)),
            ),
        ]),
        Line::from(format!("Contract       {}", event.address)),
        Line::from(format!(
            "Organizer      {}{}",
            format_address(event.organizer),
            if snap.account == Some(event.organizer) {
                " (you)"
            } else {
                ""
            }
        )),
        Line::from(format!("Prize token    {token_line}")),
        Line::from(format!(
            "Prize pool     {} {}",
            format_token_amount(event.prize_amount, event.token_decimals),
            event.token_symbol
        )),
        Line::from(format!(
            "Per winner     {} {}",
            format_token_amount(event.prize_per_winner(), event.token_decimals),
            event.token_symbol
        )),
        Line::from(format!("Winners        {}", event.winner_count)),
        Line::from(format!("Participants   {}", event.participant_count())),
        Line::from(format!(
            "Balance        {} {}",
            format_token_amount(event.contract_balance, event.token_decimals),
            event.token_symbol
        )),
        Line::from(vec![
            Span::raw("Funding        "),
            if event.is_funded {
                Span::styled("Funded", Style::default().fg(Color::Green))
            } else {
                Span::styled("Not funded", Style::default().fg(Color::Red))
            },
        ]),
    ];
    frame.render_widget(
        Paragraph::new(info)
            .block(Block::default().borders(Borders::ALL).title(" Event "))
            .wrap(Wrap { trim: false }),
        body[0],
    );

    let lists = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body[1]);

    let participant_items: Vec<ListItem> = event
        .participants
        .iter()
        .enumerate()
        .map(|(index, participant)| {
            let yours = snap.account == Some(*participant);
            let line = format!(
                "#{:<3} {}{}",
                index + 1,
                format_address(*participant),
                if yours { "  (you)" } else { "" }
            );
            let style = if yours {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();
    frame.render_widget(
        List::new(participant_items).block(
            Block::default().borders(Borders::ALL).title(format!(
                " Participants ({}) ",
                event.participant_count()
            )),
        ),
        lists[0],
    );

    let winner_items: Vec<ListItem> = event
        .winners
        .iter()
        .map(|winner| {
            let yours = snap.account == Some(*winner);
            let line = format!(
                "★ {}{}",
                format_address(*winner),
                if yours { "  congratulations!" } else { "" }
            );
            let style = if yours {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Green)
            };
            ListItem::new(line).style(style)
        })
        .collect();
    frame.render_widget(
        List::new(winner_items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Winners ({}) ", event.winners.len())),
        ),
        lists[1],
    );

    let permissions = rules::permissions(event, snap.account);
    frame.render_widget(
        Paragraph::new(action_hints(&permissions))
            .style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn action_hints(permissions: &PermissionSet) -> String {
    [
        permissions.can_register.then_some("e: enter raffle"),
        permissions.can_fund.then_some("f: fund"),
        permissions.can_select_winners.then_some("s: select winners"),
        permissions.can_disburse.then_some("p: disburse prizes"),
        permissions.can_withdraw.then_some("w: withdraw"),
        Some("b: back"),
        Some("r: refresh"),
        Some("q: quit"),
    ]
    .into_iter()
    .flatten()
    .join("  ·  ")
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_create_modal(frame: &mut Frame, snap: &AppSnapshot, form: &CreateState) {
    let area = centered_rect(56, 13, frame.area());
    frame.render_widget(Clear, area);

    let marker = |field: CreateField| {
        if form.focus == field { "> " } else { "  " }
    };
    let token_label = snap
        .tokens
        .get(form.token_idx)
        .map(|token| format!("{} ({})", token.name, token.symbol))
        .unwrap_or_else(|| "(no tokens configured)".to_string());

    let text = vec![
        Line::from(""),
        Line::from(format!("{}Name     {}", marker(CreateField::Name), form.name)),
        Line::from(format!(
            "{}Token    ◀ {} ▶",
            marker(CreateField::Token),
            token_label
        )),
        Line::from(format!(
            "{}Prize    {}",
            marker(CreateField::Prize),
            form.prize
        )),
        Line::from(format!(
            "{}Winners  {}",
            marker(CreateField::Winners),
            form.winners
        )),
        Line::from(""),
        Line::from("Total prize is split evenly among the winners."),
        Line::from(""),
        Line::from(Span::styled(
            "tab: next field · ◀/▶: token · enter: create · esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Create New Raffyl "),
        ),
        area,
    );
}

fn draw_withdraw_modal(frame: &mut Frame, address: Address) {
    let area = centered_rect(54, 7, frame.area());
    frame.render_widget(Clear, area);
    let text = vec![
        Line::from(""),
        Line::from(format!(
            "Withdraw the remaining balance of {}?",
            format_address(address)
        )),
        Line::from("This ends the event."),
        Line::from(""),
        Line::from(Span::styled(
            "y: withdraw · n: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Withdraw ")),
        area,
    );
}

fn draw_quit_modal(frame: &mut Frame) {
    let area = centered_rect(30, 5, frame.area());
    frame.render_widget(Clear, area);
    let text = vec![
        Line::from(""),
        Line::from("Quit raffyl? (y/n)"),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}
