use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};
use voice_judge::{Rating, Stage};

use crate::app::{App, InputMode};
use crate::style::{hex_byte_len, truncate_hex};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_title(frame, chunks[0], app);
    draw_model(frame, chunks[1], app);
    draw_submission(frame, chunks[2], app);
    draw_controls(frame, chunks[3], app);
    draw_status_bar(frame, chunks[4], app);
}

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().fg(Color::Yellow).bold())
}

fn draw_title(frame: &mut Frame, area: Rect, app: &App) {
    let (account_text, account_style) = match app.active_account() {
        Some(account) => (account.to_string(), Style::default().fg(Color::Green)),
        None => ("Not connected".to_string(), Style::default().fg(Color::Red)),
    };
    let line = Line::from(vec![
        Span::styled(
            " Voice Judge ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("| "),
        label("Account: "),
        Span::styled(account_text, account_style),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_model(frame: &mut Frame, area: Rect, app: &App) {
    let placeholder = if app.descriptor_loaded { "-" } else { "loading..." };
    let lines = vec![
        Line::from(vec![label("Model:    "), Span::raw(app.model_name.clone())]),
        Line::from(vec![
            label("Creator:  "),
            Span::raw(app.descriptor.creator().unwrap_or(placeholder).to_string()),
        ]),
        Line::from(vec![
            label("Verifier: "),
            Span::raw(app.descriptor.verifier().unwrap_or(placeholder).to_string()),
        ]),
        Line::from(vec![label("Backend:  "), Span::raw(app.backend_url.clone())]),
    ];
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Model"));
    frame.render_widget(paragraph, area);
}

fn draw_submission(frame: &mut Frame, area: Rect, app: &App) {
    let inner = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    draw_file_input(frame, inner[0], app);
    draw_progress(frame, inner[1], app);

    let state = &app.state;
    let rating_style = state
        .rating
        .map(rating_style)
        .unwrap_or_else(|| Style::default().fg(Color::DarkGray));
    let mut lines = vec![
        Line::from(vec![
            label("Voice Rating: "),
            Span::styled(state.rating_label(), rating_style.add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
    ];
    if let Some(uuid) = &state.latest_uuid {
        lines.push(Line::from(vec![label("Workflow:  "), Span::raw(uuid.clone())]));
    }
    if !state.score_hex.is_empty() {
        lines.push(Line::from(vec![
            label("Score hex: "),
            Span::raw(truncate_hex(&state.score_hex, 12)),
        ]));
    }
    if !state.proof_hex.is_empty() {
        let size = hex_byte_len(&state.proof_hex)
            .map(|len| format!(" ({len} bytes)"))
            .unwrap_or_default();
        lines.push(Line::from(vec![
            label("Proof:     "),
            Span::raw(truncate_hex(&state.proof_hex, 12)),
            Span::styled(size, Style::default().fg(Color::DarkGray)),
        ]));
    }
    if let Some(verified) = state.verified {
        let (text, color) = if verified {
            ("verified", Color::Green)
        } else {
            ("not verified", Color::Red)
        };
        lines.push(Line::from(vec![
            label("On-chain:  "),
            Span::styled(text, Style::default().fg(color)),
        ]));
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Result"));
    frame.render_widget(paragraph, inner[2]);
}

fn draw_file_input(frame: &mut Frame, area: Rect, app: &App) {
    let editing = app.input_mode == InputMode::EditingPath;
    let text = if editing {
        format!("{}_", app.path_input)
    } else {
        match &app.state.selected_file {
            Some(file) => format!("{} ({} bytes)", file.name, file.bytes.len()),
            None => "No file selected - press f to choose one".to_string(),
        }
    };
    let style = if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let title = if editing {
        "Audio file (Enter to confirm, Esc to cancel)"
    } else {
        "Audio file"
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

fn draw_progress(frame: &mut Frame, area: Rect, app: &App) {
    let stage = app.state.stage;
    let total = Stage::PIPELINE.len() as u16;
    let (done, color) = match stage {
        Stage::Done => (total, Color::Green),
        Stage::Failed => (0, Color::Red),
        s if s.is_running() => (s.step().map(|n| n as u16 - 1).unwrap_or(0), Color::Cyan),
        _ => (0, Color::DarkGray),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Pipeline"))
        .gauge_style(Style::default().fg(color))
        .ratio(f64::from(done) / f64::from(total))
        .label(stage_label(stage));
    frame.render_widget(gauge, area);
}

fn stage_label(stage: Stage) -> String {
    match stage.step() {
        Some(step) => format!("{}/{} {}", step, Stage::PIPELINE.len(), stage.label()),
        None => stage.label().to_string(),
    }
}

fn draw_controls(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let upload = if state.can_submit() {
        button("u", "Upload", true)
    } else {
        button("u", "Processing...", false)
    };
    let verify = if state.verify_busy {
        button("v", "Verifying...", false)
    } else {
        button("v", "Verify", state.can_verify())
    };

    let mut spans = upload;
    spans.push(Span::raw("  "));
    spans.extend(verify);
    spans.push(Span::raw("  "));
    spans.extend(button("f", "Choose file", app.input_mode == InputMode::Normal));
    spans.push(Span::raw("  "));
    spans.extend(button("q", "Quit", true));

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("Controls")),
        area,
    );
}

fn button(key: &str, text: &str, enabled: bool) -> Vec<Span<'static>> {
    let style = if enabled {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    vec![
        Span::styled(format!("[{key}] "), Style::default().fg(Color::Cyan)),
        Span::styled(text.to_string(), style),
    ]
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let updated = app
        .last_update
        .map(|t| t.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut spans = vec![
        Span::styled(" Status: ", Style::default().fg(Color::Yellow)),
        Span::raw(app.state.status_message.clone()),
        Span::raw(" | "),
        Span::styled("Updated: ", Style::default().fg(Color::Yellow)),
        Span::raw(updated),
    ];

    if let Some(err) = &app.error_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("Error: {err}"),
            Style::default().fg(Color::Red),
        ));
    }

    let status = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}

fn rating_style(rating: Rating) -> Style {
    let color = match rating {
        Rating::S | Rating::A => Color::Green,
        Rating::B => Color::Cyan,
        Rating::C => Color::Yellow,
        Rating::D => Color::Magenta,
        Rating::X => Color::Red,
    };
    Style::default().fg(color)
}
