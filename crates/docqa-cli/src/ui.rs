//! UI rendering with ratatui.
//!
//! Two columns: the document panel (file path, upload status, key help) on
//! the left and the chat transcript with the question line on the right.

use docqa_client::{Control, RequestKind, UploadedFile};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};
use ratatui::Frame;

use crate::app::{App, BackendStatus, Focus};
use crate::markdown::render_markdown;

/// Horizontal padding for chat content.
const CHAT_PADDING: u16 = 2;

/// Controls drawn by the panels: the file path field and status row on the
/// left, the transcript and question line on the right.
const PANEL_CONTROLS: [Control; 4] = [
    Control::FileInput,
    Control::UploadStatus,
    Control::Chatbox,
    Control::QuestionInput,
];

/// Action keys listed in the document panel, with the control each stands in
/// for. Bound in `main.rs`.
const ACTION_KEYS: [(&str, &str, Control); 3] = [
    ("Enter", " upload file", Control::UploadButton),
    ("Ctrl+G", " summarize", Control::GenerateSummaryButton),
    ("Enter", " send question", Control::SendButton),
];

/// Controls this UI provides.
pub fn provided_controls() -> impl Iterator<Item = Control> {
    PANEL_CONTROLS
        .into_iter()
        .chain(ACTION_KEYS.into_iter().map(|(_, _, control)| control))
}

/// Render the UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header bar
            Constraint::Min(5),    // Panels
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header_bar(frame, app, main_layout[0]);

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_layout[1]);

    render_document_panel(frame, app, content_layout[0]);
    render_chat_column(frame, app, content_layout[1]);
    render_status_bar(frame, app, main_layout[2]);
}

/// Truncate a string in the middle with an ellipsis if it exceeds `max_len` characters.
fn truncate_middle(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        return s.to_string();
    }
    if max_len < 5 {
        return s.chars().take(max_len).collect();
    }
    let keep = (max_len - 3) / 2;
    let start: String = s.chars().take(keep).collect();
    let end: String = s.chars().skip(len - keep).collect();
    format!("{start}...{end}")
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    }
}

/// Header with the backend URL and its health.
fn render_header_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (status_text, color) = match &app.backend {
        BackendStatus::Unknown => ("checking".to_string(), Color::Yellow),
        BackendStatus::Healthy(status) => (status.clone(), Color::Green),
        BackendStatus::Unreachable(_) => ("unreachable".to_string(), Color::Red),
    };

    let title = "DOCQA";
    let max_url_width = (usize::from(area.width) / 2).saturating_sub(15);
    let display_url = truncate_middle(app.base_url(), max_url_width);
    let right_len = display_url.chars().count() + status_text.chars().count() + 3;
    let gap = usize::from(area.width).saturating_sub(title.len() + right_len);

    let line = Line::from(vec![
        Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(gap)),
        Span::raw(display_url),
        Span::raw(" ["),
        Span::styled(status_text, Style::default().fg(color)),
        Span::raw("]"),
    ]);

    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
        area,
    );
}

/// Left panel: file path field, upload status and key help.
fn render_document_panel(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::FilePath && !app.command_mode;
    let block = Block::default()
        .title(" Document ")
        .borders(Borders::ALL)
        .border_style(border_style(focused));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let key = Style::default().fg(Color::Yellow);
    let label = Style::default().fg(Color::DarkGray);

    let uploaded = match app.session.uploaded() {
        UploadedFile::NotUploaded => Span::styled("no file uploaded", label),
        UploadedFile::Uploaded { file_name } => {
            Span::styled(file_name.clone(), Style::default().fg(Color::Green))
        }
    };
    let activity = match app.session.in_flight() {
        Some(RequestKind::Upload) => Span::styled(
            format!("{} uploading...", app.spinner_char()),
            Style::default().fg(Color::Yellow),
        ),
        Some(RequestKind::Summary) => Span::styled(
            format!("{} summarizing...", app.spinner_char()),
            Style::default().fg(Color::Yellow),
        ),
        Some(RequestKind::Ask) | None => Span::raw(""),
    };

    let mut lines = vec![
        Line::from(Span::styled("File path", label)),
        Line::from(vec![
            Span::styled(if focused { "> " } else { "│ " }, border_style(focused)),
            Span::raw(app.file_input.text()),
        ]),
        Line::from(""),
        Line::from(Span::styled("Uploaded", label)),
        Line::from(uploaded),
        Line::from(activity),
        Line::from(""),
    ];
    for (keys, action, _) in ACTION_KEYS {
        lines.push(Line::from(vec![Span::styled(keys, key), Span::raw(action)]));
    }
    lines.push(Line::from(vec![Span::styled("Tab", key), Span::raw(" switch field")]));
    lines.push(Line::from(vec![
        Span::styled("Esc", key),
        Span::raw(" cancel / commands"),
    ]));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    if focused && inner.height > 1 {
        let cursor = u16::try_from(app.file_input.cursor()).unwrap_or(u16::MAX);
        let x = inner.x.saturating_add(2).saturating_add(cursor);
        frame.set_cursor_position((x, inner.y + 1));
    }
}

/// Build the transcript as styled lines.
fn transcript_lines(app: &App, content_width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let time_style = Style::default().fg(Color::DarkGray);

    for msg in app.transcript.iter() {
        let time = msg.created_at.format("%H:%M").to_string();
        if msg.is_user() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("[{}] ", msg.sender.as_str()),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(msg.content(), Style::default().fg(Color::White)),
                Span::styled(format!("  {time}"), time_style),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("[{}]", msg.sender.as_str()),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {time}"), time_style),
            ]));
            if msg.is_empty() {
                lines.push(Line::from(vec![
                    Span::styled(app.spinner_char(), Style::default().fg(Color::Yellow)),
                    Span::styled(" generating...", time_style),
                ]));
            } else {
                // Blocks are separate units; joined, "text\n---" would parse as a heading.
                for block in &msg.blocks {
                    lines.extend(render_markdown(block, content_width));
                }
            }
        }
        lines.push(Line::from(""));
    }
    lines
}

/// Right column: transcript plus question line.
fn render_chat_column(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Question && !app.command_mode;
    let title = match app.session.uploaded().file_name() {
        Some(name) => format!(" Chat: {name} "),
        None => " Chat ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(focused));
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let inner_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Messages
            Constraint::Length(1), // Separator
            Constraint::Length(1), // Question
        ])
        .split(inner_area);

    let chat_area_full = inner_layout[0];
    let chat_area = Rect::new(
        chat_area_full.x + CHAT_PADDING,
        chat_area_full.y,
        chat_area_full.width.saturating_sub(CHAT_PADDING * 2 + 1),
        chat_area_full.height,
    );
    let content_width = usize::from(chat_area.width);

    if app.transcript.is_empty() {
        let help = if app.session.uploaded().file_name().is_some() {
            "Ask a question and press Enter, or Ctrl+G for a summary"
        } else {
            "Upload a document to get started"
        };
        frame.render_widget(
            Paragraph::new(help)
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: true }),
            chat_area,
        );
    } else {
        let text = Text::from(transcript_lines(app, content_width));
        let visible_lines = usize::from(chat_area.height);
        let total_wrapped_lines = wrapped_line_count(&text, content_width);

        // Scroll is measured up from the bottom; 0 shows the newest line.
        let max_scroll = total_wrapped_lines.saturating_sub(visible_lines);
        let effective_scroll = app.transcript.scroll().min(max_scroll);
        let offset = max_scroll.saturating_sub(effective_scroll);

        frame.render_widget(
            Paragraph::new(text)
                .wrap(Wrap { trim: true })
                .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0)),
            chat_area,
        );

        if total_wrapped_lines > visible_lines {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut state = ScrollbarState::new(total_wrapped_lines)
                .position(offset)
                .viewport_content_length(visible_lines);
            frame.render_stateful_widget(scrollbar, chat_area_full, &mut state);
        }
    }

    render_question_line(frame, app, inner_layout[1], inner_layout[2], focused);
}

fn render_question_line(
    frame: &mut Frame,
    app: &App,
    separator_area: Rect,
    input_area: Rect,
    focused: bool,
) {
    frame.render_widget(
        Paragraph::new("─".repeat(usize::from(separator_area.width)))
            .style(Style::default().fg(Color::DarkGray)),
        separator_area,
    );

    let prompt = if focused { "> " } else { "│ " };
    let line = Line::from(vec![
        Span::styled(prompt, border_style(focused)),
        Span::styled(app.question_input.text(), Style::default().fg(Color::White)),
    ]);
    frame.render_widget(Paragraph::new(line), input_area);

    if focused && !app.session.is_busy() {
        let cursor = u16::try_from(app.question_input.cursor()).unwrap_or(u16::MAX);
        let x = input_area.x.saturating_add(2).saturating_add(cursor);
        frame.set_cursor_position((x, input_area.y));
    }
}

/// Status bar with mode indicator and the latest status or error.
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode = if app.command_mode {
        Span::styled(" COMMAND ", Style::default().fg(Color::Black).bg(Color::Blue))
    } else {
        Span::styled(" INPUT ", Style::default().fg(Color::Black).bg(Color::Green))
    };
    let key = Style::default().fg(Color::Yellow);

    let status = if let Some(error) = &app.error_message {
        Line::from(vec![
            mode,
            Span::styled(" ERROR: ", Style::default().fg(Color::Red).bold()),
            Span::styled(error.clone(), Style::default().fg(Color::Red)),
        ])
    } else if let Some(status) = &app.status_message {
        Line::from(vec![
            mode,
            Span::styled(format!(" {status}"), Style::default().fg(Color::Green)),
        ])
    } else if let BackendStatus::Unreachable(reason) = &app.backend {
        Line::from(vec![
            mode,
            Span::styled(
                " ⚠ backend unreachable: ",
                Style::default().fg(Color::Yellow).bold(),
            ),
            Span::styled(reason.clone(), Style::default().fg(Color::Yellow)),
        ])
    } else if app.command_mode {
        Line::from(vec![
            mode,
            Span::raw(" "),
            Span::styled("u", key),
            Span::raw(":upload "),
            Span::styled("g", key),
            Span::raw(":summary "),
            Span::styled("j/k", key),
            Span::raw(":scroll "),
            Span::styled("q", key),
            Span::raw(":quit"),
        ])
    } else {
        Line::from(vec![
            mode,
            Span::raw(" "),
            Span::styled("Enter", key),
            Span::raw(":send "),
            Span::styled("Tab", key),
            Span::raw(":switch "),
            Span::styled("Esc", key),
            Span::raw(":commands"),
        ])
    };

    frame.render_widget(
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray)),
        area,
    );
}

/// Number of visual lines after wrapping.
fn wrapped_line_count(text: &Text, available_width: usize) -> usize {
    if available_width == 0 {
        return text.lines.len();
    }
    text.lines
        .iter()
        .map(|line| line.width().div_ceil(available_width).max(1))
        .sum()
}
