//! Rendering. [`draw`] is a pure function of the [`ChatSession`]; [`draw_and_sync`]
//! also reports the scroll limits of the drawn frame back to it.

use med_qa_client::{ChatSession, Message, QueryType};
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};
use ratatui::Frame;

const USER_COLOR: Color = Color::Green;
const ASSISTANT_COLOR: Color = Color::Cyan;
const HINT_COLOR: Color = Color::DarkGray;

/// Text rows the input editor grows to before it scrolls.
pub const MAX_INPUT_LINES: usize = 6;
pub const HELP_TEXT: &str =
    "Enter send | Tab mode | F1-F3 examples | PgUp/PgDn scroll | Up/Down knowledge | Esc quit";

/// How far each scrollable pane could move in the frame just drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollLimits {
    pub transcript: usize,
    pub knowledge: usize,
}

/// Draw the whole conversation view.
pub fn draw(frame: &mut Frame, session: &ChatSession) -> ScrollLimits {
    let input_width = frame.area().width.saturating_sub(2).max(1) as usize;
    let input_lines = input_lines(session, input_width);
    let input_height = input_lines.len().clamp(1, MAX_INPUT_LINES) as u16 + 2;

    let [main, input, status] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(frame.area());
    let [transcript, knowledge] =
        Layout::horizontal([Constraint::Percentage(75), Constraint::Percentage(25)]).areas(main);

    let limits = ScrollLimits {
        transcript: draw_transcript(frame, transcript, session),
        knowledge: draw_knowledge(frame, knowledge, session),
    };
    draw_input(frame, input, session, input_lines);
    frame.render_widget(
        Paragraph::new(HELP_TEXT).style(Style::default().fg(HINT_COLOR)),
        status,
    );

    if let Some(alert) = session.alert() {
        draw_alert(frame, alert);
    }
    limits
}

/// Draw and feed the scroll limits back into the session.
pub fn draw_and_sync(frame: &mut Frame, session: &mut ChatSession) {
    let limits = draw(frame, session);
    session.set_scroll_limit(limits.transcript);
    session.set_knowledge_scroll_limit(limits.knowledge);
}

fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
    let (who, color) = if message.is_assistant {
        ("Assistant", ASSISTANT_COLOR)
    } else {
        ("You", USER_COLOR)
    };
    let content = format!("{} [{}]: {}", who, message.query_type.label(), message.text);
    let style = Style::default().fg(color);
    let mut lines: Vec<Line> = textwrap::wrap(&content, width)
        .into_iter()
        .map(|l| Line::styled(l.into_owned(), style))
        .collect();
    lines.push(Line::default());
    lines
}

fn template_lines(session: &ChatSession, width: usize) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled(
        "Pick an example to start:",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (i, t) in session.templates().iter().enumerate() {
        let text = format!("F{}  {} ({}): {}", i + 1, t.title, t.query_type.label(), t.prompt);
        let style = if t.query_type.selectable() {
            Style::default()
        } else {
            Style::default().fg(HINT_COLOR)
        };
        lines.extend(
            textwrap::wrap(&text, width)
                .into_iter()
                .map(|l| Line::styled(l.into_owned(), style)),
        );
    }
    lines
}

/// Visible slice of `total` lines for `height` rows, `offset` lines up from the bottom.
pub fn visible_range(total: usize, height: usize, offset: usize) -> (usize, usize) {
    let max_offset = total.saturating_sub(height);
    let offset = offset.min(max_offset);
    let end = total - offset;
    (end.saturating_sub(height), end)
}

fn draw_transcript(frame: &mut Frame, area: Rect, session: &ChatSession) -> usize {
    let block = Block::bordered().title(" Conversation ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width.max(1) as usize;
    let conversation = session.conversation();
    let mut lines: Vec<Line> = if conversation.is_empty() {
        template_lines(session, width)
    } else {
        conversation
            .messages()
            .iter()
            .flat_map(|m| message_lines(m, width))
            .collect()
    };
    if session.is_thinking() {
        lines.push(Line::styled(
            "Assistant is thinking...",
            Style::default()
                .fg(ASSISTANT_COLOR)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    let height = inner.height as usize;
    let limit = lines.len().saturating_sub(height);
    let (start, end) = visible_range(lines.len(), height, session.scroll_offset());
    let visible: Vec<Line> = lines.drain(start..end).collect();
    frame.render_widget(Paragraph::new(visible), inner);
    limit
}

fn draw_knowledge(frame: &mut Frame, area: Rect, session: &ChatSession) -> usize {
    let knowledge = session.conversation().knowledge();
    let block = Block::bordered().title(" Background knowledge ");
    let inner = block.inner(area);
    let width = inner.width.max(1) as usize;
    let height = inner.height as usize;

    if knowledge.is_empty() {
        frame.render_widget(
            Paragraph::new("(none yet)")
                .style(Style::default().fg(HINT_COLOR))
                .block(block),
            area,
        );
        return 0;
    }

    let lines: Vec<String> = textwrap::wrap(knowledge, width)
        .into_iter()
        .map(|l| l.into_owned())
        .collect();
    let limit = lines.len().saturating_sub(height);
    let start = session.knowledge_offset().min(limit);
    let end = (start + height).min(lines.len());

    let marker = match (start > 0, end < lines.len()) {
        (true, true) => Some(" ^v more (Up/Down) "),
        (true, false) => Some(" ^ more (Up) "),
        (false, true) => Some(" v more (Down) "),
        (false, false) => None,
    };
    let block = match marker {
        Some(m) => block
            .title_bottom(Line::styled(m, Style::default().fg(HINT_COLOR)).right_aligned()),
        None => block,
    };
    let visible: Vec<Line> = lines[start..end].iter().cloned().map(Line::raw).collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);
    limit
}

fn mode_title(session: &ChatSession) -> Line<'static> {
    let mode = session.query_type();
    let state = if session.is_thinking() {
        "sending..."
    } else if session.is_mode_locked() {
        "locked"
    } else {
        "Tab to change"
    };
    let mut spans = vec![Span::raw(" Mode: ")];
    for q in QueryType::ALL {
        let label = if q == mode {
            format!("[{}]", q.label())
        } else {
            q.label().to_string()
        };
        let style = if q.selectable() {
            Style::default()
        } else {
            Style::default().fg(HINT_COLOR)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(format!("({}) ", state)));
    Line::from(spans)
}

/// Input text wrapped to `width`, cursor included.
fn input_lines(session: &ChatSession, width: usize) -> Vec<String> {
    let cursor = if session.is_input_focused() && session.can_send() {
        "_"
    } else {
        ""
    };
    let full_input = format!("> {}{}", session.input(), cursor);
    textwrap::wrap(&full_input, width)
        .into_iter()
        .map(|l| l.into_owned())
        .collect()
}

fn draw_input(frame: &mut Frame, area: Rect, session: &ChatSession, lines: Vec<String>) {
    let rows = area.height.saturating_sub(2) as usize;
    // Keep the tail (where the cursor is) in view.
    let skip = lines.len().saturating_sub(rows);
    let visible: Vec<Line> = lines
        .into_iter()
        .skip(skip)
        .map(|l| Line::styled(l, Style::default().fg(USER_COLOR)))
        .collect();
    let border = if session.can_send() {
        Style::default()
    } else {
        Style::default().fg(HINT_COLOR)
    };
    frame.render_widget(
        Paragraph::new(visible).block(
            Block::bordered()
                .title(mode_title(session))
                .border_style(border),
        ),
        area,
    );
}

fn draw_alert(frame: &mut Frame, alert: &str) {
    let [area] = Layout::vertical([Constraint::Length(7)])
        .flex(Flex::Center)
        .areas(frame.area());
    let [area] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(area);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(vec![
            Line::raw(alert.to_string()),
            Line::default(),
            Line::styled("Press any key to continue", Style::default().fg(HINT_COLOR)),
        ])
        .wrap(Wrap { trim: false })
        .block(
            Block::bordered()
                .title(" Error ")
                .border_style(Style::default().fg(Color::Red)),
        ),
        area,
    );
}
