use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tenant_chat_core::ChatRole;
use crate::app::App;

const EXAMPLE_QUESTIONS: [&str; 4] = [
    "What are my rights if my unit is unsafe?",
    "How much notice does a landlord need to give before eviction?",
    "Can my landlord enter my apartment without permission?",
    "What can I do about a security deposit dispute?",
];

/// Render one line of assistant output, handling `**bold**`, `#` headings and
/// `-`/`*` bullets.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let trimmed = text.trim_start();

    if let Some(heading) = trimmed.strip_prefix('#') {
        let heading = heading.trim_start_matches('#').trim();
        return Line::from(Span::styled(
            heading.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    let mut spans: Vec<Span<'static>> = Vec::new();
    let body = match trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
        Some(rest) => {
            spans.push(Span::styled("  • ", Style::default().fg(Color::Yellow)));
            rest
        }
        None => text,
    };

    let mut chars = body.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_row, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    if app.session.is_empty() && !app.session.is_busy() {
        app.chat_area = None;
        render_welcome(frame, chat_area);
    } else {
        render_chat(app, frame, chat_area);
    }

    render_input(app, frame, input_row);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" California Tenant Rights Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);
    let subtitle = Line::from(Span::styled(
        " Ask me about your tenant rights in California",
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(vec![title, subtitle]).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_welcome(frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("Welcome!", Style::default().fg(Color::Cyan).bold())),
        Line::default(),
        Line::from("I can help you understand your rights as a California tenant."),
        Line::default(),
        Line::from(Span::styled("Try asking:", Style::default().bold())),
    ];
    lines.extend(EXAMPLE_QUESTIONS.iter().map(|question| {
        Line::from(Span::styled(
            format!("  • \"{}\"", question),
            Style::default().fg(Color::DarkGray),
        ))
    }));

    let welcome = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)))
        .wrap(Wrap { trim: false });

    frame.render_widget(welcome, area);
}

/// Split text into alternating runs of spaces and non-spaces.
fn split_runs(text: &str) -> Vec<(&str, bool)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_space = None;

    for (i, c) in text.char_indices() {
        let space = c == ' ';
        if let Some(prev) = in_space {
            if prev != space {
                runs.push((&text[start..i], prev));
                start = i;
            }
        }
        in_space = Some(space);
    }
    if let Some(prev) = in_space {
        runs.push((&text[start..], prev));
    }
    runs
}

/// Word-wrap a styled line to `width` columns, keeping span styles.
/// Spaces at a break are dropped; words longer than a line are split.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line];
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_len = 0;

    for span in line.spans {
        let style = span.style;
        let text = span.content.into_owned();

        for (run, is_space) in split_runs(&text) {
            let mut piece = run;
            loop {
                let piece_len = piece.chars().count();

                if is_space {
                    // Keep leading indentation only on the first row
                    let at_start_of_wrap = current_len == 0 && !lines.is_empty();
                    if !at_start_of_wrap && current_len + piece_len <= width {
                        current.push(Span::styled(piece.to_string(), style));
                        current_len += piece_len;
                    }
                    break;
                }

                if current_len + piece_len <= width {
                    current.push(Span::styled(piece.to_string(), style));
                    current_len += piece_len;
                    break;
                }

                if current_len > 0 {
                    // Spaces before a break are not drawn
                    while current.last().is_some_and(|span| span.content.trim_start_matches(' ').is_empty()) {
                        current.pop();
                    }
                    lines.push(Line::from(std::mem::take(&mut current)));
                    current_len = 0;
                    continue;
                }

                // Word doesn't fit on an empty row, hard split it
                let split = piece
                    .char_indices()
                    .nth(width)
                    .map(|(i, _)| i)
                    .unwrap_or(piece.len());
                current.push(Span::styled(piece[..split].to_string(), style));
                lines.push(Line::from(std::mem::take(&mut current)));
                piece = &piece[split..];
                if piece.is_empty() {
                    break;
                }
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}

/// The conversation exactly as drawn, wrapped to `width` columns. Scrolling
/// uses its length, so it must stay the single source of the chat layout.
pub fn chat_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.session.messages() {
        let label = format!("{}:", msg.role.display_name());
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    label,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.extend(wrap_line(Line::from(line.to_string()), width));
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    label,
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.extend(wrap_line(parse_markdown_line(line), width));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.session.is_busy() {
        lines.push(Line::from(Span::styled(
            format!("{}:", ChatRole::Assistant.display_name()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store for mouse hit-testing and scroll calculations (inner size minus borders)
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    // Already wrapped, so the paragraph must not wrap again
    let lines = chat_lines(app, app.chat_width as usize);

    let chat = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(10),
    ])
    .areas(area);
    app.send_area = Some(send_area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Ask about your tenant rights ");

    // Inner width = total width - 2 (for borders)
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Scroll horizontally to keep the cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.session.draft()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));

    let send_style = if app.session.can_send() {
        Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let send = Paragraph::new(Line::from(Span::styled(" Send ", send_style)).centered())
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(send, send_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (status_text, status_style) = if app.session.is_busy() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let footer_content = Line::from(vec![
        Span::styled(status_text, status_style),
        Span::styled(" ", label_style),
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
        Span::styled(format!(" {} ", app.backend_url), Style::default().bg(Color::Black).fg(Color::DarkGray)),
    ]);

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
