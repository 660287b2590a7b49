use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::picker::ModelPickerState;
use crate::app::App;
use crate::strings::{
    build_status_line, build_stick_label, help_lines_ascii, INPUT_HINT, INPUT_HINT_NO_MODEL,
    TITLE_CHAT, TITLE_HELP, TITLE_INPUT, TITLE_MODELS,
};
use crate::theme::THEME;

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let inner_width = area.width.saturating_sub(2);
    let input_total_lines = measure_total_lines(app.input.as_str(), inner_width).max(1) as u16;
    let target_lines = input_total_lines.min(app.input_max_lines);
    // grow or shrink one line per frame
    let current = app.input_visible_lines.max(1);
    app.input_visible_lines = match current.cmp(&target_lines) {
        std::cmp::Ordering::Less => current + 1,
        std::cmp::Ordering::Greater => current - 1,
        std::cmp::Ordering::Equal => current,
    };
    let input_height = app.input_visible_lines + 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(input_height),
        ])
        .split(area);

    app.chat_area = Some(chunks[0]);
    draw_chat(f, chunks[0], app);
    draw_status(f, chunks[1], app, inner_width);
    draw_input(f, chunks[2], app, inner_width);

    if let Some(state) = &app.model_picker {
        draw_model_picker(f, area, state, app.session.selected_model());
    }
    if app.show_help {
        draw_help(f, area);
    }
}

fn draw_chat(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .title(Span::styled(
            TITLE_CHAT,
            Style::default()
                .fg(THEME.heading)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.chat_border));

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    app.ensure_chat_wrapped(inner_width);
    let (viewport, _max_scroll, start_offset, total) = app.compute_chat_layout(inner_height);
    app.chat_viewport = viewport as u16;

    let lines = app.visible_chat_lines(start_offset, viewport);
    f.render_widget(Paragraph::new(lines).block(block), area);

    let inner = Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: inner_width,
        height: inner_height,
    };
    if total > viewport {
        let mut sb_state = ScrollbarState::new(total).position(start_offset);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App, inner_width: u16) {
    let stick = build_stick_label(app.chat_scroll);
    let graphemes: Vec<&str> = app.input.as_str().graphemes(true).collect();
    let upto = app.input.cursor().min(graphemes.len());
    let (line_idx, col) = measure_prefix_line_col(&graphemes, upto, inner_width);
    let text = build_status_line(
        (app.model_label(), &app.base_url),
        &stick,
        line_idx + 1,
        col + 1,
        app.history.len(),
        app.catalog.models(),
        app.is_streaming(),
        area.width,
    );
    let para = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(para, area);
}

fn draw_input(f: &mut Frame, area: Rect, app: &App, inner_width: u16) {
    let focused = app.model_picker.is_none() && !app.show_help;
    let border_style = if focused {
        Style::default().fg(THEME.border_focus)
    } else {
        Style::default().fg(THEME.border_inactive)
    };
    let block = Block::default()
        .title(TITLE_INPUT)
        .borders(Borders::ALL)
        .border_style(border_style);

    let graphemes: Vec<&str> = app.input.as_str().graphemes(true).collect();
    let upto = app.input.cursor().min(graphemes.len());
    let (line_idx, col) = measure_prefix_line_col(&graphemes, upto, inner_width);
    let offset_y = line_idx.saturating_sub(app.input_visible_lines.saturating_sub(1));

    let para = if app.input.is_empty() {
        let hint = if app.session.selected_model().is_some() {
            INPUT_HINT
        } else {
            INPUT_HINT_NO_MODEL
        };
        Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )))
        .block(block)
    } else {
        let lines: Vec<Line> = split_visual_lines(&graphemes, inner_width)
            .into_iter()
            .map(Line::from)
            .collect();
        Paragraph::new(lines).block(block).scroll((offset_y, 0))
    };
    f.render_widget(para, area);

    if focused {
        let x = area.x + 1 + col;
        let y = area.y + 1 + line_idx.saturating_sub(offset_y);
        f.set_cursor_position(Position::new(x, y));
    }
}

fn draw_help(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 70, area);
    let block = Block::default()
        .title(Span::styled(
            TITLE_HELP,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let lines: Vec<Line> = help_lines_ascii()
        .iter()
        .map(|l| {
            if l.starts_with(' ') {
                Line::from(*l)
            } else {
                Line::from(Span::styled(
                    *l,
                    Style::default()
                        .fg(THEME.heading)
                        .add_modifier(Modifier::BOLD),
                ))
            }
        })
        .collect();
    f.render_widget(Clear, popup_area);
    f.render_widget(Paragraph::new(lines).block(block), popup_area);
}

fn draw_model_picker(f: &mut Frame, area: Rect, state: &ModelPickerState, current: Option<&str>) {
    let popup_area = centered_rect(60, 60, area);
    let block = Block::default()
        .title(Span::styled(
            TITLE_MODELS,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);

    let mut lines: Vec<Line> = vec![Line::from(format!(">> {}", state.filter.as_str()))];
    let max_list = popup_area.height.saturating_sub(3) as usize;
    let skip = (state.selected + 1).saturating_sub(max_list.max(1));
    for (i, m) in state.filtered.iter().enumerate().skip(skip).take(max_list) {
        let sel = i == state.selected;
        let style = if sel {
            Style::default()
                .fg(THEME.selected_fg)
                .bg(THEME.selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let mark = if Some(m.as_str()) == current { " *" } else { "" };
        lines.push(Line::from(Span::styled(
            format!("{} {}{}", if sel { ">" } else { " " }, m, mark),
            style,
        )));
    }
    f.render_widget(Clear, popup_area);
    f.render_widget(Paragraph::new(lines).block(block), popup_area);

    let typed: String = state
        .filter
        .as_str()
        .graphemes(true)
        .take(state.filter.cursor())
        .collect();
    let cursor_x = popup_area.x + 4 + UnicodeWidthStr::width(typed.as_str()) as u16;
    f.set_cursor_position(Position::new(cursor_x, popup_area.y + 1));
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}

/// Break input text into rows exactly as the cursor math counts them.
fn split_visual_lines(graphemes: &[&str], width: u16) -> Vec<String> {
    let width = width.max(1) as usize;
    let mut out = vec![String::new()];
    let mut col = 0usize;
    for g in graphemes {
        if *g == "\n" || *g == "\r\n" {
            out.push(String::new());
            col = 0;
            continue;
        }
        let w = UnicodeWidthStr::width(*g);
        if col + w > width {
            out.push(String::new());
            col = 0;
        }
        if let Some(last) = out.last_mut() {
            last.push_str(g);
        }
        col += w;
    }
    out
}

fn measure_total_lines(s: &str, width: u16) -> usize {
    let g: Vec<&str> = s.graphemes(true).collect();
    measure_prefix_line_col(&g, g.len(), width).0 as usize + 1
}

fn measure_prefix_line_col(graphemes: &[&str], upto: usize, width: u16) -> (u16, u16) {
    if width == 0 {
        return (0, 0);
    }
    let mut line = 0usize;
    let mut col = 0usize;
    for g in graphemes.iter().take(upto) {
        if *g == "\n" || *g == "\r\n" {
            line += 1;
            col = 0;
            continue;
        }
        let w = UnicodeWidthStr::width(*g);
        if col + w > width as usize {
            line += 1;
            col = 0;
        }
        col += w;
    }
    (line as u16, col as u16)
}
