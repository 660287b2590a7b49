//! Markdown-ish rendering of message text into wrapped, styled terminal lines.
//!
//! Covers what chat models actually emit: headings, bullets, numbered lists, block
//! quotes, rules, fenced code, inline code, bold and italic. Anything else is shown
//! verbatim. Half-streamed input is fine: an unterminated fence styles the remainder as
//! code and unclosed inline markers stay literal.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::theme::THEME;

type Seg = (String, Style);

/// Render `content` into lines at most `width` cells wide. The first line starts with
/// `prefix` and later lines are indented by its width.
pub fn render(content: &str, width: u16, prefix: &str, prefix_style: Style) -> Vec<Line<'static>> {
    let indent_w = UnicodeWidthStr::width(prefix);
    let avail = (width as usize).saturating_sub(indent_w).max(1);
    let mut body: Vec<Vec<Seg>> = Vec::new();
    let mut in_code = false;
    for raw in content.split('\n') {
        let raw = raw.trim_end_matches('\r');
        if raw.trim_start().starts_with("```") {
            in_code = !in_code;
            continue;
        }
        if in_code {
            body.extend(hard_wrap(raw, avail, Style::default().fg(THEME.code)));
            continue;
        }
        body.extend(render_block_line(raw, avail));
    }
    if body.is_empty() {
        body.push(Vec::new());
    }

    let indent = " ".repeat(indent_w);
    body.into_iter()
        .enumerate()
        .map(|(i, segs)| {
            let mut spans = Vec::with_capacity(segs.len() + 1);
            if i == 0 && !prefix.is_empty() {
                spans.push(Span::styled(prefix.to_string(), prefix_style));
            } else if i > 0 && indent_w > 0 {
                spans.push(Span::raw(indent.clone()));
            }
            spans.extend(merge(segs).into_iter().map(|(t, s)| Span::styled(t, s)));
            Line::from(spans)
        })
        .collect()
}

fn render_block_line(raw: &str, avail: usize) -> Vec<Vec<Seg>> {
    let trimmed = raw.trim_start();
    let lead = &raw[..raw.len() - trimmed.len()];

    if let Some((level, text)) = heading(trimmed) {
        let style = Style::default()
            .fg(THEME.heading)
            .add_modifier(Modifier::BOLD);
        let style = if level == 1 {
            style.add_modifier(Modifier::UNDERLINED)
        } else {
            style
        };
        return wrap(&inline(text, style), avail, 0);
    }
    if is_rule(trimmed) {
        return vec![vec![(
            "─".repeat(avail),
            Style::default().fg(THEME.border_inactive),
        )]];
    }
    if let Some(text) = trimmed.strip_prefix("> ").or_else(|| trimmed.strip_prefix('>').filter(|t| t.is_empty())) {
        let quote = Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM);
        let mut segs = vec![("│ ".to_string(), quote)];
        segs.extend(inline(text, quote));
        return wrap(&segs, avail, 2);
    }
    if let Some(text) = ["- ", "* ", "+ "]
        .iter()
        .find_map(|m| trimmed.strip_prefix(m))
    {
        let marker = format!("{}• ", lead);
        let hang = UnicodeWidthStr::width(marker.as_str());
        let mut segs = vec![(marker, Style::default().fg(THEME.heading))];
        segs.extend(inline(text, Style::default()));
        return wrap(&segs, avail, hang);
    }
    if let Some(n) = ordered_marker(trimmed) {
        let marker = format!("{}{}", lead, &trimmed[..n]);
        let hang = UnicodeWidthStr::width(marker.as_str());
        let mut segs = vec![(marker, Style::default().fg(THEME.heading))];
        segs.extend(inline(&trimmed[n..], Style::default()));
        return wrap(&segs, avail, hang);
    }
    wrap(&inline(raw, Style::default()), avail, 0)
}

fn heading(s: &str) -> Option<(usize, &str)> {
    let level = s.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&level) {
        s[level..].strip_prefix(' ').map(|t| (level, t))
    } else {
        None
    }
}

fn is_rule(s: &str) -> bool {
    let s = s.trim_end();
    s.len() >= 3
        && (s.chars().all(|c| c == '-') || s.chars().all(|c| c == '*') || s.chars().all(|c| c == '_'))
}

/// Byte length of a `12. ` style marker, including the trailing space.
fn ordered_marker(s: &str) -> Option<usize> {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 3 {
        return None;
    }
    let rest = &s[digits..];
    if rest.starts_with(". ") || rest.starts_with(") ") {
        Some(digits + 2)
    } else {
        None
    }
}

/// Split `text` into styled runs for `code`, **bold** and *italic*.
fn inline(text: &str, base: Style) -> Vec<Seg> {
    let mut out: Vec<Seg> = Vec::new();
    let mut plain = String::new();
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        let found = match ch {
            '`' => rest[1..].find('`').filter(|&e| e > 0).map(|e| {
                let code = Style::default().fg(THEME.code);
                ((rest[1..1 + e].to_string(), code), 1 + e + 1)
            }),
            '*' if rest.starts_with("**") => rest[2..].find("**").filter(|&e| e > 0).map(|e| {
                (
                    (rest[2..2 + e].to_string(), base.add_modifier(Modifier::BOLD)),
                    2 + e + 2,
                )
            }),
            '*' => rest[1..]
                .find('*')
                .filter(|&e| e > 0 && !rest[1..].starts_with(' '))
                .map(|e| {
                    (
                        (rest[1..1 + e].to_string(), base.add_modifier(Modifier::ITALIC)),
                        1 + e + 1,
                    )
                }),
            _ => None,
        };
        match found {
            Some((seg, consumed)) => {
                if !plain.is_empty() {
                    out.push((std::mem::take(&mut plain), base));
                }
                out.push(seg);
                rest = &rest[consumed..];
            }
            None => {
                plain.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    if !plain.is_empty() {
        out.push((plain, base));
    }
    out
}

/// Greedy word wrap of styled runs. Continuation lines are indented by `hang` cells.
fn wrap(segs: &[Seg], width: usize, hang: usize) -> Vec<Vec<Seg>> {
    let hang = if hang >= width { 0 } else { hang };
    let mut lines: Vec<Vec<Seg>> = vec![Vec::new()];
    let mut used = 0usize;
    for (text, style) in segs {
        for token in split_words(text) {
            let w = UnicodeWidthStr::width(token);
            let blank = token.trim().is_empty();
            let continuation = lines.len() > 1;
            if blank {
                if used == hang && continuation {
                    continue;
                }
                if used + w <= width {
                    push_seg(lines.last_mut(), token, *style);
                    used += w;
                } else {
                    start_line(&mut lines, hang);
                    used = hang;
                }
                continue;
            }
            if used + w > width && used > hang_for(&lines, hang) {
                trim_trailing(lines.last_mut());
                start_line(&mut lines, hang);
                used = hang;
            }
            if used + w <= width {
                push_seg(lines.last_mut(), token, *style);
                used += w;
                continue;
            }
            // longer than a whole line: break inside the word
            for g in token.graphemes(true) {
                let gw = UnicodeWidthStr::width(g);
                if used + gw > width && used > hang_for(&lines, hang) {
                    start_line(&mut lines, hang);
                    used = hang;
                }
                push_seg(lines.last_mut(), g, *style);
                used += gw;
            }
        }
    }
    trim_trailing(lines.last_mut());
    lines
}

fn hang_for(lines: &[Vec<Seg>], hang: usize) -> usize {
    if lines.len() > 1 {
        hang
    } else {
        0
    }
}

fn start_line(lines: &mut Vec<Vec<Seg>>, hang: usize) {
    let mut l = Vec::new();
    if hang > 0 {
        l.push((" ".repeat(hang), Style::default()));
    }
    lines.push(l);
}

fn push_seg(line: Option<&mut Vec<Seg>>, text: &str, style: Style) {
    if let Some(line) = line {
        match line.last_mut() {
            Some((t, s)) if *s == style => t.push_str(text),
            _ => line.push((text.to_string(), style)),
        }
    }
}

fn trim_trailing(line: Option<&mut Vec<Seg>>) {
    let Some(line) = line else { return };
    loop {
        let n = line.len();
        let Some((t, _)) = line.last_mut() else { break };
        let kept = t.trim_end().len();
        if kept == 0 && n > 1 {
            line.pop();
            continue;
        }
        t.truncate(kept);
        break;
    }
}

/// Alternating runs of whitespace and non-whitespace.
fn split_words(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_blank: Option<bool> = None;
    for (i, c) in s.char_indices() {
        let blank = c.is_whitespace();
        if let Some(p) = prev_blank {
            if p != blank {
                out.push(&s[start..i]);
                start = i;
            }
        }
        prev_blank = Some(blank);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

/// Character-level wrap that keeps every space, for code.
fn hard_wrap(raw: &str, width: usize, style: Style) -> Vec<Vec<Seg>> {
    let mut lines: Vec<Vec<Seg>> = Vec::new();
    let mut cur = String::new();
    let mut used = 0usize;
    for g in raw.graphemes(true) {
        let gw = UnicodeWidthStr::width(g);
        if used + gw > width && used > 0 {
            lines.push(vec![(std::mem::take(&mut cur), style)]);
            used = 0;
        }
        cur.push_str(g);
        used += gw;
    }
    lines.push(vec![(cur, style)]);
    lines
}

fn merge(segs: Vec<Seg>) -> Vec<Seg> {
    let mut out: Vec<Seg> = Vec::with_capacity(segs.len());
    for (t, s) in segs {
        if t.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some((pt, ps)) if *ps == s => pt.push_str(&t),
            _ => out.push((t, s)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn wraps_with_prefix_and_indent() {
        let lines = render("one two three four", 12, "> ", Style::default());
        assert_eq!(plain(&lines), vec!["> one two", "  three four"]);
    }

    #[test]
    fn wrapped_lines_drop_trailing_blank_segments() {
        let lines = render("**alpha**   `beta` gamma", 9, "", Style::default());
        let text = plain(&lines);
        assert!(text.len() > 1);
        for l in &text {
            assert_eq!(l, l.trim_end());
        }
        assert_eq!(text.join(" ").split_whitespace().collect::<Vec<_>>(), ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn keeps_text_verbatim_without_markup() {
        let lines = render("Hi there", 80, "> ", Style::default());
        assert_eq!(plain(&lines), vec!["> Hi there"]);
    }

    #[test]
    fn inline_markup_is_styled_and_stripped() {
        let lines = render("use `cargo` and **care**", 80, "", Style::default());
        assert_eq!(plain(&lines), vec!["use cargo and care"]);
        let code = lines[0].spans.iter().find(|s| s.content == "cargo").unwrap();
        assert_eq!(code.style.fg, Some(THEME.code));
        let bold = lines[0].spans.iter().find(|s| s.content == "care").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn unclosed_markers_stay_literal() {
        let lines = render("2 * 3 and `open", 80, "", Style::default());
        assert_eq!(plain(&lines), vec!["2 * 3 and `open"]);
    }

    #[test]
    fn bullets_headings_and_code_fences() {
        let md = "# Title\n- first item\n```\nlet x = 1;\n```\n1. step";
        let lines = render(md, 40, "", Style::default());
        assert_eq!(
            plain(&lines),
            vec!["Title", "• first item", "let x = 1;", "1. step"]
        );
    }

    #[test]
    fn unterminated_fence_styles_rest_as_code() {
        let lines = render("```rust\nfn main() {", 40, "", Style::default());
        assert_eq!(plain(&lines), vec!["fn main() {"]);
        assert_eq!(lines[0].spans[0].style.fg, Some(THEME.code));
    }

    #[test]
    fn bullet_continuation_hangs_under_text() {
        let lines = render("- alpha beta gamma", 10, "", Style::default());
        assert_eq!(plain(&lines), vec!["• alpha", "  beta", "  gamma"]);
    }

    #[test]
    fn long_word_is_broken() {
        let lines = render("abcdefghij", 4, "", Style::default());
        assert_eq!(plain(&lines), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn empty_content_renders_prefix_only() {
        let lines = render("", 20, "> ", Style::default());
        assert_eq!(plain(&lines), vec!["> "]);
    }
}
