//! Light markdown rendering into terminal lines
//!
//! Covers what chat replies commonly use: headings, bullet and numbered
//! lists, block quotes, fenced code and inline `**bold**`, `*italic*` and
//! `` `code` ``. Anything else passes through as plain text.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Render `text` as markdown, wrapped to `width` columns
pub fn render_markdown(text: &str, width: usize, base: Style) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();

        if trimmed.starts_with("```") {
            in_code = !in_code;
            continue;
        }

        if in_code {
            lines.extend(hard_wrap(raw, width, code_style()));
            continue;
        }

        if trimmed.is_empty() {
            lines.push(Line::default());
            continue;
        }

        let indent = (raw.len() - trimmed.len()) / 2 * 2;

        if let Some((level, heading)) = heading(trimmed) {
            let style = heading_style(level, base);
            lines.extend(wrap_spans(parse_inline(heading, style), width, Vec::new(), 0));
        } else if let Some(item) = bullet(trimmed) {
            let prefix = vec![Span::styled(format!("{}• ", " ".repeat(indent)), base)];
            lines.extend(wrap_spans(parse_inline(item, base), width, prefix, indent + 2));
        } else if let Some((number, item)) = numbered(trimmed) {
            let marker = format!("{}{}. ", " ".repeat(indent), number);
            let hang = marker.chars().count();
            let prefix = vec![Span::styled(marker, base)];
            lines.extend(wrap_spans(parse_inline(item, base), width, prefix, hang));
        } else if let Some(quote) = trimmed.strip_prefix('>') {
            let style = base.fg(Color::Gray).add_modifier(Modifier::ITALIC);
            let prefix = vec![Span::styled("│ ", Style::default().fg(Color::DarkGray))];
            lines.extend(wrap_spans(parse_inline(quote.trim_start(), style), width, prefix, 2));
        } else {
            lines.extend(wrap_spans(parse_inline(trimmed, base), width, Vec::new(), 0));
        }
    }

    if lines.is_empty() {
        lines.push(Line::default());
    }

    lines
}

/// Render `text` verbatim, only wrapping it to `width`
///
/// Indentation and inner spacing survive; whitespace is dropped only where a
/// line breaks.
pub fn render_plain(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        if raw.trim().is_empty() {
            lines.push(Line::default());
        } else {
            lines.extend(
                wrap_verbatim(raw, width)
                    .into_iter()
                    .map(|row| Line::from(Span::styled(row, style))),
            );
        }
    }

    if lines.is_empty() {
        lines.push(Line::default());
    }

    lines
}

fn code_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn heading_style(level: usize, base: Style) -> Style {
    let style = base.fg(Color::Cyan).add_modifier(Modifier::BOLD);
    if level == 1 {
        style.add_modifier(Modifier::UNDERLINED)
    } else {
        style
    }
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    line[level..].strip_prefix(' ').map(|rest| (level, rest.trim()))
}

fn bullet(line: &str) -> Option<&str> {
    ["- ", "* ", "+ "]
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
}

fn numbered(line: &str) -> Option<(&str, &str)> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    Some((&line[..digits], rest))
}

/// Split inline markup into styled spans
pub fn parse_inline(text: &str, base: Style) -> Vec<Span<'static>> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    let flush = |plain: &mut String, spans: &mut Vec<Span<'static>>| {
        if !plain.is_empty() {
            spans.push(Span::styled(std::mem::take(plain), base));
        }
    };

    while i < chars.len() {
        if chars[i] == '`' {
            if let Some(end) = find(&chars, i + 1, "`") {
                flush(&mut plain, &mut spans);
                let code: String = chars[i + 1..end].iter().collect();
                spans.push(Span::styled(code, code_style()));
                i = end + 1;
                continue;
            }
        } else if chars[i] == '*' && chars.get(i + 1) == Some(&'*') {
            if let Some(end) = find(&chars, i + 2, "**") {
                if end > i + 2 {
                    flush(&mut plain, &mut spans);
                    let inner: String = chars[i + 2..end].iter().collect();
                    spans.extend(parse_inline(&inner, base.add_modifier(Modifier::BOLD)));
                    i = end + 2;
                    continue;
                }
            }
        } else if chars[i] == '*' && chars.get(i + 1).is_some_and(|c| !c.is_whitespace()) {
            if let Some(end) = find(&chars, i + 1, "*") {
                flush(&mut plain, &mut spans);
                let inner: String = chars[i + 1..end].iter().collect();
                spans.extend(parse_inline(&inner, base.add_modifier(Modifier::ITALIC)));
                i = end + 1;
                continue;
            }
        }

        plain.push(chars[i]);
        i += 1;
    }

    flush(&mut plain, &mut spans);
    spans
}

fn find(chars: &[char], from: usize, needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().collect();
    if from >= chars.len() {
        return None;
    }
    (from..=chars.len().saturating_sub(needle.len())).find(|&at| chars[at..].starts_with(&needle))
}

/// Display columns taken by `ch` (two for CJK and most emoji)
pub fn char_width(ch: char) -> usize {
    let mut utf8 = [0u8; 4];
    Span::raw(&*ch.encode_utf8(&mut utf8)).width()
}

/// Cut `text` into rows of at most `width` display columns, ignoring words
pub fn chunk_by_width(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut used = 0;

    for ch in text.chars() {
        let w = char_width(ch);
        if used + w > width && !row.is_empty() {
            rows.push(std::mem::take(&mut row));
            used = 0;
        }
        row.push(ch);
        used += w;
    }

    rows.push(row);
    rows
}

/// Word-wrap one raw line to `width` columns, keeping its whitespace
fn wrap_verbatim(raw: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![raw.to_string()];
    }

    let mut rows = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    let mut break_row = |current: &mut String, used: &mut usize| {
        let kept = current.trim_end().len();
        current.truncate(kept);
        rows.push(std::mem::take(current));
        *used = 0;
    };

    for token in whitespace_runs(raw) {
        let token_width = Span::raw(token).width();
        let blank = token.chars().all(char::is_whitespace);

        if used + token_width <= width {
            current.push_str(token);
            used += token_width;
        } else if blank {
            if used > 0 {
                break_row(&mut current, &mut used);
            }
        } else if token_width <= width {
            if used > 0 {
                break_row(&mut current, &mut used);
            }
            current.push_str(token);
            used = token_width;
        } else {
            for ch in token.chars() {
                let w = char_width(ch);
                if used + w > width && used > 0 {
                    break_row(&mut current, &mut used);
                }
                current.push(ch);
                used += w;
            }
        }
    }

    rows.push(current);
    rows
}

/// Split into alternating runs of whitespace and non-whitespace
fn whitespace_runs(raw: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_blank = None;

    for (index, ch) in raw.char_indices() {
        let blank = ch.is_whitespace();
        if in_blank.is_some_and(|prev| prev != blank) {
            runs.push(&raw[start..index]);
            start = index;
        }
        in_blank = Some(blank);
    }

    if start < raw.len() {
        runs.push(&raw[start..]);
    }
    runs
}

/// Word-wrap styled spans to `width` columns.
///
/// `prefix` opens the first line; continuation lines get `hang` spaces.
fn wrap_spans(
    spans: Vec<Span<'static>>,
    width: usize,
    prefix: Vec<Span<'static>>,
    hang: usize,
) -> Vec<Line<'static>> {
    let words = split_words(spans);
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = prefix;
    let mut used: usize = current.iter().map(Span::width).sum();
    let mut line_start = used;

    for word in words {
        let len: usize = word.iter().map(Span::width).sum();
        let gap = usize::from(used > line_start);

        if width > 0 && used + gap + len > width && used > line_start {
            lines.push(Line::from(std::mem::take(&mut current)));
            current.push(Span::raw(" ".repeat(hang)));
            used = hang;
            line_start = hang;
        } else if gap == 1 {
            let style = word.first().map(|s| s.style).unwrap_or_default();
            current.push(Span::styled(" ", style));
            used += 1;
        }

        if width > 0 && len > width.saturating_sub(line_start) {
            for span in word {
                for ch in span.content.chars() {
                    let w = char_width(ch);
                    if used + w > width && used > line_start {
                        lines.push(Line::from(std::mem::take(&mut current)));
                        current.push(Span::raw(" ".repeat(hang)));
                        used = hang;
                        line_start = hang;
                    }
                    current.push(Span::styled(ch.to_string(), span.style));
                    used += w;
                }
            }
        } else {
            current.extend(word);
            used += len;
        }
    }

    lines.push(Line::from(current));
    lines
}

/// Group spans into whitespace-separated words, keeping per-fragment styles
fn split_words(spans: Vec<Span<'static>>) -> Vec<Vec<Span<'static>>> {
    let mut words = Vec::new();
    let mut word: Vec<Span<'static>> = Vec::new();

    for span in spans {
        let style = span.style;
        for ch in span.content.chars() {
            if ch.is_whitespace() {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
                continue;
            }
            match word.last_mut() {
                Some(last) if last.style == style => last.content.to_mut().push(ch),
                _ => word.push(Span::styled(ch.to_string(), style)),
            }
        }
    }

    if !word.is_empty() {
        words.push(word);
    }
    words
}

fn hard_wrap(raw: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    let indent = 2;

    if raw.is_empty() {
        return vec![Line::default()];
    }

    chunk_by_width(raw, width.saturating_sub(indent))
        .into_iter()
        .map(|chunk| Line::from(vec![Span::raw(" ".repeat(indent)), Span::styled(chunk, style)]))
        .collect()
}
