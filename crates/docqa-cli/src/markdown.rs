//! Markdown to ratatui text conversion.
//!
//! Bot answers and summary sections often arrive as markdown (headings,
//! bullet lists, emphasis). This converts them to styled lines for the chat
//! panel. Code blocks are framed but not highlighted.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Convert markdown text to styled ratatui Lines.
///
/// `available_width` bounds the width of rules and code block frames.
pub fn render_markdown(text: &str, available_width: usize) -> Vec<Line<'static>> {
    MarkdownRenderer::new(available_width).render(text)
}

/// Fenced or indented code being collected.
struct CodeBlock {
    lang: String,
    content: String,
}

/// Markdown renderer state.
struct MarkdownRenderer {
    lines: Vec<Line<'static>>,
    current_spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    /// Open lists; `Some(n)` is an ordered list whose next item is `n`.
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    code_block: Option<CodeBlock>,
    available_width: usize,
}

impl MarkdownRenderer {
    fn new(available_width: usize) -> Self {
        Self {
            lines: Vec::new(),
            current_spans: Vec::new(),
            style_stack: vec![Style::default()],
            lists: Vec::new(),
            quote_depth: 0,
            code_block: None,
            available_width,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, style: Style) {
        let merged = self.current_style().patch(style);
        self.style_stack.push(merged);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn flush_line(&mut self) {
        if self.current_spans.is_empty() {
            return;
        }
        let mut spans = Vec::with_capacity(self.current_spans.len() + 1);
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.append(&mut self.current_spans);
        self.lines.push(Line::from(spans));
    }

    fn add_text(&mut self, text: &str) {
        if let Some(code) = self.code_block.as_mut() {
            code.content.push_str(text);
            return;
        }
        let style = self.current_style();
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.flush_line();
            }
            if !part.is_empty() {
                self.current_spans.push(Span::styled(part.to_string(), style));
            }
        }
    }

    fn start_item(&mut self) {
        self.flush_line();
        let depth = self.lists.len().saturating_sub(1);
        let marker = match self.lists.last_mut() {
            Some(Some(n)) => {
                let marker = format!("{n}. ");
                *n += 1;
                marker
            }
            _ => "• ".to_string(),
        };
        if depth > 0 {
            self.current_spans.push(Span::raw("  ".repeat(depth)));
        }
        self.current_spans
            .push(Span::styled(marker, Style::default().fg(Color::Cyan)));
    }

    fn render_code_block(&mut self) {
        let Some(CodeBlock { lang, content }) = self.code_block.take() else {
            return;
        };
        let frame = Style::default().fg(Color::DarkGray);
        let rule_width = self.available_width.saturating_sub(2).min(44);

        let mut header = vec![Span::styled("┌", frame)];
        if lang.is_empty() {
            header.push(Span::styled("─".repeat(rule_width), frame));
        } else {
            header.push(Span::styled("─ ", frame));
            header.push(Span::styled(
                lang,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));
        }
        self.lines.push(Line::from(header));

        for line in content.lines() {
            self.lines.push(Line::from(vec![
                Span::styled("│ ", frame),
                Span::styled(line.to_string(), Style::default().fg(Color::Yellow)),
            ]));
        }

        self.lines.push(Line::from(vec![
            Span::styled("└", frame),
            Span::styled("─".repeat(rule_width), frame),
        ]));
    }

    fn handle_start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let color = match level {
                    HeadingLevel::H1 => Color::Magenta,
                    HeadingLevel::H2 => Color::Cyan,
                    _ => Color::Blue,
                };
                self.push_style(Style::default().fg(color).add_modifier(Modifier::BOLD));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT));
            }
            Tag::Link { .. } => self.push_style(
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
                self.push_style(Style::default().fg(Color::Gray));
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.trim().to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_block = Some(CodeBlock {
                    lang,
                    content: String::new(),
                });
            }
            Tag::List(start) => {
                self.flush_line();
                self.lists.push(start);
            }
            Tag::Item => self.start_item(),
            _ => {}
        }
    }

    fn handle_end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.pop_style();
                self.flush_line();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.pop_style();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => self.render_code_block(),
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
            }
            TagEnd::Paragraph | TagEnd::Item => self.flush_line(),
            _ => {}
        }
    }

    fn render(mut self, text: &str) -> Vec<Line<'static>> {
        let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH);

        for event in parser {
            match event {
                Event::Start(tag) => self.handle_start(tag),
                Event::End(tag) => self.handle_end(tag),
                Event::Text(text) => self.add_text(&text),
                Event::Code(code) => self.current_spans.push(Span::styled(
                    code.to_string(),
                    Style::default().fg(Color::Yellow).bg(Color::Rgb(40, 40, 40)),
                )),
                // Summary sections are line-oriented; keep their breaks.
                Event::SoftBreak | Event::HardBreak => self.flush_line(),
                Event::Rule => {
                    self.flush_line();
                    self.lines.push(Line::from(Span::styled(
                        "─".repeat(self.available_width.min(60)),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                _ => {}
            }
        }

        self.flush_line();
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(plain(&render_markdown("hello world", 80)), vec!["hello world"]);
    }

    #[test]
    fn heading_is_bold() {
        let lines = render_markdown("## Overview", 80);
        assert_eq!(plain(&lines), vec!["Overview"]);
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn soft_breaks_keep_lines() {
        assert_eq!(
            plain(&render_markdown("Section 1\nSection 2", 80)),
            vec!["Section 1", "Section 2"]
        );
    }

    #[test]
    fn lists_get_markers() {
        assert_eq!(
            plain(&render_markdown("- one\n- two", 80)),
            vec!["• one", "• two"]
        );
        assert_eq!(
            plain(&render_markdown("3. three\n4. four", 80)),
            vec!["3. three", "4. four"]
        );
    }

    #[test]
    fn nested_list_is_indented() {
        let lines = plain(&render_markdown("- outer\n  - inner", 80));
        assert_eq!(lines, vec!["• outer", "  • inner"]);
    }

    #[test]
    fn emphasis_and_inline_code() {
        let lines = render_markdown("a **bold** and `code`", 80);
        assert_eq!(plain(&lines), vec!["a bold and code"]);
        let bold = lines[0].spans.iter().find(|s| s.content == "bold").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn code_block_is_framed() {
        let lines = plain(&render_markdown("```rust\nfn main() {}\n```", 40));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "┌─ rust");
        assert_eq!(lines[1], "│ fn main() {}");
        assert!(lines[2].starts_with('└'));
    }

    #[test]
    fn quote_is_prefixed() {
        assert_eq!(plain(&render_markdown("> quoted", 80)), vec!["│ quoted"]);
    }
}
