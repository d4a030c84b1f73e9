use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Render an assistant reply's markdown into styled lines.
/// `base` tints plain text, so error and success replies keep their colour.
pub fn render_markdown(input: &str, base: Style) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(base);
    for event in Parser::new_ext(input, Options::ENABLE_STRIKETHROUGH) {
        renderer.handle(event);
    }
    renderer.finish()
}

struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// Next number per open list; None for bullet lists
    lists: Vec<Option<u64>>,
    in_code_block: bool,
}

impl Renderer {
    fn new(base: Style) -> Self {
        Self {
            lines: Vec::new(),
            spans: Vec::new(),
            styles: vec![base],
            lists: Vec::new(),
            in_code_block: false,
        }
    }

    fn current(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    fn blank_line(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::from(""));
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    for line in text.lines() {
                        self.lines.push(Line::from(Span::styled(
                            format!("  {}", line),
                            Style::default().fg(Color::Gray),
                        )));
                    }
                } else {
                    let style = self.current();
                    self.spans.push(Span::styled(text.to_string(), style));
                }
            }
            Event::Code(code) => {
                self.spans.push(Span::styled(
                    code.to_string(),
                    Style::default().fg(Color::Yellow),
                ));
            }
            Event::SoftBreak | Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(20),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let style = match tag {
            Tag::Paragraph => {
                self.flush();
                self.current()
            }
            Tag::Heading { .. } => {
                self.blank_line();
                self.current().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            }
            Tag::Strong => self.current().add_modifier(Modifier::BOLD),
            Tag::Emphasis => self.current().add_modifier(Modifier::ITALIC),
            Tag::Strikethrough => self.current().add_modifier(Modifier::CROSSED_OUT),
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
                self.current()
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
                self.current()
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}{}. ", indent, n);
                        *n += 1;
                        marker
                    }
                    _ => format!("{}• ", indent),
                };
                self.spans
                    .push(Span::styled(marker, Style::default().fg(Color::Yellow)));
                self.current()
            }
            Tag::Link { .. } => self.current().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            _ => self.current(),
        };
        self.styles.push(style);
    }

    fn end(&mut self, tag: TagEnd) {
        self.styles.pop();
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                // Separate top-level paragraphs only; list items stay tight
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading(_) | TagEnd::Item => self.flush(),
            TagEnd::CodeBlock => self.in_code_block = false,
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}
