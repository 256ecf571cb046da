//! Indentation-aware source text builder shared by both emitters.

const INDENT: &str = "    ";

/// Builds source text line by line.
///
/// Lines never carry trailing whitespace and blank lines never repeat, so
/// emitters can call [`blank`](Self::blank) freely between items.
#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    depth: usize,
    last_blank: bool,
    last_open: bool,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            last_blank: true,
            ..Default::default()
        }
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.blank();
            return;
        }
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text.trim_end());
        self.out.push('\n');
        self.last_blank = false;
        self.last_open = false;
    }

    /// A blank line, unless one was just written or a block just opened.
    pub fn blank(&mut self) {
        if self.last_blank || self.last_open {
            return;
        }
        self.out.push('\n');
        self.last_blank = true;
    }

    /// Write `header {` and indent.
    pub fn open(&mut self, header: impl AsRef<str>) {
        let header = header.as_ref();
        if header.is_empty() {
            self.line("{");
        } else {
            self.line(format!("{header} {{"));
        }
        self.depth += 1;
        self.last_open = true;
    }

    /// Write the opening brace on its own line (C# style) and indent.
    pub fn open_own_line(&mut self, header: impl AsRef<str>) {
        self.line(header);
        self.line("{");
        self.depth += 1;
        self.last_open = true;
    }

    pub fn close(&mut self) {
        self.close_with("}");
    }

    /// Dedent and write `text`, e.g. `};` or `} else {`.
    pub fn close_with(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        // Drop a blank line directly before a closing brace
        if self.last_blank && self.out.ends_with("\n\n") {
            self.out.pop();
        }
        self.line(text);
    }

    /// Write each line of `text` behind `prefix`, e.g. `/// `.
    pub fn comment(&mut self, prefix: &str, text: &str) {
        for line in text.lines() {
            if line.is_empty() {
                self.line(prefix.trim_end());
            } else {
                self.line(format!("{prefix}{line}"));
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The finished text, ending in exactly one newline.
    pub fn finish(mut self) -> String {
        while self.out.ends_with("\n\n") {
            self.out.pop();
        }
        self.out
    }
}
