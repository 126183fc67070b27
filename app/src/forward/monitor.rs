//! Parsing `dbus-monitor` output for `org.freedesktop.Notifications.Notify`.

pub const MATCH_RULE: &str =
    "eavesdrop=true,interface='org.freedesktop.Notifications',member='Notify'";
pub const DEFAULT_CONTENT: &str = "New Discord notification";

/// Groups monitor lines into blocks.
///
/// A block ends at a line that is exactly `]`, once more than one line is
/// buffered. Every line is trimmed. Blank lines are dropped between blocks
/// and kept inside one, where they may belong to a multi-line string.
#[derive(Debug, Default)]
pub struct BlockParser {
    lines: Vec<String>,
}

impl BlockParser {
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() && self.lines.is_empty() {
            return None;
        }
        self.lines.push(line.to_string());
        if line == "]" && self.lines.len() > 1 {
            let block = self.lines.join("\n");
            self.lines.clear();
            return Some(block);
        }
        None
    }
}

/// Leading string arguments of a `Notify` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NotifyCall {
    pub app_name: String,
    pub icon: String,
    pub summary: String,
    pub body: String,
}

impl NotifyCall {
    /// Read the `string "..."` arguments before the first array.
    pub fn parse(block: &str) -> Self {
        let strings = extract_strings(block);
        let mut args = strings.into_iter();
        Self {
            app_name: args.next().unwrap_or_default(),
            icon: args.next().unwrap_or_default(),
            summary: args.next().unwrap_or_default(),
            body: args.next().unwrap_or_default(),
        }
    }

    /// Body, then summary, then a fixed fallback.
    pub fn content(&self) -> &str {
        [self.body.as_str(), self.summary.as_str()]
            .into_iter()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT)
    }
}

/// String literals in argument order. Strings spanning several lines are
/// joined with `\n`. Stops at the first `array [`.
pub fn extract_strings(block: &str) -> Vec<String> {
    let mut strings = Vec::new();
    let mut open: Option<String> = None;

    for line in block.lines() {
        if let Some(mut partial) = open.take() {
            partial.push('\n');
            match line.strip_suffix('"') {
                Some(rest) => {
                    partial.push_str(rest);
                    strings.push(partial);
                }
                None => {
                    partial.push_str(line);
                    open = Some(partial);
                }
            }
            continue;
        }

        if line.starts_with("array [") {
            break;
        }
        let Some(rest) = line.strip_prefix("string \"") else {
            continue;
        };
        match rest.strip_suffix('"') {
            Some(value) => strings.push(value.to_string()),
            None => open = Some(rest.to_string()),
        }
    }
    strings
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONITOR_OUTPUT: &str = r#"
method call time=1700000000.1 sender=:1.88 -> destination=:1.20 serial=12 path=/org/freedesktop/Notifications; interface=org.freedesktop.Notifications; member=Notify
   string "dev.vencord.Vesktop"
   uint32 0
   string "/tmp/avatar.png"
   string "Alice (#general)"
   string "see you at 8"
   array [
   ]
"#;

    fn blocks(output: &str) -> Vec<String> {
        let mut parser = BlockParser::default();
        output.lines().filter_map(|l| parser.push_line(l)).collect()
    }

    #[test]
    fn block_ends_at_closing_bracket() {
        let blocks = blocks(MONITOR_OUTPUT);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].starts_with("method call"));
        assert!(blocks[0].ends_with("array [\n]"));
        assert!(blocks[0].contains("dev.vencord.Vesktop"));
    }

    #[test]
    fn lone_bracket_does_not_end_a_block() {
        let mut parser = BlockParser::default();
        assert_eq!(parser.push_line("]"), None);
        assert_eq!(parser.push_line("]").as_deref(), Some("]\n]"));
    }

    #[test]
    fn extracts_notify_arguments() {
        let block = &blocks(MONITOR_OUTPUT)[0];
        let call = NotifyCall::parse(block);
        assert_eq!(call.app_name, "dev.vencord.Vesktop");
        assert_eq!(call.icon, "/tmp/avatar.png");
        assert_eq!(call.summary, "Alice (#general)");
        assert_eq!(call.content(), "see you at 8");
    }

    #[test]
    fn multi_line_body() {
        let block = "string \"app\"\nuint32 0\nstring \"\"\nstring \"Bob\"\nstring \"line one\nline two\"\narray [\n]";
        let call = NotifyCall::parse(block);
        assert_eq!(call.body, "line one\nline two");
    }

    #[test]
    fn blank_line_inside_body_is_kept() {
        let output = "method call member=Notify\n   string \"app\"\n   uint32 0\n   string \"\"\n   string \"Bob\"\n   string \"first\n\nthird\"\n   array [\n   ]\n";
        let blocks = blocks(output);
        assert_eq!(blocks.len(), 1);
        assert_eq!(NotifyCall::parse(&blocks[0]).body, "first\n\nthird");
    }

    #[test]
    fn blank_lines_between_blocks_are_skipped() {
        let mut parser = BlockParser::default();
        assert_eq!(parser.push_line(""), None);
        assert_eq!(parser.push_line("   "), None);
        assert_eq!(parser.push_line("]"), None);
        assert_eq!(parser.push_line("]").as_deref(), Some("]\n]"));
    }

    #[test]
    fn content_fallbacks() {
        let mut call = NotifyCall {
            summary: "Bob".into(),
            ..Default::default()
        };
        assert_eq!(call.content(), "Bob");
        call.summary.clear();
        assert_eq!(call.content(), DEFAULT_CONTENT);
    }
}
