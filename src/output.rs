use crate::model::{Quest, QuestState};
use crate::ts::format_instant;

pub struct Styler {
    color_enabled: bool,
}

impl Styler {
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    fn wrap(&self, code: &str, s: &str) -> String {
        if !self.color_enabled {
            return s.to_string();
        }
        format!("{}{}\u{001b}[0m", code, s)
    }

    pub fn green(&self, s: &str) -> String {
        self.wrap("\u{001b}[32m", s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.wrap("\u{001b}[33m", s)
    }

    pub fn red(&self, s: &str) -> String {
        self.wrap("\u{001b}[31m", s)
    }

    pub fn gray(&self, s: &str) -> String {
        self.wrap("\u{001b}[90m", s)
    }

    /// Claimable stands out; finished and locked quests recede.
    pub fn state(&self, state: QuestState) -> String {
        let label = state.as_str();
        match state {
            QuestState::Claimable => self.green(label),
            QuestState::Active => self.yellow(label),
            QuestState::Failed => self.red(label),
            QuestState::Locked | QuestState::Completed => self.gray(label),
            QuestState::Available => label.to_string(),
        }
    }
}

/// Visible width, ignoring ANSI color sequences. Block elements used by the
/// progress bar count as one column.
pub fn display_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c == 'm' {
                in_escape = false;
            }
            continue;
        }
        if c == '\u{001b}' {
            in_escape = true;
            continue;
        }
        width += 1;
    }
    width
}

fn pad_right(s: &str, width: usize) -> String {
    let dw = display_width(s);
    if dw >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - dw))
    }
}

pub fn render_simple_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();

    for row in rows.iter() {
        for (i, cell) in row.iter().enumerate() {
            let cell_width = display_width(cell);
            if i >= widths.len() {
                widths.push(cell_width);
            } else {
                widths[i] = widths[i].max(cell_width);
            }
        }
    }

    let render_line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| pad_right(c, widths[i]))
            .collect::<Vec<String>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render_line(headers.iter().map(|h| h.to_string()).collect())];
    for row in rows.iter() {
        lines.push(render_line(row.clone()));
    }
    lines.join("\n")
}

pub fn render_progress_bar(percent: u8, width: usize) -> String {
    let filled = ((percent.min(100) as f64 / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn quest_rows(quests: &[Quest], styler: &Styler) -> Vec<Vec<String>> {
    quests
        .iter()
        .map(|q| {
            let note = match q.state {
                QuestState::Locked => q.locked_reason.clone().unwrap_or_default(),
                QuestState::Active => q
                    .end_at
                    .map(|e| format!("ends {}", format_instant(&e)))
                    .unwrap_or_default(),
                QuestState::Failed if q.dismissed_at.is_some() => "dismissed".to_string(),
                _ => String::new(),
            };
            vec![
                q.id.clone(),
                q.kind.as_str().to_string(),
                styler.state(q.state),
                format!("{} {:>3}%", render_progress_bar(q.progress_pct, 10), q.progress_pct),
                q.reward_xp.to_string(),
                note,
            ]
        })
        .collect()
}

pub const QUEST_HEADERS: [&str; 6] = ["id", "kind", "state", "progress", "xp", "note"];

/// Pretty JSON with object keys sorted, so output is byte-stable.
pub fn to_stable_json<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    fn sort(v: serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Object(map) => {
                let mut entries: Vec<(String, serde_json::Value)> = map.into_iter().collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                serde_json::Value::Object(entries.into_iter().map(|(k, v)| (k, sort(v))).collect())
            }
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(sort).collect())
            }
            other => other,
        }
    }
    serde_json::to_string_pretty(&sort(serde_json::to_value(value)?))
}
