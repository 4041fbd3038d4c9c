use crate::orchestrator::Process;

const CARD_WIDTH: usize = 60;
const DESCRIPTION_PREVIEW: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCard {
    pub title: String,
    pub process_id: i64,
    pub process_key: String,
    pub description: String,
    pub is_starting: bool,
}

impl ProcessCard {
    pub fn new(process: &Process, is_starting: bool) -> Self {
        Self {
            title: process.name.clone(),
            process_id: process.id,
            process_key: process.key.clone(),
            description: process.description.clone(),
            is_starting,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "─".repeat(CARD_WIDTH);
        out.push_str(&format!("┌{rule}\n"));
        out.push_str(&format!("│ ⚙️  {}\n", self.title));
        out.push_str(&format!("│    id {} · key {}\n", self.process_id, self.process_key));
        if self.description.trim().is_empty() {
            out.push_str("│    No description\n");
        } else {
            out.push_str(&format!("│    {}\n", preview(&self.description)));
        }
        if self.is_starting {
            out.push_str("│    ⏳ Starting...\n");
        } else {
            out.push_str(&format!("│    ▶️  start {}\n", self.process_key));
        }
        out.push_str(&format!("└{rule}\n"));
        out
    }
}

fn preview(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() > DESCRIPTION_PREVIEW {
        let cut: String = text.chars().take(DESCRIPTION_PREVIEW).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(description: &str) -> Process {
        Process {
            id: 1,
            name: "Invoice Bot".to_string(),
            key: "abc".to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_card_shows_start_hint() {
        let rendered = ProcessCard::new(&process("x"), false).render();
        assert!(rendered.contains("Invoice Bot"));
        assert!(rendered.contains("start abc"));
        assert!(!rendered.contains("Starting"));
    }

    #[test]
    fn test_card_layout() {
        let rendered = ProcessCard::new(&process("Posts invoices"), false).render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "│ ⚙️  Invoice Bot");
        assert_eq!(lines[2], "│    id 1 · key abc");
        assert_eq!(lines[3], "│    Posts invoices");
        assert_eq!(lines[4], "│    ▶️  start abc");
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn test_card_while_starting() {
        let rendered = ProcessCard::new(&process(""), true).render();
        assert!(rendered.contains("Starting..."));
        assert!(rendered.contains("No description"));
    }

    #[test]
    fn test_long_description_is_truncated() {
        let long = "é".repeat(300);
        let rendered = ProcessCard::new(&process(&long), false).render();
        assert!(rendered.contains("..."));
        assert!(!rendered.contains(&long));
    }
}
