// src/notifier/window.rs

/// Рамка окна в сообщении. Правой границы нет: в Telegram шрифт не моноширинный.
const TOP_LEFT: &str = "╔═";
const SIDE: &str = "║ ";
const BOTTOM_LEFT: &str = "╚";
const RULE: &str = "══════════════";

/// Оформление окна вокруг произвольного содержимого
#[derive(Debug, Clone, Default)]
pub struct Window {
    icon: Option<String>,
    title: Option<String>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self { icon: None, title: Some(title.into()) }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Содержимое переносится без изменений: строки режутся только по `\n`,
    /// поэтому `\r` и завершающая пустая строка сохраняются.
    pub fn render(&self, body: &str) -> String {
        let mut header = String::from(TOP_LEFT);
        match (&self.icon, &self.title) {
            (Some(icon), Some(title)) => header.push_str(&format!(" {} {} ", icon, title)),
            (Some(icon), None) => header.push_str(&format!(" {} ", icon)),
            (None, Some(title)) => header.push_str(&format!(" {} ", title)),
            (None, None) => {}
        }
        header.push_str(RULE);

        let mut out = header;
        for line in body.split('\n') {
            out.push('\n');
            out.push_str(SIDE);
            out.push_str(line);
        }
        out.push('\n');
        out.push_str(BOTTOM_LEFT);
        out.push_str(RULE);
        out
    }
}
