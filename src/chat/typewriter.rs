use std::io::Write;
use std::time::Duration;

use crate::models::ChatConfig;

pub const CURSOR: char = '▌';

/// Erases the cursor drawn after the last character.
const ERASE_CURSOR: &str = "\x08 \x08";

/// Replays a finished response character by character behind a block cursor.
#[derive(Debug, Clone, Copy)]
pub struct Typewriter {
    delay: Duration,
}

impl Typewriter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(Duration::from_millis(config.stream_delay_ms))
    }

    pub async fn write<W: Write>(&self, out: &mut W, text: &str) -> std::io::Result<()> {
        for ch in text.chars() {
            if ch == '\n' {
                writeln!(out)?;
                continue;
            }
            write!(out, "{ch}{CURSOR}")?;
            out.flush()?;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            out.write_all(ERASE_CURSOR.as_bytes())?;
        }
        writeln!(out)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_replays_full_text() {
        let mut out = Vec::new();
        Typewriter::new(Duration::ZERO)
            .write(&mut out, "héllo")
            .await
            .unwrap();

        let written = String::from_utf8(out).unwrap();
        assert_eq!(written.matches(CURSOR).count(), 5);
        assert_eq!(written.replace(&format!("{CURSOR}{ERASE_CURSOR}"), ""), "héllo\n");
    }

    #[tokio::test]
    async fn test_multiline_reply_keeps_line_breaks() {
        let mut out = Vec::new();
        Typewriter::new(Duration::ZERO)
            .write(&mut out, "1. first\n2. second")
            .await
            .unwrap();

        let written = String::from_utf8(out).unwrap();
        assert_eq!(written.matches(CURSOR).count(), 17);
        assert!(!written.contains(&format!("\n{CURSOR}")));
        assert_eq!(
            written.replace(&format!("{CURSOR}{ERASE_CURSOR}"), ""),
            "1. first\n2. second\n"
        );
    }

    #[tokio::test]
    async fn test_empty_text_prints_newline() {
        let mut out = Vec::new();
        Typewriter::new(Duration::ZERO).write(&mut out, "").await.unwrap();
        assert_eq!(out, b"\n");
    }
}
