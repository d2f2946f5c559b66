//! Status texts shown while a request runs.

/// Number of cells in the bar
pub const BAR_WIDTH: usize = 20;

/// Share of the bar filled by the download itself; conversion and upload get the rest
pub const DOWNLOAD_SHARE: f64 = 90.0;

const FILLED: char = '█';
const EMPTY: char = '░';

/// Renders `[████░░...] 45.0%`.
///
/// `floor(20 * p / 100)` cells are filled. `p` is clamped to `0..=100`.
///
/// # Example
///
/// ```
/// use riffcore::download::progress::progress_bar;
///
/// assert_eq!(progress_bar(45.0), "[█████████░░░░░░░░░░░] 45.0%");
/// ```
pub fn progress_bar(percent: f64) -> String {
    let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
    let filled = ((BAR_WIDTH as f64 * percent / 100.0).floor() as usize).min(BAR_WIDTH);

    format!(
        "[{}{}] {:.1}%",
        FILLED.to_string().repeat(filled),
        EMPTY.to_string().repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Bar position for `downloaded` of `total` bytes, scaled into the download share
pub fn download_percent(downloaded: u64, total: Option<u64>) -> f64 {
    let total = total.unwrap_or(0).max(1);
    (downloaded as f64 / total as f64 * DOWNLOAD_SHARE).min(DOWNLOAD_SHARE)
}

pub fn connecting_status() -> String {
    format!("📡 Connecting...\n{}", progress_bar(0.0))
}

pub fn downloading_status(percent: f64) -> String {
    format!("📥 Downloading...\n{}", progress_bar(percent))
}

pub const CONVERTING_STATUS: &str = "🔄 Converting to MP3...";

pub fn transcoding_status(bitrate: &str) -> String {
    format!("🎛 Converting to MP3 ({})...", bitrate)
}

pub fn uploading_status() -> String {
    format!("📤 Uploading...\n{}", progress_bar(100.0))
}

pub fn error_status(user_message: &str) -> String {
    format!("❌ Error: {}", user_message)
}

/// Escapes every character Telegram's MarkdownV2 reserves
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|' | '{' | '}' | '.' | '!'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Caption of the delivered audio, in MarkdownV2
pub fn format_caption(title: &str, elapsed_secs: f64, size_mib: f64) -> String {
    format!(
        "✅ *{}* converted successfully\\!\n⏱️ Time taken: *{}s*\n💾 File size: *{} MB*",
        escape_markdown(title),
        escape_markdown(&format!("{:.1}", elapsed_secs)),
        escape_markdown(&format!("{:.2}", size_mib))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled_cells(bar: &str) -> usize {
        bar.chars().filter(|c| *c == FILLED).count()
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0), "[░░░░░░░░░░░░░░░░░░░░] 0.0%");
        assert_eq!(progress_bar(100.0), "[████████████████████] 100.0%");
    }

    #[test]
    fn test_progress_bar_cell_count() {
        for p in [0.0, 4.9, 5.0, 12.34, 45.0, 50.0, 89.99, 90.0, 99.9, 100.0] {
            let bar = progress_bar(p);
            let expected = (20.0 * p / 100.0_f64).floor() as usize;
            assert_eq!(filled_cells(&bar), expected, "p = {}", p);
            assert_eq!(bar.chars().filter(|c| *c == EMPTY).count(), 20 - expected);
            assert!(bar.ends_with(&format!("] {:.1}%", p)));
        }
    }

    #[test]
    fn test_progress_bar_clamps() {
        assert_eq!(progress_bar(-5.0), progress_bar(0.0));
        assert_eq!(progress_bar(250.0), progress_bar(100.0));
        assert_eq!(progress_bar(f64::NAN), progress_bar(0.0));
    }

    #[test]
    fn test_download_percent_scales_to_ninety() {
        assert_eq!(download_percent(50, Some(100)), 45.0);
        assert_eq!(download_percent(100, Some(100)), 90.0);
        assert_eq!(download_percent(0, None), 0.0);
        // Unknown total never overflows the download share
        assert_eq!(download_percent(5000, None), 90.0);
    }

    #[test]
    fn test_status_texts() {
        assert_eq!(downloading_status(45.0), "📥 Downloading...\n[█████████░░░░░░░░░░░] 45.0%");
        assert!(connecting_status().starts_with("📡 Connecting...\n["));
        assert_eq!(transcoding_status("320k"), "🎛 Converting to MP3 (320k)...");
        assert_eq!(error_status("boom"), "❌ Error: boom");
    }

    #[test]
    fn test_format_caption() {
        assert_eq!(
            format_caption("my_song", 12.34, 10.0),
            "✅ *my\\_song* converted successfully\\!\n⏱️ Time taken: *12\\.3s*\n💾 File size: *10\\.00 MB*"
        );
    }

    #[test]
    fn test_caption_escapes_markup_in_title() {
        let caption = format_caption("AC*DC - lo_fi (live). Wow!", 3.0, 1.5);
        assert!(caption.starts_with("✅ *AC\\*DC \\- lo\\_fi \\(live\\)\\. Wow\\!* converted"));

        // Only the three bold spans of the template stay unescaped
        let unescaped_stars = caption
            .char_indices()
            .filter(|(i, c)| *c == '*' && !caption[..*i].ends_with('\\'))
            .count();
        assert_eq!(unescaped_stars, 6);
    }

    #[test]
    fn test_escape_markdown_covers_reserved_set() {
        assert_eq!(escape_markdown("a.b!c"), "a\\.b\\!c");
        assert_eq!(escape_markdown("[x](y)"), "\\[x\\]\\(y\\)");
        assert_eq!(escape_markdown("back\\slash"), "back\\\\slash");
        assert_eq!(escape_markdown("plain text"), "plain text");
    }
}
