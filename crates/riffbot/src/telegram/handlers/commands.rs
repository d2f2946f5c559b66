//! Command handler implementations (/start, /help)

use indoc::indoc;
use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::HandlerError;
use crate::telegram::Bot;

const GREETING: &str = indoc! {"
    👋 Hi! Send me a link to a video (YouTube and many other sites work)
    and I will send the audio back as an MP3.

    While the file is prepared, a status message shows the progress.
    One download at a time per user, please.
"};

/// Static greeting shown for /start and /help
pub fn greeting_text() -> &'static str {
    GREETING
}

/// Handle /start and /help
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, greeting_text()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_mentions_mp3() {
        assert!(greeting_text().starts_with("👋 Hi!"));
        assert!(greeting_text().contains("MP3"));
        // indoc strips the common indentation
        assert!(!greeting_text().lines().any(|l| l.starts_with(' ')));
    }
}
