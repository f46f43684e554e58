//! Presentation Builder
//!
//! Pure rendering of polls into chat message blocks, in two variants:
//! open (interactive vote buttons) and closed (results only, no
//! controls). Output is byte-identical for identical input so closed
//! polls can be re-rendered idempotently.

use super::types::{Poll, PollResults};
use crate::channels::MessageBlock;

/// Width of the proportional result bar, in segments.
const BAR_SEGMENTS: usize = 10;

/// Fallback text for the open poll message.
pub fn open_text(poll: &Poll) -> String {
    format!("New poll: {}", poll.topic)
}

/// Fallback text for the closed poll message.
pub fn closed_text(poll: &Poll) -> String {
    format!("Poll closed: {}", poll.topic)
}

/// Render the open-poll message: topic, one button per option, and a
/// footer stating the choice policy.
pub fn open_poll_blocks(poll: &Poll) -> Vec<MessageBlock> {
    let mut blocks = vec![
        MessageBlock::section(&format!(
            "[*] *{}*\n_Use the buttons below to vote._",
            poll.topic
        )),
        MessageBlock::divider(),
    ];

    for (index, label) in poll.options.iter().enumerate() {
        blocks.push(MessageBlock::section_with_button(
            &format!("[{}] {}", index + 1, label),
            "Vote",
            &format!("poll_vote_{}", index),
            &format!("vote_{}_{}", poll.id, index),
        ));
    }

    let policy = if poll.allow_multiple {
        "You may vote for multiple options."
    } else {
        "You may pick only one option."
    };
    blocks.push(MessageBlock::context(&format!("[i] {}", policy)));

    blocks
}

/// Render the closed-poll message: results banner, one bar line per
/// option, and no interactive elements at all.
pub fn closed_poll_blocks(poll: &Poll, results: &PollResults) -> Vec<MessageBlock> {
    let mut blocks = vec![
        MessageBlock::section(&format!("[v] *POLL CLOSED: {}*", poll.topic)),
        MessageBlock::divider(),
    ];

    for (index, tally) in results.options.iter().enumerate() {
        blocks.push(MessageBlock::section(&format!(
            "[{}] *{}*\n[{}] {:.1}% ({} votes)",
            index + 1,
            tally.label,
            bar(tally.percent),
            tally.percent,
            tally.count
        )));
    }

    blocks.push(MessageBlock::context(
        "[i] This poll has ended. Votes are no longer accepted.",
    ));

    blocks
}

/// Plain-text rendering of results, used when no poll message exists
/// to update and a fresh results-only message is posted.
pub fn results_text(poll: &Poll, results: &PollResults) -> String {
    let mut text = format!("[*] *Topic:* {}\n\n", poll.topic);
    for tally in &results.options {
        text.push_str(&format!(
            "{}\n[{}] {:.1}% ({} votes)\n\n",
            tally.label,
            bar(tally.percent),
            tally.percent,
            tally.count
        ));
    }
    text
}

/// Fixed-width proportional bar: one `=` per full 10% of the vote,
/// padded with `-`.
fn bar(percent: f64) -> String {
    let filled = ((percent / 10.0) as usize).min(BAR_SEGMENTS);
    format!("{}{}", "=".repeat(filled), "-".repeat(BAR_SEGMENTS - filled))
}
