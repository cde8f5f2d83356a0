//! Animation and easter-egg statistics over chat messages

use std::collections::HashSet;

use serde::Serialize;

use super::{count_values, ranked};
use crate::types::ChatMessage;

/// Entries kept in the top animation and easter-egg lists
pub const TOP_ANIMATIONS: usize = 5;

/// An animation id and how often it played
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationStats {
    /// Messages that played a response animation
    pub total_triggers: usize,
    /// Messages flagged as easter eggs
    pub easter_eggs_triggered: usize,
    /// Distinct sessions with at least one easter egg
    pub sessions_with_easter_eggs: usize,
    /// Most played response animations
    pub top_animations: Vec<AnimationCount>,
    /// Most played easter eggs
    pub top_easter_eggs: Vec<AnimationCount>,
    /// Every wait sequence, alphabetical
    pub wait_sequences: Vec<AnimationCount>,
}

fn counts(values: Vec<&str>) -> Vec<AnimationCount> {
    ranked(count_values(values))
        .into_iter()
        .map(|(name, count)| AnimationCount {
            name: name.to_string(),
            count,
        })
        .collect()
}

/// Compute animation statistics for the messages of in-range sessions.
pub fn animation_stats(messages: &[ChatMessage]) -> AnimationStats {
    let easter_eggs: Vec<&ChatMessage> = messages.iter().filter(|m| m.easter_egg_triggered).collect();
    let sessions_with_easter_eggs: HashSet<&str> =
        easter_eggs.iter().map(|m| m.session_id.as_str()).collect();

    let mut top_animations = counts(
        messages
            .iter()
            .filter_map(|m| m.response_animation.as_deref())
            .collect(),
    );
    top_animations.truncate(TOP_ANIMATIONS);

    let mut top_easter_eggs = counts(
        easter_eggs
            .iter()
            .filter_map(|m| m.easter_egg_animation.as_deref())
            .collect(),
    );
    top_easter_eggs.truncate(TOP_ANIMATIONS);

    let mut wait_sequences = counts(
        messages
            .iter()
            .filter_map(|m| m.wait_sequence.as_deref())
            .collect(),
    );
    wait_sequences.sort_by(|a, b| a.name.cmp(&b.name));

    AnimationStats {
        total_triggers: messages
            .iter()
            .filter(|m| m.response_animation.is_some())
            .count(),
        easter_eggs_triggered: easter_eggs.len(),
        sessions_with_easter_eggs: sessions_with_easter_eggs.len(),
        top_animations,
        top_easter_eggs,
        wait_sequences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Author;

    fn message(session_id: &str, animation: Option<&str>, easter_egg: Option<&str>, wait: Option<&str>) -> ChatMessage {
        ChatMessage {
            session_id: session_id.to_string(),
            author: Author::Bot,
            message: String::new(),
            timestamp: None,
            response_time_ms: None,
            response_animation: animation.map(str::to_string),
            easter_egg_animation: easter_egg.map(str::to_string),
            easter_egg_triggered: easter_egg.is_some(),
            wait_sequence: wait.map(str::to_string),
            input_tokens: None,
            output_tokens: None,
            total_tokens: None,
            cost_eur: None,
        }
    }

    #[test]
    fn test_animation_stats() {
        let messages = vec![
            message("s1", Some("wave"), None, Some("typing")),
            message("s1", Some("wave"), Some("dance"), Some("thinking")),
            message("s2", Some("nod"), Some("dance"), Some("typing")),
            message("s2", None, Some("backflip"), None),
            message("s3", Some("shrug"), None, Some("dots")),
        ];
        let stats = animation_stats(&messages);

        assert_eq!(stats.total_triggers, 4);
        assert_eq!(stats.easter_eggs_triggered, 3);
        assert_eq!(stats.sessions_with_easter_eggs, 2);
        assert_eq!(stats.top_animations[0], AnimationCount { name: "wave".to_string(), count: 2 });
        assert_eq!(stats.top_easter_eggs[0].name, "dance");
        let waits: Vec<&str> = stats.wait_sequences.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(waits, vec!["dots", "thinking", "typing"]);
    }

    #[test]
    fn test_top_animations_limited() {
        let names = ["a", "b", "c", "d", "e", "f", "g"];
        let messages: Vec<ChatMessage> = names
            .iter()
            .map(|&n| message("s1", Some(n), None, Some(n)))
            .collect();
        let stats = animation_stats(&messages);
        assert_eq!(stats.top_animations.len(), TOP_ANIMATIONS);
        assert_eq!(stats.wait_sequences.len(), names.len());
    }

    #[test]
    fn test_flag_without_animation_counts_as_easter_egg() {
        let mut flagged = message("s1", None, None, None);
        flagged.easter_egg_triggered = true;
        let stats = animation_stats(&[flagged]);
        assert_eq!(stats.easter_eggs_triggered, 1);
        assert!(stats.top_easter_eggs.is_empty());
    }

    #[test]
    fn test_empty_messages() {
        assert_eq!(animation_stats(&[]), AnimationStats::default());
    }
}
