//! Twitch IRC line parsing.
//!
//! Twitch chat speaks IRC with the IRCv3 `tags` extension. A tagged PRIVMSG
//! looks like:
//!
//! `@badges=broadcaster/1;custom-reward-id=...;display-name=Foo :foo!foo@foo.tmi.twitch.tv PRIVMSG #channel :text`
//!
//! Badges carry the chatter's permission attributes; a `custom-reward-id`
//! tag marks the message as a channel-point redemption rather than plain
//! chat.

use std::collections::HashMap;

use jukebot_core::Flags;
use jukebot_events::{CommandEvent, EventMeta, RewardEvent};

use crate::adapter::ChatEvent;

/// One parsed PRIVMSG line.
#[derive(Debug, Clone)]
pub struct PrivMsg {
    pub tags: HashMap<String, String>,
    pub nick: String,
    pub channel: String,
    pub text: String,
}

/// Parse a raw IRC line into a PRIVMSG, if it is one.
pub fn parse_privmsg(line: &str) -> Option<PrivMsg> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (tags, rest) = match line.strip_prefix('@') {
        Some(tagged) => {
            let (tag_part, rest) = tagged.split_once(' ')?;
            (parse_tags(tag_part), rest)
        }
        None => (HashMap::new(), line),
    };

    // :nick!user@host PRIVMSG #channel :text
    if !rest.contains(" PRIVMSG ") {
        return None;
    }
    let nick = rest.trim_start_matches(':').split('!').next()?.to_string();
    let mut parts = rest.splitn(4, ' ');
    parts.next(); // :nick!...
    parts.next(); // PRIVMSG
    let channel = parts.next()?.trim_start_matches('#').to_string();
    let text = parts.next()?.trim_start_matches(':').to_string();
    Some(PrivMsg { tags, nick, channel, text })
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|kv| kv.split_once('='))
        .map(|(k, v)| (k.to_string(), unescape_tag_value(v)))
        .collect()
}

/// IRCv3 tag value unescaping: `\s` space, `\:` semicolon, `\\` backslash.
fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some(':') => out.push(';'),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Derive permission flags from the `badges` tag
/// (e.g. `broadcaster/1,subscriber/12`).
pub fn flags_from_badges(badges: &str) -> Flags {
    let mut flags = Flags::default();
    for badge in badges.split(',') {
        match badge.split('/').next().unwrap_or_default() {
            "broadcaster" => flags.broadcaster = true,
            "moderator" => flags.moderator = true,
            "subscriber" => flags.subscriber = true,
            "vip" => flags.vip = true,
            "founder" => flags.founder = true,
            _ => {}
        }
    }
    flags
}

/// Classify a PRIVMSG into a dispatchable event.
///
/// Redemptions (any message carrying `custom-reward-id`) become reward
/// events; `!`-prefixed messages become command events with the trigger
/// marker removed and the command name lowercased. Plain chat yields `None`.
pub fn classify(msg: PrivMsg) -> Option<ChatEvent> {
    let user = msg
        .tags
        .get("display-name")
        .filter(|name| !name.is_empty())
        .cloned()
        .unwrap_or(msg.nick);

    let reward_id = msg.tags.get("custom-reward-id").filter(|id| !id.is_empty()).cloned();
    if let Some(reward_id) = reward_id {
        return Some(ChatEvent::Reward(RewardEvent {
            user,
            reward: reward_id.clone(),
            // IRC tags carry no redemption cost.
            cost: 0,
            message: msg.text,
            meta: EventMeta {
                channel: msg.channel,
                reward_id: Some(reward_id),
            },
        }));
    }

    let rest = msg.text.strip_prefix('!')?;
    let (command, message) = rest
        .split_once(char::is_whitespace)
        .map(|(c, m)| (c, m.trim()))
        .unwrap_or((rest, ""));
    if command.is_empty() {
        return None;
    }

    let flags = msg
        .tags
        .get("badges")
        .map(|badges| flags_from_badges(badges))
        .unwrap_or_default();

    Some(ChatEvent::Command(CommandEvent {
        user,
        command: command.to_lowercase(),
        message: message.to_string(),
        flags,
        meta: EventMeta { channel: msg.channel, reward_id: None },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str =
        ":viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #streamer :just chatting";
    const COMMAND: &str = "@badges=moderator/1;display-name=Viewer \
        :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #streamer :!add lo-fi beats";
    const REWARD: &str = "@badges=;custom-reward-id=2da16ec5-b966-4ce0-a40d-6d0ba2f94a6e;display-name=Viewer \
        :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #streamer :read this out";

    #[test]
    fn parses_untagged_privmsg() {
        let msg = parse_privmsg(PLAIN).unwrap();
        assert_eq!(msg.nick, "viewer");
        assert_eq!(msg.channel, "streamer");
        assert_eq!(msg.text, "just chatting");
        assert!(msg.tags.is_empty());
    }

    #[test]
    fn non_privmsg_lines_are_ignored() {
        assert!(parse_privmsg("PING :tmi.twitch.tv").is_none());
        assert!(parse_privmsg(":tmi.twitch.tv 001 nick :Welcome").is_none());
    }

    #[test]
    fn tag_values_are_unescaped() {
        let msg = parse_privmsg(
            "@system-msg=hello\\sworld\\:! :n!n@n.tmi.twitch.tv PRIVMSG #c :x",
        )
        .unwrap();
        assert_eq!(msg.tags["system-msg"], "hello world;!");
    }

    #[test]
    fn badges_map_to_flags() {
        let flags = flags_from_badges("broadcaster/1,subscriber/42");
        assert!(flags.broadcaster && flags.subscriber);
        assert!(!flags.moderator && !flags.vip && !flags.founder);

        let flags = flags_from_badges("vip/1,founder/0");
        assert!(flags.vip && flags.founder);
    }

    #[test]
    fn classifies_command_with_flags_and_message() {
        let msg = parse_privmsg(COMMAND).unwrap();
        let Some(ChatEvent::Command(event)) = classify(msg) else {
            panic!("expected command event");
        };
        assert_eq!(event.command, "add");
        assert_eq!(event.message, "lo-fi beats");
        assert_eq!(event.user, "Viewer");
        assert!(event.flags.moderator);
        assert_eq!(event.meta.channel, "streamer");
    }

    #[test]
    fn classifies_reward_from_tag() {
        let msg = parse_privmsg(REWARD).unwrap();
        let Some(ChatEvent::Reward(event)) = classify(msg) else {
            panic!("expected reward event");
        };
        assert_eq!(
            event.meta.reward_id.as_deref(),
            Some("2da16ec5-b966-4ce0-a40d-6d0ba2f94a6e")
        );
        assert_eq!(event.message, "read this out");
        assert_eq!(event.cost, 0);
    }

    #[test]
    fn plain_chat_is_not_an_event() {
        let msg = parse_privmsg(PLAIN).unwrap();
        assert!(classify(msg).is_none());
    }

    #[test]
    fn bare_trigger_marker_is_not_a_command() {
        let msg = parse_privmsg(
            ":v!v@v.tmi.twitch.tv PRIVMSG #c :!",
        )
        .unwrap();
        assert!(classify(msg).is_none());
    }
}
