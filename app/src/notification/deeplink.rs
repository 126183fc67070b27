//! Deep links into the Discord web client.

const BASE: &str = "https://discord.com";

/// Guild channel, then DM channel, then the app landing page.
pub fn deep_link(channel_id: &str, guild_id: &str) -> String {
    match (channel_id.is_empty(), guild_id.is_empty()) {
        (false, false) => format!("{BASE}/channels/{guild_id}/{channel_id}"),
        (false, true) => format!("{BASE}/channels/@me/{channel_id}"),
        _ => format!("{BASE}/app"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_table() {
        assert_eq!(deep_link("42", "7"), "https://discord.com/channels/7/42");
        assert_eq!(deep_link("42", ""), "https://discord.com/channels/@me/42");
        assert_eq!(deep_link("", ""), "https://discord.com/app");
        assert_eq!(deep_link("", "7"), "https://discord.com/app");
    }
}
