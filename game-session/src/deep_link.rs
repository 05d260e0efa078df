use game_types::{GameId, InvitationId};
use url::Url;

pub const INVITE_PARAM: &str = "inviteId";
pub const GAME_PARAM: &str = "gameId";
pub const ROOM_PARAM: &str = "room";

/// The session's current page address and the query parameters it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    url: Url,
}

impl DeepLink {
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(input)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn invite_id(&self) -> Option<InvitationId> {
        self.param(INVITE_PARAM)?.trim().parse().ok()
    }

    pub fn game_id(&self) -> Option<GameId> {
        self.param(GAME_PARAM)?.trim().parse().ok()
    }

    pub fn room(&self) -> Option<String> {
        self.param(ROOM_PARAM).filter(|room| !room.is_empty())
    }

    /// Same address with `key` set to `value`, replacing any earlier value.
    pub fn with_param(&self, key: &str, value: &str) -> Self {
        let kept = self.pairs_without(key);
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(key, value);
        Self { url }
    }

    pub fn without_param(&self, key: &str) -> Self {
        let kept = self.pairs_without(key);
        let mut url = self.url.clone();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        Self { url }
    }

    /// A fresh link to this page carrying only `key=value`.
    pub fn share(&self, key: &str, value: &str) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.set_query(None);
        url.query_pairs_mut().append_pair(key, value);
        url.into()
    }

    fn pairs_without(&self, key: &str) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

impl std::fmt::Display for DeepLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_known_params() {
        let link =
            DeepLink::parse("https://play.example/?inviteId=12&gameId=7&room=Room%202").unwrap();
        assert_eq!(link.invite_id(), Some(12));
        assert_eq!(link.game_id(), Some(7));
        assert_eq!(link.room().as_deref(), Some("Room 2"));
    }

    #[test]
    fn test_ignores_malformed_ids() {
        let link = DeepLink::parse("https://play.example/?inviteId=abc&room=").unwrap();
        assert_eq!(link.invite_id(), None);
        assert_eq!(link.game_id(), None);
        assert_eq!(link.room(), None);
    }

    #[test]
    fn test_with_param_replaces() {
        let link = DeepLink::parse("https://play.example/game?gameId=1&room=Room+1").unwrap();
        let updated = link.with_param(GAME_PARAM, "9");
        assert_eq!(updated.game_id(), Some(9));
        assert_eq!(updated.room().as_deref(), Some("Room 1"));
        assert_eq!(updated.as_str().matches("gameId").count(), 1);

        let cleared = updated.without_param(ROOM_PARAM).without_param(GAME_PARAM);
        assert_eq!(cleared.as_str(), "https://play.example/game");
    }

    #[test]
    fn test_share_drops_other_params() {
        let link = DeepLink::parse("https://play.example/?room=Room+3#lobby").unwrap();
        assert_eq!(
            link.share(INVITE_PARAM, "44"),
            "https://play.example/?inviteId=44"
        );
    }
}
