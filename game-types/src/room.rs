use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lobby rooms always listed, whether or not the rooms table has rows for them.
pub const ROOM_NAMES: [&str; 5] = ["Room 1", "Room 2", "Room 3", "Room 4", "Room 5"];

pub const ROOM_STATUS_OPEN: &str = "open";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Room {
    pub name: String,
    pub status: String,
}

impl Room {
    pub fn open(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ROOM_STATUS_OPEN.to_string(),
        }
    }

    /// The fixed room list with any stored statuses laid over it.
    pub fn merge_with_defaults(stored: &[Room]) -> Vec<Room> {
        ROOM_NAMES
            .iter()
            .map(|name| {
                stored
                    .iter()
                    .find(|room| room.name == *name)
                    .cloned()
                    .unwrap_or_else(|| Room::open(*name))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_with_defaults() {
        let stored = vec![
            Room {
                name: "Room 2".to_string(),
                status: "full".to_string(),
            },
            Room {
                name: "Side Room".to_string(),
                status: "full".to_string(),
            },
        ];
        let rooms = Room::merge_with_defaults(&stored);
        assert_eq!(rooms.len(), 5);
        assert_eq!(rooms[0], Room::open("Room 1"));
        assert_eq!(rooms[1].status, "full");
        assert!(rooms.iter().all(|room| room.name != "Side Room"));
    }
}
