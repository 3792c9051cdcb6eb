//! Parsers for the textual replies of the `list` console command.
//!
//! Pure functions, no I/O. The upstream text format is not
//! contractually stable — phrasing varies by server version and locale
//! — so parsing is deliberately permissive: a reply that does not match
//! the known shape yields a partial value rather than an error, since
//! callers prefer partial data over a failed request.

use serde::{Deserialize, Serialize};

/// Player counts extracted from a `list` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// A reply was received, so the server is up; only the counts are
    /// ever in doubt.
    pub online: bool,
    pub player_count: Option<u32>,
    pub max_players: Option<u32>,
}

/// Server metadata. No command in the current set exposes version or
/// MOTD, so both stay declared-unknown until one is wired in — a known
/// limitation, not fabricated data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: Option<String>,
    pub motd: Option<String>,
}

/// Parse "There are X of a max of Y players online" out of a `list`
/// reply. Non-matching input yields `online: true` with absent counts.
pub fn parse_status(reply: &str) -> ServerStatus {
    let counts: Option<(u32, u32)> = (|| {
        let start = reply.find("There are ")?;
        let rest = &reply[start + "There are ".len()..];
        let (count, rest) = rest.split_once(" of a max of ")?;
        let (max, tail) = rest.split_once(' ')?;
        if !tail.starts_with("players online") {
            return None;
        }
        Some((count.trim().parse().ok()?, max.trim().parse().ok()?))
    })();

    match counts {
        Some((player_count, max_players)) => ServerStatus {
            online: true,
            player_count: Some(player_count),
            max_players: Some(max_players),
        },
        None => ServerStatus {
            online: true,
            player_count: None,
            max_players: None,
        },
    }
}

/// Extract the player names after the trailing "online:" segment of a
/// `list` reply. Empty when nobody is online or the segment is absent.
pub fn parse_roster(reply: &str) -> Vec<String> {
    let Some((_, tail)) = reply.rsplit_once("online:") else {
        return Vec::new();
    };
    tail.split(", ")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// See [`ServerInfo`]: placeholders only, by design.
pub fn parse_info() -> ServerInfo {
    ServerInfo::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_matching_reply() {
        let status = parse_status("There are 3 of a max of 20 players online.");
        assert_eq!(
            status,
            ServerStatus {
                online: true,
                player_count: Some(3),
                max_players: Some(20),
            }
        );
    }

    #[test]
    fn status_with_roster_suffix() {
        let status = parse_status("There are 2 of a max of 10 players online: Alice, Bob");
        assert_eq!(status.player_count, Some(2));
        assert_eq!(status.max_players, Some(10));
    }

    #[test]
    fn status_unknown_phrasing_stays_online() {
        let status = parse_status("Es sind 3 von maximal 20 Spielern online.");
        assert!(status.online);
        assert_eq!(status.player_count, None);
        assert_eq!(status.max_players, None);
    }

    #[test]
    fn status_garbled_counts_stay_absent() {
        let status = parse_status("There are many of a max of lots players online");
        assert!(status.online);
        assert_eq!(status.player_count, None);
    }

    #[test]
    fn roster_with_players() {
        let names = parse_roster("There are 2 of a max of 20 players online: Alice, Bob");
        assert_eq!(names, vec!["Alice".to_string(), "Bob".to_string()]);
    }

    #[test]
    fn roster_empty_when_nobody_online() {
        let names = parse_roster("There are 0 of a max of 20 players online:");
        assert!(names.is_empty());
    }

    #[test]
    fn roster_absent_segment_is_empty() {
        let names = parse_roster("Unknown command");
        assert!(names.is_empty());
    }

    #[test]
    fn roster_trims_whitespace() {
        let names = parse_roster("players online: Alice,  Bob , Carol");
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn info_is_declared_unknown() {
        let info = parse_info();
        assert_eq!(info.version, None);
        assert_eq!(info.motd, None);
    }
}
