//! Parser for the colon separated player list.
//!
//! Each non-blank line describes one occupied station:
//!
//! ```text
//! {name}:{ignored}:{aid}:{instance}:{ignored}:{stitz 0|1}:{start unix secs}
//! ```

use chrono::{DateTime, Utc};

use super::{PlayerRecord, SourceError};
use crate::model::Aid;

const FIELDS_PER_LINE: usize = 7;

/// Parse a complete player list.
///
/// Blank lines are skipped. The first malformed line aborts parsing with
/// [`SourceError::Parse`] carrying its 1-based line number.
pub fn parse_player_list(text: &str) -> Result<Vec<PlayerRecord>, SourceError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_line(line.trim(), idx + 1))
        .collect()
}

fn parse_line(line: &str, line_no: usize) -> Result<PlayerRecord, SourceError> {
    let parse_err = |reason: String| SourceError::Parse {
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() != FIELDS_PER_LINE {
        return Err(parse_err(format!(
            "expected {} fields, found {}",
            FIELDS_PER_LINE,
            fields.len()
        )));
    }

    let aid: u32 = fields[2]
        .parse()
        .map_err(|_| parse_err(format!("invalid aid '{}'", fields[2])))?;
    let instance: i64 = fields[3]
        .parse()
        .map_err(|_| parse_err(format!("invalid instance '{}'", fields[3])))?;
    let stitz: u8 = fields[5]
        .parse()
        .map_err(|_| parse_err(format!("invalid stitz flag '{}'", fields[5])))?;
    let start_secs: i64 = fields[6]
        .parse()
        .map_err(|_| parse_err(format!("invalid start time '{}'", fields[6])))?;
    let start_time = DateTime::<Utc>::from_timestamp(start_secs, 0)
        .ok_or_else(|| parse_err(format!("start time {} out of range", start_secs)))?;

    Ok(PlayerRecord {
        name: fields[0].to_string(),
        stitz: stitz != 0,
        start_time,
        aid: Aid(aid),
        instance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_player_list() {
        let text = "alice:x:101:1:y:0:1700000000\n\n  bob:x:202:2:y:1:1700000600  \n";

        let players = parse_player_list(text).unwrap();

        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "alice");
        assert_eq!(players[0].aid, Aid(101));
        assert_eq!(players[0].instance, 1);
        assert!(!players[0].stitz);
        assert_eq!(players[1].name, "bob");
        assert!(players[1].stitz);
        assert_eq!(players[1].start_time.timestamp(), 1_700_000_600);
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_player_list("").unwrap().is_empty());
        assert!(parse_player_list("\n   \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_reports_line_number() {
        let text = "alice:x:101:1:y:0:1700000000\nbroken:line\n";

        match parse_player_list(text) {
            Err(SourceError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_non_numeric_aid() {
        let err = parse_player_list("alice:x:abc:1:y:0:1700000000").unwrap_err();
        assert!(err.to_string().contains("invalid aid"));
    }

    #[test]
    fn test_parse_keeps_out_of_range_instances() {
        let text = "alice:x:101:1:y:0:1700000000\n\
                    bob:x:202:-1:y:0:1700000000\n\
                    carol:x:303:300:y:0:1700000000\n";

        let players = parse_player_list(text).unwrap();

        let instances: Vec<i64> = players.iter().map(|p| p.instance).collect();
        assert_eq!(instances, vec![1, -1, 300]);
    }
}
