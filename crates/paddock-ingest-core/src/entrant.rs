//! Decomposition of the combined "driver info" cell of scraped result pages,
//! e.g. `DNF12Jak CrawfordCRAHitech Pulse-Eight`.

use model::Status;
use once_cell::sync::Lazy;
use regex::Regex;

static LEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(?P<status>[A-Z]+)?(?P<number>\d+)\s*(?P<rest>.*)$").unwrap());

// Leftmost three uppercase letters. A team name with such a run ahead of the
// real code wins the match; nothing disambiguates that.
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{3}").unwrap());

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedEntrant {
    pub status: Option<Status>,
    pub car_number: Option<u32>,
    pub driver_name: Option<String>,
    pub driver_code: Option<String>,
    pub team_name: Option<String>,
}

/// Never fails: an unrecognisable cell yields an all-empty result.
pub fn parse_entrant_cell(cell: &str) -> ParsedEntrant {
    let text = cell.replace('\u{a0}', " ");
    let text = text.trim();

    let Some(m) = LEAD.captures(text) else {
        return ParsedEntrant::default();
    };
    let Some(car_number) = m.name("number").and_then(|n| n.as_str().parse::<u32>().ok()) else {
        return ParsedEntrant::default();
    };
    let status = m.name("status").map(|s| Status::from_code(s.as_str()));
    let rest = m.name("rest").map(|r| r.as_str().trim()).unwrap_or("");

    let Some(code) = CODE.find(rest) else {
        return ParsedEntrant {
            status,
            car_number: Some(car_number),
            driver_name: non_empty(rest),
            driver_code: None,
            team_name: None,
        };
    };

    let name = rest[..code.start()].replace('.', " ");
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");

    ParsedEntrant {
        status,
        car_number: Some(car_number),
        driver_name: non_empty(&name),
        driver_code: Some(code.as_str().to_string()),
        team_name: non_empty(rest[code.end()..].trim()),
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finisher_cell() {
        let p = parse_entrant_cell("3Jak CrawfordCRAHitech Pulse-Eight");
        assert_eq!(p.status, None);
        assert_eq!(p.car_number, Some(3));
        assert_eq!(p.driver_name.as_deref(), Some("Jak Crawford"));
        assert_eq!(p.driver_code.as_deref(), Some("CRA"));
        assert_eq!(p.team_name.as_deref(), Some("Hitech Pulse-Eight"));
    }

    #[test]
    fn status_prefix_and_initial() {
        let p = parse_entrant_cell("DNF12J. SmithSMIRed Bull");
        assert_eq!(p.status, Some(Status::Dnf));
        assert_eq!(p.car_number, Some(12));
        assert_eq!(p.driver_name.as_deref(), Some("J Smith"));
        assert_eq!(p.driver_code.as_deref(), Some("SMI"));
        assert_eq!(p.team_name.as_deref(), Some("Red Bull"));
    }

    #[test]
    fn unknown_status_is_kept_raw() {
        let p = parse_entrant_cell("NC5Ann LeeLEETrident");
        assert_eq!(p.status, Some(Status::Other("NC".into())));
        assert_eq!(p.car_number, Some(5));
    }

    #[test]
    fn no_digits_means_nothing() {
        assert_eq!(parse_entrant_cell("Jak CrawfordCRAHitech"), ParsedEntrant::default());
        assert_eq!(parse_entrant_cell("DNFJak"), ParsedEntrant::default());
        assert_eq!(parse_entrant_cell(""), ParsedEntrant::default());
        assert_eq!(parse_entrant_cell("   "), ParsedEntrant::default());
    }

    #[test]
    fn no_code_keeps_remainder_as_name() {
        let p = parse_entrant_cell("DSQ8someone lowercase");
        assert_eq!(p.status, Some(Status::Dsq));
        assert_eq!(p.car_number, Some(8));
        assert_eq!(p.driver_name.as_deref(), Some("someone lowercase"));
        assert_eq!(p.driver_code, None);
        assert_eq!(p.team_name, None);
    }

    #[test]
    fn only_first_code_run_is_taken() {
        let p = parse_entrant_cell("14Leo FornaroFORMP Motorsport ART");
        assert_eq!(p.driver_code.as_deref(), Some("FOR"));
        assert_eq!(p.team_name.as_deref(), Some("MP Motorsport ART"));
    }

    #[test]
    fn non_breaking_spaces_are_plain_spaces() {
        let p = parse_entrant_cell("\u{a0}22Zak\u{a0}O'SullivanOSUPrema Racing");
        assert_eq!(p.car_number, Some(22));
        assert_eq!(p.driver_name.as_deref(), Some("Zak O'Sullivan"));
        assert_eq!(p.driver_code.as_deref(), Some("OSU"));
    }

    #[test]
    fn cells_rebuild_from_parts() {
        let cells = [
            ("DNF", "4", "Gabriel Bortoleto", "BOR", "Trident"),
            ("", "1", "Paul Aron", "ARO", "Prema Racing"),
            ("DNS", "30", "Sophia Floersch", "FLO", "PHM Racing by Charouz"),
        ];
        for (status, num, name, code, team) in cells {
            let cell = format!("{status}{num}{name}{code}{team}");
            let p = parse_entrant_cell(&cell);
            let rebuilt = format!(
                "{}{}{}{}{}",
                p.status.as_ref().map(|s| s.code()).unwrap_or(""),
                p.car_number.unwrap(),
                p.driver_name.unwrap(),
                p.driver_code.unwrap(),
                p.team_name.unwrap()
            );
            assert_eq!(rebuilt, cell);
        }
    }
}
