#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub id: u32,
    pub abbreviation: &'static str,
    pub name: &'static str,
}

impl Team {
    pub fn logo_url(&self) -> String {
        logo_url(self.id)
    }
}

pub const TEAMS: [Team; 30] = [
    team(1610612737, "ATL", "Atlanta Hawks"),
    team(1610612738, "BOS", "Boston Celtics"),
    team(1610612739, "CLE", "Cleveland Cavaliers"),
    team(1610612740, "NOP", "New Orleans Pelicans"),
    team(1610612741, "CHI", "Chicago Bulls"),
    team(1610612742, "DAL", "Dallas Mavericks"),
    team(1610612743, "DEN", "Denver Nuggets"),
    team(1610612744, "GSW", "Golden State Warriors"),
    team(1610612745, "HOU", "Houston Rockets"),
    team(1610612746, "LAC", "LA Clippers"),
    team(1610612747, "LAL", "Los Angeles Lakers"),
    team(1610612748, "MIA", "Miami Heat"),
    team(1610612749, "MIL", "Milwaukee Bucks"),
    team(1610612750, "MIN", "Minnesota Timberwolves"),
    team(1610612751, "BKN", "Brooklyn Nets"),
    team(1610612752, "NYK", "New York Knicks"),
    team(1610612753, "ORL", "Orlando Magic"),
    team(1610612754, "IND", "Indiana Pacers"),
    team(1610612755, "PHI", "Philadelphia 76ers"),
    team(1610612756, "PHX", "Phoenix Suns"),
    team(1610612757, "POR", "Portland Trail Blazers"),
    team(1610612758, "SAC", "Sacramento Kings"),
    team(1610612759, "SAS", "San Antonio Spurs"),
    team(1610612760, "OKC", "Oklahoma City Thunder"),
    team(1610612761, "TOR", "Toronto Raptors"),
    team(1610612762, "UTA", "Utah Jazz"),
    team(1610612763, "MEM", "Memphis Grizzlies"),
    team(1610612764, "WAS", "Washington Wizards"),
    team(1610612765, "DET", "Detroit Pistons"),
    team(1610612766, "CHA", "Charlotte Hornets"),
];

const fn team(id: u32, abbreviation: &'static str, name: &'static str) -> Team {
    Team {
        id,
        abbreviation,
        name,
    }
}

pub fn by_id(id: u32) -> Option<&'static Team> {
    TEAMS.iter().find(|t| t.id == id)
}

pub fn by_abbreviation(abbreviation: &str) -> Option<&'static Team> {
    TEAMS
        .iter()
        .find(|t| t.abbreviation.eq_ignore_ascii_case(abbreviation.trim()))
}

pub fn logo_url(team_id: u32) -> String {
    format!("https://cdn.nba.com/logos/nba/{team_id}/global/L/logo.svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_agree() {
        let lal = by_abbreviation("lal").unwrap();
        assert_eq!(lal.id, 1610612747);
        assert_eq!(by_id(lal.id).unwrap().name, "Los Angeles Lakers");
        assert!(by_id(42).is_none());
        assert_eq!(
            lal.logo_url(),
            "https://cdn.nba.com/logos/nba/1610612747/global/L/logo.svg"
        );
    }

    #[test]
    fn ids_and_codes_are_unique() {
        for (i, a) in TEAMS.iter().enumerate() {
            for b in &TEAMS[i + 1..] {
                assert_ne!(a.id, b.id);
                assert_ne!(a.abbreviation, b.abbreviation);
            }
        }
    }
}
