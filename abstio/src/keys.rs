use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A city, as "City, State, Country".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CityName {
    pub country: String,
    pub state: String,
    pub city: String,
}

impl CityName {
    pub fn new(country: &str, state: &str, city: &str) -> CityName {
        CityName {
            country: country.to_string(),
            state: state.to_string(),
            city: city.to_string(),
        }
    }

    /// Parses "Campbell, California, USA". The country is mandatory; a missing state or city is
    /// an error.
    pub fn parse(raw: &str) -> Result<CityName> {
        let parts: Vec<&str> = raw
            .split(',')
            .map(|x| x.trim())
            .filter(|x| !x.is_empty())
            .collect();
        if parts.len() < 3 {
            bail!("{} isn't \"City, State, Country\"", raw);
        }
        let n = parts.len();
        Ok(CityName::new(parts[n - 1], parts[n - 2], &parts[..n - 2].join(", ")))
    }

    /// US states are abbreviated in keys.
    fn state_abbrev(&self) -> &str {
        STATE_ABBREVIATIONS
            .iter()
            .find(|(full, _)| *full == self.state)
            .map(|(_, abbrev)| *abbrev)
            .unwrap_or(self.state.as_str())
    }

    pub fn describe(&self) -> String {
        format!("{}, {}, {}", self.city, self.state, self.country)
    }
}

/// "Campbell, California, USA" lives at "USA/CA/Campbell.json".
pub fn city_key(city: &CityName) -> String {
    format!("{}.json", city_prefix(city))
}

/// "A Street" and "B Street" in Campbell live at "USA/CA/Campbell/A_Street-x-B_Street.json".
pub fn intersection_key(city: &CityName, streets: &[String]) -> String {
    format!(
        "{}/{}.json",
        city_prefix(city),
        streets.join("-x-").replace(' ', "_")
    )
}

/// Recovers the street names from an intersection key.
pub fn parse_intersection_key(key: &str) -> Option<Vec<String>> {
    let basename = key.rsplit('/').next()?.strip_suffix(".json")?;
    let streets: Vec<String> = basename
        .split("-x-")
        .map(|s| s.replace('_', " "))
        .collect();
    if streets.len() < 2 {
        return None;
    }
    Some(streets)
}

fn city_prefix(city: &CityName) -> String {
    format!("{}/{}/{}", city.country, city.state_abbrev(), city.city).replace(' ', "_")
}

const STATE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("District of Columbia", "DC"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];
