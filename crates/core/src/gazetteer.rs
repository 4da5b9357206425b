/// The fixed set of cities every dataset and the weather lookup agree on.
pub const CITIES: [&str; 8] = [
    "Delhi",
    "Mumbai",
    "Goa",
    "Bangalore",
    "Chennai",
    "Hyderabad",
    "Kolkata",
    "Jaipur",
];

/// Known misspellings, abbreviations, and colloquial names.
const ALIASES: &[(&str, &[&str])] = &[
    ("Hyderabad", &["hyderbad", "hydrabad", "hyd", "hybd"]),
    ("Bangalore", &["bengaluru", "banglore", "blr", "blore", "bangaluru"]),
    ("Mumbai", &["bombay", "mum", "mumbay"]),
    ("Delhi", &["new delhi", "newdelhi", "del", "dilli"]),
    ("Kolkata", &["calcutta", "kolkatta", "kolkta", "kol"]),
    ("Chennai", &["madras", "chenai", "chennay"]),
    ("Goa", &["gova", "panaji"]),
    ("Jaipur", &["jpir", "jaypur", "jaipr"]),
];

const COORDINATES: &[(&str, f64, f64)] = &[
    ("Delhi", 28.6139, 77.2090),
    ("Mumbai", 19.0760, 72.8777),
    ("Goa", 15.2993, 74.1240),
    ("Bangalore", 12.9716, 77.5946),
    ("Chennai", 13.0827, 80.2707),
    ("Hyderabad", 17.3850, 78.4867),
    ("Kolkata", 22.5726, 88.3639),
    ("Jaipur", 26.9124, 75.7873),
];

pub fn city_list() -> String {
    CITIES.join(", ")
}

pub fn coordinates(city: &str) -> Option<(f64, f64)> {
    COORDINATES
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(city.trim()))
        .map(|(_, lat, lon)| (*lat, *lon))
}

/// Resolve a free-text city mention to its canonical name.
///
/// Precision-over-recall cascade, first hit wins: exact match, alias table,
/// substring containment either direction, then a character-overlap fallback.
pub fn resolve_city(input: &str) -> Option<&'static str> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    for city in CITIES {
        if city.to_lowercase() == needle {
            return Some(city);
        }
    }

    for (city, aliases) in ALIASES {
        if aliases.contains(&needle.as_str()) {
            return Some(city);
        }
    }

    for city in CITIES {
        let lower = city.to_lowercase();
        if lower.contains(&needle) || needle.contains(&lower) {
            return Some(city);
        }
    }

    for city in CITIES {
        if overlap_similar(&needle, &city.to_lowercase()) {
            return Some(city);
        }
    }

    None
}

/// Character-overlap ratio test: the count of input characters present
/// anywhere in the candidate, over the longer length. Skipped entirely for
/// strings shorter than three characters.
fn overlap_similar(a: &str, b: &str) -> bool {
    const THRESHOLD: f64 = 0.7;

    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len < 3 || b_len < 3 {
        return false;
    }

    let matches = a.chars().filter(|ch| b.contains(*ch)).count();
    matches as f64 / a_len.max(b_len) as f64 >= THRESHOLD
}
