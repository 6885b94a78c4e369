//! App Platform region definitions.

use serde::{Deserialize, Serialize};

/// Datacenter slugs that App Platform knows about.
///
/// These are finer-grained than [`Region`]; several datacenters share one
/// App Platform region.
pub const KNOWN_DATACENTERS: &[&str] = &[
    "nyc1", "nyc2", "nyc3", "ams2", "ams3", "sfo1", "sfo2", "sfo3", "sgp1", "lon1", "fra1",
    "tor1", "blr1", "syd1",
];

/// App Platform regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Nyc,
    Ams,
    Sfo,
    Sgp,
    Lon,
    Fra,
    Tor,
    Blr,
    Syd,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Nyc => "nyc",
            Region::Ams => "ams",
            Region::Sfo => "sfo",
            Region::Sgp => "sgp",
            Region::Lon => "lon",
            Region::Fra => "fra",
            Region::Tor => "tor",
            Region::Blr => "blr",
            Region::Syd => "syd",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Region::Nyc,
            Region::Ams,
            Region::Sfo,
            Region::Sgp,
            Region::Lon,
            Region::Fra,
            Region::Tor,
            Region::Blr,
            Region::Syd,
        ]
    }

    /// Map a loosely specified region or datacenter code onto a region.
    ///
    /// Matching is case-insensitive and by prefix, so `NYC3`, `nyc` and
    /// `nyc1` all land on [`Region::Nyc`]. Anything unrecognized falls back
    /// to the default region rather than failing.
    pub fn normalize(region: &str) -> Self {
        let lower = region.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|r| lower.starts_with(r.as_str()))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check whether a raw slug is a known datacenter code (case-insensitive).
pub fn is_known_datacenter(slug: &str) -> bool {
    let lower = slug.to_lowercase();
    KNOWN_DATACENTERS.iter().any(|dc| *dc == lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefixes() {
        assert_eq!(Region::normalize("nyc3"), Region::Nyc);
        assert_eq!(Region::normalize("NYC3"), Region::Nyc);
        assert_eq!(Region::normalize("ams3"), Region::Ams);
        assert_eq!(Region::normalize("sfo2"), Region::Sfo);
        assert_eq!(Region::normalize("Sgp1"), Region::Sgp);
        assert_eq!(Region::normalize("lon1"), Region::Lon);
        assert_eq!(Region::normalize("fra1"), Region::Fra);
        assert_eq!(Region::normalize("tor1"), Region::Tor);
        assert_eq!(Region::normalize("blr1"), Region::Blr);
        assert_eq!(Region::normalize("syd1"), Region::Syd);
    }

    #[test]
    fn test_normalize_falls_back_to_nyc() {
        assert_eq!(Region::normalize(""), Region::Nyc);
        assert_eq!(Region::normalize("mars1"), Region::Nyc);
        assert_eq!(Region::normalize("   "), Region::Nyc);
        assert_eq!(Region::normalize("ny"), Region::Nyc);
    }

    #[test]
    fn test_known_datacenters() {
        assert!(is_known_datacenter("nyc3"));
        assert!(is_known_datacenter("FRA1"));
        assert!(!is_known_datacenter("nyc"));
        assert!(!is_known_datacenter("nyc4"));
        assert!(!is_known_datacenter(""));
    }

    #[test]
    fn test_region_serializes_lowercase() {
        let yaml = serde_yaml::to_string(&Region::Ams).unwrap();
        assert_eq!(yaml.trim(), "ams");
    }
}
