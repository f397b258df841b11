use serde::{Deserialize, Serialize};

/// Colleges and the majors offered in each
/// Loaded from data/majors.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MajorCatalogConfig {
    pub colleges: Vec<College>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct College {
    /// Label the member types to pick this college
    pub name: String,

    /// Major labels, also used as role names once upper-cased
    pub majors: Vec<String>,
}

impl MajorCatalogConfig {
    /// Load from a JSON file
    pub fn load_from_file(path: &str) -> crate::error::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::error::BotError::ConfigLoad {
                path: path.to_string(),
                source: e,
            })?;

        serde_json::from_str(&content).map_err(|e| crate::error::BotError::ConfigParse {
            path: path.to_string(),
            source: e,
        })
    }

    /// Get a college by its label, ignoring case and surrounding whitespace
    pub fn find_college(&self, label: &str) -> Option<&College> {
        let label = label.trim();
        self.colleges
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(label))
    }
}

impl College {
    /// Get a major by its label, ignoring case and surrounding whitespace
    pub fn find_major(&self, label: &str) -> Option<&String> {
        let label = label.trim();
        self.majors.iter().find(|m| m.eq_ignore_ascii_case(label))
    }
}

impl Default for MajorCatalogConfig {
    fn default() -> Self {
        let college = |name: &str, majors: &[&str]| College {
            name: name.to_string(),
            majors: majors.iter().map(|m| m.to_string()).collect(),
        };

        Self {
            colleges: vec![
                college("Engineering", &["CS", "CE", "EE", "ME", "CHE", "IT"]),
                college("Arts and Sciences", &["BIOL", "CHEM", "MATH", "PHYS", "PSYC", "ENGL"]),
                college("Business", &["ACCT", "FINA", "MGMT", "MKTG", "ECON"]),
                college("Nursing", &["NURS"]),
                college("Undeclared", &["UNDECLARED"]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_college_and_major() {
        let json = r##"{
            "colleges": [
                { "name": "Engineering", "majors": ["CS", "EE"] },
                { "name": "Music", "majors": ["Performance"] }
            ]
        }"##;

        let config: MajorCatalogConfig = serde_json::from_str(json).unwrap();
        let college = config.find_college("  engineering ").unwrap();
        assert_eq!(college.name, "Engineering");
        assert_eq!(college.find_major("cs").map(String::as_str), Some("CS"));
        assert!(college.find_major("Performance").is_none());
        assert!(config.find_college("Law").is_none());
    }
}
