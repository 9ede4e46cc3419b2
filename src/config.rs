use crate::legacy::{LegacyRecord, Project, ALL_TABLES};
use crate::store::LoadOptions;

/// Defaults written into RERA entries when a parallel array is shorter than the phase list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReraDefaults {
    pub qr_image: String,
    pub number: String,
    pub status: String,
}

impl Default for ReraDefaults {
    fn default() -> Self {
        ReraDefaults {
            qr_image: String::from("N/A"),
            number: String::new(),
            status: String::new(),
        }
    }
}

/// Configuration for a migration run
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    /// Tables to load (full export by default)
    pub tables: Vec<String>,

    /// Tables that must be readable for the run to proceed
    pub primary_tables: Vec<String>,

    /// Unit type used when no `N BHK` token can be found
    pub default_unit_type: String,

    /// Category for amenities with a missing or blank category
    pub default_amenity_category: String,

    pub rera_defaults: ReraDefaults,

    /// Drop video blobs no decoding strategy understands. When false, the
    /// blob's printable text is kept as a single entry instead.
    pub drop_undecodable_videos: bool,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        MigrateConfig {
            tables: ALL_TABLES.iter().map(|t| t.to_string()).collect(),
            primary_tables: vec![Project::TABLE.to_string()],
            default_unit_type: String::from("4BHK"),
            default_amenity_category: String::from("Other"),
            rera_defaults: ReraDefaults::default(),
            drop_undecodable_videos: true,
        }
    }
}

impl MigrateConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            tables: self.tables.clone(),
            primary_tables: self.primary_tables.clone(),
        }
    }
}
