//! Typed legacy entities
//!
//! Each legacy table decodes into one flat struct. Every foreign key is an
//! `Option<i64>` and nothing is defaulted here: a missing cell stays `None`
//! until the projector decides what that field should look like downstream.

pub mod entities;
pub mod row;

pub use entities::{
    Amenity, Blog, City, Developer, Faq, FloorPlan, GenericSearchData, Locality, PaymentPlan,
    Project, ProjectAmenity, ProjectConfiguration, ProjectConfigurationType, ProjectImage,
    Property, ReraInfo,
};
pub use row::RowExt;

use crate::snapshot::RawRow;

/// A legacy table row decoded into a typed entity
pub trait LegacyRecord: Sized + Send + Sync + 'static {
    /// Snapshot table name, which is also the export file stem
    const TABLE: &'static str;

    /// Decode a raw row. `None` when the row has no usable primary key.
    fn from_row(row: &RawRow) -> Option<Self>;

    fn id(&self) -> i64;
}

/// Every table the migration knows how to load, parents before children
pub const ALL_TABLES: &[&str] = &[
    City::TABLE,
    Locality::TABLE,
    Developer::TABLE,
    Amenity::TABLE,
    ProjectConfiguration::TABLE,
    ProjectConfigurationType::TABLE,
    Project::TABLE,
    Property::TABLE,
    ProjectAmenity::TABLE,
    FloorPlan::TABLE,
    PaymentPlan::TABLE,
    Faq::TABLE,
    ReraInfo::TABLE,
    ProjectImage::TABLE,
    Blog::TABLE,
    GenericSearchData::TABLE,
];
