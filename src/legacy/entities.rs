use crate::legacy::row::RowExt;
use crate::legacy::LegacyRecord;
use crate::snapshot::RawRow;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct City {
    pub id: i64,
    pub name: Option<String>,
    pub state: Option<String>,
}

impl LegacyRecord for City {
    const TABLE: &'static str = "city";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(City {
            id: row.int("id")?,
            name: row.text("name"),
            state: row.text("state"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locality {
    pub id: i64,
    pub name: Option<String>,
    pub city_id: Option<i64>,
    pub locality_url: Option<String>,
}

impl LegacyRecord for Locality {
    const TABLE: &'static str = "locality";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Locality {
            id: row.int("id")?,
            name: row.text("name"),
            city_id: row.int("city_id"),
            locality_url: row.text("locality_url"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Developer {
    pub id: i64,
    pub developer_name: Option<String>,
    pub developer_url: Option<String>,
    pub developer_logo: Option<String>,
    pub description: Option<String>,
    pub established_year: Option<i64>,
    pub total_projects: Option<i64>,
    pub developer_address: Option<String>,
}

impl LegacyRecord for Developer {
    const TABLE: &'static str = "developer";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Developer {
            id: row.int("id")?,
            developer_name: row.text("developer_name"),
            developer_url: row.text("developer_url"),
            developer_logo: row.text("developer_logo"),
            description: row.text("description"),
            established_year: row.int("established_year"),
            total_projects: row.int("total_projects"),
            developer_address: row.text("developer_address"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Amenity {
    pub id: i64,
    pub amenity_name: Option<String>,
    pub amenity_category: Option<String>,
    pub amenity_icon: Option<String>,
}

impl LegacyRecord for Amenity {
    const TABLE: &'static str = "amenity";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Amenity {
            id: row.int("id")?,
            amenity_name: row.text("amenity_name"),
            amenity_category: row.text("amenity_category"),
            amenity_icon: row.text("amenity_icon"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// Junction row linking a project to an amenity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectAmenity {
    pub id: i64,
    pub project_id: Option<i64>,
    pub amenity_id: Option<i64>,
}

impl LegacyRecord for ProjectAmenity {
    const TABLE: &'static str = "project_amenity";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(ProjectAmenity {
            id: row.int("id")?,
            project_id: row.int("project_id"),
            amenity_id: row.int("amenity_id"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectConfiguration {
    pub id: i64,
    pub project_configuration_name: Option<String>,
}

impl LegacyRecord for ProjectConfiguration {
    const TABLE: &'static str = "project_configuration";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(ProjectConfiguration {
            id: row.int("id")?,
            project_configuration_name: row.text("project_configuration_name"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectConfigurationType {
    pub id: i64,
    pub configuration_id: Option<i64>,
    pub project_configuration_type_name: Option<String>,
}

impl LegacyRecord for ProjectConfigurationType {
    const TABLE: &'static str = "project_configuration_type";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(ProjectConfigurationType {
            id: row.int("id")?,
            configuration_id: row.int("configuration_id"),
            project_configuration_type_name: row.text("project_configuration_type_name"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub id: i64,
    pub project_name: Option<String>,
    pub project_url: Option<String>,
    pub project_logo: Option<String>,
    pub project_description: Option<String>,
    pub project_address: Option<String>,
    pub developer_id: Option<i64>,
    pub locality_id: Option<i64>,
    pub configuration_id: Option<i64>,
    pub configuration_type_id: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub project_status: Option<String>,
    pub total_units: Option<i64>,
    pub project_area: Option<String>,
    pub possession_date: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_featured: Option<bool>,
    /// Raw blob; its encoding depends on which legacy app version wrote it
    pub videos: Option<Vec<u8>>,
    pub usp: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl LegacyRecord for Project {
    const TABLE: &'static str = "project";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Project {
            id: row.int("id")?,
            project_name: row.text("project_name"),
            project_url: row.text("project_url"),
            project_logo: row.text("project_logo"),
            project_description: row.text("project_description"),
            project_address: row.text("project_address"),
            developer_id: row.int("developer_id"),
            locality_id: row.int("locality_id"),
            configuration_id: row.int("configuration_id"),
            configuration_type_id: row.int("configuration_type_id"),
            min_price: row.float("min_price"),
            max_price: row.float("max_price"),
            project_status: row.text("project_status"),
            total_units: row.int("total_units"),
            project_area: row.text("project_area"),
            possession_date: row.text("possession_date"),
            latitude: row.float("latitude"),
            longitude: row.float("longitude"),
            is_featured: row.flag("is_featured"),
            videos: row.bytes("videos"),
            usp: row.json_text("usp"),
            meta_title: row.text("meta_title"),
            meta_description: row.text("meta_description"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Property {
    pub id: i64,
    pub project_id: Option<i64>,
    pub property_name: Option<String>,
    pub property_url: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub area: Option<f64>,
    pub price: Option<f64>,
    pub property_type: Option<String>,
    pub furnishing: Option<String>,
    pub listing_type: Option<String>,
    pub images: Option<String>,
    pub is_active: Option<bool>,
}

impl LegacyRecord for Property {
    const TABLE: &'static str = "property";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Property {
            id: row.int("id")?,
            project_id: row.int("project_id"),
            property_name: row.text("property_name"),
            property_url: row.text("property_url"),
            bedrooms: row.int("bedrooms"),
            bathrooms: row.int("bathrooms"),
            area: row.float("area"),
            price: row.float("price"),
            property_type: row.text("property_type"),
            furnishing: row.text("furnishing"),
            listing_type: row.text("listing_type"),
            images: row.json_text("images"),
            is_active: row.flag("is_active"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloorPlan {
    pub id: i64,
    pub project_id: Option<i64>,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub size: Option<String>,
    pub price: Option<f64>,
}

impl LegacyRecord for FloorPlan {
    const TABLE: &'static str = "floor_plan";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(FloorPlan {
            id: row.int("id")?,
            project_id: row.int("project_id"),
            title: row.text("title"),
            image_url: row.text("image_url"),
            size: row.text("size"),
            price: row.float("price"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentPlan {
    pub id: i64,
    pub project_id: Option<i64>,
    pub plan_name: Option<String>,
    pub plan_details: Option<String>,
}

impl LegacyRecord for PaymentPlan {
    const TABLE: &'static str = "payment_plan";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(PaymentPlan {
            id: row.int("id")?,
            project_id: row.int("project_id"),
            plan_name: row.text("plan_name"),
            plan_details: row.text("plan_details"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Faq {
    pub id: i64,
    pub project_id: Option<i64>,
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl LegacyRecord for Faq {
    const TABLE: &'static str = "faq";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Faq {
            id: row.int("id")?,
            project_id: row.int("project_id"),
            question: row.text("question"),
            answer: row.text("answer"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// RERA registration row. Each column holds a JSON-ish array; the arrays are
/// parallel by position and may have different lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReraInfo {
    pub id: i64,
    pub project_id: Option<i64>,
    pub phase: Option<String>,
    pub rera_number: Option<String>,
    pub qr_image: Option<String>,
    pub status: Option<String>,
}

impl LegacyRecord for ReraInfo {
    const TABLE: &'static str = "rera_info";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(ReraInfo {
            id: row.int("id")?,
            project_id: row.int("project_id"),
            phase: row.json_text("phase"),
            rera_number: row.json_text("rera_number"),
            qr_image: row.json_text("qr_image"),
            status: row.json_text("status"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectImage {
    pub id: i64,
    pub project_id: Option<i64>,
    pub image_url: Option<String>,
    pub alt_text: Option<String>,
    pub sort_order: Option<i64>,
}

impl LegacyRecord for ProjectImage {
    const TABLE: &'static str = "project_image";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(ProjectImage {
            id: row.int("id")?,
            project_id: row.int("project_id"),
            image_url: row.text("image_url"),
            alt_text: row.text("alt_text"),
            sort_order: row.int("sort_order"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blog {
    pub id: i64,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub is_published: Option<bool>,
    pub published_at: Option<String>,
}

impl LegacyRecord for Blog {
    const TABLE: &'static str = "blog";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Blog {
            id: row.int("id")?,
            title: row.text("title"),
            slug: row.text("slug"),
            content: row.text("content"),
            author: row.text("author"),
            image: row.text("image"),
            is_published: row.flag("is_published"),
            published_at: row.text("published_at"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericSearchData {
    pub id: i64,
    pub search_key: Option<String>,
    pub developer_id: Option<i64>,
    pub locality_id: Option<i64>,
    pub content: Option<String>,
}

impl LegacyRecord for GenericSearchData {
    const TABLE: &'static str = "generic_search_data";

    fn from_row(row: &RawRow) -> Option<Self> {
        Some(GenericSearchData {
            id: row.int("id")?,
            search_key: row.text("search_key"),
            developer_id: row.int("developer_id"),
            locality_id: row.int("locality_id"),
            content: row.json_text("content"),
        })
    }

    fn id(&self) -> i64 {
        self.id
    }
}
