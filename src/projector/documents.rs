//! Destination documents built from legacy entities
//!
//! Builders are pure. References to other destination records arrive already
//! translated; nothing here looks at the store or the destination.

use crate::decode::{decode_non_empty, decode_url_list};
use crate::destination::{DestinationId, Document, EntityKind};
use crate::legacy::{Blog, City, Developer, Locality, Project, Property};
use crate::projector::merge::compact;
use crate::projector::web_card::{extract_unit_type, WebCard};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercase, hyphen-separated form of `text`. `None` if nothing usable remains.
pub fn slugify(text: &str) -> Option<String> {
    let lower = text.trim().to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    (!slug.is_empty()).then(|| slug.to_string())
}

/// Slug from the last path segment of a legacy URL column.
///
/// Legacy `*_url` columns hold anything from a bare slug to a full URL with a
/// query string.
pub fn slug_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/')
        .find(|segment| !segment.trim().is_empty())
        .and_then(slugify)
}

/// Slug of one legacy record: from its URL, else `"{name}-{legacy_id}"`,
/// else `"{kind}-{legacy_id}"`.
///
/// Names repeat across legacy rows ("2 BHK Apartment"), so a name-derived
/// slug carries the legacy id to stay unique.
fn record_slug(
    kind: EntityKind,
    url: Option<&str>,
    name: Option<&str>,
    legacy_id: i64,
) -> String {
    url.and_then(slug_from_url)
        .or_else(|| name.and_then(slugify).map(|slug| format!("{}-{}", slug, legacy_id)))
        .unwrap_or_else(|| format!("{}-{}", kind, legacy_id))
}

/// Slug from a URL, else the bare name. For names that identify the entity.
fn named_slug(
    kind: EntityKind,
    url: Option<&str>,
    name: Option<&str>,
    legacy_id: i64,
) -> String {
    url.and_then(slug_from_url)
        .or_else(|| name.and_then(slugify))
        .unwrap_or_else(|| format!("{}-{}", kind, legacy_id))
}

fn into_document(value: Value) -> Document {
    let mut document = match value {
        Value::Object(fields) => fields,
        _ => Document::new(),
    };
    compact(&mut document);
    document
}

/// Trimmed developer name, the developer's natural key
pub fn developer_name(developer: &Developer) -> Option<&str> {
    developer
        .developer_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

pub fn developer_document(developer: &Developer, name: &str) -> Document {
    into_document(json!({
        "name": name,
        "slug": named_slug(
            EntityKind::Developer,
            developer.developer_url.as_deref(),
            Some(name),
            developer.id,
        ),
        "logo": developer.developer_logo,
        "description": developer.description,
        "established_year": developer.established_year,
        "total_projects": developer.total_projects,
        "address": developer.developer_address,
        "legacy_id": developer.id,
    }))
}

pub fn locality_document(locality: &Locality, city: Option<&City>) -> Document {
    let city_name = city.and_then(|c| c.name.as_deref());
    let qualified = match (locality.name.as_deref(), city_name) {
        (Some(name), Some(city)) => Some(format!("{}-{}", name, city)),
        (name, _) => name.map(String::from),
    };

    into_document(json!({
        "name": locality.name,
        "slug": named_slug(
            EntityKind::Locality,
            locality.locality_url.as_deref(),
            qualified.as_deref(),
            locality.id,
        ),
        "city": {
            "name": city_name,
            "state": city.and_then(|c| c.state.as_deref()),
        },
        "legacy_id": locality.id,
    }))
}

/// Already-translated references of a project
#[derive(Debug, Clone, Default)]
pub struct ProjectLinks<'a> {
    pub developer: Option<(&'a DestinationId, &'a str)>,
    pub locality: Option<&'a DestinationId>,
    pub configuration: Option<&'a str>,
    pub configuration_type: Option<&'a str>,
}

pub fn project_document(
    project: &Project,
    links: &ProjectLinks<'_>,
    web_card: &WebCard,
    videos: Vec<String>,
) -> Document {
    into_document(json!({
        "name": project.project_name,
        "slug": record_slug(
            EntityKind::Project,
            project.project_url.as_deref(),
            project.project_name.as_deref(),
            project.id,
        ),
        "logo": project.project_logo,
        "description": project.project_description,
        "address": project.project_address,
        "status": project.project_status,
        "total_units": project.total_units,
        "area": project.project_area,
        "possession_date": project.possession_date,
        "is_featured": project.is_featured,
        "price": {
            "min": project.min_price,
            "max": project.max_price,
        },
        "location": {
            "latitude": project.latitude,
            "longitude": project.longitude,
        },
        "meta": {
            "title": project.meta_title,
            "description": project.meta_description,
        },
        "configuration": links.configuration,
        "configuration_type": links.configuration_type,
        "developer": links.developer.map(|(id, name)| json!({"id": id.as_str(), "name": name})),
        "locality": links.locality.map(DestinationId::as_str),
        "usp": decode_non_empty(project.usp.as_deref()),
        "videos": videos,
        "web_card": web_card,
        "legacy_id": project.id,
    }))
}

/// Decode a project's `videos` blob into URLs.
///
/// Blobs nothing can decode are dropped, or with `drop_undecodable` off, kept
/// as one entry of their printable text.
pub fn decode_videos(project_id: i64, bytes: Option<&[u8]>, drop_undecodable: bool) -> Vec<String> {
    let Some(bytes) = bytes else {
        return Vec::new();
    };
    if let Some(urls) = decode_url_list(bytes) {
        return urls;
    }
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Vec::new();
    }

    debug!(project_id, len = bytes.len(), "undecodable videos blob");
    if drop_undecodable {
        return Vec::new();
    }
    let printable: String = String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| !c.is_control() && *c != char::REPLACEMENT_CHARACTER)
        .collect();
    let printable = printable.trim();
    if printable.is_empty() {
        Vec::new()
    } else {
        vec![printable.to_string()]
    }
}

/// Unit type of a property: from its name, else its bedroom count, else the default
pub fn property_unit_type(property: &Property, default_unit_type: &str) -> String {
    property
        .property_name
        .as_deref()
        .and_then(extract_unit_type)
        .or_else(|| {
            property
                .bedrooms
                .filter(|&n| n > 0)
                .map(|n| format!("{}BHK", n))
        })
        .unwrap_or_else(|| default_unit_type.to_string())
}

pub fn property_document(
    property: &Property,
    project: Option<&DestinationId>,
    default_unit_type: &str,
) -> Document {
    into_document(json!({
        "name": property.property_name,
        "slug": record_slug(
            EntityKind::Property,
            property.property_url.as_deref(),
            property.property_name.as_deref(),
            property.id,
        ),
        "project": project.map(DestinationId::as_str),
        "unit_type": property_unit_type(property, default_unit_type),
        "bedrooms": property.bedrooms,
        "bathrooms": property.bathrooms,
        "area": property.area,
        "price": property.price,
        "property_type": property.property_type,
        "furnishing": property.furnishing,
        "listing_type": property.listing_type,
        "images": decode_non_empty(property.images.as_deref()),
        "is_active": property.is_active,
        "legacy_id": property.id,
    }))
}

pub fn blog_document(blog: &Blog) -> Document {
    into_document(json!({
        "title": blog.title,
        "slug": record_slug(
            EntityKind::Blog,
            blog.slug.as_deref(),
            blog.title.as_deref(),
            blog.id,
        ),
        "content": blog.content,
        "author": blog.author,
        "image": blog.image,
        "is_published": blog.is_published,
        "published_at": blog.published_at,
        "legacy_id": blog.id,
    }))
}
