//! Web card aggregation
//!
//! A web card folds a project's one-to-many legacy children into the nested,
//! display-ready structure the destination stores on the project document.
//! Every function here is pure over already-loaded entities.

use crate::config::ReraDefaults;
use crate::decode::decode_string_array;
use crate::legacy::{Amenity, Faq, FloorPlan, PaymentPlan, ProjectImage, ReraInfo};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

static BHK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*BHK").unwrap()
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmenityCard {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReraEntry {
    pub phase: String,
    pub rera_number: String,
    pub qr_image: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorPlanCard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub unit_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentPlanCard {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqCard {
    pub question: String,
    pub answer: String,
}

/// The nested aggregate stored on a destination project
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebCard {
    pub images: Vec<String>,
    pub amenities: BTreeMap<String, Vec<AmenityCard>>,
    pub rera: Vec<ReraEntry>,
    pub floor_plans: Vec<FloorPlanCard>,
    /// Distinct unit types offered, from the floor plans
    pub unit_types: Vec<String>,
    pub payment_plans: Vec<PaymentPlanCard>,
    pub faqs: Vec<FaqCard>,
}

/// Extract a unit type such as `"2BHK"` from free text like `"2 BHK Apartment"`
pub fn extract_unit_type(text: &str) -> Option<String> {
    BHK_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|n| format!("{}BHK", n.as_str()))
}

/// Logo first, then gallery images by `sort_order` (unordered last), without the logo again
pub fn build_image_list(logo: Option<&str>, gallery: &[Arc<ProjectImage>]) -> Vec<String> {
    let logo = logo.map(str::trim).filter(|s| !s.is_empty());

    let mut ordered: Vec<&Arc<ProjectImage>> = gallery.iter().collect();
    ordered.sort_by_key(|image| (image.sort_order.is_none(), image.sort_order, image.id));

    logo.map(String::from)
        .into_iter()
        .chain(
            ordered
                .into_iter()
                .filter_map(|image| image.image_url.as_deref())
                .map(str::trim)
                .filter(|url| !url.is_empty() && Some(*url) != logo)
                .map(String::from),
        )
        .collect()
}

/// Group amenities by category. Every amenity lands in exactly one group.
pub fn group_amenities(
    amenities: &[Arc<Amenity>],
    default_category: &str,
) -> BTreeMap<String, Vec<AmenityCard>> {
    let mut groups: BTreeMap<String, Vec<AmenityCard>> = BTreeMap::new();
    for amenity in amenities {
        let category = amenity
            .amenity_category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(default_category);
        groups.entry(category.to_string()).or_default().push(AmenityCard {
            name: amenity
                .amenity_name
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            icon: amenity.amenity_icon.clone(),
        });
    }
    groups
}

/// One entry per phase element, zipped with the parallel number/QR/status arrays
pub fn flatten_rera(rows: &[Arc<ReraInfo>], defaults: &ReraDefaults) -> Vec<ReraEntry> {
    let decode = |text: &Option<String>| {
        text.as_deref()
            .and_then(decode_string_array)
            .unwrap_or_default()
    };

    let mut entries = Vec::new();
    for row in rows {
        let numbers = decode(&row.rera_number);
        let qr_images = decode(&row.qr_image);
        let statuses = decode(&row.status);

        for (idx, phase) in decode(&row.phase).into_iter().enumerate() {
            entries.push(ReraEntry {
                phase,
                rera_number: numbers.get(idx).cloned().unwrap_or_else(|| defaults.number.clone()),
                qr_image: qr_images.get(idx).cloned().unwrap_or_else(|| defaults.qr_image.clone()),
                status: statuses.get(idx).cloned().unwrap_or_else(|| defaults.status.clone()),
            });
        }
    }
    entries
}

pub fn floor_plan_cards(plans: &[Arc<FloorPlan>], default_unit_type: &str) -> Vec<FloorPlanCard> {
    plans
        .iter()
        .map(|plan| FloorPlanCard {
            title: plan.title.clone(),
            unit_type: plan
                .title
                .as_deref()
                .and_then(extract_unit_type)
                .unwrap_or_else(|| default_unit_type.to_string()),
            image: plan.image_url.clone(),
            size: plan.size.clone(),
            price: plan.price,
        })
        .collect()
}

pub fn payment_plan_cards(plans: &[Arc<PaymentPlan>]) -> Vec<PaymentPlanCard> {
    plans
        .iter()
        .filter_map(|plan| {
            let name = plan.plan_name.as_deref()?.trim();
            (!name.is_empty()).then(|| PaymentPlanCard {
                name: name.to_string(),
                details: plan.plan_details.clone(),
            })
        })
        .collect()
}

/// Trimmed question/answer pairs; a pair missing either side is dropped
pub fn clean_faqs(faqs: &[Arc<Faq>]) -> Vec<FaqCard> {
    faqs.iter()
        .filter_map(|faq| {
            let question = faq.question.as_deref()?.trim();
            let answer = faq.answer.as_deref()?.trim();
            (!question.is_empty() && !answer.is_empty()).then(|| FaqCard {
                question: question.to_string(),
                answer: answer.to_string(),
            })
        })
        .collect()
}

/// Everything a web card is built from
#[derive(Debug, Default)]
pub struct WebCardSources<'a> {
    pub logo: Option<&'a str>,
    pub images: &'a [Arc<ProjectImage>],
    pub amenities: &'a [Arc<Amenity>],
    pub rera: &'a [Arc<ReraInfo>],
    pub floor_plans: &'a [Arc<FloorPlan>],
    pub payment_plans: &'a [Arc<PaymentPlan>],
    pub faqs: &'a [Arc<Faq>],
}

pub fn build_web_card(
    sources: &WebCardSources<'_>,
    default_unit_type: &str,
    default_amenity_category: &str,
    rera_defaults: &ReraDefaults,
) -> WebCard {
    let floor_plans = floor_plan_cards(sources.floor_plans, default_unit_type);
    let unit_types: BTreeSet<String> = floor_plans.iter().map(|p| p.unit_type.clone()).collect();

    WebCard {
        images: build_image_list(sources.logo, sources.images),
        amenities: group_amenities(sources.amenities, default_amenity_category),
        rera: flatten_rera(sources.rera, rera_defaults),
        floor_plans,
        unit_types: unit_types.into_iter().collect(),
        payment_plans: payment_plan_cards(sources.payment_plans),
        faqs: clean_faqs(sources.faqs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: i64, url: &str, sort_order: Option<i64>) -> Arc<ProjectImage> {
        Arc::new(ProjectImage {
            id,
            image_url: Some(url.to_string()),
            sort_order,
            ..Default::default()
        })
    }

    fn amenity(id: i64, name: &str, category: Option<&str>) -> Arc<Amenity> {
        Arc::new(Amenity {
            id,
            amenity_name: Some(name.to_string()),
            amenity_category: category.map(String::from),
            ..Default::default()
        })
    }

    fn faq(id: i64, question: Option<&str>, answer: Option<&str>) -> Arc<Faq> {
        Arc::new(Faq {
            id,
            question: question.map(String::from),
            answer: answer.map(String::from),
            ..Default::default()
        })
    }

    #[test]
    fn test_extract_unit_type() {
        assert_eq!(extract_unit_type("2 BHK Apartment").as_deref(), Some("2BHK"));
        assert_eq!(extract_unit_type("Type A - 3bhk").as_deref(), Some("3BHK"));
        assert_eq!(extract_unit_type("2.5 BHK duplex").as_deref(), Some("2.5BHK"));
        assert_eq!(extract_unit_type("Penthouse"), None);
    }

    #[test]
    fn test_floor_plan_default_unit_type() {
        let plans = vec![
            Arc::new(FloorPlan { id: 1, title: Some("1 BHK".into()), ..Default::default() }),
            Arc::new(FloorPlan { id: 2, title: Some("Villa".into()), ..Default::default() }),
            Arc::new(FloorPlan { id: 3, title: None, ..Default::default() }),
        ];
        let cards = floor_plan_cards(&plans, "4BHK");
        let units: Vec<_> = cards.iter().map(|c| c.unit_type.as_str()).collect();
        assert_eq!(units, vec!["1BHK", "4BHK", "4BHK"]);
    }

    #[test]
    fn test_images_logo_first_and_deduplicated() {
        let gallery = vec![
            image(3, "https://img.test/c.jpg", None),
            image(1, "https://img.test/logo.png", Some(2)),
            image(2, "https://img.test/b.jpg", Some(1)),
        ];
        let images = build_image_list(Some("https://img.test/logo.png"), &gallery);
        assert_eq!(
            images,
            vec![
                "https://img.test/logo.png",
                "https://img.test/b.jpg",
                "https://img.test/c.jpg"
            ]
        );
    }

    #[test]
    fn test_images_without_logo() {
        let gallery = vec![image(1, "  ", Some(1)), image(2, "https://img.test/a.jpg", Some(2))];
        assert_eq!(build_image_list(None, &gallery), vec!["https://img.test/a.jpg"]);
    }

    #[test]
    fn test_no_amenity_dropped() {
        let amenities = vec![
            amenity(1, "Pool", Some("Sports")),
            amenity(2, "Garden", Some("  ")),
            amenity(3, "CCTV", None),
            amenity(4, "Gym", Some("Sports")),
        ];
        let groups = group_amenities(&amenities, "Other");

        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), amenities.len());
        assert_eq!(groups["Sports"].len(), 2);
        let other: Vec<_> = groups["Other"].iter().map(|a| a.name.as_str()).collect();
        assert_eq!(other, vec!["Garden", "CCTV"]);
    }

    #[test]
    fn test_rera_shorter_arrays_use_defaults() {
        let row = Arc::new(ReraInfo {
            id: 1,
            phase: Some(r#"["Phase 1", "Phase 2", "Phase 3"]"#.into()),
            rera_number: Some(r#"["P-001"]"#.into()),
            qr_image: Some(r#"["qr1.png", "qr2.png"]"#.into()),
            status: None,
            ..Default::default()
        });
        let entries = flatten_rera(&[row], &ReraDefaults::default());

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].rera_number, "P-001");
        assert_eq!(entries[1].rera_number, "");
        assert_eq!(entries[1].qr_image, "qr2.png");
        assert_eq!(entries[2].qr_image, "N/A");
        assert!(entries.iter().all(|e| e.status.is_empty()));
    }

    #[test]
    fn test_rera_bare_phase_string() {
        let row = Arc::new(ReraInfo {
            id: 1,
            phase: Some("Tower A".into()),
            rera_number: Some("P52100012345".into()),
            ..Default::default()
        });
        let entries = flatten_rera(&[row], &ReraDefaults::default());
        assert_eq!(
            entries,
            vec![ReraEntry {
                phase: "Tower A".into(),
                rera_number: "P52100012345".into(),
                qr_image: "N/A".into(),
                status: "".into(),
            }]
        );
    }

    #[test]
    fn test_faqs_trimmed_and_filtered() {
        let faqs = vec![
            faq(1, Some(" Where? "), Some(" Pune ")),
            faq(2, Some("Empty answer"), Some("   ")),
            faq(3, None, Some("orphan")),
        ];
        assert_eq!(
            clean_faqs(&faqs),
            vec![FaqCard { question: "Where?".into(), answer: "Pune".into() }]
        );
    }

    #[test]
    fn test_build_web_card_collects_unit_types() {
        let plans = vec![
            Arc::new(FloorPlan { id: 1, title: Some("3 BHK".into()), ..Default::default() }),
            Arc::new(FloorPlan { id: 2, title: Some("2 BHK".into()), ..Default::default() }),
            Arc::new(FloorPlan { id: 3, title: Some("2BHK large".into()), ..Default::default() }),
        ];
        let sources = WebCardSources { floor_plans: &plans, ..Default::default() };
        let card = build_web_card(&sources, "4BHK", "Other", &ReraDefaults::default());
        assert_eq!(card.unit_types, vec!["2BHK", "3BHK"]);
        assert!(card.images.is_empty());
    }
}
