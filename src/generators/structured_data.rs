// * JSON-LD (schema.org) builders
// * Builders take plain serde inputs so the API can feed request bodies straight in.
// * Null members are pruned, so unset optional fields never reach the output.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use thiserror::Error;

const SCHEMA_CONTEXT: &str = "https://schema.org";
const IN_STOCK: &str = "https://schema.org/InStock";

#[derive(Error, Debug)]
pub enum StructuredDataError {
    #[error("unknown structured data type: {0}")]
    UnknownType(String),

    #[error("invalid structured data input: {0}")]
    InvalidData(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationInput {
    pub name: String,
    pub url: Option<String>,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub social_media: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceInput {
    pub name: String,
    pub description: Option<String>,
    pub provider_name: Option<String>,
    pub provider_url: Option<String>,
    pub area_served: Option<String>,
    pub service_type: Option<String>,
    pub price: Option<Value>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingInput {
    pub value: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub brand_name: Option<String>,
    pub price: Option<Value>,
    pub currency: Option<String>,
    pub seller_name: Option<String>,
    pub rating: Option<RatingInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressInput {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalBusinessInput {
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: AddressInput,
    pub coordinates: Option<Coordinates>,
    pub hours: Vec<String>,
    pub price_range: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonInput {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherInput {
    pub name: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleInput {
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub author: PersonInput,
    pub publisher: PublisherInput,
    pub publish_date: Option<String>,
    pub modify_date: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreadcrumbItem {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoInput {
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub upload_date: Option<String>,
    /// ISO 8601 duration, e.g. `PT1M30S`
    pub duration: Option<String>,
    pub video_url: Option<String>,
    pub embed_url: Option<String>,
    pub publisher: Option<PublisherInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageInput {
    pub url: String,
    pub name: Option<String>,
    pub caption: Option<String>,
    pub description: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub author: Option<String>,
}

/// Drops null members recursively
fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, prune(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(prune).collect()),
        other => other,
    }
}

fn publisher(p: &PublisherInput) -> Value {
    json!({
        "@type": "Organization",
        "name": p.name,
        "logo": p.logo.as_ref().map(|url| json!({"@type": "ImageObject", "url": url})),
    })
}

pub fn organization(data: &OrganizationInput) -> Value {
    let contact = if data.phone.is_some() || data.email.is_some() {
        Some(json!({
            "@type": "ContactPoint",
            "telephone": data.phone,
            "contactType": "customer service",
            "email": data.email,
        }))
    } else {
        None
    };
    prune(json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Organization",
        "name": data.name,
        "url": data.url,
        "logo": data.logo,
        "description": data.description,
        "contactPoint": contact,
        "sameAs": data.social_media,
    }))
}

pub fn service(data: &ServiceInput) -> Value {
    let provider = data.provider_name.as_ref().map(|name| {
        json!({"@type": "Organization", "name": name, "url": data.provider_url})
    });
    let offers = data.price.as_ref().map(|price| {
        json!({
            "@type": "Offer",
            "price": price,
            "priceCurrency": data.currency.as_deref().unwrap_or("USD"),
            "availability": IN_STOCK,
        })
    });
    prune(json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Service",
        "name": data.name,
        "description": data.description,
        "provider": provider,
        "areaServed": data.area_served.as_deref().unwrap_or("Worldwide"),
        "serviceType": data.service_type,
        "offers": offers,
    }))
}

pub fn product(data: &ProductInput) -> Value {
    let rating = data.rating.as_ref().map(|r| {
        json!({"@type": "AggregateRating", "ratingValue": r.value, "reviewCount": r.count})
    });
    let brand = data
        .brand_name
        .as_ref()
        .map(|name| json!({"@type": "Brand", "name": name}));
    let seller = data
        .seller_name
        .as_ref()
        .map(|name| json!({"@type": "Organization", "name": name}));
    prune(json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Product",
        "name": data.name,
        "description": data.description,
        "image": data.images,
        "brand": brand,
        "offers": {
            "@type": "Offer",
            "price": data.price,
            "priceCurrency": data.currency.as_deref().unwrap_or("USD"),
            "availability": IN_STOCK,
            "seller": seller,
        },
        "aggregateRating": rating,
    }))
}

pub fn local_business(data: &LocalBusinessInput) -> Value {
    let geo = data.coordinates.as_ref().map(|c| {
        json!({"@type": "GeoCoordinates", "latitude": c.lat, "longitude": c.lng})
    });
    prune(json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "LocalBusiness",
        "name": data.name,
        "description": data.description,
        "url": data.url,
        "telephone": data.phone,
        "email": data.email,
        "address": {
            "@type": "PostalAddress",
            "streetAddress": data.address.street,
            "addressLocality": data.address.city,
            "addressRegion": data.address.state,
            "postalCode": data.address.zip,
            "addressCountry": data.address.country,
        },
        "geo": geo,
        "openingHours": data.hours,
        "priceRange": data.price_range,
    }))
}

pub fn article(data: &ArticleInput) -> Value {
    let page = data
        .url
        .as_ref()
        .map(|url| json!({"@type": "WebPage", "@id": url}));
    prune(json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Article",
        "headline": data.title,
        "description": data.description,
        "image": data.image,
        "author": {"@type": "Person", "name": data.author.name, "url": data.author.url},
        "publisher": publisher(&data.publisher),
        "datePublished": data.publish_date,
        "dateModified": data.modify_date.as_ref().or(data.publish_date.as_ref()),
        "mainEntityOfPage": page,
    }))
}

pub fn faq(items: &[FaqItem]) -> Value {
    let questions: Vec<Value> = items
        .iter()
        .map(|q| {
            json!({
                "@type": "Question",
                "name": q.question,
                "acceptedAnswer": {"@type": "Answer", "text": q.answer},
            })
        })
        .collect();
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "FAQPage",
        "mainEntity": questions,
    })
}

pub fn breadcrumb(items: &[BreadcrumbItem]) -> Value {
    let elements: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": item.name,
                "item": item.url,
            })
        })
        .collect();
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BreadcrumbList",
        "itemListElement": elements,
    })
}

pub fn video(data: &VideoInput) -> Value {
    prune(json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "VideoObject",
        "name": data.title,
        "description": data.description,
        "thumbnailUrl": data.thumbnail,
        "uploadDate": data.upload_date,
        "duration": data.duration,
        "contentUrl": data.video_url,
        "embedUrl": data.embed_url,
        "publisher": data.publisher.as_ref().map(publisher),
    }))
}

pub fn image(data: &ImageInput) -> Value {
    prune(json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "ImageObject",
        "contentUrl": data.url,
        "name": data.name,
        "caption": data.caption,
        "description": data.description,
        "width": data.width,
        "height": data.height,
        "author": data.author.as_ref().map(|name| json!({"@type": "Person", "name": name})),
    }))
}

/// The site's own service description
pub fn video_greeting_service() -> Value {
    let catalog: Vec<Value> = ["Birthday Video Messages", "Anniversary Greetings", "Holiday Wishes"]
        .iter()
        .map(|name| json!({"@type": "Offer", "itemOffered": {"@type": "Service", "name": name}}))
        .collect();
    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "Service",
        "name": "Custom Video Greeting Messages",
        "description": "Personalized video messages and greetings created by professional performers from around the world for any occasion.",
        "provider": {"@type": "Organization", "name": "WishesVideo", "url": "https://wishesvideo.com"},
        "serviceType": "Video Production Service",
        "areaServed": "Worldwide",
        "category": "Entertainment",
        "offers": {
            "@type": "Offer",
            "priceRange": "$5-$100",
            "priceCurrency": "USD",
            "availability": IN_STOCK,
        },
        "hasOfferCatalog": {
            "@type": "OfferCatalog",
            "name": "Video Greeting Categories",
            "itemListElement": catalog,
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Organization,
    Service,
    Product,
    LocalBusiness,
    Article,
    Faq,
    Breadcrumb,
    Video,
    Image,
    VideoGreetingService,
}

impl FromStr for SchemaKind {
    type Err = StructuredDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "organization" => Ok(SchemaKind::Organization),
            "service" => Ok(SchemaKind::Service),
            "product" => Ok(SchemaKind::Product),
            "localbusiness" => Ok(SchemaKind::LocalBusiness),
            "article" => Ok(SchemaKind::Article),
            "faq" | "faqpage" => Ok(SchemaKind::Faq),
            "breadcrumb" | "breadcrumblist" => Ok(SchemaKind::Breadcrumb),
            "video" | "videoobject" => Ok(SchemaKind::Video),
            "image" | "imageobject" => Ok(SchemaKind::Image),
            "videogreetingservice" | "videogreeting" => Ok(SchemaKind::VideoGreetingService),
            _ => Err(StructuredDataError::UnknownType(s.to_string())),
        }
    }
}

/// Builds the JSON-LD for `kind` from an untyped request body.
/// FAQ and breadcrumb accept either a bare array or `{"items": [...]}`.
pub fn generate(kind: &str, data: Value) -> Result<Value, StructuredDataError> {
    let items = |data: Value| match data {
        Value::Object(mut map) => map
            .remove("items")
            .or_else(|| map.remove("questions"))
            .unwrap_or(Value::Array(Vec::new())),
        other => other,
    };

    Ok(match kind.parse::<SchemaKind>()? {
        SchemaKind::Organization => organization(&serde_json::from_value(data)?),
        SchemaKind::Service => service(&serde_json::from_value(data)?),
        SchemaKind::Product => product(&serde_json::from_value(data)?),
        SchemaKind::LocalBusiness => local_business(&serde_json::from_value(data)?),
        SchemaKind::Article => article(&serde_json::from_value(data)?),
        SchemaKind::Faq => faq(&serde_json::from_value::<Vec<FaqItem>>(items(data))?),
        SchemaKind::Breadcrumb => breadcrumb(&serde_json::from_value::<Vec<BreadcrumbItem>>(items(data))?),
        SchemaKind::Video => video(&serde_json::from_value(data)?),
        SchemaKind::Image => image(&serde_json::from_value(data)?),
        SchemaKind::VideoGreetingService => video_greeting_service(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

pub fn validate(data: &Value) -> SchemaValidation {
    let mut errors = Vec::new();
    let has = |key: &str| {
        data.get(key)
            .is_some_and(|v| !v.is_null() && v.as_str() != Some(""))
    };

    if !has("@context") {
        errors.push("Missing @context".to_string());
    }
    if !has("@type") {
        errors.push("Missing @type".to_string());
    }
    // * FAQ and breadcrumb lists carry no name of their own
    let list_type = matches!(
        data.get("@type").and_then(Value::as_str),
        Some("FAQPage") | Some("BreadcrumbList")
    );
    if !list_type && !has("name") && !has("headline") {
        errors.push("Missing name or headline".to_string());
    }

    SchemaValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// `<script type="application/ld+json">` embedding
pub fn to_script_tag(data: &Value) -> String {
    // * "</" inside a string would close the script element early
    let body = data.to_string().replace("</", "<\\/");
    format!("<script type=\"application/ld+json\">{}</script>", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_omitted() {
        let org = organization(&OrganizationInput {
            name: "WishesVideo".to_string(),
            url: Some("https://wishesvideo.com".to_string()),
            ..Default::default()
        });

        assert_eq!(org["@type"], "Organization");
        assert!(org.get("logo").is_none());
        assert!(org.get("contactPoint").is_none());
        assert_eq!(org["sameAs"], json!([]));
        assert!(validate(&org).is_valid);
    }

    #[test]
    fn test_product_rating() {
        let mut input = ProductInput {
            name: "Birthday video".to_string(),
            price: Some(json!("29.99")),
            ..Default::default()
        };
        assert!(product(&input).get("aggregateRating").is_none());

        input.rating = Some(RatingInput { value: 4.8, count: 120 });
        let value = product(&input);
        assert_eq!(value["aggregateRating"]["reviewCount"], 120);
        assert_eq!(value["offers"]["priceCurrency"], "USD");
        assert!(value["offers"].get("seller").is_none());
    }

    #[test]
    fn test_article_date_modified_falls_back() {
        let value = article(&ArticleInput {
            title: "How to pick a greeting".to_string(),
            publish_date: Some("2026-01-02".to_string()),
            ..Default::default()
        });
        assert_eq!(value["dateModified"], "2026-01-02");
        assert!(validate(&value).is_valid);
    }

    #[test]
    fn test_generate_dispatch() {
        let breadcrumbs = generate(
            "breadcrumb",
            json!([{"name": "Home", "url": "https://x.com"}, {"name": "Birthday", "url": "https://x.com/b"}]),
        )
        .unwrap();
        assert_eq!(breadcrumbs["itemListElement"][1]["position"], 2);
        assert!(validate(&breadcrumbs).is_valid);

        let faq = generate("FAQ", json!({"questions": [{"question": "How fast?", "answer": "1-3 days"}]})).unwrap();
        assert_eq!(faq["mainEntity"][0]["acceptedAnswer"]["text"], "1-3 days");

        let local = generate("local-business", json!({"name": "Studio"})).unwrap();
        assert_eq!(local["address"]["@type"], "PostalAddress");

        assert!(matches!(
            generate("recipe", json!({})),
            Err(StructuredDataError::UnknownType(_))
        ));
        assert!(matches!(
            generate("faq", json!([{"question": 1}])),
            Err(StructuredDataError::InvalidData(_))
        ));
    }

    #[test]
    fn test_validate_missing_fields() {
        let result = validate(&json!({"@type": "Thing"}));
        assert_eq!(
            result.errors,
            vec!["Missing @context".to_string(), "Missing name or headline".to_string()]
        );
    }

    #[test]
    fn test_script_tag_escapes_closing_tags() {
        let tag = to_script_tag(&json!({"name": "</script><b>"}));
        assert!(tag.starts_with("<script type=\"application/ld+json\">"));
        assert_eq!(tag.matches("</script>").count(), 1);
    }

    #[test]
    fn test_site_service() {
        let value = video_greeting_service();
        assert!(validate(&value).is_valid);
        assert_eq!(value["hasOfferCatalog"]["itemListElement"].as_array().unwrap().len(), 3);
    }
}
