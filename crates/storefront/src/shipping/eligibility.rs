//! Restricted-category delivery area rules.
//!
//! Doors, windows and glass are delivered and installed by our own crews, so
//! carts containing them can only ship to the New York City metro area:
//! the five boroughs, Long Island, Westchester and Jersey City.

use glasshouse_core::ZipCode;

use crate::cart::CartLineItem;

/// Categories subject to the delivery area restriction.
const RESTRICTED_CATEGORIES: &[&str] = &["doors", "windows", "glass"];

/// Name / slug fragments used when a line carries no category.
const RESTRICTED_KEYWORDS: &[&str] = &["door", "window", "glass"];

const NYC_BOROUGHS: &[&str] = &[
    "manhattan",
    "new york",
    "brooklyn",
    "queens",
    "bronx",
    "staten island",
];

const LONG_ISLAND: &[&str] = &[
    "nassau",
    "suffolk",
    "hempstead",
    "islip",
    "oyster bay",
    "huntington",
    "babylon",
    "smithtown",
    "brookhaven",
    "riverhead",
    "southampton",
    "east hampton",
];

const WESTCHESTER: &[&str] = &[
    "yonkers",
    "white plains",
    "new rochelle",
    "mount vernon",
    "peekskill",
    "port chester",
    "rye",
    "scarsdale",
    "tarrytown",
    "dobbs ferry",
    "hastings",
    "irvington",
];

/// Hoboken, always deliverable.
const ZIP_EXCEPTION: &str = "07030";

/// Inclusive numeric ZIP ranges inside the delivery area.
const ELIGIBLE_ZIP_RANGES: &[(u32, u32)] = &[
    (10001, 10299), // Manhattan
    (10301, 10399), // Staten Island
    (10401, 10499), // Bronx
    (11001, 11199), // Queens / western Nassau
    (11201, 11299), // Brooklyn
    (11301, 11699), // Queens
    (7030, 7030),   // Hoboken
    (10501, 10899), // Westchester
    (11501, 11999), // Long Island
];

/// Whether any line belongs to a restricted category.
///
/// A line with a category is restricted when the category is `doors`,
/// `windows` or `glass`. A line without category metadata falls back to its
/// product name and slug containing `door`, `window` or `glass`. All checks
/// are case-insensitive.
#[must_use]
pub fn requires_restricted_shipping(items: &[CartLineItem]) -> bool {
    items.iter().any(is_restricted_item)
}

fn is_restricted_item(item: &CartLineItem) -> bool {
    match item
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        Some(category) => RESTRICTED_CATEGORIES
            .iter()
            .any(|restricted| category.eq_ignore_ascii_case(restricted)),
        None => {
            let name = item.product_name.to_lowercase();
            let slug = item
                .product_slug
                .as_deref()
                .unwrap_or_default()
                .to_lowercase();
            RESTRICTED_KEYWORDS
                .iter()
                .any(|keyword| name.contains(keyword) || slug.contains(keyword))
        }
    }
}

/// Whether a destination lies inside the restricted-shipping delivery area.
///
/// Comparisons are case-insensitive on trimmed input. The ZIP rules use the
/// leading five digits; a malformed ZIP only matches by locality.
#[must_use]
pub fn is_eligible_destination(city: &str, state: &str, zip: &str) -> bool {
    let city = city.trim().to_lowercase();
    let state = state.trim().to_uppercase();
    let city_matches = |localities: &[&str]| localities.iter().any(|l| city.contains(l));

    if state == "NY"
        && (city_matches(NYC_BOROUGHS) || city_matches(LONG_ISLAND) || city_matches(WESTCHESTER))
    {
        return true;
    }

    if state == "NJ" && city.contains("jersey city") {
        return true;
    }

    let Ok(zip) = ZipCode::parse(zip) else {
        return false;
    };

    if zip.five_digit() == ZIP_EXCEPTION {
        return true;
    }

    let numeric = zip.numeric();
    ELIGIBLE_ZIP_RANGES
        .iter()
        .any(|&(low, high)| (low..=high).contains(&numeric))
}

#[cfg(test)]
mod tests {
    use glasshouse_core::ProductId;

    use super::*;

    fn item(name: &str, slug: Option<&str>, category: Option<&str>) -> CartLineItem {
        CartLineItem {
            product_id: ProductId::new(name.to_lowercase().replace(' ', "-")),
            variant_name: None,
            quantity: 1,
            unit_price_cents: 1_000,
            product_name: name.to_string(),
            product_image: None,
            product_slug: slug.map(str::to_string),
            category: category.map(str::to_string),
            dimensions: None,
        }
    }

    #[test]
    fn test_restricted_by_category() {
        assert!(requires_restricted_shipping(&[item("Model A", None, Some("doors"))]));
        assert!(requires_restricted_shipping(&[item("Model B", None, Some("Windows"))]));
        assert!(requires_restricted_shipping(&[item("Model C", None, Some(" GLASS "))]));
    }

    #[test]
    fn test_category_overrides_name_fallback() {
        // A door handle is hardware, even though its name mentions doors
        assert!(!requires_restricted_shipping(&[item(
            "Door Handle",
            Some("door-handle"),
            Some("hardware")
        )]));
    }

    #[test]
    fn test_restricted_by_name_or_slug_without_category() {
        assert!(requires_restricted_shipping(&[item("Sliding DOOR", None, None)]));
        assert!(requires_restricted_shipping(&[item("Model X", Some("bay-window-x"), None)]));
        assert!(requires_restricted_shipping(&[item("Frosted Glass Panel", None, Some(""))]));
        assert!(!requires_restricted_shipping(&[item("Hinge Set", Some("hinge-set"), None)]));
    }

    #[test]
    fn test_any_item_restricts_cart() {
        let items = [
            item("Hinge Set", None, Some("hardware")),
            item("Entry", None, Some("doors")),
        ];
        assert!(requires_restricted_shipping(&items));
        assert!(!requires_restricted_shipping(&[]));
    }

    #[test]
    fn test_eligible_examples() {
        assert!(is_eligible_destination("Brooklyn", "NY", "11201"));
        assert!(!is_eligible_destination("Los Angeles", "CA", "90001"));
        // Name match, even though only 07030 is the explicit ZIP exception
        assert!(is_eligible_destination("Jersey City", "NJ", "07302"));
    }

    #[test]
    fn test_locality_lists() {
        assert!(is_eligible_destination("  staten island ", "ny", "99999"));
        assert!(is_eligible_destination("East Hampton", "NY", "99999"));
        assert!(is_eligible_destination("Dobbs Ferry", "NY", "99999"));
        assert!(is_eligible_destination("Hastings-on-Hudson", "NY", "99999"));
    }

    #[test]
    fn test_locality_requires_matching_state() {
        assert!(!is_eligible_destination("Brooklyn", "CT", "06000"));
        assert!(!is_eligible_destination("Jersey City", "NY", "99999"));
        assert!(!is_eligible_destination("Yonkers", "NJ", "99999"));
    }

    #[test]
    fn test_zip_exception_and_ranges() {
        assert!(is_eligible_destination("Hoboken", "NJ", "07030"));
        assert!(is_eligible_destination("Hoboken", "NJ", "07030-1234"));
        assert!(is_eligible_destination("", "", "10001"));
        assert!(is_eligible_destination("", "", "10299"));
        assert!(!is_eligible_destination("", "", "10300"));
        assert!(is_eligible_destination("", "", "10301"));
        assert!(!is_eligible_destination("", "", "10500"));
        assert!(is_eligible_destination("", "", "10899"));
        assert!(!is_eligible_destination("", "", "10900"));
        assert!(!is_eligible_destination("", "", "11200"));
        assert!(is_eligible_destination("", "", "11999"));
        assert!(!is_eligible_destination("", "", "12000"));
        assert!(!is_eligible_destination("", "", "07031"));
    }

    #[test]
    fn test_malformed_zip_is_not_eligible() {
        assert!(!is_eligible_destination("Springfield", "IL", "1120"));
        assert!(!is_eligible_destination("Springfield", "IL", ""));
    }
}
