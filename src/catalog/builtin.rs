// Item catalog bundled with the application, used whenever the backend
// catalog can't be loaded.

use super::{Catalog, CatalogItem, Category};

const BUILTIN_CATEGORIES: &[(u32, &str, &[(u32, &str)])] = &[
    (
        1,
        "clothing",
        &[
            (1, "top"),
            (2, "suit"),
            (3, "dress-shoes"),
            (4, "bottoms"),
            (5, "pajamas"),
            (6, "socks"),
            (7, "underwear"),
            (8, "sunglasses"),
            (9, "shoes"),
            (10, "outerwear"),
            (11, "cap"),
            (12, "swimsuit"),
            (13, "scarf"),
            (14, "muffler"),
            (15, "tracksuit"),
            (16, "sandals"),
            (17, "thermal-innerwear"),
        ],
    ),
    (
        2,
        "essentials",
        &[
            (18, "passport"),
            (19, "wallet"),
            (20, "esim"),
            (21, "id-card"),
            (22, "won"),
            (23, "travel-insurance"),
            (24, "international-driving-permit"),
        ],
    ),
    (
        3,
        "documents",
        &[(25, "voucher"), (26, "visa"), (27, "e-ticket")],
    ),
    (
        4,
        "toiletries",
        &[
            (28, "toothpaste"),
            (29, "toothbrush"),
            (30, "cleansing-foam"),
            (31, "shampoo"),
            (32, "razor"),
            (33, "body-wash"),
            (34, "towel"),
            (35, "cleansing-tissue"),
        ],
    ),
    (
        5,
        "cosmetics",
        &[
            (36, "sunscreen"),
            (37, "toner"),
            (38, "lotion"),
            (39, "cotton-pads"),
            (40, "makeup"),
        ],
    ),
    (
        6,
        "medicine",
        &[
            (41, "digestive"),
            (42, "allergy-medicine"),
            (43, "painkiller"),
            (44, "motion-sickness-pills"),
            (45, "bandages"),
            (46, "ointment"),
        ],
    ),
    (
        7,
        "electronics",
        &[
            (47, "plug-adapter"),
            (48, "charger"),
            (49, "power-strip"),
            (50, "power-bank"),
            (51, "pocket-wifi"),
            (52, "camera"),
            (53, "laptop"),
            (54, "tablet"),
        ],
    ),
    (
        8,
        "consumables",
        &[(55, "insect-repellent"), (56, "zip-bags"), (57, "wet-wipes")],
    ),
    (
        9,
        "pet-supplies",
        &[
            (58, "pet-food"),
            (59, "snacks"),
            (60, "pet-carrier"),
            (61, "portion-containers"),
            (62, "pet-medicine"),
            (63, "toys"),
            (64, "leash"),
        ],
    ),
    (
        10,
        "baby-supplies",
        &[
            (65, "diapers"),
            (66, "baby-wipes"),
            (67, "baby-bottle"),
            (68, "baby-spoon"),
            (69, "stroller"),
            (70, "snacks"),
            (71, "formula"),
            (72, "toys"),
            (73, "baby-carrier"),
        ],
    ),
    (
        11,
        "other",
        &[
            (74, "shopping-bag"),
            (75, "work-documents"),
            (76, "umbrella"),
            (77, "parasol"),
            (78, "neck-pillow"),
            (79, "selfie-stick"),
            (80, "coin-purse"),
            (81, "contact-lenses"),
            (82, "handheld-fan"),
            (83, "cooling-gear"),
            (84, "eye-mask"),
            (85, "earplugs"),
            (86, "visit-japan-web"),
            (87, "transit-card"),
        ],
    ),
];

/// Build the bundled catalog.
pub fn builtin_catalog() -> Catalog {
    let categories = BUILTIN_CATEGORIES
        .iter()
        .map(|(category_id, category_label, items)| Category {
            category_id: Some(*category_id),
            label: category_label.to_string(),
            items: items
                .iter()
                .map(|(item_id, item_label)| CatalogItem {
                    item_id: Some(*item_id),
                    label: item_label.to_string(),
                })
                .collect(),
        })
        .collect();
    Catalog::new(categories)
}
