//! Built-in product catalog, seeded into the `products` table at startup.

use crate::models::Product;
use rust_decimal::Decimal;

struct CatalogEntry {
    id: i64,
    name: &'static str,
    category: &'static str,
    price: i64,
    description: &'static str,
    image: &'static str,
}

const DEFAULT_STOCK: i64 = 100;

const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        id: 1,
        name: "Antigravitacin",
        category: "energy",
        price: 2500,
        description: "Raises energy levels in zero gravity",
        image: "images/antigravitacin.png",
    },
    CatalogEntry {
        id: 2,
        name: "Radioprotective Gel",
        category: "immunity",
        price: 3200,
        description: "Shields against cosmic radiation and supports immunity",
        image: "images/radioprotective-gel.png",
    },
    CatalogEntry {
        id: 3,
        name: "Mars Gene Adaptation",
        category: "adaptation",
        price: 8500,
        description: "Prepares the body for life on Mars",
        image: "images/mars-gene-adaptation.png",
    },
    CatalogEntry {
        id: 4,
        name: "Bone Regenerator",
        category: "recovery",
        price: 5400,
        description: "Prevents bone density loss in space",
        image: "images/bone-regenerator.png",
    },
    CatalogEntry {
        id: 5,
        name: "Neurostabilizer",
        category: "energy",
        price: 4100,
        description: "Sharpens cognition on long-haul flights",
        image: "images/neurostabilizer.png",
    },
    CatalogEntry {
        id: 6,
        name: "Venus Immunomodulator",
        category: "immunity",
        price: 6900,
        description: "Adapts the immune system to the Venusian atmosphere",
        image: "images/venus-immunomodulator.jpg",
    },
    CatalogEntry {
        id: 7,
        name: "Cryo-Restorer",
        category: "recovery",
        price: 7800,
        description: "Speeds recovery after cryogenic sleep",
        image: "images/cryo-restorer.jpg",
    },
    CatalogEntry {
        id: 8,
        name: "Hyperspace Adaptogen",
        category: "adaptation",
        price: 9200,
        description: "Conditioning for hyperspace jumps",
        image: "images/hyperspace-adaptogen.jpg",
    },
];

pub fn default_products() -> Vec<Product> {
    ENTRIES
        .iter()
        .map(|entry| Product {
            id: entry.id,
            name: entry.name.to_string(),
            category: entry.category.to_string(),
            price: Decimal::new(entry.price, 0),
            description: entry.description.to_string(),
            image: entry.image.to_string(),
            stock: DEFAULT_STOCK,
        })
        .collect()
}
