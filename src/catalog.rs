use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// A catalog product. Prices are whole naira; the kobo conversion happens
/// only at the gateway boundary.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i32,
    pub name: &'static str,
    pub description: &'static str,
    pub unit_price: i64,
    pub image_ref: &'static str,
}

/// Process-wide constant product table. Read-only; there is no catalog
/// mutation anywhere in the system.
pub const PRODUCTS: &[Product] = &[
    Product {
        id: 1,
        name: "Adire Fabric",
        description: "Traditional Yoruba tie-dye fabric.",
        unit_price: 4500,
        image_ref: "adire-fabric.jpg",
    },
    Product {
        id: 2,
        name: "Ofada Rice",
        description: "Locally grown aromatic rice.",
        unit_price: 3500,
        image_ref: "ofada-rice.jpg",
    },
    Product {
        id: 3,
        name: "Shea Butter",
        description: "Pure, unrefined shea butter.",
        unit_price: 2500,
        image_ref: "shea-butter.jpg",
    },
    Product {
        id: 4,
        name: "Akara Beans",
        description: "Premium brown beans.",
        unit_price: 1800,
        image_ref: "akara-beans.jpg",
    },
    Product {
        id: 5,
        name: "Palm Oil",
        description: "100% pure red palm oil.",
        unit_price: 2000,
        image_ref: "palm-oil.jpg",
    },
    Product {
        id: 6,
        name: "Kente Cloth",
        description: "Handwoven kente cloth.",
        unit_price: 7500,
        image_ref: "kente-cloth.jpg",
    },
    Product {
        id: 7,
        name: "Suya Spice Mix",
        description: "Authentic suya spice blend.",
        unit_price: 1500,
        image_ref: "suya-spice.jpg",
    },
    Product {
        id: 8,
        name: "Bitter Leaf",
        description: "Dried bitter leaf.",
        unit_price: 1200,
        image_ref: "bitter-leaf.jpg",
    },
];

static PRODUCT_INDEX: Lazy<HashMap<i32, &'static Product>> =
    Lazy::new(|| PRODUCTS.iter().map(|p| (p.id, p)).collect());

pub fn all() -> &'static [Product] {
    PRODUCTS
}

pub fn find(id: i32) -> Option<&'static Product> {
    PRODUCT_INDEX.get(&id).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_eq!(PRODUCT_INDEX.len(), PRODUCTS.len());
    }

    #[test]
    fn lookup_hits_and_misses() {
        assert_eq!(find(1).map(|p| p.unit_price), Some(4500));
        assert!(find(999).is_none());
    }

    #[test]
    fn prices_are_positive() {
        assert!(PRODUCTS.iter().all(|p| p.unit_price > 0));
    }
}
