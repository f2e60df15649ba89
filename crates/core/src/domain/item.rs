use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Items carried by the reference retail snapshot.
pub const DEFAULT_ITEM_VOCABULARY: &[&str] = &[
    "Tunic",
    "Tank Top",
    "Leggings",
    "Onesie",
    "Jacket",
    "Trousers",
    "Jeans",
    "Pajamas",
    "Trench Coat",
    "Poncho",
    "Romper",
    "T-shirt",
    "Shorts",
    "Blazer",
    "Hoodie",
    "Sweater",
    "Blouse",
    "Swimsuit",
    "Kimono",
    "Cardigan",
    "Dress",
    "Camisole",
    "Flannel Shirt",
    "Polo Shirt",
    "Overalls",
    "Coat",
    "Vest",
    "Jumpsuit",
    "Raincoat",
    "Skirt",
    "Pants",
];

/// Canonical item name. Only produced by [`ItemCatalog::canonicalize`], so two
/// `ItemName`s compare equal exactly when they name the same vocabulary entry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemName(String);

impl ItemName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fixed item vocabulary with a case-insensitive lookup key per entry.
#[derive(Clone, Debug)]
pub struct ItemCatalog {
    by_key: HashMap<String, ItemName>,
}

impl ItemCatalog {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let by_key = items
            .into_iter()
            .filter_map(|item| {
                let display = collapse_whitespace(item.as_ref());
                (!display.is_empty()).then(|| (lookup_key(&display), ItemName(display)))
            })
            .collect();
        Self { by_key }
    }

    /// Map free-form input onto its canonical vocabulary spelling.
    pub fn canonicalize(&self, raw: &str) -> Option<ItemName> {
        self.by_key.get(&lookup_key(raw)).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_VOCABULARY)
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn lookup_key(value: &str) -> String {
    collapse_whitespace(value).to_lowercase()
}
