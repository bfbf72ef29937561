//! Built-in first-run dataset.
//!
//! When the durable store turns out to be completely empty on first hydrate,
//! the persistence coordinator commits this dataset before exposing state,
//! so a fresh install is durable before any user action.

use super::Item;

fn item(name: &str, location: &str, category: &str, tags: &[&str]) -> Item {
    Item {
        name: name.to_string(),
        location: location.to_string(),
        category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        photo_src: None,
    }
}

/// The seed items shipped with the application.
pub fn items() -> Vec<Item> {
    vec![
        item(
            "Ignatius the Dragon",
            "Closet Bin A",
            "Plushie",
            &["plushie", "dragon", "market-ready"],
        ),
        item(
            "Humphrey Whale (Blue Yarn)",
            "Garage Tote 3",
            "Supply",
            &["yarn", "supply", "whale"],
        ),
        item(
            "Lydia the Ladybug Book",
            "Under-bed Bin A",
            "Book",
            &["book", "inventory", "8.5x8.5"],
        ),
        item(
            "Clover the Cow (M)",
            "Top Shelf",
            "Plushie",
            &["plushie", "cow", "gift"],
        ),
        item(
            "Harley the Llama",
            "Closet Bin B",
            "Plushie",
            &["plushie", "llama"],
        ),
        item(
            "Sarah the Turtle (Pink Shell)",
            "Office Drawer",
            "Plushie",
            &["plushie", "turtle", "pink"],
        ),
        item("Milo the Mammoth", "Studio Rack", "Plushie", &["plushie", "mammoth"]),
        item(
            "Ignatius Eyes (12mm)",
            "Notions Box",
            "Notions",
            &["eyes", "notions", "12mm"],
        ),
    ]
}

/// The seed locations, sorted.
pub fn locations() -> Vec<String> {
    let mut locations: Vec<String> = [
        "Closet Bin A",
        "Garage Tote 3",
        "Under-bed Bin A",
        "Top Shelf",
        "Closet Bin B",
        "Office Drawer",
        "Studio Rack",
        "Notions Box",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    locations.sort();
    locations
}

/// The seed categories, sorted.
pub fn categories() -> Vec<String> {
    let mut categories: Vec<String> = ["Plushie", "Supply", "Book", "Notions"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    categories.sort();
    categories
}
