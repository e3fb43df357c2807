//! Built-in theme pools.
//!
//! Themes are short topical anchors interpolated into instructions. These
//! pools are the defaults; a config file may replace either of them.

use super::PromptCategory;

/// Default themes for text questions.
pub static TEXT_THEMES: &[&str] = &[
    "Love and relationships",
    "Nature and environment",
    "Art and creativity",
    "Technology and innovation",
    "Health and wellness",
    "History and heritage",
    "Science and discovery",
    "Philosophy and ethics",
    "Education and learning",
    "Music and rhythm",
    "Sports and games",
    "Food and culinary arts",
    "Travel and exploration",
    "Fantasy and mythology",
    "Space and the cosmos",
    "Economics and markets",
    "Language and linguistics",
    "Psychology and the mind",
    "Architecture and urban design",
    "Politics and governance",
    "Mathematics and logic",
    "Literature and storytelling",
    "Oceans and marine life",
    "Agriculture and food systems",
    "Climate and weather",
    "Cryptography and privacy",
    "Medicine and the human body",
    "Film and theatre",
    "Entrepreneurship and business",
    "Friendship and community",
];

/// Default themes for image-generation scenarios.
pub static IMAGE_THEMES: &[&str] = &[
    "The Inner Journey",
    "Urban Dreams",
    "Forgotten Ruins",
    "Celestial Wonders",
    "Underwater Kingdoms",
    "Steampunk Inventions",
    "Enchanted Forests",
    "Desert Mirage",
    "Neon Nights",
    "Arctic Silence",
    "Harvest Festivals",
    "Mechanical Creatures",
    "Floating Islands",
    "Storm Chasers",
    "Ancient Libraries",
    "Crystal Caverns",
    "Retro Futurism",
    "Mountain Monasteries",
    "Carnival of Shadows",
    "Garden of Giants",
    "Lost in Translation",
    "Sunrise Markets",
    "Cosmic Voyagers",
    "Whispering Winds",
    "Clockwork Cities",
    "Reflections and Mirrors",
    "Tidal Pools",
    "Lanterns in the Fog",
    "Migration of Birds",
    "Quiet Train Stations",
];

/// The built-in theme pool for a category, as owned strings.
pub fn default_themes(category: PromptCategory) -> Vec<String> {
    let pool = match category {
        PromptCategory::Text => TEXT_THEMES,
        PromptCategory::Images => IMAGE_THEMES,
    };
    pool.iter().map(|s| s.to_string()).collect()
}
