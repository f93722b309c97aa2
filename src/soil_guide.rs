//! Soil type → suitable crops reference table
//!
//! Static agronomy guide shown as a browsable grid on the dashboard; it is
//! independent of the trained model's soil categories.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SoilGuideEntry {
    pub soil: &'static str,
    pub crops: &'static [&'static str],
}

pub static SOIL_GUIDE: [SoilGuideEntry; 7] = [
    SoilGuideEntry { soil: "Alluvial", crops: &["Rice", "Sugarcane", "Wheat", "Jute"] },
    SoilGuideEntry { soil: "Black", crops: &["Cotton", "Soybean", "Sorghum"] },
    SoilGuideEntry { soil: "Red", crops: &["Millets", "Groundnut", "Potato"] },
    SoilGuideEntry { soil: "Laterite", crops: &["Cashew", "Tea", "Tapioca"] },
    SoilGuideEntry { soil: "Sandy", crops: &["Melons", "Pulses", "Groundnut"] },
    SoilGuideEntry { soil: "Clayey", crops: &["Rice", "Wheat", "Lentil"] },
    SoilGuideEntry { soil: "Loamy", crops: &["Maize", "Barley", "Sugarcane"] },
];

/// Case-insensitive lookup by soil name
pub fn suitable_crops(soil: &str) -> Option<&'static SoilGuideEntry> {
    let soil = soil.trim();
    SOIL_GUIDE
        .iter()
        .find(|entry| entry.soil.eq_ignore_ascii_case(soil))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let entry = suitable_crops(" black ").unwrap();
        assert_eq!(entry.soil, "Black");
        assert_eq!(entry.crops, &["Cotton", "Soybean", "Sorghum"]);
        assert!(suitable_crops("Peaty").is_none());
    }

    #[test]
    fn test_guide_order() {
        let soils: Vec<&str> = SOIL_GUIDE.iter().map(|e| e.soil).collect();
        assert_eq!(soils, ["Alluvial", "Black", "Red", "Laterite", "Sandy", "Clayey", "Loamy"]);
    }
}
