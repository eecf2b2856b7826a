use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Place categories served by `/places/{category}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaCategory {
    Communities,
    Hucs,
    ProtectedAreas,
    Corporations,
    ClimateDivisions,
    FireZones,
    EthnolinguisticRegions,
    Boroughs,
    CensusAreas,
    GameManagementUnits,
    FirstNations,
}

impl AreaCategory {
    pub const ALL: [AreaCategory; 11] = [
        AreaCategory::Communities,
        AreaCategory::Hucs,
        AreaCategory::ProtectedAreas,
        AreaCategory::Corporations,
        AreaCategory::ClimateDivisions,
        AreaCategory::FireZones,
        AreaCategory::EthnolinguisticRegions,
        AreaCategory::Boroughs,
        AreaCategory::CensusAreas,
        AreaCategory::GameManagementUnits,
        AreaCategory::FirstNations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AreaCategory::Communities => "communities",
            AreaCategory::Hucs => "hucs",
            AreaCategory::ProtectedAreas => "protected_areas",
            AreaCategory::Corporations => "corporations",
            AreaCategory::ClimateDivisions => "climate_divisions",
            AreaCategory::FireZones => "fire_zones",
            AreaCategory::EthnolinguisticRegions => "ethnolinguistic_regions",
            AreaCategory::Boroughs => "boroughs",
            AreaCategory::CensusAreas => "census_areas",
            AreaCategory::GameManagementUnits => "game_management_units",
            AreaCategory::FirstNations => "first_nations",
        }
    }

    /// Communities are points; every other category has boundary polygons.
    pub fn has_boundaries(&self) -> bool {
        !matches!(self, AreaCategory::Communities)
    }

    /// Categories that can be requested as polygons.
    pub fn with_boundaries() -> impl Iterator<Item = AreaCategory> {
        Self::ALL.into_iter().filter(|c| c.has_boundaries())
    }
}

impl fmt::Display for AreaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AreaCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "bad category {s:?}, choose one of: {}",
                    join(Self::ALL.iter().map(|c| c.as_str()))
                ))
            })
    }
}

/// Datasets with per-area zonal statistics available as CSV.
///
/// Elevation is served per area too, but has no CSV output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZonalDataset {
    Indicators,
    Beetles,
    Flammability,
    VegType,
    Temperature,
    Precipitation,
    TemperatureAndPrecipitation,
}

impl ZonalDataset {
    pub const ALL: [ZonalDataset; 7] = [
        ZonalDataset::Indicators,
        ZonalDataset::Beetles,
        ZonalDataset::Flammability,
        ZonalDataset::VegType,
        ZonalDataset::Temperature,
        ZonalDataset::Precipitation,
        ZonalDataset::TemperatureAndPrecipitation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZonalDataset::Indicators => "indicators",
            ZonalDataset::Beetles => "beetles",
            ZonalDataset::Flammability => "flammability",
            ZonalDataset::VegType => "veg_type",
            ZonalDataset::Temperature => "temperature",
            ZonalDataset::Precipitation => "precipitation",
            ZonalDataset::TemperatureAndPrecipitation => "temperature_and_precipitation",
        }
    }

    /// API path prefix; the area id is appended.
    pub fn path(&self) -> &'static str {
        match self {
            ZonalDataset::Indicators => "indicators/base/area/",
            ZonalDataset::Beetles => "beetles/area/",
            ZonalDataset::Flammability => "alfresco/flammability/area/",
            ZonalDataset::VegType => "alfresco/veg_type/area/",
            ZonalDataset::Temperature => "temperature/area/",
            ZonalDataset::Precipitation => "precipitation/area/",
            ZonalDataset::TemperatureAndPrecipitation => "taspr/area/",
        }
    }
}

impl fmt::Display for ZonalDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZonalDataset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "bad dataset name {s:?}, choose one of: {}",
                    join(Self::ALL.iter().map(|d| d.as_str()))
                ))
            })
    }
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_round_trip_through_names() {
        for c in AreaCategory::ALL {
            assert_eq!(c.as_str().parse::<AreaCategory>().unwrap(), c);
        }
        assert_eq!("corporations".parse::<AreaCategory>().unwrap(), AreaCategory::Corporations);
    }

    #[test]
    fn unknown_category_lists_choices() {
        let err = "corporations,".parse::<AreaCategory>().unwrap_err().to_string();
        assert!(err.contains("communities, hucs"));
        assert!(err.contains("first_nations"));
    }

    #[test]
    fn communities_have_no_boundaries() {
        let with: Vec<_> = AreaCategory::with_boundaries().collect();
        assert_eq!(with.len(), 10);
        assert!(!with.contains(&AreaCategory::Communities));
    }

    #[test]
    fn dataset_paths() {
        assert_eq!(ZonalDataset::TemperatureAndPrecipitation.path(), "taspr/area/");
        assert_eq!("veg_type".parse::<ZonalDataset>().unwrap().path(), "alfresco/veg_type/area/");
        assert!("elevation".parse::<ZonalDataset>().is_err());
    }
}
