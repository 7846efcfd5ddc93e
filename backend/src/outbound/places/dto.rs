//! Wire types for the Places `searchText` endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::Coordinate;

/// Radius of the location bias circle around the linkup origin.
pub(super) const LOCATION_BIAS_RADIUS_METERS: f64 = 200.0;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SearchTextRequestDto<'a> {
    pub(super) text_query: &'a str,
    pub(super) page_size: u8,
    pub(super) location_bias: LocationBiasDto,
}

#[derive(Debug, Serialize)]
pub(super) struct LocationBiasDto {
    pub(super) circle: CircleDto,
}

#[derive(Debug, Serialize)]
pub(super) struct CircleDto {
    pub(super) center: LatLngDto,
    pub(super) radius: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct LatLngDto {
    pub(super) latitude: f64,
    pub(super) longitude: f64,
}

impl<'a> SearchTextRequestDto<'a> {
    pub(super) fn new(text_query: &'a str, near: &Coordinate) -> Self {
        Self {
            text_query,
            page_size: 1,
            location_bias: LocationBiasDto {
                circle: CircleDto {
                    center: LatLngDto {
                        latitude: near.latitude(),
                        longitude: near.longitude(),
                    },
                    radius: LOCATION_BIAS_RADIUS_METERS,
                },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchTextResponseDto {
    #[serde(default)]
    pub(super) places: Vec<PlaceDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PlaceDto {
    pub(super) id: Option<String>,
}

impl SearchTextResponseDto {
    /// First non-blank place id, if any.
    pub(super) fn first_place_id(self) -> Option<String> {
        self.places
            .into_iter()
            .filter_map(|place| place.id)
            .find(|id| !id.trim().is_empty())
    }
}
