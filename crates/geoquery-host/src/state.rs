//! In-memory selection and position sources.

use std::sync::{Mutex, PoisonError};

use geoquery_ai::{FeatureSelection, PositionSource};
use geoquery_core::{Coordinate, SelectedFeature};

/// The map's current selection, settable by whoever owns the map.
#[derive(Debug, Default)]
pub struct SharedSelection(Mutex<Option<SelectedFeature>>);

impl SharedSelection {
    pub fn new(selection: Option<SelectedFeature>) -> Self {
        Self(Mutex::new(selection))
    }

    pub fn set(&self, selection: Option<SelectedFeature>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = selection;
    }
}

impl FeatureSelection for SharedSelection {
    fn current(&self) -> Option<SelectedFeature> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Fixed user position and viewport centre.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPosition {
    pub user: Option<Coordinate>,
    pub viewport: Option<Coordinate>,
}

impl PositionSource for FixedPosition {
    fn user_position(&self) -> Option<Coordinate> {
        self.user
    }

    fn viewport_center(&self) -> Option<Coordinate> {
        self.viewport
    }
}
