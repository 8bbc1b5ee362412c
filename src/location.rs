//! Location acquisition capability
//!
//! A fix carries its provenance: a live reading from a positioning device, or
//! the documented fallback coordinate when no reading is available. The
//! publish core treats both identically; callers that care can log which one
//! they got.

use crate::payload::GeoPoint;
use async_trait::async_trait;

/// Coordinate used when no live fix is available.
pub const FALLBACK_POSITION: GeoPoint = GeoPoint {
    latitude: -22.772663,
    longitude: -43.6857564,
};

/// A location reading with provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationFix {
    /// A real reading from the location subsystem.
    Live(GeoPoint),
    /// No reading available; carrying the fallback coordinate.
    Fallback(GeoPoint),
}

impl LocationFix {
    pub fn point(&self) -> GeoPoint {
        match self {
            LocationFix::Live(p) | LocationFix::Fallback(p) => *p,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, LocationFix::Fallback(_))
    }
}

/// Supplier of the current position.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_fix(&self) -> LocationFix;
}

/// Location source over a known coordinate, or the fallback when none given.
pub struct StaticLocationSource {
    fix: LocationFix,
}

impl StaticLocationSource {
    pub fn new(point: Option<GeoPoint>) -> Self {
        let fix = match point {
            Some(p) => LocationFix::Live(p),
            None => LocationFix::Fallback(FALLBACK_POSITION),
        };
        Self { fix }
    }
}

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn current_fix(&self) -> LocationFix {
        self.fix
    }
}
