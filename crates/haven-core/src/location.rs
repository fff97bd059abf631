//! Transient location data supplied with an SOS trigger. Never persisted.

use serde::{Deserialize, Serialize};

/// Where the user was when they triggered SOS, as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
  pub latitude:  f64,
  pub longitude: f64,
  /// Reported accuracy radius in metres.
  pub accuracy:  Option<f64>,
}

impl Location {
  pub fn coordinates(&self) -> Coordinates {
    Coordinates { latitude: self.latitude, longitude: self.longitude }
  }
}

/// A latitude/longitude pair used to build notification text and map links.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

impl Coordinates {
  /// A Google Maps search link centred on these coordinates.
  pub fn map_link(&self) -> String {
    format!(
      "https://www.google.com/maps/search/?api=1&query={},{}",
      self.latitude, self.longitude
    )
  }
}
