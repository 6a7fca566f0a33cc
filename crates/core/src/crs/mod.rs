//! Coordinate Reference System handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// PROJ string, when the CRS was given as one
    pub fn proj(&self) -> Option<&str> {
        self.proj.as_deref()
    }

    /// Whether coordinates in this CRS are longitude/latitude degrees.
    ///
    /// EPSG codes in the 4000-4999 block are geographic 2D systems. Without a
    /// code we fall back to sniffing the PROJ or WKT text.
    pub fn is_geographic(&self) -> bool {
        if let Some(code) = self.epsg {
            return (4000..5000).contains(&code);
        }
        if let Some(proj) = &self.proj {
            return proj.contains("+proj=longlat") || proj.contains("+proj=latlong");
        }
        if let Some(wkt) = &self.wkt {
            let head = wkt.trim_start();
            return head.starts_with("GEOGCS") || head.starts_with("GEOGCRS");
        }
        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            return format!("WKT:{}", wkt.chars().take(50).collect::<String>());
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(4326);
        assert_eq!(crs.epsg(), Some(4326));
        assert_eq!(crs.identifier(), "EPSG:4326");
    }

    #[test]
    fn test_is_geographic() {
        assert!(CRS::wgs84().is_geographic());
        assert!(CRS::from_epsg(4674).is_geographic()); // SIRGAS 2000
        assert!(!CRS::web_mercator().is_geographic());
        assert!(!CRS::from_epsg(32722).is_geographic());
        assert!(CRS::from_proj("+proj=longlat +datum=WGS84").is_geographic());
        assert!(CRS::from_wkt("GEOGCS[\"WGS 84\",DATUM[...]]").is_geographic());
        assert!(!CRS::from_wkt("PROJCS[\"UTM\"]").is_geographic());
    }
}
