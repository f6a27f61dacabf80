// Copyright 2025 RBPerf Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed object and region catalogs.
//!
//! Both catalogs are compiled in and never change while the process runs.
//! The region catalog is only used to validate requests and to label
//! results; it never drives control flow beyond that.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of every benchmark bucket; the region code is appended.
pub const BUCKET_PREFIX: &str = "gcsrbpa-";

/// One mebibyte in bytes.
pub const MIB: u64 = 1024 * 1024;

/// A benchmark object stored in every regional bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectId {
    /// `2mib.txt`
    #[serde(rename = "2mib.txt")]
    Mib2,
    /// `64mib.txt`
    #[serde(rename = "64mib.txt")]
    Mib64,
    /// `256mib.txt`
    #[serde(rename = "256mib.txt")]
    Mib256,
}

impl ObjectId {
    /// Every catalogued object, smallest first.
    pub const ALL: [ObjectId; 3] = [ObjectId::Mib2, ObjectId::Mib64, ObjectId::Mib256];

    /// Object name as stored in the bucket.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mib2 => "2mib.txt",
            Self::Mib64 => "64mib.txt",
            Self::Mib256 => "256mib.txt",
        }
    }

    /// Object size in mebibytes.
    pub fn size_mib(&self) -> u64 {
        match self {
            Self::Mib2 => 2,
            Self::Mib64 => 64,
            Self::Mib256 => 256,
        }
    }

    /// Object size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size_mib() * MIB
    }

    /// Names accepted by [`ObjectId::from_str`].
    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(ObjectId::as_str).collect()
    }
}

impl FromStr for ObjectId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|object| object.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownObject {
                value: s.to_string(),
                allowed: Self::allowed(),
            })
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A region code and its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Region code, also the bucket-name suffix.
    pub code: &'static str,
    /// Human-readable location.
    pub location: &'static str,
}

/// Every region with a benchmark bucket.
pub const REGIONS: &[Region] = &[
    Region { code: "us-west1", location: "Oregon" },
    Region { code: "us-west2", location: "Los Angeles" },
    Region { code: "us-west3", location: "Salt Lake City" },
    Region { code: "us-west4", location: "Las Vegas" },
    Region { code: "us-central1", location: "Iowa" },
    Region { code: "us-east1", location: "South Carolina" },
    Region { code: "us-east4", location: "Northern Virginia" },
    Region { code: "us-east5", location: "Columbus" },
    Region { code: "us-south1", location: "Dallas" },
    Region { code: "northamerica-northeast1", location: "Montréal" },
    Region { code: "northamerica-northeast2", location: "Toronto" },
];

/// Look up the display label of a region code.
pub fn location_for(code: &str) -> Option<&'static str> {
    REGIONS.iter().find(|r| r.code == code).map(|r| r.location)
}

/// A region code known to be present in [`REGIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(&'static str);

impl RegionId {
    /// The region code.
    pub fn code(&self) -> &'static str {
        self.0
    }

    /// The region's display label.
    pub fn location(&self) -> &'static str {
        location_for(self.0).unwrap_or(self.0)
    }

    /// Name of the benchmark bucket in this region.
    pub fn bucket_name(&self) -> String {
        format!("{}{}", BUCKET_PREFIX, self.0)
    }

    /// Every catalogued region, in catalog order.
    pub fn all() -> impl Iterator<Item = RegionId> {
        REGIONS.iter().map(|r| RegionId(r.code))
    }

    /// Codes accepted by [`RegionId::from_str`].
    pub fn allowed() -> Vec<&'static str> {
        REGIONS.iter().map(|r| r.code).collect()
    }
}

impl FromStr for RegionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        REGIONS
            .iter()
            .find(|r| r.code == s)
            .map(|r| RegionId(r.code))
            .ok_or_else(|| ValidationError::UnknownRegion {
                value: s.to_string(),
                allowed: Self::allowed(),
            })
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for RegionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

/// A validated trial request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TrialRequest {
    /// Object to download.
    pub object: ObjectId,
    /// Region whose bucket serves the object.
    pub region: RegionId,
}

impl TrialRequest {
    /// Create a request from already-validated parts.
    pub fn new(object: ObjectId, region: RegionId) -> Self {
        Self { object, region }
    }

    /// Validate raw identifiers. The object is checked before the region.
    pub fn parse(object_id: &str, region_id: &str) -> Result<Self, ValidationError> {
        let object = object_id.parse()?;
        let region = region_id.parse()?;
        Ok(Self { object, region })
    }

    /// Name of the bucket this request targets.
    pub fn bucket_name(&self) -> String {
        self.region.bucket_name()
    }

    /// Every region × object combination, regions outermost.
    pub fn full_plan() -> Vec<TrialRequest> {
        RegionId::all()
            .flat_map(|region| ObjectId::ALL.into_iter().map(move |object| Self::new(object, region)))
            .collect()
    }
}

impl fmt::Display for TrialRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket_name(), self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_sizes_are_consistent() {
        assert_eq!(ObjectId::Mib2.size_bytes(), 2_097_152);
        assert_eq!(ObjectId::Mib64.size_bytes(), 67_108_864);
        assert_eq!(ObjectId::Mib256.size_bytes(), 268_435_456);
        for object in ObjectId::ALL {
            assert_eq!(object.size_bytes(), object.size_mib() * MIB);
        }
    }

    #[test]
    fn test_object_parse() {
        assert_eq!("64mib.txt".parse::<ObjectId>().unwrap(), ObjectId::Mib64);
        let err = "1gib.txt".parse::<ObjectId>().unwrap_err();
        assert_eq!(err.parameter(), "object_id");
        assert!(err.to_string().contains("1gib.txt"));
        assert!(err.to_string().contains("2mib.txt, 64mib.txt, 256mib.txt"));
    }

    #[test]
    fn test_region_parse_and_labels() {
        let region: RegionId = "us-central1".parse().unwrap();
        assert_eq!(region.location(), "Iowa");
        assert_eq!(region.bucket_name(), "gcsrbpa-us-central1");

        let err = "mars-north1".parse::<RegionId>().unwrap_err();
        assert_eq!(err.parameter(), "region_id");
        assert!(err.to_string().contains("us-west1"));
    }

    #[test]
    fn test_parse_checks_object_first() {
        let err = TrialRequest::parse("bad.txt", "bad-region").unwrap_err();
        assert!(matches!(err, ValidationError::UnknownObject { .. }));

        let err = TrialRequest::parse("2mib.txt", "bad-region").unwrap_err();
        assert!(matches!(err, ValidationError::UnknownRegion { .. }));
    }

    #[test]
    fn test_full_plan_covers_catalogs() {
        let plan = TrialRequest::full_plan();
        assert_eq!(plan.len(), REGIONS.len() * ObjectId::ALL.len());
        assert_eq!(plan.len(), 33);
        assert_eq!(plan[0], TrialRequest::parse("2mib.txt", "us-west1").unwrap());
        assert_eq!(plan[2].object, ObjectId::Mib256);
    }

    #[test]
    fn test_object_id_serializes_as_file_name() {
        let json = serde_json::to_string(&ObjectId::Mib256).unwrap();
        assert_eq!(json, "\"256mib.txt\"");
    }
}
