//! Device requirements of a script
//!
//! A [`Requirements`] set accumulates the capability names a script asks for. Each
//! name is either a base feature, a feature bit of a known extension (which also
//! requires that extension) or a bare extension name. The set is compared between
//! scripts to decide whether a device can be reused, and checked against a device's
//! reported capabilities to decide whether it can run the script at all.

use crate::features::{BASE_FEATURES, BaseFeatures, EXTENSIONS, FeatureChain, FeatureLocation, FeatureRecord, find_feature};
use serde::Serialize;
use std::fmt;

/// Packs an API version number
pub const fn make_version(major: u32, minor: u32, patch: u32) -> u32 {
    (major << 22) | (minor << 12) | patch
}

/// Unpacks an API version number into (major, minor, patch)
pub const fn extract_version(version: u32) -> (u32, u32, u32) {
    (version >> 22, (version >> 12) & 0x3ff, version & 0xfff)
}

fn version_string(version: u32) -> String {
    let (major, minor, patch) = extract_version(version);
    format!("{major}.{minor}.{patch}")
}

/// Capabilities reported by a physical device
pub trait DeviceCapabilities {
    /// Base features the device supports
    fn base_features(&self) -> BaseFeatures;

    /// Names of the extensions the device supports
    fn extension_names(&self) -> Vec<String>;

    /// Fills in a features2 query shaped like `request`
    ///
    /// Returns None when the device cannot answer chained feature queries at all.
    fn chained_features(&self, request: &FeatureChain) -> Option<FeatureChain>;

    /// API version the device reports, or None if it is unknown
    fn api_version(&self) -> Option<u32> {
        None
    }
}

/// Reasons a device does not satisfy a set of requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// A required base feature is missing, by index into [`BASE_FEATURES`]
    MissingBaseFeature(usize),
    /// A required extension is missing
    MissingExtension(String),
    /// A required extension feature is missing, by index into [`EXTENSIONS`]
    MissingFeature { extension: usize, feature: usize },
    /// The device cannot answer the chained feature query an extension record needs
    ChainedQueryUnsupported(usize),
    /// The device answered the chained query with a chain of a different shape
    ChainMismatch(String),
    /// The device's API version is older than required
    VersionTooLow { required: u32, actual: u32 },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBaseFeature(index) => write!(f, "Missing required feature: {}", BASE_FEATURES[*index]),
            Self::MissingExtension(name) => write!(f, "Missing required extension: {name}"),
            Self::MissingFeature { extension, feature } => {
                let extension = &EXTENSIONS[*extension];
                write!(f, "Missing required feature “{}” from extension “{}”", extension.features[*feature], extension.name)
            }
            Self::ChainedQueryUnsupported(extension) => write!(f, "Chained feature queries are not supported but extension “{}” needs one", EXTENSIONS[*extension].name),
            Self::ChainMismatch(details) => write!(f, "Invalid feature chain: {details}"),
            Self::VersionTooLow { required, actual } => write!(f, "API version {} required but the device reported {}", version_string(*required), version_string(*actual)),
        }
    }
}

impl std::error::Error for CheckError {}

/// An accumulated, comparable set of device requirements
///
/// Extension names and extension feature records keep the order in which they were
/// first requested, and equality is sensitive to that order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Requirements {
    version: u32,
    base_features: BaseFeatures,
    extensions: Vec<String>,
    #[serde(rename = "feature_records")]
    records: Vec<FeatureRecord>,
}

impl Requirements {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum API version, 0 when none was requested
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Raises the minimum API version; a lower version than the current one is ignored
    pub fn add_version(&mut self, major: u32, minor: u32, patch: u32) {
        self.version = self.version.max(make_version(major, minor, patch));
    }

    /// Required base features
    pub fn base_features(&self) -> &BaseFeatures {
        &self.base_features
    }

    /// Required extension names in first-request order
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Required extension feature records in first-request order
    pub fn feature_records(&self) -> &[FeatureRecord] {
        &self.records
    }

    /// Returns true if nothing was requested
    pub fn is_empty(&self) -> bool {
        self.version == 0 && self.base_features.is_empty() && self.extensions.is_empty()
    }

    /// Adds a capability by name
    ///
    /// A feature of a known extension sets its bit in that extension's record and
    /// requires the extension; a base feature sets its base bit; any other name is
    /// required as an extension.
    ///
    /// # Arguments
    /// * `name` - A feature name such as `shaderFloat64` or an extension name such as `VK_KHR_multiview`
    pub fn add(&mut self, name: &str) {
        match find_feature(name) {
            Some(FeatureLocation::Extension { extension, feature }) => {
                self.add_extension_name(EXTENSIONS[extension].name);
                self.record_mut(extension).set(feature, true);
            }
            Some(FeatureLocation::Base(index)) => self.base_features.set(index, true),
            None => self.add_extension_name(name),
        }
    }

    fn add_extension_name(&mut self, name: &str) {
        if !self.extensions.iter().any(|extension| extension == name) {
            self.extensions.push(name.to_string());
        }
    }

    fn record_mut(&mut self, extension: usize) -> &mut FeatureRecord {
        let index = match self.records.iter().position(|record| record.extension_index() == extension) {
            Some(index) => index,
            None => {
                self.records.push(FeatureRecord::new(extension));
                self.records.len() - 1
            }
        };
        &mut self.records[index]
    }

    /// Shape of the features2 query needed to check the extension records
    ///
    /// One cleared record per required extension record, in the same order.
    pub fn feature_chain(&self) -> FeatureChain {
        FeatureChain {
            base: BaseFeatures::new(),
            records: self.records.iter().map(|record| FeatureRecord::new(record.extension_index())).collect(),
        }
    }

    /// The features2 chain enabling exactly the required bits, for device creation
    pub fn enabled_chain(&self) -> FeatureChain {
        FeatureChain {
            base: self.base_features,
            records: self.records.clone(),
        }
    }

    /// Names of every required feature bit, base features first
    pub fn feature_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.base_features.names().chain(self.records.iter().flat_map(|record| record.names()))
    }

    /// Checks the requirements against a device
    ///
    /// Base features are checked first, then extension names, then the extension
    /// feature records through a single chained query, then the API version.
    pub fn check(&self, device: &impl DeviceCapabilities) -> Result<(), CheckError> {
        if let Some(index) = device.base_features().first_missing(&self.base_features) {
            return Err(CheckError::MissingBaseFeature(index));
        }

        if !self.extensions.is_empty() {
            let available = device.extension_names();
            if let Some(missing) = self.extensions.iter().find(|&extension| !available.iter().any(|name| name == extension)) {
                return Err(CheckError::MissingExtension(missing.clone()));
            }
        }

        self.check_records(device)?;

        if self.version > 0 {
            match device.api_version() {
                Some(actual) if actual < self.version => return Err(CheckError::VersionTooLow { required: self.version, actual }),
                Some(_) => {}
                None => tracing::debug!(required = %version_string(self.version), "device does not report an API version, not checking it"),
            }
        }

        Ok(())
    }

    fn check_records(&self, device: &impl DeviceCapabilities) -> Result<(), CheckError> {
        let Some(first) = self.records.first() else {
            return Ok(());
        };

        let actual = device.chained_features(&self.feature_chain()).ok_or(CheckError::ChainedQueryUnsupported(first.extension_index()))?;

        if actual.records.len() != self.records.len() {
            return Err(CheckError::ChainMismatch(format!("expected {} records, got {}", self.records.len(), actual.records.len())));
        }

        for (required, actual) in self.records.iter().zip(actual.records.iter()) {
            if required.extension_index() != actual.extension_index() {
                return Err(CheckError::ChainMismatch(format!("expected {}, got {}", required.extension().structure, actual.extension().structure)));
            }

            let extension = required.extension_index();
            if let Some(feature) = (0..EXTENSIONS[extension].features.len()).find(|&feature| required.get(feature) && !actual.get(feature)) {
                return Err(CheckError::MissingFeature { extension, feature });
            }
        }

        Ok(())
    }

    /// Returns true if the device satisfies every requirement
    pub fn is_satisfied_by(&self, device: &impl DeviceCapabilities) -> bool {
        self.check(device).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::find_extension;
    use std::cell::Cell;

    /// A device answering from fixed capability lists
    #[derive(Default)]
    struct FakeDevice {
        base: BaseFeatures,
        extensions: Vec<String>,
        extension_features: Vec<&'static str>,
        supports_chain: bool,
        api_version: Option<u32>,
        chain_queries: Cell<usize>,
    }

    impl FakeDevice {
        fn new() -> Self {
            Self { supports_chain: true, ..Default::default() }
        }
    }

    impl DeviceCapabilities for FakeDevice {
        fn base_features(&self) -> BaseFeatures {
            self.base
        }

        fn extension_names(&self) -> Vec<String> {
            self.extensions.clone()
        }

        fn chained_features(&self, request: &FeatureChain) -> Option<FeatureChain> {
            self.chain_queries.set(self.chain_queries.get() + 1);
            if !self.supports_chain {
                return None;
            }
            let mut chain = request.clone();
            chain.base = self.base;
            for record in chain.records.iter_mut() {
                for name in &self.extension_features {
                    record.set_by_name(name, true);
                }
            }
            Some(chain)
        }

        fn api_version(&self) -> Option<u32> {
            self.api_version
        }
    }

    fn requirements(names: &[&str]) -> Requirements {
        let mut reqs = Requirements::new();
        for name in names {
            reqs.add(name);
        }
        reqs
    }

    #[test]
    fn test_add_base_feature_twice() {
        let reqs = requirements(&["shaderFloat64", "shaderFloat64"]);
        assert_eq!(reqs.base_features().names().collect::<Vec<_>>(), vec!["shaderFloat64"]);
        assert!(reqs.extensions().is_empty());
        assert!(reqs.feature_records().is_empty());
        assert_eq!(reqs, requirements(&["shaderFloat64"]));
    }

    #[test]
    fn test_add_extension_feature() {
        let reqs = requirements(&["multiviewGeometryShader", "VK_KHR_multiview", "multiview", "storagePushConstant8"]);
        assert_eq!(reqs.extensions(), ["VK_KHR_multiview", "VK_KHR_8bit_storage"]);
        assert_eq!(reqs.feature_records().len(), 2);
        assert_eq!(reqs.feature_records()[0].names().collect::<Vec<_>>(), vec!["multiview", "multiviewGeometryShader"]);
        assert_eq!(reqs.feature_records()[1].extension().name, "VK_KHR_8bit_storage");
        assert_eq!(reqs.feature_names().collect::<Vec<_>>(), vec!["multiview", "multiviewGeometryShader", "storagePushConstant8"]);
    }

    #[test]
    fn test_bare_extension_names() {
        let reqs = requirements(&["VK_KHR_swapchain", "VK_EXT_debug_marker", "VK_KHR_swapchain"]);
        assert_eq!(reqs.extensions(), ["VK_KHR_swapchain", "VK_EXT_debug_marker"]);
        assert!(reqs.feature_records().is_empty());
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        assert_ne!(requirements(&["VK_KHR_a", "VK_KHR_b"]), requirements(&["VK_KHR_b", "VK_KHR_a"]));
        assert_ne!(requirements(&["multiview", "shaderInt8"]), requirements(&["shaderInt8", "multiview"]));
        assert_eq!(requirements(&["VK_KHR_a", "VK_KHR_b"]), requirements(&["VK_KHR_a", "VK_KHR_b", "VK_KHR_a"]));
        assert_ne!(requirements(&["multiview"]), requirements(&["multiview", "multiviewGeometryShader"]));
        assert_ne!(requirements(&[]), requirements(&["wideLines"]));
    }

    #[test]
    fn test_clone_round_trip() {
        let sets = [
            requirements(&[]),
            requirements(&["wideLines", "largePoints"]),
            requirements(&["VK_KHR_swapchain"]),
            requirements(&["shaderInt8", "geometryShader", "VK_KHR_swapchain", "transformFeedback", "shaderFloat16"]),
        ];
        for reqs in sets {
            let copy = reqs.clone();
            assert_eq!(copy, reqs);
            assert_eq!(copy.extensions(), reqs.extensions());
            assert_eq!(copy.feature_records(), reqs.feature_records());
        }
    }

    #[test]
    fn test_version() {
        let mut reqs = Requirements::new();
        assert_eq!(reqs.version(), 0);
        reqs.add_version(1, 2, 3);
        reqs.add_version(1, 1, 0);
        assert_eq!(reqs.version(), make_version(1, 2, 3));
        assert_eq!(extract_version(reqs.version()), (1, 2, 3));
        assert_ne!(reqs, Requirements::new());
    }

    #[test]
    fn test_check_base_features() {
        let mut device = FakeDevice::new();
        let reqs = requirements(&["geometryShader"]);

        let error = reqs.check(&device).unwrap_err();
        assert_eq!(error.to_string(), "Missing required feature: geometryShader");

        device.base = BaseFeatures::from_names(["geometryShader"]);
        assert!(reqs.is_satisfied_by(&device));
    }

    #[test]
    fn test_check_missing_extension() {
        let mut device = FakeDevice::new();
        device.base = BaseFeatures::all();
        device.extension_features = vec!["multiview"];

        let reqs = requirements(&["multiview"]);
        assert_eq!(reqs.check(&device), Err(CheckError::MissingExtension("VK_KHR_multiview".to_string())));
        assert_eq!(device.chain_queries.get(), 0);

        device.extensions.push("VK_KHR_multiview".to_string());
        assert_eq!(reqs.check(&device), Ok(()));
        assert_eq!(device.chain_queries.get(), 1);
    }

    #[test]
    fn test_check_extension_features() {
        let mut device = FakeDevice::new();
        device.extensions = vec!["VK_KHR_multiview".to_string(), "VK_KHR_shader_float16_int8".to_string()];
        device.extension_features = vec!["multiview", "shaderInt8"];

        assert!(requirements(&["shaderInt8", "multiview"]).is_satisfied_by(&device));

        let reqs = requirements(&["multiview", "shaderFloat16"]);
        let extension = find_extension("VK_KHR_shader_float16_int8").unwrap();
        assert_eq!(reqs.check(&device), Err(CheckError::MissingFeature { extension, feature: 0 }));
        assert_eq!(reqs.check(&device).unwrap_err().to_string(), "Missing required feature “shaderFloat16” from extension “VK_KHR_shader_float16_int8”");
    }

    #[test]
    fn test_check_without_chained_queries() {
        let mut device = FakeDevice::new();
        device.extensions = vec!["VK_KHR_multiview".to_string()];
        device.supports_chain = false;

        let extension = find_extension("VK_KHR_multiview").unwrap();
        assert_eq!(requirements(&["multiview"]).check(&device), Err(CheckError::ChainedQueryUnsupported(extension)));

        // Requirements without extension records never issue the query
        assert!(requirements(&["VK_KHR_multiview"]).is_satisfied_by(&device));
    }

    #[test]
    fn test_check_version() {
        let mut device = FakeDevice::new();
        let mut reqs = Requirements::new();
        reqs.add_version(1, 1, 0);

        assert!(reqs.is_satisfied_by(&device));

        device.api_version = Some(make_version(1, 0, 61));
        assert_eq!(reqs.check(&device).unwrap_err().to_string(), "API version 1.1.0 required but the device reported 1.0.61");

        device.api_version = Some(make_version(1, 3, 0));
        assert!(reqs.is_satisfied_by(&device));
    }

    #[test]
    fn test_feature_chain_shape() {
        let reqs = requirements(&["transformFeedback", "wideLines", "scalarBlockLayout", "geometryStreams"]);
        let chain = reqs.feature_chain();
        assert!(chain.base.is_empty());
        assert_eq!(chain.records.iter().map(|record| record.extension().name).collect::<Vec<_>>(), vec!["VK_EXT_transform_feedback", "VK_EXT_scalar_block_layout"]);
        assert!(chain.records.iter().all(|record| record.names().count() == 0));

        let enabled = reqs.enabled_chain();
        assert_eq!(enabled.base.names().collect::<Vec<_>>(), vec!["wideLines"]);
        assert_eq!(enabled.records[0].names().collect::<Vec<_>>(), vec!["transformFeedback", "geometryStreams"]);
    }
}
