use std::collections::HashSet;
use std::path::{Component, Path};

use crate::config::mime::MimeAllowList;
use crate::config::schema::{ObjectType, PackageConfig};
use crate::error::ConfigError;
use crate::queue::QueueStage;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PackageConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<PackageConfig, ConfigError> {
    let config: PackageConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Resolves the requested object type against the configured supported list.
pub fn resolve_object_type(config: &PackageConfig) -> Result<ObjectType, ConfigError> {
    let unsupported = || ConfigError::UnsupportedObjectType {
        requested: config.object_type.clone(),
        supported: config.supported_object_types.join(", "),
    };

    let object_type: ObjectType = config.object_type.parse().map_err(|_| unsupported())?;
    if !config
        .supported_object_types
        .iter()
        .any(|t| t == object_type.as_str())
    {
        return Err(unsupported());
    }

    Ok(object_type)
}

fn validate_config(config: &PackageConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    resolve_object_type(config)?;

    if MimeAllowList::new(&config.mime_allow_list).is_empty() {
        return Err(ConfigError::Validation {
            message: "mime_allow_list must name at least one MIME type".to_string(),
        });
    }

    let mut stage_names = HashSet::new();
    for stage in QueueStage::ALL {
        let name = config.queue.stage_name(stage);
        if name.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("Queue stage '{}' has an empty directory name", stage),
            });
        }
        if !stage_names.insert(name) {
            return Err(ConfigError::Validation {
                message: format!("Queue stage directory '{}' is used twice", name),
            });
        }
    }

    if let Some(subdirectory) = &config.subdirectory {
        let path = Path::new(subdirectory);
        if path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(ConfigError::Validation {
                message: format!(
                    "subdirectory must be relative without '..': {}",
                    subdirectory
                ),
            });
        }
    }

    if config.derivatives.thumbnail_size == 0 || config.derivatives.front_thumbnail_size == 0 {
        return Err(ConfigError::Validation {
            message: "Derivative sizes must be non-zero".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config_applies_defaults() {
        let config_json = r#"
        {
            "version": "1.0",
            "structural_metadata": "/aip/METS.xml",
            "source_root": "/aip/data",
            "output_root": "/dip"
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.object_type, "archival_collection");
        assert!(!config.ocr_required);
        assert!(!config.pdf_master);
        assert_eq!(config.queue.root, "jobs/services");
        assert_eq!(config.derivatives.thumbnail_size, 150);
        assert_eq!(config.mime_allow_list.len(), 7);
    }

    #[test]
    fn test_load_config_with_options() {
        let config_json = r#"
        {
            "version": "1.0",
            "structural_metadata": "/aip/METS.xml",
            "source_root": "/aip/data",
            "output_root": "/dip",
            "object_type": "photograph_collection",
            "ocr_required": true,
            "pdf_master": true,
            "display_format": "photograph",
            "subdirectory": "ms1/Box_1",
            "queue": { "new": "incoming" }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert!(config.ocr_required);
        assert!(config.pdf_master);
        assert_eq!(config.display_format.as_deref(), Some("photograph"));
        assert_eq!(config.queue.new, "incoming");
        assert_eq!(config.queue.tmp, "tmp");
        assert_eq!(
            resolve_object_type(&config).unwrap(),
            ObjectType::PhotographCollection
        );
    }

    #[test]
    fn test_invalid_version() {
        let config_json = r#"
        {
            "version": "2.0",
            "structural_metadata": "/aip/METS.xml",
            "source_root": "/aip/data",
            "output_root": "/dip"
        }
        "#;

        assert!(matches!(
            load_config_from_str(config_json),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_unknown_object_type_is_fatal() {
        let config_json = r#"
        {
            "version": "1.0",
            "structural_metadata": "/aip/METS.xml",
            "source_root": "/aip/data",
            "output_root": "/dip",
            "object_type": "newspaper"
        }
        "#;

        assert!(matches!(
            load_config_from_str(config_json),
            Err(ConfigError::UnsupportedObjectType { .. })
        ));
    }

    #[test]
    fn test_object_type_outside_supported_list_is_fatal() {
        let config_json = r#"
        {
            "version": "1.0",
            "structural_metadata": "/aip/METS.xml",
            "source_root": "/aip/data",
            "output_root": "/dip",
            "object_type": "audiovisual_collection",
            "supported_object_types": ["archival_collection"]
        }
        "#;

        match load_config_from_str(config_json) {
            Err(ConfigError::UnsupportedObjectType { requested, supported }) => {
                assert_eq!(requested, "audiovisual_collection");
                assert_eq!(supported, "archival_collection");
            }
            other => panic!("Expected UnsupportedObjectType, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_stage_names() {
        let config_json = r#"
        {
            "version": "1.0",
            "structural_metadata": "/aip/METS.xml",
            "source_root": "/aip/data",
            "output_root": "/dip",
            "queue": { "tmp": "new" }
        }
        "#;

        assert!(load_config_from_str(config_json).is_err());
    }

    #[test]
    fn test_subdirectory_traversal_rejected() {
        let config_json = r#"
        {
            "version": "1.0",
            "structural_metadata": "/aip/METS.xml",
            "source_root": "/aip/data",
            "output_root": "/dip",
            "subdirectory": "../elsewhere"
        }
        "#;

        assert!(load_config_from_str(config_json).is_err());
    }

    #[test]
    fn test_empty_allow_list_rejected() {
        let config_json = r#"
        {
            "version": "1.0",
            "structural_metadata": "/aip/METS.xml",
            "source_root": "/aip/data",
            "output_root": "/dip",
            "mime_allow_list": []
        }
        "#;

        assert!(load_config_from_str(config_json).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = load_config("/nonexistent/dipgen.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
