use crate::utils::error::{BatchError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive_number(field_name: &str, value: u32, min_value: u32) -> Result<()> {
    if value < min_value {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(BatchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// scan 名稱會成為目錄名稱與命令列參數，不可為空、不可重複、不可含路徑分隔符
pub fn validate_scan_names(field_name: &str, scans: &[String]) -> Result<()> {
    if scans.is_empty() {
        return Err(BatchError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for scan in scans {
        validate_non_empty_string(field_name, scan)?;

        if scan.contains('/') || scan.contains('\\') || scan.contains('\0') {
            return Err(BatchError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: scan.clone(),
                reason: "Scan name cannot contain path separators or null bytes".to_string(),
            });
        }

        if !seen.insert(scan.as_str()) {
            return Err(BatchError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: scan.clone(),
                reason: "Duplicate scan name".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("downsample", 2, 1).is_ok());
        assert!(validate_positive_number("downsample", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("gs_port", 8080u16, 1, 64535).is_ok());
        assert!(validate_range("gs_port", 65000u16, 1, 64535).is_err());
        assert!(validate_range("gs_port", 0u16, 1, 64535).is_err());
    }

    #[test]
    fn test_validate_scan_names() {
        let scans = vec!["bicycle".to_string(), "garden".to_string()];
        assert!(validate_scan_names("scans", &scans).is_ok());

        assert!(matches!(
            validate_scan_names("scans", &[]),
            Err(BatchError::MissingConfigError { .. })
        ));

        let blank = vec!["  ".to_string()];
        assert!(validate_scan_names("scans", &blank).is_err());

        let nested = vec!["data/garden".to_string()];
        assert!(validate_scan_names("scans", &nested).is_err());

        let duplicated = vec!["room".to_string(), "room".to_string()];
        assert!(validate_scan_names("scans", &duplicated).is_err());
    }
}
