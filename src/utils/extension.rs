use crate::errors::PortalError;

/// 存储扩展名的最大长度
pub const MAX_EXTENSION_LEN: usize = 4;

/// 从上传文件名中提取存储扩展名
///
/// 取最后一个 `.` 之后的部分，截取前 4 个字符，保留大小写。
/// 扩展名只允许 ASCII 字母和数字，避免写出任意路径。
pub fn submission_extension(filename: &str) -> Result<String, PortalError> {
    let (_, raw) = filename
        .rsplit_once('.')
        .ok_or_else(|| PortalError::validation("Filename has no extension"))?;

    let extension: String = raw.chars().take(MAX_EXTENSION_LEN).collect();

    if extension.is_empty() {
        return Err(PortalError::validation("Filename has an empty extension"));
    }
    if !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PortalError::validation(format!(
            "Unsupported file extension: {extension}"
        )));
    }
    Ok(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_extension() {
        assert_eq!(submission_extension("report.pdf").unwrap(), "pdf");
    }

    #[test]
    fn test_extension_is_capped_at_four_chars() {
        assert_eq!(submission_extension("final.docx").unwrap(), "docx");
        assert_eq!(submission_extension("slides.pptxm").unwrap(), "pptx");
        assert_eq!(submission_extension("data.tar.gz").unwrap(), "gz");
    }

    #[test]
    fn test_case_is_preserved() {
        assert_eq!(submission_extension("SCAN.JPEG").unwrap(), "JPEG");
    }

    #[test]
    fn test_missing_or_empty_extension() {
        assert!(submission_extension("README").is_err());
        assert!(submission_extension("trailing.").is_err());
    }

    #[test]
    fn test_non_ascii_or_path_like_extension() {
        assert!(submission_extension("notes.tëx").is_err());
        assert!(submission_extension("x./../a").is_err());
    }
}
