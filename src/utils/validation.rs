/// 验证工具
pub struct ValidationUtils;

impl ValidationUtils {
    /// 验证坐标字段（artifact / version）
    pub fn validate_coordinate_part(field: &str, value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Err(format!("{field} cannot be empty"));
        }

        if value.chars().any(char::is_whitespace) {
            return Err(format!("{field} cannot contain whitespace"));
        }

        // 坐标会拼接进 URL 和文件名
        let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
        for &ch in &invalid_chars {
            if value.contains(ch) {
                return Err(format!("{field} cannot contain '{ch}'"));
            }
        }

        Ok(())
    }

    /// 验证 groupId，例如 net.minidev
    pub fn validate_group(group: &str) -> Result<(), String> {
        Self::validate_coordinate_part("group", group)?;

        if group.starts_with('.') || group.ends_with('.') {
            return Err("group cannot start or end with '.'".to_string());
        }

        if group.contains("..") {
            return Err("group cannot contain empty segments".to_string());
        }

        Ok(())
    }

    /// 验证仓库 URL 并去掉末尾的 '/'
    pub fn validate_repository_url(url: &str) -> Result<String, String> {
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err("URL cannot be empty".to_string());
        }

        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err("URL must start with http:// or https://".to_string());
        }

        match url::Url::parse(trimmed) {
            Ok(parsed) if parsed.host_str().is_some() => Ok(trimmed.to_string()),
            Ok(_) => Err("URL has no host".to_string()),
            Err(e) => Err(format!("Invalid URL: {e}")),
        }
    }
}
