use crate::error::{AppError, AppResult, ConfigError};
use std::collections::BTreeSet;

/// 解析文档选择字符串，返回要处理的文档索引（从 1 开始，升序）
///
/// 支持 `"1,3,5"`、`"1-5,8-10"`；空字符串表示全部
pub fn parse_selection(selection: &str, total: usize) -> AppResult<BTreeSet<usize>> {
    if selection.trim().is_empty() {
        return Ok((1..=total).collect());
    }

    let invalid = || {
        AppError::Config(ConfigError::InvalidSelection {
            selection: selection.to_string(),
        })
    };

    let mut indexes = BTreeSet::new();
    for part in selection.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: usize = start.trim().parse().map_err(|_| invalid())?;
            let end: usize = end.trim().parse().map_err(|_| invalid())?;
            if start < 1 || end > total || start > end {
                return Err(invalid());
            }
            indexes.extend(start..=end);
        } else {
            let num: usize = part.parse().map_err(|_| invalid())?;
            if num < 1 || num > total {
                return Err(invalid());
            }
            indexes.insert(num);
        }
    }

    Ok(indexes)
}
