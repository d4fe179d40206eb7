//! 字数统计

/// 按 Unicode 空白切分统计字数
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace().count().min(u32::MAX as usize) as u32
}
