//! 缓存 key 推导

use std::borrow::Cow;

use crate::config::KeyOrder;

/// identifier 之间的分隔符
pub const KEY_SEPARATOR: char = '|';

/// identifier 中的 `%` 与 `|` 按百分号编码转义，普通 IP 保持原样
fn escape_identifier(identifier: &str) -> Cow<'_, str> {
    if !identifier.contains(['%', KEY_SEPARATOR]) {
        return Cow::Borrowed(identifier);
    }
    Cow::Owned(identifier.replace('%', "%25").replace(KEY_SEPARATOR, "%7C"))
}

/// 由两个 identifier 推导出的缓存 key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    key: String,
    swapped: bool,
}

impl CacheKey {
    /// 推导 key
    ///
    /// `Unordered` 模式下先对两个 identifier 排序，`(A,B)` 与 `(B,A)` 共享同一条记录；
    /// `swapped()` 表示存储顺序与调用方顺序相反。
    pub fn for_pair(ip1: &str, ip2: &str, order: KeyOrder) -> Self {
        let swapped = order == KeyOrder::Unordered && ip2 < ip1;
        let (first, second) = if swapped { (ip2, ip1) } else { (ip1, ip2) };
        Self {
            key: format!(
                "{}{}{}",
                escape_identifier(first),
                KEY_SEPARATOR,
                escape_identifier(second)
            ),
            swapped,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn swapped(&self) -> bool {
        self.swapped
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_key_keeps_caller_order() {
        let ab = CacheKey::for_pair("50.168.198.162", "174.49.112.125", KeyOrder::Ordered);
        let ba = CacheKey::for_pair("174.49.112.125", "50.168.198.162", KeyOrder::Ordered);
        assert_eq!(ab.as_str(), "50.168.198.162|174.49.112.125");
        assert_eq!(ba.as_str(), "174.49.112.125|50.168.198.162");
        assert!(!ab.swapped());
        assert!(!ba.swapped());
    }

    #[test]
    fn test_unordered_key_is_symmetric() {
        let ab = CacheKey::for_pair("50.168.198.162", "174.49.112.125", KeyOrder::Unordered);
        let ba = CacheKey::for_pair("174.49.112.125", "50.168.198.162", KeyOrder::Unordered);
        assert_eq!(ab.as_str(), ba.as_str());
        assert_eq!(ab.as_str(), "174.49.112.125|50.168.198.162");
        assert!(ab.swapped());
        assert!(!ba.swapped());
    }

    #[test]
    fn test_same_identifier_twice() {
        let key = CacheKey::for_pair("1.1.1.1", "1.1.1.1", KeyOrder::Unordered);
        assert_eq!(key.as_str(), "1.1.1.1|1.1.1.1");
        assert!(!key.swapped());
    }

    #[test]
    fn test_separator_inside_identifier_does_not_collide() {
        let left = CacheKey::for_pair("a|b", "c", KeyOrder::Ordered);
        let right = CacheKey::for_pair("a", "b|c", KeyOrder::Ordered);
        assert_ne!(left.as_str(), right.as_str());
        assert_eq!(left.as_str(), "a%7Cb|c");
        assert_eq!(right.as_str(), "a|b%7Cc");
    }

    #[test]
    fn test_escaped_separator_does_not_collide_with_literal() {
        let escaped = CacheKey::for_pair("a%7Cb", "c", KeyOrder::Ordered);
        let raw = CacheKey::for_pair("a|b", "c", KeyOrder::Ordered);
        assert_ne!(escaped.as_str(), raw.as_str());
        assert_eq!(escaped.as_str(), "a%257Cb|c");
    }

    #[test]
    fn test_ipv6_key_unchanged() {
        let key = CacheKey::for_pair("2001:db8::1", "::1", KeyOrder::Ordered);
        assert_eq!(key.as_str(), "2001:db8::1|::1");
    }

    #[test]
    fn test_display() {
        let key = CacheKey::for_pair("a", "b", KeyOrder::Ordered);
        assert_eq!(key.to_string(), "a|b");
    }
}
